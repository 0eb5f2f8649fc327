use crate::registry::types::Moderator;

/// Privilege predicates for the command surface.
///
/// Pure: callers pass the current moderator records in, the policy never
/// touches the store.
#[derive(Clone, Debug)]
pub struct AuthPolicy {
    admin_id: String,
}

impl AuthPolicy {
    pub fn new(admin_id: impl Into<String>) -> Self {
        Self {
            admin_id: admin_id.into(),
        }
    }

    /// True iff `sender` is exactly the configured admin identity.
    /// An empty sender is never the admin.
    pub fn is_admin(&self, sender: &str) -> bool {
        !sender.is_empty() && sender == self.admin_id
    }

    pub fn is_moderator_or_admin(&self, sender: &str, moderators: &[Moderator]) -> bool {
        if self.is_admin(sender) {
            return true;
        }
        !sender.is_empty() && moderators.iter().any(|m| m.telegram_id == sender)
    }
}
