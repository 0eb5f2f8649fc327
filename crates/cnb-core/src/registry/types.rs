use serde::{Deserialize, Serialize};

/// A chat identity with elevated privileges. Only the admin creates or
/// removes these; at most one record per `telegram_id`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Moderator {
    pub id: u64,
    pub telegram_id: String,
}

/// Maps a normalized customer key to a free-text responsible-party tag.
/// At most one assignment per customer; repeated writes overwrite in place.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponsibleAssignment {
    pub id: u64,
    pub customer: String,
    pub responsible: String,
}

/// "This chat identity wants notifications for this customer."
/// At most one record per `(customer, telegram_id)` pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: u64,
    pub customer: String,
    pub telegram_id: String,
}
