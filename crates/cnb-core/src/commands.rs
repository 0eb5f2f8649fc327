//! The chat command surface: parsing free text into command intents and
//! dispatching them against the registries.

use std::sync::Arc;

use crate::{
    auth::AuthPolicy,
    domain::{normalize_customer, InboundMessage, UserId},
    formatting::escape_markdown,
    registry::port::RegistryStore,
    transport::ChatTransport,
    Result,
};

/// One recognized command intent with its raw (unnormalized) arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    SetResponsible { customer: String, responsible: String },
    UnsetResponsible { customer: String },
    SetModerator { telegram_id: String },
    UnsetModerator { telegram_id: String },
    Subscribe { customer: String },
    Unsubscribe { customer: String },
    GetMyId,
    Help,
}

/// Outcome of parsing one inbound text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Parsed {
    Command(Command),
    /// A recognized prefix with too few arguments; reply with its usage.
    Malformed { usage: &'static str },
    /// Not a command. Dropped silently, no reply, no registry access.
    Unrecognized,
}

const USAGE_SET_RESPONSIBLE: &str = "/setresponsible {customer} {responsible_tag}";
const USAGE_UNSET_RESPONSIBLE: &str = "/unsetresponsible {customer}";
const USAGE_SET_MODERATOR: &str = "/setmoderator {telegram_tag}";
const USAGE_UNSET_MODERATOR: &str = "/unsetmoderator {telegram_tag}";
const USAGE_SUBSCRIBE: &str = "/subscribe {customer}";
const USAGE_UNSUBSCRIBE: &str = "/unsubscribe {customer}";

const DENY_ASSIGN: &str = "Only the administrator or a moderator can assign responsible parties.";
const DENY_UNASSIGN: &str =
    "Only the administrator or a moderator can remove responsible parties.";
const DENY_ADD_MODERATOR: &str = "Only the administrator can add moderators.";
const DENY_REMOVE_MODERATOR: &str = "Only the administrator can remove moderators.";

/// Parse one inbound text. Prefixes are case-sensitive and checked in a
/// fixed order; the `/command@botname` mention form matches the same prefix.
pub fn parse(text: &str) -> Parsed {
    if text.starts_with("/setresponsible") {
        return match split_two_args(text) {
            Some((customer, responsible)) => Parsed::Command(Command::SetResponsible {
                customer: customer.to_string(),
                responsible: responsible.to_string(),
            }),
            None => Parsed::Malformed {
                usage: USAGE_SET_RESPONSIBLE,
            },
        };
    }
    if text.starts_with("/unsetresponsible") {
        return match tail_arg(text) {
            Some(customer) => Parsed::Command(Command::UnsetResponsible {
                customer: customer.to_string(),
            }),
            None => Parsed::Malformed {
                usage: USAGE_UNSET_RESPONSIBLE,
            },
        };
    }
    if text.starts_with("/setmoderator") {
        return match tail_arg(text) {
            Some(telegram_id) => Parsed::Command(Command::SetModerator {
                telegram_id: telegram_id.to_string(),
            }),
            None => Parsed::Malformed {
                usage: USAGE_SET_MODERATOR,
            },
        };
    }
    if text.starts_with("/unsetmoderator") {
        return match tail_arg(text) {
            Some(telegram_id) => Parsed::Command(Command::UnsetModerator {
                telegram_id: telegram_id.to_string(),
            }),
            None => Parsed::Malformed {
                usage: USAGE_UNSET_MODERATOR,
            },
        };
    }
    if text.starts_with("/subscribe") {
        return match tail_arg(text) {
            Some(customer) => Parsed::Command(Command::Subscribe {
                customer: customer.to_string(),
            }),
            None => Parsed::Malformed {
                usage: USAGE_SUBSCRIBE,
            },
        };
    }
    if text.starts_with("/unsubscribe") {
        return match tail_arg(text) {
            Some(customer) => Parsed::Command(Command::Unsubscribe {
                customer: customer.to_string(),
            }),
            None => Parsed::Malformed {
                usage: USAGE_UNSUBSCRIBE,
            },
        };
    }
    if text.starts_with("/getmyid") {
        return Parsed::Command(Command::GetMyId);
    }
    if text.starts_with("/help") {
        return Parsed::Command(Command::Help);
    }
    Parsed::Unrecognized
}

/// Everything after the command token, spaces included. `None` when the
/// message is the bare command.
fn tail_arg(text: &str) -> Option<&str> {
    let mut parts = text.splitn(2, ' ');
    parts.next();
    parts.next()
}

/// First argument plus free-text tail, so the tail may itself contain
/// spaces. `None` unless both are present.
fn split_two_args(text: &str) -> Option<(&str, &str)> {
    let mut parts = text.splitn(3, ' ');
    parts.next();
    let first = parts.next()?;
    let rest = parts.next()?;
    Some((first, rest))
}

fn help_text() -> String {
    format!(
        "Available commands:\n\
         {USAGE_SET_RESPONSIBLE} - assign a responsible party\n\
         {USAGE_UNSET_RESPONSIBLE} - remove a responsible party\n\
         {USAGE_SET_MODERATOR} - add a moderator (admin only)\n\
         {USAGE_UNSET_MODERATOR} - remove a moderator (admin only)\n\
         {USAGE_SUBSCRIBE} - get notifications for a customer\n\
         {USAGE_UNSUBSCRIBE} - stop notifications for a customer\n\
         /getmyid - show your numeric ID\n\
         /help - show this message"
    )
}

/// Routes inbound chat text through parse, authorization and registry
/// mutation, sending exactly one reply per recognized command.
///
/// Handlers re-read current registry state on every call; nothing is cached
/// across messages.
pub struct CommandRouter {
    auth: AuthPolicy,
    store: Arc<dyn RegistryStore>,
    transport: Arc<dyn ChatTransport>,
}

impl CommandRouter {
    pub fn new(
        auth: AuthPolicy,
        store: Arc<dyn RegistryStore>,
        transport: Arc<dyn ChatTransport>,
    ) -> Self {
        Self {
            auth,
            store,
            transport,
        }
    }

    /// Handle one inbound message. The reply goes back to the originating
    /// chat, escaped as a whole for MarkdownV2.
    pub async fn handle(&self, msg: &InboundMessage) -> Result<()> {
        let reply = match parse(&msg.text) {
            Parsed::Unrecognized => return Ok(()),
            Parsed::Malformed { usage } => format!("Invalid command format. Use {usage}"),
            Parsed::Command(cmd) => self.execute(cmd, &msg.sender).await?,
        };
        self.transport
            .send_text(&msg.chat, &escape_markdown(&reply))
            .await
    }

    async fn execute(&self, cmd: Command, sender: &UserId) -> Result<String> {
        match cmd {
            Command::SetResponsible {
                customer,
                responsible,
            } => self.set_responsible(sender, &customer, &responsible).await,
            Command::UnsetResponsible { customer } => {
                self.unset_responsible(sender, &customer).await
            }
            Command::SetModerator { telegram_id } => {
                self.set_moderator(sender, &telegram_id).await
            }
            Command::UnsetModerator { telegram_id } => {
                self.unset_moderator(sender, &telegram_id).await
            }
            Command::Subscribe { customer } => self.subscribe(sender, &customer).await,
            Command::Unsubscribe { customer } => self.unsubscribe(sender, &customer).await,
            Command::GetMyId => Ok(format!("Your numeric ID: {}", sender.0)),
            Command::Help => Ok(help_text()),
        }
    }

    async fn set_responsible(
        &self,
        sender: &UserId,
        customer_raw: &str,
        responsible: &str,
    ) -> Result<String> {
        let moderators = self.store.all_moderators().await?;
        if !self.auth.is_moderator_or_admin(&sender.0, &moderators) {
            return Ok(DENY_ASSIGN.to_string());
        }

        let customer = normalize_customer(customer_raw);
        self.store.upsert_assignment(&customer, responsible).await?;
        Ok(format!(
            "Responsible for {customer_raw} set to {responsible}."
        ))
    }

    async fn unset_responsible(&self, sender: &UserId, customer_raw: &str) -> Result<String> {
        let moderators = self.store.all_moderators().await?;
        if !self.auth.is_moderator_or_admin(&sender.0, &moderators) {
            return Ok(DENY_UNASSIGN.to_string());
        }

        let customer = normalize_customer(customer_raw);
        if self.store.find_assignment(&customer).await?.is_none() {
            return Ok(format!("Responsible for {customer_raw} not found."));
        }
        self.store.delete_assignment(&customer).await?;
        Ok(format!("Responsible for {customer_raw} removed."))
    }

    async fn set_moderator(&self, sender: &UserId, telegram_id: &str) -> Result<String> {
        if !self.auth.is_admin(&sender.0) {
            return Ok(DENY_ADD_MODERATOR.to_string());
        }

        if self.store.find_moderator(telegram_id).await?.is_some() {
            return Ok(format!("Moderator {telegram_id} already exists."));
        }
        self.store.insert_moderator(telegram_id).await?;
        Ok(format!("Moderator {telegram_id} added."))
    }

    async fn unset_moderator(&self, sender: &UserId, telegram_id: &str) -> Result<String> {
        if !self.auth.is_admin(&sender.0) {
            return Ok(DENY_REMOVE_MODERATOR.to_string());
        }

        if self.store.find_moderator(telegram_id).await?.is_none() {
            return Ok(format!("Moderator {telegram_id} not found."));
        }
        self.store.delete_moderator(telegram_id).await?;
        Ok(format!("Moderator {telegram_id} removed."))
    }

    async fn subscribe(&self, sender: &UserId, customer_raw: &str) -> Result<String> {
        let customer = normalize_customer(customer_raw);
        if self
            .store
            .find_subscription(&customer, &sender.0)
            .await?
            .is_some()
        {
            return Ok(format!("You are already subscribed to {customer}."));
        }
        self.store.insert_subscription(&customer, &sender.0).await?;
        Ok(format!("You are subscribed to {customer}."))
    }

    async fn unsubscribe(&self, sender: &UserId, customer_raw: &str) -> Result<String> {
        let customer = normalize_customer(customer_raw);
        if self
            .store
            .find_subscription(&customer, &sender.0)
            .await?
            .is_none()
        {
            return Ok(format!("You are not subscribed to {customer}."));
        }
        self.store.delete_subscription(&customer, &sender.0).await?;
        Ok(format!("You are unsubscribed from {customer}."))
    }
}
