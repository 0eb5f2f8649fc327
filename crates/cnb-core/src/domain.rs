use serde::Deserialize;

/// Numeric Telegram user id of a message author, carried as a string so
/// registry comparisons stay string-exact.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub String);

/// A send target: a decimal chat/user id, or an `@name` for public groups.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub String);

/// One inbound free-text chat message.
#[derive(Clone, Debug)]
pub struct InboundMessage {
    pub chat: ChatId,
    pub sender: UserId,
    pub text: String,
}

/// One customer-info record from the ingestion boundary.
///
/// Consumed once to produce a notification, never persisted. Unknown keys in
/// the source object are ignored; a missing required key fails
/// deserialization for that record only.
#[derive(Clone, Debug, Deserialize)]
pub struct CustomerInfoRecord {
    pub customer: String,
    pub geo: String,
    pub row: i64,
    #[serde(rename = "documentLink", default)]
    pub document_link: Option<String>,
    pub deadline: String,
}

/// Canonical form of a customer key: outer-trimmed, upper-cased.
///
/// Applied identically at write and read time so subscription and assignment
/// lookups are key-exact. No other equivalence (no Unicode normalization, no
/// internal whitespace collapsing).
pub fn normalize_customer(raw: &str) -> String {
    raw.trim().to_uppercase()
}
