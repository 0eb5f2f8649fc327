use async_trait::async_trait;

use crate::{domain::ChatId, Result};

/// Outbound chat port.
///
/// The process owns one transport for its lifetime; the core never constructs
/// or manages the underlying connection. Telegram is the first
/// implementation.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Deliver already-escaped MarkdownV2 text to one recipient.
    async fn send_text(&self, recipient: &ChatId, text: &str) -> Result<()>;
}
