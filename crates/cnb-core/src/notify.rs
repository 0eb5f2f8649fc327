//! Customer-info notification formatting and fan-out to moderators,
//! subscribers and the operations group.

use std::sync::Arc;

use tracing::warn;

use crate::{
    domain::{normalize_customer, ChatId, CustomerInfoRecord},
    formatting::{escape_markdown, format_deadline},
    registry::port::RegistryStore,
    transport::ChatTransport,
    Result,
};

/// Builds the canonical notification text for one record.
///
/// The header and deadline lines are escaped as whole lines, then the header
/// is wrapped in literal asterisks for bold emphasis. The responsible and
/// document lines are emitted only when present; their labels contain no
/// escapable characters, so only the interpolated values pass the escaper.
pub fn format_notification(record: &CustomerInfoRecord, responsible: Option<&str>) -> String {
    let customer = normalize_customer(&record.customer);
    let header = escape_markdown(&format!(
        "\u{1F3A7} {customer} {} Row: {}",
        record.geo, record.row
    ));
    let deadline = escape_markdown(&format!(
        "\u{1F6D1} {}",
        format_deadline(&record.deadline)
    ));

    let mut text = format!("*{header}*\n{deadline}\n");
    if let Some(tag) = responsible {
        text.push_str("Responsible: @");
        text.push_str(&escape_markdown(tag));
        text.push('\n');
    }
    if let Some(link) = record.document_link.as_deref() {
        if !link.is_empty() {
            text.push_str("Doc: ");
            text.push_str(&escape_markdown(link));
            text.push('\n');
        }
    }
    text
}

/// Delivers one formatted notification to every interested recipient.
///
/// The audience is all moderators, then the customer's subscribers, then the
/// fixed operations group, in that order. The three sources are not
/// deduplicated: an identity that is both a moderator and a subscriber is
/// sent the notification twice.
pub struct NotificationDispatcher {
    store: Arc<dyn RegistryStore>,
    transport: Arc<dyn ChatTransport>,
    group: ChatId,
}

impl NotificationDispatcher {
    pub fn new(
        store: Arc<dyn RegistryStore>,
        transport: Arc<dyn ChatTransport>,
        group: ChatId,
    ) -> Self {
        Self {
            store,
            transport,
            group,
        }
    }

    /// Format the record once and fan it out. A failed delivery to one
    /// recipient is logged and does not abort the remaining deliveries.
    pub async fn dispatch(&self, record: &CustomerInfoRecord) -> Result<()> {
        let customer = normalize_customer(&record.customer);
        let assignment = self.store.find_assignment(&customer).await?;
        let text =
            format_notification(record, assignment.as_ref().map(|a| a.responsible.as_str()));

        let mut audience: Vec<ChatId> = Vec::new();
        for moderator in self.store.all_moderators().await? {
            audience.push(ChatId(moderator.telegram_id));
        }
        for subscription in self.store.subscriptions_for_customer(&customer).await? {
            audience.push(ChatId(subscription.telegram_id));
        }
        audience.push(self.group.clone());

        for recipient in &audience {
            if let Err(err) = self.transport.send_text(recipient, &text).await {
                warn!("notification delivery to {} failed: {err}", recipient.0);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;
    use crate::formatting::INVALID_DATE;
    use crate::registry::file::FileRegistry;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::Mutex;

    fn record(customer: &str, link: Option<&str>) -> CustomerInfoRecord {
        CustomerInfoRecord {
            customer: customer.to_string(),
            geo: "US".to_string(),
            row: 3,
            document_link: link.map(str::to_string),
            deadline: "2024-03-05T00:00:00.000Z".to_string(),
        }
    }

    #[derive(Default)]
    struct RecordingTransport {
        sends: Mutex<Vec<(String, String)>>,
    }

    impl RecordingTransport {
        fn sent(&self) -> Vec<(String, String)> {
            self.sends.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatTransport for RecordingTransport {
        async fn send_text(&self, recipient: &ChatId, text: &str) -> Result<()> {
            self.sends
                .lock()
                .unwrap()
                .push((recipient.0.clone(), text.to_string()));
            Ok(())
        }
    }

    struct FlakyTransport {
        fail_for: String,
        attempts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ChatTransport for FlakyTransport {
        async fn send_text(&self, recipient: &ChatId, _text: &str) -> Result<()> {
            self.attempts.lock().unwrap().push(recipient.0.clone());
            if recipient.0 == self.fail_for {
                return Err(Error::Transport("connection reset".to_string()));
            }
            Ok(())
        }
    }

    fn tmp(prefix: &str) -> PathBuf {
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let pid = std::process::id();
        PathBuf::from(format!("/tmp/{prefix}-{pid}-{ts}.json"))
    }

    // ============== Formatting ==============

    #[test]
    fn formats_full_notification() {
        let text = format_notification(&record("acme", Some("http://x")), Some("bob"));
        assert_eq!(
            text,
            "*\u{1F3A7} ACME US Row: 3*\n\u{1F6D1} 5 March 2024\nResponsible: @bob\nDoc: http://x\n"
        );
    }

    #[test]
    fn optional_lines_are_omitted_when_absent() {
        let text = format_notification(&record("acme", None), None);
        assert_eq!(text, "*\u{1F3A7} ACME US Row: 3*\n\u{1F6D1} 5 March 2024\n");

        let text = format_notification(&record("acme", Some("")), None);
        assert!(!text.contains("Doc:"));
    }

    #[test]
    fn unparseable_deadline_renders_the_sentinel() {
        let mut rec = record("acme", None);
        rec.deadline = "bad".to_string();
        let text = format_notification(&rec, None);
        assert!(text.contains(INVALID_DATE));
    }

    #[test]
    fn interpolated_values_are_escaped_exactly_once() {
        let mut rec = record("a_b", None);
        rec.geo = "U*S".to_string();
        let text = format_notification(&rec, Some("bob.smith"));

        assert!(text.contains(r"A\_B"));
        assert!(text.contains(r"U\*S"));
        assert!(text.contains(r"Responsible: @bob\.smith"));
        assert!(!text.contains(r"\\"));
    }

    // ============== Fan-out ==============

    #[tokio::test]
    async fn delivers_to_moderators_subscribers_then_group() {
        let store = Arc::new(FileRegistry::open(tmp("cnb-notify-order")).unwrap());
        store.insert_moderator("7").await.unwrap();
        store.insert_subscription("ACME", "42").await.unwrap();
        store.upsert_assignment("ACME", "bob").await.unwrap();

        let transport = Arc::new(RecordingTransport::default());
        let dispatcher = NotificationDispatcher::new(
            store,
            transport.clone(),
            ChatId("-100".to_string()),
        );

        dispatcher
            .dispatch(&record("acme", Some("http://x")))
            .await
            .unwrap();

        let sent = transport.sent();
        let recipients: Vec<&str> = sent.iter().map(|(r, _)| r.as_str()).collect();
        assert_eq!(recipients, vec!["7", "42", "-100"]);
        for (_, text) in &sent {
            assert!(text.contains("ACME"));
            assert!(text.contains("5 March 2024"));
            assert!(text.contains("@bob"));
            assert!(text.contains("http://x"));
        }
    }

    #[tokio::test]
    async fn moderator_who_also_subscribes_is_delivered_twice() {
        let store = Arc::new(FileRegistry::open(tmp("cnb-notify-dup")).unwrap());
        store.insert_moderator("7").await.unwrap();
        store.insert_subscription("ACME", "42").await.unwrap();
        store.insert_subscription("ACME", "7").await.unwrap();

        let transport = Arc::new(RecordingTransport::default());
        let dispatcher = NotificationDispatcher::new(
            store,
            transport.clone(),
            ChatId("-100".to_string()),
        );

        dispatcher.dispatch(&record("acme", None)).await.unwrap();

        let recipients: Vec<String> =
            transport.sent().into_iter().map(|(r, _)| r).collect();
        assert_eq!(recipients, vec!["7", "42", "7", "-100"]);
    }

    #[tokio::test]
    async fn one_failed_delivery_does_not_abort_the_rest() {
        let store = Arc::new(FileRegistry::open(tmp("cnb-notify-flaky")).unwrap());
        store.insert_moderator("7").await.unwrap();
        store.insert_subscription("ACME", "42").await.unwrap();

        let transport = Arc::new(FlakyTransport {
            fail_for: "42".to_string(),
            attempts: Mutex::new(Vec::new()),
        });
        let dispatcher = NotificationDispatcher::new(
            store,
            transport.clone(),
            ChatId("-100".to_string()),
        );

        dispatcher.dispatch(&record("acme", None)).await.unwrap();

        let attempts = transport.attempts.lock().unwrap().clone();
        assert_eq!(attempts, vec!["7", "42", "-100"]);
    }

    #[tokio::test]
    async fn empty_registries_still_notify_the_group() {
        let store = Arc::new(FileRegistry::open(tmp("cnb-notify-empty")).unwrap());
        let transport = Arc::new(RecordingTransport::default());
        let dispatcher = NotificationDispatcher::new(
            store,
            transport.clone(),
            ChatId("-100".to_string()),
        );

        dispatcher.dispatch(&record("acme", None)).await.unwrap();

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "-100");
        assert!(!sent[0].1.contains("Responsible"));
    }
}
