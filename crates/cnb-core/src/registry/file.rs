use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{
    registry::{
        port::RegistryStore,
        types::{Moderator, ResponsibleAssignment, Subscription},
    },
    Result,
};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct RegistryData {
    next_id: u64,
    moderators: Vec<Moderator>,
    assignments: Vec<ResponsibleAssignment>,
    subscriptions: Vec<Subscription>,
}

/// Registry store persisted as a single JSON document.
///
/// Reads come from the in-memory copy and every mutation rewrites the whole
/// file, so the store is read-your-writes within one process. A missing or
/// empty file opens as empty registries.
pub struct FileRegistry {
    path: PathBuf,
    data: Mutex<RegistryData>,
}

impl FileRegistry {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let data = load_registry_file(&path)?.unwrap_or_default();
        Ok(Self {
            path,
            data: Mutex::new(data),
        })
    }

    fn persist(&self, data: &RegistryData) -> Result<()> {
        let txt = serde_json::to_string(data)?;
        std::fs::write(&self.path, txt)?;
        Ok(())
    }
}

fn load_registry_file(path: &Path) -> Result<Option<RegistryData>> {
    if !path.exists() {
        return Ok(None);
    }
    let txt = std::fs::read_to_string(path)?;
    if txt.trim().is_empty() {
        return Ok(None);
    }
    let data: RegistryData = serde_json::from_str(&txt)?;
    Ok(Some(data))
}

fn next_id(data: &mut RegistryData) -> u64 {
    data.next_id += 1;
    data.next_id
}

#[async_trait]
impl RegistryStore for FileRegistry {
    async fn all_moderators(&self) -> Result<Vec<Moderator>> {
        Ok(self.data.lock().await.moderators.clone())
    }

    async fn find_moderator(&self, telegram_id: &str) -> Result<Option<Moderator>> {
        let data = self.data.lock().await;
        Ok(data
            .moderators
            .iter()
            .find(|m| m.telegram_id == telegram_id)
            .cloned())
    }

    async fn insert_moderator(&self, telegram_id: &str) -> Result<Moderator> {
        let mut data = self.data.lock().await;
        let id = next_id(&mut data);
        let moderator = Moderator {
            id,
            telegram_id: telegram_id.to_string(),
        };
        data.moderators.push(moderator.clone());
        self.persist(&data)?;
        Ok(moderator)
    }

    async fn delete_moderator(&self, telegram_id: &str) -> Result<()> {
        let mut data = self.data.lock().await;
        data.moderators.retain(|m| m.telegram_id != telegram_id);
        self.persist(&data)
    }

    async fn find_assignment(&self, customer: &str) -> Result<Option<ResponsibleAssignment>> {
        let data = self.data.lock().await;
        Ok(data
            .assignments
            .iter()
            .find(|a| a.customer == customer)
            .cloned())
    }

    async fn upsert_assignment(
        &self,
        customer: &str,
        responsible: &str,
    ) -> Result<ResponsibleAssignment> {
        let mut data = self.data.lock().await;
        if let Some(idx) = data.assignments.iter().position(|a| a.customer == customer) {
            data.assignments[idx].responsible = responsible.to_string();
            let updated = data.assignments[idx].clone();
            self.persist(&data)?;
            return Ok(updated);
        }

        let id = next_id(&mut data);
        let created = ResponsibleAssignment {
            id,
            customer: customer.to_string(),
            responsible: responsible.to_string(),
        };
        data.assignments.push(created.clone());
        self.persist(&data)?;
        Ok(created)
    }

    async fn delete_assignment(&self, customer: &str) -> Result<()> {
        let mut data = self.data.lock().await;
        data.assignments.retain(|a| a.customer != customer);
        self.persist(&data)
    }

    async fn subscriptions_for_customer(&self, customer: &str) -> Result<Vec<Subscription>> {
        let data = self.data.lock().await;
        Ok(data
            .subscriptions
            .iter()
            .filter(|s| s.customer == customer)
            .cloned()
            .collect())
    }

    async fn find_subscription(
        &self,
        customer: &str,
        telegram_id: &str,
    ) -> Result<Option<Subscription>> {
        let data = self.data.lock().await;
        Ok(data
            .subscriptions
            .iter()
            .find(|s| s.customer == customer && s.telegram_id == telegram_id)
            .cloned())
    }

    async fn insert_subscription(&self, customer: &str, telegram_id: &str) -> Result<Subscription> {
        let mut data = self.data.lock().await;
        let id = next_id(&mut data);
        let subscription = Subscription {
            id,
            customer: customer.to_string(),
            telegram_id: telegram_id.to_string(),
        };
        data.subscriptions.push(subscription.clone());
        self.persist(&data)?;
        Ok(subscription)
    }

    async fn delete_subscription(&self, customer: &str, telegram_id: &str) -> Result<()> {
        let mut data = self.data.lock().await;
        data.subscriptions
            .retain(|s| !(s.customer == customer && s.telegram_id == telegram_id));
        self.persist(&data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tmp(prefix: &str) -> PathBuf {
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let pid = std::process::id();
        PathBuf::from(format!("/tmp/{prefix}-{pid}-{ts}.json"))
    }

    #[tokio::test]
    async fn missing_file_opens_empty() {
        let store = FileRegistry::open(tmp("cnb-reg-empty")).unwrap();
        assert!(store.all_moderators().await.unwrap().is_empty());
        assert!(store.find_assignment("ACME").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn moderator_roundtrip() {
        let store = FileRegistry::open(tmp("cnb-reg-mod")).unwrap();

        let m = store.insert_moderator("7").await.unwrap();
        assert_eq!(m.telegram_id, "7");
        assert!(store.find_moderator("7").await.unwrap().is_some());

        store.delete_moderator("7").await.unwrap();
        assert!(store.find_moderator("7").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn upsert_assignment_overwrites_in_place() {
        let store = FileRegistry::open(tmp("cnb-reg-asg")).unwrap();

        let first = store.upsert_assignment("ACME", "bob").await.unwrap();
        let second = store.upsert_assignment("ACME", "carol").await.unwrap();
        assert_eq!(first.id, second.id);

        let found = store.find_assignment("ACME").await.unwrap().unwrap();
        assert_eq!(found.responsible, "carol");
        assert_eq!(store.data.lock().await.assignments.len(), 1);
    }

    #[tokio::test]
    async fn subscription_is_keyed_by_customer_and_identity() {
        let store = FileRegistry::open(tmp("cnb-reg-sub")).unwrap();

        store.insert_subscription("ACME", "42").await.unwrap();
        store.insert_subscription("OTHER", "42").await.unwrap();

        assert!(store.find_subscription("ACME", "42").await.unwrap().is_some());
        assert!(store.find_subscription("ACME", "7").await.unwrap().is_none());
        assert_eq!(
            store.subscriptions_for_customer("ACME").await.unwrap().len(),
            1
        );

        store.delete_subscription("ACME", "42").await.unwrap();
        assert!(store.find_subscription("ACME", "42").await.unwrap().is_none());
        assert!(store
            .find_subscription("OTHER", "42")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn records_survive_reopen() {
        let path = tmp("cnb-reg-reopen");

        {
            let store = FileRegistry::open(&path).unwrap();
            store.insert_moderator("7").await.unwrap();
            store.upsert_assignment("ACME", "bob").await.unwrap();
            store.insert_subscription("ACME", "42").await.unwrap();
        }

        let reopened = FileRegistry::open(&path).unwrap();
        assert!(reopened.find_moderator("7").await.unwrap().is_some());
        assert_eq!(
            reopened
                .find_assignment("ACME")
                .await
                .unwrap()
                .unwrap()
                .responsible,
            "bob"
        );
        assert!(reopened
            .find_subscription("ACME", "42")
            .await
            .unwrap()
            .is_some());

        // Ids keep counting after a reopen.
        let next = reopened.insert_moderator("8").await.unwrap();
        assert_eq!(next.id, 4);
    }
}
