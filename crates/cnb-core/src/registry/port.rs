use async_trait::async_trait;

use crate::{
    registry::types::{Moderator, ResponsibleAssignment, Subscription},
    Result,
};

/// Key-based CRUD over the three registry record kinds.
///
/// The store holds no command logic: existence checks for moderators and
/// subscriptions happen in the command router, which re-reads current state
/// before every create/delete. Assignment writes are the one upsert, because
/// the at-most-one-per-customer invariant lives on that key.
#[async_trait]
pub trait RegistryStore: Send + Sync {
    async fn all_moderators(&self) -> Result<Vec<Moderator>>;
    async fn find_moderator(&self, telegram_id: &str) -> Result<Option<Moderator>>;
    async fn insert_moderator(&self, telegram_id: &str) -> Result<Moderator>;
    async fn delete_moderator(&self, telegram_id: &str) -> Result<()>;

    async fn find_assignment(&self, customer: &str) -> Result<Option<ResponsibleAssignment>>;
    async fn upsert_assignment(
        &self,
        customer: &str,
        responsible: &str,
    ) -> Result<ResponsibleAssignment>;
    async fn delete_assignment(&self, customer: &str) -> Result<()>;

    async fn subscriptions_for_customer(&self, customer: &str) -> Result<Vec<Subscription>>;
    async fn find_subscription(
        &self,
        customer: &str,
        telegram_id: &str,
    ) -> Result<Option<Subscription>>;
    async fn insert_subscription(&self, customer: &str, telegram_id: &str) -> Result<Subscription>;
    async fn delete_subscription(&self, customer: &str, telegram_id: &str) -> Result<()>;
}
