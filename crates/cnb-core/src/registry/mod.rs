//! Durable registries (moderators, responsible assignments, subscriptions)
//! behind a small key-based CRUD port.

pub mod file;
pub mod port;
pub mod types;
