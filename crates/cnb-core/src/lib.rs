//! Core domain + application logic for the customer notification bot.
//!
//! This crate is intentionally transport-agnostic. Telegram and the HTTP
//! ingestion endpoint live behind ports (traits) implemented in adapter crates.

pub mod auth;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod notify;
pub mod registry;
pub mod transport;

pub use errors::{Error, Result};
