//! HTTP ingestion boundary.
//!
//! Accepts batches of customer-info records and hands each one to the
//! notification dispatcher. Bad records are logged and skipped; the caller
//! always gets a plain acknowledgment.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;
use tracing::{info, warn};

use cnb_core::{domain::CustomerInfoRecord, errors::Error, notify::NotificationDispatcher, Result};

#[derive(Clone)]
struct AppState {
    dispatcher: Arc<NotificationDispatcher>,
}

pub fn build_app(dispatcher: Arc<NotificationDispatcher>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/process", post(process))
        .with_state(AppState { dispatcher })
}

pub async fn serve(addr: &str, dispatcher: Arc<NotificationDispatcher>) -> Result<()> {
    let addr: SocketAddr = addr
        .parse()
        .map_err(|e| Error::Config(format!("invalid ingest listen address: {e}")))?;
    let app = build_app(dispatcher);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("ingest listening on {addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn healthz() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

/// Each batch entry is validated into a `CustomerInfoRecord` before it can
/// reach the formatter. A record that fails validation, or whose fan-out
/// fails, is logged and does not abort the rest of the batch.
async fn process(
    State(state): State<AppState>,
    Json(batch): Json<Vec<Value>>,
) -> (StatusCode, &'static str) {
    for (idx, raw) in batch.into_iter().enumerate() {
        let record: CustomerInfoRecord = match serde_json::from_value(raw) {
            Ok(r) => r,
            Err(err) => {
                warn!("skipping malformed record at index {idx}: {err}");
                continue;
            }
        };
        if let Err(err) = state.dispatcher.dispatch(&record).await {
            warn!("dispatch failed for record at index {idx}: {err}");
        }
    }
    (StatusCode::OK, "Processed")
}
