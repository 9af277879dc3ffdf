//! Receipt callback endpoint for external delivery channels.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::DeliveryId;
use domain::{DeliveryOutcome, OutcomeStatus};
use serde::Deserialize;

use super::AppState;
use crate::error::ApiError;

/// Outcome report posted by a channel webhook.
#[derive(Deserialize)]
pub struct ReceiptCallback {
    pub delivery_id: DeliveryId,
    pub status: OutcomeStatus,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub failure_reason: Option<String>,
}

/// POST /receipts — fold a channel-reported outcome onto its delivery
/// record. Duplicate receipts overwrite, last-write-wins.
#[tracing::instrument(skip(state, req), fields(delivery_id = %req.delivery_id))]
pub async fn receive<Ch: Send + Sync + 'static>(
    State(state): State<Arc<AppState<Ch>>>,
    Json(req): Json<ReceiptCallback>,
) -> Result<StatusCode, ApiError> {
    let outcome = DeliveryOutcome {
        status: req.status,
        timestamp: req.timestamp,
        failure_reason: req.failure_reason,
    };
    state.reconciler.reconcile(req.delivery_id, &outcome).await?;
    Ok(StatusCode::NO_CONTENT)
}
