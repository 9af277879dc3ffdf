//! Transaction recording endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use domain::{BulkOutcome, NewTransaction, Transaction};
use serde::Serialize;

use super::customers::BulkResponse;
use super::{AppState, parse_id};
use crate::error::ApiError;

#[derive(Serialize)]
pub struct TransactionResponse {
    pub id: String,
    pub customer_id: String,
    pub amount_cents: i64,
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<Transaction> for TransactionResponse {
    fn from(transaction: Transaction) -> Self {
        Self {
            id: transaction.id.to_string(),
            customer_id: transaction.customer_id.to_string(),
            amount_cents: transaction.amount.cents(),
            occurred_at: transaction.occurred_at,
            created_at: transaction.created_at,
        }
    }
}

impl From<BulkOutcome<Transaction>> for BulkResponse<TransactionResponse> {
    fn from(outcome: BulkOutcome<Transaction>) -> Self {
        Self {
            summary: outcome.summary(),
            created: outcome.created.into_iter().map(Into::into).collect(),
            errors: outcome.errors,
        }
    }
}

/// POST /transactions — record a transaction and refresh the customer's
/// activity profile.
#[tracing::instrument(skip(state, req))]
pub async fn create<Ch: Send + Sync + 'static>(
    State(state): State<Arc<AppState<Ch>>>,
    Json(req): Json<NewTransaction>,
) -> Result<(StatusCode, Json<TransactionResponse>), ApiError> {
    let transaction = state.transaction_service.create(req).await?;
    Ok((StatusCode::CREATED, Json(transaction.into())))
}

/// POST /transactions/bulk — record a batch of transactions.
#[tracing::instrument(skip(state, req))]
pub async fn bulk_create<Ch: Send + Sync + 'static>(
    State(state): State<Arc<AppState<Ch>>>,
    Json(req): Json<Vec<NewTransaction>>,
) -> Result<Json<BulkResponse<TransactionResponse>>, ApiError> {
    let outcome = state.transaction_service.bulk_create(req).await;
    Ok(Json(outcome.into()))
}

/// GET /customers/:id/transactions — a customer's history, oldest first.
#[tracing::instrument(skip(state))]
pub async fn list_for_customer<Ch: Send + Sync + 'static>(
    State(state): State<Arc<AppState<Ch>>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<TransactionResponse>>, ApiError> {
    let transactions = state
        .transaction_service
        .list_for_customer(parse_id(&id)?)
        .await?;
    Ok(Json(transactions.into_iter().map(Into::into).collect()))
}
