//! Customer CRUD and bulk import endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use domain::{BulkItemError, BulkOutcome, BulkSummary, Customer, NewCustomer, UpdateCustomer};
use serde::Serialize;

use super::{AppState, parse_id};
use crate::error::ApiError;

// -- Response types --

#[derive(Serialize)]
pub struct CustomerResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub total_spend_cents: i64,
    pub visit_count: u64,
    pub last_active: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Customer> for CustomerResponse {
    fn from(customer: Customer) -> Self {
        Self {
            id: customer.id.to_string(),
            name: customer.name,
            email: customer.email,
            phone: customer.phone,
            total_spend_cents: customer.activity.total_spend.cents(),
            visit_count: customer.activity.visit_count,
            last_active: customer.activity.last_active,
            created_at: customer.created_at,
            updated_at: customer.updated_at,
        }
    }
}

#[derive(Serialize)]
pub struct BulkResponse<T> {
    pub summary: BulkSummary,
    pub created: Vec<T>,
    pub errors: Vec<BulkItemError>,
}

impl From<BulkOutcome<Customer>> for BulkResponse<CustomerResponse> {
    fn from(outcome: BulkOutcome<Customer>) -> Self {
        Self {
            summary: outcome.summary(),
            created: outcome.created.into_iter().map(Into::into).collect(),
            errors: outcome.errors,
        }
    }
}

// -- Handlers --

/// POST /customers — register a new customer.
#[tracing::instrument(skip(state, req))]
pub async fn create<Ch: Send + Sync + 'static>(
    State(state): State<Arc<AppState<Ch>>>,
    Json(req): Json<NewCustomer>,
) -> Result<(StatusCode, Json<CustomerResponse>), ApiError> {
    let customer = state.customer_service.create(req).await?;
    Ok((StatusCode::CREATED, Json(customer.into())))
}

/// POST /customers/bulk — register a batch of customers.
#[tracing::instrument(skip(state, req))]
pub async fn bulk_create<Ch: Send + Sync + 'static>(
    State(state): State<Arc<AppState<Ch>>>,
    Json(req): Json<Vec<NewCustomer>>,
) -> Result<Json<BulkResponse<CustomerResponse>>, ApiError> {
    let outcome = state.customer_service.bulk_create(req).await;
    Ok(Json(outcome.into()))
}

/// GET /customers — list all customers.
#[tracing::instrument(skip(state))]
pub async fn list<Ch: Send + Sync + 'static>(
    State(state): State<Arc<AppState<Ch>>>,
) -> Result<Json<Vec<CustomerResponse>>, ApiError> {
    let customers = state.customer_service.list().await?;
    Ok(Json(customers.into_iter().map(Into::into).collect()))
}

/// GET /customers/:id — load a customer by ID.
#[tracing::instrument(skip(state))]
pub async fn get<Ch: Send + Sync + 'static>(
    State(state): State<Arc<AppState<Ch>>>,
    Path(id): Path<String>,
) -> Result<Json<CustomerResponse>, ApiError> {
    let customer = state.customer_service.get(parse_id(&id)?).await?;
    Ok(Json(customer.into()))
}

/// PUT /customers/:id — patch a customer's identity fields.
#[tracing::instrument(skip(state, req))]
pub async fn update<Ch: Send + Sync + 'static>(
    State(state): State<Arc<AppState<Ch>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateCustomer>,
) -> Result<Json<CustomerResponse>, ApiError> {
    let customer = state.customer_service.update(parse_id(&id)?, req).await?;
    Ok(Json(customer.into()))
}

/// DELETE /customers/:id — remove a customer.
#[tracing::instrument(skip(state))]
pub async fn delete<Ch: Send + Sync + 'static>(
    State(state): State<Arc<AppState<Ch>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.customer_service.delete(parse_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}
