//! Segment CRUD, preview, dispatch, and delivery stats endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::SegmentId;
use delivery::{AudiencePreview, DeliveryChannel, DeliveryStats, DispatchSummary};
use domain::store::DeliveryStore;
use domain::{DeliveryRecord, NewSegment, Segment, SegmentRule, UpdateSegment};
use serde::{Deserialize, Serialize};

use super::{AppState, parse_id};
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct PreviewRequest {
    pub rules: Vec<SegmentRule>,
}

// -- Response types --

#[derive(Serialize)]
pub struct SegmentResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub rules: Vec<SegmentRule>,
    pub audience_size: u64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Segment> for SegmentResponse {
    fn from(segment: Segment) -> Self {
        Self {
            id: segment.id.to_string(),
            name: segment.name,
            description: segment.description,
            rules: segment.rules,
            audience_size: segment.audience_size,
            status: segment.status.to_string(),
            created_at: segment.created_at,
            updated_at: segment.updated_at,
        }
    }
}

#[derive(Serialize)]
pub struct SegmentCreatedResponse {
    pub segment: SegmentResponse,
    pub dispatch: DispatchSummary,
}

#[derive(Serialize)]
pub struct DeliveryRecordResponse {
    pub id: String,
    pub segment_id: String,
    pub customer_id: String,
    pub message: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub failure_reason: Option<String>,
}

impl From<DeliveryRecord> for DeliveryRecordResponse {
    fn from(record: DeliveryRecord) -> Self {
        Self {
            id: record.id.to_string(),
            segment_id: record.segment_id.to_string(),
            customer_id: record.customer_id.to_string(),
            message: record.message,
            status: record.status.to_string(),
            created_at: record.created_at,
            delivered_at: record.delivered_at,
            failure_reason: record.failure_reason,
        }
    }
}

// -- Handlers --

/// POST /segments — define a segment and immediately dispatch it to its
/// current audience.
#[tracing::instrument(skip(state, req))]
pub async fn create<Ch: DeliveryChannel + 'static>(
    State(state): State<Arc<AppState<Ch>>>,
    Json(req): Json<NewSegment>,
) -> Result<(StatusCode, Json<SegmentCreatedResponse>), ApiError> {
    let segment = state.segment_service.create(req).await?;
    let dispatch = state.orchestrator.dispatch(segment.id).await?;

    // Re-load to pick up the audience snapshot the dispatch froze.
    let segment = state.segment_service.get(segment.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(SegmentCreatedResponse {
            segment: segment.into(),
            dispatch,
        }),
    ))
}

/// POST /segments/preview — evaluate a rule set without dispatching.
#[tracing::instrument(skip(state, req))]
pub async fn preview<Ch: DeliveryChannel + 'static>(
    State(state): State<Arc<AppState<Ch>>>,
    Json(req): Json<PreviewRequest>,
) -> Result<Json<AudiencePreview>, ApiError> {
    let preview = state.orchestrator.preview(&req.rules).await?;
    Ok(Json(preview))
}

/// GET /segments — list all segments.
#[tracing::instrument(skip(state))]
pub async fn list<Ch: Send + Sync + 'static>(
    State(state): State<Arc<AppState<Ch>>>,
) -> Result<Json<Vec<SegmentResponse>>, ApiError> {
    let segments = state.segment_service.list().await?;
    Ok(Json(segments.into_iter().map(Into::into).collect()))
}

/// GET /segments/:id — load a segment by ID.
#[tracing::instrument(skip(state))]
pub async fn get<Ch: Send + Sync + 'static>(
    State(state): State<Arc<AppState<Ch>>>,
    Path(id): Path<String>,
) -> Result<Json<SegmentResponse>, ApiError> {
    let segment = state.segment_service.get(parse_id(&id)?).await?;
    Ok(Json(segment.into()))
}

/// PUT /segments/:id — patch a segment definition.
#[tracing::instrument(skip(state, req))]
pub async fn update<Ch: Send + Sync + 'static>(
    State(state): State<Arc<AppState<Ch>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateSegment>,
) -> Result<Json<SegmentResponse>, ApiError> {
    let segment = state.segment_service.update(parse_id(&id)?, req).await?;
    Ok(Json(segment.into()))
}

/// DELETE /segments/:id — remove a segment and its delivery records.
#[tracing::instrument(skip(state))]
pub async fn delete<Ch: Send + Sync + 'static>(
    State(state): State<Arc<AppState<Ch>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.segment_service.delete(parse_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /segments/:id/dispatch — re-dispatch a segment to its current
/// audience.
#[tracing::instrument(skip(state))]
pub async fn dispatch<Ch: DeliveryChannel + 'static>(
    State(state): State<Arc<AppState<Ch>>>,
    Path(id): Path<String>,
) -> Result<Json<DispatchSummary>, ApiError> {
    let summary = state.orchestrator.dispatch(parse_id(&id)?).await?;
    Ok(Json(summary))
}

/// GET /segments/:id/stats — aggregate delivery counts for a segment.
#[tracing::instrument(skip(state))]
pub async fn stats<Ch: DeliveryChannel + 'static>(
    State(state): State<Arc<AppState<Ch>>>,
    Path(id): Path<String>,
) -> Result<Json<DeliveryStats>, ApiError> {
    let stats = state.orchestrator.delivery_stats(parse_id(&id)?).await?;
    Ok(Json(stats))
}

/// GET /segments/:id/deliveries — per-recipient delivery records for a
/// segment, oldest first.
#[tracing::instrument(skip(state))]
pub async fn deliveries<Ch: Send + Sync + 'static>(
    State(state): State<Arc<AppState<Ch>>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<DeliveryRecordResponse>>, ApiError> {
    let segment_id: SegmentId = parse_id(&id)?;

    // Surface a 404 for unknown segments rather than an empty list.
    state.segment_service.get(segment_id).await?;

    let records = state
        .deliveries
        .list_for_segment(segment_id)
        .await
        .map_err(domain::DomainError::from)?;
    Ok(Json(records.into_iter().map(Into::into).collect()))
}
