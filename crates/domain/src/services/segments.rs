//! Segment record service.

use common::SegmentId;
use serde::Deserialize;

use crate::error::DomainError;
use crate::rules::SegmentRule;
use crate::segment::{Segment, SegmentStatus};
use crate::store::{DeliveryStore, SegmentStore, StoreError};

/// Payload for defining a segment.
#[derive(Debug, Clone, Deserialize)]
pub struct NewSegment {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub rules: Vec<SegmentRule>,
}

/// Partial update of a segment definition.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSegment {
    pub name: Option<String>,
    pub description: Option<String>,
    pub rules: Option<Vec<SegmentRule>>,
    pub status: Option<SegmentStatus>,
}

/// Service for managing segment definitions and their owned delivery
/// records.
pub struct SegmentService<S, D>
where
    S: SegmentStore,
    D: DeliveryStore,
{
    segments: S,
    deliveries: D,
}

impl<S, D> SegmentService<S, D>
where
    S: SegmentStore,
    D: DeliveryStore,
{
    /// Creates a new segment service over the given stores.
    pub fn new(segments: S, deliveries: D) -> Self {
        Self {
            segments,
            deliveries,
        }
    }

    /// Defines a new segment. The rule list must be non-empty.
    #[tracing::instrument(skip(self, new), fields(name = %new.name))]
    pub async fn create(&self, new: NewSegment) -> Result<Segment, DomainError> {
        if new.rules.is_empty() {
            return Err(DomainError::EmptyRuleSet);
        }

        let mut segment = Segment::new(new.name, new.rules);
        if let Some(description) = new.description {
            segment = segment.with_description(description);
        }
        self.segments.insert(segment.clone()).await?;

        tracing::info!(segment_id = %segment.id, "segment created");
        Ok(segment)
    }

    /// Retrieves a segment by ID.
    pub async fn get(&self, id: SegmentId) -> Result<Segment, DomainError> {
        self.segments
            .get(id)
            .await?
            .ok_or(DomainError::SegmentNotFound(id))
    }

    /// Lists all segments.
    pub async fn list(&self) -> Result<Vec<Segment>, DomainError> {
        Ok(self.segments.list().await?)
    }

    /// Patches a segment definition.
    ///
    /// A patched rule list must still be non-empty; the dispatch-time
    /// audience snapshot is left untouched.
    #[tracing::instrument(skip(self, update))]
    pub async fn update(
        &self,
        id: SegmentId,
        update: UpdateSegment,
    ) -> Result<Segment, DomainError> {
        let mut segment = self.get(id).await?;

        if let Some(name) = update.name {
            segment.name = name;
        }
        if let Some(description) = update.description {
            segment.description = Some(description);
        }
        if let Some(rules) = update.rules {
            if rules.is_empty() {
                return Err(DomainError::EmptyRuleSet);
            }
            segment.rules = rules;
        }
        if let Some(status) = update.status {
            segment.status = status;
        }
        segment.touch();

        self.segments.update(segment.clone()).await?;
        Ok(segment)
    }

    /// Deletes a segment and cascades to its delivery records.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: SegmentId) -> Result<(), DomainError> {
        match self.segments.delete(id).await {
            Ok(()) => {}
            Err(StoreError::NotFound { .. }) => return Err(DomainError::SegmentNotFound(id)),
            Err(other) => return Err(other.into()),
        }

        let removed = self.deliveries.delete_for_segment(id).await?;
        tracing::info!(segment_id = %id, deliveries_removed = removed, "segment deleted");
        Ok(())
    }
}
