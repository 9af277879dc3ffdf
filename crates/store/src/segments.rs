//! In-memory segment store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::SegmentId;
use domain::store::{Result, SegmentStore, StoreError};
use domain::Segment;
use tokio::sync::RwLock;

/// In-memory segment store.
#[derive(Clone, Default)]
pub struct InMemorySegmentStore {
    segments: Arc<RwLock<HashMap<SegmentId, Segment>>>,
}

impl InMemorySegmentStore {
    /// Creates a new empty segment store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of segments stored.
    pub async fn count(&self) -> usize {
        self.segments.read().await.len()
    }
}

#[async_trait]
impl SegmentStore for InMemorySegmentStore {
    async fn insert(&self, segment: Segment) -> Result<()> {
        self.segments.write().await.insert(segment.id, segment);
        Ok(())
    }

    async fn get(&self, id: SegmentId) -> Result<Option<Segment>> {
        Ok(self.segments.read().await.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Segment>> {
        let segments = self.segments.read().await;
        let mut all: Vec<_> = segments.values().cloned().collect();
        all.sort_by_key(|s| s.created_at);
        Ok(all)
    }

    async fn update(&self, segment: Segment) -> Result<()> {
        let mut segments = self.segments.write().await;
        if !segments.contains_key(&segment.id) {
            return Err(StoreError::NotFound {
                entity: "segment",
                id: segment.id.to_string(),
            });
        }
        segments.insert(segment.id, segment);
        Ok(())
    }

    async fn delete(&self, id: SegmentId) -> Result<()> {
        let mut segments = self.segments.write().await;
        match segments.remove(&id) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound {
                entity: "segment",
                id: id.to_string(),
            }),
        }
    }
}
