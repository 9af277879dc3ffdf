//! In-memory delivery record store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{DeliveryId, SegmentId};
use domain::store::{DeliveryStore, Result, StoreError};
use domain::DeliveryRecord;
use tokio::sync::RwLock;

/// In-memory delivery record store.
///
/// Updates replace the whole record; concurrent duplicate outcomes for
/// the same record therefore resolve last-write-wins.
#[derive(Clone, Default)]
pub struct InMemoryDeliveryStore {
    records: Arc<RwLock<HashMap<DeliveryId, DeliveryRecord>>>,
}

impl InMemoryDeliveryStore {
    /// Creates a new empty delivery store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of delivery records stored.
    pub async fn count(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl DeliveryStore for InMemoryDeliveryStore {
    async fn insert(&self, record: DeliveryRecord) -> Result<()> {
        self.records.write().await.insert(record.id, record);
        Ok(())
    }

    async fn get(&self, id: DeliveryId) -> Result<Option<DeliveryRecord>> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn update(&self, record: DeliveryRecord) -> Result<()> {
        let mut records = self.records.write().await;
        if !records.contains_key(&record.id) {
            return Err(StoreError::NotFound {
                entity: "delivery record",
                id: record.id.to_string(),
            });
        }
        records.insert(record.id, record);
        Ok(())
    }

    async fn list_for_segment(&self, segment_id: SegmentId) -> Result<Vec<DeliveryRecord>> {
        let records = self.records.read().await;
        let mut matching: Vec<_> = records
            .values()
            .filter(|r| r.segment_id == segment_id)
            .cloned()
            .collect();
        matching.sort_by_key(|r| r.created_at);
        Ok(matching)
    }

    async fn delete_for_segment(&self, segment_id: SegmentId) -> Result<usize> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, r| r.segment_id != segment_id);
        Ok(before - records.len())
    }
}
