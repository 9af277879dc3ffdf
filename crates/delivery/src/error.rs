//! Delivery pipeline error types.

use common::{DeliveryId, SegmentId};
use domain::store::StoreError;
use thiserror::Error;

/// Errors that can occur during dispatch or reconciliation.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Segment not found.
    #[error("Segment not found: {0}")]
    SegmentNotFound(SegmentId),

    /// Delivery record not found; the receipt had no record to target.
    #[error("Delivery record not found: {0}")]
    RecordNotFound(DeliveryId),

    /// The channel rejected a send before acknowledging it.
    #[error("Channel error: {0}")]
    Channel(String),

    /// An error occurred in a store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
