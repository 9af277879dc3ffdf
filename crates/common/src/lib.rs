//! Shared identifier types used across the audience delivery pipeline.

pub mod types;

pub use types::{CustomerId, DeliveryId, SegmentId, TransactionId};
