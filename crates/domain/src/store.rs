//! Store traits (ports) for the persistence seam.
//!
//! The domain services and the delivery pipeline are generic over these
//! traits; the `store` crate provides the in-memory implementations.
//! All implementations must be thread-safe (Send + Sync).

use async_trait::async_trait;
use common::{CustomerId, DeliveryId, SegmentId};
use thiserror::Error;

use crate::customer::Customer;
use crate::delivery_record::DeliveryRecord;
use crate::segment::Segment;
use crate::transaction::Transaction;

/// Errors that can occur when interacting with a store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique-constraint conflict on the customer contact address.
    #[error("customer with email '{0}' already exists")]
    DuplicateEmail(String),

    /// The targeted record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A low-level storage failure, wrapped so callers never see
    /// backend-specific error types.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Persistence for customer records.
#[async_trait]
pub trait CustomerStore: Send + Sync {
    /// Inserts a new customer.
    ///
    /// Fails with [`StoreError::DuplicateEmail`] when the email is taken.
    async fn insert(&self, customer: Customer) -> Result<()>;

    /// Retrieves a customer by ID.
    async fn get(&self, id: CustomerId) -> Result<Option<Customer>>;

    /// Lists all customers.
    async fn list(&self) -> Result<Vec<Customer>>;

    /// Replaces an existing customer record by ID.
    ///
    /// The email uniqueness constraint also applies here.
    async fn update(&self, customer: Customer) -> Result<()>;

    /// Deletes a customer by ID.
    async fn delete(&self, id: CustomerId) -> Result<()>;
}

/// Persistence for the append-only transaction history.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Appends a transaction to its customer's history.
    async fn insert(&self, transaction: Transaction) -> Result<()>;

    /// Returns a customer's full history, oldest first.
    async fn list_for_customer(&self, customer_id: CustomerId) -> Result<Vec<Transaction>>;
}

/// Persistence for segment definitions.
#[async_trait]
pub trait SegmentStore: Send + Sync {
    /// Inserts a new segment.
    async fn insert(&self, segment: Segment) -> Result<()>;

    /// Retrieves a segment by ID.
    async fn get(&self, id: SegmentId) -> Result<Option<Segment>>;

    /// Lists all segments.
    async fn list(&self) -> Result<Vec<Segment>>;

    /// Replaces an existing segment record by ID.
    async fn update(&self, segment: Segment) -> Result<()>;

    /// Deletes a segment by ID.
    async fn delete(&self, id: SegmentId) -> Result<()>;
}

/// Persistence for per-recipient delivery records.
///
/// Mutated by two independent actors: the orchestrator creates records,
/// the reconciler updates them. No record is ever targeted by two
/// concurrent creations; concurrent updates to the same record resolve
/// last-write-wins.
#[async_trait]
pub trait DeliveryStore: Send + Sync {
    /// Inserts a new delivery record.
    async fn insert(&self, record: DeliveryRecord) -> Result<()>;

    /// Retrieves a delivery record by ID.
    async fn get(&self, id: DeliveryId) -> Result<Option<DeliveryRecord>>;

    /// Replaces an existing delivery record by ID.
    async fn update(&self, record: DeliveryRecord) -> Result<()>;

    /// Lists all delivery records created for a segment, across every
    /// dispatch of that segment.
    async fn list_for_segment(&self, segment_id: SegmentId) -> Result<Vec<DeliveryRecord>>;

    /// Deletes all delivery records for a segment, returning how many
    /// were removed. Used when the owning segment is deleted.
    async fn delete_for_segment(&self, segment_id: SegmentId) -> Result<usize>;
}
