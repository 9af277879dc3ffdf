//! Route handlers and shared application state.

pub mod customers;
pub mod health;
pub mod metrics;
pub mod receipts;
pub mod segments;
pub mod transactions;

use delivery::{DeliveryOrchestrator, ReceiptReconciler};
use domain::{CustomerService, SegmentService, TransactionService};
use store::{
    InMemoryCustomerStore, InMemoryDeliveryStore, InMemorySegmentStore, InMemoryTransactionStore,
};
use uuid::Uuid;

use crate::error::ApiError;

/// Shared application state accessible from all handlers, generic over
/// the delivery channel implementation.
pub struct AppState<Ch> {
    pub customer_service: CustomerService<InMemoryCustomerStore>,
    pub transaction_service: TransactionService<InMemoryTransactionStore, InMemoryCustomerStore>,
    pub segment_service: SegmentService<InMemorySegmentStore, InMemoryDeliveryStore>,
    pub orchestrator: DeliveryOrchestrator<
        InMemoryCustomerStore,
        InMemorySegmentStore,
        InMemoryDeliveryStore,
        Ch,
    >,
    pub reconciler: ReceiptReconciler<InMemoryDeliveryStore>,
    pub deliveries: InMemoryDeliveryStore,
}

/// Parses a path segment as a typed UUID identifier.
fn parse_id<T: From<Uuid>>(raw: &str) -> Result<T, ApiError> {
    let uuid = Uuid::parse_str(raw)
        .map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))?;
    Ok(T::from(uuid))
}
