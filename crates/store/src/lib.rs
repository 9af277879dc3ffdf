//! In-memory implementations of the domain store traits.
//!
//! These back the running service as well as the test suites. Each
//! store keeps its records behind an `Arc<RwLock<..>>` so handles can
//! be cloned freely across the orchestrator, the reconciler, and the
//! HTTP layer.

pub mod customers;
pub mod deliveries;
pub mod segments;
pub mod transactions;

pub use customers::InMemoryCustomerStore;
pub use deliveries::InMemoryDeliveryStore;
pub use segments::InMemorySegmentStore;
pub use transactions::InMemoryTransactionStore;
