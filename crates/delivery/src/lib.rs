//! Delivery pipeline: audience computation, fan-out dispatch, and
//! receipt reconciliation.
//!
//! The orchestrator computes the audience for a segment, persists one
//! pending delivery record per matched customer, and hands each message
//! to a [`DeliveryChannel`] without waiting for an outcome. The channel
//! reports outcomes asynchronously as [`Receipt`]s over a queue; the
//! [`ReceiptWorker`] folds them back onto the records through the
//! [`ReceiptReconciler`]. Dispatch and reconciliation are independently
//! schedulable units connected only by message passing and the shared
//! delivery record store.

pub mod channel;
pub mod error;
pub mod orchestrator;
pub mod reconciler;
pub mod stats;

pub use channel::{ChannelConfig, DeliveryChannel, OutboundMessage, Receipt, SimulatedChannel};
pub use error::DeliveryError;
pub use orchestrator::{AudiencePreview, DeliveryOrchestrator, DispatchSummary};
pub use reconciler::{ReceiptReconciler, ReceiptWorker};
pub use stats::DeliveryStats;
