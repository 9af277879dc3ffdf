//! Domain layer for the audience targeting and delivery pipeline.
//!
//! This crate provides:
//! - The customer, transaction, segment, and delivery record model
//! - The rule engine deciding segment membership
//! - The statistics aggregator deriving activity profiles from history
//! - Store traits (ports) implemented by the `store` crate
//! - Record services wrapping the stores with domain semantics

pub mod customer;
pub mod delivery_record;
pub mod error;
pub mod money;
pub mod rules;
pub mod segment;
pub mod services;
pub mod stats;
pub mod store;
pub mod transaction;

pub use customer::{ActivityProfile, Customer};
pub use delivery_record::{DeliveryOutcome, DeliveryRecord, DeliveryStatus, OutcomeStatus};
pub use error::DomainError;
pub use money::Money;
pub use rules::{RuleField, RuleLogic, RuleOperator, SegmentRule, evaluate};
pub use segment::{Segment, SegmentStatus};
pub use services::{
    BulkItemError, BulkOutcome, BulkSummary, CustomerService, NewCustomer, NewSegment,
    NewTransaction, SegmentService, TransactionService, UpdateCustomer, UpdateSegment,
};
pub use stats::{StatsAggregator, recompute_profile};
pub use store::{CustomerStore, DeliveryStore, SegmentStore, StoreError, TransactionStore};
pub use transaction::Transaction;
