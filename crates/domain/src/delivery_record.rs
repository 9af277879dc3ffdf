//! Per-recipient delivery record and its status state machine.

use chrono::{DateTime, Utc};
use common::{CustomerId, DeliveryId, SegmentId};
use serde::{Deserialize, Serialize};

/// The state of a delivery record.
///
/// State transitions:
/// ```text
/// Pending ──┬──► Sent
///           └──► Failed
/// ```
///
/// Terminal states are not guarded against re-application: a duplicate
/// outcome overwrites the record last-write-wins (see
/// [`DeliveryRecord::apply_outcome`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeliveryStatus {
    /// Dispatch has been recorded; no outcome reported yet.
    #[default]
    Pending,

    /// The channel reported a successful delivery.
    Sent,

    /// The channel reported a failed delivery.
    Failed,
}

impl DeliveryStatus {
    /// Returns true if an outcome has been reported.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DeliveryStatus::Sent | DeliveryStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "PENDING",
            DeliveryStatus::Sent => "SENT",
            DeliveryStatus::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The terminal status carried by a receipt; there is no pending outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OutcomeStatus {
    Sent,
    Failed,
}

/// An asynchronous outcome report from the delivery channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryOutcome {
    /// Whether the send succeeded.
    pub status: OutcomeStatus,

    /// When the channel handled the message; reconciliation time is
    /// used when absent.
    pub timestamp: Option<DateTime<Utc>>,

    /// Human-readable failure reason, for failed outcomes.
    pub failure_reason: Option<String>,
}

impl DeliveryOutcome {
    /// A successful outcome reported at the given time.
    pub fn sent(at: DateTime<Utc>) -> Self {
        Self {
            status: OutcomeStatus::Sent,
            timestamp: Some(at),
            failure_reason: None,
        }
    }

    /// A failed outcome with a reason, reported at the given time.
    pub fn failed(reason: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            status: OutcomeStatus::Failed,
            timestamp: Some(at),
            failure_reason: Some(reason.into()),
        }
    }
}

/// Tracking entity for one dispatched message to one recipient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryRecord {
    /// Unique delivery record ID.
    pub id: DeliveryId,

    /// The segment whose dispatch created this record.
    pub segment_id: SegmentId,

    /// The recipient.
    pub customer_id: CustomerId,

    /// Rendered message body sent to the channel.
    pub message: String,

    /// Current state.
    pub status: DeliveryStatus,

    /// When the dispatch was recorded.
    pub created_at: DateTime<Utc>,

    /// When the outcome was reported; `None` while pending.
    pub delivered_at: Option<DateTime<Utc>>,

    /// Failure reason from the most recent outcome, if any.
    pub failure_reason: Option<String>,
}

impl DeliveryRecord {
    /// Creates a new pending record for one recipient.
    pub fn new(segment_id: SegmentId, customer_id: CustomerId, message: impl Into<String>) -> Self {
        Self {
            id: DeliveryId::new(),
            segment_id,
            customer_id,
            message: message.into(),
            status: DeliveryStatus::Pending,
            created_at: Utc::now(),
            delivered_at: None,
            failure_reason: None,
        }
    }

    /// Folds an outcome onto the record.
    ///
    /// Status, delivery timestamp, and failure reason are all replaced
    /// with the outcome's values — last-write-wins, even if the record
    /// was already terminal. Callers needing exactly-once semantics
    /// must dedupe upstream.
    pub fn apply_outcome(&mut self, outcome: &DeliveryOutcome, now: DateTime<Utc>) {
        self.status = match outcome.status {
            OutcomeStatus::Sent => DeliveryStatus::Sent,
            OutcomeStatus::Failed => DeliveryStatus::Failed,
        };
        self.delivered_at = Some(outcome.timestamp.unwrap_or(now));
        self.failure_reason = outcome.failure_reason.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending_record() -> DeliveryRecord {
        DeliveryRecord::new(SegmentId::new(), CustomerId::new(), "Hi Ada!")
    }

    #[test]
    fn test_new_record_is_pending() {
        let record = pending_record();
        assert_eq!(record.status, DeliveryStatus::Pending);
        assert!(record.delivered_at.is_none());
        assert!(record.failure_reason.is_none());
    }

    #[test]
    fn test_sent_outcome_sets_reported_timestamp() {
        let mut record = pending_record();
        let reported = Utc::now();

        record.apply_outcome(&DeliveryOutcome::sent(reported), Utc::now());

        assert_eq!(record.status, DeliveryStatus::Sent);
        assert_eq!(record.delivered_at, Some(reported));
        assert!(record.failure_reason.is_none());
    }

    #[test]
    fn test_outcome_without_timestamp_defaults_to_now() {
        let mut record = pending_record();
        let now = Utc::now();
        let outcome = DeliveryOutcome {
            status: OutcomeStatus::Sent,
            timestamp: None,
            failure_reason: None,
        };

        record.apply_outcome(&outcome, now);
        assert_eq!(record.delivered_at, Some(now));
    }

    #[test]
    fn test_duplicate_outcome_overwrites_terminal_record() {
        let mut record = pending_record();
        let t1 = Utc::now();
        record.apply_outcome(&DeliveryOutcome::sent(t1), t1);
        assert_eq!(record.status, DeliveryStatus::Sent);

        let t2 = Utc::now();
        record.apply_outcome(&DeliveryOutcome::failed("network timeout", t2), t2);

        assert_eq!(record.status, DeliveryStatus::Failed);
        assert_eq!(record.delivered_at, Some(t2));
        assert_eq!(record.failure_reason.as_deref(), Some("network timeout"));
    }

    #[test]
    fn test_terminal_states() {
        assert!(!DeliveryStatus::Pending.is_terminal());
        assert!(DeliveryStatus::Sent.is_terminal());
        assert!(DeliveryStatus::Failed.is_terminal());
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&DeliveryStatus::Pending).unwrap(),
            "\"PENDING\""
        );
        let status: OutcomeStatus = serde_json::from_str("\"FAILED\"").unwrap();
        assert_eq!(status, OutcomeStatus::Failed);
    }
}
