//! Aggregate delivery counts per segment.

use domain::{DeliveryRecord, DeliveryStatus};
use serde::Serialize;

/// Per-segment delivery counts, aggregated by status.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DeliveryStats {
    pub total: usize,
    pub sent: usize,
    pub failed: usize,
    pub pending: usize,

    /// sent / total × 100, rounded to one decimal; 0 when there are no
    /// records.
    pub success_rate_percent: f64,
}

impl DeliveryStats {
    /// Folds a segment's delivery records into aggregate counts.
    pub fn from_records(records: &[DeliveryRecord]) -> Self {
        let mut sent = 0;
        let mut failed = 0;
        let mut pending = 0;

        for record in records {
            match record.status {
                DeliveryStatus::Sent => sent += 1,
                DeliveryStatus::Failed => failed += 1,
                DeliveryStatus::Pending => pending += 1,
            }
        }

        let total = records.len();
        let success_rate_percent = if total == 0 {
            0.0
        } else {
            (sent as f64 / total as f64 * 1000.0).round() / 10.0
        };

        Self {
            total,
            sent,
            failed,
            pending,
            success_rate_percent,
        }
    }
}
