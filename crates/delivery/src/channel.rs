//! Delivery channel trait and the simulated external channel.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use common::{DeliveryId, SegmentId};
use domain::DeliveryOutcome;
use rand::Rng;
use tokio::sync::mpsc;

use crate::error::DeliveryError;

/// One message handed to the channel for one recipient.
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    /// The delivery record tracking this send.
    pub delivery_id: DeliveryId,

    /// The segment whose dispatch produced the message.
    pub segment_id: SegmentId,

    /// Recipient contact address.
    pub recipient: String,

    /// Rendered message body.
    pub body: String,
}

/// An asynchronous outcome report flowing back from the channel.
#[derive(Debug, Clone)]
pub struct Receipt {
    pub delivery_id: DeliveryId,
    pub outcome: DeliveryOutcome,
}

/// Trait for external delivery channels.
///
/// `send` must return once the channel has accepted the message; the
/// actual outcome arrives later as a [`Receipt`]. Delivery is
/// best-effort: there is no retry, no cancellation, and no ordering
/// guarantee among outcomes.
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    /// Hands one message to the channel without awaiting its outcome.
    async fn send(&self, message: OutboundMessage) -> Result<(), DeliveryError>;
}

/// Tuning for the simulated channel.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Minimum artificial latency before an outcome is produced.
    pub min_delay: Duration,

    /// Maximum artificial latency.
    pub max_delay: Duration,

    /// Probability that a send succeeds.
    pub success_rate: f64,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(4000),
            success_rate: 0.9,
        }
    }
}

impl ChannelConfig {
    /// No latency, every send succeeds. Used by tests.
    pub fn instant() -> Self {
        Self {
            min_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            success_rate: 1.0,
        }
    }
}

/// Simulated external channel.
///
/// Each accepted message spawns an independent task that sleeps a
/// bounded random delay and then emits a receipt into the worker's
/// queue. Outcomes are therefore unordered relative to dispatch order,
/// like a real third-party vendor calling back.
#[derive(Clone)]
pub struct SimulatedChannel {
    receipts: mpsc::Sender<Receipt>,
    config: ChannelConfig,
    fail_on_send: Arc<AtomicBool>,
}

impl SimulatedChannel {
    /// Creates a channel emitting receipts into the given queue.
    ///
    /// The success rate is clamped to [0.0, 1.0]; an out-of-range value
    /// would panic inside the probability draw on every send.
    pub fn new(receipts: mpsc::Sender<Receipt>, mut config: ChannelConfig) -> Self {
        config.success_rate = config.success_rate.clamp(0.0, 1.0);
        Self {
            receipts,
            config,
            fail_on_send: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Configures the channel to reject sends before acknowledgment.
    pub fn set_fail_on_send(&self, fail: bool) {
        self.fail_on_send.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl DeliveryChannel for SimulatedChannel {
    async fn send(&self, message: OutboundMessage) -> Result<(), DeliveryError> {
        if self.fail_on_send.load(Ordering::SeqCst) {
            return Err(DeliveryError::Channel("channel unavailable".to_string()));
        }

        // Draw delay and outcome up front; the thread-local rng cannot
        // be held across an await point.
        let (delay, succeeded) = {
            let mut rng = rand::rng();
            let min = self.config.min_delay.as_millis() as u64;
            let max = self.config.max_delay.as_millis() as u64;
            let delay = if max > min {
                Duration::from_millis(rng.random_range(min..=max))
            } else {
                self.config.min_delay
            };
            (delay, rng.random_bool(self.config.success_rate))
        };

        let receipts = self.receipts.clone();
        let delivery_id = message.delivery_id;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let outcome = if succeeded {
                DeliveryOutcome::sent(Utc::now())
            } else {
                DeliveryOutcome::failed("network timeout", Utc::now())
            };

            if receipts.send(Receipt { delivery_id, outcome }).await.is_err() {
                tracing::warn!(%delivery_id, "receipt queue closed; outcome dropped");
            }
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::OutcomeStatus;

    fn message() -> OutboundMessage {
        OutboundMessage {
            delivery_id: DeliveryId::new(),
            segment_id: SegmentId::new(),
            recipient: "ada@example.com".to_string(),
            body: "Hi Ada!".to_string(),
        }
    }

    #[tokio::test]
    async fn test_send_produces_receipt() {
        let (tx, mut rx) = mpsc::channel(8);
        let channel = SimulatedChannel::new(tx, ChannelConfig::instant());

        let msg = message();
        let delivery_id = msg.delivery_id;
        channel.send(msg).await.unwrap();

        let receipt = rx.recv().await.unwrap();
        assert_eq!(receipt.delivery_id, delivery_id);
        assert_eq!(receipt.outcome.status, OutcomeStatus::Sent);
        assert!(receipt.outcome.timestamp.is_some());
    }

    #[tokio::test]
    async fn test_zero_success_rate_reports_failure() {
        let (tx, mut rx) = mpsc::channel(8);
        let config = ChannelConfig {
            success_rate: 0.0,
            ..ChannelConfig::instant()
        };
        let channel = SimulatedChannel::new(tx, config);

        channel.send(message()).await.unwrap();

        let receipt = rx.recv().await.unwrap();
        assert_eq!(receipt.outcome.status, OutcomeStatus::Failed);
        assert_eq!(
            receipt.outcome.failure_reason.as_deref(),
            Some("network timeout")
        );
    }

    #[tokio::test]
    async fn test_out_of_range_success_rate_is_clamped() {
        // A mistyped rate (1.5, or 90 meaning 90%) must not panic the
        // send path; it saturates at always-succeed / always-fail.
        let (tx, mut rx) = mpsc::channel(8);
        let config = ChannelConfig {
            success_rate: 1.5,
            ..ChannelConfig::instant()
        };
        let channel = SimulatedChannel::new(tx, config);

        channel.send(message()).await.unwrap();
        let receipt = rx.recv().await.unwrap();
        assert_eq!(receipt.outcome.status, OutcomeStatus::Sent);

        let (tx, mut rx) = mpsc::channel(8);
        let config = ChannelConfig {
            success_rate: -0.5,
            ..ChannelConfig::instant()
        };
        let channel = SimulatedChannel::new(tx, config);

        channel.send(message()).await.unwrap();
        let receipt = rx.recv().await.unwrap();
        assert_eq!(receipt.outcome.status, OutcomeStatus::Failed);
    }

    #[tokio::test]
    async fn test_fail_on_send_rejects_before_acknowledgment() {
        let (tx, mut rx) = mpsc::channel(8);
        let channel = SimulatedChannel::new(tx, ChannelConfig::instant());
        channel.set_fail_on_send(true);

        let result = channel.send(message()).await;
        assert!(matches!(result, Err(DeliveryError::Channel(_))));

        // No receipt is ever produced for a rejected send.
        channel.set_fail_on_send(false);
        drop(channel);
        assert!(rx.recv().await.is_none());
    }
}
