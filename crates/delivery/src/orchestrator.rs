//! Dispatch orchestration: audience computation and channel fan-out.

use chrono::Utc;
use common::SegmentId;
use domain::store::{CustomerStore, DeliveryStore, SegmentStore};
use domain::{Customer, DeliveryRecord, SegmentRule, evaluate};
use serde::Serialize;

use crate::channel::{DeliveryChannel, OutboundMessage};
use crate::error::DeliveryError;
use crate::stats::DeliveryStats;

/// Result of evaluating a rule set against the current customer base
/// without dispatching anything.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AudiencePreview {
    /// Customers matching the rule set right now.
    pub matched: u64,

    /// Customers evaluated.
    pub total_customers: u64,

    /// matched / total × 100, rounded to one decimal; 0 when there are
    /// no customers.
    pub match_rate_percent: f64,
}

/// Result of one dispatch run over a segment.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DispatchSummary {
    pub segment_id: SegmentId,

    /// Audience snapshot frozen onto the segment by this dispatch.
    pub audience_size: u64,

    /// Messages the channel accepted.
    pub dispatched: u64,

    /// Messages the channel rejected before acknowledgment. These
    /// records stay pending forever; there is no retry.
    pub channel_failures: u64,
}

/// Computes audiences and fans messages out to the delivery channel.
///
/// Dispatch is fire-and-forget: the orchestrator returns once every
/// message has been handed to the channel, without waiting for
/// outcomes. Outcomes flow back asynchronously as receipts and are
/// folded onto the records by the reconciler.
#[derive(Clone)]
pub struct DeliveryOrchestrator<C, S, D, Ch> {
    customers: C,
    segments: S,
    deliveries: D,
    channel: Ch,
}

impl<C, S, D, Ch> DeliveryOrchestrator<C, S, D, Ch>
where
    C: CustomerStore,
    S: SegmentStore,
    D: DeliveryStore,
    Ch: DeliveryChannel,
{
    pub fn new(customers: C, segments: S, deliveries: D, channel: Ch) -> Self {
        Self {
            customers,
            segments,
            deliveries,
            channel,
        }
    }

    /// Evaluates a rule set against every customer without creating any
    /// delivery records or touching any segment.
    #[tracing::instrument(skip(self, rules))]
    pub async fn preview(&self, rules: &[SegmentRule]) -> Result<AudiencePreview, DeliveryError> {
        let now = Utc::now();
        let customers = self.customers.list().await?;

        let total_customers = customers.len() as u64;
        let matched = customers
            .iter()
            .filter(|customer| evaluate(&customer.activity, rules, now))
            .count() as u64;

        let match_rate_percent = if total_customers == 0 {
            0.0
        } else {
            (matched as f64 / total_customers as f64 * 1000.0).round() / 10.0
        };

        Ok(AudiencePreview {
            matched,
            total_customers,
            match_rate_percent,
        })
    }

    /// Dispatches a segment to its current audience.
    ///
    /// Computes the audience from live activity profiles, freezes the
    /// size onto the segment, persists one pending delivery record per
    /// matched customer, then hands each message to the channel. A
    /// rejected send is logged and counted; it never aborts the batch.
    #[tracing::instrument(skip(self))]
    pub async fn dispatch(&self, segment_id: SegmentId) -> Result<DispatchSummary, DeliveryError> {
        let mut segment = self
            .segments
            .get(segment_id)
            .await?
            .ok_or(DeliveryError::SegmentNotFound(segment_id))?;

        let now = Utc::now();
        let customers = self.customers.list().await?;
        let audience: Vec<Customer> = customers
            .into_iter()
            .filter(|customer| evaluate(&customer.activity, &segment.rules, now))
            .collect();

        segment.audience_size = audience.len() as u64;
        segment.touch();
        self.segments.update(segment.clone()).await?;

        let mut dispatched = 0u64;
        let mut channel_failures = 0u64;

        for customer in &audience {
            let record = DeliveryRecord::new(segment.id, customer.id, render_message(&customer.name));
            self.deliveries.insert(record.clone()).await?;

            let message = OutboundMessage {
                delivery_id: record.id,
                segment_id: segment.id,
                recipient: customer.email.clone(),
                body: record.message,
            };

            match self.channel.send(message).await {
                Ok(()) => dispatched += 1,
                Err(error) => {
                    channel_failures += 1;
                    tracing::warn!(
                        delivery_id = %record.id,
                        customer_id = %customer.id,
                        %error,
                        "channel rejected message; record stays pending"
                    );
                }
            }
        }

        metrics::counter!("dispatches_total").increment(1);
        metrics::counter!("messages_dispatched_total").increment(dispatched);
        metrics::counter!("channel_send_failures_total").increment(channel_failures);
        metrics::histogram!("dispatch_audience_size").record(segment.audience_size as f64);

        tracing::info!(
            %segment_id,
            audience_size = segment.audience_size,
            dispatched,
            channel_failures,
            "segment dispatched"
        );

        Ok(DispatchSummary {
            segment_id: segment.id,
            audience_size: segment.audience_size,
            dispatched,
            channel_failures,
        })
    }

    /// Aggregates delivery counts over every record the segment has
    /// ever produced.
    #[tracing::instrument(skip(self))]
    pub async fn delivery_stats(&self, segment_id: SegmentId) -> Result<DeliveryStats, DeliveryError> {
        let segment = self
            .segments
            .get(segment_id)
            .await?
            .ok_or(DeliveryError::SegmentNotFound(segment_id))?;

        let records = self.deliveries.list_for_segment(segment.id).await?;
        Ok(DeliveryStats::from_records(&records))
    }
}

/// Renders the message body for one recipient.
pub fn render_message(name: &str) -> String {
    format!("Hi {name}, here's 10% off on your next order!")
}
