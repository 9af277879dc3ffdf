//! Receipt reconciliation: folding channel outcomes onto delivery records.

use chrono::Utc;
use common::DeliveryId;
use domain::DeliveryOutcome;
use domain::store::DeliveryStore;
use tokio::sync::mpsc;

use crate::channel::Receipt;
use crate::error::DeliveryError;

/// Applies delivery outcomes to their records.
///
/// Duplicate outcomes overwrite each other last-write-wins; the
/// reconciler never rejects a receipt for targeting a terminal record.
#[derive(Clone)]
pub struct ReceiptReconciler<D> {
    deliveries: D,
}

impl<D> ReceiptReconciler<D>
where
    D: DeliveryStore,
{
    pub fn new(deliveries: D) -> Self {
        Self { deliveries }
    }

    /// Folds one outcome onto its delivery record.
    #[tracing::instrument(skip(self, outcome))]
    pub async fn reconcile(
        &self,
        delivery_id: DeliveryId,
        outcome: &DeliveryOutcome,
    ) -> Result<(), DeliveryError> {
        let mut record = self
            .deliveries
            .get(delivery_id)
            .await?
            .ok_or(DeliveryError::RecordNotFound(delivery_id))?;

        record.apply_outcome(outcome, Utc::now());
        let status = record.status;
        self.deliveries.update(record).await?;

        metrics::counter!("receipts_processed_total", "status" => status.as_str()).increment(1);
        tracing::debug!(%delivery_id, %status, "receipt reconciled");

        Ok(())
    }
}

/// Single consumer of the receipt queue.
///
/// Runs until every channel-side sender is dropped. A receipt that
/// fails to reconcile is logged and skipped; one bad receipt never
/// stalls the queue.
pub struct ReceiptWorker<D> {
    reconciler: ReceiptReconciler<D>,
    receipts: mpsc::Receiver<Receipt>,
}

impl<D> ReceiptWorker<D>
where
    D: DeliveryStore,
{
    pub fn new(reconciler: ReceiptReconciler<D>, receipts: mpsc::Receiver<Receipt>) -> Self {
        Self {
            reconciler,
            receipts,
        }
    }

    /// Drains the queue, reconciling each receipt in arrival order.
    pub async fn run(mut self) {
        while let Some(receipt) = self.receipts.recv().await {
            if let Err(error) = self
                .reconciler
                .reconcile(receipt.delivery_id, &receipt.outcome)
                .await
            {
                metrics::counter!("receipt_reconcile_failures_total").increment(1);
                tracing::warn!(
                    delivery_id = %receipt.delivery_id,
                    %error,
                    "receipt could not be reconciled; skipping"
                );
            }
        }

        tracing::info!("receipt queue closed; worker exiting");
    }
}
