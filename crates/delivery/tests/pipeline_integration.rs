//! End-to-end pipeline tests: dispatch through the simulated channel
//! with a live receipt worker folding outcomes back onto the records.

use std::time::Duration;

use delivery::{
    ChannelConfig, DeliveryOrchestrator, DeliveryStats, ReceiptReconciler, ReceiptWorker,
    SimulatedChannel,
};
use domain::store::{CustomerStore, DeliveryStore, SegmentStore};
use domain::{
    ActivityProfile, Customer, DeliveryStatus, Money, RuleField, RuleOperator, Segment, SegmentRule,
};
use store::{InMemoryCustomerStore, InMemoryDeliveryStore, InMemorySegmentStore};
use tokio::sync::mpsc;

struct Pipeline {
    orchestrator: DeliveryOrchestrator<
        InMemoryCustomerStore,
        InMemorySegmentStore,
        InMemoryDeliveryStore,
        SimulatedChannel,
    >,
    customers: InMemoryCustomerStore,
    segments: InMemorySegmentStore,
    deliveries: InMemoryDeliveryStore,
}

fn pipeline(config: ChannelConfig) -> Pipeline {
    let customers = InMemoryCustomerStore::default();
    let segments = InMemorySegmentStore::default();
    let deliveries = InMemoryDeliveryStore::default();

    let (tx, rx) = mpsc::channel(64);
    let channel = SimulatedChannel::new(tx, config);
    let worker = ReceiptWorker::new(ReceiptReconciler::new(deliveries.clone()), rx);
    tokio::spawn(worker.run());

    let orchestrator = DeliveryOrchestrator::new(
        customers.clone(),
        segments.clone(),
        deliveries.clone(),
        channel,
    );

    Pipeline {
        orchestrator,
        customers,
        segments,
        deliveries,
    }
}

fn spender(name: &str, email: &str, dollars: i64) -> Customer {
    let mut customer = Customer::new(name, email);
    customer.activity = ActivityProfile {
        total_spend: Money::from_dollars(dollars),
        visit_count: 1,
        last_active: Some(chrono::Utc::now()),
    };
    customer
}

async fn seed_segment(pipeline: &Pipeline, audience: usize) -> common::SegmentId {
    for i in 0..audience {
        pipeline
            .customers
            .insert(spender(&format!("c{i}"), &format!("c{i}@example.com"), 200))
            .await
            .unwrap();
    }

    let segment = Segment::new(
        "big spenders",
        vec![SegmentRule::new(
            RuleField::TotalSpend,
            RuleOperator::GreaterThan,
            100.0,
        )],
    );
    let segment_id = segment.id;
    pipeline.segments.insert(segment).await.unwrap();
    segment_id
}

/// Polls until every record for the segment is terminal.
async fn settle(pipeline: &Pipeline, segment_id: common::SegmentId, expected: usize) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let records = pipeline.deliveries.list_for_segment(segment_id).await.unwrap();
        if records.len() == expected && records.iter().all(|r| r.status.is_terminal()) {
            return;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "deliveries did not settle in time"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn test_dispatch_settles_every_record_as_sent() {
    let pipeline = pipeline(ChannelConfig::instant());
    let segment_id = seed_segment(&pipeline, 5).await;

    let summary = pipeline.orchestrator.dispatch(segment_id).await.unwrap();
    assert_eq!(summary.audience_size, 5);
    assert_eq!(summary.dispatched, 5);

    settle(&pipeline, segment_id, 5).await;

    let stats = pipeline.orchestrator.delivery_stats(segment_id).await.unwrap();
    assert_eq!(stats.total, 5);
    assert_eq!(stats.sent, 5);
    assert_eq!(stats.failed, 0);
    assert_eq!(stats.pending, 0);
    assert_eq!(stats.success_rate_percent, 100.0);
}

#[tokio::test]
async fn test_zero_success_rate_settles_every_record_as_failed() {
    let config = ChannelConfig {
        success_rate: 0.0,
        ..ChannelConfig::instant()
    };
    let pipeline = pipeline(config);
    let segment_id = seed_segment(&pipeline, 4).await;

    pipeline.orchestrator.dispatch(segment_id).await.unwrap();
    settle(&pipeline, segment_id, 4).await;

    let records = pipeline.deliveries.list_for_segment(segment_id).await.unwrap();
    assert!(records.iter().all(|r| r.status == DeliveryStatus::Failed));
    assert!(
        records
            .iter()
            .all(|r| r.failure_reason.as_deref() == Some("network timeout"))
    );
    assert!(records.iter().all(|r| r.delivered_at.is_some()));

    let stats = pipeline.orchestrator.delivery_stats(segment_id).await.unwrap();
    assert_eq!(stats.failed, 4);
    assert_eq!(stats.success_rate_percent, 0.0);
}

#[tokio::test]
async fn test_stats_accumulate_across_dispatches() {
    let pipeline = pipeline(ChannelConfig::instant());
    let segment_id = seed_segment(&pipeline, 2).await;

    pipeline.orchestrator.dispatch(segment_id).await.unwrap();
    settle(&pipeline, segment_id, 2).await;

    pipeline.orchestrator.dispatch(segment_id).await.unwrap();
    settle(&pipeline, segment_id, 4).await;

    let stats = pipeline.orchestrator.delivery_stats(segment_id).await.unwrap();
    assert_eq!(stats.total, 4);
    assert_eq!(stats.sent, 4);
}

#[tokio::test]
async fn test_stats_from_records_helper_matches_store_contents() {
    let pipeline = pipeline(ChannelConfig::instant());
    let segment_id = seed_segment(&pipeline, 3).await;

    pipeline.orchestrator.dispatch(segment_id).await.unwrap();
    settle(&pipeline, segment_id, 3).await;

    let records = pipeline.deliveries.list_for_segment(segment_id).await.unwrap();
    let stats = DeliveryStats::from_records(&records);
    assert_eq!(stats.sent, 3);
}
