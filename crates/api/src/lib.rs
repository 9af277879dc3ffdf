//! HTTP API server with observability for the audience delivery
//! pipeline.
//!
//! Provides REST endpoints for customers, transactions, segments, and
//! delivery receipts, with structured logging (tracing) and Prometheus
//! metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post, put};
use delivery::{
    DeliveryChannel, DeliveryOrchestrator, Receipt, ReceiptReconciler, ReceiptWorker,
};
use metrics_exporter_prometheus::PrometheusHandle;
use store::{
    InMemoryCustomerStore, InMemoryDeliveryStore, InMemorySegmentStore, InMemoryTransactionStore,
};
use tokio::sync::mpsc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<Ch: DeliveryChannel + Clone + 'static>(
    state: Arc<AppState<Ch>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/customers", post(routes::customers::create::<Ch>))
        .route("/customers", get(routes::customers::list::<Ch>))
        .route("/customers/bulk", post(routes::customers::bulk_create::<Ch>))
        .route("/customers/{id}", get(routes::customers::get::<Ch>))
        .route("/customers/{id}", put(routes::customers::update::<Ch>))
        .route("/customers/{id}", delete(routes::customers::delete::<Ch>))
        .route(
            "/customers/{id}/transactions",
            get(routes::transactions::list_for_customer::<Ch>),
        )
        .route("/transactions", post(routes::transactions::create::<Ch>))
        .route(
            "/transactions/bulk",
            post(routes::transactions::bulk_create::<Ch>),
        )
        .route("/segments", post(routes::segments::create::<Ch>))
        .route("/segments", get(routes::segments::list::<Ch>))
        .route("/segments/preview", post(routes::segments::preview::<Ch>))
        .route("/segments/{id}", get(routes::segments::get::<Ch>))
        .route("/segments/{id}", put(routes::segments::update::<Ch>))
        .route("/segments/{id}", delete(routes::segments::delete::<Ch>))
        .route(
            "/segments/{id}/dispatch",
            post(routes::segments::dispatch::<Ch>),
        )
        .route("/segments/{id}/stats", get(routes::segments::stats::<Ch>))
        .route(
            "/segments/{id}/deliveries",
            get(routes::segments::deliveries::<Ch>),
        )
        .route("/receipts", post(routes::receipts::receive::<Ch>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the default application state over fresh in-memory stores,
/// together with the receipt worker that drains the given queue.
pub fn create_default_state<Ch: DeliveryChannel + Clone + 'static>(
    channel: Ch,
    receipts: mpsc::Receiver<Receipt>,
) -> (Arc<AppState<Ch>>, ReceiptWorker<InMemoryDeliveryStore>) {
    use domain::{CustomerService, SegmentService, TransactionService};

    let customers = InMemoryCustomerStore::default();
    let transactions = InMemoryTransactionStore::default();
    let segments = InMemorySegmentStore::default();
    let deliveries = InMemoryDeliveryStore::default();

    let reconciler = ReceiptReconciler::new(deliveries.clone());
    let worker = ReceiptWorker::new(reconciler.clone(), receipts);

    let state = Arc::new(AppState {
        customer_service: CustomerService::new(customers.clone()),
        transaction_service: TransactionService::new(transactions.clone(), customers.clone()),
        segment_service: SegmentService::new(segments.clone(), deliveries.clone()),
        orchestrator: DeliveryOrchestrator::new(customers, segments, deliveries.clone(), channel),
        reconciler,
        deliveries,
    });

    (state, worker)
}
