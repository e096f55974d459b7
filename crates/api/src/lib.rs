//! HTTP API server with observability for the workflow system.
//!
//! Provides REST endpoints for starting order sagas, querying and
//! signalling running workflows, executing declarative workflow schemas,
//! and listing workflows by search attribute, with structured logging
//! (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use axum::Router;
use axum::routing::{get, post};
use common::OrderId;
use dag::DagProcessor;
use metrics_exporter_prometheus::PrometheusHandle;
use runtime::WorkflowRegistry;
use saga::{
    InMemoryInventoryStore, InMemoryNotifier, InMemoryPaymentGateway, OrderHandle, OrderSaga,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// The saga type wired into the API process.
pub type ApiSaga = OrderSaga<InMemoryPaymentGateway, InMemoryInventoryStore, InMemoryNotifier>;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub saga: Arc<ApiSaga>,
    pub orders: RwLock<HashMap<OrderId, OrderHandle>>,
    pub registry: WorkflowRegistry,
    pub processor: DagProcessor,
}

impl AppState {
    /// Looks up the handle for a running order.
    pub fn order_handle(&self, order_id: OrderId) -> Option<OrderHandle> {
        self.orders.read().unwrap().get(&order_id).cloned()
    }
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders", post(routes::orders::start))
        .route("/orders/{id}/status", get(routes::orders::status))
        .route("/orders/{id}/progress", get(routes::orders::progress))
        .route("/orders/{id}/items", post(routes::orders::add_item))
        .route("/orders/{id}/cancel", post(routes::orders::cancel))
        .route("/workflows", get(routes::workflows::list))
        .route("/workflows/run", post(routes::workflows::run_schema))
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

/// Creates the default application state with in-memory saga
/// collaborators and the standard node executors.
pub fn create_default_state() -> Arc<AppState> {
    let payment = InMemoryPaymentGateway::new();
    let inventory = InMemoryInventoryStore::new();
    let notifier = InMemoryNotifier::new();
    let saga = Arc::new(OrderSaga::new(payment, inventory, notifier));

    Arc::new(AppState {
        saga,
        orders: RwLock::new(HashMap::new()),
        registry: WorkflowRegistry::new(),
        processor: DagProcessor::new(nodes::default_registry()),
    })
}
