//! Order workflow endpoints: start, query, signal.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{Money, OrderId, OrderItem, UserId, WorkflowId};
use runtime::WorkflowEntry;
use saga::{OrderProgress, OrderState};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct StartOrderRequest {
    pub user_id: Option<String>,
    pub items: Vec<OrderItemRequest>,
    pub total_cents: i64,
}

#[derive(Deserialize)]
pub struct OrderItemRequest {
    pub product_id: String,
    pub quantity: u32,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderStartedResponse {
    pub order_id: String,
    pub workflow_id: String,
    pub status: String,
}

#[derive(Serialize)]
pub struct SignalResponse {
    pub accepted: bool,
    pub status: String,
    pub item_count: usize,
}

// -- Handlers --

/// POST /orders — start an order saga workflow.
#[tracing::instrument(skip(state, req))]
pub async fn start(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StartOrderRequest>,
) -> Result<(StatusCode, Json<OrderStartedResponse>), ApiError> {
    let user_id = match &req.user_id {
        Some(id_str) => {
            let uuid = uuid::Uuid::parse_str(id_str)
                .map_err(|e| ApiError::BadRequest(format!("Invalid user_id: {e}")))?;
            UserId::from_uuid(uuid)
        }
        None => UserId::new(),
    };

    if req.items.is_empty() {
        return Err(ApiError::BadRequest("Order has no items".to_string()));
    }
    let mut items = Vec::with_capacity(req.items.len());
    for item in &req.items {
        if item.quantity == 0 {
            return Err(ApiError::BadRequest(format!(
                "Invalid quantity for product {}",
                item.product_id
            )));
        }
        items.push(OrderItem::new(item.product_id.as_str(), item.quantity));
    }

    let order_id = OrderId::new();
    let workflow_id = WorkflowId::new();
    let handle = saga::OrderHandle::for_order(items, Money::from_cents(req.total_cents));

    state
        .orders
        .write()
        .unwrap()
        .insert(order_id, handle.clone());
    state.registry.register(
        WorkflowEntry::new(workflow_id, "order")
            .with_attribute("CustomStringField", order_id.to_string())
            .with_attribute("CustomKeywordField", "order_processing"),
    );

    let saga = state.saga.clone();
    let run_handle = handle.clone();
    tokio::spawn(async move {
        match saga.run(order_id, user_id, run_handle).await {
            Ok(result) => tracing::info!(%order_id, result = %result, "order workflow finished"),
            Err(e) => tracing::warn!(%order_id, error = %e, "order workflow failed"),
        }
    });

    let response = OrderStartedResponse {
        order_id: order_id.to_string(),
        workflow_id: workflow_id.to_string(),
        status: handle.status().status().to_string(),
    };

    Ok((StatusCode::ACCEPTED, Json(response)))
}

/// GET /orders/{id}/status — full order state snapshot.
#[tracing::instrument(skip(state))]
pub async fn status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<OrderState>, ApiError> {
    let handle = lookup_order(&state, &id)?;
    Ok(Json(handle.status()))
}

/// GET /orders/{id}/progress — progress-only snapshot.
#[tracing::instrument(skip(state))]
pub async fn progress(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<OrderProgress>, ApiError> {
    let handle = lookup_order(&state, &id)?;
    Ok(Json(handle.progress()))
}

/// POST /orders/{id}/items — add-item signal.
#[tracing::instrument(skip(state, req))]
pub async fn add_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<OrderItemRequest>,
) -> Result<Json<SignalResponse>, ApiError> {
    if req.quantity == 0 {
        return Err(ApiError::BadRequest(format!(
            "Invalid quantity for product {}",
            req.product_id
        )));
    }

    let handle = lookup_order(&state, &id)?;
    let accepted = handle.add_item(OrderItem::new(req.product_id.as_str(), req.quantity));

    let snapshot = handle.status();
    Ok(Json(SignalResponse {
        accepted,
        status: snapshot.status().to_string(),
        item_count: snapshot.items().len(),
    }))
}

/// POST /orders/{id}/cancel — cancel signal.
#[tracing::instrument(skip(state))]
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SignalResponse>, ApiError> {
    let handle = lookup_order(&state, &id)?;
    handle.cancel();

    let snapshot = handle.status();
    Ok(Json(SignalResponse {
        accepted: snapshot.is_cancelled(),
        status: snapshot.status().to_string(),
        item_count: snapshot.items().len(),
    }))
}

fn lookup_order(state: &AppState, id: &str) -> Result<saga::OrderHandle, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))?;
    let order_id = OrderId::from_uuid(uuid);
    state
        .order_handle(order_id)
        .ok_or_else(|| ApiError::NotFound(format!("Order {id} not found")))
}
