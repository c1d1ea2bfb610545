//! Axum REST API handlers.
//!
//! All routes are read-only views over the indexed events and the product /
//! role projections folded from them.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::db;
use crate::errors::IndexerError;
use crate::events::{EventRecord, HistoryRow, ProductRow};

#[derive(Clone)]
pub struct ApiState {
    pub pool: SqlitePool,
}

pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/events", get(get_all_events))
        .route("/products", get(list_products))
        .route("/products/:id", get(get_product))
        .route("/products/:id/history", get(get_product_history))
        .route("/products/:id/events", get(get_product_events))
        .route("/roles/:address", get(get_role))
        .with_state(state)
}

// ─────────────────────────────────────────────────────────
// Response shapes
// ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct EventsResponse {
    pub product_id: i64,
    pub count: usize,
    pub events: Vec<EventRecord>,
}

#[derive(Serialize)]
pub struct AllEventsResponse {
    pub count: usize,
    pub events: Vec<EventRecord>,
}

#[derive(Serialize)]
pub struct ProductsResponse {
    pub count: usize,
    pub products: Vec<ProductRow>,
}

#[derive(Serialize)]
pub struct HistoryResponse {
    pub product_id: i64,
    pub count: usize,
    pub history: Vec<HistoryRow>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}

fn internal_error(e: IndexerError) -> Response {
    tracing::error!("API query failed: {e}");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

fn ok<T: Serialize>(body: T) -> Response {
    (StatusCode::OK, Json(body)).into_response()
}

// ─────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /events`
pub async fn get_all_events(State(state): State<Arc<ApiState>>) -> Response {
    match db::get_all_events(&state.pool).await {
        Ok(events) => ok(AllEventsResponse {
            count: events.len(),
            events,
        }),
        Err(e) => internal_error(e),
    }
}

/// `GET /products`
pub async fn list_products(State(state): State<Arc<ApiState>>) -> Response {
    match db::get_products(&state.pool).await {
        Ok(products) => ok(ProductsResponse {
            count: products.len(),
            products,
        }),
        Err(e) => internal_error(e),
    }
}

/// `GET /products/:id`
pub async fn get_product(State(state): State<Arc<ApiState>>, Path(id): Path<i64>) -> Response {
    match db::get_product(&state.pool, id).await {
        Ok(Some(product)) => ok(product),
        Ok(None) => error_response(StatusCode::NOT_FOUND, format!("product {id} not found")),
        Err(e) => internal_error(e),
    }
}

/// `GET /products/:id/history`
pub async fn get_product_history(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<i64>,
) -> Response {
    match db::get_product_history(&state.pool, id).await {
        Ok(history) => ok(HistoryResponse {
            product_id: id,
            count: history.len(),
            history,
        }),
        Err(e) => internal_error(e),
    }
}

/// `GET /products/:id/events`
pub async fn get_product_events(
    State(state): State<Arc<ApiState>>,
    Path(product_id): Path<i64>,
) -> Response {
    match db::get_events_for_product(&state.pool, product_id).await {
        Ok(events) => ok(EventsResponse {
            product_id,
            count: events.len(),
            events,
        }),
        Err(e) => internal_error(e),
    }
}

/// `GET /roles/:address`
pub async fn get_role(
    State(state): State<Arc<ApiState>>,
    Path(address): Path<String>,
) -> Response {
    match db::get_role(&state.pool, &address).await {
        Ok(Some(role)) => ok(role),
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            format!("no role indexed for {address}"),
        ),
        Err(e) => internal_error(e),
    }
}
