//! Stock reads (everyone) and the admin stock write.

use crate::transport::http::handlers::common::require_admin;
use crate::transport::http::types::{
    error_response, json_422, ApiResponse, AppState, SetStockRequest, StockLookupRequest,
};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::Value as JsonValue;

#[utoipa::path(
    get,
    path = "/api/stock",
    responses(
        (status = 200, description = "Latest stock snapshot from the in-process replica", body = ApiResponse)
    )
)]
pub async fn stock_snapshot_handler(State(state): State<AppState>) -> impl IntoResponse {
    let sync = if state.stock.health().is_degraded() {
        "degraded"
    } else {
        "ok"
    };
    (
        StatusCode::OK,
        Json(ApiResponse::ok(serde_json::json!({
            "stock": state.stock.snapshot(),
            "sync": sync,
        }))),
    )
}

#[utoipa::path(
    post,
    path = "/api/stock/lookup",
    request_body = StockLookupRequest,
    responses(
        (status = 200, description = "Catalog records for the requested ids (or everything in stock)", body = ApiResponse),
        (status = 502, description = "Catalog gateway unreachable", body = ApiResponse)
    )
)]
pub async fn stock_lookup_handler(
    State(state): State<AppState>,
    request: Result<Json<StockLookupRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => return json_422(e, "{\"ids\": [...]}").into_response(),
    };
    let ids = if request.ids.is_empty() {
        state.stock.in_stock_ids()
    } else {
        request.ids
    };
    match state.catalog.lookup(&ids).await {
        Ok(cards) => (
            StatusCode::OK,
            Json(ApiResponse::ok(serde_json::json!({ "cards": cards }))),
        )
            .into_response(),
        Err(err) => error_response(err).into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/inventory/set",
    request_body = SetStockRequest,
    responses(
        (status = 200, description = "Resulting stock levels for the card (unchanged on invalid input)", body = ApiResponse),
        (status = 401, description = "No session", body = ApiResponse),
        (status = 403, description = "Not an admin", body = ApiResponse)
    )
)]
pub async fn set_stock_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Result<Json<SetStockRequest>, JsonRejection>,
) -> impl IntoResponse {
    if let Err(resp) = require_admin(&state, &headers).await {
        return resp.into_response();
    }
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => {
            return json_422(e, "{\"card_id\": ..., \"finish\": ..., \"quantity\": ...}")
                .into_response()
        }
    };
    // The quantity field is whatever the admin typed; numbers pass through
    // as their decimal rendering.
    let raw = match &request.quantity {
        JsonValue::String(s) => s.clone(),
        JsonValue::Number(n) => n.to_string(),
        _ => String::new(),
    };
    match state
        .store
        .set_stock(&request.card_id, request.finish, &raw)
        .await
    {
        Ok(levels) => (
            StatusCode::OK,
            Json(ApiResponse::ok(serde_json::json!({
                "card_id": request.card_id,
                "normal": levels.normal,
                "foil": levels.foil,
            }))),
        )
            .into_response(),
        Err(err) => error_response(err).into_response(),
    }
}
