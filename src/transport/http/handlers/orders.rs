//! Order listings and the admin lifecycle operations.

use crate::domain::order::OrderStatus;
use crate::domain::user::Role;
use crate::transport::http::handlers::common::{require_admin, unauthorized};
use crate::transport::http::types::{
    error_response, json_422, session_token, ApiResponse, AppState, SetStatusRequest,
};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;

#[utoipa::path(
    get,
    path = "/api/orders",
    responses(
        (status = 200, description = "Admins see every order; users see their own (by uid or buyer email)", body = ApiResponse),
        (status = 401, description = "Not logged in", body = ApiResponse)
    )
)]
pub async fn list_orders_handler(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let Some(token) = session_token(&headers) else {
        return unauthorized().into_response();
    };
    let identity = match state
        .sessions
        .with(token, |session| session.identity.clone())
        .await
    {
        Some(Some(identity)) => identity,
        Some(None) => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(ApiResponse::fail("Inicia sesión para ver tus pedidos.")),
            )
                .into_response();
        }
        None => return unauthorized().into_response(),
    };

    let result = if identity.role == Role::Admin {
        state.store.list_all_orders().await
    } else {
        state
            .store
            .list_orders_for(&identity.uid, &identity.email)
            .await
    };
    match result {
        Ok(orders) => (
            StatusCode::OK,
            Json(ApiResponse::ok(serde_json::json!({ "orders": orders }))),
        )
            .into_response(),
        Err(err) => error_response(err).into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/status",
    params(("id" = String, Path, description = "Order id")),
    request_body = SetStatusRequest,
    responses(
        (status = 200, description = "Status updated (any value may follow any other)", body = ApiResponse),
        (status = 400, description = "Unknown status value", body = ApiResponse),
        (status = 404, description = "No such order", body = ApiResponse),
        (status = 403, description = "Not an admin", body = ApiResponse)
    )
)]
pub async fn set_order_status_handler(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    headers: HeaderMap,
    request: Result<Json<SetStatusRequest>, JsonRejection>,
) -> impl IntoResponse {
    if let Err(resp) = require_admin(&state, &headers).await {
        return resp.into_response();
    }
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => return json_422(e, "{\"status\": ...}").into_response(),
    };
    let status: OrderStatus = match request.status.parse() {
        Ok(s) => s,
        Err(msg) => {
            return (StatusCode::BAD_REQUEST, Json(ApiResponse::fail(msg))).into_response();
        }
    };
    match state.store.set_order_status(&order_id, status).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::ok(serde_json::json!({
                "id": order_id,
                "status": status.as_str(),
            }))),
        )
            .into_response(),
        Err(err) => error_response(err).into_response(),
    }
}

#[utoipa::path(
    delete,
    path = "/api/orders/{id}",
    params(("id" = String, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order deleted and its stock restored, as one atomic batch", body = ApiResponse),
        (status = 404, description = "No such order", body = ApiResponse),
        (status = 403, description = "Not an admin", body = ApiResponse)
    )
)]
pub async fn cancel_order_handler(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if let Err(resp) = require_admin(&state, &headers).await {
        return resp.into_response();
    }
    match state.store.cancel_order(&order_id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::ok(serde_json::json!({ "cancelled": order_id }))),
        )
            .into_response(),
        Err(err) => error_response(err).into_response(),
    }
}
