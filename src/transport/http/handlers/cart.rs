//! Cart mutations. All checks here are advisory (the checkout transaction
//! is the authority); rejections leave the cart untouched.

use crate::domain::cart::{LineKey, LineSnapshot};
use crate::transport::http::handlers::common::{cart_view, unauthorized};
use crate::transport::http::types::{
    error_response, json_422, session_token, AddToCartRequest, AdjustCartRequest, ApiResponse,
    AppState, LineRequest,
};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::Value as JsonValue;

fn ok_cart(view: JsonValue) -> axum::response::Response {
    (StatusCode::OK, Json(ApiResponse::ok(view))).into_response()
}

#[utoipa::path(
    get,
    path = "/api/cart",
    responses(
        (status = 200, description = "Current lines and derived total", body = ApiResponse),
        (status = 401, description = "Unknown session", body = ApiResponse)
    )
)]
pub async fn view_cart_handler(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let Some(token) = session_token(&headers) else {
        return unauthorized().into_response();
    };
    match state.sessions.with(token, |s| cart_view(&s.cart)).await {
        Some(view) => ok_cart(view),
        None => unauthorized().into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/cart/add",
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Line added or merged; returns the cart", body = ApiResponse),
        (status = 409, description = "Insufficient stock (advisory); carries the available count", body = ApiResponse),
        (status = 401, description = "Unknown session", body = ApiResponse)
    )
)]
pub async fn add_to_cart_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Result<Json<AddToCartRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Some(token) = session_token(&headers) else {
        return unauthorized().into_response();
    };
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => {
            return json_422(e, "{\"card_id\": ..., \"finish\": ..., \"unit_price\": ...}")
                .into_response()
        }
    };
    let outcome = state
        .sessions
        .with(token, |session| {
            let role = session.role();
            session
                .cart
                .add(
                    &state.stock,
                    role,
                    LineKey {
                        card_id: request.card_id,
                        finish: request.finish,
                    },
                    LineSnapshot {
                        name: request.name,
                        set_name: request.set_name,
                        image: request.image,
                    },
                    request.unit_price,
                    request.quantity,
                )
                .map(|()| cart_view(&session.cart))
        })
        .await;
    match outcome {
        Some(Ok(view)) => ok_cart(view),
        Some(Err(err)) => error_response(err).into_response(),
        None => unauthorized().into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/cart/adjust",
    request_body = AdjustCartRequest,
    responses(
        (status = 200, description = "Quantity adjusted (a result of zero removes the line)", body = ApiResponse),
        (status = 409, description = "Insufficient stock for the increase", body = ApiResponse),
        (status = 404, description = "No such line", body = ApiResponse),
        (status = 401, description = "Unknown session", body = ApiResponse)
    )
)]
pub async fn adjust_cart_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Result<Json<AdjustCartRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Some(token) = session_token(&headers) else {
        return unauthorized().into_response();
    };
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => {
            return json_422(e, "{\"card_id\": ..., \"finish\": ..., \"delta\": ...}").into_response()
        }
    };
    let key = LineKey {
        card_id: request.card_id,
        finish: request.finish,
    };
    let outcome = state
        .sessions
        .with(token, |session| {
            let role = session.role();
            session
                .cart
                .adjust(&state.stock, role, &key, request.delta)
                .map(|()| cart_view(&session.cart))
        })
        .await;
    match outcome {
        Some(Ok(view)) => ok_cart(view),
        Some(Err(err)) => error_response(err).into_response(),
        None => unauthorized().into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/cart/remove",
    request_body = LineRequest,
    responses(
        (status = 200, description = "Line removed unconditionally", body = ApiResponse),
        (status = 401, description = "Unknown session", body = ApiResponse)
    )
)]
pub async fn remove_from_cart_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Result<Json<LineRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Some(token) = session_token(&headers) else {
        return unauthorized().into_response();
    };
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => return json_422(e, "{\"card_id\": ..., \"finish\": ...}").into_response(),
    };
    let key = LineKey {
        card_id: request.card_id,
        finish: request.finish,
    };
    let outcome = state
        .sessions
        .with(token, |session| {
            session.cart.remove(&key);
            cart_view(&session.cart)
        })
        .await;
    match outcome {
        Some(view) => ok_cart(view),
        None => unauthorized().into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/cart/clear",
    responses(
        (status = 200, description = "Cart emptied", body = ApiResponse),
        (status = 401, description = "Unknown session", body = ApiResponse)
    )
)]
pub async fn clear_cart_handler(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let Some(token) = session_token(&headers) else {
        return unauthorized().into_response();
    };
    let outcome = state
        .sessions
        .with(token, |session| {
            session.cart.clear();
            cart_view(&session.cart)
        })
        .await;
    match outcome {
        Some(view) => ok_cart(view),
        None => unauthorized().into_response(),
    }
}
