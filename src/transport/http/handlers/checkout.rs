//! The checkout endpoint: cart snapshot in, durable order out.

use crate::domain::order::{Buyer, GUEST_UID};
use crate::transport::http::handlers::common::unauthorized;
use crate::transport::http::types::{
    error_response, json_422, session_token, ApiResponse, AppState, CheckoutRequest,
};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;

#[utoipa::path(
    post,
    path = "/api/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Order committed; returns id, total and the payment handoff message", body = ApiResponse),
        (status = 409, description = "A line failed the authoritative stock check; nothing was written and the cart is untouched", body = ApiResponse),
        (status = 400, description = "Empty cart", body = ApiResponse),
        (status = 401, description = "Unknown session", body = ApiResponse)
    )
)]
pub async fn checkout_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Result<Json<CheckoutRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Some(token) = session_token(&headers) else {
        return unauthorized().into_response();
    };
    let Json(form) = match request {
        Ok(v) => v,
        Err(e) => {
            return json_422(e, "{\"name\": ..., \"email\": ..., \"address\": ...}").into_response()
        }
    };

    // Snapshot the cart; the session stays usable while the transaction is
    // in flight, and the cart is only cleared once the commit succeeds.
    let snapshot = state
        .sessions
        .with(token, |session| (session.cart.clone(), session.identity.clone()))
        .await;
    let Some((cart, identity)) = snapshot else {
        return unauthorized().into_response();
    };

    let buyer = Buyer {
        uid: identity
            .as_ref()
            .map(|i| i.uid.clone())
            .unwrap_or_else(|| GUEST_UID.to_string()),
        email: identity
            .as_ref()
            .map(|i| i.email.clone())
            .unwrap_or_else(|| form.email.clone()),
        name: form.name,
        phone: form.phone,
        address: form.address,
    };

    match state.store.checkout(&cart, buyer).await {
        Ok(receipt) => {
            state
                .sessions
                .with(token, |session| session.cart.clear())
                .await;
            let payload = serde_json::to_value(&receipt).unwrap_or_default();
            (StatusCode::OK, Json(ApiResponse::ok(payload))).into_response()
        }
        Err(err) => error_response(err).into_response(),
    }
}
