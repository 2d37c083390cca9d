//! Session lifecycle and the checkout-prefill profile.

use crate::transport::http::handlers::common::unauthorized;
use crate::transport::http::types::{session_token, ApiResponse, AppState};
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;

#[utoipa::path(
    post,
    path = "/api/session",
    responses(
        (status = 200, description = "Opens an anonymous session; returns its bearer token", body = ApiResponse)
    )
)]
pub async fn create_session_handler(State(state): State<AppState>) -> impl IntoResponse {
    let token = state.sessions.create().await;
    (
        StatusCode::OK,
        Json(ApiResponse::ok(serde_json::json!({ "token": token }))),
    )
}

#[utoipa::path(
    get,
    path = "/api/session/profile",
    responses(
        (status = 200, description = "Identity and prefill profile for this session (identity is null for guests)", body = ApiResponse),
        (status = 401, description = "Unknown session", body = ApiResponse)
    )
)]
pub async fn profile_handler(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let Some(token) = session_token(&headers) else {
        return unauthorized().into_response();
    };
    let view = state
        .sessions
        .with(token, |session| {
            let identity = session.identity.as_ref().map(|i| {
                serde_json::json!({
                    "uid": i.uid,
                    "email": i.email,
                    "profile": i.profile,
                })
            });
            serde_json::json!({
                "identity": identity,
                "role": session.role().as_str(),
            })
        })
        .await;
    match view {
        Some(payload) => (StatusCode::OK, Json(ApiResponse::ok(payload))).into_response(),
        None => unauthorized().into_response(),
    }
}
