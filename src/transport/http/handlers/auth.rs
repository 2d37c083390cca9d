//! Registration, login and logout.
//!
//! Failures on this path are never swallowed: each cause maps to its own
//! user-facing message (see `AuthFailure`).

use crate::app::session::Identity;
use crate::storage::users::{self, UserRecord};
use crate::transport::http::types::{
    error_response, json_422, session_token, ApiResponse, AppState, LoginRequest, RegisterRequest,
};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::Value as JsonValue;

async fn establish(state: &AppState, headers: &HeaderMap, record: UserRecord) -> JsonValue {
    let identity = Identity {
        uid: record.uid.clone(),
        email: record.email.clone(),
        role: record.role,
        profile: record.profile.clone(),
    };
    let token = state
        .sessions
        .attach_identity(session_token(headers), identity)
        .await;
    serde_json::json!({
        "token": token,
        "uid": record.uid,
        "email": record.email,
        "role": record.role.as_str(),
        "profile": record.profile,
    })
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Registered and logged in; returns the session token", body = ApiResponse),
        (status = 400, description = "Weak password or email already registered", body = ApiResponse)
    )
)]
pub async fn register_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Result<Json<RegisterRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => return json_422(e, "{\"email\": ..., \"password\": ...}").into_response(),
    };
    match users::register(state.store.pool(), &request.email, &request.password).await {
        Ok(record) => {
            let payload = establish(&state, &headers, record).await;
            (StatusCode::OK, Json(ApiResponse::ok(payload))).into_response()
        }
        Err(err) => error_response(err).into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in; an existing session keeps its cart", body = ApiResponse),
        (status = 401, description = "Unknown email or wrong password", body = ApiResponse)
    )
)]
pub async fn login_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Result<Json<LoginRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => return json_422(e, "{\"email\": ..., \"password\": ...}").into_response(),
    };
    match users::authenticate(state.store.pool(), &request.email, &request.password).await {
        Ok(record) => {
            let payload = establish(&state, &headers, record).await;
            (StatusCode::OK, Json(ApiResponse::ok(payload))).into_response()
        }
        Err(err) => error_response(err).into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Session dropped; its cart is gone with it", body = ApiResponse)
    )
)]
pub async fn logout_handler(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let existed = match session_token(&headers) {
        Some(token) => state.sessions.drop_session(token).await,
        None => false,
    };
    (
        StatusCode::OK,
        Json(ApiResponse::ok(serde_json::json!({ "logged_out": existed }))),
    )
}
