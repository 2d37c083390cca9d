use crate::domain::cart::Cart;
use crate::domain::user::Role;
use crate::transport::http::types::{session_token, ApiResponse, AppState};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde_json::Value as JsonValue;

pub fn unauthorized() -> (StatusCode, Json<ApiResponse>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(ApiResponse::fail("Sesión requerida.")),
    )
}

/// Role gate for admin-only mutations. The role is the one stored in the
/// server-side session, never client-supplied state.
pub async fn require_admin(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<(), (StatusCode, Json<ApiResponse>)> {
    let Some(token) = session_token(headers) else {
        return Err(unauthorized());
    };
    match state.sessions.role_of(token).await {
        Some(Role::Admin) => Ok(()),
        Some(_) => Err((
            StatusCode::FORBIDDEN,
            Json(ApiResponse::fail("Se requiere rol de administrador.")),
        )),
        None => Err(unauthorized()),
    }
}

pub fn cart_view(cart: &Cart) -> JsonValue {
    serde_json::json!({
        "lines": cart.lines(),
        "total": cart.total(),
    })
}
