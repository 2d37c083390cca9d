use crate::app::session::SessionMap;
use crate::app::store_service::StoreService;
use crate::domain::inventory::Finish;
use crate::error::{AuthFailure, ShopError};
use crate::infra::catalog::CatalogClient;
use crate::storage::stock_cache::StockCache;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

/// Header carrying the session bearer token.
pub const SESSION_HEADER: &str = "x-session-token";

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<StoreService>,
    pub sessions: SessionMap,
    pub catalog: Arc<CatalogClient>,
    pub stock: StockCache,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub data: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResponse {
    pub fn ok(data: JsonValue) -> ApiResponse {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> ApiResponse {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Deserialize, Debug, IntoParams)]
pub struct SearchParams {
    /// Free-text catalog query.
    pub q: String,
    /// True for storefront landing queries (popularity order); shopper
    /// searches widen to every printing, newest first.
    #[serde(default)]
    pub browse: bool,
}

#[derive(Deserialize, Debug, IntoParams)]
pub struct AutocompleteParams {
    pub q: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct StockLookupRequest {
    /// Card ids to hydrate; empty means "everything currently in stock".
    #[serde(default)]
    pub ids: Vec<String>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct AddToCartRequest {
    pub card_id: String,
    #[schema(value_type = String)]
    pub finish: Finish,
    pub name: String,
    #[serde(default)]
    pub set_name: String,
    #[serde(default)]
    pub image: Option<String>,
    /// Price snapshot fixed at this moment; never refreshed.
    #[schema(value_type = String)]
    pub unit_price: Decimal,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct AdjustCartRequest {
    pub card_id: String,
    #[schema(value_type = String)]
    pub finish: Finish,
    pub delta: i32,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct LineRequest {
    pub card_id: String,
    #[schema(value_type = String)]
    pub finish: Finish,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct CheckoutRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub address: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct SetStockRequest {
    pub card_id: String,
    #[schema(value_type = String)]
    pub finish: Finish,
    /// Raw quantity input; anything but a plain non-negative integer is a
    /// silent no-op.
    #[schema(value_type = Object)]
    pub quantity: JsonValue,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct SetStatusRequest {
    pub status: String,
}

pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    headers.get(SESSION_HEADER).and_then(|v| v.to_str().ok())
}

pub fn json_422(err: JsonRejection, expected: &str) -> (StatusCode, Json<ApiResponse>) {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ApiResponse::fail(format!(
            "Invalid JSON body: {} (expected: {})",
            err, expected
        ))),
    )
}

/// Maps the error taxonomy onto the response envelope. Insufficient stock
/// carries the failing item and its live availability so the shopper can
/// adjust and retry.
pub fn error_response(err: ShopError) -> (StatusCode, Json<ApiResponse>) {
    let status = match &err {
        ShopError::PermissionFault => StatusCode::FORBIDDEN,
        ShopError::InsufficientStock { .. } => StatusCode::CONFLICT,
        ShopError::Auth(AuthFailure::InvalidCredentials) => StatusCode::UNAUTHORIZED,
        ShopError::Auth(_) => StatusCode::BAD_REQUEST,
        ShopError::MalformedInput | ShopError::EmptyCart => StatusCode::BAD_REQUEST,
        ShopError::NotFound => StatusCode::NOT_FOUND,
        ShopError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        ShopError::Gateway(_) => StatusCode::BAD_GATEWAY,
    };
    let data = match &err {
        ShopError::InsufficientStock {
            card_id,
            finish,
            available,
        } => Some(serde_json::json!({
            "code": "INSUFFICIENT_STOCK",
            "card_id": card_id,
            "finish": finish.column(),
            "available": available,
        })),
        ShopError::PermissionFault => Some(serde_json::json!({ "code": "PERMISSION_FAULT" })),
        _ => None,
    };
    (
        status,
        Json(ApiResponse {
            success: false,
            data,
            error: Some(err.to_string()),
        }),
    )
}
