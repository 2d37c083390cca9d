use crate::transport::http::handlers::{
    auth, cart, catalog, checkout, health, orders, session, stock,
};
use crate::transport::http::types::{
    AddToCartRequest, AdjustCartRequest, ApiResponse, CheckoutRequest, LineRequest, LoginRequest,
    RegisterRequest, SetStatusRequest, SetStockRequest, StockLookupRequest,
};
use axum::routing::{delete, get, post};
use axum::Router;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthcheck_handler,
        catalog::search_handler,
        catalog::autocomplete_handler,
        stock::stock_snapshot_handler,
        stock::stock_lookup_handler,
        stock::set_stock_handler,
        auth::register_handler,
        auth::login_handler,
        auth::logout_handler,
        session::create_session_handler,
        session::profile_handler,
        cart::view_cart_handler,
        cart::add_to_cart_handler,
        cart::adjust_cart_handler,
        cart::remove_from_cart_handler,
        cart::clear_cart_handler,
        checkout::checkout_handler,
        orders::list_orders_handler,
        orders::set_order_status_handler,
        orders::cancel_order_handler
    ),
    components(schemas(
        ApiResponse,
        RegisterRequest,
        LoginRequest,
        StockLookupRequest,
        SetStockRequest,
        AddToCartRequest,
        AdjustCartRequest,
        LineRequest,
        CheckoutRequest,
        SetStatusRequest
    ))
)]
#[allow(dead_code)]
pub struct ApiDoc;

pub fn create_router(app_state: crate::transport::http::types::AppState) -> Router {
    Router::new()
        .route("/health", get(health::healthcheck_handler))
        .route("/api/cards/search", get(catalog::search_handler))
        .route("/api/cards/autocomplete", get(catalog::autocomplete_handler))
        .route("/api/stock", get(stock::stock_snapshot_handler))
        .route("/api/stock/lookup", post(stock::stock_lookup_handler))
        .route("/api/inventory/set", post(stock::set_stock_handler))
        .route("/api/auth/register", post(auth::register_handler))
        .route("/api/auth/login", post(auth::login_handler))
        .route("/api/auth/logout", post(auth::logout_handler))
        .route("/api/session", post(session::create_session_handler))
        .route("/api/session/profile", get(session::profile_handler))
        .route("/api/cart", get(cart::view_cart_handler))
        .route("/api/cart/add", post(cart::add_to_cart_handler))
        .route("/api/cart/adjust", post(cart::adjust_cart_handler))
        .route("/api/cart/remove", post(cart::remove_from_cart_handler))
        .route("/api/cart/clear", post(cart::clear_cart_handler))
        .route("/api/checkout", post(checkout::checkout_handler))
        .route("/api/orders", get(orders::list_orders_handler))
        .route("/api/orders/:id/status", post(orders::set_order_status_handler))
        .route("/api/orders/:id", delete(orders::cancel_order_handler))
        .with_state(app_state)
}
