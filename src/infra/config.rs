//! Centralized configuration (environment variables + defaults).

use rust_decimal::Decimal;

/// Database URL must be provided (no default) for safety.
pub fn database_url() -> String {
    std::env::var("DATABASE_URL").expect("DATABASE_URL must be set")
}

/// Address the HTTP server binds to.
pub fn bind_addr() -> String {
    std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string())
}

/// Base URL of the external card catalog.
pub fn catalog_base_url() -> String {
    std::env::var("CATALOG_BASE_URL").unwrap_or_else(|_| "https://api.scryfall.com".to_string())
}

/// Fixed multiplier converting catalog reference prices into the local
/// currency. Defaults to 1 (prices pass through unchanged).
pub fn exchange_rate() -> Decimal {
    match std::env::var("EXCHANGE_RATE") {
        Ok(raw) => raw
            .trim()
            .parse::<Decimal>()
            .expect("EXCHANGE_RATE must be a valid decimal"),
        Err(_) => Decimal::ONE,
    }
}

/// Operator contact the post-checkout handoff message is addressed to.
pub fn operator_contact() -> String {
    std::env::var("OPERATOR_CONTACT").unwrap_or_else(|_| "pedidos@cardbazaar.example".to_string())
}

/// Static configuration consumed at startup by the surrounding application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub exchange_rate: Decimal,
    pub operator_contact: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        AppConfig {
            exchange_rate: exchange_rate(),
            operator_contact: operator_contact(),
        }
    }
}
