pub mod app;
pub mod domain;
pub mod error;
pub mod infra;
pub mod storage;
pub mod transport;

// Convenience re-exports (keeps call-sites clean)
pub use app::session::SessionMap;
pub use app::store_service::{CheckoutReceipt, StoreService};
pub use error::{AuthFailure, ShopError};
pub use infra::catalog::{CatalogClient, SearchOrdering};
pub use infra::config::AppConfig;
pub use storage::stock_cache::{StockCache, SyncHealth};
