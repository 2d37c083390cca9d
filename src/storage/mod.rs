//! Postgres access for the shared stores, plus the in-process stock replica.

pub mod inventory;
pub mod orders;
pub mod stock_cache;
pub mod users;
