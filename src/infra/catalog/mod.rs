//! External card-catalog gateway.

mod client;

pub use client::{CatalogClient, SearchOrdering};
