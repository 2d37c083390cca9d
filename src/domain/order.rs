//! Order records and their status lifecycle.

use crate::domain::cart::CartLine;
use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identity marker for orders placed without an authenticated identity.
pub const GUEST_UID: &str = "guest";

/// Order lifecycle status. The enumeration is advisory: admins may set any
/// value from any other; no transition graph is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pendiente,
    Pagado,
    Enviado,
    Entregado,
    Cancelado,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pendiente => "pendiente",
            OrderStatus::Pagado => "pagado",
            OrderStatus::Enviado => "enviado",
            OrderStatus::Entregado => "entregado",
            OrderStatus::Cancelado => "cancelado",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pendiente" => Ok(OrderStatus::Pendiente),
            "pagado" => Ok(OrderStatus::Pagado),
            "enviado" => Ok(OrderStatus::Enviado),
            "entregado" => Ok(OrderStatus::Entregado),
            "cancelado" => Ok(OrderStatus::Cancelado),
            other => Err(format!("estado de orden desconocido: {other}")),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Buyer snapshot captured from the checkout form, merged with the identity
/// reference (an authenticated uid or [`GUEST_UID`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Buyer {
    pub uid: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub address: String,
}

/// A committed order. `items` is a snapshot copy of the cart at order time,
/// never re-linked to the live catalog or cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub buyer: Buyer,
    pub items: Vec<CartLine>,
    pub total: Decimal,
    pub status: OrderStatus,
}

/// Generates a human-legible order identifier: `ORD-` plus eight uppercase
/// alphanumerics.
pub fn generate_order_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..8)
        .map(|_| (rng.sample(rand::distributions::Alphanumeric) as char).to_ascii_uppercase())
        .collect();
    format!("ORD-{suffix}")
}
