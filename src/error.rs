//! Error taxonomy for the storefront core.

use crate::domain::inventory::Finish;
use thiserror::Error;

/// Failures surfaced by store-facing operations.
///
/// `PermissionFault` is banner-level: it means the whole inventory/order sync
/// is non-functional, not that a single action failed. Everything else is
/// scoped to the operation that raised it.
#[derive(Debug, Error)]
pub enum ShopError {
    #[error("operación rechazada: sin autorización del almacén")]
    PermissionFault,

    #[error("stock insuficiente: {card_id} ({finish}), disponible {available}")]
    InsufficientStock {
        card_id: String,
        finish: Finish,
        available: i32,
    },

    #[error(transparent)]
    Auth(#[from] AuthFailure),

    #[error("entrada inválida")]
    MalformedInput,

    #[error("el carrito está vacío")]
    EmptyCart,

    #[error("no encontrado")]
    NotFound,

    #[error("operación de almacén fallida: {0}")]
    Store(#[source] sqlx::Error),

    #[error("consulta al catálogo fallida: {0}")]
    Gateway(#[from] reqwest::Error),
}

impl ShopError {
    /// Classifies a raw store error. Postgres `insufficient_privilege`
    /// (42501) becomes the banner-level permission fault; a missing row is a
    /// plain not-found.
    pub fn from_store(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db) = err {
            if db.code().as_deref() == Some("42501") {
                return ShopError::PermissionFault;
            }
        }
        match err {
            sqlx::Error::RowNotFound => ShopError::NotFound,
            other => ShopError::Store(other),
        }
    }
}

/// Login/registration failures, each with its own user-facing message.
/// Unknown email and wrong password deliberately share one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthFailure {
    #[error("Correo o contraseña incorrectos.")]
    InvalidCredentials,
    #[error("Este correo ya está registrado.")]
    EmailTaken,
    #[error("La contraseña debe tener al menos 6 caracteres.")]
    WeakPassword,
}
