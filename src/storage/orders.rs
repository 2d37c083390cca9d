//! Order table access.

use crate::domain::cart::CartLine;
use crate::domain::order::{Buyer, Order, OrderStatus};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};

fn row_to_order(row: &PgRow) -> Result<Order, sqlx::Error> {
    let buyer: Json<Buyer> = row.try_get("buyer")?;
    let items: Json<Vec<CartLine>> = row.try_get("items")?;
    let total: Decimal = row.try_get("total")?;
    let status_raw: String = row.try_get("status")?;
    let status: OrderStatus = status_raw
        .parse()
        .map_err(|e: String| sqlx::Error::Decode(e.into()))?;
    Ok(Order {
        id: row.try_get("id")?,
        created_at: row.try_get("created_at")?,
        buyer: buyer.0,
        items: items.0,
        total,
        status,
    })
}

const SELECT_COLUMNS: &str = "id, created_at, buyer, items, total, status";

/// All orders, newest first. Admin view.
pub async fn list_all(pool: &PgPool) -> Result<Vec<Order>, sqlx::Error> {
    let rows = sqlx::query(&format!(
        "SELECT {SELECT_COLUMNS} FROM orders ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await?;
    rows.iter().map(row_to_order).collect()
}

/// Orders belonging to one identity, matched by uid or buyer email, newest
/// first.
pub async fn list_for_identity(
    pool: &PgPool,
    uid: &str,
    email: &str,
) -> Result<Vec<Order>, sqlx::Error> {
    let rows = sqlx::query(&format!(
        "SELECT {SELECT_COLUMNS} FROM orders \
         WHERE buyer->>'uid' = $1 OR buyer->>'email' = $2 \
         ORDER BY created_at DESC"
    ))
    .bind(uid)
    .bind(email)
    .fetch_all(pool)
    .await?;
    rows.iter().map(row_to_order).collect()
}

/// Field-level status update. Missing order reports zero rows.
pub async fn set_status(
    pool: &PgPool,
    order_id: &str,
    status: OrderStatus,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE orders SET status = $2 WHERE id = $1")
        .bind(order_id)
        .bind(status.as_str())
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
