//! Inventory table access — the single source of truth for sellable stock.

use crate::domain::inventory::{Finish, StockLevels};
use sqlx::{PgPool, Row};
use std::collections::HashMap;

/// Notification channel fired after every committed inventory mutation.
/// `pg_notify` inside the mutating transaction means subscribers only see
/// echoes of committed writes, in commit order.
pub const INVENTORY_CHANNEL: &str = "inventory_changed";

/// Full current snapshot of the inventory collection.
pub async fn snapshot(pool: &PgPool) -> Result<HashMap<String, StockLevels>, sqlx::Error> {
    let rows = sqlx::query("SELECT card_id, normal, foil FROM inventory")
        .fetch_all(pool)
        .await?;
    let mut out = HashMap::with_capacity(rows.len());
    for row in rows {
        let card_id: String = row.try_get("card_id")?;
        out.insert(
            card_id,
            StockLevels {
                normal: row.try_get("normal")?,
                foil: row.try_get("foil")?,
            },
        );
    }
    Ok(out)
}

/// Current levels for one card; a missing row reads as all-zero.
pub async fn levels(pool: &PgPool, card_id: &str) -> Result<StockLevels, sqlx::Error> {
    let row = sqlx::query("SELECT normal, foil FROM inventory WHERE card_id = $1")
        .bind(card_id)
        .fetch_optional(pool)
        .await?;
    match row {
        Some(row) => Ok(StockLevels {
            normal: row.try_get("normal")?,
            foil: row.try_get("foil")?,
        }),
        None => Ok(StockLevels::default()),
    }
}

/// Absolute-set of one finish as a merge-upsert: the row is created lazily
/// and the sibling finish's column is left untouched.
pub async fn upsert_finish<'e, E>(
    executor: E,
    card_id: &str,
    finish: Finish,
    quantity: i32,
) -> Result<StockLevels, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    let sql = match finish {
        Finish::Normal => {
            "INSERT INTO inventory (card_id, normal) VALUES ($1, $2) \
             ON CONFLICT (card_id) DO UPDATE SET normal = EXCLUDED.normal \
             RETURNING normal, foil"
        }
        Finish::Foil => {
            "INSERT INTO inventory (card_id, foil) VALUES ($1, $2) \
             ON CONFLICT (card_id) DO UPDATE SET foil = EXCLUDED.foil \
             RETURNING normal, foil"
        }
    };
    let row = sqlx::query(sql)
        .bind(card_id)
        .bind(quantity)
        .fetch_one(executor)
        .await?;
    Ok(StockLevels {
        normal: row.try_get("normal")?,
        foil: row.try_get("foil")?,
    })
}

/// Relative increment of one finish (compensation path). Composes with any
/// interleaved admin adjustments because it never writes an absolute value.
pub async fn increment_finish<'e, E>(
    executor: E,
    card_id: &str,
    finish: Finish,
    quantity: i32,
) -> Result<(), sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    let (normal, foil) = match finish {
        Finish::Normal => (quantity, 0),
        Finish::Foil => (0, quantity),
    };
    sqlx::query(
        "INSERT INTO inventory (card_id, normal, foil) VALUES ($1, $2, $3) \
         ON CONFLICT (card_id) DO UPDATE SET \
            normal = inventory.normal + EXCLUDED.normal, \
            foil = inventory.foil + EXCLUDED.foil",
    )
    .bind(card_id)
    .bind(normal)
    .bind(foil)
    .execute(executor)
    .await?;
    Ok(())
}

/// Emits the inventory-changed echo for one card.
pub async fn notify_change<'e, E>(executor: E, card_id: &str) -> Result<(), sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query("SELECT pg_notify($1, $2)")
        .bind(INVENTORY_CHANNEL)
        .bind(card_id)
        .execute(executor)
        .await?;
    Ok(())
}
