//! The storefront's authoritative store operations.
//!
//! Every mutation of the shared Inventory and Order stores goes through this
//! service, one SQL transaction per operation:
//! 1. Checkout re-reads each line's stock under a row lock, decrements, and
//!    inserts the order — or rolls the whole thing back.
//! 2. Cancellation restores stock by relative increments and deletes the
//!    order in the same batch.
//! 3. Admin stock writes merge-upsert a single finish.
//!
//! Display code never calls the store for availability; it reads the stock
//! cache. The re-read here is what makes the staleness of that cache safe.

use crate::domain::cart::{Cart, CartLine};
use crate::domain::inventory::{Finish, StockLevels};
use crate::domain::order::{generate_order_id, Buyer, OrderStatus};
use crate::domain::Order;
use crate::error::ShopError;
use crate::infra::config;
use crate::storage::stock_cache::SyncHealth;
use crate::storage::{inventory, orders};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use std::collections::BTreeSet;

/// Outcome of a committed checkout, recorded for post-checkout display and
/// the out-of-band payment handoff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutReceipt {
    pub order_id: String,
    pub total: Decimal,
    pub handoff: Handoff,
}

/// Pre-filled message addressed to the fixed operator contact; payment is
/// settled out-of-band.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Handoff {
    pub contact: String,
    pub message: String,
}

pub struct StoreService {
    pool: PgPool,
    health: SyncHealth,
    operator_contact: String,
}

impl StoreService {
    /// Connects to the database and prepares the schema.
    pub async fn connect(health: SyncHealth, operator_contact: String) -> anyhow::Result<Self> {
        dotenv::dotenv().ok();
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&config::database_url())
            .await?;
        Self::with_pool(pool, health, operator_contact).await
    }

    pub async fn with_pool(
        pool: PgPool,
        health: SyncHealth,
        operator_contact: String,
    ) -> anyhow::Result<Self> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS inventory (
                card_id TEXT PRIMARY KEY,
                normal INTEGER NOT NULL DEFAULT 0 CHECK (normal >= 0),
                foil INTEGER NOT NULL DEFAULT 0 CHECK (foil >= 0)
            )",
        )
        .execute(&pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS orders (
                id TEXT PRIMARY KEY,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                buyer JSONB NOT NULL,
                items JSONB NOT NULL,
                total NUMERIC NOT NULL,
                status TEXT NOT NULL
            )",
        )
        .execute(&pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                role TEXT NOT NULL DEFAULT 'user',
                pass_digest TEXT NOT NULL,
                salt TEXT NOT NULL,
                name TEXT,
                phone TEXT,
                address TEXT,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        )
        .execute(&pool)
        .await?;

        Ok(Self {
            pool,
            health,
            operator_contact,
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn sync_health(&self) -> &SyncHealth {
        &self.health
    }

    /// Converts a cart snapshot into a durable order, all-or-nothing.
    ///
    /// Per line, the live per-finish quantity is re-read from the store
    /// under `FOR UPDATE` — not from the cache — so racing checkouts
    /// serialize on the rows they touch and no committed decrement can
    /// drive stock negative. The first shortfall aborts the whole
    /// transaction; nothing is written for any line and the cart is left
    /// untouched for retry. There is no admin exemption here: the same
    /// path commits for every role.
    pub async fn checkout(&self, cart: &Cart, buyer: Buyer) -> Result<CheckoutReceipt, ShopError> {
        if cart.is_empty() {
            return Err(ShopError::EmptyCart);
        }
        // Prices were captured at add-to-cart time; checkout never re-prices.
        let total = cart.total();

        let mut tx = self.pool.begin().await.map_err(|e| self.store_err(e))?;

        // Lock rows in a stable order so concurrent multi-line checkouts
        // cannot deadlock on each other.
        let mut lines: Vec<&CartLine> = cart.lines().iter().collect();
        lines.sort_by(|a, b| (&a.key.card_id, a.key.finish.column())
            .cmp(&(&b.key.card_id, b.key.finish.column())));

        for line in lines {
            let row = sqlx::query("SELECT normal, foil FROM inventory WHERE card_id = $1 FOR UPDATE")
                .bind(&line.key.card_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| self.store_err(e))?;
            let live = match row {
                Some(row) => StockLevels {
                    normal: row.try_get("normal").map_err(|e| self.store_err(e))?,
                    foil: row.try_get("foil").map_err(|e| self.store_err(e))?,
                },
                None => StockLevels::default(),
            }
            .get(line.key.finish);

            if i64::from(live) < i64::from(line.quantity) {
                // Dropping the transaction rolls back every decrement so far.
                return Err(ShopError::InsufficientStock {
                    card_id: line.key.card_id.clone(),
                    finish: line.key.finish,
                    available: live.max(0),
                });
            }

            let sql = match line.key.finish {
                Finish::Normal => "UPDATE inventory SET normal = normal - $2 WHERE card_id = $1",
                Finish::Foil => "UPDATE inventory SET foil = foil - $2 WHERE card_id = $1",
            };
            sqlx::query(sql)
                .bind(&line.key.card_id)
                .bind(line.quantity as i32)
                .execute(&mut *tx)
                .await
                .map_err(|e| self.store_err(e))?;
        }

        let order_id = generate_order_id();
        sqlx::query(
            "INSERT INTO orders (id, buyer, items, total, status) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&order_id)
        .bind(Json(&buyer))
        .bind(Json(cart.lines()))
        .bind(total)
        .bind(OrderStatus::Pendiente.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| self.store_err(e))?;

        for card_id in distinct_card_ids(cart.lines()) {
            inventory::notify_change(&mut *tx, card_id)
                .await
                .map_err(|e| self.store_err(e))?;
        }

        tx.commit().await.map_err(|e| self.store_err(e))?;
        self.health.mark_ok();
        tracing::info!(%order_id, total = %total, buyer = %buyer.email, "checkout committed");

        Ok(CheckoutReceipt {
            handoff: self.handoff(&order_id, &buyer, total),
            order_id,
            total,
        })
    }

    /// Reverses the inventory effect of a committed order and deletes it,
    /// as one atomic batch. Increments (not absolute sets) compose with any
    /// interleaved admin adjustments. Irreversible.
    pub async fn cancel_order(&self, order_id: &str) -> Result<(), ShopError> {
        let mut tx = self.pool.begin().await.map_err(|e| self.store_err(e))?;

        let row = sqlx::query("SELECT items FROM orders WHERE id = $1 FOR UPDATE")
            .bind(order_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| self.store_err(e))?;
        let Some(row) = row else {
            return Err(ShopError::NotFound);
        };
        let items: Json<Vec<CartLine>> = row.try_get("items").map_err(|e| self.store_err(e))?;

        for line in &items.0 {
            inventory::increment_finish(
                &mut *tx,
                &line.key.card_id,
                line.key.finish,
                line.quantity as i32,
            )
            .await
            .map_err(|e| self.store_err(e))?;
        }

        sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(order_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| self.store_err(e))?;

        for card_id in distinct_card_ids(&items.0) {
            inventory::notify_change(&mut *tx, card_id)
                .await
                .map_err(|e| self.store_err(e))?;
        }

        tx.commit().await.map_err(|e| self.store_err(e))?;
        self.health.mark_ok();
        tracing::info!(order_id, "order cancelled, stock restored");
        Ok(())
    }

    /// Absolute-set of one finish's quantity from raw admin input.
    ///
    /// Anything that is not a plain non-negative integer is a silent no-op
    /// returning the current stored levels — tolerated leniency for a
    /// trusted role typing into a quantity field. Valid input merge-upserts
    /// so the sibling finish is never clobbered.
    pub async fn set_stock(
        &self,
        card_id: &str,
        finish: Finish,
        raw: &str,
    ) -> Result<StockLevels, ShopError> {
        let Some(quantity) = parse_stock_input(raw) else {
            tracing::debug!(card_id, %finish, raw, "ignoring invalid stock input");
            return inventory::levels(&self.pool, card_id)
                .await
                .map_err(|e| self.store_err(e));
        };

        let mut tx = self.pool.begin().await.map_err(|e| self.store_err(e))?;
        let levels = inventory::upsert_finish(&mut *tx, card_id, finish, quantity)
            .await
            .map_err(|e| self.store_err(e))?;
        inventory::notify_change(&mut *tx, card_id)
            .await
            .map_err(|e| self.store_err(e))?;
        tx.commit().await.map_err(|e| self.store_err(e))?;

        self.health.mark_ok();
        tracing::debug!(card_id, %finish, quantity, "stock set");
        Ok(levels)
    }

    /// Free-form status write; the enumeration is advisory, any value may
    /// follow any other.
    pub async fn set_order_status(
        &self,
        order_id: &str,
        status: OrderStatus,
    ) -> Result<(), ShopError> {
        let affected = orders::set_status(&self.pool, order_id, status)
            .await
            .map_err(|e| self.store_err(e))?;
        if affected == 0 {
            return Err(ShopError::NotFound);
        }
        self.health.mark_ok();
        Ok(())
    }

    pub async fn list_all_orders(&self) -> Result<Vec<Order>, ShopError> {
        orders::list_all(&self.pool)
            .await
            .map_err(|e| self.store_err(e))
    }

    pub async fn list_orders_for(&self, uid: &str, email: &str) -> Result<Vec<Order>, ShopError> {
        orders::list_for_identity(&self.pool, uid, email)
            .await
            .map_err(|e| self.store_err(e))
    }

    fn handoff(&self, order_id: &str, buyer: &Buyer, total: Decimal) -> Handoff {
        Handoff {
            contact: self.operator_contact.clone(),
            message: format!(
                "Hola, soy {}. Realicé el pedido {} por un total de ${}. Quedo atento para coordinar el pago.",
                buyer.name, order_id, total
            ),
        }
    }

    /// Classifies store errors and trips the sync banner on authorization
    /// rejections; any later successful operation clears it.
    fn store_err(&self, err: sqlx::Error) -> ShopError {
        let err = ShopError::from_store(err);
        if matches!(err, ShopError::PermissionFault) {
            self.health.mark_fault();
        }
        err
    }
}

/// Accepts only a plain non-negative integer, with surrounding whitespace
/// tolerated.
fn parse_stock_input(raw: &str) -> Option<i32> {
    raw.trim().parse::<i32>().ok().filter(|q| *q >= 0)
}

fn distinct_card_ids(lines: &[CartLine]) -> BTreeSet<&str> {
    lines.iter().map(|l| l.key.card_id.as_str()).collect()
}
