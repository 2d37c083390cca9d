//! In-process read replica of the inventory table.
//!
//! Availability decisions in the UI read this cache, never the store: a push
//! replica trades a window of staleness for display reads that cost no
//! round-trip. The checkout transaction re-reads authoritatively, so the
//! staleness window is harmless for correctness.

use crate::domain::inventory::{Finish, StockLevels, StockView};
use crate::storage::inventory;
use sqlx::postgres::PgListener;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub type StockSnapshot = HashMap<String, StockLevels>;

/// Banner-level sync state shared by the cache task, the store service and
/// the health endpoint. Set when store sync fails, cleared by the next
/// operation of the same kind that succeeds.
#[derive(Debug, Clone, Default)]
pub struct SyncHealth {
    degraded: Arc<AtomicBool>,
}

impl SyncHealth {
    pub fn mark_fault(&self) {
        self.degraded.store(true, Ordering::SeqCst);
    }

    pub fn mark_ok(&self) {
        self.degraded.store(false, Ordering::SeqCst);
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::SeqCst)
    }
}

/// Continuously-updated replica of per-card stock, fed by the
/// `inventory_changed` channel. Cheap to clone; all clones observe the same
/// latest snapshot.
#[derive(Debug, Clone)]
pub struct StockCache {
    rx: watch::Receiver<StockSnapshot>,
    health: SyncHealth,
}

impl StockCache {
    /// Establishes the live feed: loads an initial snapshot, then rebuilds
    /// the full snapshot on every notification and publishes it into a
    /// single-slot latest-value channel, so consumers never observe
    /// snapshots out of order.
    ///
    /// On listener or rebuild failure the replica freezes at its last
    /// snapshot and the sync-health flag is raised; the listener's own
    /// reconnect is the only retry.
    pub async fn subscribe(
        pool: PgPool,
        health: SyncHealth,
    ) -> anyhow::Result<(StockCache, JoinHandle<()>)> {
        let mut listener = PgListener::connect_with(&pool).await?;
        listener.listen(inventory::INVENTORY_CHANNEL).await?;
        let initial = inventory::snapshot(&pool).await?;
        let (tx, rx) = watch::channel(initial);

        let task_health = health.clone();
        let handle = tokio::spawn(async move {
            loop {
                match listener.recv().await {
                    Ok(_) => match inventory::snapshot(&pool).await {
                        Ok(snap) => {
                            task_health.mark_ok();
                            if tx.send(snap).is_err() {
                                break;
                            }
                        }
                        Err(err) => {
                            tracing::warn!(error = %err, "stock snapshot rebuild failed; replica frozen");
                            task_health.mark_fault();
                        }
                    },
                    Err(err) => {
                        tracing::warn!(error = %err, "inventory listener lost; replica frozen until reconnect");
                        task_health.mark_fault();
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        });

        Ok((StockCache { rx, health }, handle))
    }

    /// A clone of the latest snapshot, for full-stock listings.
    pub fn snapshot(&self) -> StockSnapshot {
        self.rx.borrow().clone()
    }

    /// Card ids with any sellable stock, used to hydrate the storefront.
    pub fn in_stock_ids(&self) -> Vec<String> {
        self.rx
            .borrow()
            .iter()
            .filter(|(_, levels)| levels.normal > 0 || levels.foil > 0)
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn health(&self) -> &SyncHealth {
        &self.health
    }

    /// Test-only replica frozen at a fixed snapshot, with no feed behind it.
    #[cfg(test)]
    pub fn fixed(snapshot: StockSnapshot) -> StockCache {
        let (_tx, rx) = watch::channel(snapshot);
        StockCache {
            rx,
            health: SyncHealth::default(),
        }
    }
}

impl StockView for StockCache {
    /// Pure read of the latest snapshot; unknown keys report zero.
    fn stock(&self, card_id: &str, finish: Finish) -> i32 {
        self.rx
            .borrow()
            .get(card_id)
            .map(|levels| levels.get(finish))
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_keys_read_as_zero() {
        let cache = StockCache::fixed(StockSnapshot::new());
        assert_eq!(cache.stock("missing", Finish::Normal), 0);
        assert_eq!(cache.stock("missing", Finish::Foil), 0);
    }

    #[test]
    fn in_stock_ids_skip_zeroed_cards() {
        let mut snap = StockSnapshot::new();
        snap.insert("a".into(), StockLevels { normal: 1, foil: 0 });
        snap.insert("b".into(), StockLevels { normal: 0, foil: 0 });
        snap.insert("c".into(), StockLevels { normal: 0, foil: 2 });
        let cache = StockCache::fixed(snap);
        let mut ids = cache.in_stock_ids();
        ids.sort();
        assert_eq!(ids, vec!["a".to_string(), "c".to_string()]);
    }
}
