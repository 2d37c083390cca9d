//! End-to-end checkout tests: the authoritative protocol against a real
//! Postgres, driven through the in-process router.
//!
//! These tests are skipped (with a note) when `DATABASE_URL` is not set.

use cardbazaar::transport;
use cardbazaar::{CatalogClient, SessionMap, StockCache, StoreService, SyncHealth};
use rust_decimal::Decimal;
use serde_json::json;
use sqlx::Row;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

struct TestApp {
    base: String,
    client: reqwest::Client,
    pool: sqlx::PgPool,
}

async fn start_storefront() -> Result<Option<TestApp>, Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(None);
    }

    let health = SyncHealth::default();
    let store = Arc::new(
        StoreService::connect(health.clone(), "pedidos@test.example".to_string()).await?,
    );
    let pool = store.pool().clone();
    let (stock, _cache_task) = StockCache::subscribe(pool.clone(), health).await?;

    let app_state = transport::http::AppState {
        store,
        sessions: SessionMap::new(),
        // The catalog is never reached by these flows.
        catalog: Arc::new(CatalogClient::new(
            "http://127.0.0.1:9".to_string(),
            Decimal::ONE,
        )),
        stock,
    };
    let router = transport::http::create_router(app_state);

    // Bind to an ephemeral port to avoid conflicts if an API server is
    // already running.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    Ok(Some(TestApp {
        base: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
        pool,
    }))
}

fn unique_tag() -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!(
        "{}-{}-{}",
        std::process::id(),
        nanos,
        COUNTER.fetch_add(1, Ordering::Relaxed)
    )
}

impl TestApp {
    async fn guest(&self) -> String {
        let resp: serde_json::Value = self
            .client
            .post(format!("{}/api/session", self.base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        resp["data"]["token"].as_str().unwrap().to_string()
    }

    /// Registers a fresh account, promotes it server-side, and logs in
    /// again so the session carries the admin role.
    async fn admin(&self) -> String {
        let email = format!("admin-{}@test.example", unique_tag());
        let creds = json!({ "email": email, "password": "secreta123" });
        let resp = self
            .client
            .post(format!("{}/api/auth/register", self.base))
            .json(&creds)
            .send()
            .await
            .unwrap();
        assert!(resp.status().is_success());
        sqlx::query("UPDATE users SET role = 'admin' WHERE email = $1")
            .bind(&email)
            .execute(&self.pool)
            .await
            .unwrap();
        let resp: serde_json::Value = self
            .client
            .post(format!("{}/api/auth/login", self.base))
            .json(&creds)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(resp["data"]["role"], "admin");
        resp["data"]["token"].as_str().unwrap().to_string()
    }

    /// Sets stock and waits for the echo to reach the replica, since
    /// non-admin cart admissions are checked against the cache.
    async fn set_stock(&self, admin: &str, card_id: &str, finish: &str, quantity: i32) {
        let resp = self
            .client
            .post(format!("{}/api/inventory/set", self.base))
            .header("x-session-token", admin)
            .json(&json!({
                "card_id": card_id,
                "finish": finish,
                "quantity": quantity.to_string(),
            }))
            .send()
            .await
            .unwrap();
        assert!(resp.status().is_success());
        self.await_replica(card_id, finish, quantity).await;
    }

    async fn await_replica(&self, card_id: &str, finish: &str, expected: i32) {
        for _ in 0..100 {
            let body: serde_json::Value = self
                .client
                .get(format!("{}/api/stock", self.base))
                .send()
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
            if body["data"]["stock"][card_id][finish] == expected {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        }
        panic!("stock replica never reflected {card_id}.{finish} = {expected}");
    }

    async fn add_to_cart(
        &self,
        token: &str,
        card_id: &str,
        finish: &str,
        unit_price: &str,
        quantity: u32,
    ) -> reqwest::Response {
        self.client
            .post(format!("{}/api/cart/add", self.base))
            .header("x-session-token", token)
            .json(&json!({
                "card_id": card_id,
                "finish": finish,
                "name": card_id,
                "set_name": "Test Set",
                "unit_price": unit_price,
                "quantity": quantity,
            }))
            .send()
            .await
            .unwrap()
    }

    async fn checkout(&self, token: &str, name: &str, email: &str) -> reqwest::Response {
        self.client
            .post(format!("{}/api/checkout", self.base))
            .header("x-session-token", token)
            .json(&json!({
                "name": name,
                "email": email,
                "address": "Calle Falsa 123",
            }))
            .send()
            .await
            .unwrap()
    }

    async fn levels(&self, card_id: &str) -> (i32, i32) {
        let row = sqlx::query("SELECT normal, foil FROM inventory WHERE card_id = $1")
            .bind(card_id)
            .fetch_optional(&self.pool)
            .await
            .unwrap();
        match row {
            Some(row) => (row.get("normal"), row.get("foil")),
            None => (0, 0),
        }
    }

    async fn order_count_for(&self, email: &str) -> i64 {
        sqlx::query("SELECT count(*) AS n FROM orders WHERE buyer->>'email' = $1")
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .unwrap()
            .get("n")
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn checkout_decrements_stock_and_creates_order() -> Result<(), Box<dyn std::error::Error>> {
    let Some(app) = start_storefront().await? else {
        return Ok(());
    };
    let card = format!("card-{}", unique_tag());
    let admin = app.admin().await;
    app.set_stock(&admin, &card, "normal", 5).await;

    let shopper = app.guest().await;
    let resp = app.add_to_cart(&shopper, &card, "normal", "10.00", 2).await;
    assert!(resp.status().is_success());

    let buyer_email = format!("shopper-{}@test.example", unique_tag());
    let resp = app.checkout(&shopper, "Ana Compradora", &buyer_email).await;
    assert!(resp.status().is_success());
    let body: serde_json::Value = resp.json().await?;
    let order_id = body["data"]["order_id"].as_str().unwrap();
    assert!(order_id.starts_with("ORD-"));
    let total = Decimal::from_str(body["data"]["total"].as_str().unwrap())?;
    assert_eq!(total, Decimal::from(20));
    // The handoff message is pre-filled with order id, buyer and total.
    let message = body["data"]["handoff"]["message"].as_str().unwrap();
    assert!(message.contains(order_id));
    assert!(message.contains("Ana Compradora"));

    assert_eq!(app.levels(&card).await, (3, 0));
    assert_eq!(app.order_count_for(&buyer_email).await, 1);

    // The cart was cleared by the commit.
    let cart: serde_json::Value = app
        .client
        .get(format!("{}/api/cart", app.base))
        .header("x-session-token", &shopper)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(cart["data"]["lines"].as_array().unwrap().len(), 0);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn mixed_cart_checkout_is_all_or_nothing() -> Result<(), Box<dyn std::error::Error>> {
    let Some(app) = start_storefront().await? else {
        return Ok(());
    };
    let plenty = format!("card-{}", unique_tag());
    let scarce = format!("card-{}", unique_tag());
    let admin = app.admin().await;
    app.set_stock(&admin, &plenty, "normal", 5).await;
    app.set_stock(&admin, &scarce, "normal", 1).await;

    // Admin admission is unconditional, so the cart can hold more than the
    // store has; the commit must still refuse.
    let resp = app.add_to_cart(&admin, &plenty, "normal", "1.00", 2).await;
    assert!(resp.status().is_success());
    let resp = app.add_to_cart(&admin, &scarce, "normal", "1.00", 2).await;
    assert!(resp.status().is_success());

    let buyer_email = format!("admin-buy-{}@test.example", unique_tag());
    let resp = app.checkout(&admin, "Admin", &buyer_email).await;
    assert_eq!(resp.status(), reqwest::StatusCode::CONFLICT);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["data"]["card_id"], scarce.as_str());
    assert_eq!(body["data"]["available"], 1);

    // No partial writes: both stocks unchanged, no order created.
    assert_eq!(app.levels(&plenty).await, (5, 0));
    assert_eq!(app.levels(&scarce).await, (1, 0));
    assert_eq!(app.order_count_for(&buyer_email).await, 0);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn admin_checkout_cannot_overdraw_zero_stock() -> Result<(), Box<dyn std::error::Error>> {
    let Some(app) = start_storefront().await? else {
        return Ok(());
    };
    let card = format!("card-{}", unique_tag());
    let admin = app.admin().await;
    app.set_stock(&admin, &card, "normal", 0).await;

    let resp = app.add_to_cart(&admin, &card, "normal", "4.00", 1).await;
    assert!(resp.status().is_success(), "admin admission bypasses stock");

    let resp = app
        .checkout(&admin, "Admin", "admin-overdraw@test.example")
        .await;
    assert_eq!(resp.status(), reqwest::StatusCode::CONFLICT);
    assert_eq!(app.levels(&card).await, (0, 0));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_checkouts_never_oversell() -> Result<(), Box<dyn std::error::Error>> {
    let Some(app) = start_storefront().await? else {
        return Ok(());
    };
    let card = format!("card-{}", unique_tag());
    let admin = app.admin().await;
    app.set_stock(&admin, &card, "normal", 1).await;

    let first = app.guest().await;
    let second = app.guest().await;
    let resp = app.add_to_cart(&first, &card, "normal", "2.00", 1).await;
    assert!(resp.status().is_success());
    let resp = app.add_to_cart(&second, &card, "normal", "2.00", 1).await;
    assert!(resp.status().is_success());

    let (a, b) = tokio::join!(
        app.checkout(&first, "Primero", "first@test.example"),
        app.checkout(&second, "Segundo", "second@test.example"),
    );
    let statuses = [a.status(), b.status()];
    let successes = statuses.iter().filter(|s| s.is_success()).count();
    let conflicts = statuses
        .iter()
        .filter(|s| **s == reqwest::StatusCode::CONFLICT)
        .count();
    assert_eq!(successes, 1, "exactly one racer may commit");
    assert_eq!(conflicts, 1);
    assert_eq!(app.levels(&card).await, (0, 0));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn empty_cart_checkout_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let Some(app) = start_storefront().await? else {
        return Ok(());
    };
    let shopper = app.guest().await;
    let resp = app.checkout(&shopper, "Nadie", "nobody@test.example").await;
    assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
    Ok(())
}
