//! Server-side session registry: bearer token → identity + cart.
//!
//! The cart lives inside the session as an explicit per-session context
//! object; nothing here is process-global and nothing is persisted. Guest
//! sessions hold carts too; logging in upgrades a session in place so the
//! cart survives, logging out drops the session (and its cart) entirely.

use crate::domain::cart::Cart;
use crate::domain::user::{Profile, Role};
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
pub struct Identity {
    pub uid: String,
    pub email: String,
    pub role: Role,
    pub profile: Profile,
}

#[derive(Debug, Default)]
pub struct Session {
    pub identity: Option<Identity>,
    pub cart: Cart,
}

impl Session {
    /// Effective role; anonymous visitors act as plain users.
    pub fn role(&self) -> Role {
        self.identity
            .as_ref()
            .map(|i| i.role)
            .unwrap_or(Role::User)
    }
}

#[derive(Clone, Default)]
pub struct SessionMap {
    inner: Arc<RwLock<HashMap<String, Session>>>,
}

impl SessionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens an anonymous session and returns its bearer token.
    pub async fn create(&self) -> String {
        let token = generate_token();
        self.inner
            .write()
            .await
            .insert(token.clone(), Session::default());
        token
    }

    /// Binds an identity to a session. An existing token keeps its cart;
    /// otherwise a fresh session is opened. Returns the session token.
    pub async fn attach_identity(&self, token: Option<&str>, identity: Identity) -> String {
        let mut map = self.inner.write().await;
        if let Some(token) = token {
            if let Some(session) = map.get_mut(token) {
                session.identity = Some(identity);
                return token.to_string();
            }
        }
        let token = generate_token();
        map.insert(
            token.clone(),
            Session {
                identity: Some(identity),
                cart: Cart::default(),
            },
        );
        token
    }

    /// Ends a session, discarding its cart. Returns whether it existed.
    pub async fn drop_session(&self, token: &str) -> bool {
        self.inner.write().await.remove(token).is_some()
    }

    /// Runs `f` against the session for `token`, or returns `None` for an
    /// unknown token.
    pub async fn with<R>(&self, token: &str, f: impl FnOnce(&mut Session) -> R) -> Option<R> {
        let mut map = self.inner.write().await;
        map.get_mut(token).map(f)
    }

    /// Effective role for a token; `None` when the session is unknown.
    pub async fn role_of(&self, token: &str) -> Option<Role> {
        self.inner.read().await.get(token).map(|s| s.role())
    }
}

fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    (0..32)
        .map(|_| rng.sample(rand::distributions::Alphanumeric) as char)
        .collect()
}
