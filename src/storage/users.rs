//! User profiles and credentials.

use crate::domain::user::{Profile, Role};
use crate::error::{AuthFailure, ShopError};
use rand::Rng;
use sha2::{Digest, Sha256};
use sqlx::{PgPool, Row};

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub uid: String,
    pub email: String,
    pub role: Role,
    pub profile: Profile,
}

fn credential_digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

fn generate_uid() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..12)
        .map(|_| rng.sample(rand::distributions::Alphanumeric) as char)
        .collect();
    format!("USR-{suffix}")
}

/// Creates a `user`-role profile with a salted credential digest.
///
/// Weak credentials are rejected before touching the store; a duplicate
/// email surfaces the unique-violation as its own auth failure.
pub async fn register(pool: &PgPool, email: &str, password: &str) -> Result<UserRecord, ShopError> {
    if password.chars().count() < 6 {
        return Err(AuthFailure::WeakPassword.into());
    }
    let uid = generate_uid();
    let salt = hex::encode(rand::thread_rng().gen::<[u8; 16]>());
    let digest = credential_digest(&salt, password);
    sqlx::query(
        "INSERT INTO users (id, email, role, pass_digest, salt) VALUES ($1, $2, 'user', $3, $4)",
    )
    .bind(&uid)
    .bind(email)
    .bind(&digest)
    .bind(&salt)
    .execute(pool)
    .await
    .map_err(|err| {
        if let sqlx::Error::Database(ref db) = err {
            if db.code().as_deref() == Some("23505") {
                return AuthFailure::EmailTaken.into();
            }
        }
        ShopError::from_store(err)
    })?;
    Ok(UserRecord {
        uid,
        email: email.to_string(),
        role: Role::User,
        profile: Profile::default(),
    })
}

/// Verifies credentials and loads the server-side role and profile. The
/// role defaults to `user` when the stored value is absent or unreadable;
/// unknown email and wrong password report the same failure.
pub async fn authenticate(
    pool: &PgPool,
    email: &str,
    password: &str,
) -> Result<UserRecord, ShopError> {
    let row = sqlx::query(
        "SELECT id, email, role, pass_digest, salt, name, phone, address \
         FROM users WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await
    .map_err(ShopError::from_store)?;

    let Some(row) = row else {
        return Err(AuthFailure::InvalidCredentials.into());
    };

    let salt: String = row.try_get("salt").map_err(ShopError::from_store)?;
    let stored: String = row.try_get("pass_digest").map_err(ShopError::from_store)?;
    if credential_digest(&salt, password) != stored {
        return Err(AuthFailure::InvalidCredentials.into());
    }

    let role = row
        .try_get::<String, _>("role")
        .map(|r| Role::parse_or_default(&r))
        .unwrap_or(Role::User);
    Ok(UserRecord {
        uid: row.try_get("id").map_err(ShopError::from_store)?,
        email: row.try_get("email").map_err(ShopError::from_store)?,
        role,
        profile: Profile {
            name: row.try_get::<Option<String>, _>("name").ok().flatten(),
            phone: row.try_get::<Option<String>, _>("phone").ok().flatten(),
            address: row.try_get::<Option<String>, _>("address").ok().flatten(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_depends_on_salt_and_password() {
        let a = credential_digest("salt1", "hunter22");
        assert_eq!(a, credential_digest("salt1", "hunter22"));
        assert_ne!(a, credential_digest("salt2", "hunter22"));
        assert_ne!(a, credential_digest("salt1", "hunter23"));
    }

    #[test]
    fn uids_are_prefixed_and_distinct() {
        let uid = generate_uid();
        assert!(uid.starts_with("USR-"));
        assert_eq!(uid.len(), 16);
        assert_ne!(uid, generate_uid());
    }
}
