/// Credential records and the verifier that checks them.
///
/// Unknown usernames and wrong passwords are distinguished only in the logs;
/// callers always get `invalid_credentials`. When the username is unknown a
/// dummy hash is still verified so both paths cost the same bcrypt work.

use std::sync::Arc;

use chrono::Utc;
use sqlx::SqlitePool;

use crate::auth::password::{hash_password, verify_password};
use crate::error::{is_unique_violation, AppError, AuthError, CredentialError};
use crate::validators::Credentials;

const DUMMY_PASSWORD: &str = "storefront-timing-equalizer";

/// The public part of a credential record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: i64,
    pub username: String,
    pub is_admin: bool,
}

/// Rows of the `users` table
#[derive(Clone)]
pub struct CredentialStore {
    pool: SqlitePool,
}

impl CredentialStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a credential record.
    ///
    /// The first account ever created holds the admin role. `users` is an
    /// AUTOINCREMENT table, so `sqlite_sequence` remembers earlier rows even
    /// after they are deleted.
    ///
    /// # Errors
    /// `IdentityTaken` if the username already exists
    pub async fn create(&self, username: &str, password_hash: &str) -> Result<Account, AppError> {
        let (id, is_admin) = sqlx::query_as::<_, (i64, bool)>(
            r#"
            INSERT INTO users (username, password_hash, is_admin, created_at)
            SELECT ?, ?, (SELECT COALESCE(MAX(seq), 0) FROM sqlite_sequence WHERE name = 'users') = 0, ?
            RETURNING id, is_admin
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .bind(Utc::now().to_rfc3339())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Auth(AuthError::IdentityTaken)
            } else {
                AppError::from(e)
            }
        })?;

        Ok(Account {
            id,
            username: username.to_string(),
            is_admin,
        })
    }

    /// Account plus stored password hash
    pub async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<(Account, String)>, AppError> {
        let row = sqlx::query_as::<_, (i64, String, bool, String)>(
            "SELECT id, username, is_admin, password_hash FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id, username, is_admin, password_hash)| {
            (
                Account {
                    id,
                    username,
                    is_admin,
                },
                password_hash,
            )
        }))
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Account>, AppError> {
        let row = sqlx::query_as::<_, (i64, String, bool)>(
            "SELECT id, username, is_admin FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id, username, is_admin)| Account {
            id,
            username,
            is_admin,
        }))
    }

    /// Returns `false` if no such account existed
    pub async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[derive(Clone)]
pub struct CredentialVerifier {
    store: CredentialStore,
    hash_cost: u32,
    dummy_hash: Arc<str>,
}

impl CredentialVerifier {
    /// # Errors
    /// Fails if `hash_cost` is not a valid bcrypt cost
    pub fn new(store: CredentialStore, hash_cost: u32) -> Result<Self, AppError> {
        let dummy_hash = hash_password(DUMMY_PASSWORD, hash_cost)?;
        Ok(Self {
            store,
            hash_cost,
            dummy_hash: Arc::from(dummy_hash),
        })
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// Create a credential record for a validated username/password pair.
    pub async fn register(&self, credentials: Credentials) -> Result<Account, AppError> {
        if self
            .store
            .find_by_username(&credentials.username)
            .await?
            .is_some()
        {
            return Err(AuthError::IdentityTaken.into());
        }

        let cost = self.hash_cost;
        let password = credentials.password;
        let password_hash =
            tokio::task::spawn_blocking(move || hash_password(&password, cost)).await??;

        self.store.create(&credentials.username, &password_hash).await
    }

    /// Check a username/password pair against the stored hash.
    ///
    /// # Errors
    /// `InvalidCredentials` for an unknown username or a wrong password alike
    pub async fn verify(&self, credentials: Credentials) -> Result<Account, AppError> {
        let (account, stored_hash) = match self.store.find_by_username(&credentials.username).await? {
            Some((account, hash)) => (Some(account), hash),
            None => (None, self.dummy_hash.to_string()),
        };

        let password = credentials.password;
        let matches =
            tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash)).await??;

        let (failure, user_id) = match (account, matches) {
            (Some(account), true) => return Ok(account),
            (Some(account), false) => (CredentialError::Mismatch, Some(account.id)),
            (None, _) => (CredentialError::NotFound, None),
        };

        tracing::info!(cause = %failure, user_id = ?user_id, "Credential check failed");
        Err(failure.into())
    }
}
