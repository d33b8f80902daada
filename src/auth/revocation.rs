/// Revocation Ledger
///
/// Durable, append-only set of token identifiers (`jti`) that must no longer
/// be honored, whatever their expiry says. Backed by the `blocklist` table,
/// whose unique index on `jti` makes both operations a single indexed lookup.
/// Entries are never updated or deleted.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::AppError;

#[derive(Clone)]
pub struct RevocationLedger {
    pool: SqlitePool,
}

impl RevocationLedger {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Append `jti` to the ledger.
    ///
    /// Idempotent: revoking an already revoked identifier is not an error.
    /// Returns `true` if this call added the entry, `false` if it was
    /// already present, which lets single-use tokens detect a lost race.
    pub async fn revoke(&self, jti: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO blocklist (jti, revoked_at)
            VALUES (?, ?)
            ON CONFLICT (jti) DO NOTHING
            "#,
        )
        .bind(jti)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        let appended = result.rows_affected() == 1;
        if appended {
            tracing::info!(jti = %jti, "Token revoked");
        }
        Ok(appended)
    }

    pub async fn is_revoked(&self, jti: &str) -> Result<bool, AppError> {
        let revoked = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM blocklist WHERE jti = ?)",
        )
        .bind(jti)
        .fetch_one(&self.pool)
        .await?;

        Ok(revoked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_pool;

    #[tokio::test]
    async fn test_unknown_jti_is_not_revoked() {
        let ledger = RevocationLedger::new(test_pool().await);

        assert!(!ledger.is_revoked("never-issued").await.unwrap());
    }

    #[tokio::test]
    async fn test_revoked_jti_is_reported() {
        let ledger = RevocationLedger::new(test_pool().await);

        assert!(ledger.revoke("jti-1").await.unwrap());

        assert!(ledger.is_revoked("jti-1").await.unwrap());
        assert!(!ledger.is_revoked("jti-2").await.unwrap());
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let pool = test_pool().await;
        let ledger = RevocationLedger::new(pool.clone());

        assert!(ledger.revoke("jti-1").await.unwrap());
        assert!(!ledger.revoke("jti-1").await.unwrap());
        assert!(ledger.is_revoked("jti-1").await.unwrap());

        let entries = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM blocklist WHERE jti = ?")
            .bind("jti-1")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(entries, 1);
    }

    #[tokio::test]
    async fn test_ledger_is_shared_across_handles() {
        let pool = test_pool().await;
        let writer = RevocationLedger::new(pool.clone());
        let reader = RevocationLedger::new(pool);

        writer.revoke("jti-shared").await.unwrap();

        assert!(reader.is_revoked("jti-shared").await.unwrap());
    }
}
