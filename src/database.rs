use sqlx::migrate::MigrateError;
use sqlx::SqlitePool;

/// Apply the embedded migrations in `./migrations`.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Fresh, migrated database in the temp directory
#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    use crate::configuration::DatabaseSettings;

    let path = std::env::temp_dir().join(format!("storefront-unit-{}.db", uuid::Uuid::new_v4()));
    let settings = DatabaseSettings {
        path: path.to_string_lossy().into_owned(),
        max_connections: 2,
    };

    let pool = settings
        .connection_pool()
        .await
        .expect("Failed to open test database");
    run_migrations(&pool)
        .await
        .expect("Failed to migrate test database");
    pool
}
