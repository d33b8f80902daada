use sqlx::SqlitePool;

use crate::catalog::{ItemRef, Store, StoreRef, TagRef};
use crate::error::{is_unique_violation, AppError};

const STORE_NOT_FOUND: &str = "Store not found.";

pub async fn list(pool: &SqlitePool) -> Result<Vec<Store>, AppError> {
    let rows = sqlx::query_as::<_, (i64, String)>("SELECT id, name FROM stores ORDER BY id")
        .fetch_all(pool)
        .await?;

    let mut stores = Vec::with_capacity(rows.len());
    for (id, name) in rows {
        stores.push(assemble(pool, id, name).await?);
    }
    Ok(stores)
}

pub async fn get(pool: &SqlitePool, id: i64) -> Result<Store, AppError> {
    let store = find_ref(pool, id).await?;
    assemble(pool, store.id, store.name).await
}

/// # Errors
/// `Conflict` if a store with that name already exists
pub async fn create(pool: &SqlitePool, name: &str) -> Result<Store, AppError> {
    let id = sqlx::query_scalar::<_, i64>("INSERT INTO stores (name) VALUES (?) RETURNING id")
        .bind(name)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("A store with that name already exists.".to_string())
            } else {
                AppError::from(e)
            }
        })?;

    Ok(Store {
        id,
        name: name.to_string(),
        items: Vec::new(),
        tags: Vec::new(),
    })
}

/// Items and tags of the store go with it.
pub async fn delete(pool: &SqlitePool, id: i64) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM stores WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(STORE_NOT_FOUND.to_string()));
    }
    Ok(())
}

/// `{id, name}` of a store, or `NotFound`
pub async fn find_ref(pool: &SqlitePool, id: i64) -> Result<StoreRef, AppError> {
    sqlx::query_as::<_, (i64, String)>("SELECT id, name FROM stores WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .map(StoreRef::from)
        .ok_or_else(|| AppError::NotFound(STORE_NOT_FOUND.to_string()))
}

async fn assemble(pool: &SqlitePool, id: i64, name: String) -> Result<Store, AppError> {
    let items = sqlx::query_as::<_, (i64, String, f64)>(
        "SELECT id, name, price FROM items WHERE store_id = ? ORDER BY id",
    )
    .bind(id)
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(ItemRef::from)
    .collect();

    let tags = sqlx::query_as::<_, (i64, String)>(
        "SELECT id, name FROM tags WHERE store_id = ? ORDER BY id",
    )
    .bind(id)
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(TagRef::from)
    .collect();

    Ok(Store {
        id,
        name,
        items,
        tags,
    })
}
