use sqlx::SqlitePool;

use crate::catalog::{stores, Item, ItemRef, TagRef};
use crate::error::AppError;
use crate::validators::{ItemChanges, NewItem};

const ITEM_NOT_FOUND: &str = "Item not found.";

/// Outcome of a PUT on an item id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Updated,
    Created,
}

pub async fn list(pool: &SqlitePool) -> Result<Vec<Item>, AppError> {
    let rows = sqlx::query_as::<_, (i64, String, f64, i64)>(
        "SELECT id, name, price, store_id FROM items ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        items.push(assemble(pool, row).await?);
    }
    Ok(items)
}

pub async fn get(pool: &SqlitePool, id: i64) -> Result<Item, AppError> {
    let row = sqlx::query_as::<_, (i64, String, f64, i64)>(
        "SELECT id, name, price, store_id FROM items WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(not_found)?;

    assemble(pool, row).await
}

/// # Errors
/// `NotFound` if the referenced store does not exist
pub async fn create(pool: &SqlitePool, item: NewItem) -> Result<Item, AppError> {
    stores::find_ref(pool, item.store_id).await?;

    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO items (name, price, store_id) VALUES (?, ?, ?) RETURNING id",
    )
    .bind(&item.name)
    .bind(item.price)
    .bind(item.store_id)
    .fetch_one(pool)
    .await?;

    get(pool, id).await
}

/// Apply `changes` to an existing item, or create the item under `id` when
/// there is none. Creation needs every field.
pub async fn upsert(
    pool: &SqlitePool,
    id: i64,
    changes: ItemChanges,
) -> Result<(Item, Upsert), AppError> {
    if let Some(store_id) = changes.store_id {
        stores::find_ref(pool, store_id).await?;
    }

    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM items WHERE id = ?)")
        .bind(id)
        .fetch_one(pool)
        .await?;

    let outcome = if exists {
        sqlx::query(
            r#"
            UPDATE items
            SET name = COALESCE(?, name),
                price = COALESCE(?, price),
                store_id = COALESCE(?, store_id)
            WHERE id = ?
            "#,
        )
        .bind(changes.name)
        .bind(changes.price)
        .bind(changes.store_id)
        .bind(id)
        .execute(pool)
        .await?;
        Upsert::Updated
    } else {
        let item = changes.into_new_item()?;
        sqlx::query("INSERT INTO items (id, name, price, store_id) VALUES (?, ?, ?, ?)")
            .bind(id)
            .bind(&item.name)
            .bind(item.price)
            .bind(item.store_id)
            .execute(pool)
            .await?;
        Upsert::Created
    };

    Ok((get(pool, id).await?, outcome))
}

pub async fn delete(pool: &SqlitePool, id: i64) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM items WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(not_found());
    }
    Ok(())
}

pub async fn find_ref(pool: &SqlitePool, id: i64) -> Result<ItemRef, AppError> {
    sqlx::query_as::<_, (i64, String, f64)>("SELECT id, name, price FROM items WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .map(ItemRef::from)
        .ok_or_else(not_found)
}

fn not_found() -> AppError {
    AppError::NotFound(ITEM_NOT_FOUND.to_string())
}

async fn assemble(
    pool: &SqlitePool,
    (id, name, price, store_id): (i64, String, f64, i64),
) -> Result<Item, AppError> {
    let store = stores::find_ref(pool, store_id).await?;

    let tags = sqlx::query_as::<_, (i64, String)>(
        r#"
        SELECT tags.id, tags.name
        FROM tags
        JOIN items_tags ON items_tags.tag_id = tags.id
        WHERE items_tags.item_id = ?
        ORDER BY tags.id
        "#,
    )
    .bind(id)
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(TagRef::from)
    .collect();

    Ok(Item {
        id,
        name,
        price,
        store,
        tags,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_pool;

    async fn pool_with_store() -> (SqlitePool, i64) {
        let pool = test_pool().await;
        let store = stores::create(&pool, "Corner Shop").await.unwrap();
        (pool, store.id)
    }

    fn new_item(name: &str, price: f64, store_id: i64) -> NewItem {
        NewItem {
            name: name.to_string(),
            price,
            store_id,
        }
    }

    #[tokio::test]
    async fn test_create_item_nests_store() {
        let (pool, store_id) = pool_with_store().await;

        let item = create(&pool, new_item("Chair", 15.99, store_id)).await.unwrap();

        assert_eq!(item.name, "Chair");
        assert_eq!(item.store.id, store_id);
        assert_eq!(item.store.name, "Corner Shop");
        assert!(item.tags.is_empty());
    }

    #[tokio::test]
    async fn test_create_item_in_unknown_store() {
        let pool = test_pool().await;

        let err = create(&pool, new_item("Chair", 1.0, 42)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_upsert_updates_only_given_fields() {
        let (pool, store_id) = pool_with_store().await;
        let item = create(&pool, new_item("Chair", 15.99, store_id)).await.unwrap();

        let changes = ItemChanges {
            price: Some(9.5),
            ..Default::default()
        };
        let (updated, outcome) = upsert(&pool, item.id, changes).await.unwrap();

        assert_eq!(outcome, Upsert::Updated);
        assert_eq!(updated.name, "Chair");
        assert_eq!(updated.price, 9.5);
    }

    #[tokio::test]
    async fn test_upsert_creates_under_path_id() {
        let (pool, store_id) = pool_with_store().await;

        let changes = ItemChanges {
            name: Some("Table".to_string()),
            price: Some(40.0),
            store_id: Some(store_id),
        };
        let (created, outcome) = upsert(&pool, 77, changes).await.unwrap();

        assert_eq!(outcome, Upsert::Created);
        assert_eq!(created.id, 77);
    }

    #[tokio::test]
    async fn test_upsert_create_requires_every_field() {
        let pool = test_pool().await;

        let changes = ItemChanges {
            name: Some("Table".to_string()),
            ..Default::default()
        };
        let err = upsert(&pool, 77, changes).await.unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_deleting_store_removes_its_items() {
        let (pool, store_id) = pool_with_store().await;
        let item = create(&pool, new_item("Chair", 15.99, store_id)).await.unwrap();

        stores::delete(&pool, store_id).await.unwrap();

        assert!(matches!(get(&pool, item.id).await, Err(AppError::NotFound(_))));
    }
}
