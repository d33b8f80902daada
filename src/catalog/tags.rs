use sqlx::SqlitePool;

use crate::catalog::{items, stores, Item, ItemRef, Tag};
use crate::error::{is_unique_violation, AppError};

const TAG_NOT_FOUND: &str = "Tag not found.";

pub async fn list_for_store(pool: &SqlitePool, store_id: i64) -> Result<Vec<Tag>, AppError> {
    stores::find_ref(pool, store_id).await?;

    let ids = sqlx::query_scalar::<_, i64>("SELECT id FROM tags WHERE store_id = ? ORDER BY id")
        .bind(store_id)
        .fetch_all(pool)
        .await?;

    let mut tags = Vec::with_capacity(ids.len());
    for id in ids {
        tags.push(get(pool, id).await?);
    }
    Ok(tags)
}

/// # Errors
/// `NotFound` for an unknown store, `Conflict` if the store already has a tag
/// with that name
pub async fn create(pool: &SqlitePool, store_id: i64, name: &str) -> Result<Tag, AppError> {
    let store = stores::find_ref(pool, store_id).await?;

    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO tags (name, store_id) VALUES (?, ?) RETURNING id",
    )
    .bind(name)
    .bind(store_id)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict("A tag with that name already exists in that store.".to_string())
        } else {
            AppError::from(e)
        }
    })?;

    Ok(Tag {
        id,
        name: name.to_string(),
        store,
        items: Vec::new(),
    })
}

pub async fn get(pool: &SqlitePool, id: i64) -> Result<Tag, AppError> {
    let (id, name, store_id) =
        sqlx::query_as::<_, (i64, String, i64)>("SELECT id, name, store_id FROM tags WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(not_found)?;

    let store = stores::find_ref(pool, store_id).await?;

    let items = sqlx::query_as::<_, (i64, String, f64)>(
        r#"
        SELECT items.id, items.name, items.price
        FROM items
        JOIN items_tags ON items_tags.item_id = items.id
        WHERE items_tags.tag_id = ?
        ORDER BY items.id
        "#,
    )
    .bind(id)
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(ItemRef::from)
    .collect();

    Ok(Tag {
        id,
        name,
        store,
        items,
    })
}

/// Delete a tag that no item carries.
///
/// # Errors
/// `Conflict` while the tag is still linked to an item
pub async fn delete(pool: &SqlitePool, id: i64) -> Result<(), AppError> {
    let result = sqlx::query(
        r#"
        DELETE FROM tags
        WHERE id = ? AND NOT EXISTS (SELECT 1 FROM items_tags WHERE tag_id = ?)
        "#,
    )
    .bind(id)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 1 {
        return Ok(());
    }

    // Nothing deleted: either the tag is missing or it is still in use
    get(pool, id).await?;
    Err(AppError::Conflict(
        "Could not delete tag. Make sure tag is not associated with any items, then try again."
            .to_string(),
    ))
}

/// Attach a tag to an item. Linking twice is a no-op.
pub async fn link(pool: &SqlitePool, item_id: i64, tag_id: i64) -> Result<Tag, AppError> {
    items::find_ref(pool, item_id).await?;
    get(pool, tag_id).await?;

    sqlx::query(
        "INSERT INTO items_tags (item_id, tag_id) VALUES (?, ?) ON CONFLICT (item_id, tag_id) DO NOTHING",
    )
    .bind(item_id)
    .bind(tag_id)
    .execute(pool)
    .await?;

    get(pool, tag_id).await
}

/// Detach a tag from an item and return both as they are afterwards.
pub async fn unlink(pool: &SqlitePool, item_id: i64, tag_id: i64) -> Result<(Item, Tag), AppError> {
    items::find_ref(pool, item_id).await?;
    get(pool, tag_id).await?;

    let result = sqlx::query("DELETE FROM items_tags WHERE item_id = ? AND tag_id = ?")
        .bind(item_id)
        .bind(tag_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(
            "Tag is not linked to that item.".to_string(),
        ));
    }

    Ok((items::get(pool, item_id).await?, get(pool, tag_id).await?))
}

fn not_found() -> AppError {
    AppError::NotFound(TAG_NOT_FOUND.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_pool;
    use crate::validators::NewItem;

    struct Fixture {
        pool: SqlitePool,
        store_id: i64,
        item_id: i64,
    }

    async fn fixture() -> Fixture {
        let pool = test_pool().await;
        let store = stores::create(&pool, "Corner Shop").await.unwrap();
        let item = items::create(
            &pool,
            NewItem {
                name: "Chair".to_string(),
                price: 15.99,
                store_id: store.id,
            },
        )
        .await
        .unwrap();

        Fixture {
            pool,
            store_id: store.id,
            item_id: item.id,
        }
    }

    #[tokio::test]
    async fn test_tag_names_are_unique_per_store() {
        let f = fixture().await;
        let other = stores::create(&f.pool, "Other Shop").await.unwrap();

        create(&f.pool, f.store_id, "furniture").await.unwrap();
        create(&f.pool, other.id, "furniture").await.unwrap();

        let err = create(&f.pool, f.store_id, "furniture").await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_tag_in_unknown_store() {
        let pool = test_pool().await;

        let err = create(&pool, 5, "furniture").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(matches!(list_for_store(&pool, 5).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_link_is_idempotent_and_visible_from_both_sides() {
        let f = fixture().await;
        let tag = create(&f.pool, f.store_id, "furniture").await.unwrap();

        link(&f.pool, f.item_id, tag.id).await.unwrap();
        let linked = link(&f.pool, f.item_id, tag.id).await.unwrap();

        assert_eq!(linked.items.len(), 1);
        assert_eq!(linked.items[0].id, f.item_id);

        let item = items::get(&f.pool, f.item_id).await.unwrap();
        assert_eq!(item.tags.len(), 1);
        assert_eq!(item.tags[0].name, "furniture");
    }

    #[tokio::test]
    async fn test_unlink() {
        let f = fixture().await;
        let tag = create(&f.pool, f.store_id, "furniture").await.unwrap();
        link(&f.pool, f.item_id, tag.id).await.unwrap();

        let (item, tag) = unlink(&f.pool, f.item_id, tag.id).await.unwrap();
        assert!(item.tags.is_empty());
        assert!(tag.items.is_empty());

        let err = unlink(&f.pool, f.item_id, tag.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_linked_tag_cannot_be_deleted() {
        let f = fixture().await;
        let tag = create(&f.pool, f.store_id, "furniture").await.unwrap();
        link(&f.pool, f.item_id, tag.id).await.unwrap();

        assert!(matches!(delete(&f.pool, tag.id).await, Err(AppError::Conflict(_))));

        unlink(&f.pool, f.item_id, tag.id).await.unwrap();
        delete(&f.pool, tag.id).await.unwrap();
        assert!(matches!(get(&f.pool, tag.id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_unknown_tag() {
        let pool = test_pool().await;
        assert!(matches!(delete(&pool, 3).await, Err(AppError::NotFound(_))));
    }
}
