/// Item Routes
///
/// Every item route needs an access token. Creating through `POST /item`
/// additionally needs a fresh one, deleting needs an admin one.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::catalog::items::{self, Upsert};
use crate::error::AppError;
use crate::validators::{validate_item_changes, validate_new_item};

/// Body of `POST /item` and `PUT /item/{id}`
#[derive(Deserialize)]
pub struct ItemRequest {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub store_id: Option<i64>,
}

/// GET /item
pub async fn list_items(pool: web::Data<SqlitePool>) -> Result<HttpResponse, AppError> {
    let items = items::list(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(items))
}

/// POST /item
///
/// # Errors
/// - 400: Missing or invalid name, price or store_id
/// - 404: Unknown store
pub async fn create_item(
    form: web::Json<ItemRequest>,
    pool: web::Data<SqlitePool>,
) -> Result<HttpResponse, AppError> {
    let new_item = validate_new_item(form.name.as_deref(), form.price, form.store_id)?;
    let item = items::create(pool.get_ref(), new_item).await?;

    tracing::info!(item_id = item.id, store_id = item.store.id, "Item created");

    Ok(HttpResponse::Created().json(item))
}

/// GET /item/{id}
pub async fn get_item(
    path: web::Path<i64>,
    pool: web::Data<SqlitePool>,
) -> Result<HttpResponse, AppError> {
    let item = items::get(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(item))
}

/// PUT /item/{id}
///
/// Updates the given fields of an existing item, or creates the item under
/// this id when there is none (then `name`, `price` and `store_id` are all
/// required).
pub async fn update_item(
    path: web::Path<i64>,
    form: web::Json<ItemRequest>,
    pool: web::Data<SqlitePool>,
) -> Result<HttpResponse, AppError> {
    let item_id = path.into_inner();
    let changes = validate_item_changes(form.name.as_deref(), form.price, form.store_id)?;

    let (item, outcome) = items::upsert(pool.get_ref(), item_id, changes).await?;

    match outcome {
        Upsert::Updated => tracing::info!(item_id = item_id, "Item updated"),
        Upsert::Created => tracing::info!(item_id = item_id, "Item created by PUT"),
    }

    Ok(HttpResponse::Ok().json(item))
}

/// DELETE /item/{id}
pub async fn delete_item(
    path: web::Path<i64>,
    pool: web::Data<SqlitePool>,
) -> Result<HttpResponse, AppError> {
    let item_id = path.into_inner();
    items::delete(pool.get_ref(), item_id).await?;

    tracing::info!(item_id = item_id, "Item deleted");

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Item deleted" })))
}
