/// Store Routes
///
/// Listing and reading stores is public; creating needs an access token and
/// deleting needs an admin one.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::catalog::{stores, tags};
use crate::error::AppError;
use crate::validators::{validate_store_name, validate_tag_name};

/// Body of `POST /store` and `POST /store/{id}/tag`
#[derive(Deserialize)]
pub struct NameRequest {
    pub name: Option<String>,
}

/// GET /store
pub async fn list_stores(pool: web::Data<SqlitePool>) -> Result<HttpResponse, AppError> {
    let stores = stores::list(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(stores))
}

/// POST /store
///
/// # Errors
/// - 400: Missing or invalid name
/// - 409: A store with that name already exists
pub async fn create_store(
    form: web::Json<NameRequest>,
    pool: web::Data<SqlitePool>,
) -> Result<HttpResponse, AppError> {
    let name = validate_store_name(form.name.as_deref())?;
    let store = stores::create(pool.get_ref(), &name).await?;

    tracing::info!(store_id = store.id, "Store created");

    Ok(HttpResponse::Created().json(store))
}

/// GET /store/{id}
pub async fn get_store(
    path: web::Path<i64>,
    pool: web::Data<SqlitePool>,
) -> Result<HttpResponse, AppError> {
    let store = stores::get(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(store))
}

/// DELETE /store/{id}
///
/// Takes the store's items and tags with it.
pub async fn delete_store(
    path: web::Path<i64>,
    pool: web::Data<SqlitePool>,
) -> Result<HttpResponse, AppError> {
    let store_id = path.into_inner();
    stores::delete(pool.get_ref(), store_id).await?;

    tracing::info!(store_id = store_id, "Store deleted");

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Store deleted" })))
}

/// GET /store/{id}/tag
pub async fn list_store_tags(
    path: web::Path<i64>,
    pool: web::Data<SqlitePool>,
) -> Result<HttpResponse, AppError> {
    let tags = tags::list_for_store(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(tags))
}

/// POST /store/{id}/tag
///
/// # Errors
/// - 404: Unknown store
/// - 409: The store already has a tag with that name
pub async fn create_store_tag(
    path: web::Path<i64>,
    form: web::Json<NameRequest>,
    pool: web::Data<SqlitePool>,
) -> Result<HttpResponse, AppError> {
    let name = validate_tag_name(form.name.as_deref())?;
    let tag = tags::create(pool.get_ref(), path.into_inner(), &name).await?;

    tracing::info!(tag_id = tag.id, store_id = tag.store.id, "Tag created");

    Ok(HttpResponse::Created().json(tag))
}
