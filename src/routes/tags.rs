use actix_web::{web, HttpResponse};
use sqlx::SqlitePool;

use crate::catalog::tags;
use crate::error::AppError;

/// GET /tag/{id}
pub async fn get_tag(
    path: web::Path<i64>,
    pool: web::Data<SqlitePool>,
) -> Result<HttpResponse, AppError> {
    let tag = tags::get(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(tag))
}

/// DELETE /tag/{id}
///
/// # Errors
/// - 404: Unknown tag
/// - 409: The tag is still attached to at least one item
pub async fn delete_tag(
    path: web::Path<i64>,
    pool: web::Data<SqlitePool>,
) -> Result<HttpResponse, AppError> {
    let tag_id = path.into_inner();
    tags::delete(pool.get_ref(), tag_id).await?;

    tracing::info!(tag_id = tag_id, "Tag deleted");

    Ok(HttpResponse::Accepted().json(serde_json::json!({ "message": "Tag deleted." })))
}

/// POST /item/{item_id}/tag/{tag_id}
pub async fn link_tag(
    path: web::Path<(i64, i64)>,
    pool: web::Data<SqlitePool>,
) -> Result<HttpResponse, AppError> {
    let (item_id, tag_id) = path.into_inner();
    let tag = tags::link(pool.get_ref(), item_id, tag_id).await?;

    tracing::info!(item_id = item_id, tag_id = tag_id, "Tag linked to item");

    Ok(HttpResponse::Created().json(tag))
}

/// DELETE /item/{item_id}/tag/{tag_id}
pub async fn unlink_tag(
    path: web::Path<(i64, i64)>,
    pool: web::Data<SqlitePool>,
) -> Result<HttpResponse, AppError> {
    let (item_id, tag_id) = path.into_inner();
    let (item, tag) = tags::unlink(pool.get_ref(), item_id, tag_id).await?;

    tracing::info!(item_id = item_id, tag_id = tag_id, "Tag unlinked from item");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Item removed from tag",
        "item": item,
        "tag": tag,
    })))
}
