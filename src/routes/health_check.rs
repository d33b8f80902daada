use actix_web::{web, HttpResponse};
use sqlx::SqlitePool;

use crate::error::{AppError, DatabaseError};

/// GET /health_check
///
/// 200 with an empty body while the database answers, 503 otherwise.
pub async fn health_check(pool: web::Data<SqlitePool>) -> Result<HttpResponse, AppError> {
    sqlx::query("SELECT 1")
        .execute(pool.get_ref())
        .await
        .map_err(|e| AppError::Database(DatabaseError::Unavailable(e.to_string())))?;

    tracing::debug!("Health check passed");
    Ok(HttpResponse::Ok().finish())
}
