use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::auth::{Claims, CredentialVerifier};
use crate::error::{AppError, ErrorContext};

#[derive(Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
}

/// GET /user/{id}
pub async fn get_user(
    path: web::Path<i64>,
    verifier: web::Data<CredentialVerifier>,
) -> Result<HttpResponse, AppError> {
    let account = verifier
        .store()
        .find_by_id(path.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;

    Ok(HttpResponse::Ok().json(UserResponse {
        id: account.id,
        username: account.username,
    }))
}

/// DELETE /user/{id}
///
/// Admin only, and only with a fresh token. Tokens already issued to the
/// deleted account stop working at their next refresh.
pub async fn delete_user(
    path: web::Path<i64>,
    claims: web::ReqData<Claims>,
    verifier: web::Data<CredentialVerifier>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    let context = ErrorContext::new("user_deletion").with_user_id(claims.sub.clone());

    if !verifier.store().delete(user_id).await? {
        return Err(AppError::NotFound("User not found.".to_string()));
    }

    tracing::info!(
        request_id = %context.request_id,
        operation = %context.operation,
        admin_id = ?context.user_id,
        deleted_user_id = user_id,
        "User deleted"
    );

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "User deleted." })))
}
