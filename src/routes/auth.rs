/// Authentication Routes
///
/// Registration, password login, refresh-token rotation and logout.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::{Account, Claims, CredentialVerifier, RevocationLedger, TokenIssuer};
use crate::error::{AppError, AuthError, ErrorContext};
use crate::validators::{validate_login, validate_registration};

/// Body of `/register` and `/login`
#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Token pair handed out by login and refresh
#[derive(Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl AuthResponse {
    fn issue(issuer: &TokenIssuer, account: &Account, fresh: bool) -> Result<Self, AppError> {
        Ok(Self {
            access_token: issuer.issue_access(account, fresh)?,
            refresh_token: issuer.issue_refresh(account)?,
            token_type: "Bearer".to_string(),
            expires_in: issuer.access_token_expiry(),
        })
    }
}

/// POST /register
///
/// # Errors
/// - 400: Missing or malformed username/password
/// - 409: Username already taken
pub async fn register(
    form: web::Json<CredentialsRequest>,
    verifier: web::Data<CredentialVerifier>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_registration");

    let credentials =
        validate_registration(form.username.as_deref(), form.password.as_deref())?;
    let account = verifier.register(credentials).await?;

    tracing::info!(
        request_id = %context.request_id,
        operation = %context.operation,
        user_id = account.id,
        is_admin = account.is_admin,
        "User registered"
    );

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "User created successfully."
    })))
}

/// POST /login
///
/// Returns a fresh access token and a refresh token.
///
/// # Errors
/// - 400: Missing username or password
/// - 401: `invalid_credentials`, whether the username is unknown or the password wrong
pub async fn login(
    form: web::Json<CredentialsRequest>,
    verifier: web::Data<CredentialVerifier>,
    issuer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_login");

    let credentials = validate_login(form.username.as_deref(), form.password.as_deref())?;
    let account = verifier.verify(credentials).await?;

    let response = AuthResponse::issue(issuer.get_ref(), &account, true)?;

    tracing::info!(
        request_id = %context.request_id,
        operation = %context.operation,
        user_id = account.id,
        "User logged in"
    );

    Ok(HttpResponse::Ok().json(response))
}

/// POST /refresh
///
/// Consumes the presented refresh token and hands out a non-fresh access
/// token plus a new refresh token. A refresh token works once: the second
/// use, even when racing the first, gets `token_revoked`.
pub async fn refresh(
    claims: web::ReqData<Claims>,
    verifier: web::Data<CredentialVerifier>,
    issuer: web::Data<TokenIssuer>,
    ledger: web::Data<RevocationLedger>,
) -> Result<HttpResponse, AppError> {
    let user_id = claims.user_id()?;
    let context = ErrorContext::new("token_refresh").with_user_id(user_id.to_string());

    // Admin status is read again so the new tokens carry the current role
    let account = verifier
        .store()
        .find_by_id(user_id)
        .await?
        .ok_or(AuthError::TokenMalformed)?;

    let response = AuthResponse::issue(issuer.get_ref(), &account, false)?;

    // Consumed last, so a failure above leaves the refresh token usable
    if !ledger.revoke(&claims.jti).await? {
        tracing::warn!(
            request_id = %context.request_id,
            operation = %context.operation,
            user_id = user_id,
            "Refresh token reused"
        );
        return Err(AuthError::TokenRevoked.into());
    }

    tracing::info!(
        request_id = %context.request_id,
        operation = %context.operation,
        user_id = user_id,
        "Token refreshed"
    );

    Ok(HttpResponse::Ok().json(response))
}

/// POST /logout
///
/// Revokes the access token used for this request.
pub async fn logout(
    claims: web::ReqData<Claims>,
    ledger: web::Data<RevocationLedger>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_logout").with_user_id(claims.sub.clone());

    ledger.revoke(&claims.jti).await?;

    tracing::info!(
        request_id = %context.request_id,
        operation = %context.operation,
        user_id = %claims.sub,
        "User logged out"
    );

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Successfully logged out"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;
    use actix_web::{FromRequest, HttpMessage, HttpRequest};

    use crate::auth::{CredentialStore, TokenKind};
    use crate::configuration::JwtSettings;
    use crate::database::test_pool;
    use crate::validators::Credentials;

    struct Handles {
        verifier: CredentialVerifier,
        issuer: TokenIssuer,
        ledger: RevocationLedger,
    }

    async fn handles() -> Handles {
        let pool = test_pool().await;
        Handles {
            verifier: CredentialVerifier::new(CredentialStore::new(pool.clone()), 4).unwrap(),
            issuer: TokenIssuer::new(JwtSettings {
                secret: "test-secret-key-at-least-32-characters-long".to_string(),
                access_token_expiry: 300,
                refresh_token_expiry: 3600,
                issuer: "test".to_string(),
            }),
            ledger: RevocationLedger::new(pool),
        }
    }

    fn refresh_claims(issuer: &TokenIssuer, account: &Account) -> Claims {
        let token = issuer.issue_refresh(account).unwrap();
        let claims = issuer.decode(&token).unwrap();
        assert_eq!(claims.kind, TokenKind::Refresh);
        claims
    }

    async fn call_refresh(h: &Handles, claims: &Claims) -> Result<HttpResponse, AppError> {
        let req: HttpRequest = TestRequest::default().to_http_request();
        req.extensions_mut().insert(claims.clone());
        let claims = web::ReqData::<Claims>::extract(&req).await.unwrap();

        refresh(
            claims,
            web::Data::new(h.verifier.clone()),
            web::Data::new(h.issuer.clone()),
            web::Data::new(h.ledger.clone()),
        )
        .await
    }

    #[tokio::test]
    async fn test_refresh_consumes_the_token() {
        let h = handles().await;
        let account = h
            .verifier
            .register(Credentials {
                username: "alice".to_string(),
                password: "pw123".to_string(),
            })
            .await
            .unwrap();
        let claims = refresh_claims(&h.issuer, &account);

        assert!(call_refresh(&h, &claims).await.is_ok());
        assert!(h.ledger.is_revoked(&claims.jti).await.unwrap());

        let reuse = call_refresh(&h, &claims).await;
        assert!(matches!(reuse, Err(AppError::Auth(AuthError::TokenRevoked))));
    }

    #[tokio::test]
    async fn test_failed_refresh_leaves_the_token_unconsumed() {
        let h = handles().await;
        let missing = Account {
            id: 99,
            username: "ghost".to_string(),
            is_admin: false,
        };
        let claims = refresh_claims(&h.issuer, &missing);

        let result = call_refresh(&h, &claims).await;

        assert!(matches!(result, Err(AppError::Auth(AuthError::TokenMalformed))));
        assert!(!h.ledger.is_revoked(&claims.jti).await.unwrap());
    }
}
