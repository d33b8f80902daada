/// JWT Claims structure
///
/// Represents the payload of access and refresh tokens: the standard JWT
/// claims (RFC 7519) plus the token kind, the freshness flag and the
/// authorization claims stamped on at issuance.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::credentials::Account;
use crate::error::{AppError, AuthError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Authorization facts embedded into every token when it is issued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorizationClaims {
    pub is_admin: bool,
}

impl AuthorizationClaims {
    /// Derive claims from the account's stored role.
    ///
    /// Tokens already in circulation keep the value they were issued with
    /// until they expire or are revoked.
    pub fn for_account(account: &Account) -> Self {
        Self {
            is_admin: account.is_admin,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    /// Unique token identifier, the revocation key
    pub jti: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    pub iss: String,
    #[serde(rename = "type")]
    pub kind: TokenKind,
    /// Set only on access tokens minted by a password login
    pub fresh: bool,
    pub is_admin: bool,
}

impl Claims {
    pub fn new(
        user_id: i64,
        kind: TokenKind,
        fresh: bool,
        authorization: AuthorizationClaims,
        expiry_seconds: i64,
        issuer: String,
    ) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: user_id.to_string(),
            jti: Uuid::new_v4().to_string(),
            exp: now + expiry_seconds,
            iat: now,
            iss: issuer,
            kind,
            fresh,
            is_admin: authorization.is_admin,
        }
    }

    /// Extract user ID from claims
    ///
    /// # Errors
    /// A subject that is not an integer means the token was not minted here
    pub fn user_id(&self) -> Result<i64, AppError> {
        self.sub
            .parse::<i64>()
            .map_err(|_| AppError::Auth(AuthError::TokenMalformed))
    }
}
