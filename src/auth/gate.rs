/// Request Gate
///
/// The ordered checks every protected request goes through before its
/// handler runs. Each stage is a separate function so it can be exercised on
/// its own; [`RequestGate::authorize`] runs them in order and stops at the
/// first rejection:
///
/// 1. bearer token present            → `authorization_required`
/// 2. signature, issuer, expiry, kind → `invalid_token` / `token_expired`
/// 3. jti not in the ledger           → `token_revoked`
/// 4. freshness, if required          → `fresh_token_required`
/// 5. admin claim, if required        → `admin_required`

use crate::auth::claims::{Claims, TokenKind};
use crate::auth::jwt::TokenIssuer;
use crate::auth::revocation::RevocationLedger;
use crate::error::{AppError, AuthError};

/// What a route demands of the presented token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenPolicy {
    pub kind: TokenKind,
    pub fresh: bool,
    pub admin: bool,
}

impl TokenPolicy {
    /// Any valid, unrevoked access token
    pub const fn access() -> Self {
        Self {
            kind: TokenKind::Access,
            fresh: false,
            admin: false,
        }
    }

    pub const fn refresh() -> Self {
        Self {
            kind: TokenKind::Refresh,
            fresh: false,
            admin: false,
        }
    }

    pub const fn fresh(self) -> Self {
        Self {
            fresh: true,
            ..self
        }
    }

    pub const fn admin(self) -> Self {
        Self {
            admin: true,
            ..self
        }
    }
}

/// Pull the token out of an `Authorization: Bearer <token>` header value.
pub fn bearer_token(authorization: Option<&str>) -> Result<&str, AuthError> {
    let (scheme, token) = authorization
        .and_then(|value| value.trim().split_once(' '))
        .ok_or(AuthError::MissingToken)?;

    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(token)
}

/// Refresh tokens only open `/refresh`, access tokens everything else.
pub fn require_kind(claims: &Claims, policy: TokenPolicy) -> Result<(), AuthError> {
    if claims.kind != policy.kind {
        return Err(AuthError::TokenMalformed);
    }
    Ok(())
}

pub fn require_freshness(claims: &Claims, policy: TokenPolicy) -> Result<(), AuthError> {
    if policy.fresh && !claims.fresh {
        return Err(AuthError::TokenNotFresh);
    }
    Ok(())
}

pub fn require_admin(claims: &Claims, policy: TokenPolicy) -> Result<(), AuthError> {
    if policy.admin && !claims.is_admin {
        return Err(AuthError::ClaimInsufficient);
    }
    Ok(())
}

#[derive(Clone)]
pub struct RequestGate {
    issuer: TokenIssuer,
    ledger: RevocationLedger,
}

impl RequestGate {
    pub fn new(issuer: TokenIssuer, ledger: RevocationLedger) -> Self {
        Self { issuer, ledger }
    }

    /// Run every stage against the raw `Authorization` header value.
    pub async fn authorize(
        &self,
        authorization: Option<&str>,
        policy: TokenPolicy,
    ) -> Result<Claims, AppError> {
        let token = bearer_token(authorization)?;

        let claims = self.issuer.decode(token)?;
        require_kind(&claims, policy)?;

        if self.ledger.is_revoked(&claims.jti).await? {
            return Err(AuthError::TokenRevoked.into());
        }

        require_freshness(&claims, policy)?;
        require_admin(&claims, policy)?;

        Ok(claims)
    }
}
