/// JWT Token Generation and Validation
///
/// [`TokenIssuer`] mints signed access and refresh tokens and decodes them
/// again. Issuing never touches storage; revocation is the ledger's job.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::auth::claims::{AuthorizationClaims, Claims, TokenKind};
use crate::auth::credentials::Account;
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};

#[derive(Clone)]
pub struct TokenIssuer {
    settings: JwtSettings,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenIssuer {
    pub fn new(settings: JwtSettings) -> Self {
        let encoding_key = EncodingKey::from_secret(settings.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(settings.secret.as_bytes());
        Self {
            settings,
            encoding_key,
            decoding_key,
        }
    }

    /// Access token lifetime in seconds, reported to clients as `expires_in`
    pub fn access_token_expiry(&self) -> i64 {
        self.settings.access_token_expiry
    }

    /// Mint a short-lived access token.
    ///
    /// `fresh` is true only right after a password login.
    pub fn issue_access(&self, account: &Account, fresh: bool) -> Result<String, AppError> {
        let claims = Claims::new(
            account.id,
            TokenKind::Access,
            fresh,
            AuthorizationClaims::for_account(account),
            self.settings.access_token_expiry,
            self.settings.issuer.clone(),
        );
        self.sign(&claims)
    }

    /// Mint a long-lived refresh token. Freshness does not apply to refresh tokens.
    pub fn issue_refresh(&self, account: &Account) -> Result<String, AppError> {
        let claims = Claims::new(
            account.id,
            TokenKind::Refresh,
            false,
            AuthorizationClaims::for_account(account),
            self.settings.refresh_token_expiry,
            self.settings.issuer.clone(),
        );
        self.sign(&claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
    }

    /// Verify signature, issuer and expiry, then return the claims.
    ///
    /// # Errors
    /// `TokenExpired` for a genuine token past its `exp`, `TokenMalformed` for
    /// everything else (bad signature, wrong issuer, garbage input).
    pub fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.settings.issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => {
                    tracing::debug!(error = %e, "JWT validation error");
                    AuthError::TokenMalformed
                }
            })
    }
}
