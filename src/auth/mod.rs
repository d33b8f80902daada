/// Authentication module
///
/// Credential verification, token issuance, the revocation ledger and the
/// request gate that ties them together for protected routes.

mod claims;
mod credentials;
mod gate;
mod jwt;
mod password;
mod revocation;

pub use claims::{AuthorizationClaims, Claims, TokenKind};
pub use credentials::{Account, CredentialStore, CredentialVerifier};
pub use gate::{bearer_token, RequestGate, TokenPolicy};
pub use jwt::TokenIssuer;
pub use password::{hash_password, verify_password};
pub use revocation::RevocationLedger;
