//! Caller identification.
//!
//! Exactly one [`IdentityScheme`] is active per deployment. Each scheme is an
//! [`IdentityResolver`] that turns the request's credentials into an
//! [`Identity`]; handlers never inspect credentials themselves.

pub mod nonce;
pub mod session;
pub mod wallet;

use std::sync::Arc;

use axum::http::HeaderMap;
use thiserror::Error;
use word_core::{Identity, IdentityScheme};

pub use nonce::{NONCE_TTL, NonceRegistry, nonce_of};
pub use session::{InMemorySessionStore, SESSION_COOKIE, SessionResolver, SessionStore};
pub use wallet::WalletSignatureResolver;

/// Credential fields carried in request bodies by the wallet scheme.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityClaim<'a> {
    pub address: Option<&'a str>,
    /// 65-byte `r‖s‖v` signature, hex encoded.
    pub signature: Option<&'a str>,
    pub message: Option<&'a str>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing credential: {0}")]
    Missing(&'static str),

    #[error("malformed signature: {0}")]
    MalformedSignature(String),

    #[error("found signature from {recovered}, expecting signature from {expected}")]
    WrongSigner { recovered: String, expected: String },

    #[error("unknown or expired session")]
    UnknownSession,

    #[error("signed message does not end with an unused nonce from /auth/nonce")]
    StaleNonce,

    #[error("invalid private key: {0}")]
    InvalidKey(String),
}

pub trait IdentityResolver: Send + Sync {
    fn scheme(&self) -> IdentityScheme;

    fn resolve(&self, headers: &HeaderMap, claim: IdentityClaim<'_>) -> Result<Identity, AuthError>;

    /// Whether the request carries any credential for this scheme at all.
    fn has_credentials(&self, headers: &HeaderMap, claim: IdentityClaim<'_>) -> bool;
}

/// Resolver for the configured scheme.
pub fn resolver_for(
    scheme: IdentityScheme,
    sessions: Arc<dyn SessionStore>,
    nonces: Arc<NonceRegistry>,
) -> Arc<dyn IdentityResolver> {
    match scheme {
        IdentityScheme::WalletSignature => Arc::new(WalletSignatureResolver::new(nonces)),
        IdentityScheme::Session => Arc::new(SessionResolver::new(sessions)),
    }
}
