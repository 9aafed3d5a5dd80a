//! Session-cookie identities.
//!
//! Sessions are created by an external login flow; the server only resolves
//! the `the-word-session` cookie through a [`SessionStore`].

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use axum::http::HeaderMap;
use axum::http::header::COOKIE;
use word_core::{Identity, IdentityScheme};

use super::{AuthError, IdentityClaim, IdentityResolver};

pub const SESSION_COOKIE: &str = "the-word-session";

pub trait SessionStore: Send + Sync {
    fn lookup(&self, token: &str) -> Option<Identity>;
}

/// Process-local session table.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Identity>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session for `identity` and return its token.
    pub fn issue(&self, identity: Identity) -> String {
        let token = hex::encode(rand::random::<[u8; 32]>());
        self.sessions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(token.clone(), identity);
        token
    }

    pub fn revoke(&self, token: &str) -> bool {
        self.sessions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(token)
            .is_some()
    }
}

impl SessionStore for InMemorySessionStore {
    fn lookup(&self, token: &str) -> Option<Identity> {
        self.sessions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(token)
            .cloned()
    }
}

pub struct SessionResolver {
    store: Arc<dyn SessionStore>,
}

impl SessionResolver {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }
}

impl IdentityResolver for SessionResolver {
    fn scheme(&self) -> IdentityScheme {
        IdentityScheme::Session
    }

    fn resolve(&self, headers: &HeaderMap, _claim: IdentityClaim<'_>) -> Result<Identity, AuthError> {
        let token = session_token(headers).ok_or(AuthError::Missing(SESSION_COOKIE))?;
        self.store.lookup(token).ok_or(AuthError::UnknownSession)
    }

    fn has_credentials(&self, headers: &HeaderMap, _claim: IdentityClaim<'_>) -> bool {
        session_token(headers).is_some()
    }
}

fn session_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .find_map(|cookie| {
            cookie
                .trim()
                .strip_prefix(SESSION_COOKIE)
                .and_then(|rest| rest.strip_prefix('='))
        })
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn with_cookie(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn resolves_issued_sessions() {
        let store = Arc::new(InMemorySessionStore::new());
        let token = store.issue(Identity::new("alice"));
        let resolver = SessionResolver::new(store.clone());

        let headers = with_cookie(&format!("theme=dark; {SESSION_COOKIE}={token}"));
        assert_eq!(
            resolver.resolve(&headers, IdentityClaim::default()).unwrap(),
            Identity::new("alice")
        );

        assert!(store.revoke(&token));
        assert_eq!(
            resolver.resolve(&headers, IdentityClaim::default()),
            Err(AuthError::UnknownSession)
        );
    }

    #[test]
    fn missing_cookie_is_rejected() {
        let resolver = SessionResolver::new(Arc::new(InMemorySessionStore::new()));
        let headers = with_cookie("the-word-sessionx=abc");
        assert!(!resolver.has_credentials(&headers, IdentityClaim::default()));
        assert_eq!(
            resolver.resolve(&headers, IdentityClaim::default()),
            Err(AuthError::Missing(SESSION_COOKIE))
        );
    }
}
