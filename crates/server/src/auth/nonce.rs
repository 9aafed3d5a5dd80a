//! One-time nonces for signed wallet messages.
//!
//! `GET /auth/nonce` hands out a fresh nonce. A signed message must end with
//! `:<nonce>`; the resolver consumes the nonce after checking the signature,
//! so a captured signature cannot be replayed.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Nonces stay redeemable for this long after issue.
pub const NONCE_TTL: Duration = Duration::from_secs(300);

/// Process-local nonce table.
#[derive(Debug)]
pub struct NonceRegistry {
    ttl: Duration,
    issued: Mutex<HashMap<String, Instant>>,
}

impl Default for NonceRegistry {
    fn default() -> Self {
        Self::new(NONCE_TTL)
    }
}

impl NonceRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            issued: Mutex::new(HashMap::new()),
        }
    }

    /// Issue a new nonce, dropping any that have expired.
    pub fn issue(&self) -> String {
        let nonce = hex::encode(rand::random::<[u8; 16]>());
        let now = Instant::now();
        let mut issued = self
            .issued
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        issued.retain(|_, at| now.duration_since(*at) < self.ttl);
        issued.insert(nonce.clone(), now);
        nonce
    }

    /// Redeem `nonce`. Succeeds at most once per issued nonce, and only
    /// within its lifetime.
    pub fn consume(&self, nonce: &str) -> bool {
        self.issued
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(nonce)
            .is_some_and(|at| at.elapsed() < self.ttl)
    }
}

/// The nonce a signed message commits to: the text after its last `:`.
pub fn nonce_of(message: &str) -> Option<&str> {
    message
        .rsplit_once(':')
        .map(|(_, nonce)| nonce)
        .filter(|nonce| !nonce.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonce_is_redeemable_once() {
        let registry = NonceRegistry::default();
        let nonce = registry.issue();
        assert_eq!(nonce.len(), 32);
        assert!(registry.consume(&nonce));
        assert!(!registry.consume(&nonce));
        assert!(!registry.consume("never-issued"));
    }

    #[test]
    fn expired_nonce_is_refused() {
        let registry = NonceRegistry::new(Duration::ZERO);
        let nonce = registry.issue();
        assert!(!registry.consume(&nonce));
    }

    #[test]
    fn nonce_is_the_last_segment() {
        assert_eq!(nonce_of("the-word:whisper:3:abc123"), Some("abc123"));
        assert_eq!(nonce_of("the-word:whisper:"), None);
        assert_eq!(nonce_of("no separator"), None);
    }
}
