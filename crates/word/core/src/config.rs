//! Protocol configuration shared by the runtime and the HTTP surface.
//!
//! Earlier deployments differed in three independent ways: whether the
//! commitment binds a username, whether rounds are mirrored on a ledger, and
//! how callers are identified. One [`ProtocolConfig`] selects among them.
use core::fmt;
use core::str::FromStr;
use std::env;

/// How the caller of a round operation is identified.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum IdentityScheme {
    /// `address` + `signature` + `message` in the request body (EIP-191).
    #[default]
    WalletSignature,
    /// Identity established by an external login flow, carried in a cookie.
    Session,
}

impl IdentityScheme {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::WalletSignature => "wallet-signature",
            Self::Session => "session",
        }
    }
}

impl fmt::Display for IdentityScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdentityScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wallet-signature" | "wallet" | "signature" => Ok(Self::WalletSignature),
            "session" | "cookie" => Ok(Self::Session),
            other => Err(format!(
                "invalid identity scheme: {other}. Must be wallet-signature or session"
            )),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProtocolConfig {
    /// Commitments and proofs include the encoded username as a public signal.
    pub username_binding: bool,
    /// Round creation, shouts and prizes go through the ledger first.
    pub ledger_mirroring: bool,
    pub identity_scheme: IdentityScheme,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            username_binding: true,
            ledger_mirroring: false,
            identity_scheme: IdentityScheme::WalletSignature,
        }
    }
}

impl ProtocolConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `USERNAME_BINDING` - Bind usernames into commitments (default: true)
    /// - `LEDGER_MIRRORING` - Mirror rounds on the ledger (default: false)
    /// - `IDENTITY_SCHEME` - `wallet-signature` or `session` (default: wallet-signature)
    pub fn from_env() -> Result<Self, String> {
        let mut config = Self::default();

        if let Some(binding) = read_env::<bool>("USERNAME_BINDING") {
            config.username_binding = binding;
        }

        if let Some(mirroring) = read_env::<bool>("LEDGER_MIRRORING") {
            config.ledger_mirroring = mirroring;
        }

        if let Ok(scheme) = env::var("IDENTITY_SCHEME") {
            config.identity_scheme = scheme.parse()?;
        }

        Ok(config)
    }

    pub const fn with_username_binding(mut self, enabled: bool) -> Self {
        self.username_binding = enabled;
        self
    }

    pub const fn with_ledger_mirroring(mut self, enabled: bool) -> Self {
        self.ledger_mirroring = enabled;
        self
    }

    pub const fn with_identity_scheme(mut self, scheme: IdentityScheme) -> Self {
        self.identity_scheme = scheme;
        self
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: FromStr,
{
    env::var(key).ok()?.parse().ok()
}
