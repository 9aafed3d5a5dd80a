//! Runtime configuration for round operations.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Runtime configuration shared by the service, gateway and coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Administrative switch for round creation (default: true)
    pub creation_enabled: bool,
    /// Upper bound on one engine call, including key loading (default: 30s)
    pub prover_timeout: Duration,
    /// How long to poll for a ledger confirmation before re-querying once (default: 60s)
    pub ledger_confirm_timeout: Duration,
    pub ledger_poll_interval: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            creation_enabled: true,
            prover_timeout: Duration::from_millis(30_000),
            ledger_confirm_timeout: Duration::from_millis(60_000),
            ledger_poll_interval: Duration::from_millis(500),
        }
    }
}

impl RuntimeConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `CREATION_ENABLED` - Accept new rounds (default: true)
    /// - `PROVER_TIMEOUT_MS` - Engine call timeout (default: 30000)
    /// - `LEDGER_CONFIRM_TIMEOUT_MS` - Confirmation wait (default: 60000)
    /// - `LEDGER_POLL_INTERVAL_MS` - Confirmation poll interval (default: 500)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(enabled) = read_env::<bool>("CREATION_ENABLED") {
            config.creation_enabled = enabled;
        }

        if let Some(ms) = read_env::<u64>("PROVER_TIMEOUT_MS") {
            config.prover_timeout = Duration::from_millis(ms);
        }

        if let Some(ms) = read_env::<u64>("LEDGER_CONFIRM_TIMEOUT_MS") {
            config.ledger_confirm_timeout = Duration::from_millis(ms);
        }

        if let Some(ms) = read_env::<u64>("LEDGER_POLL_INTERVAL_MS") {
            config.ledger_poll_interval = Duration::from_millis(ms.max(1));
        }

        config
    }

    pub const fn with_creation_enabled(mut self, enabled: bool) -> Self {
        self.creation_enabled = enabled;
        self
    }

    pub const fn with_prover_timeout(mut self, timeout: Duration) -> Self {
        self.prover_timeout = timeout;
        self
    }

    pub const fn with_ledger_timing(mut self, confirm_timeout: Duration, poll: Duration) -> Self {
        self.ledger_confirm_timeout = confirm_timeout;
        self.ledger_poll_interval = poll;
        self
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: FromStr,
{
    env::var(key).ok()?.parse().ok()
}
