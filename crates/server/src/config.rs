//! Server configuration.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use runtime::RuntimeConfig;
use word_core::ProtocolConfig;
use zk::ProofBackend;

/// Everything the server binary needs to assemble the service.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// JSON round store; rounds are kept in memory when unset.
    pub data_path: Option<PathBuf>,
    /// Groth16 keys file, required by the `groth16` backend.
    pub keys_path: Option<PathBuf>,
    pub backend: ProofBackend,
    /// Directory for daily log files; stderr only when unset.
    pub log_dir: Option<PathBuf>,
    pub protocol: ProtocolConfig,
    pub runtime: RuntimeConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            data_path: None,
            keys_path: None,
            backend: ProofBackend::Groth16,
            log_dir: None,
            protocol: ProtocolConfig::default(),
            runtime: RuntimeConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `PORT` - Listen port (default: 3000)
    /// - `THE_WORD_DATA` - Path of the JSON round store
    /// - `THE_WORD_KEYS` - Path of the Groth16 keys file
    /// - `PROOF_BACKEND` - `groth16` or `stub` (default: groth16)
    /// - `THE_WORD_LOG_DIR` - Directory for daily log files
    ///
    /// Protocol and runtime switches are read by [`ProtocolConfig::from_env`]
    /// and [`RuntimeConfig::from_env`].
    pub fn from_env() -> Result<Self, String> {
        let mut config = Self::default();

        if let Some(port) = read_env::<u16>("PORT") {
            config.port = port;
        }

        config.data_path = env::var_os("THE_WORD_DATA").map(PathBuf::from);
        config.keys_path = env::var_os("THE_WORD_KEYS").map(PathBuf::from);
        config.log_dir = env::var_os("THE_WORD_LOG_DIR").map(PathBuf::from);

        if let Ok(backend) = env::var("PROOF_BACKEND") {
            config.backend = backend.parse()?;
        }

        config.protocol = ProtocolConfig::from_env()?;
        config.runtime = RuntimeConfig::from_env();

        Ok(config)
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: FromStr,
{
    env::var(key).ok()?.parse().ok()
}
