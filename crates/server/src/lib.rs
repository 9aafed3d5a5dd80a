//! HTTP surface of The Word.
//!
//! The server is a thin translation layer: it resolves the caller's identity,
//! turns JSON bodies into runtime requests and maps [`runtime::RoundError`]
//! onto status codes. All round semantics live in [`runtime::RoundService`].
//!
//! - [`routes`] holds the route table and handlers
//! - [`api`] defines the wire bodies, shared with the CLI
//! - [`auth`] implements the wallet-signature and session identity schemes
//! - [`error`] maps failures to `{error, message}` bodies
//! - [`config`] and [`bootstrap`] assemble the service from the environment
pub mod api;
pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod routes;

pub use bootstrap::build_state;
pub use config::ServerConfig;
pub use error::ApiError;
pub use routes::{AppState, router};
