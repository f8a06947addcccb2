//! Error taxonomy shared by the gateway, orchestrator, and console.

use std::path::PathBuf;

use thiserror::Error;

/// Anything that went wrong talking to the remote cluster.
///
/// The orchestrator never lets these escape; they become
/// [`Outcome::Failure`](crate::outcome::Outcome::Failure) at the action boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Connection, TLS, or I/O failure before a response arrived.
    #[error("transport error: {0}")]
    Transport(String),

    /// The cluster refused the credentials.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The cluster answered but rejected the request. Rendered verbatim.
    #[error("{0}")]
    Rejected(String),

    /// The response did not have the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),
}

/// Configuration could not be located, read, parsed, or written.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot determine home directory (HOME is not set)")]
    NoHome,

    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to write config {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Rejected DNS input, caught before any remote call.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DnsError {
    #[error("Primary DNS is required.")]
    MissingPrimary,
}
