//! Error types for the sync engine
//!
//! Covers:
//! - Session lifecycle violations
//! - Authentication bootstrap failures
//! - Gated mutations (not authenticated, invalid form, store failure)
//! - Best-effort seeding gaps
//! - Configuration loading

use shopsmart_store::StoreError;
use std::path::PathBuf;

/// Main sync error type
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Session lifecycle violation
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// Authentication failed
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Mutation refused or failed
    #[error("mutation failed: {0}")]
    Gateway(#[from] GatewayError),

    /// Store failure outside a mutation
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Session lifecycle violations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// Readiness is set exactly once per process
    #[error("session is already ready")]
    AlreadyReady,

    /// Identity changes require a ready session
    #[error("session is not ready")]
    NotReady,

    /// Identity may be reassigned at most once
    #[error("session identity was already reassigned")]
    IdentityAlreadyReassigned,
}

/// Authentication provider failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Bootstrap token was rejected
    #[error("token rejected: {0}")]
    TokenRejected(String),

    /// Provider could not be reached
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    /// Anonymous sign-in is turned off
    #[error("anonymous sign-in disabled")]
    AnonymousDisabled,
}

/// Mutation gateway failures
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Session not ready or identity absent; the store was not called
    #[error("Database not ready or user not authenticated.")]
    NotAuthenticated,

    /// Form attributes failed local validation; the store was not called
    #[error("{0}")]
    Invalid(String),

    /// The store rejected or failed the operation
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl GatewayError {
    /// Check if the store was never contacted
    #[inline]
    #[must_use]
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::NotAuthenticated | Self::Invalid(_))
    }
}

/// Seeding gaps (logged, never surfaced)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeedError {
    /// Some default entries failed to insert
    #[error("seeding partially failed: {failed} of {total} default entries not inserted")]
    PartialFailure {
        /// Entries that failed
        failed: usize,
        /// Size of the default dataset
        total: usize,
    },
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read {path}: {source}")]
    Read {
        /// Config file path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// File is not valid TOML for the config schema
    #[error("failed to parse {path}: {source}")]
    Parse {
        /// Config file path
        path: PathBuf,
        /// Underlying parse error
        #[source]
        source: toml::de::Error,
    },

    /// Environment override has an invalid value
    #[error("invalid value for {key}: {value}")]
    InvalidEnv {
        /// Variable name
        key: &'static str,
        /// Offending value
        value: String,
    },
}
