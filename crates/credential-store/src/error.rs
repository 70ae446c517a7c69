//! Error types for credential-store operations

use thiserror::Error;

/// Credential-store errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Empty or otherwise unusable argument
    #[error("Invalid argument: {reason}")]
    InvalidArgument {
        /// What was wrong with the input
        reason: String,
    },

    /// A store with this host and name already exists
    #[error("Store '{name}' already exists on {host}")]
    StoreExists {
        /// Store host
        host: String,
        /// Store name
        name: String,
    },

    /// No store with this host and name
    #[error("Store '{name}' not found on {host}")]
    StoreNotFound {
        /// Store host
        host: String,
        /// Store name
        name: String,
    },

    /// An entry with this alias already exists in the store
    #[error("Entry '{alias}' already exists")]
    EntryExists {
        /// Entry alias
        alias: String,
    },

    /// No entry with this alias
    #[error("Entry '{alias}' not found")]
    EntryNotFound {
        /// Entry alias
        alias: String,
    },

    /// The entry exists but carries no material of the requested kind
    #[error("Entry '{alias}' has no {material}")]
    NoMaterial {
        /// Entry alias
        alias: String,
        /// `certificate` or `private key`
        material: &'static str,
    },

    /// Certificate PEM does not decode as X.509
    #[error("Invalid certificate: {reason}")]
    InvalidCertificate {
        /// Decoding failure details
        reason: String,
    },

    /// Private key PEM is not a private key block
    #[error("Invalid private key: {reason}")]
    InvalidKey {
        /// Decoding failure details
        reason: String,
    },

    /// Store or entry password did not match
    #[error("Access denied")]
    AccessDenied,

    /// Operation on a closed store handle
    #[error("Store handle is closed")]
    Closed,
}

impl StoreError {
    pub(crate) fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }
}
