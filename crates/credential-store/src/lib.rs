//! # Credential Store - certificate and key storage interface
//!
//! Async interface to a credential store: named, password-protected stores
//! holding certificates and keys under aliases. A relying party typically
//! keeps its issuer's signing certificate here and hands the PEM from
//! [`CredentialStore::get_entry_certificate`] to token verification.
//!
//! ## Architecture
//!
//! - [`types`] - [`CredentialStoreProvider`] and [`CredentialStore`] traits,
//!   entry types and metadata
//! - [`memory`] - in-memory backend for development and testing
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use credential_store::{CredentialStore, CredentialStoreProvider, MemoryStoreProvider, NewEntry};
//!
//! # async fn run(issuer_cert_pem: String) -> credential_store::Result<()> {
//! let provider = MemoryStoreProvider::new();
//! let store = provider.create_store("localhost", "trusted-issuers", "").await?;
//!
//! store.add_entry(NewEntry::trusted_cert("idp", issuer_cert_pem)).await?;
//! let pem = store.get_entry_certificate("idp").await?;
//! assert!(pem.starts_with("-----BEGIN CERTIFICATE-----"));
//!
//! store.close().await;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod memory;
pub mod types;

pub use error::StoreError;
pub use memory::{MemoryCredentialStore, MemoryStoreProvider};
pub use types::{CredentialStore, CredentialStoreProvider, EntryType, InfoLevel, NewEntry, StoreEntry};

/// Result type for credential-store operations
pub type Result<T> = std::result::Result<T, StoreError>;
