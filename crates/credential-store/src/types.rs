//! Credential-store traits and entry types

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Kind of material an entry holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    /// Private key with its certificate
    PrivateKey,
    /// Opaque secret key
    SecretKey,
    /// Trusted (CA or signing) certificate, no key
    TrustedCert,
    /// Certificate revocation list
    RevokedCertList,
}

impl EntryType {
    /// Whether entries of this type must carry a certificate
    pub fn requires_certificate(self) -> bool {
        matches!(self, Self::PrivateKey | Self::TrustedCert)
    }

    /// Whether entries of this type must carry a private key
    pub fn requires_key(self) -> bool {
        matches!(self, Self::PrivateKey | Self::SecretKey)
    }
}

/// How much of an entry [`CredentialStore::get_entry`] returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum InfoLevel {
    /// Metadata only
    #[default]
    Level1,
    /// Metadata and certificate
    Level2,
}

/// Entry metadata, plus the certificate at [`InfoLevel::Level2`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreEntry {
    /// Alias the entry is stored under
    pub alias: String,
    /// Kind of material
    pub entry_type: EntryType,
    /// When the entry was added
    pub created_at: DateTime<Utc>,
    /// Whether the backend refreshes the entry automatically
    pub auto_refresh: bool,
    /// Certificate PEM (Level2 only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<String>,
}

/// Material for a new entry
#[derive(Debug, Clone)]
pub struct NewEntry {
    /// Kind of material
    pub entry_type: EntryType,
    /// Alias to store it under
    pub alias: String,
    /// Certificate PEM
    pub certificate: Option<String>,
    /// Private or secret key PEM
    pub key: Option<SecretString>,
    /// Password protecting the key
    pub password: Option<SecretString>,
    /// Whether the backend should refresh the entry automatically
    pub auto_refresh: bool,
}

impl NewEntry {
    /// A private key with its certificate
    pub fn private_key(
        alias: impl Into<String>,
        certificate: impl Into<String>,
        key_pem: impl Into<String>,
    ) -> Self {
        Self {
            entry_type: EntryType::PrivateKey,
            alias: alias.into(),
            certificate: Some(certificate.into()),
            key: Some(SecretString::new(key_pem.into())),
            password: None,
            auto_refresh: false,
        }
    }

    /// A trusted certificate
    pub fn trusted_cert(alias: impl Into<String>, certificate: impl Into<String>) -> Self {
        Self {
            entry_type: EntryType::TrustedCert,
            alias: alias.into(),
            certificate: Some(certificate.into()),
            key: None,
            password: None,
            auto_refresh: false,
        }
    }

    /// Protect the key with `password`
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(SecretString::new(password.into()));
        self
    }

    /// Mark the entry for automatic refresh
    pub fn with_auto_refresh(mut self, auto_refresh: bool) -> Self {
        self.auto_refresh = auto_refresh;
        self
    }
}

/// Creates, opens and deletes named stores
#[async_trait]
pub trait CredentialStoreProvider: Send + Sync + std::fmt::Debug {
    /// Store handle type
    type Store: CredentialStore;

    /// Create a new empty store
    async fn create_store(&self, host: &str, name: &str, password: &str) -> Result<Self::Store>;

    /// Open an existing store
    async fn load_store(&self, host: &str, name: &str, password: &str) -> Result<Self::Store>;

    /// Delete a store and every entry in it
    async fn delete_store(&self, host: &str, name: &str) -> Result<()>;
}

/// Handle to one open store
#[async_trait]
pub trait CredentialStore: Send + Sync + std::fmt::Debug {
    /// Add an entry under a fresh alias
    async fn add_entry(&self, entry: NewEntry) -> Result<()>;

    /// Entry metadata (and certificate at [`InfoLevel::Level2`])
    async fn get_entry(&self, alias: &str, level: InfoLevel) -> Result<StoreEntry>;

    /// Certificate PEM of an entry
    async fn get_entry_certificate(&self, alias: &str) -> Result<String>;

    /// Key PEM of an entry; `password` must match the one it was added with
    async fn get_entry_key(&self, alias: &str, password: &str) -> Result<SecretString>;

    /// Remove an entry
    async fn delete_entry(&self, alias: &str) -> Result<()>;

    /// Number of entries
    async fn entry_count(&self) -> Result<usize>;

    /// Aliases of every entry, sorted
    async fn list_aliases(&self) -> Result<Vec<String>>;

    /// Release the handle; later calls fail with
    /// [`StoreError::Closed`](crate::StoreError::Closed). Idempotent.
    async fn close(&self);
}
