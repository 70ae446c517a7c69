//! In-memory credential-store backend
//!
//! Stores live for the lifetime of the [`MemoryStoreProvider`] and are keyed
//! by `(host, name)`. Every handle returned by create/load shares the same
//! store state, so entries added through one handle are visible through the
//! others. Deleting a store invalidates every handle to it.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::RwLock;
use tracing::{debug, warn};
use x509_parser::pem::parse_x509_pem;

use crate::types::{CredentialStore, CredentialStoreProvider, EntryType, InfoLevel, NewEntry, StoreEntry};
use crate::{Result, StoreError};

type StoreKey = (String, String);

#[derive(Debug)]
struct StoreState {
    password: SecretString,
    entries: BTreeMap<String, StoredEntry>,
    deleted: bool,
}

#[derive(Debug)]
struct StoredEntry {
    entry_type: EntryType,
    created_at: DateTime<Utc>,
    auto_refresh: bool,
    certificate: Option<String>,
    key: Option<SecretString>,
    password: Option<SecretString>,
}

impl StoredEntry {
    fn describe(&self, alias: &str, level: InfoLevel) -> StoreEntry {
        StoreEntry {
            alias: alias.to_string(),
            entry_type: self.entry_type,
            created_at: self.created_at,
            auto_refresh: self.auto_refresh,
            certificate: match level {
                InfoLevel::Level1 => None,
                InfoLevel::Level2 => self.certificate.clone(),
            },
        }
    }
}

/// In-memory [`CredentialStoreProvider`] for development and testing
#[derive(Debug, Clone, Default)]
pub struct MemoryStoreProvider {
    stores: Arc<RwLock<HashMap<StoreKey, Arc<RwLock<StoreState>>>>>,
}

impl MemoryStoreProvider {
    /// Create a provider with no stores
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stores across all hosts
    pub async fn store_count(&self) -> usize {
        self.stores.read().await.len()
    }
}

#[async_trait]
impl CredentialStoreProvider for MemoryStoreProvider {
    type Store = MemoryCredentialStore;

    async fn create_store(&self, host: &str, name: &str, password: &str) -> Result<Self::Store> {
        let key = store_key(host, name)?;
        let mut stores = self.stores.write().await;
        if stores.contains_key(&key) {
            return Err(StoreError::StoreExists {
                host: key.0,
                name: key.1,
            });
        }

        let state = Arc::new(RwLock::new(StoreState {
            password: SecretString::new(password.to_string()),
            entries: BTreeMap::new(),
            deleted: false,
        }));
        stores.insert(key.clone(), Arc::clone(&state));
        debug!(host = %key.0, name = %key.1, "Credential store created");
        Ok(MemoryCredentialStore::new(key, state))
    }

    async fn load_store(&self, host: &str, name: &str, password: &str) -> Result<Self::Store> {
        let key = store_key(host, name)?;
        let state = self
            .stores
            .read()
            .await
            .get(&key)
            .cloned()
            .ok_or_else(|| StoreError::StoreNotFound {
                host: key.0.clone(),
                name: key.1.clone(),
            })?;

        if state.read().await.password.expose_secret() != password {
            warn!(host = %key.0, name = %key.1, "Credential store password rejected");
            return Err(StoreError::AccessDenied);
        }
        Ok(MemoryCredentialStore::new(key, state))
    }

    async fn delete_store(&self, host: &str, name: &str) -> Result<()> {
        let key = store_key(host, name)?;
        let state = self
            .stores
            .write()
            .await
            .remove(&key)
            .ok_or_else(|| StoreError::StoreNotFound {
                host: key.0.clone(),
                name: key.1.clone(),
            })?;

        let mut state = state.write().await;
        state.deleted = true;
        state.entries.clear();
        debug!(host = %key.0, name = %key.1, "Credential store deleted");
        Ok(())
    }
}

/// Handle to a store held by a [`MemoryStoreProvider`]
#[derive(Debug)]
pub struct MemoryCredentialStore {
    host: String,
    name: String,
    state: Arc<RwLock<StoreState>>,
    closed: AtomicBool,
}

impl MemoryCredentialStore {
    fn new((host, name): StoreKey, state: Arc<RwLock<StoreState>>) -> Self {
        Self {
            host,
            name,
            state,
            closed: AtomicBool::new(false),
        }
    }

    /// Host this store belongs to
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Store name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether [`close`](CredentialStore::close) has run on this handle
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn check_open(&self, state: &StoreState) -> Result<()> {
        if self.is_closed() {
            return Err(StoreError::Closed);
        }
        if state.deleted {
            return Err(StoreError::StoreNotFound {
                host: self.host.clone(),
                name: self.name.clone(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn add_entry(&self, entry: NewEntry) -> Result<()> {
        require("alias", &entry.alias)?;
        let certificate = validated_certificate(&entry)?;
        validate_key(&entry)?;

        let mut state = self.state.write().await;
        self.check_open(&state)?;
        if state.entries.contains_key(&entry.alias) {
            return Err(StoreError::EntryExists { alias: entry.alias });
        }

        debug!(
            store = %self.name,
            alias = %entry.alias,
            entry_type = ?entry.entry_type,
            "Credential store entry added"
        );
        state.entries.insert(
            entry.alias,
            StoredEntry {
                entry_type: entry.entry_type,
                created_at: Utc::now(),
                auto_refresh: entry.auto_refresh,
                certificate,
                key: entry.key,
                password: entry.password,
            },
        );
        Ok(())
    }

    async fn get_entry(&self, alias: &str, level: InfoLevel) -> Result<StoreEntry> {
        let state = self.state.read().await;
        self.check_open(&state)?;
        let entry = lookup(&state, alias)?;
        Ok(entry.describe(alias, level))
    }

    async fn get_entry_certificate(&self, alias: &str) -> Result<String> {
        let state = self.state.read().await;
        self.check_open(&state)?;
        lookup(&state, alias)?
            .certificate
            .clone()
            .ok_or_else(|| StoreError::NoMaterial {
                alias: alias.to_string(),
                material: "certificate",
            })
    }

    async fn get_entry_key(&self, alias: &str, password: &str) -> Result<SecretString> {
        let state = self.state.read().await;
        self.check_open(&state)?;
        let entry = lookup(&state, alias)?;
        let key = entry.key.as_ref().ok_or_else(|| StoreError::NoMaterial {
            alias: alias.to_string(),
            material: "private key",
        })?;

        let expected = entry
            .password
            .as_ref()
            .map_or("", |p| p.expose_secret().as_str());
        if expected != password {
            warn!(store = %self.name, alias = alias, "Entry key password rejected");
            return Err(StoreError::AccessDenied);
        }
        Ok(key.clone())
    }

    async fn delete_entry(&self, alias: &str) -> Result<()> {
        let mut state = self.state.write().await;
        self.check_open(&state)?;
        state
            .entries
            .remove(alias)
            .ok_or_else(|| StoreError::EntryNotFound {
                alias: alias.to_string(),
            })?;
        debug!(store = %self.name, alias = alias, "Credential store entry deleted");
        Ok(())
    }

    async fn entry_count(&self) -> Result<usize> {
        let state = self.state.read().await;
        self.check_open(&state)?;
        Ok(state.entries.len())
    }

    async fn list_aliases(&self) -> Result<Vec<String>> {
        let state = self.state.read().await;
        self.check_open(&state)?;
        Ok(state.entries.keys().cloned().collect())
    }

    async fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!(host = %self.host, name = %self.name, "Credential store handle closed");
        }
    }
}

fn store_key(host: &str, name: &str) -> Result<StoreKey> {
    require("host", host)?;
    require("store name", name)?;
    Ok((host.to_string(), name.to_string()))
}

fn require(what: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(StoreError::invalid_argument(format!("{what} is empty")));
    }
    Ok(())
}

fn lookup<'a>(state: &'a StoreState, alias: &str) -> Result<&'a StoredEntry> {
    state.entries.get(alias).ok_or_else(|| StoreError::EntryNotFound {
        alias: alias.to_string(),
    })
}

/// Certificate PEM, checked to be a parseable X.509 certificate
fn validated_certificate(entry: &NewEntry) -> Result<Option<String>> {
    let Some(pem) = entry.certificate.as_deref().filter(|pem| !pem.trim().is_empty()) else {
        if entry.entry_type.requires_certificate() {
            return Err(StoreError::invalid_argument(format!(
                "{:?} entry requires a certificate",
                entry.entry_type
            )));
        }
        return Ok(None);
    };

    let (_, block) = parse_x509_pem(pem.as_bytes()).map_err(|e| StoreError::InvalidCertificate {
        reason: format!("invalid PEM: {e}"),
    })?;
    if block.label != "CERTIFICATE" {
        return Err(StoreError::InvalidCertificate {
            reason: format!("expected a CERTIFICATE block, found '{}'", block.label),
        });
    }
    block
        .parse_x509()
        .map_err(|e| StoreError::InvalidCertificate {
            reason: format!("invalid X.509 certificate: {e}"),
        })?;
    Ok(Some(pem.to_string()))
}

/// Private keys must be a PEM `... PRIVATE KEY` block; secret keys are opaque
fn validate_key(entry: &NewEntry) -> Result<()> {
    let key = entry
        .key
        .as_ref()
        .map(|k| k.expose_secret().as_str())
        .filter(|k| !k.trim().is_empty());

    match (key, entry.entry_type) {
        (None, entry_type) if entry_type.requires_key() => Err(StoreError::invalid_argument(
            format!("{entry_type:?} entry requires a key"),
        )),
        (Some(pem), EntryType::PrivateKey) => {
            let (_, block) = parse_x509_pem(pem.as_bytes()).map_err(|e| StoreError::InvalidKey {
                reason: format!("invalid PEM: {e}"),
            })?;
            if !block.label.ends_with("PRIVATE KEY") {
                return Err(StoreError::InvalidKey {
                    reason: format!("expected a PRIVATE KEY block, found '{}'", block.label),
                });
            }
            Ok(())
        }
        _ => Ok(()),
    }
}
