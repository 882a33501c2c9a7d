//! Credential store backends.
//!
//! Defines the [`CredentialStore`] trait and provides
//! [`MemoryCredentialStore`], an in-process implementation with the same
//! uniqueness and not-found semantics as the platform keychain.

use std::collections::HashMap;

use askpass_core::Passphrase;
use parking_lot::Mutex;
use tracing::debug;

use crate::error::{Result, StoreError, StoreStatus};
use crate::types::CredentialRecord;

/// Get/add/delete of one passphrase per key path.
///
/// Each call is a single, independent store operation; nothing spans calls.
pub trait CredentialStore: Send + Sync {
    /// Look up the passphrase stored for `key_path`.
    ///
    /// Returns `Ok(None)` when there is no item, or when the stored data is
    /// not valid UTF-8. Any other failure is [`StoreError::LookupFailed`].
    fn get(&self, key_path: &str) -> Result<Option<Passphrase>>;

    /// Store `secret` for `key_path`.
    ///
    /// Never overwrites: an existing item yields [`StoreError::InsertFailed`]
    /// with [`StoreStatus::DUPLICATE_ITEM`].
    fn add(&self, key_path: &str, secret: &Passphrase) -> Result<()>;

    /// Remove the item for `key_path`.
    ///
    /// Removing an absent item is [`StoreError::DeleteFailed`] with
    /// [`StoreStatus::ITEM_NOT_FOUND`]; callers that delete speculatively
    /// check [`StoreError::is_not_found`].
    fn delete(&self, key_path: &str) -> Result<()>;
}

/// An in-memory credential store.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    records: Mutex<HashMap<String, CredentialRecord>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a prepared record, failing if its account already exists.
    pub fn add_record(&self, record: CredentialRecord) -> Result<()> {
        let mut records = self.records.lock();
        if records.contains_key(&record.account) {
            return Err(StoreError::InsertFailed {
                key_path: record.account,
                status: StoreStatus::DUPLICATE_ITEM,
            });
        }
        debug!(key_path = %record.account, label = %record.label, "adding in-memory item");
        records.insert(record.account.clone(), record);
        Ok(())
    }

    /// Label of the item stored for `key_path`, if any.
    pub fn label(&self, key_path: &str) -> Option<String> {
        self.records.lock().get(key_path).map(|r| r.label.clone())
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, key_path: &str) -> Result<Option<Passphrase>> {
        let records = self.records.lock();
        Ok(records
            .get(key_path)
            .and_then(|r| Passphrase::from_utf8(r.secret_data.to_vec())))
    }

    fn add(&self, key_path: &str, secret: &Passphrase) -> Result<()> {
        self.add_record(CredentialRecord::new(key_path, secret.as_bytes()))
    }

    fn delete(&self, key_path: &str) -> Result<()> {
        match self.records.lock().remove(key_path) {
            Some(_) => {
                debug!(key_path, "deleted in-memory item");
                Ok(())
            }
            None => Err(StoreError::DeleteFailed {
                key_path: key_path.to_string(),
                status: StoreStatus::ITEM_NOT_FOUND,
            }),
        }
    }
}
