//! Credential record layout.
//!
//! Every passphrase is stored as one generic-password item whose account is
//! the key path and whose service is [`SERVICE`]. The remaining attributes
//! are fixed so items are recognisable in the platform's keychain UI.

use std::fmt;
use zeroize::Zeroizing;

/// Service name shared by all passphrase items.
pub const SERVICE: &str = "SSH";

/// Prefix of the human-readable item label; the key path follows it.
pub const LABEL_PREFIX: &str = "SSH: ";

/// Item description ("kind" column in Keychain Access).
pub const DESCRIPTION: &str = "OpenSSH private key passphrase";

/// When the stored item may be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accessibility {
    /// Only while the user session is unlocked.
    WhenUnlocked,
}

/// Which applications may read the item without the OS asking the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPolicy {
    /// No application is pre-authorised; every other process triggers an
    /// OS confirmation dialog.
    NoTrustedApplications,
}

/// A passphrase item as written to the store.
pub struct CredentialRecord {
    pub label: String,
    pub description: &'static str,
    pub service: &'static str,
    pub account: String,
    pub accessibility: Accessibility,
    pub access: AccessPolicy,
    pub secret_data: Zeroizing<Vec<u8>>,
}

impl CredentialRecord {
    /// Build the record for `key_path` holding `secret_data`.
    pub fn new(key_path: &str, secret_data: impl Into<Vec<u8>>) -> Self {
        Self {
            label: format!("{LABEL_PREFIX}{key_path}"),
            description: DESCRIPTION,
            service: SERVICE,
            account: key_path.to_string(),
            accessibility: Accessibility::WhenUnlocked,
            access: AccessPolicy::NoTrustedApplications,
            secret_data: Zeroizing::new(secret_data.into()),
        }
    }
}

impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("label", &self.label)
            .field("service", &self.service)
            .field("account", &self.account)
            .field("accessibility", &self.accessibility)
            .field("access", &self.access)
            .field("secret_data", &"[REDACTED]")
            .finish()
    }
}
