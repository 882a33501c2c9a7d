//! Error types for credential store operations.

use std::fmt;
use thiserror::Error;

/// Raw status code reported by the platform credential store.
///
/// On macOS this is the `OSStatus` returned by Security.framework. Other
/// backends map their outcomes onto the same well-known values so callers
/// see one vocabulary. Match on [`StoreError`] predicates, not on codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StoreStatus(i32);

impl StoreStatus {
    pub const SUCCESS: Self = Self(0);
    pub const USER_CANCELED: Self = Self(-128);
    pub const IO: Self = Self(-36);
    pub const PARAM: Self = Self(-50);
    pub const AUTH_FAILED: Self = Self(-25293);
    pub const DUPLICATE_ITEM: Self = Self(-25299);
    pub const ITEM_NOT_FOUND: Self = Self(-25300);
    pub const INTERACTION_NOT_ALLOWED: Self = Self(-25308);

    pub const fn from_code(code: i32) -> Self {
        Self(code)
    }

    pub const fn code(self) -> i32 {
        self.0
    }

    /// Human-readable description of the status.
    pub fn message(self) -> String {
        #[cfg(target_os = "macos")]
        {
            if let Some(message) = security_framework::base::Error::from_code(self.0).message() {
                return message;
            }
        }

        let known = match self {
            Self::SUCCESS => "No error.",
            Self::USER_CANCELED => "User canceled the operation.",
            Self::IO => "I/O error.",
            Self::PARAM => "One or more parameters passed to a function were not valid.",
            Self::AUTH_FAILED => "The user name or passphrase you entered is not correct.",
            Self::DUPLICATE_ITEM => "The specified item already exists in the keychain.",
            Self::ITEM_NOT_FOUND => "The specified item could not be found in the keychain.",
            Self::INTERACTION_NOT_ALLOWED => "User interaction is not allowed.",
            _ => return format!("Unknown credential store error {}.", self.0),
        };
        known.to_string()
    }
}

impl fmt::Display for StoreStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (status {})", self.message(), self.0)
    }
}

/// Errors reported by a [`crate::CredentialStore`].
///
/// A missing item on lookup is not an error; see
/// [`crate::CredentialStore::get`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Could not create access control for {key_path}: {status}")]
    AccessControlCreationFailed { key_path: String, status: StoreStatus },

    #[error("Could not save passphrase for {key_path}: {status}")]
    InsertFailed { key_path: String, status: StoreStatus },

    #[error("Could not delete passphrase for {key_path}: {status}")]
    DeleteFailed { key_path: String, status: StoreStatus },

    #[error("Could not read passphrase for {key_path}: {status}")]
    LookupFailed { key_path: String, status: StoreStatus },
}

impl StoreError {
    /// The platform status attached to this error.
    pub fn status(&self) -> StoreStatus {
        match self {
            Self::AccessControlCreationFailed { status, .. }
            | Self::InsertFailed { status, .. }
            | Self::DeleteFailed { status, .. }
            | Self::LookupFailed { status, .. } => *status,
        }
    }

    /// The key path the failed operation was about.
    pub fn key_path(&self) -> &str {
        match self {
            Self::AccessControlCreationFailed { key_path, .. }
            | Self::InsertFailed { key_path, .. }
            | Self::DeleteFailed { key_path, .. }
            | Self::LookupFailed { key_path, .. } => key_path,
        }
    }

    /// A delete found nothing to remove.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::DeleteFailed { status, .. } if *status == StoreStatus::ITEM_NOT_FOUND)
    }

    /// An insert collided with an existing item for the same key path.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::InsertFailed { status, .. } if *status == StoreStatus::DUPLICATE_ITEM)
    }
}

/// Convenience result alias for credential store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
