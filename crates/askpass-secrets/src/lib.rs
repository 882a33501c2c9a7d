//! Credential store adapter for ssh-askpass.
//!
//! Stores at most one passphrase per private key path in the platform's
//! secure credential store, readable only while the session is unlocked and
//! with no application pre-authorised for silent access.

pub mod error;
pub mod keychain;
pub mod store;
pub mod types;

pub use error::{Result, StoreError, StoreStatus};
pub use keychain::{default_store, KeychainStore};
pub use store::{CredentialStore, MemoryCredentialStore};
pub use types::CredentialRecord;
