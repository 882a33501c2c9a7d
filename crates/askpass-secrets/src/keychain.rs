//! Platform keychain integration.
//!
//! On macOS passphrases are generic-password items in the login keychain,
//! written through Security.framework with an access object that trusts no
//! application, so any process other than the one the user approves in the
//! OS dialog is challenged.
//!
//! On other platforms the `keyring` crate is used (kernel keyutils on Linux,
//! Credential Manager on Windows). Those stores have no label, description
//! or trusted-application list; only service and account are kept.

use askpass_core::Passphrase;
use tracing::debug;

use crate::error::Result;
use crate::store::CredentialStore;

/// The platform credential store.
#[derive(Debug, Clone, Default)]
pub struct KeychainStore {
    _private: (),
}

impl KeychainStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for KeychainStore {
    fn get(&self, key_path: &str) -> Result<Option<Passphrase>> {
        debug!(key_path, "keychain lookup");
        platform::get(key_path)
    }

    fn add(&self, key_path: &str, secret: &Passphrase) -> Result<()> {
        debug!(key_path, "keychain add");
        platform::add(key_path, secret)
    }

    fn delete(&self, key_path: &str) -> Result<()> {
        debug!(key_path, "keychain delete");
        platform::delete(key_path)
    }
}

/// The credential store for this platform.
pub fn default_store() -> Box<dyn CredentialStore> {
    Box::new(KeychainStore::new())
}

// ---------------------------------------------------------------------------
// macOS keychain implementation
// ---------------------------------------------------------------------------

#[cfg(target_os = "macos")]
mod platform {
    use std::os::raw::c_void;
    use std::ptr;

    use askpass_core::Passphrase;
    use core_foundation::array::{CFArray, CFArrayRef};
    use core_foundation::base::{CFType, CFTypeRef, TCFType};
    use core_foundation::boolean::CFBoolean;
    use core_foundation::data::CFData;
    use core_foundation::dictionary::CFDictionary;
    use core_foundation::string::{CFString, CFStringRef};

    use security_framework_sys::item::{
        kSecAttrAccount, kSecAttrLabel, kSecAttrService, kSecClass, kSecClassGenericPassword,
        kSecMatchLimit, kSecMatchLimitOne, kSecReturnData, kSecValueData,
    };
    use security_framework_sys::keychain_item::{SecItemAdd, SecItemCopyMatching, SecItemDelete};

    use crate::error::{Result, StoreError, StoreStatus};
    use crate::types::{AccessPolicy, Accessibility, CredentialRecord, SERVICE};

    type OSStatus = i32;
    type SecAccessRef = *mut c_void;

    // macOS-only keychain attributes and SecAccess, which the sys crate
    // does not bind.
    #[allow(non_upper_case_globals)]
    #[link(name = "Security", kind = "framework")]
    extern "C" {
        static kSecAttrDescription: CFStringRef;
        static kSecAttrAccessible: CFStringRef;
        static kSecAttrAccessibleWhenUnlocked: CFStringRef;
        static kSecAttrAccess: CFStringRef;

        fn SecAccessCreate(
            descriptor: CFStringRef,
            trusted_list: CFArrayRef,
            access: *mut SecAccessRef,
        ) -> OSStatus;
    }

    /// Wrap one of the framework's constant keys.
    fn constant(value: CFStringRef) -> CFString {
        // SAFETY: framework constants are valid, immortal CFStrings.
        unsafe { CFString::wrap_under_get_rule(value) }
    }

    /// Class + service + account: the item's identity.
    fn identity(key_path: &str) -> Vec<(CFString, CFType)> {
        // SAFETY: reading extern statics exported by Security.framework.
        unsafe {
            vec![
                (
                    constant(kSecClass),
                    constant(kSecClassGenericPassword).as_CFType(),
                ),
                (constant(kSecAttrService), CFString::new(SERVICE).as_CFType()),
                (constant(kSecAttrAccount), CFString::new(key_path).as_CFType()),
            ]
        }
    }

    /// Access object that pre-authorises no application.
    fn untrusted_access(label: &str) -> std::result::Result<CFType, StoreStatus> {
        let descriptor = CFString::new(label);
        let trusted: CFArray<CFType> = CFArray::from_CFTypes(&[]);
        let mut access: SecAccessRef = ptr::null_mut();

        // SAFETY: all arguments are live CF objects; `access` is an out pointer.
        let status = unsafe {
            SecAccessCreate(
                descriptor.as_concrete_TypeRef(),
                trusted.as_concrete_TypeRef(),
                &mut access,
            )
        };
        if status != 0 || access.is_null() {
            return Err(StoreStatus::from_code(status));
        }

        // SAFETY: SecAccessCreate follows the create rule.
        Ok(unsafe { CFType::wrap_under_create_rule(access as CFTypeRef) })
    }

    pub(super) fn get(key_path: &str) -> Result<Option<Passphrase>> {
        let mut pairs = identity(key_path);
        // SAFETY: reading extern statics exported by Security.framework.
        unsafe {
            pairs.push((constant(kSecMatchLimit), constant(kSecMatchLimitOne).as_CFType()));
            pairs.push((constant(kSecReturnData), CFBoolean::true_value().as_CFType()));
        }
        let query = CFDictionary::from_CFType_pairs(&pairs);

        let mut result: CFTypeRef = ptr::null();
        // SAFETY: `query` is a live dictionary; `result` is an out pointer.
        let status = unsafe { SecItemCopyMatching(query.as_concrete_TypeRef(), &mut result) };

        match StoreStatus::from_code(status) {
            StoreStatus::SUCCESS => {}
            StoreStatus::ITEM_NOT_FOUND => return Ok(None),
            status => {
                return Err(StoreError::LookupFailed {
                    key_path: key_path.to_string(),
                    status,
                })
            }
        }

        if result.is_null() {
            return Ok(None);
        }

        // SAFETY: SecItemCopyMatching returns an owned reference.
        let value = unsafe { CFType::wrap_under_create_rule(result) };
        Ok(value
            .downcast_into::<CFData>()
            .and_then(|data| Passphrase::from_utf8(data.bytes().to_vec())))
    }

    pub(super) fn add(key_path: &str, secret: &Passphrase) -> Result<()> {
        let record = CredentialRecord::new(key_path, secret.as_bytes());

        let access = match record.access {
            AccessPolicy::NoTrustedApplications => untrusted_access(&record.label),
        }
        .map_err(|status| StoreError::AccessControlCreationFailed {
            key_path: key_path.to_string(),
            status,
        })?;

        let mut pairs = identity(&record.account);
        // SAFETY: reading extern statics exported by Security.framework.
        unsafe {
            pairs.push((constant(kSecAttrLabel), CFString::new(&record.label).as_CFType()));
            pairs.push((
                constant(kSecAttrDescription),
                CFString::new(record.description).as_CFType(),
            ));
            let accessible = match record.accessibility {
                Accessibility::WhenUnlocked => kSecAttrAccessibleWhenUnlocked,
            };
            pairs.push((constant(kSecAttrAccessible), constant(accessible).as_CFType()));
            pairs.push((constant(kSecAttrAccess), access));
            pairs.push((
                constant(kSecValueData),
                CFData::from_buffer(&record.secret_data).as_CFType(),
            ));
        }
        let attributes = CFDictionary::from_CFType_pairs(&pairs);

        // SAFETY: `attributes` is a live dictionary; no result is requested.
        let status = unsafe { SecItemAdd(attributes.as_concrete_TypeRef(), ptr::null_mut()) };
        if status != 0 {
            return Err(StoreError::InsertFailed {
                key_path: key_path.to_string(),
                status: StoreStatus::from_code(status),
            });
        }
        Ok(())
    }

    pub(super) fn delete(key_path: &str) -> Result<()> {
        let query = CFDictionary::from_CFType_pairs(&identity(key_path));

        // SAFETY: `query` is a live dictionary.
        let status = unsafe { SecItemDelete(query.as_concrete_TypeRef()) };
        if status != 0 {
            return Err(StoreError::DeleteFailed {
                key_path: key_path.to_string(),
                status: StoreStatus::from_code(status),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// keyring implementation for everything else
// ---------------------------------------------------------------------------

#[cfg(not(target_os = "macos"))]
mod platform {
    use askpass_core::Passphrase;
    use tracing::warn;
    use zeroize::Zeroizing;

    use crate::error::{Result, StoreError, StoreStatus};
    use crate::types::{CredentialRecord, SERVICE};

    /// Map a keyring error onto the shared status vocabulary.
    fn status_of(err: &keyring::Error) -> StoreStatus {
        match err {
            keyring::Error::NoEntry => StoreStatus::ITEM_NOT_FOUND,
            keyring::Error::NoStorageAccess(_) => StoreStatus::INTERACTION_NOT_ALLOWED,
            keyring::Error::TooLong(..) | keyring::Error::Invalid(..) => StoreStatus::PARAM,
            _ => StoreStatus::IO,
        }
    }

    fn entry(key_path: &str) -> std::result::Result<keyring::Entry, keyring::Error> {
        keyring::Entry::new(SERVICE, key_path)
    }

    pub(super) fn get(key_path: &str) -> Result<Option<Passphrase>> {
        let lookup_failed = |e: keyring::Error| {
            warn!(key_path, "keyring lookup failed: {e}");
            StoreError::LookupFailed {
                key_path: key_path.to_string(),
                status: status_of(&e),
            }
        };

        match entry(key_path).and_then(|entry| entry.get_secret()) {
            Ok(bytes) => Ok(Passphrase::from_utf8(bytes)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(lookup_failed(e)),
        }
    }

    pub(super) fn add(key_path: &str, secret: &Passphrase) -> Result<()> {
        let insert_failed = |e: keyring::Error| {
            warn!(key_path, "keyring insert failed: {e}");
            StoreError::InsertFailed {
                key_path: key_path.to_string(),
                status: status_of(&e),
            }
        };

        let record = CredentialRecord::new(key_path, secret.as_bytes());
        let item = entry(&record.account).map_err(insert_failed)?;

        // keyring overwrites silently, so reject duplicates here.
        match item.get_secret() {
            Ok(_) => {
                return Err(StoreError::InsertFailed {
                    key_path: key_path.to_string(),
                    status: StoreStatus::DUPLICATE_ITEM,
                })
            }
            Err(keyring::Error::NoEntry) => {}
            Err(e) => return Err(insert_failed(e)),
        }

        item.set_secret(&record.secret_data).map_err(insert_failed)?;

        // Without a native backend keyring falls back to a mock store that
        // keeps nothing, so confirm the item through a fresh entry.
        let kept = match entry(&record.account).and_then(|fresh| fresh.get_secret()) {
            Ok(stored) => Zeroizing::new(stored).as_slice() == record.secret_data.as_slice(),
            Err(keyring::Error::NoEntry) => false,
            Err(e) => return Err(insert_failed(e)),
        };
        if !kept {
            warn!(key_path, "keyring accepted the secret but did not keep it");
            return Err(StoreError::InsertFailed {
                key_path: key_path.to_string(),
                status: StoreStatus::IO,
            });
        }
        Ok(())
    }

    pub(super) fn delete(key_path: &str) -> Result<()> {
        entry(key_path)
            .and_then(|entry| entry.delete_credential())
            .map_err(|e| {
                if !matches!(e, keyring::Error::NoEntry) {
                    warn!(key_path, "keyring delete failed: {e}");
                }
                StoreError::DeleteFailed {
                    key_path: key_path.to_string(),
                    status: status_of(&e),
                }
            })
    }
}
