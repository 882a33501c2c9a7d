//! The askpass session: one prompt in, one decision out.
//!
//! Ties the classified [`PromptIntent`] to the credential store and the
//! presenter:
//!
//! - confirmations go straight to an approve/deny question and never touch
//!   the store;
//! - a rejected passphrase ("Bad passphrase") is deleted from the store
//!   before the user is asked again;
//! - otherwise a stored passphrase is returned without showing anything;
//! - a newly entered passphrase is stored only when the user opted in.
//!
//! Store failures are reported to the user but never stop the passphrase
//! from reaching the agent.

use askpass_core::{Passphrase, PromptIntent, SettingStore, USE_KEYCHAIN};
use askpass_secrets::{CredentialStore, StoreError};
use tracing::{debug, info, warn};

use crate::ui::{Presenter, RememberOption};

const KEYCHAIN_ERROR: &str = "Keychain Error";

/// The decision returned to the agent.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Exit 0, writing the passphrase (if any) to stdout.
    Approved(Option<Passphrase>),
    /// Exit 1.
    Denied,
}

/// A single askpass invocation.
pub struct AskpassSession<'a> {
    intent: &'a PromptIntent,
    store: Option<&'a dyn CredentialStore>,
    settings: &'a mut dyn SettingStore,
    presenter: &'a mut dyn Presenter,
}

impl<'a> AskpassSession<'a> {
    /// `store` is `None` when credential store integration is switched off.
    pub fn new(
        intent: &'a PromptIntent,
        store: Option<&'a dyn CredentialStore>,
        settings: &'a mut dyn SettingStore,
        presenter: &'a mut dyn Presenter,
    ) -> Self {
        Self {
            intent,
            store,
            settings,
            presenter,
        }
    }

    pub fn run(mut self) -> Outcome {
        let intent = self.intent;
        debug!(kind = ?intent.kind, key_path = %intent.key_path, "handling prompt");

        if intent.requires_confirmation_only() {
            return match self.presenter.confirm(&intent.message) {
                Ok(true) => Outcome::Approved(None),
                Ok(false) => Outcome::Denied,
                Err(e) => {
                    warn!("confirmation prompt failed: {e}");
                    Outcome::Denied
                }
            };
        }

        if let Some(store) = self.keychain() {
            if intent.is_failed_attempt() {
                self.invalidate(store);
            } else if let Some(passphrase) = self.lookup(store) {
                info!(key_path = %intent.key_path, "using stored passphrase");
                return Outcome::Approved(Some(passphrase));
            }
        }

        let remember_option = match self.keychain() {
            Some(_) => RememberOption::Enabled {
                default: self.settings.get_bool(USE_KEYCHAIN).unwrap_or(false),
            },
            None => RememberOption::Disabled,
        };

        let response = match self.presenter.ask_passphrase(&intent.message, remember_option) {
            Ok(Some(response)) => response,
            Ok(None) => return Outcome::Denied,
            Err(e) => {
                warn!("passphrase prompt failed: {e}");
                return Outcome::Denied;
            }
        };

        if let RememberOption::Enabled { default } = remember_option {
            if response.remember != default {
                if let Err(e) = self.settings.set_bool(USE_KEYCHAIN, response.remember) {
                    warn!("could not save remember preference: {e}");
                }
            }
        }

        if response.remember {
            if let Some(store) = self.keychain() {
                self.remember(store, &response.passphrase);
            }
        }

        Outcome::Approved(Some(response.passphrase))
    }

    /// The store, when this prompt names a key it can be keyed on.
    fn keychain(&self) -> Option<&'a dyn CredentialStore> {
        self.store.filter(|_| self.intent.is_recognized())
    }

    /// Drop the passphrase the agent just rejected.
    fn invalidate(&mut self, store: &dyn CredentialStore) {
        let key_path = self.intent.key_path.as_str();
        match store.delete(key_path) {
            Ok(()) => info!(key_path, "removed rejected passphrase from store"),
            Err(e) if e.is_not_found() => debug!(key_path, "no stored passphrase to remove"),
            Err(e) => self.report(&e),
        }
    }

    fn lookup(&mut self, store: &dyn CredentialStore) -> Option<Passphrase> {
        match store.get(&self.intent.key_path) {
            Ok(passphrase) => passphrase,
            Err(e) => {
                self.report(&e);
                None
            }
        }
    }

    fn remember(&mut self, store: &dyn CredentialStore, passphrase: &Passphrase) {
        let intent = self.intent;
        let key_path = intent.key_path.as_str();

        let err = match store.add(key_path, passphrase) {
            Ok(()) => {
                info!(key_path, "stored passphrase");
                return;
            }
            Err(e) => e,
        };

        if !err.is_duplicate() {
            self.report(&err);
            return;
        }

        let replace = self
            .presenter
            .ask(
                "Keychain Item Exists",
                &format!("A passphrase for {key_path} is already stored. Replace it?"),
                "Replace",
            )
            .unwrap_or_else(|e| {
                warn!("replace prompt failed: {e}");
                false
            });
        if !replace {
            debug!(key_path, "kept existing stored passphrase");
            return;
        }

        match store
            .delete(key_path)
            .and_then(|()| store.add(key_path, passphrase))
        {
            Ok(()) => info!(key_path, "replaced stored passphrase"),
            Err(e) => self.report(&e),
        }
    }

    /// Show a store failure to the user.
    fn report(&mut self, err: &StoreError) {
        debug!(
            key_path = err.key_path(),
            status = err.status().code(),
            "credential store error: {err}"
        );
        self.presenter
            .show_error(KEYCHAIN_ERROR, &err.status().message());
    }
}
