//! # askpass-core
//!
//! Core types, configuration, and utilities for ssh-askpass.
//!
//! - **Prompt classification**: turning agent prompt text into a [`PromptIntent`]
//! - **Configuration**: loading and validation of the JSON5 config file
//! - **Preferences**: the persisted "remember in credential store" setting
//! - **Utilities**: path resolution, environment handling, passphrase wrapper

pub mod config;
pub mod env;
pub mod error;
pub mod paths;
pub mod prompt;
pub mod secret;
pub mod settings;

// Re-exports for convenience
pub use config::Config;
pub use error::{ConfigError, PreferencesError};
pub use prompt::{classify, PromptIntent, PromptKind};
pub use secret::Passphrase;
pub use settings::{Preferences, SettingStore, TransientSettings, USE_KEYCHAIN};
