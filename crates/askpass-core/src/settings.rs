//! Persistent user preferences.
//!
//! The only preference ssh-askpass itself reads and writes is whether
//! entered passphrases should be remembered in the credential store. It is
//! kept in a small JSON object so the file stays a plain key-value store.

use crate::error::PreferencesError;
use crate::paths;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Setting name for "remember passphrases in the credential store".
pub const USE_KEYCHAIN: &str = "useKeychain";

/// A key-value setting store.
pub trait SettingStore {
    /// Read a boolean setting. `None` when unset or not a boolean.
    fn get_bool(&self, key: &str) -> Option<bool>;

    /// Write a boolean setting and persist it.
    fn set_bool(&mut self, key: &str, value: bool) -> Result<(), PreferencesError>;
}

/// File-backed preferences.
#[derive(Debug, Clone)]
pub struct Preferences {
    path: PathBuf,
    values: Map<String, Value>,
}

impl Preferences {
    /// Open the preferences file at the default location.
    pub fn open_default() -> Result<Self, PreferencesError> {
        let path =
            paths::preferences_file().map_err(|e| PreferencesError::Location(e.to_string()))?;
        Ok(Self::open(path))
    }

    /// Open preferences stored at `path`.
    ///
    /// A missing file is an empty store. An unreadable or malformed file is
    /// logged and also treated as empty; it is replaced on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<Map<String, Value>>(&content) {
                Ok(values) => values,
                Err(e) => {
                    warn!(path = %path.display(), "ignoring malformed preferences file: {e}");
                    Map::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => {
                warn!(path = %path.display(), "could not read preferences file: {e}");
                Map::new()
            }
        };

        Self { path, values }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<(), PreferencesError> {
        let io_err = |source| PreferencesError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let content = serde_json::to_string_pretty(&self.values)?;
        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, content).map_err(io_err)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o600);
            fs::set_permissions(&temp_path, perms).map_err(io_err)?;
        }

        fs::rename(&temp_path, &self.path).map_err(io_err)?;
        debug!(path = %self.path.display(), "saved preferences");
        Ok(())
    }
}

impl SettingStore for Preferences {
    fn get_bool(&self, key: &str) -> Option<bool> {
        self.values.get(key).and_then(Value::as_bool)
    }

    fn set_bool(&mut self, key: &str, value: bool) -> Result<(), PreferencesError> {
        self.values.insert(key.to_string(), Value::Bool(value));
        self.save()
    }
}

/// Settings that live only for this process.
///
/// Used when the preferences file cannot be located; choices still apply to
/// the current prompt but are not remembered.
#[derive(Debug, Clone, Default)]
pub struct TransientSettings {
    values: HashMap<String, bool>,
}

impl TransientSettings {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingStore for TransientSettings {
    fn get_bool(&self, key: &str) -> Option<bool> {
        self.values.get(key).copied()
    }

    fn set_bool(&mut self, key: &str, value: bool) -> Result<(), PreferencesError> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        let prefs = Preferences::open(tmp.path().join("preferences.json"));
        assert_eq!(prefs.get_bool(USE_KEYCHAIN), None);
    }

    #[test]
    fn test_set_and_reload() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("sub").join("preferences.json");

        let mut prefs = Preferences::open(&path);
        prefs.set_bool(USE_KEYCHAIN, true).unwrap();
        assert_eq!(prefs.get_bool(USE_KEYCHAIN), Some(true));

        let reloaded = Preferences::open(&path);
        assert_eq!(reloaded.get_bool(USE_KEYCHAIN), Some(true));

        let mut reloaded = reloaded;
        reloaded.set_bool(USE_KEYCHAIN, false).unwrap();
        assert_eq!(Preferences::open(&path).get_bool(USE_KEYCHAIN), Some(false));
    }

    #[test]
    fn test_unrelated_keys_preserved() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("preferences.json");
        fs::write(&path, r#"{"windowPosition": "top", "useKeychain": "yes"}"#).unwrap();

        let mut prefs = Preferences::open(&path);
        // Non-boolean values are not booleans.
        assert_eq!(prefs.get_bool(USE_KEYCHAIN), None);

        prefs.set_bool(USE_KEYCHAIN, true).unwrap();
        let raw: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["windowPosition"], "top");
        assert_eq!(raw["useKeychain"], true);
    }

    #[test]
    fn test_malformed_file_treated_as_empty() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("preferences.json");
        fs::write(&path, "[1, 2").unwrap();

        let mut prefs = Preferences::open(&path);
        assert_eq!(prefs.get_bool(USE_KEYCHAIN), None);
        prefs.set_bool(USE_KEYCHAIN, true).unwrap();
        assert_eq!(Preferences::open(&path).get_bool(USE_KEYCHAIN), Some(true));
    }

    #[cfg(unix)]
    #[test]
    fn test_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("preferences.json");
        let mut prefs = Preferences::open(&path);
        prefs.set_bool(USE_KEYCHAIN, true).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[test]
    fn test_transient_settings() {
        let mut settings = TransientSettings::new();
        assert_eq!(settings.get_bool(USE_KEYCHAIN), None);
        settings.set_bool(USE_KEYCHAIN, true).unwrap();
        assert_eq!(settings.get_bool(USE_KEYCHAIN), Some(true));
    }
}
