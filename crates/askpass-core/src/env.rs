//! Environment variable handling.

use std::env;

/// Get an environment variable, returning None if not set or empty.
pub fn get_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable as a boolean.
pub fn get_bool(name: &str) -> bool {
    get_var(name)
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

/// Environment variable names read by ssh-askpass.
pub mod vars {
    /// Base directory override (defaults to `~/.ssh-askpass`).
    pub const SSH_ASKPASS_HOME: &str = "SSH_ASKPASS_HOME";

    /// Config file override.
    pub const SSH_ASKPASS_CONFIG: &str = "SSH_ASKPASS_CONFIG";

    /// Log filter, in `tracing_subscriber::EnvFilter` syntax.
    pub const SSH_ASKPASS_LOG: &str = "SSH_ASKPASS_LOG";

    /// Disable the credential store for this invocation.
    pub const SSH_ASKPASS_NO_KEYCHAIN: &str = "SSH_ASKPASS_NO_KEYCHAIN";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_bool() {
        env::set_var("ASKPASS_TEST_BOOL_TRUE", "true");
        env::set_var("ASKPASS_TEST_BOOL_YES", "YES");
        env::set_var("ASKPASS_TEST_BOOL_FALSE", "false");
        env::set_var("ASKPASS_TEST_BOOL_0", "0");

        assert!(get_bool("ASKPASS_TEST_BOOL_TRUE"));
        assert!(get_bool("ASKPASS_TEST_BOOL_YES"));
        assert!(!get_bool("ASKPASS_TEST_BOOL_FALSE"));
        assert!(!get_bool("ASKPASS_TEST_BOOL_0"));
        assert!(!get_bool("ASKPASS_TEST_BOOL_NONEXISTENT"));
    }

    #[test]
    fn test_get_var_empty_is_none() {
        env::set_var("ASKPASS_TEST_EMPTY", "");
        assert_eq!(get_var("ASKPASS_TEST_EMPTY"), None);
    }
}
