//! Cross-crate integration tests for ssh-askpass.
