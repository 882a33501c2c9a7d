//! Passphrase handling with memory protection.

use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A key passphrase that is zeroed on drop.
///
/// `Debug` and `Display` never print the value, so a passphrase can sit in
/// structs that get logged.
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct Passphrase {
    inner: String,
}

impl Passphrase {
    /// Wrap a passphrase.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            inner: value.into(),
        }
    }

    /// Decode raw secret bytes returned by a credential store.
    ///
    /// Returns `None` when the bytes are not valid UTF-8. The input buffer is
    /// zeroed either way.
    pub fn from_utf8(mut bytes: Vec<u8>) -> Option<Self> {
        let decoded = std::str::from_utf8(&bytes).ok().map(Self::new);
        bytes.zeroize();
        decoded
    }

    /// Expose the passphrase.
    ///
    /// Use sparingly - only when the value is written to the agent or the store.
    pub fn expose(&self) -> &str {
        &self.inner
    }

    /// The passphrase as bytes, for credential store payloads.
    pub fn as_bytes(&self) -> &[u8] {
        self.inner.as_bytes()
    }
}

impl fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for Passphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl PartialEq for Passphrase {
    fn eq(&self, other: &Self) -> bool {
        constant_time_eq(self.inner.as_bytes(), other.inner.as_bytes())
    }
}

impl Eq for Passphrase {}

impl From<String> for Passphrase {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for Passphrase {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
