//! Prompt classification.
//!
//! SSH agents pass a free-form prompt to the askpass program. The phrasings
//! are fixed by OpenSSH (`ssh-add` / `ssh-agent`), so a small ordered table of
//! anchored regular expressions is enough to recover what is being asked and
//! which private key it concerns.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// What the agent is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptKind {
    /// The agent needs the passphrase for a key.
    Prompt,
    /// The previous passphrase was rejected and the agent is asking again.
    FailedAttempt,
    /// The agent only needs an approve/deny decision.
    Confirmation,
}

/// The structured intent recovered from a prompt string.
///
/// Built once per invocation by [`classify`] and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptIntent {
    /// Prompt type.
    pub kind: PromptKind,

    /// Key path captured from the prompt, verbatim. Empty when no rule matched.
    pub key_path: String,

    /// The raw prompt text, shown to the user as-is.
    pub message: String,
}

impl PromptIntent {
    /// True when only approve/deny should be offered.
    pub fn requires_confirmation_only(&self) -> bool {
        self.kind == PromptKind::Confirmation
    }

    /// True when the agent rejected the previous passphrase.
    pub fn is_failed_attempt(&self) -> bool {
        self.kind == PromptKind::FailedAttempt
    }

    /// True when one of the known phrasings matched.
    pub fn is_recognized(&self) -> bool {
        !self.key_path.is_empty()
    }
}

/// Classification rules in priority order.
///
/// The `(will confirm each use)` suffix is added by `ssh-add -c` and is not
/// part of the key path.
static RULES: Lazy<Vec<(Regex, PromptKind)>> = Lazy::new(|| {
    [
        (
            r"^Enter passphrase for (.*?)( \(will confirm each use\))?: $",
            PromptKind::Prompt,
        ),
        (
            r"^Bad passphrase, try again for (.*?)( \(will confirm each use\))?: $",
            PromptKind::FailedAttempt,
        ),
        // ssh-agent appends the key fingerprint on a second line.
        (r"^Allow use of key (.*)\?", PromptKind::Confirmation),
        (r"^Add key (.*) \(.*\) to agent\?$", PromptKind::Confirmation),
    ]
    .into_iter()
    .map(|(pattern, kind)| (Regex::new(pattern).expect("invalid prompt pattern"), kind))
    .collect()
});

/// Classify a prompt string.
///
/// Rules are tried in order and the first one that matches decides the
/// intent; later rules are never consulted. Text that matches no rule yields
/// a [`PromptKind::Prompt`] intent with an empty key path, which callers must
/// treat as "no key-specific behaviour". Classification never fails.
pub fn classify(message: &str) -> PromptIntent {
    let matched = RULES.iter().find_map(|(regex, kind)| {
        regex
            .captures(message)
            .and_then(|caps| caps.get(1))
            .map(|key_path| (*kind, key_path.as_str().to_string()))
    });

    let (kind, key_path) = matched.unwrap_or((PromptKind::Prompt, String::new()));

    PromptIntent {
        kind,
        key_path,
        message: message.to_string(),
    }
}
