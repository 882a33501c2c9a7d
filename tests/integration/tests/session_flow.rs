//! End-to-end session tests.
//!
//! Drive [`AskpassSession`] across a sequence of agent prompts with a real
//! preferences file and the in-memory credential store, the way ssh-add would
//! invoke the helper repeatedly.

use std::collections::VecDeque;
use std::io;

use askpass_cli::ui::{PassphraseResponse, Presenter, RememberOption};
use askpass_cli::{AskpassSession, Outcome};
use askpass_core::{classify, Passphrase, Preferences, SettingStore, USE_KEYCHAIN};
use askpass_secrets::{CredentialStore, MemoryCredentialStore};
use tempfile::TempDir;

const KEY: &str = "/Users/a/.ssh/id_ed25519";

/// What the user does at each passphrase dialog.
enum Reply {
    Enter(&'static str, Option<bool>),
    Cancel,
}

#[derive(Default)]
struct User {
    replies: VecDeque<Reply>,
    approve: bool,
    dialogs: usize,
    offered: Vec<RememberOption>,
    errors: Vec<String>,
}

impl User {
    fn replying(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: replies.into_iter().collect(),
            ..Default::default()
        }
    }
}

impl Presenter for User {
    fn ask_passphrase(
        &mut self,
        _message: &str,
        remember: RememberOption,
    ) -> io::Result<Option<PassphraseResponse>> {
        self.dialogs += 1;
        self.offered.push(remember);
        match self.replies.pop_front() {
            Some(Reply::Enter(passphrase, toggle)) => {
                let remember = match remember {
                    RememberOption::Disabled => false,
                    RememberOption::Enabled { default } => toggle.unwrap_or(default),
                };
                Ok(Some(PassphraseResponse {
                    passphrase: Passphrase::new(passphrase),
                    remember,
                }))
            }
            Some(Reply::Cancel) | None => Ok(None),
        }
    }

    fn confirm(&mut self, _message: &str) -> io::Result<bool> {
        Ok(self.approve)
    }

    fn ask(&mut self, _title: &str, _detail: &str, _ok_label: &str) -> io::Result<bool> {
        Ok(true)
    }

    fn show_error(&mut self, title: &str, detail: &str) {
        self.errors.push(format!("{title}: {detail}"));
    }
}

fn invoke(
    prompt: &str,
    store: &dyn CredentialStore,
    prefs: &mut Preferences,
    user: &mut User,
) -> Outcome {
    let intent = classify(prompt);
    AskpassSession::new(&intent, Some(store), prefs, user).run()
}

fn enter_prompt() -> String {
    format!("Enter passphrase for {KEY}: ")
}

fn bad_prompt() -> String {
    format!("Bad passphrase, try again for {KEY}: ")
}

#[test]
fn test_remembered_passphrase_reused_on_next_invocation() {
    let dir = TempDir::new().unwrap();
    let prefs_path = dir.path().join("preferences.json");
    let store = MemoryCredentialStore::new();

    let mut prefs = Preferences::open(&prefs_path);
    let mut user = User::replying([Reply::Enter("correct horse", Some(true))]);
    let first = invoke(&enter_prompt(), &store, &mut prefs, &mut user);
    assert_eq!(first, Outcome::Approved(Some(Passphrase::new("correct horse"))));
    assert_eq!(user.dialogs, 1);

    // A fresh process: preferences are re-read from disk.
    let mut prefs = Preferences::open(&prefs_path);
    assert_eq!(prefs.get_bool(USE_KEYCHAIN), Some(true));
    let mut user = User::default();
    let second = invoke(&enter_prompt(), &store, &mut prefs, &mut user);
    assert_eq!(second, Outcome::Approved(Some(Passphrase::new("correct horse"))));
    assert_eq!(user.dialogs, 0);
}

#[test]
fn test_wrong_stored_passphrase_is_replaced_after_retry() {
    let dir = TempDir::new().unwrap();
    let mut prefs = Preferences::open(dir.path().join("preferences.json"));
    let store = MemoryCredentialStore::new();
    store.add(KEY, &Passphrase::new("stale")).unwrap();

    // The agent rejects the stored value and asks again.
    let mut user = User::replying([Reply::Enter("fresh", Some(true))]);
    let outcome = invoke(&bad_prompt(), &store, &mut prefs, &mut user);
    assert_eq!(outcome, Outcome::Approved(Some(Passphrase::new("fresh"))));
    assert!(user.errors.is_empty());
    assert_eq!(store.get(KEY).unwrap().unwrap().expose(), "fresh");
    assert_eq!(store.len(), 1);
}

#[test]
fn test_cancel_after_failed_attempt_leaves_store_empty() {
    let dir = TempDir::new().unwrap();
    let mut prefs = Preferences::open(dir.path().join("preferences.json"));
    let store = MemoryCredentialStore::new();
    store.add(KEY, &Passphrase::new("stale")).unwrap();

    let mut user = User::replying([Reply::Cancel]);
    let outcome = invoke(&bad_prompt(), &store, &mut prefs, &mut user);
    assert_eq!(outcome, Outcome::Denied);
    assert!(store.is_empty());
}

#[test]
fn test_remember_default_follows_last_choice() {
    let dir = TempDir::new().unwrap();
    let mut prefs = Preferences::open(dir.path().join("preferences.json"));
    let store = MemoryCredentialStore::new();

    let mut user = User::replying([
        Reply::Enter("one", Some(true)),
        Reply::Enter("two", Some(false)),
        Reply::Enter("three", None),
    ]);
    invoke(&enter_prompt(), &store, &mut prefs, &mut user);
    store.delete(KEY).unwrap();
    invoke(&enter_prompt(), &store, &mut prefs, &mut user);
    invoke(&enter_prompt(), &store, &mut prefs, &mut user);

    assert_eq!(
        user.offered,
        vec![
            RememberOption::Enabled { default: false },
            RememberOption::Enabled { default: true },
            RememberOption::Enabled { default: false },
        ]
    );
    assert!(store.is_empty());
}

#[test]
fn test_confirmation_never_touches_store() {
    let dir = TempDir::new().unwrap();
    let mut prefs = Preferences::open(dir.path().join("preferences.json"));
    let store = MemoryCredentialStore::new();
    store.add(KEY, &Passphrase::new("stored")).unwrap();

    let mut user = User {
        approve: true,
        ..Default::default()
    };
    let outcome = invoke(&format!("Allow use of key {KEY}?"), &store, &mut prefs, &mut user);
    assert_eq!(outcome, Outcome::Approved(None));
    assert_eq!(user.dialogs, 0);
    assert_eq!(store.len(), 1);

    user.approve = false;
    let outcome = invoke(
        &format!("Add key {KEY} (me@host) to agent?"),
        &store,
        &mut prefs,
        &mut user,
    );
    assert_eq!(outcome, Outcome::Denied);
}

#[test]
fn test_confirm_each_use_suffix_shares_stored_item() {
    let dir = TempDir::new().unwrap();
    let mut prefs = Preferences::open(dir.path().join("preferences.json"));
    let store = MemoryCredentialStore::new();
    store.add(KEY, &Passphrase::new("stored")).unwrap();

    let mut user = User::default();
    let outcome = invoke(
        &format!("Enter passphrase for {KEY} (will confirm each use): "),
        &store,
        &mut prefs,
        &mut user,
    );
    assert_eq!(outcome, Outcome::Approved(Some(Passphrase::new("stored"))));
    assert_eq!(user.dialogs, 0);
}
