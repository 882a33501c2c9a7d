//! User-facing prompts.
//!
//! The askpass session talks to the user only through [`Presenter`], so the
//! decision logic can be driven by a terminal, a GUI, or a scripted fake in
//! tests. stdout is reserved for the passphrase handed back to the agent;
//! presenters must never write to it.

use std::io;

use askpass_core::Passphrase;
use console::{style, Term};

/// State of the "remember in keychain" option in the passphrase dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RememberOption {
    /// Shown unchecked and greyed out: no key path, or no credential store.
    Disabled,
    /// Offered, initially checked when `default` is true.
    Enabled { default: bool },
}

/// What the user entered in the passphrase dialog.
#[derive(Debug)]
pub struct PassphraseResponse {
    pub passphrase: Passphrase,
    /// Final state of the remember option; always false when it was disabled.
    pub remember: bool,
}

/// The presentation layer.
pub trait Presenter {
    /// Ask for a passphrase. `Ok(None)` means the user cancelled.
    fn ask_passphrase(
        &mut self,
        message: &str,
        remember: RememberOption,
    ) -> io::Result<Option<PassphraseResponse>>;

    /// Ask the user to approve or deny a key use.
    fn confirm(&mut self, message: &str) -> io::Result<bool>;

    /// Ask a yes/no question whose affirmative button reads `ok_label`.
    fn ask(&mut self, title: &str, detail: &str, ok_label: &str) -> io::Result<bool>;

    /// Report a non-fatal error.
    fn show_error(&mut self, title: &str, detail: &str);
}

/// Interprets a yes/no answer. Empty input selects `default`.
fn parse_answer(input: &str, default: bool) -> Option<bool> {
    match input.trim().to_lowercase().as_str() {
        "" => Some(default),
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

/// Presenter for a controlling terminal.
///
/// Messages go to stderr; the passphrase is read without echo from the TTY.
pub struct TerminalPresenter {
    term: Term,
}

impl TerminalPresenter {
    pub fn new() -> Self {
        Self {
            term: Term::stderr(),
        }
    }

    fn yes_no(&self, question: &str, default: bool) -> io::Result<bool> {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        loop {
            self.term.write_str(&format!("{question} {hint} "))?;
            let line = self.term.read_line()?;
            match parse_answer(&line, default) {
                Some(answer) => return Ok(answer),
                None => self.term.write_line("Please answer 'y' or 'n'.")?,
            }
        }
    }
}

impl Default for TerminalPresenter {
    fn default() -> Self {
        Self::new()
    }
}

impl Presenter for TerminalPresenter {
    fn ask_passphrase(
        &mut self,
        message: &str,
        remember: RememberOption,
    ) -> io::Result<Option<PassphraseResponse>> {
        let input = match rpassword::prompt_password(message) {
            Ok(input) => input,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e),
        };
        let passphrase = Passphrase::new(input);

        let remember = match remember {
            RememberOption::Disabled => false,
            RememberOption::Enabled { default } => {
                self.yes_no("Remember passphrase in keychain?", default)?
            }
        };

        Ok(Some(PassphraseResponse {
            passphrase,
            remember,
        }))
    }

    fn confirm(&mut self, message: &str) -> io::Result<bool> {
        self.term.write_line(message.trim_end())?;
        self.yes_no("Allow?", false)
    }

    fn ask(&mut self, title: &str, detail: &str, ok_label: &str) -> io::Result<bool> {
        self.term
            .write_line(&format!("{} {}", style(title).bold(), detail))?;
        self.yes_no(&format!("{ok_label}?"), false)
    }

    fn show_error(&mut self, title: &str, detail: &str) {
        let _ = self
            .term
            .write_line(&format!("{} {}", style(format!("{title}:")).red(), detail));
    }
}
