//! ssh-askpass command-line interface.

pub mod askpass;
pub mod ui;

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context};
use askpass_core::env::{self, vars};
use askpass_core::error::PreferencesError;
use askpass_core::{classify, Config, Preferences, SettingStore, TransientSettings};
use askpass_secrets::{default_store, CredentialStore};
use clap::error::ErrorKind;
use clap::Parser;
use tracing::{debug, error, info, warn};

pub use askpass::{AskpassSession, Outcome};
use ui::TerminalPresenter;

/// ssh-askpass - passphrase and confirmation helper for SSH agents
///
/// Invoked by ssh, ssh-add or ssh-agent with the prompt text as arguments.
/// Exits 0 (printing the passphrase, if any) when approved, 1 otherwise.
#[derive(Parser)]
#[command(name = "ssh-askpass")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to config file
    #[arg(short, long, env = vars::SSH_ASKPASS_CONFIG)]
    pub config: Option<PathBuf>,

    /// Print how the prompt is classified, as JSON, and exit
    #[arg(long)]
    pub explain: bool,

    /// Delete the stored passphrase for KEY_PATH and exit
    #[arg(long, value_name = "KEY_PATH", conflicts_with = "explain")]
    pub forget: Option<String>,

    /// Prompt text from the agent
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub prompt: Vec<String>,
}

impl Cli {
    /// The prompt as the agent wrote it, words joined by single spaces.
    pub fn prompt_text(&self) -> String {
        self.prompt.join(" ")
    }
}

/// Whether this invocation may use the credential store.
pub fn keychain_enabled(config: &Config) -> bool {
    config.keychain.enabled && !env::get_bool(vars::SSH_ASKPASS_NO_KEYCHAIN)
}

/// Run the CLI with the given arguments.
pub fn run(cli: Cli, config: &Config) -> anyhow::Result<Outcome> {
    if let Some(key_path) = cli.forget.as_deref() {
        return forget(key_path, config);
    }

    let intent = classify(&cli.prompt_text());

    if cli.explain {
        let json = serde_json::to_string_pretty(&intent)?;
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{json}")?;
        return Ok(Outcome::Approved(None));
    }

    let store = keychain_enabled(config).then(default_store);
    let mut settings = open_settings(Preferences::open_default());
    let mut presenter = TerminalPresenter::new();

    let session = AskpassSession::new(
        &intent,
        store.as_deref(),
        settings.as_mut(),
        &mut presenter,
    );
    Ok(session.run())
}

/// The preferences file, or process-local settings when it cannot be located.
fn open_settings(opened: Result<Preferences, PreferencesError>) -> Box<dyn SettingStore> {
    match opened {
        Ok(preferences) => Box::new(preferences),
        Err(e) => {
            warn!("preferences unavailable, choices will not be remembered: {e}");
            Box::new(TransientSettings::new())
        }
    }
}

/// Hand the outcome to the agent: the passphrase, unframed, on `out`, and
/// the exit status.
pub fn emit(outcome: Outcome, out: &mut impl Write) -> ExitCode {
    match outcome {
        Outcome::Approved(passphrase) => {
            if let Some(passphrase) = passphrase {
                if let Err(e) = out.write_all(passphrase.as_bytes()).and_then(|()| out.flush()) {
                    error!("failed to write passphrase: {e}");
                    return ExitCode::FAILURE;
                }
            }
            ExitCode::SUCCESS
        }
        Outcome::Denied => {
            debug!("denied");
            ExitCode::FAILURE
        }
    }
}

/// Exit status for a command line clap rejected. Help and version output
/// succeed; every usage error is a plain failure.
pub fn usage_exit_code(err: &clap::Error) -> ExitCode {
    match err.kind() {
        ErrorKind::DisplayHelp
        | ErrorKind::DisplayVersion
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    }
}

fn forget(key_path: &str, config: &Config) -> anyhow::Result<Outcome> {
    if !keychain_enabled(config) {
        bail!("Keychain integration is disabled");
    }

    let store: Box<dyn CredentialStore> = default_store();
    store
        .delete(key_path)
        .with_context(|| format!("Failed to forget passphrase for {key_path}"))?;

    info!(key_path, "forgot stored passphrase");
    eprintln!("Removed stored passphrase for {key_path}");
    Ok(Outcome::Approved(None))
}
