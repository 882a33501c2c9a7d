//! ssh-askpass entry point.

use std::fs::OpenOptions;
use std::process::ExitCode;
use std::sync::Mutex;

use askpass_cli::{emit, run, usage_exit_code, Cli};
use askpass_core::env::{self, vars};
use askpass_core::paths::expand_tilde;
use askpass_core::Config;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return usage_exit_code(&e);
        }
    };

    // Logging is configured from the config file, so a bad config is only
    // reported once a subscriber exists.
    let (config, config_error) = match Config::load_or_default(cli.config.as_deref())
        .and_then(|config| config.validate().map(|()| config))
    {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };

    init_logging(&config, cli.verbose);
    if let Some(e) = config_error {
        tracing::warn!("ignoring config file: {e}");
    }

    match run(cli, &config) {
        Ok(outcome) => emit(outcome, &mut std::io::stdout().lock()),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("ssh-askpass: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(config: &Config, verbose: u8) {
    let filter = env::get_var(vars::SSH_ASKPASS_LOG)
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(config.logging.level.raised(verbose).as_str()));

    let file = config.logging.file.as_ref().and_then(|path| {
        let path = expand_tilde(&path.to_string_lossy());
        match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => Some(file),
            Err(e) => {
                eprintln!("ssh-askpass: cannot open log file {}: {e}", path.display());
                None
            }
        }
    });

    // stdout carries the passphrase, so logs go to the file or stderr.
    let (file_layer, stderr_layer) = match file {
        Some(file) => (
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            ),
            None,
        ),
        None => (
            None,
            Some(tracing_subscriber::fmt::layer().with_writer(std::io::stderr)),
        ),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .init();
}
