pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod health;
pub mod models;
pub mod report;

use std::io;
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::client::Kubectl;
use crate::commands::{usage, Dispatcher};
use crate::config::Settings;
use crate::error::{Error, ErrorKind, Result};
use crate::report::Reporter;

/// `log` records are routed through tracing-subscriber to stderr, filtered by
/// `RUST_LOG` (default `warn`).
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

/// Resolves configuration, then dispatches `command` on a single-threaded
/// runtime. Configuration comes first for every command, `help` included.
fn execute(cli: &Cli, command: &str) -> Result<()> {
    let settings = Settings::from_cli(cli)?;
    log::debug!("settings: {settings:?}");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let client = Kubectl::new(&settings);
    let mut reporter = Reporter::new(io::stdout(), settings.format);
    runtime.block_on(async {
        Dispatcher::new(&client, &settings, &mut reporter)
            .dispatch(command, &cli.args)
            .await
    })
}

fn report_failure(err: &Error) -> ExitCode {
    log::debug!("failed ({}): {err:?}", err.kind());
    eprintln!("Error: {err}");
    if err.kind() == ErrorKind::Usage {
        eprint!("\n{}", usage());
    }
    ExitCode::from(err.exit_code())
}

pub fn run() -> ExitCode {
    init_logging();
    let cli = match Cli::parse_args(std::env::args_os()) {
        Ok(cli) => cli,
        Err(e) => return report_failure(&e),
    };

    let Some(command) = cli.command.as_deref() else {
        print!("{}", usage());
        return ExitCode::from(1);
    };

    match execute(&cli, command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report_failure(&e),
    }
}
