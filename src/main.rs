#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! akshare-cli — call any registered financial-data function from the CLI.

mod cli;
mod commands;
mod config;
mod registry;
mod sources;
mod types;

use tracing_subscriber::EnvFilter;

use cli::args::utf8_args;
use cli::{Invocation, write_error};
use config::Config;
use registry::InvokeError;

/// Environment variable holding the tracing filter directive.
const LOG_ENV: &str = "AKSHARE_CLI_LOG";

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run() -> Result<commands::Printed, InvokeError> {
    let argv = utf8_args(std::env::args_os().skip(1))?;
    let invocation = Invocation::from_argv(&argv);
    let catalog = sources::builtin_catalog();
    commands::dispatch(&invocation, &catalog, Config::from_env)
}

fn main() {
    init_logging();

    match run() {
        Ok(printed) => {
            println!("{}", printed.text);
            std::process::exit(printed.exit_code);
        }
        Err(err) => {
            tracing::debug!(code = err.code(), "invocation failed");
            write_error(&err);
            std::process::exit(1);
        }
    }
}
