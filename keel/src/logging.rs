//! Diagnostic logging to stderr.
//!
//! `KEEL_LOG` takes precedence over `--log-level` and accepts full
//! `EnvFilter` directives (`keel_pipeline=debug,warn`).

use clap::{Args, ValueEnum};
use eyre::{Result, eyre};
use tracing_subscriber::EnvFilter;

pub const ENV_VAR: &str = "KEEL_LOG";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Args)]
pub struct LogArgs {
    /// Log level or filter directives, overridden by KEEL_LOG
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// Log line format
    #[arg(long, global = true, value_enum, default_value_t)]
    pub log_format: LogFormat,
}

pub fn init(args: &LogArgs) -> Result<()> {
    let filter = match EnvFilter::try_from_env(ENV_VAR) {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&args.log_level)
            .map_err(|e| eyre!("invalid --log-level '{}': {e}", args.log_level))?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    let installed = match args.log_format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| eyre!("failed to install the log subscriber: {e}"))
}
