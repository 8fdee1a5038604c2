mod check;
mod completions;
mod events;
mod generate;
mod info;

use check::CheckCommand;
use clap::{Parser, Subcommand};
use completions::CompletionsCommand;
use events::EventsCommand;
use eyre::Result;
use generate::GenerateCommand;
use info::InfoCommand;

use crate::logging::LogArgs;

/// Extension trait for exiting on data model errors with pretty formatting
pub(crate) trait UnwrapOrExit<T> {
    fn unwrap_or_exit(self) -> T;
}

impl<T> UnwrapOrExit<T> for keel_schema::Result<T> {
    fn unwrap_or_exit(self) -> T {
        match self {
            Ok(v) => v,
            Err(e) => {
                eprintln!("{:?}", miette::Report::new(*e));
                std::process::exit(1);
            }
        }
    }
}

#[derive(Parser)]
#[command(name = "keel")]
#[command(version)]
#[command(about = "Generate backend services from a TOML data model")]
pub(crate) struct Cli {
    #[command(flatten)]
    pub log: LogArgs,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    pub async fn run(&self) -> Result<()> {
        match &self.command {
            Commands::Generate(cmd) => cmd.run().await,
            Commands::Check(cmd) => cmd.run(),
            Commands::Events(cmd) => cmd.run(),
            Commands::Info(cmd) => cmd.run(),
            Commands::Completions(cmd) => cmd.run(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the server from keel.toml
    Generate(GenerateCommand),

    /// Validate keel.toml without generating code
    Check(CheckCommand),

    /// Print the generation event catalog
    Events(EventsCommand),

    /// Show data model information
    Info(InfoCommand),

    /// Generate shell completions
    Completions(CompletionsCommand),
}
