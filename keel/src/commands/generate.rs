use std::path::PathBuf;

use clap::Args;
use eyre::Result;

use super::UnwrapOrExit;
use crate::{
    ops::{self, GenerateOptions},
    reports::{Report, TerminalOutput},
};

#[derive(Args)]
pub struct GenerateCommand {
    /// Path to the data model (defaults to ./keel.toml)
    #[arg(short, long, default_value = keel_schema::DEFAULT_FILENAME)]
    pub schema: PathBuf,

    /// Output directory (defaults to current directory)
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,

    /// Preview generated files without writing to disk
    #[arg(long)]
    pub dry_run: bool,

    /// Write a JSON snapshot per event to .keel/debug/ (ignored with --dry-run)
    #[arg(long)]
    pub visualize: bool,

    /// Keep files that already exist in the output directory
    #[arg(long)]
    pub no_overwrite: bool,

    /// Write the generated files even if some hooks failed
    #[arg(long)]
    pub allow_partial: bool,
}

impl GenerateCommand {
    pub async fn run(&self) -> Result<()> {
        let model = keel_schema::parse_file(&self.schema).unwrap_or_exit();

        let report = ops::generate(
            &model,
            GenerateOptions {
                output_dir: &self.output,
                dry_run: self.dry_run,
                visualize: self.visualize,
                no_overwrite: self.no_overwrite,
                allow_partial: self.allow_partial,
            },
        )
        .await?;
        report.render(&mut TerminalOutput::new());

        if !report.is_clean() && !self.allow_partial {
            std::process::exit(1);
        }
        Ok(())
    }
}
