use std::path::PathBuf;

use clap::Args;
use eyre::Result;

use super::UnwrapOrExit;
use crate::{
    ops,
    reports::{Report, TerminalOutput},
};

#[derive(Args)]
pub struct CheckCommand {
    /// Path to the data model (defaults to ./keel.toml)
    #[arg(short, long, default_value = keel_schema::DEFAULT_FILENAME)]
    pub schema: PathBuf,
}

impl CheckCommand {
    pub fn run(&self) -> Result<()> {
        let model = keel_schema::parse_file(&self.schema).unwrap_or_exit();

        let report = ops::check(&model, &self.schema);
        report.render(&mut TerminalOutput::new());

        Ok(())
    }
}
