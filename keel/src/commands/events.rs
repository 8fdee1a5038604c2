use clap::Args;
use eyre::{Context, Result};
use keel_pipeline::catalog;

#[derive(Args)]
pub struct EventsCommand {
    /// Print one event name per line instead of the tree
    #[arg(long)]
    pub flat: bool,
}

impl EventsCommand {
    pub fn run(&self) -> Result<()> {
        if self.flat {
            for event in catalog::event_names() {
                println!("{event}");
            }
            return Ok(());
        }

        let registry = catalog::standard().wrap_err("Invalid event catalog")?;
        println!("Event catalog v{} ({} events)\n", catalog::CATALOG_VERSION, registry.len());
        print!("{}", registry.tree());
        Ok(())
    }
}
