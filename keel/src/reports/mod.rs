//! Report data structures for commands.
//!
//! Operations build reports, commands render them to an [`Output`].

mod check;
mod generate;
mod info;
mod output;

pub use check::CheckReport;
pub use generate::{GenerateReport, GenerationResult, PreviewFile, WrittenResult};
pub use info::{BrokerInfo, EntityInfo, InfoReport};
pub use output::{Report, TerminalOutput};
