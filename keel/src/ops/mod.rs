//! Operations behind the commands.
//!
//! Each operation takes a parsed data model and returns a report; nothing
//! here prints.

mod check;
mod generate;
mod info;

pub use check::check;
pub use generate::{GenerateOptions, generate};
pub use info::info;
