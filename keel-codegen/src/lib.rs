//! Code assembly for the keel application generator.
//!
//! This crate renders a NestJS + Prisma server from a [`keel_schema::DataModel`]:
//!
//! - [`producers`]: the base producer of every catalog event
//! - [`plugins`]: built-in plugins enabled from `[plugins.<id>]` tables
//! - [`Generator`]: seeds typed payloads ([`inputs`]) and runs the pipeline
//! - [`CodeBuilder`]: the fluent text builder every renderer uses

mod code_builder;
pub mod error;
mod generator;
pub mod inputs;
pub mod plugins;
pub mod producers;

pub use code_builder::{CodeBuilder, Indent};
pub use error::{CodegenError, Result};
pub use generator::{Generator, SRC_DIR};
