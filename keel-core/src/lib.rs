//! Core utilities and types for the keel application generator.
//!
//! This crate provides fundamental utilities used across the keel
//! workspace: identifier case conversion and the artifact writer that
//! materialises a generation run on disk.

mod naming;
mod writer;

// String utilities
pub use naming::{
    pluralize, split_words, to_camel_case, to_constant_case, to_kebab_case, to_pascal_case,
    to_snake_case, toml_value_to_string,
};
// File output
pub use writer::{ArtifactWriter, Overwrite, WriteError, WriteResult, WriteStats};
