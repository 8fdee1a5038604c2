//! Data model parsing and validation for the keel application generator.
//!
//! A data model describes the application to generate: entities with their
//! fields, relations and permissions, server and auth settings, an optional
//! message broker, and the plugins to enable.
//!
//! ```text
//! keel.toml → keel-schema (DataModel) → keel-codegen (payloads) → keel-pipeline (run)
//! ```

// Miette's derive macro generates code that triggers these warnings
#![allow(unused_assignments)]

mod error;
mod lint;
mod model;
mod validate;

use std::path::Path;

pub use error::{Error, Result, SourceContext};
pub use lint::{
    Diagnostic, EmptyEntityLint, Lint, MissingDescriptionLint, MissingPermissionsLint, Severity,
    default_lints, lint,
};
pub use model::{
    AppConfig, AuthConfig, AuthProvider, DataModel, Database, Entity, Field, FieldType,
    MessageBroker, Permissions, PluginConfig, ServerConfig,
};

/// Default data model filename.
pub const DEFAULT_FILENAME: &str = "keel.toml";

/// Parse a data model from the given path
pub fn parse_file(path: impl AsRef<Path>) -> Result<DataModel> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        Box::new(Error::Io {
            path: path.to_path_buf(),
            source: e,
        })
    })?;
    let filename = path.display().to_string();
    parse_str_with_filename(&content, &filename)
}

/// Parse a data model from a string (uses "keel.toml" as filename)
pub fn parse_str(content: &str) -> Result<DataModel> {
    parse_str_with_filename(content, DEFAULT_FILENAME)
}

/// Parse a data model from a string with a custom filename for error reporting
pub fn parse_str_with_filename(content: &str, filename: &str) -> Result<DataModel> {
    let source = SourceContext::new(content, filename);
    let mut model: DataModel = toml::from_str(content).map_err(|e| source.parse_error(e))?;

    model.resolve();
    validate::validate_model(&model, &source)?;
    Ok(model)
}
