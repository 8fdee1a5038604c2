//! Errors raised while assembling a generation run.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("unknown plugin '{id}' (built-in plugins: {})", crate::plugins::BUILTIN.join(", "))]
    UnknownPlugin { id: String },

    #[error("invalid configuration for plugin '{plugin}': {message}")]
    InvalidPluginConfig { plugin: String, message: String },

    #[error(transparent)]
    Pipeline(#[from] keel_pipeline::Error),
}

impl From<keel_pipeline::error::RegistryError> for CodegenError {
    fn from(err: keel_pipeline::error::RegistryError) -> Self {
        Self::Pipeline(err.into())
    }
}

impl From<keel_pipeline::error::SubscribeError> for CodegenError {
    fn from(err: keel_pipeline::error::SubscribeError) -> Self {
        Self::Pipeline(err.into())
    }
}

impl From<keel_pipeline::error::ContextError> for CodegenError {
    fn from(err: keel_pipeline::error::ContextError) -> Self {
        Self::Pipeline(err.into())
    }
}

pub type Result<T, E = CodegenError> = std::result::Result<T, E>;
