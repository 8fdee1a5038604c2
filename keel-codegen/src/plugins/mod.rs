//! Built-in plugins, enabled by id from `[plugins.<id>]` tables.

mod db_mysql;
mod dotenv;
mod graphql_only;
mod grpc;

pub use db_mysql::DbMysql;
pub use dotenv::DotEnv;
pub use graphql_only::GraphqlOnly;
pub use grpc::Grpc;

use keel_pipeline::{ExecutionContext, Plugin};
use keel_schema::PluginConfig;
use serde::{Serialize, de::DeserializeOwned};

use crate::error::{CodegenError, Result};

/// Ids accepted in `[plugins.<id>]`.
pub const BUILTIN: &[&str] = &["graphql-only", "db-mysql", "dotenv", "grpc"];

/// Build the built-in plugin `id` from its configuration table.
///
/// # Errors
///
/// [`CodegenError::UnknownPlugin`] for an id not in [`BUILTIN`], or
/// [`CodegenError::InvalidPluginConfig`] when the table doesn't fit the
/// plugin.
pub fn builtin(id: &str, config: &PluginConfig) -> Result<Box<dyn Plugin>> {
    let plugin: Box<dyn Plugin> = match id {
        "graphql-only" => Box::new(GraphqlOnly),
        "db-mysql" => Box::new(DbMysql),
        "dotenv" => Box::new(DotEnv::from_config(config)?),
        "grpc" => Box::new(Grpc::from_config(config)?),
        _ => return Err(CodegenError::UnknownPlugin { id: id.to_string() }),
    };
    Ok(plugin)
}

/// Rewrite the payload set on `event` in place.
pub(crate) fn update_payload<T, F>(
    ctx: &mut ExecutionContext,
    event: &str,
    f: F,
) -> eyre::Result<()>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce(&mut T),
{
    let mut value: T = ctx.payload_as(event)?;
    f(&mut value);
    ctx.set_payload_from(event, &value)?;
    Ok(())
}
