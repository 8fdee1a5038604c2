//! Base producers for the standard catalog.
//!
//! Each producer reads the payload of the event it runs for (or the nearest
//! ancestor's) and emits its files through the execution context.

mod broker;
mod entity;
mod prisma;
pub(crate) mod server;

use std::sync::Arc;

use eyre::{Result, eyre};
use keel_pipeline::{
    ExecutionContext, Handler, Pipeline, catalog, error::RegistryError, handler_fn,
};
use serde::de::DeserializeOwned;

/// `(event, producer)` for every catalog event that has one.
pub fn base_producers() -> Vec<(&'static str, Arc<dyn Handler>)> {
    vec![
        (catalog::CREATE_SERVER, producer(server::server)),
        (catalog::CREATE_SERVER_PACKAGE_JSON, producer(server::package_json)),
        (catalog::CREATE_SERVER_DOT_ENV, producer(server::dot_env)),
        (catalog::CREATE_SERVER_DOCKER_COMPOSE, producer(server::docker_compose)),
        (catalog::CREATE_SERVER_DOCKER_COMPOSE_DB, producer(server::docker_compose_db)),
        (catalog::CREATE_SERVER_AUTH, producer(server::auth_roles)),
        (catalog::CREATE_PRISMA_SCHEMA, producer(prisma::schema)),
        (catalog::CREATE_ENTITY_SERVICE, producer(entity::service)),
        (catalog::CREATE_ENTITY_SERVICE_BASE, producer(entity::service_base)),
        (catalog::CREATE_ENTITY_CONTROLLER, producer(entity::controller)),
        (catalog::CREATE_ENTITY_CONTROLLER_BASE, producer(entity::controller_base)),
        (catalog::CREATE_ENTITY_RESOLVER, producer(entity::resolver)),
        (catalog::CREATE_ENTITY_RESOLVER_BASE, producer(entity::resolver_base)),
        (catalog::CREATE_MESSAGE_BROKER_TOPICS_ENUM, producer(broker::topics_enum)),
        (
            catalog::CREATE_MESSAGE_BROKER_CLIENT_OPTIONS_FACTORY,
            producer(broker::client_options_factory),
        ),
        (catalog::CREATE_MESSAGE_BROKER_NESTJS_MODULE, producer(broker::nestjs_module)),
        (catalog::CREATE_MESSAGE_BROKER_SERVICE, producer(broker::service)),
        (catalog::CREATE_MESSAGE_BROKER_SERVICE_BASE, producer(broker::service_base)),
    ]
}

fn producer<F>(f: F) -> Arc<dyn Handler>
where
    F: Fn(&mut ExecutionContext) -> Result<()> + Send + Sync + 'static,
{
    Arc::new(handler_fn(f))
}

/// Register every base producer on a pipeline built over the standard
/// catalog.
pub fn install(pipeline: &mut Pipeline) -> Result<(), RegistryError> {
    for (event, producer) in base_producers() {
        pipeline.set_producer(event, producer)?;
    }
    Ok(())
}

/// Deserialize the payload the running event sees.
pub(crate) fn input<T: DeserializeOwned>(ctx: &ExecutionContext) -> Result<T> {
    let event = ctx
        .active_event()
        .ok_or_else(|| eyre!("producer invoked outside of a dispatch"))?;
    Ok(ctx.inherited_payload_as(event.as_str())?)
}
