use keel_pipeline::{Hooks, Plugin, catalog, error::SubscribeError, handler_fn};

/// Drops the REST controllers, leaving the GraphQL resolvers.
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphqlOnly;

impl Plugin for GraphqlOnly {
    fn name(&self) -> &str {
        "graphql-only"
    }

    fn subscribe(&self, hooks: &mut Hooks<'_>) -> Result<(), SubscribeError> {
        for event in [
            catalog::CREATE_ENTITY_CONTROLLER,
            catalog::CREATE_ENTITY_CONTROLLER_BASE,
        ] {
            hooks.before(
                event,
                handler_fn(move |ctx| {
                    ctx.skip(event)?;
                    Ok(())
                }),
            )?;
        }
        Ok(())
    }
}
