//! Hook and producer handlers.

use async_trait::async_trait;
use eyre::Result;

use crate::ExecutionContext;

/// Work attached to an event: a base producer or a plugin hook.
///
/// Handlers may suspend; the dispatcher awaits each one before starting the
/// next, so a handler always observes every write made before it.
///
/// # Example
///
/// ```ignore
/// struct ServiceProducer;
///
/// #[async_trait]
/// impl Handler for ServiceProducer {
///     async fn invoke(&self, ctx: &mut ExecutionContext) -> eyre::Result<()> {
///         ctx.emit("src/task/task.service.ts", "export class TaskService {}")?;
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Handler: Send + Sync {
    async fn invoke(&self, ctx: &mut ExecutionContext) -> Result<()>;
}

/// Adapter turning a synchronous closure into a [`Handler`].
pub struct FnHandler<F>(F);

#[async_trait]
impl<F> Handler for FnHandler<F>
where
    F: Fn(&mut ExecutionContext) -> Result<()> + Send + Sync,
{
    async fn invoke(&self, ctx: &mut ExecutionContext) -> Result<()> {
        (self.0)(ctx)
    }
}

/// Wrap a closure as a handler.
pub fn handler_fn<F>(f: F) -> FnHandler<F>
where
    F: Fn(&mut ExecutionContext) -> Result<()> + Send + Sync,
{
    FnHandler(f)
}
