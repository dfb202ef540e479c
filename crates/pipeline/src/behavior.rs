//! Cross-cutting middleware around handlers.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{PipelineError, Result};
use crate::handler::RequestHandler;
use crate::request::{Request, RequestContext, RequestState};

/// Middleware wrapping the rest of a pipeline.
///
/// A behavior receives the remaining chain as a [`Next`] continuation.
/// Not running it short-circuits the dispatch; running it proceeds through
/// the remaining behaviors to the handler. `Next::run` consumes the
/// continuation, so it can run at most once.
#[async_trait]
pub trait Behavior<R: Request>: Send + Sync {
    async fn handle(
        &self,
        request: R,
        ctx: &RequestContext,
        next: Next<'_, R>,
    ) -> Result<R::Response>;
}

/// The remainder of a pipeline: the behaviors not yet entered and the handler.
pub struct Next<'a, R: Request> {
    behaviors: &'a [Arc<dyn Behavior<R>>],
    handler: &'a dyn RequestHandler<R>,
    ctx: &'a RequestContext,
}

impl<'a, R: Request> Next<'a, R> {
    pub(crate) fn new(
        behaviors: &'a [Arc<dyn Behavior<R>>],
        handler: &'a dyn RequestHandler<R>,
        ctx: &'a RequestContext,
    ) -> Self {
        Self {
            behaviors,
            handler,
            ctx,
        }
    }

    /// Number of behaviors left before the handler.
    pub fn remaining(&self) -> usize {
        self.behaviors.len()
    }

    /// Runs the next stage.
    ///
    /// Cancellation is checked before every stage; a cancelled dispatch
    /// stops here with [`PipelineError::Cancelled`].
    pub async fn run(self, request: R) -> Result<R::Response> {
        if self.ctx.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        match self.behaviors.split_first() {
            Some((behavior, rest)) => {
                let next = Next::new(rest, self.handler, self.ctx);
                behavior.handle(request, self.ctx, next).await
            }
            None => {
                self.ctx.advance(RequestState::Executing);
                self.handler.handle(request, self.ctx).await
            }
        }
    }
}
