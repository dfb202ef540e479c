//! Request-type registry and dispatch.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use common::Actor;
use validator::Validate;

use crate::behavior::{Behavior, Next};
use crate::error::{PipelineError, Result};
use crate::handler::RequestHandler;
use crate::request::{Request, RequestContext, RequestState};
use crate::unhandled::UnhandledExceptionBehavior;
use crate::validation::ValidationBehavior;

/// The ordered behaviors and the handler configured for one request type.
pub struct Pipeline<R: Request> {
    behaviors: Vec<Arc<dyn Behavior<R>>>,
    handler: Arc<dyn RequestHandler<R>>,
}

impl<R: Request> Clone for Pipeline<R> {
    fn clone(&self) -> Self {
        Self {
            behaviors: self.behaviors.clone(),
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<R: Request> Pipeline<R> {
    /// Creates a pipeline with no behaviors.
    pub fn new(handler: impl RequestHandler<R> + 'static) -> Self {
        Self {
            behaviors: Vec::new(),
            handler: Arc::new(handler),
        }
    }

    /// Appends a behavior. Behaviors run in the order they are added, the
    /// first one outermost.
    pub fn with_behavior(mut self, behavior: impl Behavior<R> + 'static) -> Self {
        self.behaviors.push(Arc::new(behavior));
        self
    }

    /// Number of behaviors in front of the handler.
    pub fn behavior_count(&self) -> usize {
        self.behaviors.len()
    }

    /// Runs the request through the behaviors and the handler.
    pub async fn dispatch(&self, request: R, ctx: &RequestContext) -> Result<R::Response> {
        Next::new(&self.behaviors, self.handler.as_ref(), ctx)
            .run(request)
            .await
    }
}

impl<R: Request + Validate> Pipeline<R> {
    /// The default chain: unhandled-exception behavior outermost, then
    /// validation, then the handler.
    pub fn standard(handler: impl RequestHandler<R> + 'static) -> Self {
        Self::new(handler)
            .with_behavior(UnhandledExceptionBehavior)
            .with_behavior(ValidationBehavior)
    }
}

/// Builder collecting one pipeline per request type.
pub struct MediatorBuilder {
    pipelines: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
    default_actor: Actor,
}

impl Default for MediatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MediatorBuilder {
    pub fn new() -> Self {
        Self {
            pipelines: HashMap::new(),
            default_actor: Actor::system(),
        }
    }

    /// Actor used by [`Mediator::send`] when the caller supplies no context.
    pub fn default_actor(mut self, actor: Actor) -> Self {
        self.default_actor = actor;
        self
    }

    /// Registers a handler behind the standard behaviors.
    ///
    /// Registering the same request type again replaces the earlier pipeline.
    pub fn register<R>(self, handler: impl RequestHandler<R> + 'static) -> Self
    where
        R: Request + Validate,
    {
        self.register_pipeline(Pipeline::standard(handler))
    }

    /// Registers a fully configured pipeline.
    pub fn register_pipeline<R: Request>(mut self, pipeline: Pipeline<R>) -> Self {
        self.pipelines.insert(TypeId::of::<R>(), Box::new(pipeline));
        self
    }

    pub fn build(self) -> Mediator {
        Mediator {
            pipelines: Arc::new(self.pipelines),
            default_actor: self.default_actor,
        }
    }
}

/// Typed dispatcher resolving the pipeline registered for a request type.
///
/// Registration happens once through [`MediatorBuilder`]; the mediator is
/// cheap to clone and shares its registry.
#[derive(Clone)]
pub struct Mediator {
    pipelines: Arc<HashMap<TypeId, Box<dyn Any + Send + Sync>>>,
    default_actor: Actor,
}

impl Mediator {
    pub fn builder() -> MediatorBuilder {
        MediatorBuilder::new()
    }

    /// Returns true if a pipeline is registered for `R`.
    pub fn handles<R: Request>(&self) -> bool {
        self.pipeline::<R>().is_some()
    }

    pub fn default_actor(&self) -> &Actor {
        &self.default_actor
    }

    fn pipeline<R: Request>(&self) -> Option<&Pipeline<R>> {
        self.pipelines
            .get(&TypeId::of::<R>())
            .and_then(|pipeline| pipeline.downcast_ref::<Pipeline<R>>())
    }

    /// Dispatches a request on behalf of the default actor.
    pub async fn send<R: Request>(&self, request: R) -> Result<R::Response> {
        let ctx = RequestContext::new(self.default_actor.clone());
        self.send_with(request, &ctx).await
    }

    /// Dispatches a request with a caller-supplied context.
    ///
    /// The context settles to exactly one terminal state. A request type with
    /// no registered pipeline is a programming error and surfaces as
    /// [`PipelineError::Unhandled`].
    #[tracing::instrument(
        skip_all,
        fields(request = R::NAME, correlation_id = %ctx.correlation_id())
    )]
    pub async fn send_with<R: Request>(
        &self,
        request: R,
        ctx: &RequestContext,
    ) -> Result<R::Response> {
        let started = Instant::now();

        let outcome = match self.pipeline::<R>() {
            Some(pipeline) => pipeline.dispatch(request, ctx).await,
            None => {
                tracing::error!(request = R::NAME, "No handler registered for request");
                Err(PipelineError::Unhandled {
                    request: R::NAME,
                    correlation_id: ctx.correlation_id(),
                })
            }
        };

        let state = ctx.settle(match &outcome {
            Ok(_) => RequestState::Completed,
            Err(PipelineError::Validation(_)) => RequestState::Rejected,
            Err(PipelineError::Cancelled) => RequestState::Cancelled,
            Err(_) => RequestState::Faulted,
        });

        metrics::counter!(
            "pipeline_requests_total",
            "request" => R::NAME,
            "outcome" => state.as_str()
        )
        .increment(1);
        metrics::histogram!("pipeline_request_duration_seconds", "request" => R::NAME)
            .record(started.elapsed().as_secs_f64());

        tracing::debug!(%state, "Request settled");
        outcome
    }
}
