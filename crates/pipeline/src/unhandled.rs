use std::any::Any;
use std::panic::AssertUnwindSafe;

use async_trait::async_trait;
use futures_util::FutureExt;

use crate::behavior::{Behavior, Next};
use crate::error::{PipelineError, Result};
use crate::request::{Request, RequestContext};

/// Reduces unexpected failures to [`PipelineError::Unhandled`].
///
/// Installed outermost so it wraps validation and the handler. Expected
/// errors (`NotFound`, `Validation`, `Cancelled`) pass through unchanged.
/// Anything else, including a panic inside the chain, is logged with full
/// detail and replaced by the request name plus the dispatch's correlation
/// id.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnhandledExceptionBehavior;

#[async_trait]
impl<R: Request> Behavior<R> for UnhandledExceptionBehavior {
    async fn handle(
        &self,
        request: R,
        ctx: &RequestContext,
        next: Next<'_, R>,
    ) -> Result<R::Response> {
        let outcome = AssertUnwindSafe(next.run(request)).catch_unwind().await;

        let detail = match outcome {
            Ok(Ok(response)) => return Ok(response),
            Ok(Err(error)) if error.is_expected() => return Err(error),
            Ok(Err(error)) => format!("{error:?}"),
            Err(panic) => format!("panic: {}", panic_message(panic.as_ref())),
        };

        tracing::error!(
            request = R::NAME,
            correlation_id = %ctx.correlation_id(),
            actor = %ctx.actor(),
            error = %detail,
            "Unhandled failure while processing request"
        );

        Err(PipelineError::Unhandled {
            request: R::NAME,
            correlation_id: ctx.correlation_id(),
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}
