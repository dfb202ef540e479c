use async_trait::async_trait;

use crate::error::Result;
use crate::request::{Request, RequestContext};

/// Use-case logic bound to exactly one request type.
///
/// The handler is the innermost stage of a pipeline: it runs only after every
/// behavior has passed the request on.
#[async_trait]
pub trait RequestHandler<R: Request>: Send + Sync {
    /// Executes the request.
    ///
    /// Handlers should race long-running I/O against the context's
    /// cancellation signal with [`RequestContext::cancellable`].
    async fn handle(&self, request: R, ctx: &RequestContext) -> Result<R::Response>;
}
