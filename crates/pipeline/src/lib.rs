//! Request pipeline: a typed mediator that threads each request through an
//! ordered chain of behaviors before its handler.
//!
//! This crate provides:
//! - `Request` and `RequestHandler` traits with a per-dispatch `RequestContext`
//! - `Behavior` middleware driven through a `Next` continuation
//! - `ValidationBehavior` and `UnhandledExceptionBehavior`
//! - `Mediator`, resolving the pipeline registered for a request type
//! - the closed `PipelineError` taxonomy surfaced to callers

pub mod behavior;
pub mod error;
pub mod handler;
pub mod mediator;
pub mod request;
pub mod unhandled;
pub mod validation;

pub use behavior::{Behavior, Next};
pub use common::Actor;
pub use error::{PipelineError, Result};
pub use handler::RequestHandler;
pub use mediator::{Mediator, MediatorBuilder, Pipeline};
pub use request::{Request, RequestContext, RequestState};
pub use tokio_util::sync::CancellationToken;
pub use unhandled::UnhandledExceptionBehavior;
pub use validation::{ValidationBehavior, ValidationFailures};
pub use validator::Validate;
