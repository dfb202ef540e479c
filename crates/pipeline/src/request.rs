//! Requests, their per-dispatch context and lifecycle.

use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};

use common::Actor;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::{PipelineError, Result};

/// A typed use-case invocation routed through the mediator.
///
/// Requests are immutable values; a handler consumes one and produces
/// `Response` (`()` for commands without a payload).
pub trait Request: Send + Sync + 'static {
    /// The value a successful dispatch produces.
    type Response: Send + 'static;

    /// Name reported in logs, metrics and unhandled errors.
    const NAME: &'static str;
}

/// The lifecycle of one dispatch.
///
/// State transitions:
/// ```text
/// Created ──► Validating ──┬──► Rejected
///    │                     │
///    └─────────────────────┴──► Executing ──► Completed
///
/// any non-terminal state ──► Faulted | Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum RequestState {
    #[default]
    Created = 0,
    Validating = 1,
    /// Validation failed; the handler never ran (terminal).
    Rejected = 2,
    Executing = 3,
    /// The chain produced a response (terminal).
    Completed = 4,
    /// The chain failed (terminal).
    Faulted = 5,
    /// The dispatch observed its cancellation signal (terminal).
    Cancelled = 6,
}

impl RequestState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => RequestState::Created,
            1 => RequestState::Validating,
            2 => RequestState::Rejected,
            3 => RequestState::Executing,
            4 => RequestState::Completed,
            5 => RequestState::Faulted,
            _ => RequestState::Cancelled,
        }
    }

    /// Returns true if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RequestState::Rejected
                | RequestState::Completed
                | RequestState::Faulted
                | RequestState::Cancelled
        )
    }

    /// Returns true if the lifecycle allows moving from this state to `next`.
    pub fn can_transition_to(&self, next: RequestState) -> bool {
        use RequestState::*;

        match (*self, next) {
            (from, _) if from.is_terminal() => false,
            (Created, Validating) | (Created, Executing) => true,
            (Validating, Rejected) | (Validating, Executing) => true,
            (_, Completed) | (_, Faulted) | (_, Cancelled) => true,
            _ => false,
        }
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestState::Created => "Created",
            RequestState::Validating => "Validating",
            RequestState::Rejected => "Rejected",
            RequestState::Executing => "Executing",
            RequestState::Completed => "Completed",
            RequestState::Faulted => "Faulted",
            RequestState::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for RequestState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ambient data for one dispatch: who is acting, how to correlate logs, and
/// the cancellation signal every stage observes.
///
/// A context tracks the lifecycle of a single dispatch; create a fresh one
/// per request.
#[derive(Debug)]
pub struct RequestContext {
    actor: Actor,
    correlation_id: Uuid,
    cancellation: CancellationToken,
    state: AtomicU8,
}

impl RequestContext {
    /// Creates a context for the given actor with a fresh correlation id.
    pub fn new(actor: Actor) -> Self {
        Self {
            actor,
            correlation_id: Uuid::new_v4(),
            cancellation: CancellationToken::new(),
            state: AtomicU8::new(RequestState::Created as u8),
        }
    }

    /// Uses an existing cancellation token, e.g. a child of a server-wide one.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Overrides the correlation id.
    pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = correlation_id;
        self
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Requests cancellation of the dispatch.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RequestState {
        RequestState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Moves to `next` if the lifecycle allows it. Returns whether it moved.
    pub fn advance(&self, next: RequestState) -> bool {
        self.state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                RequestState::from_u8(current)
                    .can_transition_to(next)
                    .then_some(next as u8)
            })
            .is_ok()
    }

    /// Settles the dispatch into a terminal state exactly once.
    ///
    /// If already terminal, the existing state is kept. If `outcome` is not
    /// reachable from the current state the dispatch is marked `Faulted`.
    /// Returns the terminal state.
    pub fn settle(&self, outcome: RequestState) -> RequestState {
        let previous = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                let current = RequestState::from_u8(current);
                if current.is_terminal() {
                    None
                } else if current.can_transition_to(outcome) && outcome.is_terminal() {
                    Some(outcome as u8)
                } else {
                    Some(RequestState::Faulted as u8)
                }
            });

        match previous {
            Ok(_) => self.state(),
            Err(current) => RequestState::from_u8(current),
        }
    }

    /// Runs `future` unless the dispatch is cancelled first.
    ///
    /// Cancellation drops the in-flight future; whether that interrupts the
    /// underlying I/O depends on the backend.
    pub async fn cancellable<F, T>(&self, future: F) -> Result<T>
    where
        F: Future<Output = T>,
    {
        tokio::select! {
            biased;
            _ = self.cancellation.cancelled() => Err(PipelineError::Cancelled),
            value = future => Ok(value),
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new(Actor::system())
    }
}
