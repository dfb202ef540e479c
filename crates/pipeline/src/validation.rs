//! Rule-based request validation.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::behavior::{Behavior, Next};
use crate::error::{PipelineError, Result};
use crate::request::{Request, RequestContext, RequestState};

/// Every failed rule of a request, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationFailures(BTreeMap<String, Vec<String>>);

impl ValidationFailures {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failure message for a field.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of fields with at least one failure.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Failed field names, sorted.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Messages recorded for a field.
    pub fn messages(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

impl std::fmt::Display for ValidationFailures {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for messages in self.0.values() {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl From<&ValidationErrors> for ValidationFailures {
    fn from(errors: &ValidationErrors) -> Self {
        let mut failures = ValidationFailures::new();
        for (field, field_errors) in errors.field_errors() {
            let field: &str = &field;
            for error in field_errors.iter() {
                let message = match &error.message {
                    Some(message) => message.to_string(),
                    None => describe(field, error),
                };
                failures.add(field, message);
            }
        }
        failures
    }
}

/// Renders a rule failure that carries no explicit message.
fn describe(field: &str, error: &ValidationError) -> String {
    let label = display_name(field);
    let param = |name: &str| error.params.get(name);

    match error.code.as_ref() {
        "length" => {
            let actual = param("value")
                .and_then(Value::as_str)
                .map(|value| value.chars().count() as u64);
            let min = param("min").and_then(Value::as_u64);
            let max = param("max").and_then(Value::as_u64);

            match (actual, min, max) {
                (Some(0), _, _) => format!("{label} is required"),
                (Some(actual), Some(min), _) if actual < min => {
                    format!("{label} must be at least {min} characters.")
                }
                (_, _, Some(max)) => format!("{label} must not exceed {max} characters."),
                _ => format!("{label} has an invalid length."),
            }
        }
        "required" => format!("{label} is required"),
        code => format!("{label} failed the {code} rule."),
    }
}

/// `unit_price` becomes `Unit price`.
fn display_name(field: &str) -> String {
    let spaced = field.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Rejects requests that fail their declared rules before the handler runs.
///
/// All rules are evaluated; the resulting [`PipelineError::Validation`]
/// lists every failed field. Request types declaring no rules always pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationBehavior;

#[async_trait]
impl<R> Behavior<R> for ValidationBehavior
where
    R: Request + Validate,
{
    async fn handle(
        &self,
        request: R,
        ctx: &RequestContext,
        next: Next<'_, R>,
    ) -> Result<R::Response> {
        ctx.advance(RequestState::Validating);

        if let Err(errors) = request.validate() {
            let failures = ValidationFailures::from(&errors);
            ctx.advance(RequestState::Rejected);
            tracing::warn!(
                request = R::NAME,
                correlation_id = %ctx.correlation_id(),
                %failures,
                "Request rejected by validation"
            );
            return Err(PipelineError::Validation(failures));
        }

        next.run(request).await
    }
}
