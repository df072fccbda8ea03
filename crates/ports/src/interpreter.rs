//! Map interpreter boundary contract.

use crate::BoxFuture;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use superface_config::RetryPolicy;
use superface_domain::{MapAst, SecurityConfiguration};
use superface_shared::RequestContext;

/// Everything the interpreter needs to run one use case.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpretRequest {
    /// Map to execute.
    pub map_ast: MapAst,
    /// Use-case name.
    pub usecase: String,
    /// Composed, validated input.
    pub input: Map<String, Value>,
    /// Effective integration parameters.
    pub parameters: BTreeMap<String, String>,
    /// Id of the selected service.
    pub service_id: String,
    /// Base URL of the selected service.
    pub base_url: String,
    /// Resolved credentials.
    pub security: Vec<SecurityConfiguration>,
    /// Retry policy, carried through unmodified.
    pub retry_policy: RetryPolicy,
}

/// Failure reported by the interpreter; passed through to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpreterError {
    /// Human-readable message.
    pub message: String,
    /// HTTP status of the failing call, when there was one.
    pub status_code: Option<u16>,
    /// Structured details (e.g. the response body).
    pub details: Option<Value>,
}

impl InterpreterError {
    /// Error with only a message.
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: None,
            details: None,
        }
    }
}

impl fmt::Display for InterpreterError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(status) => write!(formatter, "{} (status {status})", self.message),
            None => formatter.write_str(&self.message),
        }
    }
}

impl std::error::Error for InterpreterError {}

/// Boundary contract for the map interpreter.
pub trait MapInterpreterPort: Send + Sync {
    /// Execute one use case; performs the remote calls.
    fn perform(
        &self,
        ctx: &RequestContext,
        request: InterpretRequest,
    ) -> BoxFuture<'_, Result<Value, InterpreterError>>;
}
