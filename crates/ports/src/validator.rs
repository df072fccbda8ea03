//! Parameter validator boundary contract.

use std::fmt;
use serde_json::Value;
use superface_domain::ProfileAst;

/// Which side of a use case is validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationKind {
    /// Use-case input.
    Input,
    /// Use-case result.
    Result,
}

impl fmt::Display for ValidationKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Input => "input",
            Self::Result => "result",
        })
    }
}

/// One validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// JSON path of the offending value (`input.to`).
    pub path: String,
    /// What is wrong.
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}: {}", self.path, self.message)
    }
}

/// Boundary contract for structural validation against a profile AST.
pub trait ParameterValidatorPort: Send + Sync {
    /// Validate `value` as the input or result of `usecase`.
    fn validate(
        &self,
        value: &Value,
        profile: &ProfileAst,
        usecase: &str,
        kind: ValidationKind,
    ) -> Result<(), Vec<ValidationIssue>>;
}
