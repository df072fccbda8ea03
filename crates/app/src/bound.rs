//! Bound provider: one executable profile and provider pairing.

use crate::deps::SdkDeps;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;
use superface_config::{NormalizedUsecaseDefaultsMap, deep_merge};
use superface_domain::{MapAst, ProfileAst, ProviderJson, SecurityConfiguration};
use superface_ports::{
    InterpretRequest, InterpreterError, LogFields, ValidationIssue, ValidationKind,
};
use superface_shared::{ErrorCode, ErrorEnvelope, RequestContext, Result};

/// Recoverable failure of a use-case invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PerformError {
    /// Composed input failed validation; the interpreter was not called.
    InputValidation(Vec<ValidationIssue>),
    /// The interpreter's result failed validation.
    ResultValidation(Vec<ValidationIssue>),
    /// The interpreter failed.
    Interpreter(InterpreterError),
}

impl PerformError {
    /// Stable kind name used in logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InputValidation(_) => "input_validation",
            Self::ResultValidation(_) => "result_validation",
            Self::Interpreter(_) => "interpreter",
        }
    }
}

impl fmt::Display for PerformError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let issues = |issues: &[ValidationIssue]| {
            issues
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ")
        };
        match self {
            Self::InputValidation(found) => write!(formatter, "input validation failed: {}", issues(found)),
            Self::ResultValidation(found) => {
                write!(formatter, "result validation failed: {}", issues(found))
            },
            Self::Interpreter(error) => write!(formatter, "interpreter failed: {error}"),
        }
    }
}

impl std::error::Error for PerformError {}

/// Immutable result of binding a profile to a provider.
#[derive(Debug)]
pub struct BoundProfileProvider {
    pub(crate) profile_ast: ProfileAst,
    pub(crate) map_ast: MapAst,
    pub(crate) provider: ProviderJson,
    pub(crate) service_id: String,
    pub(crate) base_url: String,
    pub(crate) defaults: NormalizedUsecaseDefaultsMap,
    pub(crate) security: Vec<SecurityConfiguration>,
    pub(crate) parameters: BTreeMap<String, String>,
    pub(crate) deps: SdkDeps,
}

impl BoundProfileProvider {
    /// Profile AST.
    #[must_use]
    pub const fn profile_ast(&self) -> &ProfileAst {
        &self.profile_ast
    }

    /// Map AST.
    #[must_use]
    pub const fn map_ast(&self) -> &MapAst {
        &self.map_ast
    }

    /// Provider descriptor.
    #[must_use]
    pub const fn provider(&self) -> &ProviderJson {
        &self.provider
    }

    /// Selected service id.
    #[must_use]
    pub fn service_id(&self) -> &str {
        &self.service_id
    }

    /// Base URL of the selected service.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Normalized use-case defaults for this pairing.
    #[must_use]
    pub const fn defaults(&self) -> &NormalizedUsecaseDefaultsMap {
        &self.defaults
    }

    /// Resolved credentials.
    #[must_use]
    pub fn security(&self) -> &[SecurityConfiguration] {
        &self.security
    }

    /// Effective integration parameters.
    #[must_use]
    pub const fn parameters(&self) -> &BTreeMap<String, String> {
        &self.parameters
    }

    /// Defaults for `usecase` with the caller's input merged on top.
    #[must_use]
    pub fn compose_input(&self, usecase: &str, input: &Map<String, Value>) -> Map<String, Value> {
        let mut composed = self
            .defaults
            .get(usecase)
            .map(|defaults| defaults.input.clone())
            .unwrap_or_default();
        deep_merge(&mut composed, input);
        composed
    }

    /// Run `usecase` with `input`.
    ///
    /// Validation and interpreter failures come back as [`PerformError`]; the
    /// outer error is reserved for use cases the profile does not define.
    pub async fn perform(
        &self,
        ctx: &RequestContext,
        usecase: &str,
        input: Map<String, Value>,
    ) -> Result<std::result::Result<Value, PerformError>> {
        let started_at = Instant::now();
        self.ensure_usecase(usecase)?;
        self.deps.log_info(
            "sdk.perform.start",
            "Use case perform started",
            self.log_fields(ctx, usecase),
        );

        let outcome = self.run(ctx, usecase, &input).await;

        let mut fields = self.log_fields(ctx, usecase);
        fields.insert("durationMs".into(), Value::from(duration_ms(started_at)));
        match &outcome {
            Ok(_) => self.deps.log_info(
                "sdk.perform.completed",
                "Use case perform completed",
                fields,
            ),
            Err(error) => {
                fields.insert("errorKind".into(), Value::from(error.kind()));
                self.deps
                    .log_error("sdk.perform.failed", "Use case perform failed", fields);
            },
        }
        Ok(outcome)
    }

    async fn run(
        &self,
        ctx: &RequestContext,
        usecase: &str,
        input: &Map<String, Value>,
    ) -> std::result::Result<Value, PerformError> {
        let composed = self.compose_input(usecase, input);
        self.deps
            .validator
            .validate(
                &Value::Object(composed.clone()),
                &self.profile_ast,
                usecase,
                ValidationKind::Input,
            )
            .map_err(PerformError::InputValidation)?;

        let request = InterpretRequest {
            map_ast: self.map_ast.clone(),
            usecase: usecase.to_owned(),
            input: composed,
            parameters: self.parameters.clone(),
            service_id: self.service_id.clone(),
            base_url: self.base_url.clone(),
            security: self.security.clone(),
            retry_policy: self
                .defaults
                .get(usecase)
                .map(|defaults| defaults.retry_policy.clone())
                .unwrap_or_default(),
        };
        let result = self
            .deps
            .interpreter
            .perform(ctx, request)
            .await
            .map_err(PerformError::Interpreter)?;

        self.deps
            .validator
            .validate(&result, &self.profile_ast, usecase, ValidationKind::Result)
            .map_err(PerformError::ResultValidation)?;
        Ok(result)
    }

    fn ensure_usecase(&self, usecase: &str) -> Result<()> {
        let mut declared = self.profile_ast.usecase_names().peekable();
        if declared.peek().is_none() || self.profile_ast.usecase_names().any(|name| name == usecase) {
            return Ok(());
        }
        Err(ErrorEnvelope::expected(
            ErrorCode::new("perform", "usecase_not_found"),
            format!(
                "use case \"{usecase}\" is not defined by profile \"{}\"",
                self.profile_ast.header().id()
            ),
        )
        .with_metadata("usecase", usecase)
        .with_metadata("profile", self.profile_ast.header().id()))
    }

    fn log_fields(&self, ctx: &RequestContext, usecase: &str) -> LogFields {
        LogFields::from([
            (
                "correlationId".into(),
                Value::from(ctx.correlation_id().as_str()),
            ),
            ("profile".into(), Value::from(self.profile_ast.header().id())),
            ("provider".into(), Value::from(self.provider.name.as_str())),
            ("usecase".into(), Value::from(usecase)),
        ])
    }
}

pub(crate) fn duration_ms(started_at: Instant) -> u64 {
    u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX)
}
