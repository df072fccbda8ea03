//! Scripted doubles for the registry, interpreter and validator ports.

use crate::in_memory::lock;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use superface_domain::{MapAst, ProfileAst, ProviderInfo, ProviderJson};
use superface_ports::{
    BindRequest, BindResponse, BoxFuture, InterpretRequest, InterpreterError, MapInterpreterPort,
    ParameterValidatorPort, RegistryPort, ValidationIssue, ValidationKind,
};
use superface_shared::{ErrorCode, ErrorEnvelope, RequestContext, Result};

/// Registry double returning canned artifacts and recording every request.
#[derive(Debug, Default, Clone)]
pub struct RecordingRegistry {
    bind: Option<std::result::Result<BindResponse, ErrorEnvelope>>,
    providers: Vec<ProviderInfo>,
    profiles: BTreeMap<String, ProfileAst>,
    delay: Option<Duration>,
    bind_requests: Arc<Mutex<Vec<BindRequest>>>,
    profile_requests: Arc<Mutex<Vec<String>>>,
    bind_calls: Arc<AtomicUsize>,
}

impl RecordingRegistry {
    /// Registry that knows nothing; every fetch fails with `core:not_found`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `fetch_bind` with this provider and map.
    #[must_use]
    pub fn with_bind_response(mut self, provider: ProviderJson, map_ast: MapAst) -> Self {
        self.bind = Some(Ok(BindResponse { provider, map_ast }));
        self
    }

    /// Fail `fetch_bind` with this error.
    #[must_use]
    pub fn with_bind_error(mut self, error: ErrorEnvelope) -> Self {
        self.bind = Some(Err(error));
        self
    }

    /// Answer `fetch_providers` with this listing.
    #[must_use]
    pub fn with_providers(mut self, providers: Vec<ProviderInfo>) -> Self {
        self.providers = providers;
        self
    }

    /// Serve a profile AST under its versioned id (`scope/name@1.2.3`).
    #[must_use]
    pub fn with_profile_ast(mut self, versioned_id: impl Into<String>, ast: ProfileAst) -> Self {
        self.profiles.insert(versioned_id.into(), ast);
        self
    }

    /// Sleep before answering `fetch_bind`.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of `fetch_bind` calls so far.
    pub fn bind_calls(&self) -> usize {
        self.bind_calls.load(Ordering::SeqCst)
    }

    /// Recorded `fetch_bind` requests.
    pub fn bind_requests(&self) -> Vec<BindRequest> {
        lock(&self.bind_requests).clone()
    }

    /// Recorded `fetch_profile_ast` ids.
    pub fn profile_requests(&self) -> Vec<String> {
        lock(&self.profile_requests).clone()
    }
}

fn registry_not_found(what: &str) -> ErrorEnvelope {
    ErrorEnvelope::expected(ErrorCode::not_found(), format!("{what} not found"))
        .with_metadata("status", "404")
}

impl RegistryPort for RecordingRegistry {
    fn fetch_bind(&self, _ctx: &RequestContext, request: BindRequest) -> BoxFuture<'_, Result<BindResponse>> {
        Box::pin(async move {
            self.bind_calls.fetch_add(1, Ordering::SeqCst);
            lock(&self.bind_requests).push(request);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.bind
                .clone()
                .unwrap_or_else(|| Err(registry_not_found("map")))
        })
    }

    fn fetch_providers(
        &self,
        _ctx: &RequestContext,
        _profile_id: String,
    ) -> BoxFuture<'_, Result<Vec<ProviderInfo>>> {
        Box::pin(async move { Ok(self.providers.clone()) })
    }

    fn fetch_profile_ast(
        &self,
        _ctx: &RequestContext,
        profile_id: String,
    ) -> BoxFuture<'_, Result<ProfileAst>> {
        Box::pin(async move {
            let found = self.profiles.get(&profile_id).cloned();
            lock(&self.profile_requests).push(profile_id);
            found.ok_or_else(|| registry_not_found("profile"))
        })
    }
}

/// Interpreter double; echoes the composed input unless scripted otherwise.
#[derive(Debug, Default, Clone)]
pub struct EchoInterpreter {
    outcome: Option<std::result::Result<Value, InterpreterError>>,
    requests: Arc<Mutex<Vec<InterpretRequest>>>,
}

impl EchoInterpreter {
    /// Interpreter returning the input object as the result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return this value for every invocation.
    #[must_use]
    pub fn with_result(mut self, result: Value) -> Self {
        self.outcome = Some(Ok(result));
        self
    }

    /// Fail every invocation with this error.
    #[must_use]
    pub fn with_error(mut self, error: InterpreterError) -> Self {
        self.outcome = Some(Err(error));
        self
    }

    /// Recorded requests.
    pub fn requests(&self) -> Vec<InterpretRequest> {
        lock(&self.requests).clone()
    }
}

impl MapInterpreterPort for EchoInterpreter {
    fn perform(
        &self,
        _ctx: &RequestContext,
        request: InterpretRequest,
    ) -> BoxFuture<'_, std::result::Result<Value, InterpreterError>> {
        Box::pin(async move {
            let echoed = Value::Object(request.input.clone());
            lock(&self.requests).push(request);
            self.outcome.clone().unwrap_or(Ok(echoed))
        })
    }
}

/// Validator double that accepts everything except the scripted side.
#[derive(Debug, Default, Clone)]
pub struct StaticValidator {
    reject: Option<(ValidationKind, Vec<ValidationIssue>)>,
    calls: Arc<AtomicUsize>,
}

impl StaticValidator {
    /// Validator accepting every value.
    #[must_use]
    pub fn passing() -> Self {
        Self::default()
    }

    /// Validator rejecting `kind` with a single issue.
    #[must_use]
    pub fn rejecting(kind: ValidationKind, path: &str, message: &str) -> Self {
        Self {
            reject: Some((
                kind,
                vec![ValidationIssue {
                    path: path.to_owned(),
                    message: message.to_owned(),
                }],
            )),
            calls: Arc::default(),
        }
    }

    /// Number of `validate` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ParameterValidatorPort for StaticValidator {
    fn validate(
        &self,
        _value: &Value,
        _profile: &ProfileAst,
        _usecase: &str,
        kind: ValidationKind,
    ) -> std::result::Result<(), Vec<ValidationIssue>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reject {
            Some((rejected, issues)) if *rejected == kind => Err(issues.clone()),
            _ => Ok(()),
        }
    }
}
