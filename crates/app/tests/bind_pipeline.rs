//! End-to-end binding and perform tests over in-memory ports.

use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::Arc;
use superface_app::{
    BindConfiguration, PerformError, ProfileProvider, ProviderConfiguration, SdkDeps, Setting,
};
use superface_config::{Environment, SuperJson};
use superface_domain::{MapAst, ProfileAst, ProviderJson, SecurityConfiguration};
use superface_ports::{InterpreterError, ValidationKind};
use superface_shared::{ErrorCode, RequestContext, SecretString};
use superface_testkit::{
    EchoInterpreter, InMemoryFileSystem, RecordingLogger, RecordingRegistry, StaticValidator,
    fixture_text, load_fixture,
};

type TestResult = Result<(), Box<dyn Error>>;

const DOCUMENT_PATH: &str = "/app/superface/super.json";
const PROFILE: &str = "communication/send-email";

struct Harness {
    filesystem: InMemoryFileSystem,
    registry: Arc<RecordingRegistry>,
    interpreter: Arc<EchoInterpreter>,
    logger: Arc<RecordingLogger>,
    validator: StaticValidator,
}

impl Harness {
    fn new(registry: RecordingRegistry) -> Self {
        Self {
            filesystem: InMemoryFileSystem::new(),
            registry: Arc::new(registry),
            interpreter: Arc::new(EchoInterpreter::new()),
            logger: Arc::new(RecordingLogger::new()),
            validator: StaticValidator::passing(),
        }
    }

    fn with_validator(mut self, validator: StaticValidator) -> Self {
        self.validator = validator;
        self
    }

    fn with_interpreter(mut self, interpreter: EchoInterpreter) -> Self {
        self.interpreter = Arc::new(interpreter);
        self
    }

    fn failed_perform_kind(&self) -> Option<Value> {
        self.logger
            .events()
            .into_iter()
            .find(|event| &*event.event == "sdk.perform.failed")
            .and_then(|event| event.fields)
            .and_then(|fields| fields.get("errorKind").cloned())
    }

    fn insert_fixture(&self, relative: &str, fixture: &str) -> TestResult {
        self.filesystem
            .insert(format!("/app/superface/{relative}"), fixture_text(fixture)?);
        Ok(())
    }

    fn deps(&self) -> SdkDeps {
        SdkDeps {
            filesystem: Arc::new(self.filesystem.clone()),
            registry: self.registry.clone(),
            interpreter: self.interpreter.clone(),
            validator: Arc::new(self.validator.clone()),
            logger: Some(self.logger.clone()),
        }
    }

    fn profile_provider(&self, document: &Value) -> Result<ProfileProvider, Box<dyn Error>> {
        self.profile_provider_with(document, ProviderConfiguration::new("sendgrid"))
    }

    fn profile_provider_with(
        &self,
        document: &Value,
        provider: ProviderConfiguration,
    ) -> Result<ProfileProvider, Box<dyn Error>> {
        let environment = Environment::from_map(BTreeMap::from([(
            "SENDGRID_TOKEN".to_owned(),
            "sg-token".to_owned(),
        )]));
        let super_json = SuperJson::parse(&document.to_string(), DOCUMENT_PATH, environment)?;
        Ok(ProfileProvider::new(
            self.deps(),
            Arc::new(super_json),
            Setting::Reference(PROFILE.to_owned()),
            provider,
        ))
    }
}

fn artifacts() -> Result<(ProviderJson, MapAst), Box<dyn Error>> {
    Ok((
        load_fixture("artifacts/sendgrid.provider.json")?,
        load_fixture("artifacts/send-email.sendgrid.suma.ast.json")?,
    ))
}

fn registry_backed() -> Result<Harness, Box<dyn Error>> {
    let (provider, map) = artifacts()?;
    let harness = Harness::new(RecordingRegistry::new().with_bind_response(provider, map));
    harness.insert_fixture(
        "grid/communication/send-email@1.2.0.supr.ast.json",
        "artifacts/send-email.supr.ast.json",
    )?;
    harness.insert_fixture("providers/sendgrid.json", "artifacts/sendgrid.provider.json")?;
    Ok(harness)
}

fn remote_document() -> Value {
    json!({
        "profiles": {
            PROFILE: {
                "version": "1.2.0",
                "defaults": { "SendEmail": { "input": { "a": 1 } } },
                "providers": {
                    "sendgrid": {
                        "mapRevision": "7",
                        "defaults": { "SendEmail": { "input": { "a": 2, "b": 3 } } }
                    }
                }
            }
        },
        "providers": {
            "sendgrid": {
                "file": "providers/sendgrid.json",
                "security": [{ "id": "bearer", "token": "$SENDGRID_TOKEN" }]
            }
        }
    })
}

#[tokio::test]
async fn binds_remote_map_and_performs_with_composed_input() -> TestResult {
    let harness = registry_backed()?;
    let ctx = RequestContext::new_request();
    let bound = harness
        .profile_provider(&remote_document())?
        .bind(&ctx, &BindConfiguration::default())
        .await?;

    assert_eq!(harness.registry.bind_calls(), 1);
    let request = harness.registry.bind_requests().into_iter().next().ok_or("no request")?;
    assert_eq!(request.profile_id, "communication/send-email@1.2.0");
    assert_eq!(request.provider, "sendgrid");
    assert_eq!(request.map_revision.as_deref(), Some("7"));

    assert_eq!(bound.service_id(), "default");
    assert_eq!(bound.base_url(), "https://api.sendgrid.com");
    assert_eq!(
        bound.security(),
        [SecurityConfiguration::Bearer {
            id: "bearer".to_owned(),
            bearer_format: None,
            token: SecretString::new("sg-token"),
        }]
    );
    assert_eq!(bound.parameters().get("region").map(String::as_str), Some("us"));

    let input = json!({ "b": 4 }).as_object().cloned().ok_or("not an object")?;
    let result = bound.perform(&ctx, "SendEmail", input).await?;
    assert_eq!(result?, json!({ "a": 2, "b": 4 }));

    let names = harness.logger.event_names();
    for expected in [
        "sdk.bind.start",
        "sdk.registry.fetch_bind",
        "sdk.bind.completed",
        "sdk.perform.start",
        "sdk.perform.completed",
    ] {
        assert!(names.iter().any(|name| name == expected), "missing {expected}");
    }
    Ok(())
}

#[tokio::test]
async fn local_map_and_provider_skip_the_registry() -> TestResult {
    let harness = registry_backed()?;
    harness.insert_fixture(
        "maps/send-email.sendgrid.suma.ast.json",
        "artifacts/send-email.sendgrid.suma.ast.json",
    )?;
    let document = json!({
        "profiles": {
            PROFILE: {
                "version": "1.2.0",
                "providers": { "sendgrid": "file://maps/send-email.sendgrid.suma" }
            }
        },
        "providers": {
            "sendgrid": {
                "file": "file://providers/sendgrid.json",
                "security": [{ "id": "bearer", "token": "$SENDGRID_TOKEN" }]
            }
        }
    });

    let bound = harness
        .profile_provider(&document)?
        .bind(&RequestContext::new_request(), &BindConfiguration::default())
        .await?;
    assert_eq!(harness.registry.bind_calls(), 0);
    assert_eq!(bound.map_ast().provider(), "sendgrid");
    assert_eq!(bound.provider().name, "sendgrid");
    Ok(())
}

#[tokio::test]
async fn local_map_without_local_provider_is_not_implemented() -> TestResult {
    let harness = registry_backed()?;
    harness.insert_fixture(
        "maps/send-email.sendgrid.suma.ast.json",
        "artifacts/send-email.sendgrid.suma.ast.json",
    )?;
    let document = json!({
        "profiles": {
            PROFILE: {
                "version": "1.2.0",
                "providers": { "sendgrid": "file://maps/send-email.sendgrid.suma" }
            }
        },
        "providers": { "sendgrid": {} }
    });

    let error = harness
        .profile_provider(&document)?
        .bind(&RequestContext::new_request(), &BindConfiguration::default())
        .await
        .err()
        .ok_or("expected bind to fail")?;
    assert_eq!(error.code, ErrorCode::new("bind", "not_implemented"));
    assert!(harness.logger.event_names().iter().any(|name| name == "sdk.bind.failed"));
    Ok(())
}

#[tokio::test]
async fn missing_local_map_file_fails_without_registry_fallback() -> TestResult {
    let harness = registry_backed()?;
    let document = json!({
        "profiles": {
            PROFILE: {
                "version": "1.2.0",
                "providers": { "sendgrid": "file://maps/missing.suma" }
            }
        },
        "providers": { "sendgrid": "file://providers/sendgrid.json" }
    });

    let error = harness
        .profile_provider(&document)?
        .bind(&RequestContext::new_request(), &BindConfiguration::default())
        .await
        .err()
        .ok_or("expected bind to fail")?;
    assert_eq!(error.code, ErrorCode::new("bind", "map_not_found"));
    assert_eq!(harness.registry.bind_calls(), 0);
    Ok(())
}

#[tokio::test]
async fn unknown_service_is_rejected() -> TestResult {
    let harness = registry_backed()?;
    let configuration = BindConfiguration {
        service_id: Some("nope".to_owned()),
        ..BindConfiguration::default()
    };
    let error = harness
        .profile_provider(&remote_document())?
        .bind(&RequestContext::new_request(), &configuration)
        .await
        .err()
        .ok_or("expected bind to fail")?;
    assert_eq!(error.code, ErrorCode::new("bind", "service_not_found"));
    assert_eq!(error.metadata.get("service_id").map(String::as_str), Some("nope"));

    let configuration = BindConfiguration {
        service_id: Some("eu".to_owned()),
        ..BindConfiguration::default()
    };
    let bound = harness
        .profile_provider(&remote_document())?
        .bind(&RequestContext::new_request(), &configuration)
        .await?;
    assert_eq!(bound.base_url(), "https://api.eu.sendgrid.com");
    Ok(())
}

#[tokio::test]
async fn parameters_follow_precedence() -> TestResult {
    let harness = registry_backed()?;
    let mut document = remote_document();
    document["providers"]["sendgrid"]["parameters"] = json!({ "region": "eu", "tier": "pro" });
    let provider = ProviderConfiguration {
        parameters: BTreeMap::from([("tier".to_owned(), "free".to_owned())]),
        ..ProviderConfiguration::new("sendgrid")
    };
    let configuration = BindConfiguration {
        parameters: BTreeMap::from([("region".to_owned(), "ap".to_owned())]),
        ..BindConfiguration::default()
    };

    let bound = harness
        .profile_provider_with(&document, provider)?
        .bind(&RequestContext::new_request(), &configuration)
        .await?;
    assert_eq!(bound.parameters().get("region").map(String::as_str), Some("ap"));
    assert_eq!(bound.parameters().get("tier").map(String::as_str), Some("free"));
    Ok(())
}

#[tokio::test]
async fn profile_falls_back_to_the_registry() -> TestResult {
    let (provider, map) = artifacts()?;
    let profile: ProfileAst = load_fixture("artifacts/send-email.supr.ast.json")?;
    let harness = Harness::new(
        RecordingRegistry::new()
            .with_bind_response(provider, map)
            .with_profile_ast("communication/send-email@1.2.0", profile),
    );
    harness.insert_fixture("providers/sendgrid.json", "artifacts/sendgrid.provider.json")?;

    let bound = harness
        .profile_provider(&remote_document())?
        .bind(&RequestContext::new_request(), &BindConfiguration::default())
        .await?;
    assert_eq!(bound.profile_ast().header().id(), PROFILE);
    assert_eq!(harness.registry.profile_requests(), ["communication/send-email@1.2.0"]);
    Ok(())
}

#[tokio::test]
async fn unknown_profile_is_invalid() -> TestResult {
    let (provider, map) = artifacts()?;
    let harness = Harness::new(RecordingRegistry::new().with_bind_response(provider, map));
    let error = harness
        .profile_provider(&remote_document())?
        .bind(&RequestContext::new_request(), &BindConfiguration::default())
        .await
        .err()
        .ok_or("expected bind to fail")?;
    assert_eq!(error.code, ErrorCode::new("bind", "invalid_profile"));
    Ok(())
}

#[tokio::test]
async fn input_validation_failure_skips_the_interpreter() -> TestResult {
    let harness = registry_backed()?.with_validator(StaticValidator::rejecting(
        ValidationKind::Input,
        "input.to",
        "required",
    ));
    let ctx = RequestContext::new_request();
    let bound = harness
        .profile_provider(&remote_document())?
        .bind(&ctx, &BindConfiguration::default())
        .await?;

    let outcome = bound.perform(&ctx, "SendEmail", serde_json::Map::new()).await?;
    assert!(matches!(outcome, Err(PerformError::InputValidation(ref issues)) if issues.len() == 1));
    assert!(harness.interpreter.requests().is_empty());
    assert!(harness.logger.event_names().iter().any(|name| name == "sdk.perform.failed"));
    Ok(())
}

#[tokio::test]
async fn result_validation_failure_is_returned_as_value() -> TestResult {
    let harness = registry_backed()?
        .with_interpreter(EchoInterpreter::new().with_result(json!({ "messageId": 7 })))
        .with_validator(StaticValidator::rejecting(
            ValidationKind::Result,
            "result.messageId",
            "expected string",
        ));
    let ctx = RequestContext::new_request();
    let bound = harness
        .profile_provider(&remote_document())?
        .bind(&ctx, &BindConfiguration::default())
        .await?;

    let outcome = bound.perform(&ctx, "SendEmail", serde_json::Map::new()).await?;
    let Err(PerformError::ResultValidation(issues)) = &outcome else {
        return Err("expected a result validation failure".into());
    };
    assert_eq!(issues.len(), 1);
    assert_eq!(issues.first().map(|issue| issue.path.as_str()), Some("result.messageId"));
    assert_eq!(harness.interpreter.requests().len(), 1);
    assert_eq!(harness.failed_perform_kind(), Some(Value::from("result_validation")));
    Ok(())
}

#[tokio::test]
async fn interpreter_error_passes_through() -> TestResult {
    let failure = InterpreterError {
        message: "upstream rejected the request".to_owned(),
        status_code: Some(502),
        details: Some(json!({ "error": "bad gateway" })),
    };
    let harness =
        registry_backed()?.with_interpreter(EchoInterpreter::new().with_error(failure.clone()));
    let ctx = RequestContext::new_request();
    let bound = harness
        .profile_provider(&remote_document())?
        .bind(&ctx, &BindConfiguration::default())
        .await?;

    let outcome = bound.perform(&ctx, "SendEmail", serde_json::Map::new()).await?;
    assert_eq!(outcome, Err(PerformError::Interpreter(failure)));
    assert_eq!(harness.failed_perform_kind(), Some(Value::from("interpreter")));
    Ok(())
}

#[tokio::test]
async fn undeclared_usecase_is_rejected() -> TestResult {
    let harness = registry_backed()?;
    let ctx = RequestContext::new_request();
    let bound = harness
        .profile_provider(&remote_document())?
        .bind(&ctx, &BindConfiguration::default())
        .await?;

    let error = bound
        .perform(&ctx, "Unknown", serde_json::Map::new())
        .await
        .err()
        .ok_or("expected perform to fail")?;
    assert_eq!(error.code, ErrorCode::new("perform", "usecase_not_found"));
    Ok(())
}
