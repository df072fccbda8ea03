//! Client façade tests over in-memory ports.

use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use superface_app::SdkDeps;
use superface_config::{Environment, SecurityValues};
use superface_domain::{MapAst, ProviderJson, SecurityConfiguration};
use superface_facade::{DocumentCache, PerformOptions, SuperfaceClient};
use superface_shared::{ErrorCode, RequestContext, SecretString};
use superface_testkit::{
    EchoInterpreter, InMemoryFileSystem, RecordingRegistry, StaticValidator, fixture_text,
    load_fixture,
};

type TestResult = Result<(), Box<dyn Error>>;

const DOCUMENT_PATH: &str = "/app/superface/super.json";
const PROFILE: &str = "communication/send-email";

struct Harness {
    filesystem: InMemoryFileSystem,
    registry: Arc<RecordingRegistry>,
    interpreter: Arc<EchoInterpreter>,
}

impl Harness {
    fn new(document: &Value) -> Result<Self, Box<dyn Error>> {
        let provider: ProviderJson = load_fixture("artifacts/sendgrid.provider.json")?;
        let map: MapAst = load_fixture("artifacts/send-email.sendgrid.suma.ast.json")?;
        let filesystem = InMemoryFileSystem::new();
        filesystem.insert(DOCUMENT_PATH, document.to_string());
        filesystem.insert(
            "/app/superface/grid/communication/send-email@1.2.0.supr.ast.json",
            fixture_text("artifacts/send-email.supr.ast.json")?,
        );
        filesystem.insert(
            "/app/superface/providers/sendgrid.json",
            fixture_text("artifacts/sendgrid.provider.json")?,
        );
        Ok(Self {
            filesystem,
            registry: Arc::new(
                RecordingRegistry::new()
                    .with_bind_response(provider, map)
                    .with_delay(Duration::from_millis(25)),
            ),
            interpreter: Arc::new(EchoInterpreter::new()),
        })
    }

    fn client(&self, documents: Arc<DocumentCache>) -> SuperfaceClient {
        let deps = SdkDeps {
            filesystem: Arc::new(self.filesystem.clone()),
            registry: self.registry.clone(),
            interpreter: self.interpreter.clone(),
            validator: Arc::new(StaticValidator::passing()),
            logger: None,
        };
        let environment = Environment::from_map(BTreeMap::from([(
            "SENDGRID_TOKEN".to_owned(),
            "sg-token".to_owned(),
        )]));
        SuperfaceClient::new(deps, DOCUMENT_PATH, environment, documents)
    }

    fn document_reads(&self) -> usize {
        self.filesystem
            .reads()
            .iter()
            .filter(|path| path.as_path() == Path::new(DOCUMENT_PATH))
            .count()
    }
}

fn document() -> Value {
    json!({
        "profiles": {
            PROFILE: {
                "version": "1.2.0",
                "defaults": { "SendEmail": { "input": { "from": "noreply@example.com" } } },
                "providers": { "sendgrid": {} }
            },
            "empty/profile": { "version": "1.0.0" }
        },
        "providers": {
            "sendgrid": {
                "file": "providers/sendgrid.json",
                "security": [{ "id": "bearer", "token": "$SENDGRID_TOKEN" }]
            }
        }
    })
}

fn input(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

#[tokio::test]
async fn concurrent_performs_bind_once() -> TestResult {
    let harness = Harness::new(&document())?;
    let client = harness.client(Arc::new(DocumentCache::new()));
    let ctx = RequestContext::new_request();
    let usecase = client.get_profile(&ctx, PROFILE).await?.get_usecase("SendEmail");

    let mut handles = Vec::new();
    for index in 0..8 {
        let usecase = usecase.clone();
        handles.push(tokio::spawn(async move {
            let ctx = RequestContext::new_request();
            usecase
                .perform(&ctx, input(json!({ "to": format!("user{index}@example.com") })), PerformOptions::default())
                .await
        }));
    }
    for handle in handles {
        let result = handle.await??;
        let value = result?;
        assert_eq!(value["from"], json!("noreply@example.com"));
    }

    assert_eq!(harness.registry.bind_calls(), 1);
    assert_eq!(client.bound_provider_count().await, 1);
    assert_eq!(harness.interpreter.requests().len(), 8);
    Ok(())
}

#[tokio::test]
async fn clients_share_an_injected_document_cache() -> TestResult {
    let harness = Harness::new(&document())?;
    let documents = Arc::new(DocumentCache::new());
    let ctx = RequestContext::new_request();

    let first = harness.client(Arc::clone(&documents));
    let second = harness.client(Arc::clone(&documents));
    first.get_profile(&ctx, PROFILE).await?;
    second.get_provider(&ctx, "sendgrid").await?;
    assert_eq!(harness.document_reads(), 1);
    assert_eq!(documents.len().await, 1);

    let isolated = harness.client(Arc::new(DocumentCache::new()));
    isolated.get_profile(&ctx, PROFILE).await?;
    assert_eq!(harness.document_reads(), 2);
    Ok(())
}

#[tokio::test]
async fn provider_for_profile_follows_priority() -> TestResult {
    let harness = Harness::new(&document())?;
    let client = harness.client(Arc::new(DocumentCache::new()));
    let ctx = RequestContext::new_request();

    let provider = client.get_provider_for_profile(&ctx, PROFILE).await?;
    assert_eq!(provider.name(), "sendgrid");

    let error = client
        .get_provider_for_profile(&ctx, "empty/profile")
        .await
        .err()
        .ok_or("expected no provider")?;
    assert_eq!(error.code, ErrorCode::new("client", "no_provider_for_profile"));

    let error = client
        .get_profile(&ctx, "missing/profile")
        .await
        .err()
        .ok_or("expected missing profile")?;
    assert_eq!(error.code, ErrorCode::new("superjson", "profile_not_found"));
    Ok(())
}

#[tokio::test]
async fn configured_provider_binds_separately_with_merged_security() -> TestResult {
    let harness = Harness::new(&document())?;
    let client = harness.client(Arc::new(DocumentCache::new()));
    let ctx = RequestContext::new_request();
    let usecase = client.get_profile(&ctx, PROFILE).await?.get_usecase("SendEmail");

    usecase.perform(&ctx, Map::new(), PerformOptions::default()).await??;

    let provider = client.get_provider(&ctx, "sendgrid").await?.configure(
        &[SecurityValues::Bearer {
            id: "bearer".to_owned(),
            token: "override".to_owned(),
        }],
        BTreeMap::new(),
    );
    let options = PerformOptions {
        provider: Some(provider),
        ..PerformOptions::default()
    };
    usecase.perform(&ctx, Map::new(), options).await??;

    assert_eq!(harness.registry.bind_calls(), 2);
    let requests = harness.interpreter.requests();
    let last = requests.last().ok_or("no interpreter request")?;
    assert_eq!(
        last.security,
        [SecurityConfiguration::Bearer {
            id: "bearer".to_owned(),
            bearer_format: None,
            token: SecretString::new("override"),
        }]
    );
    Ok(())
}
