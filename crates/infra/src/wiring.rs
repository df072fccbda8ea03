//! Adapter selection for an [`SdkConfig`].

use std::sync::Arc;
use superface_adapters::{
    HttpRegistry, HttpRegistryConfig, JsonLogger, LocalFileSystem, StderrLogSink, TracingLogger,
};
use superface_app::SdkDeps;
use superface_config::SdkConfig;
use superface_ports::{LogLevel, LoggerPort, MapInterpreterPort, ParameterValidatorPort};

use crate::InfraResult;

/// Which structured logger the SDK emits events through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoggerChoice {
    /// No events.
    #[default]
    Silent,
    /// Forward events to `tracing`.
    Tracing,
    /// JSON lines on stderr at or above `min_level`.
    JsonStderr {
        /// Lowest level written.
        min_level: LogLevel,
    },
}

/// Build the logger for `choice`.
#[must_use]
pub fn build_logger(choice: LoggerChoice) -> Option<Arc<dyn LoggerPort>> {
    match choice {
        LoggerChoice::Silent => None,
        LoggerChoice::Tracing => Some(Arc::new(TracingLogger::new())),
        LoggerChoice::JsonStderr { min_level } => Some(Arc::new(
            JsonLogger::new(Arc::new(StderrLogSink)).with_min_level(min_level),
        )),
    }
}

/// Wire local file access, the HTTP registry and the chosen logger.
///
/// The interpreter and validator are supplied by the embedding application.
#[tracing::instrument(level = "debug", skip_all, fields(registry_url = %config.registry_url))]
pub fn build_sdk_deps(
    config: &SdkConfig,
    interpreter: Arc<dyn MapInterpreterPort>,
    validator: Arc<dyn ParameterValidatorPort>,
    logger: LoggerChoice,
) -> InfraResult<SdkDeps> {
    let registry = HttpRegistry::new(&HttpRegistryConfig::from_sdk_config(config))?;
    Ok(SdkDeps {
        filesystem: Arc::new(LocalFileSystem::new(None)),
        registry: Arc::new(registry),
        interpreter,
        validator,
        logger: build_logger(logger),
    })
}
