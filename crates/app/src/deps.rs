//! Port bundle shared by the binding pipeline and bound providers.

use std::sync::Arc;
use superface_ports::{
    FileSystemPort, LogFields, LoggerPort, MapInterpreterPort, ParameterValidatorPort,
    RegistryPort,
};

/// Dependencies required to bind and perform.
#[derive(Clone)]
pub struct SdkDeps {
    /// Filesystem adapter.
    pub filesystem: Arc<dyn FileSystemPort>,
    /// Registry adapter.
    pub registry: Arc<dyn RegistryPort>,
    /// Map interpreter.
    pub interpreter: Arc<dyn MapInterpreterPort>,
    /// Parameter validator.
    pub validator: Arc<dyn ParameterValidatorPort>,
    /// Optional logger.
    pub logger: Option<Arc<dyn LoggerPort>>,
}

impl SdkDeps {
    pub(crate) fn log_info(&self, event: &str, message: &str, fields: LogFields) {
        if let Some(logger) = self.logger.as_ref() {
            logger.info(event, message, Some(fields));
        }
    }

    pub(crate) fn log_debug(&self, event: &str, message: &str, fields: LogFields) {
        if let Some(logger) = self.logger.as_ref() {
            logger.debug(event, message, Some(fields));
        }
    }

    pub(crate) fn log_error(&self, event: &str, message: &str, fields: LogFields) {
        if let Some(logger) = self.logger.as_ref() {
            logger.error(event, message, Some(fields));
        }
    }
}

impl std::fmt::Debug for SdkDeps {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("SdkDeps")
            .field("logger", &self.logger.is_some())
            .finish_non_exhaustive()
    }
}
