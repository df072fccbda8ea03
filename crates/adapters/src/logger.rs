//! Logger adapters: JSON lines and `tracing` forwarding.

use crate::log_sink::LogSink;
use serde_json::Value;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use superface_ports::{LogEvent, LogFields, LogLevel, LoggerPort};
use superface_shared::redaction::{REDACTED, is_secret_key};

/// JSON logger emitting one line per event.
#[derive(Clone)]
pub struct JsonLogger {
    sink: Arc<dyn LogSink>,
    base_fields: LogFields,
    min_level: LogLevel,
}

impl JsonLogger {
    /// Create a JSON logger backed by the provided sink.
    #[must_use]
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self {
            sink,
            base_fields: LogFields::new(),
            min_level: LogLevel::Info,
        }
    }

    /// Set base fields applied to every event.
    #[must_use]
    pub fn with_base_fields(mut self, fields: LogFields) -> Self {
        self.base_fields = fields;
        self
    }

    /// Set the minimum log level.
    #[must_use]
    pub const fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }
}

impl LoggerPort for JsonLogger {
    fn log(&self, event: LogEvent) {
        if event.level < self.min_level {
            return;
        }

        let fields = merged_fields(&self.base_fields, event.fields);
        let mut error = event.error;
        if let Some(ref mut value) = error {
            redact_value(value);
        }

        let mut payload = serde_json::Map::new();
        payload.insert("timestampMs".to_owned(), Value::from(now_epoch_ms()));
        payload.insert("level".to_owned(), Value::from(event.level.as_str()));
        payload.insert("event".to_owned(), Value::from(event.event.as_ref()));
        payload.insert("message".to_owned(), Value::from(event.message.as_ref()));
        if !fields.is_empty() {
            payload.insert("fields".to_owned(), fields_to_json(&fields));
        }
        if let Some(error) = error {
            payload.insert("error".to_owned(), error);
        }

        let line = serde_json::to_string(&Value::Object(payload)).map_or_else(
            |_| {
                "{\"timestampMs\":0,\"level\":\"error\",\"event\":\"logger.serialize_failed\",\"message\":\"log serialization failed\"}\n"
                    .to_owned()
            },
            |mut encoded| {
                encoded.push('\n');
                encoded
            },
        );
        self.sink.write_line(&line);
    }

    fn child(&self, fields: LogFields) -> Box<dyn LoggerPort> {
        let mut merged = self.base_fields.clone();
        merged.extend(fields);
        Box::new(Self {
            sink: Arc::clone(&self.sink),
            base_fields: merged,
            min_level: self.min_level,
        })
    }
}

/// Logger forwarding events to the `tracing` subscriber.
#[derive(Debug, Clone, Default)]
pub struct TracingLogger {
    base_fields: LogFields,
}

impl TracingLogger {
    /// Create a forwarding logger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl LoggerPort for TracingLogger {
    fn log(&self, event: LogEvent) {
        let fields = fields_to_json(&merged_fields(&self.base_fields, event.fields));
        let name = event.event.as_ref();
        let message = event.message.as_ref();
        match event.level {
            LogLevel::Debug => tracing::debug!(event = name, fields = %fields, "{message}"),
            LogLevel::Info => tracing::info!(event = name, fields = %fields, "{message}"),
            LogLevel::Warn => tracing::warn!(event = name, fields = %fields, "{message}"),
            LogLevel::Error => tracing::error!(event = name, fields = %fields, "{message}"),
        }
    }

    fn child(&self, fields: LogFields) -> Box<dyn LoggerPort> {
        let mut merged = self.base_fields.clone();
        merged.extend(fields);
        Box::new(Self {
            base_fields: merged,
        })
    }
}

fn merged_fields(base: &LogFields, extra: Option<LogFields>) -> LogFields {
    let mut fields = base.clone();
    fields.extend(extra.into_iter().flatten());
    redact_fields(&mut fields);
    fields
}

fn fields_to_json(fields: &LogFields) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect(),
    )
}

fn redact_fields(fields: &mut LogFields) {
    for (key, value) in fields.iter_mut() {
        if is_secret_key(key) {
            *value = Value::String(REDACTED.to_owned());
        } else {
            redact_value(value);
        }
    }
}

fn redact_value(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map.iter_mut() {
                if is_secret_key(key) {
                    *nested = Value::String(REDACTED.to_owned());
                } else {
                    redact_value(nested);
                }
            }
        },
        Value::Array(items) => {
            for item in items {
                redact_value(item);
            }
        },
        _ => {},
    }
}

fn now_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|duration| u64::try_from(duration.as_millis()).ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log_sink::MemoryLogSink;
    use serde_json::json;

    fn parse_single(sink: &MemoryLogSink) -> Result<Value, Box<dyn std::error::Error>> {
        let lines = sink.take();
        assert_eq!(lines.len(), 1);
        let line = lines.first().ok_or("missing line")?;
        Ok(serde_json::from_str(line.trim())?)
    }

    #[test]
    fn json_logger_redacts_credentials() -> Result<(), Box<dyn std::error::Error>> {
        let sink = Arc::new(MemoryLogSink::default());
        let logger = JsonLogger::new(sink.clone()).with_min_level(LogLevel::Debug);

        logger.log(
            LogEvent::new("sdk.bind.start", LogLevel::Info, "binding")
                .with_field("apikey", "secret")
                .with_field("provider", "sendgrid")
                .with_field("security", json!([{ "id": "bearer", "token": "t0k" }])),
        );

        let payload = parse_single(&sink)?;
        assert_eq!(payload.get("event"), Some(&json!("sdk.bind.start")));
        assert_eq!(payload.get("level"), Some(&json!("info")));
        let fields = payload.get("fields").ok_or("missing fields")?;
        assert_eq!(fields.get("apikey"), Some(&json!(REDACTED)));
        assert_eq!(fields.get("provider"), Some(&json!("sendgrid")));
        assert_eq!(
            fields.pointer("/security/0/token"),
            Some(&json!(REDACTED))
        );
        assert_eq!(fields.pointer("/security/0/id"), Some(&json!("bearer")));
        Ok(())
    }

    #[test]
    fn json_logger_filters_below_min_level() {
        let sink = Arc::new(MemoryLogSink::default());
        let logger = JsonLogger::new(sink.clone()).with_min_level(LogLevel::Warn);
        logger.info("sdk.perform.start", "ignored", None);
        logger.warn("sdk.perform.failed", "kept", None);
        assert_eq!(sink.take().len(), 1);
    }

    #[test]
    fn child_logger_merges_fields() -> Result<(), Box<dyn std::error::Error>> {
        let sink = Arc::new(MemoryLogSink::default());
        let logger = JsonLogger::new(sink.clone()).with_min_level(LogLevel::Debug);

        let mut base = LogFields::new();
        base.insert("correlationId".into(), json!("req_123"));
        let child = logger.child(base);
        child.info("sdk.perform.completed", "child log", None);

        let payload = parse_single(&sink)?;
        assert_eq!(
            payload.pointer("/fields/correlationId"),
            Some(&json!("req_123"))
        );
        Ok(())
    }

    #[test]
    fn tracing_logger_accepts_events_without_subscriber() {
        let logger = TracingLogger::new();
        let child = logger.child(LogFields::from([("profile".into(), json!("p"))]));
        child.error("sdk.bind.failed", "no subscriber installed", None);
    }
}
