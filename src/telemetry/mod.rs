//! Telemetry
//!
//! The orchestrator opens a span for every call and a nested span for every
//! attempt, and records per-phase duration histograms plus attempt and error
//! counters. Events are fanned out to the configured exporters. Telemetry is
//! a side channel: export failures are logged and never change the outcome
//! of a call.
//!
//! ```rust,ignore
//! let exporter = InMemoryExporter::new();
//! let telemetry = Telemetry::new(
//!     TelemetryConfig::builder().enabled(true).service_name("Items").build(),
//! )
//! .with_exporter(exporter.clone());
//! ```

pub mod config;
pub mod events;
pub mod exporters;

pub use config::{TelemetryConfig, TelemetryConfigBuilder};
pub use events::{MetricEvent, MetricKind, SpanEvent, SpanStatus, TelemetryEvent};
pub use exporters::{InMemoryExporter, TelemetryExporter, TracingExporter};

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;

/// Fixed metric names.
pub mod metrics {
    pub const DURATION: &str = "smithy.client.duration";
    pub const ATTEMPTS: &str = "smithy.client.attempts";
    pub const ERRORS: &str = "smithy.client.errors";
    pub const ATTEMPT_DURATION: &str = "smithy.client.attempt_duration";
    pub const SERIALIZATION_DURATION: &str = "smithy.client.serialization_duration";
    pub const DESERIALIZATION_DURATION: &str = "smithy.client.deserialization_duration";
    pub const RESOLVE_ENDPOINT_DURATION: &str = "smithy.client.resolve_endpoint_duration";
    pub const RESOLVE_IDENTITY_DURATION: &str = "smithy.client.auth.resolve_identity_duration";
    pub const SIGNING_DURATION: &str = "smithy.client.auth.signing_duration";
}

/// Telemetry sink of one orchestrator.
#[derive(Clone, Default)]
pub struct Telemetry {
    config: TelemetryConfig,
    exporters: Vec<Arc<dyn TelemetryExporter>>,
}

impl Telemetry {
    pub fn new(config: TelemetryConfig) -> Self {
        Self {
            config,
            exporters: Vec::new(),
        }
    }

    /// Telemetry that emits nothing.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn with_exporter(mut self, exporter: impl TelemetryExporter + 'static) -> Self {
        self.exporters.push(Arc::new(exporter));
        self
    }

    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled && !self.exporters.is_empty()
    }

    /// Span name for the whole call, e.g. `Items.GetItem`.
    pub(crate) fn operation_span_name(&self) -> String {
        match (&self.config.service_name, &self.config.operation_name) {
            (Some(service), Some(operation)) => format!("{service}.{operation}"),
            (None, Some(operation)) => operation.clone(),
            (Some(service), None) => service.clone(),
            (None, None) => "smithy.client.operation".to_string(),
        }
    }

    fn metric_attributes(&self) -> HashMap<String, String> {
        self.config.base_attributes()
    }

    pub(crate) async fn emit(&self, event: TelemetryEvent) {
        if !self.is_enabled() {
            return;
        }
        let exports = self.exporters.iter().map(|exporter| exporter.export(&event));
        for result in join_all(exports).await {
            if let Err(e) = result {
                tracing::warn!(target: "smithy_orchestrator::telemetry", err=%e, "failed to export telemetry event");
            }
        }
    }

    pub(crate) async fn start_span(&self, parent: Option<&SpanEvent>, name: String) -> SpanEvent {
        let span = match parent {
            Some(parent) => parent.child(name),
            None => SpanEvent::root(name),
        }
        .with_attributes(&self.config.base_attributes())
        .with_attributes(&self.config.attributes);
        self.emit(TelemetryEvent::SpanStart(span.clone())).await;
        span
    }

    pub(crate) async fn end_span(&self, span: SpanEvent, error: Option<String>) {
        let span = match error {
            Some(error) => span.end_error(error),
            None => span.end_ok(),
        };
        self.emit(TelemetryEvent::SpanEnd(span)).await;
    }

    pub(crate) async fn count(&self, name: &str, unit: &str, extra: &[(&str, &str)]) {
        if !self.is_enabled() {
            return;
        }
        let mut metric = MetricEvent::counter(name, 1, unit).with_attributes(&self.metric_attributes());
        for (key, value) in extra {
            metric = metric.with_attribute(*key, *value);
        }
        self.emit(TelemetryEvent::Metric(metric)).await;
    }

    pub(crate) async fn record_duration(&self, name: &str, duration: Duration) {
        if !self.is_enabled() {
            return;
        }
        let metric = MetricEvent::duration(name, duration).with_attributes(&self.metric_attributes());
        self.emit(TelemetryEvent::Metric(metric)).await;
    }

    /// Flush every exporter. Failures are logged.
    pub async fn flush(&self) {
        for exporter in &self.exporters {
            if let Err(e) = exporter.flush().await {
                tracing::warn!(target: "smithy_orchestrator::telemetry", err=%e, "failed to flush telemetry exporter");
            }
        }
    }
}

impl fmt::Debug for Telemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Telemetry")
            .field("config", &self.config)
            .field("exporters", &self.exporters.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OrchestratorError;

    struct FailingExporter;

    #[async_trait::async_trait]
    impl TelemetryExporter for FailingExporter {
        async fn export(&self, _event: &TelemetryEvent) -> Result<(), OrchestratorError> {
            Err(OrchestratorError::internal("collector unreachable"))
        }
    }

    fn enabled() -> TelemetryConfig {
        TelemetryConfig::builder()
            .enabled(true)
            .service_name("Items")
            .operation_name("GetItem")
            .build()
    }

    #[tokio::test]
    async fn test_disabled_telemetry_emits_nothing() {
        let exporter = InMemoryExporter::new();
        let telemetry = Telemetry::new(TelemetryConfig::disabled()).with_exporter(exporter.clone());
        let span = telemetry.start_span(None, "op".to_string()).await;
        telemetry.count(metrics::ATTEMPTS, "{attempt}", &[]).await;
        telemetry.end_span(span, None).await;
        assert!(exporter.events().is_empty());
    }

    #[tokio::test]
    async fn test_spans_and_metrics_carry_operation_attributes() {
        let exporter = InMemoryExporter::new();
        let telemetry = Telemetry::new(enabled()).with_exporter(exporter.clone());
        assert_eq!(telemetry.operation_span_name(), "Items.GetItem");

        let call = telemetry.start_span(None, telemetry.operation_span_name()).await;
        let attempt = telemetry.start_span(Some(&call), "attempt".to_string()).await;
        telemetry.end_span(attempt, Some("reset".to_string())).await;
        telemetry.end_span(call, None).await;
        telemetry
            .count(metrics::ERRORS, "{error}", &[("error.type", "transport")])
            .await;
        telemetry
            .record_duration(metrics::DURATION, Duration::from_millis(1500))
            .await;

        let spans = exporter.finished_spans();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].status, SpanStatus::Error);
        assert_eq!(spans[0].parent_span_id.as_deref(), Some(spans[1].span_id.as_str()));
        assert_eq!(spans[1].attributes.get("rpc.method"), Some(&"GetItem".to_string()));

        let errors = exporter.metrics(metrics::ERRORS);
        assert_eq!(errors[0].attributes.get("error.type"), Some(&"transport".to_string()));
        assert_eq!(exporter.metric_total(metrics::DURATION), 1.5);
    }

    #[tokio::test]
    async fn test_export_failures_do_not_stop_other_exporters() {
        let exporter = InMemoryExporter::new();
        let telemetry = Telemetry::new(enabled())
            .with_exporter(FailingExporter)
            .with_exporter(exporter.clone());
        telemetry.count(metrics::ATTEMPTS, "{attempt}", &[]).await;
        telemetry.flush().await;
        assert_eq!(exporter.metric_total(metrics::ATTEMPTS), 1.0);
    }
}
