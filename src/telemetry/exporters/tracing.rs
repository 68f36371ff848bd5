//! Exporter that writes events to `tracing`.

use super::TelemetryExporter;
use crate::error::OrchestratorError;
use crate::telemetry::events::{SpanStatus, TelemetryEvent};

#[derive(Debug, Clone, Default)]
pub struct TracingExporter;

#[async_trait::async_trait]
impl TelemetryExporter for TracingExporter {
    async fn export(&self, event: &TelemetryEvent) -> Result<(), OrchestratorError> {
        match event {
            TelemetryEvent::SpanStart(span) => {
                ::tracing::debug!(target: "smithy_orchestrator::telemetry", span=%span.name, span_id=%span.span_id, trace_id=%span.trace_id, "span started");
            }
            TelemetryEvent::SpanEnd(span) => {
                let duration_ms = span.duration.map(|d| d.as_millis() as u64).unwrap_or_default();
                if span.status == SpanStatus::Error {
                    ::tracing::debug!(target: "smithy_orchestrator::telemetry", span=%span.name, span_id=%span.span_id, duration_ms, error=span.error.as_deref().unwrap_or_default(), "span failed");
                } else {
                    ::tracing::debug!(target: "smithy_orchestrator::telemetry", span=%span.name, span_id=%span.span_id, duration_ms, "span ended");
                }
            }
            TelemetryEvent::Metric(metric) => {
                ::tracing::trace!(target: "smithy_orchestrator::telemetry", metric=%metric.name, value=metric.value, unit=%metric.unit, "metric recorded");
            }
        }
        Ok(())
    }
}
