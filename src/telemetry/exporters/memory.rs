//! Exporter that keeps events in memory for inspection.

use std::sync::{Arc, Mutex};

use super::TelemetryExporter;
use crate::error::OrchestratorError;
use crate::telemetry::events::{MetricEvent, SpanEvent, TelemetryEvent};

/// Collects every exported event. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct InMemoryExporter {
    events: Arc<Mutex<Vec<TelemetryEvent>>>,
}

impl InMemoryExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Finished spans, in the order they ended.
    pub fn finished_spans(&self) -> Vec<SpanEvent> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                TelemetryEvent::SpanEnd(span) => Some(span),
                _ => None,
            })
            .collect()
    }

    /// Metric events recorded under `name`.
    pub fn metrics(&self, name: &str) -> Vec<MetricEvent> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                TelemetryEvent::Metric(metric) if metric.name == name => Some(metric),
                _ => None,
            })
            .collect()
    }

    /// Sum of the values recorded under `name`.
    pub fn metric_total(&self, name: &str) -> f64 {
        self.metrics(name).iter().map(|metric| metric.value).sum()
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

#[async_trait::async_trait]
impl TelemetryExporter for InMemoryExporter {
    async fn export(&self, event: &TelemetryEvent) -> Result<(), OrchestratorError> {
        self.events
            .lock()
            .map_err(|_| OrchestratorError::internal("telemetry buffer poisoned"))?
            .push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_collects_and_filters() {
        let exporter = InMemoryExporter::new();
        let shared = exporter.clone();
        exporter
            .export(&TelemetryEvent::Metric(MetricEvent::counter(
                "smithy.client.attempts",
                1,
                "{attempt}",
            )))
            .await
            .unwrap();
        exporter
            .export(&TelemetryEvent::Metric(MetricEvent::counter(
                "smithy.client.attempts",
                1,
                "{attempt}",
            )))
            .await
            .unwrap();
        exporter
            .export(&TelemetryEvent::SpanEnd(SpanEvent::root("op").end_ok()))
            .await
            .unwrap();

        assert_eq!(shared.events().len(), 3);
        assert_eq!(shared.metric_total("smithy.client.attempts"), 2.0);
        assert_eq!(shared.finished_spans().len(), 1);
        shared.clear();
        assert!(exporter.events().is_empty());
    }
}
