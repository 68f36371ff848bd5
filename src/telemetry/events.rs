//! Telemetry Events
//!
//! Structured span and metric events emitted by the orchestrator.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, SystemTime};

/// Main telemetry event enum
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TelemetryEvent {
    /// Span start event (for hierarchical tracing)
    SpanStart(SpanEvent),
    /// Span end event
    SpanEnd(SpanEvent),
    /// Counter increment or histogram sample
    Metric(MetricEvent),
}

/// Span event for hierarchical tracing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpanEvent {
    /// Unique span ID
    pub span_id: String,
    /// Parent span ID (if nested)
    pub parent_span_id: Option<String>,
    /// Trace ID (for grouping related spans)
    pub trace_id: String,
    /// Span name (e.g., "Items.GetItem", "Items.GetItem.attempt")
    pub name: String,
    pub start_time: SystemTime,
    /// Only for SpanEnd events
    pub end_time: Option<SystemTime>,
    /// Only for SpanEnd events
    pub duration: Option<Duration>,
    pub attributes: HashMap<String, String>,
    pub status: SpanStatus,
    /// Error message (if status is Error)
    pub error: Option<String>,
}

/// Span status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SpanStatus {
    InProgress,
    Ok,
    Error,
}

impl SpanEvent {
    /// Start a root span with a fresh trace id
    pub fn root(name: impl Into<String>) -> Self {
        Self::start(
            uuid::Uuid::new_v4().to_string(),
            None,
            uuid::Uuid::new_v4().to_string(),
            name.into(),
        )
    }

    /// Start a span nested under `self`
    pub fn child(&self, name: impl Into<String>) -> Self {
        Self::start(
            uuid::Uuid::new_v4().to_string(),
            Some(self.span_id.clone()),
            self.trace_id.clone(),
            name.into(),
        )
    }

    /// Create a new span start event
    pub fn start(
        span_id: String,
        parent_span_id: Option<String>,
        trace_id: String,
        name: String,
    ) -> Self {
        Self {
            span_id,
            parent_span_id,
            trace_id,
            name,
            start_time: SystemTime::now(),
            end_time: None,
            duration: None,
            attributes: HashMap::new(),
            status: SpanStatus::InProgress,
            error: None,
        }
    }

    /// End the span successfully
    pub fn end_ok(mut self) -> Self {
        self.finish();
        self.status = SpanStatus::Ok;
        self
    }

    /// End the span with error
    pub fn end_error(mut self, error: String) -> Self {
        self.finish();
        self.status = SpanStatus::Error;
        self.error = Some(error);
        self
    }

    fn finish(&mut self) {
        let now = SystemTime::now();
        self.end_time = Some(now);
        self.duration = now.duration_since(self.start_time).ok();
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_attributes(mut self, attributes: &HashMap<String, String>) -> Self {
        self.attributes
            .extend(attributes.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Counter,
    Histogram,
}

/// A single metric observation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricEvent {
    pub name: String,
    pub kind: MetricKind,
    pub value: f64,
    /// Unit of `value` ("s" for durations, "{attempt}" for counts)
    pub unit: String,
    pub timestamp: SystemTime,
    pub attributes: HashMap<String, String>,
}

impl MetricEvent {
    pub fn counter(name: impl Into<String>, value: u64, unit: impl Into<String>) -> Self {
        Self::new(name.into(), MetricKind::Counter, value as f64, unit.into())
    }

    /// Histogram sample of a duration, in seconds
    pub fn duration(name: impl Into<String>, duration: Duration) -> Self {
        Self::new(
            name.into(),
            MetricKind::Histogram,
            duration.as_secs_f64(),
            "s".to_string(),
        )
    }

    fn new(name: String, kind: MetricKind, value: f64, unit: String) -> Self {
        Self {
            name,
            kind,
            value,
            unit,
            timestamp: SystemTime::now(),
            attributes: HashMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_attributes(mut self, attributes: &HashMap<String, String>) -> Self {
        self.attributes
            .extend(attributes.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }
}
