//! Telemetry Exporters
//!
//! Exporters receive every span and metric event the orchestrator emits.

pub mod memory;
pub mod tracing;

pub use self::memory::InMemoryExporter;
pub use self::tracing::TracingExporter;

use crate::error::OrchestratorError;
use crate::telemetry::events::TelemetryEvent;

/// Trait for telemetry exporters
#[async_trait::async_trait]
pub trait TelemetryExporter: Send + Sync {
    /// Export a telemetry event
    async fn export(&self, event: &TelemetryEvent) -> Result<(), OrchestratorError>;

    /// Flush any buffered events
    async fn flush(&self) -> Result<(), OrchestratorError> {
        Ok(())
    }

    /// Shutdown the exporter
    async fn shutdown(&self) -> Result<(), OrchestratorError> {
        Ok(())
    }
}
