//! Telemetry Configuration

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Telemetry configuration
///
/// Controls whether spans and metrics are emitted and which static
/// attributes they carry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Enable or disable telemetry
    pub enabled: bool,

    /// Service name recorded on every span and metric (`rpc.service`)
    pub service_name: Option<String>,

    /// Operation name recorded on every span and metric (`rpc.method`)
    pub operation_name: Option<String>,

    /// Additional attributes added to every span
    pub attributes: HashMap<String, String>,
}

impl TelemetryConfig {
    /// Create a new builder
    pub fn builder() -> TelemetryConfigBuilder {
        TelemetryConfigBuilder::default()
    }

    /// Telemetry switched off
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Static attributes shared by spans and metrics
    pub(crate) fn base_attributes(&self) -> HashMap<String, String> {
        let mut attributes = HashMap::new();
        if let Some(service) = &self.service_name {
            attributes.insert("rpc.service".to_string(), service.clone());
        }
        if let Some(operation) = &self.operation_name {
            attributes.insert("rpc.method".to_string(), operation.clone());
        }
        attributes
    }
}

/// Builder for TelemetryConfig
#[derive(Debug, Clone, Default)]
pub struct TelemetryConfigBuilder {
    enabled: bool,
    service_name: Option<String>,
    operation_name: Option<String>,
    attributes: HashMap<String, String>,
}

impl TelemetryConfigBuilder {
    /// Enable or disable telemetry
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    pub fn operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    /// Add a span attribute
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> TelemetryConfig {
        TelemetryConfig {
            enabled: self.enabled,
            service_name: self.service_name,
            operation_name: self.operation_name,
            attributes: self.attributes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_disabled() {
        let config = TelemetryConfig::default();
        assert!(!config.enabled);
        assert!(config.base_attributes().is_empty());
    }

    #[test]
    fn test_builder() {
        let config = TelemetryConfig::builder()
            .enabled(true)
            .service_name("Items")
            .operation_name("GetItem")
            .attribute("deployment", "staging")
            .build();

        assert!(config.enabled);
        assert_eq!(config.attributes.get("deployment"), Some(&"staging".to_string()));
        let base = config.base_attributes();
        assert_eq!(base.get("rpc.service"), Some(&"Items".to_string()));
        assert_eq!(base.get("rpc.method"), Some(&"GetItem".to_string()));
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = TelemetryConfig::builder().enabled(true).service_name("Items").build();
        let json = serde_json::to_string(&config).unwrap();
        let back: TelemetryConfig = serde_json::from_str(&json).unwrap();
        assert!(back.enabled);
        assert_eq!(back.service_name.as_deref(), Some("Items"));
    }
}
