//! Type Conversions for OrchestratorError
//!
//! This module contains From trait implementations for converting
//! common error types into OrchestratorError.

use super::types::OrchestratorError;

impl From<reqwest::Error> for OrchestratorError {
    fn from(err: reqwest::Error) -> Self {
        Self::transport(err)
    }
}

impl From<serde_json::Error> for OrchestratorError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err)
    }
}

impl From<reqwest::header::InvalidHeaderValue> for OrchestratorError {
    fn from(err: reqwest::header::InvalidHeaderValue) -> Self {
        Self::serialization(err)
    }
}

impl From<reqwest::header::InvalidHeaderName> for OrchestratorError {
    fn from(err: reqwest::header::InvalidHeaderName) -> Self {
        Self::serialization(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: OrchestratorError = json_err.into();
        assert!(matches!(err, OrchestratorError::Serialization(_)));
    }

    #[test]
    fn test_from_invalid_header_value() {
        let header_err = reqwest::header::HeaderValue::from_str("bad\nvalue").unwrap_err();
        let err: OrchestratorError = header_err.into();
        assert!(matches!(err, OrchestratorError::Serialization(_)));
    }
}
