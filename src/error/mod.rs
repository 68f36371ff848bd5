//! Error Handling Module
//!
//! This module provides the single error type surfaced by the orchestrator:
//! - Core error type (`OrchestratorError`) and the boxed/shared source aliases
//! - Constructor helpers used by collaborators
//! - Type conversions from common error types
//!
//! # Example
//!
//! ```rust,ignore
//! use smithy_orchestrator::error::OrchestratorError;
//!
//! let error = OrchestratorError::response(Some(503), "service unavailable");
//! assert_eq!(error.status_code(), Some(503));
//! assert!(!error.is_configuration());
//! ```

mod conversions;
pub mod types;

pub use types::*;
