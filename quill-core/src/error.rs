//! Structured errors at the service boundary
//!
//! A `ServiceError` is what a host-side service reports back to a script
//! call. It never crashes the engine; the interpreter wraps it into an
//! ordinary runtime failure.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error produced by a host-side service invocation
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
pub enum ServiceError {
    #[error("service '{service}' has no method '{method}'")]
    UnknownMethod { service: String, method: String },

    #[error("service '{service}' has no property '{property}'")]
    UnknownProperty { service: String, property: String },

    #[error("{method}: expected {expected} argument(s), got {got}")]
    ArgCount {
        method: String,
        expected: usize,
        got: usize,
    },

    #[error("{method}: argument '{param}' expected {expected}, got {got}")]
    ArgType {
        method: String,
        param: String,
        expected: String,
        got: String,
    },

    #[error("service construction failed: {0}")]
    Construction(String),

    #[error("{0}")]
    Failed(String),
}

impl ServiceError {
    pub fn unknown_method(service: impl Into<String>, method: impl Into<String>) -> Self {
        Self::UnknownMethod {
            service: service.into(),
            method: method.into(),
        }
    }

    pub fn unknown_property(service: impl Into<String>, property: impl Into<String>) -> Self {
        Self::UnknownProperty {
            service: service.into(),
            property: property.into(),
        }
    }

    pub fn arg_count(method: impl Into<String>, expected: usize, got: usize) -> Self {
        Self::ArgCount {
            method: method.into(),
            expected,
            got,
        }
    }

    pub fn arg_type(
        method: impl Into<String>,
        param: impl Into<String>,
        expected: impl Into<String>,
        got: impl Into<String>,
    ) -> Self {
        Self::ArgType {
            method: method.into(),
            param: param.into(),
            expected: expected.into(),
            got: got.into(),
        }
    }

    pub fn construction(message: impl Into<String>) -> Self {
        Self::Construction(message.into())
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}
