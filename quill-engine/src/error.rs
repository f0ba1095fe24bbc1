//! Engine error taxonomy
//!
//! Scope-management misuse (duplicate/unknown/default-protected names) is a
//! loud typed error. Script failures are routine: they carry the script
//! label and leave the engine fully usable.

use quill_core::ServiceError;
use quill_script::ExecError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("scope '{0}' already exists")]
    DuplicateScope(String),

    #[error("scope '{0}' does not exist")]
    UnknownScope(String),

    #[error("the default scope cannot be removed")]
    RemoveDefault,

    /// Compile-time failure; `line` is 1-based when the interpreter knows it
    #[error("script '{label}': syntax error at line {line}: {message}")]
    Syntax {
        label: String,
        line: usize,
        message: String,
    },

    /// Failure while executing already-compiled source
    #[error("script '{label}': {message}")]
    Runtime {
        label: String,
        message: String,
        #[source]
        cause: Option<ServiceError>,
    },

    #[error("script '{label}' was cancelled")]
    Cancelled { label: String },

    /// A registry factory failed while publishing services into a scope
    #[error("failed to resolve service '{name}': {cause}")]
    ServiceResolution {
        name: String,
        #[source]
        cause: ServiceError,
    },
}

impl EngineError {
    pub(crate) fn from_exec(label: &str, err: ExecError) -> Self {
        match err {
            ExecError::Syntax { line, message } => Self::Syntax {
                label: label.to_string(),
                line,
                message,
            },
            ExecError::Runtime { message, cause } => Self::Runtime {
                label: label.to_string(),
                message,
                cause,
            },
            ExecError::Cancelled => Self::Cancelled {
                label: label.to_string(),
            },
        }
    }

    /// Line number for syntax failures
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Syntax { line, .. } => Some(*line),
            _ => None,
        }
    }
}
