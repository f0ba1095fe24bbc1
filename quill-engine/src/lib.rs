//! Quill Engine - scripting scope manager
//!
//! Owns the named namespaces scripts execute against, binds registry
//! services into them and drives the interpreter off the calling thread.
//! The interpreter itself is a black box behind `quill_script::Interpreter`.

mod engine;
mod error;

pub use engine::{ExecutionEvent, ExecutionListener, ScriptEngine, DEFAULT_SCOPE};
pub use error::EngineError;
