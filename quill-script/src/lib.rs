//! Quill Script - reference interpreter
//!
//! A deliberately small line-oriented dialect: assignments, literals, lists,
//! arithmetic/comparison operators and calls into host services bound in the
//! executing namespace. The scope manager consumes it through the
//! `Interpreter` trait and stays agnostic of the concrete language.

mod ast;
mod eval;
mod lexer;
mod parser;
mod scope;

pub use ast::{BinOp, Expr, Stmt, UnaryOp};
pub use eval::Evaluator;
pub use parser::parse;
pub use scope::{Binding, BindingKind, Namespace, SYSTEM_PREFIX};

use quill_core::{ServiceError, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Failure modes at the interpreter boundary
#[derive(Debug, Error)]
pub enum ExecError {
    /// The source failed to compile; `line` is 1-based
    #[error("syntax error at line {line}: {message}")]
    Syntax { line: usize, message: String },

    /// Already-compiled source failed while executing
    #[error("runtime error: {message}")]
    Runtime {
        message: String,
        #[source]
        cause: Option<ServiceError>,
    },

    #[error("execution cancelled")]
    Cancelled,
}

impl ExecError {
    pub fn syntax(line: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            message: message.into(),
        }
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime {
            message: message.into(),
            cause: None,
        }
    }

    /// Wrap a service failure as an ordinary runtime failure
    pub fn service(cause: ServiceError) -> Self {
        Self::Runtime {
            message: cause.to_string(),
            cause: Some(cause),
        }
    }
}

/// Caller-owned cooperative cancellation signal.
///
/// The interpreter observes it between statements; cancelling never
/// corrupts namespace state.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Black-box interpreter boundary consumed by the scope manager
pub trait Interpreter: Send + Sync {
    /// Compile and run `source` against `scope`. `label` names the script
    /// for error reporting only.
    fn execute(
        &self,
        source: &str,
        label: &str,
        scope: &mut Namespace,
        cancel: &CancelToken,
    ) -> Result<Value, ExecError>;
}

/// The bundled dialect
#[derive(Debug, Default)]
pub struct QuillInterpreter;

impl QuillInterpreter {
    pub fn new() -> Self {
        Self
    }
}

impl Interpreter for QuillInterpreter {
    fn execute(
        &self,
        source: &str,
        label: &str,
        scope: &mut Namespace,
        cancel: &CancelToken,
    ) -> Result<Value, ExecError> {
        tracing::debug!(script = label, "compiling script");
        let stmts = parse(source)?;
        Evaluator::new().run(&stmts, scope, cancel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_registry::{ScriptService, ServiceMeta};

    struct MathStub;

    impl ScriptService for MathStub {
        fn meta(&self) -> ServiceMeta {
            ServiceMeta {
                name: "math",
                version: "1.0.0",
                description: "",
                core: false,
                methods: &[],
                properties: &[],
            }
        }

        fn call(&self, method: &str, args: &[Value]) -> Result<Value, ServiceError> {
            match method {
                "add" => {
                    let a = args.first().and_then(Value::as_number).unwrap_or(0.0);
                    let b = args.get(1).and_then(Value::as_number).unwrap_or(0.0);
                    Ok(Value::Number(a + b))
                }
                "boom" => Err(ServiceError::failed("document not found")),
                other => Err(ServiceError::unknown_method("math", other)),
            }
        }

        fn get(&self, property: &str) -> Result<Value, ServiceError> {
            match property {
                "pi" => Ok(Value::Number(std::f64::consts::PI)),
                other => Err(ServiceError::unknown_property("math", other)),
            }
        }
    }

    fn run(source: &str, scope: &mut Namespace) -> Result<Value, ExecError> {
        QuillInterpreter::new().execute(source, "test", scope, &CancelToken::new())
    }

    #[test]
    fn test_arithmetic() {
        let mut scope = Namespace::new();
        let result = run("1 + 2 * 3", &mut scope).unwrap();
        assert_eq!(result, Value::Number(7.0));
    }

    #[test]
    fn test_assignment_binds_user_variable() {
        let mut scope = Namespace::new();
        run("x = 40\ny = x + 2", &mut scope).unwrap();
        assert_eq!(scope.value("y"), Some(Value::Number(42.0)));
        assert_eq!(scope.kind("x"), Some(BindingKind::User));
    }

    #[test]
    fn test_service_call() {
        let mut scope = Namespace::new();
        scope.bind_service("math", Arc::new(MathStub));
        let result = run("result = math.add(2, 3)", &mut scope).unwrap();
        assert_eq!(result, Value::Number(5.0));
        assert_eq!(scope.value("result"), Some(Value::Number(5.0)));
    }

    #[test]
    fn test_service_property() {
        let mut scope = Namespace::new();
        scope.bind_service("math", Arc::new(MathStub));
        let result = run("math.pi > 3", &mut scope).unwrap();
        assert_eq!(result, Value::Bool(true));
    }

    #[test]
    fn test_service_failure_is_runtime_error() {
        let mut scope = Namespace::new();
        scope.bind_service("math", Arc::new(MathStub));
        let err = run("math.boom()", &mut scope).unwrap_err();
        let ExecError::Runtime { message, cause } = err else {
            panic!("expected runtime error");
        };
        assert!(message.contains("document not found"));
        assert!(cause.is_some());
    }

    #[test]
    fn test_undefined_name() {
        let mut scope = Namespace::new();
        let err = run("missing + 1", &mut scope).unwrap_err();
        assert!(matches!(err, ExecError::Runtime { .. }));
    }

    #[test]
    fn test_syntax_error_line_number() {
        let mut scope = Namespace::new();
        let err = run("a = 1\nb = )", &mut scope).unwrap_err();
        let ExecError::Syntax { line, .. } = err else {
            panic!("expected syntax error");
        };
        assert_eq!(line, 2);
    }

    #[test]
    fn test_division_by_zero() {
        let mut scope = Namespace::new();
        let err = run("1 / 0", &mut scope).unwrap_err();
        let ExecError::Runtime { message, .. } = err else {
            panic!("expected runtime error");
        };
        assert!(message.contains("division by zero"));
    }

    #[test]
    fn test_cancelled_before_start() {
        let mut scope = Namespace::new();
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = QuillInterpreter::new()
            .execute("x = 1", "test", &mut scope, &cancel)
            .unwrap_err();
        assert!(matches!(err, ExecError::Cancelled));
        assert!(!scope.contains("x"));
    }

    #[test]
    fn test_string_concat_and_lists() {
        let mut scope = Namespace::new();
        let result = run("s = 'ab' + 'cd'\n[s, 1 < 2]", &mut scope).unwrap();
        assert_eq!(
            result,
            Value::List(vec![Value::Text("abcd".into()), Value::Bool(true)])
        );
    }

    #[test]
    fn test_empty_script_returns_null() {
        let mut scope = Namespace::new();
        let result = run("\n# nothing here\n", &mut scope).unwrap();
        assert_eq!(result, Value::Null);
    }

    #[test]
    fn test_not_operator() {
        let mut scope = Namespace::new();
        assert_eq!(run("not 0", &mut scope).unwrap(), Value::Bool(true));
        assert_eq!(run("not 'x'", &mut scope).unwrap(), Value::Bool(false));
    }
}
