//! Scope manager
//!
//! Invariants: the `"default"` scope always exists and is never removable;
//! exactly one scope is current; removing the current scope falls back to
//! `"default"`. Execution runs on a blocking worker and never holds the
//! registry lock; publication reads the registry before execution starts.

use crate::error::EngineError;
use parking_lot::Mutex;
use quill_core::{LogSink, Value};
use quill_registry::{CapabilityRegistry, ScriptService};
use quill_script::{CancelToken, Interpreter, Namespace};
use std::collections::HashMap;
use std::sync::Arc;

/// Name of the scope that always exists
pub const DEFAULT_SCOPE: &str = "default";

/// Fire-and-forget observer notification for script execution
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    Completed {
        label: String,
        result: Value,
    },
    Failed {
        label: String,
        message: String,
        line: Option<usize>,
    },
}

pub type ExecutionListener = Box<dyn Fn(&ExecutionEvent) + Send + Sync>;

struct Scopes {
    /// Each namespace sits behind its own mutex so execution can run
    /// off-thread while the manager stays responsive
    map: HashMap<String, Arc<Mutex<Namespace>>>,
    current: String,
}

/// Scripting engine: named scopes plus the interpreter boundary
pub struct ScriptEngine {
    registry: Arc<CapabilityRegistry>,
    interpreter: Arc<dyn Interpreter>,
    scopes: Mutex<Scopes>,
    listeners: Mutex<Vec<ExecutionListener>>,
    log: Arc<dyn LogSink>,
}

impl ScriptEngine {
    pub fn new(
        registry: Arc<CapabilityRegistry>,
        interpreter: Arc<dyn Interpreter>,
        log: Arc<dyn LogSink>,
    ) -> Self {
        let mut map = HashMap::new();
        map.insert(
            DEFAULT_SCOPE.to_string(),
            Arc::new(Mutex::new(Namespace::new())),
        );
        log.info("script engine initialized");
        Self {
            registry,
            interpreter,
            scopes: Mutex::new(Scopes {
                map,
                current: DEFAULT_SCOPE.to_string(),
            }),
            listeners: Mutex::new(Vec::new()),
            log,
        }
    }

    pub fn registry(&self) -> &Arc<CapabilityRegistry> {
        &self.registry
    }

    /// Observe execution outcomes. Listeners are never used for control flow.
    pub fn subscribe(&self, listener: ExecutionListener) {
        self.listeners.lock().push(listener);
    }

    // ========== scope management ==========

    pub fn create_scope(&self, name: &str) -> Result<(), EngineError> {
        let mut scopes = self.scopes.lock();
        if scopes.map.contains_key(name) {
            return Err(EngineError::DuplicateScope(name.to_string()));
        }
        scopes
            .map
            .insert(name.to_string(), Arc::new(Mutex::new(Namespace::new())));
        self.log.info(&format!("created scope '{}'", name));
        Ok(())
    }

    pub fn switch_to(&self, name: &str) -> Result<(), EngineError> {
        let mut scopes = self.scopes.lock();
        if !scopes.map.contains_key(name) {
            return Err(EngineError::UnknownScope(name.to_string()));
        }
        scopes.current = name.to_string();
        self.log.info(&format!("switched to scope '{}'", name));
        Ok(())
    }

    /// Remove a scope. Removing the current scope falls back to the
    /// default scope before returning.
    pub fn remove_scope(&self, name: &str) -> Result<(), EngineError> {
        let mut scopes = self.scopes.lock();
        if name == DEFAULT_SCOPE {
            return Err(EngineError::RemoveDefault);
        }
        if scopes.map.remove(name).is_none() {
            return Err(EngineError::UnknownScope(name.to_string()));
        }
        if scopes.current == name {
            scopes.current = DEFAULT_SCOPE.to_string();
        }
        self.log.info(&format!("removed scope '{}'", name));
        Ok(())
    }

    pub fn scope_names(&self) -> Vec<String> {
        let scopes = self.scopes.lock();
        let mut names: Vec<String> = scopes.map.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn current_scope_name(&self) -> String {
        self.scopes.lock().current.clone()
    }

    fn current_scope(&self) -> Arc<Mutex<Namespace>> {
        let scopes = self.scopes.lock();
        scopes.map[&scopes.current].clone()
    }

    // ========== bindings ==========

    /// Insert or overwrite a single value binding in the current scope
    pub fn bind_variable(&self, name: &str, value: Value) {
        self.current_scope().lock().bind_value(name, value);
    }

    /// Value bound in the current scope, if any
    pub fn get_variable(&self, name: &str) -> Option<Value> {
        self.current_scope().lock().value(name)
    }

    /// Bind every enabled registry service into the current scope under its
    /// registered name, resolving lazy instances as needed.
    ///
    /// This is a one-shot publication: later registry changes do not rebind
    /// already-published names. Re-publishing is the caller's choice; only
    /// `register_service`/`unregister_service` touch single names as a
    /// convenience.
    pub fn publish_registry_to_current_scope(&self) -> Result<usize, EngineError> {
        let snapshot = self.registry.list_all();
        let scope = self.current_scope();
        let mut bound = 0;
        for descriptor in snapshot.iter().filter(|d| d.is_enabled) {
            let service = self
                .registry
                .get(&descriptor.name)
                .map_err(|cause| EngineError::ServiceResolution {
                    name: descriptor.name.clone(),
                    cause,
                })?;
            if let Some(service) = service {
                scope.lock().bind_service(descriptor.name.clone(), service);
                bound += 1;
            }
        }
        self.log
            .info(&format!("published {} services to current scope", bound));
        Ok(bound)
    }

    /// Register with the registry and immediately bind the one new name
    /// into the current scope.
    pub fn register_service<S: ScriptService + 'static>(
        &self,
        service: S,
        name_override: Option<&str>,
    ) -> bool {
        let service = Arc::new(service);
        let Some(name) = quill_registry::resolve_binding_name(&service.meta(), name_override)
        else {
            return false;
        };
        if !self.registry.register_arc(service.clone(), name_override) {
            return false;
        }
        self.current_scope().lock().bind_service(name, service);
        true
    }

    /// Unregister from the registry and drop the one binding from the
    /// current scope.
    pub fn unregister_service(&self, name: &str) -> bool {
        if !self.registry.unregister(name) {
            return false;
        }
        self.current_scope().lock().remove(name);
        true
    }

    /// Strip user bindings from the current scope, keeping published
    /// services and `__`-prefixed system names. Returns how many bindings
    /// were removed.
    pub fn reset(&self) -> usize {
        let removed = self.current_scope().lock().reset();
        self.log
            .info(&format!("reset current scope ({} bindings removed)", removed));
        removed
    }

    // ========== execution ==========

    /// Execute source text against the current scope on a blocking worker.
    ///
    /// Syntax and runtime failures come back as distinct `EngineError`
    /// variants; both are also surfaced to execution listeners and the log
    /// sink. The engine and every scope stay usable after any failure.
    pub async fn execute(
        &self,
        source: impl Into<String>,
        label: impl Into<String>,
        cancel: CancelToken,
    ) -> Result<Value, EngineError> {
        let source = source.into();
        let label = label.into();
        let scope = self.current_scope();
        let interpreter = self.interpreter.clone();

        self.log.info(&format!("executing script '{}'", label));
        let task_label = label.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            let mut namespace = scope.lock();
            interpreter.execute(&source, &task_label, &mut namespace, &cancel)
        })
        .await;

        let result = match outcome {
            Ok(result) => result.map_err(|err| EngineError::from_exec(&label, err)),
            Err(join_err) => Err(EngineError::Runtime {
                label: label.clone(),
                message: format!("execution task failed: {}", join_err),
                cause: None,
            }),
        };

        match &result {
            Ok(value) => {
                self.log.info(&format!("script '{}' completed", label));
                self.notify(&ExecutionEvent::Completed {
                    label: label.clone(),
                    result: value.clone(),
                });
            }
            Err(err) => {
                let line = err.line();
                self.log.script_error(&label, &err.to_string(), line);
                self.notify(&ExecutionEvent::Failed {
                    label: label.clone(),
                    message: err.to_string(),
                    line,
                });
            }
        }

        result
    }

    fn notify(&self, event: &ExecutionEvent) {
        let listeners = self.listeners.lock();
        for listener in listeners.iter() {
            listener(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::{tracing_sink, ServiceError};
    use quill_registry::{MethodMeta, ParamMeta, ServiceMeta};
    use quill_script::QuillInterpreter;

    static ADD_PARAMS: [ParamMeta; 2] = [
        ParamMeta::required("a", "Number", "First addend"),
        ParamMeta::required("b", "Number", "Second addend"),
    ];
    static MATH_METHODS: [MethodMeta; 1] = [MethodMeta::new(
        "add",
        "Adds two numbers",
        "math.add(2, 3)",
        "Basic Math",
        &ADD_PARAMS,
        "Number",
    )];

    struct MathService;

    impl ScriptService for MathService {
        fn meta(&self) -> ServiceMeta {
            ServiceMeta {
                name: "math",
                version: "1.0.0",
                description: "Math helpers",
                core: false,
                methods: &MATH_METHODS,
                properties: &[],
            }
        }

        fn call(&self, method: &str, args: &[Value]) -> Result<Value, ServiceError> {
            match method {
                "add" => {
                    let a = args.first().and_then(Value::as_number);
                    let b = args.get(1).and_then(Value::as_number);
                    match (a, b) {
                        (Some(a), Some(b)) => Ok(Value::Number(a + b)),
                        _ => Err(ServiceError::arg_count("add", 2, args.len())),
                    }
                }
                other => Err(ServiceError::unknown_method("math", other)),
            }
        }
    }

    struct LateService;

    impl ScriptService for LateService {
        fn meta(&self) -> ServiceMeta {
            ServiceMeta {
                name: "late",
                version: "1.0.0",
                description: "",
                core: false,
                methods: &[],
                properties: &[],
            }
        }

        fn call(&self, method: &str, _args: &[Value]) -> Result<Value, ServiceError> {
            Err(ServiceError::unknown_method("late", method))
        }
    }

    fn engine() -> ScriptEngine {
        let registry = Arc::new(CapabilityRegistry::new(tracing_sink()));
        ScriptEngine::new(
            registry,
            Arc::new(QuillInterpreter::new()),
            tracing_sink(),
        )
    }

    fn engine_with_math() -> ScriptEngine {
        let engine = engine();
        assert!(engine.registry().register(MathService, None));
        engine.publish_registry_to_current_scope().unwrap();
        engine
    }

    #[test]
    fn test_default_scope_exists_and_is_current() {
        let engine = engine();
        assert_eq!(engine.current_scope_name(), DEFAULT_SCOPE);
        assert_eq!(engine.scope_names(), vec![DEFAULT_SCOPE.to_string()]);
    }

    #[test]
    fn test_duplicate_scope_rejected() {
        let engine = engine();
        engine.create_scope("macros").unwrap();
        assert!(matches!(
            engine.create_scope("macros"),
            Err(EngineError::DuplicateScope(_))
        ));
    }

    #[test]
    fn test_switch_to_unknown_scope_fails() {
        let engine = engine();
        assert!(matches!(
            engine.switch_to("nope"),
            Err(EngineError::UnknownScope(_))
        ));
    }

    #[test]
    fn test_remove_default_scope_fails() {
        let engine = engine();
        assert!(matches!(
            engine.remove_scope(DEFAULT_SCOPE),
            Err(EngineError::RemoveDefault)
        ));
    }

    #[test]
    fn test_remove_current_scope_falls_back_to_default() {
        let engine = engine();
        engine.create_scope("macros").unwrap();
        engine.switch_to("macros").unwrap();
        engine.remove_scope("macros").unwrap();
        assert_eq!(engine.current_scope_name(), DEFAULT_SCOPE);
    }

    #[test]
    fn test_scopes_are_isolated() {
        let engine = engine();
        engine.bind_variable("x", Value::Number(1.0));
        engine.create_scope("other").unwrap();
        engine.switch_to("other").unwrap();
        assert_eq!(engine.get_variable("x"), None);
        engine.switch_to(DEFAULT_SCOPE).unwrap();
        assert_eq!(engine.get_variable("x"), Some(Value::Number(1.0)));
    }

    #[tokio::test]
    async fn test_execute_math_add() {
        let engine = engine_with_math();
        let result = engine
            .execute("result = math.add(2, 3)", "macro", CancelToken::new())
            .await
            .unwrap();
        assert_eq!(result, Value::Number(5.0));
        assert_eq!(engine.get_variable("result"), Some(Value::Number(5.0)));
    }

    #[tokio::test]
    async fn test_syntax_failure_reports_line_and_keeps_engine_usable() {
        let engine = engine_with_math();
        let err = engine
            .execute("x = 1\ny = ]", "broken", CancelToken::new())
            .await
            .unwrap_err();
        let EngineError::Syntax { line, .. } = err else {
            panic!("expected syntax error, got {:?}", err);
        };
        assert_eq!(line, 2);

        // engine still works
        let result = engine
            .execute("math.add(1, 1)", "next", CancelToken::new())
            .await
            .unwrap();
        assert_eq!(result, Value::Number(2.0));
    }

    #[tokio::test]
    async fn test_runtime_failure_carries_label() {
        let engine = engine_with_math();
        let err = engine
            .execute("math.add(1)", "short", CancelToken::new())
            .await
            .unwrap_err();
        let EngineError::Runtime { label, .. } = err else {
            panic!("expected runtime error, got {:?}", err);
        };
        assert_eq!(label, "short");
    }

    #[tokio::test]
    async fn test_reset_preserves_published_services() {
        let engine = engine_with_math();
        engine
            .execute("scratch = 1\n__marker = 2", "setup", CancelToken::new())
            .await
            .unwrap();
        engine.reset();

        assert_eq!(engine.get_variable("scratch"), None);
        assert_eq!(engine.get_variable("__marker"), Some(Value::Number(2.0)));
        // service binding survived
        let result = engine
            .execute("math.add(2, 2)", "after-reset", CancelToken::new())
            .await
            .unwrap();
        assert_eq!(result, Value::Number(4.0));
    }

    #[tokio::test]
    async fn test_publish_once_contract() {
        let engine = engine_with_math();
        // registered after publication: visible in the registry, not in the scope
        assert!(engine.registry().register(LateService, None));
        let err = engine
            .execute("late.anything()", "late", CancelToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Runtime { .. }));

        // explicit re-publication picks it up
        engine.publish_registry_to_current_scope().unwrap();
        let err = engine
            .execute("late.anything()", "late", CancelToken::new())
            .await
            .unwrap_err();
        // now the failure is the service rejecting the method, not a missing name
        let EngineError::Runtime { cause, .. } = err else {
            panic!("expected runtime error");
        };
        assert!(cause.is_some());
    }

    #[tokio::test]
    async fn test_register_service_convenience_binds_immediately() {
        let engine = engine();
        assert!(engine.register_service(MathService, None));
        let result = engine
            .execute("math.add(3, 4)", "conv", CancelToken::new())
            .await
            .unwrap();
        assert_eq!(result, Value::Number(7.0));

        assert!(engine.unregister_service("math"));
        let err = engine
            .execute("math.add(1, 1)", "gone", CancelToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Runtime { .. }));
    }

    #[tokio::test]
    async fn test_disabled_service_not_published() {
        let engine = engine();
        assert!(engine.registry().register(MathService, None));
        assert!(engine.registry().set_enabled("math", false));
        assert_eq!(engine.publish_registry_to_current_scope().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_execution_events() {
        let engine = engine_with_math();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        engine.subscribe(Box::new(move |event| sink.lock().push(event.clone())));

        engine
            .execute("math.add(1, 2)", "ok", CancelToken::new())
            .await
            .unwrap();
        let _ = engine.execute("= nope", "bad", CancelToken::new()).await;

        let events = events.lock();
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], ExecutionEvent::Completed { label, .. } if label == "ok"));
        assert!(
            matches!(&events[1], ExecutionEvent::Failed { label, line, .. } if label == "bad" && line.is_some())
        );
    }

    #[tokio::test]
    async fn test_cancellation() {
        let engine = engine_with_math();
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = engine
            .execute("x = 1", "cancelled", cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Cancelled { .. }));
        assert_eq!(engine.get_variable("x"), None);
    }
}
