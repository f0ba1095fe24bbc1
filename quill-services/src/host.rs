//! Host service: the core capability baseline every script sees
//!
//! Wraps accessor/mutator closures supplied by the hosting application.
//! The closures are opaque here; a panic-free contract for normal inputs is
//! on the host.

use quill_core::LogSink;
use quill_registry::prelude::*;
use std::sync::Arc;

/// Callbacks the hosting application wires in
pub struct HostCallbacks {
    /// Text of the active document, if any
    pub active_document: Box<dyn Fn() -> Option<String> + Send + Sync>,
    /// Update the status line
    pub status_text: Box<dyn Fn(&str) + Send + Sync>,
}

impl HostCallbacks {
    /// Callbacks for a host with no UI: no document, status dropped
    pub fn headless() -> Self {
        Self {
            active_document: Box::new(|| None),
            status_text: Box::new(|_| {}),
        }
    }
}

pub struct HostService {
    callbacks: HostCallbacks,
    log: Arc<dyn LogSink>,
}

impl HostService {
    pub fn new(callbacks: HostCallbacks, log: Arc<dyn LogSink>) -> Self {
        Self { callbacks, log }
    }
}

static LOG_PARAMS: [ParamMeta; 1] =
    [ParamMeta::required("message", "Text", "Message to record in the application log")];
static STATUS_PARAMS: [ParamMeta; 1] =
    [ParamMeta::required("text", "Text", "Text to show in the status bar")];

static HOST_METHODS: [MethodMeta; 2] = [
    MethodMeta::new(
        "log",
        "Records a message in the application log",
        "host.log('macro started')",
        "Logging",
        &LOG_PARAMS,
        "Null",
    ),
    MethodMeta::new(
        "status_bar",
        "Updates the application status bar",
        "host.status_bar('processing...')",
        "UI",
        &STATUS_PARAMS,
        "Null",
    ),
];

static HOST_PROPS: [PropertyMeta; 1] = [PropertyMeta::read_only(
    "active_doc",
    "Text",
    "Content of the active document, or null when none is open",
    "doc = host.active_doc",
)];

impl ScriptService for HostService {
    fn meta(&self) -> ServiceMeta {
        ServiceMeta {
            name: "host",
            version: "1.0.0",
            description: "Application host: logging, status bar, active document",
            core: true,
            methods: &HOST_METHODS,
            properties: &HOST_PROPS,
        }
    }

    fn call(&self, method: &str, args: &[Value]) -> Result<Value, ServiceError> {
        match method {
            "log" => {
                let message = text_arg("log", "message", args)?;
                self.log.info(message);
                Ok(Value::Null)
            }
            "status_bar" => {
                let text = text_arg("status_bar", "text", args)?;
                (self.callbacks.status_text)(text);
                Ok(Value::Null)
            }
            other => Err(ServiceError::unknown_method("host", other)),
        }
    }

    fn get(&self, property: &str) -> Result<Value, ServiceError> {
        match property {
            "active_doc" => Ok(match (self.callbacks.active_document)() {
                Some(text) => Value::Text(text),
                None => Value::Null,
            }),
            other => Err(ServiceError::unknown_property("host", other)),
        }
    }
}

fn text_arg<'a>(method: &str, param: &str, args: &'a [Value]) -> Result<&'a str, ServiceError> {
    if args.len() != 1 {
        return Err(ServiceError::arg_count(method, 1, args.len()));
    }
    args[0]
        .as_text()
        .ok_or_else(|| ServiceError::arg_type(method, param, "Text", args[0].type_name()))
}
