//! Variable namespaces
//!
//! A `Namespace` is the isolated binding table a script executes against.
//! Bindings carry a kind so a reset can strip user state while keeping the
//! host wiring (published services, `__`-prefixed system names) intact.

use quill_core::Value;
use quill_registry::ScriptService;
use std::collections::HashMap;
use std::sync::Arc;

/// Names starting with this prefix are system bindings and survive resets
pub const SYSTEM_PREFIX: &str = "__";

/// What a name in a namespace is bound to
#[derive(Clone)]
pub enum Binding {
    Value(Value),
    Service(Arc<dyn ScriptService>),
}

/// How a binding got into the namespace, which decides reset behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    /// `__`-prefixed host state
    System,
    /// Bound by registry publication
    Service,
    /// Bound by scripts or plain host assignments
    User,
}

/// Isolated variable namespace
#[derive(Default)]
pub struct Namespace {
    bindings: HashMap<String, (BindingKind, Binding)>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a value binding. Names with the system prefix
    /// are classified as system bindings.
    pub fn bind_value(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        let kind = if name.starts_with(SYSTEM_PREFIX) {
            BindingKind::System
        } else {
            BindingKind::User
        };
        self.bindings.insert(name, (kind, Binding::Value(value)));
    }

    /// Insert or overwrite a service binding
    pub fn bind_service(&mut self, name: impl Into<String>, service: Arc<dyn ScriptService>) {
        self.bindings
            .insert(name.into(), (BindingKind::Service, Binding::Service(service)));
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.bindings.remove(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name).map(|(_, binding)| binding)
    }

    pub fn kind(&self, name: &str) -> Option<BindingKind> {
        self.bindings.get(name).map(|(kind, _)| *kind)
    }

    /// Value bound to `name`, if it is a plain value binding
    pub fn value(&self, name: &str) -> Option<Value> {
        match self.get(name) {
            Some(Binding::Value(value)) => Some(value.clone()),
            _ => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Bound names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.bindings.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Remove every user binding, leaving service and system bindings.
    /// Returns the number of bindings removed.
    pub fn reset(&mut self) -> usize {
        let before = self.bindings.len();
        self.bindings
            .retain(|_, (kind, _)| *kind != BindingKind::User);
        before - self.bindings.len()
    }
}
