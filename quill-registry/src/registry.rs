//! Capability registry
//!
//! Thread-safe mapping from binding name to service descriptor plus either a
//! live instance or a factory. Mutations are serialized by a registry-wide
//! write lock; reads run concurrently. Lazy instantiation is double-checked
//! under a per-entry mutex so a factory runs at most once on success.

use crate::meta::{MethodMeta, PropertyMeta, ScriptService, ServiceMeta};
use parking_lot::{Mutex, RwLock};
use quill_core::{LogSink, ServiceError};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;

/// Runtime record for a registered service, distinct from the instance itself
#[derive(Debug, Clone, Serialize)]
pub struct ServiceDescriptor {
    pub name: String,
    pub type_name: String,
    pub version: String,
    pub description: String,
    pub is_core: bool,
    pub is_enabled: bool,
    #[serde(skip)]
    pub registered_at: SystemTime,
    pub methods: Vec<MethodMeta>,
    pub properties: Vec<PropertyMeta>,
}

impl ServiceDescriptor {
    fn from_meta(name: String, type_name: &str, meta: &ServiceMeta) -> Self {
        Self {
            name,
            type_name: type_name.to_string(),
            version: meta.version.to_string(),
            description: meta.description.to_string(),
            is_core: meta.core,
            is_enabled: true,
            registered_at: SystemTime::now(),
            methods: meta.methods.to_vec(),
            properties: meta.properties.to_vec(),
        }
    }

    pub fn method(&self, name: &str) -> Option<&MethodMeta> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// Registry state-change notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    Registered { name: String },
    Unregistered { name: String },
    StateChanged { name: String, enabled: bool },
}

pub type RegistryListener = Box<dyn Fn(&RegistryEvent) + Send + Sync>;

/// Factory for a lazily-created service
pub type ServiceFactory = Box<dyn Fn() -> Result<Arc<dyn ScriptService>, ServiceError> + Send + Sync>;

/// One entry in an explicit discovery table
pub struct ServiceRegistration {
    /// Human label used in discovery logs
    pub label: &'static str,
    /// Constructs the service; a failing constructor is skipped, not fatal
    pub construct: Box<dyn Fn() -> Result<Arc<dyn ScriptService>, ServiceError> + Send + Sync>,
    pub name_override: Option<&'static str>,
}

enum Slot {
    Ready(Arc<dyn ScriptService>),
    Lazy {
        factory: ServiceFactory,
        cached: Mutex<Option<Arc<dyn ScriptService>>>,
    },
}

struct Entry {
    descriptor: ServiceDescriptor,
    slot: Slot,
}

/// Thread-safe capability registry
pub struct CapabilityRegistry {
    services: RwLock<HashMap<String, Entry>>,
    listeners: Mutex<Vec<RegistryListener>>,
    log: Arc<dyn LogSink>,
}

impl CapabilityRegistry {
    pub fn new(log: Arc<dyn LogSink>) -> Self {
        Self {
            services: RwLock::new(HashMap::new()),
            listeners: Mutex::new(Vec::new()),
            log,
        }
    }

    /// Subscribe to registry events. Delivery is synchronous and follows
    /// mutation order.
    pub fn subscribe(&self, listener: RegistryListener) {
        self.listeners.lock().push(listener);
    }

    /// Register a live service instance.
    ///
    /// Returns false without mutating anything if the resolved name is
    /// already taken. Name resolution: explicit override, then the
    /// metadata name, then the snake_cased type name with a `Service`
    /// suffix stripped.
    pub fn register<S: ScriptService + 'static>(
        &self,
        service: S,
        name_override: Option<&str>,
    ) -> bool {
        let type_name = short_type_name(std::any::type_name::<S>());
        let meta = service.meta();
        let name = resolve_name(name_override, &meta, Some(type_name));
        let Some(name) = name else {
            self.log.error("register: service has no resolvable name");
            return false;
        };
        let descriptor = ServiceDescriptor::from_meta(name, type_name, &meta);
        self.insert(descriptor, Slot::Ready(Arc::new(service)))
    }

    /// Register an already-shared service instance.
    pub fn register_arc(&self, service: Arc<dyn ScriptService>, name_override: Option<&str>) -> bool {
        let meta = service.meta();
        let Some(name) = resolve_name(name_override, &meta, None) else {
            self.log.error("register: service has no resolvable name");
            return false;
        };
        let descriptor = ServiceDescriptor::from_meta(name, meta.name, &meta);
        self.insert(descriptor, Slot::Ready(service))
    }

    /// Register a factory-backed service without invoking the factory.
    ///
    /// The metadata is supplied up front so the descriptor exists before
    /// any instance does.
    pub fn register_factory(
        &self,
        meta: ServiceMeta,
        factory: ServiceFactory,
        name_override: Option<&str>,
    ) -> bool {
        let Some(name) = resolve_name(name_override, &meta, None) else {
            self.log.error("register_factory: service has no resolvable name");
            return false;
        };
        let descriptor = ServiceDescriptor::from_meta(name, meta.name, &meta);
        self.insert(
            descriptor,
            Slot::Lazy {
                factory,
                cached: Mutex::new(None),
            },
        )
    }

    fn insert(&self, descriptor: ServiceDescriptor, slot: Slot) -> bool {
        let name = descriptor.name.clone();
        let mut services = self.services.write();
        if services.contains_key(&name) {
            return false;
        }
        services.insert(name.clone(), Entry { descriptor, slot });
        // Listener lock taken before the write lock drops so events keep
        // mutation order.
        let listeners = self.listeners.lock();
        drop(services);
        self.log.info(&format!("registered service '{}'", name));
        let event = RegistryEvent::Registered { name };
        for listener in listeners.iter() {
            listener(&event);
        }
        true
    }

    /// Remove a service. Fails for unknown names and for core services.
    pub fn unregister(&self, name: &str) -> bool {
        let mut services = self.services.write();
        match services.get(name) {
            None => return false,
            Some(entry) if entry.descriptor.is_core => return false,
            Some(_) => {}
        }
        services.remove(name);
        let listeners = self.listeners.lock();
        drop(services);
        self.log.info(&format!("unregistered service '{}'", name));
        let event = RegistryEvent::Unregistered {
            name: name.to_string(),
        };
        for listener in listeners.iter() {
            listener(&event);
        }
        true
    }

    /// Resolve a service instance.
    ///
    /// `Ok(None)` for unknown or disabled names. A lazy entry runs its
    /// factory at most once; a factory error is propagated and nothing is
    /// cached, so the next call retries.
    pub fn get(&self, name: &str) -> Result<Option<Arc<dyn ScriptService>>, ServiceError> {
        let services = self.services.read();
        let Some(entry) = services.get(name) else {
            return Ok(None);
        };
        if !entry.descriptor.is_enabled {
            return Ok(None);
        }
        match &entry.slot {
            Slot::Ready(service) => Ok(Some(service.clone())),
            Slot::Lazy { factory, cached } => {
                let mut cached = cached.lock();
                if let Some(service) = cached.as_ref() {
                    return Ok(Some(service.clone()));
                }
                let service = factory()?;
                *cached = Some(service.clone());
                Ok(Some(service))
            }
        }
    }

    /// Enable or disable a service. Disabling a core service fails.
    pub fn set_enabled(&self, name: &str, enabled: bool) -> bool {
        let mut services = self.services.write();
        let Some(entry) = services.get_mut(name) else {
            return false;
        };
        if entry.descriptor.is_core && !enabled {
            return false;
        }
        entry.descriptor.is_enabled = enabled;
        let listeners = self.listeners.lock();
        drop(services);
        let event = RegistryEvent::StateChanged {
            name: name.to_string(),
            enabled,
        };
        for listener in listeners.iter() {
            listener(&event);
        }
        true
    }

    /// Walk an explicit registration table, skipping entries whose
    /// constructor fails or whose name collides. Returns the number of
    /// newly registered services.
    pub fn auto_discover(&self, catalog: &[ServiceRegistration]) -> usize {
        let mut count = 0;
        for registration in catalog {
            match (registration.construct)() {
                Ok(service) => {
                    if self.register_arc(service, registration.name_override) {
                        count += 1;
                    } else {
                        self.log.info(&format!(
                            "discovery: skipped '{}' (name already registered)",
                            registration.label
                        ));
                    }
                }
                Err(err) => {
                    self.log.error(&format!(
                        "discovery: failed to construct '{}': {}",
                        registration.label, err
                    ));
                }
            }
        }
        count
    }

    /// Snapshot of all descriptors, sorted by name for stable output
    pub fn list_all(&self) -> Vec<ServiceDescriptor> {
        let services = self.services.read();
        let mut all: Vec<ServiceDescriptor> =
            services.values().map(|e| e.descriptor.clone()).collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let services = self.services.read();
        let mut names: Vec<String> = services.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.services.read().contains_key(name)
    }

    pub fn descriptor(&self, name: &str) -> Option<ServiceDescriptor> {
        self.services.read().get(name).map(|e| e.descriptor.clone())
    }

    /// True iff the method's declared permission is within `required`
    pub fn validate_permission(
        &self,
        name: &str,
        method: &str,
        required: crate::meta::Permission,
    ) -> bool {
        let services = self.services.read();
        let Some(entry) = services.get(name) else {
            return false;
        };
        match entry.descriptor.method(method) {
            Some(meta) => meta.permission <= required,
            None => false,
        }
    }

    /// Generate human-readable documentation for the current snapshot
    pub fn generate_documentation(&self, format: crate::docs::DocFormat) -> String {
        crate::docs::generate(&self.list_all(), format)
    }

    /// Generate completion/signature data for the current snapshot
    pub fn generate_intellisense_data(&self) -> crate::intellisense::IntelliSenseData {
        crate::intellisense::generate_intellisense(&self.list_all())
    }
}

/// Name a service would be registered under, without registering it
pub fn resolve_binding_name(meta: &ServiceMeta, name_override: Option<&str>) -> Option<String> {
    resolve_name(name_override, meta, None)
}

fn resolve_name(
    name_override: Option<&str>,
    meta: &ServiceMeta,
    type_name: Option<&str>,
) -> Option<String> {
    if let Some(name) = name_override {
        if !name.trim().is_empty() {
            return Some(name.to_string());
        }
    }
    if !meta.name.trim().is_empty() {
        return Some(meta.name.to_string());
    }
    type_name.map(derive_binding_name)
}

/// Last path segment of a fully-qualified Rust type name
fn short_type_name(full: &str) -> &str {
    full.rsplit("::").next().unwrap_or(full)
}

/// `CsvDataService` -> `csv_data`
fn derive_binding_name(type_name: &str) -> String {
    let trimmed = type_name.strip_suffix("Service").unwrap_or(type_name);
    let mut out = String::with_capacity(trimmed.len() + 4);
    for (i, c) in trimmed.chars().enumerate() {
        if i > 0 && c.is_uppercase() {
            out.push('_');
        }
        out.extend(c.to_lowercase());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::{MethodMeta, ParamMeta, Permission, ServiceMeta};
    use quill_core::{tracing_sink, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;

    static PING_PARAMS: [ParamMeta; 0] = [];
    static PING_METHODS: [MethodMeta; 1] = [MethodMeta::new(
        "ping",
        "Responds with pong",
        "ping()",
        "General",
        &PING_PARAMS,
        "Text",
    )];

    struct PingService;

    impl ScriptService for PingService {
        fn meta(&self) -> ServiceMeta {
            ServiceMeta {
                name: "ping",
                version: "1.0.0",
                description: "Test service",
                core: false,
                methods: &PING_METHODS,
                properties: &[],
            }
        }

        fn call(&self, method: &str, _args: &[Value]) -> Result<Value, ServiceError> {
            match method {
                "ping" => Ok(Value::Text("pong".into())),
                other => Err(ServiceError::unknown_method("ping", other)),
            }
        }
    }

    struct CoreService;

    impl ScriptService for CoreService {
        fn meta(&self) -> ServiceMeta {
            ServiceMeta {
                name: "host",
                version: "1.0.0",
                description: "Core test service",
                core: true,
                methods: &[],
                properties: &[],
            }
        }

        fn call(&self, method: &str, _args: &[Value]) -> Result<Value, ServiceError> {
            Err(ServiceError::unknown_method("host", method))
        }
    }

    /// Unnamed service, forces type-name derivation
    struct CsvDataService;

    impl ScriptService for CsvDataService {
        fn meta(&self) -> ServiceMeta {
            ServiceMeta {
                name: "",
                version: "1.0.0",
                description: "",
                core: false,
                methods: &[],
                properties: &[],
            }
        }

        fn call(&self, method: &str, _args: &[Value]) -> Result<Value, ServiceError> {
            Err(ServiceError::unknown_method("csv_data", method))
        }
    }

    fn registry() -> CapabilityRegistry {
        CapabilityRegistry::new(tracing_sink())
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let reg = registry();
        assert!(reg.register(PingService, None));
        assert!(!reg.register(PingService, None));
        assert_eq!(reg.names(), vec!["ping".to_string()]);
    }

    #[test]
    fn test_name_override_wins() {
        let reg = registry();
        assert!(reg.register(PingService, Some("ping2")));
        assert!(reg.contains("ping2"));
        assert!(!reg.contains("ping"));
    }

    #[test]
    fn test_derived_snake_case_name() {
        let reg = registry();
        assert!(reg.register(CsvDataService, None));
        assert!(reg.contains("csv_data"));
    }

    #[test]
    fn test_unregister_core_fails() {
        let reg = registry();
        assert!(reg.register(CoreService, None));
        assert!(!reg.unregister("host"));
        assert!(reg.contains("host"));
    }

    #[test]
    fn test_unregister_unknown_fails() {
        let reg = registry();
        assert!(!reg.unregister("nope"));
    }

    #[test]
    fn test_disable_core_fails() {
        let reg = registry();
        assert!(reg.register(CoreService, None));
        assert!(!reg.set_enabled("host", false));
        assert!(reg.descriptor("host").map(|d| d.is_enabled).unwrap_or(false));
    }

    #[test]
    fn test_disabled_service_not_resolved() {
        let reg = registry();
        assert!(reg.register(PingService, None));
        assert!(reg.set_enabled("ping", false));
        assert!(reg.get("ping").unwrap().is_none());
        assert!(reg.set_enabled("ping", true));
        assert!(reg.get("ping").unwrap().is_some());
    }

    #[test]
    fn test_factory_invoked_once_under_contention() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        let reg = Arc::new(registry());
        let meta = PingService.meta();
        assert!(reg.register_factory(
            meta,
            Box::new(|| {
                CALLS.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::new(PingService) as Arc<dyn ScriptService>)
            }),
            Some("lazy_ping"),
        ));

        let threads = 8;
        let barrier = Arc::new(Barrier::new(threads));
        let mut handles = Vec::new();
        for _ in 0..threads {
            let reg = reg.clone();
            let barrier = barrier.clone();
            handles.push(std::thread::spawn(move || {
                barrier.wait();
                reg.get("lazy_ping").unwrap().unwrap()
            }));
        }
        let instances: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
        for instance in &instances[1..] {
            assert!(Arc::ptr_eq(&instances[0], instance));
        }
    }

    #[test]
    fn test_failing_factory_retries() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        let reg = registry();
        assert!(reg.register_factory(
            PingService.meta(),
            Box::new(|| {
                if CALLS.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(ServiceError::construction("flaky"))
                } else {
                    Ok(Arc::new(PingService) as Arc<dyn ScriptService>)
                }
            }),
            Some("flaky"),
        ));

        assert!(reg.get("flaky").is_err());
        // Nothing cached, second call retries and succeeds
        assert!(reg.get("flaky").unwrap().is_some());
        assert_eq!(CALLS.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_events_in_mutation_order() {
        let reg = registry();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        reg.subscribe(Box::new(move |event| sink.lock().push(event.clone())));

        reg.register(PingService, None);
        reg.set_enabled("ping", false);
        reg.unregister("ping");

        let seen = seen.lock();
        assert_eq!(
            *seen,
            vec![
                RegistryEvent::Registered { name: "ping".into() },
                RegistryEvent::StateChanged { name: "ping".into(), enabled: false },
                RegistryEvent::Unregistered { name: "ping".into() },
            ]
        );
    }

    #[test]
    fn test_auto_discover_skips_bad_entries() {
        let reg = registry();
        let catalog = vec![
            ServiceRegistration {
                label: "ping",
                construct: Box::new(|| Ok(Arc::new(PingService) as Arc<dyn ScriptService>)),
                name_override: None,
            },
            ServiceRegistration {
                label: "broken",
                construct: Box::new(|| Err(ServiceError::construction("no constructor"))),
                name_override: None,
            },
            ServiceRegistration {
                label: "ping again",
                construct: Box::new(|| Ok(Arc::new(PingService) as Arc<dyn ScriptService>)),
                name_override: None,
            },
        ];
        assert_eq!(reg.auto_discover(&catalog), 1);
        assert_eq!(reg.names(), vec!["ping".to_string()]);
    }

    #[test]
    fn test_validate_permission() {
        let reg = registry();
        reg.register(PingService, None);
        assert!(reg.validate_permission("ping", "ping", Permission::Standard));
        assert!(reg.validate_permission("ping", "ping", Permission::Administrative));
        assert!(!reg.validate_permission("ping", "missing", Permission::Administrative));
        assert!(!reg.validate_permission("missing", "ping", Permission::Administrative));
    }
}
