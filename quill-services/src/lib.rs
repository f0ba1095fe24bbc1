//! Built-in Quill services
//!
//! `host` wraps application callbacks and must be registered by the host
//! itself. `math`, `data` and `fs` are no-arg constructible and ship in
//! `builtin_catalog()` for registry discovery.

mod data;
mod fs;
mod host;
mod math;

pub use data::DataService;
pub use fs::FsService;
pub use host::{HostCallbacks, HostService};
pub use math::MathService;

use quill_registry::{ScriptService, ServiceRegistration};
use std::sync::Arc;

/// Discovery table for the services with no construction dependencies
pub fn builtin_catalog() -> Vec<ServiceRegistration> {
    vec![
        ServiceRegistration {
            label: "math",
            construct: Box::new(|| Ok(Arc::new(MathService) as Arc<dyn ScriptService>)),
            name_override: None,
        },
        ServiceRegistration {
            label: "data",
            construct: Box::new(|| Ok(Arc::new(DataService) as Arc<dyn ScriptService>)),
            name_override: None,
        },
        ServiceRegistration {
            label: "fs",
            construct: Box::new(|| Ok(Arc::new(FsService) as Arc<dyn ScriptService>)),
            name_override: None,
        },
    ]
}
