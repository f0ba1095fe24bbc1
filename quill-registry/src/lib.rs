//! Quill Capability Registry
//!
//! Thread-safe registry of host-side services exposed to scripts:
//! - `ScriptService` trait and static metadata model
//! - `CapabilityRegistry` with enable/disable, lazy factories, discovery
//! - Documentation and IntelliSense generation from live metadata

mod docs;
mod intellisense;
mod meta;
mod registry;

pub use docs::{generate, DocFormat};
pub use intellisense::{
    generate_intellisense, CompletionItem, CompletionKind, CompletionSink, IntelliSenseData,
    IntelliSenseFeed, ParameterInfo, SignatureInfo,
};
pub use meta::{MethodMeta, ParamMeta, Permission, PropertyMeta, ScriptService, ServiceMeta};
pub use registry::{
    resolve_binding_name, CapabilityRegistry, RegistryEvent, RegistryListener, ServiceDescriptor,
    ServiceFactory, ServiceRegistration,
};

/// Re-export core types for service authors
pub mod prelude {
    pub use crate::{
        CapabilityRegistry, MethodMeta, ParamMeta, Permission, PropertyMeta, ScriptService,
        ServiceMeta,
    };
    pub use quill_core::prelude::*;
}
