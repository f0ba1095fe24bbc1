//! Service metadata and the self-description trait
//!
//! Metadata travels with the service type as `&'static` tables. A service
//! hands the registry its `ServiceMeta` instead of being reflected over at
//! runtime; members absent from the tables are invisible to scripts and to
//! the documentation generator.

use quill_core::{ServiceError, Value};
use serde::Serialize;

/// Permission level bounding which callers may invoke a member.
/// Ordered: a lower level is less restrictive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Permission {
    Standard,
    FileAccess,
    NetworkAccess,
    SystemAccess,
    Administrative,
}

/// Metadata about a method parameter
#[derive(Debug, Clone, Serialize)]
pub struct ParamMeta {
    pub name: &'static str,
    pub typ: &'static str,
    pub description: &'static str,
    pub optional: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<&'static str>,
}

impl ParamMeta {
    pub const fn required(name: &'static str, typ: &'static str, description: &'static str) -> Self {
        Self {
            name,
            typ,
            description,
            optional: false,
            default: None,
        }
    }

    pub const fn optional(
        name: &'static str,
        typ: &'static str,
        description: &'static str,
        default: &'static str,
    ) -> Self {
        Self {
            name,
            typ,
            description,
            optional: true,
            default: Some(default),
        }
    }
}

/// Metadata for a script-callable method
#[derive(Debug, Clone, Serialize)]
pub struct MethodMeta {
    pub name: &'static str,
    pub description: &'static str,
    pub example: &'static str,
    pub category: &'static str,
    pub permission: Permission,
    pub is_async: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<&'static str>,
    pub params: &'static [ParamMeta],
    pub returns: &'static str,
}

impl MethodMeta {
    /// Standard-permission method with no deprecation, the common case
    pub const fn new(
        name: &'static str,
        description: &'static str,
        example: &'static str,
        category: &'static str,
        params: &'static [ParamMeta],
        returns: &'static str,
    ) -> Self {
        Self {
            name,
            description,
            example,
            category,
            permission: Permission::Standard,
            is_async: false,
            deprecated: None,
            params,
            returns,
        }
    }

    pub const fn with_permission(mut self, permission: Permission) -> Self {
        self.permission = permission;
        self
    }

    pub const fn deprecated(mut self, message: &'static str) -> Self {
        self.deprecated = Some(message);
        self
    }
}

/// Metadata for a script-readable property
#[derive(Debug, Clone, Serialize)]
pub struct PropertyMeta {
    pub name: &'static str,
    pub typ: &'static str,
    pub description: &'static str,
    pub example: &'static str,
    pub permission: Permission,
    pub readable: bool,
    pub writable: bool,
}

impl PropertyMeta {
    pub const fn read_only(
        name: &'static str,
        typ: &'static str,
        description: &'static str,
        example: &'static str,
    ) -> Self {
        Self {
            name,
            typ,
            description,
            example,
            permission: Permission::Standard,
            readable: true,
            writable: false,
        }
    }
}

/// Metadata for a whole service
#[derive(Debug, Clone, Serialize)]
pub struct ServiceMeta {
    /// Binding name visible to scripts. Empty means "derive from the type name".
    pub name: &'static str,
    pub version: &'static str,
    pub description: &'static str,
    /// Core services cannot be unregistered or disabled
    pub core: bool,
    pub methods: &'static [MethodMeta],
    pub properties: &'static [PropertyMeta],
}

/// A host-side object exposed to scripts under a stable name.
///
/// Implementors self-describe through `meta()`; only members listed there
/// are reachable from scripts or shown in generated documentation.
pub trait ScriptService: Send + Sync {
    fn meta(&self) -> ServiceMeta;

    /// Invoke a described method. Argument order follows the `ParamMeta` table.
    fn call(&self, method: &str, args: &[Value]) -> Result<Value, ServiceError>;

    /// Read a described property.
    fn get(&self, property: &str) -> Result<Value, ServiceError> {
        Err(ServiceError::unknown_property(self.meta().name, property))
    }
}
