//! IntelliSense data generation and the editor feed
//!
//! Turns a registry snapshot into completion items and signatures. Only
//! enabled services contribute. The feed pushes the result into an
//! editor-owned `CompletionSink`; the editor itself is out of scope.

use crate::docs::{method_documentation, property_documentation};
use crate::registry::{CapabilityRegistry, ServiceDescriptor};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CompletionKind {
    Method,
    Property,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompletionItem {
    pub label: String,
    pub detail: String,
    pub documentation: String,
    pub insert_text: String,
    pub kind: CompletionKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParameterInfo {
    pub label: String,
    pub documentation: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignatureInfo {
    pub label: String,
    pub documentation: String,
    pub parameters: Vec<ParameterInfo>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct IntelliSenseData {
    pub completion_items: Vec<CompletionItem>,
    pub signatures: Vec<SignatureInfo>,
}

/// Build completion and signature data from a snapshot.
/// Disabled services are excluded entirely.
pub fn generate_intellisense(services: &[ServiceDescriptor]) -> IntelliSenseData {
    let mut sorted: Vec<&ServiceDescriptor> =
        services.iter().filter(|s| s.is_enabled).collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));

    let mut data = IntelliSenseData::default();
    for service in sorted {
        for method in &service.methods {
            let params: Vec<&str> = method.params.iter().map(|p| p.name).collect();
            data.completion_items.push(CompletionItem {
                label: format!("{}.{}", service.name, method.name),
                detail: method.description.to_string(),
                documentation: method_documentation(method),
                insert_text: format!("{}.{}({})", service.name, method.name, params.join(", ")),
                kind: CompletionKind::Method,
            });
            let typed_params: Vec<String> = method
                .params
                .iter()
                .map(|p| format!("{}: {}", p.name, p.typ))
                .collect();
            data.signatures.push(SignatureInfo {
                label: format!(
                    "{}.{}({})",
                    service.name,
                    method.name,
                    typed_params.join(", ")
                ),
                documentation: method.description.to_string(),
                parameters: method
                    .params
                    .iter()
                    .map(|p| ParameterInfo {
                        label: p.name.to_string(),
                        documentation: p.description.to_string(),
                    })
                    .collect(),
            });
        }

        for property in &service.properties {
            data.completion_items.push(CompletionItem {
                label: format!("{}.{}", service.name, property.name),
                detail: property.description.to_string(),
                documentation: property_documentation(property),
                insert_text: format!("{}.{}", service.name, property.name),
                kind: CompletionKind::Property,
            });
        }
    }
    data
}

/// Editor boundary: the autocompletion UI consumes these calls and nothing else
pub trait CompletionSink: Send + Sync {
    fn add_completion_item(&self, item: &CompletionItem);
    fn clear_dynamic_completions(&self);
}

/// Pushes registry-derived completions into an editor sink
pub struct IntelliSenseFeed {
    sink: Arc<dyn CompletionSink>,
}

impl IntelliSenseFeed {
    pub fn new(sink: Arc<dyn CompletionSink>) -> Self {
        Self { sink }
    }

    /// Clear the dynamic completion set and repopulate it from the
    /// registry's current snapshot
    pub fn refresh(&self, registry: &CapabilityRegistry) -> IntelliSenseData {
        let data = registry.generate_intellisense_data();
        self.sink.clear_dynamic_completions();
        for item in &data.completion_items {
            self.sink.add_completion_item(item);
        }
        data
    }
}
