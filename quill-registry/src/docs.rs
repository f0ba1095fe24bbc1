//! Documentation generator
//!
//! Pure transformation from a descriptor snapshot to formatted text.
//! Services are sorted by name and members by name within each service, so
//! two runs over an unchanged snapshot produce byte-identical output.

use crate::meta::{MethodMeta, PropertyMeta};
use crate::registry::ServiceDescriptor;
use std::fmt::Write;

/// Output format for generated documentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocFormat {
    Markdown,
    Html,
    PlainText,
    Json,
}

/// Render documentation for a registry snapshot
pub fn generate(services: &[ServiceDescriptor], format: DocFormat) -> String {
    let sorted = sorted_snapshot(services);
    match format {
        DocFormat::Markdown => generate_markdown(&sorted),
        DocFormat::Html => generate_html(&sorted),
        DocFormat::PlainText => generate_plain_text(&sorted),
        DocFormat::Json => generate_json(&sorted),
    }
}

/// Snapshot with deterministic ordering: services by name, members by name
fn sorted_snapshot(services: &[ServiceDescriptor]) -> Vec<ServiceDescriptor> {
    let mut sorted = services.to_vec();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));
    for service in &mut sorted {
        service.methods.sort_by(|a, b| a.name.cmp(b.name));
        service.properties.sort_by(|a, b| a.name.cmp(b.name));
    }
    sorted
}

fn generate_markdown(services: &[ServiceDescriptor]) -> String {
    let mut out = String::new();
    out.push_str("# API Documentation\n\n");

    for service in services {
        let _ = writeln!(out, "## {}\n", service.name);
        let _ = writeln!(out, "**Version:** {}", service.version);
        let _ = writeln!(out, "**Description:** {}", service.description);
        let _ = writeln!(out, "**Type:** {}\n", service.type_name);

        if !service.methods.is_empty() {
            out.push_str("### Methods\n\n");
            for method in &service.methods {
                let _ = writeln!(out, "#### {}\n", method.name);
                let _ = writeln!(out, "**Description:** {}", method.description);
                if let Some(message) = method.deprecated {
                    let _ = writeln!(out, "**Deprecated:** {}", message);
                }
                if !method.params.is_empty() {
                    out.push_str("\n**Parameters:**\n");
                    for param in method.params {
                        let _ = writeln!(
                            out,
                            "- `{}` ({}): {}",
                            param.name, param.typ, param.description
                        );
                    }
                }
                if !method.example.is_empty() {
                    out.push_str("\n**Example:**\n```\n");
                    out.push_str(method.example);
                    out.push_str("\n```\n");
                }
                out.push('\n');
            }
        }

        if !service.properties.is_empty() {
            out.push_str("### Properties\n\n");
            for property in &service.properties {
                let _ = writeln!(out, "#### {}\n", property.name);
                let _ = writeln!(out, "**Type:** {}", property.typ);
                let _ = writeln!(out, "**Description:** {}", property.description);
                let _ = writeln!(
                    out,
                    "**Read:** {}, **Write:** {}\n",
                    property.readable, property.writable
                );
            }
        }

        out.push_str("---\n\n");
    }

    out
}

fn generate_html(services: &[ServiceDescriptor]) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n");
    out.push_str("<html><head><title>API Documentation</title></head><body>\n");
    out.push_str("<h1>API Documentation</h1>\n");

    for service in services {
        let _ = writeln!(out, "<h2>{}</h2>", service.name);
        let _ = writeln!(
            out,
            "<p><strong>Description:</strong> {}</p>",
            service.description
        );
        if !service.methods.is_empty() {
            out.push_str("<h3>Methods</h3>\n");
            for method in &service.methods {
                let _ = writeln!(out, "<h4>{}</h4>", method.name);
                let _ = writeln!(out, "<p>{}</p>", method.description);
            }
        }
        if !service.properties.is_empty() {
            out.push_str("<h3>Properties</h3>\n");
            for property in &service.properties {
                let _ = writeln!(out, "<h4>{}</h4>", property.name);
                let _ = writeln!(out, "<p>{}</p>", property.description);
            }
        }
    }

    out.push_str("</body></html>\n");
    out
}

fn generate_plain_text(services: &[ServiceDescriptor]) -> String {
    let mut out = String::new();
    out.push_str("API DOCUMENTATION\n");
    out.push_str(&"=".repeat(50));
    out.push('\n');

    for service in services {
        let _ = writeln!(out, "\n{}", service.name);
        out.push_str(&"-".repeat(service.name.len()));
        out.push('\n');
        let _ = writeln!(out, "Description: {}", service.description);
        for method in &service.methods {
            let _ = writeln!(out, "  {}: {}", method.name, method.description);
        }
        for property in &service.properties {
            let _ = writeln!(out, "  {} (property): {}", property.name, property.description);
        }
    }

    out
}

fn generate_json(services: &[ServiceDescriptor]) -> String {
    // Snapshot is pre-sorted, so serialization order is stable
    serde_json::to_string_pretty(services).unwrap_or_else(|_| "[]".to_string())
}

/// One-paragraph documentation string for a single method, used as the
/// completion item body
pub(crate) fn method_documentation(method: &MethodMeta) -> String {
    let mut out = String::new();
    out.push_str(method.description);
    if !method.params.is_empty() {
        out.push_str("\n\nParameters:\n");
        for param in method.params {
            let _ = writeln!(
                out,
                "  {} ({}): {}",
                param.name, param.typ, param.description
            );
        }
    }
    out
}

pub(crate) fn property_documentation(property: &PropertyMeta) -> String {
    property.description.to_string()
}
