//! Quill command-line host
//!
//! Usage:
//! - `quill <script>`          run a script file against the default scope
//! - `quill`                   run a script read from stdin
//! - `quill --docs <format>`   print service documentation (markdown, html, text, json)
//! - `quill --intellisense`    print completion/signature data as JSON
//! - `quill --services`        list registered services

use quill_core::tracing_sink;
use quill_engine::ScriptEngine;
use quill_registry::{CapabilityRegistry, DocFormat};
use quill_script::{CancelToken, QuillInterpreter};
use quill_services::{builtin_catalog, HostCallbacks, HostService};
use std::env;
use std::fs;
use std::io::Read;
use std::process::ExitCode;
use std::sync::Arc;

fn build_engine() -> ScriptEngine {
    let log = tracing_sink();
    let registry = Arc::new(CapabilityRegistry::new(log.clone()));

    let discovered = registry.auto_discover(&builtin_catalog());
    tracing::debug!(discovered, "service discovery finished");

    // Console host: no document, status goes to the log
    let callbacks = HostCallbacks {
        active_document: Box::new(|| None),
        status_text: Box::new(|text| tracing::info!(status = text, "status bar")),
    };
    registry.register(HostService::new(callbacks, log.clone()), None);

    ScriptEngine::new(registry, Arc::new(QuillInterpreter::new()), log)
}

fn read_source(path: Option<&str>) -> Result<(String, String), String> {
    match path {
        Some(path) => {
            let source = fs::read_to_string(path)
                .map_err(|err| format!("cannot read '{}': {}", path, err))?;
            Ok((source, path.to_string()))
        }
        None => {
            let mut source = String::new();
            std::io::stdin()
                .read_to_string(&mut source)
                .map_err(|err| format!("cannot read stdin: {}", err))?;
            Ok((source, "<stdin>".to_string()))
        }
    }
}

fn doc_format(name: &str) -> Option<DocFormat> {
    match name {
        "markdown" | "md" => Some(DocFormat::Markdown),
        "html" => Some(DocFormat::Html),
        "text" | "plain" => Some(DocFormat::PlainText),
        "json" => Some(DocFormat::Json),
        _ => None,
    }
}

fn usage() -> ExitCode {
    eprintln!("usage: quill [<script> | --docs <format> | --intellisense | --services]");
    ExitCode::FAILURE
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let engine = build_engine();

    match args.first().map(String::as_str) {
        Some("--docs") => {
            let Some(format) = args.get(1).and_then(|name| doc_format(name)) else {
                return usage();
            };
            print!("{}", engine.registry().generate_documentation(format));
            ExitCode::SUCCESS
        }
        Some("--intellisense") => {
            let data = engine.registry().generate_intellisense_data();
            match serde_json::to_string_pretty(&data) {
                Ok(json) => {
                    println!("{}", json);
                    ExitCode::SUCCESS
                }
                Err(err) => {
                    eprintln!("error: {}", err);
                    ExitCode::FAILURE
                }
            }
        }
        Some("--services") => {
            for descriptor in engine.registry().list_all() {
                println!(
                    "{} v{} ({} methods){}",
                    descriptor.name,
                    descriptor.version,
                    descriptor.methods.len(),
                    if descriptor.is_core { " [core]" } else { "" }
                );
            }
            ExitCode::SUCCESS
        }
        Some(flag) if flag.starts_with("--") => usage(),
        path => {
            let (source, label) = match read_source(path) {
                Ok(input) => input,
                Err(message) => {
                    eprintln!("error: {}", message);
                    return ExitCode::FAILURE;
                }
            };

            if let Err(err) = engine.publish_registry_to_current_scope() {
                eprintln!("error: {}", err);
                return ExitCode::FAILURE;
            }

            match engine.execute(source, label, CancelToken::new()).await {
                Ok(value) => {
                    println!("{}", value);
                    ExitCode::SUCCESS
                }
                Err(err) => {
                    eprintln!("error: {}", err);
                    ExitCode::FAILURE
                }
            }
        }
    }
}
