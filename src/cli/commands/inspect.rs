//! Inspect command - show the previous build's layer record

use crate::cli::args::{InspectArgs, OutputFormat};
use crate::error::BuildpackResult;
use crate::layer::{LayerMetadata, MetadataStore};
use crate::resolve::TOOL_ID;
use console::style;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
struct InspectReport {
    record: String,
    present: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stack: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    built_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    artifact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    digest: Option<String>,
}

impl InspectReport {
    fn new(record: &Path, md: Option<&LayerMetadata>) -> Self {
        Self {
            record: record.display().to_string(),
            present: md.is_some(),
            version: md.map(|m| m.fingerprint.version.to_string()),
            source: md.map(|m| m.fingerprint.source_name.clone()),
            stack: md.map(|m| m.fingerprint.stack_id.clone()),
            built_at: md.map(|m| m.built_at.to_rfc3339()),
            artifact: md.map(|m| m.artifact_path.display().to_string()),
            digest: md.map(|m| m.fingerprint.digest()),
        }
    }
}

/// Execute the inspect command
pub async fn execute(args: InspectArgs) -> BuildpackResult<()> {
    let store = MetadataStore::new(&args.layers_dir);
    let record = store.record_path(TOOL_ID);
    let md = store.load(TOOL_ID).await?;

    match args.format {
        OutputFormat::Json => {
            let report = InspectReport::new(&record, md.as_ref());
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => match md {
            None => println!("No layer record at {}", record.display()),
            Some(md) => print_text(&record, &md),
        },
    }

    Ok(())
}

fn print_text(record: &Path, md: &LayerMetadata) {
    println!("{}", style(record.display()).bold());
    let rows = [
        ("Version", md.fingerprint.version.to_string()),
        ("Source", md.fingerprint.source_name.clone()),
        ("Stack", md.fingerprint.stack_id.clone()),
        ("Built at", md.built_at.to_rfc3339()),
        ("Artifact", md.artifact_path.display().to_string()),
        ("Digest", md.fingerprint.digest()),
    ];
    for (key, value) in rows {
        println!("  {:<10} {}", style(key).dim(), value);
    }
}
