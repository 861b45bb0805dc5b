//! Resolve command - show the selected version without installing

use crate::build::resolve_version;
use crate::cli::args::{OutputFormat, ResolveArgs};
use crate::config::Config;
use crate::error::BuildpackResult;
use crate::resolve::ResolvedVersion;
use crate::ui::{Emitter, UiContext};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ResolveReport<'a> {
    tool: &'a str,
    version: String,
    source: &'a str,
    constraint: &'a str,
    uri: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha256: Option<&'a str>,
}

impl<'a> From<&'a ResolvedVersion> for ResolveReport<'a> {
    fn from(rv: &'a ResolvedVersion) -> Self {
        Self {
            tool: &rv.dependency.id,
            version: rv.value.to_string(),
            source: &rv.chosen_source_name,
            constraint: &rv.constraint,
            uri: &rv.dependency.uri,
            sha256: rv.dependency.sha256.as_deref(),
        }
    }
}

/// Execute the resolve command
pub async fn execute(args: ResolveArgs, config: &Config) -> BuildpackResult<()> {
    let inputs = &args.inputs;

    match args.format {
        OutputFormat::Text => {
            let mut emitter = Emitter::stdout();
            emitter.title(&config.buildpack.title())?;
            resolve_version(
                config,
                &inputs.app_dir,
                &inputs.stack_id,
                inputs.version_override.as_deref(),
                &mut emitter,
            )
            .await?;
        }
        OutputFormat::Json => {
            let mut emitter = Emitter::new(std::io::sink(), UiContext::plain());
            let rv = resolve_version(
                config,
                &inputs.app_dir,
                &inputs.stack_id,
                inputs.version_override.as_deref(),
                &mut emitter,
            )
            .await?;
            println!("{}", serde_json::to_string_pretty(&ResolveReport::from(&rv))?);
        }
    }

    Ok(())
}
