//! Build command - resolve and install Bundler into its layer

use crate::build::{BuildContext, BuildStep};
use crate::cli::args::BuildArgs;
use crate::config::Config;
use crate::error::BuildpackResult;
use crate::install::GemInstaller;
use crate::ui::Emitter;
use std::sync::Arc;
use tracing::debug;

/// Execute the build command
pub async fn execute(args: BuildArgs, config: Config) -> BuildpackResult<()> {
    let installer = Arc::new(GemInstaller::new(&config.metadata.install));
    let mut step = BuildStep::new(config, installer, Emitter::stdout());

    let ctx = BuildContext {
        app_dir: args.inputs.app_dir,
        layers_dir: args.layers_dir,
        stack_id: args.inputs.stack_id,
        override_value: args.inputs.version_override,
    };

    let outcome = step.run(&ctx).await?;
    debug!(
        "Build finished: {} {} ({})",
        outcome.decision,
        outcome.layer_path.display(),
        outcome.metadata.fingerprint.digest()
    );
    Ok(())
}
