//! Build step
//!
//! One invocation resolves the tool version, then either reuses the cached
//! layer or reinstalls it. The metadata record is removed before anything
//! under the layer is touched and written back only after the artifact and
//! its environment are in place, so an interrupted rebuild leaves no record.

use crate::config::Config;
use crate::error::{BuildpackError, BuildpackResult};
use crate::install::{reset_dir, Installer};
use crate::layer::{
    decide, fingerprint, Decision, LayerEnv, LayerFingerprint, LayerFlags, LayerMetadata,
    MetadataStore,
};
use crate::resolve::{
    for_stack, read_sources, resolve, sources::LOCK_FILE, ResolvedVersion, SourceInputs, TOOL_ID,
    TOOL_NAME,
};
use crate::ui::Emitter;
use chrono::{DateTime, Utc};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::fs;
use tracing::{debug, info, warn};

/// Source of `built_at` timestamps
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Orchestrator-provided inputs for one build
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Application source directory (holds `Gemfile.lock`)
    pub app_dir: PathBuf,
    /// This buildpack's layers directory
    pub layers_dir: PathBuf,
    /// Stack identifier
    pub stack_id: String,
    /// Value of the explicit version override, if set
    pub override_value: Option<String>,
}

/// Result of a build
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    /// What actually happened; a REUSE with a missing artifact reports REBUILD
    pub decision: Decision,
    /// Version chosen and the source that named it
    pub resolved: ResolvedVersion,
    /// Record now on disk for the layer
    pub metadata: LayerMetadata,
    /// `<layers>/bundler`
    pub layer_path: PathBuf,
}

/// Runs the build for one application
pub struct BuildStep<W: Write> {
    config: Config,
    installer: Arc<dyn Installer>,
    emitter: Emitter<W>,
    clock: Clock,
}

impl<W: Write> BuildStep<W> {
    pub fn new(config: Config, installer: Arc<dyn Installer>, emitter: Emitter<W>) -> Self {
        Self {
            config,
            installer,
            emitter,
            clock: Arc::new(Utc::now),
        }
    }

    /// Replace the timestamp source
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Recover the build log sink
    pub fn into_log(self) -> W {
        self.emitter.into_inner()
    }

    pub async fn run(&mut self, ctx: &BuildContext) -> BuildpackResult<BuildOutcome> {
        self.emitter.title(&self.config.buildpack.title())?;

        let resolved = resolve_version(
            &self.config,
            &ctx.app_dir,
            &ctx.stack_id,
            ctx.override_value.as_deref(),
            &mut self.emitter,
        )
        .await?;
        let current = fingerprint(&resolved, &ctx.stack_id);

        let store = MetadataStore::new(&ctx.layers_dir);
        let layer_path = store.layer_path(TOOL_ID);

        let previous = match store.load(TOOL_ID).await {
            Ok(previous) => previous,
            Err(e) if e.is_degradable() => {
                warn!("Ignoring previous layer metadata: {}", e);
                None
            }
            Err(e) => return Err(e),
        };

        // An unreadable artifact path counts as missing
        let artifact_present = match &previous {
            Some(previous) => fs::try_exists(&previous.artifact_path)
                .await
                .unwrap_or(false),
            None => false,
        };

        match (decide(&current, previous.as_ref()), previous) {
            (Decision::Reuse, Some(previous)) if artifact_present => {
                info!("Reusing layer {} ({})", layer_path.display(), current);
                self.emitter.reusing(&layer_path)?;
                Ok(BuildOutcome {
                    decision: Decision::Reuse,
                    resolved,
                    metadata: previous,
                    layer_path,
                })
            }
            (decision, previous) => {
                if decision == Decision::Reuse {
                    if let Some(previous) = &previous {
                        warn!(
                            "Cached artifact {} is missing, rebuilding",
                            previous.artifact_path.display()
                        );
                    }
                }
                let metadata = self.rebuild(&store, &layer_path, &resolved, current).await?;
                Ok(BuildOutcome {
                    decision: Decision::Rebuild,
                    resolved,
                    metadata,
                    layer_path,
                })
            }
        }
    }

    async fn rebuild(
        &mut self,
        store: &MetadataStore,
        layer_path: &Path,
        resolved: &ResolvedVersion,
        current: LayerFingerprint,
    ) -> BuildpackResult<LayerMetadata> {
        store.invalidate(TOOL_ID).await?;
        reset_dir(layer_path).await?;

        self.emitter.executing(TOOL_NAME, &resolved.value)?;
        let started = Instant::now();
        debug!("Installing with {}", self.installer.installer_name());
        let artifact_path = self.installer.install(resolved, layer_path).await?;
        let installed = fs::try_exists(&artifact_path).await.map_err(|e| {
            BuildpackError::io(format!("checking {}", artifact_path.display()), e)
        })?;
        if !installed {
            return Err(BuildpackError::ArtifactMissing(artifact_path));
        }
        self.emitter.completed(started.elapsed())?;

        let env = LayerEnv::for_gem_layer(layer_path);
        env.write(layer_path).await?;

        let metadata = LayerMetadata {
            fingerprint: current,
            built_at: (self.clock)(),
            artifact_path,
        };
        store.save(TOOL_ID, &metadata, LayerFlags::default()).await?;
        info!("Built layer {} ({})", layer_path.display(), metadata.fingerprint);

        self.emitter.environment(&env)?;
        Ok(metadata)
    }
}

/// Read the constraint sources and resolve them against the stack's catalog,
/// emitting the resolution block
pub async fn resolve_version<W: Write>(
    config: &Config,
    app_dir: &Path,
    stack_id: &str,
    override_value: Option<&str>,
    emitter: &mut Emitter<W>,
) -> BuildpackResult<ResolvedVersion> {
    let lock_file = read_lock_file(app_dir).await;
    let sources = read_sources(&SourceInputs {
        lock_file: lock_file.as_deref(),
        override_value,
        default_constraint: &config.metadata.default_versions.bundler,
    });
    emitter.candidates(TOOL_NAME, &sources)?;

    let catalog = for_stack(&config.metadata.dependencies, TOOL_ID, stack_id);
    debug!(
        "{} of {} catalog entries support stack {}",
        catalog.len(),
        config.metadata.dependencies.len(),
        stack_id
    );

    let resolved = resolve(&sources, &catalog)?;
    emitter.selected(TOOL_NAME, &resolved)?;
    Ok(resolved)
}

/// Read the application's lock-file; any read failure counts as absent
async fn read_lock_file(app_dir: &Path) -> Option<String> {
    let path = app_dir.join(LOCK_FILE);
    match fs::read_to_string(&path).await {
        Ok(content) => Some(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No {} in {}", LOCK_FILE, app_dir.display());
            None
        }
        Err(e) => {
            warn!("Unable to read {}: {}", path.display(), e);
            None
        }
    }
}
