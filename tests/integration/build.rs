//! Build step behaviour over real layer directories, with a fake installer

use crate::fixtures::{config, write_lock_file, OTHER_STACK, STACK};
use async_trait::async_trait;
use bundlepack::build::{BuildContext, BuildOutcome, BuildStep, Clock};
use bundlepack::config::Config;
use bundlepack::error::{BuildpackError, BuildpackResult};
use bundlepack::install::{GemInstaller, Installer};
use bundlepack::layer::{Decision, MetadataStore};
use bundlepack::resolve::ResolvedVersion;
use bundlepack::ui::{Emitter, UiContext};
use chrono::DateTime;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

/// Writes `bin/bundler` and optionally fails right after
#[derive(Default)]
struct FakeInstaller {
    installs: AtomicUsize,
    fail_after_write: AtomicBool,
}

impl FakeInstaller {
    fn installs(&self) -> usize {
        self.installs.load(Ordering::SeqCst)
    }

    fn set_failing(&self, failing: bool) {
        self.fail_after_write.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl Installer for FakeInstaller {
    async fn install(&self, rv: &ResolvedVersion, dest_dir: &Path) -> BuildpackResult<PathBuf> {
        self.installs.fetch_add(1, Ordering::SeqCst);

        let bin = dest_dir.join("bin");
        std::fs::create_dir_all(&bin).map_err(|e| BuildpackError::io("creating bin", e))?;
        let artifact = bin.join("bundler");
        std::fs::write(&artifact, format!("bundler {}", rv.value))
            .map_err(|e| BuildpackError::io("writing artifact", e))?;

        if self.fail_after_write.load(Ordering::SeqCst) {
            return Err(BuildpackError::InstallCommand {
                command: "gem install".to_string(),
                stderr: "killed".to_string(),
            });
        }
        Ok(artifact)
    }

    fn installer_name(&self) -> &'static str {
        "fake"
    }
}

struct Harness {
    temp: TempDir,
    installer: Arc<FakeInstaller>,
    ticks: Arc<AtomicI64>,
}

impl Harness {
    fn new() -> Self {
        Self {
            temp: TempDir::new().unwrap(),
            installer: Arc::new(FakeInstaller::default()),
            ticks: Arc::new(AtomicI64::new(0)),
        }
    }

    fn app_dir(&self) -> PathBuf {
        self.temp.path().join("app")
    }

    fn layers_dir(&self) -> PathBuf {
        self.temp.path().join("layers")
    }

    fn lock(&self, version: &str) {
        write_lock_file(&self.app_dir(), version);
    }

    fn remove_lock(&self) {
        std::fs::remove_file(self.app_dir().join("Gemfile.lock")).unwrap();
    }

    fn ctx(&self, stack_id: &str, override_value: Option<&str>) -> BuildContext {
        BuildContext {
            app_dir: self.app_dir(),
            layers_dir: self.layers_dir(),
            stack_id: stack_id.to_string(),
            override_value: override_value.map(str::to_string),
        }
    }

    fn clock(&self) -> Clock {
        let ticks = self.ticks.clone();
        Arc::new(move || {
            let n = ticks.fetch_add(1, Ordering::SeqCst);
            DateTime::from_timestamp(1_700_000_000 + n, 0).unwrap()
        })
    }

    async fn build_with(
        &self,
        config: Config,
        installer: Arc<dyn Installer>,
        ctx: BuildContext,
    ) -> (BuildpackResult<BuildOutcome>, String) {
        let emitter = Emitter::new(Vec::new(), UiContext::plain());
        let mut step = BuildStep::new(config, installer, emitter).with_clock(self.clock());
        let result = step.run(&ctx).await;
        (result, String::from_utf8(step.into_log()).unwrap())
    }

    async fn build(&self, override_value: Option<&str>) -> (BuildpackResult<BuildOutcome>, String) {
        self.build_with(config(), self.installer.clone(), self.ctx(STACK, override_value))
            .await
    }

    async fn build_ok(&self) -> (BuildOutcome, String) {
        let (result, log) = self.build(None).await;
        (result.unwrap(), log)
    }

    async fn stored(&self) -> Option<bundlepack::layer::LayerMetadata> {
        MetadataStore::new(self.layers_dir())
            .load("bundler")
            .await
            .unwrap()
    }
}

fn normalize_duration(log: &str) -> String {
    log.lines()
        .map(|line| {
            if line.starts_with("      Completed in ") {
                "      Completed in <duration>"
            } else {
                line
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[tokio::test]
async fn first_build_installs_from_lock_file() {
    let h = Harness::new();
    h.lock("1.17.3");

    let (outcome, log) = h.build_ok().await;

    assert_eq!(outcome.decision, Decision::Rebuild);
    assert_eq!(outcome.resolved.value.to_string(), "1.17.3");
    assert_eq!(outcome.resolved.chosen_source_name, "Gemfile.lock");
    assert_eq!(h.installer.installs(), 1);

    let layer = h.layers_dir().join("bundler");
    let expected = format!(
        "Bundler Buildpack 1.2.3\n\
         \x20 Resolving Bundler version\n\
         \x20   Candidate version sources (in priority order):\n\
         \x20     Gemfile.lock -> \"1.17.3\"\n\
         \x20     <unknown>    -> \"*\"\n\
         \n\
         \x20   Selected Bundler version (using Gemfile.lock): 1.17.3\n\
         \n\
         \x20 Executing build process\n\
         \x20   Installing Bundler 1.17.3\n\
         \x20     Completed in <duration>\n\
         \n\
         \x20 Configuring environment\n\
         \x20   GEM_PATH -> \"$GEM_PATH:{}\"\n",
        layer.display()
    );
    assert_eq!(normalize_duration(&log), expected);
}

#[tokio::test]
async fn first_build_writes_layer() {
    let h = Harness::new();
    h.lock("1.17.3");

    let (outcome, _) = h.build_ok().await;

    let layer = h.layers_dir().join("bundler");
    assert_eq!(outcome.layer_path, layer);
    assert!(layer.join("bin/bundler").exists());
    assert_eq!(
        std::fs::read_to_string(layer.join("env/GEM_PATH.append")).unwrap(),
        layer.display().to_string()
    );
    assert_eq!(
        std::fs::read_to_string(layer.join("env/GEM_PATH.delim")).unwrap(),
        ":"
    );

    let stored = h.stored().await.unwrap();
    assert_eq!(stored, outcome.metadata);
    assert_eq!(stored.fingerprint.stack_id, STACK);
    assert_eq!(stored.artifact_path, layer.join("bin/bundler"));

    let record = std::fs::read_to_string(h.layers_dir().join("bundler.toml")).unwrap();
    assert!(record.contains("launch = true"));
    assert!(record.contains("version = \"1.17.3\""));
}

#[tokio::test]
async fn default_source_picks_newest_for_stack() {
    let h = Harness::new();

    let (outcome, log) = h.build_ok().await;

    // 2.2.0 exists in the catalog but not for this stack
    assert_eq!(outcome.resolved.value.to_string(), "2.1.4");
    assert_eq!(outcome.resolved.chosen_source_name, "<unknown>");
    assert!(log.contains("      <unknown> -> \"*\"\n"));
    assert!(log.contains("Selected Bundler version (using <unknown>): 2.1.4"));
}

#[tokio::test]
async fn override_outranks_default() {
    let h = Harness::new();

    let (result, log) = h.build(Some("2.0.*")).await;
    let outcome = result.unwrap();

    assert_eq!(outcome.resolved.value.to_string(), "2.0.2");
    assert_eq!(outcome.resolved.chosen_source_name, "BP_BUNDLER_VERSION");
    assert!(log.contains("      BP_BUNDLER_VERSION -> \"2.0.*\"\n"));
    assert!(log.contains("      <unknown>          -> \"*\"\n"));
}

#[tokio::test]
async fn unchanged_inputs_reuse_layer() {
    let h = Harness::new();
    h.lock("1.17.3");

    let (first, _) = h.build_ok().await;
    let (second, log) = h.build_ok().await;

    assert_eq!(second.decision, Decision::Reuse);
    assert_eq!(second.metadata.built_at, first.metadata.built_at);
    assert_eq!(h.stored().await.unwrap().built_at, first.metadata.built_at);
    assert_eq!(h.installer.installs(), 1);

    let layer = h.layers_dir().join("bundler");
    assert!(log.contains(&format!("  Reusing cached layer {}\n", layer.display())));
    assert!(!log.contains("Executing build process"));
    assert!(!log.contains("Installing"));
    assert!(!log.contains("Configuring environment"));
}

#[tokio::test]
async fn lock_file_change_rebuilds() {
    let h = Harness::new();
    h.lock("1.17.3");
    let (first, _) = h.build_ok().await;

    h.lock("2.1.4");
    let (second, log) = h.build_ok().await;

    assert_eq!(second.decision, Decision::Rebuild);
    assert_ne!(second.metadata.built_at, first.metadata.built_at);
    assert_eq!(second.metadata.fingerprint.version.to_string(), "2.1.4");
    assert!(log.contains("      Gemfile.lock -> \"2.1.4\"\n"));
    assert!(log.contains("    Installing Bundler 2.1.4\n"));
    assert_eq!(h.installer.installs(), 2);
}

#[tokio::test]
async fn source_change_rebuilds_same_version() {
    let h = Harness::new();
    h.lock("2.1.4");
    h.build_ok().await;

    // Same version, now only reachable through the default
    h.remove_lock();
    let (outcome, _) = h.build_ok().await;

    assert_eq!(outcome.resolved.value.to_string(), "2.1.4");
    assert_eq!(outcome.decision, Decision::Rebuild);
    assert_eq!(h.installer.installs(), 2);
}

#[tokio::test]
async fn stack_change_rebuilds() {
    let h = Harness::new();
    h.lock("1.17.3");
    h.build_ok().await;

    let (result, _) = h
        .build_with(config(), h.installer.clone(), h.ctx(OTHER_STACK, None))
        .await;
    let outcome = result.unwrap();

    assert_eq!(outcome.decision, Decision::Rebuild);
    assert_eq!(outcome.metadata.fingerprint.stack_id, OTHER_STACK);
}

#[tokio::test]
async fn no_matching_version_writes_nothing() {
    let h = Harness::new();
    h.lock("3.0.0");

    let (result, log) = h.build(None).await;

    match result {
        Err(BuildpackError::NoMatchingVersion {
            constraint,
            source_name,
            nearest,
            ..
        }) => {
            assert_eq!(constraint, "3.0.0");
            assert_eq!(source_name, "Gemfile.lock");
            assert_eq!(nearest, vec!["2.1.4", "2.0.2", "1.17.3"]);
        }
        other => panic!("expected NoMatchingVersion, got {:?}", other),
    }
    assert!(!log.contains("Installing"));
    assert_eq!(h.installer.installs(), 0);
    assert!(!h.layers_dir().join("bundler.toml").exists());
    assert!(!h.layers_dir().join("bundler").exists());
}

#[tokio::test]
async fn unparsable_lock_version_falls_through() {
    let h = Harness::new();
    h.lock("not-a-version");

    let (outcome, log) = h.build_ok().await;

    assert_eq!(outcome.resolved.chosen_source_name, "<unknown>");
    assert!(!log.contains("Gemfile.lock ->"));
}

#[tokio::test]
async fn failure_after_artifact_write_leaves_no_record() {
    let h = Harness::new();
    h.lock("1.17.3");
    h.build_ok().await;
    assert!(h.stored().await.is_some());

    h.lock("2.1.4");
    h.installer.set_failing(true);
    let (result, _) = h.build(None).await;

    assert!(matches!(result, Err(BuildpackError::InstallCommand { .. })));
    assert!(h.layers_dir().join("bundler/bin/bundler").exists());
    assert!(h.stored().await.is_none());

    h.installer.set_failing(false);
    let (outcome, _) = h.build_ok().await;
    assert_eq!(outcome.decision, Decision::Rebuild);
    assert_eq!(outcome.metadata.fingerprint.version.to_string(), "2.1.4");
    assert_eq!(h.installer.installs(), 3);
}

#[tokio::test]
async fn corrupt_record_rebuilds() {
    let h = Harness::new();
    h.lock("1.17.3");
    std::fs::create_dir_all(h.layers_dir()).unwrap();
    std::fs::write(h.layers_dir().join("bundler.toml"), "[metadata\nversion = ").unwrap();

    let (outcome, _) = h.build_ok().await;

    assert_eq!(outcome.decision, Decision::Rebuild);
    assert_eq!(h.stored().await.unwrap(), outcome.metadata);
}

#[tokio::test]
async fn missing_artifact_rebuilds() {
    let h = Harness::new();
    h.lock("1.17.3");
    h.build_ok().await;

    std::fs::remove_file(h.layers_dir().join("bundler/bin/bundler")).unwrap();
    let (outcome, log) = h.build_ok().await;

    assert_eq!(outcome.decision, Decision::Rebuild);
    assert!(log.contains("Installing Bundler 1.17.3"));
    assert_eq!(h.installer.installs(), 2);
}

/// Reports success without writing anything
struct SilentInstaller;

#[async_trait]
impl Installer for SilentInstaller {
    async fn install(&self, _rv: &ResolvedVersion, dest_dir: &Path) -> BuildpackResult<PathBuf> {
        Ok(dest_dir.join("bin/bundler"))
    }

    fn installer_name(&self) -> &'static str {
        "silent"
    }
}

#[tokio::test]
async fn unwritten_artifact_fails_without_record() {
    let h = Harness::new();
    h.lock("1.17.3");

    let (result, _) = h
        .build_with(config(), Arc::new(SilentInstaller), h.ctx(STACK, None))
        .await;

    assert!(matches!(result, Err(BuildpackError::ArtifactMissing(_))));
    assert!(h.stored().await.is_none());
}

#[tokio::test]
async fn checksum_mismatch_fails_without_record() {
    use httpmock::prelude::*;

    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/bundler-2.1.4.gem");
            then.status(200).body("tampered bytes");
        })
        .await;

    let descriptor = format!(
        r#"
[metadata.default-versions]
bundler = "*"

[[metadata.dependencies]]
id = "bundler"
version = "2.1.4"
uri = "{}"
sha256 = "{}"
stacks = ["*"]
"#,
        server.url("/bundler-2.1.4.gem"),
        "0".repeat(64)
    );
    let config: Config = toml::from_str(&descriptor).unwrap();
    let installer = Arc::new(GemInstaller::new(&config.metadata.install));

    let h = Harness::new();
    let (result, _) = h.build_with(config, installer, h.ctx(STACK, None)).await;

    assert!(matches!(result, Err(BuildpackError::ChecksumMismatch { .. })));
    assert!(h.stored().await.is_none());
    assert!(!h
        .layers_dir()
        .join("bundler/.download/bundler-2.1.4.gem")
        .exists());
}
