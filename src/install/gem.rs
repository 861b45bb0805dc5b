//! RubyGems-backed installer

use crate::config::schema::InstallConfig;
use crate::error::{BuildpackError, BuildpackResult};
use crate::install::download::{staging_path, Downloader};
use crate::install::{artifact_path, reset_dir, Installer};
use crate::resolve::ResolvedVersion;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::fs;
use tokio::process::Command;
use tracing::{debug, info};

/// Installs a downloaded `.gem` with `gem install --local`
pub struct GemInstaller {
    downloader: Downloader,
    gem_command: String,
    timeout: Duration,
}

impl GemInstaller {
    /// Create an installer from the `[metadata.install]` settings
    pub fn new(config: &InstallConfig) -> Self {
        let timeout = Duration::from_secs(config.timeout_secs);
        Self {
            downloader: Downloader::new(timeout),
            gem_command: config.gem_command.clone(),
            timeout,
        }
    }

    fn install_args(gem_file: &Path, dest_dir: &Path) -> Vec<String> {
        vec![
            "install".to_string(),
            "--local".to_string(),
            gem_file.display().to_string(),
            "--install-dir".to_string(),
            dest_dir.display().to_string(),
            "--bindir".to_string(),
            dest_dir.join("bin").display().to_string(),
            "--no-document".to_string(),
            "--force".to_string(),
        ]
    }

    async fn gem_install(&self, gem_file: &Path, dest_dir: &Path) -> BuildpackResult<()> {
        let args = Self::install_args(gem_file, dest_dir);
        let command = format!("{} {}", self.gem_command, args.join(" "));
        debug!("Executing: {}", command);

        let run = Command::new(&self.gem_command)
            .args(&args)
            .env("GEM_HOME", dest_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, run).await {
            Ok(result) => result.map_err(|e| BuildpackError::InstallCommand {
                command: command.clone(),
                stderr: e.to_string(),
            })?,
            Err(_) => {
                return Err(BuildpackError::InstallCommand {
                    command,
                    stderr: format!("timed out after {}s", self.timeout.as_secs()),
                })
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BuildpackError::InstallCommand {
                command,
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl Installer for GemInstaller {
    async fn install(&self, rv: &ResolvedVersion, dest_dir: &Path) -> BuildpackResult<PathBuf> {
        info!("Installing {} {} into {}", rv.dependency.id, rv.value, dest_dir.display());
        reset_dir(dest_dir).await?;

        let gem_file = staging_path(dest_dir, &rv.dependency);
        if let Some(parent) = gem_file.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| BuildpackError::write(parent, e))?;
        }

        self.downloader.fetch(&rv.dependency, &gem_file).await?;
        self.gem_install(&gem_file, dest_dir).await?;

        if let Some(staging) = gem_file.parent() {
            fs::remove_dir_all(staging).await.map_err(|e| {
                BuildpackError::io(format!("removing {}", staging.display()), e)
            })?;
        }

        let artifact = artifact_path(dest_dir, &rv.dependency.id);
        let installed = fs::try_exists(&artifact)
            .await
            .map_err(|e| BuildpackError::io(format!("checking {}", artifact.display()), e))?;
        if !installed {
            return Err(BuildpackError::ArtifactMissing(artifact));
        }
        Ok(artifact)
    }

    fn installer_name(&self) -> &'static str {
        "gem"
    }
}
