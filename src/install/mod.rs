//! Tool installation
//!
//! Installers materialize a resolved catalog entry into a layer directory.
//! The destination is emptied first, so a repeated install yields the same
//! tree.

pub mod download;
pub mod gem;

pub use download::Downloader;
pub use gem::GemInstaller;

use crate::error::{BuildpackError, BuildpackResult};
use crate::resolve::ResolvedVersion;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Abstract installer interface
#[async_trait]
pub trait Installer: Send + Sync {
    /// Install `rv` into `dest_dir`, returning the path of the executable
    async fn install(&self, rv: &ResolvedVersion, dest_dir: &Path) -> BuildpackResult<PathBuf>;

    /// Short name for logs
    fn installer_name(&self) -> &'static str;
}

/// Executable installed for a tool
pub fn artifact_path(dest_dir: &Path, tool_id: &str) -> PathBuf {
    dest_dir.join("bin").join(tool_id)
}

/// Remove `dir` and its contents, then recreate it empty
pub async fn reset_dir(dir: &Path) -> BuildpackResult<()> {
    match fs::remove_dir_all(dir).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(BuildpackError::io(format!("clearing {}", dir.display()), e)),
    }
    fs::create_dir_all(dir)
        .await
        .map_err(|e| BuildpackError::write(dir, e))
}
