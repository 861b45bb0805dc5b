//! Layer environment modifications
//!
//! The lifecycle reads `<layer>/env/<NAME>.<action>` files and applies them
//! to the build and launch environments. `<layer>/bin` is put on `PATH` by
//! the lifecycle itself, so only the gem search path is written here.

use crate::error::{BuildpackError, BuildpackResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Variable that points RubyGems at installed gems
pub const GEM_PATH: &str = "GEM_PATH";

/// One `<NAME>.append` modification with its delimiter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
    pub delim: String,
}

impl EnvVar {
    /// Resulting value as shown in the build log
    pub fn describe(&self) -> String {
        format!("${}{}{}", self.name, self.delim, self.value)
    }

    fn file_stem(&self) -> String {
        format!("{}.append", self.name)
    }
}

/// Environment modifications contributed by a layer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerEnv {
    vars: Vec<EnvVar>,
}

impl LayerEnv {
    /// Environment for an installed gem layer: `GEM_PATH` gains the layer
    pub fn for_gem_layer(layer_path: &Path) -> Self {
        Self {
            vars: vec![EnvVar {
                name: GEM_PATH.to_string(),
                value: layer_path.display().to_string(),
                delim: ":".to_string(),
            }],
        }
    }

    /// Modifications in write order
    pub fn vars(&self) -> &[EnvVar] {
        &self.vars
    }

    /// Write the modification files under `<layer>/env`
    pub async fn write(&self, layer_path: &Path) -> BuildpackResult<PathBuf> {
        let env_dir = layer_path.join("env");
        fs::create_dir_all(&env_dir)
            .await
            .map_err(|e| BuildpackError::write(&env_dir, e))?;

        for var in &self.vars {
            let value_path = env_dir.join(var.file_stem());
            fs::write(&value_path, &var.value)
                .await
                .map_err(|e| BuildpackError::write(&value_path, e))?;

            let delim_path = env_dir.join(format!("{}.delim", var.name));
            fs::write(&delim_path, &var.delim)
                .await
                .map_err(|e| BuildpackError::write(&delim_path, e))?;

            debug!("Wrote {} -> {}", var.name, var.describe());
        }

        Ok(env_dir)
    }
}
