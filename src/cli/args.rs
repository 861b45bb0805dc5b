//! CLI argument definitions using clap derive

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

/// Bundler buildpack build step
///
/// Resolves the Bundler version an application needs and installs it into
/// a cached layer, reusing the previous layer when nothing changed.
#[derive(Parser, Debug)]
#[command(name = "bundlepack")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Diagnostic log format on stderr
    #[arg(long, global = true, default_value = "text")]
    pub log_format: LogFormat,

    /// Buildpack directory containing buildpack.toml
    #[arg(long, global = true, env = "CNB_BUILDPACK_DIR", default_value = ".")]
    pub buildpack_dir: PathBuf,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve and install Bundler into its layer
    Build(BuildArgs),

    /// Show which Bundler version would be selected, without installing
    Resolve(ResolveArgs),

    /// Show the layer record left by the previous build
    Inspect(InspectArgs),

    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

/// Inputs that decide the Bundler version
#[derive(Args, Debug, Clone)]
pub struct VersionInputs {
    /// Application directory (holds Gemfile.lock)
    #[arg(long, env = "CNB_APP_DIR", default_value = ".")]
    pub app_dir: PathBuf,

    /// Stack identifier
    #[arg(long, env = "CNB_STACK_ID")]
    pub stack_id: String,

    /// Explicit Bundler version constraint
    #[arg(long = "bundler-version", env = "BP_BUNDLER_VERSION")]
    pub version_override: Option<String>,
}

/// Arguments for the build command
#[derive(Parser, Debug)]
pub struct BuildArgs {
    #[command(flatten)]
    pub inputs: VersionInputs,

    /// This buildpack's layers directory
    #[arg(long, env = "CNB_LAYERS_DIR")]
    pub layers_dir: PathBuf,
}

/// Arguments for the resolve command
#[derive(Parser, Debug)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub inputs: VersionInputs,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the inspect command
#[derive(Parser, Debug)]
pub struct InspectArgs {
    /// This buildpack's layers directory
    #[arg(long, env = "CNB_LAYERS_DIR")]
    pub layers_dir: PathBuf,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Output format for resolve and inspect
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON output
    Json,
}

/// Diagnostic log format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Compact text lines
    Text,
    /// One JSON object per event
    Json,
}
