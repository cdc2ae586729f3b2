use crate::operations::deploy::{DEFAULT_TEMPLATE_PATH, RunMode};
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Environment variable naming the repository directory
pub const REPOSITORY_ENV: &str = "DEPLOYCONF_REPO";

/// Repository directory name under the home directory
pub const DEFAULT_REPOSITORY_DIR: &str = ".deployconf_repo";

/// Command-line arguments for deployconf
#[derive(Parser, Debug, Clone)]
#[command(name = "deployconf")]
#[command(about = "Apply deployment configuration to a zip archive")]
#[command(long_about = None)]
#[command(version, disable_version_flag = true)]
pub struct Args {
    /// Print version
    #[arg(short = 'v', long, action = ArgAction::Version)]
    #[allow(dead_code, reason = "clap prints the version and exits")]
    version: (),

    /// Source archive containing the deployment template
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Destination archive to write
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// Ask for configuration values that are missing
    #[arg(short = 'i', long, conflicts_with = "force_interactive")]
    pub interactive: bool,

    /// Ask for every configuration value, even configured ones
    #[arg(short = 'I', long = "force-interactive")]
    pub force_interactive: bool,

    /// Only report warnings and errors
    #[arg(short, long, conflicts_with = "debug")]
    pub quiet: bool,

    /// Enable debug logging output
    #[arg(short, long)]
    pub debug: bool,

    /// Directory holding persisted deployment configs and config groups
    /// [default: ~/.deployconf_repo]
    #[arg(short, long, value_name = "DIR", env = REPOSITORY_ENV)]
    pub repo: Option<PathBuf>,

    /// Persisted deployment config file, overriding the repository lookup
    #[arg(short = 'f', long = "deployment-config-file", value_name = "FILE")]
    pub deployment_config_file: Option<PathBuf>,

    /// Path of the deployment template inside the source archive
    #[arg(
        short = 't',
        long = "deployment-template-path",
        value_name = "PATH",
        default_value = DEFAULT_TEMPLATE_PATH
    )]
    pub deployment_template_path: String,
}

impl Args {
    /// The run mode selected by the interactive flags
    #[must_use]
    #[inline]
    pub const fn run_mode(&self) -> RunMode {
        if self.force_interactive {
            RunMode::ForceInteractive
        } else if self.interactive {
            RunMode::Interactive
        } else {
            RunMode::NonInteractive
        }
    }

    /// Log level implied by `--quiet` and `--debug`
    #[must_use]
    #[inline]
    pub const fn log_level(&self) -> &'static str {
        if self.debug {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }
}
