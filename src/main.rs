//! # `deployconf`
//!
//! `deployconf` applies deployment-time configuration to a zip archive.
//! The archive carries a template (`META-INF/deployment-template.xml` by
//! default) describing the values a deployment needs; the answers are kept
//! per deployment target in a repository directory (`~/.deployconf_repo`
//! or `$DEPLOYCONF_REPO`).
//!
//! ## Usage
//!
//! ```sh
//! deployconf app.zip app-configured.zip        # apply, exit 2 when values are missing
//! deployconf -i app.zip app-configured.zip     # ask for missing values
//! deployconf -I app.zip app-configured.zip     # ask for every value again
//! ```
//!
//! ## Exit codes
//! - `0`: the destination archive was written
//! - `2`: the configuration is incomplete and was saved for editing
//! - any other non-zero code: the run failed

use clap::Parser as _;
use deployconf::cli::Args;
use deployconf::error::DeployError;
use tracing::error;
use tracing_subscriber::{EnvFilter, fmt};

fn main() {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_level()));
    fmt().with_target(false).with_env_filter(filter).init();

    match deployconf::run(&args) {
        Ok(outcome) => std::process::exit(outcome.exit_code()),
        Err(err) => {
            error!("{err:#}");
            std::process::exit(
                err.downcast_ref::<DeployError>()
                    .map_or(1, DeployError::exit_code),
            );
        }
    }
}
