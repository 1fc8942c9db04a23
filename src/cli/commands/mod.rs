//! CLI command dispatch and handlers
//!
//! Routes parsed CLI arguments to the appropriate command handler. Handlers
//! print their result as JSON on stdout; diagnostics go to stderr through
//! `tracing`.

pub mod admin;
pub mod delay;
pub mod inject;
pub mod mappings;
pub mod version;

use serde::Serialize;
use tracing::debug;

use crate::cli::args::{Cli, Commands, TargetArgs};
use crate::config::{self, ChaosConfig};
use crate::error::ChaosError;
use crate::mutation::Orchestrator;
use crate::selection::SelectOptions;
use crate::store::HttpStore;

/// Dispatch a parsed CLI invocation to the appropriate command handler.
///
/// # Errors
///
/// Returns an error if the dispatched command handler fails.
pub async fn dispatch(cli: Cli) -> Result<(), ChaosError> {
    let target = cli.target;
    match cli.command {
        Commands::Mappings(cmd) => mappings::run(cmd, &target).await,
        Commands::Delay(cmd) => delay::run(cmd, &target).await,
        Commands::Down(args) => inject::down(&args, &target).await,
        Commands::Up(args) => inject::up(&args, &target).await,
        Commands::Fault(args) => inject::fault(&args, &target).await,
        Commands::Status(args) => inject::status(args, &target).await,
        Commands::Settings(args) => admin::settings(&args, &target).await,
        Commands::Reset(args) => admin::reset(&args, &target).await,
        Commands::Ping => admin::ping(&target).await,
        Commands::Version(args) => {
            version::run(&args);
            Ok(())
        }
    }
}

/// Loads the configuration file named by `--config`, if any.
pub(crate) fn load_config(args: &TargetArgs) -> Result<ChaosConfig, ChaosError> {
    match &args.config {
        Some(path) => {
            debug!(path = %path.display(), "loading configuration");
            Ok(config::load(path)?)
        }
        None => Ok(ChaosConfig::default()),
    }
}

/// Builds an orchestrator talking to the resolved mock server.
pub(crate) fn connect(
    config: &ChaosConfig,
    args: &TargetArgs,
    options: SelectOptions,
) -> Result<Orchestrator<HttpStore>, ChaosError> {
    let target = config.target(&args.overrides())?;
    let store = HttpStore::new(&target)?;
    debug!(admin = store.admin_url(), timeout = ?target.timeout, "using mock server");
    Ok(Orchestrator::new(store).with_options(options))
}

/// Prints `value` as pretty JSON on stdout.
pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), ChaosError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
