//! Server-wide commands: `settings`, `reset` and `ping`.

use serde_json::{Value, json};
use tracing::warn;

use crate::cli::args::{ResetArgs, SettingsArgs, TargetArgs};
use crate::cli::commands::{connect, load_config, print_json};
use crate::error::{ChaosError, StoreError};
use crate::selection::SelectOptions;
use crate::store::reachability;

/// Posts a global settings document.
///
/// # Errors
///
/// Returns a JSON or validation error for a malformed document, or the
/// store error.
pub async fn settings(args: &SettingsArgs, target: &TargetArgs) -> Result<(), ChaosError> {
    let settings: Value = serde_json::from_str(&args.settings)?;
    let orchestrator = connect(&load_config(target)?, target, SelectOptions::default())?;
    orchestrator.global_settings(&settings).await?;
    print_json(&settings)
}

/// Resets the server, or only its mappings.
///
/// # Errors
///
/// Returns configuration or store errors.
pub async fn reset(args: &ResetArgs, target: &TargetArgs) -> Result<(), ChaosError> {
    let orchestrator = connect(&load_config(target)?, target, SelectOptions::default())?;
    let scope = if args.mappings_only {
        orchestrator.reset_mappings().await?;
        "mappings"
    } else {
        orchestrator.reset().await?;
        "all"
    };
    print_json(&json!({ "reset": scope }))
}

/// Reports whether the server accepts TCP connections.
///
/// # Errors
///
/// Returns a configuration error when no target can be resolved, or
/// `StoreError::Transport` when the server is unreachable.
pub async fn ping(target: &TargetArgs) -> Result<(), ChaosError> {
    let resolved = load_config(target)?.target(&target.overrides())?;
    let running = reachability::server_running(&resolved).await;
    print_json(&json!({ "url": resolved.url, "running": running }))?;
    if running {
        Ok(())
    } else {
        warn!(url = %resolved.url, "mock server is not reachable");
        Err(StoreError::Transport {
            operation: "ping",
            message: format!("cannot connect to {}", resolved.url),
        }
        .into())
    }
}
