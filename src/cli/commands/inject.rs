//! `down`, `up`, `fault` and `status`: per-mapping fault injection.

use crate::cli::args::{FaultArgs, FilterArgs, StatusArgs, TargetArgs};
use crate::cli::commands::{connect, load_config, print_json};
use crate::error::ChaosError;
use crate::mapping::ResponseBody;

/// Applies the configured `wiremock.defaults.down` dribble delay.
///
/// # Errors
///
/// Returns `ConfigError::MissingRequired` when no `down` default is set,
/// before any network call.
pub async fn down(args: &FilterArgs, target: &TargetArgs) -> Result<(), ChaosError> {
    let config = load_config(target)?;
    let spec = config.down_defaults()?.clone();
    let orchestrator = connect(&config, target, args.options())?;
    let updated = orchestrator
        .chunked_dribble_delay(&args.filters, &spec)
        .await?;
    print_json(&updated)
}

/// Removes every delay from the selected mappings.
///
/// # Errors
///
/// Returns configuration or store errors.
pub async fn up(args: &FilterArgs, target: &TargetArgs) -> Result<(), ChaosError> {
    let orchestrator = connect(&load_config(target)?, target, args.options())?;
    let ids = orchestrator.up(&args.filters).await?;
    print_json(&ids)
}

/// Injects a fault.
///
/// # Errors
///
/// Returns `ValidationError::UnknownFault` for an unsupported fault name.
pub async fn fault(args: &FaultArgs, target: &TargetArgs) -> Result<(), ChaosError> {
    let orchestrator = connect(&load_config(target)?, target, args.select.options())?;
    let updated = orchestrator
        .set_fault(&args.select.filters, &args.fault)
        .await?;
    print_json(&updated)
}

/// Overrides the response status and optionally the body.
///
/// # Errors
///
/// Returns `ValidationError::InvalidStatus` for a status outside 100-599.
pub async fn status(args: StatusArgs, target: &TargetArgs) -> Result<(), ChaosError> {
    let body = match (args.body, args.body_file) {
        (Some(text), _) => Some(ResponseBody::Inline(text)),
        (None, Some(name)) => Some(ResponseBody::File(name)),
        (None, None) => None,
    };
    let orchestrator = connect(&load_config(target)?, target, args.select.options())?;
    let updated = orchestrator
        .set_status(&args.select.filters, &args.status, body)
        .await?;
    print_json(&updated)
}
