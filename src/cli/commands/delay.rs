//! `delay` subcommands.

use serde_json::{Value, json};

use crate::cli::args::{
    DelayCommand, DelaySubcommand, DribbleDelayArgs, FixedDelayArgs, GlobalFixedDelayArgs,
    GlobalRandomDelayArgs, RandomDelayArgs, TargetArgs,
};
use crate::cli::commands::{connect, load_config, print_json};
use crate::error::ChaosError;
use crate::mapping::{DelayDistribution, Document};
use crate::selection::SelectOptions;

/// Runs a `delay` subcommand.
///
/// # Errors
///
/// Returns configuration, validation or store errors.
pub async fn run(cmd: DelayCommand, target: &TargetArgs) -> Result<(), ChaosError> {
    match cmd.subcommand {
        DelaySubcommand::Fixed(args) => fixed(&args, target).await,
        DelaySubcommand::Random(args) => random(&args, target).await,
        DelaySubcommand::Dribble(args) => dribble(&args, target).await,
        DelaySubcommand::GlobalFixed(args) => global_fixed(&args, target).await,
        DelaySubcommand::GlobalRandom(args) => global_random(&args, target).await,
    }
}

async fn fixed(args: &FixedDelayArgs, target: &TargetArgs) -> Result<(), ChaosError> {
    let orchestrator = connect(&load_config(target)?, target, args.select.options())?;
    let updated = orchestrator
        .fixed_delay(&args.select.filters, args.millis)
        .await?;
    print_json(&updated)
}

async fn random(args: &RandomDelayArgs, target: &TargetArgs) -> Result<(), ChaosError> {
    let distribution = DelayDistribution::try_from(serde_json::from_str::<Value>(&args.distribution)?)?;
    let orchestrator = connect(&load_config(target)?, target, args.select.options())?;
    let updated = orchestrator
        .random_delay(&args.select.filters, &distribution)
        .await?;
    print_json(&updated)
}

/// Dribble specification holding only the flags that were given.
fn dribble_spec(args: &DribbleDelayArgs) -> Value {
    let mut spec = Document::new();
    if let Some(chunks) = args.chunks {
        spec.insert("numberOfChunks".to_string(), Value::from(chunks));
    }
    if let Some(duration) = args.duration {
        spec.insert("totalDuration".to_string(), Value::from(duration));
    }
    Value::Object(spec)
}

async fn dribble(args: &DribbleDelayArgs, target: &TargetArgs) -> Result<(), ChaosError> {
    let orchestrator = connect(&load_config(target)?, target, args.select.options())?;
    let updated = orchestrator
        .chunked_dribble_delay(&args.select.filters, &dribble_spec(args))
        .await?;
    print_json(&updated)
}

async fn global_fixed(args: &GlobalFixedDelayArgs, target: &TargetArgs) -> Result<(), ChaosError> {
    let orchestrator = connect(&load_config(target)?, target, SelectOptions::default())?;
    orchestrator.global_fixed_delay(args.millis).await?;
    print_json(&json!({ "fixedDelay": args.millis }))
}

async fn global_random(
    args: &GlobalRandomDelayArgs,
    target: &TargetArgs,
) -> Result<(), ChaosError> {
    let distribution: Value = serde_json::from_str(&args.distribution)?;
    let orchestrator = connect(&load_config(target)?, target, SelectOptions::default())?;
    orchestrator.global_random_delay(&distribution).await?;
    print_json(&json!({ "delayDistribution": distribution }))
}
