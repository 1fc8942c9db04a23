//! `mappings` subcommands.

use serde_json::{Value, json};
use tracing::info;

use crate::cli::args::{
    AddArgs, DeleteArgs, GetArgs, ImportArgs, ListArgs, MappingsCommand, MappingsSubcommand,
    TargetArgs,
};
use crate::cli::commands::{connect, load_config, print_json};
use crate::error::{ChaosError, ValidationError};
use crate::selection::SelectOptions;

/// Runs a `mappings` subcommand.
///
/// # Errors
///
/// Returns configuration, validation, I/O or store errors.
pub async fn run(cmd: MappingsCommand, target: &TargetArgs) -> Result<(), ChaosError> {
    match cmd.subcommand {
        MappingsSubcommand::List(args) => list(&args, target).await,
        MappingsSubcommand::Get(args) => get(&args, target).await,
        MappingsSubcommand::Add(args) => add(&args, target).await,
        MappingsSubcommand::Import(args) => import(&args, target).await,
        MappingsSubcommand::Delete(args) => delete(&args, target).await,
    }
}

async fn list(args: &ListArgs, target: &TargetArgs) -> Result<(), ChaosError> {
    let options = SelectOptions {
        mode: args.mode,
        limit: args.limit,
    };
    let orchestrator = connect(&load_config(target)?, target, options)?;
    let mappings = if args.filters.is_empty() {
        orchestrator.mappings().await?
    } else {
        orchestrator.select(&args.filters).await?
    };
    print_json(&mappings)
}

async fn get(args: &GetArgs, target: &TargetArgs) -> Result<(), ChaosError> {
    let orchestrator = connect(&load_config(target)?, target, SelectOptions::default())?;
    print_json(&orchestrator.mapping(&args.id).await?)
}

async fn add(args: &AddArgs, target: &TargetArgs) -> Result<(), ChaosError> {
    let config = load_config(target)?;
    let text = std::fs::read_to_string(&args.file)?;
    let items = match serde_json::from_str::<Value>(&text)? {
        Value::Array(items) => items,
        item @ Value::Object(_) => vec![item],
        _ => return Err(ValidationError::NotADocument { what: "mapping file" }.into()),
    };

    let orchestrator = connect(&config, target, SelectOptions::default())?;
    let created = orchestrator.populate(items).await?;
    info!(file = %args.file.display(), count = created.len(), "mappings added");
    print_json(&json!({ "created": created }))
}

async fn import(args: &ImportArgs, target: &TargetArgs) -> Result<(), ChaosError> {
    let orchestrator = connect(&load_config(target)?, target, SelectOptions::default())?;
    let created = orchestrator.import_dir(&args.dir).await?;
    info!(dir = %args.dir.display(), count = created.len(), "mappings imported");
    print_json(&json!({ "created": created }))
}

async fn delete(args: &DeleteArgs, target: &TargetArgs) -> Result<(), ChaosError> {
    let options = SelectOptions {
        mode: args.mode,
        limit: args.limit,
    };
    let orchestrator = connect(&load_config(target)?, target, options)?;
    if args.all {
        let count = orchestrator.delete_all().await?;
        return print_json(&json!({ "deleted": count }));
    }
    let deleted = orchestrator.delete_selected(&args.filters).await?;
    print_json(&json!({ "deleted": deleted }))
}
