//! CLI argument definitions
//!
//! All Clap derive structs for `stubchaos` command-line parsing.

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::config::TargetOverrides;
use crate::mapping::{Document, into_document};
use crate::matcher::MatchMode;
use crate::observability::LogFormat;
use crate::selection::SelectOptions;

// ============================================================================
// Root CLI
// ============================================================================

/// Fault injection for WireMock-compatible mock servers.
#[derive(Parser, Debug)]
#[command(name = "stubchaos", author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Mock server connection options.
    #[command(flatten)]
    pub target: TargetArgs,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-error diagnostics.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output control.
    #[arg(long, default_value = "auto", global = true, env = "STUBCHAOS_COLOR")]
    pub color: ColorChoice,

    /// Diagnostic log format.
    #[arg(long, default_value = "human", global = true, env = "STUBCHAOS_LOG_FORMAT")]
    pub log_format: LogFormat,
}

/// Where the mock server lives. Flags override the config file.
#[derive(Args, Debug, Default, Clone)]
pub struct TargetArgs {
    /// Path to a YAML or JSON configuration file.
    #[arg(short, long, global = true, env = "STUBCHAOS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Base url of the mock server (admin API lives under `/__admin`).
    #[arg(long, global = true, env = "STUBCHAOS_URL")]
    pub url: Option<String>,

    /// Mock server host (used with --port).
    #[arg(long, global = true, env = "STUBCHAOS_HOST")]
    pub host: Option<String>,

    /// Mock server port (used with --host).
    #[arg(long, global = true, env = "STUBCHAOS_PORT")]
    pub port: Option<u16>,

    /// Path prefix appended after host:port.
    #[arg(long, global = true)]
    pub context_path: Option<String>,

    /// Per-call timeout, e.g. `500ms`, `2s`.
    #[arg(long, global = true, env = "STUBCHAOS_TIMEOUT", value_parser = humantime::parse_duration)]
    pub timeout: Option<Duration>,
}

impl TargetArgs {
    /// Command-line values that take precedence over the config file.
    #[must_use]
    pub fn overrides(&self) -> TargetOverrides {
        TargetOverrides {
            url: self.url.clone(),
            host: self.host.clone(),
            port: self.port,
            context_path: self.context_path.clone(),
            timeout: self.timeout,
        }
    }
}

// ============================================================================
// Top-Level Commands
// ============================================================================

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List, fetch, create, import or delete mappings.
    Mappings(MappingsCommand),

    /// Add or configure response delays.
    Delay(DelayCommand),

    /// Slow selected mappings down with the configured `defaults.down` delay.
    Down(FilterArgs),

    /// Remove every delay from selected mappings.
    Up(FilterArgs),

    /// Inject a protocol-level fault into selected mappings.
    Fault(FaultArgs),

    /// Override the status (and optionally the body) of selected mappings.
    Status(StatusArgs),

    /// Post a global settings document.
    Settings(SettingsArgs),

    /// Reset the mock server.
    Reset(ResetArgs),

    /// Check whether the mock server accepts connections.
    Ping,

    /// Display version information.
    Version(VersionArgs),
}

// ============================================================================
// Selection
// ============================================================================

/// Parses a `--filter` value.
///
/// # Errors
///
/// Returns a message when the value is not a JSON object.
pub fn parse_document(input: &str) -> Result<Document, String> {
    let value: serde_json::Value =
        serde_json::from_str(input).map_err(|e| format!("invalid JSON: {e}"))?;
    into_document(value, "filter").map_err(|e| e.to_string())
}

/// Filters selecting the mappings a mutation applies to.
#[derive(Args, Debug, Clone)]
pub struct FilterArgs {
    /// Filter as a JSON object; repeat to select the union.
    #[arg(short, long = "filter", value_parser = parse_document, required = true)]
    pub filters: Vec<Document>,

    /// Matching semantics.
    #[arg(long, default_value = "strict", env = "STUBCHAOS_MATCH_MODE")]
    pub mode: MatchMode,

    /// Maximum matches per filter (0 = unlimited).
    #[arg(long, default_value_t = 0)]
    pub limit: usize,
}

impl FilterArgs {
    /// Selection options for these arguments.
    #[must_use]
    pub const fn options(&self) -> SelectOptions {
        SelectOptions {
            mode: self.mode,
            limit: self.limit,
        }
    }
}

// ============================================================================
// Mappings Command
// ============================================================================

/// Mapping management commands.
#[derive(Args, Debug)]
pub struct MappingsCommand {
    /// Mappings subcommand.
    #[command(subcommand)]
    pub subcommand: MappingsSubcommand,
}

/// Mapping subcommands.
#[derive(Subcommand, Debug)]
pub enum MappingsSubcommand {
    /// List mappings, optionally filtered.
    List(ListArgs),

    /// Fetch one mapping by id.
    Get(GetArgs),

    /// Create mappings from a JSON file (one object or an array).
    Add(AddArgs),

    /// Create a mapping from every `*.json` file in a directory.
    Import(ImportArgs),

    /// Delete selected mappings, or all of them.
    Delete(DeleteArgs),
}

/// Arguments for `mappings list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Filter as a JSON object; repeat to select the union.
    #[arg(short, long = "filter", value_parser = parse_document)]
    pub filters: Vec<Document>,

    /// Matching semantics.
    #[arg(long, default_value = "strict", env = "STUBCHAOS_MATCH_MODE")]
    pub mode: MatchMode,

    /// Maximum matches per filter (0 = unlimited).
    #[arg(long, default_value_t = 0)]
    pub limit: usize,
}

/// Arguments for `mappings get`.
#[derive(Args, Debug)]
pub struct GetArgs {
    /// Mapping id.
    pub id: String,
}

/// Arguments for `mappings add`.
#[derive(Args, Debug)]
pub struct AddArgs {
    /// JSON file holding a mapping or an array of mappings.
    pub file: PathBuf,
}

/// Arguments for `mappings import`.
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Directory to import from.
    #[arg(default_value = ".")]
    pub dir: PathBuf,
}

/// Arguments for `mappings delete`.
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Delete every stored mapping.
    #[arg(long, conflicts_with = "filters")]
    pub all: bool,

    /// Filter as a JSON object; repeat to select the union.
    #[arg(short, long = "filter", value_parser = parse_document, required_unless_present = "all")]
    pub filters: Vec<Document>,

    /// Matching semantics.
    #[arg(long, default_value = "strict", env = "STUBCHAOS_MATCH_MODE")]
    pub mode: MatchMode,

    /// Maximum matches per filter (0 = unlimited).
    #[arg(long, default_value_t = 0)]
    pub limit: usize,
}

// ============================================================================
// Delay Command
// ============================================================================

/// Delay commands.
#[derive(Args, Debug)]
pub struct DelayCommand {
    /// Delay subcommand.
    #[command(subcommand)]
    pub subcommand: DelaySubcommand,
}

/// Delay subcommands.
#[derive(Subcommand, Debug)]
pub enum DelaySubcommand {
    /// Fixed delay on selected mappings (clears any random delay).
    Fixed(FixedDelayArgs),

    /// Random delay on selected mappings.
    Random(RandomDelayArgs),

    /// Chunked dribble delay on selected mappings.
    Dribble(DribbleDelayArgs),

    /// Fixed delay on every response of the server.
    GlobalFixed(GlobalFixedDelayArgs),

    /// Random delay on every response of the server.
    GlobalRandom(GlobalRandomDelayArgs),
}

/// Arguments for `delay fixed`.
#[derive(Args, Debug)]
pub struct FixedDelayArgs {
    /// Delay in milliseconds.
    pub millis: u64,

    /// Mapping selection.
    #[command(flatten)]
    pub select: FilterArgs,
}

/// Arguments for `delay random`.
#[derive(Args, Debug)]
pub struct RandomDelayArgs {
    /// Distribution as JSON, e.g. `{"type":"lognormal","median":80,"sigma":0.4}`.
    #[arg(long)]
    pub distribution: String,

    /// Mapping selection.
    #[command(flatten)]
    pub select: FilterArgs,
}

/// Arguments for `delay dribble`.
#[derive(Args, Debug)]
pub struct DribbleDelayArgs {
    /// Number of chunks the body is split into.
    #[arg(long)]
    pub chunks: Option<u64>,

    /// Total delivery time in milliseconds.
    #[arg(long)]
    pub duration: Option<u64>,

    /// Mapping selection.
    #[command(flatten)]
    pub select: FilterArgs,
}

/// Arguments for `delay global-fixed`.
#[derive(Args, Debug)]
pub struct GlobalFixedDelayArgs {
    /// Delay in milliseconds.
    pub millis: u64,
}

/// Arguments for `delay global-random`.
#[derive(Args, Debug)]
pub struct GlobalRandomDelayArgs {
    /// Distribution as JSON.
    #[arg(long)]
    pub distribution: String,
}

// ============================================================================
// Fault / Status / Settings / Reset
// ============================================================================

/// Arguments for `fault`.
#[derive(Args, Debug)]
pub struct FaultArgs {
    /// EMPTY_RESPONSE, MALFORMED_RESPONSE_CHUNK, RANDOM_DATA_THEN_CLOSE or
    /// CONNECTION_RESET_BY_PEER.
    pub fault: String,

    /// Mapping selection.
    #[command(flatten)]
    pub select: FilterArgs,
}

/// Arguments for `status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// HTTP status code (100-599).
    pub status: String,

    /// Inline response body.
    #[arg(long)]
    pub body: Option<String>,

    /// Response body file under the server's `__files` directory.
    #[arg(long, conflicts_with = "body")]
    pub body_file: Option<String>,

    /// Mapping selection.
    #[command(flatten)]
    pub select: FilterArgs,
}

/// Arguments for `settings`.
#[derive(Args, Debug)]
pub struct SettingsArgs {
    /// Settings document as JSON, e.g. `{"fixedDelay": 100}`.
    pub settings: String,
}

/// Arguments for `reset`.
#[derive(Args, Debug)]
pub struct ResetArgs {
    /// Only reload mappings from the server's files.
    #[arg(long)]
    pub mappings_only: bool,
}

/// Arguments for `version`.
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// CLI-Local Enums
// ============================================================================

/// Color output choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    /// Auto-detect terminal support.
    #[default]
    Auto,
    /// Always use color.
    Always,
    /// Never use color.
    Never,
}

/// Output format for structured output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output.
    #[default]
    Human,
    /// JSON output.
    Json,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("stubchaos").chain(args.iter().copied()))
    }

    #[test]
    fn test_help_output() {
        let err = parse(&["--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_version_output() {
        let err = parse(&["--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_fixed_delay_with_filters() {
        let cli = parse(&[
            "--url",
            "http://localhost:8080",
            "delay",
            "fixed",
            "250",
            "--filter",
            r#"{"method":"GET"}"#,
            "-f",
            r#"{"url":"/x"}"#,
        ])
        .unwrap();
        let Commands::Delay(cmd) = cli.command else {
            panic!("expected delay command");
        };
        let DelaySubcommand::Fixed(args) = cmd.subcommand else {
            panic!("expected fixed delay");
        };
        assert_eq!(args.millis, 250);
        assert_eq!(args.select.filters.len(), 2);
        assert_eq!(args.select.mode, MatchMode::Strict);
        assert_eq!(cli.target.url.as_deref(), Some("http://localhost:8080"));
    }

    #[test]
    fn test_filter_must_be_object() {
        assert!(parse(&["up", "--filter", "[1,2]"]).is_err());
        assert!(parse(&["up", "--filter", "not json"]).is_err());
    }

    #[test]
    fn test_mutations_require_filter() {
        assert!(parse(&["up"]).is_err());
        assert!(parse(&["fault", "EMPTY_RESPONSE"]).is_err());
    }

    #[test]
    fn test_recursive_mode_and_limit() {
        let cli = parse(&[
            "down",
            "--filter",
            r#"{"response":{"status":[200]}}"#,
            "--mode",
            "recursive",
            "--limit",
            "3",
        ])
        .unwrap();
        let Commands::Down(args) = cli.command else {
            panic!("expected down command");
        };
        let options = args.options();
        assert_eq!(options.mode, MatchMode::Recursive);
        assert_eq!(options.limit, 3);
    }

    #[test]
    fn test_delete_all_conflicts_with_filter() {
        assert!(parse(&["mappings", "delete", "--all"]).is_ok());
        assert!(parse(&["mappings", "delete"]).is_err());
        assert!(parse(&["mappings", "delete", "--all", "--filter", "{}"]).is_err());
    }

    #[test]
    fn test_status_body_and_body_file_exclusive() {
        assert!(parse(&["status", "503", "--body", "x", "--filter", "{}"]).is_ok());
        assert!(
            parse(&[
                "status",
                "503",
                "--body",
                "x",
                "--body-file",
                "y.json",
                "--filter",
                "{}"
            ])
            .is_err()
        );
    }

    #[test]
    fn test_timeout_parses_humantime() {
        let cli = parse(&["--timeout", "750ms", "ping"]).unwrap();
        assert_eq!(cli.target.timeout, Some(Duration::from_millis(750)));
    }

    #[test]
    fn test_target_overrides() {
        let cli = parse(&["--host", "mock", "--port", "9090", "ping"]).unwrap();
        let overrides = cli.target.overrides();
        assert_eq!(overrides.host.as_deref(), Some("mock"));
        assert_eq!(overrides.port, Some(9090));
        assert!(overrides.url.is_none());
    }

    #[test]
    fn test_verbose_count_and_quiet() {
        let cli = parse(&["-vvv", "--quiet", "ping"]).unwrap();
        assert_eq!(cli.verbose, 3);
        assert!(cli.quiet);
    }

    #[test]
    fn test_color_choices_parse() {
        for variant in ["auto", "always", "never"] {
            assert!(parse(&["--color", variant, "ping"]).is_ok(), "color={variant}");
        }
    }
}
