//! Logging setup.
//!
//! Everything is logged through `tracing` to stderr, in human or JSON form.
//! Verbosity raises this crate's level first so `-v` shows mapping-level
//! decisions without the HTTP client's connection chatter. Setting
//! `STUBCHAOS_LOG_LEVEL` replaces the computed filter entirely.

use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

use crate::cli::args::ColorChoice;

/// Environment variable overriding the log filter.
pub const LOG_LEVEL_ENV: &str = "STUBCHAOS_LOG_LEVEL";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with optional ANSI colors.
    #[default]
    Human,
    /// Newline-delimited JSON, one event per line.
    Json,
}

/// Filter directive for a `-v` count.
///
/// - quiet → `"error"`
/// - 0 → `"warn"`
/// - 1 → `"stubchaos=info,warn"`
/// - 2 → `"stubchaos=debug,info"`
/// - 3+ → `"trace"`
#[must_use]
pub const fn filter_directive(verbosity: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbosity {
        0 => "warn",
        1 => "stubchaos=info,warn",
        2 => "stubchaos=debug,info",
        _ => "trace",
    }
}

fn use_ansi(color: ColorChoice) -> bool {
    match color {
        ColorChoice::Auto => {
            std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none()
        }
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    }
}

/// Installs the global subscriber.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging(format: LogFormat, verbosity: u8, quiet: bool, color: ColorChoice) {
    let filter = EnvFilter::try_from_env(LOG_LEVEL_ENV)
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(verbosity, quiet)));
    let show_target = verbosity >= 2;

    let installed = match format {
        LogFormat::Human => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(use_ansi(color))
            .with_target(show_target)
            .with_writer(std::io::stderr)
            .try_init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_current_span(false)
            .with_target(show_target)
            .with_writer(std::io::stderr)
            .try_init(),
    };
    if installed.is_err() {
        tracing::trace!("subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_format_default_is_human() {
        assert_eq!(LogFormat::default(), LogFormat::Human);
    }

    #[test]
    fn repeated_init_is_ignored() {
        init_logging(LogFormat::Human, 0, false, ColorChoice::Auto);
        init_logging(LogFormat::Json, 3, false, ColorChoice::Never);
    }

    #[test]
    fn quiet_wins_over_verbosity() {
        assert_eq!(filter_directive(3, true), "error");
    }

    #[test]
    fn verbosity_scopes_crate_first() {
        assert_eq!(filter_directive(0, false), "warn");
        assert_eq!(filter_directive(1, false), "stubchaos=info,warn");
        assert_eq!(filter_directive(2, false), "stubchaos=debug,info");
        assert_eq!(filter_directive(9, false), "trace");
    }

    #[test]
    fn directives_parse() {
        for v in 0..4 {
            assert!(EnvFilter::try_new(filter_directive(v, false)).is_ok());
        }
    }

    #[test]
    fn never_color_disables_ansi() {
        assert!(!use_ansi(ColorChoice::Never));
        assert!(use_ansi(ColorChoice::Always));
    }
}
