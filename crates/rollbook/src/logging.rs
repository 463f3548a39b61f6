//! Diagnostics for rollbook.
//!
//! Record output goes to stdout; everything logged here goes to stderr so
//! `rollbook list --format json` can be piped safely. Only events from this
//! crate are shown unless an explicit filter is given through `ROLLBOOK_LOG`
//! or `RUST_LOG`.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding a filter directive that overrides the flags.
pub const LOG_ENV: &str = "ROLLBOOK_LOG";

/// How much the store reports about its work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    /// Errors only (`-q`).
    Quiet,
    /// Warnings, such as updating or deleting an unknown id.
    #[default]
    Normal,
    /// Debug and above: loads, saves, replaced ids and search counts (`-v`).
    Verbose,
    /// Everything, including byte counts of each read and write (`-vv`).
    Trace,
}

impl Verbosity {
    /// Pick a verbosity from the `-q` flag and the number of `-v` flags.
    ///
    /// `-q` wins over any number of `-v`.
    #[must_use]
    pub fn from_flags(quiet: bool, verbose: u8) -> Self {
        match (quiet, verbose) {
            (true, _) => Self::Quiet,
            (false, 0) => Self::Normal,
            (false, 1) => Self::Verbose,
            (false, _) => Self::Trace,
        }
    }

    /// The most detailed level shown at this verbosity.
    #[must_use]
    pub fn level(self) -> LevelFilter {
        match self {
            Self::Quiet => LevelFilter::ERROR,
            Self::Normal => LevelFilter::WARN,
            Self::Verbose => LevelFilter::DEBUG,
            Self::Trace => LevelFilter::TRACE,
        }
    }

    /// Filter directive limited to this crate's events.
    #[must_use]
    pub fn directive(self) -> String {
        let level = self.level().to_string().to_lowercase();
        format!("{}={level}", env!("CARGO_CRATE_NAME"))
    }
}

/// Build the filter: `ROLLBOOK_LOG`, then `RUST_LOG`, then `verbosity`.
fn build_filter(verbosity: Verbosity) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(verbosity.directive()))
}

/// Install the stderr subscriber.
///
/// Timestamps and targets are only printed at `Verbose` and above; a plain
/// warning reads like any other CLI message. Only the first call installs a
/// subscriber.
pub fn init_logging(verbosity: Verbosity) {
    let detailed = verbosity >= Verbosity::Verbose;
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(detailed);
    let registry = tracing_subscriber::registry().with(build_filter(verbosity));

    // Fails only if a subscriber is already installed.
    if detailed {
        let _ = registry.with(layer).try_init();
    } else {
        let _ = registry.with(layer.without_time()).try_init();
    }
}

/// Route events to the test harness's captured output.
#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(Verbosity::Verbose.directive())
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_flags() {
        assert_eq!(Verbosity::from_flags(false, 0), Verbosity::Normal);
        assert_eq!(Verbosity::from_flags(false, 1), Verbosity::Verbose);
        assert_eq!(Verbosity::from_flags(false, 2), Verbosity::Trace);
        assert_eq!(Verbosity::from_flags(false, 9), Verbosity::Trace);
        assert_eq!(Verbosity::from_flags(true, 2), Verbosity::Quiet);
    }

    #[test]
    fn test_levels() {
        assert_eq!(Verbosity::Quiet.level(), LevelFilter::ERROR);
        assert_eq!(Verbosity::Normal.level(), LevelFilter::WARN);
        assert_eq!(Verbosity::Verbose.level(), LevelFilter::DEBUG);
        assert_eq!(Verbosity::Trace.level(), LevelFilter::TRACE);
        assert!(Verbosity::Quiet < Verbosity::Trace);
    }

    #[test]
    fn test_directive_names_this_crate() {
        assert_eq!(Verbosity::default().directive(), "rollbook=warn");
        assert_eq!(Verbosity::Verbose.directive(), "rollbook=debug");
        assert!(EnvFilter::try_new(Verbosity::Trace.directive()).is_ok());
    }

    #[test]
    fn test_init_logging_is_repeatable() {
        init_test_logging();
        init_logging(Verbosity::Quiet);
        init_logging(Verbosity::Trace);
    }
}
