//! Diagnostic logging to stderr.
//!
//! Report lines (coords, saved-to) are printed directly; `tracing` output is
//! for diagnostics and defaults to warnings only.

use tracing_subscriber::EnvFilter;

/// Environment variable holding a filter directive, e.g. `sc_capture=debug`.
pub const LOG_ENV_VAR: &str = "BOXCUTTER_LOG";

const FALLBACK_FILTER: &str = "warn";

/// Pick the filter: `BOXCUTTER_LOG`, then the settings value, then `warn`.
/// Directives that do not parse are skipped.
pub fn build_filter(from_env: Option<&str>, from_settings: &str) -> EnvFilter {
    from_env
        .into_iter()
        .chain(std::iter::once(from_settings))
        .filter(|directive| !directive.trim().is_empty())
        .find_map(|directive| EnvFilter::try_new(directive).ok())
        .unwrap_or_else(|| EnvFilter::new(FALLBACK_FILTER))
}

/// Install the global subscriber. Calling it again is a no-op.
pub fn init(settings_filter: &str) {
    let from_env = std::env::var(LOG_ENV_VAR).ok();
    let filter = build_filter(from_env.as_deref(), settings_filter);

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
