//! `recordkit_log` v1:
//! Process-wide `tracing` subscriber setup shared by the recordkit binaries.

use tracing_subscriber::EnvFilter;

/// Crate prefix the default filter directives apply to.
pub const C_LOG_TARGET_PREFIX: &str = "recordkit";

/// Default filter directive for the given verbosity.
pub fn derive_filter_directive(if_verbose: bool) -> String {
    let c_level = if if_verbose { "debug" } else { "info" };
    format!("{C_LOG_TARGET_PREFIX}={c_level}")
}

/// Filter from `RUST_LOG` when set and valid, the verbosity default otherwise.
pub fn derive_env_filter(if_verbose: bool) -> Result<EnvFilter, String> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(derive_filter_directive(if_verbose))
            .map_err(|err| format!("Invalid log filter: {err}")),
    }
}

/// Install a formatting subscriber writing to stderr.
///
/// Fails when a global subscriber is already installed.
pub fn init_logging(if_verbose: bool) -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(derive_env_filter(if_verbose)?)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| format!("Failed to install log subscriber: {err}"))
}
