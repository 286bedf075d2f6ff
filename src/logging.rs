//! Logging setup.
//!
//! The runtime logs through the `log` facade. When loaded into an application
//! nobody else installs a logger, so the entry point calls [`init`].

use env_logger::Env;

/// Environment variable overriding the log filter (`env_logger` syntax).
pub const LOG_ENV: &str = "PVR_OPENXR_LOG";

/// Install the logger. Safe to call more than once.
pub fn init() {
    let result = env_logger::Builder::from_env(Env::default().filter_or(LOG_ENV, "info"))
        .format_timestamp_millis()
        .try_init();

    if result.is_ok() {
        log::info!("[LOGGING] pvr-openxr {} logging initialized", env!("CARGO_PKG_VERSION"));
    }
}
