//! Bring-up core of an OpenXR runtime for headsets driven by the PVR
//! compositor service.
//!
//! - `system`: session lifecycle, device discovery and per-device geometry
//! - `graphics`: swapchain format negotiation and OpenGL context handling
//! - `vendor`: what the runtime needs from the PVR service
//! - `config`, `logging`, `error`: ambient plumbing

pub mod config;
pub mod error;
pub mod graphics;
pub mod logging;
pub mod system;
pub mod vendor;

use std::path::Path;

pub use error::{RuntimeError, RuntimeResult};
pub use system::{DeviceSessionManager, ExtensionSet};

/// Process start-up: install the logger and the operator settings.
///
/// A missing settings file leaves every setting at its default.
pub fn init(settings_path: &Path) -> RuntimeResult<()> {
    logging::init();

    let settings = config::RuntimeSettings::load(settings_path)?;
    log::info!("[INIT] Loaded {} setting(s) from {:?}", settings.len(), settings_path);
    config::install(settings);
    Ok(())
}
