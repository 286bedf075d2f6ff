//! Runtime configuration.
//!
//! Operator settings are a flat store of integer values looked up by string
//! key (the same shape the settings used to have in the registry). The
//! process-wide store lives behind a `parking_lot::RwLock`; the runtime reads
//! it through the `Settings` trait so tests can supply their own values.

pub mod runtime;

pub use runtime::{install, GlobalSettings, RuntimeSettings, Settings, RUNTIME_SETTINGS};

/// Well-known setting keys.
pub mod keys {
    /// Consent to share eye gaze data with applications.
    pub const ALLOW_EYE_TRACKING: &str = "allow_eye_tracking";
    /// Use a simulated eye tracker.
    pub const DEBUG_EYE_TRACKER: &str = "debug_eye_tracker";
    /// Force parallel projection on (1) or off (0) on canted headsets.
    pub const FORCE_PARALLEL_PROJECTION_STATE: &str = "force_parallel_projection_state";
}
