//! Central error types for the runtime.
//!
//! Errors fall in three groups:
//! - recoverable absence (compositor service not running, HMD not present),
//!   reported to the application as "form factor unavailable"
//! - client mistakes caught here (unsupported form factor, stale system id,
//!   unsupported swapchain format)
//! - fatal failures (any other PVR failure, a leaked OpenGL error) that
//!   abort the current call

use openxr_sys as xr;
use pvr_gl_context::GlContextError;
use thiserror::Error;

use crate::vendor::PvrError;

/// Main error type for runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Compositor service not running, or no HMD ready.
    #[error("HMD form factor unavailable")]
    FormFactorUnavailable,

    /// Only head-mounted displays are supported.
    #[error("Form factor unsupported: {0:?}")]
    FormFactorUnsupported(xr::FormFactor),

    #[error("Invalid system id {0}")]
    SystemInvalid(u64),

    #[error("View configuration unsupported: {0:?}")]
    ViewConfigurationUnsupported(xr::ViewConfigurationType),

    #[error("Swapchain format {format} unsupported by the {api} back-end")]
    SwapchainFormatUnsupported { api: &'static str, format: String },

    /// The PVR session disappeared while the runtime needed it.
    #[error("PVR session was lost")]
    SessionLost,

    /// A PVR call failed with anything other than "service not running".
    #[error("{call} failed: {error}")]
    Pvr { call: &'static str, error: PvrError },

    /// The runtime's OpenGL context left an error pending.
    #[error(transparent)]
    Gl(#[from] GlContextError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl RuntimeError {
    /// Whether the application may simply retry later.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, RuntimeError::FormFactorUnavailable)
    }

    /// Whether cached runtime state can no longer be trusted after this error.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RuntimeError::Pvr { .. } | RuntimeError::Gl(_) | RuntimeError::SessionLost
        )
    }

    /// OpenXR result code reported to the application.
    pub fn to_xr_result(&self) -> xr::Result {
        match self {
            RuntimeError::FormFactorUnavailable => xr::Result::ERROR_FORM_FACTOR_UNAVAILABLE,
            RuntimeError::FormFactorUnsupported(_) => xr::Result::ERROR_FORM_FACTOR_UNSUPPORTED,
            RuntimeError::SystemInvalid(_) => xr::Result::ERROR_SYSTEM_INVALID,
            RuntimeError::ViewConfigurationUnsupported(_) => {
                xr::Result::ERROR_VIEW_CONFIGURATION_TYPE_UNSUPPORTED
            },
            RuntimeError::SwapchainFormatUnsupported { .. } => {
                xr::Result::ERROR_SWAPCHAIN_FORMAT_UNSUPPORTED
            },
            _ => xr::Result::ERROR_RUNTIME_FAILURE,
        }
    }
}

impl From<RuntimeError> for xr::Result {
    fn from(err: RuntimeError) -> Self {
        err.to_xr_result()
    }
}

/// Converts a failed PVR call into a fatal runtime error naming the call.
pub trait PvrResultExt<T> {
    fn check(self, call: &'static str) -> RuntimeResult<T>;
}

impl<T> PvrResultExt<T> for Result<T, PvrError> {
    fn check(self, call: &'static str) -> RuntimeResult<T> {
        self.map_err(|error| RuntimeError::Pvr { call, error })
    }
}

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error, converting it to RuntimeError::Other.
    fn context(self, msg: &str) -> RuntimeResult<T>;

    /// Add context lazily (only evaluated on error).
    fn with_context<F: FnOnce() -> String>(self, f: F) -> RuntimeResult<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for Result<T, E> {
    fn context(self, msg: &str) -> RuntimeResult<T> {
        self.map_err(|e| RuntimeError::Other(format!("{}: {}", msg, e)))
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> RuntimeResult<T> {
        self.map_err(|e| RuntimeError::Other(format!("{}: {}", f(), e)))
    }
}

/// Type alias for Results using RuntimeError.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
