//! System discovery and device state.
//!
//! - `session`: `DeviceSessionManager`, owner of the PVR session and of every
//!   fact derived from the connected headset
//! - `eye_geometry`: FOV angles, canting, parallel projection policy
//! - `eye_tracking`: eye tracker selection
//! - `properties`: system properties and blend modes reported to applications

pub mod eye_geometry;
pub mod eye_tracking;
pub mod properties;
pub mod session;


pub use eye_geometry::{ProjectionPolicyState, CANTING_EPSILON};
pub use eye_tracking::{EyeTrackerSdk, EyeTrackingBackend, EyeTrackingState};
pub use properties::{SystemProperties, SYSTEM_ID};
pub use session::{DeviceContext, DeviceSessionManager, DisplayDeviceInfo};

/// OpenXR extensions enabled by the application that change discovery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtensionSet {
    /// XR_EXT_eye_gaze_interaction
    pub eye_gaze_interaction: bool,
    /// XR_EXT_hand_tracking
    pub hand_tracking: bool,
}
