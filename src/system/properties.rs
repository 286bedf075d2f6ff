//! Properties of the single system the runtime exposes.

use openxr_sys as xr;

/// The only system id handed out.
pub const SYSTEM_ID: u64 = 1;

/// Maximum number of layers the compositor accepts per frame.
pub const MAX_LAYER_COUNT: u32 = 16;
pub const MAX_SWAPCHAIN_IMAGE_SIZE: u32 = 16384;

/// Only fully immersive rendering is supported.
pub const ENVIRONMENT_BLEND_MODES: [xr::EnvironmentBlendMode; 1] =
    [xr::EnvironmentBlendMode::OPAQUE];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemProperties {
    pub system_id: u64,
    pub vendor_id: u32,
    pub system_name: String,
    pub max_layer_count: u32,
    pub max_swapchain_image_width: u32,
    pub max_swapchain_image_height: u32,
    pub orientation_tracking: bool,
    pub position_tracking: bool,
    /// `None` unless the application enabled hand tracking.
    pub supports_hand_tracking: Option<bool>,
    /// `None` unless the application enabled eye gaze interaction.
    pub supports_eye_gaze_interaction: Option<bool>,
}
