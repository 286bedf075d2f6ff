//! Graphics back-end plumbing shared by every swapchain.
//!
//! - format negotiation: a client format (DXGI, Vulkan or OpenGL) is resolved
//!   to the compositor's texture format plus its DXGI description
//! - swapchain sub-image validation
//! - `opengl`: running work on the runtime's private OpenGL context

pub mod opengl;

use openxr_sys as xr;
use pvr_texture_formats::ClientFormat;

use crate::error::{RuntimeError, RuntimeResult};

pub use opengl::OpenGlBinding;
pub use pvr_texture_formats::{
    DxgiFormat, FormatInfo, GlFormat, PvrTextureFormat, VkFormat,
};

/// Resolve a format requested by the application.
///
/// Formats the compositor cannot create are rejected here rather than at
/// swapchain creation.
pub fn negotiate_format<F: ClientFormat>(format: F) -> RuntimeResult<FormatInfo> {
    let info = format.describe();
    if !info.is_supported() {
        log::debug!("[SWAPCHAIN] {} format {:?} has no compositor equivalent", F::API, format);
        return Err(RuntimeError::SwapchainFormatUnsupported {
            api: F::API,
            format: format!("{:?}", format),
        });
    }

    log::debug!(
        "[SWAPCHAIN] {} format {:?} -> {:?} ({}, typeless {}, srgb {})",
        F::API,
        format,
        info.pvr,
        info.canonical,
        info.typeless,
        info.is_srgb
    );
    Ok(info)
}

/// Formats offered to applications of one back-end, preferred first.
pub fn supported_formats<F: ClientFormat>() -> Vec<F> {
    F::supported()
}

/// Whether `rect` lies within a `width` x `height` swapchain image.
pub fn is_valid_swapchain_rect(width: u32, height: u32, rect: &xr::Rect2Di) -> bool {
    let (x, y) = (rect.offset.x as i64, rect.offset.y as i64);
    let (w, h) = (rect.extent.width as i64, rect.extent.height as i64);

    x >= 0 && y >= 0 && w > 0 && h > 0 && x + w <= width as i64 && y + h <= height as i64
}
