//! Eye geometry and the parallel projection policy.
//!
//! Some headsets have canted displays: each eye's view axis is rotated
//! outwards. Applications that assume parallel view axes render incorrectly
//! on them unless the compositor compensates ("parallel projection").

use glam::Quat;
use openxr_sys as xr;

use crate::vendor::{Eye, FovPort};

/// Canting below this is sensor noise.
pub const CANTING_EPSILON: f32 = 0.0001;

/// Signed FOV angles from tangents: left and down negative, right and up positive.
pub fn fov_from_tangents(fov: &FovPort) -> xr::Fovf {
    xr::Fovf {
        angle_left: -fov.left_tan.atan(),
        angle_right: fov.right_tan.atan(),
        angle_up: fov.up_tan.atan(),
        angle_down: -fov.down_tan.atan(),
    }
}

/// Half the rotation angle between the two eye orientations.
///
/// Identical orientations give exactly 0.
pub fn canting_angle(left: Quat, right: Quat) -> f32 {
    let (lv, rv) = (left.xyz(), right.xyz());

    // conj(left) * right, with terms grouped so equal inputs cancel exactly.
    let v = rv * left.w - lv * right.w - lv.cross(rv);
    let w = left.w * right.w + lv.dot(rv);

    v.length().atan2(w.abs())
}

/// Whether parallel projection should be enabled.
///
/// An operator override wins over the user's native FOV preference, which is
/// only queried for canted headsets.
pub fn should_use_parallel_projection(
    canting_angle: f32,
    forced: Option<bool>,
    native_fov_preferred: impl FnOnce() -> bool,
) -> bool {
    canting_angle > CANTING_EPSILON && forced.unwrap_or_else(|| !native_fov_preferred())
}

/// Projection state derived once per device.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProjectionPolicyState {
    /// Unsigned, in radians.
    pub canting_angle: f32,
    pub parallel_projection: bool,
    pub fov_level: i32,
}

impl ProjectionPolicyState {
    /// Canting attributed to one eye: the left eye rotates the opposite way.
    pub fn signed_canting(&self, eye: Eye) -> f32 {
        match eye {
            Eye::Left => -self.canting_angle,
            Eye::Right => self.canting_angle,
        }
    }
}
