//! PVR session lifecycle and device discovery.
//!
//! `DeviceSessionManager` owns at most one PVR session and the facts derived
//! from the headset currently connected:
//! - the session is opened lazily and recreated after another client takes
//!   it over
//! - device facts are derived once per headset (keyed by serial number) and
//!   reused until a different serial shows up
//! - a derivation that fails part way leaves nothing cached, so the next
//!   discovery starts over

use openxr_sys as xr;

use super::eye_geometry::{self, ProjectionPolicyState};
use super::eye_tracking::{self, EyeTrackerSdk, EyeTrackingState};
use super::properties::{
    SystemProperties, ENVIRONMENT_BLEND_MODES, MAX_LAYER_COUNT, MAX_SWAPCHAIN_IMAGE_SIZE,
    SYSTEM_ID,
};
use super::ExtensionSet;
use crate::config::{keys, Settings};
use crate::error::{PvrResultExt, RuntimeError, RuntimeResult};
use crate::vendor::convert::{format_fov, format_pose, pvr_pose_to_xr_pose};
use crate::vendor::{
    config_keys, Eye, EyeRenderInfo, HmdInfo, HmdStatus, PvrService, PvrSession, TrackingOrigin,
};

/// Everything derived from one headset.
#[derive(Debug, Clone)]
pub struct DeviceContext {
    pub hmd_info: HmdInfo,
    /// Indexed by `Eye::index`. Refetched after parallel projection is enabled.
    pub eye_info: [EyeRenderInfo; 2],
    pub eye_fov: [xr::Fovf; 2],
    pub projection: ProjectionPolicyState,
    pub eye_tracking: EyeTrackingState,
    /// Eye height above the floor, in meters.
    pub floor_height: f32,
}

impl DeviceContext {
    pub fn eye_fov(&self, eye: Eye) -> xr::Fovf {
        self.eye_fov[eye.index()]
    }

    pub fn eye_pose(&self, eye: Eye) -> xr::Posef {
        pvr_pose_to_xr_pose(&self.eye_info[eye.index()].hmd_to_eye_pose)
    }
}

/// Display facts needed to pick the graphics adapter and pace frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayDeviceInfo {
    pub adapter_luid: u64,
    pub refresh_rate: f32,
    /// Seconds per frame.
    pub ideal_frame_duration: f64,
}

pub struct DeviceSessionManager<S: PvrService> {
    service: S,
    session: Option<S::Session>,
    settings: Box<dyn Settings>,
    extensions: ExtensionSet,
    eye_tracker_sdk: Option<Box<dyn EyeTrackerSdk>>,
    device: Option<DeviceContext>,
    system_created: bool,
    display: Option<DisplayDeviceInfo>,
}

impl<S: PvrService> DeviceSessionManager<S> {
    pub fn new(service: S, settings: Box<dyn Settings>, extensions: ExtensionSet) -> Self {
        Self {
            service,
            session: None,
            settings,
            extensions,
            eye_tracker_sdk: None,
            device: None,
            system_created: false,
            display: None,
        }
    }

    /// Probe this SDK when the headset has no native eye tracker.
    pub fn with_eye_tracker_sdk(mut self, sdk: Box<dyn EyeTrackerSdk>) -> Self {
        self.eye_tracker_sdk = Some(sdk);
        self
    }

    // ========================================================================
    // Session
    // ========================================================================

    /// Make sure a session is open.
    ///
    /// Returns `Ok(false)` when the compositor service is not running. Any
    /// other creation failure is fatal. A new session gets the current
    /// parallel projection state and the eye-level tracking origin.
    pub fn ensure_session(&mut self) -> RuntimeResult<bool> {
        if self.session.is_some() {
            return Ok(true);
        }

        let mut session = match self.service.create_session() {
            Ok(session) => session,
            Err(error) if error.is_service_not_running() => {
                log::info!("[SESSION] PVR service is not running");
                return Ok(false);
            },
            Err(error) => {
                log::error!("[SESSION] pvr_createSession failed: {}", error);
                return Err(RuntimeError::Pvr {
                    call: "pvr_createSession",
                    error,
                });
            },
        };

        let parallel = self.parallel_projection();
        session
            .set_int_config(config_keys::VIEW_ROTATION_FIX, parallel as i32)
            .check("pvr_setIntConfig")?;
        session
            .set_tracking_origin_type(TrackingOrigin::EyeLevel)
            .check("pvr_setTrackingOriginType")?;

        log::debug!("[SESSION] Session created (parallel projection: {})", parallel);
        self.session = Some(session);
        Ok(true)
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// The open session, for collaborators that talk to the service directly.
    pub fn session_mut(&mut self) -> Option<&mut S::Session> {
        self.session.as_mut()
    }

    /// Close the session. Cached device facts are kept.
    pub fn shutdown(&mut self) {
        if self.session.take().is_some() {
            log::debug!("[SESSION] Session destroyed");
        }
    }

    fn live_session(&mut self) -> RuntimeResult<&mut S::Session> {
        self.session.as_mut().ok_or(RuntimeError::SessionLost)
    }

    // ========================================================================
    // Discovery
    // ========================================================================

    /// Resolve the HMD system, refreshing device facts if the headset changed.
    ///
    /// Returns `FormFactorUnavailable` when the service is not running or no
    /// headset is ready; the cached device is cleared in both cases.
    pub fn discover_system(&mut self, form_factor: xr::FormFactor) -> RuntimeResult<xr::SystemId> {
        if form_factor != xr::FormFactor::HEAD_MOUNTED_DISPLAY {
            return Err(RuntimeError::FormFactorUnsupported(form_factor));
        }

        // A session may have been taken over since the last call.
        let mut known_status = None;
        if let Some(session) = self.session.as_mut() {
            let status = session.hmd_status().check("pvr_getHmdStatus")?;
            log_status(&status);
            if status.should_quit {
                log::info!("[SESSION] Session was taken over, recreating it");
                self.session = None;
            } else {
                known_status = Some(status);
            }
        }

        if !self.ensure_session()? {
            self.device = None;
            return Err(RuntimeError::FormFactorUnavailable);
        }

        let status = match known_status {
            Some(status) => status,
            None => {
                let status = self.live_session()?.hmd_status().check("pvr_getHmdStatus")?;
                log_status(&status);
                status
            },
        };
        if !status.is_available() {
            log::debug!("[SYSTEM] HMD not ready");
            self.device = None;
            return Err(RuntimeError::FormFactorUnavailable);
        }

        let hmd_info = self.live_session()?.hmd_info().check("pvr_getHmdInfo")?;
        let changed = self
            .device
            .as_ref()
            .map_or(true, |device| !device.hmd_info.is_same_device(&hmd_info));
        if changed {
            // The previous headset's facts no longer apply, even if derivation fails.
            self.device = None;
            let device = self.derive_device_context(hmd_info)?;
            self.device = Some(device);
        }

        self.system_created = true;
        Ok(xr::SystemId::from_raw(SYSTEM_ID))
    }

    /// Derive all per-device facts for a newly seen headset.
    fn derive_device_context(&mut self, hmd_info: HmdInfo) -> RuntimeResult<DeviceContext> {
        log::info!(
            "[SYSTEM] Device is: {} {} (serial {}, firmware {}.{}, {}x{})",
            hmd_info.manufacturer,
            hmd_info.product_name,
            hmd_info.serial_number,
            hmd_info.firmware_major,
            hmd_info.firmware_minor,
            hmd_info.resolution.width,
            hmd_info.resolution.height
        );

        let session = self.session.as_mut().ok_or(RuntimeError::SessionLost)?;

        // Measure the raw geometry first.
        session
            .set_int_config(config_keys::VIEW_ROTATION_FIX, 0)
            .check("pvr_setIntConfig")?;

        let sdk: Option<&mut dyn EyeTrackerSdk> = match &mut self.eye_tracker_sdk {
            Some(sdk) => Some(sdk.as_mut()),
            None => None,
        };
        let eye_tracking = eye_tracking::select_backend(
            &hmd_info,
            self.settings.as_ref(),
            self.extensions.eye_gaze_interaction,
            sdk,
        );
        log::info!(
            "[SYSTEM] Eye tracking: {:?} (available: {})",
            eye_tracking.backend,
            eye_tracking.available
        );

        let mut eye_info = fetch_eye_info(session)?;
        let canting_angle = eye_geometry::canting_angle(
            eye_info[0].hmd_to_eye_pose.orientation,
            eye_info[1].hmd_to_eye_pose.orientation,
        );

        let floor_height = session.get_float_config(config_keys::EYE_HEIGHT, 0.0);
        log::info!("[SYSTEM] Floor height: {:.3}", floor_height);

        let forced = self.settings.get_bool(keys::FORCE_PARALLEL_PROJECTION_STATE);
        let parallel_projection =
            eye_geometry::should_use_parallel_projection(canting_angle, forced, || {
                session.get_int_config(config_keys::USE_NATIVE_FOV, 0) != 0
            });
        if parallel_projection {
            log::info!("[SYSTEM] Parallel projection is enabled");
            session
                .set_int_config(config_keys::VIEW_ROTATION_FIX, 1)
                .check("pvr_setIntConfig")?;
            eye_info = fetch_eye_info(session)?;
        }

        let fov_level = session.get_int_config(config_keys::FOV_LEVEL, 0);
        log::info!("[SYSTEM] FOV level: {}", fov_level);

        let projection = ProjectionPolicyState {
            canting_angle,
            parallel_projection,
            fov_level,
        };

        let eye_fov = [
            eye_geometry::fov_from_tangents(&eye_info[0].fov),
            eye_geometry::fov_from_tangents(&eye_info[1].fov),
        ];
        for eye in Eye::BOTH {
            log::debug!(
                "[SYSTEM] {} eye pose {}, fov {}, canting {:.3} deg",
                eye.as_str(),
                format_pose(&eye_info[eye.index()].hmd_to_eye_pose),
                format_fov(&eye_fov[eye.index()]),
                projection.signed_canting(eye).to_degrees()
            );
        }

        session
            .set_tracking_origin_type(TrackingOrigin::EyeLevel)
            .check("pvr_setTrackingOriginType")?;

        Ok(DeviceContext {
            hmd_info,
            eye_info,
            eye_fov,
            projection,
            eye_tracking,
            floor_height,
        })
    }

    // ========================================================================
    // Queries
    // ========================================================================

    fn check_system(&self, system_id: xr::SystemId) -> RuntimeResult<()> {
        if !self.system_created || system_id.into_raw() != SYSTEM_ID {
            return Err(RuntimeError::SystemInvalid(system_id.into_raw()));
        }
        Ok(())
    }

    pub fn system_properties(&self, system_id: xr::SystemId) -> RuntimeResult<SystemProperties> {
        self.check_system(system_id)?;

        let (vendor_id, system_name, eye_gaze) = match &self.device {
            Some(device) => (
                device.hmd_info.vendor_id as u32,
                device.hmd_info.product_name.clone(),
                device.eye_tracking.available,
            ),
            None => (0, String::new(), false),
        };

        Ok(SystemProperties {
            system_id: SYSTEM_ID,
            vendor_id,
            system_name,
            max_layer_count: MAX_LAYER_COUNT,
            max_swapchain_image_width: MAX_SWAPCHAIN_IMAGE_SIZE,
            max_swapchain_image_height: MAX_SWAPCHAIN_IMAGE_SIZE,
            orientation_tracking: true,
            position_tracking: true,
            supports_hand_tracking: self.extensions.hand_tracking.then_some(true),
            supports_eye_gaze_interaction: self
                .extensions
                .eye_gaze_interaction
                .then_some(eye_gaze),
        })
    }

    pub fn enumerate_environment_blend_modes(
        &self,
        system_id: xr::SystemId,
        view_configuration: xr::ViewConfigurationType,
    ) -> RuntimeResult<&'static [xr::EnvironmentBlendMode]> {
        self.check_system(system_id)?;
        if view_configuration != xr::ViewConfigurationType::PRIMARY_STEREO {
            return Err(RuntimeError::ViewConfigurationUnsupported(view_configuration));
        }
        Ok(&ENVIRONMENT_BLEND_MODES)
    }

    /// Adapter and refresh rate of the headset display.
    pub fn display_device_info(&mut self) -> RuntimeResult<DisplayDeviceInfo> {
        if !self.ensure_session()? {
            return Err(RuntimeError::SessionLost);
        }

        let info = self
            .live_session()?
            .eye_display_info(Eye::Left)
            .check("pvr_getEyeDisplayInfo")?;
        if info.refresh_rate.is_nan() || info.refresh_rate <= 0.0 {
            return Err(RuntimeError::Other(format!(
                "invalid display refresh rate {}",
                info.refresh_rate
            )));
        }

        let display = DisplayDeviceInfo {
            adapter_luid: info.luid,
            refresh_rate: info.refresh_rate,
            ideal_frame_duration: 1.0 / info.refresh_rate as f64,
        };
        log::debug!(
            "[SYSTEM] Display {}x{} @ {} Hz on adapter {:#x}",
            info.width,
            info.height,
            info.refresh_rate,
            info.luid
        );
        self.display = Some(display);
        Ok(display)
    }

    pub fn device(&self) -> Option<&DeviceContext> {
        self.device.as_ref()
    }

    pub fn cached_hmd_info(&self) -> Option<&HmdInfo> {
        self.device.as_ref().map(|device| &device.hmd_info)
    }

    pub fn parallel_projection(&self) -> bool {
        self.device
            .as_ref()
            .is_some_and(|device| device.projection.parallel_projection)
    }

    pub fn is_system_created(&self) -> bool {
        self.system_created
    }

    /// Last result of `display_device_info`.
    pub fn cached_display_info(&self) -> Option<DisplayDeviceInfo> {
        self.display
    }

    pub fn extensions(&self) -> ExtensionSet {
        self.extensions
    }
}

fn fetch_eye_info<P: PvrSession>(session: &mut P) -> RuntimeResult<[EyeRenderInfo; 2]> {
    Ok([
        session.eye_render_info(Eye::Left).check("pvr_getEyeRenderInfo")?,
        session.eye_render_info(Eye::Right).check("pvr_getEyeRenderInfo")?,
    ])
}

fn log_status(status: &HmdStatus) {
    log::debug!(
        "[SESSION] HMD status: ready={} present={} mounted={} visible={} display_lost={} should_quit={}",
        status.service_ready,
        status.hmd_present,
        status.hmd_mounted,
        status.is_visible,
        status.display_lost,
        status.should_quit
    );
}
