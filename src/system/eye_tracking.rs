//! Eye tracker selection.

use crate::config::{keys, Settings};
use crate::vendor::HmdInfo;

/// Headset whose eye tracker is exposed by the PVR service itself.
pub const NATIVE_EYE_TRACKING_VENDOR_ID: u16 = 0x34A4;
pub const NATIVE_EYE_TRACKING_PRODUCT_ID: u16 = 0x0012;

/// Which eye tracker feeds the eye gaze interaction profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EyeTrackingBackend {
    #[default]
    None,
    Simulated,
    /// Provided by the PVR service.
    VendorNative,
    /// Provided by an add-on SDK for headsets without a native tracker.
    ThirdPartySdk,
}

/// Add-on eye tracker SDK. Probing can take a while.
pub trait EyeTrackerSdk {
    /// Initialize the SDK and check a tracker is present.
    fn initialize(&mut self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EyeTrackingState {
    pub backend: EyeTrackingBackend,
    /// Consent given and a tracker is present.
    pub available: bool,
}

/// Pick the eye tracker for a newly detected device.
///
/// Nothing is probed when the application did not ask for eye gaze.
pub fn select_backend(
    hmd_info: &HmdInfo,
    settings: &dyn Settings,
    eye_gaze_requested: bool,
    sdk: Option<&mut (dyn EyeTrackerSdk + '_)>,
) -> EyeTrackingState {
    let consent = settings.get_bool(keys::ALLOW_EYE_TRACKING).unwrap_or(false);

    let mut backend = EyeTrackingBackend::None;
    if eye_gaze_requested {
        if settings.get_bool(keys::DEBUG_EYE_TRACKER).unwrap_or(false) {
            backend = EyeTrackingBackend::Simulated;
        } else if hmd_info.vendor_id == NATIVE_EYE_TRACKING_VENDOR_ID
            && hmd_info.product_id == NATIVE_EYE_TRACKING_PRODUCT_ID
        {
            backend = EyeTrackingBackend::VendorNative;
        } else if let Some(sdk) = sdk {
            if sdk.initialize() {
                backend = EyeTrackingBackend::ThirdPartySdk;
            }
        }
    }

    EyeTrackingState {
        backend,
        available: consent && backend != EyeTrackingBackend::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuntimeSettings;

    struct Sdk {
        present: bool,
        calls: u32,
    }

    impl EyeTrackerSdk for Sdk {
        fn initialize(&mut self) -> bool {
            self.calls += 1;
            self.present
        }
    }

    fn crystal() -> HmdInfo {
        HmdInfo {
            vendor_id: NATIVE_EYE_TRACKING_VENDOR_ID,
            product_id: NATIVE_EYE_TRACKING_PRODUCT_ID,
            serial_number: "C1".to_string(),
            ..Default::default()
        }
    }

    fn other_headset() -> HmdInfo {
        HmdInfo {
            vendor_id: 0x0483,
            product_id: 0x0101,
            serial_number: "8K".to_string(),
            ..Default::default()
        }
    }

    fn consenting() -> RuntimeSettings {
        let mut settings = RuntimeSettings::new();
        settings.set_bool(keys::ALLOW_EYE_TRACKING, true);
        settings
    }

    #[test]
    fn test_debug_override_wins() {
        let mut settings = consenting();
        settings.set_bool(keys::DEBUG_EYE_TRACKER, true);
        let mut sdk = Sdk { present: true, calls: 0 };

        let state = select_backend(&crystal(), &settings, true, Some(&mut sdk));
        assert_eq!(state.backend, EyeTrackingBackend::Simulated);
        assert!(state.available);
        assert_eq!(sdk.calls, 0);
    }

    #[test]
    fn test_native_model_match() {
        let mut sdk = Sdk { present: true, calls: 0 };
        let state = select_backend(&crystal(), &consenting(), true, Some(&mut sdk));
        assert_eq!(state.backend, EyeTrackingBackend::VendorNative);
        assert_eq!(sdk.calls, 0);
    }

    #[test]
    fn test_third_party_sdk() {
        let mut sdk = Sdk { present: true, calls: 0 };
        let state = select_backend(&other_headset(), &consenting(), true, Some(&mut sdk));
        assert_eq!(state.backend, EyeTrackingBackend::ThirdPartySdk);
        assert!(state.available);
        assert_eq!(sdk.calls, 1);

        let mut absent = Sdk { present: false, calls: 0 };
        let state = select_backend(&other_headset(), &consenting(), true, Some(&mut absent));
        assert_eq!(state.backend, EyeTrackingBackend::None);
        assert!(!state.available);
    }

    #[test]
    fn test_not_probed_unless_requested() {
        let mut sdk = Sdk { present: true, calls: 0 };
        let state = select_backend(&other_headset(), &consenting(), false, Some(&mut sdk));
        assert_eq!(state, EyeTrackingState::default());
        assert_eq!(sdk.calls, 0);
    }

    #[test]
    fn test_consent_required() {
        let state = select_backend(&crystal(), &RuntimeSettings::new(), true, None);
        assert_eq!(state.backend, EyeTrackingBackend::VendorNative);
        assert!(!state.available);
    }

    #[test]
    fn test_consent_forced_off_without_tracker() {
        let state = select_backend(&other_headset(), &consenting(), true, None);
        assert_eq!(state.backend, EyeTrackingBackend::None);
        assert!(!state.available);
    }
}
