//! Texture format translation for the PVR compositor.
//!
//! Each client graphics API names its pixel formats differently. This crate
//! maps them onto the compositor's own texture format enum and back onto a
//! single canonical representation (DXGI) used when describing swapchains:
//!
//! - `GlFormat`: OpenGL sized internal formats (legacy immediate-mode API)
//! - `VkFormat`: Vulkan formats (cross-vendor explicit API)
//! - `DxgiFormat`: DXGI formats shared by D3D11 and D3D12
//! - `PvrTextureFormat`: the compositor's internal format
//!
//! Every API has its own mapping table behind the `ClientFormat` trait, so a
//! new back-end only needs a new table. Unmapped formats resolve to
//! `PvrTextureFormat::Unknown` / `DxgiFormat::UNKNOWN`, never to a default.

use std::fmt;

// ============================================================================
// Compositor Formats
// ============================================================================

/// Texture formats understood by the PVR compositor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PvrTextureFormat {
    #[default]
    Unknown,
    B8G8R8A8Unorm,
    B8G8R8A8UnormSrgb,
    B8G8R8X8Unorm,
    B8G8R8X8UnormSrgb,
    R8G8B8A8Unorm,
    R8G8B8A8UnormSrgb,
    R16G16B16A16Float,
    D16Unorm,
    D24UnormS8Uint,
    D32Float,
    D32FloatS8X24Uint,
}

impl PvrTextureFormat {
    pub const ALL: [PvrTextureFormat; 11] = [
        PvrTextureFormat::B8G8R8A8Unorm,
        PvrTextureFormat::B8G8R8A8UnormSrgb,
        PvrTextureFormat::B8G8R8X8Unorm,
        PvrTextureFormat::B8G8R8X8UnormSrgb,
        PvrTextureFormat::R8G8B8A8Unorm,
        PvrTextureFormat::R8G8B8A8UnormSrgb,
        PvrTextureFormat::R16G16B16A16Float,
        PvrTextureFormat::D16Unorm,
        PvrTextureFormat::D24UnormS8Uint,
        PvrTextureFormat::D32Float,
        PvrTextureFormat::D32FloatS8X24Uint,
    ];

    pub fn is_unknown(&self) -> bool {
        matches!(self, PvrTextureFormat::Unknown)
    }

    pub fn is_depth(&self) -> bool {
        matches!(
            self,
            PvrTextureFormat::D16Unorm
                | PvrTextureFormat::D24UnormS8Uint
                | PvrTextureFormat::D32Float
                | PvrTextureFormat::D32FloatS8X24Uint
        )
    }

    /// Canonical DXGI format used to describe a swapchain of this format.
    pub fn to_dxgi(self) -> DxgiFormat {
        match self {
            PvrTextureFormat::Unknown => DxgiFormat::UNKNOWN,
            PvrTextureFormat::B8G8R8A8Unorm => DxgiFormat::B8G8R8A8_UNORM,
            PvrTextureFormat::B8G8R8A8UnormSrgb => DxgiFormat::B8G8R8A8_UNORM_SRGB,
            PvrTextureFormat::B8G8R8X8Unorm => DxgiFormat::B8G8R8X8_UNORM,
            PvrTextureFormat::B8G8R8X8UnormSrgb => DxgiFormat::B8G8R8X8_UNORM_SRGB,
            PvrTextureFormat::R8G8B8A8Unorm => DxgiFormat::R8G8B8A8_UNORM,
            PvrTextureFormat::R8G8B8A8UnormSrgb => DxgiFormat::R8G8B8A8_UNORM_SRGB,
            PvrTextureFormat::R16G16B16A16Float => DxgiFormat::R16G16B16A16_FLOAT,
            PvrTextureFormat::D16Unorm => DxgiFormat::D16_UNORM,
            PvrTextureFormat::D24UnormS8Uint => DxgiFormat::D24_UNORM_S8_UINT,
            PvrTextureFormat::D32Float => DxgiFormat::D32_FLOAT,
            PvrTextureFormat::D32FloatS8X24Uint => DxgiFormat::D32_FLOAT_S8X24_UINT,
        }
    }
}

// ============================================================================
// DXGI (D3D11 / D3D12)
// ============================================================================

/// A `DXGI_FORMAT` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DxgiFormat(pub u32);

impl DxgiFormat {
    pub const UNKNOWN: Self = Self(0);
    pub const R16G16B16A16_TYPELESS: Self = Self(9);
    pub const R16G16B16A16_FLOAT: Self = Self(10);
    pub const R32G8X24_TYPELESS: Self = Self(19);
    pub const D32_FLOAT_S8X24_UINT: Self = Self(20);
    pub const R10G10B10A2_UNORM: Self = Self(24);
    pub const R11G11B10_FLOAT: Self = Self(26);
    pub const R8G8B8A8_TYPELESS: Self = Self(27);
    pub const R8G8B8A8_UNORM: Self = Self(28);
    pub const R8G8B8A8_UNORM_SRGB: Self = Self(29);
    pub const R32_TYPELESS: Self = Self(39);
    pub const D32_FLOAT: Self = Self(40);
    pub const R24G8_TYPELESS: Self = Self(44);
    pub const D24_UNORM_S8_UINT: Self = Self(45);
    pub const R16_TYPELESS: Self = Self(53);
    pub const D16_UNORM: Self = Self(55);
    pub const B8G8R8A8_UNORM: Self = Self(87);
    pub const B8G8R8X8_UNORM: Self = Self(88);
    pub const B8G8R8A8_TYPELESS: Self = Self(90);
    pub const B8G8R8A8_UNORM_SRGB: Self = Self(91);
    pub const B8G8R8X8_TYPELESS: Self = Self(92);
    pub const B8G8R8X8_UNORM_SRGB: Self = Self(93);

    pub fn is_unknown(&self) -> bool {
        *self == Self::UNKNOWN
    }

    pub fn is_srgb(&self) -> bool {
        matches!(
            *self,
            Self::R8G8B8A8_UNORM_SRGB | Self::B8G8R8A8_UNORM_SRGB | Self::B8G8R8X8_UNORM_SRGB
        )
    }

    pub fn is_depth(&self) -> bool {
        matches!(
            *self,
            Self::D16_UNORM | Self::D24_UNORM_S8_UINT | Self::D32_FLOAT | Self::D32_FLOAT_S8X24_UINT
        )
    }

    /// Typeless variant of this format, for resources that must be viewed
    /// with more than one encoding (linear + sRGB views, or depth bound as a
    /// shader resource). Formats without a typeless variant map to themselves.
    pub fn typeless(self) -> DxgiFormat {
        match self {
            Self::R8G8B8A8_UNORM | Self::R8G8B8A8_UNORM_SRGB => Self::R8G8B8A8_TYPELESS,
            Self::B8G8R8A8_UNORM | Self::B8G8R8A8_UNORM_SRGB => Self::B8G8R8A8_TYPELESS,
            Self::B8G8R8X8_UNORM | Self::B8G8R8X8_UNORM_SRGB => Self::B8G8R8X8_TYPELESS,
            Self::R16G16B16A16_FLOAT => Self::R16G16B16A16_TYPELESS,
            Self::D32_FLOAT => Self::R32_TYPELESS,
            Self::D32_FLOAT_S8X24_UINT => Self::R32G8X24_TYPELESS,
            Self::D24_UNORM_S8_UINT => Self::R24G8_TYPELESS,
            Self::D16_UNORM => Self::R16_TYPELESS,
            other => other,
        }
    }

    pub fn has_typeless_variant(&self) -> bool {
        self.typeless() != *self
    }
}

impl fmt::Display for DxgiFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DXGI_FORMAT({})", self.0)
    }
}

// ============================================================================
// Vulkan
// ============================================================================

/// A `VkFormat` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VkFormat(pub i32);

impl VkFormat {
    pub const UNDEFINED: Self = Self(0);
    pub const R8G8B8A8_UNORM: Self = Self(37);
    pub const R8G8B8A8_SRGB: Self = Self(43);
    pub const B8G8R8A8_UNORM: Self = Self(44);
    pub const B8G8R8A8_SRGB: Self = Self(50);
    pub const A2B10G10R10_UNORM_PACK32: Self = Self(64);
    pub const R16G16B16A16_SFLOAT: Self = Self(97);
    pub const D16_UNORM: Self = Self(124);
    pub const D32_SFLOAT: Self = Self(126);
    pub const D24_UNORM_S8_UINT: Self = Self(129);
    pub const D32_SFLOAT_S8_UINT: Self = Self(130);
}

// ============================================================================
// OpenGL
// ============================================================================

/// An OpenGL sized internal format (`GLenum`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlFormat(pub u32);

impl GlFormat {
    pub const RGBA8: Self = Self(0x8058);
    pub const SRGB8_ALPHA8: Self = Self(0x8C43);
    pub const RGBA16F: Self = Self(0x881A);
    pub const R11F_G11F_B10F: Self = Self(0x8C3A);
    pub const COMPRESSED_RGBA_S3TC_DXT1_EXT: Self = Self(0x83F1);
    pub const DEPTH_COMPONENT16: Self = Self(0x81A5);
    pub const DEPTH24_STENCIL8: Self = Self(0x88F0);
    pub const DEPTH_COMPONENT32F: Self = Self(0x8CAC);
    pub const DEPTH32F_STENCIL8: Self = Self(0x8CAD);

    /// Bytes per pixel, or 0 for formats the runtime does not size.
    pub fn bytes_per_pixel(&self) -> usize {
        match *self {
            Self::DEPTH_COMPONENT16 => 2,
            Self::RGBA8
            | Self::SRGB8_ALPHA8
            | Self::DEPTH24_STENCIL8
            | Self::DEPTH_COMPONENT32F
            | Self::R11F_G11F_B10F
            | Self::COMPRESSED_RGBA_S3TC_DXT1_EXT => 4,
            Self::RGBA16F | Self::DEPTH32F_STENCIL8 => 8,
            _ => 0,
        }
    }
}

// ============================================================================
// Per-API Mapping Tables
// ============================================================================

/// Everything a swapchain needs to know about a client format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatInfo {
    pub pvr: PvrTextureFormat,
    pub canonical: DxgiFormat,
    pub typeless: DxgiFormat,
    pub is_srgb: bool,
}

impl FormatInfo {
    pub fn is_supported(&self) -> bool {
        !self.pvr.is_unknown()
    }

    pub fn is_typeless_capable(&self) -> bool {
        self.typeless != self.canonical
    }
}

/// A client-facing format identifier with its own table into the compositor.
pub trait ClientFormat: Copy + Eq + fmt::Debug + 'static {
    /// Short API name, for logging.
    const API: &'static str;

    /// Formats offered to applications, preferred first.
    const TABLE: &'static [(Self, PvrTextureFormat)];

    fn to_pvr(self) -> PvrTextureFormat {
        Self::TABLE
            .iter()
            .find(|(format, _)| *format == self)
            .map(|(_, pvr)| *pvr)
            .unwrap_or(PvrTextureFormat::Unknown)
    }

    /// The DXGI format this client format is presented as.
    fn canonical(self) -> DxgiFormat {
        self.to_pvr().to_dxgi()
    }

    fn describe(self) -> FormatInfo {
        let pvr = self.to_pvr();
        let canonical = pvr.to_dxgi();
        FormatInfo {
            pvr,
            canonical,
            typeless: canonical.typeless(),
            is_srgb: canonical.is_srgb(),
        }
    }

    fn supported() -> Vec<Self> {
        Self::TABLE.iter().map(|(format, _)| *format).collect()
    }
}

impl ClientFormat for DxgiFormat {
    const API: &'static str = "D3D";

    const TABLE: &'static [(Self, PvrTextureFormat)] = &[
        (DxgiFormat::R8G8B8A8_UNORM_SRGB, PvrTextureFormat::R8G8B8A8UnormSrgb),
        (DxgiFormat::B8G8R8A8_UNORM_SRGB, PvrTextureFormat::B8G8R8A8UnormSrgb),
        (DxgiFormat::B8G8R8X8_UNORM_SRGB, PvrTextureFormat::B8G8R8X8UnormSrgb),
        (DxgiFormat::R8G8B8A8_UNORM, PvrTextureFormat::R8G8B8A8Unorm),
        (DxgiFormat::B8G8R8A8_UNORM, PvrTextureFormat::B8G8R8A8Unorm),
        (DxgiFormat::B8G8R8X8_UNORM, PvrTextureFormat::B8G8R8X8Unorm),
        (DxgiFormat::R16G16B16A16_FLOAT, PvrTextureFormat::R16G16B16A16Float),
        (DxgiFormat::D32_FLOAT, PvrTextureFormat::D32Float),
        (DxgiFormat::D32_FLOAT_S8X24_UINT, PvrTextureFormat::D32FloatS8X24Uint),
        (DxgiFormat::D24_UNORM_S8_UINT, PvrTextureFormat::D24UnormS8Uint),
        (DxgiFormat::D16_UNORM, PvrTextureFormat::D16Unorm),
    ];
}

impl ClientFormat for VkFormat {
    const API: &'static str = "Vulkan";

    const TABLE: &'static [(Self, PvrTextureFormat)] = &[
        (VkFormat::R8G8B8A8_SRGB, PvrTextureFormat::R8G8B8A8UnormSrgb),
        (VkFormat::B8G8R8A8_SRGB, PvrTextureFormat::B8G8R8A8UnormSrgb),
        (VkFormat::R8G8B8A8_UNORM, PvrTextureFormat::R8G8B8A8Unorm),
        (VkFormat::B8G8R8A8_UNORM, PvrTextureFormat::B8G8R8A8Unorm),
        (VkFormat::R16G16B16A16_SFLOAT, PvrTextureFormat::R16G16B16A16Float),
        (VkFormat::D32_SFLOAT, PvrTextureFormat::D32Float),
        (VkFormat::D32_SFLOAT_S8_UINT, PvrTextureFormat::D32FloatS8X24Uint),
        (VkFormat::D24_UNORM_S8_UINT, PvrTextureFormat::D24UnormS8Uint),
        (VkFormat::D16_UNORM, PvrTextureFormat::D16Unorm),
    ];
}

impl ClientFormat for GlFormat {
    const API: &'static str = "OpenGL";

    const TABLE: &'static [(Self, PvrTextureFormat)] = &[
        (GlFormat::SRGB8_ALPHA8, PvrTextureFormat::R8G8B8A8UnormSrgb),
        (GlFormat::RGBA8, PvrTextureFormat::R8G8B8A8Unorm),
        (GlFormat::RGBA16F, PvrTextureFormat::R16G16B16A16Float),
        (GlFormat::DEPTH_COMPONENT32F, PvrTextureFormat::D32Float),
        (GlFormat::DEPTH32F_STENCIL8, PvrTextureFormat::D32FloatS8X24Uint),
        (GlFormat::DEPTH24_STENCIL8, PvrTextureFormat::D24UnormS8Uint),
        (GlFormat::DEPTH_COMPONENT16, PvrTextureFormat::D16Unorm),
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmapped_formats_are_unknown() {
        assert_eq!(GlFormat::R11F_G11F_B10F.to_pvr(), PvrTextureFormat::Unknown);
        assert_eq!(VkFormat::A2B10G10R10_UNORM_PACK32.to_pvr(), PvrTextureFormat::Unknown);
        assert_eq!(VkFormat::UNDEFINED.to_pvr(), PvrTextureFormat::Unknown);
        assert_eq!(DxgiFormat::R10G10B10A2_UNORM.to_pvr(), PvrTextureFormat::Unknown);
        assert_eq!(DxgiFormat(12345).canonical(), DxgiFormat::UNKNOWN);
        assert!(!GlFormat(0).describe().is_supported());
    }

    #[test]
    fn test_dxgi_round_trip() {
        for format in DxgiFormat::supported() {
            assert_eq!(format.to_pvr().to_dxgi(), format, "{:?}", format);
        }
    }

    #[test]
    fn test_every_vendor_format_has_canonical_form() {
        for pvr in PvrTextureFormat::ALL {
            let dxgi = pvr.to_dxgi();
            assert!(!dxgi.is_unknown(), "{:?}", pvr);
            assert_eq!(dxgi.to_pvr(), pvr);
        }
        assert_eq!(PvrTextureFormat::Unknown.to_dxgi(), DxgiFormat::UNKNOWN);
    }

    #[test]
    fn test_client_tables_agree_on_encoding() {
        assert!(GlFormat::SRGB8_ALPHA8.describe().is_srgb);
        assert!(!GlFormat::RGBA8.describe().is_srgb);
        assert!(VkFormat::B8G8R8A8_SRGB.describe().is_srgb);
        assert!(!VkFormat::B8G8R8A8_UNORM.describe().is_srgb);

        for format in VkFormat::supported() {
            assert!(format.describe().is_supported());
        }
        for format in GlFormat::supported() {
            assert!(format.describe().is_supported());
            assert!(format.bytes_per_pixel() > 0);
        }
    }

    #[test]
    fn test_depth_formats_are_typeless_capable() {
        for format in [
            DxgiFormat::D16_UNORM,
            DxgiFormat::D24_UNORM_S8_UINT,
            DxgiFormat::D32_FLOAT,
            DxgiFormat::D32_FLOAT_S8X24_UINT,
        ] {
            assert!(format.is_depth());
            assert!(format.has_typeless_variant());
        }
        assert_eq!(VkFormat::D32_SFLOAT_S8_UINT.describe().typeless, DxgiFormat::R32G8X24_TYPELESS);
    }

    #[test]
    fn test_typeless_is_idempotent() {
        for value in 0..=130u32 {
            let format = DxgiFormat(value);
            assert_eq!(format.typeless().typeless(), format.typeless());
        }
    }

    #[test]
    fn test_srgb_variants_share_typeless() {
        assert_eq!(
            DxgiFormat::R8G8B8A8_UNORM.typeless(),
            DxgiFormat::R8G8B8A8_UNORM_SRGB.typeless()
        );
        assert_eq!(
            DxgiFormat::B8G8R8X8_UNORM.typeless(),
            DxgiFormat::B8G8R8X8_UNORM_SRGB.typeless()
        );
        assert_eq!(DxgiFormat::R11G11B10_FLOAT.typeless(), DxgiFormat::R11G11B10_FLOAT);
        assert!(!DxgiFormat::R11G11B10_FLOAT.has_typeless_variant());
    }

    #[test]
    fn test_gl_bytes_per_pixel() {
        assert_eq!(GlFormat::DEPTH_COMPONENT16.bytes_per_pixel(), 2);
        assert_eq!(GlFormat::SRGB8_ALPHA8.bytes_per_pixel(), 4);
        assert_eq!(GlFormat::DEPTH32F_STENCIL8.bytes_per_pixel(), 8);
        assert_eq!(GlFormat(0x1234).bytes_per_pixel(), 0);
    }
}
