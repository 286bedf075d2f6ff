//! WGL backend for Windows.

use windows::Win32::Graphics::{
    Gdi::HDC,
    OpenGL::{glGetError, wglGetCurrentContext, wglGetCurrentDC, wglMakeCurrent, HGLRC},
};

use crate::GlPlatform;

/// Device context and rendering context of a WGL context.
#[derive(Debug, Clone, Copy)]
pub struct WglHandles {
    pub dc: HDC,
    pub rc: HGLRC,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Wgl;

impl GlPlatform for Wgl {
    type Handles = WglHandles;

    fn current(&self) -> WglHandles {
        unsafe {
            WglHandles {
                dc: wglGetCurrentDC(),
                rc: wglGetCurrentContext(),
            }
        }
    }

    fn make_current(&self, handles: WglHandles) -> bool {
        unsafe { wglMakeCurrent(handles.dc, handles.rc) }.is_ok()
    }

    fn get_error(&self) -> u32 {
        unsafe { glGetError() }
    }
}
