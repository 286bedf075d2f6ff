//! OpenGL back-end binding.
//!
//! The runtime renders into its own OpenGL context, which shares objects with
//! the application's. Every piece of work on that context goes through
//! `OpenGlBinding::run`, so the application's context is current again
//! afterwards and leaked GL errors surface as fatal `RuntimeError::Gl`.

use pvr_gl_context::{run_in_context, GlContext, GlPlatform};

use crate::error::RuntimeResult;
use crate::graphics::GlFormat;

pub struct OpenGlBinding<P: GlPlatform> {
    platform: P,
    context: GlContext<P::Handles>,
}

impl<P: GlPlatform> OpenGlBinding<P> {
    pub fn new(platform: P, context: GlContext<P::Handles>) -> Self {
        if !context.is_valid() {
            log::debug!("[OPENGL] No runtime context, context switches are no-ops");
        }
        Self { platform, context }
    }

    pub fn context(&self) -> &GlContext<P::Handles> {
        &self.context
    }

    /// Run `body` on the runtime's context.
    pub fn run<R>(&self, body: impl FnOnce() -> RuntimeResult<R>) -> RuntimeResult<R> {
        run_in_context(&self.platform, &self.context, body)
    }
}

/// Bytes used by one `width` x `height` image, or `None` for formats with no
/// known pixel size.
pub fn image_size(format: GlFormat, width: u32, height: u32) -> Option<usize> {
    match format.bytes_per_pixel() {
        0 => None,
        bpp => Some(bpp * width as usize * height as usize),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuntimeError;
    use pvr_gl_context::GlContextError;
    use std::cell::{Cell, RefCell};

    /// Contexts are numbers; only the runtime context (1) records errors.
    struct FakeGl {
        current: Cell<u32>,
        pending: RefCell<Vec<u32>>,
    }

    impl FakeGl {
        fn new() -> Self {
            Self {
                current: Cell::new(7),
                pending: RefCell::new(Vec::new()),
            }
        }
    }

    impl GlPlatform for FakeGl {
        type Handles = u32;

        fn current(&self) -> u32 {
            self.current.get()
        }

        fn make_current(&self, handles: u32) -> bool {
            self.current.set(handles);
            true
        }

        fn get_error(&self) -> u32 {
            if self.current.get() != 1 {
                return 0;
            }
            self.pending.borrow_mut().pop().unwrap_or(0)
        }
    }

    #[test]
    fn test_run_switches_context() {
        let binding = OpenGlBinding::new(FakeGl::new(), GlContext::new(1));
        let seen = binding.run(|| Ok(binding.platform.current())).unwrap();
        assert_eq!(seen, 1);
        assert_eq!(binding.platform.current(), 7);
    }

    #[test]
    fn test_leaked_error_is_fatal() {
        let binding = OpenGlBinding::new(FakeGl::new(), GlContext::new(1));
        let err = binding
            .run(|| {
                binding.platform.pending.borrow_mut().push(0x502);
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, RuntimeError::Gl(GlContextError::Leaked { code: 0x502 })));
        assert!(err.is_fatal());
        assert_eq!(binding.platform.current(), 7);
    }

    #[test]
    fn test_body_error_passes_through() {
        let binding = OpenGlBinding::new(FakeGl::new(), GlContext::new(1));
        let err = binding
            .run(|| -> RuntimeResult<()> { Err(RuntimeError::SessionLost) })
            .unwrap_err();
        assert!(matches!(err, RuntimeError::SessionLost));
        assert_eq!(binding.platform.current(), 7);
    }

    #[test]
    fn test_invalid_context_is_noop() {
        let binding = OpenGlBinding::new(FakeGl::new(), GlContext::invalid());
        let seen = binding.run(|| Ok(binding.platform.current())).unwrap();
        assert_eq!(seen, 7);
        assert!(!binding.context().is_valid());
    }

    #[test]
    fn test_image_size() {
        assert_eq!(image_size(GlFormat::RGBA8, 4, 2), Some(32));
        assert_eq!(image_size(GlFormat::RGBA16F, 4, 2), Some(64));
        assert_eq!(image_size(GlFormat::DEPTH_COMPONENT16, 10, 10), Some(200));
        assert_eq!(image_size(GlFormat(0x1234), 4, 2), None);
    }
}
