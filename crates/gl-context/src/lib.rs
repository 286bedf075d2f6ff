//! Scoped OpenGL context switching.
//!
//! OpenGL contexts are current-per-thread. The runtime owns a private context
//! that shares resources with the application's, and every call into it must
//! run with that context current and then hand the application's context
//! back. `GlContextSwitch` does this on every exit path, including unwinding,
//! and reports any GL error the private context left behind.

#[cfg(windows)]
mod wgl;

#[cfg(windows)]
pub use wgl::{Wgl, WglHandles};

use std::fmt::Debug;
use tracing::{debug, error};

pub const GL_NO_ERROR: u32 = 0;

// ============================================================================
// Platform
// ============================================================================

/// The window-system half of OpenGL: which context is current, and its error
/// queue.
pub trait GlPlatform {
    type Handles: Copy + Debug;

    fn current(&self) -> Self::Handles;

    /// Returns false when the driver refused the switch.
    fn make_current(&self, handles: Self::Handles) -> bool;

    fn get_error(&self) -> u32;
}

/// A context the runtime may switch to. Invalid contexts make every switch a
/// no-op, which is how non-OpenGL sessions share the same code paths.
#[derive(Debug, Clone, Copy)]
pub struct GlContext<H> {
    handles: Option<H>,
}

impl<H: Copy> GlContext<H> {
    pub fn new(handles: H) -> Self {
        Self {
            handles: Some(handles),
        }
    }

    pub fn invalid() -> Self {
        Self { handles: None }
    }

    pub fn is_valid(&self) -> bool {
        self.handles.is_some()
    }

    pub fn handles(&self) -> Option<H> {
        self.handles
    }
}

impl<H: Copy> Default for GlContext<H> {
    fn default() -> Self {
        Self::invalid()
    }
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlContextError {
    #[error("OpenGL error: 0x{code:x}")]
    Leaked { code: u32 },
}

// ============================================================================
// Guard
// ============================================================================

/// RAII guard keeping the runtime context current for its lifetime.
///
/// Prefer [`GlContextSwitch::finish`] (or [`run_in_context`]) so a leaked GL
/// error comes back as a `Result`. When the guard is simply dropped, the
/// previous context is still restored; a leaked error is then logged if the
/// thread is already panicking, and panics otherwise.
pub struct GlContextSwitch<'a, P: GlPlatform> {
    platform: &'a P,
    previous: Option<P::Handles>,
}

impl<'a, P: GlPlatform> GlContextSwitch<'a, P> {
    pub fn new(platform: &'a P, context: &GlContext<P::Handles>) -> Self {
        let previous = context.handles.map(|handles| {
            let previous = platform.current();
            if !platform.make_current(handles) {
                error!("Failed to make runtime context current: {:?}", handles);
            }

            // Reset error codes.
            let mut drained = 0;
            while platform.get_error() != GL_NO_ERROR {
                drained += 1;
            }
            if drained > 0 {
                debug!("Discarded {} stale OpenGL error(s)", drained);
            }

            previous
        });

        Self { platform, previous }
    }

    pub fn is_active(&self) -> bool {
        self.previous.is_some()
    }

    /// Restore the previous context, then report what the runtime context
    /// left in its error queue.
    pub fn finish(mut self) -> Result<(), GlContextError> {
        match self.restore() {
            Some(code) => Err(GlContextError::Leaked { code }),
            None => Ok(()),
        }
    }

    // The error must be read before switching away from the runtime context.
    fn restore(&mut self) -> Option<u32> {
        let previous = self.previous.take()?;
        let error = self.platform.get_error();

        if !self.platform.make_current(previous) {
            error!("Failed to restore application context: {:?}", previous);
        }

        (error != GL_NO_ERROR).then_some(error)
    }
}

impl<'a, P: GlPlatform> Drop for GlContextSwitch<'a, P> {
    fn drop(&mut self) {
        if let Some(code) = self.restore() {
            let err = GlContextError::Leaked { code };
            if std::thread::panicking() {
                error!("{} (while unwinding)", err);
            } else {
                panic!("{}", err);
            }
        }
    }
}

/// Run `body` with `context` current.
///
/// The previous context is restored before any error is reported. A leaked GL
/// error takes precedence over the body's own error.
pub fn run_in_context<P, R, E>(
    platform: &P,
    context: &GlContext<P::Handles>,
    body: impl FnOnce() -> Result<R, E>,
) -> Result<R, E>
where
    P: GlPlatform,
    E: From<GlContextError> + Debug,
{
    let switch = GlContextSwitch::new(platform, context);
    let result = body();

    match (switch.finish(), result) {
        (Ok(()), result) => result,
        (Err(gl), Ok(_)) => Err(gl.into()),
        (Err(gl), Err(body_err)) => {
            error!("{} also failed the guarded call: {:?}", gl, body_err);
            Err(gl.into())
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Event {
        MakeCurrent(u32),
        GetError(u32),
    }

    /// Fake platform: contexts are numbers, each context has its own error queue.
    struct FakeGl {
        current: RefCell<u32>,
        errors: RefCell<Vec<(u32, VecDeque<u32>)>>,
        events: RefCell<Vec<Event>>,
    }

    impl FakeGl {
        fn new(current: u32) -> Self {
            Self {
                current: RefCell::new(current),
                errors: RefCell::new(Vec::new()),
                events: RefCell::new(Vec::new()),
            }
        }

        fn push_error(&self, context: u32, code: u32) {
            let mut errors = self.errors.borrow_mut();
            match errors.iter_mut().find(|(c, _)| *c == context) {
                Some((_, queue)) => queue.push_back(code),
                None => errors.push((context, VecDeque::from([code]))),
            }
        }

        fn events(&self) -> Vec<Event> {
            self.events.borrow().clone()
        }
    }

    impl GlPlatform for FakeGl {
        type Handles = u32;

        fn current(&self) -> u32 {
            *self.current.borrow()
        }

        fn make_current(&self, handles: u32) -> bool {
            self.events.borrow_mut().push(Event::MakeCurrent(handles));
            *self.current.borrow_mut() = handles;
            true
        }

        fn get_error(&self) -> u32 {
            let current = *self.current.borrow();
            let code = self
                .errors
                .borrow_mut()
                .iter_mut()
                .find(|(c, _)| *c == current)
                .and_then(|(_, queue)| queue.pop_front())
                .unwrap_or(GL_NO_ERROR);
            self.events.borrow_mut().push(Event::GetError(code));
            code
        }
    }

    const APP: u32 = 1;
    const RUNTIME: u32 = 2;
    const GL_INVALID_OPERATION: u32 = 0x0502;

    #[test]
    fn test_invalid_context_is_noop() {
        let gl = FakeGl::new(APP);
        let switch = GlContextSwitch::new(&gl, &GlContext::invalid());
        assert!(!switch.is_active());
        assert!(switch.finish().is_ok());
        assert!(gl.events().is_empty());
        assert_eq!(gl.current(), APP);
    }

    #[test]
    fn test_switch_and_restore() {
        let gl = FakeGl::new(APP);
        {
            let switch = GlContextSwitch::new(&gl, &GlContext::new(RUNTIME));
            assert_eq!(gl.current(), RUNTIME);
            switch.finish().unwrap();
        }
        assert_eq!(gl.current(), APP);
    }

    #[test]
    fn test_stale_errors_are_cleared_on_entry() {
        let gl = FakeGl::new(APP);
        gl.push_error(RUNTIME, GL_INVALID_OPERATION);
        gl.push_error(RUNTIME, GL_INVALID_OPERATION);

        let switch = GlContextSwitch::new(&gl, &GlContext::new(RUNTIME));
        assert!(switch.finish().is_ok());
    }

    #[test]
    fn test_long_error_backlog_is_cleared_on_entry() {
        let gl = FakeGl::new(APP);
        for _ in 0..200 {
            gl.push_error(RUNTIME, GL_INVALID_OPERATION);
        }

        let switch = GlContextSwitch::new(&gl, &GlContext::new(RUNTIME));
        assert!(switch.finish().is_ok());
        assert_eq!(gl.current(), APP);
    }

    #[test]
    fn test_leaked_error_reported_after_restore() {
        let gl = FakeGl::new(APP);
        let switch = GlContextSwitch::new(&gl, &GlContext::new(RUNTIME));
        gl.push_error(RUNTIME, GL_INVALID_OPERATION);

        let err = switch.finish().unwrap_err();
        assert_eq!(err, GlContextError::Leaked { code: GL_INVALID_OPERATION });
        assert_eq!(gl.current(), APP);

        // The error was read from the runtime context, before switching back.
        let events = gl.events();
        let read = events
            .iter()
            .position(|e| *e == Event::GetError(GL_INVALID_OPERATION))
            .unwrap();
        let restore = events.iter().rposition(|e| *e == Event::MakeCurrent(APP)).unwrap();
        assert!(read < restore);
    }

    #[test]
    fn test_run_in_context_restores_on_body_error() {
        #[derive(Debug, PartialEq)]
        enum BodyError {
            Body,
            Gl(GlContextError),
        }
        impl From<GlContextError> for BodyError {
            fn from(err: GlContextError) -> Self {
                BodyError::Gl(err)
            }
        }

        let gl = FakeGl::new(APP);
        let result: Result<(), BodyError> =
            run_in_context(&gl, &GlContext::new(RUNTIME), || Err(BodyError::Body));
        assert_eq!(result, Err(BodyError::Body));
        assert_eq!(gl.current(), APP);

        let result: Result<(), BodyError> = run_in_context(&gl, &GlContext::new(RUNTIME), || {
            gl.push_error(RUNTIME, GL_INVALID_OPERATION);
            Err(BodyError::Body)
        });
        assert_eq!(
            result,
            Err(BodyError::Gl(GlContextError::Leaked { code: GL_INVALID_OPERATION }))
        );
        assert_eq!(gl.current(), APP);
    }

    #[test]
    fn test_restores_while_unwinding() {
        let gl = FakeGl::new(APP);
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _switch = GlContextSwitch::new(&gl, &GlContext::new(RUNTIME));
            gl.push_error(RUNTIME, GL_INVALID_OPERATION);
            panic!("body failed");
        }));
        assert!(outcome.is_err());
        assert_eq!(gl.current(), APP);
    }

    #[test]
    #[should_panic(expected = "OpenGL error: 0x502")]
    fn test_dropped_guard_with_leaked_error_panics() {
        let gl = FakeGl::new(APP);
        let _switch = GlContextSwitch::new(&gl, &GlContext::new(RUNTIME));
        gl.push_error(RUNTIME, GL_INVALID_OPERATION);
    }
}
