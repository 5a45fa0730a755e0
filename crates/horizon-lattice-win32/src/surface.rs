//! Hooks for rendering collaborators.
//!
//! Rendering code creates its native surfaces through a [`SurfaceFactory`]
//! installed on the platform integration. The platform window creates the
//! surface lazily on first request and releases it when invalidated or
//! destroyed.

use crate::error::PlatformResult;
use crate::host::NativeHandle;
use crate::toolkit::SurfaceKind;

/// Opaque handle to a rendering surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceHandle(pub u64);

/// Creates and destroys native rendering surfaces for windows.
pub trait SurfaceFactory {
    fn create_window_surface(
        &self,
        window: NativeHandle,
        kind: SurfaceKind,
    ) -> PlatformResult<SurfaceHandle>;

    fn destroy_window_surface(&self, surface: SurfaceHandle);
}
