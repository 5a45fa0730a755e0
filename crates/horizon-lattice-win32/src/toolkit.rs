//! The toolkit-side window model.
//!
//! A [`ToolkitWindow`] carries what the application asked for: type, hints,
//! geometry, state, title and so on. The platform layer reads these
//! attributes when it creates and reconfigures native windows, and writes
//! back through [`WindowSystemEvent`]s once the native side has changed.

use std::cell::{Cell, Ref, RefCell};
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::geometry::{Margins, Rect, Size, WINDOW_SIZE_MAX};
use crate::host::{NativeHandle, ScreenId};
use crate::icon::WindowIcon;
use crate::state::WindowState;
use crate::window_type::{WindowFlags, WindowType};

/// Unique identifier of a toolkit window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ToolkitWindowId(u64);

impl ToolkitWindowId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// How a window's contents are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SurfaceKind {
    /// Software rendering into a backing store.
    #[default]
    Raster,
    /// An OpenGL surface.
    OpenGl,
    /// Software rendering composed through OpenGL.
    RasterGl,
}

/// Requested window attributes.
#[derive(Debug, Clone)]
pub struct WindowAttributes {
    pub title: String,
    /// Name used as a fallback title for titled child windows.
    pub object_name: String,
    pub flags: WindowFlags,
    /// Client-area geometry. Top-levels use screen coordinates, children use
    /// their parent's client coordinates.
    pub geometry: Rect,
    /// No explicit position was requested; top-levels get centered.
    pub position_automatic: bool,
    pub minimum_size: Size,
    pub maximum_size: Size,
    pub state: WindowState,
    pub visible: bool,
    pub exposed: bool,
    pub opacity: f64,
    /// The surface format carries an alpha channel.
    pub has_alpha: bool,
    pub surface_kind: SurfaceKind,
    /// A raster-over-GL window is currently composited through GL.
    pub compositing: bool,
    pub icon: Option<WindowIcon>,
    pub device_pixel_ratio: f64,
    /// The requested position refers to the frame rather than the client area.
    pub position_includes_frame: bool,
    pub show_without_activating: bool,
    /// Native parent of a window embedded into a foreign window.
    pub embedded_native_parent: Option<NativeHandle>,
    /// Extra non-client margins drawn by the application.
    pub custom_margins: Margins,
    pub screen: Option<ScreenId>,
    /// Height required for a given width, for windows whose layout needs it.
    pub height_for_width: Option<fn(i32) -> i32>,
}

impl Default for WindowAttributes {
    fn default() -> Self {
        Self {
            title: String::new(),
            object_name: String::new(),
            flags: WindowFlags::new(WindowType::Window),
            geometry: Rect::default(),
            position_automatic: true,
            minimum_size: Size::default(),
            maximum_size: Size::new(WINDOW_SIZE_MAX, WINDOW_SIZE_MAX),
            state: WindowState::Normal,
            visible: false,
            exposed: false,
            opacity: 1.0,
            has_alpha: false,
            surface_kind: SurfaceKind::Raster,
            compositing: false,
            icon: None,
            device_pixel_ratio: 1.0,
            position_includes_frame: false,
            show_without_activating: false,
            embedded_native_parent: None,
            custom_margins: Margins::default(),
            screen: None,
            height_for_width: None,
        }
    }
}

impl WindowAttributes {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_object_name(mut self, name: impl Into<String>) -> Self {
        self.object_name = name.into();
        self
    }

    pub fn with_flags(mut self, flags: impl Into<WindowFlags>) -> Self {
        self.flags = flags.into();
        self
    }

    /// Requests an explicit geometry, which disables automatic placement.
    pub fn with_geometry(mut self, geometry: Rect) -> Self {
        self.geometry = geometry;
        self.position_automatic = false;
        self
    }

    /// Requests a size and leaves placement to the platform.
    pub fn with_size(mut self, size: Size) -> Self {
        self.geometry = self.geometry.with_size(size);
        self
    }

    pub fn with_minimum_size(mut self, size: Size) -> Self {
        self.minimum_size = size;
        self
    }

    pub fn with_maximum_size(mut self, size: Size) -> Self {
        self.maximum_size = size;
        self
    }

    pub fn with_state(mut self, state: WindowState) -> Self {
        self.state = state;
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_alpha(mut self, has_alpha: bool) -> Self {
        self.has_alpha = has_alpha;
        self
    }

    pub fn with_surface_kind(mut self, kind: SurfaceKind) -> Self {
        self.surface_kind = kind;
        self
    }

    pub fn with_compositing(mut self, compositing: bool) -> Self {
        self.compositing = compositing;
        self
    }

    pub fn with_icon(mut self, icon: WindowIcon) -> Self {
        self.icon = Some(icon);
        self
    }

    pub fn with_device_pixel_ratio(mut self, ratio: f64) -> Self {
        self.device_pixel_ratio = ratio;
        self
    }

    pub fn with_position_includes_frame(mut self, includes: bool) -> Self {
        self.position_includes_frame = includes;
        self
    }

    pub fn with_show_without_activating(mut self, enabled: bool) -> Self {
        self.show_without_activating = enabled;
        self
    }

    pub fn with_embedded_native_parent(mut self, parent: NativeHandle) -> Self {
        self.embedded_native_parent = Some(parent);
        self
    }

    pub fn with_custom_margins(mut self, margins: Margins) -> Self {
        self.custom_margins = margins;
        self
    }

    pub fn with_height_for_width(mut self, f: fn(i32) -> i32) -> Self {
        self.height_for_width = Some(f);
        self
    }
}

/// Notification from the platform layer to the toolkit.
#[derive(Debug, Clone, PartialEq)]
pub enum WindowSystemEvent {
    /// The client geometry changed.
    GeometryChanged {
        window: ToolkitWindowId,
        geometry: Rect,
    },
    /// Part of the window needs repainting. `None` means the window is no
    /// longer exposed.
    Expose {
        window: ToolkitWindowId,
        region: Option<Rect>,
    },
    StateChanged {
        window: ToolkitWindowId,
        state: WindowState,
    },
    ScreenChanged {
        window: ToolkitWindowId,
        screen: ScreenId,
    },
}

impl WindowSystemEvent {
    pub fn window(&self) -> ToolkitWindowId {
        match self {
            WindowSystemEvent::GeometryChanged { window, .. }
            | WindowSystemEvent::Expose { window, .. }
            | WindowSystemEvent::StateChanged { window, .. }
            | WindowSystemEvent::ScreenChanged { window, .. } => *window,
        }
    }
}

/// Tears down the native window of a toolkit window that is dropped while
/// still realized.
pub trait NativeWindowReleaser {
    fn release_native_window(&self, handle: NativeHandle);
}

/// A toolkit window.
///
/// Dropping the last reference to a realized window destroys its native
/// window through the releaser installed when it was realized.
#[derive(Debug)]
pub struct ToolkitWindow {
    id: ToolkitWindowId,
    attributes: RefCell<WindowAttributes>,
    parent: RefCell<Weak<ToolkitWindow>>,
    transient_parent: RefCell<Weak<ToolkitWindow>>,
    native_handle: Cell<Option<NativeHandle>>,
    releaser: RefCell<Option<Weak<dyn NativeWindowReleaser>>>,
}

impl ToolkitWindow {
    /// Creates an unrealized window.
    pub fn new(attributes: WindowAttributes) -> Rc<Self> {
        Rc::new(Self {
            id: ToolkitWindowId::next(),
            attributes: RefCell::new(attributes),
            parent: RefCell::new(Weak::new()),
            transient_parent: RefCell::new(Weak::new()),
            native_handle: Cell::new(None),
            releaser: RefCell::new(None),
        })
    }

    /// Creates a child window of `parent`.
    pub fn new_child(parent: &Rc<ToolkitWindow>, attributes: WindowAttributes) -> Rc<Self> {
        let window = Self::new(attributes);
        window.set_parent(Some(parent));
        window
    }

    /// Identifier unique within the process.
    pub fn id(&self) -> ToolkitWindowId {
        self.id
    }

    /// Borrows the current attributes.
    pub fn attributes(&self) -> Ref<'_, WindowAttributes> {
        self.attributes.borrow()
    }

    /// Mutates the attributes. The borrow ends before this returns.
    pub fn update<R>(&self, f: impl FnOnce(&mut WindowAttributes) -> R) -> R {
        f(&mut self.attributes.borrow_mut())
    }

    /// The toolkit parent, unless it has been dropped.
    pub fn parent(&self) -> Option<Rc<ToolkitWindow>> {
        self.parent.borrow().upgrade()
    }

    /// Sets the toolkit parent. The link is weak.
    pub fn set_parent(&self, parent: Option<&Rc<ToolkitWindow>>) {
        *self.parent.borrow_mut() = parent.map(Rc::downgrade).unwrap_or_default();
    }

    /// The window this one is transient for, such as a dialog owner.
    pub fn transient_parent(&self) -> Option<Rc<ToolkitWindow>> {
        self.transient_parent.borrow().upgrade()
    }

    /// Sets the transient parent. The link is weak.
    pub fn set_transient_parent(&self, parent: Option<&Rc<ToolkitWindow>>) {
        *self.transient_parent.borrow_mut() = parent.map(Rc::downgrade).unwrap_or_default();
    }

    /// A window without a toolkit parent.
    pub fn is_top_level(&self) -> bool {
        self.parent().is_none()
    }

    /// Whether `self` is an ancestor of `child` through toolkit parents.
    pub fn is_ancestor_of(&self, child: &ToolkitWindow) -> bool {
        let mut current = child.parent();
        while let Some(window) = current {
            if window.id == self.id {
                return true;
            }
            current = window.parent();
        }
        false
    }

    /// Handle of the native window realizing this window.
    pub fn native_handle(&self) -> Option<NativeHandle> {
        self.native_handle.get()
    }

    pub(crate) fn set_native_handle(&self, handle: Option<NativeHandle>) {
        self.native_handle.set(handle);
    }

    pub(crate) fn set_releaser(&self, releaser: Weak<dyn NativeWindowReleaser>) {
        *self.releaser.borrow_mut() = Some(releaser);
    }

    pub fn flags(&self) -> WindowFlags {
        self.attributes.borrow().flags
    }

    pub fn window_type(&self) -> WindowType {
        self.flags().window_type()
    }

    pub fn geometry(&self) -> Rect {
        self.attributes.borrow().geometry
    }

    pub fn minimum_size(&self) -> Size {
        self.attributes.borrow().minimum_size
    }

    pub fn maximum_size(&self) -> Size {
        self.attributes.borrow().maximum_size
    }

    /// The requested or last reported show state.
    pub fn state(&self) -> WindowState {
        self.attributes.borrow().state
    }

    pub fn is_visible(&self) -> bool {
        self.attributes.borrow().visible
    }

    pub fn is_exposed(&self) -> bool {
        self.attributes.borrow().exposed
    }

    pub fn opacity(&self) -> f64 {
        self.attributes.borrow().opacity
    }

    pub fn has_alpha(&self) -> bool {
        self.attributes.borrow().has_alpha
    }

    pub fn surface_kind(&self) -> SurfaceKind {
        self.attributes.borrow().surface_kind
    }

    /// Whether the window renders through OpenGL.
    pub fn is_opengl(&self) -> bool {
        let attributes = self.attributes.borrow();
        match attributes.surface_kind {
            SurfaceKind::OpenGl => true,
            SurfaceKind::RasterGl => attributes.compositing,
            SurfaceKind::Raster => false,
        }
    }

    pub fn title(&self) -> String {
        self.attributes.borrow().title.clone()
    }

    pub fn device_pixel_ratio(&self) -> f64 {
        self.attributes.borrow().device_pixel_ratio
    }

    /// Screen the window was last reported on.
    pub fn screen(&self) -> Option<ScreenId> {
        self.attributes.borrow().screen
    }

    /// Applies a platform notification to the stored attributes.
    pub fn apply_event(&self, event: &WindowSystemEvent) {
        let mut attributes = self.attributes.borrow_mut();
        match event {
            WindowSystemEvent::GeometryChanged { geometry, .. } => attributes.geometry = *geometry,
            WindowSystemEvent::Expose { region, .. } => attributes.exposed = region.is_some(),
            WindowSystemEvent::StateChanged { state, .. } => attributes.state = *state,
            WindowSystemEvent::ScreenChanged { screen, .. } => attributes.screen = Some(*screen),
        }
    }
}

impl Drop for ToolkitWindow {
    fn drop(&mut self) {
        let Some(handle) = self.native_handle.take() else {
            return;
        };
        let releaser = self.releaser.get_mut().take().and_then(|r| r.upgrade());
        if let Some(releaser) = releaser {
            releaser.release_native_window(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let a = ToolkitWindow::new(WindowAttributes::default());
        let b = ToolkitWindow::new(WindowAttributes::default());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn parent_links_are_weak() {
        let parent = ToolkitWindow::new(WindowAttributes::default());
        let child = ToolkitWindow::new_child(&parent, WindowAttributes::default());
        assert!(!child.is_top_level());
        assert!(parent.is_ancestor_of(&child));
        drop(parent);
        assert!(child.is_top_level());
    }

    #[test]
    fn events_update_attributes() {
        let window = ToolkitWindow::new(WindowAttributes::default());
        window.apply_event(&WindowSystemEvent::StateChanged {
            window: window.id(),
            state: WindowState::Maximized,
        });
        window.apply_event(&WindowSystemEvent::Expose {
            window: window.id(),
            region: Some(Rect::new(0, 0, 10, 10)),
        });
        assert_eq!(window.state(), WindowState::Maximized);
        assert!(window.is_exposed());
    }
}
