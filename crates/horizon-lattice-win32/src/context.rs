//! Platform context and integration entry point.
//!
//! [`PlatformContext`] is the process-wide registry of native windows. It
//! maps handles to the windows that own them, publishes the creation
//! context while a native create call is in flight, tracks the window under
//! the mouse and the keyboard grabber, and queues [`WindowSystemEvent`]s for
//! the toolkit. It is also the [`NativeEventSink`] the host delivers
//! messages to.
//!
//! [`PlatformIntegration`] owns the context and is what applications create.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//!
//! use horizon_lattice_win32::{
//!     HeadlessHost, PlatformIntegration, PlatformOptions, Rect, ToolkitWindow, WindowAttributes,
//! };
//!
//! let host = Rc::new(HeadlessHost::new());
//! let integration = PlatformIntegration::new(host, PlatformOptions::default());
//! let window = ToolkitWindow::new(
//!     WindowAttributes::default()
//!         .with_title("Editor")
//!         .with_geometry(Rect::new(100, 100, 640, 480)),
//! );
//! let platform_window = integration.create_platform_window(&window).unwrap();
//! platform_window.set_visible(integration.context(), true);
//! assert_eq!(platform_window.geometry(), Rect::new(100, 100, 640, 480));
//! ```

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::{Rc, Weak};

use tracing::{debug, info, trace, warn};

use crate::base_window::{BaseWindow, ForeignWindow, native_frame_geometry};
use crate::config::PlatformOptions;
use crate::creation::{
    CreationMode, MaterializeTarget, Materialized, WindowCreationContext, WindowCreationSpec,
    WindowData,
};
use crate::geometry::Rect;
use crate::geometry_hint::GeometryHint;
use crate::host::{NativeEventSink, NativeHandle, NativeHost, NativeMessage, ScreenInfo};
use crate::logging::targets;
use crate::surface::SurfaceFactory;
use crate::toolkit::{NativeWindowReleaser, ToolkitWindow, WindowSystemEvent};
use crate::window::{PlatformWindow, handle_geometry_changing_message};

/// A native window known to the platform layer.
#[derive(Debug, Clone)]
pub enum RegisteredWindow {
    /// Created and owned by the toolkit.
    Owned(Rc<PlatformWindow>),
    /// Wraps a handle created elsewhere.
    Foreign(Rc<ForeignWindow>),
}

impl RegisteredWindow {
    /// The window behind the common window operations.
    pub fn as_base(&self) -> &dyn BaseWindow {
        match self {
            RegisteredWindow::Owned(window) => window.as_ref(),
            RegisteredWindow::Foreign(window) => window.as_ref(),
        }
    }

    /// The platform window, unless this is a foreign window.
    pub fn as_platform_window(&self) -> Option<&Rc<PlatformWindow>> {
        match self {
            RegisteredWindow::Owned(window) => Some(window),
            RegisteredWindow::Foreign(_) => None,
        }
    }
}

/// Keeps a creation context published. Dropping it clears the slot.
pub struct CreationScope<'ctx> {
    ctx: &'ctx PlatformContext,
}

impl Drop for CreationScope<'_> {
    fn drop(&mut self) {
        if self.ctx.creation_context.borrow_mut().take().is_some() {
            trace!(target: targets::CREATION, "creation context cleared");
        }
    }
}

/// Registry and shared state of the platform layer.
pub struct PlatformContext {
    host: Rc<dyn NativeHost>,
    options: PlatformOptions,
    windows: RefCell<HashMap<NativeHandle, RegisteredWindow>>,
    creation_context: RefCell<Option<Rc<RefCell<WindowCreationContext>>>>,
    window_under_mouse: RefCell<Weak<ToolkitWindow>>,
    key_grabber: RefCell<Weak<ToolkitWindow>>,
    events: RefCell<VecDeque<WindowSystemEvent>>,
    surface_factory: RefCell<Option<Rc<dyn SurfaceFactory>>>,
}

impl PlatformContext {
    /// Creates an empty registry for `host`.
    pub fn new(host: Rc<dyn NativeHost>, options: PlatformOptions) -> Self {
        Self {
            host,
            options,
            windows: RefCell::new(HashMap::new()),
            creation_context: RefCell::new(None),
            window_under_mouse: RefCell::new(Weak::new()),
            key_grabber: RefCell::new(Weak::new()),
            events: RefCell::new(VecDeque::new()),
            surface_factory: RefCell::new(None),
        }
    }

    /// The host every native call goes through.
    pub fn host(&self) -> &dyn NativeHost {
        &*self.host
    }

    /// Options the integration was created with.
    pub fn options(&self) -> &PlatformOptions {
        &self.options
    }

    // ========================================================================
    // Creation context
    // ========================================================================

    /// Publishes `context` until the returned scope is dropped.
    pub fn begin_creation(&self, context: Rc<RefCell<WindowCreationContext>>) -> CreationScope<'_> {
        if self.creation_context.replace(Some(context)).is_some() {
            warn!(target: targets::CREATION, "nested window creation, replacing creation context");
        }
        CreationScope { ctx: self }
    }

    /// The creation context of the create call in flight, if any.
    pub fn creation_context(&self) -> Option<Rc<RefCell<WindowCreationContext>>> {
        self.creation_context.borrow().clone()
    }

    // ========================================================================
    // Registry
    // ========================================================================

    /// Maps `handle` to the window that owns it.
    pub fn register(&self, handle: NativeHandle, window: RegisteredWindow) {
        trace!(target: targets::WINDOWS, handle = handle.as_raw(), "register");
        self.windows.borrow_mut().insert(handle, window);
    }

    /// Forgets `handle`, returning its window.
    pub fn unregister(&self, handle: NativeHandle) -> Option<RegisteredWindow> {
        trace!(target: targets::WINDOWS, handle = handle.as_raw(), "unregister");
        self.windows.borrow_mut().remove(&handle)
    }

    /// The window registered for `handle`.
    pub fn find(&self, handle: NativeHandle) -> Option<RegisteredWindow> {
        self.windows.borrow().get(&handle).cloned()
    }

    /// The owned platform window registered for `handle`.
    pub fn platform_window(&self, handle: NativeHandle) -> Option<Rc<PlatformWindow>> {
        match self.find(handle)? {
            RegisteredWindow::Owned(window) => Some(window),
            RegisteredWindow::Foreign(_) => None,
        }
    }

    /// The platform window realizing `window`.
    pub fn platform_window_of(&self, window: &ToolkitWindow) -> Option<Rc<PlatformWindow>> {
        self.platform_window(window.native_handle()?)
    }

    /// Whether `handle` belongs to a wrapped foreign window.
    pub fn is_foreign_window(&self, handle: NativeHandle) -> bool {
        matches!(self.find(handle), Some(RegisteredWindow::Foreign(_)))
    }

    /// Snapshot of the owned windows. The registry is not borrowed while the
    /// caller works through it.
    pub fn owned_windows(&self) -> Vec<Rc<PlatformWindow>> {
        self.windows
            .borrow()
            .values()
            .filter_map(|w| w.as_platform_window().cloned())
            .collect()
    }

    /// Number of registered windows, foreign ones included.
    pub fn window_count(&self) -> usize {
        self.windows.borrow().len()
    }

    // ========================================================================
    // Screens
    // ========================================================================

    /// Screens as currently reported by the host.
    pub fn screens(&self) -> Vec<ScreenInfo> {
        self.host.screens()
    }

    /// The primary screen, or the first one when none is marked primary.
    pub fn primary_screen(&self) -> Option<ScreenInfo> {
        let screens = self.screens();
        screens
            .iter()
            .find(|s| s.is_primary)
            .or_else(|| screens.first())
            .cloned()
    }

    /// The screen containing the center of `rect`.
    pub fn screen_for_geometry(&self, rect: Rect) -> Option<ScreenInfo> {
        let center = rect.center();
        self.screens().into_iter().find(|s| s.geometry.contains(center))
    }

    /// The screen a window is on: its recorded screen, else the one under
    /// its center, else the primary screen.
    pub fn screen_for_window(&self, window: &ToolkitWindow) -> Option<ScreenInfo> {
        if let Some(id) = window.screen() {
            if let Some(screen) = self.screens().into_iter().find(|s| s.id == id) {
                return Some(screen);
            }
        }
        self.screen_for_geometry(window.geometry())
            .or_else(|| self.primary_screen())
    }

    // ========================================================================
    // Input tracking
    // ========================================================================

    /// The window the mouse last entered.
    pub fn window_under_mouse(&self) -> Option<Rc<ToolkitWindow>> {
        self.window_under_mouse.borrow().upgrade()
    }

    /// Records the window under the mouse.
    pub fn set_window_under_mouse(&self, window: Option<&Rc<ToolkitWindow>>) {
        *self.window_under_mouse.borrow_mut() = window.map(Rc::downgrade).unwrap_or_default();
    }

    /// The window holding the keyboard grab.
    pub fn key_grabber(&self) -> Option<Rc<ToolkitWindow>> {
        self.key_grabber.borrow().upgrade()
    }

    /// Records the keyboard grabber.
    pub fn set_key_grabber(&self, window: Option<&Rc<ToolkitWindow>>) {
        *self.key_grabber.borrow_mut() = window.map(Rc::downgrade).unwrap_or_default();
    }

    // ========================================================================
    // Events and collaborators
    // ========================================================================

    /// Applies `event` to `window` and queues it for the toolkit.
    pub fn post_event(&self, window: &ToolkitWindow, event: WindowSystemEvent) {
        trace!(target: targets::EVENTS, ?event, "post");
        window.apply_event(&event);
        self.events.borrow_mut().push_back(event);
    }

    /// Drains the queued toolkit events.
    pub fn take_events(&self) -> Vec<WindowSystemEvent> {
        self.events.borrow_mut().drain(..).collect()
    }

    /// The factory used to create rendering surfaces.
    pub fn surface_factory(&self) -> Option<Rc<dyn SurfaceFactory>> {
        self.surface_factory.borrow().clone()
    }

    /// Installs the factory used to create rendering surfaces.
    pub fn set_surface_factory(&self, factory: Option<Rc<dyn SurfaceFactory>>) {
        *self.surface_factory.borrow_mut() = factory;
    }

    /// Answers messages for a window whose create call has not returned yet.
    fn dispatch_creating(&self, handle: NativeHandle, message: NativeMessage<'_>) -> bool {
        let Some(context) = self.creation_context() else {
            trace!(
                target: targets::EVENTS,
                handle = handle.as_raw(),
                message = message.name(),
                "message for unknown window"
            );
            return false;
        };
        let snapshot = context.borrow().clone();
        match message {
            NativeMessage::GetMinMaxInfo(info) => {
                snapshot.apply_to_size_constraints(self.host(), info);
                true
            }
            NativeMessage::NcCalcSize { client } => {
                GeometryHint::handle_calculate_size(snapshot.custom_margins, client)
            }
            NativeMessage::Moved | NativeMessage::Resized(_) => {
                let top_level = self.host.parent(handle).is_none();
                let frame = native_frame_geometry(self.host(), handle, top_level);
                context.borrow_mut().update_obtained_geometry(frame);
                true
            }
            NativeMessage::WindowPosChanging(pos) => snapshot.window.upgrade().is_some_and(|window| {
                handle_geometry_changing_message(
                    pos,
                    &window,
                    snapshot.margins + snapshot.custom_margins,
                )
            }),
            _ => false,
        }
    }
}

impl NativeEventSink for PlatformContext {
    fn dispatch(&self, handle: NativeHandle, message: NativeMessage<'_>) -> bool {
        match self.find(handle) {
            Some(RegisteredWindow::Owned(window)) => window.handle_message(self, message),
            Some(RegisteredWindow::Foreign(_)) => false,
            None => self.dispatch_creating(handle, message),
        }
    }
}

impl NativeWindowReleaser for PlatformContext {
    fn release_native_window(&self, handle: NativeHandle) {
        match self.find(handle) {
            Some(RegisteredWindow::Owned(window)) => {
                debug!(target: targets::WINDOWS, handle = handle.as_raw(), "toolkit window dropped");
                window.destroy(self);
            }
            Some(RegisteredWindow::Foreign(_)) => {
                self.unregister(handle);
            }
            None => {}
        }
    }
}

/// Entry point of the platform layer.
///
/// Owns the [`PlatformContext`] and installs it as the host's event sink.
/// Dropping the integration destroys every window it still owns.
pub struct PlatformIntegration {
    context: Rc<PlatformContext>,
}

impl PlatformIntegration {
    /// Creates the context and installs it as the event sink of `host`.
    pub fn new(host: Rc<dyn NativeHost>, options: PlatformOptions) -> Self {
        let context = Rc::new(PlatformContext::new(Rc::clone(&host), options));
        let weak = Rc::downgrade(&context);
        let sink: Weak<dyn NativeEventSink> = weak;
        host.set_event_sink(sink);
        info!(
            target: targets::WINDOWS,
            screens = context.screens().len(),
            class = %context.options().window_class_name,
            "platform integration initialized"
        );
        Self { context }
    }

    /// The shared platform context.
    pub fn context(&self) -> &PlatformContext {
        &self.context
    }

    /// The native host.
    pub fn host(&self) -> &dyn NativeHost {
        self.context.host()
    }

    /// Creates the native window for `window`.
    ///
    /// Returns `None`, leaving the window unrealized, when the system
    /// refuses to create it.
    pub fn create_platform_window(&self, window: &Rc<ToolkitWindow>) -> Option<Rc<PlatformWindow>> {
        let ctx = self.context();
        let (flags, geometry, custom_margins, title) = {
            let attributes = window.attributes();
            (
                attributes.flags,
                attributes.geometry,
                attributes.custom_margins,
                attributes.title.clone(),
            )
        };
        let spec = WindowCreationSpec::derive(window, flags, CreationMode::Default);
        let data = WindowData {
            flags,
            geometry,
            custom_margins,
            ..WindowData::default()
        };
        let platform_window = match spec.materialize(ctx, window, MaterializeTarget::Create { data: &data, title }) {
            Materialized::Created(created) => PlatformWindow::new(ctx, window, created)?,
            Materialized::Reconfigured => return None,
        };
        window.set_releaser(self.releaser());
        Some(platform_window)
    }

    fn releaser(&self) -> Weak<dyn NativeWindowReleaser> {
        let weak = Rc::downgrade(&self.context);
        let releaser: Weak<dyn NativeWindowReleaser> = weak;
        releaser
    }

    /// Wraps a window created outside the toolkit.
    pub fn create_foreign_window(
        &self,
        window: &Rc<ToolkitWindow>,
        handle: NativeHandle,
    ) -> Option<Rc<ForeignWindow>> {
        if !self.host().is_window(handle) {
            warn!(target: targets::WINDOWS, handle = handle.as_raw(), "not a window");
            return None;
        }
        let foreign = Rc::new(ForeignWindow::new(window, handle));
        window.set_native_handle(Some(handle));
        window.set_releaser(self.releaser());
        self.context
            .register(handle, RegisteredWindow::Foreign(Rc::clone(&foreign)));
        debug!(target: targets::WINDOWS, handle = handle.as_raw(), "foreign window wrapped");
        Some(foreign)
    }

    /// Destroys the native window now rather than when the toolkit window
    /// is dropped.
    pub fn destroy_platform_window(&self, window: &PlatformWindow) {
        window.destroy(self.context());
    }

    /// Forgets a foreign window. The native window itself is left alone.
    pub fn release_foreign_window(&self, window: &ForeignWindow) {
        let handle = window.native_handle();
        self.context.unregister(handle);
        if let Some(toolkit_window) = window.toolkit_window() {
            toolkit_window.set_native_handle(None);
        }
    }

    /// Drains the queued toolkit events.
    pub fn take_events(&self) -> Vec<WindowSystemEvent> {
        self.context.take_events()
    }

    /// Installs the factory used to create rendering surfaces.
    pub fn set_surface_factory(&self, factory: Option<Rc<dyn SurfaceFactory>>) {
        self.context.set_surface_factory(factory);
    }

    /// Destroys every owned window and forgets foreign ones.
    pub fn shutdown(&self) {
        let ctx = self.context();
        for window in ctx.owned_windows() {
            if window.handle().is_some() {
                window.destroy(ctx);
            }
        }
        let remaining = ctx.windows.borrow_mut().drain().count();
        ctx.set_window_under_mouse(None);
        ctx.set_key_grabber(None);
        debug!(target: targets::WINDOWS, foreign = remaining, "platform integration shut down");
    }
}

impl Drop for PlatformIntegration {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HeadlessHost, NativeCreateParams};
    use crate::style::{WindowExStyle, WindowStyle};
    use crate::toolkit::WindowAttributes;
    use crate::window_type::WindowType;

    #[test]
    fn failed_creation_leaves_window_unrealized() {
        let host = Rc::new(HeadlessHost::new());
        let integration = PlatformIntegration::new(host.clone(), PlatformOptions::default());
        host.set_fail_create(true);
        let window = ToolkitWindow::new(WindowAttributes::default());
        assert!(integration.create_platform_window(&window).is_none());
        assert!(integration.context().creation_context().is_none());
        assert_eq!(window.native_handle(), None);
        assert_eq!(integration.context().window_count(), 0);
    }

    #[test]
    fn foreign_windows_are_registered_but_not_destroyed() {
        let host = Rc::new(HeadlessHost::new());
        let integration = PlatformIntegration::new(host.clone(), PlatformOptions::default());
        let handle = host
            .create_window(&NativeCreateParams {
                class_name: "ForeignClass".into(),
                title: "Foreign".into(),
                style: WindowStyle::OVERLAPPED_WINDOW,
                ex_style: WindowExStyle::empty(),
                x: None,
                y: None,
                width: None,
                height: None,
                parent: None,
            })
            .unwrap();

        let wrapper = ToolkitWindow::new(WindowAttributes::default().with_flags(WindowType::ForeignWindow));
        let missing = NativeHandle::from_raw(0x9999).unwrap();
        assert!(integration.create_foreign_window(&wrapper, missing).is_none());

        let foreign = integration.create_foreign_window(&wrapper, handle).unwrap();
        assert!(integration.context().is_foreign_window(handle));
        assert_eq!(wrapper.native_handle(), Some(handle));
        // Messages for foreign windows are left to their owner.
        assert!(!host.send(handle, NativeMessage::EraseBackground));

        integration.release_foreign_window(&foreign);
        assert!(!integration.context().is_foreign_window(handle));
        drop(integration);
        assert!(host.is_window(handle));
    }

    #[test]
    fn dropping_toolkit_window_tears_down_native_window() {
        let host = Rc::new(HeadlessHost::new());
        let integration = PlatformIntegration::new(host.clone(), PlatformOptions::default());
        let owner = ToolkitWindow::new(WindowAttributes::default());
        let dialog = ToolkitWindow::new(WindowAttributes::default().with_flags(WindowType::Dialog));
        dialog.set_transient_parent(Some(&owner));
        let owner_pw = integration.create_platform_window(&owner).unwrap();
        let dialog_pw = integration.create_platform_window(&dialog).unwrap();
        let owner_handle = owner_pw.handle().unwrap();
        let dialog_handle = dialog_pw.handle().unwrap();
        assert_eq!(host.owner(dialog_handle), Some(owner_handle));

        drop(owner);
        assert!(!host.is_window(owner_handle));
        assert!(integration.context().find(owner_handle).is_none());
        assert_eq!(owner_pw.handle(), None);
        // The dialog outlives its owner.
        assert!(host.is_window(dialog_handle));
        assert_eq!(host.owner(dialog_handle), None);
        assert_eq!(integration.context().window_count(), 1);
    }

    #[test]
    fn dropping_foreign_wrapper_leaves_native_window() {
        let host = Rc::new(HeadlessHost::new());
        let integration = PlatformIntegration::new(host.clone(), PlatformOptions::default());
        let handle = host
            .create_window(&NativeCreateParams {
                class_name: "ForeignClass".into(),
                title: "Foreign".into(),
                style: WindowStyle::OVERLAPPED_WINDOW,
                ex_style: WindowExStyle::empty(),
                x: None,
                y: None,
                width: None,
                height: None,
                parent: None,
            })
            .unwrap();
        let wrapper = ToolkitWindow::new(WindowAttributes::default().with_flags(WindowType::ForeignWindow));
        integration.create_foreign_window(&wrapper, handle).unwrap();

        drop(wrapper);
        assert!(!integration.context().is_foreign_window(handle));
        assert!(host.is_window(handle));
    }

    #[test]
    fn screen_lookup_falls_back_to_primary() {
        let host = Rc::new(HeadlessHost::new());
        let integration = PlatformIntegration::new(host, PlatformOptions::default());
        let ctx = integration.context();
        assert!(ctx.screen_for_geometry(Rect::new(5000, 5000, 10, 10)).is_none());
        let window = ToolkitWindow::new(WindowAttributes::default().with_geometry(Rect::new(5000, 5000, 10, 10)));
        assert!(ctx.screen_for_window(&window).is_some_and(|s| s.is_primary));
    }

    #[test]
    fn shutdown_destroys_owned_windows() {
        let host = Rc::new(HeadlessHost::new());
        let integration = PlatformIntegration::new(host.clone(), PlatformOptions::default());
        let first = ToolkitWindow::new(WindowAttributes::default());
        let second = ToolkitWindow::new(WindowAttributes::default());
        integration.create_platform_window(&first).unwrap();
        integration.create_platform_window(&second).unwrap();
        assert_eq!(host.window_handles().len(), 2);
        drop(integration);
        assert!(host.window_handles().is_empty());
        assert_eq!(first.native_handle(), None);
    }
}
