//! Platform windows created and owned by the toolkit.
//!
//! A [`PlatformWindow`] binds a [`ToolkitWindow`] to the native window that
//! was created for it. Toolkit requests (show, geometry, state, flags) flow
//! down through it into native calls, and native messages flow back up
//! through [`PlatformWindow::handle_message`], which reconciles them into
//! [`WindowSystemEvent`]s.
//!
//! All methods take the [`PlatformContext`] explicitly. State lives in
//! `Cell`s so that messages delivered re-entrantly from inside a native call
//! can update the window while an outer method is still running.
//!
//! [`WindowSystemEvent`]: crate::toolkit::WindowSystemEvent

mod frame;
pub(crate) mod properties;
mod reconcile;
mod state_machine;

use std::cell::Cell;
use std::rc::{Rc, Weak};

use bitflags::bitflags;
use tracing::{debug, warn};

pub use frame::FrameCache;
pub use properties::{set_window_layered, set_window_opacity};
pub use reconcile::handle_geometry_changing_message;

use crate::base_window::{BaseWindow, native_visibility, normal_frame_geometry};
use crate::context::{PlatformContext, RegisteredWindow};
use crate::creation::{
    CreatedWindow, CreationMode, MaterializeTarget, WindowCreationSpec, WindowData,
};
use crate::cursor::WindowCursor;
use crate::geometry::{Margins, Point, Rect};
use crate::geometry_hint::GeometryHint;
use crate::host::{DeviceContext, DropTargetHandle, IconHandle, NativeHandle, NativeHost, ShowCommand};
use crate::logging::targets;
use crate::state::{Visibility, WindowState};
use crate::style::{WindowExStyle, WindowStyle};
use crate::surface::SurfaceHandle;
use crate::toolkit::{SurfaceKind, ToolkitWindow, WindowSystemEvent};
use crate::window_type::{WindowFlags, WindowType};

bitflags! {
    /// Transient state bits of a [`PlatformWindow`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PlatformWindowFlags: u32 {
        /// The toolkit was told the window is exposed.
        const EXPOSED = 1 << 0;
        const WITHIN_CREATE = 1 << 1;
        /// Suppresses message handling and transient parent links.
        const WITHIN_DESTROY = 1 << 2;
        const WITHIN_SET_PARENT = 1 << 3;
        const WITHIN_SET_STYLE = 1 << 4;
        const WITHIN_SET_GEOMETRY = 1 << 5;
        const WITHIN_MAXIMIZE = 1 << 6;
        const HAS_BORDER_IN_FULL_SCREEN = 1 << 7;
        const OPENGL_SURFACE = 1 << 8;
        const BLOCKED_BY_MODAL = 1 << 9;
        const FRAME_STRUT_EVENTS_ENABLED = 1 << 10;
        const ALERT_STATE = 1 << 11;
        const SIZE_GRIP_OPERATION = 1 << 12;
    }
}

/// A native window created for a toolkit window.
#[derive(Debug)]
pub struct PlatformWindow {
    window: Weak<ToolkitWindow>,
    data: Cell<WindowData>,
    frame: FrameCache,
    state: Cell<WindowState>,
    flags: Cell<PlatformWindowFlags>,
    opacity: Cell<f64>,
    /// Style and frame to restore when leaving emulated full screen.
    saved_style: Cell<Option<WindowStyle>>,
    saved_frame_geometry: Cell<Option<Rect>>,
    cursor: Cell<Option<WindowCursor>>,
    drop_target: Cell<Option<DropTargetHandle>>,
    icon_small: Cell<Option<IconHandle>>,
    icon_big: Cell<Option<IconHandle>>,
    surface: Cell<Option<SurfaceHandle>>,
    dc: Cell<Option<DeviceContext>>,
}

impl PlatformWindow {
    /// Takes ownership of a freshly created native window.
    ///
    /// Finishing `created` clears the creation context whether or not the
    /// create call succeeded. Returns `None`, leaving the toolkit window
    /// unrealized, when there is no native handle.
    pub fn new(
        ctx: &PlatformContext,
        window: &Rc<ToolkitWindow>,
        created: CreatedWindow<'_>,
    ) -> Option<Rc<Self>> {
        let data = created.finish();
        let Some(handle) = data.handle else {
            warn!(
                target: targets::WINDOWS,
                window = window.id().as_u64(),
                window_type = %window.window_type(),
                "no native handle, window stays unrealized"
            );
            return None;
        };

        let requested_geometry = window.geometry();
        let platform_window = Rc::new(Self {
            window: Rc::downgrade(window),
            data: Cell::new(data),
            frame: FrameCache::new(),
            state: Cell::new(WindowState::Normal),
            flags: Cell::new(PlatformWindowFlags::WITHIN_CREATE),
            opacity: Cell::new(1.0),
            saved_style: Cell::new(None),
            saved_frame_geometry: Cell::new(None),
            cursor: Cell::new(None),
            drop_target: Cell::new(None),
            icon_small: Cell::new(None),
            icon_big: Cell::new(None),
            surface: Cell::new(None),
            dc: Cell::new(None),
        });
        window.set_native_handle(Some(handle));
        ctx.register(handle, RegisteredWindow::Owned(Rc::clone(&platform_window)));
        debug!(
            target: targets::WINDOWS,
            handle = handle.as_raw(),
            window = window.id().as_u64(),
            geometry = ?data.geometry,
            "platform window created"
        );

        if window.flags() != data.flags {
            window.update(|a| a.flags = data.flags);
        }
        if data.flags.window_type() == WindowType::Desktop {
            platform_window.set_flag(PlatformWindowFlags::WITHIN_CREATE, false);
            return Some(platform_window);
        }

        if window.surface_kind() == SurfaceKind::OpenGl {
            platform_window.set_flag(PlatformWindowFlags::OPENGL_SURFACE, true);
        }
        if ctx.options().has_border_in_fullscreen {
            platform_window.set_flag(PlatformWindowFlags::HAS_BORDER_IN_FULL_SCREEN, true);
        }
        platform_window.update_drop_site(ctx, window.is_top_level());
        let opacity = window.opacity();
        if opacity != 1.0 {
            platform_window.set_opacity(ctx, opacity);
        }
        if window.is_top_level() {
            let icon = window.attributes().icon.clone();
            if icon.is_some() {
                platform_window.set_window_icon(ctx, icon.as_ref());
            }
        }
        platform_window.set_flag(PlatformWindowFlags::WITHIN_CREATE, false);

        platform_window.set_window_state(ctx, window.state());
        if let Some(screen) = ctx.screen_for_geometry(data.geometry) {
            if window.screen() != Some(screen.id) {
                ctx.post_event(
                    window,
                    WindowSystemEvent::ScreenChanged {
                        window: window.id(),
                        screen: screen.id,
                    },
                );
            }
        }
        let state = platform_window.state.get();
        if !(state.is_maximized() || state.is_fullscreen())
            && requested_geometry != data.geometry
        {
            ctx.post_event(
                window,
                WindowSystemEvent::GeometryChanged {
                    window: window.id(),
                    geometry: data.geometry,
                },
            );
        }
        Some(platform_window)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// The toolkit window, unless it has been dropped.
    pub fn window(&self) -> Option<Rc<ToolkitWindow>> {
        self.window.upgrade()
    }

    /// Snapshot of the creation data kept up to date by the window.
    pub fn data(&self) -> WindowData {
        self.data.get()
    }

    pub(crate) fn update_data(&self, f: impl FnOnce(&mut WindowData)) {
        let mut data = self.data.get();
        f(&mut data);
        self.data.set(data);
    }

    /// Flags the window was created or last reconfigured with.
    pub fn window_flags(&self) -> WindowFlags {
        self.data.get().flags
    }

    /// Current transient state bits.
    pub fn state_flags(&self) -> PlatformWindowFlags {
        self.flags.get()
    }

    /// Whether `flag` is set.
    pub fn test_flag(&self, flag: PlatformWindowFlags) -> bool {
        self.flags.get().contains(flag)
    }

    pub(crate) fn set_flag(&self, flag: PlatformWindowFlags, on: bool) {
        let mut flags = self.flags.get();
        flags.set(flag, on);
        self.flags.set(flags);
    }

    /// Client geometry as last reported by the system.
    pub fn geometry(&self) -> Rect {
        self.data.get().geometry
    }

    /// Whether the toolkit was told the window is exposed.
    pub fn is_exposed(&self) -> bool {
        self.test_flag(PlatformWindowFlags::EXPOSED)
    }

    /// Whether the window is embedded into a foreign native window.
    pub fn is_embedded(&self) -> bool {
        self.data.get().embedded
    }

    /// Style saved on entering full screen.
    pub fn saved_style(&self) -> Option<WindowStyle> {
        self.saved_style.get()
    }

    /// Frame geometry saved on entering full screen.
    pub fn saved_frame_geometry(&self) -> Option<Rect> {
        self.saved_frame_geometry.get()
    }

    /// Whether the native window is shown.
    pub fn is_visible(&self, ctx: &PlatformContext) -> bool {
        self.handle().is_some_and(|h| ctx.host().is_visible(h))
    }

    /// Whether this window or one of its native children has the foreground.
    pub fn is_active(&self, ctx: &PlatformContext) -> bool {
        let host = ctx.host();
        match (self.handle(), host.foreground_window()) {
            (Some(handle), Some(foreground)) => {
                foreground == handle || host.is_child(foreground, handle)
            }
            _ => false,
        }
    }

    /// The outermost toolkit window of `window`, following embedded windows
    /// out through their native ancestors.
    pub fn top_level_of(ctx: &PlatformContext, window: &Rc<ToolkitWindow>) -> Rc<ToolkitWindow> {
        let mut top = Rc::clone(window);
        while let Some(parent) = top.parent() {
            top = parent;
        }
        let Some(platform_window) = ctx.platform_window_of(&top) else {
            return top;
        };
        if !platform_window.is_embedded() {
            return top;
        }
        let host = ctx.host();
        let mut ancestor = platform_window.handle().and_then(|h| host.parent(h));
        while let Some(handle) = ancestor {
            if let Some(owner) = ctx.platform_window(handle).and_then(|pw| pw.window()) {
                return Self::top_level_of(ctx, &owner);
            }
            ancestor = host.parent(handle);
        }
        top
    }

    // ========================================================================
    // Visibility
    // ========================================================================

    /// Shows or hides the native window and updates exposure.
    pub fn set_visible(&self, ctx: &PlatformContext, visible: bool) {
        let (Some(handle), Some(window)) = (self.handle(), self.window.upgrade()) else {
            return;
        };
        debug!(target: targets::WINDOWS, handle = handle.as_raw(), visible, "set visible");
        let host = ctx.host();
        if visible {
            self.show_sys(ctx, &window);
            // Layered windows get no paint messages.
            if self.is_layered(ctx) {
                self.fire_full_expose(ctx, false);
            }
            let app_has_focus = host
                .foreground_window()
                .is_some_and(|fg| ctx.find(fg).is_some());
            if window.window_type() == WindowType::Popup && window.parent().is_none() && !app_has_focus {
                host.activate(handle, false);
            }
        } else {
            if self.has_mouse_capture(ctx) {
                self.set_mouse_grab_enabled(ctx, false);
            }
            if window.window_type().is_popup_like() {
                host.show_window(handle, ShowCommand::Hide);
            } else {
                self.hide_sys(host);
            }
            self.fire_expose(ctx, None, false);
        }
    }

    fn show_sys(&self, ctx: &PlatformContext, window: &ToolkitWindow) {
        let Some(handle) = self.handle() else {
            return;
        };
        let host = ctx.host();
        let mut command = ShowCommand::ShowNormal;
        if window.is_top_level() {
            match window.state() {
                WindowState::Minimized => {
                    command = if host.is_visible(handle) {
                        ShowCommand::ShowMinimized
                    } else {
                        ShowCommand::ShowMinNoActive
                    };
                }
                state => {
                    self.update_transient_parent(ctx);
                    if state == WindowState::Maximized {
                        command = ShowCommand::Maximize;
                    }
                }
            }
        }
        let passive_type = matches!(
            window.window_type(),
            WindowType::Popup | WindowType::ToolTip | WindowType::Tool
        );
        if command == ShowCommand::ShowNormal
            && (passive_type || properties::shows_without_activating(window))
        {
            command = ShowCommand::ShowNoActivate;
        }
        debug!(target: targets::WINDOWS, handle = handle.as_raw(), ?command, "show");
        if command == ShowCommand::Maximize {
            self.show_with_maximize_fixup(ctx, command);
        } else {
            host.show_window(handle, command);
        }
    }

    /// Visibility combining the native show state with emulated full screen.
    pub fn visibility(&self, ctx: &PlatformContext) -> Visibility {
        let Some(handle) = self.handle() else {
            return Visibility::Hidden;
        };
        match native_visibility(ctx.host(), handle) {
            Visibility::Windowed if self.state.get() == WindowState::Fullscreen => {
                Visibility::Fullscreen
            }
            visibility => visibility,
        }
    }

    /// Brings the window to the top of its z-order band.
    pub fn raise(&self, ctx: &PlatformContext) {
        let Some(window) = self.window.upgrade() else {
            return;
        };
        let window_type = window.window_type();
        if matches!(window_type, WindowType::Popup | WindowType::SubWindow)
            || !window.flags().stays_on_bottom()
        {
            self.raise_sys(ctx.host());
        }
    }

    /// Sends the window to the bottom unless it stays on top.
    pub fn lower(&self, ctx: &PlatformContext) {
        if self.window.upgrade().is_some_and(|w| !w.flags().stays_on_top()) {
            self.lower_sys(ctx.host());
        }
    }

    // ========================================================================
    // Geometry
    // ========================================================================

    /// Moves the client area to `rect`. The system reports the geometry it
    /// actually applied; a mismatch on a visible window is logged.
    pub fn set_geometry(&self, ctx: &PlatformContext, rect: Rect) {
        let Some(window) = self.window.upgrade() else {
            return;
        };
        let host = ctx.host();
        let mut rect = rect;
        if GeometryHint::position_includes_frame(&window) {
            let margins = self.frame_margins(host);
            rect = rect.translated(Point::new(margins.left, margins.top));
        }
        if self.state.get() == WindowState::Minimized {
            self.update_data(|d| d.geometry = rect);
        }
        let Some(handle) = self.handle() else {
            self.update_data(|d| d.geometry = rect);
            return;
        };
        self.set_flag(PlatformWindowFlags::WITHIN_SET_GEOMETRY, true);
        self.set_geometry_sys(host, rect);
        self.set_flag(PlatformWindowFlags::WITHIN_SET_GEOMETRY, false);
        let obtained = self.data.get().geometry;
        if obtained != rect && host.is_visible(handle) {
            let margins = self.frame_margins(host);
            warn!(
                target: targets::WINDOWS,
                handle = handle.as_raw(),
                requested = ?rect,
                frame = ?rect.margins_added(margins),
                ?obtained,
                min = ?window.minimum_size(),
                max = ?window.maximum_size(),
                "unable to set geometry"
            );
        }
    }

    /// Frame geometry in screen coordinates, or parent client coordinates
    /// for child windows.
    pub fn frame_geometry(&self, ctx: &PlatformContext) -> Rect {
        self.frame_geometry_sys(ctx.host())
    }

    /// Client geometry the window restores to. During emulated full screen
    /// this is derived from the saved frame and style.
    pub fn normal_geometry(&self, ctx: &PlatformContext) -> Rect {
        let host = ctx.host();
        let Some(handle) = self.handle() else {
            return self.data.get().geometry;
        };
        let fake_fullscreen = self.state.get().is_fullscreen();
        let (frame, margins) = match (fake_fullscreen, self.saved_frame_geometry.get()) {
            (true, Some(saved)) => (
                Some(saved),
                GeometryHint::frame(
                    host,
                    self.saved_style.get().unwrap_or_default(),
                    WindowExStyle::empty(),
                ),
            ),
            _ => (normal_frame_geometry(host, handle), self.frame_margins(host)),
        };
        match frame {
            Some(frame) if frame.is_valid() => frame.margins_removed(margins),
            Some(frame) => frame,
            None => self.data.get().geometry,
        }
    }

    // ========================================================================
    // Flags, parent and owner
    // ========================================================================

    /// Reclassifies the window for new flags without recreating it.
    pub fn set_window_flags(&self, ctx: &PlatformContext, flags: WindowFlags) {
        let Some(window) = self.window.upgrade() else {
            return;
        };
        debug!(
            target: targets::WINDOWS,
            from = ?self.data.get().flags,
            to = ?flags,
            "set window flags"
        );
        if window.flags() != flags {
            window.update(|a| a.flags = flags);
        }
        let old_geometry = self.data.get().geometry;
        if self.data.get().flags != flags {
            self.update_data(|d| d.flags = flags);
            if self.handle().is_some() {
                self.set_window_flags_sys(ctx, &window, flags, CreationMode::Default);
                self.update_drop_site(ctx, window.is_top_level());
            }
        }
        // Switching to frameless changes the client geometry without a move.
        if self.handle().is_some() && self.geometry_sys(ctx.host()) != old_geometry {
            self.handle_geometry_change(ctx);
        }
    }

    fn set_window_flags_sys(
        &self,
        ctx: &PlatformContext,
        window: &Rc<ToolkitWindow>,
        flags: WindowFlags,
        mode: CreationMode,
    ) {
        let Some(handle) = self.handle() else {
            return;
        };
        let spec = WindowCreationSpec::derive(window, flags, mode);
        spec.materialize(
            ctx,
            window,
            MaterializeTarget::Reconfigure {
                handle,
                opacity: self.opacity.get(),
            },
        );
        self.update_data(|d| {
            d.flags = spec.flags;
            d.embedded = spec.embedded;
        });
        self.frame.invalidate();
    }

    /// Reparents the native window. Crossing between top-level and child
    /// reclassifies its style.
    pub fn set_parent(&self, ctx: &PlatformContext, parent: Option<&Rc<ToolkitWindow>>) {
        let (Some(handle), Some(window)) = (self.handle(), self.window.upgrade()) else {
            return;
        };
        window.set_parent(parent);
        let host = ctx.host();
        let old_parent = host.parent(handle);
        let new_parent = parent.and_then(|p| p.native_handle());
        if old_parent == new_parent {
            return;
        }
        debug!(
            target: targets::WINDOWS,
            handle = handle.as_raw(),
            old_parent = ?old_parent.map(NativeHandle::as_raw),
            new_parent = ?new_parent.map(NativeHandle::as_raw),
            "set parent"
        );
        let was_top_level = old_parent.is_none();
        let is_top_level = new_parent.is_none();
        self.set_flag(PlatformWindowFlags::WITHIN_SET_PARENT, true);
        host.set_parent(handle, new_parent);
        self.set_flag(PlatformWindowFlags::WITHIN_SET_PARENT, false);
        if was_top_level != is_top_level {
            self.set_drop_site_enabled(ctx, false);
            let mode = if is_top_level {
                CreationMode::ForceTopLevel
            } else {
                CreationMode::ForceChild
            };
            self.set_window_flags_sys(ctx, &window, window.flags(), mode);
            self.update_drop_site(ctx, is_top_level);
        }
    }

    /// Points the native owner at the transient parent's window. Popups
    /// stay unowned; an owner that is being destroyed is dropped.
    pub fn update_transient_parent(&self, ctx: &PlatformContext) {
        let (Some(handle), Some(window)) = (self.handle(), self.window.upgrade()) else {
            return;
        };
        if window.window_type() == WindowType::Popup {
            return;
        }
        let host = ctx.host();
        let old_owner = host.owner(handle);
        let mut new_owner = window
            .transient_parent()
            .and_then(|tp| ctx.platform_window_of(&tp))
            .filter(|pw| !pw.test_flag(PlatformWindowFlags::WITHIN_DESTROY))
            .and_then(|pw| pw.handle());
        // Owners must be top-level.
        while let Some(owner) = new_owner {
            if !host.style(owner).contains(WindowStyle::CHILD) {
                break;
            }
            new_owner = host.parent(owner);
        }
        if new_owner != old_owner {
            debug!(
                target: targets::WINDOWS,
                handle = handle.as_raw(),
                owner = ?new_owner.map(NativeHandle::as_raw),
                "update transient parent"
            );
            host.set_owner(handle, new_owner);
        }
    }

    /// Sets the native title. Titled top-levels without one use the
    /// application name.
    pub fn set_window_title(&self, ctx: &PlatformContext, title: &str) {
        let is_top_level = self.window.upgrade().is_some_and(|w| w.is_top_level());
        let title = if title.is_empty() && is_top_level && self.data.get().flags.has_title() {
            ctx.options().application_name.as_str()
        } else {
            title
        };
        self.set_window_title_sys(ctx.host(), title);
    }

    // ========================================================================
    // Destruction
    // ========================================================================

    /// Destroys the native window and releases everything attached to it.
    ///
    /// Transient children are unlinked first so the system does not take
    /// them down too. Registered native children are destroyed before their
    /// parent.
    pub fn destroy(&self, ctx: &PlatformContext) {
        let Some(handle) = self.handle() else {
            return;
        };
        debug!(target: targets::WINDOWS, handle = handle.as_raw(), "destroy");
        self.set_flag(PlatformWindowFlags::WITHIN_DESTROY, true);
        let host = ctx.host();
        let window = self.window.upgrade();

        // The toolkit window may already be gone, so owned windows are found
        // through the native owner link.
        for other in ctx.owned_windows() {
            let owned = other
                .handle()
                .is_some_and(|h| h != handle && host.owner(h) == Some(handle));
            if owned {
                other.update_transient_parent(ctx);
            }
        }
        if let Some(window) = &window {
            if ctx.window_under_mouse().is_some_and(|w| w.id() == window.id()) {
                ctx.set_window_under_mouse(None);
            }
        }
        if self.has_mouse_capture(ctx) {
            self.set_mouse_grab_enabled(ctx, false);
        }
        self.set_drop_site_enabled(ctx, false);
        self.invalidate_surface(ctx);
        self.release_dc(ctx);

        for child in ctx.owned_windows() {
            if child.handle().is_some_and(|h| h != handle && host.parent(h) == Some(handle)) {
                child.destroy(ctx);
            }
        }

        if self.data.get().flags.window_type() != WindowType::ForeignWindow {
            if let Err(err) = host.destroy_window(handle) {
                warn!(target: targets::WINDOWS, handle = handle.as_raw(), %err, "unable to destroy native window");
            }
        }
        ctx.unregister(handle);
        self.update_data(|d| d.handle = None);
        if let Some(window) = &window {
            window.set_native_handle(None);
        }
        self.destroy_icons(host);
    }
}

impl BaseWindow for PlatformWindow {
    fn handle(&self) -> Option<NativeHandle> {
        self.data.get().handle
    }

    fn toolkit_window(&self) -> Option<Rc<ToolkitWindow>> {
        self.window.upgrade()
    }

    fn is_top_level(&self, _host: &dyn NativeHost) -> bool {
        self.window.upgrade().is_some_and(|w| w.is_top_level()) && !self.data.get().embedded
    }

    /// System frame plus custom margins. Frameless windows have none.
    fn frame_margins(&self, host: &dyn NativeHost) -> Margins {
        let data = self.data.get();
        if data.flags.is_frameless() {
            return Margins::default();
        }
        let frame = self.frame.get_or_compute(|| self.frame_margins_sys(host));
        if frame != data.frame {
            self.update_data(|d| d.frame = frame);
        }
        frame + data.custom_margins
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlatformOptions;
    use crate::context::PlatformIntegration;
    use crate::host::{HeadlessHost, HostCall};
    use crate::toolkit::WindowAttributes;
    use crate::window_type::WindowHints;

    fn setup() -> (Rc<HeadlessHost>, PlatformIntegration) {
        let host = Rc::new(HeadlessHost::new());
        let integration = PlatformIntegration::new(host.clone(), PlatformOptions::default());
        (host, integration)
    }

    fn realize(integration: &PlatformIntegration, attributes: WindowAttributes) -> (Rc<ToolkitWindow>, Rc<PlatformWindow>) {
        let window = ToolkitWindow::new(attributes);
        let platform_window = integration.create_platform_window(&window).unwrap();
        (window, platform_window)
    }

    #[test]
    fn creation_reports_obtained_geometry() {
        let (host, integration) = setup();
        let (window, pw) = realize(
            &integration,
            WindowAttributes::default().with_geometry(Rect::new(100, 100, 400, 300)),
        );
        let handle = pw.handle().unwrap();
        assert_eq!(window.native_handle(), Some(handle));
        assert_eq!(pw.geometry(), Rect::new(100, 100, 400, 300));
        assert_eq!(host.window_rect(handle).unwrap(), Rect::new(92, 69, 416, 339));
        assert_eq!(pw.frame_margins(&*host), Margins::new(8, 31, 8, 8));
        assert!(integration.context().creation_context().is_none());
    }

    #[test]
    fn frameless_window_has_no_margins() {
        let (host, integration) = setup();
        let flags = WindowFlags::new(WindowType::Window).with_hints(WindowHints::FRAMELESS);
        let (_window, pw) = realize(&integration, WindowAttributes::default().with_flags(flags));
        assert_eq!(pw.frame_margins(&*host), Margins::default());
    }

    #[test]
    fn automatic_position_centers_on_screen() {
        let (_, integration) = setup();
        let (_window, pw) = realize(
            &integration,
            WindowAttributes::default().with_size(crate::geometry::Size::new(400, 300)),
        );
        assert_eq!(pw.geometry(), Rect::new(760, 370, 400, 300));
    }

    #[test]
    fn set_geometry_moves_frame() {
        let (host, integration) = setup();
        let (window, pw) = realize(
            &integration,
            WindowAttributes::default().with_geometry(Rect::new(100, 100, 400, 300)),
        );
        let ctx = integration.context();
        pw.set_geometry(ctx, Rect::new(200, 150, 500, 400));
        assert_eq!(pw.geometry(), Rect::new(200, 150, 500, 400));
        assert_eq!(window.geometry(), Rect::new(200, 150, 500, 400));
        assert_eq!(
            host.window_rect(pw.handle().unwrap()).unwrap(),
            Rect::new(192, 119, 516, 439)
        );
    }

    #[test]
    fn show_and_hide() {
        let (host, integration) = setup();
        let (window, pw) = realize(
            &integration,
            WindowAttributes::default().with_geometry(Rect::new(100, 100, 400, 300)),
        );
        let ctx = integration.context();
        let handle = pw.handle().unwrap();
        host.clear_calls();
        pw.set_visible(ctx, true);
        assert!(host.calls().contains(&HostCall::ShowWindow(handle, ShowCommand::ShowNormal)));
        assert_eq!(pw.visibility(ctx), Visibility::Windowed);

        host.simulate_paint(handle, Some(Rect::new(0, 0, 400, 300)));
        assert!(pw.is_exposed());
        assert!(window.is_exposed());

        pw.set_visible(ctx, false);
        assert_eq!(pw.visibility(ctx), Visibility::Hidden);
        assert!(!pw.is_exposed());
        assert!(!window.is_exposed());
    }

    #[test]
    fn tool_windows_show_without_activation() {
        let (host, integration) = setup();
        let (_window, pw) = realize(&integration, WindowAttributes::default().with_flags(WindowType::Tool));
        let handle = pw.handle().unwrap();
        host.clear_calls();
        pw.set_visible(integration.context(), true);
        assert!(host.calls().contains(&HostCall::ShowWindow(handle, ShowCommand::ShowNoActivate)));
    }

    #[test]
    fn transient_parent_becomes_owner() {
        let (host, integration) = setup();
        let (owner, owner_pw) = realize(&integration, WindowAttributes::default());
        let dialog = ToolkitWindow::new(WindowAttributes::default().with_flags(WindowType::Dialog));
        dialog.set_transient_parent(Some(&owner));
        let dialog_pw = integration.create_platform_window(&dialog).unwrap();
        let owner_handle = owner_pw.handle().unwrap();
        let dialog_handle = dialog_pw.handle().unwrap();
        assert_eq!(host.owner(dialog_handle), Some(owner_handle));

        // Destroying the owner unlinks the dialog instead of taking it along.
        owner_pw.destroy(integration.context());
        assert_eq!(host.owner(dialog_handle), None);
        assert!(host.is_window(dialog_handle));
        assert_eq!(owner.native_handle(), None);
    }

    #[test]
    fn reparenting_switches_between_child_and_top_level() {
        let (host, integration) = setup();
        let ctx = integration.context();
        let (container, _container_pw) = realize(&integration, WindowAttributes::default());
        let (window, pw) = realize(&integration, WindowAttributes::default().with_flags(WindowType::Widget));
        let handle = pw.handle().unwrap();

        pw.set_parent(ctx, Some(&container));
        assert!(host.style(handle).contains(WindowStyle::CHILD));
        assert!(!pw.is_top_level(&*host));
        assert!(!window.is_top_level());

        pw.set_parent(ctx, None);
        assert!(!host.style(handle).contains(WindowStyle::CHILD));
        assert!(pw.is_top_level(&*host));
    }

    #[test]
    fn destroying_parent_destroys_registered_children() {
        let (host, integration) = setup();
        let ctx = integration.context();
        let (parent, parent_pw) = realize(&integration, WindowAttributes::default());
        let child = ToolkitWindow::new_child(&parent, WindowAttributes::default().with_flags(WindowType::Widget));
        let child_pw = integration.create_platform_window(&child).unwrap();
        let child_handle = child_pw.handle().unwrap();
        assert_eq!(host.parent(child_handle), parent_pw.handle());

        parent_pw.destroy(ctx);
        assert!(child_pw.handle().is_none());
        assert!(ctx.find(child_handle).is_none());
        assert!(host.window_handles().is_empty());
    }

    #[test]
    fn empty_title_uses_application_name() {
        let host = Rc::new(HeadlessHost::new());
        let integration = PlatformIntegration::new(
            host.clone(),
            PlatformOptions::default().with_application_name("Lattice"),
        );
        let (_window, pw) = realize(&integration, WindowAttributes::default());
        let handle = pw.handle().unwrap();
        assert_eq!(host.window(handle).unwrap().title, "Lattice");
        pw.set_window_title(integration.context(), "Document");
        assert_eq!(host.window(handle).unwrap().title, "Document");
    }
}
