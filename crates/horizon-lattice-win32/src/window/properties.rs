//! Per-window properties: opacity, mask, cursor, icons, drop site, input
//! grabs, alerts and rendering surfaces.

use raw_window_handle::RawWindowHandle;
use tracing::{debug, warn};

use super::{PlatformWindow, PlatformWindowFlags};
use crate::base_window::BaseWindow;
use crate::context::PlatformContext;
use crate::cursor::WindowCursor;
use crate::geometry::{Margins, Point};
use crate::host::{DeviceContext, FlashRequest, NativeHandle, NativeHost, ResizeEdge, SwpFlags};
use crate::icon::{IconKind, WindowIcon};
use crate::logging::targets;
use crate::mask::WindowMask;
use crate::style::{WindowExStyle, WindowStyle};
use crate::surface::SurfaceHandle;
use crate::toolkit::ToolkitWindow;
use crate::window_type::{WindowFlags, WindowHints};

const DEFAULT_FLASH_COUNT: u32 = 10;
const DEFAULT_FLASH_INTERVAL_MS: u32 = 250;

/// Switches the layered extended style on or off as needed and returns
/// whether the window is layered afterwards.
///
/// A window is layered when it is transparent for input, when it is a
/// frameless window with an alpha channel, or when it is translucent.
pub fn set_window_layered(
    host: &dyn NativeHost,
    handle: NativeHandle,
    flags: WindowFlags,
    has_alpha: bool,
    opacity: f64,
) -> bool {
    let ex_style = host.ex_style(handle);
    let needs_layered = flags.has(WindowHints::TRANSPARENT_FOR_INPUT)
        || (has_alpha && flags.is_frameless())
        || opacity < 1.0;
    let is_layered = ex_style.contains(WindowExStyle::LAYERED);
    if needs_layered != is_layered {
        let mut new_ex_style = ex_style;
        new_ex_style.set(WindowExStyle::LAYERED, needs_layered);
        host.set_ex_style(handle, new_ex_style);
    }
    needs_layered
}

/// Applies `level` to a window, entering or leaving layered mode.
///
/// Leaving layered mode repaints a visible window.
pub fn set_window_opacity(
    host: &dyn NativeHost,
    handle: NativeHandle,
    flags: WindowFlags,
    has_alpha: bool,
    accelerated: bool,
    level: f64,
) {
    if set_window_layered(host, handle, flags, has_alpha, level) {
        let alpha = (255.0 * level.clamp(0.0, 1.0)).round() as u8;
        let result = if has_alpha && !accelerated && flags.is_frameless() {
            host.update_layered_window(handle, alpha)
        } else {
            host.set_layered_attributes(handle, alpha)
        };
        if let Err(err) = result {
            warn!(target: targets::WINDOWS, handle = handle.as_raw(), alpha, %err, "unable to set window opacity");
        }
    } else if host.is_visible(handle) {
        host.invalidate(handle, true);
    }
}

fn fuzzy_compare(a: f64, b: f64) -> bool {
    (a - b).abs() * 1_000_000_000_000.0 <= a.abs().min(b.abs())
}

impl PlatformWindow {
    /// Opacity last requested, between 0 and 1.
    pub fn opacity(&self) -> f64 {
        self.opacity.get()
    }

    /// Sets the window opacity, switching layered mode on or off as needed.
    pub fn set_opacity(&self, ctx: &PlatformContext, level: f64) {
        if fuzzy_compare(self.opacity.get(), level) {
            return;
        }
        self.opacity.set(level);
        let Some(handle) = self.handle() else {
            return;
        };
        let Some(window) = self.window.upgrade() else {
            return;
        };
        debug!(target: targets::WINDOWS, handle = handle.as_raw(), level, "set opacity");
        set_window_opacity(
            ctx.host(),
            handle,
            self.data.get().flags,
            window.has_alpha(),
            self.flags.get().contains(PlatformWindowFlags::OPENGL_SURFACE),
            level,
        );
    }

    /// Whether the window currently has the layered extended style.
    pub fn is_layered(&self, ctx: &PlatformContext) -> bool {
        self.ex_style(ctx.host()).contains(WindowExStyle::LAYERED)
    }

    /// Limits the window to `mask`, given in client coordinates. An empty
    /// mask removes any previous one.
    pub fn set_mask(&self, ctx: &PlatformContext, mask: &WindowMask) {
        let Some(handle) = self.handle() else {
            return;
        };
        let host = ctx.host();
        let result = if mask.is_empty() {
            host.set_window_region(handle, None)
        } else {
            let is_top_level = self.window.upgrade().is_some_and(|w| w.is_top_level());
            let region = if is_top_level {
                let margins = self.frame_margins(host);
                mask.translated(Point::new(margins.left, margins.top))
            } else {
                mask.clone()
            };
            host.set_window_region(handle, Some(&region))
        };
        if let Err(err) = result {
            warn!(target: targets::WINDOWS, handle = handle.as_raw(), %err, "unable to set window mask");
        }
    }

    // ========================================================================
    // Cursor
    // ========================================================================

    /// The explicitly set cursor, if any.
    pub fn cursor(&self) -> Option<WindowCursor> {
        self.cursor.get()
    }

    /// Sets or clears the window cursor. The native cursor is updated right
    /// away when the pointer is over this window or a descendant that uses
    /// this cursor.
    pub fn set_cursor(&self, ctx: &PlatformContext, cursor: Option<WindowCursor>) {
        if cursor == self.cursor.get() {
            return;
        }
        let apply = self.applies_new_cursor(ctx);
        self.cursor.set(cursor);
        if apply {
            self.apply_cursor(ctx);
        }
    }

    fn applies_new_cursor(&self, ctx: &PlatformContext) -> bool {
        let Some(window) = self.window.upgrade() else {
            return false;
        };
        let mut current = ctx.window_under_mouse();
        while let Some(candidate) = current {
            if candidate.id() == window.id() {
                return true;
            }
            if ctx
                .platform_window_of(&candidate)
                .is_some_and(|pw| pw.cursor().is_some())
            {
                return false;
            }
            current = candidate.parent();
        }
        false
    }

    /// Applies the effective cursor: this window's own, the nearest
    /// ancestor's, or the arrow for top-levels.
    pub fn apply_cursor(&self, ctx: &PlatformContext) {
        if let Some(cursor) = self.cursor.get() {
            ctx.host().set_cursor(cursor);
            return;
        }
        let parent = self.window.upgrade().and_then(|w| w.parent());
        match parent.and_then(|p| ctx.platform_window_of(&p)) {
            Some(parent_window) => parent_window.apply_cursor(ctx),
            None => ctx.host().set_cursor(WindowCursor::default()),
        }
    }

    // ========================================================================
    // Icons
    // ========================================================================

    /// Renders `icon` at the system's small and big icon sizes and attaches
    /// both. `None` removes the icons.
    pub fn set_window_icon(&self, ctx: &PlatformContext, icon: Option<&WindowIcon>) {
        let Some(handle) = self.handle() else {
            return;
        };
        let host = ctx.host();
        self.destroy_icons(host);
        if let Some(icon) = icon {
            let create = |kind: IconKind| {
                let image = icon.rendered(host.icon_size(kind));
                host.create_icon(&image)
                    .map_err(|err| {
                        warn!(target: targets::WINDOWS, handle = handle.as_raw(), ?kind, %err, "unable to create icon");
                    })
                    .ok()
            };
            self.icon_small.set(create(IconKind::Small));
            self.icon_big.set(create(IconKind::Big));
        }
        let small = self.icon_small.get();
        let big = self.icon_big.get().or(small);
        host.set_icon(handle, IconKind::Small, small);
        host.set_icon(handle, IconKind::Big, big);
    }

    pub(crate) fn destroy_icons(&self, host: &dyn NativeHost) {
        if let Some(icon) = self.icon_small.take() {
            host.destroy_icon(icon);
        }
        if let Some(icon) = self.icon_big.take() {
            host.destroy_icon(icon);
        }
    }

    // ========================================================================
    // Drop site
    // ========================================================================

    /// Whether the window accepts drops.
    pub fn is_drop_site_enabled(&self) -> bool {
        self.drop_target.get().is_some()
    }

    /// Enables the drop site for top-levels (and children of foreign windows)
    /// of interactive window types.
    pub fn update_drop_site(&self, ctx: &PlatformContext, top_level: bool) {
        let Some(window) = self.window.upgrade() else {
            return;
        };
        let parent_is_foreign = !top_level
            && window
                .parent()
                .and_then(|p| p.native_handle())
                .is_some_and(|h| ctx.is_foreign_window(h));
        let enabled = (top_level || parent_is_foreign) && window.window_type().accepts_drops();
        self.set_drop_site_enabled(ctx, enabled);
    }

    /// Registers or revokes the drop target.
    pub fn set_drop_site_enabled(&self, ctx: &PlatformContext, enabled: bool) {
        if self.is_drop_site_enabled() == enabled {
            return;
        }
        let Some(handle) = self.handle() else {
            return;
        };
        debug!(target: targets::MIME, handle = handle.as_raw(), enabled, "drop site");
        let host = ctx.host();
        if enabled {
            match host.register_drop_target(handle) {
                Ok(target) => self.drop_target.set(Some(target)),
                Err(err) => {
                    warn!(target: targets::MIME, handle = handle.as_raw(), %err, "unable to register drop target");
                }
            }
        } else if let Some(target) = self.drop_target.take() {
            host.revoke_drop_target(handle, target);
        }
    }

    // ========================================================================
    // Input grabs
    // ========================================================================

    /// Whether the window holds the mouse capture.
    pub fn has_mouse_capture(&self, ctx: &PlatformContext) -> bool {
        self.handle()
            .is_some_and(|h| ctx.host().capture() == Some(h))
    }

    /// Captures or releases the mouse. Returns the grab state requested,
    /// or `false` when the grab cannot be set.
    pub fn set_mouse_grab_enabled(&self, ctx: &PlatformContext, grab: bool) -> bool {
        let Some(handle) = self.handle() else {
            warn!(target: targets::WINDOWS, "mouse grab on a window without a native handle");
            return false;
        };
        let host = ctx.host();
        if grab && !host.is_visible(handle) {
            warn!(target: targets::WINDOWS, handle = handle.as_raw(), "not setting mouse grab for an invisible window");
            return false;
        }
        if self.has_mouse_capture(ctx) != grab {
            if grab {
                host.set_capture(handle);
            } else {
                host.release_capture();
            }
        }
        grab
    }

    /// Makes this window the keyboard grabber, or releases the grab.
    pub fn set_keyboard_grab_enabled(&self, ctx: &PlatformContext, grab: bool) -> bool {
        if self.handle().is_none() {
            warn!(target: targets::WINDOWS, "keyboard grab on a window without a native handle");
            return false;
        }
        let Some(window) = self.window.upgrade() else {
            return false;
        };
        if grab {
            ctx.set_key_grabber(Some(&window));
        } else if ctx.key_grabber().is_some_and(|w| w.id() == window.id()) {
            ctx.set_key_grabber(None);
        }
        true
    }

    // ========================================================================
    // Enabled state and modality
    // ========================================================================

    /// Whether the native window accepts input.
    pub fn is_enabled(&self, ctx: &PlatformContext) -> bool {
        !self.style(ctx.host()).contains(WindowStyle::DISABLED)
    }

    /// Enables or disables input to the native window.
    pub fn set_enabled(&self, ctx: &PlatformContext, enabled: bool) {
        let Some(handle) = self.handle() else {
            return;
        };
        let old_style = self.style(ctx.host());
        let mut new_style = old_style;
        new_style.set(WindowStyle::DISABLED, !enabled);
        if new_style != old_style {
            debug!(target: targets::WINDOWS, handle = handle.as_raw(), enabled, "set enabled");
            self.set_style(ctx, new_style);
        }
    }

    /// Whether a modal window blocks this one.
    pub fn is_blocked_by_modal(&self) -> bool {
        self.flags.get().contains(PlatformWindowFlags::BLOCKED_BY_MODAL)
    }

    /// Disables the window while a modal window blocks it, re-enabling it
    /// when unblocked.
    pub fn set_blocked_by_modal(&self, ctx: &PlatformContext, blocked: bool) {
        self.set_enabled(ctx, !blocked);
        self.set_flag(PlatformWindowFlags::BLOCKED_BY_MODAL, blocked);
        if blocked && self.has_mouse_capture(ctx) {
            ctx.host().release_capture();
        }
    }

    // ========================================================================
    // Activation and alerts
    // ========================================================================

    /// Brings the window to the foreground. With `always_activate_window`
    /// set, activation is forced when another application is in front.
    pub fn request_activate(&self, ctx: &PlatformContext) {
        let Some(handle) = self.handle() else {
            return;
        };
        let host = ctx.host();
        let foreign_foreground = host
            .foreground_window()
            .is_some_and(|fg| ctx.find(fg).is_none());
        let force = ctx.options().always_activate_window && foreign_foreground;
        debug!(target: targets::WINDOWS, handle = handle.as_raw(), force, "request activate");
        if !host.activate(handle, force) {
            debug!(target: targets::WINDOWS, handle = handle.as_raw(), "activation refused");
        }
    }

    /// Whether the taskbar entry is flashing.
    pub fn is_alert_active(&self) -> bool {
        self.flags.get().contains(PlatformWindowFlags::ALERT_STATE)
    }

    /// Flashes the taskbar button. A zero duration flashes ten times.
    pub fn alert(&self, ctx: &PlatformContext, duration_ms: u32) {
        let Some(handle) = self.handle() else {
            return;
        };
        let host = ctx.host();
        self.set_flag(PlatformWindowFlags::ALERT_STATE, true);
        let timeout_ms = host
            .caret_blink_time()
            .filter(|&t| t != 0 && t != u32::MAX)
            .unwrap_or(DEFAULT_FLASH_INTERVAL_MS);
        let count = if duration_ms == 0 {
            DEFAULT_FLASH_COUNT
        } else {
            duration_ms / timeout_ms
        };
        host.flash(handle, FlashRequest::Start { count, timeout_ms });
    }

    /// Stops flashing the taskbar entry.
    pub fn stop_alert(&self, ctx: &PlatformContext) {
        let Some(handle) = self.handle() else {
            return;
        };
        self.set_flag(PlatformWindowFlags::ALERT_STATE, false);
        ctx.host().flash(handle, FlashRequest::Stop);
    }

    /// Starts an interactive resize from `edge`. Fixed-size dialogs refuse.
    pub fn start_system_resize(&self, ctx: &PlatformContext, edge: ResizeEdge) -> bool {
        let Some(handle) = self.handle() else {
            return false;
        };
        if self.data.get().flags.has(WindowHints::FIXED_SIZE_DIALOG) {
            return false;
        }
        let host = ctx.host();
        host.release_capture();
        let started = host.begin_system_resize(handle, edge);
        if started {
            self.set_flag(PlatformWindowFlags::SIZE_GRIP_OPERATION, true);
        }
        started
    }

    /// Whether non-client mouse events are forwarded.
    pub fn is_frame_strut_events_enabled(&self) -> bool {
        self.flags
            .get()
            .contains(PlatformWindowFlags::FRAME_STRUT_EVENTS_ENABLED)
    }

    /// Forwards non-client mouse events to the toolkit.
    pub fn set_frame_strut_events_enabled(&self, enabled: bool) {
        self.set_flag(PlatformWindowFlags::FRAME_STRUT_EVENTS_ENABLED, enabled);
    }

    // ========================================================================
    // Custom margins
    // ========================================================================

    /// Extra non-client margins drawn by the application.
    pub fn custom_margins(&self) -> Margins {
        self.data.get().custom_margins
    }

    /// Changes the custom non-client margins, keeping the frame's top-left
    /// corner in place and forcing the client area to be recomputed.
    pub fn set_custom_margins(&self, ctx: &PlatformContext, margins: Margins) {
        let old = self.data.get().custom_margins;
        if old == margins {
            return;
        }
        self.update_data(|d| d.custom_margins = margins);
        self.frame.invalidate();
        let Some(handle) = self.handle() else {
            return;
        };
        let host = ctx.host();
        let current = self.frame_geometry_sys(host);
        let new_frame = current
            .margins_removed(old)
            .margins_added(margins)
            .moved_to(current.top_left());
        debug!(target: targets::WINDOWS, handle = handle.as_raw(), ?old, new = ?margins, ?new_frame, "set custom margins");
        if let Err(err) = host.set_window_pos(
            handle,
            None,
            new_frame,
            SwpFlags::NO_ZORDER | SwpFlags::FRAME_CHANGED | SwpFlags::NO_ACTIVATE,
        ) {
            warn!(target: targets::WINDOWS, handle = handle.as_raw(), %err, "unable to apply custom margins");
        }
    }

    // ========================================================================
    // Rendering collaborators
    // ========================================================================

    /// The rendering surface, created on first request through the
    /// integration's surface factory.
    pub fn surface(&self, ctx: &PlatformContext) -> Option<SurfaceHandle> {
        if let Some(surface) = self.surface.get() {
            return Some(surface);
        }
        let handle = self.handle()?;
        let window = self.window.upgrade()?;
        let factory = ctx.surface_factory()?;
        match factory.create_window_surface(handle, window.surface_kind()) {
            Ok(surface) => {
                self.surface.set(Some(surface));
                Some(surface)
            }
            Err(err) => {
                warn!(target: targets::WINDOWS, handle = handle.as_raw(), %err, "unable to create window surface");
                None
            }
        }
    }

    /// Makes sure a surface exists before a rendering context binds to it.
    pub fn about_to_make_current(&self, ctx: &PlatformContext) {
        let _ = self.surface(ctx);
    }

    /// Destroys the rendering surface. The next request creates a new one.
    pub fn invalidate_surface(&self, ctx: &PlatformContext) {
        if let Some(surface) = self.surface.take() {
            if let Some(factory) = ctx.surface_factory() {
                factory.destroy_window_surface(surface);
            }
        }
    }

    /// The window's device context, acquired once and kept until released.
    pub fn get_dc(&self, ctx: &PlatformContext) -> Option<DeviceContext> {
        if let Some(dc) = self.dc.get() {
            return Some(dc);
        }
        let dc = ctx.host().get_dc(self.handle()?)?;
        self.dc.set(Some(dc));
        Some(dc)
    }

    /// Releases the device context obtained for painting.
    pub fn release_dc(&self, ctx: &PlatformContext) {
        if let (Some(handle), Some(dc)) = (self.handle(), self.dc.take()) {
            ctx.host().release_dc(handle, dc);
        }
    }

    /// Handle for graphics APIs, or `None` when unrealized.
    pub fn raw_window_handle(&self) -> Option<RawWindowHandle> {
        self.handle().map(NativeHandle::raw_window_handle)
    }
}

/// Whether `window` wants to show without taking activation.
pub(crate) fn shows_without_activating(window: &ToolkitWindow) -> bool {
    window.attributes().show_without_activating
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HeadlessHost, NativeCreateParams};
    use crate::window_type::WindowType;

    fn create(host: &HeadlessHost, ex_style: WindowExStyle) -> NativeHandle {
        host.create_window(&NativeCreateParams {
            class_name: "Test".into(),
            title: String::new(),
            style: WindowStyle::OVERLAPPED_WINDOW | WindowStyle::VISIBLE,
            ex_style,
            x: Some(10),
            y: Some(10),
            width: Some(200),
            height: Some(100),
            parent: None,
        })
        .unwrap()
    }

    #[test]
    fn layered_when_translucent_or_transparent_for_input() {
        let host = HeadlessHost::new();
        let handle = create(&host, WindowExStyle::empty());
        let plain = WindowFlags::new(WindowType::Window);
        assert!(!set_window_layered(&host, handle, plain, false, 1.0));
        assert!(set_window_layered(&host, handle, plain, false, 0.99));
        assert!(host.ex_style(handle).contains(WindowExStyle::LAYERED));

        let input = plain.with_hints(WindowHints::TRANSPARENT_FOR_INPUT);
        assert!(set_window_layered(&host, handle, input, false, 1.0));

        let frameless = plain.with_hints(WindowHints::FRAMELESS);
        assert!(set_window_layered(&host, handle, frameless, true, 1.0));
        assert!(!set_window_layered(&host, handle, frameless, false, 1.0));
        assert!(!host.ex_style(handle).contains(WindowExStyle::LAYERED));
    }

    #[test]
    fn frameless_alpha_uses_update_layered_window() {
        let host = HeadlessHost::new();
        let handle = create(&host, WindowExStyle::empty());
        let flags = WindowFlags::new(WindowType::Window).with_hints(WindowHints::FRAMELESS);
        host.clear_calls();
        set_window_opacity(&host, handle, flags, true, false, 0.25);
        assert!(host.calls().contains(&crate::host::HostCall::UpdateLayeredWindow(handle, 64)));

        host.clear_calls();
        set_window_opacity(&host, handle, flags, true, true, 0.25);
        assert!(host.calls().contains(&crate::host::HostCall::SetLayeredAttributes(handle, 64)));
    }

    #[test]
    fn fuzzy_compare_tolerates_rounding() {
        assert!(fuzzy_compare(0.5, 0.5));
        assert!(fuzzy_compare(1.0, 1.0 + 1e-15));
        assert!(!fuzzy_compare(1.0, 0.999));
    }
}
