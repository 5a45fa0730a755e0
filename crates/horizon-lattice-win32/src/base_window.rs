//! Behavior shared by owned and foreign windows.
//!
//! [`BaseWindow`] is the common contract: geometry and margin queries plus
//! the handful of native operations that do not depend on who created the
//! handle. [`ForeignWindow`] wraps a handle created outside the toolkit.

use std::cell::Cell;
use std::rc::{Rc, Weak};

use tracing::debug;

use crate::geometry::{Margins, Point, Rect};
use crate::geometry_hint::GeometryHint;
use crate::host::{
    InsertAfter, NativeHandle, NativeHost, ShowCommand, SwpFlags, WindowPlacement,
};
use crate::logging::targets;
use crate::state::Visibility;
use crate::style::{WindowExStyle, WindowStyle};
use crate::toolkit::ToolkitWindow;

/// Offset from screen coordinates to the work-area coordinates that
/// placements use. Tool windows use screen coordinates.
pub fn window_placement_offset(host: &dyn NativeHost, handle: NativeHandle, point: Point) -> Point {
    if host.ex_style(handle).contains(WindowExStyle::TOOL_WINDOW) {
        return Point::default();
    }
    let screens = host.screens();
    let screen = if screens.len() == 1 {
        screens.first()
    } else {
        screens.iter().find(|s| s.geometry.contains(point))
    };
    screen
        .map(|s| s.available_geometry.top_left() - s.geometry.top_left())
        .unwrap_or_default()
}

/// Frame geometry of `handle`, relative to its parent's client area when it
/// has one. A minimized top-level reports its restore rectangle.
pub fn native_frame_geometry(host: &dyn NativeHost, handle: NativeHandle, top_level: bool) -> Rect {
    if top_level {
        if let Ok(placement) = host.placement(handle) {
            if placement.show_command == ShowCommand::ShowMinimized {
                let normal = placement.normal_position;
                return normal.translated(window_placement_offset(host, handle, normal.top_left()));
            }
        }
    }
    let rect = host.window_rect(handle).unwrap_or_default();
    match host.parent(handle) {
        Some(parent) if !top_level => {
            rect.moved_to(host.screen_to_client(parent, rect.top_left()))
        }
        _ => rect,
    }
}

/// Restore rectangle of a top-level in screen coordinates.
pub fn normal_frame_geometry(host: &dyn NativeHost, handle: NativeHandle) -> Option<Rect> {
    let placement = host.placement(handle).ok()?;
    let normal = placement.normal_position;
    Some(normal.translated(window_placement_offset(host, handle, normal.top_left())))
}

/// Native visibility, ignoring full screen which the system does not know.
pub fn native_visibility(host: &dyn NativeHost, handle: NativeHandle) -> Visibility {
    if !host.is_visible(handle) {
        return Visibility::Hidden;
    }
    match host.placement(handle).map(|p| p.show_command) {
        Ok(ShowCommand::ShowMinimized | ShowCommand::Minimize) => Visibility::Minimized,
        Ok(ShowCommand::Maximize) => Visibility::Maximized,
        _ => Visibility::Windowed,
    }
}

/// Operations common to every window known to the platform layer.
pub trait BaseWindow {
    fn handle(&self) -> Option<NativeHandle>;

    fn toolkit_window(&self) -> Option<Rc<ToolkitWindow>>;

    /// Whether the window owns a native frame.
    fn is_top_level(&self, host: &dyn NativeHost) -> bool;

    /// Current frame margins including any custom margins.
    fn frame_margins(&self, host: &dyn NativeHost) -> Margins;

    fn style(&self, host: &dyn NativeHost) -> WindowStyle {
        self.handle().map(|h| host.style(h)).unwrap_or_default()
    }

    fn ex_style(&self, host: &dyn NativeHost) -> WindowExStyle {
        self.handle().map(|h| host.ex_style(h)).unwrap_or_default()
    }

    /// Whether the native parent is the desktop.
    fn is_top_level_sys(&self, host: &dyn NativeHost) -> bool {
        self.handle().is_none_or(|h| host.parent(h).is_none())
    }

    fn frame_geometry_sys(&self, host: &dyn NativeHost) -> Rect {
        self.handle()
            .map(|h| native_frame_geometry(host, h, self.is_top_level(host)))
            .unwrap_or_default()
    }

    fn geometry_sys(&self, host: &dyn NativeHost) -> Rect {
        self.frame_geometry_sys(host)
            .margins_removed(self.frame_margins(host))
    }

    /// Margins the system draws for the current style.
    fn frame_margins_sys(&self, host: &dyn NativeHost) -> Margins {
        GeometryHint::frame(host, self.style(host), self.ex_style(host))
    }

    /// Hides without activating another window.
    fn hide_sys(&self, host: &dyn NativeHost) {
        if let Some(handle) = self.handle() {
            let _ = host.set_window_pos(
                handle,
                None,
                Rect::default(),
                SwpFlags::HIDE_WINDOW
                    | SwpFlags::NO_SIZE
                    | SwpFlags::NO_MOVE
                    | SwpFlags::NO_ZORDER
                    | SwpFlags::NO_ACTIVATE,
            );
        }
    }

    fn raise_sys(&self, host: &dyn NativeHost) {
        if let Some(handle) = self.handle() {
            debug!(target: targets::WINDOWS, handle = handle.as_raw(), "raise");
            let _ = host.set_window_pos(
                handle,
                Some(InsertAfter::Top),
                Rect::default(),
                SwpFlags::NO_ACTIVATE | SwpFlags::NO_MOVE | SwpFlags::NO_SIZE,
            );
        }
    }

    fn lower_sys(&self, host: &dyn NativeHost) {
        if let Some(handle) = self.handle() {
            debug!(target: targets::WINDOWS, handle = handle.as_raw(), "lower");
            let _ = host.set_window_pos(
                handle,
                Some(InsertAfter::Bottom),
                Rect::default(),
                SwpFlags::NO_ACTIVATE | SwpFlags::NO_MOVE | SwpFlags::NO_SIZE,
            );
        }
    }

    fn set_window_title_sys(&self, host: &dyn NativeHost, title: &str) {
        if let Some(handle) = self.handle() {
            debug!(target: targets::WINDOWS, handle = handle.as_raw(), title, "set title");
            host.set_title(handle, title);
        }
    }

    fn map_to_global(&self, host: &dyn NativeHost, pos: Point) -> Point {
        match self.handle() {
            Some(handle) => host.client_to_screen(handle, pos),
            None => pos,
        }
    }

    fn map_from_global(&self, host: &dyn NativeHost, pos: Point) -> Point {
        match self.handle() {
            Some(handle) => host.screen_to_client(handle, pos),
            None => pos,
        }
    }

    /// Moves the frame so the client area lands on `rect`.
    ///
    /// Hidden maximized and minimized windows get their restore rectangle
    /// updated instead of being moved.
    fn set_geometry_sys(&self, host: &dyn NativeHost, rect: Rect) {
        let Some(handle) = self.handle() else {
            return;
        };
        let margins = self.frame_margins(host);
        let frame = rect.margins_added(margins);
        debug!(
            target: targets::WINDOWS,
            handle = handle.as_raw(),
            from = ?self.geometry_sys(host),
            to = ?rect,
            ?margins,
            "set geometry"
        );
        let result = match host.placement(handle) {
            Ok(placement)
                if (placement.show_command == ShowCommand::Maximize && !host.is_visible(handle))
                    || placement.show_command == ShowCommand::ShowMinimized =>
            {
                let offset = window_placement_offset(host, handle, frame.top_left());
                let show_command = if placement.show_command == ShowCommand::ShowMinimized {
                    ShowCommand::ShowMinimized
                } else {
                    ShowCommand::Hide
                };
                host.set_placement(
                    handle,
                    &WindowPlacement {
                        show_command,
                        normal_position: frame.translated(-offset),
                    },
                )
            }
            _ => host.move_window(handle, frame, true),
        };
        if let Err(err) = result {
            debug!(target: targets::WINDOWS, %err, "set geometry failed");
        }
    }
}

/// A window created outside the toolkit.
#[derive(Debug)]
pub struct ForeignWindow {
    window: Weak<ToolkitWindow>,
    handle: NativeHandle,
    top_level_style: Cell<Option<WindowStyle>>,
}

impl ForeignWindow {
    /// Wraps `handle` for `window` without taking ownership of it.
    pub fn new(window: &Rc<ToolkitWindow>, handle: NativeHandle) -> Self {
        Self {
            window: Rc::downgrade(window),
            handle,
            top_level_style: Cell::new(None),
        }
    }

    /// The wrapped handle.
    pub fn native_handle(&self) -> NativeHandle {
        self.handle
    }

    /// Reparents the window, switching between child and top-level styles
    /// when the top-level state changes.
    pub fn set_parent(&self, host: &dyn NativeHost, new_parent: Option<NativeHandle>) {
        let was_top_level = self.is_top_level_sys(host);
        let is_top_level = new_parent.is_none();
        let old_style = host.style(self.handle);
        debug!(
            target: targets::WINDOWS,
            handle = self.handle.as_raw(),
            new_parent = ?new_parent.map(NativeHandle::as_raw),
            ?old_style,
            "reparent foreign window"
        );
        host.set_parent(self.handle, new_parent);
        if was_top_level != is_top_level {
            let new_style = if is_top_level {
                self.top_level_style.get().unwrap_or(old_style)
            } else {
                self.top_level_style.set(Some(old_style));
                let mut style = old_style;
                style.remove(WindowStyle::OVERLAPPED_WINDOW | WindowStyle::POPUP_WINDOW);
                style | WindowStyle::CHILD
            };
            host.set_style(self.handle, new_style);
        }
    }

    /// Shows or hides the wrapped window.
    pub fn set_visible(&self, host: &dyn NativeHost, visible: bool) {
        debug!(target: targets::WINDOWS, handle = self.handle.as_raw(), visible, "foreign window visibility");
        if visible {
            host.show_window(self.handle, ShowCommand::ShowNoActivate);
        } else {
            self.hide_sys(host);
        }
    }

    /// Moves the client area of the wrapped window to `rect`.
    pub fn set_geometry(&self, host: &dyn NativeHost, rect: Rect) {
        self.set_geometry_sys(host, rect);
    }
}

impl BaseWindow for ForeignWindow {
    fn handle(&self) -> Option<NativeHandle> {
        Some(self.handle)
    }

    fn toolkit_window(&self) -> Option<Rc<ToolkitWindow>> {
        self.window.upgrade()
    }

    fn is_top_level(&self, host: &dyn NativeHost) -> bool {
        self.is_top_level_sys(host)
    }

    fn frame_margins(&self, host: &dyn NativeHost) -> Margins {
        self.frame_margins_sys(host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HeadlessHost, NativeCreateParams};
    use crate::toolkit::WindowAttributes;
    use crate::window_type::WindowType;

    fn create(host: &HeadlessHost, style: WindowStyle, parent: Option<NativeHandle>) -> NativeHandle {
        host.create_window(&NativeCreateParams {
            class_name: "Foreign".into(),
            title: String::new(),
            style,
            ex_style: WindowExStyle::empty(),
            x: Some(200),
            y: Some(150),
            width: Some(300),
            height: Some(200),
            parent,
        })
        .unwrap()
    }

    #[test]
    fn reparenting_swaps_top_level_style() {
        let host = HeadlessHost::new();
        let container = create(&host, WindowStyle::OVERLAPPED_WINDOW, None);
        let handle = create(&host, WindowStyle::OVERLAPPED_WINDOW | WindowStyle::VISIBLE, None);
        let window = ToolkitWindow::new(WindowAttributes::default().with_flags(WindowType::ForeignWindow));
        let foreign = ForeignWindow::new(&window, handle);

        foreign.set_parent(&host, Some(container));
        let child_style = host.style(handle);
        assert!(child_style.contains(WindowStyle::CHILD | WindowStyle::VISIBLE));
        assert!(!child_style.intersects(WindowStyle::THICK_FRAME | WindowStyle::CAPTION));
        assert!(!foreign.is_top_level(&host));

        foreign.set_parent(&host, None);
        assert_eq!(
            host.style(handle),
            WindowStyle::OVERLAPPED_WINDOW | WindowStyle::VISIBLE
        );
    }

    #[test]
    fn geometry_excludes_frame() {
        let host = HeadlessHost::new();
        let handle = create(&host, WindowStyle::OVERLAPPED_WINDOW, None);
        let window = ToolkitWindow::new(WindowAttributes::default());
        let foreign = ForeignWindow::new(&window, handle);
        assert_eq!(foreign.frame_geometry_sys(&host), Rect::new(200, 150, 300, 200));
        assert_eq!(foreign.geometry_sys(&host), Rect::new(208, 181, 284, 161));
    }

    #[test]
    fn hidden_foreign_window_uses_swp() {
        let host = HeadlessHost::new();
        let handle = create(&host, WindowStyle::OVERLAPPED_WINDOW, None);
        let window = ToolkitWindow::new(WindowAttributes::default());
        let foreign = ForeignWindow::new(&window, handle);
        foreign.set_visible(&host, true);
        assert!(host.is_visible(handle));
        foreign.set_visible(&host, false);
        assert!(!host.is_visible(handle));
    }
}
