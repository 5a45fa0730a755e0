//! Window state transitions.
//!
//! Normal, minimized and maximized map onto native show commands. Full
//! screen has no native counterpart and is emulated: the current style and
//! frame are saved, the window becomes a borderless popup covering its
//! screen, and both are restored on the way out.

use tracing::{debug, warn};

use super::{PlatformWindow, PlatformWindowFlags};
use crate::base_window::{BaseWindow, native_visibility, normal_frame_geometry, window_placement_offset};
use crate::context::PlatformContext;
use crate::geometry::Rect;
use crate::host::{InsertAfter, NativeHandle, ShowCommand, SwpFlags, WindowPlacement};
use crate::logging::targets;
use crate::state::{Visibility, WindowState};
use crate::style::{WindowExStyle, WindowStyle};
use crate::toolkit::WindowSystemEvent;

impl PlatformWindow {
    /// The state last applied or reported by the system.
    pub fn window_state(&self) -> WindowState {
        self.state.get()
    }

    /// Applies a toolkit state request. Requesting the current state is a
    /// no-op on the native side.
    pub fn set_window_state(&self, ctx: &PlatformContext, state: WindowState) {
        if let Some(window) = self.window.upgrade() {
            if window.state() != state {
                window.update(|a| a.state = state);
            }
        }
        if self.handle().is_some() {
            self.set_window_state_sys(ctx, state);
            self.state.set(state);
        }
    }

    fn set_window_state_sys(&self, ctx: &PlatformContext, new_state: WindowState) {
        let old_state = self.state.get();
        if old_state == new_state {
            return;
        }
        let Some(handle) = self.handle() else {
            return;
        };
        let host = ctx.host();
        let visible = host.is_visible(handle);
        debug!(
            target: targets::WINDOWS,
            handle = handle.as_raw(),
            from = ?old_state,
            to = ?new_state,
            visible,
            "set window state"
        );
        match (old_state, new_state) {
            (_, WindowState::Fullscreen) => self.enter_fullscreen(ctx, handle, old_state, visible),
            (WindowState::Fullscreen, _) => self.leave_fullscreen(ctx, handle, new_state, visible),
            (_, WindowState::Minimized) => {
                if visible {
                    host.show_window(handle, ShowCommand::Minimize);
                }
            }
            (_, WindowState::Maximized) => {
                if visible {
                    self.show_with_maximize_fixup(ctx, ShowCommand::Maximize);
                }
            }
            (WindowState::Maximized, WindowState::Normal) => {
                if visible {
                    self.set_flag(PlatformWindowFlags::WITHIN_MAXIMIZE, true);
                    host.show_window(handle, ShowCommand::ShowNoActivate);
                    self.set_flag(PlatformWindowFlags::WITHIN_MAXIMIZE, false);
                }
            }
            (WindowState::Minimized, WindowState::Normal) => {
                if visible {
                    host.show_window(handle, ShowCommand::ShowNormal);
                }
            }
            (WindowState::Normal, WindowState::Normal) => {}
        }
    }

    fn enter_fullscreen(
        &self,
        ctx: &PlatformContext,
        handle: NativeHandle,
        old_state: WindowState,
        visible: bool,
    ) {
        let host = ctx.host();
        if self.saved_style.get().is_none() {
            self.saved_style.set(Some(host.style(handle)));
            let frame = if matches!(old_state, WindowState::Minimized | WindowState::Maximized) {
                normal_frame_geometry(host, handle).filter(Rect::is_valid)
            } else {
                Some(self.frame_geometry_sys(host))
            };
            self.saved_frame_geometry.set(frame);
        }
        let screen = ctx
            .screen_for_geometry(self.frame_geometry_sys(host))
            .or_else(|| ctx.primary_screen());

        let saved_style = self.saved_style.get().unwrap_or_default();
        let mut style = WindowStyle::POPUP | WindowStyle::CLIP_CHILDREN | WindowStyle::CLIP_SIBLINGS;
        if saved_style.contains(WindowStyle::SYS_MENU) {
            style |= WindowStyle::SYS_MENU;
        }
        if visible {
            style |= WindowStyle::VISIBLE;
        }
        if self.test_flag(PlatformWindowFlags::HAS_BORDER_IN_FULL_SCREEN) {
            style |= WindowStyle::BORDER;
        }
        self.set_style(ctx, style);

        let Some(screen) = screen else {
            warn!(target: targets::WINDOWS, handle = handle.as_raw(), "no screen to cover");
            return;
        };
        if let Err(err) = host.set_window_pos(
            handle,
            Some(InsertAfter::Top),
            screen.geometry,
            SwpFlags::FRAME_CHANGED | SwpFlags::NO_ACTIVATE,
        ) {
            warn!(target: targets::WINDOWS, handle = handle.as_raw(), %err, "unable to cover screen");
        }
        if let Some(window) = self.window.upgrade() {
            ctx.post_event(
                &window,
                WindowSystemEvent::GeometryChanged {
                    window: window.id(),
                    geometry: self.data.get().geometry,
                },
            );
        }
    }

    fn leave_fullscreen(
        &self,
        ctx: &PlatformContext,
        handle: NativeHandle,
        new_state: WindowState,
        visible: bool,
    ) {
        let host = ctx.host();
        let mut style = self.saved_style.get().unwrap_or_else(|| host.style(handle));
        if visible {
            style |= WindowStyle::VISIBLE;
        }
        self.set_style(ctx, style);

        // The screen the frame was saved on may be gone.
        let mut saved_frame = self.saved_frame_geometry.get();
        if let Some(frame) = saved_frame {
            let screen = self
                .window
                .upgrade()
                .and_then(|w| ctx.screen_for_window(&w));
            if let Some(screen) = screen {
                if !screen.geometry.intersects(&frame) {
                    saved_frame = Some(frame.moved_to(screen.geometry.top_left()));
                }
            }
        }

        if new_state == WindowState::Minimized {
            if let Some(frame) = saved_frame {
                let offset = window_placement_offset(host, handle, frame.top_left());
                let placement = WindowPlacement {
                    show_command: ShowCommand::ShowMinimized,
                    normal_position: frame.translated(-offset),
                };
                if let Err(err) = host.set_placement(handle, &placement) {
                    debug!(target: targets::WINDOWS, %err, "unable to store minimized geometry");
                }
            }
            if visible {
                host.show_window(handle, ShowCommand::Minimize);
            }
        } else {
            let mut flags = SwpFlags::FRAME_CHANGED
                | SwpFlags::NO_ZORDER
                | SwpFlags::NO_OWNER_ZORDER
                | SwpFlags::NO_ACTIVATE;
            if saved_frame.is_none() {
                flags |= SwpFlags::NO_SIZE | SwpFlags::NO_MOVE;
            }
            // A maximized window ignores the position change.
            if native_visibility(host, handle) == Visibility::Maximized {
                host.show_window(handle, ShowCommand::ShowNoActivate);
            }
            if let Err(err) = host.set_window_pos(handle, None, saved_frame.unwrap_or_default(), flags) {
                warn!(target: targets::WINDOWS, handle = handle.as_raw(), %err, "unable to restore frame");
            }
            if visible {
                if new_state == WindowState::Maximized {
                    self.show_with_maximize_fixup(ctx, ShowCommand::Maximize);
                } else {
                    self.set_flag(PlatformWindowFlags::WITHIN_MAXIMIZE, true);
                    host.show_window(handle, ShowCommand::ShowNa);
                    self.set_flag(PlatformWindowFlags::WITHIN_MAXIMIZE, false);
                }
            }
        }
        self.saved_style.set(None);
        self.saved_frame_geometry.set(None);
    }

    /// Shows with `command`, temporarily adding a maximize box to titled
    /// windows that lack one. The system refuses to maximize those.
    pub(crate) fn show_with_maximize_fixup(&self, ctx: &PlatformContext, command: ShowCommand) {
        let Some(handle) = self.handle() else {
            return;
        };
        let host = ctx.host();
        let flags = self.data.get().flags;
        let needs_fixup = flags.has_title()
            && !flags.is_frameless()
            && !host.style(handle).contains(WindowStyle::MAXIMIZE_BOX);
        if needs_fixup {
            self.set_style(ctx, host.style(handle) | WindowStyle::MAXIMIZE_BOX);
        }
        self.set_flag(PlatformWindowFlags::WITHIN_MAXIMIZE, true);
        host.show_window(handle, command);
        self.set_flag(PlatformWindowFlags::WITHIN_MAXIMIZE, false);
        if needs_fixup {
            self.set_style(ctx, host.style(handle) - WindowStyle::MAXIMIZE_BOX);
            if let Err(err) = host.set_window_pos(
                handle,
                None,
                Rect::default(),
                SwpFlags::NO_ACTIVATE
                    | SwpFlags::NO_MOVE
                    | SwpFlags::NO_SIZE
                    | SwpFlags::NO_ZORDER
                    | SwpFlags::NO_OWNER_ZORDER
                    | SwpFlags::FRAME_CHANGED,
            ) {
                debug!(target: targets::WINDOWS, %err, "frame refresh failed");
            }
        }
    }

    /// Records a state change the system made and tells the toolkit.
    pub(crate) fn handle_window_state_change(&self, ctx: &PlatformContext, state: WindowState) {
        let Some(window) = self.window.upgrade() else {
            return;
        };
        debug!(
            target: targets::EVENTS,
            handle = ?self.handle().map(NativeHandle::as_raw),
            from = ?self.state.get(),
            to = ?state,
            "window state changed"
        );
        self.frame.invalidate();
        self.state.set(state);
        ctx.post_event(
            &window,
            WindowSystemEvent::StateChanged {
                window: window.id(),
                state,
            },
        );
        if state.is_minimized() {
            self.handle_hidden(ctx);
            return;
        }
        // Layered windows are not repainted on restore.
        if self.is_layered(ctx) {
            self.fire_full_expose(ctx, false);
        }
        for other in ctx.owned_windows() {
            let Some(child) = other.window() else {
                continue;
            };
            let is_transient_child = child
                .transient_parent()
                .is_some_and(|tp| tp.id() == window.id());
            if is_transient_child && child.is_visible() && other.is_layered(ctx) {
                other.fire_full_expose(ctx, false);
            }
        }
    }

    /// Writes the native style. Size messages caused by the change are not
    /// reported as state changes.
    pub fn set_style(&self, ctx: &PlatformContext, style: WindowStyle) {
        let Some(handle) = self.handle() else {
            return;
        };
        debug!(target: targets::WINDOWS, handle = handle.as_raw(), ?style, "set style");
        self.set_flag(PlatformWindowFlags::WITHIN_SET_STYLE, true);
        ctx.host().set_style(handle, style);
        self.set_flag(PlatformWindowFlags::WITHIN_SET_STYLE, false);
        self.frame.invalidate();
    }

    /// Writes the native extended style.
    pub fn set_ex_style(&self, ctx: &PlatformContext, ex_style: WindowExStyle) {
        let Some(handle) = self.handle() else {
            return;
        };
        debug!(target: targets::WINDOWS, handle = handle.as_raw(), ?ex_style, "set ex style");
        ctx.host().set_ex_style(handle, ex_style);
        self.frame.invalidate();
    }

    /// Whether full screen keeps a one pixel border.
    pub fn has_border_in_fullscreen(&self) -> bool {
        self.test_flag(PlatformWindowFlags::HAS_BORDER_IN_FULL_SCREEN)
    }

    /// Keeps a one pixel border while in full screen, which lets other
    /// top-levels appear above the window.
    pub fn set_has_border_in_fullscreen(&self, ctx: &PlatformContext, border: bool) {
        if self.has_border_in_fullscreen() == border {
            return;
        }
        self.set_flag(PlatformWindowFlags::HAS_BORDER_IN_FULL_SCREEN, border);
        if self.state.get().is_fullscreen() {
            if let Some(handle) = self.handle() {
                let mut style = ctx.host().style(handle);
                style.set(WindowStyle::BORDER, border);
                self.set_style(ctx, style);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::config::PlatformOptions;
    use crate::context::PlatformIntegration;
    use crate::host::{HeadlessHost, HostCall, NativeHost};
    use crate::toolkit::{ToolkitWindow, WindowAttributes};
    use crate::window_type::WindowType;

    type Shown = (Rc<HeadlessHost>, PlatformIntegration, Rc<ToolkitWindow>, Rc<PlatformWindow>);

    fn shown(attributes: WindowAttributes) -> Shown {
        let host = Rc::new(HeadlessHost::new());
        let integration = PlatformIntegration::new(host.clone(), PlatformOptions::default());
        let window = ToolkitWindow::new(attributes);
        let pw = integration.create_platform_window(&window).unwrap();
        pw.set_visible(integration.context(), true);
        (host, integration, window, pw)
    }

    #[test]
    fn maximize_and_restore() {
        let (host, integration, window, pw) =
            shown(WindowAttributes::default().with_geometry(Rect::new(100, 100, 400, 300)));
        let ctx = integration.context();

        pw.set_window_state(ctx, WindowState::Maximized);
        assert_eq!(pw.window_state(), WindowState::Maximized);
        assert_eq!(pw.visibility(ctx), Visibility::Maximized);
        assert_eq!(pw.geometry(), Rect::new(0, 23, 1920, 1017));

        pw.set_window_state(ctx, WindowState::Normal);
        assert_eq!(pw.window_state(), WindowState::Normal);
        assert_eq!(window.state(), WindowState::Normal);
        assert_eq!(pw.geometry(), Rect::new(100, 100, 400, 300));
        assert_eq!(pw.visibility(ctx), Visibility::Windowed);
        assert!(!host.style(pw.handle().unwrap()).contains(WindowStyle::MAXIMIZE));
    }

    #[test]
    fn hidden_windows_only_record_state() {
        let host = Rc::new(HeadlessHost::new());
        let integration = PlatformIntegration::new(host.clone(), PlatformOptions::default());
        let window = ToolkitWindow::new(WindowAttributes::default());
        let pw = integration.create_platform_window(&window).unwrap();
        host.clear_calls();
        pw.set_window_state(integration.context(), WindowState::Maximized);
        assert_eq!(pw.window_state(), WindowState::Maximized);
        assert!(!host.calls().iter().any(|c| matches!(c, HostCall::ShowWindow(..))));
    }

    #[test]
    fn dialog_maximize_borrows_maximize_box() {
        let (host, integration, _window, pw) = shown(WindowAttributes::default().with_flags(WindowType::Dialog));
        let handle = pw.handle().unwrap();
        let before = host.style(handle);
        assert!(!before.contains(WindowStyle::MAXIMIZE_BOX));
        host.clear_calls();

        pw.set_window_state(integration.context(), WindowState::Maximized);
        let calls = host.calls();
        let show = calls
            .iter()
            .position(|c| *c == HostCall::ShowWindow(handle, ShowCommand::Maximize))
            .unwrap();
        assert!(matches!(&calls[show - 1], HostCall::SetStyle(_, s) if s.contains(WindowStyle::MAXIMIZE_BOX)));
        assert!(matches!(&calls[show + 1], HostCall::SetStyle(_, s) if !s.contains(WindowStyle::MAXIMIZE_BOX)));
        let after = host.style(handle);
        assert!(!after.contains(WindowStyle::MAXIMIZE_BOX));
        assert_eq!(after - WindowStyle::MAXIMIZE, before);
    }

    #[test]
    fn border_in_fullscreen_toggles_style() {
        let (host, integration, _window, pw) = shown(WindowAttributes::default());
        let ctx = integration.context();
        let handle = pw.handle().unwrap();
        pw.set_window_state(ctx, WindowState::Fullscreen);
        assert!(!host.style(handle).contains(WindowStyle::BORDER));
        pw.set_has_border_in_fullscreen(ctx, true);
        assert!(host.style(handle).contains(WindowStyle::BORDER));
        pw.set_has_border_in_fullscreen(ctx, false);
        assert!(!host.style(handle).contains(WindowStyle::BORDER));
    }

    #[test]
    fn leaving_fullscreen_to_minimized_stores_restore_rect() {
        let (host, integration, _window, pw) =
            shown(WindowAttributes::default().with_geometry(Rect::new(100, 100, 400, 300)));
        let ctx = integration.context();
        let handle = pw.handle().unwrap();
        pw.set_window_state(ctx, WindowState::Fullscreen);
        pw.set_window_state(ctx, WindowState::Minimized);
        assert!(host.is_iconic(handle));
        assert_eq!(host.window(handle).unwrap().normal_rect, Rect::new(92, 69, 416, 339));
        assert_eq!(pw.saved_style(), None);
        assert_eq!(pw.normal_geometry(ctx), Rect::new(100, 100, 400, 300));
    }
}
