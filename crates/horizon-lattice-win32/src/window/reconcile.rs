//! Reconciling native messages with toolkit state.
//!
//! Moves, resizes and state changes can originate from the user, the system
//! or a platform window's own native calls. Changes the window made itself
//! are recognized by the `WITHIN_*` flags and not reported back as state
//! changes.

use tracing::{debug, trace};

use super::{PlatformWindow, PlatformWindowFlags};
use crate::base_window::BaseWindow;
use crate::context::PlatformContext;
use crate::geometry::{Margins, Point, Rect};
use crate::geometry_hint::GeometryHint;
use crate::host::{HitTestResult, MinMaxInfo, NativeMessage, SizeReason, SwpFlags, WindowPos};
use crate::logging::targets;
use crate::state::WindowState;
use crate::toolkit::{ToolkitWindow, WindowSystemEvent};

/// Corrects a pending move or resize of a top-level so that its client
/// area respects the size constraints and height-for-width of `window`.
///
/// `margins` are the frame plus custom margins. Returns `true` when the
/// rectangle was changed.
pub fn handle_geometry_changing_message(
    pos: &mut WindowPos,
    window: &ToolkitWindow,
    margins: Margins,
) -> bool {
    if !window.is_top_level() {
        return false;
    }
    if pos.flags.contains(SwpFlags::NO_SIZE | SwpFlags::NO_COPY_BITS) {
        return false;
    }
    let suggested = pos.rect.margins_removed(margins);
    let hint = GeometryHint::from_window(window, Margins::default());
    let mut size = suggested
        .size()
        .expanded_to(hint.minimum_size)
        .bounded_to(hint.maximum_size);
    let height_for_width = window.attributes().height_for_width;
    if let Some(height_for_width) = height_for_width {
        size.height = height_for_width(size.width)
            .max(hint.minimum_size.height)
            .min(hint.maximum_size.height);
    }
    if size == suggested.size() {
        return false;
    }
    let corrected = Rect::from_origin_size(suggested.top_left(), size).margins_added(margins);
    debug!(
        target: targets::EVENTS,
        suggested = ?pos.rect,
        ?corrected,
        "corrected pending geometry"
    );
    pos.rect = corrected;
    true
}

impl PlatformWindow {
    /// Handles a message addressed to this window. Returns `true` when the
    /// message was consumed.
    pub fn handle_message(&self, ctx: &PlatformContext, message: NativeMessage<'_>) -> bool {
        if self.test_flag(PlatformWindowFlags::WITHIN_DESTROY) {
            return false;
        }
        trace!(
            target: targets::EVENTS,
            handle = ?self.handle().map(|h| h.as_raw()),
            message = message.name(),
            "window message"
        );
        match message {
            NativeMessage::Moved => {
                self.handle_moved(ctx);
                true
            }
            NativeMessage::Resized(reason) => {
                self.handle_resized(ctx, reason);
                true
            }
            NativeMessage::GetMinMaxInfo(info) => {
                self.get_size_hints(ctx, info);
                true
            }
            NativeMessage::NcCalcSize { client } => {
                GeometryHint::handle_calculate_size(self.data.get().custom_margins, client)
            }
            NativeMessage::WindowPosChanging(pos) => self.handle_geometry_changing(ctx, pos),
            NativeMessage::NcHitTest { global_pos, result } => {
                match self.handle_non_client_hit_test(ctx, global_pos) {
                    Some(hit) => {
                        *result = hit;
                        true
                    }
                    None => false,
                }
            }
            NativeMessage::EraseBackground => true,
            NativeMessage::Paint { update_rect } => self.handle_wm_paint(ctx, update_rect),
            NativeMessage::MouseEnter => {
                if let Some(window) = self.window.upgrade() {
                    ctx.set_window_under_mouse(Some(&window));
                }
                self.apply_cursor(ctx);
                true
            }
            NativeMessage::Hidden => {
                self.handle_hidden(ctx);
                true
            }
            NativeMessage::CompositionChanged => {
                self.handle_composition_settings_changed(ctx);
                true
            }
        }
    }

    fn handle_moved(&self, ctx: &PlatformContext) {
        let Some(handle) = self.handle() else {
            return;
        };
        // Minimized windows and windows being reparented report meaningless
        // positions.
        if !ctx.host().is_iconic(handle) && !self.test_flag(PlatformWindowFlags::WITHIN_SET_PARENT) {
            self.handle_geometry_change(ctx);
        }
    }

    fn handle_resized(&self, ctx: &PlatformContext, reason: SizeReason) {
        let programmatic = self.test_flag(PlatformWindowFlags::WITHIN_SET_STYLE)
            || self.test_flag(PlatformWindowFlags::WITHIN_SET_GEOMETRY);
        let report = |state: WindowState| {
            if !programmatic && state != self.state.get() {
                self.handle_window_state_change(ctx, state);
            }
        };
        match reason {
            SizeReason::MaxHide | SizeReason::MaxShow => {}
            SizeReason::Minimized => report(WindowState::Minimized),
            SizeReason::Maximized => {
                report(WindowState::Maximized);
                self.handle_geometry_change(ctx);
            }
            SizeReason::Restored => {
                self.handle_geometry_change(ctx);
                if self.is_fullscreen_sys(ctx) {
                    report(WindowState::Fullscreen);
                } else {
                    report(WindowState::Normal);
                }
            }
        }
    }

    /// Whether the client area exactly covers its screen. Full screen has
    /// no native state, so a restored window of screen size counts.
    fn is_fullscreen_sys(&self, ctx: &PlatformContext) -> bool {
        let host = ctx.host();
        if !self.is_top_level(host) {
            return false;
        }
        let mut geometry = self.geometry_sys(host);
        if self.test_flag(PlatformWindowFlags::HAS_BORDER_IN_FULL_SCREEN) {
            geometry = geometry.margins_added(Margins::uniform(1));
        }
        ctx.screen_for_geometry(geometry)
            .is_some_and(|screen| screen.geometry == geometry)
    }

    /// Reads the geometry back from the system and reports it.
    ///
    /// A shrinking window gets a full expose since the system sends no
    /// paint message for it.
    pub(crate) fn handle_geometry_change(&self, ctx: &PlatformContext) {
        if self.test_flag(PlatformWindowFlags::WITHIN_SET_STYLE) {
            return;
        }
        let Some(window) = self.window.upgrade() else {
            return;
        };
        let previous = self.data.get().geometry;
        let geometry = self.geometry_sys(ctx.host());
        if geometry == previous {
            return;
        }
        self.update_data(|d| d.geometry = geometry);
        self.frame.invalidate();
        debug!(
            target: targets::EVENTS,
            handle = ?self.handle().map(|h| h.as_raw()),
            ?previous,
            ?geometry,
            "geometry changed"
        );
        ctx.post_event(
            &window,
            WindowSystemEvent::GeometryChanged {
                window: window.id(),
                geometry,
            },
        );

        let shrunk = geometry.width <= previous.width && geometry.height <= previous.height;
        if self.is_exposed() && geometry.size() != previous.size() && shrunk {
            self.fire_full_expose(ctx, true);
        }

        if geometry.top_left() != previous.top_left() {
            if let Some(screen) = ctx.screen_for_geometry(geometry) {
                if window.screen() != Some(screen.id) {
                    ctx.post_event(
                        &window,
                        WindowSystemEvent::ScreenChanged {
                            window: window.id(),
                            screen: screen.id,
                        },
                    );
                }
            }
        }
    }

    /// Tells the toolkit which part of the window needs painting. `None`
    /// unexposes the window unless `force` is set.
    pub fn fire_expose(&self, ctx: &PlatformContext, region: Option<Rect>, force: bool) {
        let region = region.filter(|r| !r.is_empty());
        self.set_flag(PlatformWindowFlags::EXPOSED, region.is_some() || force);
        if let Some(window) = self.window.upgrade() {
            ctx.post_event(
                &window,
                WindowSystemEvent::Expose {
                    window: window.id(),
                    region,
                },
            );
        }
    }

    /// Exposes the whole client area.
    pub fn fire_full_expose(&self, ctx: &PlatformContext, force: bool) {
        let size = self.data.get().geometry.size();
        self.fire_expose(ctx, Some(Rect::from_origin_size(Point::default(), size)), force);
    }

    fn handle_wm_paint(&self, ctx: &PlatformContext, update_rect: Option<Rect>) -> bool {
        match update_rect {
            Some(rect) => {
                self.fire_expose(ctx, Some(rect), true);
                true
            }
            None => false,
        }
    }

    pub(crate) fn handle_hidden(&self, ctx: &PlatformContext) {
        self.fire_expose(ctx, None, false);
    }

    fn handle_composition_settings_changed(&self, ctx: &PlatformContext) {
        let Some(window) = self.window.upgrade() else {
            return;
        };
        if let Some(handle) = self.handle() {
            if window.is_opengl() && window.has_alpha() {
                if let Err(err) = ctx.host().enable_blur_behind(handle) {
                    debug!(target: targets::EVENTS, %err, "blur behind unavailable");
                }
            }
        }
    }

    /// Fills in tracking limits from the size constraints.
    fn get_size_hints(&self, ctx: &PlatformContext, info: &mut MinMaxInfo) {
        let Some(window) = self.window.upgrade() else {
            return;
        };
        let host = ctx.host();
        let data = self.data.get();
        let hint = GeometryHint::from_window(&window, data.custom_margins);
        hint.apply_to_size_constraints(host, self.style(host), self.ex_style(host), info);

        // Frameless windows would otherwise maximize over the taskbar. The
        // limits only apply on the primary screen.
        let maximizing = self.test_flag(PlatformWindowFlags::WITHIN_MAXIMIZE)
            || self.state.get().is_minimized();
        if data.flags.is_frameless() && maximizing {
            if let Some(screen) = ctx.screen_for_window(&window).filter(|s| s.is_primary) {
                let available = screen.available_geometry;
                info.max_size = Point::new(available.width, available.height);
                info.max_position = available.top_left() - screen.geometry.top_left();
            }
        }
    }

    fn handle_geometry_changing(&self, ctx: &PlatformContext, pos: &mut WindowPos) -> bool {
        let Some(window) = self.window.upgrade() else {
            return false;
        };
        let host = ctx.host();
        let margins = if self.is_top_level(host) {
            self.frame_margins(host)
        } else {
            Margins::default()
        };
        handle_geometry_changing_message(pos, &window, margins)
    }

    /// Keeps the system from offering resize cursors on the fixed edges of a
    /// window that is fixed in width or height.
    fn handle_non_client_hit_test(
        &self,
        ctx: &PlatformContext,
        global_pos: Point,
    ) -> Option<HitTestResult> {
        let window = self.window.upgrade()?;
        let handle = self.handle()?;
        let host = ctx.host();
        let flags = self.data.get().flags;
        if !window.is_top_level() || !self.state.get().is_normal() || flags.is_frameless() {
            return None;
        }
        let minimum = window.minimum_size();
        let maximum = window.maximum_size();
        if minimum.is_empty() {
            return None;
        }
        let fixed_width = minimum.width == maximum.width;
        let fixed_height = minimum.height == maximum.height;
        if !fixed_width && !fixed_height {
            return None;
        }
        let local = host.screen_to_client(handle, global_pos);
        let size = self.data.get().geometry.size();
        let margins = self.frame_margins(host);
        if fixed_height {
            if local.y >= size.height {
                return Some(HitTestResult::Border);
            }
            if local.y < 0 && local.y < margins.left - margins.top {
                return Some(HitTestResult::Caption);
            }
        }
        if fixed_width && (local.x < 0 || local.x >= size.width) {
            return Some(HitTestResult::Border);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::config::PlatformOptions;
    use crate::context::PlatformIntegration;
    use crate::geometry::Size;
    use crate::host::{HeadlessHost, NativeHandle, NativeHost, ScreenId, ScreenInfo, ShowCommand};
    use crate::toolkit::WindowAttributes;
    use crate::window_type::{WindowFlags, WindowHints, WindowType};

    struct Fixture {
        host: Rc<HeadlessHost>,
        integration: PlatformIntegration,
        window: Rc<ToolkitWindow>,
        pw: Rc<PlatformWindow>,
    }

    fn setup_with_host(host: HeadlessHost, attributes: WindowAttributes) -> Fixture {
        let host = Rc::new(host);
        let integration = PlatformIntegration::new(host.clone(), PlatformOptions::default());
        let window = ToolkitWindow::new(attributes);
        let pw = integration.create_platform_window(&window).unwrap();
        integration.take_events();
        Fixture { host, integration, window, pw }
    }

    fn setup(attributes: WindowAttributes) -> Fixture {
        setup_with_host(HeadlessHost::new(), attributes)
    }

    fn expose_count(events: &[WindowSystemEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, WindowSystemEvent::Expose { region: Some(_), .. }))
            .count()
    }

    #[test]
    fn geometry_change_clamps_to_constraints() {
        let window = ToolkitWindow::new(
            WindowAttributes::default()
                .with_minimum_size(Size::new(200, 100))
                .with_maximum_size(Size::new(800, 600)),
        );
        let margins = Margins::new(8, 31, 8, 8);
        let mut pos = WindowPos {
            rect: Rect::new(0, 0, 116, 89),
            flags: SwpFlags::empty(),
        };
        assert!(handle_geometry_changing_message(&mut pos, &window, margins));
        assert_eq!(pos.rect, Rect::new(0, 0, 216, 139));

        let mut within = WindowPos {
            rect: Rect::new(0, 0, 416, 339),
            flags: SwpFlags::empty(),
        };
        assert!(!handle_geometry_changing_message(&mut within, &window, margins));
    }

    #[test]
    fn geometry_change_applies_height_for_width() {
        let window = ToolkitWindow::new(WindowAttributes::default().with_height_for_width(|w| w / 2));
        let mut pos = WindowPos {
            rect: Rect::new(10, 10, 400, 400),
            flags: SwpFlags::empty(),
        };
        assert!(handle_geometry_changing_message(&mut pos, &window, Margins::default()));
        assert_eq!(pos.rect, Rect::new(10, 10, 400, 200));
    }

    #[test]
    fn shrinking_fires_one_full_expose() {
        let Fixture { host, integration, window, pw } =
            setup(WindowAttributes::default().with_geometry(Rect::new(100, 100, 400, 300)));
        let ctx = integration.context();
        let handle = pw.handle().unwrap();
        pw.set_visible(ctx, true);
        host.simulate_paint(handle, Some(Rect::new(0, 0, 400, 300)));
        integration.take_events();

        host.simulate_user_move(handle, Rect::new(92, 69, 316, 239));
        let events = integration.take_events();
        assert_eq!(expose_count(&events), 1);
        assert!(events.contains(&WindowSystemEvent::Expose {
            window: window.id(),
            region: Some(Rect::new(0, 0, 300, 200)),
        }));

        host.simulate_user_move(handle, Rect::new(92, 69, 516, 439));
        assert_eq!(expose_count(&integration.take_events()), 0);
    }

    #[test]
    fn user_maximize_and_restore_update_state() {
        let Fixture { host, integration, window, pw } =
            setup(WindowAttributes::default().with_geometry(Rect::new(100, 100, 400, 300)));
        let handle = pw.handle().unwrap();
        pw.set_visible(integration.context(), true);

        host.show_window(handle, ShowCommand::Maximize);
        assert_eq!(pw.window_state(), WindowState::Maximized);
        assert_eq!(window.state(), WindowState::Maximized);

        host.show_window(handle, ShowCommand::Minimize);
        assert_eq!(window.state(), WindowState::Minimized);
        assert!(!pw.is_exposed());

        host.show_window(handle, ShowCommand::Restore);
        assert_eq!(window.state(), WindowState::Maximized);
    }

    #[test]
    fn maximizing_to_full_screen_size_stays_maximized() {
        let screen = ScreenInfo {
            id: ScreenId(0),
            geometry: Rect::new(0, 0, 1920, 1080),
            available_geometry: Rect::new(0, 0, 1920, 1080),
            is_primary: true,
            device_pixel_ratio: 1.0,
        };
        let flags = WindowFlags::new(WindowType::Window).with_hints(WindowHints::FRAMELESS);
        let Fixture { host, integration, window, pw } = setup_with_host(
            HeadlessHost::with_screens(vec![screen]),
            WindowAttributes::default()
                .with_flags(flags)
                .with_geometry(Rect::new(100, 100, 400, 300)),
        );
        let handle = pw.handle().unwrap();
        pw.set_visible(integration.context(), true);
        integration.take_events();

        host.show_window(handle, ShowCommand::Maximize);
        assert_eq!(pw.geometry(), Rect::new(0, 0, 1920, 1080));
        assert_eq!(pw.window_state(), WindowState::Maximized);
        assert_eq!(window.state(), WindowState::Maximized);
        assert!(integration.take_events().contains(&WindowSystemEvent::StateChanged {
            window: window.id(),
            state: WindowState::Maximized,
        }));
    }

    #[test]
    fn restoring_to_screen_bounds_counts_as_fullscreen() {
        let flags = WindowFlags::new(WindowType::Window).with_hints(WindowHints::FRAMELESS);
        let Fixture { host, integration, window, pw } = setup(
            WindowAttributes::default()
                .with_flags(flags)
                .with_geometry(Rect::new(100, 100, 400, 300)),
        );
        let handle = pw.handle().unwrap();
        pw.set_visible(integration.context(), true);
        integration.take_events();

        // Indistinguishable from emulated full screen.
        host.simulate_user_move(handle, Rect::new(0, 0, 1920, 1080));
        assert_eq!(pw.window_state(), WindowState::Fullscreen);
        assert_eq!(window.state(), WindowState::Fullscreen);
        assert!(integration.take_events().contains(&WindowSystemEvent::StateChanged {
            window: window.id(),
            state: WindowState::Fullscreen,
        }));
        assert_eq!(pw.saved_style(), None);

        host.simulate_user_move(handle, Rect::new(10, 10, 1900, 1060));
        assert_eq!(pw.window_state(), WindowState::Normal);
        assert_eq!(window.state(), WindowState::Normal);
    }

    #[test]
    fn moving_onto_another_screen_reports_it() {
        let screens = vec![
            ScreenInfo {
                id: ScreenId(0),
                geometry: Rect::new(0, 0, 1920, 1080),
                available_geometry: Rect::new(0, 0, 1920, 1040),
                is_primary: true,
                device_pixel_ratio: 1.0,
            },
            ScreenInfo {
                id: ScreenId(1),
                geometry: Rect::new(1920, 0, 1920, 1080),
                available_geometry: Rect::new(1920, 0, 1920, 1080),
                is_primary: false,
                device_pixel_ratio: 1.0,
            },
        ];
        let Fixture { host, integration, window, pw } = setup_with_host(
            HeadlessHost::with_screens(screens),
            WindowAttributes::default().with_geometry(Rect::new(100, 100, 400, 300)),
        );
        let handle = pw.handle().unwrap();
        assert_eq!(window.screen(), Some(ScreenId(0)));

        host.simulate_user_move(handle, Rect::new(2012, 69, 416, 339));
        assert_eq!(pw.geometry(), Rect::new(2020, 100, 400, 300));
        assert!(integration.take_events().contains(&WindowSystemEvent::ScreenChanged {
            window: window.id(),
            screen: ScreenId(1),
        }));
        assert_eq!(window.screen(), Some(ScreenId(1)));

        host.simulate_user_move(handle, Rect::new(2112, 69, 416, 339));
        let events = integration.take_events();
        assert!(!events.iter().any(|e| matches!(e, WindowSystemEvent::ScreenChanged { .. })));
    }

    #[test]
    fn frameless_maximize_respects_taskbar() {
        let flags = WindowFlags::new(WindowType::Window).with_hints(WindowHints::FRAMELESS);
        let Fixture { host, integration, window: _window, pw } = setup(
            WindowAttributes::default()
                .with_flags(flags)
                .with_geometry(Rect::new(100, 100, 400, 300)),
        );
        pw.set_visible(integration.context(), true);
        pw.set_window_state(integration.context(), WindowState::Maximized);
        assert_eq!(host.window_rect(pw.handle().unwrap()).unwrap(), Rect::new(0, 0, 1920, 1040));
        assert_eq!(pw.geometry(), Rect::new(0, 0, 1920, 1040));
    }

    fn hit_test(host: &HeadlessHost, handle: NativeHandle, global_pos: Point) -> Option<HitTestResult> {
        let mut result = HitTestResult::Nowhere;
        let handled = host.send(handle, NativeMessage::NcHitTest { global_pos, result: &mut result });
        handled.then_some(result)
    }

    #[test]
    fn fixed_height_window_hides_vertical_resize_edges() {
        let Fixture { host, integration, window: _window, pw } = setup(
            WindowAttributes::default()
                .with_geometry(Rect::new(100, 100, 400, 300))
                .with_minimum_size(Size::new(200, 300))
                .with_maximum_size(Size::new(800, 300)),
        );
        let handle = pw.handle().unwrap();
        pw.set_visible(integration.context(), true);
        let below = Point::new(300, 405);
        let inside = Point::new(300, 250);

        host.set_foreground(Some(handle));
        assert_eq!(hit_test(&host, handle, below), Some(HitTestResult::Border));
        assert_eq!(hit_test(&host, handle, inside), None);

        // Activation does not matter.
        host.set_foreground(None);
        assert!(!pw.is_active(integration.context()));
        assert_eq!(hit_test(&host, handle, below), Some(HitTestResult::Border));
    }

    #[test]
    fn destroyed_windows_ignore_messages() {
        let Fixture { host, integration, window: _window, pw } = setup(WindowAttributes::default());
        let handle = pw.handle().unwrap();
        pw.set_flag(PlatformWindowFlags::WITHIN_DESTROY, true);
        assert!(!pw.handle_message(integration.context(), NativeMessage::EraseBackground));
        pw.set_flag(PlatformWindowFlags::WITHIN_DESTROY, false);
        assert!(host.send(handle, NativeMessage::EraseBackground));
    }
}
