//! Native style derivation and window creation.
//!
//! Creating or reconfiguring a native window is a two step affair. First
//! [`WindowCreationSpec::derive`] classifies a toolkit window and computes the
//! native style bits from its type and hints. Then
//! [`WindowCreationSpec::materialize`] either creates a new native window from
//! the derived styles or applies them to an existing one, followed by the common
//! post-creation setup (z-order, system menu, opacity).
//!
//! The system sends size negotiation messages while the create call is still
//! running, before the new handle is registered anywhere. A
//! [`WindowCreationContext`] is therefore published on the platform context
//! for the duration of the call so the dispatcher can answer them.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::{debug, warn};

use crate::context::{CreationScope, PlatformContext};
use crate::geometry::{Margins, Point, Rect, Size, WINDOW_SIZE_MAX};
use crate::geometry_hint::GeometryHint;
use crate::host::{InsertAfter, MinMaxInfo, NativeCreateParams, NativeHandle, NativeHost, SwpFlags};
use crate::logging::targets;
use crate::style::{WindowExStyle, WindowStyle};
use crate::toolkit::ToolkitWindow;
use crate::window::properties::set_window_opacity;
use crate::window_type::{WindowFlags, WindowHints, WindowType};

/// Overrides the top-level classification of a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CreationMode {
    /// Top-level when the toolkit window has no parent.
    #[default]
    Default,
    ForceChild,
    ForceTopLevel,
}

/// Supplies default decorations to top-level flags that carry none and makes
/// splash screens frameless.
pub fn fix_top_level_window_flags(flags: WindowFlags) -> WindowFlags {
    let mut flags = flags;
    if !flags.has(WindowHints::DECORATIONS) {
        if let Some(decorations) = flags.window_type().default_decorations() {
            flags = flags.with_hints(decorations);
        }
    }
    if flags.window_type() == WindowType::SplashScreen {
        flags = flags.with_hints(WindowHints::FRAMELESS);
    }
    flags
}

/// Whether a maximize box belongs in the native style.
///
/// An explicitly customized window keeps its maximize button even with a
/// bounded maximum size.
pub fn should_show_maximize_button(window: &ToolkitWindow, flags: WindowFlags) -> bool {
    if flags.has(WindowHints::FIXED_SIZE_DIALOG) || !flags.has(WindowHints::MAXIMIZE_BUTTON) {
        return false;
    }
    flags.has(WindowHints::CUSTOMIZE)
        || window.maximum_size() == Size::new(WINDOW_SIZE_MAX, WINDOW_SIZE_MAX)
}

/// Native-side data of a window, as produced by creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowData {
    pub flags: WindowFlags,
    /// Client geometry.
    pub geometry: Rect,
    /// Frame margins at creation time.
    pub frame: Margins,
    pub custom_margins: Margins,
    pub handle: Option<NativeHandle>,
    pub embedded: bool,
}

/// Result of a native create call.
///
/// Holds the published creation context until the owning platform window
/// takes the data with [`CreatedWindow::finish`]. Dropping it without
/// finishing clears the context too.
pub struct CreatedWindow<'ctx> {
    data: WindowData,
    scope: CreationScope<'ctx>,
}

impl CreatedWindow<'_> {
    pub fn data(&self) -> &WindowData {
        &self.data
    }

    /// Clears the creation context and returns the window data.
    pub fn finish(self) -> WindowData {
        let CreatedWindow { data, scope } = self;
        drop(scope);
        data
    }
}

/// Size negotiation state for a window whose create call is in flight.
#[derive(Debug, Clone)]
pub struct WindowCreationContext {
    pub window: Weak<ToolkitWindow>,
    pub geometry_hint: GeometryHint,
    pub style: WindowStyle,
    pub ex_style: WindowExStyle,
    pub requested_geometry: Rect,
    pub obtained_geometry: Rect,
    pub margins: Margins,
    pub custom_margins: Margins,
    /// Frame rectangle passed to the create call. `None` lets the system choose.
    pub frame_x: Option<i32>,
    pub frame_y: Option<i32>,
    pub frame_width: Option<i32>,
    pub frame_height: Option<i32>,
}

impl WindowCreationContext {
    pub fn new(
        host: &dyn NativeHost,
        window: &Rc<ToolkitWindow>,
        geometry: Rect,
        custom_margins: Margins,
        style: WindowStyle,
        ex_style: WindowExStyle,
    ) -> Self {
        let margins = GeometryHint::frame(host, style, ex_style);
        let mut context = Self {
            window: Rc::downgrade(window),
            geometry_hint: GeometryHint::from_window(window, custom_margins),
            style,
            ex_style,
            requested_geometry: geometry,
            obtained_geometry: geometry,
            margins,
            custom_margins,
            frame_x: None,
            frame_y: None,
            frame_width: None,
            frame_height: None,
        };
        // Top-level geometry excludes the frame. (0,0) on a top-level means
        // the default position.
        if geometry.is_valid() {
            let effective = margins + custom_margins;
            let mut x = geometry.x;
            let mut y = geometry.y;
            context.frame_width = Some(effective.horizontal() + geometry.width);
            context.frame_height = Some(effective.vertical() + geometry.height);
            let is_default_position = x == 0 && y == 0 && window.is_top_level();
            if !GeometryHint::position_includes_frame(window) && !is_default_position {
                x -= effective.left;
                y -= effective.top;
            }
            context.frame_x = Some(x);
            context.frame_y = Some(y);
        }
        debug!(
            target: targets::CREATION,
            ?geometry,
            frame_x = ?context.frame_x,
            frame_y = ?context.frame_y,
            frame_width = ?context.frame_width,
            frame_height = ?context.frame_height,
            min = ?context.geometry_hint.minimum_size,
            max = ?context.geometry_hint.maximum_size,
            ?custom_margins,
            "creation context"
        );
        context
    }

    pub fn apply_to_size_constraints(&self, host: &dyn NativeHost, info: &mut MinMaxInfo) {
        self.geometry_hint
            .apply_to_size_constraints(host, self.style, self.ex_style, info);
    }

    /// Records the client geometry for a frame reported during creation.
    pub fn update_obtained_geometry(&mut self, frame: Rect) {
        self.obtained_geometry = frame.margins_removed(self.margins + self.custom_margins);
    }
}

/// The geometry a newly created window gets.
///
/// Empty extents fall back to the minimum size or the configured default.
/// Automatically placed top-levels are centered over their transient parent
/// or on the available screen area, unless they would nearly fill it.
pub fn initial_geometry(ctx: &PlatformContext, window: &ToolkitWindow, requested: Rect) -> Rect {
    let options = ctx.options();
    let minimum = window.minimum_size();
    let mut rect = requested;
    if rect.width <= 0 {
        rect.width = if minimum.width > 0 {
            minimum.width
        } else {
            options.default_window_width
        };
    }
    if rect.height <= 0 {
        rect.height = if minimum.height > 0 {
            minimum.height
        } else {
            options.default_window_height
        };
    }
    let automatic = window.attributes().position_automatic;
    if window.is_top_level() && automatic && window.window_type() != WindowType::Popup {
        if let Some(screen) = ctx.screen_for_window(window) {
            let available = screen.available_geometry;
            if rect.height < (available.height * 8) / 9 && rect.width < (available.width * 8) / 9 {
                let center = match window.transient_parent() {
                    Some(parent) => parent.geometry().center(),
                    None => available.center(),
                };
                rect = rect.moved_to(center - Point::new(rect.width / 2, rect.height / 2));
            }
        }
    }
    rect
}

/// Native classification and style of a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowCreationSpec {
    pub flags: WindowFlags,
    pub parent_handle: Option<NativeHandle>,
    pub window_type: WindowType,
    pub style: WindowStyle,
    pub ex_style: WindowExStyle,
    pub top_level: bool,
    pub popup: bool,
    pub dialog: bool,
    pub tool: bool,
    pub embedded: bool,
    pub has_alpha: bool,
}

/// What [`WindowCreationSpec::materialize`] produces a native window for.
pub enum MaterializeTarget<'a> {
    /// Create a new native window.
    Create { data: &'a WindowData, title: String },
    /// Apply the derived styles to an existing window.
    Reconfigure { handle: NativeHandle, opacity: f64 },
}

/// Output of [`WindowCreationSpec::materialize`].
pub enum Materialized<'ctx> {
    Created(CreatedWindow<'ctx>),
    Reconfigured,
}

impl WindowCreationSpec {
    /// Classifies `window` and computes its native style.
    pub fn derive(window: &ToolkitWindow, flags_in: WindowFlags, mode: CreationMode) -> Self {
        let embedded_parent = window.attributes().embedded_native_parent;
        let embedded = embedded_parent.is_some();
        let top_level = match mode {
            CreationMode::ForceChild => false,
            // Embedded windows are never top-level even without a toolkit parent.
            _ if embedded => false,
            CreationMode::ForceTopLevel => true,
            CreationMode::Default => window.is_top_level(),
        };

        let mut flags = flags_in;
        if top_level {
            flags = fix_top_level_window_flags(flags);
        }

        let window_type = flags.window_type();
        let popup = window_type == WindowType::Popup;
        let dialog = window_type.is_dialog() || flags.has(WindowHints::FIXED_SIZE_DIALOG);
        let tool = window_type.is_tool();

        let mut parent_handle = embedded_parent;
        if popup {
            flags = flags.with_hints(WindowHints::STAYS_ON_TOP);
        } else if !embedded {
            let parent = if top_level {
                window.transient_parent()
            } else {
                window.parent()
            };
            parent_handle = parent.and_then(|p| p.native_handle());
        }

        let frameless = flags.is_frameless();
        let mut style = if popup || window_type.is_popup_like() {
            WindowStyle::POPUP
        } else if top_level {
            if frameless {
                WindowStyle::POPUP
            } else {
                // A titled window starts overlapped, which has no bits.
                WindowStyle::OVERLAPPED
            }
        } else {
            WindowStyle::CHILD
        };
        style |= WindowStyle::CLIP_SIBLINGS | WindowStyle::CLIP_CHILDREN;

        let mut ex_style = WindowExStyle::empty();
        if top_level {
            if window_type == WindowType::Window || dialog || tool {
                if !frameless {
                    style |= WindowStyle::POPUP;
                    if flags.has(WindowHints::FIXED_SIZE_DIALOG) {
                        style |= WindowStyle::DLG_FRAME;
                    } else {
                        style |= WindowStyle::THICK_FRAME;
                    }
                    if flags.has_title() {
                        style |= WindowStyle::CAPTION;
                    }
                }
                if flags.has(WindowHints::SYSTEM_MENU) {
                    style |= WindowStyle::SYS_MENU;
                } else if dialog && flags.has(WindowHints::CLOSE_BUTTON) && !frameless {
                    // Dialogs without a system menu still need one for the close button.
                    style |= WindowStyle::SYS_MENU | WindowStyle::BORDER;
                    ex_style |= WindowExStyle::DLG_MODAL_FRAME;
                }
                if flags.has(WindowHints::MINIMIZE_BUTTON) {
                    style |= WindowStyle::MINIMIZE_BOX;
                }
                if should_show_maximize_button(window, flags) {
                    style |= WindowStyle::MAXIMIZE_BOX;
                }
                if tool {
                    ex_style |= WindowExStyle::TOOL_WINDOW;
                }
                if flags.has(WindowHints::CONTEXT_HELP_BUTTON) {
                    ex_style |= WindowExStyle::CONTEXT_HELP;
                }
            } else {
                ex_style |= WindowExStyle::TOOL_WINDOW;
            }
            if flags_in.has(WindowHints::TRANSPARENT_FOR_INPUT) {
                ex_style |= WindowExStyle::LAYERED | WindowExStyle::TRANSPARENT;
            }
        }

        let spec = Self {
            flags,
            parent_handle,
            window_type,
            style,
            ex_style,
            top_level,
            popup,
            dialog,
            tool,
            embedded,
            has_alpha: window.has_alpha(),
        };
        debug!(target: targets::CREATION, ?spec, "derived window style");
        spec
    }

    /// Creates the native window or reapplies the styles to an existing one,
    /// then runs post-creation setup.
    pub fn materialize<'ctx>(
        &self,
        ctx: &'ctx PlatformContext,
        window: &Rc<ToolkitWindow>,
        target: MaterializeTarget<'_>,
    ) -> Materialized<'ctx> {
        match target {
            MaterializeTarget::Create { data, title } => {
                let created = self.create(ctx, window, data, title);
                if let Some(handle) = created.data().handle {
                    let frame_change = !created.data().custom_margins.is_null();
                    self.initialize(ctx, window, handle, frame_change, 1.0);
                }
                Materialized::Created(created)
            }
            MaterializeTarget::Reconfigure { handle, opacity } => {
                self.apply_window_flags(ctx.host(), handle);
                self.initialize(ctx, window, handle, true, opacity);
                Materialized::Reconfigured
            }
        }
    }

    /// Issues the native create call.
    ///
    /// Failure is logged and yields data without a handle.
    pub fn create<'ctx>(
        &self,
        ctx: &'ctx PlatformContext,
        window: &Rc<ToolkitWindow>,
        data: &WindowData,
        title: String,
    ) -> CreatedWindow<'ctx> {
        let options = ctx.options();
        let rect = initial_geometry(ctx, window, data.geometry);

        let mut title = title;
        if title.is_empty() && self.flags.has_title() {
            title = if self.top_level {
                options.application_name.clone()
            } else {
                window.attributes().object_name.clone()
            };
        }

        let context = Rc::new(RefCell::new(WindowCreationContext::new(
            ctx.host(),
            window,
            rect,
            data.custom_margins,
            self.style,
            self.ex_style,
        )));
        let scope = ctx.begin_creation(Rc::clone(&context));

        let params = {
            let c = context.borrow();
            NativeCreateParams {
                class_name: options.window_class_name.clone(),
                title,
                style: self.style,
                ex_style: self.ex_style,
                x: c.frame_x,
                y: c.frame_y,
                width: c.frame_width,
                height: c.frame_height,
                parent: self.parent_handle,
            }
        };
        debug!(target: targets::CREATION, ?params, requested = ?rect, "creating native window");

        let mut result = WindowData {
            flags: self.flags,
            ..WindowData::default()
        };
        match ctx.host().create_window(&params) {
            Ok(handle) => {
                let c = context.borrow();
                result.handle = Some(handle);
                result.geometry = c.obtained_geometry;
                result.frame = c.margins;
                result.embedded = self.embedded;
                result.custom_margins = c.custom_margins;
                debug!(
                    target: targets::CREATION,
                    handle = handle.as_raw(),
                    obtained = ?c.obtained_geometry,
                    margins = ?c.margins,
                    "native window created"
                );
            }
            Err(err) => {
                warn!(target: targets::CREATION, %err, class = %params.class_name, "native window creation failed");
            }
        }
        CreatedWindow {
            data: result,
            scope,
        }
    }

    /// Writes the derived styles to an existing window, keeping its enabled
    /// and visible bits.
    pub fn apply_window_flags(&self, host: &dyn NativeHost, handle: NativeHandle) {
        let old_style = host.style(handle);
        let old_ex_style = host.ex_style(handle);
        let new_style =
            self.style | (old_style & (WindowStyle::DISABLED | WindowStyle::VISIBLE));
        if old_style != new_style {
            host.set_style(handle, new_style);
        }
        if self.ex_style != old_ex_style {
            host.set_ex_style(handle, self.ex_style);
        }
        debug!(
            target: targets::CREATION,
            handle = handle.as_raw(),
            ?old_style,
            ?new_style,
            ?old_ex_style,
            new_ex_style = ?self.ex_style,
            "applied window flags"
        );
    }

    /// Post-creation setup: z-order band, close menu item, opacity.
    pub fn initialize(
        &self,
        ctx: &PlatformContext,
        window: &ToolkitWindow,
        handle: NativeHandle,
        frame_change: bool,
        opacity: f64,
    ) {
        let host = ctx.host();
        let mut swp = SwpFlags::NO_MOVE | SwpFlags::NO_SIZE;
        if frame_change {
            swp |= SwpFlags::FRAME_CHANGED;
        }
        if !self.top_level {
            log_failure(host.set_window_pos(handle, Some(InsertAfter::Top), Rect::default(), swp));
            return;
        }

        swp |= SwpFlags::NO_ACTIVATE;
        if self.flags.stays_on_top() || self.window_type == WindowType::ToolTip {
            log_failure(host.set_window_pos(handle, Some(InsertAfter::TopMost), Rect::default(), swp));
            if self.flags.stays_on_bottom() {
                warn!(
                    target: targets::CREATION,
                    "incompatible window flags: a window cannot stay on top and on bottom at the same time"
                );
            }
        } else if self.flags.stays_on_bottom() {
            log_failure(host.set_window_pos(handle, Some(InsertAfter::Bottom), Rect::default(), swp));
        } else if frame_change {
            // Forces a non-client recalculation for custom margins.
            log_failure(host.set_window_pos(handle, Some(InsertAfter::NoTopMost), Rect::default(), swp));
        }

        if self.flags.has(WindowHints::CUSTOMIZE | WindowHints::TITLE) {
            host.enable_close_menu_item(handle, self.flags.has(WindowHints::CLOSE_BUTTON));
        }

        let accelerated = window.is_opengl();
        if accelerated && self.has_alpha {
            if let Err(err) = host.enable_blur_behind(handle) {
                debug!(target: targets::CREATION, %err, "blur behind unavailable");
            }
        }
        set_window_opacity(host, handle, self.flags, self.has_alpha, accelerated, opacity);
    }
}

fn log_failure(result: crate::error::PlatformResult<()>) {
    if let Err(err) = result {
        debug!(target: targets::CREATION, %err, "native call failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolkit::WindowAttributes;

    fn derive(attributes: WindowAttributes) -> WindowCreationSpec {
        let window = ToolkitWindow::new(attributes);
        let flags = window.flags();
        WindowCreationSpec::derive(&window, flags, CreationMode::Default)
    }

    #[test]
    fn plain_window_gets_overlapped_decorations() {
        let spec = derive(WindowAttributes::default());
        assert!(spec.top_level);
        assert!(spec.style.contains(
            WindowStyle::POPUP
                | WindowStyle::THICK_FRAME
                | WindowStyle::CAPTION
                | WindowStyle::SYS_MENU
                | WindowStyle::MINIMIZE_BOX
                | WindowStyle::MAXIMIZE_BOX
                | WindowStyle::CLIP_CHILDREN
                | WindowStyle::CLIP_SIBLINGS
        ));
        assert!(spec.ex_style.is_empty());
    }

    #[test]
    fn dialog_defaults_include_context_help() {
        let spec = derive(WindowAttributes::default().with_flags(WindowType::Dialog));
        assert!(spec.dialog);
        assert!(spec.flags.has(WindowHints::TITLE));
        assert!(spec.flags.has(WindowHints::SYSTEM_MENU));
        assert!(spec.flags.has(WindowHints::CONTEXT_HELP_BUTTON));
        assert!(spec.flags.has(WindowHints::CLOSE_BUTTON));
        assert!(spec.style.contains(WindowStyle::CAPTION | WindowStyle::SYS_MENU));
        assert!(!spec.style.contains(WindowStyle::MAXIMIZE_BOX));
        assert!(spec.ex_style.contains(WindowExStyle::CONTEXT_HELP));
    }

    #[test]
    fn dialog_close_without_system_menu_forces_menu_and_border() {
        let flags = WindowFlags::new(WindowType::Dialog)
            .with_hints(WindowHints::TITLE | WindowHints::CLOSE_BUTTON);
        let spec = derive(WindowAttributes::default().with_flags(flags));
        assert!(spec.style.contains(WindowStyle::SYS_MENU | WindowStyle::BORDER));
        assert!(spec.ex_style.contains(WindowExStyle::DLG_MODAL_FRAME));
    }

    #[test]
    fn fixed_size_dialog_uses_dialog_frame() {
        let flags = WindowFlags::new(WindowType::Window)
            .with_hints(WindowHints::TITLE | WindowHints::MAXIMIZE_BUTTON | WindowHints::FIXED_SIZE_DIALOG);
        let spec = derive(WindowAttributes::default().with_flags(flags));
        assert!(spec.dialog);
        assert!(spec.style.contains(WindowStyle::DLG_FRAME));
        assert!(!spec.style.contains(WindowStyle::THICK_FRAME));
        assert!(!spec.style.contains(WindowStyle::MAXIMIZE_BOX));
    }

    #[test]
    fn bounded_maximum_hides_maximize_box_unless_customized() {
        let bounded = WindowAttributes::default().with_maximum_size(Size::new(800, 600));
        assert!(!derive(bounded.clone()).style.contains(WindowStyle::MAXIMIZE_BOX));

        let flags = WindowFlags::new(WindowType::Window).with_hints(
            WindowHints::CUSTOMIZE | WindowHints::TITLE | WindowHints::MAXIMIZE_BUTTON,
        );
        assert!(derive(bounded.with_flags(flags)).style.contains(WindowStyle::MAXIMIZE_BOX));
    }

    #[test]
    fn popup_is_parentless_and_stays_on_top() {
        let owner = ToolkitWindow::new(WindowAttributes::default());
        owner.set_native_handle(NativeHandle::from_raw(0x42));
        let popup = ToolkitWindow::new(WindowAttributes::default().with_flags(WindowType::Popup));
        popup.set_transient_parent(Some(&owner));
        let spec = WindowCreationSpec::derive(&popup, popup.flags(), CreationMode::Default);
        assert!(spec.popup);
        assert!(spec.flags.stays_on_top());
        assert_eq!(spec.parent_handle, None);
        assert_eq!(spec.style, WindowStyle::POPUP | WindowStyle::CLIP_SIBLINGS | WindowStyle::CLIP_CHILDREN);
        assert!(spec.ex_style.contains(WindowExStyle::TOOL_WINDOW));
    }

    #[test]
    fn tooltip_keeps_transient_parent() {
        let owner = ToolkitWindow::new(WindowAttributes::default());
        owner.set_native_handle(NativeHandle::from_raw(0x42));
        let tip = ToolkitWindow::new(WindowAttributes::default().with_flags(WindowType::ToolTip));
        tip.set_transient_parent(Some(&owner));
        let spec = WindowCreationSpec::derive(&tip, tip.flags(), CreationMode::Default);
        assert!(!spec.popup);
        assert_eq!(spec.parent_handle, NativeHandle::from_raw(0x42));
        assert!(spec.style.contains(WindowStyle::POPUP));
    }

    #[test]
    fn splash_is_frameless() {
        let spec = derive(WindowAttributes::default().with_flags(WindowType::SplashScreen));
        assert!(spec.flags.is_frameless());
        assert!(!spec.style.intersects(WindowStyle::CAPTION | WindowStyle::THICK_FRAME));
    }

    #[test]
    fn children_get_child_style() {
        let parent = ToolkitWindow::new(WindowAttributes::default());
        parent.set_native_handle(NativeHandle::from_raw(0x42));
        let child = ToolkitWindow::new_child(&parent, WindowAttributes::default().with_flags(WindowType::Widget));
        let spec = WindowCreationSpec::derive(&child, child.flags(), CreationMode::Default);
        assert!(!spec.top_level);
        assert!(spec.style.contains(WindowStyle::CHILD));
        assert_eq!(spec.parent_handle, NativeHandle::from_raw(0x42));

        let forced = WindowCreationSpec::derive(&child, child.flags(), CreationMode::ForceTopLevel);
        assert!(forced.top_level);
    }

    #[test]
    fn transparent_for_input_is_layered() {
        let flags = WindowFlags::new(WindowType::Window)
            .with_hints(WindowHints::TITLE | WindowHints::TRANSPARENT_FOR_INPUT);
        let spec = derive(WindowAttributes::default().with_flags(flags));
        assert!(spec.ex_style.contains(WindowExStyle::LAYERED | WindowExStyle::TRANSPARENT));
    }

    #[test]
    fn embedded_windows_are_children_of_native_parent() {
        let parent = NativeHandle::from_raw(0x77).unwrap();
        let spec = derive(WindowAttributes::default().with_embedded_native_parent(parent));
        assert!(spec.embedded);
        assert!(!spec.top_level);
        assert_eq!(spec.parent_handle, Some(parent));
    }

    #[test]
    fn creation_context_subtracts_margins() {
        let host = crate::host::HeadlessHost::new();
        let window = ToolkitWindow::new(WindowAttributes::default());
        let context = WindowCreationContext::new(
            &host,
            &window,
            Rect::new(100, 100, 400, 300),
            Margins::default(),
            WindowStyle::OVERLAPPED_WINDOW,
            WindowExStyle::empty(),
        );
        assert_eq!(context.frame_x, Some(92));
        assert_eq!(context.frame_y, Some(69));
        assert_eq!(context.frame_width, Some(416));
        assert_eq!(context.frame_height, Some(339));
    }

    #[test]
    fn creation_context_keeps_default_position() {
        let host = crate::host::HeadlessHost::new();
        let window = ToolkitWindow::new(WindowAttributes::default());
        let context = WindowCreationContext::new(
            &host,
            &window,
            Rect::new(0, 0, 400, 300),
            Margins::default(),
            WindowStyle::OVERLAPPED_WINDOW,
            WindowExStyle::empty(),
        );
        assert_eq!((context.frame_x, context.frame_y), (Some(0), Some(0)));

        let invalid = WindowCreationContext::new(
            &host,
            &window,
            Rect::default(),
            Margins::default(),
            WindowStyle::OVERLAPPED_WINDOW,
            WindowExStyle::empty(),
        );
        assert_eq!(invalid.frame_width, None);
    }
}
