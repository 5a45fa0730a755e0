//! In-memory window system.
//!
//! [`HeadlessHost`] keeps a table of simulated windows and answers every
//! [`NativeHost`] call from it. Size and move notifications are delivered to
//! the event sink the way the real system delivers them, synchronously and
//! from inside the mutating call. Every mutating call is appended to a call
//! log that tests can inspect.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Weak;

use image::RgbaImage;
use tracing::trace;

use super::{
    DeviceContext, DropTargetHandle, FlashRequest, IconHandle, InsertAfter, MinMaxInfo,
    NativeCreateParams, NativeEventSink, NativeHandle, NativeHost, NativeMessage, ResizeEdge,
    ScreenId, ScreenInfo, ShowCommand, SizeReason, SwpFlags, WindowPlacement, WindowPos,
};
use crate::cursor::WindowCursor;
use crate::error::{PlatformError, PlatformResult};
use crate::geometry::{Margins, Point, Rect, Size};
use crate::icon::IconKind;
use crate::logging::targets;
use crate::mask::WindowMask;
use crate::style::{WindowExStyle, WindowStyle};

const CAPTION_HEIGHT: i32 = 23;
const SMALL_CAPTION_HEIGHT: i32 = 17;
const SIZING_BORDER: i32 = 8;
const FIXED_BORDER: i32 = 3;
const CLIENT_EDGE: i32 = 2;
const MIN_TRACK_SIZE: Point = Point::new(136, 39);
const DEFAULT_POSITION: Point = Point::new(100, 100);
const DEFAULT_SIZE: Size = Size::new(640, 480);
const MINIMIZED_POSITION: Point = Point::new(-32000, -32000);
const MINIMIZED_SIZE: Size = Size::new(160, 28);

/// A mutating call recorded by [`HeadlessHost`].
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    CreateWindow(NativeCreateParams),
    DestroyWindow(NativeHandle),
    SetStyle(NativeHandle, WindowStyle),
    SetExStyle(NativeHandle, WindowExStyle),
    SetWindowPos {
        handle: NativeHandle,
        insert_after: Option<InsertAfter>,
        rect: Rect,
        flags: SwpFlags,
    },
    MoveWindow(NativeHandle, Rect),
    SetPlacement(NativeHandle, WindowPlacement),
    ShowWindow(NativeHandle, ShowCommand),
    SetParent(NativeHandle, Option<NativeHandle>),
    SetOwner(NativeHandle, Option<NativeHandle>),
    SetTitle(NativeHandle, String),
    EnableCloseMenuItem(NativeHandle, bool),
    SetLayeredAttributes(NativeHandle, u8),
    UpdateLayeredWindow(NativeHandle, u8),
    EnableBlurBehind(NativeHandle),
    Invalidate(NativeHandle),
    SetWindowRegion(NativeHandle, Option<WindowMask>),
    SetCapture(NativeHandle),
    ReleaseCapture,
    Activate { handle: NativeHandle, force: bool },
    SetCursor(WindowCursor),
    CreateIcon(IconHandle),
    DestroyIcon(IconHandle),
    SetIcon(NativeHandle, IconKind, Option<IconHandle>),
    RegisterDropTarget(NativeHandle),
    RevokeDropTarget(NativeHandle),
    Flash(NativeHandle, FlashRequest),
    BeginSystemResize(NativeHandle, ResizeEdge),
}

/// Show state of a simulated window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatedShowState {
    Normal,
    Minimized,
    Maximized,
}

/// Z-order band of a simulated window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatedZOrder {
    Normal,
    TopMost,
    Bottom,
}

/// Snapshot of a simulated window.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedWindow {
    pub style: WindowStyle,
    pub ex_style: WindowExStyle,
    /// Position relative to the parent's client area, or screen position for
    /// top-levels.
    pub rect: Rect,
    /// Restore rectangle in screen coordinates.
    pub normal_rect: Rect,
    pub show_state: SimulatedShowState,
    pub restore_maximized: bool,
    pub z_order: SimulatedZOrder,
    pub parent: Option<NativeHandle>,
    pub owner: Option<NativeHandle>,
    pub title: String,
    pub region: Option<WindowMask>,
    pub layered_alpha: Option<u8>,
    pub small_icon: Option<IconHandle>,
    pub big_icon: Option<IconHandle>,
    pub close_item_enabled: bool,
    pub drop_target: Option<DropTargetHandle>,
}

impl SimulatedWindow {
    fn is_visible(&self) -> bool {
        self.style.contains(WindowStyle::VISIBLE)
    }

    fn set_show_state(&mut self, state: SimulatedShowState) {
        self.show_state = state;
        self.style.remove(WindowStyle::MINIMIZE | WindowStyle::MAXIMIZE);
        match state {
            SimulatedShowState::Minimized => self.style.insert(WindowStyle::MINIMIZE),
            SimulatedShowState::Maximized => self.style.insert(WindowStyle::MAXIMIZE),
            SimulatedShowState::Normal => {}
        }
    }
}

struct HeadlessState {
    windows: HashMap<NativeHandle, SimulatedWindow>,
    screens: Vec<ScreenInfo>,
    next_handle: isize,
    next_resource: isize,
    capture: Option<NativeHandle>,
    foreground: Option<NativeHandle>,
    cursor: Option<WindowCursor>,
    composition_enabled: bool,
    fail_create: bool,
    fail_adjust: bool,
}

/// A [`NativeHost`] that simulates the window system in memory.
///
/// # Example
///
/// ```
/// use horizon_lattice_win32::{HeadlessHost, NativeHost, Rect, WindowExStyle, WindowStyle};
///
/// let host = HeadlessHost::new();
/// let frame = host
///     .adjust_window_rect(Rect::default(), WindowStyle::OVERLAPPED_WINDOW, WindowExStyle::empty())
///     .unwrap();
/// assert_eq!(frame, Rect::from_edges(-8, -31, 8, 8));
/// ```
pub struct HeadlessHost {
    state: RefCell<HeadlessState>,
    sink: RefCell<Option<Weak<dyn NativeEventSink>>>,
    calls: RefCell<Vec<HostCall>>,
    queries: Cell<usize>,
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessHost {
    /// A host with a single 1920x1080 primary screen and a 40 pixel taskbar.
    pub fn new() -> Self {
        Self::with_screens(vec![ScreenInfo {
            id: ScreenId(0),
            geometry: Rect::new(0, 0, 1920, 1080),
            available_geometry: Rect::new(0, 0, 1920, 1040),
            is_primary: true,
            device_pixel_ratio: 1.0,
        }])
    }

    /// A host reporting `screens`.
    pub fn with_screens(screens: Vec<ScreenInfo>) -> Self {
        Self {
            state: RefCell::new(HeadlessState {
                windows: HashMap::new(),
                screens,
                next_handle: 0x100,
                next_resource: 0x1_0000,
                capture: None,
                foreground: None,
                cursor: None,
                composition_enabled: true,
                fail_create: false,
                fail_adjust: false,
            }),
            sink: RefCell::new(None),
            calls: RefCell::new(Vec::new()),
            queries: Cell::new(0),
        }
    }

    /// Makes subsequent window creation fail.
    pub fn set_fail_create(&self, fail: bool) {
        self.state.borrow_mut().fail_create = fail;
    }

    /// Makes subsequent frame computations fail.
    pub fn set_fail_adjust(&self, fail: bool) {
        self.state.borrow_mut().fail_adjust = fail;
    }

    pub fn set_composition_enabled(&self, enabled: bool) {
        self.state.borrow_mut().composition_enabled = enabled;
    }

    /// Moves the foreground to `handle`, as a click in another window would.
    pub fn set_foreground(&self, handle: Option<NativeHandle>) {
        self.state.borrow_mut().foreground = handle;
    }

    /// Mutating calls recorded so far.
    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.borrow().clone()
    }

    /// Returns and clears the recorded calls.
    pub fn take_calls(&self) -> Vec<HostCall> {
        std::mem::take(&mut *self.calls.borrow_mut())
    }

    /// Clears the recorded calls and the query count.
    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
        self.queries.set(0);
    }

    /// Number of read-only calls made since the last [`HeadlessHost::clear_calls`].
    pub fn query_count(&self) -> usize {
        self.queries.get()
    }

    /// Snapshot of a simulated window.
    pub fn window(&self, handle: NativeHandle) -> Option<SimulatedWindow> {
        self.state.borrow().windows.get(&handle).cloned()
    }

    /// Handles of all live windows.
    pub fn window_handles(&self) -> Vec<NativeHandle> {
        let mut handles: Vec<_> = self.state.borrow().windows.keys().copied().collect();
        handles.sort();
        handles
    }

    /// Cursor last set on any window.
    pub fn current_cursor(&self) -> Option<WindowCursor> {
        self.state.borrow().cursor
    }

    /// Delivers a message to the event sink as if the system sent it.
    pub fn send(&self, handle: NativeHandle, message: NativeMessage<'_>) -> bool {
        let sink = self.sink.borrow().as_ref().and_then(Weak::upgrade);
        match sink {
            Some(sink) => {
                trace!(target: targets::HOST, handle = handle.as_raw(), message = message.name(), "deliver");
                sink.dispatch(handle, message)
            }
            None => false,
        }
    }

    /// Moves or resizes a window the way an interactive drag would.
    pub fn simulate_user_move(&self, handle: NativeHandle, frame: Rect) {
        let Some(frame) = self.negotiate_rect(handle, frame, SwpFlags::empty()) else {
            return;
        };
        self.commit(handle, |w| {
            w.rect = frame;
            if w.show_state == SimulatedShowState::Normal {
                w.normal_rect = frame;
            }
        });
    }

    /// Sends a paint request for `update_rect`.
    pub fn simulate_paint(&self, handle: NativeHandle, update_rect: Option<Rect>) -> bool {
        self.send(handle, NativeMessage::Paint { update_rect })
    }

    fn record(&self, call: HostCall) {
        trace!(target: targets::HOST, ?call, "host call");
        self.calls.borrow_mut().push(call);
    }

    fn query(&self) {
        self.queries.set(self.queries.get() + 1);
    }

    fn with_window<R>(&self, handle: NativeHandle, f: impl FnOnce(&SimulatedWindow) -> R) -> Option<R> {
        self.state.borrow().windows.get(&handle).map(f)
    }

    fn with_window_mut<R>(
        &self,
        handle: NativeHandle,
        f: impl FnOnce(&mut SimulatedWindow) -> R,
    ) -> Option<R> {
        self.state.borrow_mut().windows.get_mut(&handle).map(f)
    }

    /// Frame margins the simulated system draws for a style pair.
    fn frame_for(style: WindowStyle, ex_style: WindowExStyle) -> Margins {
        let mut border = if style.contains(WindowStyle::THICK_FRAME) {
            SIZING_BORDER
        } else if style.contains(WindowStyle::DLG_FRAME)
            || ex_style.contains(WindowExStyle::DLG_MODAL_FRAME)
        {
            FIXED_BORDER
        } else if style.contains(WindowStyle::BORDER) {
            1
        } else {
            0
        };
        if ex_style.contains(WindowExStyle::CLIENT_EDGE) {
            border += CLIENT_EDGE;
        }
        let caption = if style.has_caption() {
            if ex_style.contains(WindowExStyle::TOOL_WINDOW) {
                SMALL_CAPTION_HEIGHT
            } else {
                CAPTION_HEIGHT
            }
        } else {
            0
        };
        Margins::new(border, border + caption, border, border)
    }

    fn screen_for(&self, point: Point) -> Option<ScreenInfo> {
        let state = self.state.borrow();
        state
            .screens
            .iter()
            .find(|s| s.geometry.contains(point))
            .or_else(|| state.screens.iter().find(|s| s.is_primary))
            .or_else(|| state.screens.first())
            .cloned()
    }

    /// Offset from screen coordinates to work-area coordinates.
    fn work_area_offset(&self, handle: NativeHandle, rect: Rect) -> Point {
        if self
            .with_window(handle, |w| w.ex_style.contains(WindowExStyle::TOOL_WINDOW))
            .unwrap_or(false)
        {
            return Point::default();
        }
        self.screen_for(rect.center())
            .map(|s| s.available_geometry.top_left() - s.geometry.top_left())
            .unwrap_or_default()
    }

    fn client_origin(&self, handle: NativeHandle) -> Point {
        let Some((style, ex_style)) = self.with_window(handle, |w| (w.style, w.ex_style)) else {
            return Point::default();
        };
        let frame = Self::frame_for(style, ex_style);
        let screen_rect = self.screen_rect(handle).unwrap_or_default();
        screen_rect.top_left() + Point::new(frame.left, frame.top)
    }

    fn screen_rect(&self, handle: NativeHandle) -> Option<Rect> {
        let (rect, parent) = self.with_window(handle, |w| (w.rect, w.parent))?;
        Some(match parent {
            Some(parent) => rect.translated(self.client_origin(parent)),
            None => rect,
        })
    }

    /// Runs the position-changing handshake and returns the rectangle the
    /// window will actually get, in parent coordinates.
    fn negotiate_rect(&self, handle: NativeHandle, requested: Rect, flags: SwpFlags) -> Option<Rect> {
        let (current, is_child) =
            self.with_window(handle, |w| (w.rect, w.style.contains(WindowStyle::CHILD)))?;
        let mut pos = WindowPos {
            rect: requested,
            flags,
        };
        if flags.contains(SwpFlags::NO_MOVE) {
            pos.rect = pos.rect.moved_to(current.top_left());
        }
        if flags.contains(SwpFlags::NO_SIZE) {
            pos.rect = pos.rect.with_size(current.size());
        }
        self.send(handle, NativeMessage::WindowPosChanging(&mut pos));
        let mut rect = pos.rect;
        if !is_child && !flags.contains(SwpFlags::NO_SIZE) {
            let mut info = self.default_min_max_info(handle, rect);
            self.send(handle, NativeMessage::GetMinMaxInfo(&mut info));
            let min = info.min_track_size;
            let max = info.max_track_size;
            rect.width = rect.width.max(min.x).min(max.x.max(min.x));
            rect.height = rect.height.max(min.y).min(max.y.max(min.y));
        }
        Some(rect)
    }

    fn default_min_max_info(&self, handle: NativeHandle, rect: Rect) -> MinMaxInfo {
        let (style, ex_style) = self
            .with_window(handle, |w| (w.style, w.ex_style))
            .unwrap_or_default();
        let border = Self::frame_for(style, ex_style).left;
        let screen = self.screen_for(rect.center());
        let (geometry, available) = screen
            .map(|s| (s.geometry, s.available_geometry))
            .unwrap_or_default();
        MinMaxInfo {
            max_size: Point::new(available.width + 2 * border, available.height + 2 * border),
            max_position: Point::new(
                available.x - geometry.x - border,
                available.y - geometry.y - border,
            ),
            min_track_size: MIN_TRACK_SIZE,
            max_track_size: Point::new(
                geometry.width + 2 * border + 12,
                geometry.height + 2 * border + 12,
            ),
        }
    }

    /// Applies `update` and delivers the size and move notifications the
    /// change implies. No borrow is held while delivering.
    fn commit(&self, handle: NativeHandle, update: impl FnOnce(&mut SimulatedWindow)) {
        let Some((before, after)) = self.with_window_mut(handle, |w| {
            let before = (w.rect, w.show_state, w.is_visible());
            update(w);
            (before, (w.rect, w.show_state, w.is_visible()))
        }) else {
            return;
        };
        let (old_rect, old_state, was_visible) = before;
        let (new_rect, new_state, is_visible) = after;
        if was_visible && !is_visible {
            self.send(handle, NativeMessage::Hidden);
        }
        if old_rect.top_left() != new_rect.top_left() {
            self.send(handle, NativeMessage::Moved);
        }
        if old_rect.size() != new_rect.size() || old_state != new_state {
            let reason = match new_state {
                SimulatedShowState::Normal => SizeReason::Restored,
                SimulatedShowState::Minimized => SizeReason::Minimized,
                SimulatedShowState::Maximized => SizeReason::Maximized,
            };
            self.send(handle, NativeMessage::Resized(reason));
        }
    }

    fn maximized_rect(&self, handle: NativeHandle) -> Option<Rect> {
        let current = self.screen_rect(handle)?;
        let mut info = self.default_min_max_info(handle, current);
        self.send(handle, NativeMessage::GetMinMaxInfo(&mut info));
        let screen = self.screen_for(current.center())?;
        let width = info.max_size.x.min(info.max_track_size.x);
        let height = info.max_size.y.min(info.max_track_size.y);
        Some(Rect::new(
            screen.geometry.x + info.max_position.x,
            screen.geometry.y + info.max_position.y,
            width,
            height,
        ))
    }

    fn maximize(&self, handle: NativeHandle) {
        let Some(target) = self.maximized_rect(handle) else {
            return;
        };
        self.commit(handle, |w| {
            if w.show_state == SimulatedShowState::Normal {
                w.normal_rect = w.rect;
            }
            w.rect = target;
            w.restore_maximized = false;
            w.set_show_state(SimulatedShowState::Maximized);
        });
    }

    fn minimize(&self, handle: NativeHandle) {
        self.commit(handle, |w| {
            match w.show_state {
                SimulatedShowState::Normal => {
                    w.normal_rect = w.rect;
                    w.restore_maximized = false;
                }
                SimulatedShowState::Maximized => w.restore_maximized = true,
                SimulatedShowState::Minimized => {}
            }
            w.rect = Rect::from_origin_size(MINIMIZED_POSITION, MINIMIZED_SIZE);
            w.set_show_state(SimulatedShowState::Minimized);
        });
    }

    fn restore(&self, handle: NativeHandle, allow_maximized: bool) {
        let back_to_maximized = self
            .with_window(handle, |w| {
                w.show_state == SimulatedShowState::Minimized && w.restore_maximized
            })
            .unwrap_or(false);
        if allow_maximized && back_to_maximized {
            self.maximize(handle);
            return;
        }
        self.commit(handle, |w| {
            if w.show_state != SimulatedShowState::Normal {
                w.rect = w.normal_rect;
            }
            w.restore_maximized = false;
            w.set_show_state(SimulatedShowState::Normal);
        });
    }
}

impl NativeHost for HeadlessHost {
    fn set_event_sink(&self, sink: Weak<dyn NativeEventSink>) {
        *self.sink.borrow_mut() = Some(sink);
    }

    fn create_window(&self, params: &NativeCreateParams) -> PlatformResult<NativeHandle> {
        self.record(HostCall::CreateWindow(params.clone()));
        let handle = {
            let mut state = self.state.borrow_mut();
            if state.fail_create {
                return Err(PlatformError::CreationFailed {
                    class_name: params.class_name.clone(),
                    title: params.title.clone(),
                });
            }
            state.next_handle += 0x10;
            NativeHandle::from_raw(state.next_handle).ok_or(PlatformError::NoHandle)?
        };
        let is_child = params.style.contains(WindowStyle::CHILD);
        let default_origin = if is_child {
            Point::default()
        } else {
            DEFAULT_POSITION
        };
        let rect = Rect::new(
            params.x.unwrap_or(default_origin.x),
            params.y.unwrap_or(default_origin.y),
            params.width.unwrap_or(DEFAULT_SIZE.width),
            params.height.unwrap_or(DEFAULT_SIZE.height),
        );
        let window = SimulatedWindow {
            style: params.style,
            ex_style: params.ex_style,
            rect: Rect::from_origin_size(rect.top_left(), Size::default()),
            normal_rect: rect,
            show_state: SimulatedShowState::Normal,
            restore_maximized: false,
            z_order: SimulatedZOrder::Normal,
            parent: if is_child { params.parent } else { None },
            owner: if is_child { None } else { params.parent },
            title: params.title.clone(),
            region: None,
            layered_alpha: None,
            small_icon: None,
            big_icon: None,
            close_item_enabled: params.style.contains(WindowStyle::SYS_MENU),
            drop_target: None,
        };
        self.state.borrow_mut().windows.insert(handle, window);

        let Some(rect) = self.negotiate_rect(handle, rect, SwpFlags::NO_ZORDER) else {
            return Err(PlatformError::NoHandle);
        };
        let mut client = rect;
        self.send(handle, NativeMessage::NcCalcSize { client: &mut client });
        self.commit(handle, |w| {
            w.rect = rect;
            w.normal_rect = rect;
        });
        Ok(handle)
    }

    fn destroy_window(&self, handle: NativeHandle) -> PlatformResult<()> {
        self.record(HostCall::DestroyWindow(handle));
        let mut state = self.state.borrow_mut();
        if state.windows.remove(&handle).is_none() {
            return Err(PlatformError::native("DestroyWindow", 1400));
        }
        let mut doomed = vec![handle];
        while let Some(gone) = doomed.pop() {
            let children: Vec<_> = state
                .windows
                .iter()
                .filter(|(_, w)| w.parent == Some(gone))
                .map(|(h, _)| *h)
                .collect();
            for child in children {
                state.windows.remove(&child);
                doomed.push(child);
            }
        }
        if state.capture == Some(handle) {
            state.capture = None;
        }
        if state.foreground == Some(handle) {
            state.foreground = None;
        }
        Ok(())
    }

    fn is_window(&self, handle: NativeHandle) -> bool {
        self.query();
        self.state.borrow().windows.contains_key(&handle)
    }

    fn adjust_window_rect(
        &self,
        rect: Rect,
        style: WindowStyle,
        ex_style: WindowExStyle,
    ) -> PlatformResult<Rect> {
        self.query();
        if self.state.borrow().fail_adjust {
            return Err(PlatformError::native("AdjustWindowRectEx", 87));
        }
        Ok(rect.margins_added(Self::frame_for(style, ex_style)))
    }

    fn style(&self, handle: NativeHandle) -> WindowStyle {
        self.query();
        self.with_window(handle, |w| w.style).unwrap_or_default()
    }

    fn set_style(&self, handle: NativeHandle, style: WindowStyle) {
        self.record(HostCall::SetStyle(handle, style));
        // The minimized and maximized states live in the style bits.
        self.with_window_mut(handle, |w| {
            w.style = style;
            w.show_state = if style.contains(WindowStyle::MINIMIZE) {
                SimulatedShowState::Minimized
            } else if style.contains(WindowStyle::MAXIMIZE) {
                SimulatedShowState::Maximized
            } else {
                SimulatedShowState::Normal
            };
        });
    }

    fn ex_style(&self, handle: NativeHandle) -> WindowExStyle {
        self.query();
        self.with_window(handle, |w| w.ex_style).unwrap_or_default()
    }

    fn set_ex_style(&self, handle: NativeHandle, ex_style: WindowExStyle) {
        self.record(HostCall::SetExStyle(handle, ex_style));
        self.with_window_mut(handle, |w| w.ex_style = ex_style);
    }

    fn window_rect(&self, handle: NativeHandle) -> PlatformResult<Rect> {
        self.query();
        self.screen_rect(handle)
            .ok_or(PlatformError::native("GetWindowRect", 1400))
    }

    fn placement(&self, handle: NativeHandle) -> PlatformResult<WindowPlacement> {
        self.query();
        let (normal, show_state) = self
            .with_window(handle, |w| (w.normal_rect, w.show_state))
            .ok_or(PlatformError::native("GetWindowPlacement", 1400))?;
        let offset = self.work_area_offset(handle, normal);
        let show_command = match show_state {
            SimulatedShowState::Normal => ShowCommand::ShowNormal,
            SimulatedShowState::Minimized => ShowCommand::ShowMinimized,
            SimulatedShowState::Maximized => ShowCommand::Maximize,
        };
        Ok(WindowPlacement {
            show_command,
            normal_position: normal.translated(-offset),
        })
    }

    fn set_placement(
        &self,
        handle: NativeHandle,
        placement: &WindowPlacement,
    ) -> PlatformResult<()> {
        self.record(HostCall::SetPlacement(handle, *placement));
        let offset = self.work_area_offset(handle, placement.normal_position);
        let normal = placement.normal_position.translated(offset);
        if self.with_window(handle, |_| ()).is_none() {
            return Err(PlatformError::native("SetWindowPlacement", 1400));
        }
        match placement.show_command {
            ShowCommand::Hide => self.commit(handle, |w| {
                w.normal_rect = normal;
                w.style.remove(WindowStyle::VISIBLE);
                if w.show_state == SimulatedShowState::Normal {
                    w.rect = normal;
                }
            }),
            cmd if cmd.is_minimizing() => self.commit(handle, |w| {
                w.normal_rect = normal;
                if w.show_state != SimulatedShowState::Minimized {
                    w.restore_maximized = w.show_state == SimulatedShowState::Maximized;
                    w.rect = Rect::from_origin_size(MINIMIZED_POSITION, MINIMIZED_SIZE);
                    w.set_show_state(SimulatedShowState::Minimized);
                }
            }),
            ShowCommand::Maximize => {
                self.with_window_mut(handle, |w| w.normal_rect = normal);
            }
            _ => self.commit(handle, |w| {
                w.normal_rect = normal;
                if w.show_state == SimulatedShowState::Normal {
                    w.rect = normal;
                }
            }),
        }
        Ok(())
    }

    fn set_window_pos(
        &self,
        handle: NativeHandle,
        insert_after: Option<InsertAfter>,
        rect: Rect,
        flags: SwpFlags,
    ) -> PlatformResult<()> {
        self.record(HostCall::SetWindowPos {
            handle,
            insert_after,
            rect,
            flags,
        });
        let target = if flags.contains(SwpFlags::NO_MOVE | SwpFlags::NO_SIZE) {
            self.with_window(handle, |w| w.rect)
        } else {
            self.negotiate_rect(handle, rect, flags)
        }
        .ok_or(PlatformError::native("SetWindowPos", 1400))?;
        self.commit(handle, |w| {
            if !flags.contains(SwpFlags::NO_ZORDER) {
                match insert_after {
                    Some(InsertAfter::TopMost) => {
                        w.z_order = SimulatedZOrder::TopMost;
                        w.ex_style.insert(WindowExStyle::TOPMOST);
                    }
                    Some(InsertAfter::NoTopMost) => {
                        w.z_order = SimulatedZOrder::Normal;
                        w.ex_style.remove(WindowExStyle::TOPMOST);
                    }
                    Some(InsertAfter::Bottom) => {
                        w.z_order = SimulatedZOrder::Bottom;
                        w.ex_style.remove(WindowExStyle::TOPMOST);
                    }
                    Some(InsertAfter::Top) | None => {}
                }
            }
            w.rect = target;
            if w.show_state == SimulatedShowState::Normal {
                w.normal_rect = target;
            }
            if flags.contains(SwpFlags::SHOW_WINDOW) {
                w.style.insert(WindowStyle::VISIBLE);
            }
            if flags.contains(SwpFlags::HIDE_WINDOW) {
                w.style.remove(WindowStyle::VISIBLE);
            }
        });
        Ok(())
    }

    fn move_window(&self, handle: NativeHandle, rect: Rect, _repaint: bool) -> PlatformResult<()> {
        self.record(HostCall::MoveWindow(handle, rect));
        let target = self
            .negotiate_rect(handle, rect, SwpFlags::NO_ZORDER)
            .ok_or(PlatformError::native("MoveWindow", 1400))?;
        self.commit(handle, |w| {
            w.rect = target;
            if w.show_state == SimulatedShowState::Normal {
                w.normal_rect = target;
            }
        });
        Ok(())
    }

    fn show_window(&self, handle: NativeHandle, command: ShowCommand) -> bool {
        self.record(HostCall::ShowWindow(handle, command));
        let Some((was_visible, is_child)) =
            self.with_window(handle, |w| (w.is_visible(), w.style.contains(WindowStyle::CHILD)))
        else {
            return false;
        };
        if command != ShowCommand::Hide {
            // Becoming visible before the state change, as the system does.
            self.with_window_mut(handle, |w| w.style.insert(WindowStyle::VISIBLE));
        }
        match command {
            ShowCommand::Hide => self.commit(handle, |w| w.style.remove(WindowStyle::VISIBLE)),
            ShowCommand::Maximize => self.maximize(handle),
            ShowCommand::ShowMinimized | ShowCommand::Minimize | ShowCommand::ShowMinNoActive => {
                self.minimize(handle)
            }
            ShowCommand::ShowNormal | ShowCommand::ShowNoActivate => self.restore(handle, false),
            ShowCommand::Restore => self.restore(handle, true),
            ShowCommand::Show | ShowCommand::ShowNa => {}
        }
        let activates = matches!(
            command,
            ShowCommand::Maximize
                | ShowCommand::ShowNormal
                | ShowCommand::Show
                | ShowCommand::ShowMinimized
                | ShowCommand::Restore
        );
        if activates && !is_child {
            self.state.borrow_mut().foreground = Some(handle);
        }
        was_visible
    }

    fn is_visible(&self, handle: NativeHandle) -> bool {
        self.query();
        self.with_window(handle, SimulatedWindow::is_visible)
            .unwrap_or(false)
    }

    fn is_iconic(&self, handle: NativeHandle) -> bool {
        self.query();
        self.with_window(handle, |w| w.show_state == SimulatedShowState::Minimized)
            .unwrap_or(false)
    }

    fn is_zoomed(&self, handle: NativeHandle) -> bool {
        self.query();
        self.with_window(handle, |w| w.show_state == SimulatedShowState::Maximized)
            .unwrap_or(false)
    }

    fn parent(&self, handle: NativeHandle) -> Option<NativeHandle> {
        self.query();
        self.with_window(handle, |w| w.parent).flatten()
    }

    fn set_parent(&self, handle: NativeHandle, parent: Option<NativeHandle>) {
        self.record(HostCall::SetParent(handle, parent));
        let screen = self.screen_rect(handle);
        let origin = parent.map(|p| self.client_origin(p)).unwrap_or_default();
        self.with_window_mut(handle, |w| {
            w.parent = parent;
            if let Some(screen) = screen {
                w.rect = screen.translated(-origin);
            }
        });
    }

    fn owner(&self, handle: NativeHandle) -> Option<NativeHandle> {
        self.query();
        self.with_window(handle, |w| w.owner).flatten()
    }

    fn set_owner(&self, handle: NativeHandle, owner: Option<NativeHandle>) {
        self.record(HostCall::SetOwner(handle, owner));
        self.with_window_mut(handle, |w| w.owner = owner);
    }

    fn is_child(&self, parent: NativeHandle, child: NativeHandle) -> bool {
        self.query();
        let state = self.state.borrow();
        let mut current = state.windows.get(&child).and_then(|w| w.parent);
        while let Some(handle) = current {
            if handle == parent {
                return true;
            }
            current = state.windows.get(&handle).and_then(|w| w.parent);
        }
        false
    }

    fn client_to_screen(&self, handle: NativeHandle, point: Point) -> Point {
        self.query();
        point + self.client_origin(handle)
    }

    fn screen_to_client(&self, handle: NativeHandle, point: Point) -> Point {
        self.query();
        point - self.client_origin(handle)
    }

    fn set_title(&self, handle: NativeHandle, title: &str) {
        self.record(HostCall::SetTitle(handle, title.to_string()));
        self.with_window_mut(handle, |w| w.title = title.to_string());
    }

    fn screens(&self) -> Vec<ScreenInfo> {
        self.query();
        self.state.borrow().screens.clone()
    }

    fn has_system_menu(&self, handle: NativeHandle) -> bool {
        self.query();
        self.with_window(handle, |w| w.style.contains(WindowStyle::SYS_MENU))
            .unwrap_or(false)
    }

    fn enable_close_menu_item(&self, handle: NativeHandle, enabled: bool) {
        self.record(HostCall::EnableCloseMenuItem(handle, enabled));
        self.with_window_mut(handle, |w| w.close_item_enabled = enabled);
    }

    fn set_layered_attributes(&self, handle: NativeHandle, alpha: u8) -> PlatformResult<()> {
        self.record(HostCall::SetLayeredAttributes(handle, alpha));
        self.with_window_mut(handle, |w| w.layered_alpha = Some(alpha))
            .ok_or(PlatformError::native("SetLayeredWindowAttributes", 1400))
    }

    fn update_layered_window(&self, handle: NativeHandle, alpha: u8) -> PlatformResult<()> {
        self.record(HostCall::UpdateLayeredWindow(handle, alpha));
        self.with_window_mut(handle, |w| w.layered_alpha = Some(alpha))
            .ok_or(PlatformError::native("UpdateLayeredWindow", 1400))
    }

    fn is_composition_enabled(&self) -> bool {
        self.query();
        self.state.borrow().composition_enabled
    }

    fn enable_blur_behind(&self, handle: NativeHandle) -> PlatformResult<()> {
        self.record(HostCall::EnableBlurBehind(handle));
        if !self.state.borrow().composition_enabled {
            return Err(PlatformError::Unsupported("composition is disabled"));
        }
        Ok(())
    }

    fn invalidate(&self, handle: NativeHandle, _erase: bool) {
        self.record(HostCall::Invalidate(handle));
    }

    fn set_window_region(
        &self,
        handle: NativeHandle,
        mask: Option<&WindowMask>,
    ) -> PlatformResult<()> {
        self.record(HostCall::SetWindowRegion(handle, mask.cloned()));
        self.with_window_mut(handle, |w| w.region = mask.cloned())
            .ok_or(PlatformError::native("SetWindowRgn", 1400))
    }

    fn set_capture(&self, handle: NativeHandle) {
        self.record(HostCall::SetCapture(handle));
        self.state.borrow_mut().capture = Some(handle);
    }

    fn release_capture(&self) {
        self.record(HostCall::ReleaseCapture);
        self.state.borrow_mut().capture = None;
    }

    fn capture(&self) -> Option<NativeHandle> {
        self.query();
        self.state.borrow().capture
    }

    fn foreground_window(&self) -> Option<NativeHandle> {
        self.query();
        self.state.borrow().foreground
    }

    fn activate(&self, handle: NativeHandle, force: bool) -> bool {
        self.record(HostCall::Activate { handle, force });
        let mut state = self.state.borrow_mut();
        if !state.windows.contains_key(&handle) {
            return false;
        }
        state.foreground = Some(handle);
        true
    }

    fn set_cursor(&self, cursor: WindowCursor) {
        self.record(HostCall::SetCursor(cursor));
        self.state.borrow_mut().cursor = Some(cursor);
    }

    fn icon_size(&self, kind: IconKind) -> Size {
        self.query();
        match kind {
            IconKind::Small => Size::new(16, 16),
            IconKind::Big => Size::new(32, 32),
        }
    }

    fn create_icon(&self, image: &RgbaImage) -> PlatformResult<IconHandle> {
        if image.width() == 0 || image.height() == 0 {
            return Err(PlatformError::InvalidIcon("empty image".into()));
        }
        let icon = {
            let mut state = self.state.borrow_mut();
            state.next_resource += 1;
            IconHandle::from_raw(state.next_resource)
                .ok_or(PlatformError::native("CreateIconIndirect", 0))?
        };
        self.record(HostCall::CreateIcon(icon));
        Ok(icon)
    }

    fn destroy_icon(&self, icon: IconHandle) {
        self.record(HostCall::DestroyIcon(icon));
    }

    fn set_icon(&self, handle: NativeHandle, kind: IconKind, icon: Option<IconHandle>) {
        self.record(HostCall::SetIcon(handle, kind, icon));
        self.with_window_mut(handle, |w| match kind {
            IconKind::Small => w.small_icon = icon,
            IconKind::Big => w.big_icon = icon,
        });
    }

    fn register_drop_target(&self, handle: NativeHandle) -> PlatformResult<DropTargetHandle> {
        self.record(HostCall::RegisterDropTarget(handle));
        let mut state = self.state.borrow_mut();
        state.next_resource += 1;
        let target = DropTargetHandle(state.next_resource as u64);
        state
            .windows
            .get_mut(&handle)
            .map(|w| {
                w.drop_target = Some(target);
                target
            })
            .ok_or(PlatformError::native("RegisterDragDrop", 1400))
    }

    fn revoke_drop_target(&self, handle: NativeHandle, _target: DropTargetHandle) {
        self.record(HostCall::RevokeDropTarget(handle));
        self.with_window_mut(handle, |w| w.drop_target = None);
    }

    fn get_dc(&self, handle: NativeHandle) -> Option<DeviceContext> {
        self.query();
        self.with_window(handle, |_| ())?;
        DeviceContext::from_raw(handle.as_raw() | 0x4000_0000)
    }

    fn release_dc(&self, _handle: NativeHandle, _dc: DeviceContext) {
        self.query();
    }

    fn flash(&self, handle: NativeHandle, request: FlashRequest) {
        self.record(HostCall::Flash(handle, request));
    }

    fn caret_blink_time(&self) -> Option<u32> {
        self.query();
        Some(530)
    }

    fn begin_system_resize(&self, handle: NativeHandle, edge: ResizeEdge) -> bool {
        self.record(HostCall::BeginSystemResize(handle, edge));
        self.has_system_menu(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(style: WindowStyle) -> NativeCreateParams {
        NativeCreateParams {
            class_name: "Test".into(),
            title: "t".into(),
            style,
            ex_style: WindowExStyle::empty(),
            x: Some(50),
            y: Some(60),
            width: Some(400),
            height: Some(300),
            parent: None,
        }
    }

    #[test]
    fn frame_metrics_follow_style() {
        assert_eq!(
            HeadlessHost::frame_for(WindowStyle::OVERLAPPED_WINDOW, WindowExStyle::empty()),
            Margins::new(8, 31, 8, 8)
        );
        assert_eq!(
            HeadlessHost::frame_for(WindowStyle::CAPTION, WindowExStyle::TOOL_WINDOW),
            Margins::new(3, 20, 3, 3)
        );
        assert_eq!(
            HeadlessHost::frame_for(WindowStyle::POPUP, WindowExStyle::empty()),
            Margins::default()
        );
    }

    #[test]
    fn maximize_and_restore_round_trip() {
        let host = HeadlessHost::new();
        let h = host.create_window(&params(WindowStyle::OVERLAPPED_WINDOW)).unwrap();
        host.show_window(h, ShowCommand::Maximize);
        let w = host.window(h).unwrap();
        assert_eq!(w.show_state, SimulatedShowState::Maximized);
        assert_eq!(w.rect, Rect::new(-8, -8, 1936, 1056));
        assert!(w.style.contains(WindowStyle::MAXIMIZE | WindowStyle::VISIBLE));

        host.show_window(h, ShowCommand::ShowNormal);
        let w = host.window(h).unwrap();
        assert_eq!(w.rect, Rect::new(50, 60, 400, 300));
        assert!(!w.style.contains(WindowStyle::MAXIMIZE));
    }

    #[test]
    fn restore_from_minimized_returns_to_maximized() {
        let host = HeadlessHost::new();
        let h = host.create_window(&params(WindowStyle::OVERLAPPED_WINDOW)).unwrap();
        host.show_window(h, ShowCommand::Maximize);
        host.show_window(h, ShowCommand::Minimize);
        assert!(host.is_iconic(h));
        host.show_window(h, ShowCommand::Restore);
        assert!(host.is_zoomed(h));
    }

    #[test]
    fn calls_are_recorded_and_queries_counted() {
        let host = HeadlessHost::new();
        let h = host.create_window(&params(WindowStyle::POPUP)).unwrap();
        host.clear_calls();
        let _ = host.style(h);
        host.set_title(h, "hello");
        assert_eq!(host.query_count(), 1);
        assert_eq!(host.calls(), vec![HostCall::SetTitle(h, "hello".into())]);
    }

    #[test]
    fn destroying_a_parent_destroys_children() {
        let host = HeadlessHost::new();
        let parent = host.create_window(&params(WindowStyle::OVERLAPPED_WINDOW)).unwrap();
        let mut child_params = params(WindowStyle::CHILD);
        child_params.parent = Some(parent);
        let child = host.create_window(&child_params).unwrap();
        assert!(host.is_child(parent, child));
        host.destroy_window(parent).unwrap();
        assert!(!host.is_window(child));
    }
}
