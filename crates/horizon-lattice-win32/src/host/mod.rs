//! The seam between platform windows and the native window system.
//!
//! Every native call a platform window makes goes through [`NativeHost`].
//! Messages flow the other way through [`NativeEventSink`]: the host delivers
//! them synchronously, possibly while one of its own methods is still on the
//! stack, so sinks must tolerate re-entrant delivery.
//!
//! Two hosts are provided. [`HeadlessHost`] simulates the window system in
//! memory and records every mutating call. `Win32Host` (Windows only) drives
//! real windows through the `windows` crate.

mod headless;
#[cfg(target_os = "windows")]
mod win32;

use std::num::NonZeroIsize;
use std::rc::Weak;

use bitflags::bitflags;
use image::RgbaImage;
use raw_window_handle::{RawWindowHandle, Win32WindowHandle};

pub use headless::{
    HeadlessHost, HostCall, SimulatedShowState, SimulatedWindow, SimulatedZOrder,
};
#[cfg(target_os = "windows")]
pub use win32::Win32Host;

use crate::cursor::WindowCursor;
use crate::error::PlatformResult;
use crate::geometry::{Point, Rect, Size};
use crate::icon::IconKind;
use crate::mask::WindowMask;
use crate::style::{WindowExStyle, WindowStyle};

/// Opaque native window handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NativeHandle(NonZeroIsize);

impl NativeHandle {
    /// Wraps a raw handle. Zero is not a window.
    pub fn from_raw(raw: isize) -> Option<Self> {
        NonZeroIsize::new(raw).map(Self)
    }

    pub fn as_raw(self) -> isize {
        self.0.get()
    }

    /// Exports the handle for graphics APIs that accept raw window handles.
    pub fn raw_window_handle(self) -> RawWindowHandle {
        RawWindowHandle::Win32(Win32WindowHandle::new(self.0))
    }
}

/// Opaque native icon handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IconHandle(NonZeroIsize);

impl IconHandle {
    pub fn from_raw(raw: isize) -> Option<Self> {
        NonZeroIsize::new(raw).map(Self)
    }

    pub fn as_raw(self) -> isize {
        self.0.get()
    }
}

/// Opaque device context handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceContext(NonZeroIsize);

impl DeviceContext {
    pub fn from_raw(raw: isize) -> Option<Self> {
        NonZeroIsize::new(raw).map(Self)
    }

    pub fn as_raw(self) -> isize {
        self.0.get()
    }
}

/// Registration token for a window's drop target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DropTargetHandle(pub u64);

/// Identifies a screen reported by [`NativeHost::screens`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ScreenId(pub u32);

/// A connected screen.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenInfo {
    pub id: ScreenId,
    /// Full screen bounds in virtual-desktop coordinates.
    pub geometry: Rect,
    /// Bounds minus taskbars and docked bars.
    pub available_geometry: Rect,
    pub is_primary: bool,
    pub device_pixel_ratio: f64,
}

/// Show commands (`SW_*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShowCommand {
    Hide,
    ShowNormal,
    ShowMinimized,
    /// Maximize and activate. Shared by `SW_MAXIMIZE` and `SW_SHOWMAXIMIZED`.
    Maximize,
    ShowNoActivate,
    Show,
    Minimize,
    ShowMinNoActive,
    ShowNa,
    Restore,
}

impl ShowCommand {
    pub fn raw(self) -> i32 {
        match self {
            ShowCommand::Hide => 0,
            ShowCommand::ShowNormal => 1,
            ShowCommand::ShowMinimized => 2,
            ShowCommand::Maximize => 3,
            ShowCommand::ShowNoActivate => 4,
            ShowCommand::Show => 5,
            ShowCommand::Minimize => 6,
            ShowCommand::ShowMinNoActive => 7,
            ShowCommand::ShowNa => 8,
            ShowCommand::Restore => 9,
        }
    }

    pub fn from_raw(raw: i32) -> Option<Self> {
        Some(match raw {
            0 => ShowCommand::Hide,
            1 => ShowCommand::ShowNormal,
            2 => ShowCommand::ShowMinimized,
            3 => ShowCommand::Maximize,
            4 => ShowCommand::ShowNoActivate,
            5 => ShowCommand::Show,
            6 => ShowCommand::Minimize,
            7 => ShowCommand::ShowMinNoActive,
            8 => ShowCommand::ShowNa,
            9 => ShowCommand::Restore,
            _ => return None,
        })
    }

    /// Whether the command leaves the window minimized.
    pub fn is_minimizing(self) -> bool {
        matches!(
            self,
            ShowCommand::ShowMinimized | ShowCommand::Minimize | ShowCommand::ShowMinNoActive
        )
    }
}

/// Z-order anchors for [`NativeHost::set_window_pos`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InsertAfter {
    Top,
    Bottom,
    TopMost,
    NoTopMost,
}

impl InsertAfter {
    /// Native pseudo-handle value (`HWND_TOP` and friends).
    pub fn raw(self) -> isize {
        match self {
            InsertAfter::Top => 0,
            InsertAfter::Bottom => 1,
            InsertAfter::TopMost => -1,
            InsertAfter::NoTopMost => -2,
        }
    }
}

bitflags! {
    /// Flags for [`NativeHost::set_window_pos`] (`SWP_*`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SwpFlags: u32 {
        const NO_SIZE = 0x0001;
        const NO_MOVE = 0x0002;
        const NO_ZORDER = 0x0004;
        const NO_REDRAW = 0x0008;
        const NO_ACTIVATE = 0x0010;
        const FRAME_CHANGED = 0x0020;
        const SHOW_WINDOW = 0x0040;
        const HIDE_WINDOW = 0x0080;
        const NO_COPY_BITS = 0x0100;
        const NO_OWNER_ZORDER = 0x0200;
    }
}

/// Saved show state and restore rectangle of a top-level window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPlacement {
    pub show_command: ShowCommand,
    /// Restore rectangle in work-area coordinates.
    pub normal_position: Rect,
}

/// Why a window was resized (`SIZE_*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SizeReason {
    Restored,
    Minimized,
    Maximized,
    /// Another window was restored.
    MaxShow,
    /// Another window was maximized.
    MaxHide,
}

impl SizeReason {
    pub fn from_raw(raw: usize) -> Option<Self> {
        Some(match raw {
            0 => SizeReason::Restored,
            1 => SizeReason::Minimized,
            2 => SizeReason::Maximized,
            3 => SizeReason::MaxShow,
            4 => SizeReason::MaxHide,
            _ => return None,
        })
    }
}

/// Tracking limits negotiated before a window is sized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MinMaxInfo {
    pub max_size: Point,
    pub max_position: Point,
    pub min_track_size: Point,
    pub max_track_size: Point,
}

/// Proposed position of a window that is about to move or resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPos {
    pub rect: Rect,
    pub flags: SwpFlags,
}

/// Result of a non-client hit test (`HT*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HitTestResult {
    Nowhere,
    #[default]
    Client,
    Caption,
    SysMenu,
    Left,
    Right,
    Top,
    TopLeft,
    TopRight,
    Bottom,
    BottomLeft,
    BottomRight,
    Border,
}

impl HitTestResult {
    pub fn raw(self) -> isize {
        match self {
            HitTestResult::Nowhere => 0,
            HitTestResult::Client => 1,
            HitTestResult::Caption => 2,
            HitTestResult::SysMenu => 3,
            HitTestResult::Left => 10,
            HitTestResult::Right => 11,
            HitTestResult::Top => 12,
            HitTestResult::TopLeft => 13,
            HitTestResult::TopRight => 14,
            HitTestResult::Bottom => 15,
            HitTestResult::BottomLeft => 16,
            HitTestResult::BottomRight => 17,
            HitTestResult::Border => 18,
        }
    }
}

/// Edge or corner grabbed for an interactive system resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResizeEdge {
    Left,
    Right,
    Top,
    TopLeft,
    TopRight,
    Bottom,
    BottomLeft,
    BottomRight,
}

impl ResizeEdge {
    /// `SC_SIZE` system command combined with the `WMSZ_*` edge code.
    pub fn system_command(self) -> usize {
        const SC_SIZE: usize = 0xF000;
        SC_SIZE
            + match self {
                ResizeEdge::Left => 1,
                ResizeEdge::Right => 2,
                ResizeEdge::Top => 3,
                ResizeEdge::TopLeft => 4,
                ResizeEdge::TopRight => 5,
                ResizeEdge::Bottom => 6,
                ResizeEdge::BottomLeft => 7,
                ResizeEdge::BottomRight => 8,
            }
    }
}

/// Taskbar flashing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashRequest {
    Start { count: u32, timeout_ms: u32 },
    Stop,
}

/// Parameters for creating a native window.
///
/// `None` in a position or size field lets the system choose.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeCreateParams {
    pub class_name: String,
    pub title: String,
    pub style: WindowStyle,
    pub ex_style: WindowExStyle,
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub parent: Option<NativeHandle>,
}

/// A message delivered from the host to the event sink.
#[derive(Debug)]
pub enum NativeMessage<'a> {
    Moved,
    Resized(SizeReason),
    /// Fill in tracking limits.
    GetMinMaxInfo(&'a mut MinMaxInfo),
    /// Compute the client area from the proposed window rectangle, in place.
    NcCalcSize { client: &'a mut Rect },
    /// Adjust a pending move or resize in place.
    WindowPosChanging(&'a mut WindowPos),
    /// Classify a point in screen coordinates.
    NcHitTest {
        global_pos: Point,
        result: &'a mut HitTestResult,
    },
    EraseBackground,
    /// A paint request. `None` means the update region is empty.
    Paint { update_rect: Option<Rect> },
    /// The mouse entered the client area.
    MouseEnter,
    Hidden,
    CompositionChanged,
}

impl NativeMessage<'_> {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            NativeMessage::Moved => "Moved",
            NativeMessage::Resized(_) => "Resized",
            NativeMessage::GetMinMaxInfo(_) => "GetMinMaxInfo",
            NativeMessage::NcCalcSize { .. } => "NcCalcSize",
            NativeMessage::WindowPosChanging(_) => "WindowPosChanging",
            NativeMessage::NcHitTest { .. } => "NcHitTest",
            NativeMessage::EraseBackground => "EraseBackground",
            NativeMessage::Paint { .. } => "Paint",
            NativeMessage::MouseEnter => "MouseEnter",
            NativeMessage::Hidden => "Hidden",
            NativeMessage::CompositionChanged => "CompositionChanged",
        }
    }
}

/// Receives messages delivered by a [`NativeHost`].
pub trait NativeEventSink {
    /// Handles a message for `handle`. Returns `true` when handled.
    fn dispatch(&self, handle: NativeHandle, message: NativeMessage<'_>) -> bool;
}

/// The native window system.
///
/// Methods take `&self` because messages may be delivered re-entrantly from
/// inside any call.
pub trait NativeHost {
    /// Installs the receiver for native messages.
    fn set_event_sink(&self, sink: Weak<dyn NativeEventSink>);

    fn create_window(&self, params: &NativeCreateParams) -> PlatformResult<NativeHandle>;
    fn destroy_window(&self, handle: NativeHandle) -> PlatformResult<()>;
    fn is_window(&self, handle: NativeHandle) -> bool;

    /// Grows `rect` by the frame that `style` and `ex_style` produce.
    fn adjust_window_rect(
        &self,
        rect: Rect,
        style: WindowStyle,
        ex_style: WindowExStyle,
    ) -> PlatformResult<Rect>;

    fn style(&self, handle: NativeHandle) -> WindowStyle;
    fn set_style(&self, handle: NativeHandle, style: WindowStyle);
    fn ex_style(&self, handle: NativeHandle) -> WindowExStyle;
    fn set_ex_style(&self, handle: NativeHandle, ex_style: WindowExStyle);

    /// Frame rectangle in screen coordinates.
    fn window_rect(&self, handle: NativeHandle) -> PlatformResult<Rect>;
    fn placement(&self, handle: NativeHandle) -> PlatformResult<WindowPlacement>;
    fn set_placement(&self, handle: NativeHandle, placement: &WindowPlacement)
    -> PlatformResult<()>;
    fn set_window_pos(
        &self,
        handle: NativeHandle,
        insert_after: Option<InsertAfter>,
        rect: Rect,
        flags: SwpFlags,
    ) -> PlatformResult<()>;
    fn move_window(&self, handle: NativeHandle, rect: Rect, repaint: bool) -> PlatformResult<()>;
    /// Returns whether the window was visible before the call.
    fn show_window(&self, handle: NativeHandle, command: ShowCommand) -> bool;
    fn is_visible(&self, handle: NativeHandle) -> bool;
    fn is_iconic(&self, handle: NativeHandle) -> bool;
    fn is_zoomed(&self, handle: NativeHandle) -> bool;

    /// Native parent. `None` for windows parented to the desktop.
    fn parent(&self, handle: NativeHandle) -> Option<NativeHandle>;
    fn set_parent(&self, handle: NativeHandle, parent: Option<NativeHandle>);
    fn owner(&self, handle: NativeHandle) -> Option<NativeHandle>;
    fn set_owner(&self, handle: NativeHandle, owner: Option<NativeHandle>);
    fn is_child(&self, parent: NativeHandle, child: NativeHandle) -> bool;
    fn client_to_screen(&self, handle: NativeHandle, point: Point) -> Point;
    fn screen_to_client(&self, handle: NativeHandle, point: Point) -> Point;
    fn set_title(&self, handle: NativeHandle, title: &str);

    fn screens(&self) -> Vec<ScreenInfo>;

    fn has_system_menu(&self, handle: NativeHandle) -> bool;
    /// Enables or grays the close item of the system menu.
    fn enable_close_menu_item(&self, handle: NativeHandle, enabled: bool);

    fn set_layered_attributes(&self, handle: NativeHandle, alpha: u8) -> PlatformResult<()>;
    fn update_layered_window(&self, handle: NativeHandle, alpha: u8) -> PlatformResult<()>;
    fn is_composition_enabled(&self) -> bool;
    fn enable_blur_behind(&self, handle: NativeHandle) -> PlatformResult<()>;
    fn invalidate(&self, handle: NativeHandle, erase: bool);
    /// Sets or, with `None`, removes the window region. Frame coordinates.
    fn set_window_region(&self, handle: NativeHandle, mask: Option<&WindowMask>)
    -> PlatformResult<()>;

    fn set_capture(&self, handle: NativeHandle);
    fn release_capture(&self);
    fn capture(&self) -> Option<NativeHandle>;
    fn foreground_window(&self) -> Option<NativeHandle>;
    /// Brings the window to the foreground and focuses it. `force` attaches
    /// to the foreground thread's input first.
    fn activate(&self, handle: NativeHandle, force: bool) -> bool;

    fn set_cursor(&self, cursor: WindowCursor);

    /// System metric for the given icon slot.
    fn icon_size(&self, kind: IconKind) -> Size;
    fn create_icon(&self, image: &RgbaImage) -> PlatformResult<IconHandle>;
    fn destroy_icon(&self, icon: IconHandle);
    fn set_icon(&self, handle: NativeHandle, kind: IconKind, icon: Option<IconHandle>);

    fn register_drop_target(&self, handle: NativeHandle) -> PlatformResult<DropTargetHandle>;
    fn revoke_drop_target(&self, handle: NativeHandle, target: DropTargetHandle);

    fn get_dc(&self, handle: NativeHandle) -> Option<DeviceContext>;
    fn release_dc(&self, handle: NativeHandle, dc: DeviceContext);

    fn flash(&self, handle: NativeHandle, request: FlashRequest);
    fn caret_blink_time(&self) -> Option<u32>;
    /// Starts an interactive resize. Fails for windows without a system menu.
    fn begin_system_resize(&self, handle: NativeHandle, edge: ResizeEdge) -> bool;
}
