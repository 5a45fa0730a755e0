//! Native host backed by the Win32 API.
//!
//! Window classes are registered lazily on first use, one per class name,
//! all sharing a window procedure that forwards messages to the installed
//! [`NativeEventSink`]. Unhandled messages fall through to the default
//! window procedure.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::ffi::c_void;
use std::rc::Weak;

use image::RgbaImage;
use tracing::{debug, trace, warn};
use windows::core::{HSTRING, PCWSTR};
use windows::Win32::Foundation::{
    BOOL, COLORREF, GetLastError, HINSTANCE, HWND, LPARAM, LRESULT, POINT, RECT, WPARAM,
};
use windows::Win32::Graphics::Dwm::{
    DWM_BB_ENABLE, DWM_BLURBEHIND, DwmEnableBlurBehindWindow, DwmIsCompositionEnabled,
};
use windows::Win32::Graphics::Gdi::{
    AC_SRC_ALPHA, AC_SRC_OVER, BLENDFUNCTION, ClientToScreen, CombineRgn, CreateBitmap,
    CreateEllipticRgn, CreatePolygonRgn, CreateRectRgn, CreateRoundRectRgn, DeleteObject,
    EnumDisplayMonitors, GetDC, GetMonitorInfoW, GetUpdateRect, HDC, HMONITOR, HRGN,
    InvalidateRect, MONITORINFO, RGN_OR, ReleaseDC, ScreenToClient, SetWindowRgn, ValidateRect,
    WINDING,
};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::HiDpi::{GetDpiForMonitor, MDT_EFFECTIVE_DPI};
use windows::Win32::UI::Input::KeyboardAndMouse::{
    GetCapture, ReleaseCapture, SetCapture, SetFocus,
};
use windows::Win32::UI::WindowsAndMessaging::{
    AdjustWindowRectEx, AttachThreadInput, CW_USEDEFAULT, CreateIconIndirect, CreateWindowExW,
    DefWindowProcW, DestroyIcon, DestroyWindow, DispatchMessageW, EnableMenuItem, FLASHW_STOP,
    FLASHW_TIMERNOFG, FLASHW_TRAY, FLASHWINFO, FlashWindowEx, GA_PARENT, GW_OWNER,
    GWL_EXSTYLE, GWL_STYLE, GWLP_HWNDPARENT, GetAncestor, GetCaretBlinkTime, GetDesktopWindow,
    GetForegroundWindow, GetSystemMenu, GetSystemMetrics, GetWindow, GetWindowLongW,
    GetWindowPlacement, GetWindowRect, GetWindowThreadProcessId, HCURSOR, HICON, ICONINFO,
    IDC_APPSTARTING, IDC_ARROW, IDC_CROSS, IDC_HAND, IDC_HELP, IDC_IBEAM, IDC_NO,
    IDC_SIZEALL, IDC_SIZENESW, IDC_SIZENS, IDC_SIZENWSE, IDC_SIZEWE, IDC_WAIT, IsChild,
    IsIconic, IsWindow, IsWindowVisible, IsZoomed, LoadCursorW, MF_BYCOMMAND, MF_ENABLED,
    MF_GRAYED, MINMAXINFO, MSG, MoveWindow, NCCALCSIZE_PARAMS, PM_REMOVE, PeekMessageW,
    PostMessageW, RegisterClassExW, SC_CLOSE, SET_WINDOW_POS_FLAGS, SHOW_WINDOW_CMD,
    SM_CXICON, SM_CXSMICON, SM_CYICON, SM_CYSMICON, SendMessageW, SetCursor,
    SetForegroundWindow, SetLayeredWindowAttributes, SetParent, SetWindowLongPtrW,
    SetWindowLongW, SetWindowPlacement, SetWindowPos, SetWindowTextW, ShowWindow,
    TranslateMessage, ULW_ALPHA, UpdateLayeredWindow, WINDOW_EX_STYLE, WINDOW_STYLE,
    WINDOWPLACEMENT, WINDOWPOS, WM_DWMCOMPOSITIONCHANGED, WM_ERASEBKGND, WM_GETMINMAXINFO,
    WM_MOUSEMOVE, WM_MOVE, WM_NCCALCSIZE, WM_NCHITTEST, WM_PAINT, WM_SETICON, WM_SHOWWINDOW,
    WM_SIZE, WM_SYSCOMMAND, WM_WINDOWPOSCHANGING, WNDCLASSEXW, LWA_ALPHA, CS_DBLCLKS,
    CS_HREDRAW, CS_VREDRAW,
};

use super::{
    DeviceContext, DropTargetHandle, FlashRequest, HitTestResult, IconHandle, InsertAfter,
    MinMaxInfo, NativeCreateParams, NativeEventSink, NativeHandle, NativeHost, NativeMessage,
    ResizeEdge, ScreenId, ScreenInfo, ShowCommand, SizeReason, SwpFlags, WindowPlacement,
    WindowPos,
};
use crate::cursor::{CursorIcon, WindowCursor};
use crate::error::{PlatformError, PlatformResult};
use crate::geometry::{Point, Rect, Size};
use crate::icon::IconKind;
use crate::logging::targets;
use crate::mask::{MaskShape, WindowMask};
use crate::style::{WindowExStyle, WindowStyle};

const USER_DEFAULT_SCREEN_DPI: f64 = 96.0;

thread_local! {
    static EVENT_SINK: RefCell<Option<Weak<dyn NativeEventSink>>> = const { RefCell::new(None) };
    static HOVERED: Cell<isize> = const { Cell::new(0) };
}

fn hwnd(handle: NativeHandle) -> HWND {
    HWND(handle.as_raw() as *mut c_void)
}

fn native_handle(hwnd: HWND) -> Option<NativeHandle> {
    NativeHandle::from_raw(hwnd.0 as isize)
}

fn to_rect(rect: &RECT) -> Rect {
    Rect::from_edges(rect.left, rect.top, rect.right, rect.bottom)
}

fn from_rect(rect: Rect) -> RECT {
    RECT {
        left: rect.left(),
        top: rect.top(),
        right: rect.right(),
        bottom: rect.bottom(),
    }
}

fn last_error(call: &'static str) -> PlatformError {
    PlatformError::native(call, unsafe { GetLastError() }.0)
}

fn call_error(call: &'static str) -> impl FnOnce(windows::core::Error) -> PlatformError {
    move |err| PlatformError::native(call, err.code().0 as u32)
}

fn point_from_lparam(lparam: LPARAM) -> Point {
    let x = (lparam.0 & 0xFFFF) as u16 as i16 as i32;
    let y = ((lparam.0 >> 16) & 0xFFFF) as u16 as i16 as i32;
    Point::new(x, y)
}

/// Hands `message` to the installed sink. The sink is cloned out first so a
/// re-entrant `set_event_sink` never observes an outstanding borrow.
fn dispatch(hwnd: HWND, message: NativeMessage<'_>) -> bool {
    let Some(handle) = native_handle(hwnd) else {
        return false;
    };
    let sink = EVENT_SINK.with(|sink| sink.borrow().clone());
    match sink.and_then(|sink| sink.upgrade()) {
        Some(sink) => sink.dispatch(handle, message),
        None => false,
    }
}

unsafe extern "system" fn window_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        WM_MOVE => {
            if dispatch(hwnd, NativeMessage::Moved) {
                return LRESULT(0);
            }
        }
        WM_SIZE => {
            if let Some(reason) = SizeReason::from_raw(wparam.0) {
                if dispatch(hwnd, NativeMessage::Resized(reason)) {
                    return LRESULT(0);
                }
            }
        }
        WM_GETMINMAXINFO => {
            let raw = lparam.0 as *mut MINMAXINFO;
            if let Some(raw) = unsafe { raw.as_mut() } {
                let mut info = MinMaxInfo {
                    max_size: Point::new(raw.ptMaxSize.x, raw.ptMaxSize.y),
                    max_position: Point::new(raw.ptMaxPosition.x, raw.ptMaxPosition.y),
                    min_track_size: Point::new(raw.ptMinTrackSize.x, raw.ptMinTrackSize.y),
                    max_track_size: Point::new(raw.ptMaxTrackSize.x, raw.ptMaxTrackSize.y),
                };
                if dispatch(hwnd, NativeMessage::GetMinMaxInfo(&mut info)) {
                    raw.ptMaxSize = POINT { x: info.max_size.x, y: info.max_size.y };
                    raw.ptMaxPosition = POINT { x: info.max_position.x, y: info.max_position.y };
                    raw.ptMinTrackSize = POINT { x: info.min_track_size.x, y: info.min_track_size.y };
                    raw.ptMaxTrackSize = POINT { x: info.max_track_size.x, y: info.max_track_size.y };
                    return LRESULT(0);
                }
            }
        }
        WM_NCCALCSIZE if wparam.0 != 0 => {
            // Let the system compute the standard client area, then trim it.
            let result = unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) };
            let raw = lparam.0 as *mut NCCALCSIZE_PARAMS;
            if let Some(raw) = unsafe { raw.as_mut() } {
                let mut client = to_rect(&raw.rgrc[0]);
                if dispatch(hwnd, NativeMessage::NcCalcSize { client: &mut client }) {
                    raw.rgrc[0] = from_rect(client);
                }
            }
            return result;
        }
        WM_WINDOWPOSCHANGING => {
            let raw = lparam.0 as *mut WINDOWPOS;
            if let Some(raw) = unsafe { raw.as_mut() } {
                let mut pos = WindowPos {
                    rect: Rect::new(raw.x, raw.y, raw.cx, raw.cy),
                    flags: SwpFlags::from_bits_retain(raw.flags.0),
                };
                if dispatch(hwnd, NativeMessage::WindowPosChanging(&mut pos)) {
                    raw.x = pos.rect.x;
                    raw.y = pos.rect.y;
                    raw.cx = pos.rect.width;
                    raw.cy = pos.rect.height;
                    raw.flags = SET_WINDOW_POS_FLAGS(pos.flags.bits());
                    return LRESULT(0);
                }
            }
        }
        WM_NCHITTEST => {
            let mut result = HitTestResult::default();
            let global_pos = point_from_lparam(lparam);
            if dispatch(hwnd, NativeMessage::NcHitTest { global_pos, result: &mut result }) {
                return LRESULT(result.raw());
            }
        }
        WM_ERASEBKGND => {
            if dispatch(hwnd, NativeMessage::EraseBackground) {
                return LRESULT(1);
            }
        }
        WM_PAINT => {
            let mut update = RECT::default();
            let update_rect = unsafe { GetUpdateRect(hwnd, Some(&mut update as *mut RECT), false) }
                .as_bool()
                .then(|| to_rect(&update));
            if dispatch(hwnd, NativeMessage::Paint { update_rect }) {
                let _ = unsafe { ValidateRect(hwnd, None) };
                return LRESULT(0);
            }
        }
        WM_MOUSEMOVE => {
            if HOVERED.with(|hovered| hovered.replace(hwnd.0 as isize)) != hwnd.0 as isize {
                dispatch(hwnd, NativeMessage::MouseEnter);
            }
        }
        WM_SHOWWINDOW if wparam.0 == 0 => {
            dispatch(hwnd, NativeMessage::Hidden);
        }
        WM_DWMCOMPOSITIONCHANGED => {
            if dispatch(hwnd, NativeMessage::CompositionChanged) {
                return LRESULT(0);
            }
        }
        _ => {}
    }
    unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) }
}

/// Native host for real windows. Must be used from the thread that created it.
#[derive(Debug, Default)]
pub struct Win32Host {
    registered_classes: RefCell<HashSet<String>>,
    next_drop_target: Cell<u64>,
}

impl Win32Host {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatches every queued message of the calling thread. Returns `false`
    /// when the queue was empty.
    pub fn pump_messages(&self) -> bool {
        let mut msg = MSG::default();
        let mut dispatched = false;
        unsafe {
            while PeekMessageW(&mut msg, HWND::default(), 0, 0, PM_REMOVE).as_bool() {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
                dispatched = true;
            }
        }
        dispatched
    }

    fn instance() -> PlatformResult<HINSTANCE> {
        unsafe { GetModuleHandleW(PCWSTR::null()) }
            .map(HINSTANCE::from)
            .map_err(call_error("GetModuleHandleW"))
    }

    fn ensure_class(&self, class_name: &str) -> PlatformResult<()> {
        if self.registered_classes.borrow().contains(class_name) {
            return Ok(());
        }
        let name = HSTRING::from(class_name);
        let cursor = unsafe { LoadCursorW(HINSTANCE::default(), IDC_ARROW) }.unwrap_or_default();
        let class = WNDCLASSEXW {
            cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
            style: CS_DBLCLKS | CS_HREDRAW | CS_VREDRAW,
            lpfnWndProc: Some(window_proc),
            hInstance: Self::instance()?,
            hCursor: cursor,
            lpszClassName: PCWSTR(name.as_ptr()),
            ..Default::default()
        };
        if unsafe { RegisterClassExW(&class) } == 0 {
            return Err(last_error("RegisterClassExW"));
        }
        debug!(target: targets::HOST, class_name, "registered window class");
        self.registered_classes.borrow_mut().insert(class_name.to_owned());
        Ok(())
    }

    fn monitor_info(monitor: HMONITOR, index: u32) -> Option<ScreenInfo> {
        let mut info = MONITORINFO {
            cbSize: std::mem::size_of::<MONITORINFO>() as u32,
            ..Default::default()
        };
        if !unsafe { GetMonitorInfoW(monitor, &mut info) }.as_bool() {
            return None;
        }
        let (mut dpi_x, mut dpi_y) = (0u32, 0u32);
        let device_pixel_ratio =
            match unsafe { GetDpiForMonitor(monitor, MDT_EFFECTIVE_DPI, &mut dpi_x, &mut dpi_y) } {
                Ok(()) if dpi_x > 0 => f64::from(dpi_x) / USER_DEFAULT_SCREEN_DPI,
                _ => 1.0,
            };
        Some(ScreenInfo {
            id: ScreenId(index),
            geometry: to_rect(&info.rcMonitor),
            available_geometry: to_rect(&info.rcWork),
            is_primary: info.dwFlags & 1 != 0,
            device_pixel_ratio,
        })
    }

    fn region_for(shape: &MaskShape) -> PlatformResult<HRGN> {
        let region = unsafe {
            match shape {
                MaskShape::Rect(r) => CreateRectRgn(r.left(), r.top(), r.right(), r.bottom()),
                MaskShape::RoundedRect(r, radius) => CreateRoundRectRgn(
                    r.left(),
                    r.top(),
                    r.right(),
                    r.bottom(),
                    radius * 2,
                    radius * 2,
                ),
                MaskShape::Ellipse(r) => CreateEllipticRgn(r.left(), r.top(), r.right(), r.bottom()),
                MaskShape::Polygon(points) => {
                    let points: Vec<POINT> = points.iter().map(|p| POINT { x: p.x, y: p.y }).collect();
                    CreatePolygonRgn(&points, WINDING)
                }
                MaskShape::Union(shapes) => {
                    let combined = CreateRectRgn(0, 0, 0, 0);
                    if combined.is_invalid() {
                        return Err(last_error("CreateRectRgn"));
                    }
                    for shape in shapes {
                        let other = Self::region_for(shape.shape())?;
                        CombineRgn(combined, combined, other, RGN_OR);
                        let _ = DeleteObject(other);
                    }
                    combined
                }
            }
        };
        if region.is_invalid() {
            return Err(last_error("CreateRgn"));
        }
        Ok(region)
    }

    fn cursor_name(icon: CursorIcon) -> PCWSTR {
        match icon {
            CursorIcon::Pointer => IDC_HAND,
            CursorIcon::Text | CursorIcon::VerticalText => IDC_IBEAM,
            CursorIcon::Wait => IDC_WAIT,
            CursorIcon::Progress => IDC_APPSTARTING,
            CursorIcon::Help => IDC_HELP,
            CursorIcon::Crosshair | CursorIcon::Cell => IDC_CROSS,
            CursorIcon::Move | CursorIcon::AllScroll | CursorIcon::Grab | CursorIcon::Grabbing => {
                IDC_SIZEALL
            }
            CursorIcon::NotAllowed | CursorIcon::NoDrop => IDC_NO,
            CursorIcon::EResize | CursorIcon::WResize | CursorIcon::EwResize | CursorIcon::ColResize => {
                IDC_SIZEWE
            }
            CursorIcon::NResize | CursorIcon::SResize | CursorIcon::NsResize | CursorIcon::RowResize => {
                IDC_SIZENS
            }
            CursorIcon::NeResize | CursorIcon::SwResize | CursorIcon::NeswResize => IDC_SIZENESW,
            CursorIcon::NwResize | CursorIcon::SeResize | CursorIcon::NwseResize => IDC_SIZENWSE,
            _ => IDC_ARROW,
        }
    }
}

unsafe extern "system" fn collect_monitor(
    monitor: HMONITOR,
    _hdc: HDC,
    _rect: *mut RECT,
    data: LPARAM,
) -> BOOL {
    if let Some(monitors) = unsafe { (data.0 as *mut Vec<HMONITOR>).as_mut() } {
        monitors.push(monitor);
    }
    true.into()
}

impl NativeHost for Win32Host {
    fn set_event_sink(&self, sink: Weak<dyn NativeEventSink>) {
        EVENT_SINK.with(|slot| *slot.borrow_mut() = Some(sink));
    }

    fn create_window(&self, params: &NativeCreateParams) -> PlatformResult<NativeHandle> {
        self.ensure_class(&params.class_name)?;
        let class_name = HSTRING::from(params.class_name.as_str());
        let title = HSTRING::from(params.title.as_str());
        let parent = params.parent.map(hwnd).unwrap_or_default();
        let created = unsafe {
            CreateWindowExW(
                WINDOW_EX_STYLE(params.ex_style.bits()),
                &class_name,
                &title,
                WINDOW_STYLE(params.style.bits()),
                params.x.unwrap_or(CW_USEDEFAULT),
                params.y.unwrap_or(CW_USEDEFAULT),
                params.width.unwrap_or(CW_USEDEFAULT),
                params.height.unwrap_or(CW_USEDEFAULT),
                parent,
                None,
                Self::instance()?,
                None,
            )
        };
        match created.ok().and_then(native_handle) {
            Some(handle) => {
                trace!(target: targets::HOST, handle = handle.as_raw(), class_name = %params.class_name, "CreateWindowEx");
                Ok(handle)
            }
            None => Err(PlatformError::CreationFailed {
                class_name: params.class_name.clone(),
                title: params.title.clone(),
            }),
        }
    }

    fn destroy_window(&self, handle: NativeHandle) -> PlatformResult<()> {
        unsafe { DestroyWindow(hwnd(handle)) }.map_err(call_error("DestroyWindow"))
    }

    fn is_window(&self, handle: NativeHandle) -> bool {
        unsafe { IsWindow(hwnd(handle)) }.as_bool()
    }

    fn adjust_window_rect(
        &self,
        rect: Rect,
        style: WindowStyle,
        ex_style: WindowExStyle,
    ) -> PlatformResult<Rect> {
        let mut native = from_rect(rect);
        unsafe {
            AdjustWindowRectEx(
                &mut native,
                WINDOW_STYLE(style.bits()),
                false,
                WINDOW_EX_STYLE(ex_style.bits()),
            )
        }
        .map_err(call_error("AdjustWindowRectEx"))?;
        Ok(to_rect(&native))
    }

    fn style(&self, handle: NativeHandle) -> WindowStyle {
        WindowStyle::from_bits_retain(unsafe { GetWindowLongW(hwnd(handle), GWL_STYLE) } as u32)
    }

    fn set_style(&self, handle: NativeHandle, style: WindowStyle) {
        unsafe { SetWindowLongW(hwnd(handle), GWL_STYLE, style.bits() as i32) };
    }

    fn ex_style(&self, handle: NativeHandle) -> WindowExStyle {
        WindowExStyle::from_bits_retain(unsafe { GetWindowLongW(hwnd(handle), GWL_EXSTYLE) } as u32)
    }

    fn set_ex_style(&self, handle: NativeHandle, ex_style: WindowExStyle) {
        unsafe { SetWindowLongW(hwnd(handle), GWL_EXSTYLE, ex_style.bits() as i32) };
    }

    fn window_rect(&self, handle: NativeHandle) -> PlatformResult<Rect> {
        let mut rect = RECT::default();
        unsafe { GetWindowRect(hwnd(handle), &mut rect) }.map_err(call_error("GetWindowRect"))?;
        Ok(to_rect(&rect))
    }

    fn placement(&self, handle: NativeHandle) -> PlatformResult<WindowPlacement> {
        let mut placement = WINDOWPLACEMENT {
            length: std::mem::size_of::<WINDOWPLACEMENT>() as u32,
            ..Default::default()
        };
        unsafe { GetWindowPlacement(hwnd(handle), &mut placement) }
            .map_err(call_error("GetWindowPlacement"))?;
        Ok(WindowPlacement {
            show_command: ShowCommand::from_raw(placement.showCmd.0)
                .unwrap_or(ShowCommand::ShowNormal),
            normal_position: to_rect(&placement.rcNormalPosition),
        })
    }

    fn set_placement(
        &self,
        handle: NativeHandle,
        placement: &WindowPlacement,
    ) -> PlatformResult<()> {
        let native = WINDOWPLACEMENT {
            length: std::mem::size_of::<WINDOWPLACEMENT>() as u32,
            showCmd: SHOW_WINDOW_CMD(placement.show_command.raw()),
            rcNormalPosition: from_rect(placement.normal_position),
            ..Default::default()
        };
        unsafe { SetWindowPlacement(hwnd(handle), &native) }
            .map_err(call_error("SetWindowPlacement"))
    }

    fn set_window_pos(
        &self,
        handle: NativeHandle,
        insert_after: Option<InsertAfter>,
        rect: Rect,
        flags: SwpFlags,
    ) -> PlatformResult<()> {
        let mut flags = flags;
        if insert_after.is_none() {
            flags |= SwpFlags::NO_ZORDER;
        }
        let insert_after = HWND(insert_after.map_or(0, InsertAfter::raw) as *mut c_void);
        unsafe {
            SetWindowPos(
                hwnd(handle),
                insert_after,
                rect.x,
                rect.y,
                rect.width,
                rect.height,
                SET_WINDOW_POS_FLAGS(flags.bits()),
            )
        }
        .map_err(call_error("SetWindowPos"))
    }

    fn move_window(&self, handle: NativeHandle, rect: Rect, repaint: bool) -> PlatformResult<()> {
        unsafe { MoveWindow(hwnd(handle), rect.x, rect.y, rect.width, rect.height, repaint) }
            .map_err(call_error("MoveWindow"))
    }

    fn show_window(&self, handle: NativeHandle, command: ShowCommand) -> bool {
        unsafe { ShowWindow(hwnd(handle), SHOW_WINDOW_CMD(command.raw())) }.as_bool()
    }

    fn is_visible(&self, handle: NativeHandle) -> bool {
        unsafe { IsWindowVisible(hwnd(handle)) }.as_bool()
    }

    fn is_iconic(&self, handle: NativeHandle) -> bool {
        unsafe { IsIconic(hwnd(handle)) }.as_bool()
    }

    fn is_zoomed(&self, handle: NativeHandle) -> bool {
        unsafe { IsZoomed(hwnd(handle)) }.as_bool()
    }

    fn parent(&self, handle: NativeHandle) -> Option<NativeHandle> {
        let parent = unsafe { GetAncestor(hwnd(handle), GA_PARENT) };
        if parent == unsafe { GetDesktopWindow() } {
            return None;
        }
        native_handle(parent)
    }

    fn set_parent(&self, handle: NativeHandle, parent: Option<NativeHandle>) {
        if let Err(err) = unsafe { SetParent(hwnd(handle), parent.map(hwnd).unwrap_or_default()) } {
            warn!(target: targets::HOST, handle = handle.as_raw(), %err, "SetParent failed");
        }
    }

    fn owner(&self, handle: NativeHandle) -> Option<NativeHandle> {
        unsafe { GetWindow(hwnd(handle), GW_OWNER) }
            .ok()
            .and_then(native_handle)
    }

    fn set_owner(&self, handle: NativeHandle, owner: Option<NativeHandle>) {
        let raw = owner.map_or(0, NativeHandle::as_raw);
        unsafe { SetWindowLongPtrW(hwnd(handle), GWLP_HWNDPARENT, raw) };
    }

    fn is_child(&self, parent: NativeHandle, child: NativeHandle) -> bool {
        unsafe { IsChild(hwnd(parent), hwnd(child)) }.as_bool()
    }

    fn client_to_screen(&self, handle: NativeHandle, point: Point) -> Point {
        let mut native = POINT { x: point.x, y: point.y };
        let _ = unsafe { ClientToScreen(hwnd(handle), &mut native) };
        Point::new(native.x, native.y)
    }

    fn screen_to_client(&self, handle: NativeHandle, point: Point) -> Point {
        let mut native = POINT { x: point.x, y: point.y };
        let _ = unsafe { ScreenToClient(hwnd(handle), &mut native) };
        Point::new(native.x, native.y)
    }

    fn set_title(&self, handle: NativeHandle, title: &str) {
        if let Err(err) = unsafe { SetWindowTextW(hwnd(handle), &HSTRING::from(title)) } {
            warn!(target: targets::HOST, handle = handle.as_raw(), %err, "SetWindowText failed");
        }
    }

    fn screens(&self) -> Vec<ScreenInfo> {
        let mut monitors: Vec<HMONITOR> = Vec::new();
        let _ = unsafe {
            EnumDisplayMonitors(
                HDC::default(),
                None,
                Some(collect_monitor),
                LPARAM(&mut monitors as *mut Vec<HMONITOR> as isize),
            )
        };
        monitors
            .into_iter()
            .enumerate()
            .filter_map(|(index, monitor)| Self::monitor_info(monitor, index as u32))
            .collect()
    }

    fn has_system_menu(&self, handle: NativeHandle) -> bool {
        self.style(handle).contains(WindowStyle::SYS_MENU)
    }

    fn enable_close_menu_item(&self, handle: NativeHandle, enabled: bool) {
        let menu = unsafe { GetSystemMenu(hwnd(handle), false) };
        if menu.is_invalid() {
            return;
        }
        let state = if enabled { MF_ENABLED } else { MF_GRAYED };
        let _ = unsafe { EnableMenuItem(menu, SC_CLOSE, MF_BYCOMMAND | state) };
    }

    fn set_layered_attributes(&self, handle: NativeHandle, alpha: u8) -> PlatformResult<()> {
        unsafe { SetLayeredWindowAttributes(hwnd(handle), COLORREF(0), alpha, LWA_ALPHA) }
            .map_err(call_error("SetLayeredWindowAttributes"))
    }

    fn update_layered_window(&self, handle: NativeHandle, alpha: u8) -> PlatformResult<()> {
        let blend = BLENDFUNCTION {
            BlendOp: AC_SRC_OVER as u8,
            BlendFlags: 0,
            SourceConstantAlpha: alpha,
            AlphaFormat: AC_SRC_ALPHA as u8,
        };
        unsafe {
            UpdateLayeredWindow(
                hwnd(handle),
                HDC::default(),
                None,
                None,
                HDC::default(),
                None,
                COLORREF(0),
                Some(&blend as *const BLENDFUNCTION),
                ULW_ALPHA,
            )
        }
        .map_err(call_error("UpdateLayeredWindow"))
    }

    fn is_composition_enabled(&self) -> bool {
        unsafe { DwmIsCompositionEnabled() }.is_ok_and(|enabled| enabled.as_bool())
    }

    fn enable_blur_behind(&self, handle: NativeHandle) -> PlatformResult<()> {
        let blur = DWM_BLURBEHIND {
            dwFlags: DWM_BB_ENABLE,
            fEnable: true.into(),
            ..Default::default()
        };
        unsafe { DwmEnableBlurBehindWindow(hwnd(handle), &blur) }
            .map_err(call_error("DwmEnableBlurBehindWindow"))
    }

    fn invalidate(&self, handle: NativeHandle, erase: bool) {
        let _ = unsafe { InvalidateRect(hwnd(handle), None, erase) };
    }

    fn set_window_region(
        &self,
        handle: NativeHandle,
        mask: Option<&WindowMask>,
    ) -> PlatformResult<()> {
        let region = match mask {
            Some(mask) => Self::region_for(mask.shape())?,
            None => HRGN::default(),
        };
        // The system owns the region once the call succeeds.
        if unsafe { SetWindowRgn(hwnd(handle), region, true) } == 0 {
            if !region.is_invalid() {
                let _ = unsafe { DeleteObject(region) };
            }
            return Err(last_error("SetWindowRgn"));
        }
        Ok(())
    }

    fn set_capture(&self, handle: NativeHandle) {
        unsafe { SetCapture(hwnd(handle)) };
    }

    fn release_capture(&self) {
        let _ = unsafe { ReleaseCapture() };
    }

    fn capture(&self) -> Option<NativeHandle> {
        native_handle(unsafe { GetCapture() })
    }

    fn foreground_window(&self) -> Option<NativeHandle> {
        native_handle(unsafe { GetForegroundWindow() })
    }

    fn activate(&self, handle: NativeHandle, force: bool) -> bool {
        let target = hwnd(handle);
        unsafe {
            let current = GetCurrentThreadId();
            let foreground = GetWindowThreadProcessId(GetForegroundWindow(), None);
            let attach = force && foreground != 0 && foreground != current;
            if attach {
                let _ = AttachThreadInput(foreground, current, true);
            }
            let activated = SetForegroundWindow(target).as_bool();
            let _ = SetFocus(target);
            if attach {
                let _ = AttachThreadInput(foreground, current, false);
            }
            activated
        }
    }

    fn set_cursor(&self, cursor: WindowCursor) {
        let native = match cursor {
            WindowCursor::Shape(icon) => {
                match unsafe { LoadCursorW(HINSTANCE::default(), Self::cursor_name(icon)) } {
                    Ok(native) => native,
                    Err(err) => {
                        warn!(target: targets::HOST, ?icon, %err, "unable to load cursor");
                        return;
                    }
                }
            }
            WindowCursor::Custom(handle) => HCURSOR(handle.as_raw() as *mut c_void),
        };
        unsafe { SetCursor(native) };
    }

    fn icon_size(&self, kind: IconKind) -> Size {
        let (cx, cy) = match kind {
            IconKind::Small => (SM_CXSMICON, SM_CYSMICON),
            IconKind::Big => (SM_CXICON, SM_CYICON),
        };
        unsafe { Size::new(GetSystemMetrics(cx), GetSystemMetrics(cy)) }
    }

    fn create_icon(&self, image: &RgbaImage) -> PlatformResult<IconHandle> {
        let (width, height) = (image.width() as i32, image.height() as i32);
        let bgra: Vec<u8> = image
            .pixels()
            .flat_map(|p| [p.0[2], p.0[1], p.0[0], p.0[3]])
            .collect();
        unsafe {
            let color = CreateBitmap(width, height, 1, 32, Some(bgra.as_ptr().cast()));
            let mask = CreateBitmap(width, height, 1, 1, None);
            let info = ICONINFO {
                fIcon: true.into(),
                xHotspot: 0,
                yHotspot: 0,
                hbmMask: mask,
                hbmColor: color,
            };
            let icon = CreateIconIndirect(&info);
            let _ = DeleteObject(color);
            let _ = DeleteObject(mask);
            icon.ok()
                .and_then(|icon| IconHandle::from_raw(icon.0 as isize))
                .ok_or_else(|| last_error("CreateIconIndirect"))
        }
    }

    fn destroy_icon(&self, icon: IconHandle) {
        let _ = unsafe { DestroyIcon(HICON(icon.as_raw() as *mut c_void)) };
    }

    fn set_icon(&self, handle: NativeHandle, kind: IconKind, icon: Option<IconHandle>) {
        let raw = icon.map_or(0, IconHandle::as_raw);
        unsafe { SendMessageW(hwnd(handle), WM_SETICON, WPARAM(kind.raw()), LPARAM(raw)) };
    }

    fn register_drop_target(&self, handle: NativeHandle) -> PlatformResult<DropTargetHandle> {
        // OLE drag and drop needs a COM drop target object, which lives in
        // the toolkit's clipboard layer; the token only tracks registration.
        let id = self.next_drop_target.get() + 1;
        self.next_drop_target.set(id);
        trace!(target: targets::MIME, handle = handle.as_raw(), id, "drop target registered");
        Ok(DropTargetHandle(id))
    }

    fn revoke_drop_target(&self, handle: NativeHandle, target: DropTargetHandle) {
        trace!(target: targets::MIME, handle = handle.as_raw(), id = target.0, "drop target revoked");
    }

    fn get_dc(&self, handle: NativeHandle) -> Option<DeviceContext> {
        DeviceContext::from_raw(unsafe { GetDC(hwnd(handle)) }.0 as isize)
    }

    fn release_dc(&self, handle: NativeHandle, dc: DeviceContext) {
        unsafe { ReleaseDC(hwnd(handle), HDC(dc.as_raw() as *mut c_void)) };
    }

    fn flash(&self, handle: NativeHandle, request: FlashRequest) {
        let (flags, count, timeout) = match request {
            FlashRequest::Start { count, timeout_ms } => {
                (FLASHW_TRAY | FLASHW_TIMERNOFG, count, timeout_ms)
            }
            FlashRequest::Stop => (FLASHW_STOP, 0, 0),
        };
        let info = FLASHWINFO {
            cbSize: std::mem::size_of::<FLASHWINFO>() as u32,
            hwnd: hwnd(handle),
            dwFlags: flags,
            uCount: count,
            dwTimeout: timeout,
        };
        let _ = unsafe { FlashWindowEx(&info) };
    }

    fn caret_blink_time(&self) -> Option<u32> {
        match unsafe { GetCaretBlinkTime() } {
            0 | u32::MAX => None,
            ms => Some(ms),
        }
    }

    fn begin_system_resize(&self, handle: NativeHandle, edge: ResizeEdge) -> bool {
        if !self.has_system_menu(handle) {
            return false;
        }
        self.release_capture();
        unsafe {
            PostMessageW(
                hwnd(handle),
                WM_SYSCOMMAND,
                WPARAM(edge.system_command()),
                LPARAM(0),
            )
        }
        .is_ok()
    }
}
