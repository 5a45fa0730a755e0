//! Native Win32 window platform layer for Horizon Lattice.
//!
//! This crate binds toolkit windows to native top-level and child windows:
//!
//! - **Creation**: Native style and extended style derived from window type and hints
//! - **Geometry**: Client/frame translation, size constraints and custom margins
//! - **State**: Normal, minimized, maximized and emulated full screen
//! - **Reconciliation**: Native size, move and paint messages turned into toolkit events
//! - **Properties**: Opacity, masks, cursors, icons, drop sites, grabs and alerts
//!
//! Every native call goes through the [`NativeHost`] trait. [`HeadlessHost`]
//! simulates the window system in memory and runs everywhere; `Win32Host`
//! drives real windows on Windows.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//!
//! use horizon_lattice_win32::prelude::*;
//!
//! let host = Rc::new(HeadlessHost::new());
//! let integration = PlatformIntegration::new(host.clone(), PlatformOptions::default());
//! let window = ToolkitWindow::new(WindowAttributes::default().with_flags(WindowType::Dialog));
//! let platform_window = integration.create_platform_window(&window).unwrap();
//!
//! platform_window.set_visible(integration.context(), true);
//! platform_window.set_window_state(integration.context(), WindowState::Fullscreen);
//! assert_eq!(platform_window.visibility(integration.context()), Visibility::Fullscreen);
//! ```

pub mod base_window;
pub mod config;
pub mod context;
pub mod creation;
pub mod cursor;
pub mod geometry;
pub mod geometry_hint;
pub mod host;
pub mod icon;
pub mod logging;
pub mod mask;
pub mod state;
pub mod style;
pub mod surface;
pub mod toolkit;
pub mod window;
pub mod window_type;

mod error;

pub use base_window::{BaseWindow, ForeignWindow};
pub use config::PlatformOptions;
pub use context::{PlatformContext, PlatformIntegration, RegisteredWindow};
pub use cursor::WindowCursor;
pub use error::{PlatformError, PlatformResult};
pub use geometry::{Margins, Point, Rect, Size};
pub use host::{HeadlessHost, NativeEventSink, NativeHandle, NativeHost, NativeMessage};
#[cfg(target_os = "windows")]
pub use host::Win32Host;
pub use icon::WindowIcon;
pub use mask::WindowMask;
pub use state::{Visibility, WindowState};
pub use style::{WindowExStyle, WindowStyle};
pub use toolkit::{NativeWindowReleaser, ToolkitWindow, WindowAttributes, WindowSystemEvent};
pub use window::{PlatformWindow, PlatformWindowFlags};
pub use window_type::{WindowFlags, WindowHints, WindowType};

/// Prelude module with commonly used types.
pub mod prelude {
    pub use crate::base_window::BaseWindow;
    pub use crate::config::PlatformOptions;
    pub use crate::context::{PlatformContext, PlatformIntegration};
    pub use crate::geometry::{Margins, Point, Rect, Size};
    pub use crate::host::{HeadlessHost, NativeHandle, NativeHost};
    pub use crate::state::{Visibility, WindowState};
    pub use crate::style::{WindowExStyle, WindowStyle};
    pub use crate::toolkit::{ToolkitWindow, WindowAttributes, WindowSystemEvent};
    pub use crate::window::PlatformWindow;
    pub use crate::window_type::{WindowFlags, WindowHints, WindowType};
}
