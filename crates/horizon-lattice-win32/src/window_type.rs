//! Window type and hint definitions.
//!
//! A window's [`WindowFlags`] pair its [`WindowType`] with a set of
//! [`WindowHints`]. The type decides the native window class of behavior
//! (popup, dialog, tool...) while the hints adjust decorations and stacking.

use bitflags::bitflags;

/// The type of window, which affects its native style and default decorations.
///
/// Types are mutually exclusive. Only [`WindowType::Window`],
/// [`WindowType::Dialog`] and [`WindowType::Tool`] receive default decorations
/// when no explicit decoration hint is given.
///
/// # Example
///
/// ```
/// use horizon_lattice_win32::{WindowFlags, WindowType};
///
/// let flags = WindowFlags::new(WindowType::Dialog);
/// assert!(flags.window_type().is_dialog());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WindowType {
    /// A widget embedded in another window. Top-level only when unparented.
    Widget,

    /// A normal top-level window.
    ///
    /// Normal windows have full decorations including title bar, minimize,
    /// maximize, and close buttons.
    #[default]
    Window,

    /// A dialog window.
    ///
    /// Dialogs get a title bar with a close and a context help button, but
    /// no minimize or maximize buttons by default.
    Dialog,

    /// A sheet. Treated as a dialog-like top-level.
    Sheet,

    /// A drawer attached to a parent window.
    Drawer,

    /// A popup window (menu, dropdown).
    ///
    /// Popups are never parented natively and always stay on top.
    Popup,

    /// A tool window (palette, inspector, etc.).
    ///
    /// Tool windows have a smaller title bar and do not appear in the taskbar.
    Tool,

    /// A tooltip. Behaves like a popup that is always topmost.
    ToolTip,

    /// A splash screen. Always frameless.
    SplashScreen,

    /// The desktop window. No native handle is created for it.
    Desktop,

    /// A sub-window hosted inside a multiple-document area.
    SubWindow,

    /// A window wrapping a native handle created elsewhere.
    ForeignWindow,
}

impl WindowType {
    /// Popup-like types share the `POPUP` native style.
    pub fn is_popup_like(&self) -> bool {
        matches!(
            self,
            WindowType::Popup | WindowType::ToolTip | WindowType::SplashScreen
        )
    }

    /// Whether this type is a dialog (sheets count as dialogs).
    pub fn is_dialog(&self) -> bool {
        matches!(self, WindowType::Dialog | WindowType::Sheet)
    }

    /// Whether this type is a tool window (drawers count as tools).
    pub fn is_tool(&self) -> bool {
        matches!(self, WindowType::Tool | WindowType::Drawer)
    }

    /// Types that may register as a drop site.
    pub fn accepts_drops(&self) -> bool {
        matches!(
            self,
            WindowType::Window
                | WindowType::Dialog
                | WindowType::Sheet
                | WindowType::Drawer
                | WindowType::Popup
                | WindowType::Tool
        )
    }

    /// Decorations applied to a top-level window whose hints carry no
    /// decoration of their own.
    ///
    /// Returns `None` for types that receive no default decorations.
    pub fn default_decorations(&self) -> Option<WindowHints> {
        match self {
            WindowType::Window => Some(
                WindowHints::TITLE
                    | WindowHints::SYSTEM_MENU
                    | WindowHints::MINIMIZE_BUTTON
                    | WindowHints::MAXIMIZE_BUTTON
                    | WindowHints::CLOSE_BUTTON,
            ),
            WindowType::Dialog => Some(
                WindowHints::TITLE
                    | WindowHints::SYSTEM_MENU
                    | WindowHints::CONTEXT_HELP_BUTTON
                    | WindowHints::CLOSE_BUTTON,
            ),
            WindowType::Tool => {
                Some(WindowHints::TITLE | WindowHints::SYSTEM_MENU | WindowHints::CLOSE_BUTTON)
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for WindowType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            WindowType::Widget => "Widget",
            WindowType::Window => "Window",
            WindowType::Dialog => "Dialog",
            WindowType::Sheet => "Sheet",
            WindowType::Drawer => "Drawer",
            WindowType::Popup => "Popup",
            WindowType::Tool => "Tool",
            WindowType::ToolTip => "ToolTip",
            WindowType::SplashScreen => "SplashScreen",
            WindowType::Desktop => "Desktop",
            WindowType::SubWindow => "SubWindow",
            WindowType::ForeignWindow => "ForeignWindow",
        };
        f.write_str(name)
    }
}

bitflags! {
    /// Decoration and behavior hints attached to a window.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct WindowHints: u32 {
        /// Fixed-size dialog frame without a sizing border.
        const FIXED_SIZE_DIALOG = 0x0000_0100;
        /// No native frame at all.
        const FRAMELESS = 0x0000_0800;
        const TITLE = 0x0000_1000;
        const SYSTEM_MENU = 0x0000_2000;
        const MINIMIZE_BUTTON = 0x0000_4000;
        const MAXIMIZE_BUTTON = 0x0000_8000;
        const CONTEXT_HELP_BUTTON = 0x0001_0000;
        const STAYS_ON_TOP = 0x0004_0000;
        const TRANSPARENT_FOR_INPUT = 0x0008_0000;
        /// Only the explicitly requested decorations are shown.
        const CUSTOMIZE = 0x0200_0000;
        const STAYS_ON_BOTTOM = 0x0400_0000;
        const CLOSE_BUTTON = 0x0800_0000;
        const NO_DROP_SHADOW = 0x4000_0000;

        const MIN_MAX_BUTTONS = Self::MINIMIZE_BUTTON.bits() | Self::MAXIMIZE_BUTTON.bits();
    }
}

impl WindowHints {
    /// Hints that count as an explicit decoration request.
    pub const DECORATIONS: WindowHints = WindowHints::TITLE
        .union(WindowHints::SYSTEM_MENU)
        .union(WindowHints::MIN_MAX_BUTTONS)
        .union(WindowHints::CLOSE_BUTTON)
        .union(WindowHints::CONTEXT_HELP_BUTTON)
        .union(WindowHints::FRAMELESS)
        .union(WindowHints::CUSTOMIZE);
}

/// A window type plus its hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct WindowFlags {
    window_type: WindowType,
    hints: WindowHints,
}

impl WindowFlags {
    /// Flags with the given type and no hints.
    pub const fn new(window_type: WindowType) -> Self {
        Self {
            window_type,
            hints: WindowHints::empty(),
        }
    }

    pub const fn from_parts(window_type: WindowType, hints: WindowHints) -> Self {
        Self { window_type, hints }
    }

    /// Adds hints, builder style.
    pub fn with_hints(mut self, hints: WindowHints) -> Self {
        self.hints |= hints;
        self
    }

    /// Removes hints, builder style.
    pub fn without_hints(mut self, hints: WindowHints) -> Self {
        self.hints.remove(hints);
        self
    }

    pub fn with_type(mut self, window_type: WindowType) -> Self {
        self.window_type = window_type;
        self
    }

    pub fn window_type(&self) -> WindowType {
        self.window_type
    }

    pub fn hints(&self) -> WindowHints {
        self.hints
    }

    /// Whether any of `hints` is set.
    pub fn has(&self, hints: WindowHints) -> bool {
        self.hints.intersects(hints)
    }

    pub fn is_frameless(&self) -> bool {
        self.has(WindowHints::FRAMELESS)
    }

    pub fn stays_on_top(&self) -> bool {
        self.has(WindowHints::STAYS_ON_TOP)
    }

    pub fn stays_on_bottom(&self) -> bool {
        self.has(WindowHints::STAYS_ON_BOTTOM)
    }

    pub fn has_title(&self) -> bool {
        self.has(WindowHints::TITLE)
    }
}

impl From<WindowType> for WindowFlags {
    fn from(window_type: WindowType) -> Self {
        WindowFlags::new(window_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_type_default() {
        assert_eq!(WindowType::default(), WindowType::Window);
    }

    #[test]
    fn test_default_decorations() {
        let window = WindowType::Window.default_decorations().unwrap();
        assert!(window.contains(WindowHints::MIN_MAX_BUTTONS | WindowHints::CLOSE_BUTTON));

        let dialog = WindowType::Dialog.default_decorations().unwrap();
        assert!(dialog.contains(WindowHints::CONTEXT_HELP_BUTTON));
        assert!(!dialog.intersects(WindowHints::MIN_MAX_BUTTONS));

        let tool = WindowType::Tool.default_decorations().unwrap();
        assert_eq!(
            tool,
            WindowHints::TITLE | WindowHints::SYSTEM_MENU | WindowHints::CLOSE_BUTTON
        );

        assert!(WindowType::Popup.default_decorations().is_none());
        assert!(WindowType::SplashScreen.default_decorations().is_none());
    }

    #[test]
    fn test_type_groups() {
        assert!(WindowType::ToolTip.is_popup_like());
        assert!(WindowType::SplashScreen.is_popup_like());
        assert!(!WindowType::Tool.is_popup_like());
        assert!(WindowType::Sheet.is_dialog());
        assert!(WindowType::Drawer.is_tool());
        assert!(!WindowType::ToolTip.accepts_drops());
        assert!(WindowType::Popup.accepts_drops());
    }

    #[test]
    fn test_flags_builder() {
        let flags = WindowFlags::new(WindowType::Window)
            .with_hints(WindowHints::FRAMELESS | WindowHints::STAYS_ON_TOP)
            .without_hints(WindowHints::STAYS_ON_TOP);
        assert!(flags.is_frameless());
        assert!(!flags.stays_on_top());
        assert_eq!(flags.window_type(), WindowType::Window);
    }

    #[test]
    fn test_window_type_display() {
        assert_eq!(format!("{}", WindowType::ToolTip), "ToolTip");
        assert_eq!(format!("{}", WindowType::Window), "Window");
    }
}
