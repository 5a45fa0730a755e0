//! Window show states.

/// The show state of a top-level window.
///
/// States are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WindowState {
    /// Normal windowed state.
    #[default]
    Normal,
    /// Minimized to the taskbar.
    Minimized,
    /// Maximized to fill the work area.
    Maximized,
    /// Covering the whole screen without a frame.
    Fullscreen,
}

impl WindowState {
    /// Whether the window is minimized.
    pub fn is_minimized(&self) -> bool {
        matches!(self, WindowState::Minimized)
    }

    /// Whether the window is maximized.
    pub fn is_maximized(&self) -> bool {
        matches!(self, WindowState::Maximized)
    }

    /// Whether the window covers its screen.
    pub fn is_fullscreen(&self) -> bool {
        matches!(self, WindowState::Fullscreen)
    }

    /// Whether the window is in its restored state.
    pub fn is_normal(&self) -> bool {
        matches!(self, WindowState::Normal)
    }
}

/// Visibility reported for a window, combining shown-ness with its state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    #[default]
    Hidden,
    Windowed,
    Minimized,
    Maximized,
    Fullscreen,
}
