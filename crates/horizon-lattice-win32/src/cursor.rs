//! Window cursors.

use std::num::NonZeroIsize;

pub use cursor_icon::CursorIcon;

/// A native cursor created outside this crate, such as from a bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CursorHandle(NonZeroIsize);

impl CursorHandle {
    pub fn from_raw(raw: isize) -> Option<Self> {
        NonZeroIsize::new(raw).map(Self)
    }

    pub fn as_raw(self) -> isize {
        self.0.get()
    }
}

/// The cursor a window displays while the mouse is over it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowCursor {
    /// A standard system cursor shape.
    Shape(CursorIcon),
    /// A custom native cursor.
    Custom(CursorHandle),
}

impl WindowCursor {
    /// The arrow shown when no window in the chain sets a cursor.
    pub const fn arrow() -> Self {
        WindowCursor::Shape(CursorIcon::Default)
    }
}

impl Default for WindowCursor {
    fn default() -> Self {
        Self::arrow()
    }
}

impl From<CursorIcon> for WindowCursor {
    fn from(icon: CursorIcon) -> Self {
        WindowCursor::Shape(icon)
    }
}
