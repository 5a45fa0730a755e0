//! Native window style bitmasks.
//!
//! Bit values match the Win32 `WS_*` and `WS_EX_*` constants so a host can
//! pass [`WindowStyle::bits`] straight to the system.

use bitflags::bitflags;

bitflags! {
    /// Window style bits (`WS_*`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct WindowStyle: u32 {
        const POPUP = 0x8000_0000;
        const CHILD = 0x4000_0000;
        const MINIMIZE = 0x2000_0000;
        const VISIBLE = 0x1000_0000;
        const DISABLED = 0x0800_0000;
        const CLIP_SIBLINGS = 0x0400_0000;
        const CLIP_CHILDREN = 0x0200_0000;
        const MAXIMIZE = 0x0100_0000;
        const BORDER = 0x0080_0000;
        const DLG_FRAME = 0x0040_0000;
        const VSCROLL = 0x0020_0000;
        const HSCROLL = 0x0010_0000;
        const SYS_MENU = 0x0008_0000;
        const THICK_FRAME = 0x0004_0000;
        const MINIMIZE_BOX = 0x0002_0000;
        const MAXIMIZE_BOX = 0x0001_0000;

        /// Title bar; a border plus a dialog frame.
        const CAPTION = Self::BORDER.bits() | Self::DLG_FRAME.bits();
        /// Standard resizable top-level window.
        const OVERLAPPED_WINDOW = Self::CAPTION.bits()
            | Self::SYS_MENU.bits()
            | Self::THICK_FRAME.bits()
            | Self::MINIMIZE_BOX.bits()
            | Self::MAXIMIZE_BOX.bits();
        /// Bordered popup with a system menu.
        const POPUP_WINDOW = Self::POPUP.bits() | Self::BORDER.bits() | Self::SYS_MENU.bits();
    }
}

impl WindowStyle {
    /// `WS_OVERLAPPED` has no bits set.
    pub const OVERLAPPED: WindowStyle = WindowStyle::empty();

    /// Whether the style carries a full title bar.
    pub fn has_caption(self) -> bool {
        self.contains(WindowStyle::CAPTION)
    }
}

bitflags! {
    /// Extended window style bits (`WS_EX_*`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct WindowExStyle: u32 {
        const DLG_MODAL_FRAME = 0x0000_0001;
        const TOPMOST = 0x0000_0008;
        const ACCEPT_FILES = 0x0000_0010;
        const TRANSPARENT = 0x0000_0020;
        const TOOL_WINDOW = 0x0000_0080;
        const WINDOW_EDGE = 0x0000_0100;
        const CLIENT_EDGE = 0x0000_0200;
        const CONTEXT_HELP = 0x0000_0400;
        const APP_WINDOW = 0x0004_0000;
        const LAYERED = 0x0008_0000;
        const NO_ACTIVATE = 0x0800_0000;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_match_native_values() {
        assert_eq!(WindowStyle::CAPTION.bits(), 0x00C0_0000);
        assert_eq!(WindowStyle::OVERLAPPED_WINDOW.bits(), 0x00CF_0000);
        assert_eq!(WindowStyle::POPUP_WINDOW.bits(), 0x8088_0000);
        assert_eq!(WindowExStyle::LAYERED.bits(), 0x0008_0000);
        assert!(WindowStyle::OVERLAPPED.is_empty());
    }

    #[test]
    fn caption_requires_both_bits() {
        assert!(!WindowStyle::BORDER.has_caption());
        assert!((WindowStyle::BORDER | WindowStyle::DLG_FRAME).has_caption());
    }
}
