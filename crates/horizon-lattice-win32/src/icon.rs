//! Window icon support.
//!
//! A [`WindowIcon`] holds one RGBA image. When applied to a window it is
//! scaled to the system's small and large icon sizes and handed to the host.

use std::path::Path;

use image::{imageops::FilterType, RgbaImage};

use crate::error::{PlatformError, PlatformResult};
use crate::geometry::Size;

/// Which of the two native icon slots an icon fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IconKind {
    /// Title bar and taskbar icon.
    Small,
    /// Alt+Tab icon.
    Big,
}

impl IconKind {
    /// Native `ICON_SMALL` / `ICON_BIG` value.
    pub fn raw(self) -> usize {
        match self {
            IconKind::Small => 0,
            IconKind::Big => 1,
        }
    }
}

/// A window icon that can be set on a native window.
///
/// # Example
///
/// ```
/// use horizon_lattice_win32::WindowIcon;
///
/// // A 1x1 red pixel
/// let icon = WindowIcon::from_rgba(vec![255, 0, 0, 255], 1, 1).unwrap();
/// assert_eq!(icon.width(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct WindowIcon {
    image: RgbaImage,
}

impl WindowIcon {
    /// Creates an icon from row-major RGBA pixel data.
    ///
    /// # Errors
    ///
    /// Fails when either dimension is zero or the data length is not
    /// `width * height * 4`.
    pub fn from_rgba(rgba: Vec<u8>, width: u32, height: u32) -> PlatformResult<Self> {
        if width == 0 || height == 0 {
            return Err(PlatformError::InvalidIcon(
                "width and height must be non-zero".into(),
            ));
        }
        let expected = (width as usize) * (height as usize) * 4;
        let actual = rgba.len();
        let image = RgbaImage::from_raw(width, height, rgba).ok_or_else(|| {
            PlatformError::InvalidIcon(format!("expected {expected} bytes, got {actual}"))
        })?;
        Ok(Self { image })
    }

    /// Loads an icon from an image file in any format `image` can decode.
    pub fn from_path(path: impl AsRef<Path>) -> PlatformResult<Self> {
        let path = path.as_ref();
        let img = image::open(path)
            .map_err(|e| PlatformError::InvalidIcon(format!("{}: {e}", path.display())))?;
        Ok(Self {
            image: img.to_rgba8(),
        })
    }

    /// Loads an icon from encoded image bytes. The format is auto-detected.
    pub fn from_memory(data: &[u8]) -> PlatformResult<Self> {
        let img = image::load_from_memory(data)
            .map_err(|e| PlatformError::InvalidIcon(format!("failed to decode image: {e}")))?;
        Ok(Self {
            image: img.to_rgba8(),
        })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// The largest size that fits in `bounds` while keeping the aspect ratio.
    ///
    /// Icons are never scaled up.
    pub fn actual_size(&self, bounds: Size) -> Size {
        let (w, h) = (self.width() as i64, self.height() as i64);
        let (bw, bh) = (bounds.width.max(1) as i64, bounds.height.max(1) as i64);
        if w <= bw && h <= bh {
            return Size::new(w as i32, h as i32);
        }
        if w * bh > h * bw {
            Size::new(bw as i32, ((h * bw) / w).max(1) as i32)
        } else {
            Size::new(((w * bh) / h).max(1) as i32, bh as i32)
        }
    }

    /// Renders the icon at [`WindowIcon::actual_size`] for `bounds`.
    pub fn rendered(&self, bounds: Size) -> RgbaImage {
        let size = self.actual_size(bounds);
        if size.width as u32 == self.width() && size.height as u32 == self.height() {
            return self.image.clone();
        }
        image::imageops::resize(
            &self.image,
            size.width as u32,
            size.height as u32,
            FilterType::Lanczos3,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32) -> WindowIcon {
        WindowIcon::from_rgba(vec![0x80; (width * height * 4) as usize], width, height).unwrap()
    }

    #[test]
    fn test_from_rgba_rejects_bad_input() {
        assert!(WindowIcon::from_rgba(vec![], 0, 1).is_err());
        let err = WindowIcon::from_rgba(vec![0; 7], 1, 2).unwrap_err();
        assert_eq!(
            err,
            PlatformError::InvalidIcon("expected 8 bytes, got 7".into())
        );
    }

    #[test]
    fn test_actual_size_keeps_aspect() {
        let icon = solid(64, 32);
        assert_eq!(icon.actual_size(Size::new(16, 16)), Size::new(16, 8));
        assert_eq!(icon.actual_size(Size::new(128, 128)), Size::new(64, 32));
    }

    #[test]
    fn test_rendered_dimensions() {
        let icon = solid(48, 48);
        let small = icon.rendered(Size::new(16, 16));
        assert_eq!(small.dimensions(), (16, 16));
    }

    #[test]
    fn test_from_memory_rejects_garbage() {
        assert!(matches!(
            WindowIcon::from_memory(b"not an image"),
            Err(PlatformError::InvalidIcon(_))
        ));
    }
}
