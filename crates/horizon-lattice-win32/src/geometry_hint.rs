//! Size constraints and frame arithmetic.
//!
//! [`GeometryHint`] carries a window's minimum and maximum client size in
//! device pixels together with any custom non-client margins, and knows how
//! to feed them into the system's size-negotiation queries.

use tracing::{debug, warn};

use crate::geometry::{Margins, Rect, Size, WINDOW_SIZE_MAX};
use crate::host::{MinMaxInfo, NativeHost};
use crate::logging::targets;
use crate::style::{WindowExStyle, WindowStyle};
use crate::toolkit::ToolkitWindow;

/// Scales a size constraint by `factor`, leaving zero and unbounded
/// components untouched.
pub fn to_native_size_constrained(size: Size, factor: f64) -> Size {
    if factor == 1.0 {
        return size;
    }
    let scale = |v: i32| {
        if v > 0 && v < WINDOW_SIZE_MAX {
            (v as f64 * factor).round() as i32
        } else {
            v
        }
    };
    Size::new(scale(size.width), scale(size.height))
}

/// Geometry constraints ready to apply to a size negotiation, taking the
/// frame into account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryHint {
    pub minimum_size: Size,
    pub maximum_size: Size,
    pub custom_margins: Margins,
}

impl Default for GeometryHint {
    fn default() -> Self {
        Self {
            minimum_size: Size::default(),
            maximum_size: Size::new(WINDOW_SIZE_MAX, WINDOW_SIZE_MAX),
            custom_margins: Margins::default(),
        }
    }
}

impl GeometryHint {
    /// Builds a hint from native sizes. A minimum above the maximum is kept
    /// as given.
    pub fn new(minimum_size: Size, maximum_size: Size, custom_margins: Margins) -> Self {
        if minimum_size.width > maximum_size.width || minimum_size.height > maximum_size.height {
            warn!(
                target: targets::WINDOWS,
                ?minimum_size,
                ?maximum_size,
                "minimum size exceeds maximum size"
            );
        }
        Self {
            minimum_size,
            maximum_size,
            custom_margins,
        }
    }

    /// The hint for `window`, scaled by its device pixel ratio.
    pub fn from_window(window: &ToolkitWindow, custom_margins: Margins) -> Self {
        let ratio = window.device_pixel_ratio();
        Self::new(
            to_native_size_constrained(window.minimum_size(), ratio),
            to_native_size_constrained(window.maximum_size(), ratio),
            custom_margins,
        )
    }

    /// Whether `size` lies within the closed box spanned by the constraints.
    pub fn valid_size(&self, size: Size) -> bool {
        size.width >= self.minimum_size.width
            && size.width <= self.maximum_size.width
            && size.height >= self.minimum_size.height
            && size.height <= self.maximum_size.height
    }

    /// Frame margins the system adds for a style pair.
    ///
    /// Failures are logged and yield zero margins.
    pub fn frame(host: &dyn NativeHost, style: WindowStyle, ex_style: WindowExStyle) -> Margins {
        match host.adjust_window_rect(Rect::default(), style, ex_style) {
            Ok(rect) => {
                let margins = Margins::new(
                    rect.left().abs(),
                    rect.top().abs(),
                    rect.right().abs(),
                    rect.bottom().abs(),
                );
                debug!(target: targets::WINDOWS, ?style, ?ex_style, ?margins, "frame margins");
                margins
            }
            Err(err) => {
                warn!(target: targets::WINDOWS, ?style, ?ex_style, %err, "unable to compute frame margins");
                Margins::default()
            }
        }
    }

    /// Adds frame and custom margins to the constraints and writes them into
    /// the tracking limits. Unbounded maxima leave the system default alone.
    pub fn apply_to_size_constraints(
        &self,
        host: &dyn NativeHost,
        style: WindowStyle,
        ex_style: WindowExStyle,
        info: &mut MinMaxInfo,
    ) {
        let margins = Self::frame(host, style, ex_style);
        let frame_width = margins.horizontal() + self.custom_margins.horizontal();
        let frame_height = margins.vertical() + self.custom_margins.vertical();
        if self.minimum_size.width > 0 {
            info.min_track_size.x = self.minimum_size.width + frame_width;
        }
        if self.minimum_size.height > 0 {
            info.min_track_size.y = self.minimum_size.height + frame_height;
        }
        let maximum_width = self.maximum_size.width.max(self.minimum_size.width);
        let maximum_height = self.maximum_size.height.max(self.minimum_size.height);
        if maximum_width < WINDOW_SIZE_MAX {
            info.max_track_size.x = maximum_width + frame_width;
        }
        if maximum_height < WINDOW_SIZE_MAX {
            info.max_track_size.y = maximum_height + frame_height;
        }
        debug!(
            target: targets::WINDOWS,
            min = ?self.minimum_size,
            max = ?self.maximum_size,
            ?margins,
            custom_margins = ?self.custom_margins,
            ?info,
            "applied size constraints"
        );
    }

    /// Shrinks a computed client rectangle by custom margins.
    ///
    /// Returns `false`, leaving the rectangle alone, when there are none.
    pub fn handle_calculate_size(custom_margins: Margins, client: &mut Rect) -> bool {
        if custom_margins.is_null() {
            return false;
        }
        let before = *client;
        *client = client.margins_removed(custom_margins);
        debug!(target: targets::WINDOWS, ?before, ?custom_margins, after = ?*client, "calculate size");
        true
    }

    /// Whether the requested position of `window` refers to its frame.
    pub fn position_includes_frame(window: &ToolkitWindow) -> bool {
        window.attributes().position_includes_frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::host::HeadlessHost;

    #[test]
    fn valid_size_accepts_closed_box() {
        let hint = GeometryHint::new(Size::new(100, 50), Size::new(300, 200), Margins::default());
        for size in [
            Size::new(100, 50),
            Size::new(300, 200),
            Size::new(100, 200),
            Size::new(200, 120),
        ] {
            assert!(hint.valid_size(size), "{size:?}");
        }
        for size in [
            Size::new(99, 100),
            Size::new(301, 100),
            Size::new(150, 49),
            Size::new(150, 201),
        ] {
            assert!(!hint.valid_size(size), "{size:?}");
        }
    }

    #[test]
    fn degenerate_constraints_pass_through() {
        let hint = GeometryHint::new(Size::new(500, 500), Size::new(100, 100), Margins::default());
        assert_eq!(hint.minimum_size, Size::new(500, 500));
        assert_eq!(hint.maximum_size, Size::new(100, 100));
    }

    #[test]
    fn frame_is_deterministic() {
        let host = HeadlessHost::new();
        let a = GeometryHint::frame(&host, WindowStyle::OVERLAPPED_WINDOW, WindowExStyle::empty());
        let b = GeometryHint::frame(&host, WindowStyle::OVERLAPPED_WINDOW, WindowExStyle::empty());
        assert_eq!(a, b);
        assert_eq!(a, Margins::new(8, 31, 8, 8));
    }

    #[test]
    fn frame_failure_yields_zero_margins() {
        let host = HeadlessHost::new();
        host.set_fail_adjust(true);
        assert_eq!(
            GeometryHint::frame(&host, WindowStyle::OVERLAPPED_WINDOW, WindowExStyle::empty()),
            Margins::default()
        );
    }

    #[test]
    fn size_constraints_include_frame_and_custom_margins() {
        let host = HeadlessHost::new();
        let hint = GeometryHint::new(
            Size::new(200, 100),
            Size::new(WINDOW_SIZE_MAX, 400),
            Margins::new(0, 10, 0, 0),
        );
        let mut info = MinMaxInfo {
            max_track_size: Point::new(5000, 5000),
            ..MinMaxInfo::default()
        };
        hint.apply_to_size_constraints(
            &host,
            WindowStyle::OVERLAPPED_WINDOW,
            WindowExStyle::empty(),
            &mut info,
        );
        assert_eq!(info.min_track_size, Point::new(216, 149));
        assert_eq!(info.max_track_size, Point::new(5000, 449));
    }

    #[test]
    fn zero_minimum_leaves_system_default() {
        let host = HeadlessHost::new();
        let mut info = MinMaxInfo {
            min_track_size: Point::new(136, 39),
            ..MinMaxInfo::default()
        };
        GeometryHint::default().apply_to_size_constraints(
            &host,
            WindowStyle::POPUP,
            WindowExStyle::empty(),
            &mut info,
        );
        assert_eq!(info.min_track_size, Point::new(136, 39));
    }

    #[test]
    fn scaling_skips_sentinels() {
        let scaled = to_native_size_constrained(Size::new(100, WINDOW_SIZE_MAX), 1.5);
        assert_eq!(scaled, Size::new(150, WINDOW_SIZE_MAX));
        assert_eq!(to_native_size_constrained(Size::new(0, 10), 2.0), Size::new(0, 20));
    }

    #[test]
    fn calculate_size_applies_custom_margins() {
        let mut client = Rect::new(0, 0, 100, 100);
        assert!(!GeometryHint::handle_calculate_size(Margins::default(), &mut client));
        assert!(GeometryHint::handle_calculate_size(Margins::new(0, 20, 0, 0), &mut client));
        assert_eq!(client, Rect::new(0, 20, 100, 80));
    }
}
