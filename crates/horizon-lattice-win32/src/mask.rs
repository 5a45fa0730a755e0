//! Window masks.
//!
//! A mask limits the visible and input-sensitive part of a window. Masks are
//! expressed in client coordinates; the platform window shifts them into
//! frame coordinates before handing them to the host.

use crate::geometry::{Point, Rect};

/// A shape that defines the visible region of a window.
///
/// # Example
///
/// ```
/// use horizon_lattice_win32::{Rect, WindowMask};
///
/// let combined = WindowMask::union(&[
///     WindowMask::rect(Rect::new(0, 0, 100, 200)),
///     WindowMask::ellipse(Rect::new(100, 50, 100, 100)),
/// ]);
/// assert_eq!(combined.bounds(), Rect::new(0, 0, 200, 200));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowMask {
    shape: MaskShape,
}

/// The geometric primitive behind a [`WindowMask`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaskShape {
    Rect(Rect),
    /// Rounded rectangle with the corner radius.
    RoundedRect(Rect, i32),
    /// Ellipse inscribed in the rectangle.
    Ellipse(Rect),
    /// Closed polygon.
    Polygon(Vec<Point>),
    Union(Vec<WindowMask>),
}

impl WindowMask {
    /// The empty mask, which removes any mask from a window.
    pub fn empty() -> Self {
        Self {
            shape: MaskShape::Union(Vec::new()),
        }
    }

    pub fn rect(rect: Rect) -> Self {
        Self {
            shape: MaskShape::Rect(rect),
        }
    }

    /// Rounded rectangle. The radius is clamped to half the smaller side.
    pub fn rounded_rect(rect: Rect, radius: i32) -> Self {
        let radius = radius.clamp(0, rect.width.min(rect.height).max(0) / 2);
        Self {
            shape: MaskShape::RoundedRect(rect, radius),
        }
    }

    pub fn ellipse(bounds: Rect) -> Self {
        Self {
            shape: MaskShape::Ellipse(bounds),
        }
    }

    /// A polygon mask. Fewer than three points yields the empty mask.
    pub fn polygon(points: impl Into<Vec<Point>>) -> Self {
        let points = points.into();
        if points.len() < 3 {
            return Self::empty();
        }
        Self {
            shape: MaskShape::Polygon(points),
        }
    }

    pub fn union(shapes: &[WindowMask]) -> Self {
        Self {
            shape: MaskShape::Union(shapes.to_vec()),
        }
    }

    pub fn shape(&self) -> &MaskShape {
        &self.shape
    }

    /// Whether the mask covers no area.
    pub fn is_empty(&self) -> bool {
        match &self.shape {
            MaskShape::Rect(r) | MaskShape::RoundedRect(r, _) | MaskShape::Ellipse(r) => {
                r.is_empty()
            }
            MaskShape::Polygon(points) => points.len() < 3,
            MaskShape::Union(parts) => parts.iter().all(WindowMask::is_empty),
        }
    }

    /// Bounding box of the mask.
    pub fn bounds(&self) -> Rect {
        match &self.shape {
            MaskShape::Rect(r) | MaskShape::RoundedRect(r, _) | MaskShape::Ellipse(r) => *r,
            MaskShape::Polygon(points) => {
                let mut iter = points.iter();
                let Some(first) = iter.next() else {
                    return Rect::default();
                };
                let (mut min, mut max) = (*first, *first);
                for p in iter {
                    min = Point::new(min.x.min(p.x), min.y.min(p.y));
                    max = Point::new(max.x.max(p.x), max.y.max(p.y));
                }
                Rect::from_edges(min.x, min.y, max.x, max.y)
            }
            MaskShape::Union(parts) => parts
                .iter()
                .fold(Rect::default(), |acc, part| acc.united(&part.bounds())),
        }
    }

    /// The mask moved by `offset`.
    pub fn translated(&self, offset: Point) -> WindowMask {
        let shape = match &self.shape {
            MaskShape::Rect(r) => MaskShape::Rect(r.translated(offset)),
            MaskShape::RoundedRect(r, radius) => MaskShape::RoundedRect(r.translated(offset), *radius),
            MaskShape::Ellipse(r) => MaskShape::Ellipse(r.translated(offset)),
            MaskShape::Polygon(points) => {
                MaskShape::Polygon(points.iter().map(|p| *p + offset).collect())
            }
            MaskShape::Union(parts) => {
                MaskShape::Union(parts.iter().map(|m| m.translated(offset)).collect())
            }
        };
        WindowMask { shape }
    }
}

impl Default for WindowMask {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_masks() {
        assert!(WindowMask::empty().is_empty());
        assert!(WindowMask::rect(Rect::new(0, 0, 0, 10)).is_empty());
        assert!(WindowMask::polygon(vec![Point::new(0, 0), Point::new(1, 1)]).is_empty());
        assert!(!WindowMask::ellipse(Rect::new(0, 0, 4, 4)).is_empty());
    }

    #[test]
    fn test_rounded_radius_clamped() {
        let mask = WindowMask::rounded_rect(Rect::new(0, 0, 40, 20), 50);
        assert_eq!(mask.shape(), &MaskShape::RoundedRect(Rect::new(0, 0, 40, 20), 10));
    }

    #[test]
    fn test_translated_moves_every_part() {
        let mask = WindowMask::union(&[
            WindowMask::rect(Rect::new(0, 0, 10, 10)),
            WindowMask::polygon(vec![Point::new(0, 0), Point::new(10, 0), Point::new(0, 10)]),
        ]);
        let moved = mask.translated(Point::new(8, 31));
        assert_eq!(moved.bounds(), Rect::new(8, 31, 10, 10));
    }
}
