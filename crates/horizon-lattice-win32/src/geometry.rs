//! Integer geometry in native device pixels.
//!
//! Rectangles use origin-plus-extent form. The right and bottom edges returned
//! by [`Rect::right`] and [`Rect::bottom`] are exclusive, matching native
//! `RECT` semantics.

use std::ops::{Add, AddAssign, Neg, Sub};

/// Largest width or height a window may request.
pub const WINDOW_SIZE_MAX: i32 = (1 << 24) - 1;

/// A point in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Whether both coordinates are zero.
    pub const fn is_null(self) -> bool {
        self.x == 0 && self.y == 0
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Point {
    type Output = Point;

    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

/// A size in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// A size with a non-positive extent in either dimension.
    pub const fn is_empty(self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Whether both extents are zero.
    pub const fn is_null(self) -> bool {
        self.width == 0 && self.height == 0
    }

    /// Both extents are non-negative.
    pub const fn is_valid(self) -> bool {
        self.width >= 0 && self.height >= 0
    }

    pub fn bounded_to(self, other: Size) -> Size {
        Size::new(self.width.min(other.width), self.height.min(other.height))
    }

    pub fn expanded_to(self, other: Size) -> Size {
        Size::new(self.width.max(other.width), self.height.max(other.height))
    }
}

/// Distances from each edge of a rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Margins {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Margins {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// The same distance on every side.
    pub const fn uniform(value: i32) -> Self {
        Self::new(value, value, value, value)
    }

    pub const fn is_null(self) -> bool {
        self.left == 0 && self.top == 0 && self.right == 0 && self.bottom == 0
    }

    /// Combined left and right margin.
    pub const fn horizontal(self) -> i32 {
        self.left + self.right
    }

    /// Combined top and bottom margin.
    pub const fn vertical(self) -> i32 {
        self.top + self.bottom
    }
}

impl Add for Margins {
    type Output = Margins;

    fn add(self, rhs: Margins) -> Margins {
        Margins::new(
            self.left + rhs.left,
            self.top + rhs.top,
            self.right + rhs.right,
            self.bottom + rhs.bottom,
        )
    }
}

impl AddAssign for Margins {
    fn add_assign(&mut self, rhs: Margins) {
        *self = *self + rhs;
    }
}

/// An axis-aligned rectangle in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub const fn from_origin_size(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    /// Builds a rectangle from native edges with exclusive right and bottom.
    pub const fn from_edges(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self::new(left, top, right - left, bottom - top)
    }

    pub const fn left(&self) -> i32 {
        self.x
    }

    pub const fn top(&self) -> i32 {
        self.y
    }

    /// Exclusive right edge.
    pub const fn right(&self) -> i32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    pub const fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub const fn top_left(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub const fn center(&self) -> Point {
        Point::new(self.x + self.width / 2, self.y + self.height / 2)
    }

    /// Both extents are strictly positive.
    pub const fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    pub const fn is_empty(&self) -> bool {
        !self.is_valid()
    }

    pub const fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right() && other.x < self.right() && self.y < other.bottom() && other.y < self.bottom()
    }

    /// Smallest rectangle containing both.
    pub fn united(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Rect::from_edges(
            self.x.min(other.x),
            self.y.min(other.y),
            self.right().max(other.right()),
            self.bottom().max(other.bottom()),
        )
    }

    pub fn translated(&self, offset: Point) -> Rect {
        Rect::new(self.x + offset.x, self.y + offset.y, self.width, self.height)
    }

    pub fn moved_to(&self, origin: Point) -> Rect {
        Rect::from_origin_size(origin, self.size())
    }

    pub fn with_size(&self, size: Size) -> Rect {
        Rect::from_origin_size(self.top_left(), size)
    }

    /// Grows the rectangle outward by `margins`.
    pub fn margins_added(&self, margins: Margins) -> Rect {
        Rect::new(
            self.x - margins.left,
            self.y - margins.top,
            self.width + margins.horizontal(),
            self.height + margins.vertical(),
        )
    }

    /// Shrinks the rectangle inward by `margins`.
    pub fn margins_removed(&self, margins: Margins) -> Rect {
        Rect::new(
            self.x + margins.left,
            self.y + margins.top,
            self.width - margins.horizontal(),
            self.height - margins.vertical(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn margins_round_trip_through_rect() {
        let client = Rect::new(100, 100, 400, 300);
        let margins = Margins::new(8, 31, 8, 8);
        let frame = client.margins_added(margins);
        assert_eq!(frame, Rect::new(92, 69, 416, 339));
        assert_eq!(frame.margins_removed(margins), client);
    }

    #[test]
    fn contains_excludes_far_edges() {
        let r = Rect::new(0, 0, 10, 10);
        assert!(r.contains(Point::new(0, 0)));
        assert!(r.contains(Point::new(9, 9)));
        assert!(!r.contains(Point::new(10, 5)));
        assert!(!r.contains(Point::new(5, -1)));
    }

    #[test]
    fn united_skips_empty_rects() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(20, 5, 5, 20);
        assert_eq!(a.united(&b), Rect::new(0, 0, 25, 25));
        assert_eq!(a.united(&Rect::default()), a);
    }

    #[test]
    fn size_emptiness() {
        assert!(Size::new(0, 10).is_empty());
        assert!(!Size::new(1, 1).is_empty());
        assert!(Size::new(0, 0).is_null());
        assert!(WINDOW_SIZE_MAX == 16_777_215);
    }
}
