//! Geometry primitives
//!
//! Integer pixel coordinates with y growing downward (screen convention).
//! Points and vectors are `glam::IVec2`; rectangles are axis-aligned and stored
//! as top-left plus size.

use glam::IVec2;
use serde::{Deserialize, Serialize};

/// A position in pixels.
pub type Point = IVec2;
/// A displacement in pixels.
pub type Vector = IVec2;

/// The world origin.
pub const ORIGIN: Point = IVec2::ZERO;

/// Component-wise sign of a vector: the single-pixel step in its direction.
#[inline]
pub fn unit_step(v: Vector) -> Vector {
    v.signum()
}

/// One side of a rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

/// Axis-aligned rectangle.
///
/// `right()` and `bottom()` are `x + width` and `y + height`. Width and height
/// are never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
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
            width: if width < 0 { 0 } else { width },
            height: if height < 0 { 0 } else { height },
        }
    }

    /// Rectangle spanning two corners, in either order.
    pub fn from_corners(a: Point, b: Point) -> Self {
        let min = a.min(b);
        let max = a.max(b);
        Self::new(min.x, min.y, max.x - min.x, max.y - min.y)
    }

    pub fn from_pos_size(top_left: Point, size: IVec2) -> Self {
        Self::new(top_left.x, top_left.y, size.x, size.y)
    }

    #[inline]
    pub fn left(&self) -> i32 {
        self.x
    }

    #[inline]
    pub fn top(&self) -> i32 {
        self.y
    }

    #[inline]
    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    #[inline]
    pub fn top_left(&self) -> Point {
        IVec2::new(self.x, self.y)
    }

    #[inline]
    pub fn bottom_right(&self) -> Point {
        IVec2::new(self.right(), self.bottom())
    }

    #[inline]
    pub fn size(&self) -> IVec2 {
        IVec2::new(self.width, self.height)
    }

    pub fn center(&self) -> Point {
        IVec2::new(self.x + self.width / 2, self.y + self.height / 2)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Clamp a point into this rectangle, edges included.
    pub fn bound_point(&self, pos: Point) -> Point {
        IVec2::new(
            pos.x.clamp(self.left(), self.right()),
            pos.y.clamp(self.top(), self.bottom()),
        )
    }

    /// Inclusive containment on all four edges.
    pub fn contains_point(&self, pos: Point) -> bool {
        self.left() <= pos.x && pos.x <= self.right() && self.top() <= pos.y && pos.y <= self.bottom()
    }

    /// True when the two rectangles share at least one pixel.
    pub fn intersects(&self, other: &Rect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }

    /// The overlapping part of two rectangles, if any.
    pub fn clip(&self, other: &Rect) -> Option<Rect> {
        if !self.intersects(other) {
            return None;
        }
        let top_left = self.top_left().max(other.top_left());
        let bottom_right = self.bottom_right().min(other.bottom_right());
        Some(Rect::from_corners(top_left, bottom_right))
    }

    /// Smallest rectangle enclosing both.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect::from_corners(
            self.top_left().min(other.top_left()),
            self.bottom_right().max(other.bottom_right()),
        )
    }

    /// Half of the rectangle lying on the given side.
    pub fn collapse(&self, side: Side) -> Rect {
        let half_w = self.width / 2;
        let half_h = self.height / 2;
        match side {
            Side::Left => Rect::new(self.x, self.y, half_w, self.height),
            Side::Right => Rect::new(self.right() - half_w, self.y, half_w, self.height),
            Side::Top => Rect::new(self.x, self.y, self.width, half_h),
            Side::Bottom => Rect::new(self.x, self.bottom() - half_h, self.width, half_h),
        }
    }

    /// Grow (or shrink, for negative amounts) around the centre.
    pub fn inflate(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(self.x - dx / 2, self.y - dy / 2, self.width + dx, self.height + dy)
    }

    pub fn translate(&self, by: Vector) -> Rect {
        Rect::new(self.x + by.x, self.y + by.y, self.width, self.height)
    }
}
