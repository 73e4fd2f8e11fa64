//! Boundary styles
//!
//! A boundary style turns a movement candidate into the accepted position.
//! `RectangleBoundary` clamps into a fixed rectangle. `CollisionBoundary`
//! probes the scene through a [`CollisionProbe`], retrying finer and
//! axis-split candidates so movers slide along walls instead of sticking.

use std::fmt;

use glam::IVec2;

use super::arena::ObjectId;
use super::event::Contact;
use super::geometry::{Point, Rect, unit_step};

/// Scene queries for one mover placed at trial positions.
pub trait CollisionProbe {
    /// The mover's current accepted position.
    fn position(&self) -> Point;

    /// First contact (collision or interaction) with the mover at `pos`, in
    /// pick priority order.
    fn contact_at(&mut self, pos: Point) -> Option<Contact>;

    /// Every object the mover blocks against at `pos`.
    fn collisions_at(&mut self, pos: Point) -> Vec<ObjectId>;
}

/// Axes that were blocked by the last resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Blocked {
    pub horizontally: bool,
    pub vertically: bool,
}

impl Blocked {
    pub const FULL: Blocked = Blocked {
        horizontally: true,
        vertically: true,
    };

    pub fn any(&self) -> bool {
        self.horizontally || self.vertically
    }

    pub fn is_full(&self) -> bool {
        self.horizontally && self.vertically
    }
}

pub trait BoundaryStyle: fmt::Debug {
    /// Resolve `new_pos` for the mover behind `probe`.
    fn bounded_position(&mut self, probe: &mut dyn CollisionProbe, new_pos: Point) -> Point;

    fn blocked(&self) -> Blocked;

    /// First contact seen during the last resolution, at most once.
    fn take_contact(&mut self) -> Option<Contact> {
        None
    }
}

/// Keeps the mover inside a rectangle.
#[derive(Debug, Clone)]
pub struct RectangleBoundary {
    rect: Rect,
    blocked: Blocked,
}

impl RectangleBoundary {
    pub fn new(rect: Rect) -> Self {
        Self {
            rect,
            blocked: Blocked::default(),
        }
    }

    /// Rectangle grown by `grow` pixels on each axis, half on each side.
    pub fn grown(rect: Rect, grow: i32) -> Self {
        Self::new(rect.inflate(grow, grow))
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Clamp without a probe, updating the blocked flags.
    pub fn clamp(&mut self, new_pos: Point) -> Point {
        let bounded = self.rect.bound_point(new_pos);
        self.blocked = Blocked {
            horizontally: bounded.x != new_pos.x,
            vertically: bounded.y != new_pos.y,
        };
        bounded
    }
}

impl BoundaryStyle for RectangleBoundary {
    fn bounded_position(&mut self, _probe: &mut dyn CollisionProbe, new_pos: Point) -> Point {
        self.clamp(new_pos)
    }

    fn blocked(&self) -> Blocked {
        self.blocked
    }
}

/// Pixel-collision boundary with sliding.
#[derive(Debug, Clone, Default)]
pub struct CollisionBoundary {
    blocked: Blocked,
    contact: Option<Contact>,
}

impl CollisionBoundary {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the mover would be blocked at `pos`. Records the first
    /// contact of the resolution, blocking or not.
    fn blocks(&mut self, probe: &mut dyn CollisionProbe, pos: Point) -> bool {
        match probe.contact_at(pos) {
            Some(contact) => {
                if self.contact.is_none() {
                    self.contact = Some(contact);
                }
                contact.is_collision()
            }
            None => false,
        }
    }

    /// Moving to `test_pos` touches no obstacle the mover is not already
    /// overlapping at `cur_pos`.
    fn collides_with_subset_from(
        &self,
        probe: &mut dyn CollisionProbe,
        cur_pos: Point,
        test_pos: Point,
    ) -> bool {
        let current = probe.collisions_at(cur_pos);
        probe
            .collisions_at(test_pos)
            .iter()
            .all(|obstacle| current.contains(obstacle))
    }
}

impl BoundaryStyle for CollisionBoundary {
    fn bounded_position(&mut self, probe: &mut dyn CollisionProbe, new_pos: Point) -> Point {
        self.blocked = Blocked::default();
        self.contact = None;

        if !self.blocks(probe, new_pos) {
            return new_pos;
        }

        let cur_pos = probe.position();
        let offset = new_pos - cur_pos;

        for divisor in [2, 3] {
            let test_pos = cur_pos + offset / divisor;
            if !self.blocks(probe, test_pos) {
                return test_pos;
            }
        }

        let test_pos = cur_pos + unit_step(offset);
        if !self.blocks(probe, test_pos) {
            return test_pos;
        }

        if offset.x != 0 {
            let h_pos = cur_pos + IVec2::new(offset.x, 0);
            if !self.blocks(probe, h_pos) {
                self.blocked.vertically = true;
                return h_pos;
            }
        }

        if offset.y != 0 {
            let v_pos = cur_pos + IVec2::new(0, offset.y);
            if !self.blocks(probe, v_pos) {
                self.blocked.horizontally = true;
                return v_pos;
            }
        }

        self.blocked = Blocked::FULL;
        if self.collides_with_subset_from(probe, cur_pos, test_pos) {
            log::debug!("mover already overlapping at {cur_pos}, accepting {new_pos}");
            self.blocked = Blocked::default();
            return new_pos;
        }
        cur_pos
    }

    fn blocked(&self) -> Blocked {
        self.blocked
    }

    fn take_contact(&mut self) -> Option<Contact> {
        self.contact.take()
    }
}
