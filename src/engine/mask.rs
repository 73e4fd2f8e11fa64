//! Pixel masks for exact-shape overlap testing
//!
//! A mask is a per-pixel opacity bitmap derived from a surface. Overlap tests
//! take the other mask's top-left position relative to this mask's top-left.

use glam::IVec2;

use super::geometry::{Point, Rect, Vector};
use super::surface::{Colour, Surface};

/// Alpha values above this count as opaque.
pub const ALPHA_THRESHOLD: u8 = 127;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: i32,
    height: i32,
    bits: Vec<bool>,
}

impl Mask {
    /// Empty mask of the given size.
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            width,
            height,
            bits: vec![false; (width * height) as usize],
        }
    }

    /// Mask with every pixel set.
    pub fn full(width: i32, height: i32) -> Self {
        let mut mask = Self::new(width, height);
        mask.bits.fill(true);
        mask
    }

    /// Opaque pixels of the whole surface.
    pub fn from_surface(surface: &Surface) -> Self {
        Self::from_surface_area(surface, surface.rect())
    }

    /// Opaque pixels of `area` only; the mask keeps the surface's size.
    pub fn from_surface_area(surface: &Surface, area: Rect) -> Self {
        let mut mask = Self::new(surface.width(), surface.height());
        let Some(area) = area.clip(&surface.rect()) else {
            return mask;
        };
        for y in area.top()..area.bottom() {
            for x in area.left()..area.right() {
                if surface.alpha_at(x, y) > ALPHA_THRESHOLD {
                    mask.set(x, y, true);
                }
            }
        }
        mask
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn size(&self) -> IVec2 {
        IVec2::new(self.width, self.height)
    }

    #[inline]
    pub fn get(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height && self.bits[(y * self.width + x) as usize]
    }

    pub fn set(&mut self, x: i32, y: i32, value: bool) {
        if x >= 0 && y >= 0 && x < self.width && y < self.height {
            self.bits[(y * self.width + x) as usize] = value;
        }
    }

    /// Number of set pixels.
    pub fn count(&self) -> usize {
        self.bits.iter().filter(|b| **b).count()
    }

    pub fn is_empty(&self) -> bool {
        !self.bits.iter().any(|b| *b)
    }

    /// Region of this mask covered by `other` placed at `offset`, in this mask's frame.
    fn shared_area(&self, other: &Mask, offset: Vector) -> Option<Rect> {
        let own = Rect::new(0, 0, self.width, self.height);
        let theirs = Rect::from_pos_size(offset, other.size());
        own.clip(&theirs)
    }

    /// First overlapping pixel (row-major scan) in this mask's frame.
    pub fn overlap(&self, other: &Mask, offset: Vector) -> Option<Point> {
        let area = self.shared_area(other, offset)?;
        for y in area.top()..area.bottom() {
            for x in area.left()..area.right() {
                if self.get(x, y) && other.get(x - offset.x, y - offset.y) {
                    return Some(IVec2::new(x, y));
                }
            }
        }
        None
    }

    /// Number of overlapping pixels.
    pub fn overlap_area(&self, other: &Mask, offset: Vector) -> usize {
        let Some(area) = self.shared_area(other, offset) else {
            return 0;
        };
        let mut count = 0;
        for y in area.top()..area.bottom() {
            for x in area.left()..area.right() {
                if self.get(x, y) && other.get(x - offset.x, y - offset.y) {
                    count += 1;
                }
            }
        }
        count
    }

    /// Mask of overlapping pixels, the same size as this mask.
    pub fn overlap_mask(&self, other: &Mask, offset: Vector) -> Mask {
        let mut out = Mask::new(self.width, self.height);
        if let Some(area) = self.shared_area(other, offset) {
            for y in area.top()..area.bottom() {
                for x in area.left()..area.right() {
                    if self.get(x, y) && other.get(x - offset.x, y - offset.y) {
                        out.set(x, y, true);
                    }
                }
            }
        }
        out
    }

    /// OR `other` into this mask at `offset`.
    pub fn draw(&mut self, other: &Mask, offset: Vector) {
        let Some(area) = self.shared_area(other, offset) else {
            return;
        };
        for y in area.top()..area.bottom() {
            for x in area.left()..area.right() {
                if other.get(x - offset.x, y - offset.y) {
                    self.set(x, y, true);
                }
            }
        }
    }

    /// Bounding rectangles of the 8-connected regions of set pixels.
    pub fn bounding_rects(&self) -> Vec<Rect> {
        let mut seen = vec![false; self.bits.len()];
        let mut rects = Vec::new();
        let mut stack = Vec::new();

        for start in 0..self.bits.len() {
            if !self.bits[start] || seen[start] {
                continue;
            }
            seen[start] = true;
            stack.push(start);
            let first = IVec2::new(start as i32 % self.width, start as i32 / self.width);
            let (mut min, mut max) = (first, first);

            while let Some(i) = stack.pop() {
                let p = IVec2::new(i as i32 % self.width, i as i32 / self.width);
                min = min.min(p);
                max = max.max(p);
                for dy in -1..=1 {
                    for dx in -1..=1 {
                        let (nx, ny) = (p.x + dx, p.y + dy);
                        if self.get(nx, ny) {
                            let n = (ny * self.width + nx) as usize;
                            if !seen[n] {
                                seen[n] = true;
                                stack.push(n);
                            }
                        }
                    }
                }
            }
            rects.push(Rect::from_corners(min, max + IVec2::ONE));
        }
        rects
    }

    /// Union of the region bounding rectangles.
    ///
    /// Falls back to the full mask bounds when no region rectangle comes back,
    /// so a caller that found an overlap always gets a usable rectangle.
    pub fn bounding_rect(&self) -> Rect {
        let rects = self.bounding_rects();
        match rects.split_first() {
            Some((first, rest)) => rest.iter().fold(*first, |acc, r| acc.union(r)),
            None => {
                log::warn!(
                    "mask {}x{} produced no bounding rects, using full bounds",
                    self.width,
                    self.height
                );
                Rect::new(0, 0, self.width, self.height)
            }
        }
    }

    /// Render the mask as a surface for debug drawing.
    pub fn to_surface(&self, colour: Colour) -> Surface {
        let mut surface = Surface::new(self.width, self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                if self.get(x, y) {
                    surface.set(x, y, colour);
                }
            }
        }
        surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn mask_from_rows(rows: &[&str]) -> Mask {
        let height = rows.len() as i32;
        let width = rows.first().map_or(0, |r| r.len()) as i32;
        let mut mask = Mask::new(width, height);
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                mask.set(x as i32, y as i32, c == '#');
            }
        }
        mask
    }

    #[test]
    fn test_from_surface_uses_alpha_threshold() {
        let mut surface = Surface::new(3, 1);
        surface.set(0, 0, Colour::rgba(0, 0, 0, 255));
        surface.set(1, 0, Colour::rgba(0, 0, 0, 127));
        surface.set(2, 0, Colour::rgba(0, 0, 0, 128));
        let mask = Mask::from_surface(&surface);
        assert!(mask.get(0, 0));
        assert!(!mask.get(1, 0));
        assert!(mask.get(2, 0));
    }

    #[test]
    fn test_from_surface_area_restricts_pixels() {
        let surface = Surface::filled(10, 10, Colour::BLACK);
        let mask = Mask::from_surface_area(&surface, Rect::new(2, 6, 5, 4));
        assert_eq!(mask.size(), IVec2::new(10, 10));
        assert_eq!(mask.count(), 20);
        assert!(!mask.get(0, 0));
        assert!(mask.get(2, 6));
    }

    #[test]
    fn test_overlap_of_offset_squares() {
        let a = Mask::full(40, 40);
        let b = Mask::full(40, 40);
        assert_eq!(a.overlap(&b, IVec2::new(20, 20)), Some(IVec2::new(20, 20)));
        assert_eq!(a.overlap_area(&b, IVec2::new(20, 20)), 400);
        assert_eq!(a.overlap(&b, IVec2::new(40, 40)), None);
        assert_eq!(a.overlap(&b, IVec2::new(-40, 0)), None);
    }

    #[test]
    fn test_overlap_respects_holes() {
        let ring = mask_from_rows(&["###", "#.#", "###"]);
        let dot = Mask::full(1, 1);
        assert_eq!(ring.overlap(&dot, IVec2::new(1, 1)), None);
        assert_eq!(ring.overlap(&dot, IVec2::new(2, 1)), Some(IVec2::new(2, 1)));
    }

    #[test]
    fn test_bounding_rects_splits_regions() {
        let mask = mask_from_rows(&["##...", "##...", ".....", "...#.", "....#"]);
        let rects = mask.bounding_rects();
        assert_eq!(rects.len(), 2);
        assert!(rects.contains(&Rect::new(0, 0, 2, 2)));
        assert!(rects.contains(&Rect::new(3, 3, 2, 2)));
        assert_eq!(mask.bounding_rect(), Rect::new(0, 0, 5, 5));
    }

    #[test]
    fn test_bounding_rect_falls_back_to_full_bounds() {
        let mask = Mask::new(7, 3);
        assert!(mask.bounding_rects().is_empty());
        assert_eq!(mask.bounding_rect(), Rect::new(0, 0, 7, 3));
    }

    #[test]
    fn test_draw_unions_masks() {
        let mut base = Mask::new(4, 4);
        base.draw(&Mask::full(2, 2), IVec2::new(3, 3));
        assert_eq!(base.count(), 1);
        assert!(base.get(3, 3));
    }

    fn arb_mask() -> impl Strategy<Value = Mask> {
        (1i32..12, 1i32..12).prop_flat_map(|(w, h)| {
            proptest::collection::vec(any::<bool>(), (w * h) as usize).prop_map(move |bits| {
                let mut mask = Mask::new(w, h);
                for (i, bit) in bits.into_iter().enumerate() {
                    mask.set(i as i32 % w, i as i32 / w, bit);
                }
                mask
            })
        })
    }

    proptest! {
        #[test]
        fn test_overlap_is_symmetric(a in arb_mask(), b in arb_mask(), dx in -14i32..14, dy in -14i32..14) {
            let d = IVec2::new(dx, dy);
            prop_assert_eq!(a.overlap(&b, d).is_some(), b.overlap(&a, -d).is_some());
            prop_assert_eq!(a.overlap_area(&b, d), b.overlap_area(&a, -d));
        }
    }
}
