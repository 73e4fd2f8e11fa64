//! Pixel surfaces and the render target seam
//!
//! A `Surface` is an RGBA pixel grid. The engine only needs its size and
//! per-pixel alpha for masks, and a way to blit it onto a `Canvas`.

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::geometry::{Point, Rect};

/// RGBA colour, 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Colour {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Colour {
    pub const BLACK: Colour = Colour::rgb(0, 0, 0);
    pub const WHITE: Colour = Colour::rgb(255, 255, 255);
    pub const RED: Colour = Colour::rgb(255, 0, 0);
    pub const GREEN: Colour = Colour::rgb(0, 255, 0);
    pub const BLUE: Colour = Colour::rgb(0, 0, 255);
    pub const PINK: Colour = Colour::rgb(255, 105, 180);
    pub const TRANSPARENT: Colour = Colour::rgba(0, 0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Source-over blend of `self` onto `dst`.
    fn over(self, dst: Colour) -> Colour {
        match self.a {
            255 => self,
            0 => dst,
            a => {
                let a = u32::from(a);
                let inv = 255 - a;
                let mix = |s: u8, d: u8| ((u32::from(s) * a + u32::from(d) * inv) / 255) as u8;
                Colour {
                    r: mix(self.r, dst.r),
                    g: mix(self.g, dst.g),
                    b: mix(self.b, dst.b),
                    a: (a + u32::from(dst.a) * inv / 255).min(255) as u8,
                }
            }
        }
    }
}

impl Default for Colour {
    fn default() -> Self {
        Colour::BLACK
    }
}

/// A 2D RGBA pixel grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    width: i32,
    height: i32,
    pixels: Vec<Colour>,
}

impl Surface {
    /// Fully transparent surface.
    pub fn new(width: i32, height: i32) -> Self {
        Self::filled(width, height, Colour::TRANSPARENT)
    }

    pub fn filled(width: i32, height: i32, colour: Colour) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            width,
            height,
            pixels: vec![colour; (width * height) as usize],
        }
    }

    /// Build from raw pixels in row-major order. Missing pixels are transparent.
    pub fn from_pixels(width: i32, height: i32, mut pixels: Vec<Colour>) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        pixels.resize((width * height) as usize, Colour::TRANSPARENT);
        Self {
            width,
            height,
            pixels,
        }
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

    pub fn rect(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        (x >= 0 && y >= 0 && x < self.width && y < self.height).then(|| (y * self.width + x) as usize)
    }

    pub fn get(&self, x: i32, y: i32) -> Option<Colour> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    pub fn set(&mut self, x: i32, y: i32, colour: Colour) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = colour;
        }
    }

    /// Alpha of a pixel; outside the surface counts as transparent.
    pub fn alpha_at(&self, x: i32, y: i32) -> u8 {
        self.get(x, y).map_or(0, |c| c.a)
    }

    /// Fill a rectangle (clipped to the surface) with a colour, no blending.
    pub fn fill_rect(&mut self, rect: Rect, colour: Colour) {
        let Some(area) = rect.clip(&self.rect()) else {
            return;
        };
        for y in area.top()..area.bottom() {
            for x in area.left()..area.right() {
                self.set(x, y, colour);
            }
        }
    }

    /// Nearest-neighbour scale to a new size.
    pub fn scaled(&self, width: i32, height: i32) -> Surface {
        let width = width.max(0);
        let height = height.max(0);
        if width == self.width && height == self.height {
            return self.clone();
        }
        let mut out = Surface::new(width, height);
        if self.width == 0 || self.height == 0 {
            return out;
        }
        for y in 0..height {
            let sy = y * self.height / height;
            for x in 0..width {
                let sx = x * self.width / width;
                if let Some(c) = self.get(sx, sy) {
                    out.set(x, y, c);
                }
            }
        }
        out
    }

    /// Mirror left to right.
    pub fn flipped_horizontally(&self) -> Surface {
        let mut out = Surface::new(self.width, self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                if let Some(c) = self.get(x, y) {
                    out.set(self.width - 1 - x, y, c);
                }
            }
        }
        out
    }
}

/// Render target the compositor draws into.
pub trait Canvas {
    /// Fill the whole target with a colour.
    fn clear(&mut self, colour: Colour);
    /// Draw a surface with its top-left corner at `at`, alpha blended.
    fn blit(&mut self, surface: &Surface, at: Point);
    /// One pixel wide rectangle outline, used by debug drawing.
    fn outline(&mut self, rect: Rect, colour: Colour);
}

impl Canvas for Surface {
    fn clear(&mut self, colour: Colour) {
        self.pixels.fill(colour);
    }

    fn blit(&mut self, surface: &Surface, at: Point) {
        let target = Rect::from_pos_size(at, surface.size());
        let Some(area) = target.clip(&self.rect()) else {
            return;
        };
        for y in area.top()..area.bottom() {
            for x in area.left()..area.right() {
                let Some(src) = surface.get(x - at.x, y - at.y) else {
                    continue;
                };
                if let Some(i) = self.index(x, y) {
                    self.pixels[i] = src.over(self.pixels[i]);
                }
            }
        }
    }

    fn outline(&mut self, rect: Rect, colour: Colour) {
        if rect.is_empty() {
            return;
        }
        for x in rect.left()..rect.right() {
            self.set(x, rect.top(), colour);
            self.set(x, rect.bottom() - 1, colour);
        }
        for y in rect.top()..rect.bottom() {
            self.set(rect.left(), y, colour);
            self.set(rect.right() - 1, y, colour);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaled_keeps_corners() {
        let mut src = Surface::new(2, 2);
        src.set(0, 0, Colour::RED);
        src.set(1, 1, Colour::BLUE);
        let big = src.scaled(4, 4);
        assert_eq!(big.get(0, 0), Some(Colour::RED));
        assert_eq!(big.get(1, 1), Some(Colour::RED));
        assert_eq!(big.get(3, 3), Some(Colour::BLUE));
        assert_eq!(big.alpha_at(3, 0), 0);
    }

    #[test]
    fn test_blit_clips_and_skips_transparent() {
        let mut canvas = Surface::filled(4, 4, Colour::WHITE);
        let mut sprite = Surface::new(3, 3);
        sprite.set(0, 0, Colour::RED);
        sprite.set(2, 2, Colour::GREEN);
        canvas.blit(&sprite, IVec2::new(2, 2));
        assert_eq!(canvas.get(2, 2), Some(Colour::RED));
        assert_eq!(canvas.get(3, 3), Some(Colour::WHITE));
        assert_eq!(canvas.get(0, 0), Some(Colour::WHITE));
    }

    #[test]
    fn test_flip_mirrors_columns() {
        let mut src = Surface::new(3, 1);
        src.set(0, 0, Colour::RED);
        assert_eq!(src.flipped_horizontally().get(2, 0), Some(Colour::RED));
    }

    #[test]
    fn test_outline_draws_border_only() {
        let mut canvas = Surface::new(5, 5);
        canvas.outline(Rect::new(0, 0, 5, 5), Colour::BLACK);
        assert_eq!(canvas.alpha_at(0, 0), 255);
        assert_eq!(canvas.alpha_at(4, 2), 255);
        assert_eq!(canvas.alpha_at(2, 2), 0);
    }
}
