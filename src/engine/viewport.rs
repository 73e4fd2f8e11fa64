//! Camera over the world
//!
//! The camera is the world position of the view's top-left corner. It only
//! follows the focus once the focus drifts more than `slack` pixels from the
//! view centre. In free-move mode the camera instead drifts by its own
//! held directions, one `camera_rate` step per tick.

use glam::IVec2;
use rand::Rng;

use super::geometry::{ORIGIN, Point, Rect, Vector};
use super::movement::{Axis, Direction, Directions};
use crate::consts::DEFAULT_MOVE_RATE;
use crate::settings::EngineSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    width: i32,
    height: i32,
    camera: Point,
    slack: i32,
    camera_rate: Vector,
    camera_motion: Directions,
}

impl Viewport {
    pub fn new(width: i32, height: i32, slack: i32) -> Self {
        Self {
            width,
            height,
            camera: ORIGIN,
            slack,
            camera_rate: DEFAULT_MOVE_RATE,
            camera_motion: Directions::default(),
        }
    }

    pub fn from_settings(settings: &EngineSettings) -> Self {
        Self {
            camera_rate: settings.move_rate,
            ..Self::new(settings.width, settings.height, settings.camera_slack)
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn size(&self) -> IVec2 {
        IVec2::new(self.width, self.height)
    }

    pub fn half_size(&self) -> IVec2 {
        self.size() / 2
    }

    pub fn camera(&self) -> Point {
        self.camera
    }

    pub fn reset_camera(&mut self) {
        self.camera = ORIGIN;
    }

    /// Follow `pos` with slack. True when the camera moved.
    pub fn adjust_camera(&mut self, pos: Point) -> bool {
        let before = self.camera;
        let centre = self.camera + self.half_size();
        let half = self.half_size();

        if centre.x - pos.x > self.slack {
            self.camera.x = pos.x + self.slack - half.x;
        } else if pos.x - centre.x > self.slack {
            self.camera.x = pos.x - self.slack - half.x;
        }

        if centre.y - pos.y > self.slack {
            self.camera.y = pos.y + self.slack - half.y;
        } else if pos.y - centre.y > self.slack {
            self.camera.y = pos.y - self.slack - half.y;
        }

        self.camera != before
    }

    // === Free camera ===

    pub fn set_camera_movement(&mut self, direction: Direction) {
        self.camera_motion.set(direction);
    }

    pub fn stop_camera_movement(&mut self, direction: Direction) {
        self.camera_motion.stop(direction);
    }

    pub fn stop_camera(&mut self) {
        self.camera_motion.reset();
    }

    /// Drift one step along the held camera directions. True when it moved.
    pub fn move_camera(&mut self) -> bool {
        let step = |axis| {
            self.camera_motion
                .get(axis)
                .map_or(IVec2::ZERO, |d: Direction| d.vector() * self.camera_rate)
        };
        let delta = step(Axis::Horizontal) + step(Axis::Vertical);
        self.camera += delta;
        delta != IVec2::ZERO
    }

    /// The visible part of the world.
    pub fn camera_rect(&self) -> Rect {
        Rect::from_pos_size(self.camera, self.size())
    }

    /// True when both axis distances are within `distance`.
    pub fn position_near(pos: Point, old_pos: Point, distance: i32) -> bool {
        let d = (pos - old_pos).abs();
        d.x <= distance && d.y <= distance
    }

    /// A position within one view of the camera whose `size` box is out of
    /// sight. Gives up after a bounded number of tries and returns the last
    /// candidate.
    pub fn random_off_camera_pos(&self, rng: &mut impl Rng, size: IVec2) -> Point {
        let view = self.camera_rect();
        let mut pos = self.camera - self.size();
        for _ in 0..64 {
            pos = IVec2::new(
                rng.random_range(self.camera.x - self.width..=self.camera.x + 2 * self.width),
                rng.random_range(self.camera.y - self.height..=self.camera.y + 2 * self.height),
            );
            if !Rect::from_pos_size(pos, size).intersects(&view) {
                break;
            }
        }
        pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_camera_holds_within_slack() {
        let mut view = Viewport::new(800, 600, 90);
        assert!(!view.adjust_camera(IVec2::new(400 + 90, 300 - 90)));
        assert_eq!(view.camera(), ORIGIN);
    }

    #[test]
    fn test_camera_follows_past_slack() {
        let mut view = Viewport::new(800, 600, 90);
        assert!(view.adjust_camera(IVec2::new(600, 300)));
        assert_eq!(view.camera(), IVec2::new(110, 0));

        assert!(view.adjust_camera(IVec2::new(0, 0)));
        assert_eq!(view.camera(), IVec2::new(-310, -210));
    }

    #[test]
    fn test_camera_rect_and_reset() {
        let mut view = Viewport::new(800, 600, 90);
        view.adjust_camera(IVec2::new(540, 210));
        assert_eq!(view.camera_rect(), Rect::new(50, 0, 800, 600));
        view.reset_camera();
        assert_eq!(view.camera(), ORIGIN);
    }

    #[test]
    fn test_free_camera_drifts_with_held_directions() {
        let mut view = Viewport::new(800, 600, 90);
        assert!(!view.move_camera());

        view.set_camera_movement(Direction::Right);
        view.set_camera_movement(Direction::Up);
        assert!(view.move_camera());
        assert_eq!(view.camera(), IVec2::new(10, -6));

        view.stop_camera_movement(Direction::Up);
        view.move_camera();
        assert_eq!(view.camera(), IVec2::new(20, -6));

        view.stop_camera();
        assert!(!view.move_camera());
        assert_eq!(view.camera(), IVec2::new(20, -6));
    }

    #[test]
    fn test_camera_rate_comes_from_settings() {
        let settings = EngineSettings {
            move_rate: IVec2::new(4, 2),
            ..EngineSettings::default()
        };
        let mut view = Viewport::from_settings(&settings);
        view.set_camera_movement(Direction::Down);
        view.move_camera();
        assert_eq!(view.camera(), IVec2::new(0, 2));
    }

    #[test]
    fn test_position_near() {
        assert!(Viewport::position_near(IVec2::new(10, 10), IVec2::new(15, 5), 5));
        assert!(!Viewport::position_near(IVec2::new(10, 10), IVec2::new(16, 10), 5));
    }

    #[test]
    fn test_random_off_camera_pos_is_hidden() {
        let view = Viewport::new(800, 600, 90);
        let mut rng = Pcg32::seed_from_u64(1);
        for _ in 0..20 {
            let pos = view.random_off_camera_pos(&mut rng, IVec2::new(20, 20));
            assert!(!Rect::from_pos_size(pos, IVec2::new(20, 20)).intersects(&view.camera_rect()));
        }
    }
}
