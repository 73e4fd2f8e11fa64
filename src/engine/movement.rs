//! Movement styles
//!
//! A movement style turns held directions into a candidate position, then
//! hands the candidate to its boundary style for collision resolution. Each
//! axis holds at most one active direction; the last key pressed on an axis
//! wins, and releasing either key of an axis stops that axis.

use std::collections::HashMap;
use std::f32::consts::PI;
use std::fmt;
use std::rc::Rc;

use glam::IVec2;
use rand::Rng;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::arena::ObjectId;
use super::boundary::{BoundaryStyle, CollisionProbe};
use super::geometry::{Point, Vector};
use super::object::ImageSet;
use super::surface::Surface;
use crate::consts::DEFAULT_MOVE_RATE;
use crate::settings::RandomWalkSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Left, Direction::Right, Direction::Up, Direction::Down];

    pub fn axis(self) -> Axis {
        match self {
            Direction::Left | Direction::Right => Axis::Horizontal,
            Direction::Up | Direction::Down => Axis::Vertical,
        }
    }

    pub fn reversed(self) -> Direction {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }

    /// Unit vector, y down.
    pub fn vector(self) -> Vector {
        match self {
            Direction::Left => IVec2::NEG_X,
            Direction::Right => IVec2::X,
            Direction::Up => IVec2::NEG_Y,
            Direction::Down => IVec2::Y,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    pub fn perpendicular(self) -> Axis {
        match self {
            Axis::Horizontal => Axis::Vertical,
            Axis::Vertical => Axis::Horizontal,
        }
    }

    pub fn directions(self) -> [Direction; 2] {
        match self {
            Axis::Horizontal => [Direction::Left, Direction::Right],
            Axis::Vertical => [Direction::Up, Direction::Down],
        }
    }
}

/// Active direction per axis plus the last facing on each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Directions {
    horizontal: Option<Direction>,
    vertical: Option<Direction>,
    facing_horizontal: Direction,
    facing_vertical: Direction,
}

impl Default for Directions {
    fn default() -> Self {
        Self {
            horizontal: None,
            vertical: None,
            facing_horizontal: Direction::Left,
            facing_vertical: Direction::Down,
        }
    }
}

impl Directions {
    pub fn set(&mut self, direction: Direction) {
        match direction.axis() {
            Axis::Horizontal => {
                self.horizontal = Some(direction);
                self.facing_horizontal = direction;
            }
            Axis::Vertical => {
                self.vertical = Some(direction);
                self.facing_vertical = direction;
            }
        }
    }

    /// Stop the whole axis of `direction`.
    pub fn stop(&mut self, direction: Direction) {
        self.stop_axis(direction.axis());
    }

    pub fn stop_axis(&mut self, axis: Axis) {
        match axis {
            Axis::Horizontal => self.horizontal = None,
            Axis::Vertical => self.vertical = None,
        }
    }

    pub fn reset(&mut self) {
        self.horizontal = None;
        self.vertical = None;
    }

    /// Flip a moving axis; an idle axis stays idle.
    pub fn reverse(&mut self, axis: Axis) {
        if let Some(direction) = self.get(axis) {
            self.set(direction.reversed());
        }
    }

    pub fn get(&self, axis: Axis) -> Option<Direction> {
        match axis {
            Axis::Horizontal => self.horizontal,
            Axis::Vertical => self.vertical,
        }
    }

    pub fn any(&self) -> bool {
        self.horizontal.is_some() || self.vertical.is_some()
    }

    pub fn facing(&self, axis: Axis) -> Direction {
        match axis {
            Axis::Horizontal => self.facing_horizontal,
            Axis::Vertical => self.facing_vertical,
        }
    }
}

/// Shared state of every movement style.
pub struct GeneralMovement {
    attached: Option<ObjectId>,
    move_rate: Vector,
    bounce_period: u32,
    bounce_height: i32,
    bounce: u32,
    directions: Directions,
    boundary: Option<Box<dyn BoundaryStyle>>,
}

impl fmt::Debug for GeneralMovement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneralMovement")
            .field("attached", &self.attached)
            .field("move_rate", &self.move_rate)
            .field("bounce", &self.bounce)
            .field("directions", &self.directions)
            .field("boundary", &self.boundary)
            .finish()
    }
}

impl Default for GeneralMovement {
    fn default() -> Self {
        Self::new(DEFAULT_MOVE_RATE)
    }
}

impl GeneralMovement {
    pub fn new(move_rate: Vector) -> Self {
        Self {
            attached: None,
            move_rate,
            bounce_period: 0,
            bounce_height: 0,
            bounce: 0,
            directions: Directions::default(),
            boundary: None,
        }
    }

    /// Bob `height` pixels over `period` ticks while moving.
    pub fn with_bounce(mut self, period: u32, height: i32) -> Self {
        self.set_bounce(period, height);
        self
    }

    pub fn with_boundary(mut self, boundary: impl BoundaryStyle + 'static) -> Self {
        self.boundary = Some(Box::new(boundary));
        self
    }

    pub fn attach(&mut self, id: ObjectId) {
        self.attached = Some(id);
    }

    pub fn attached(&self) -> Option<ObjectId> {
        self.attached
    }

    pub fn move_rate(&self) -> Vector {
        self.move_rate
    }

    pub fn set_move_rate(&mut self, move_rate: Vector) {
        self.move_rate = move_rate;
    }

    pub fn set_bounce(&mut self, period: u32, height: i32) {
        self.bounce_period = period;
        self.bounce_height = height;
    }

    pub fn bounce(&self) -> u32 {
        self.bounce
    }

    pub fn set_boundary(&mut self, boundary: Box<dyn BoundaryStyle>) {
        self.boundary = Some(boundary);
    }

    pub fn boundary(&self) -> Option<&dyn BoundaryStyle> {
        self.boundary.as_deref()
    }

    pub fn boundary_mut(&mut self) -> Option<&mut (dyn BoundaryStyle + 'static)> {
        self.boundary.as_deref_mut()
    }

    pub fn directions(&self) -> &Directions {
        &self.directions
    }

    pub fn directions_mut(&mut self) -> &mut Directions {
        &mut self.directions
    }

    pub fn set_movement(&mut self, direction: Direction) {
        self.directions.set(direction);
    }

    pub fn stop_movement(&mut self, direction: Direction) {
        self.directions.stop(direction);
    }

    pub fn stop_all(&mut self) {
        self.directions.reset();
    }

    pub fn moving(&self) -> bool {
        self.directions.any()
    }

    pub fn moving_on(&self, axis: Axis) -> Option<Direction> {
        self.directions.get(axis)
    }

    pub fn facing(&self, axis: Axis) -> Direction {
        self.directions.facing(axis)
    }

    /// Vertical bob in pixels for the current bounce tick.
    pub fn bounce_offset(&self) -> i32 {
        if self.bounce_period == 0 || self.bounce_height == 0 {
            return 0;
        }
        let phase = PI * self.bounce as f32 / self.bounce_period as f32;
        (phase.sin() * self.bounce_height as f32).round() as i32
    }

    /// Displacement for one tick from the active directions.
    pub fn delta(&self) -> Vector {
        let x = self.directions.horizontal.map_or(0, |d| d.vector().x * self.move_rate.x);
        let y = self.directions.vertical.map_or(0, |d| d.vector().y * self.move_rate.y);
        IVec2::new(x, y)
    }

    /// Candidate position ignoring obstacles.
    pub fn candidate(&self, pos: Point) -> Point {
        pos + self.delta()
    }

    fn advance_bounce(&mut self) {
        self.bounce += 1;
        if self.bounce > self.bounce_period {
            self.bounce = 0;
        }
    }

    /// One tick: advance the bounce and resolve the candidate against the
    /// boundary. `None` when nothing tried to move.
    pub fn step(&mut self, probe: &mut dyn CollisionProbe) -> Option<Point> {
        if !self.moving() && self.bounce == 0 {
            return None;
        }
        let delta = self.delta();
        self.advance_bounce();
        if delta == IVec2::ZERO {
            return None;
        }
        let candidate = probe.position() + delta;
        Some(match self.boundary.as_deref_mut() {
            Some(boundary) => boundary.bounded_position(probe, candidate),
            None => candidate,
        })
    }

    /// Image for the current heading; up and down fall back to the
    /// horizontal facing image.
    pub fn choose_image(&self, images: &ImageSet) -> Option<Rc<Surface>> {
        let direction = self
            .moving_on(Axis::Horizontal)
            .or_else(|| self.moving_on(Axis::Vertical))?;
        images
            .get(direction)
            .or_else(|| match direction.axis() {
                Axis::Vertical => images.get(self.facing(Axis::Horizontal)),
                Axis::Horizontal => None,
            })
            .cloned()
    }
}

/// Strategy that moves an object each tick.
///
/// Implementations own a [`GeneralMovement`] and expose it through
/// `motion`/`motion_mut`; everything else has a default.
pub trait MovementStyle: fmt::Debug {
    fn motion(&self) -> &GeneralMovement;

    fn motion_mut(&mut self) -> &mut GeneralMovement;

    fn set_movement(&mut self, direction: Direction) {
        self.motion_mut().set_movement(direction);
    }

    fn stop_movement(&mut self, direction: Direction) {
        self.motion_mut().stop_movement(direction);
    }

    /// Accepted position after one tick, or `None` when the object stays put
    /// without probing.
    fn step(&mut self, probe: &mut dyn CollisionProbe) -> Option<Point> {
        self.motion_mut().step(probe)
    }

    /// Start moving for a bound key. False when the style ignores the key.
    fn key_down(&mut self, _key: Key) -> bool {
        false
    }

    fn key_up(&mut self, _key: Key) -> bool {
        false
    }
}

impl MovementStyle for GeneralMovement {
    fn motion(&self) -> &GeneralMovement {
        self
    }

    fn motion_mut(&mut self) -> &mut GeneralMovement {
        self
    }
}

/// Keyboard keys the engine and game understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    F12,
    Pause,
    Char(char),
}

impl Key {
    /// Arrow keys and WASD.
    pub const MOVEMENT: [Key; 8] = [
        Key::Left,
        Key::Char('a'),
        Key::Right,
        Key::Char('d'),
        Key::Up,
        Key::Char('w'),
        Key::Down,
        Key::Char('s'),
    ];

    /// Default direction of a movement key.
    pub fn direction(self) -> Option<Direction> {
        match self {
            Key::Left | Key::Char('a') => Some(Direction::Left),
            Key::Right | Key::Char('d') => Some(Direction::Right),
            Key::Up | Key::Char('w') => Some(Direction::Up),
            Key::Down | Key::Char('s') => Some(Direction::Down),
            _ => None,
        }
    }
}

/// Movement driven by key presses.
#[derive(Debug)]
pub struct KeyMovement {
    motion: GeneralMovement,
    keys: HashMap<Key, Direction>,
}

impl KeyMovement {
    /// Bound to [`Key::MOVEMENT`].
    pub fn new(motion: GeneralMovement) -> Self {
        let keys = Key::MOVEMENT
            .into_iter()
            .filter_map(|key| Some((key, key.direction()?)))
            .collect();
        Self { motion, keys }
    }

    pub fn bind(&mut self, key: Key, direction: Direction) {
        self.keys.insert(key, direction);
    }

    pub fn direction_for(&self, key: Key) -> Option<Direction> {
        self.keys.get(&key).copied()
    }
}

impl MovementStyle for KeyMovement {
    fn motion(&self) -> &GeneralMovement {
        &self.motion
    }

    fn motion_mut(&mut self) -> &mut GeneralMovement {
        &mut self.motion
    }

    fn key_down(&mut self, key: Key) -> bool {
        match self.direction_for(key) {
            Some(direction) => {
                self.motion.set_movement(direction);
                true
            }
            None => false,
        }
    }

    fn key_up(&mut self, key: Key) -> bool {
        match self.direction_for(key) {
            Some(direction) => {
                self.motion.stop_movement(direction);
                true
            }
            None => false,
        }
    }
}

/// Wandering movement for non-player characters.
#[derive(Debug)]
pub struct RandomWalkMovement {
    motion: GeneralMovement,
    settings: RandomWalkSettings,
    rng: Pcg32,
}

impl RandomWalkMovement {
    pub fn new(motion: GeneralMovement, settings: RandomWalkSettings, seed: u64) -> Self {
        Self {
            motion,
            settings,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Occasionally pick a new direction or stop.
    fn decide(&mut self) {
        let roll: f64 = self.rng.random();
        if roll >= self.settings.change_chance {
            return;
        }
        if roll < self.settings.turn_chance {
            let direction = Direction::ALL[self.rng.random_range(0..Direction::ALL.len())];
            self.motion.set_movement(direction);
        } else {
            self.motion.stop_all();
        }
    }

    /// Reverse, turn onto the other axis or stop after hitting something.
    fn react_to_block(&mut self, axis: Axis) {
        let roll: f64 = self.rng.random();
        if roll < self.settings.reverse_chance {
            self.motion.directions_mut().reverse(axis);
        } else if roll >= 1.0 - self.settings.perpendicular_chance {
            let choices = axis.perpendicular().directions();
            let direction = choices[self.rng.random_range(0..choices.len())];
            self.motion.set_movement(direction);
        } else {
            self.motion.directions_mut().stop_axis(axis);
        }
        log::debug!("random walker blocked on {axis:?}, now {:?}", self.motion.directions());
    }
}

impl MovementStyle for RandomWalkMovement {
    fn motion(&self) -> &GeneralMovement {
        &self.motion
    }

    fn motion_mut(&mut self) -> &mut GeneralMovement {
        &mut self.motion
    }

    fn step(&mut self, probe: &mut dyn CollisionProbe) -> Option<Point> {
        self.decide();
        let pos = self.motion.step(probe)?;
        let blocked = self.motion.boundary().map(|b| b.blocked()).unwrap_or_default();
        if blocked.horizontally {
            self.react_to_block(Axis::Horizontal);
        }
        if blocked.vertically {
            self.react_to_block(Axis::Vertical);
        }
        Some(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::boundary::{CollisionBoundary, RectangleBoundary};
    use crate::engine::event::Contact;
    use crate::engine::geometry::Rect;

    /// Probe over an empty world that counts every query.
    #[derive(Default)]
    struct SpyProbe {
        pos: Point,
        queries: usize,
    }

    impl CollisionProbe for SpyProbe {
        fn position(&self) -> Point {
            self.pos
        }

        fn contact_at(&mut self, _pos: Point) -> Option<Contact> {
            self.queries += 1;
            None
        }

        fn collisions_at(&mut self, _pos: Point) -> Vec<ObjectId> {
            self.queries += 1;
            Vec::new()
        }
    }

    #[test]
    fn test_idle_movement_never_probes() {
        let mut movement = GeneralMovement::new(IVec2::new(17, 10))
            .with_bounce(10, 6)
            .with_boundary(CollisionBoundary::new());
        let mut probe = SpyProbe {
            pos: IVec2::new(50, 50),
            ..Default::default()
        };

        for _ in 0..5 {
            assert_eq!(movement.step(&mut probe), None);
        }
        assert_eq!(probe.queries, 0);
        assert_eq!(movement.candidate(probe.pos), probe.pos);
    }

    #[test]
    fn test_moving_probes_and_advances() {
        let mut movement = GeneralMovement::new(IVec2::new(17, 10)).with_boundary(CollisionBoundary::new());
        movement.set_movement(Direction::Right);
        movement.set_movement(Direction::Up);
        let mut probe = SpyProbe::default();

        assert_eq!(movement.step(&mut probe), Some(IVec2::new(17, -10)));
        assert_eq!(probe.queries, 1);
    }

    #[test]
    fn test_bounce_continues_after_stop_without_probing() {
        let mut movement = GeneralMovement::new(IVec2::new(10, 6))
            .with_bounce(4, 6)
            .with_boundary(CollisionBoundary::new());
        let mut probe = SpyProbe::default();
        movement.set_movement(Direction::Left);
        movement.step(&mut probe);
        assert_eq!(movement.bounce(), 1);

        movement.stop_movement(Direction::Left);
        let queries = probe.queries;
        for _ in 0..4 {
            assert_eq!(movement.step(&mut probe), None);
        }
        assert_eq!(movement.bounce(), 0);
        assert_eq!(probe.queries, queries);
    }

    #[test]
    fn test_bounce_offset_follows_sine() {
        let mut movement = GeneralMovement::new(IVec2::new(10, 6)).with_bounce(10, 6);
        movement.set_movement(Direction::Right);
        let mut probe = SpyProbe::default();
        let mut offsets = Vec::new();
        for _ in 0..11 {
            movement.step(&mut probe);
            offsets.push(movement.bounce_offset());
        }
        assert_eq!(offsets[4], 6);
        assert_eq!(offsets[0], 2);
        assert_eq!(movement.bounce(), 0);
        assert_eq!(offsets[10], 0);
    }

    #[test]
    fn test_release_stops_whole_axis() {
        let mut movement = GeneralMovement::default();
        movement.set_movement(Direction::Left);
        movement.set_movement(Direction::Right);
        assert_eq!(movement.moving_on(Axis::Horizontal), Some(Direction::Right));

        movement.stop_movement(Direction::Left);
        assert_eq!(movement.moving_on(Axis::Horizontal), None);
        assert_eq!(movement.facing(Axis::Horizontal), Direction::Right);
    }

    #[test]
    fn test_key_movement_maps_keys() {
        let mut movement = KeyMovement::new(GeneralMovement::new(IVec2::new(17, 10)));
        assert!(movement.key_down(Key::Char('d')));
        assert!(movement.key_down(Key::Up));
        assert!(!movement.key_down(Key::Char('o')));
        assert_eq!(movement.motion().delta(), IVec2::new(17, -10));

        movement.key_up(Key::Right);
        assert_eq!(movement.motion().delta(), IVec2::new(0, -10));
        assert!(!movement.key_down(Key::F12));
    }

    #[test]
    fn test_rebinding_a_key() {
        let mut movement = KeyMovement::new(GeneralMovement::new(IVec2::new(17, 10)));
        movement.bind(Key::Char('j'), Direction::Left);
        assert!(movement.key_down(Key::Char('j')));
        assert_eq!(movement.motion().delta(), IVec2::new(-17, 0));
        assert_eq!(Key::Char('j').direction(), None);
    }

    #[test]
    fn test_choose_image_falls_back_to_horizontal_facing() {
        let left = Rc::new(Surface::new(2, 2));
        let images = ImageSet::left_right(left.clone());
        let mut movement = GeneralMovement::default();
        assert!(movement.choose_image(&images).is_none());

        movement.set_movement(Direction::Down);
        let chosen = movement.choose_image(&images).expect("falls back to facing");
        assert!(Rc::ptr_eq(&chosen, &left));

        movement.set_movement(Direction::Right);
        let chosen = movement.choose_image(&images).expect("right image");
        assert!(!Rc::ptr_eq(&chosen, &left));
    }

    #[test]
    fn test_random_walker_turns_inside_rectangle() {
        let settings = RandomWalkSettings {
            change_chance: 0.0,
            turn_chance: 0.0,
            reverse_chance: 1.0,
            perpendicular_chance: 0.0,
        };
        let boundary = RectangleBoundary::new(Rect::new(0, 0, 100, 100));
        let mut walker = RandomWalkMovement::new(
            GeneralMovement::new(IVec2::new(10, 0)).with_boundary(boundary),
            settings,
            7,
        );
        walker.set_movement(Direction::Right);
        let mut probe = SpyProbe {
            pos: IVec2::new(95, 50),
            ..Default::default()
        };

        assert_eq!(walker.step(&mut probe), Some(IVec2::new(100, 50)));
        assert_eq!(walker.motion().moving_on(Axis::Horizontal), Some(Direction::Left));
    }

    #[test]
    fn test_random_walker_is_reproducible() {
        let run = |seed| {
            let mut walker = RandomWalkMovement::new(GeneralMovement::default(), RandomWalkSettings::default(), seed);
            let mut probe = SpyProbe::default();
            (0..200)
                .filter_map(|_| {
                    let pos = walker.step(&mut probe)?;
                    probe.pos = pos;
                    Some(pos)
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(run(3), run(3));
    }
}
