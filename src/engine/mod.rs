//! Engine core
//!
//! Objects with pixel masks, movement and boundary styles, scenes, the map
//! and the draw compositor. Everything runs single-threaded, one frame at a
//! time: `Map::move_objects`, `Map::update`, `Map::draw`.

pub mod arena;
pub mod boundary;
pub mod compositor;
pub mod event;
pub mod geometry;
pub mod kind;
pub mod map;
pub mod mask;
pub mod movement;
pub mod object;
pub mod store;
pub mod surface;
pub mod viewport;

pub use arena::{ObjectArena, ObjectId};
pub use boundary::{Blocked, BoundaryStyle, CollisionBoundary, CollisionProbe, RectangleBoundary};
pub use event::{Contact, ContactKind, EngineEvent};
pub use geometry::{ORIGIN, Point, Rect, Side, Vector, unit_step};
pub use kind::{InteractionTypes, KindMatch, Materials, ObjectKind};
pub use map::{Map, SceneProbe};
pub use mask::Mask;
pub use movement::{
    Axis, Direction, Directions, GeneralMovement, Key, KeyMovement, MovementStyle, RandomWalkMovement,
};
pub use object::{
    Anchor, AttachStyle, CollisionData, CollisionSpec, Frame, ImageSet, Object, ObjectBuilder, PositionStyle,
};
pub use store::{ObjectStore, Scene, SceneId};
pub use surface::{Canvas, Colour, Surface};
pub use viewport::Viewport;
