//! Candy Seller - a small top-down arcade game and the engine under it
//!
//! Core modules:
//! - `engine`: Objects, pixel-mask collision, movement, scenes and drawing
//! - `candy`: The Candy Seller game rules, built on the engine
//! - `settings`: JSON settings and debug drawing flags
//! - `error`: Engine error type

pub mod candy;
pub mod engine;
pub mod error;
pub mod settings;

pub use error::{EngineError, Result};
pub use settings::{DebugDraw, EngineSettings};

/// Engine configuration constants
pub mod consts {
    use crate::engine::surface::Colour;
    use glam::IVec2;

    /// Object size when none is given
    pub const DEFAULT_OBJECT_SIZE: i32 = 20;
    /// Draw order for kinds without their own
    pub const DEFAULT_DRAW_ORDER: i32 = 4;
    /// Pixels per tick on each axis
    pub const DEFAULT_MOVE_RATE: IVec2 = IVec2::new(10, 6);
    /// How far the focus drifts from the view centre before the camera follows
    pub const CAMERA_SLACK: i32 = 90;
    pub const DEFAULT_BACKGROUND_COLOUR: Colour = Colour::WHITE;
    pub const FPS: u32 = 30;
    /// Updates a debug position marker stays on screen
    pub const DEBUG_MARKER_LIFETIME: u32 = 80;
    /// Screen pixels a press may travel and still count as a click
    pub const CLICK_DRAG_LIMIT: i32 = 10;
}
