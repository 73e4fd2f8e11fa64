//! Engine error type
//!
//! Only configuration mistakes surface here. Degenerate geometry and mask
//! edge cases are tolerated by the collision code and never become errors.

use crate::engine::{ObjectId, SceneId};

/// Errors raised by the engine and the game layer built on it.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A scene name that was never created.
    #[error("unknown scene '{0}'")]
    UnknownScene(String),
    /// No object carries the given name.
    #[error("no object named '{0}'")]
    UnknownObject(String),
    /// The id refers to an object that has been removed.
    #[error("object {0} no longer exists")]
    StaleObject(ObjectId),
    /// Movement was requested for an object built without a movement style.
    #[error("object {0} has no movement style")]
    NoMovementStyle(ObjectId),
    /// The movement style is not attached to the object holding it.
    #[error("movement style of object {0} is not attached to it")]
    UnattachedMovement(ObjectId),
    /// The operation needs the object to belong to a scene.
    #[error("object {0} is not in any scene")]
    NotInScene(ObjectId),
    /// Objects join a scene from outside any scene.
    #[error("object {0} is already in {1}")]
    AlreadyInScene(ObjectId, SceneId),
    /// Only portals can be linked or passed through.
    #[error("object {0} is not a portal")]
    NotAPortal(ObjectId),
    /// The image provider has no image with this name.
    #[error("image '{0}' not found")]
    MissingImage(String),
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid settings: {0}")]
    Settings(#[from] serde_json::Error),
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
