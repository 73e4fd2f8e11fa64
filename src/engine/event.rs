//! Engine events
//!
//! Collision resolution and picking never act on what they find. They record a
//! `Contact` and the map posts it as an `EngineEvent` for the game rules to
//! drain after the frame's movement.

use super::arena::ObjectId;
use super::geometry::Point;
use super::object::CollisionData;

/// What a scene query found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactKind {
    /// Blocking overlap of collision masks.
    Collision(CollisionData),
    /// Non-blocking overlap of interaction masks, with the first shared pixel.
    Interaction(Point),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub other: ObjectId,
    pub kind: ContactKind,
}

impl Contact {
    pub fn is_collision(&self) -> bool {
        matches!(self.kind, ContactKind::Collision(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    Collision {
        subject: ObjectId,
        other: ObjectId,
        data: CollisionData,
    },
    Interaction {
        subject: ObjectId,
        other: ObjectId,
        offset: Point,
    },
    /// A click landed on `object` at a world position.
    Click { object: ObjectId, pos: Point },
}

impl EngineEvent {
    pub fn from_contact(subject: ObjectId, contact: Contact) -> Self {
        match contact.kind {
            ContactKind::Collision(data) => EngineEvent::Collision {
                subject,
                other: contact.other,
                data,
            },
            ContactKind::Interaction(offset) => EngineEvent::Interaction {
                subject,
                other: contact.other,
                offset,
            },
        }
    }

    /// The pair of objects involved, subject first.
    pub fn objects(&self) -> (ObjectId, Option<ObjectId>) {
        match *self {
            EngineEvent::Collision { subject, other, .. }
            | EngineEvent::Interaction { subject, other, .. } => (subject, Some(other)),
            EngineEvent::Click { object, .. } => (object, None),
        }
    }
}
