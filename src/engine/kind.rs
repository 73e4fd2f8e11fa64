//! Object kinds and interaction materials
//!
//! Every object has one material (`object_properties`) and two sensitivity
//! masks: which materials it registers interactions with and which block it.
//! The kind supplies the defaults and the pick priority used by scene queries.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

use super::object::{Anchor, CollisionSpec, Frame, PositionStyle};

/// Bitmask of object materials.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct InteractionTypes(u8);

impl InteractionTypes {
    pub const NONE: Self = Self(0);
    /// Blocks everything except perhaps neutrinos.
    pub const IMPERVIOUS: Self = Self(1);
    /// Background walls and terrain.
    pub const HARD: Self = Self(2);
    /// Normal actors and items.
    pub const SOLID: Self = Self(4);
    /// Interacts without blocking, e.g. coins.
    pub const OVERLAY: Self = Self(8);
    /// Passes through solids, stopped by impervious objects.
    pub const GHOST: Self = Self(16);
    /// Visual only.
    pub const FOG: Self = Self(32);
    /// Almost never interacts.
    pub const NEUTRINO: Self = Self(64);

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// True when the two masks share a bit.
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for InteractionTypes {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOrAssign for InteractionTypes {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for InteractionTypes {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl fmt::Debug for InteractionTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(InteractionTypes, &str); 7] = [
            (InteractionTypes::IMPERVIOUS, "IMPERVIOUS"),
            (InteractionTypes::HARD, "HARD"),
            (InteractionTypes::SOLID, "SOLID"),
            (InteractionTypes::OVERLAY, "OVERLAY"),
            (InteractionTypes::GHOST, "GHOST"),
            (InteractionTypes::FOG, "FOG"),
            (InteractionTypes::NEUTRINO, "NEUTRINO"),
        ];
        if self.is_empty() {
            return f.write_str("NONE");
        }
        let names: Vec<&str> = NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        f.write_str(&names.join("|"))
    }
}

/// Material triple of an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Materials {
    /// What this object is made of.
    pub object_properties: InteractionTypes,
    /// Materials this object registers interactions with.
    pub interaction_types: InteractionTypes,
    /// Materials that block this object.
    pub collision_types: InteractionTypes,
}

impl Materials {
    pub const DEFAULT: Materials = Materials {
        object_properties: InteractionTypes::SOLID,
        interaction_types: InteractionTypes::SOLID
            .union(InteractionTypes::OVERLAY)
            .union(InteractionTypes::GHOST),
        collision_types: InteractionTypes::IMPERVIOUS
            .union(InteractionTypes::HARD)
            .union(InteractionTypes::SOLID),
    };

    /// Collectible-style: noticed by actors, blocked only by walls.
    pub const OVERLAY: Materials = Materials {
        object_properties: InteractionTypes::OVERLAY,
        interaction_types: InteractionTypes::IMPERVIOUS
            .union(InteractionTypes::HARD)
            .union(InteractionTypes::SOLID),
        collision_types: InteractionTypes::IMPERVIOUS.union(InteractionTypes::HARD),
    };

    pub const NON_INTERACTING: Materials = Materials {
        object_properties: InteractionTypes::NONE,
        interaction_types: InteractionTypes::NONE,
        collision_types: InteractionTypes::NONE,
    };
}

impl Default for Materials {
    fn default() -> Self {
        Materials::DEFAULT
    }
}

/// The kinds of object the engine and game know about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ObjectKind {
    Generic,
    /// Outline box, mostly for debug markers.
    Box,
    Text,
    /// HUD score readout.
    Score,
    /// World edge.
    Border,
    Background,
    /// Background that nothing bumps into.
    SoftBackground,
    Fog,
    Shop,
    Digspot,
    Bush,
    /// Door between scenes.
    Portal,
    Arrow,
    Monster,
    Coin,
    Sprite,
    GhostSprite,
    Player,
}

impl ObjectKind {
    /// Higher priority kinds win scene queries when several objects match.
    pub fn pick_priority(self) -> u8 {
        match self {
            ObjectKind::Fog => 1,
            ObjectKind::Bush | ObjectKind::Portal | ObjectKind::Arrow | ObjectKind::Monster => 6,
            ObjectKind::Sprite | ObjectKind::GhostSprite | ObjectKind::Player => 8,
            ObjectKind::Coin => 10,
            ObjectKind::Digspot => 12,
            _ => 2,
        }
    }

    pub fn default_materials(self) -> Materials {
        use InteractionTypes as T;
        match self {
            ObjectKind::Text | ObjectKind::Score | ObjectKind::SoftBackground => {
                Materials::NON_INTERACTING
            }
            ObjectKind::Border => Materials {
                object_properties: T::IMPERVIOUS,
                interaction_types: T::NONE,
                collision_types: T::IMPERVIOUS | T::SOLID | T::OVERLAY | T::GHOST,
            },
            ObjectKind::Background => Materials {
                object_properties: T::HARD,
                interaction_types: T::NONE,
                ..Materials::DEFAULT
            },
            ObjectKind::Fog => Materials {
                object_properties: T::FOG,
                interaction_types: T::NONE,
                collision_types: T::NONE,
            },
            ObjectKind::Digspot | ObjectKind::Arrow | ObjectKind::Monster | ObjectKind::Coin => {
                Materials::OVERLAY
            }
            ObjectKind::GhostSprite => Materials {
                object_properties: T::GHOST,
                interaction_types: T::SOLID | T::OVERLAY | T::GHOST,
                collision_types: T::IMPERVIOUS | T::GHOST,
            },
            _ => Materials::DEFAULT,
        }
    }

    pub fn default_draw_order(self) -> i32 {
        match self {
            ObjectKind::Border => 0,
            ObjectKind::Background | ObjectKind::SoftBackground => 1,
            ObjectKind::Shop | ObjectKind::Digspot | ObjectKind::Arrow => 2,
            ObjectKind::Fog => 8,
            ObjectKind::Monster => 20,
            _ => crate::consts::DEFAULT_DRAW_ORDER,
        }
    }

    /// Position style used when the builder is not given one.
    pub fn default_position_style(self) -> PositionStyle {
        match self {
            ObjectKind::Score => PositionStyle::new(Frame::Viewport, Anchor::TopLeft),
            _ => PositionStyle::default(),
        }
    }

    pub fn default_collision_spec(self) -> Option<CollisionSpec> {
        match self {
            ObjectKind::Portal | ObjectKind::Sprite | ObjectKind::GhostSprite | ObjectKind::Player => {
                Some(CollisionSpec::default())
            }
            _ => None,
        }
    }

    /// Kinds that move on their own and keep one collision mask for all images.
    pub fn is_dynamic(self) -> bool {
        matches!(
            self,
            ObjectKind::Sprite | ObjectKind::GhostSprite | ObjectKind::Player
        )
    }
}

/// A kind, optionally narrowed to one named instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindMatch {
    pub kind: ObjectKind,
    pub name: Option<String>,
}

impl KindMatch {
    pub fn kind(kind: ObjectKind) -> Self {
        Self { kind, name: None }
    }

    pub fn named(kind: ObjectKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: Some(name.into()),
        }
    }

    pub fn matches(&self, kind: ObjectKind, name: Option<&str>) -> bool {
        self.kind == kind && self.name.as_deref().is_none_or(|wanted| Some(wanted) == name)
    }
}
