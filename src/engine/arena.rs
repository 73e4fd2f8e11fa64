//! Object arena
//!
//! Objects live in one slab owned by the map. Scenes, parents and movement
//! styles refer to them by `ObjectId`, an index plus a generation. Freeing a
//! slot bumps its generation so stale ids resolve to nothing instead of to
//! whatever object reused the slot.

use std::fmt;

use super::object::Object;

/// Handle to an object in an [`ObjectArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId {
    index: u32,
    generation: u32,
}

impl ObjectId {
    pub fn index(self) -> u32 {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    object: Option<Object>,
}

#[derive(Debug, Default)]
pub struct ObjectArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    len: usize,
}

impl ObjectArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, object: Object) -> ObjectId {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.object = Some(object);
            return ObjectId {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            object: Some(object),
        });
        ObjectId {
            index,
            generation: 0,
        }
    }

    /// Take an object out, invalidating its id.
    pub fn remove(&mut self, id: ObjectId) -> Option<Object> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let object = slot.object.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.len -= 1;
        Some(object)
    }

    pub fn get(&self, id: ObjectId) -> Option<&Object> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.object.as_ref())
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut Object> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.object.as_mut())
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Live objects with their ids, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &Object)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.object.as_ref().map(|object| {
                (
                    ObjectId {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    object,
                )
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::geometry::ORIGIN;
    use crate::engine::kind::ObjectKind;

    fn object() -> Object {
        Object::builder(ObjectKind::Generic, ORIGIN).build()
    }

    #[test]
    fn test_insert_and_get() {
        let mut arena = ObjectArena::new();
        let id = arena.insert(object());
        assert!(arena.contains(id));
        assert_eq!(arena.len(), 1);
        assert_eq!(arena.iter().count(), 1);
    }

    #[test]
    fn test_stale_id_does_not_alias_reused_slot() {
        let mut arena = ObjectArena::new();
        let old = arena.insert(object());
        assert!(arena.remove(old).is_some());
        let new = arena.insert(object());

        assert_eq!(old.index(), new.index());
        assert_ne!(old, new);
        assert!(arena.get(old).is_none());
        assert!(arena.get(new).is_some());
        assert!(arena.remove(old).is_none());
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_display_names_slot_and_generation() {
        let mut arena = ObjectArena::new();
        let id = arena.insert(object());
        assert_eq!(id.to_string(), "#0v0");
    }
}
