//! Object stores and scenes
//!
//! A store indexes object ids by kind and keeps a flat draw list. Scene
//! queries walk kinds in descending pick priority, and objects of one kind in
//! insertion order, so collectibles are found before the terrain under them.

use std::collections::BTreeMap;
use std::fmt;

use super::arena::{ObjectArena, ObjectId};
use super::event::{Contact, ContactKind};
use super::geometry::{Point, Rect};
use super::kind::ObjectKind;
use super::object::Object;
use super::surface::Colour;
use crate::error::{EngineError, Result};

#[derive(Debug, Default)]
pub struct ObjectStore {
    by_kind: BTreeMap<ObjectKind, Vec<ObjectId>>,
    draw_list: Vec<ObjectId>,
}

impl ObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, id: ObjectId, kind: ObjectKind) {
        self.by_kind.entry(kind).or_default().push(id);
        self.draw_list.push(id);
    }

    /// Remove from the kind index and the draw list. False if absent.
    pub fn remove(&mut self, id: ObjectId) -> bool {
        let Some(pos) = self.draw_list.iter().position(|d| *d == id) else {
            return false;
        };
        self.draw_list.remove(pos);
        for ids in self.by_kind.values_mut() {
            ids.retain(|other| *other != id);
        }
        self.by_kind.retain(|_, ids| !ids.is_empty());
        true
    }

    /// Objects of a kind in insertion order.
    pub fn objects_of_kind(&self, kind: ObjectKind) -> &[ObjectId] {
        self.by_kind.get(&kind).map_or(&[], Vec::as_slice)
    }

    pub fn draw_list(&self) -> &[ObjectId] {
        &self.draw_list
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.draw_list.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.draw_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.draw_list.is_empty()
    }

    /// Ids by descending pick priority, insertion order within a kind.
    pub fn by_priority(&self) -> impl Iterator<Item = ObjectId> + '_ {
        let mut kinds: Vec<ObjectKind> = self.by_kind.keys().copied().collect();
        kinds.sort_by_key(|kind| std::cmp::Reverse(kind.pick_priority()));
        kinds
            .into_iter()
            .flat_map(move |kind| self.objects_of_kind(kind).iter().copied())
    }

    /// First contact of `subject` with a stored object.
    ///
    /// For each candidate a blocking collision is checked first, then a
    /// non-blocking interaction.
    pub fn collides(&self, arena: &ObjectArena, subject: &Object) -> Option<Contact> {
        self.by_priority().find_map(|id| {
            let other = arena.get(id)?;
            if let Some(data) = subject.collides_with(other) {
                return Some(Contact {
                    other: id,
                    kind: ContactKind::Collision(data),
                });
            }
            subject.interacts_with(other).map(|offset| Contact {
                other: id,
                kind: ContactKind::Interaction(offset),
            })
        })
    }

    /// Every stored object `subject` blocks against.
    pub fn all_collisions(&self, arena: &ObjectArena, subject: &Object) -> Vec<ObjectId> {
        self.draw_list
            .iter()
            .copied()
            .filter(|id| {
                arena
                    .get(*id)
                    .is_some_and(|other| subject.collides_with(other).is_some())
            })
            .collect()
    }

    /// First enabled object containing `point`, by pick priority.
    pub fn collides_with_point(
        &self,
        arena: &ObjectArena,
        point: Point,
        use_full_rect: bool,
    ) -> Option<ObjectId> {
        self.by_priority().find(|id| {
            arena
                .get(*id)
                .is_some_and(|obj| obj.enabled && obj.collides_with_point(point, use_full_rect))
        })
    }

    /// First object of `kind`, optionally with a given name.
    pub fn find(&self, arena: &ObjectArena, kind: ObjectKind, name: Option<&str>) -> Option<ObjectId> {
        self.objects_of_kind(kind).iter().copied().find(|id| {
            arena
                .get(*id)
                .is_some_and(|obj| name.is_none_or(|n| obj.name() == Some(n)))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SceneId(pub(crate) u32);

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scene{}", self.0)
    }
}

/// A named store with a background colour and an optional world edge.
#[derive(Debug)]
pub struct Scene {
    id: SceneId,
    name: String,
    pub background: Colour,
    boundary: Option<Rect>,
    store: ObjectStore,
}

impl Scene {
    pub fn new(id: SceneId, name: impl Into<String>, background: Colour) -> Self {
        Self {
            id,
            name: name.into(),
            background,
            boundary: None,
            store: ObjectStore::new(),
        }
    }

    pub fn id(&self) -> SceneId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rectangle every mover in the scene is clamped into.
    pub fn boundary(&self) -> Option<Rect> {
        self.boundary
    }

    pub fn set_boundary(&mut self, boundary: Option<Rect>) {
        self.boundary = boundary;
    }

    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ObjectStore {
        &mut self.store
    }

    /// Add an object and point it back at this scene. The object must not
    /// belong to any scene yet.
    pub fn add_object(&mut self, arena: &mut ObjectArena, id: ObjectId) -> Result<()> {
        let obj = arena.get_mut(id).ok_or(EngineError::StaleObject(id))?;
        if let Some(scene) = obj.scene {
            return Err(EngineError::AlreadyInScene(id, scene));
        }
        obj.scene = Some(self.id);
        self.store.add(id, obj.kind());
        Ok(())
    }

    pub fn remove_object(&mut self, arena: &mut ObjectArena, id: ObjectId) -> bool {
        let removed = self.store.remove(id);
        if let Some(obj) = arena.get_mut(id)
            && obj.scene == Some(self.id)
        {
            obj.scene = None;
        }
        removed
    }

    pub fn objects_of_kind(&self, kind: ObjectKind) -> &[ObjectId] {
        self.store.objects_of_kind(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::geometry::ORIGIN;
    use crate::engine::object::PositionStyle;
    use glam::IVec2;

    fn add(arena: &mut ObjectArena, scene: &mut Scene, obj: Object) -> ObjectId {
        let id = arena.insert(obj);
        scene.add_object(arena, id).unwrap();
        id
    }

    fn at(kind: ObjectKind, x: i32, y: i32, size: i32) -> Object {
        Object::builder(kind, IVec2::new(x, y))
            .size(size)
            .position_style(PositionStyle::TOP_LEFT)
            .collision_spec(None)
            .build()
    }

    #[test]
    fn test_add_sets_back_reference_and_indexes() {
        let mut arena = ObjectArena::new();
        let mut scene = Scene::new(SceneId(0), "shops", Colour::WHITE);
        let coin = add(&mut arena, &mut scene, at(ObjectKind::Coin, 0, 0, 20));
        let bush = add(&mut arena, &mut scene, at(ObjectKind::Bush, 50, 0, 20));

        assert_eq!(arena.get(coin).unwrap().scene(), Some(SceneId(0)));
        assert_eq!(scene.objects_of_kind(ObjectKind::Coin), &[coin]);
        assert_eq!(scene.store().draw_list(), &[coin, bush]);
        assert!(scene.objects_of_kind(ObjectKind::Shop).is_empty());
    }

    #[test]
    fn test_remove_clears_index_and_draw_list() {
        let mut arena = ObjectArena::new();
        let mut scene = Scene::new(SceneId(0), "shops", Colour::WHITE);
        let coin = add(&mut arena, &mut scene, at(ObjectKind::Coin, 0, 0, 20));

        assert!(scene.remove_object(&mut arena, coin));
        assert!(!scene.store().contains(coin));
        assert!(scene.objects_of_kind(ObjectKind::Coin).is_empty());
        assert_eq!(arena.get(coin).unwrap().scene(), None);
        assert!(!scene.remove_object(&mut arena, coin));
    }

    #[test]
    fn test_player_picks_up_coin_without_blocking() {
        let mut arena = ObjectArena::new();
        let mut scene = Scene::new(SceneId(0), "shops", Colour::WHITE);
        let coin = add(&mut arena, &mut scene, at(ObjectKind::Coin, 10, 10, 20));
        let player = add(&mut arena, &mut scene, at(ObjectKind::Player, 0, 0, 30));

        let subject = arena.get(player).unwrap();
        assert!(subject.collides_with(arena.get(coin).unwrap()).is_none());
        let contact = scene.store().collides(&arena, subject).expect("coin touched");
        assert_eq!(contact.other, coin);
        assert!(!contact.is_collision());
        assert!(scene.store().all_collisions(&arena, subject).is_empty());
    }

    #[test]
    fn test_priority_finds_coin_before_terrain() {
        let mut arena = ObjectArena::new();
        let mut scene = Scene::new(SceneId(0), "shops", Colour::WHITE);
        let wall = add(&mut arena, &mut scene, at(ObjectKind::Background, 0, 0, 100));
        let coin = add(&mut arena, &mut scene, at(ObjectKind::Coin, 10, 10, 20));
        let player = add(&mut arena, &mut scene, at(ObjectKind::Player, 5, 5, 30));

        let subject = arena.get(player).unwrap();
        let contact = scene.store().collides(&arena, subject).unwrap();
        assert_eq!(contact.other, coin);
        assert_eq!(scene.store().all_collisions(&arena, subject), vec![wall]);
    }

    #[test]
    fn test_insertion_order_within_kind() {
        let mut arena = ObjectArena::new();
        let mut scene = Scene::new(SceneId(0), "shops", Colour::WHITE);
        let first = add(&mut arena, &mut scene, at(ObjectKind::Shop, 0, 0, 50));
        let _second = add(&mut arena, &mut scene, at(ObjectKind::Shop, 0, 0, 50));
        let player = add(&mut arena, &mut scene, at(ObjectKind::Player, 10, 10, 10));

        let contact = scene.store().collides(&arena, arena.get(player).unwrap()).unwrap();
        assert_eq!(contact.other, first);
        assert!(contact.is_collision());
    }

    #[test]
    fn test_point_pick_uses_priority() {
        let mut arena = ObjectArena::new();
        let mut scene = Scene::new(SceneId(0), "shops", Colour::WHITE);
        let _shop = add(&mut arena, &mut scene, at(ObjectKind::Shop, 0, 0, 100));
        let digspot = add(&mut arena, &mut scene, at(ObjectKind::Digspot, 40, 40, 10));

        assert_eq!(scene.store().collides_with_point(&arena, IVec2::new(45, 45), true), Some(digspot));
        assert_eq!(scene.store().collides_with_point(&arena, IVec2::new(500, 500), true), None);
    }

    #[test]
    fn test_object_joins_one_scene_at_a_time() {
        let mut arena = ObjectArena::new();
        let mut street = Scene::new(SceneId(0), "shops", Colour::WHITE);
        let mut inside = Scene::new(SceneId(1), "insideShop1", Colour::PINK);
        let coin = add(&mut arena, &mut street, at(ObjectKind::Coin, 0, 0, 20));

        assert!(matches!(
            street.add_object(&mut arena, coin),
            Err(EngineError::AlreadyInScene(id, SceneId(0))) if id == coin
        ));
        assert!(matches!(inside.add_object(&mut arena, coin), Err(EngineError::AlreadyInScene(..))));
        assert_eq!(street.store().len(), 1);
        assert!(inside.store().is_empty());

        street.remove_object(&mut arena, coin);
        inside.add_object(&mut arena, coin).unwrap();
        assert_eq!(arena.get(coin).unwrap().scene(), Some(SceneId(1)));
    }

    #[test]
    fn test_find_by_name() {
        let mut arena = ObjectArena::new();
        let mut scene = Scene::new(SceneId(0), "shops", Colour::WHITE);
        let _one = add(&mut arena, &mut scene, Object::builder(ObjectKind::Shop, ORIGIN).name("shop1").build());
        let two = add(&mut arena, &mut scene, Object::builder(ObjectKind::Shop, ORIGIN).name("shop2").build());
        assert_eq!(scene.store().find(&arena, ObjectKind::Shop, Some("shop2")), Some(two));
        assert_eq!(scene.store().find(&arena, ObjectKind::Shop, Some("shop9")), None);
    }
}
