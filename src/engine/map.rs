//! The map: scenes, overlays, movers and the event queue
//!
//! The map owns every object through one arena. Scenes and the overlay store
//! hold ids. Per frame the driver calls `move_objects`, `update` and `draw` in
//! that order, then drains the events posted while moving.
//!
//! Pointer input arrives in screen coordinates and is converted with the
//! camera passed to the last `update`.

use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use glam::IVec2;

use super::arena::{ObjectArena, ObjectId};
use super::boundary::CollisionProbe;
use super::compositor;
use super::event::{Contact, EngineEvent};
use super::geometry::{ORIGIN, Point, Rect, Vector, unit_step};
use super::kind::ObjectKind;
use super::movement::{Axis, Direction, Key};
use super::object::{AttachStyle, Frame, Object, PositionStyle};
use super::store::{ObjectStore, Scene, SceneId};
use super::surface::{Canvas, Colour, Surface};
use super::viewport::Viewport;
use crate::consts::{CLICK_DRAG_LIMIT, DEBUG_MARKER_LIFETIME, DEFAULT_BACKGROUND_COLOUR};
use crate::error::{EngineError, Result};
use crate::settings::DebugDraw;

/// Collision queries for one mover against one store.
///
/// Each query moves the mover to the trial position with `push_pos`, asks the
/// store, then restores it with `pop_pos`.
pub struct SceneProbe<'a> {
    arena: &'a mut ObjectArena,
    store: &'a ObjectStore,
    mover: ObjectId,
}

impl<'a> SceneProbe<'a> {
    pub fn new(arena: &'a mut ObjectArena, store: &'a ObjectStore, mover: ObjectId) -> Self {
        Self { arena, store, mover }
    }

    fn at<T>(&mut self, pos: Point, query: impl FnOnce(&ObjectArena, &Object) -> T) -> Option<T> {
        self.arena.get_mut(self.mover)?.push_pos(pos);
        let arena: &ObjectArena = self.arena;
        let result = arena.get(self.mover).map(|subject| query(arena, subject));
        if let Some(obj) = self.arena.get_mut(self.mover) {
            obj.pop_pos();
        }
        result
    }
}

impl CollisionProbe for SceneProbe<'_> {
    fn position(&self) -> Point {
        self.arena.get(self.mover).map_or(ORIGIN, Object::pos)
    }

    fn contact_at(&mut self, pos: Point) -> Option<Contact> {
        let store = self.store;
        self.at(pos, |arena, subject| store.collides(arena, subject))
            .flatten()
    }

    fn collisions_at(&mut self, pos: Point) -> Vec<ObjectId> {
        let store = self.store;
        self.at(pos, |arena, subject| store.all_collisions(arena, subject))
            .unwrap_or_default()
    }
}

/// A held pointer button.
#[derive(Debug, Clone, Copy)]
struct Pointer {
    /// Screen position of the press
    press: Point,
    /// Object picked up by the press
    object: Option<ObjectId>,
    /// Latest screen position while held
    drag: Option<Point>,
}

#[derive(Debug)]
pub struct Map {
    arena: ObjectArena,
    scenes: Vec<Scene>,
    scene_names: HashMap<String, SceneId>,
    current: SceneId,
    overlays: ObjectStore,
    movers: Vec<ObjectId>,
    events: VecDeque<EngineEvent>,
    /// Linked portal pairs, stored both ways
    portals: HashMap<ObjectId, ObjectId>,
    pointer: Option<Pointer>,
    allow_drag: bool,
    paused: bool,
    camera: Point,
}

impl Default for Map {
    fn default() -> Self {
        Self::new("default", DEFAULT_BACKGROUND_COLOUR)
    }
}

impl Map {
    /// A map with one scene, which is current.
    pub fn new(first_scene: &str, background: Colour) -> Self {
        let mut map = Self {
            arena: ObjectArena::new(),
            scenes: Vec::new(),
            scene_names: HashMap::new(),
            current: SceneId(0),
            overlays: ObjectStore::new(),
            movers: Vec::new(),
            events: VecDeque::new(),
            portals: HashMap::new(),
            pointer: None,
            allow_drag: true,
            paused: false,
            camera: ORIGIN,
        };
        map.create_scene(first_scene, background, None);
        map
    }

    // === Scenes ===

    /// Create a scene, or return the existing one with that name.
    pub fn create_scene(&mut self, name: &str, background: Colour, boundary: Option<Rect>) -> SceneId {
        if let Some(id) = self.scene_names.get(name) {
            return *id;
        }
        let id = SceneId(self.scenes.len() as u32);
        let mut scene = Scene::new(id, name, background);
        scene.set_boundary(boundary);
        self.scenes.push(scene);
        self.scene_names.insert(name.to_string(), id);
        log::info!("Created scene '{name}' ({id})");
        id
    }

    pub fn scene_id(&self, name: &str) -> Result<SceneId> {
        self.scene_names
            .get(name)
            .copied()
            .ok_or_else(|| EngineError::UnknownScene(name.to_string()))
    }

    pub fn scene(&self, id: SceneId) -> &Scene {
        &self.scenes[id.0 as usize]
    }

    pub fn scene_mut(&mut self, id: SceneId) -> &mut Scene {
        &mut self.scenes[id.0 as usize]
    }

    pub fn current_scene_id(&self) -> SceneId {
        self.current
    }

    pub fn current_scene(&self) -> &Scene {
        self.scene(self.current)
    }

    pub fn background(&self) -> Colour {
        self.current_scene().background
    }

    /// Switch scenes. `Ok(false)` when `name` is already current.
    pub fn change_scene(&mut self, name: &str) -> Result<bool> {
        let id = self.scene_id(name)?;
        if id == self.current {
            return Ok(false);
        }
        self.current = id;
        log::info!("Changed scene to '{name}'");
        Ok(true)
    }

    /// Move an object from its scene, or from outside any scene, to `scene`.
    /// An object placed from outside leaves the overlays.
    pub fn move_object_to_scene(&mut self, id: ObjectId, scene: SceneId) -> Result<()> {
        match self.object(id)?.scene() {
            Some(from) if from == scene => return Ok(()),
            Some(from) => {
                self.scenes[from.0 as usize].remove_object(&mut self.arena, id);
            }
            None => {
                self.overlays.remove(id);
            }
        }
        self.scenes[scene.0 as usize].add_object(&mut self.arena, id)
    }

    // === Objects ===

    pub fn arena(&self) -> &ObjectArena {
        &self.arena
    }

    pub fn object(&self, id: ObjectId) -> Result<&Object> {
        self.arena.get(id).ok_or(EngineError::StaleObject(id))
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Result<&mut Object> {
        self.arena.get_mut(id).ok_or(EngineError::StaleObject(id))
    }

    fn insert(&mut self, object: Object) -> ObjectId {
        let id = self.arena.insert(object);
        if let Some(obj) = self.arena.get_mut(id)
            && let Some(movement) = obj.movement_mut()
        {
            movement.motion_mut().attach(id);
            self.movers.push(id);
        }
        id
    }

    /// Add an object to a scene.
    pub fn add_object_to(&mut self, scene: SceneId, object: Object) -> Result<ObjectId> {
        let id = self.insert(object);
        self.scenes[scene.0 as usize].add_object(&mut self.arena, id)?;
        Ok(id)
    }

    /// Add an object to the current scene.
    pub fn add_object(&mut self, object: Object) -> Result<ObjectId> {
        self.add_object_to(self.current, object)
    }

    /// Add a HUD object, drawn on top of every scene.
    pub fn add_overlay(&mut self, object: Object) -> ObjectId {
        let kind = object.kind();
        let id = self.insert(object);
        self.overlays.add(id, kind);
        id
    }

    pub fn overlays(&self) -> &ObjectStore {
        &self.overlays
    }

    /// Objects of a kind in the current scene, in insertion order.
    pub fn objects_of_kind(&self, kind: ObjectKind) -> &[ObjectId] {
        self.current_scene().objects_of_kind(kind)
    }

    /// First object of a kind in the current scene or the overlays.
    pub fn find(&self, kind: ObjectKind, name: Option<&str>) -> Option<ObjectId> {
        self.current_scene()
            .store()
            .find(&self.arena, kind, name)
            .or_else(|| self.overlays.find(&self.arena, kind, name))
    }

    pub fn find_named(&self, kind: ObjectKind, name: &str) -> Result<ObjectId> {
        self.find(kind, Some(name))
            .ok_or_else(|| EngineError::UnknownObject(name.to_string()))
    }

    /// Remove an object, and everything attached to it, from the map.
    pub fn remove_object(&mut self, id: ObjectId) -> Result<Object> {
        let obj = self.object(id)?;
        let scene = obj.scene();
        let parent = obj.parent();
        if let Some(scene) = scene {
            self.scenes[scene.0 as usize].remove_object(&mut self.arena, id);
        }
        self.overlays.remove(id);
        if parent.is_some() {
            self.detach_object(id)?;
        }
        self.movers.retain(|m| *m != id);
        if let Some(exit) = self.portals.remove(&id) {
            self.portals.remove(&exit);
        }

        let mut obj = self.arena.remove(id).ok_or(EngineError::StaleObject(id))?;
        let children: Vec<ObjectId> = obj.children().collect();
        obj.attached.clear();
        obj.associated.clear();
        for child in children {
            if let Some(c) = self.arena.get_mut(child) {
                c.parent = None;
            }
            self.remove_object(child)?;
        }
        log::debug!("Removed {:?} {id}", obj.kind());
        Ok(obj)
    }

    /// Remove every object of a kind from the current scene and the overlays.
    pub fn remove_all_of_kind(&mut self, kind: ObjectKind) -> usize {
        let mut ids = self.scenes[self.current.0 as usize]
            .store()
            .objects_of_kind(kind)
            .to_vec();
        ids.extend_from_slice(self.overlays.objects_of_kind(kind));
        ids.into_iter()
            .filter(|id| self.remove_object(*id).is_ok())
            .count()
    }

    // === Attachment ===

    /// Attach `child` to `parent`. The child leaves its scene; without an
    /// explicit `pos` it is placed at the parent's origin.
    pub fn attach_object(
        &mut self,
        parent: ObjectId,
        child: ObjectId,
        style: AttachStyle,
        pos: Option<Point>,
    ) -> Result<()> {
        let parent_draw_order = self.object(parent)?.draw_order;
        let current = self.object(child)?;
        if current.parent().is_some() {
            self.detach_object(child)?;
        }
        if let Some(scene) = self.object(child)?.scene() {
            self.scenes[scene.0 as usize].remove_object(&mut self.arena, child);
        }
        self.overlays.remove(child);

        let obj = self.object_mut(child)?;
        obj.set_pos(pos.unwrap_or(ORIGIN));
        if !obj.has_position_style() {
            obj.set_position_style(PositionStyle::RELATIVE_CENTRE);
        }
        if style == AttachStyle::Tight {
            obj.draw_order = parent_draw_order;
        }
        obj.parent = Some(parent);

        let parent_obj = self.object_mut(parent)?;
        match style {
            AttachStyle::Tight => parent_obj.attached.push(child),
            AttachStyle::Loose => parent_obj.associated.push(child),
        }
        Ok(())
    }

    /// Build and attach an object in one go.
    pub fn attach_new(&mut self, parent: ObjectId, object: Object, style: AttachStyle) -> Result<ObjectId> {
        let pos = object.pos();
        let id = self.insert(object);
        self.attach_object(parent, id, style, Some(pos))?;
        Ok(id)
    }

    /// Detach from the parent. `Ok(false)` when the object had none.
    ///
    /// A detached object belongs to no scene. It stays in the arena until
    /// the caller places it with `move_object_to_scene` or drops it with
    /// `remove_object`.
    pub fn detach_object(&mut self, child: ObjectId) -> Result<bool> {
        let Some(parent) = self.object_mut(child)?.parent.take() else {
            return Ok(false);
        };
        if let Some(p) = self.arena.get_mut(parent) {
            p.attached.retain(|id| *id != child);
            p.associated.retain(|id| *id != child);
        }
        log::debug!("Detached {child} from {parent}");
        Ok(true)
    }

    /// Attached or associated child with the given name.
    pub fn named_attached_object(&self, parent: ObjectId, name: &str) -> Result<Option<ObjectId>> {
        Ok(self
            .object(parent)?
            .children()
            .find(|id| self.arena.get(*id).is_some_and(|obj| obj.name() == Some(name))))
    }

    pub fn detach_named_object(&mut self, parent: ObjectId, name: &str) -> Result<Option<ObjectId>> {
        let found = self.named_attached_object(parent, name)?;
        if let Some(child) = found {
            self.detach_object(child)?;
        }
        Ok(found)
    }

    /// Detach every tight child, and the loose ones too if asked. The caller
    /// owns the returned objects, as with `detach_object`.
    pub fn detach_all_objects(&mut self, parent: ObjectId, include_associated: bool) -> Result<Vec<ObjectId>> {
        let obj = self.object_mut(parent)?;
        let mut detached = std::mem::take(&mut obj.attached);
        if include_associated {
            detached.append(&mut obj.associated);
        }
        for child in &detached {
            if let Some(c) = self.arena.get_mut(*child) {
                c.parent = None;
            }
        }
        Ok(detached)
    }

    /// Drop a short-lived marker box at `pos` relative to an object.
    pub fn debug_pos(&mut self, parent: ObjectId, name: &str, pos: Point) -> Result<ObjectId> {
        let marker = match self.named_attached_object(parent, name)? {
            Some(marker) => marker,
            None => {
                let obj = Object::builder(ObjectKind::Box, pos).name(name).size(4).build();
                self.attach_new(parent, obj, AttachStyle::Tight)?
            }
        };
        let obj = self.object_mut(marker)?;
        obj.set_pos(pos);
        obj.set_lifetime(Some(DEBUG_MARKER_LIFETIME));
        Ok(marker)
    }

    // === Movement ===

    pub fn set_movement(&mut self, id: ObjectId, direction: Direction) -> Result<()> {
        self.object_mut(id)?
            .movement_mut()
            .ok_or(EngineError::NoMovementStyle(id))?
            .set_movement(direction);
        Ok(())
    }

    pub fn stop_movement(&mut self, id: ObjectId, direction: Direction) -> Result<()> {
        self.object_mut(id)?
            .movement_mut()
            .ok_or(EngineError::NoMovementStyle(id))?
            .stop_movement(direction);
        Ok(())
    }

    /// Pass a key press to an object's movement style. `Ok(false)` when the
    /// style does not use the key.
    pub fn key_down(&mut self, id: ObjectId, key: Key) -> Result<bool> {
        let used = self
            .object_mut(id)?
            .movement_mut()
            .ok_or(EngineError::NoMovementStyle(id))?
            .key_down(key);
        if !used {
            log::debug!("{key:?} not bound for {id}");
        }
        Ok(used)
    }

    pub fn key_up(&mut self, id: ObjectId, key: Key) -> Result<bool> {
        Ok(self
            .object_mut(id)?
            .movement_mut()
            .ok_or(EngineError::NoMovementStyle(id))?
            .key_up(key))
    }

    pub fn stop_all_movement(&mut self, id: ObjectId) -> Result<()> {
        self.object_mut(id)?
            .movement_mut()
            .ok_or(EngineError::NoMovementStyle(id))?
            .motion_mut()
            .stop_all();
        Ok(())
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
        log::info!("{}", if paused { "Paused" } else { "Resumed" });
    }

    pub fn toggle_paused(&mut self) -> bool {
        self.set_paused(!self.paused);
        self.paused
    }

    /// Advance every mover one tick. Does nothing while paused.
    pub fn move_objects(&mut self) -> Result<()> {
        if self.paused {
            return Ok(());
        }
        let movers = self.movers.clone();
        for id in movers {
            self.move_object(id)?;
        }
        Ok(())
    }

    fn store_of(&self, scene: Option<SceneId>) -> &ObjectStore {
        match scene {
            Some(scene) => self.scenes[scene.0 as usize].store(),
            None => &self.overlays,
        }
    }

    fn move_object(&mut self, id: ObjectId) -> Result<()> {
        let Some(obj) = self.arena.get_mut(id) else {
            return Ok(());
        };
        if !obj.can_move() || (obj.scene().is_none() && !self.overlays.contains(id)) {
            return Ok(());
        }
        let scene = obj.scene();
        let Some(mut movement) = obj.take_movement() else {
            return Ok(());
        };
        if movement.motion().attached() != Some(id) {
            obj.restore_movement(movement);
            return Err(EngineError::UnattachedMovement(id));
        }
        let old_pos = obj.pos();

        let store = match scene {
            Some(scene) => self.scenes[scene.0 as usize].store(),
            None => &self.overlays,
        };
        let stepped = {
            let mut probe = SceneProbe::new(&mut self.arena, store, id);
            movement.step(&mut probe)
        };
        let contact = movement.motion_mut().boundary_mut().and_then(|b| b.take_contact());
        let scene_edge = scene.and_then(|s| self.scenes[s.0 as usize].boundary());

        let mut image = None;
        if let Some(obj) = self.arena.get_mut(id) {
            if let Some(mut pos) = stepped {
                if let Some(edge) = scene_edge {
                    pos = edge.bound_point(pos);
                }
                if pos != old_pos {
                    obj.set_pos(pos);
                    obj.steps += 1;
                }
                image = obj
                    .images()
                    .and_then(|images| movement.motion().choose_image(images));
            }
            obj.restore_movement(movement);
        }

        if let Some(image) = image {
            self.check_swap_image(id, image)?;
        }
        if let Some(contact) = contact {
            self.post_event(EngineEvent::from_contact(id, contact));
        }
        Ok(())
    }

    /// Show `image` unless it would make the object collide where it stands.
    /// True when the object now shows `image`.
    pub fn check_swap_image(&mut self, id: ObjectId, image: Rc<Surface>) -> Result<bool> {
        let obj = self.object_mut(id)?;
        if obj.image().is_some_and(|current| Rc::ptr_eq(current, &image)) {
            return Ok(true);
        }
        let previous = obj.image().cloned();
        let scene = obj.scene();
        obj.swap_image(image);

        let subject = self.object(id)?;
        let blocked = self
            .store_of(scene)
            .collides(&self.arena, subject)
            .is_some_and(|contact| contact.is_collision());
        if !blocked {
            return Ok(true);
        }
        if let Some(previous) = previous {
            self.object_mut(id)?.swap_image(previous);
        }
        log::debug!("Image swap for {id} reverted, new image collides");
        Ok(false)
    }

    // === Portals ===

    /// Link two portals; passing through either comes out of the other.
    pub fn link_portals(&mut self, a: ObjectId, b: ObjectId) -> Result<()> {
        for id in [a, b] {
            if self.object(id)?.kind() != ObjectKind::Portal {
                return Err(EngineError::NotAPortal(id));
            }
        }
        self.portals.insert(a, b);
        self.portals.insert(b, a);
        Ok(())
    }

    pub fn portal_exit(&self, portal: ObjectId) -> Option<ObjectId> {
        self.portals
            .get(&portal)
            .copied()
            .filter(|exit| self.arena.contains(*exit))
    }

    /// Carry `mover` through `portal` into the scene of the linked portal.
    ///
    /// On each axis it is moving along, the mover keeps its offset from the
    /// entry portal and lands that far past the exit, then steps on until it
    /// no longer touches the exit. Returns the new scene, or `Ok(None)` when
    /// the portal is not linked. The current scene does not change.
    pub fn move_through_portal(&mut self, mover: ObjectId, portal: ObjectId) -> Result<Option<SceneId>> {
        let entry = self.object(portal)?;
        if entry.kind() != ObjectKind::Portal {
            return Err(EngineError::NotAPortal(portal));
        }
        let Some(exit) = self.portal_exit(portal) else {
            return Ok(None);
        };
        let exit_obj = self.object(exit)?;
        let scene = exit_obj.scene().ok_or(EngineError::NotInScene(exit))?;
        let traveller = self.object(mover)?;

        let mut offset = entry.live_collision_rect().center() - traveller.live_collision_rect().center();
        let motion = traveller.movement().map(|m| m.motion());
        if motion.and_then(|m| m.moving_on(Axis::Horizontal)).is_none() {
            offset.x = 0;
        }
        if motion.and_then(|m| m.moving_on(Axis::Vertical)).is_none() {
            offset.y = 0;
        }
        let landing = exit_obj.pos() + offset;

        self.move_object_to_scene(mover, scene)?;
        self.object_mut(mover)?.set_pos(landing);
        self.step_clear_of(mover, exit, offset)?;
        log::info!("{mover} went through portal {portal} into {}", self.scene(scene).name());
        Ok(Some(scene))
    }

    fn step_clear_of(&mut self, mover: ObjectId, exit: ObjectId, heading: Vector) -> Result<()> {
        let step = unit_step(heading);
        if step == IVec2::ZERO {
            return Ok(());
        }
        let exit_obj = self.object(exit)?;
        let limit = exit_obj.width() + exit_obj.height();
        for _ in 0..limit {
            let touching = self
                .object(mover)?
                .collision_mask_overlap(self.object(exit)?)
                .is_some();
            if !touching {
                break;
            }
            let obj = self.object_mut(mover)?;
            obj.set_pos(obj.pos() + step);
        }
        Ok(())
    }

    /// First contact of an object with its own scene (or the overlays).
    pub fn collides(&self, id: ObjectId) -> Result<Option<Contact>> {
        let subject = self.object(id)?;
        Ok(self.store_of(subject.scene()).collides(&self.arena, subject))
    }

    // === Events ===

    pub fn post_event(&mut self, event: EngineEvent) {
        log::debug!("Posting {event:?}");
        self.events.push_back(event);
    }

    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        self.events.drain(..).collect()
    }

    // === Pointer ===

    pub fn set_allow_drag(&mut self, allow: bool) {
        self.allow_drag = allow;
    }

    /// Press the pointer. A moving object or portal under it becomes the
    /// drag target, which is returned.
    pub fn press(&mut self, screen: Point) -> Option<ObjectId> {
        let world = screen + self.camera;
        let object = if self.allow_drag {
            self.current_scene()
                .store()
                .collides_with_point(&self.arena, world, true)
                .filter(|id| {
                    self.arena
                        .get(*id)
                        .is_some_and(|obj| obj.kind().is_dynamic() || obj.kind() == ObjectKind::Portal)
                })
        } else {
            None
        };
        self.pointer = Some(Pointer {
            press: screen,
            object,
            drag: None,
        });
        object
    }

    /// Pointer moved while held.
    pub fn drag_to(&mut self, screen: Point) {
        if let Some(pointer) = self.pointer.as_mut() {
            pointer.drag = Some(screen);
        }
    }

    /// Release the pointer. A release within `CLICK_DRAG_LIMIT` of the press
    /// is a click at the press position.
    pub fn release(&mut self, screen: Point) -> Option<ObjectId> {
        let pointer = self.pointer.take()?;
        if !Viewport::position_near(screen, pointer.press, CLICK_DRAG_LIMIT) {
            return None;
        }
        self.click(pointer.press + self.camera)
    }

    fn drag_target(&self) -> Option<(ObjectId, Point)> {
        let pointer = self.pointer?;
        Some((pointer.object?, pointer.drag?))
    }

    /// Object following the pointer, once it has moved while held.
    pub fn dragged_object(&self) -> Option<ObjectId> {
        self.drag_target().map(|(id, _)| id)
    }

    /// Pick the object under a world point, HUD first, and post a click.
    pub fn click(&mut self, pos: Point) -> Option<ObjectId> {
        let picked = self
            .overlays
            .collides_with_point(&self.arena, pos, true)
            .or_else(|| {
                self.current_scene()
                    .store()
                    .collides_with_point(&self.arena, pos, true)
            })?;
        self.post_event(EngineEvent::Click { object: picked, pos });
        Some(picked)
    }

    // === Frame ===

    pub fn camera(&self) -> Point {
        self.camera
    }

    /// Move the dragged object to the pointer, refresh rectangles of the
    /// current scene and the overlays, tick lifetimes and drop what expired.
    pub fn update(&mut self, camera: Point) -> Result<()> {
        self.camera = camera;
        if let Some((id, screen)) = self.drag_target()
            && let Some(obj) = self.arena.get_mut(id)
        {
            obj.set_pos(screen + camera);
        }
        let roots: Vec<ObjectId> = self
            .current_scene()
            .store()
            .draw_list()
            .iter()
            .chain(self.overlays.draw_list())
            .copied()
            .collect();
        let mut expired = Vec::new();
        for id in roots {
            self.update_tree(id, camera, ORIGIN, &mut expired);
        }
        for id in expired {
            self.expire(id)?;
        }
        Ok(())
    }

    fn update_tree(&mut self, id: ObjectId, camera: Point, offset: IVec2, expired: &mut Vec<ObjectId>) {
        let Some(obj) = self.arena.get_mut(id) else {
            return;
        };
        let bob = IVec2::new(0, -obj.bounce_offset());
        obj.update_rect(camera, offset + bob);
        if obj.tick_lifetime() {
            expired.push(id);
        }
        let anchor = obj.pos() + offset;
        let draw_order = obj.draw_order;
        let attached = obj.attached.clone();
        let associated = obj.associated.clone();

        for child in attached.iter().chain(associated.iter()) {
            let Some(c) = self.arena.get_mut(*child) else {
                continue;
            };
            if attached.contains(child) {
                c.draw_order = draw_order;
            }
            let child_offset = match c.position_style().frame {
                Frame::Relative => anchor,
                _ => offset,
            };
            self.update_tree(*child, camera, child_offset, expired);
        }
    }

    /// Detach and release an expired object. Already gone when an expired
    /// parent took it along.
    fn expire(&mut self, id: ObjectId) -> Result<()> {
        let Some(obj) = self.arena.get(id) else {
            return Ok(());
        };
        let kind = obj.kind();
        if obj.parent().is_some() {
            self.detach_object(id)?;
        }
        log::debug!("{kind:?} {id} expired");
        self.remove_object(id)?;
        Ok(())
    }

    /// Draw the current scene, then the overlays.
    pub fn draw(&self, view: &Viewport, canvas: &mut dyn Canvas, debug: &DebugDraw) -> usize {
        canvas.clear(self.background());
        let view_rect = view.camera_rect();
        let mut drawn = 0;
        for store in [self.current_scene().store(), &self.overlays] {
            let mut ids = compositor::draw_list(&self.arena, store);
            compositor::sort_for_drawing(&self.arena, &mut ids);
            drawn += compositor::render(canvas, &self.arena, &ids, view_rect, debug);
        }
        drawn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::boundary::CollisionBoundary;
    use crate::engine::movement::{GeneralMovement, KeyMovement};

    fn square(kind: ObjectKind, x: i32, y: i32, size: i32) -> Object {
        Object::builder(kind, IVec2::new(x, y))
            .size(size)
            .position_style(PositionStyle::TOP_LEFT)
            .collision_spec(None)
            .build()
    }

    fn player(x: i32, y: i32) -> Object {
        let movement = KeyMovement::new(
            GeneralMovement::new(IVec2::new(17, 10)).with_boundary(CollisionBoundary::new()),
        );
        Object::builder(ObjectKind::Player, IVec2::new(x, y))
            .size(10)
            .position_style(PositionStyle::TOP_LEFT)
            .collision_spec(None)
            .movement(movement)
            .build()
    }

    #[test]
    fn test_change_scene_to_current_is_noop() {
        let mut map = Map::new("shops", Colour::WHITE);
        map.create_scene("insideShop1", Colour::PINK, None);

        assert!(!map.change_scene("shops").unwrap());
        assert!(map.change_scene("insideShop1").unwrap());
        assert_eq!(map.current_scene().name(), "insideShop1");
        assert_eq!(map.background(), Colour::PINK);
        assert!(matches!(map.change_scene("nowhere"), Err(EngineError::UnknownScene(_))));
    }

    #[test]
    fn test_movement_errors_for_static_objects() {
        let mut map = Map::default();
        let rock = map.add_object(square(ObjectKind::Generic, 0, 0, 10)).unwrap();
        assert!(matches!(
            map.set_movement(rock, Direction::Left),
            Err(EngineError::NoMovementStyle(_))
        ));
        let removed = map.remove_object(rock).unwrap();
        assert_eq!(removed.kind(), ObjectKind::Generic);
        assert!(matches!(map.set_movement(rock, Direction::Left), Err(EngineError::StaleObject(_))));
    }

    #[test]
    fn test_player_slides_along_wall() {
        let mut map = Map::default();
        let wall = map.add_object(square(ObjectKind::Background, 110, 0, 400)).unwrap();
        let hero = map.add_object(player(100, 100)).unwrap();
        map.set_movement(hero, Direction::Right).unwrap();
        map.set_movement(hero, Direction::Up).unwrap();

        map.move_objects().unwrap();
        let obj = map.object(hero).unwrap();
        assert_eq!(obj.pos(), IVec2::new(100, 90));
        assert_eq!(obj.steps, 1);
        let blocked = obj.movement().unwrap().motion().boundary().unwrap().blocked();
        assert!(blocked.horizontally);

        let events = map.drain_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], EngineEvent::Collision { subject, other, .. } if subject == hero && other == wall));
        assert!(map.drain_events().is_empty());
    }

    #[test]
    fn test_coin_pickup_posts_interaction() {
        let mut map = Map::default();
        let coin = map.add_object(square(ObjectKind::Coin, 30, 0, 10)).unwrap();
        let hero = map.add_object(player(0, 0)).unwrap();
        map.set_movement(hero, Direction::Right).unwrap();

        map.move_objects().unwrap();
        assert_eq!(map.object(hero).unwrap().pos(), IVec2::new(17, 0));
        map.move_objects().unwrap();
        assert_eq!(map.object(hero).unwrap().pos(), IVec2::new(34, 0));
        let events = map.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, EngineEvent::Interaction { other, .. } if *other == coin)));
    }

    #[test]
    fn test_pause_stops_movement() {
        let mut map = Map::default();
        let hero = map.add_object(player(0, 0)).unwrap();
        map.set_movement(hero, Direction::Down).unwrap();
        map.set_paused(true);
        map.move_objects().unwrap();
        assert_eq!(map.object(hero).unwrap().pos(), ORIGIN);
        map.set_paused(false);
        map.move_objects().unwrap();
        assert_eq!(map.object(hero).unwrap().pos(), IVec2::new(0, 10));
    }

    #[test]
    fn test_scene_boundary_clamps_movers() {
        let mut map = Map::new("yard", Colour::WHITE);
        let fenced = map.create_scene("fenced", Colour::WHITE, Some(Rect::new(0, 0, 100, 100)));
        let hero = map.add_object_to(fenced, player(95, 50)).unwrap();
        map.set_movement(hero, Direction::Right).unwrap();
        map.move_objects().unwrap();
        assert_eq!(map.object(hero).unwrap().pos(), IVec2::new(100, 50));
    }

    #[test]
    fn test_attached_object_expires_after_lifetime() {
        let mut map = Map::default();
        let parent = map.add_object(square(ObjectKind::Generic, 10, 10, 10)).unwrap();
        let label = Object::builder(ObjectKind::Text, IVec2::new(0, -5)).lifetime(3).build();
        let label = map.attach_new(parent, label, AttachStyle::Tight).unwrap();

        for _ in 0..2 {
            map.update(ORIGIN).unwrap();
            assert_eq!(map.object(label).unwrap().parent(), Some(parent));
            assert_eq!(map.object(parent).unwrap().attached_objects(), &[label]);
        }
        map.update(ORIGIN).unwrap();
        assert!(map.object(parent).unwrap().attached_objects().is_empty());
        assert!(map.object(label).is_err());
    }

    #[test]
    fn test_attached_object_follows_parent() {
        let mut map = Map::default();
        let parent = map.add_object(square(ObjectKind::Generic, 100, 100, 10)).unwrap();
        let tag = Object::builder(ObjectKind::Generic, IVec2::new(0, -20)).size(4).draw_order(9).build();
        let tag = map.attach_new(parent, tag, AttachStyle::Tight).unwrap();
        map.update(ORIGIN).unwrap();

        let obj = map.object(tag).unwrap();
        assert_eq!(obj.position_style(), PositionStyle::RELATIVE_CENTRE);
        assert_eq!(obj.rect(), Rect::new(98, 78, 4, 4));
        assert_eq!(obj.draw_order, map.object(parent).unwrap().draw_order);
        assert!(!map.current_scene().store().contains(tag));
    }

    #[test]
    fn test_scene_object_expires_without_parent() {
        let mut map = Map::default();
        let flash = map.add_object(Object::builder(ObjectKind::Box, ORIGIN).lifetime(1).build()).unwrap();
        map.update(ORIGIN).unwrap();
        assert!(map.object(flash).is_err());
        assert!(map.objects_of_kind(ObjectKind::Box).is_empty());
    }

    #[test]
    fn test_remove_releases_children() {
        let mut map = Map::default();
        let parent = map.add_object(square(ObjectKind::Generic, 0, 0, 10)).unwrap();
        let child = map
            .attach_new(parent, Object::builder(ObjectKind::Text, ORIGIN).build(), AttachStyle::Loose)
            .unwrap();
        map.remove_object(parent).unwrap();
        assert!(map.object(child).is_err());
        assert!(map.arena().is_empty());
    }

    #[test]
    fn test_named_attachments() {
        let mut map = Map::default();
        let parent = map.add_object(square(ObjectKind::Generic, 0, 0, 10)).unwrap();
        let a = map
            .attach_new(parent, Object::builder(ObjectKind::Text, ORIGIN).name("a").build(), AttachStyle::Tight)
            .unwrap();
        let b = map
            .attach_new(parent, Object::builder(ObjectKind::Text, ORIGIN).name("b").build(), AttachStyle::Loose)
            .unwrap();

        assert_eq!(map.named_attached_object(parent, "b").unwrap(), Some(b));
        assert_eq!(map.detach_named_object(parent, "a").unwrap(), Some(a));
        assert_eq!(map.object(a).unwrap().parent(), None);
        assert_eq!(map.detach_all_objects(parent, false).unwrap(), Vec::<ObjectId>::new());
        assert_eq!(map.detach_all_objects(parent, true).unwrap(), vec![b]);
    }

    #[test]
    fn test_debug_marker_reuses_and_expires() {
        let mut map = Map::default();
        let parent = map.add_object(square(ObjectKind::Generic, 0, 0, 10)).unwrap();
        let first = map.debug_pos(parent, "feet", IVec2::new(1, 2)).unwrap();
        let again = map.debug_pos(parent, "feet", IVec2::new(3, 4)).unwrap();
        assert_eq!(first, again);
        assert_eq!(map.object(first).unwrap().pos(), IVec2::new(3, 4));
        for _ in 0..DEBUG_MARKER_LIFETIME {
            map.update(ORIGIN).unwrap();
        }
        assert!(map.object(first).is_err());
    }

    #[test]
    fn test_remove_all_of_kind_covers_overlays() {
        let mut map = Map::default();
        map.add_object(square(ObjectKind::Monster, 0, 0, 10)).unwrap();
        map.add_overlay(square(ObjectKind::Monster, 0, 0, 10));
        map.add_object(square(ObjectKind::Coin, 0, 0, 10)).unwrap();
        assert_eq!(map.remove_all_of_kind(ObjectKind::Monster), 2);
        assert_eq!(map.objects_of_kind(ObjectKind::Coin).len(), 1);
    }

    #[test]
    fn test_click_picks_and_posts() {
        let mut map = Map::default();
        let shop = map.add_object(square(ObjectKind::Shop, 0, 0, 50)).unwrap();
        assert_eq!(map.click(IVec2::new(25, 25)), Some(shop));
        assert_eq!(map.click(IVec2::new(500, 500)), None);
        assert_eq!(
            map.drain_events(),
            vec![EngineEvent::Click {
                object: shop,
                pos: IVec2::new(25, 25)
            }]
        );
    }

    #[test]
    fn test_move_between_scenes() {
        let mut map = Map::new("shops", Colour::WHITE);
        let inside = map.create_scene("insideShop1", Colour::PINK, None);
        let hero = map.add_object(player(0, 0)).unwrap();
        map.move_object_to_scene(hero, inside).unwrap();
        assert_eq!(map.object(hero).unwrap().scene(), Some(inside));
        assert!(map.objects_of_kind(ObjectKind::Player).is_empty());
        assert_eq!(map.scene(inside).objects_of_kind(ObjectKind::Player), &[hero]);
    }

    #[test]
    fn test_detached_object_is_placed_or_freed_by_caller() {
        let mut map = Map::default();
        let parent = map.add_object(square(ObjectKind::Generic, 0, 0, 10)).unwrap();
        let child = map
            .attach_new(parent, Object::builder(ObjectKind::Text, ORIGIN).build(), AttachStyle::Loose)
            .unwrap();
        assert!(map.detach_object(child).unwrap());
        assert_eq!(map.object(child).unwrap().scene(), None);
        assert!(map.objects_of_kind(ObjectKind::Text).is_empty());

        let scene = map.current_scene_id();
        map.move_object_to_scene(child, scene).unwrap();
        assert_eq!(map.object(child).unwrap().scene(), Some(scene));
        assert_eq!(map.objects_of_kind(ObjectKind::Text), &[child]);

        map.remove_object(child).unwrap();
        map.remove_object(parent).unwrap();
        assert!(map.arena().is_empty());
    }

    #[test]
    fn test_portal_carries_mover_clear_of_exit() {
        let mut map = Map::new("street", Colour::WHITE);
        let shop = map.create_scene("shop", Colour::PINK, None);
        let door = map.add_object(square(ObjectKind::Portal, 100, 0, 20)).unwrap();
        let exit = map.add_object_to(shop, square(ObjectKind::Portal, 200, 200, 20)).unwrap();
        let hero = map.add_object(player(95, 0)).unwrap();
        map.set_movement(hero, Direction::Right).unwrap();

        assert_eq!(map.move_through_portal(hero, door).unwrap(), None);
        map.link_portals(door, exit).unwrap();
        assert_eq!(map.portal_exit(exit), Some(door));

        assert_eq!(map.move_through_portal(hero, door).unwrap(), Some(shop));
        let obj = map.object(hero).unwrap();
        assert_eq!(obj.scene(), Some(shop));
        assert_eq!(obj.pos(), IVec2::new(220, 200));
        assert_eq!(map.current_scene().name(), "street");

        assert!(matches!(map.link_portals(door, hero), Err(EngineError::NotAPortal(_))));
        assert!(matches!(map.move_through_portal(door, hero), Err(EngineError::NotAPortal(_))));
        map.remove_object(exit).unwrap();
        assert_eq!(map.portal_exit(door), None);
    }

    #[test]
    fn test_drag_moves_object_with_pointer() {
        let mut map = Map::default();
        let hero = map.add_object(player(0, 0)).unwrap();
        map.update(ORIGIN).unwrap();

        assert_eq!(map.press(IVec2::new(5, 5)), Some(hero));
        assert_eq!(map.dragged_object(), None);
        map.drag_to(IVec2::new(50, 60));
        assert_eq!(map.dragged_object(), Some(hero));
        map.update(IVec2::new(10, 0)).unwrap();
        assert_eq!(map.object(hero).unwrap().pos(), IVec2::new(60, 60));

        assert_eq!(map.release(IVec2::new(50, 60)), None);
        assert_eq!(map.dragged_object(), None);
        assert!(map.drain_events().is_empty());
    }

    #[test]
    fn test_short_press_is_a_click() {
        let mut map = Map::default();
        let shop = map.add_object(square(ObjectKind::Shop, 200, 200, 50)).unwrap();
        let hero = map.add_object(player(0, 0)).unwrap();
        map.update(ORIGIN).unwrap();

        assert_eq!(map.press(IVec2::new(210, 210)), None);
        assert_eq!(map.release(IVec2::new(215, 205)), Some(shop));
        assert_eq!(
            map.drain_events(),
            vec![EngineEvent::Click {
                object: shop,
                pos: IVec2::new(210, 210)
            }]
        );

        map.set_allow_drag(false);
        assert_eq!(map.press(IVec2::new(5, 5)), None);
        map.drag_to(IVec2::new(80, 80));
        map.update(ORIGIN).unwrap();
        assert_eq!(map.object(hero).unwrap().pos(), ORIGIN);
        assert_eq!(map.release(IVec2::new(5, 5)), Some(hero));
    }

    #[test]
    fn test_stop_all_movement_and_toggle_pause() {
        let mut map = Map::default();
        let hero = map.add_object(player(0, 0)).unwrap();
        map.set_movement(hero, Direction::Down).unwrap();
        map.set_movement(hero, Direction::Left).unwrap();
        map.stop_all_movement(hero).unwrap();
        map.move_objects().unwrap();
        assert_eq!(map.object(hero).unwrap().pos(), ORIGIN);

        assert!(map.toggle_paused());
        assert!(map.is_paused());
        assert!(!map.toggle_paused());
    }

    #[test]
    fn test_draw_clears_and_draws_overlays_last() {
        let mut map = Map::new("shops", Colour::rgb(211, 211, 211));
        map.add_object(square(ObjectKind::Generic, 0, 0, 10)).unwrap();
        map.add_overlay(square(ObjectKind::Score, 0, 0, 10));
        map.update(ORIGIN).unwrap();

        let mut canvas = Surface::new(50, 50);
        let view = Viewport::new(50, 50, 90);
        let drawn = map.draw(&view, &mut canvas, &DebugDraw::default());
        assert_eq!(drawn, 2);
        assert_eq!(canvas.get(20, 20), Some(Colour::rgb(211, 211, 211)));
        assert_eq!(canvas.get(5, 5), Some(Colour::BLACK));
    }
}
