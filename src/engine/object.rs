//! Game objects
//!
//! An object is a sprite-backed entity with a world position, a draw order and
//! two masks derived from its surface: the interaction mask (all opaque pixels)
//! and the collision mask (opaque pixels inside the collision area only).
//! Masks are rebuilt every time the surface changes.

use std::fmt;
use std::rc::Rc;

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::arena::ObjectId;
use super::geometry::{ORIGIN, Point, Rect, Vector};
use super::kind::{InteractionTypes, KindMatch, Materials, ObjectKind};
use super::mask::Mask;
use super::movement::{Direction, MovementStyle};
use super::store::SceneId;
use super::surface::{Colour, Surface};
use crate::consts::DEFAULT_OBJECT_SIZE;

/// Which point of the object its position names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Anchor {
    TopLeft,
    #[default]
    Centre,
}

/// Coordinate frame the position is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Frame {
    /// World coordinates, shifted by the camera when drawn.
    #[default]
    World,
    /// Offset from the parent object's position.
    Relative,
    /// Fixed on screen, ignores the camera.
    Viewport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PositionStyle {
    pub frame: Frame,
    pub anchor: Anchor,
}

impl PositionStyle {
    pub const fn new(frame: Frame, anchor: Anchor) -> Self {
        Self { frame, anchor }
    }

    pub const TOP_LEFT: PositionStyle = PositionStyle::new(Frame::World, Anchor::TopLeft);
    pub const CENTRE: PositionStyle = PositionStyle::new(Frame::World, Anchor::Centre);
    pub const RELATIVE_CENTRE: PositionStyle = PositionStyle::new(Frame::Relative, Anchor::Centre);
    pub const VIEWPORT_TOP_LEFT: PositionStyle = PositionStyle::new(Frame::Viewport, Anchor::TopLeft);
}

/// Collision area as fractions of the object's rectangle.
///
/// The default describes a character's feet: half the width, centred, and
/// the bottom quarter of the height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionSpec {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Default for CollisionSpec {
    fn default() -> Self {
        Self::new(Some(0.5), Some(0.25), None, None, Some(0.25), None)
    }
}

impl CollisionSpec {
    /// Normalise a partial description.
    ///
    /// Width and height are capped at 1. A missing or overflowing `top` is
    /// derived from `bottom` (0 when missing); a missing or overflowing `left`
    /// is derived from `right`, which defaults to centring the area.
    pub fn new(
        width: Option<f32>,
        height: Option<f32>,
        top: Option<f32>,
        bottom: Option<f32>,
        left: Option<f32>,
        right: Option<f32>,
    ) -> Self {
        let width = width.filter(|w| *w <= 1.0).unwrap_or(1.0);
        let height = height.filter(|h| *h <= 1.0).unwrap_or(1.0);
        let bottom = bottom.unwrap_or(0.0);
        let top = top
            .filter(|t| t + height <= 1.0)
            .unwrap_or(1.0 - height - bottom);
        let right = right
            .filter(|r| r + width <= 1.0)
            .unwrap_or((1.0 - width) / 2.0);
        let left = left
            .filter(|l| l + width <= 1.0)
            .unwrap_or(1.0 - width - right);
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// The whole rectangle.
    pub fn full() -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            width: 1.0,
            height: 1.0,
        }
    }

    /// Collision rectangle inside `rect`.
    pub fn apply(&self, rect: Rect) -> Rect {
        let w = rect.width as f32;
        let h = rect.height as f32;
        Rect::new(
            (rect.x as f32 + w * self.left) as i32,
            (rect.y as f32 + h * self.top) as i32,
            (w * self.width) as i32,
            (h * self.height) as i32,
        )
    }
}

/// Result of a mask collision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionData {
    /// First overlapping pixel, in the tested object's local frame.
    pub offset: Point,
    /// Bounds of the overlap, in the same frame.
    pub rect: Rect,
}

/// How an attached object follows its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AttachStyle {
    /// Shares the parent's draw order and travels with it.
    #[default]
    Tight,
    /// Sorted on its own.
    Loose,
}

/// Direction-specific images of a moving object.
#[derive(Debug, Clone)]
pub struct ImageSet {
    default: Rc<Surface>,
    left: Option<Rc<Surface>>,
    right: Option<Rc<Surface>>,
    up: Option<Rc<Surface>>,
    down: Option<Rc<Surface>>,
}

impl ImageSet {
    pub fn new(default: Rc<Surface>) -> Self {
        Self {
            default,
            left: None,
            right: None,
            up: None,
            down: None,
        }
    }

    /// Left-facing image plus its mirror for the right.
    pub fn left_right(left: Rc<Surface>) -> Self {
        let right = Rc::new(left.flipped_horizontally());
        Self::new(left.clone()).with(Direction::Left, left).with(Direction::Right, right)
    }

    pub fn with(mut self, direction: Direction, image: Rc<Surface>) -> Self {
        *self.slot(direction) = Some(image);
        self
    }

    fn slot(&mut self, direction: Direction) -> &mut Option<Rc<Surface>> {
        match direction {
            Direction::Left => &mut self.left,
            Direction::Right => &mut self.right,
            Direction::Up => &mut self.up,
            Direction::Down => &mut self.down,
        }
    }

    pub fn default_image(&self) -> &Rc<Surface> {
        &self.default
    }

    pub fn get(&self, direction: Direction) -> Option<&Rc<Surface>> {
        match direction {
            Direction::Left => self.left.as_ref(),
            Direction::Right => self.right.as_ref(),
            Direction::Up => self.up.as_ref(),
            Direction::Down => self.down.as_ref(),
        }
    }

    /// Every distinct image in the set.
    pub fn all(&self) -> Vec<&Rc<Surface>> {
        let mut images: Vec<&Rc<Surface>> = vec![&self.default];
        for image in [&self.left, &self.right, &self.up, &self.down].into_iter().flatten() {
            if !images.iter().any(|known| Rc::ptr_eq(known, image)) {
                images.push(image);
            }
        }
        images
    }
}

/// A game object.
pub struct Object {
    name: Option<String>,
    kind: ObjectKind,
    pub visible: bool,
    pub enabled: bool,
    pub draw_order: i32,
    pos: Point,
    pos_stack: Vec<Point>,
    size: i32,
    ratio: f32,
    position_style: Option<PositionStyle>,
    colour: Colour,
    lifetime: Option<u32>,
    rect: Rect,
    col_rect: Rect,
    vp_rect: Rect,
    collision_spec: Option<CollisionSpec>,
    pub(crate) parent: Option<ObjectId>,
    pub(crate) attached: Vec<ObjectId>,
    pub(crate) associated: Vec<ObjectId>,
    pub(crate) scene: Option<SceneId>,
    image: Option<Rc<Surface>>,
    images: Option<ImageSet>,
    surface: Surface,
    interaction_mask: Mask,
    collision_mask: Mask,
    static_collision_mask: bool,
    materials: Materials,
    movement: Option<Box<dyn MovementStyle>>,
    can_move: bool,
    pub steps: u32,
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("pos", &self.pos)
            .field("size", &self.surface.size())
            .field("draw_order", &self.draw_order)
            .field("materials", &self.materials)
            .finish_non_exhaustive()
    }
}

impl Object {
    pub fn builder(kind: ObjectKind, pos: Point) -> ObjectBuilder {
        ObjectBuilder::new(kind, pos)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn scene(&self) -> Option<SceneId> {
        self.scene
    }

    pub fn parent(&self) -> Option<ObjectId> {
        self.parent
    }

    pub fn attached_objects(&self) -> &[ObjectId] {
        &self.attached
    }

    pub fn associated_objects(&self) -> &[ObjectId] {
        &self.associated
    }

    /// Attached and associated objects together.
    pub fn children(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.attached.iter().chain(self.associated.iter()).copied()
    }

    // === Position ===

    pub fn pos(&self) -> Point {
        self.pos
    }

    pub fn x(&self) -> i32 {
        self.pos.x
    }

    pub fn y(&self) -> i32 {
        self.pos.y
    }

    /// Move without touching the cached rectangles; `update` refreshes them.
    pub fn set_pos(&mut self, pos: Point) {
        self.pos = pos;
    }

    /// Save the current position and move to `new_pos`.
    pub fn push_pos(&mut self, new_pos: Point) {
        self.pos_stack.push(self.pos);
        self.pos = new_pos;
    }

    /// Restore the last pushed position.
    pub fn pop_pos(&mut self) -> Option<Point> {
        let pos = self.pos_stack.pop()?;
        self.pos = pos;
        Some(pos)
    }

    pub fn pos_stack_depth(&self) -> usize {
        self.pos_stack.len()
    }

    pub fn position_style(&self) -> PositionStyle {
        self.position_style.unwrap_or_default()
    }

    pub fn has_position_style(&self) -> bool {
        self.position_style.is_some()
    }

    pub fn set_position_style(&mut self, style: PositionStyle) {
        self.position_style = Some(style);
    }

    // === Size and shape ===

    pub fn size(&self) -> i32 {
        self.size
    }

    pub fn ratio(&self) -> f32 {
        self.ratio
    }

    pub fn width(&self) -> i32 {
        self.surface.width()
    }

    pub fn height(&self) -> i32 {
        self.surface.height()
    }

    fn nominal_height(&self) -> i32 {
        (self.size as f32 * self.ratio).round() as i32
    }

    /// Resize and rebuild the surface and masks.
    pub fn set_size(&mut self, size: i32) {
        self.size = size.max(0);
        self.update_surface(true);
        self.update_rect(ORIGIN, ORIGIN);
    }

    pub fn colour(&self) -> Colour {
        self.colour
    }

    pub fn set_colour(&mut self, colour: Colour) {
        self.colour = colour;
        self.update_surface(false);
    }

    pub fn centre(&self) -> Point {
        let half = ((self.size as f32 + 0.5) / 2.0) as i32;
        self.pos + IVec2::splat(half)
    }

    pub fn collision_rect_centre(&self) -> Point {
        self.col_rect.center()
    }

    /// World rectangle as of the last `update`.
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Collision rectangle as of the last `update`.
    pub fn collision_rect(&self) -> Rect {
        self.col_rect
    }

    /// Screen rectangle as of the last `update`.
    pub fn viewport_rect(&self) -> Rect {
        self.vp_rect
    }

    pub fn collision_spec(&self) -> Option<CollisionSpec> {
        self.collision_spec
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn interaction_mask(&self) -> &Mask {
        &self.interaction_mask
    }

    pub fn collision_mask(&self) -> &Mask {
        &self.collision_mask
    }

    /// Top-left of the surface for the current position plus `offset`.
    pub fn offset_pos(&self, offset: Vector) -> Point {
        let pos = self.pos + offset;
        match self.position_style().anchor {
            Anchor::TopLeft => pos,
            Anchor::Centre => pos - IVec2::new(self.width() / 2, self.height() / 2),
        }
    }

    pub fn offset_rect(&self, offset: Vector) -> Rect {
        Rect::from_pos_size(self.offset_pos(offset), self.surface.size())
    }

    /// Position of `other`'s surface relative to this one.
    pub fn relative_offset(&self, other: &Object) -> Vector {
        other.offset_pos(ORIGIN) - self.offset_pos(ORIGIN)
    }

    fn world_offset(&self, camera: Point, offset: Vector) -> Vector {
        match self.position_style().frame {
            Frame::Viewport => camera + offset,
            _ => offset,
        }
    }

    fn screen_offset(&self, camera: Point, offset: Vector) -> Vector {
        match self.position_style().frame {
            Frame::Viewport => offset,
            _ => offset - camera,
        }
    }

    /// Collision rectangle for a given object rectangle.
    pub fn collision_rect_for(&self, rect: Rect) -> Rect {
        match self.collision_spec {
            Some(spec) => spec.apply(rect),
            None => rect,
        }
    }

    /// Collision rectangle at the current position, ignoring the cache.
    pub fn live_collision_rect(&self) -> Rect {
        self.collision_rect_for(self.offset_rect(ORIGIN))
    }

    /// Collision area relative to the surface's top-left.
    pub fn collision_area(&self) -> Rect {
        self.collision_rect_for(self.surface.rect())
    }

    /// Recompute world, screen and collision rectangles.
    pub fn update_rect(&mut self, camera: Point, offset: Vector) {
        self.rect = self.offset_rect(self.world_offset(camera, offset));
        self.vp_rect = self.offset_rect(self.screen_offset(camera, offset));
        self.col_rect = self.collision_rect_for(self.rect);
    }

    // === Surface ===

    pub fn image(&self) -> Option<&Rc<Surface>> {
        self.image.as_ref()
    }

    pub fn images(&self) -> Option<&ImageSet> {
        self.images.as_ref()
    }

    fn render_surface(&self, image: Option<&Surface>) -> Surface {
        let (width, height) = (self.size, self.nominal_height());
        match image {
            Some(image) => image.scaled(width, height),
            None if self.kind == ObjectKind::Box => {
                let mut surface = Surface::filled(width, height, self.colour);
                surface.fill_rect(Rect::new(1, 1, width - 2, height - 2), Colour::TRANSPARENT);
                surface
            }
            None => Surface::filled(width, height, self.colour),
        }
    }

    /// Rebuild the surface and interaction mask, and the collision mask unless
    /// it is static.
    pub fn update_surface(&mut self, force_collision_mask: bool) {
        self.surface = self.render_surface(self.image.as_deref());
        self.interaction_mask = Mask::from_surface(&self.surface);
        if force_collision_mask || !self.static_collision_mask {
            self.update_collision_mask();
        }
    }

    /// A static collision mask covers every image the object can show, so
    /// swapping images never changes what it bumps into.
    pub fn update_collision_mask(&mut self) {
        let area = self.collision_area();
        self.collision_mask = match (&self.images, self.static_collision_mask) {
            (Some(images), true) => {
                let mut mask = Mask::new(self.surface.width(), self.surface.height());
                for image in images.all() {
                    let surface = self.render_surface(Some(image));
                    mask.draw(&Mask::from_surface_area(&surface, area), ORIGIN);
                }
                mask
            }
            _ => Mask::from_surface_area(&self.surface, area),
        };
    }

    pub fn swap_image(&mut self, image: Rc<Surface>) {
        self.image = Some(image);
        self.update_surface(false);
    }

    /// Show `image` unscaled, taking its size and shape. Used for text.
    pub fn set_natural_image(&mut self, image: Rc<Surface>) {
        self.size = image.width();
        self.ratio = match image.width() {
            0 => 1.0,
            w => image.height() as f32 / w as f32,
        };
        self.image = Some(image);
        self.update_surface(true);
    }

    // === Materials ===

    pub fn materials(&self) -> Materials {
        self.materials
    }

    pub fn object_properties(&self) -> InteractionTypes {
        self.materials.object_properties
    }

    pub fn interaction_types(&self) -> InteractionTypes {
        self.materials.interaction_types
    }

    pub fn collision_types(&self) -> InteractionTypes {
        self.materials.collision_types
    }

    pub fn set_object_properties(&mut self, value: InteractionTypes) {
        self.materials.object_properties = value;
    }

    pub fn set_interaction_types(&mut self, value: InteractionTypes) {
        self.materials.interaction_types = value;
    }

    pub fn set_collision_types(&mut self, value: InteractionTypes) {
        self.materials.collision_types = value;
    }

    // === Flags ===

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn toggle_visibility(&mut self) {
        self.visible = !self.visible;
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn toggle_enabled(&mut self) {
        self.enabled = !self.enabled;
    }

    pub fn lifetime(&self) -> Option<u32> {
        self.lifetime
    }

    pub fn set_lifetime(&mut self, lifetime: Option<u32>) {
        self.lifetime = lifetime.filter(|n| *n > 0);
    }

    /// Count down one update; true when the lifetime just ran out.
    pub(crate) fn tick_lifetime(&mut self) -> bool {
        match self.lifetime {
            Some(n) if n > 1 => {
                self.lifetime = Some(n - 1);
                false
            }
            Some(_) => {
                self.lifetime = None;
                true
            }
            None => false,
        }
    }

    // === Movement ===

    pub fn movement(&self) -> Option<&dyn MovementStyle> {
        self.movement.as_deref()
    }

    pub fn movement_mut(&mut self) -> Option<&mut (dyn MovementStyle + 'static)> {
        self.movement.as_deref_mut()
    }

    pub(crate) fn take_movement(&mut self) -> Option<Box<dyn MovementStyle>> {
        self.movement.take()
    }

    pub(crate) fn restore_movement(&mut self, movement: Box<dyn MovementStyle>) {
        self.movement = Some(movement);
    }

    pub fn can_move(&self) -> bool {
        self.can_move
    }

    pub fn toggle_movement(&mut self) {
        self.can_move = !self.can_move;
    }

    /// Vertical bob applied when drawing a mover.
    pub fn bounce_offset(&self) -> i32 {
        self.movement.as_ref().map_or(0, |m| m.motion().bounce_offset())
    }

    // === Collision ===

    pub fn can_interact(&self, other: &Object) -> bool {
        !std::ptr::eq(self, other)
            && self.enabled
            && other.enabled
            && self.interaction_types().intersects(other.object_properties())
    }

    pub fn can_collide(&self, other: &Object) -> bool {
        !std::ptr::eq(self, other)
            && self.enabled
            && other.enabled
            && self.collision_types().intersects(other.object_properties())
    }

    /// Blocking collision, tested from this object's side.
    pub fn collides_with(&self, other: &Object) -> Option<CollisionData> {
        if !self.can_collide(other) {
            return None;
        }
        self.collision_mask_overlap(other)
    }

    /// Collision-mask overlap without the material test.
    pub fn collision_mask_overlap(&self, other: &Object) -> Option<CollisionData> {
        let offset = self.relative_offset(other);
        let first = self.collision_mask.overlap(&other.collision_mask, offset)?;
        let overlap = self.collision_mask.overlap_mask(&other.collision_mask, offset);
        Some(CollisionData {
            offset: first,
            rect: overlap.bounding_rect(),
        })
    }

    /// Non-blocking interaction using the whole-sprite masks.
    pub fn interacts_with(&self, other: &Object) -> Option<Point> {
        if !self.can_interact(other) {
            return None;
        }
        let offset = self.relative_offset(other);
        self.interaction_mask.overlap(&other.interaction_mask, offset)
    }

    /// Point test against the full or the collision rectangle, edges included.
    pub fn collides_with_point(&self, pos: Point, use_full_rect: bool) -> bool {
        let rect = if use_full_rect { self.rect } else { self.col_rect };
        rect.contains_point(pos)
    }

    /// True when `self` and `other` form the pair `(a, b)` in either order.
    pub fn is_kind_pair(&self, other: &Object, a: &KindMatch, b: &KindMatch) -> bool {
        (a.matches(self.kind, self.name()) && b.matches(other.kind, other.name()))
            || (a.matches(other.kind, other.name()) && b.matches(self.kind, self.name()))
    }
}

/// Builder for [`Object`]; unset fields fall back to the kind's defaults.
pub struct ObjectBuilder {
    kind: ObjectKind,
    pos: Point,
    name: Option<String>,
    size: i32,
    ratio: f32,
    colour: Colour,
    image: Option<Rc<Surface>>,
    images: Option<ImageSet>,
    draw_order: Option<i32>,
    position_style: Option<PositionStyle>,
    lifetime: Option<u32>,
    collision_spec: Option<Option<CollisionSpec>>,
    materials: Materials,
    visible: bool,
    enabled: bool,
    static_collision_mask: Option<bool>,
    movement: Option<Box<dyn MovementStyle>>,
}

impl ObjectBuilder {
    pub fn new(kind: ObjectKind, pos: Point) -> Self {
        Self {
            kind,
            pos,
            name: None,
            size: DEFAULT_OBJECT_SIZE,
            ratio: 1.0,
            colour: Colour::BLACK,
            image: None,
            images: None,
            draw_order: None,
            position_style: None,
            lifetime: None,
            collision_spec: None,
            materials: kind.default_materials(),
            visible: true,
            enabled: true,
            static_collision_mask: None,
            movement: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn size(mut self, size: i32) -> Self {
        self.size = size.max(0);
        self
    }

    /// Height to width ratio; for image objects it scales the image's own ratio.
    pub fn ratio(mut self, ratio: f32) -> Self {
        self.ratio = ratio;
        self
    }

    pub fn colour(mut self, colour: Colour) -> Self {
        self.colour = colour;
        self
    }

    pub fn image(mut self, image: Rc<Surface>) -> Self {
        self.image = Some(image);
        self
    }

    pub fn images(mut self, images: ImageSet) -> Self {
        self.image = Some(images.default_image().clone());
        self.images = Some(images);
        self
    }

    pub fn draw_order(mut self, draw_order: i32) -> Self {
        self.draw_order = Some(draw_order);
        self
    }

    pub fn position_style(mut self, style: PositionStyle) -> Self {
        self.position_style = Some(style);
        self
    }

    pub fn lifetime(mut self, updates: u32) -> Self {
        self.lifetime = Some(updates).filter(|n| *n > 0);
        self
    }

    pub fn collision_spec(mut self, spec: Option<CollisionSpec>) -> Self {
        self.collision_spec = Some(spec);
        self
    }

    pub fn materials(mut self, materials: Materials) -> Self {
        self.materials = materials;
        self
    }

    pub fn object_properties(mut self, value: InteractionTypes) -> Self {
        self.materials.object_properties = value;
        self
    }

    pub fn interaction_types(mut self, value: InteractionTypes) -> Self {
        self.materials.interaction_types = value;
        self
    }

    pub fn collision_types(mut self, value: InteractionTypes) -> Self {
        self.materials.collision_types = value;
        self
    }

    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn static_collision_mask(mut self, value: bool) -> Self {
        self.static_collision_mask = Some(value);
        self
    }

    pub fn movement(mut self, movement: impl MovementStyle + 'static) -> Self {
        self.movement = Some(Box::new(movement));
        self
    }

    pub fn boxed_movement(mut self, movement: Box<dyn MovementStyle>) -> Self {
        self.movement = Some(movement);
        self
    }

    pub fn build(self) -> Object {
        let kind = self.kind;
        let ratio = match &self.image {
            Some(image) if image.width() > 0 => {
                image.height() as f32 / image.width() as f32 * self.ratio
            }
            _ => self.ratio,
        };
        let position_style = self.position_style.or_else(|| {
            let style = kind.default_position_style();
            (style != PositionStyle::default()).then_some(style)
        });
        let mut object = Object {
            name: self.name,
            kind,
            visible: self.visible,
            enabled: self.enabled,
            draw_order: self.draw_order.unwrap_or_else(|| kind.default_draw_order()),
            pos: self.pos,
            pos_stack: Vec::new(),
            size: self.size,
            ratio,
            position_style,
            colour: self.colour,
            lifetime: self.lifetime,
            rect: Rect::default(),
            col_rect: Rect::default(),
            vp_rect: Rect::default(),
            collision_spec: self
                .collision_spec
                .unwrap_or_else(|| kind.default_collision_spec()),
            parent: None,
            attached: Vec::new(),
            associated: Vec::new(),
            scene: None,
            image: self.image,
            images: self.images,
            surface: Surface::new(0, 0),
            interaction_mask: Mask::new(0, 0),
            collision_mask: Mask::new(0, 0),
            static_collision_mask: self
                .static_collision_mask
                .unwrap_or_else(|| kind.is_dynamic()),
            materials: self.materials,
            movement: self.movement,
            can_move: true,
            steps: 0,
        };
        object.update_surface(true);
        object.update_rect(ORIGIN, ORIGIN);
        object
    }
}
