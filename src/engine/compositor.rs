//! Draw compositor
//!
//! Builds the frame's draw list, orders it by draw order then by the bottom
//! edge of each collision rectangle (lower on screen is nearer), culls what
//! the camera cannot see and blits the rest.

use super::arena::{ObjectArena, ObjectId};
use super::geometry::Rect;
use super::store::ObjectStore;
use super::surface::{Canvas, Colour};
use crate::settings::DebugDraw;

const DEBUG_RECT_COLOUR: Colour = Colour::BLUE;
const DEBUG_COLLISION_COLOUR: Colour = Colour::RED;
const DEBUG_MASK_COLOUR: Colour = Colour::rgba(255, 0, 0, 96);

/// Store's draw list followed by every attached and associated descendant.
pub fn draw_list(arena: &ObjectArena, store: &ObjectStore) -> Vec<ObjectId> {
    let mut ids = Vec::with_capacity(store.len());
    let mut stack: Vec<ObjectId> = Vec::new();
    for &root in store.draw_list() {
        stack.push(root);
        while let Some(id) = stack.pop() {
            let Some(obj) = arena.get(id) else {
                continue;
            };
            ids.push(id);
            let children: Vec<ObjectId> = obj.children().collect();
            stack.extend(children.into_iter().rev());
        }
    }
    ids
}

/// Stable sort by `(draw_order, collision_rect.bottom)`.
pub fn sort_for_drawing(arena: &ObjectArena, ids: &mut [ObjectId]) {
    ids.sort_by_key(|id| {
        arena
            .get(*id)
            .map_or((i32::MAX, i32::MAX), |obj| (obj.draw_order, obj.collision_rect().bottom()))
    });
}

/// Blit the visible objects intersecting `view`, in order. Returns how many
/// were drawn.
pub fn render(
    canvas: &mut dyn Canvas,
    arena: &ObjectArena,
    ids: &[ObjectId],
    view: Rect,
    debug: &DebugDraw,
) -> usize {
    let mut drawn = 0;
    for &id in ids {
        let Some(obj) = arena.get(id) else {
            continue;
        };
        if !obj.visible || !view.intersects(&obj.rect()) {
            continue;
        }
        let screen = obj.viewport_rect();
        canvas.blit(obj.surface(), screen.top_left());
        drawn += 1;

        if !debug.enabled() {
            continue;
        }
        let to_screen = screen.top_left() - obj.rect().top_left();
        if debug.rects {
            canvas.outline(screen, DEBUG_RECT_COLOUR);
        }
        if debug.collision_rects {
            canvas.outline(obj.collision_rect().translate(to_screen), DEBUG_COLLISION_COLOUR);
        }
        if debug.masks {
            canvas.blit(&obj.collision_mask().to_surface(DEBUG_MASK_COLOUR), screen.top_left());
        }
    }
    drawn
}
