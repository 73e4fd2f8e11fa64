//! Candy Seller
//!
//! You need money to buy a car, so you run a candy shop. Walk the street,
//! pick up coins and visit the shop through its door. Customers wander the
//! pavement. A hundred coins wins the game.
//!
//! The game is a thin configuration of the engine: it builds the scenes,
//! routes input to the player's movement style and reacts to the events the
//! map posts while moving.

use std::collections::HashMap;
use std::rc::Rc;

use glam::IVec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::engine::{
    Canvas, CollisionBoundary, Colour, Direction, EngineEvent, GeneralMovement, ImageSet, Key, KeyMovement, Map,
    ORIGIN, Object, ObjectId, ObjectKind, Point, PositionStyle, RandomWalkMovement, Rect, RectangleBoundary,
    SceneId, Surface, Viewport,
};
use crate::error::{EngineError, Result};
use crate::settings::EngineSettings;

pub const STREET_SCENE: &str = "shops";
pub const SHOP_SCENE: &str = "insideShop1";

const STREET_COLOUR: Colour = Colour::rgb(211, 211, 211);
const SHOP_FLOOR_COLOUR: Colour = Colour::rgb(240, 180, 211);

const SHOP_SIZE: i32 = 280;
const MONEY_SIZE: i32 = 20;
const ARROW_SIZE: i32 = 160;
const BUSH_SIZE: i32 = 200;
const MONSTER_SIZE: i32 = 800;
const MONSTER_RATIO: f32 = 1.4;

const SHOP_COUNT: i32 = 3;
const SHOP_SPACING: i32 = 320;
const STARTING_COINS: usize = 4;
/// Steps walked per spawned coin
const STEPS_PER_COIN: u32 = 400;
const WINNING_SCORE: u32 = 100;
const SCORE_INSET: IVec2 = IVec2::new(180, 20);

/// Door in front of the middle shop, and its way back out inside
const SHOP_DOOR: &str = "shopDoor";
const STREET_DOOR: &str = "streetDoor";
const SHOP_DOOR_POS: Point = IVec2::new(460, 275);
const STREET_DOOR_POS: Point = IVec2::new(400, 560);
const DOOR_SIZE: i32 = 200;
const DOOR_RATIO: f32 = 0.15;

const CUSTOMER_COUNT: usize = 3;
const CUSTOMER_SIZE: i32 = 30;
/// Where customers wander
const PAVEMENT: Rect = Rect::new(-400, 360, 1600, 160);

/// Holding this key steers the camera instead of the player.
const CAMERA_KEY: Key = Key::Char('c');

/// Image lookup by name.
pub trait ImageProvider {
    /// Named image. `EngineError::MissingImage` when there is none.
    fn image(&self, name: &str) -> Result<Rc<Surface>>;

    /// Render a line of text.
    fn text(&self, text: &str, colour: Colour) -> Surface;
}

/// Flat-shaded stand-ins for the game's artwork.
#[derive(Debug)]
pub struct PlaceholderImages {
    images: HashMap<&'static str, Rc<Surface>>,
}

impl Default for PlaceholderImages {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaceholderImages {
    const GLYPH: IVec2 = IVec2::new(6, 10);
    const GLYPH_PITCH: i32 = 8;

    pub fn new() -> Self {
        let mut images: HashMap<&'static str, Rc<Surface>> = HashMap::new();
        images.insert("man", Rc::new(Self::person(Colour::rgb(70, 70, 200))));
        images.insert("customer", Rc::new(Self::person(Colour::rgb(200, 120, 40))));
        images.insert("door", Rc::new(Surface::filled(20, 3, Colour::rgb(90, 50, 20))));
        images.insert("bush", Rc::new(Self::disc(20, 14, Colour::rgb(34, 139, 34))));
        images.insert("money", Rc::new(Self::disc(8, 8, Colour::rgb(255, 215, 0))));
        images.insert("ingredients store", Rc::new(Self::room()));
        images.insert("jumpscare monster", Rc::new(Self::disc(20, 20, Colour::rgb(60, 160, 60))));
        let shop_colours = [
            Colour::rgb(205, 92, 92),
            Colour::rgb(100, 149, 237),
            Colour::rgb(238, 130, 238),
        ];
        for (name, colour) in ["shop1", "shop2", "shop3"].into_iter().zip(shop_colours) {
            images.insert(name, Rc::new(Self::shop(colour)));
        }
        for name in ["arrow1", "arrow2", "arrow3"] {
            images.insert(name, Rc::new(Self::arrow()));
        }
        Self { images }
    }

    fn person(shirt: Colour) -> Surface {
        let mut person = Surface::new(10, 10);
        person.fill_rect(Rect::new(3, 0, 4, 4), Colour::rgb(255, 220, 180));
        person.fill_rect(Rect::new(2, 4, 6, 6), shirt);
        // Nose, so left and right differ.
        person.set(2, 2, Colour::rgb(255, 220, 180));
        person
    }

    fn disc(width: i32, height: i32, colour: Colour) -> Surface {
        let mut disc = Surface::new(width, height);
        let (rx, ry) = (width as f32 / 2.0, height as f32 / 2.0);
        for y in 0..height {
            for x in 0..width {
                let dx = (x as f32 + 0.5 - rx) / rx;
                let dy = (y as f32 + 0.5 - ry) / ry;
                if dx * dx + dy * dy <= 1.0 {
                    disc.set(x, y, colour);
                }
            }
        }
        disc
    }

    fn shop(colour: Colour) -> Surface {
        let mut shop = Surface::filled(28, 28, colour);
        shop.fill_rect(Rect::new(0, 0, 28, 6), Colour::rgb(139, 69, 19));
        shop.fill_rect(Rect::new(11, 18, 6, 10), Colour::rgb(90, 50, 20));
        shop
    }

    fn arrow() -> Surface {
        let mut arrow = Surface::new(16, 8);
        arrow.fill_rect(Rect::new(0, 3, 10, 2), Colour::BLACK);
        for i in 0..4 {
            arrow.fill_rect(Rect::new(10 + i, i, 1, 8 - 2 * i), Colour::BLACK);
        }
        arrow
    }

    /// Shop walls around a see-through floor.
    fn room() -> Surface {
        let wall = Colour::rgb(160, 82, 45);
        let mut room = Surface::filled(80, 60, wall);
        room.fill_rect(Rect::new(4, 4, 72, 52), Colour::TRANSPARENT);
        room
    }
}

impl ImageProvider for PlaceholderImages {
    fn image(&self, name: &str) -> Result<Rc<Surface>> {
        self.images
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::MissingImage(name.to_string()))
    }

    /// One solid block per character; spaces stay clear.
    fn text(&self, text: &str, colour: Colour) -> Surface {
        let count = text.chars().count().max(1) as i32;
        let mut surface = Surface::new(count * Self::GLYPH_PITCH, Self::GLYPH.y);
        for (i, c) in text.chars().enumerate() {
            if !c.is_whitespace() {
                let at = IVec2::new(i as i32 * Self::GLYPH_PITCH, 0);
                surface.fill_rect(Rect::from_pos_size(at, Self::GLYPH), colour);
            }
        }
        surface
    }
}

/// Player input for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    KeyDown(Key),
    KeyUp(Key),
    /// Press and release at one screen position
    Click(Point),
    /// Mouse button pressed, in screen coordinates
    MouseDown(Point),
    /// Mouse moved while a button is held
    MouseMove(Point),
    MouseUp(Point),
}

pub struct CandySeller {
    settings: EngineSettings,
    images: Box<dyn ImageProvider>,
    map: Map,
    view: Viewport,
    rng: Pcg32,
    street: SceneId,
    shop: SceneId,
    player: ObjectId,
    score_label: ObjectId,
    score: u32,
    won: bool,
    finished: bool,
    /// The camera follows the held direction keys, not the player
    camera_mode: bool,
    frame: u64,
}

impl CandySeller {
    pub fn new(settings: EngineSettings, images: Box<dyn ImageProvider>) -> Result<Self> {
        settings.validate()?;
        let view = Viewport::from_settings(&settings);
        let rng = Pcg32::seed_from_u64(settings.seed);
        let mut map = Map::new(STREET_SCENE, STREET_COLOUR);
        map.set_allow_drag(settings.allow_drag);
        let street = map.current_scene_id();
        let shop = map.create_scene(SHOP_SCENE, SHOP_FLOOR_COLOUR, None);

        let player = Self::create_player(&settings, images.as_ref(), view.half_size())?;
        let player = map.add_object_to(street, player)?;
        let inset = IVec2::new(view.width() - SCORE_INSET.x, SCORE_INSET.y);
        let score_label = map.add_overlay(Object::builder(ObjectKind::Score, inset).build());

        let mut game = Self {
            settings,
            images,
            map,
            view,
            rng,
            street,
            shop,
            player,
            score_label,
            score: 0,
            won: false,
            finished: false,
            camera_mode: false,
            frame: 0,
        };
        game.refresh_score()?;

        game.create_shops()?;
        game.create_bushes()?;
        game.create_arrows()?;
        game.create_coins(street, STARTING_COINS)?;

        let room = game.images.image("ingredients store")?;
        let background = Object::builder(ObjectKind::Background, ORIGIN)
            .image(room)
            .size(game.settings.width)
            .position_style(PositionStyle::TOP_LEFT)
            .build();
        game.map.add_object_to(shop, background)?;
        game.create_coins(shop, STARTING_COINS)?;
        game.create_doors()?;
        game.create_customers(CUSTOMER_COUNT)?;

        log::info!(
            "Candy Seller ready: {} objects, player {}",
            game.map.arena().len(),
            game.player
        );
        Ok(game)
    }

    pub fn with_placeholders(settings: EngineSettings) -> Result<Self> {
        Self::new(settings, Box::new(PlaceholderImages::new()))
    }

    // === Setup ===

    fn create_shops(&mut self) -> Result<()> {
        for n in 1..=SHOP_COUNT {
            let name = format!("shop{n}");
            let shop = Object::builder(ObjectKind::Shop, IVec2::new(140 + (n - 1) * SHOP_SPACING, 140))
                .name(name.clone())
                .image(self.images.image(&name)?)
                .size(SHOP_SIZE)
                .position_style(PositionStyle::CENTRE)
                .build();
            self.map.add_object_to(self.street, shop)?;
        }
        Ok(())
    }

    fn create_bushes(&mut self) -> Result<()> {
        let bush = self.images.image("bush")?;
        for pos in [IVec2::new(-200, 400), IVec2::new(928, 400)] {
            let obj = Object::builder(ObjectKind::Bush, pos)
                .image(bush.clone())
                .size(BUSH_SIZE)
                .build();
            self.map.add_object_to(self.street, obj)?;
        }
        Ok(())
    }

    fn create_arrows(&mut self) -> Result<()> {
        for n in 1..=SHOP_COUNT {
            let obj = Object::builder(ObjectKind::Arrow, IVec2::new((n - 1) * SHOP_SPACING + 30, 640))
                .name(format!("arrow{n}"))
                .image(self.images.image(&format!("arrow{n}"))?)
                .size(ARROW_SIZE)
                .build();
            self.map.add_object_to(self.street, obj)?;
        }
        Ok(())
    }

    /// One portal on the street, one inside the shop, linked.
    fn create_doors(&mut self) -> Result<()> {
        let door = self.images.image("door")?;
        let portal = |name: &str, pos: Point| {
            Object::builder(ObjectKind::Portal, pos)
                .name(name)
                .image(door.clone())
                .size(DOOR_SIZE)
                .ratio(DOOR_RATIO)
                .position_style(PositionStyle::CENTRE)
                .collision_spec(None)
                .build()
        };
        let outside = portal(SHOP_DOOR, SHOP_DOOR_POS);
        let inside = portal(STREET_DOOR, STREET_DOOR_POS);
        let outside = self.map.add_object_to(self.street, outside)?;
        let inside = self.map.add_object_to(self.shop, inside)?;
        self.map.link_portals(outside, inside)
    }

    /// Customers wander the pavement, starting out of sight where they can.
    /// Their centres stay far enough inside that they never overhang it.
    fn create_customers(&mut self, count: usize) -> Result<()> {
        let image = self.images.image("customer")?;
        let size = IVec2::splat(CUSTOMER_SIZE);
        for _ in 0..count {
            let boundary = RectangleBoundary::grown(PAVEMENT, -CUSTOMER_SIZE);
            let pos = boundary
                .rect()
                .bound_point(self.view.random_off_camera_pos(&mut self.rng, size));
            let mut motion = GeneralMovement::new(self.settings.move_rate).with_boundary(boundary);
            motion.set_movement(Direction::ALL[self.rng.random_range(0..Direction::ALL.len())]);
            let walk = RandomWalkMovement::new(motion, self.settings.random_walk, self.rng.random());
            let customer = Object::builder(ObjectKind::Sprite, pos)
                .name("customer")
                .images(ImageSet::left_right(image.clone()))
                .size(CUSTOMER_SIZE)
                .movement(walk)
                .build();
            self.map.add_object_to(self.street, customer)?;
        }
        Ok(())
    }

    fn create_coins(&mut self, scene: SceneId, count: usize) -> Result<()> {
        let money = self.images.image("money")?;
        for _ in 0..count {
            let pos = IVec2::new(
                self.rng.random_range(0..=self.settings.width.max(0)),
                self.rng.random_range(400..=500),
            );
            let coin = Object::builder(ObjectKind::Coin, pos)
                .image(money.clone())
                .size(MONEY_SIZE)
                .build();
            self.map.add_object_to(scene, coin)?;
        }
        Ok(())
    }

    fn create_player(settings: &EngineSettings, images: &dyn ImageProvider, start: Point) -> Result<Object> {
        let tuning = settings.player;
        let motion = GeneralMovement::new(tuning.move_rate)
            .with_bounce(tuning.bounce_period, tuning.bounce_height)
            .with_boundary(CollisionBoundary::new());
        Ok(Object::builder(ObjectKind::Player, start)
            .name("player")
            .images(ImageSet::left_right(images.image("man")?))
            .size(tuning.size)
            .ratio(1.0)
            .movement(KeyMovement::new(motion))
            .build())
    }

    fn create_monster(&self) -> Result<Object> {
        Ok(Object::builder(ObjectKind::Monster, ORIGIN)
            .image(self.images.image("jumpscare monster")?)
            .size(MONSTER_SIZE)
            .ratio(MONSTER_RATIO)
            .position_style(PositionStyle::VIEWPORT_TOP_LEFT)
            .build())
    }

    // === Accessors ===

    pub fn map(&self) -> &Map {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut Map {
        &mut self.map
    }

    pub fn viewport(&self) -> &Viewport {
        &self.view
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn player(&self) -> ObjectId {
        self.player
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn has_won(&self) -> bool {
        self.won
    }

    /// The player asked to stop after winning.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    pub fn in_shop(&self) -> bool {
        self.map.current_scene_id() == self.shop
    }

    pub fn camera_mode(&self) -> bool {
        self.camera_mode
    }

    // === Input ===

    pub fn handle_input(&mut self, input: InputEvent) -> Result<()> {
        match input {
            InputEvent::KeyDown(key) => self.key_down(key)?,
            InputEvent::KeyUp(key) => self.key_up(key)?,
            InputEvent::Click(screen) => {
                self.map.press(screen);
                self.map.release(screen);
            }
            InputEvent::MouseDown(screen) => {
                self.map.press(screen);
            }
            InputEvent::MouseMove(screen) => self.map.drag_to(screen),
            InputEvent::MouseUp(screen) => {
                self.map.release(screen);
            }
        }
        Ok(())
    }

    fn key_down(&mut self, key: Key) -> Result<()> {
        if key == CAMERA_KEY && !self.camera_mode {
            self.camera_mode = true;
            self.map.stop_all_movement(self.player)?;
            log::debug!("Camera mode on");
        }
        if self.camera_mode {
            if let Some(direction) = key.direction() {
                self.view.set_camera_movement(direction);
            }
        } else {
            self.map.key_down(self.player, key)?;
        }
        match key {
            Key::Char('r') if self.won => self.finished = true,
            Key::Char('q') => {
                let monster = self.create_monster()?;
                self.map.add_overlay(monster);
                log::info!("Boo!");
            }
            _ => {}
        }
        Ok(())
    }

    fn key_up(&mut self, key: Key) -> Result<()> {
        match key {
            Key::Char('q') => {
                self.map.remove_all_of_kind(ObjectKind::Monster);
            }
            Key::F12 => {
                self.settings.debug_draw.toggle();
                log::info!("Debug drawing {}", if self.settings.debug_draw.enabled() { "on" } else { "off" });
            }
            Key::Pause => {
                self.map.toggle_paused();
            }
            k if k == CAMERA_KEY => {
                self.camera_mode = false;
                self.view.stop_camera();
                log::debug!("Camera mode off");
            }
            _ => {}
        }
        if self.camera_mode {
            if let Some(direction) = key.direction() {
                self.view.stop_camera_movement(direction);
            }
        } else {
            self.map.key_up(self.player, key)?;
        }
        Ok(())
    }

    /// Carry the player through a door and show the scene on the other side.
    fn go_through(&mut self, portal: ObjectId) -> Result<()> {
        let Some(scene) = self.map.move_through_portal(self.player, portal)? else {
            return Ok(());
        };
        let name = self.map.scene(scene).name().to_string();
        self.map.change_scene(&name)?;
        self.view.reset_camera();
        self.follow_player()?;
        Ok(())
    }

    fn follow_player(&mut self) -> Result<()> {
        let focus = self.map.object(self.player)?.offset_rect(ORIGIN).center();
        self.view.adjust_camera(focus);
        Ok(())
    }

    // === Frame ===

    /// Run one frame: move, apply the game rules, steer the camera, refresh
    /// the map and draw it. Returns how many objects were
    /// drawn.
    pub fn frame(&mut self, canvas: &mut dyn Canvas) -> Result<usize> {
        self.frame += 1;
        self.update_state()?;
        self.map.update(self.view.camera())?;
        Ok(self.map.draw(&self.view, canvas, &self.settings.debug_draw))
    }

    fn update_state(&mut self) -> Result<()> {
        if self.score >= WINNING_SCORE && !self.won {
            self.won = true;
            log::info!("Won with {} coins after {} frames", self.score, self.frame);
        }

        self.map.move_objects()?;

        let player = self.map.object_mut(self.player)?;
        if player.steps >= STEPS_PER_COIN {
            player.steps = 0;
            let scene = self.map.current_scene_id();
            self.create_coins(scene, 1)?;
        }

        for event in self.map.drain_events() {
            self.apply_event(event)?;
        }

        // The camera holds still under a dragged object.
        if self.camera_mode {
            self.view.move_camera();
        } else if self.map.dragged_object().is_none() {
            self.follow_player()?;
        }
        Ok(())
    }

    fn apply_event(&mut self, event: EngineEvent) -> Result<()> {
        match event {
            EngineEvent::Interaction { subject, other, .. } if subject == self.player => {
                if self.map.object(other).is_ok_and(|obj| obj.kind() == ObjectKind::Coin) {
                    self.map.remove_object(other)?;
                    self.score += 1;
                    self.refresh_score()?;
                    log::debug!("Picked up coin {other}, score {}", self.score);
                }
            }
            EngineEvent::Collision { subject, other, .. } if subject == self.player => {
                if self.map.object(other).is_ok_and(|obj| obj.kind() == ObjectKind::Portal) {
                    self.go_through(other)?;
                }
            }
            EngineEvent::Click { object, .. } => {
                if self.map.object(object).is_ok_and(|obj| obj.kind() == ObjectKind::Arrow) {
                    log::info!("Ping! Arrow {object} clicked");
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn refresh_score(&mut self) -> Result<()> {
        let text = self.images.text(&format!("Money: {}", self.score), Colour::WHITE);
        self.map
            .object_mut(self.score_label)?
            .set_natural_image(Rc::new(text));
        Ok(())
    }
}

impl std::fmt::Debug for CandySeller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CandySeller")
            .field("scene", &self.map.current_scene().name())
            .field("score", &self.score)
            .field("won", &self.won)
            .field("frame", &self.frame)
            .finish()
    }
}
