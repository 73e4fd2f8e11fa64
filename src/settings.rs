//! Engine settings and debug drawing flags
//!
//! Loaded from a JSON file; any field left out takes its default.

use std::fs;
use std::path::Path;

use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::consts;
use crate::error::{EngineError, Result};

/// Debug overlays drawn by the compositor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugDraw {
    /// Outline each drawn object's screen rectangle
    pub rects: bool,
    /// Outline each drawn object's collision rectangle
    pub collision_rects: bool,
    /// Paint collision masks over the sprites
    pub masks: bool,
}

impl DebugDraw {
    pub fn all() -> Self {
        Self {
            rects: true,
            collision_rects: true,
            masks: true,
        }
    }

    pub fn enabled(&self) -> bool {
        self.rects || self.collision_rects || self.masks
    }

    pub fn toggle(&mut self) {
        *self = if self.enabled() { Self::default() } else { Self::all() };
    }
}

/// Random walk tuning: chances are per tick, in 0..1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomWalkSettings {
    /// Chance of changing what the walker is doing this tick
    pub change_chance: f64,
    /// Part of `change_chance` spent turning to a random direction; the rest stops
    pub turn_chance: f64,
    /// After a block, chance of reversing on that axis
    pub reverse_chance: f64,
    /// After a block, chance of turning onto the other axis
    pub perpendicular_chance: f64,
}

impl Default for RandomWalkSettings {
    fn default() -> Self {
        Self {
            change_chance: 0.05,
            turn_chance: 0.04,
            reverse_chance: 0.2,
            perpendicular_chance: 0.2,
        }
    }
}

/// Player tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSettings {
    pub size: i32,
    /// Pixels per tick on each axis
    pub move_rate: IVec2,
    /// Ticks per bounce
    pub bounce_period: u32,
    /// Bounce height in pixels
    pub bounce_height: i32,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            size: 30,
            move_rate: IVec2::new(17, 10),
            bounce_period: 10,
            bounce_height: 6,
        }
    }
}

/// Engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    // === Viewport ===
    pub width: i32,
    pub height: i32,
    /// How far the focus may drift from the view centre before the camera follows
    pub camera_slack: i32,

    // === Movement ===
    /// Pixels per tick for the free camera and wandering customers
    pub move_rate: IVec2,
    pub player: PlayerSettings,
    pub random_walk: RandomWalkSettings,
    /// Moving objects can be picked up and carried with the mouse
    pub allow_drag: bool,

    // === Loop ===
    pub fps: u32,
    /// Seed for every random choice the game makes
    pub seed: u64,

    pub debug_draw: DebugDraw,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            camera_slack: consts::CAMERA_SLACK,

            move_rate: consts::DEFAULT_MOVE_RATE,
            player: PlayerSettings::default(),
            random_walk: RandomWalkSettings::default(),
            allow_drag: true,

            fps: consts::FPS,
            seed: 0x5eed,

            debug_draw: DebugDraw::default(),
        }
    }
}

impl EngineSettings {
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the game cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.width <= 0 || self.height <= 0 {
            return Err(EngineError::InvalidSettings(format!(
                "view size {}x{} must be positive",
                self.width, self.height
            )));
        }
        if self.fps == 0 {
            return Err(EngineError::InvalidSettings("fps must be at least 1".to_string()));
        }
        if self.camera_slack < 0 {
            return Err(EngineError::InvalidSettings(format!(
                "camera slack {} is negative",
                self.camera_slack
            )));
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let settings = Self::from_json(&fs::read_to_string(path)?)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Load settings, falling back to defaults when the file is missing or bad
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Using default settings ({}: {e})", path.display());
                Self::default()
            }
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Milliseconds per frame at the configured rate
    pub fn frame_millis(&self) -> u64 {
        1000 / u64::from(self.fps.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings = EngineSettings::from_json(r#"{ "width": 640, "player": { "size": 40 } }"#).unwrap();
        assert_eq!(settings.width, 640);
        assert_eq!(settings.height, 600);
        assert_eq!(settings.player.size, 40);
        assert_eq!(settings.player.move_rate, IVec2::new(17, 10));
        assert_eq!(settings.random_walk, RandomWalkSettings::default());
        assert!(settings.allow_drag);
    }

    #[test]
    fn test_bad_json_is_an_error() {
        assert!(EngineSettings::from_json("{ width: }").is_err());
    }

    #[test]
    fn test_negative_size_is_rejected() {
        let err = EngineSettings::from_json(r#"{ "width": -5 }"#).unwrap_err();
        assert!(matches!(err, EngineError::InvalidSettings(_)));
        assert!(EngineSettings::from_json(r#"{ "fps": 0 }"#).is_err());
        assert!(EngineSettings::default().validate().is_ok());
    }

    #[test]
    fn test_frame_millis() {
        let mut settings = EngineSettings::default();
        assert_eq!(settings.frame_millis(), 33);
        settings.fps = 0;
        assert_eq!(settings.frame_millis(), 1000);
    }

    #[test]
    fn test_missing_file_falls_back() {
        let settings = EngineSettings::load_or_default("/nonexistent/candy/settings.json");
        assert_eq!(settings.fps, consts::FPS);
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("candy-settings-{}.json", std::process::id()));
        let mut settings = EngineSettings::default();
        settings.seed = 99;
        settings.debug_draw.rects = true;
        settings.save(&path).unwrap();

        let loaded = EngineSettings::load(&path).unwrap();
        assert_eq!(loaded.seed, 99);
        assert!(loaded.debug_draw.rects);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_debug_toggle() {
        let mut debug = DebugDraw::default();
        debug.toggle();
        assert_eq!(debug, DebugDraw::all());
        debug.toggle();
        assert!(!debug.enabled());
    }
}
