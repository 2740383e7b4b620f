//! Game settings, loaded from a JSON file with a logged fallback to
//! defaults.

use std::fs::File;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::math::{Vec2, Vec3};

/// Tunable game settings.
///
/// Every field has a default, so a settings file only needs the values it
/// overrides.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// World-space size of the ground plane the mask is mapped onto.
    pub plane_size: Vec2,
    /// Gravity vector (Z-up).
    pub gravity: Vec3,
    /// Fixed simulation tick rate, in Hz.
    pub tick_rate: f32,
    /// Terrain mask image (track paint target + decoration markers).
    pub mask_image: PathBuf,
    /// Key-mapping file, read at startup and written on teardown.
    pub key_mappings: PathBuf,
    /// Vehicle chassis dimensions.
    pub car_size: Vec3,
    pub car_mass: f32,
    pub car_spawn: Vec3,
    /// Height above ground at which decoration cones are anchored.
    pub decoration_height: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            plane_size: Vec2::new(50.0, 50.0),
            gravity: Vec3::new(0.0, 0.0, -9.81),
            tick_rate: 60.0,
            mask_image: PathBuf::from("assets/level.png"),
            key_mappings: PathBuf::from("slush.keymap"),
            car_size: Vec3::new(1.0, 2.0, 1.0),
            car_mass: 1000.0,
            car_spawn: Vec3::new(0.0, 0.0, 2.0),
            decoration_height: 2.2,
        }
    }
}

impl GameConfig {
    /// Load settings from a JSON file, falling back to the defaults (with a
    /// warning) when the file is missing or malformed.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                log::warn!(
                    "Could not open settings '{}' ({e}); using defaults",
                    path.display()
                );
                return Self::default();
            }
        };
        match serde_json::from_reader(file) {
            Ok(config) => config,
            Err(e) => {
                log::warn!(
                    "Malformed settings '{}' ({e}); using defaults",
                    path.display()
                );
                Self::default()
            }
        }
    }

    /// Seconds per simulation tick.
    pub fn tick_dt(&self) -> f32 {
        1.0 / self.tick_rate
    }
}
