//! # Game Orchestration — Setup, Fixed Tick, Teardown
//!
//! Wires the subsystems together the way the windowed game loop drives
//! them: [`setup`](Game::setup) builds the level from the terrain mask,
//! [`tick`](Game::tick) runs one fixed simulation step (input → controls →
//! track painting → vehicle → physics), and [`teardown`](Game::teardown)
//! persists key mappings and unregisters every body it created.
//!
//! Windowing, rendering, and UI live outside this crate; they observe the
//! game through the object matrices, the canvas buffer plus its dirty
//! flag, and the input map's remap state.

use std::thread::JoinHandle;

use crate::canvas::TrackCanvas;
use crate::config::GameConfig;
use crate::input::{Binding, InputMap, UserAction};
use crate::math::{Quat, Vec3};
use crate::physics::{
    CarObject, GROUP_STATIC, MASK_DEFAULT, PhysicsObject, PhysicsObjectBuilder, PhysicsWorld,
};

/// Speed change per tick while SpeedUp/SpeedDown is held.
const SPEED_STEP: f32 = 1.0;
/// Steering change per tick while SteerLeft/SteerRight is held.
const STEER_STEP: f32 = 0.01;

/// The built-in key bindings installed when no mapping file exists.
pub fn default_bindings() -> Vec<(Binding, UserAction)> {
    vec![
        (Binding::key('E' as i32), UserAction::StartEngine),
        (Binding::key('Q' as i32), UserAction::StopEngine),
        (Binding::key('W' as i32), UserAction::SpeedUp),
        (Binding::key('S' as i32), UserAction::SpeedDown),
        (Binding::key('A' as i32), UserAction::SteerLeft),
        (Binding::key('D' as i32), UserAction::SteerRight),
        (Binding::key(' ' as i32), UserAction::Brake),
        (Binding::key('F' as i32), UserAction::Action),
    ]
}

/// The driving demo: physics world, terrain canvas, vehicle, and input.
pub struct Game {
    config: GameConfig,
    physics: PhysicsWorld,
    canvas: TrackCanvas,
    input: InputMap,
    floor: Option<PhysicsObject>,
    car: Option<CarObject>,
    trees: Vec<PhysicsObject>,
    pending_io: Vec<JoinHandle<bool>>,
}

impl Game {
    pub fn new(config: GameConfig) -> Self {
        let physics = PhysicsWorld::new().with_gravity(config.gravity);
        let mut input = InputMap::new();
        input.set_defaults(default_bindings());

        Self {
            config,
            physics,
            canvas: TrackCanvas::new(),
            input,
            floor: None,
            car: None,
            trees: Vec::new(),
            pending_io: Vec::new(),
        }
    }

    /// Build the level: key mappings, terrain mask, floor body, vehicle,
    /// and one static cone per blue decoration marker in the mask.
    pub fn setup(&mut self) {
        self.pending_io
            .push(self.input.load(self.config.key_mappings.clone()));

        // A failed mask load degrades to a level without track paint and
        // decorations; load_image already logged why.
        self.canvas.load_image(&self.config.mask_image);
        self.canvas.set_plane_size(self.config.plane_size);

        let mut floor = PhysicsObjectBuilder::new()
            .box_shape(Vec3::new(
                self.config.plane_size.x,
                self.config.plane_size.y,
                0.1,
            ))
            .mass(0.0)
            .build()
            .expect("floor builder has a shape");
        self.physics
            .add_object_filtered(&mut floor, GROUP_STATIC, MASK_DEFAULT);
        self.floor = Some(floor);

        self.car = PhysicsObjectBuilder::new()
            .car(self.config.car_size)
            .mass(self.config.car_mass)
            .initial_position(self.config.car_spawn)
            .build_car(&mut self.physics);
        if self.car.is_none() {
            log::error!("Vehicle construction failed; the level is not drivable");
        }

        // Cones stand along Z; the shape's principal axis is Y.
        let upright = Quat::from_rotation_x(std::f32::consts::FRAC_PI_2);
        for marker in self.canvas.blue_markers() {
            let tree = PhysicsObjectBuilder::new()
                .cone(1.0, 4.0)
                .mass(0.0)
                .initial_rotation(upright)
                .initial_position(Vec3::new(
                    marker.x,
                    marker.y,
                    self.config.decoration_height,
                ))
                .build()
                .expect("decoration builder has a shape");
            let mut tree = tree;
            self.physics
                .add_object_filtered(&mut tree, GROUP_STATIC, MASK_DEFAULT);
            self.trees.push(tree);
        }
        log::info!("Level ready: {} decoration markers", self.trees.len());
    }

    /// Run one fixed simulation tick of `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        let Some(car) = &mut self.car else {
            return;
        };

        {
            // Holding the tick guard blocks event delivery for the whole
            // update; the queue clears when it drops.
            let events = self.input.begin_update();
            let ctrl = car.controller_mut();

            if events.action_state(UserAction::StartEngine) {
                ctrl.start_engine();
            } else if events.action_state(UserAction::StopEngine) {
                ctrl.stop_engine();
            }

            if events.action_state(UserAction::SpeedUp) {
                ctrl.change_speed(SPEED_STEP);
            } else if events.action_state(UserAction::SpeedDown) {
                ctrl.change_speed(-SPEED_STEP);
            }

            if events.action_state(UserAction::SteerLeft) {
                ctrl.steer(STEER_STEP);
            } else if events.action_state(UserAction::SteerRight) {
                ctrl.steer(-STEER_STEP);
            }

            if events.action_state(UserAction::Brake) {
                ctrl.brake();
            }
        }

        // Track paint only while driving forward.
        if car.controller().speed() > 0.0 {
            self.canvas.paint_at(car.matrix());
        }

        car.tick(&mut self.physics, dt);
        self.physics.step(dt);
        car.sync(&self.physics);
    }

    /// Persist key mappings (waiting for the write to finish) and remove
    /// every registered body from the simulation.
    pub fn teardown(&mut self) {
        self.join_io();
        let save = self.input.save(self.config.key_mappings.clone());
        if !save.join().unwrap_or(false) {
            log::warn!("Key mappings were not saved");
        }

        if let Some(mut car) = self.car.take() {
            car.remove_from(&mut self.physics);
        }
        if let Some(mut floor) = self.floor.take() {
            self.physics.remove_object(&mut floor);
        }
        for mut tree in self.trees.drain(..) {
            self.physics.remove_object(&mut tree);
        }
    }

    /// Wait for any in-flight mapping I/O before relying on the table.
    pub fn join_io(&mut self) {
        for handle in self.pending_io.drain(..) {
            let _ = handle.join();
        }
    }

    // ── Accessors for the render/UI layer ───────────────────────────────

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn canvas(&self) -> &TrackCanvas {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut TrackCanvas {
        &mut self.canvas
    }

    pub fn input(&self) -> &InputMap {
        &self.input
    }

    pub fn car(&self) -> Option<&CarObject> {
        self.car.as_ref()
    }

    pub fn floor(&self) -> Option<&PhysicsObject> {
        self.floor.as_ref()
    }

    pub fn trees(&self) -> &[PhysicsObject] {
        &self.trees
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec2;

    fn test_config(dir: &std::path::Path) -> GameConfig {
        GameConfig {
            mask_image: dir.join("missing-mask.png"),
            key_mappings: dir.join("test.keymap"),
            ..GameConfig::default()
        }
    }

    #[test]
    fn scripted_drive_starts_the_engine_and_accelerates() {
        let dir = tempfile::tempdir().unwrap();
        let mut game = Game::new(test_config(dir.path()));
        game.setup();
        game.join_io();

        let dt = game.config().tick_dt();

        // Tap the engine-start key, then hold accelerate.
        game.input().process_event(Binding::key('E' as i32), true);
        game.tick(dt);
        game.input().process_event(Binding::key('E' as i32), false);
        game.input().process_event(Binding::key('W' as i32), true);
        for _ in 0..10 {
            game.tick(dt);
        }

        let car = game.car().unwrap();
        assert!(car.controller().engine_running());
        assert_eq!(car.controller().speed(), 10.0);

        game.teardown();
        assert!(std::fs::metadata(dir.path().join("test.keymap")).is_ok());
    }

    #[test]
    fn missing_mask_leaves_level_without_decorations() {
        let dir = tempfile::tempdir().unwrap();
        let mut game = Game::new(test_config(dir.path()));
        game.setup();
        game.join_io();

        assert!(!game.canvas().is_loaded());
        assert!(game.trees().is_empty());
        assert!(game.car().is_some());
        game.teardown();
    }

    #[test]
    fn decorations_spawn_at_blue_markers() {
        let dir = tempfile::tempdir().unwrap();
        let mut game = Game::new(test_config(dir.path()));

        // Seed a procedural mask with two blue markers; the (missing) mask
        // file on disk will not replace it.
        let (w, h) = (64u32, 64u32);
        let mut data = vec![0u8; (w * h) as usize * 3];
        for (x, y) in [(10usize, 10usize), (50, 20)] {
            data[(y * w as usize + x) * 3 + 2] = 255;
        }
        *game.canvas_mut() = TrackCanvas::from_pixels(w, h, 3, data);

        game.setup();
        game.join_io();
        assert_eq!(game.trees().len(), 2);
        game.teardown();
    }

    #[test]
    fn forward_driving_paints_the_canvas() {
        let dir = tempfile::tempdir().unwrap();
        let mut game = Game::new(test_config(dir.path()));
        let (w, h) = (128u32, 128u32);
        *game.canvas_mut() = TrackCanvas::from_pixels(w, h, 3, vec![0; (w * h) as usize * 3]);

        game.setup();
        game.join_io();
        assert_eq!(game.canvas().plane_world_size(), Vec2::new(50.0, 50.0));

        game.input().process_event(Binding::key('E' as i32), true);
        game.tick(game.config().tick_dt());
        game.input().process_event(Binding::key('W' as i32), true);
        for _ in 0..5 {
            game.tick(game.config().tick_dt());
        }

        assert!(game.canvas_mut().take_dirty());
        game.teardown();
    }
}
