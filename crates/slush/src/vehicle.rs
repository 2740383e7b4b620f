//! # Vehicle Controller — Engine, Speed, and Steering State
//!
//! A small state machine owning the drivable entity's control state. It knows
//! nothing about the physics engine: each tick it emits a [`DriveCommand`]
//! that the physics side applies to the raycast-vehicle rig.
//!
//! The engine is either stopped or running. Speed and steering only respond
//! to input while the engine runs; stopping the engine floors the speed at
//! its reverse minimum, which doubles as a hard brake without modelling a
//! separate gear state.

/// Forward speed ceiling.
pub const MAX_SPEED: f32 = 40.0;
/// Reverse speed floor. Smaller in magnitude than [`MAX_SPEED`]: the vehicle
/// reverses slower than it drives.
pub const MIN_SPEED: f32 = -12.0;
/// Steering limits (radians at the front wheels).
pub const MAX_STEERING: f32 = 0.45;
pub const MIN_STEERING: f32 = -0.45;

/// Engine force applied per unit of speed.
const FORCE_PER_SPEED: f32 = 100.0;
/// Wheel brake force applied on the tick that consumes a pending brake.
const BRAKE_FORCE: f32 = 500.0;

/// Per-tick control output, consumed by the physics rig.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriveCommand {
    /// Engine force for the driven (rear) wheels.
    pub engine_force: f32,
    /// Steering angle for the steered (front) wheels.
    pub steering: f32,
    /// Brake force for all wheels; non-zero only on a braking tick.
    pub brake: f32,
}

/// Control state for a drivable vehicle.
#[derive(Debug, Clone)]
pub struct VehicleController {
    engine_running: bool,
    speed: f32,
    steering: f32,
    brake_pending: bool,
}

impl VehicleController {
    /// A stopped vehicle with neutral controls.
    pub fn new() -> Self {
        Self {
            engine_running: false,
            speed: 0.0,
            steering: 0.0,
            brake_pending: false,
        }
    }

    /// Start the engine. Idempotent while already running.
    pub fn start_engine(&mut self) {
        self.engine_running = true;
    }

    /// Stop the engine and floor the speed to its reverse minimum.
    ///
    /// The floor acts as a hard brake: the engine force on the next ticks
    /// pushes against the remaining forward momentum.
    pub fn stop_engine(&mut self) {
        self.engine_running = false;
        self.speed = MIN_SPEED;
    }

    pub fn engine_running(&self) -> bool {
        self.engine_running
    }

    /// Add `delta` to the speed, clamped to `[MIN_SPEED, MAX_SPEED]`.
    /// Ignored while the engine is stopped.
    pub fn change_speed(&mut self, delta: f32) {
        if !self.engine_running {
            return;
        }
        self.speed = (self.speed + delta).clamp(MIN_SPEED, MAX_SPEED);
    }

    /// Add `delta` to the steering angle, clamped to
    /// `[MIN_STEERING, MAX_STEERING]`. Ignored while the engine is stopped.
    pub fn steer(&mut self, delta: f32) {
        if !self.engine_running {
            return;
        }
        self.steering = (self.steering + delta).clamp(MIN_STEERING, MAX_STEERING);
    }

    /// Request a brake. The effect is deferred: it applies exactly once at
    /// the start of the next [`tick`](Self::tick).
    pub fn brake(&mut self) {
        self.brake_pending = true;
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn steering(&self) -> f32 {
        self.steering
    }

    /// Consume one tick of control state.
    ///
    /// A pending brake is applied first (zeroing the speed and emitting a
    /// brake force); the speed is then converted into engine force. The
    /// brake only takes effect while the engine runs; the pending flag is
    /// cleared either way.
    pub fn tick(&mut self) -> DriveCommand {
        let mut brake = 0.0;
        if std::mem::take(&mut self.brake_pending) && self.engine_running {
            self.speed = 0.0;
            brake = BRAKE_FORCE;
        }

        DriveCommand {
            engine_force: self.speed * FORCE_PER_SPEED,
            steering: self.steering,
            brake,
        }
    }
}

impl Default for VehicleController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speed_and_steering_stay_clamped() {
        let mut v = VehicleController::new();
        v.start_engine();

        for _ in 0..100 {
            v.change_speed(5.0);
            v.steer(0.2);
        }
        assert_eq!(v.speed(), MAX_SPEED);
        assert_eq!(v.steering(), MAX_STEERING);

        for _ in 0..100 {
            v.change_speed(-7.5);
            v.steer(-0.3);
        }
        assert_eq!(v.speed(), MIN_SPEED);
        assert_eq!(v.steering(), MIN_STEERING);
    }

    #[test]
    fn controls_are_ignored_while_engine_is_stopped() {
        let mut v = VehicleController::new();
        v.change_speed(10.0);
        v.steer(0.1);
        assert_eq!(v.speed(), 0.0);
        assert_eq!(v.steering(), 0.0);

        // A brake requested while stopped must not touch the speed either.
        v.brake();
        v.tick();
        assert_eq!(v.speed(), 0.0);
    }

    #[test]
    fn start_engine_is_idempotent() {
        let mut v = VehicleController::new();
        v.start_engine();
        v.change_speed(3.0);
        v.start_engine();
        assert!(v.engine_running());
        assert_eq!(v.speed(), 3.0);
    }

    #[test]
    fn stop_engine_floors_the_speed() {
        let mut v = VehicleController::new();
        v.start_engine();
        v.change_speed(20.0);
        v.stop_engine();
        assert!(!v.engine_running());
        assert_eq!(v.speed(), MIN_SPEED);
    }

    #[test]
    fn brake_applies_exactly_once_on_the_next_tick() {
        let mut v = VehicleController::new();
        v.start_engine();
        v.change_speed(10.0);

        v.brake();
        // The request itself leaves the speed untouched.
        assert_eq!(v.speed(), 10.0);

        let cmd = v.tick();
        assert!(cmd.brake > 0.0);
        assert_eq!(cmd.engine_force, 0.0);
        assert_eq!(v.speed(), 0.0);

        // The following tick is brake-free.
        let cmd = v.tick();
        assert_eq!(cmd.brake, 0.0);
    }

    #[test]
    fn tick_converts_speed_into_engine_force() {
        let mut v = VehicleController::new();
        v.start_engine();
        v.change_speed(4.0);
        v.steer(0.2);

        let cmd = v.tick();
        assert_eq!(cmd.engine_force, 4.0 * 100.0);
        assert_eq!(cmd.steering, 0.2);
        assert_eq!(cmd.brake, 0.0);
    }
}
