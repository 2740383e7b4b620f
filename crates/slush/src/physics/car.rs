//! The drivable vehicle: body binding + control state + wheel rig.

use rapier3d::control::DynamicRayCastVehicleController;

use super::{PhysicsObject, PhysicsWorld};
use crate::math::{Mat4, Quat};
use crate::vehicle::VehicleController;

/// Indices of the steered (front) wheel pair.
const STEERED_WHEELS: [usize; 2] = [0, 1];
/// Indices of the driven (rear) wheel pair.
const DRIVEN_WHEELS: [usize; 2] = [2, 3];

/// A four-wheeled vehicle.
///
/// Composes the chassis [`PhysicsObject`], the [`VehicleController`] state
/// machine, and rapier's raycast-vehicle rig. The chassis transform and the
/// four wheel transforms are refreshed from the engine every
/// [`tick`](Self::tick).
pub struct CarObject {
    binding: PhysicsObject,
    controller: VehicleController,
    vehicle: DynamicRayCastVehicleController,
    wheel_matrices: [Mat4; 4],
}

impl CarObject {
    pub(crate) fn from_parts(
        binding: PhysicsObject,
        vehicle: DynamicRayCastVehicleController,
    ) -> Self {
        Self {
            binding,
            controller: VehicleController::new(),
            vehicle,
            wheel_matrices: [Mat4::IDENTITY; 4],
        }
    }

    /// The control state machine (engine/speed/steering).
    pub fn controller(&self) -> &VehicleController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut VehicleController {
        &mut self.controller
    }

    /// The chassis world transform, for rendering and track painting.
    pub fn matrix(&self) -> &Mat4 {
        self.binding.matrix()
    }

    /// The world transform of wheel `wheel` (0..4), for rendering.
    pub fn wheel_matrix(&self, wheel: usize) -> &Mat4 {
        &self.wheel_matrices[wheel]
    }

    /// Advance the vehicle by one tick.
    ///
    /// Consumes the controller's pending state into a drive command, writes
    /// it to the wheel rig (engine force on the rear pair, steering on the
    /// front pair, brake on all four), runs the suspension raycasts, and
    /// refreshes the chassis and wheel transforms.
    pub fn tick(&mut self, world: &mut PhysicsWorld, dt: f32) {
        let cmd = self.controller.tick();

        for (i, wheel) in self.vehicle.wheels_mut().iter_mut().enumerate() {
            wheel.engine_force = if DRIVEN_WHEELS.contains(&i) {
                cmd.engine_force
            } else {
                0.0
            };
            wheel.steering = if STEERED_WHEELS.contains(&i) {
                cmd.steering
            } else {
                0.0
            };
            wheel.brake = cmd.brake;
        }

        world.update_vehicle(&mut self.vehicle, dt);
        self.sync(world);
    }

    /// Refresh the chassis and wheel transforms from the engine's current
    /// pose. Called from [`tick`](Self::tick), and again after
    /// [`PhysicsWorld::step`] so rendering sees the post-step pose.
    pub fn sync(&mut self, world: &PhysicsWorld) {
        self.binding.sync(world);
        let (_, chassis_rot, _) = self.binding.matrix().to_scale_rotation_translation();
        for (i, wheel) in self.vehicle.wheels().iter().enumerate() {
            // Steering turns the wheel around the up axis on top of the
            // chassis orientation; the center comes from the raycast.
            let rot = chassis_rot * Quat::from_rotation_z(wheel.steering);
            self.wheel_matrices[i] = Mat4::from_rotation_translation(rot, wheel.center());
        }
    }

    /// Unregister the chassis (and with it the wheel rig) from the world.
    pub fn remove_from(&mut self, world: &mut PhysicsWorld) {
        world.remove_object(&mut self.binding);
    }
}

impl std::fmt::Debug for CarObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CarObject")
            .field("controller", &self.controller)
            .field("matrix", self.binding.matrix())
            .finish()
    }
}
