//! Fluent builder translating shape/mass/pose parameters into rapier
//! construction calls.

use rapier3d::control::{DynamicRayCastVehicleController, WheelTuning};
use rapier3d::prelude::*;

use super::car::CarObject;
use super::{GROUP_CHARACTER, MASK_DEFAULT, PhysicsObject, PhysicsWorld};
use crate::math::{Mat4, Quat, Vec3};

// Wheel rig constants, identical for all four wheels.
const WHEEL_RADIUS: f32 = 0.5;
const WHEEL_WIDTH: f32 = 0.4;
const WHEEL_CONNECTION_HEIGHT: f32 = 0.2;
const SUSPENSION_REST_LENGTH: f32 = 0.6;

/// Convert a glam Quat to a scaled-axis-angle Vec3 (for RigidBodyBuilder::rotation).
fn quat_to_scaled_axis(q: Quat) -> Vec3 {
    let (axis, angle) = q.to_axis_angle();
    axis * angle
}

/// Transient configuration for one physics object.
///
/// Select exactly one shape, chain pose/material parameters, and consume the
/// builder with [`build`](Self::build) or [`build_car`](Self::build_car).
/// Both return `None` when no shape was selected; nothing touches the
/// simulation world until the caller registers the result (the car variant
/// registers itself, because the wheel rig needs a live body handle).
///
/// ```no_run
/// # use slush::physics::{PhysicsObjectBuilder, PhysicsWorld};
/// # use slush::math::Vec3;
/// let mut world = PhysicsWorld::new();
/// let mut floor = PhysicsObjectBuilder::new()
///     .box_shape(Vec3::new(50.0, 50.0, 0.1))
///     .mass(0.0)
///     .build()
///     .unwrap();
/// world.add_object(&mut floor);
/// ```
pub struct PhysicsObjectBuilder {
    shape: Option<SharedShape>,
    /// Dimensions of the last sized shape; sizes the wheel rig later.
    input_size: Vec3,
    mass: f32,
    friction: f32,
    linear_damping: f32,
    angular_damping: f32,
    position: Vec3,
    rotation: Quat,
}

impl PhysicsObjectBuilder {
    pub fn new() -> Self {
        Self {
            shape: None,
            input_size: Vec3::ZERO,
            mass: 0.0,
            friction: 0.1,
            linear_damping: 0.9,
            angular_damping: 0.9,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }

    // ── Shape selectors ─────────────────────────────────────────────────

    /// A box of the given full extents.
    pub fn box_shape(mut self, size: Vec3) -> Self {
        self.input_size = size;
        self.shape = Some(SharedShape::cuboid(
            size.x / 2.0,
            size.y / 2.0,
            size.z / 2.0,
        ));
        self
    }

    /// A sphere of the given radius.
    pub fn sphere(mut self, radius: f32) -> Self {
        self.shape = Some(SharedShape::ball(radius));
        self
    }

    /// A cylinder bounded by the given full extents (principal axis Y).
    pub fn cylinder(mut self, size: Vec3) -> Self {
        self.input_size = size;
        self.shape = Some(SharedShape::cylinder(size.y / 2.0, size.x / 2.0));
        self
    }

    /// A cone of the given base radius and height (principal axis Y).
    pub fn cone(mut self, radius: f32, height: f32) -> Self {
        self.shape = Some(SharedShape::cone(height / 2.0, radius));
        self
    }

    /// A vehicle chassis: a compound of the chassis box and a wider
    /// "shover" box ahead of it, so the vehicle pushes obstacles out of the
    /// way instead of stopping dead on contact.
    pub fn car(mut self, size: Vec3) -> Self {
        self.input_size = size;

        let chassis = SharedShape::cuboid(size.x, size.y, size.z);
        let chassis_pose = Pose::from_parts(Vec3::new(0.0, 0.0, size.z + 0.5), Quat::IDENTITY);

        let shover = SharedShape::cuboid(size.x * 1.5, 1.0, size.z);
        let shover_pose = Pose::from_parts(
            Vec3::new(0.0, size.y + 1.0, size.z + 0.5),
            Quat::IDENTITY,
        );

        self.shape = Some(SharedShape::compound(vec![
            (chassis_pose, chassis),
            (shover_pose, shover),
        ]));
        self
    }

    // ── Pose and material ───────────────────────────────────────────────

    pub fn initial_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn initial_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Mass in kilograms. Zero means static: the body gets infinite
    /// effective mass and never responds to gravity or impacts.
    pub fn mass(mut self, amount: f32) -> Self {
        self.mass = amount;
        self
    }

    pub fn friction(mut self, amount: f32) -> Self {
        self.friction = amount;
        self
    }

    pub fn linear_damping(mut self, amount: f32) -> Self {
        self.linear_damping = amount;
        self
    }

    pub fn angular_damping(mut self, amount: f32) -> Self {
        self.angular_damping = amount;
        self
    }

    // ── Consumers ───────────────────────────────────────────────────────

    fn make_parts(&self, body_type: RigidBodyType) -> Option<(RigidBody, Collider)> {
        let shape = self.shape.clone()?;

        let body = RigidBodyBuilder::new(body_type)
            .translation(self.position)
            .rotation(quat_to_scaled_axis(self.rotation))
            .linear_damping(self.linear_damping)
            .angular_damping(self.angular_damping)
            .build();

        let mut collider = ColliderBuilder::new(shape).friction(self.friction);
        if self.mass > 0.0 {
            collider = collider.mass(self.mass);
        }

        Some((body, collider.build()))
    }

    /// Build a plain physics object, or `None` if no shape was selected.
    ///
    /// The object is not yet part of the simulation; pass it to
    /// [`PhysicsWorld::add_object`].
    pub fn build(self) -> Option<PhysicsObject> {
        let body_type = if self.mass == 0.0 {
            RigidBodyType::Fixed
        } else {
            RigidBodyType::Dynamic
        };
        let (body, collider) = self.make_parts(body_type)?;
        let matrix = Mat4::from_rotation_translation(self.rotation, self.position);
        Some(PhysicsObject::from_parts(body, collider, matrix))
    }

    /// Build a drivable vehicle, or `None` if no shape was selected.
    ///
    /// Unlike [`build`](Self::build) this registers the chassis and the
    /// wheel rig with the world immediately: the raycast-vehicle controller
    /// needs a live body handle. Deactivation is disabled — player input
    /// can resume at any moment without an intervening contact event, so
    /// the chassis must never go to sleep.
    pub fn build_car(self, world: &mut PhysicsWorld) -> Option<CarObject> {
        let (mut body, collider) = self.make_parts(RigidBodyType::Dynamic)?;
        *body.activation_mut() = RigidBodyActivation::cannot_sleep();

        let matrix = Mat4::from_rotation_translation(self.rotation, self.position);
        let mut binding = PhysicsObject::from_parts(body, collider, matrix);
        world.add_object_filtered(&mut binding, GROUP_CHARACTER, MASK_DEFAULT);
        let chassis = binding
            .handle()
            .expect("chassis registration assigns a handle");

        let mut vehicle = DynamicRayCastVehicleController::new(chassis);
        // Z-up, +Y forward.
        vehicle.index_up_axis = 2;
        vehicle.index_forward_axis = 1;
        add_wheels(self.input_size / 2.0, &mut vehicle);

        Some(CarObject::from_parts(binding, vehicle))
    }
}

impl Default for PhysicsObjectBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Attach the four wheels, symmetric about the chassis half-extents.
///
/// Wheel order: front-right, front-left, rear-right, rear-left. The front
/// pair steers, the rear pair drives (see
/// [`CarObject::tick`](super::CarObject::tick)). All wheels share one
/// suspension/friction tuning.
fn add_wheels(half_extents: Vec3, vehicle: &mut DynamicRayCastVehicleController) {
    // Wheels raycast straight down and rotate around the X (axle) axis.
    let wheel_direction = -Vec3::Z;
    let wheel_axle = Vec3::X;

    let tuning = WheelTuning {
        suspension_stiffness: 50.0,
        suspension_compression: 0.8,
        suspension_damping: 1.0,
        friction_slip: 0.8,
        ..WheelTuning::default()
    };

    let connection = Vec3::new(
        half_extents.x - WHEEL_RADIUS,
        half_extents.y - WHEEL_WIDTH,
        WHEEL_CONNECTION_HEIGHT,
    );

    for (side, end) in [(1.0, 1.0), (-1.0, 1.0), (1.0, -1.0), (-1.0, -1.0)] {
        vehicle.add_wheel(
            connection * Vec3::new(side, end, 1.0),
            wheel_direction,
            wheel_axle,
            SUSPENSION_REST_LENGTH,
            WHEEL_RADIUS,
            &tuning,
        );
    }
}
