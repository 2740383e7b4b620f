//! # Physics Integration — Rapier-backed Rigid Bodies and Vehicles
//!
//! Bridges the game to the [rapier3d](https://rapier.rs) rigid-body engine.
//! The engine is treated as a black box: this module owns the simulation
//! sets, steps the pipeline once per game tick, and keeps renderable
//! transforms in sync with the authoritative body poses.
//!
//! - [`PhysicsWorld`] holds the rapier sets and pipeline (Z-up gravity).
//! - [`PhysicsObject`] binds one rigid body to a 4x4 render transform.
//! - [`PhysicsObjectBuilder`] translates shape/mass/pose parameters into
//!   rapier construction calls.
//! - [`CarObject`] composes a body binding, a [`VehicleController`], and a
//!   four-wheel raycast-vehicle rig.
//!
//! [`VehicleController`]: crate::vehicle::VehicleController

mod binding;
mod builder;
mod car;

pub use binding::PhysicsObject;
pub use builder::PhysicsObjectBuilder;
pub use car::CarObject;

use rapier3d::control::DynamicRayCastVehicleController;
use rapier3d::prelude::*;

use crate::math::Vec3;

/// Collision filter group for ordinary dynamic objects.
pub const GROUP_DEFAULT: Group = Group::GROUP_1;
/// Collision filter group for static level geometry.
pub const GROUP_STATIC: Group = Group::GROUP_2;
/// Collision filter group for player-controlled objects.
pub const GROUP_CHARACTER: Group = Group::GROUP_3;

/// The default collision mask: dynamic, static, and character objects.
pub const MASK_DEFAULT: Group = GROUP_DEFAULT
    .union(GROUP_STATIC)
    .union(GROUP_CHARACTER);

/// The simulation world. Owns the rapier sets and advances them one step
/// per [`step`](Self::step) call; tick cadence belongs to the game loop.
pub struct PhysicsWorld {
    gravity: Vec3,
    pipeline: PhysicsPipeline,
    params: IntegrationParameters,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    pub(crate) bodies: RigidBodySet,
    pub(crate) colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
}

impl std::fmt::Debug for PhysicsWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicsWorld")
            .field("gravity", &self.gravity)
            .field("bodies", &self.bodies.len())
            .field("colliders", &self.colliders.len())
            .finish()
    }
}

impl PhysicsWorld {
    /// Create a new physics world with Z-up gravity (0, 0, -9.81).
    pub fn new() -> Self {
        Self {
            gravity: Vec3::new(0.0, 0.0, -9.81),
            pipeline: PhysicsPipeline::new(),
            params: IntegrationParameters::default(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
        }
    }

    /// Set gravity (builder pattern).
    pub fn with_gravity(mut self, g: Vec3) -> Self {
        self.gravity = g;
        self
    }

    /// Advance the simulation by exactly one step of `dt` seconds.
    ///
    /// No internal sub-stepping: the caller's fixed tick owns the cadence.
    /// After stepping, active contact pairs are enumerated for collision
    /// events.
    pub fn step(&mut self, dt: f32) {
        self.params.dt = dt;
        self.pipeline.step(
            self.gravity,
            &self.params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            &(),
            &(),
        );

        // TODO: dispatch these pairs to game-level collision handlers once
        // an event payload is settled.
        let active = self
            .narrow_phase
            .contact_pairs()
            .filter(|pair| pair.has_any_active_contact())
            .count();
        if active > 0 {
            log::trace!("{active} active contact pairs");
        }
    }

    /// Register a built object with the default filter group and mask.
    pub fn add_object(&mut self, obj: &mut PhysicsObject) {
        self.add_object_filtered(obj, GROUP_DEFAULT, MASK_DEFAULT);
    }

    /// Register a built object with an explicit collision filter.
    pub fn add_object_filtered(&mut self, obj: &mut PhysicsObject, group: Group, mask: Group) {
        let Some((body, mut collider)) = obj.take_pending() else {
            log::warn!("add_object called on an already-registered object");
            return;
        };

        collider.set_collision_groups(InteractionGroups::new(group, mask, InteractionTestMode::And));
        let handle = self.bodies.insert(body);
        let collider_handle = self
            .colliders
            .insert_with_parent(collider, handle, &mut self.bodies);
        obj.set_handles(handle, collider_handle);
    }

    /// Unregister an object, removing its body and attached colliders.
    pub fn remove_object(&mut self, obj: &mut PhysicsObject) {
        let Some(handle) = obj.clear_handles() else {
            return;
        };
        self.bodies.remove(
            handle,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
    }

    /// Run the raycast-vehicle suspension/force update for one tick.
    ///
    /// The vehicle's own chassis and all dynamic bodies are excluded from
    /// the wheel raycasts; wheels ride on static geometry only.
    pub(crate) fn update_vehicle(
        &mut self,
        vehicle: &mut DynamicRayCastVehicleController,
        dt: f32,
    ) {
        let chassis = vehicle.chassis;
        let queries = self.broad_phase.as_query_pipeline_mut(
            self.narrow_phase.query_dispatcher(),
            &mut self.bodies,
            &mut self.colliders,
            QueryFilter::exclude_dynamic().exclude_rigid_body(chassis),
        );
        vehicle.update_vehicle(dt, queries);
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Quat, Vec3};

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn builder_without_shape_returns_none() {
        assert!(PhysicsObjectBuilder::new().mass(5.0).build().is_none());

        let mut world = PhysicsWorld::new();
        assert!(
            PhysicsObjectBuilder::new()
                .mass(1000.0)
                .build_car(&mut world)
                .is_none()
        );
    }

    #[test]
    fn zero_mass_body_never_moves() {
        let mut world = PhysicsWorld::new();
        let mut obj = PhysicsObjectBuilder::new()
            .box_shape(Vec3::new(2.0, 2.0, 2.0))
            .mass(0.0)
            .initial_position(Vec3::new(0.0, 0.0, 5.0))
            .build()
            .unwrap();
        world.add_object(&mut obj);

        let before = *obj.matrix();
        for _ in 0..120 {
            world.step(DT);
        }
        obj.sync(&world);

        assert_eq!(before, *obj.matrix());
    }

    #[test]
    fn dynamic_body_falls_under_gravity() {
        let mut world = PhysicsWorld::new();
        let mut obj = PhysicsObjectBuilder::new()
            .box_shape(Vec3::new(1.0, 1.0, 1.0))
            .mass(10.0)
            .initial_position(Vec3::new(0.0, 0.0, 5.0))
            .build()
            .unwrap();
        world.add_object(&mut obj);

        for _ in 0..60 {
            world.step(DT);
        }
        obj.sync(&world);

        assert!(obj.matrix().w_axis.z < 5.0);
    }

    #[test]
    fn removed_body_leaves_the_simulation() {
        let mut world = PhysicsWorld::new();
        let mut obj = PhysicsObjectBuilder::new()
            .sphere(1.0)
            .mass(1.0)
            .build()
            .unwrap();
        world.add_object(&mut obj);
        assert_eq!(world.bodies.len(), 1);

        world.remove_object(&mut obj);
        assert_eq!(world.bodies.len(), 0);
        assert_eq!(world.colliders.len(), 0);
    }

    #[test]
    fn built_car_settles_onto_its_suspension() {
        let mut world = PhysicsWorld::new();

        let mut floor = PhysicsObjectBuilder::new()
            .box_shape(Vec3::new(50.0, 50.0, 0.1))
            .mass(0.0)
            .build()
            .unwrap();
        world.add_object_filtered(&mut floor, GROUP_STATIC, MASK_DEFAULT);

        let mut car = PhysicsObjectBuilder::new()
            .car(Vec3::new(1.0, 2.0, 1.0))
            .mass(1000.0)
            .initial_position(Vec3::new(0.0, 0.0, 2.0))
            .build_car(&mut world)
            .unwrap();

        let before = *car.matrix();
        for _ in 0..120 {
            car.tick(&mut world, DT);
            world.step(DT);
        }

        // The chassis dropped toward the floor and the wheel transforms
        // followed the raycast results.
        assert!(car.matrix().w_axis.z < before.w_axis.z);
        for i in 0..4 {
            assert_ne!(*car.wheel_matrix(i), crate::math::Mat4::IDENTITY);
        }

        car.remove_from(&mut world);
        assert_eq!(world.bodies.len(), 1);
    }

    #[test]
    fn initial_rotation_is_preserved_on_static_bodies() {
        let mut world = PhysicsWorld::new();
        let rot = Quat::from_rotation_x(std::f32::consts::FRAC_PI_2);
        let mut obj = PhysicsObjectBuilder::new()
            .cone(1.0, 4.0)
            .mass(0.0)
            .initial_position(Vec3::new(3.0, 1.0, 2.2))
            .initial_rotation(rot)
            .build()
            .unwrap();
        world.add_object(&mut obj);
        world.step(DT);
        obj.sync(&world);

        let (_, q, t) = obj.matrix().to_scale_rotation_translation();
        assert!((t - Vec3::new(3.0, 1.0, 2.2)).length() < 1e-4);
        assert!(q.angle_between(rot) < 1e-4);
    }
}
