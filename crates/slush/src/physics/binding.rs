//! Binding between one rigid body and its renderable transform.

use rapier3d::prelude::*;

use super::PhysicsWorld;
use crate::math::Mat4;

/// A rigid body bound to a 4x4 world transform.
///
/// The transform is the sole source of truth for where the object is: it is
/// only ever written from the physics engine's pose in
/// [`sync`](Self::sync), never computed by game logic.
///
/// Built by [`PhysicsObjectBuilder`](super::PhysicsObjectBuilder); the
/// caller registers it with [`PhysicsWorld::add_object`] and unregisters it
/// with [`PhysicsWorld::remove_object`] when the owning game object goes
/// away.
pub struct PhysicsObject {
    matrix: Mat4,
    /// Body and collider descriptors, pending until registration.
    pending: Option<(RigidBody, Collider)>,
    handle: Option<RigidBodyHandle>,
    collider_handle: Option<ColliderHandle>,
}

impl PhysicsObject {
    pub(crate) fn from_parts(body: RigidBody, collider: Collider, matrix: Mat4) -> Self {
        Self {
            matrix,
            pending: Some((body, collider)),
            handle: None,
            collider_handle: None,
        }
    }

    pub(crate) fn take_pending(&mut self) -> Option<(RigidBody, Collider)> {
        self.pending.take()
    }

    pub(crate) fn set_handles(&mut self, body: RigidBodyHandle, collider: ColliderHandle) {
        self.handle = Some(body);
        self.collider_handle = Some(collider);
    }

    pub(crate) fn clear_handles(&mut self) -> Option<RigidBodyHandle> {
        self.collider_handle = None;
        self.handle.take()
    }

    /// The rapier body handle, once registered.
    pub fn handle(&self) -> Option<RigidBodyHandle> {
        self.handle
    }

    /// The current world transform, for rendering.
    pub fn matrix(&self) -> &Mat4 {
        &self.matrix
    }

    /// Pull the authoritative pose from the physics engine.
    ///
    /// Call once per step, after [`PhysicsWorld::step`].
    pub fn sync(&mut self, world: &PhysicsWorld) {
        let Some(handle) = self.handle else {
            return;
        };
        if let Some(body) = world.bodies.get(handle) {
            self.matrix = Mat4::from_rotation_translation(*body.rotation(), body.translation());
        }
    }
}

impl std::fmt::Debug for PhysicsObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicsObject")
            .field("registered", &self.handle.is_some())
            .field("matrix", &self.matrix)
            .finish()
    }
}
