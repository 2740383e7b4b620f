//! Convenience re-exports — `use slush::prelude::*` for the common items.

pub use crate::canvas::TrackCanvas;
pub use crate::config::GameConfig;
pub use crate::game::{Game, default_bindings};
pub use crate::input::{ActionEvent, Binding, InputMap, InputSource, UserAction};
pub use crate::math::{IVec2, Mat4, Quat, Transform, Vec2, Vec3, Vec4};
pub use crate::physics::{CarObject, PhysicsObject, PhysicsObjectBuilder, PhysicsWorld};
pub use crate::vehicle::{DriveCommand, VehicleController};
