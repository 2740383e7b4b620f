//! # Slush — Winter Driving Demo Core
//!
//! The simulation core of a small 3D driving demo: a rapier-backed physics
//! world with a raycast-vehicle, a paintable terrain-mask canvas that
//! records tire tracks (and yields decoration markers), and a rebindable
//! input-to-action mapping with file persistence.
//!
//! Rendering, windowing, and UI are external: they read object matrices
//! and the canvas buffer, and feed raw input events into the
//! [`InputMap`](input::InputMap).
//!
//! Start with `use slush::prelude::*` and drive a [`Game`](game::Game)
//! from a fixed-tick loop.

pub mod canvas;
pub mod config;
pub mod game;
pub mod input;
pub mod math;
pub mod physics;
pub mod prelude;
pub mod vehicle;
