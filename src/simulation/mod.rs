// src/simulation/mod.rs
//! CPU-side simulation of the rain effect: a recycled raindrop pool and
//! the authored planar surfaces the drops collide with.

pub mod colliders;
pub mod rain;

pub use colliders::PlanarObstacle;
pub use rain::{RainSimulation, Raindrop};
