//! Hole geometry: direction math and the attribute recompute engine.

pub mod hole_engine;
pub mod vector;

pub use hole_engine::{recompute, solve_hole, GeometryError, HoleEdit};
