//! delve-core: seeded procedural dungeon-map generation
//!
//! This crate contains the whole generation engine with no I/O besides the
//! persistence codec: a computational-geometry library for room and passage
//! shapes, a map graph owning placed regions and connections with a grid
//! spatial index, and a stepping generator that grows the map from a
//! deterministic seed. Rendering and interactive input live elsewhere and
//! consume the core only through read access, `object_at` hit-testing, and
//! the encode/decode contract.

pub mod direction;
pub mod errors;
pub mod generator;
pub mod geometry;
pub mod map;
pub mod save;

mod rng;

pub use direction::Direction;
pub use rng::GenRng;

/// Map grid spacing in feet. Rooms, passage widths, and sweep distances are
/// multiples of this.
pub const GRID: f64 = 10.0;

/// Diagonal geometry lands on the half-grid: moving one grid unit along a
/// 45-degree direction displaces by (5, 5).
pub const HALF_GRID: f64 = 5.0;

/// Tolerance band around a connection line for point hit-testing, in feet.
pub const HIT_BAND: f64 = 2.0;
