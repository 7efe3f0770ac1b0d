//! Core types for the obstacle layer.
//!
//! This module provides the fundamental types used throughout the crate:
//! - [`GridCoord`] and [`WorldPoint`]: coordinate types
//! - [`Pose2D`]: robot/sensor pose (position + orientation)
//! - [`Bounds`]: the damage-bounds accumulator
//! - [`Observation`] and [`Point3`]: sensor observation values
//! - Cost constants and [`CombinationMethod`]

mod bounds;
mod cost;
mod observation;
mod point;
mod pose;

pub use bounds::Bounds;
pub use cost::{CombinationMethod, FREE_SPACE, LETHAL_OBSTACLE, NO_INFORMATION};
pub use observation::{Observation, Point3};
pub use point::{GridCoord, WorldPoint};
pub use pose::Pose2D;
