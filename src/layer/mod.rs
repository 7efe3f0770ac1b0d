//! The obstacle layer: observation buffers, update engines, memory, and
//! the per-tick orchestrator.
//!
//! - [`ObservationBuffer`] / [`SourceHandle`]: rolling per-sensor buffers
//! - [`raycaster`]: Bresenham line walk for freespace raytracing
//! - [`clearing`]: raytrace engine (freespace claiming)
//! - [`marking`]: marking engine (obstacle cells)
//! - [`ObstacleMemory`]: forgetful obstacle memory
//! - [`ObstacleLayer`]: the update orchestrator

mod buffer;
pub mod clearing;
mod config;
pub mod marking;
mod memory;
mod obstacle_layer;
pub mod raycaster;

pub use buffer::{
    IdentityPoseSource, ObservationBuffer, PoseSource, SourceHandle, UnavailablePoseSource,
};
pub use config::{GridGeometry, ObstacleLayerConfig};
pub use memory::{MemoryEntry, ObstacleMemory};
pub use obstacle_layer::{LayerState, ObstacleLayer, UpdateStatus};
