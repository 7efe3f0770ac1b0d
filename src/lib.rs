//! # Vighna-Layer: Observation-Driven Obstacle Layer
//!
//! A 2D occupancy-grid layer that fuses streaming ranged-sensor
//! observations into marked (occupied) and cleared (free) cells, with an
//! optional time-decayed memory of previously seen obstacles. It turns raw
//! perception data into a bounded, incrementally-updatable map suitable for
//! merging into a larger multi-layer costmap.
//!
//! ## Quick Start
//!
//! ```rust
//! use vighna_layer::core::{Bounds, Observation, Point3, Pose2D, WorldPoint};
//! use vighna_layer::grid::Costmap;
//! use vighna_layer::layer::{ObstacleLayer, ObstacleLayerConfig};
//!
//! let mut layer = ObstacleLayer::new(ObstacleLayerConfig::default()).unwrap();
//!
//! // Inject a synthetic observation (normally sensors feed SourceHandles)
//! let obs = Observation::new(
//!     WorldPoint::ZERO,
//!     vec![Point3::new(1.0, 0.0, 0.2)],
//!     2.5, // obstacle range
//!     3.0, // raytrace range
//!     0,
//! );
//! layer.add_static_observation(obs, true, true);
//!
//! // One update tick: widen the damage bounds, then apply to a master grid
//! let mut bounds = Bounds::empty();
//! let status = layer.update_bounds(Pose2D::identity(), 0, &mut bounds);
//! assert!(status.all_current);
//!
//! let geometry = &layer.config().grid;
//! let mut master = Costmap::new(
//!     geometry.width,
//!     geometry.height,
//!     geometry.resolution,
//!     geometry.effective_origin(),
//! );
//! let region = master.region_for_bounds(&bounds);
//! layer.update_costs(&mut master, region);
//! ```
//!
//! ## Update Cycle
//!
//! One external tick drives `Idle -> BoundsUpdate -> CostsApply -> Idle`:
//!
//! ```text
//!   sensor callbacks            update tick (caller's loop)
//!        |                              |
//!        v                              v
//!  [ObservationBuffer]  --snapshot-->  update_bounds(robot, now, &mut bounds)
//!   (per sensor, Mutex)                   memory sweep -> clearing -> marking
//!                                      update_costs(master, region)
//!                                         overwrite | max combination
//! ```
//!
//! Within one cycle clearing runs before marking, so marking always has
//! priority; memory expiry runs before both. Nothing in the cycle is fatal:
//! stale buffers only flag the result as conservative, out-of-grid writes
//! are clipped.
//!
//! ## Coordinate Frame
//!
//! All coordinates follow the ROS REP-103 convention: X-forward, Y-left,
//! counter-clockwise positive rotation. Observations arrive with points
//! already expressed in the layer's reference frame.

pub mod core;
pub mod error;
pub mod grid;
pub mod layer;

pub use error::{LayerError, Result};
pub use layer::{ObstacleLayer, ObstacleLayerConfig};
