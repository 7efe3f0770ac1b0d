//! Byte-cost grid storage.
//!
//! - [`Costmap`]: dense cost grid with world/grid coordinate conversion,
//!   rolling-window origin updates, and region merging
//! - [`CellRegion`]: an inclusive cell rectangle delimiting a merge

mod storage;

pub use storage::{CellRegion, Costmap};
