//! The obstacle layer update orchestrator.
//!
//! [`ObstacleLayer`] owns the layer's private costmap, the observation
//! source list, and the forgetful obstacle memory, and drives the
//! `Idle -> BoundsUpdate -> CostsApply -> Idle` cycle once per external
//! update tick:
//!
//! 1. `update_bounds`: sweep the memory if requested, expire stale
//!    entries, clear the footprint, raytrace clearing observations, mark
//!    marking observations, and fold the touched region into the caller's
//!    damage bounds.
//! 2. `update_costs`: apply the layer's cells to the master grid over the
//!    region the caller derived from those bounds.
//!
//! The cycle runs synchronously on the caller's tick. Control inputs
//! (`activate`, `deactivate`, `set_memory_enabled`, `clear_obstacle_memory`,
//! `set_pose_confidence`) may arrive from a different context and go through
//! one exclusive section; the cycle snapshots them exactly once at its
//! start, so a half-applied control change is never observed mid-cycle.
//!
//! Nothing in the per-cycle path is fatal: a stale buffer only flags the
//! result as conservative, and out-of-grid writes are clipped.

use crate::core::{Bounds, GridCoord, Observation, Pose2D, WorldPoint, FREE_SPACE};
use crate::error::LayerError;
use crate::grid::{CellRegion, Costmap};
use crate::layer::buffer::{ObservationBuffer, SourceHandle};
use crate::layer::clearing::raytrace_freespace;
use crate::layer::config::ObstacleLayerConfig;
use crate::layer::marking::mark_obstacles;
use crate::layer::memory::ObstacleMemory;
use parking_lot::Mutex;

/// Phase of the per-tick update cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LayerState {
    /// Between ticks.
    #[default]
    Idle,
    /// Processing observations and widening the damage bounds.
    BoundsUpdate,
    /// Applying layer costs to the master grid.
    CostsApply,
}

/// Outcome of one `update_bounds` cycle.
#[derive(Clone, Copy, Debug, Default)]
pub struct UpdateStatus {
    /// False when any consulted observation buffer was stale; the claimed
    /// bounds should then be treated conservatively, since missing data
    /// cannot be un-claimed.
    pub all_current: bool,
    /// Cells written `LETHAL_OBSTACLE` this cycle.
    pub cells_marked: usize,
    /// Cells written `FREE_SPACE` by raytracing this cycle.
    pub cells_cleared: usize,
    /// Remembered obstacles expired this cycle.
    pub memory_expired: usize,
}

/// Control inputs that may be flipped from outside the update tick.
#[derive(Debug)]
struct ControlState {
    active: bool,
    memory_enabled: bool,
    clear_memory_requested: bool,
    pose_confidence: f32,
}

/// Observation-driven obstacle layer with optional forgetful memory.
pub struct ObstacleLayer {
    config: ObstacleLayerConfig,
    costmap: Costmap,
    memory: ObstacleMemory,
    sources: Vec<SourceHandle>,
    static_marking: Vec<Observation>,
    static_clearing: Vec<Observation>,
    footprint_cells: Vec<GridCoord>,
    control: Mutex<ControlState>,
    state: LayerState,
}

impl ObstacleLayer {
    /// Create a layer from a validated configuration.
    pub fn new(config: ObstacleLayerConfig) -> Result<Self, LayerError> {
        config.validate()?;
        let costmap = Costmap::new(
            config.grid.width,
            config.grid.height,
            config.grid.resolution,
            config.grid.effective_origin(),
        );
        let memory_enabled = config.use_obstacle_memory;
        Ok(Self {
            config,
            costmap,
            memory: ObstacleMemory::new(),
            sources: Vec::new(),
            static_marking: Vec::new(),
            static_clearing: Vec::new(),
            footprint_cells: Vec::new(),
            control: Mutex::new(ControlState {
                active: true,
                memory_enabled,
                clear_memory_requested: false,
                pose_confidence: 1.0,
            }),
            state: LayerState::Idle,
        })
    }

    /// Current configuration snapshot.
    #[inline]
    pub fn config(&self) -> &ObstacleLayerConfig {
        &self.config
    }

    /// Swap in a new configuration between cycles.
    ///
    /// An invalid configuration is rejected and the prior one stays in
    /// effect. A change of grid geometry rebuilds the costmap and drops
    /// the obstacle memory.
    pub fn set_config(&mut self, config: ObstacleLayerConfig) -> Result<(), LayerError> {
        config.validate()?;

        let geometry_changed = config.grid.width != self.config.grid.width
            || config.grid.height != self.config.grid.height
            || (config.grid.resolution - self.config.grid.resolution).abs() > f32::EPSILON
            || config.grid.effective_origin() != self.config.grid.effective_origin();
        if geometry_changed {
            log::debug!("grid geometry changed, rebuilding layer costmap");
            self.costmap = Costmap::new(
                config.grid.width,
                config.grid.height,
                config.grid.resolution,
                config.grid.effective_origin(),
            );
            self.memory.drop_all();
        }

        self.control.lock().memory_enabled = config.use_obstacle_memory;
        self.config = config;
        Ok(())
    }

    /// Register an observation source.
    pub fn add_source(&mut self, source: SourceHandle) {
        self.sources.push(source);
    }

    /// Build and register a sensor buffer sized from the active
    /// configuration (`obstacle_range`, `raytrace_range`,
    /// `obstacle_queue_size`), returning a handle for the producer side.
    pub fn add_sensor(
        &mut self,
        sensor_frame: impl Into<String>,
        keep_time_us: u64,
        expected_update_interval_us: u64,
        marking: bool,
        clearing: bool,
    ) -> SourceHandle {
        let buffer = ObservationBuffer::new(
            sensor_frame,
            keep_time_us,
            expected_update_interval_us,
            self.config.obstacle_queue_size,
            self.config.obstacle_range,
            self.config.raytrace_range,
        );
        let handle = SourceHandle::new(buffer, marking, clearing);
        self.sources.push(handle.clone());
        handle
    }

    /// Inject a synthetic observation, bypassing the source buffers.
    /// Intended for tests. The observation keeps its own ranges; the
    /// configured range caps do not apply to it.
    pub fn add_static_observation(&mut self, observation: Observation, marking: bool, clearing: bool) {
        if marking {
            self.static_marking.push(observation.clone());
        }
        if clearing {
            self.static_clearing.push(observation);
        }
    }

    /// Drop injected synthetic observations.
    pub fn clear_static_observations(&mut self, marking: bool, clearing: bool) {
        if marking {
            self.static_marking.clear();
        }
        if clearing {
            self.static_clearing.clear();
        }
    }

    /// Provide the current footprint cells to clear when footprint clearing
    /// is enabled. Footprint polygon geometry stays external.
    pub fn set_footprint_cells(&mut self, cells: Vec<GridCoord>) {
        self.footprint_cells = cells;
    }

    /// Resume consuming observations.
    pub fn activate(&self) {
        self.control.lock().active = true;
    }

    /// Suspend consumption. Obstacle memory and layer costs are preserved.
    pub fn deactivate(&self) {
        self.control.lock().active = false;
    }

    /// Is the layer currently active?
    pub fn is_active(&self) -> bool {
        self.control.lock().active
    }

    /// Drop layer costs, obstacle memory, and transient state; keep the
    /// configuration and registered sources.
    pub fn reset(&mut self) {
        self.costmap.reset();
        self.memory.drop_all();
        self.footprint_cells.clear();
        let mut control = self.control.lock();
        control.clear_memory_requested = false;
        self.state = LayerState::Idle;
    }

    /// Enable or disable the obstacle memory.
    pub fn set_memory_enabled(&self, enabled: bool) {
        self.control.lock().memory_enabled = enabled;
    }

    /// Is obstacle memory currently on?
    pub fn is_memory_enabled(&self) -> bool {
        self.control.lock().memory_enabled
    }

    /// Flag the obstacle memory to be swept at the start of the next cycle,
    /// before any new marking.
    pub fn clear_obstacle_memory(&self) {
        self.control.lock().clear_memory_requested = true;
    }

    /// Report the current localization confidence. Below the configured
    /// threshold, marking stops seeding or refreshing memory entries.
    pub fn set_pose_confidence(&self, confidence: f32) {
        self.control.lock().pose_confidence = confidence;
    }

    /// The layer's private costmap (read-only).
    #[inline]
    pub fn costmap(&self) -> &Costmap {
        &self.costmap
    }

    /// The obstacle memory (read-only).
    #[inline]
    pub fn memory(&self) -> &ObstacleMemory {
        &self.memory
    }

    /// Current cycle phase.
    #[inline]
    pub fn state(&self) -> LayerState {
        self.state
    }

    /// Run the BoundsUpdate phase for one tick.
    ///
    /// Widens `bounds` (union, never shrink) with everything this cycle
    /// touched. A deactivated layer is a no-op. Precedence within the
    /// cycle is fixed: memory sweep, then clearing, then marking, so a mark
    /// placed this cycle always survives a clearing ray from this cycle.
    pub fn update_bounds(
        &mut self,
        robot_pose: Pose2D,
        now_us: u64,
        bounds: &mut Bounds,
    ) -> UpdateStatus {
        let (memory_enabled, clear_requested, pose_confidence) = {
            let mut control = self.control.lock();
            if !control.active {
                return UpdateStatus {
                    all_current: true,
                    ..Default::default()
                };
            }
            let clear = control.clear_memory_requested;
            control.clear_memory_requested = false;
            (control.memory_enabled, clear, control.pose_confidence)
        };

        self.state = LayerState::BoundsUpdate;
        let mut status = UpdateStatus {
            all_current: true,
            ..Default::default()
        };
        let mut cycle_bounds = Bounds::empty();
        let robot = robot_pose.position();

        if self.config.rolling_window {
            let new_origin = WorldPoint::new(
                robot.x - (self.costmap.width() as f32 * self.costmap.resolution()) / 2.0,
                robot.y - (self.costmap.height() as f32 * self.costmap.resolution()) / 2.0,
            );
            self.costmap.update_origin(new_origin);
        }

        // Memory sweep comes first: an unconditional clear when requested,
        // then age and keep-radius expiry.
        if clear_requested {
            let cleared = self.memory.clear_all(&mut self.costmap, &mut cycle_bounds);
            log::info!("obstacle memory cleared: {} entries removed", cleared);
        }
        if memory_enabled {
            status.memory_expired = self.memory.sweep(
                &mut self.costmap,
                &mut cycle_bounds,
                now_us,
                self.config.obstacle_lifespan_us(),
                robot,
                self.config.obstacle_keep_radius,
            );
        }

        if self.config.footprint_clearing_enabled {
            for &cell in &self.footprint_cells {
                if self.costmap.set_cost(cell, FREE_SPACE) {
                    cycle_bounds.expand_to_include(self.costmap.grid_to_world(cell));
                    if memory_enabled {
                        // The footprint is directly observed free, same as a
                        // clearing ray
                        self.memory.forget(cell);
                    }
                }
            }
        }

        // Clearing pass
        let clearing = self.collect_observations(now_us, false, &mut status.all_current);
        let mut cleared_cells = Vec::new();
        for observation in &clearing {
            status.cells_cleared += raytrace_freespace(
                &mut self.costmap,
                observation,
                &mut cycle_bounds,
                &mut cleared_cells,
            );
        }
        if memory_enabled {
            // A cell directly observed free is no longer remembered
            for &cell in &cleared_cells {
                self.memory.forget(cell);
            }
        }

        // Marking pass
        let marking = self.collect_observations(now_us, true, &mut status.all_current);
        let remember = memory_enabled && pose_confidence >= self.config.pose_confidence_threshold;
        if memory_enabled && !remember {
            log::trace!(
                "pose confidence {:.2} below threshold {:.2}: marking without memory",
                pose_confidence,
                self.config.pose_confidence_threshold
            );
        }
        let mut marked_cells = Vec::new();
        for observation in &marking {
            marked_cells.clear();
            status.cells_marked += mark_obstacles(
                &mut self.costmap,
                observation,
                self.config.max_obstacle_height,
                &mut cycle_bounds,
                &mut marked_cells,
            );
            if remember {
                for &(cell, point) in &marked_cells {
                    self.memory.observe(
                        &mut self.costmap,
                        &mut cycle_bounds,
                        cell,
                        point,
                        now_us,
                        self.config.obstacle_compare_tolerance,
                    );
                }
            }
        }

        *bounds = bounds.union(&cycle_bounds);
        self.state = LayerState::Idle;
        status
    }

    /// Run the CostsApply phase: copy this layer's cells into the master
    /// grid over `region` using the configured combination method.
    pub fn update_costs(&mut self, master: &mut Costmap, region: CellRegion) {
        if !self.control.lock().active {
            return;
        }
        self.state = LayerState::CostsApply;
        master.merge_region(&self.costmap, region, self.config.combination_method);
        self.state = LayerState::Idle;
    }

    /// Snapshot the currently valid observations of the requested kind.
    fn collect_observations(
        &self,
        now_us: u64,
        marking: bool,
        all_current: &mut bool,
    ) -> Vec<Observation> {
        let mut observations = Vec::new();
        for source in &self.sources {
            let wanted = if marking { source.marking } else { source.clearing };
            if !wanted {
                continue;
            }
            // One lock per buffer: a concurrent append never tears a snapshot
            let mut buffer = source.buffer.lock();
            buffer.set_queue_size(self.config.obstacle_queue_size);
            if !buffer.is_current(now_us) {
                *all_current = false;
            }
            let start = observations.len();
            buffer.current_observations(now_us, &mut observations);
            drop(buffer);

            // The active config caps the ranges an observation was buffered
            // with, so a config swap reaches observations already in flight
            for observation in &mut observations[start..] {
                observation.obstacle_range =
                    observation.obstacle_range.min(self.config.obstacle_range);
                observation.raytrace_range =
                    observation.raytrace_range.min(self.config.raytrace_range);
            }
        }
        let statics = if marking {
            &self.static_marking
        } else {
            &self.static_clearing
        };
        observations.extend(statics.iter().cloned());
        observations
    }
}
