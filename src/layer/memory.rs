//! Forgetful obstacle memory.
//!
//! A sparse map from grid-cell identity to the last-seen time and world
//! position of the obstacle marked there. It keeps obstacles visible across
//! update cycles after their originating observation has aged out of its
//! buffer, while still letting vanished obstacles be forgotten:
//!
//! - entries expire after `obstacle_lifespan` and their cells are re-cleared
//! - entries farther than the keep radius from the robot are expired early,
//!   bounding memory growth independent of time
//! - a re-marked obstacle whose position moved more than the compare
//!   tolerance is treated as the same obstacle having moved: the old pixel
//!   is re-cleared and exactly one entry survives
//!
//! The stored world position is authoritative for re-clearing: under a
//! rolling window the cell key a position was filed under can drift, so
//! expiry always recomputes the current cell from the world coordinates.

use crate::core::{Bounds, GridCoord, WorldPoint, FREE_SPACE};
use crate::grid::Costmap;
use std::collections::HashMap;

/// Last-seen record for one remembered obstacle cell.
#[derive(Clone, Copy, Debug)]
pub struct MemoryEntry {
    /// Monotonic time the cell was last marked, microseconds.
    pub last_seen_us: u64,
    /// World position of the marking point.
    pub position: WorldPoint,
}

/// Sparse cell-keyed store of remembered obstacles.
#[derive(Debug, Default)]
pub struct ObstacleMemory {
    entries: HashMap<u64, MemoryEntry>,
}

impl ObstacleMemory {
    /// Create an empty memory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of remembered cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Is the memory empty?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry for a cell, if remembered.
    #[inline]
    pub fn entry(&self, cell: GridCoord) -> Option<&MemoryEntry> {
        self.entries.get(&cell.packed())
    }

    /// Iterate remembered cells and their entries.
    pub fn iter(&self) -> impl Iterator<Item = (GridCoord, &MemoryEntry)> {
        self.entries
            .iter()
            .map(|(&key, entry)| (GridCoord::from_packed(key), entry))
    }

    /// Record a marking at `cell` / `point`, reconciling against what is
    /// already remembered there.
    ///
    /// - Same cell, position within `tolerance`: refresh, the obstacle has
    ///   not moved.
    /// - Same cell, position moved more than `tolerance`: the old position's
    ///   current cell is re-cleared when it differs from `cell` (the key can
    ///   drift under a rolling window) and the entry is replaced.
    /// - No entry at `cell` but a neighboring entry within `tolerance` of
    ///   the new point: the same obstacle jittered across a cell boundary;
    ///   the neighbor entry is moved here instead of duplicated, and its old
    ///   pixel re-cleared.
    pub fn observe(
        &mut self,
        costmap: &mut Costmap,
        bounds: &mut Bounds,
        cell: GridCoord,
        point: WorldPoint,
        now_us: u64,
        tolerance: f32,
    ) {
        let key = cell.packed();

        if let Some(existing) = self.entries.get(&key).copied() {
            if existing.position.distance(&point) > tolerance {
                let old_cell = costmap.world_to_grid(existing.position);
                if old_cell != cell {
                    costmap.set_cost(old_cell, FREE_SPACE);
                    bounds.expand_to_include(existing.position);
                    self.entries.remove(&old_cell.packed());
                }
            }
            self.entries.insert(
                key,
                MemoryEntry {
                    last_seen_us: now_us,
                    position: point,
                },
            );
            return;
        }

        // Cross-boundary jitter: one obstacle must never hold two entries
        for neighbor in cell.neighbors_8() {
            let neighbor_key = neighbor.packed();
            if let Some(existing) = self.entries.get(&neighbor_key).copied() {
                if existing.position.distance(&point) <= tolerance {
                    let old_cell = costmap.world_to_grid(existing.position);
                    if old_cell != cell {
                        costmap.set_cost(old_cell, FREE_SPACE);
                        bounds.expand_to_include(existing.position);
                    }
                    self.entries.remove(&neighbor_key);
                    break;
                }
            }
        }

        self.entries.insert(
            key,
            MemoryEntry {
                last_seen_us: now_us,
                position: point,
            },
        );
    }

    /// Expire entries past the lifespan or beyond the keep radius.
    ///
    /// Each expired entry's cell is re-cleared and `bounds` widened.
    /// Returns the number of entries expired.
    pub fn sweep(
        &mut self,
        costmap: &mut Costmap,
        bounds: &mut Bounds,
        now_us: u64,
        lifespan_us: u64,
        robot: WorldPoint,
        keep_radius: f32,
    ) -> usize {
        let sq_keep_radius = keep_radius * keep_radius;
        let expired: Vec<(u64, WorldPoint)> = self
            .entries
            .iter()
            .filter(|(_, entry)| {
                now_us.saturating_sub(entry.last_seen_us) > lifespan_us
                    || entry.position.distance_squared(&robot) > sq_keep_radius
            })
            .map(|(&key, entry)| (key, entry.position))
            .collect();

        for (key, position) in &expired {
            let coord = costmap.world_to_grid(*position);
            costmap.set_cost(coord, FREE_SPACE);
            bounds.expand_to_include(*position);
            self.entries.remove(key);
        }

        if !expired.is_empty() {
            log::debug!("expired {} remembered obstacles", expired.len());
        }
        expired.len()
    }

    /// Remove every entry and re-clear its cell.
    ///
    /// This is the deferred `clear_obstacle_memory` sweep, run at the start
    /// of a cycle before any new marking.
    pub fn clear_all(&mut self, costmap: &mut Costmap, bounds: &mut Bounds) -> usize {
        let count = self.entries.len();
        for entry in self.entries.values() {
            let coord = costmap.world_to_grid(entry.position);
            costmap.set_cost(coord, FREE_SPACE);
            bounds.expand_to_include(entry.position);
        }
        self.entries.clear();
        count
    }

    /// Drop the entry at a cell without touching the grid.
    ///
    /// Used when a clearing ray has already observed the cell free.
    #[inline]
    pub fn forget(&mut self, cell: GridCoord) {
        self.entries.remove(&cell.packed());
    }

    /// Drop all entries without touching the grid (used by `reset`).
    pub fn drop_all(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LETHAL_OBSTACLE, NO_INFORMATION};

    const SEC: u64 = 1_000_000;
    const TOLERANCE: f32 = 0.02;

    fn test_costmap() -> Costmap {
        Costmap::centered(200, 200, 0.05)
    }

    fn mark(costmap: &mut Costmap, point: WorldPoint) -> GridCoord {
        let cell = costmap.world_to_grid(point);
        costmap.set_cost(cell, LETHAL_OBSTACLE);
        cell
    }

    #[test]
    fn test_observe_creates_and_refreshes_single_entry() {
        let mut memory = ObstacleMemory::new();
        let mut costmap = test_costmap();
        let mut bounds = Bounds::empty();

        let p = WorldPoint::new(1.0, 1.0);
        let cell = mark(&mut costmap, p);
        memory.observe(&mut costmap, &mut bounds, cell, p, SEC, TOLERANCE);
        assert_eq!(memory.len(), 1);
        assert_eq!(memory.entry(cell).unwrap().last_seen_us, SEC);

        // Re-mark within tolerance: refreshed, not duplicated
        memory.observe(&mut costmap, &mut bounds, cell, p, 2 * SEC, TOLERANCE);
        assert_eq!(memory.len(), 1);
        assert_eq!(memory.entry(cell).unwrap().last_seen_us, 2 * SEC);
    }

    #[test]
    fn test_expiry_at_lifespan_not_before() {
        let mut memory = ObstacleMemory::new();
        let mut costmap = test_costmap();
        let mut bounds = Bounds::empty();

        let p = WorldPoint::new(1.0, 1.0);
        let cell = mark(&mut costmap, p);
        memory.observe(&mut costmap, &mut bounds, cell, p, SEC, TOLERANCE);

        let lifespan = 10 * SEC;

        // Just inside the lifespan: kept
        let expired = memory.sweep(
            &mut costmap,
            &mut bounds,
            SEC + lifespan,
            lifespan,
            WorldPoint::ZERO,
            100.0,
        );
        assert_eq!(expired, 0);
        assert_eq!(costmap.cost(cell), LETHAL_OBSTACLE);

        // Past the lifespan: expired and re-cleared
        let expired = memory.sweep(
            &mut costmap,
            &mut bounds,
            SEC + lifespan + 1,
            lifespan,
            WorldPoint::ZERO,
            100.0,
        );
        assert_eq!(expired, 1);
        assert!(memory.is_empty());
        assert_eq!(costmap.cost(cell), FREE_SPACE);
    }

    #[test]
    fn test_keep_radius_expires_distant_entries_early() {
        let mut memory = ObstacleMemory::new();
        let mut costmap = test_costmap();
        let mut bounds = Bounds::empty();

        let near = WorldPoint::new(0.5, 0.0);
        let far = WorldPoint::new(4.0, 0.0);
        let near_cell = mark(&mut costmap, near);
        let far_cell = mark(&mut costmap, far);
        memory.observe(&mut costmap, &mut bounds, near_cell, near, SEC, TOLERANCE);
        memory.observe(&mut costmap, &mut bounds, far_cell, far, SEC, TOLERANCE);

        // Fresh entries, but the far one is outside the 2m keep radius
        let expired = memory.sweep(
            &mut costmap,
            &mut bounds,
            SEC + 1,
            100 * SEC,
            WorldPoint::ZERO,
            2.0,
        );
        assert_eq!(expired, 1);
        assert!(memory.entry(near_cell).is_some());
        assert!(memory.entry(far_cell).is_none());
        assert_eq!(costmap.cost(far_cell), FREE_SPACE);
    }

    #[test]
    fn test_move_reconciliation_within_cell() {
        // Tolerance below the resolution: two positions in one cell can be
        // farther apart than the tolerance
        let mut memory = ObstacleMemory::new();
        let mut costmap = test_costmap();
        let mut bounds = Bounds::empty();

        let p1 = WorldPoint::new(1.001, 1.001);
        let p2 = WorldPoint::new(1.041, 1.041);
        let cell = costmap.world_to_grid(p1);
        assert_eq!(cell, costmap.world_to_grid(p2));
        assert!(p1.distance(&p2) > TOLERANCE);

        mark(&mut costmap, p1);
        memory.observe(&mut costmap, &mut bounds, cell, p1, SEC, TOLERANCE);
        memory.observe(&mut costmap, &mut bounds, cell, p2, 2 * SEC, TOLERANCE);

        // Exactly one entry, carrying the new position
        assert_eq!(memory.len(), 1);
        let entry = memory.entry(cell).unwrap();
        assert_eq!(entry.last_seen_us, 2 * SEC);
        assert!((entry.position.x - p2.x).abs() < 1e-6);
    }

    #[test]
    fn test_jitter_across_cell_boundary_moves_entry() {
        let mut memory = ObstacleMemory::new();
        let mut costmap = test_costmap();
        let mut bounds = Bounds::empty();

        // Two readings of one obstacle straddling a 5cm cell boundary,
        // closer together than the tolerance
        let p1 = WorldPoint::new(1.049, 1.0);
        let p2 = WorldPoint::new(1.051, 1.0);
        let c1 = costmap.world_to_grid(p1);
        let c2 = costmap.world_to_grid(p2);
        assert_ne!(c1, c2);
        assert!(p1.distance(&p2) <= TOLERANCE);

        mark(&mut costmap, p1);
        memory.observe(&mut costmap, &mut bounds, c1, p1, SEC, TOLERANCE);
        mark(&mut costmap, p2);
        memory.observe(&mut costmap, &mut bounds, c2, p2, 2 * SEC, TOLERANCE);

        // Never two concurrent entries for one obstacle
        assert_eq!(memory.len(), 1);
        assert!(memory.entry(c1).is_none());
        assert!(memory.entry(c2).is_some());
        // The stale pixel was re-cleared
        assert_eq!(costmap.cost(c1), FREE_SPACE);
        assert_eq!(costmap.cost(c2), LETHAL_OBSTACLE);
    }

    #[test]
    fn test_rolling_origin_drift_reclears_old_pixel() {
        let mut memory = ObstacleMemory::new();
        let mut costmap = test_costmap();
        let mut bounds = Bounds::empty();

        let p1 = WorldPoint::new(1.0, 1.0);
        let cell = mark(&mut costmap, p1);
        memory.observe(&mut costmap, &mut bounds, cell, p1, SEC, TOLERANCE);

        // Roll the window; the stored position now lives in a different cell
        // than its key
        costmap.update_origin(WorldPoint::new(-4.9, -4.9));
        let drifted_cell = costmap.world_to_grid(p1);
        assert_ne!(drifted_cell, cell);
        assert_eq!(costmap.cost(drifted_cell), LETHAL_OBSTACLE);

        // A new reading files under the old key but far from the stored
        // position: the drifted pixel is re-cleared
        let p2 = costmap.grid_to_world(cell);
        assert!(p2.distance(&p1) > TOLERANCE);
        memory.observe(&mut costmap, &mut bounds, cell, p2, 2 * SEC, TOLERANCE);

        assert_eq!(costmap.cost(drifted_cell), FREE_SPACE);
        assert_eq!(memory.len(), 1);
    }

    #[test]
    fn test_clear_all_reclears_every_cell() {
        let mut memory = ObstacleMemory::new();
        let mut costmap = test_costmap();
        let mut bounds = Bounds::empty();

        for i in 0..5 {
            let p = WorldPoint::new(i as f32 * 0.5, 0.0);
            let cell = mark(&mut costmap, p);
            memory.observe(&mut costmap, &mut bounds, cell, p, SEC, TOLERANCE);
        }
        assert_eq!(memory.len(), 5);

        let cleared = memory.clear_all(&mut costmap, &mut bounds);
        assert_eq!(cleared, 5);
        assert!(memory.is_empty());
        for i in 0..5 {
            let p = WorldPoint::new(i as f32 * 0.5, 0.0);
            assert_eq!(costmap.cost_world(p), FREE_SPACE);
        }
    }

    #[test]
    fn test_forget_leaves_grid_untouched() {
        let mut memory = ObstacleMemory::new();
        let mut costmap = test_costmap();
        let mut bounds = Bounds::empty();

        let p = WorldPoint::new(1.0, 0.0);
        let cell = mark(&mut costmap, p);
        memory.observe(&mut costmap, &mut bounds, cell, p, SEC, TOLERANCE);

        memory.forget(cell);
        assert!(memory.is_empty());
        assert_eq!(costmap.cost(cell), LETHAL_OBSTACLE);

        let other = costmap.world_to_grid(WorldPoint::new(2.0, 2.0));
        assert_eq!(costmap.cost(other), NO_INFORMATION);
    }
}
