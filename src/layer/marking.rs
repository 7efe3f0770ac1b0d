//! Obstacle marking for one marking observation.

use crate::core::{Bounds, GridCoord, Observation, WorldPoint, LETHAL_OBSTACLE};
use crate::grid::Costmap;

/// Mark the cell containing each qualifying point as an obstacle.
///
/// Points taller than `max_obstacle_height` or farther than the
/// observation's `obstacle_range` from its origin are silently skipped
/// (ceiling returns and range noise are expected). Out-of-grid cells are
/// skipped as well.
///
/// Every written cell widens `bounds`; the written (cell, world point)
/// pairs are appended to `marked` for the obstacle-memory pass.
///
/// Returns the number of cells written.
pub fn mark_obstacles(
    costmap: &mut Costmap,
    observation: &Observation,
    max_obstacle_height: f32,
    bounds: &mut Bounds,
    marked: &mut Vec<(GridCoord, WorldPoint)>,
) -> usize {
    let sq_obstacle_range = observation.obstacle_range * observation.obstacle_range;
    let mut written = 0;

    for point in &observation.points {
        if point.z > max_obstacle_height {
            continue;
        }
        let planar = point.planar();
        if planar.distance_squared(&observation.origin) > sq_obstacle_range {
            continue;
        }

        let coord = costmap.world_to_grid(planar);
        if costmap.set_cost(coord, LETHAL_OBSTACLE) {
            bounds.expand_to_include(planar);
            marked.push((coord, planar));
            written += 1;
        }
    }

    written
}
