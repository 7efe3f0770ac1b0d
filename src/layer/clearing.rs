//! Freespace raytracing for one clearing observation.
//!
//! For each sensor return, walks the discretized line from the sensor
//! origin to the return and writes [`FREE_SPACE`] to the traversed cells.
//! The origin and endpoint cells themselves are excluded: the endpoint is
//! potentially an obstacle and belongs to the marking engine. Within one
//! cycle clearing runs before marking, so a mark placed in the same cycle
//! always wins over a clearing ray.

use crate::core::{Bounds, GridCoord, Observation, FREE_SPACE};
use crate::grid::Costmap;
use crate::layer::raycaster::BresenhamLine;

/// Clear free space along every ray of one clearing observation.
///
/// Points farther than `raytrace_range` from the origin are clipped to the
/// range along the same bearing, not dropped, so freespace is still claimed
/// up to the limit. Out-of-grid cells are skipped, never an error.
///
/// Every written cell's world coordinates widen `bounds`, and its coordinate
/// is appended to `cleared` so the obstacle memory can forget entries whose
/// cell was directly observed free.
///
/// Returns the number of cells written.
pub fn raytrace_freespace(
    costmap: &mut Costmap,
    observation: &Observation,
    bounds: &mut Bounds,
    cleared: &mut Vec<GridCoord>,
) -> usize {
    let origin = observation.origin;
    let origin_coord = costmap.world_to_grid(origin);
    if !costmap.is_valid_coord(origin_coord) {
        // Cannot anchor a ray walk outside the grid
        log::debug!(
            "skipping clearing observation: sensor origin ({:.2}, {:.2}) outside grid",
            origin.x,
            origin.y
        );
        return 0;
    }

    let range = observation.raytrace_range;
    let mut written = 0;

    // The claimed region always covers the origin, even for empty scans
    bounds.expand_to_include(origin);

    for point in &observation.points {
        let dx = point.x - origin.x;
        let dy = point.y - origin.y;
        let dist = (dx * dx + dy * dy).sqrt();

        // Clip to the raytrace range along the same bearing
        let end = if dist > range && dist > 0.0 {
            let scale = range / dist;
            crate::core::WorldPoint::new(origin.x + dx * scale, origin.y + dy * scale)
        } else {
            point.planar()
        };

        let end_coord = costmap.world_to_grid(end);

        let mut walk = BresenhamLine::new(origin_coord, end_coord).peekable();
        let mut first = true;
        while let Some(coord) = walk.next() {
            let is_last = walk.peek().is_none();
            // Origin and endpoint cells are excluded from the FREE write
            if first || is_last {
                first = false;
                continue;
            }
            if costmap.set_cost(coord, FREE_SPACE) {
                bounds.expand_to_include(costmap.grid_to_world(coord));
                cleared.push(coord);
                written += 1;
            }
        }
    }

    written
}
