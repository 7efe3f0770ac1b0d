//! Dense byte-cost grid storage.
//!
//! [`Costmap`] is both the layer's private cost array and the shape of the
//! master grid it merges into. The grid uses a coordinate system where:
//! - Cell (0, 0) starts at `origin` in world coordinates
//! - Cell (x, y) covers the area from `origin + x*resolution` to
//!   `origin + (x+1)*resolution`
//!
//! All cells start at [`NO_INFORMATION`]; the obstacle layer only ever
//! writes [`FREE_SPACE`] or [`LETHAL_OBSTACLE`].

use crate::core::{Bounds, CombinationMethod, GridCoord, WorldPoint, NO_INFORMATION};

/// An inclusive rectangle of grid cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellRegion {
    /// Minimum corner (inclusive).
    pub min: GridCoord,
    /// Maximum corner (inclusive).
    pub max: GridCoord,
}

impl CellRegion {
    /// Create a region from two inclusive corners.
    #[inline]
    pub fn new(min: GridCoord, max: GridCoord) -> Self {
        Self { min, max }
    }

    /// Is the region empty (inverted corners)?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }
}

/// 2D grid of byte costs.
#[derive(Clone, Debug)]
pub struct Costmap {
    costs: Vec<u8>,
    width: usize,
    height: usize,
    resolution: f32,
    origin: WorldPoint,
    default_cost: u8,
}

impl Costmap {
    /// Create a new grid with every cell at `NO_INFORMATION`.
    pub fn new(width: usize, height: usize, resolution: f32, origin: WorldPoint) -> Self {
        Self::with_default(width, height, resolution, origin, NO_INFORMATION)
    }

    /// Create a new grid filled with a given default cost.
    pub fn with_default(
        width: usize,
        height: usize,
        resolution: f32,
        origin: WorldPoint,
        default_cost: u8,
    ) -> Self {
        Self {
            costs: vec![default_cost; width * height],
            width,
            height,
            resolution,
            origin,
            default_cost,
        }
    }

    /// Create a grid centered at the world origin.
    pub fn centered(width: usize, height: usize, resolution: f32) -> Self {
        let half_width = (width as f32 * resolution) / 2.0;
        let half_height = (height as f32 * resolution) / 2.0;
        let origin = WorldPoint::new(-half_width, -half_height);
        Self::new(width, height, resolution, origin)
    }

    /// Grid width in cells
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid height in cells
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Resolution in meters per cell
    #[inline]
    pub fn resolution(&self) -> f32 {
        self.resolution
    }

    /// World coordinates of cell (0, 0)
    #[inline]
    pub fn origin(&self) -> WorldPoint {
        self.origin
    }

    /// Convert world coordinates to grid coordinates
    #[inline]
    pub fn world_to_grid(&self, point: WorldPoint) -> GridCoord {
        let x = ((point.x - self.origin.x) / self.resolution).floor() as i32;
        let y = ((point.y - self.origin.y) / self.resolution).floor() as i32;
        GridCoord::new(x, y)
    }

    /// Convert grid coordinates to world coordinates (cell center)
    #[inline]
    pub fn grid_to_world(&self, coord: GridCoord) -> WorldPoint {
        WorldPoint::new(
            self.origin.x + (coord.x as f32 + 0.5) * self.resolution,
            self.origin.y + (coord.y as f32 + 0.5) * self.resolution,
        )
    }

    /// Check if grid coordinates are within bounds
    #[inline]
    pub fn is_valid_coord(&self, coord: GridCoord) -> bool {
        coord.x >= 0
            && coord.y >= 0
            && (coord.x as usize) < self.width
            && (coord.y as usize) < self.height
    }

    /// Convert grid coordinates to flat array index
    #[inline]
    pub fn coord_to_index(&self, coord: GridCoord) -> Option<usize> {
        if self.is_valid_coord(coord) {
            Some(coord.y as usize * self.width + coord.x as usize)
        } else {
            None
        }
    }

    /// Get the cost at grid coordinates. Out-of-bounds reads `NO_INFORMATION`.
    #[inline]
    pub fn cost(&self, coord: GridCoord) -> u8 {
        self.coord_to_index(coord)
            .map(|i| self.costs[i])
            .unwrap_or(NO_INFORMATION)
    }

    /// Get the cost at world coordinates.
    #[inline]
    pub fn cost_world(&self, point: WorldPoint) -> u8 {
        self.cost(self.world_to_grid(point))
    }

    /// Set the cost at grid coordinates.
    /// Returns false (no-op) for out-of-bounds coordinates.
    #[inline]
    pub fn set_cost(&mut self, coord: GridCoord, cost: u8) -> bool {
        if let Some(i) = self.coord_to_index(coord) {
            self.costs[i] = cost;
            true
        } else {
            false
        }
    }

    /// Reset every cell to the default cost.
    pub fn reset(&mut self) {
        self.costs.fill(self.default_cost);
    }

    /// Raw access to the cost array.
    #[inline]
    pub fn costs(&self) -> &[u8] {
        &self.costs
    }

    /// Clamp a world-coordinate bounding box to a valid cell region.
    ///
    /// Returns an empty region when the bounds do not overlap the grid.
    pub fn region_for_bounds(&self, bounds: &Bounds) -> CellRegion {
        if bounds.is_empty() {
            return CellRegion::new(GridCoord::new(0, -1), GridCoord::new(0, -2));
        }
        let lo = self.world_to_grid(bounds.min);
        let hi = self.world_to_grid(bounds.max);
        CellRegion::new(
            GridCoord::new(lo.x.max(0), lo.y.max(0)),
            GridCoord::new(
                hi.x.min(self.width as i32 - 1),
                hi.y.min(self.height as i32 - 1),
            ),
        )
    }

    /// Move the grid window so its lower-left corner sits at `new_origin`,
    /// snapped to whole cells.
    ///
    /// Cell data in the overlapping area is preserved (world positions keep
    /// their costs); cells that scroll into view start at the default cost.
    /// Used by the rolling-window mode to keep the robot inside the grid.
    pub fn update_origin(&mut self, new_origin: WorldPoint) {
        // Snap the shift to whole cells so world_to_grid stays exact
        let cell_dx = ((new_origin.x - self.origin.x) / self.resolution).round() as i32;
        let cell_dy = ((new_origin.y - self.origin.y) / self.resolution).round() as i32;
        if cell_dx == 0 && cell_dy == 0 {
            return;
        }

        let mut new_costs = vec![self.default_cost; self.width * self.height];

        // Overlap region in old-grid coordinates
        let src_x0 = cell_dx.max(0);
        let src_y0 = cell_dy.max(0);
        let src_x1 = (self.width as i32 + cell_dx.min(0)).min(self.width as i32);
        let src_y1 = (self.height as i32 + cell_dy.min(0)).min(self.height as i32);

        if src_x0 < src_x1 && src_y0 < src_y1 {
            let row_len = (src_x1 - src_x0) as usize;
            for y in src_y0..src_y1 {
                let old_start = y as usize * self.width + src_x0 as usize;
                let new_y = (y - cell_dy) as usize;
                let new_start = new_y * self.width + (src_x0 - cell_dx) as usize;
                new_costs[new_start..new_start + row_len]
                    .copy_from_slice(&self.costs[old_start..old_start + row_len]);
            }
        }

        self.costs = new_costs;
        self.origin = WorldPoint::new(
            self.origin.x + cell_dx as f32 * self.resolution,
            self.origin.y + cell_dy as f32 * self.resolution,
        );
    }

    /// Apply a layer's costs to this (master) grid over a cell region.
    ///
    /// Both grids must share geometry (dimensions, resolution, origin);
    /// `NO_INFORMATION` layer cells never touch the master.
    pub fn merge_region(&mut self, layer: &Costmap, region: CellRegion, method: CombinationMethod) {
        debug_assert_eq!(self.width, layer.width);
        debug_assert_eq!(self.height, layer.height);

        if region.is_empty() {
            return;
        }
        let min_x = region.min.x.max(0) as usize;
        let min_y = region.min.y.max(0) as usize;
        let max_x = (region.max.x.min(self.width as i32 - 1)).max(-1);
        let max_y = (region.max.y.min(self.height as i32 - 1)).max(-1);
        if max_x < 0 || max_y < 0 {
            return;
        }

        for y in min_y..=max_y as usize {
            let row = y * self.width;
            for x in min_x..=max_x as usize {
                let i = row + x;
                self.costs[i] = method.combine(self.costs[i], layer.costs[i]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FREE_SPACE, LETHAL_OBSTACLE};

    #[test]
    fn test_grid_creation() {
        let grid = Costmap::new(100, 100, 0.05, WorldPoint::ZERO);
        assert_eq!(grid.width(), 100);
        assert_eq!(grid.height(), 100);
        assert_eq!(grid.cost(GridCoord::new(50, 50)), NO_INFORMATION);
    }

    #[test]
    fn test_world_to_grid_conversion() {
        let grid = Costmap::new(100, 100, 0.05, WorldPoint::ZERO);

        assert_eq!(
            grid.world_to_grid(WorldPoint::new(0.0, 0.0)),
            GridCoord::new(0, 0)
        );
        // 1 meter is 20 cells at 5cm resolution
        assert_eq!(
            grid.world_to_grid(WorldPoint::new(1.0, 1.0)),
            GridCoord::new(20, 20)
        );
    }

    #[test]
    fn test_grid_to_world_is_cell_center() {
        let grid = Costmap::new(100, 100, 0.05, WorldPoint::ZERO);
        let p = grid.grid_to_world(GridCoord::new(0, 0));
        assert!((p.x - 0.025).abs() < 1e-6);
        assert!((p.y - 0.025).abs() < 1e-6);
    }

    #[test]
    fn test_set_cost_out_of_bounds_is_clipped() {
        let mut grid = Costmap::new(10, 10, 0.1, WorldPoint::ZERO);
        assert!(!grid.set_cost(GridCoord::new(100, 100), LETHAL_OBSTACLE));
        assert!(!grid.set_cost(GridCoord::new(-1, 3), LETHAL_OBSTACLE));
        assert_eq!(grid.cost(GridCoord::new(100, 100)), NO_INFORMATION);
    }

    #[test]
    fn test_region_for_bounds_clamps() {
        let grid = Costmap::new(10, 10, 0.1, WorldPoint::ZERO);
        let bounds = Bounds::new(WorldPoint::new(-1.0, 0.35), WorldPoint::new(5.0, 0.55));
        let region = grid.region_for_bounds(&bounds);
        assert_eq!(region.min, GridCoord::new(0, 3));
        assert_eq!(region.max, GridCoord::new(9, 5));

        assert!(grid.region_for_bounds(&Bounds::empty()).is_empty());
    }

    #[test]
    fn test_update_origin_preserves_world_costs() {
        let mut grid = Costmap::new(10, 10, 0.1, WorldPoint::ZERO);
        let p = WorldPoint::new(0.55, 0.55);
        grid.set_cost(grid.world_to_grid(p), LETHAL_OBSTACLE);

        grid.update_origin(WorldPoint::new(0.2, 0.2));

        // Same world position still reads the same cost
        assert_eq!(grid.cost_world(p), LETHAL_OBSTACLE);
        // Newly exposed cells come in as NO_INFORMATION
        assert_eq!(grid.cost_world(WorldPoint::new(1.15, 1.15)), NO_INFORMATION);
    }

    #[test]
    fn test_merge_region_overwrite_and_max() {
        let mut master = Costmap::with_default(10, 10, 0.1, WorldPoint::ZERO, 100);
        let mut layer = Costmap::new(10, 10, 0.1, WorldPoint::ZERO);
        layer.set_cost(GridCoord::new(2, 2), FREE_SPACE);
        layer.set_cost(GridCoord::new(3, 3), LETHAL_OBSTACLE);

        let region = CellRegion::new(GridCoord::new(0, 0), GridCoord::new(9, 9));

        let mut overwrite = master.clone();
        overwrite.merge_region(&layer, region, CombinationMethod::Overwrite);
        assert_eq!(overwrite.cost(GridCoord::new(2, 2)), FREE_SPACE);
        assert_eq!(overwrite.cost(GridCoord::new(3, 3)), LETHAL_OBSTACLE);
        // Untouched layer cells leave the master alone
        assert_eq!(overwrite.cost(GridCoord::new(5, 5)), 100);

        master.merge_region(&layer, region, CombinationMethod::Maximum);
        // FREE never downgrades an existing master cost under Maximum
        assert_eq!(master.cost(GridCoord::new(2, 2)), 100);
        assert_eq!(master.cost(GridCoord::new(3, 3)), LETHAL_OBSTACLE);
    }
}
