//! Axis-aligned bounding box used as the damage-bounds accumulator.
//!
//! During one update cycle every cell write (mark, clear, memory expiry)
//! widens a [`Bounds`]; at the end of the cycle the box tells the costmap
//! owner which rectangle of the master grid must be re-applied. The box is
//! reset to [`Bounds::empty`] at the start of each cycle and only ever grows
//! within it.

use super::point::WorldPoint;

/// Axis-aligned bounding box in world coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Bounds {
    /// Minimum corner (smallest x and y values).
    pub min: WorldPoint,
    /// Maximum corner (largest x and y values).
    pub max: WorldPoint,
}

impl Bounds {
    /// Create a new bounding box from min and max corners.
    #[inline]
    pub const fn new(min: WorldPoint, max: WorldPoint) -> Self {
        Self { min, max }
    }

    /// Create an empty (invalid) bounding box.
    ///
    /// The empty bounds has min > max, so it will expand to fit any point.
    #[inline]
    pub fn empty() -> Self {
        Self {
            min: WorldPoint::new(f32::INFINITY, f32::INFINITY),
            max: WorldPoint::new(f32::NEG_INFINITY, f32::NEG_INFINITY),
        }
    }

    /// Check if the bounds are empty (invalid).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    /// Width of the bounding box (x extent).
    #[inline]
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    /// Height of the bounding box (y extent).
    #[inline]
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    /// Check if a point is inside the bounding box.
    #[inline]
    pub fn contains(&self, point: WorldPoint) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Compute the union of two bounds (smallest box containing both).
    #[inline]
    pub fn union(&self, other: &Bounds) -> Self {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Expand bounds to include a point. Never shrinks.
    #[inline]
    pub fn expand_to_include(&mut self, point: WorldPoint) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Expand bounds by a margin on all sides.
    #[inline]
    pub fn expand(&self, margin: f32) -> Self {
        Self {
            min: WorldPoint::new(self.min.x - margin, self.min.y - margin),
            max: WorldPoint::new(self.max.x + margin, self.max.y + margin),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        let bounds = Bounds::empty();
        assert!(bounds.is_empty());

        let valid = Bounds::new(WorldPoint::new(0.0, 0.0), WorldPoint::new(1.0, 1.0));
        assert!(!valid.is_empty());
    }

    #[test]
    fn test_expand_to_include() {
        let mut bounds = Bounds::empty();

        bounds.expand_to_include(WorldPoint::new(5.0, 5.0));
        assert_eq!(bounds.min, WorldPoint::new(5.0, 5.0));
        assert_eq!(bounds.max, WorldPoint::new(5.0, 5.0));

        bounds.expand_to_include(WorldPoint::new(0.0, 10.0));
        assert_eq!(bounds.min, WorldPoint::new(0.0, 5.0));
        assert_eq!(bounds.max, WorldPoint::new(5.0, 10.0));
    }

    #[test]
    fn test_monotonic_growth() {
        let mut bounds = Bounds::empty();
        let points = [
            WorldPoint::new(1.0, 1.0),
            WorldPoint::new(-2.0, 0.5),
            WorldPoint::new(0.0, 3.0),
            WorldPoint::new(0.5, 0.5),
        ];

        let mut prev = bounds;
        for p in points {
            bounds.expand_to_include(p);
            if !prev.is_empty() {
                assert!(bounds.min.x <= prev.min.x);
                assert!(bounds.min.y <= prev.min.y);
                assert!(bounds.max.x >= prev.max.x);
                assert!(bounds.max.y >= prev.max.y);
            }
            prev = bounds;
        }
    }

    #[test]
    fn test_union() {
        let a = Bounds::new(WorldPoint::new(0.0, 0.0), WorldPoint::new(10.0, 10.0));
        let b = Bounds::new(WorldPoint::new(5.0, 5.0), WorldPoint::new(15.0, 15.0));

        let u = a.union(&b);
        assert_eq!(u.min, WorldPoint::new(0.0, 0.0));
        assert_eq!(u.max, WorldPoint::new(15.0, 15.0));
    }

    #[test]
    fn test_union_with_empty() {
        let a = Bounds::new(WorldPoint::new(0.0, 0.0), WorldPoint::new(10.0, 10.0));
        let empty = Bounds::empty();

        assert_eq!(a.union(&empty), a);
        assert_eq!(empty.union(&a), a);
    }
}
