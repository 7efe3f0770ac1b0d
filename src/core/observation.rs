//! Sensor observation value type.
//!
//! An [`Observation`] is produced by the external sensor-ingest boundary,
//! one per sensor message, with its points already expressed in the layer's
//! reference frame. It is consumed read-only once per update cycle and never
//! mutated.

use super::point::WorldPoint;

/// A single 3D point in the layer's reference frame (meters).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point3 {
    /// X coordinate in meters
    pub x: f32,
    /// Y coordinate in meters
    pub y: f32,
    /// Z coordinate in meters (height above the grid plane)
    pub z: f32,
}

impl Point3 {
    /// Create a new point
    #[inline]
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Planar (x, y) projection of the point.
    #[inline]
    pub fn planar(&self) -> WorldPoint {
        WorldPoint::new(self.x, self.y)
    }
}

/// A timestamped set of ranged-sensor returns with a known sensor origin.
#[derive(Clone, Debug)]
pub struct Observation {
    /// Sensor origin in the layer's reference frame.
    pub origin: WorldPoint,
    /// Sensor returns, already transformed into the layer's reference frame.
    pub points: Vec<Point3>,
    /// Maximum distance at which a point is trusted as a real obstacle (meters).
    pub obstacle_range: f32,
    /// Maximum distance along a ray considered reliably known free (meters).
    pub raytrace_range: f32,
    /// Monotonic capture time in microseconds.
    pub timestamp_us: u64,
}

impl Observation {
    /// Create a new observation.
    pub fn new(
        origin: WorldPoint,
        points: Vec<Point3>,
        obstacle_range: f32,
        raytrace_range: f32,
        timestamp_us: u64,
    ) -> Self {
        Self {
            origin,
            points,
            obstacle_range,
            raytrace_range,
            timestamp_us,
        }
    }

    /// Number of points in the observation.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Is the observation empty?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_planar_projection() {
        let p = Point3::new(1.0, 2.0, 3.0);
        assert_eq!(p.planar(), WorldPoint::new(1.0, 2.0));
    }

    #[test]
    fn test_observation_len() {
        let obs = Observation::new(
            WorldPoint::ZERO,
            vec![Point3::new(1.0, 0.0, 0.1), Point3::new(2.0, 0.0, 0.1)],
            2.5,
            3.0,
            1_000_000,
        );
        assert_eq!(obs.len(), 2);
        assert!(!obs.is_empty());
    }
}
