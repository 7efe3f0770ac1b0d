//! Rolling per-sensor observation buffers.
//!
//! Each physical sensor feeds one [`ObservationBuffer`]; the orchestrator
//! iterates a list of [`SourceHandle`]s without caring about the concrete
//! sensor type. Producers append on their own callback context, so each
//! buffer lives behind `parking_lot::Mutex` and the orchestrator's read of
//! "current observations" takes the lock once per buffer for a consistent
//! snapshot.

use crate::core::{Observation, Point3, Pose2D, WorldPoint};
use crate::error::{LayerError, Result};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Resolves the rigid transform between a sensor frame and the layer's
/// reference frame at a given time.
///
/// Supplied by an external transform service; a lookup failure excludes the
/// observation being buffered, never the update cycle.
pub trait PoseSource {
    /// World pose of `frame` at time `at_us`, or [`LayerError::TransformUnavailable`].
    fn world_pose_of(&self, frame: &str, at_us: u64) -> Result<Pose2D>;
}

/// Rolling buffer of recent observations for one sensor.
#[derive(Debug)]
pub struct ObservationBuffer {
    observations: VecDeque<Observation>,
    sensor_frame: String,
    /// Observations older than this are dropped (0 = keep only the latest)
    keep_time_us: u64,
    /// The buffer is stale if no observation arrived within this window
    /// (0 = never stale)
    expected_update_interval_us: u64,
    queue_size: usize,
    obstacle_range: f32,
    raytrace_range: f32,
    last_updated_us: u64,
}

impl ObservationBuffer {
    /// Create a new buffer for one sensor.
    pub fn new(
        sensor_frame: impl Into<String>,
        keep_time_us: u64,
        expected_update_interval_us: u64,
        queue_size: usize,
        obstacle_range: f32,
        raytrace_range: f32,
    ) -> Self {
        Self {
            observations: VecDeque::new(),
            sensor_frame: sensor_frame.into(),
            keep_time_us,
            expected_update_interval_us,
            queue_size: queue_size.max(1),
            obstacle_range,
            raytrace_range,
            last_updated_us: 0,
        }
    }

    /// Sensor frame this buffer ingests from.
    #[inline]
    pub fn sensor_frame(&self) -> &str {
        &self.sensor_frame
    }

    /// Change the queue bound; takes effect at the next trim.
    #[inline]
    pub fn set_queue_size(&mut self, queue_size: usize) {
        self.queue_size = queue_size.max(1);
    }

    /// Append an observation whose points are already in the layer frame.
    pub fn buffer_observation(&mut self, origin: WorldPoint, points: Vec<Point3>, now_us: u64) {
        self.observations.push_front(Observation::new(
            origin,
            points,
            self.obstacle_range,
            self.raytrace_range,
            now_us,
        ));
        self.last_updated_us = now_us;
        self.trim(now_us);
    }

    /// Append a point cloud still expressed in the sensor frame, resolving
    /// the sensor pose through `tf`.
    ///
    /// Fails with [`LayerError::TransformUnavailable`] when the transform
    /// cannot be resolved; the buffer is left unchanged.
    pub fn buffer_cloud(
        &mut self,
        points: &[Point3],
        now_us: u64,
        tf: &dyn PoseSource,
    ) -> Result<()> {
        let pose = tf.world_pose_of(&self.sensor_frame, now_us)?;
        let transformed = points
            .iter()
            .map(|p| {
                let planar = pose.transform_point(p.planar());
                Point3::new(planar.x, planar.y, p.z)
            })
            .collect();
        self.buffer_observation(pose.position(), transformed, now_us);
        Ok(())
    }

    /// Drop observations past the keep time and beyond the queue size.
    fn trim(&mut self, now_us: u64) {
        while self.observations.len() > self.queue_size {
            self.observations.pop_back();
        }
        if self.keep_time_us == 0 {
            self.observations.truncate(1);
        } else {
            while let Some(oldest) = self.observations.back() {
                if now_us.saturating_sub(oldest.timestamp_us) > self.keep_time_us {
                    self.observations.pop_back();
                } else {
                    break;
                }
            }
        }
    }

    /// Has this buffer received an observation within its expected window?
    pub fn is_current(&self, now_us: u64) -> bool {
        if self.expected_update_interval_us == 0 {
            return true;
        }
        let age = now_us.saturating_sub(self.last_updated_us);
        if age > self.expected_update_interval_us {
            log::warn!(
                "observation buffer for '{}' is stale: last update {:.2}s ago, expected every {:.2}s",
                self.sensor_frame,
                age as f64 / 1e6,
                self.expected_update_interval_us as f64 / 1e6,
            );
            return false;
        }
        true
    }

    /// Snapshot all currently valid observations into `out`.
    pub fn current_observations(&mut self, now_us: u64, out: &mut Vec<Observation>) {
        self.trim(now_us);
        out.extend(self.observations.iter().cloned());
    }

    /// Number of buffered observations.
    #[inline]
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Is the buffer empty?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

/// A shared observation buffer tagged with how its observations are used.
#[derive(Clone)]
pub struct SourceHandle {
    /// The buffer, shared with the sensor's producer context.
    pub buffer: Arc<Mutex<ObservationBuffer>>,
    /// Use this source's observations to mark obstacles.
    pub marking: bool,
    /// Use this source's observations to raytrace free space.
    pub clearing: bool,
}

impl SourceHandle {
    /// Create a handle around a buffer.
    pub fn new(buffer: ObservationBuffer, marking: bool, clearing: bool) -> Self {
        Self {
            buffer: Arc::new(Mutex::new(buffer)),
            marking,
            clearing,
        }
    }
}

/// Convenience for producers that already deliver layer-frame points.
pub struct IdentityPoseSource;

impl PoseSource for IdentityPoseSource {
    fn world_pose_of(&self, _frame: &str, _at_us: u64) -> Result<Pose2D> {
        Ok(Pose2D::identity())
    }
}

/// A pose source that always fails, for exercising transform dropout.
pub struct UnavailablePoseSource;

impl PoseSource for UnavailablePoseSource {
    fn world_pose_of(&self, frame: &str, _at_us: u64) -> Result<Pose2D> {
        Err(LayerError::TransformUnavailable {
            frame: frame.to_string(),
        })
    }
}
