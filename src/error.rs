//! Error types for the obstacle layer.
//!
//! Nothing in the per-cycle update path is fatal: stale observation buffers
//! are an advisory flag, out-of-grid cells are clipped. Errors here cover
//! the two recoverable failure kinds the layer surfaces to callers.

use thiserror::Error;

/// Obstacle layer error type
#[derive(Error, Debug)]
pub enum LayerError {
    /// The transform from a sensor frame to the layer frame could not be
    /// resolved. Excludes that observation from the cycle; never fails the
    /// cycle itself.
    #[error("transform unavailable for frame '{frame}'")]
    TransformUnavailable {
        /// Sensor frame whose transform lookup failed
        frame: String,
    },

    /// A configuration update was rejected; the prior configuration stays
    /// in effect.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file I/O error
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration parse error
    #[error("config parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, LayerError>;
