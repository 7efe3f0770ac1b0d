//! Cost values and the layer-to-master combination rule.
//!
//! The obstacle layer only ever writes [`FREE_SPACE`] and
//! [`LETHAL_OBSTACLE`]; cells it has never touched stay at
//! [`NO_INFORMATION`] and are skipped when merging into the master grid.

use serde::{Deserialize, Serialize};

/// Cost of a cell known to be traversable.
pub const FREE_SPACE: u8 = 0;

/// Cost of a cell containing an observed obstacle.
pub const LETHAL_OBSTACLE: u8 = 254;

/// Cost of a cell this layer has no information about.
pub const NO_INFORMATION: u8 = 255;

/// Policy for merging one layer's costs into the shared master grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombinationMethod {
    /// Master cell = layer cell. A `FREE_SPACE` write replaces prior content.
    Overwrite,
    /// Master cell = max(master, layer). A higher-priority obstacle from
    /// another layer is never downgraded.
    #[default]
    Maximum,
}

impl CombinationMethod {
    /// Combine a layer cost into a master cost.
    ///
    /// `NO_INFORMATION` in the layer leaves the master untouched under
    /// either rule; for `Maximum` an uninformed master cell takes the
    /// layer's value rather than winning on the 255 sentinel.
    #[inline]
    pub fn combine(self, master: u8, layer: u8) -> u8 {
        if layer == NO_INFORMATION {
            return master;
        }
        match self {
            CombinationMethod::Overwrite => layer,
            CombinationMethod::Maximum => {
                if master == NO_INFORMATION {
                    layer
                } else {
                    master.max(layer)
                }
            }
        }
    }
}
