//! Project schema definitions.

use lion_cell::CellParams;
use lion_sim::SimConfig;
use serde::{Deserialize, Serialize};

/// Schema version written by this crate.
pub const CURRENT_VERSION: u32 = 1;

/// A simulation configuration and the cell it runs on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub version: u32,
    #[serde(default)]
    pub config: SimConfig,
    #[serde(default)]
    pub params: CellParams,
}

impl Project {
    pub fn new(config: SimConfig, params: CellParams) -> Self {
        Self {
            version: CURRENT_VERSION,
            config,
            params,
        }
    }
}

impl Default for Project {
    fn default() -> Self {
        Self::new(SimConfig::default(), CellParams::generic())
    }
}
