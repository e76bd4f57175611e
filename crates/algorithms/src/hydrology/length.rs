//! Upstream flow lengths
//!
//! Lengths accumulated from the heads downstream with the forward-additive
//! policy: Hack's main-stream length and total or longest upstream length.

use crate::hydrology::accumulation::{AccumulationEngine, MergeRule, Planimetric, Surface};
use horton_core::raster::Raster;
use horton_core::Result;
use serde::{Deserialize, Serialize};

/// How branch lengths merge at a confluence
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LengthMerge {
    /// Total drainage length above the cell
    Total,
    /// Longest flow path above the cell
    #[default]
    Longest,
}

/// Hack length: length of the main stream above each cell.
///
/// At every confluence the main stream is the branch with the largest
/// contributing area, the lowest direction code winning ties. Heads are 0.
/// Lengths are planimetric, or 3D when `elevation` is given.
pub fn hack_length(
    flow: &Raster<f64>,
    area: &Raster<f64>,
    elevation: Option<&Raster<f64>>,
) -> Result<Raster<f64>> {
    let engine = AccumulationEngine::new(flow);
    let merge = MergeRule::MainStem(area);
    match elevation {
        Some(elevation) => {
            flow.ensure_same_shape(elevation)?;
            engine.upstream(merge, &Surface { elevation })
        }
        None => engine.upstream(merge, &Planimetric),
    }
}

/// Total or longest upstream flow length above each cell
pub fn upstream_length(
    flow: &Raster<f64>,
    elevation: Option<&Raster<f64>>,
    merge: LengthMerge,
) -> Result<Raster<f64>> {
    let engine = AccumulationEngine::new(flow);
    let merge = match merge {
        LengthMerge::Total => MergeRule::Sum,
        LengthMerge::Longest => MergeRule::Max,
    };
    match elevation {
        Some(elevation) => {
            flow.ensure_same_shape(elevation)?;
            engine.upstream(merge, &Surface { elevation })
        }
        None => engine.upstream(merge, &Planimetric),
    }
}
