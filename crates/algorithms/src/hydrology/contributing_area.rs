//! Contributing area
//!
//! Number of cells draining through each cell, the cell itself included.
//! Headwater cells have area 1.
//!
//! # Algorithm
//! 1. Count incoming flows for each cell (in-degree)
//! 2. Start from cells with in-degree 0 (heads)
//! 3. Propagate downstream, adding one per step

use crate::hydrology::accumulation::{AccumulationEngine, MergeRule, Topological};
use horton_core::raster::Raster;
use horton_core::{Algorithm, Error, Result};
use tracing::debug;

/// Contributing area algorithm
#[derive(Debug, Clone, Default)]
pub struct ContributingArea;

impl Algorithm for ContributingArea {
    type Input = Raster<f64>;
    type Output = Raster<f64>;
    type Params = ();
    type Error = Error;

    fn name(&self) -> &'static str {
        "Contributing Area"
    }

    fn description(&self) -> &'static str {
        "Upstream cell count from a D8 flow-direction raster"
    }

    fn execute(&self, input: Self::Input, _params: Self::Params) -> Result<Self::Output> {
        contributing_area(&input)
    }
}

/// Contributing area in cells.
///
/// # Returns
/// Raster with area >= 1 on valid flow cells, NoData on NoData flow cells
///
/// # Errors
/// [`Error::DirectionCycle`] when the flow grid contains a cycle
pub fn contributing_area(flow: &Raster<f64>) -> Result<Raster<f64>> {
    // Upstream step count excludes the cell itself
    let mut area = AccumulationEngine::new(flow).upstream(MergeRule::Sum, &Topological)?;
    area.data_mut().mapv_inplace(|v| v + 1.0);

    debug!(max = ?area.statistics().max, "contributing area computed");
    Ok(area)
}
