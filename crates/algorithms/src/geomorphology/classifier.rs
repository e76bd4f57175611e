//! Geomorphic classification
//!
//! Per cell, in order of precedence:
//!
//! | Condition                         | Class             | Code   |
//! |-----------------------------------|-------------------|--------|
//! | slope >= slope threshold          | Ravine            | 110    |
//! | network cell valid and > 0        | Channel           | 100    |
//! | otherwise                         | curvature class   | 10..90 |
//!
//! The aggregated grid folds the 11 classes into 5: convex (15), planar (25),
//! concave (35), channel (100) and ravine (110).
//! NoData slope or curvature class gives NoData in both grids.

use crate::geomorphology::{aggregate, class};
use crate::hydrology::network::is_channel;
use crate::maybe_rayon::collect_rows;
use horton_core::raster::Raster;
use horton_core::{Algorithm, Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Parameters for geomorphic classification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeomorphicParams {
    /// Slope at or above which a cell is a ravine, in the units of the slope
    /// grid.
    /// Default: 45.0 (degrees)
    pub slope_threshold: f64,
}

impl Default for GeomorphicParams {
    fn default() -> Self {
        Self {
            slope_threshold: 45.0,
        }
    }
}

/// Classified and aggregated grids
#[derive(Debug, Clone)]
pub struct GeomorphicClasses {
    /// 11 classes: 10..=90, 100, 110
    pub classified: Raster<f64>,
    /// 5 classes: 15, 25, 35, 100, 110
    pub aggregated: Raster<f64>,
}

/// Geomorphic classification algorithm
///
/// Input is `(slope, network, curvature classes)`.
#[derive(Debug, Clone, Default)]
pub struct GeomorphicClassifier;

impl Algorithm for GeomorphicClassifier {
    type Input = (Raster<f64>, Raster<f64>, Raster<f64>);
    type Output = GeomorphicClasses;
    type Params = GeomorphicParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Geomorphic Classification"
    }

    fn description(&self) -> &'static str {
        "Combine slope, channel network and curvature classes into geomorphic classes"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let (slope, network, curvature) = input;
        geomorphic_classes(&slope, &network, &curvature, params)
    }
}

/// Classify every cell.
///
/// # Arguments
/// * `slope` - slope grid
/// * `network` - channel mask (valid and > 0 means channel)
/// * `curvature` - 9-class curvature codes, e.g. from
///   [`topographic_classes`](crate::geomorphology::topographic_classes)
/// * `params` - slope threshold
///
/// # Errors
/// `InvalidParameter` when a valid curvature cell holds something other than
/// a 9-class code; `SizeMismatch` when the grids differ in shape.
pub fn geomorphic_classes(
    slope: &Raster<f64>,
    network: &Raster<f64>,
    curvature: &Raster<f64>,
    params: GeomorphicParams,
) -> Result<GeomorphicClasses> {
    slope.ensure_same_shape(network)?;
    slope.ensure_same_shape(curvature)?;
    let threshold = params.slope_threshold;

    let (rows, cols) = slope.shape();
    let cells = collect_rows(rows, |row| {
        let mut row_data = vec![(f64::NAN, f64::NAN); cols];

        for (col, out) in row_data.iter_mut().enumerate() {
            let (Some(sl), Some(curv)) = (slope.valid(row, col)?, curvature.valid(row, col)?)
            else {
                continue;
            };
            let code = if sl >= threshold {
                class::RAVINE
            } else if is_channel(network, row, col)? {
                class::CHANNEL
            } else if curv < class::CONVEX_CONVEX || curv > class::CONCAVE_CONCAVE {
                return Err(invalid_curvature(curv));
            } else {
                curv
            };
            match aggregate(code) {
                Some(agg) => *out = (code, agg),
                None => return Err(invalid_curvature(curv)),
            }
        }

        Ok(row_data)
    })?;

    let (classified, aggregated): (Vec<f64>, Vec<f64>) = cells.into_iter().unzip();
    let classified = slope.with_data(classified, Some(f64::NAN))?;
    let aggregated = slope.with_data(aggregated, Some(f64::NAN))?;

    debug!(cells = classified.valid_count(), "geomorphic classes computed");
    Ok(GeomorphicClasses {
        classified,
        aggregated,
    })
}

fn invalid_curvature(value: f64) -> Error {
    Error::InvalidParameter {
        name: "curvature",
        value: value.to_string(),
        reason: "not a curvature class code (10, 20, ..., 90)".into(),
    }
}
