//! Curvature classes from profile and planform curvature
//!
//! Each curvature is convex (> threshold), planar (|c| <= threshold) or
//! concave (< -threshold). The 9-class code is
//! `10 * (3 * profile + planform + 1)` with convex = 0, planar = 1,
//! concave = 2, giving 10..=90.

use crate::geomorphology::aggregate;
use crate::maybe_rayon::collect_rows;
use horton_core::raster::Raster;
use horton_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Parameters for the curvature classes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopographicParams {
    /// Curvatures within ±threshold are planar. Must be >= 0.
    /// Default: 0.0001
    pub threshold: f64,
}

impl Default for TopographicParams {
    fn default() -> Self {
        Self { threshold: 0.0001 }
    }
}

/// 9-class and aggregated 3-class curvature classification
#[derive(Debug, Clone)]
pub struct TopographicClasses {
    /// Codes 10..=90
    pub nine: Raster<f64>,
    /// Codes 15 (convex), 25 (planar), 35 (concave)
    pub three: Raster<f64>,
}

fn curvature_class(c: f64, threshold: f64) -> f64 {
    if c > threshold {
        0.0
    } else if c < -threshold {
        2.0
    } else {
        1.0
    }
}

/// Classify profile and planform curvature.
///
/// NoData in either input gives NoData in both outputs.
pub fn topographic_classes(
    profile: &Raster<f64>,
    planform: &Raster<f64>,
    params: TopographicParams,
) -> Result<TopographicClasses> {
    profile.ensure_same_shape(planform)?;
    let threshold = params.threshold;
    if !(threshold >= 0.0) {
        return Err(Error::InvalidParameter {
            name: "threshold",
            value: threshold.to_string(),
            reason: "must be non-negative".into(),
        });
    }

    let (rows, cols) = profile.shape();
    let cells = collect_rows(rows, |row| {
        let mut row_data = vec![(f64::NAN, f64::NAN); cols];
        for (col, out) in row_data.iter_mut().enumerate() {
            let (Some(prof), Some(plan)) = (profile.valid(row, col)?, planform.valid(row, col)?)
            else {
                continue;
            };
            let code = 10.0
                * (3.0 * curvature_class(prof, threshold) + curvature_class(plan, threshold) + 1.0);
            *out = (code, aggregate(code).unwrap_or(f64::NAN));
        }
        Ok(row_data)
    })?;

    let (nine, three): (Vec<f64>, Vec<f64>) = cells.into_iter().unzip();
    Ok(TopographicClasses {
        nine: profile.with_data(nine, Some(f64::NAN))?,
        three: profile.with_data(three, Some(f64::NAN))?,
    })
}
