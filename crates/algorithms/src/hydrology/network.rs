//! Channel network extraction and restriction
//!
//! The network is the set of cells whose contributing area reaches a
//! threshold. Network-aware algorithms (Strahler order, hillslope distances)
//! take it as a mask: valid and > 0 means "channel".

use crate::maybe_rayon::collect_rows;
use horton_core::raster::Raster;
use horton_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Parameters for network extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkParams {
    /// Contributing-area threshold (cell counts).
    /// Cells with area >= this value are channel cells.
    /// Default: 1000.0
    pub threshold: f64,
}

impl Default for NetworkParams {
    fn default() -> Self {
        Self { threshold: 1000.0 }
    }
}

/// Whether a network mask marks (row, col) as channel
pub(crate) fn is_channel(network: &Raster<f64>, row: usize, col: usize) -> Result<bool> {
    Ok(network.valid(row, col)?.is_some_and(|v| v > 0.0))
}

/// Extract the channel network from a contributing-area raster.
///
/// # Returns
/// Raster with 1.0 on channel cells, NoData elsewhere
pub fn extract_network(area: &Raster<f64>, params: NetworkParams) -> Result<Raster<f64>> {
    if !(params.threshold > 0.0) {
        return Err(Error::InvalidParameter {
            name: "threshold",
            value: params.threshold.to_string(),
            reason: "must be positive".into(),
        });
    }

    let (rows, cols) = area.shape();
    let data = collect_rows(rows, |row| {
        let mut row_data = vec![f64::NAN; cols];
        for (col, out) in row_data.iter_mut().enumerate() {
            if let Some(acc) = area.valid(row, col)? {
                if acc >= params.threshold {
                    *out = 1.0;
                }
            }
        }
        Ok(row_data)
    })?;

    area.with_data(data, Some(f64::NAN))
}

/// Copy of `flow` with every cell outside the network set to NoData
pub fn restrict_to_network(flow: &Raster<f64>, network: &Raster<f64>) -> Result<Raster<f64>> {
    flow.ensure_same_shape(network)?;

    let (rows, cols) = flow.shape();
    let data = collect_rows(rows, |row| {
        let mut row_data = vec![f64::NAN; cols];
        for (col, out) in row_data.iter_mut().enumerate() {
            if is_channel(network, row, col)? {
                if let Some(code) = flow.valid(row, col)? {
                    *out = code;
                }
            }
        }
        Ok(row_data)
    })?;

    flow.with_data(data, Some(f64::NAN))
}
