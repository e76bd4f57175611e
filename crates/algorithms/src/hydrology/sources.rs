//! Channel-head (source) detection
//!
//! A source is a valid flow cell that no neighbor drains into. Every
//! accumulation starts from the sources so that each flow path is walked
//! from its head.

use crate::hydrology::traversal::FlowGrid;
use crate::maybe_rayon::collect_rows;
use horton_core::raster::{Direction, Raster};
use horton_core::Result;

/// Whether (row, col) is a source: a valid flow cell with no inflow.
///
/// Neighbors beyond the grid edge count as NoData. A NoData cell is never a
/// source.
pub fn is_source(flow: &Raster<f64>, row: usize, col: usize) -> Result<bool> {
    FlowGrid::new(flow).is_source(row, col)
}

impl FlowGrid<'_> {
    pub fn is_source(&self, row: usize, col: usize) -> Result<bool> {
        if self.code(row, col)?.is_nodata() {
            return Ok(false);
        }
        for dir in Direction::ALL {
            if self.drains_into(row, col, dir)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// All sources in row-major order
pub fn source_cells(flow: &Raster<f64>) -> Result<Vec<(usize, usize)>> {
    let fg = FlowGrid::new(flow);
    let (rows, cols) = fg.shape();

    collect_rows(rows, |row| {
        let mut found = Vec::new();
        for col in 0..cols {
            if fg.is_source(row, col)? {
                found.push((row, col));
            }
        }
        Ok(found)
    })
}

/// Raster with 1 at sources, NoData elsewhere
pub fn source_mask(flow: &Raster<f64>) -> Result<Raster<f64>> {
    let mut output = flow.nodata_like();
    for (row, col) in source_cells(flow)? {
        output.set(row, col, 1.0)?;
    }
    Ok(output)
}
