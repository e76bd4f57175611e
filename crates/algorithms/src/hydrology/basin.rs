//! Basin delineation from outlet cells
//!
//! A basin is every cell whose downstream path reaches the outlet. It is
//! found by flooding upstream from the outlet with an explicit stack: a
//! neighbor joins the basin when its flow code points into a basin cell.

use crate::hydrology::traversal::FlowGrid;
use horton_core::raster::{Direction, Raster};
use horton_core::{Algorithm, Error, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Parameters for basin delineation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BasinParams {
    /// Outlet as (row, col). `None` yields an empty mask.
    pub outlet: Option<(usize, usize)>,
}

/// Basin delineation algorithm
#[derive(Debug, Clone, Default)]
pub struct BasinDelineation;

impl Algorithm for BasinDelineation {
    type Input = Raster<f64>;
    type Output = Raster<f64>;
    type Params = BasinParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Basin Delineation"
    }

    fn description(&self) -> &'static str {
        "Mark every cell draining to an outlet cell"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        match params.outlet {
            Some(outlet) => basin_mask(&input, outlet),
            None => Ok(input.nodata_like()),
        }
    }
}

/// Flood `labels` upstream from `outlet` with `id`. Cells already labelled
/// are left alone. Returns the number of cells labelled.
fn flood_upstream(
    fg: &FlowGrid<'_>,
    outlet: (usize, usize),
    id: f64,
    labels: &mut Raster<f64>,
) -> Result<usize> {
    let mut stack = vec![outlet];
    labels.set(outlet.0, outlet.1, id)?;
    let mut marked = 1;

    while let Some((row, col)) = stack.pop() {
        for dir in Direction::ALL {
            let Some((nr, nc)) = labels.neighbor(row, col, dir) else {
                continue;
            };
            if !labels.get(nr, nc)?.is_nan() {
                continue;
            }
            if fg.drains_into(row, col, dir)? {
                labels.set(nr, nc, id)?;
                marked += 1;
                stack.push((nr, nc));
            }
        }
    }

    Ok(marked)
}

/// Whether `outlet` can seed a basin; logs why not
fn usable_outlet(fg: &FlowGrid<'_>, outlet: (usize, usize)) -> Result<bool> {
    let (rows, cols) = fg.shape();
    let (row, col) = outlet;
    if row >= rows || col >= cols {
        warn!(row, col, rows, cols, "outlet outside the grid, basin is empty");
        return Ok(false);
    }
    if fg.code(row, col)?.is_nodata() {
        warn!(row, col, "outlet on a NoData flow cell, basin is empty");
        return Ok(false);
    }
    Ok(true)
}

/// Delineate the basin draining to `outlet` = (row, col).
///
/// # Returns
/// Raster with 1.0 on basin cells and NoData elsewhere. An outlet outside the
/// grid, or on a NoData flow cell, gives an all-NoData mask rather than an
/// error.
pub fn basin_mask(flow: &Raster<f64>, outlet: (usize, usize)) -> Result<Raster<f64>> {
    let fg = FlowGrid::new(flow);
    let mut mask = flow.nodata_like();

    if usable_outlet(&fg, outlet)? {
        let marked = flood_upstream(&fg, outlet, 1.0, &mut mask)?;
        debug!(row = outlet.0, col = outlet.1, cells = marked, "basin delineated");
    }

    Ok(mask)
}

/// Delineate the basin of the cell containing the map coordinate
/// (`east`, `north`), translated with the flow raster's region.
pub fn basin_mask_at(flow: &Raster<f64>, east: f64, north: f64) -> Result<Raster<f64>> {
    let (rows, cols) = flow.shape();
    match flow.region().cell_of(east, north, rows, cols) {
        Some(outlet) => basin_mask(flow, outlet),
        None => {
            warn!(east, north, "outlet coordinate outside the region, basin is empty");
            Ok(flow.nodata_like())
        }
    }
}

/// Label the basins of several outlets with ids 1, 2, ... in outlet order.
///
/// When one outlet lies upstream of another, the outlet listed first keeps
/// the cells it claims. Unusable outlets keep their id but label nothing.
pub fn label_basins(flow: &Raster<f64>, outlets: &[(usize, usize)]) -> Result<Raster<f64>> {
    let fg = FlowGrid::new(flow);
    let mut labels = flow.nodata_like();

    for (idx, &outlet) in outlets.iter().enumerate() {
        if !usable_outlet(&fg, outlet)? {
            continue;
        }
        if !labels.get(outlet.0, outlet.1)?.is_nan() {
            continue;
        }
        let id = (idx + 1) as f64;
        let marked = flood_upstream(&fg, outlet, id, &mut labels)?;
        debug!(id, cells = marked, "basin labelled");
    }

    Ok(labels)
}

/// Keep `raster` inside the basin mask, NoData outside it
pub fn mask_to_basin(raster: &Raster<f64>, mask: &Raster<f64>) -> Result<Raster<f64>> {
    raster.ensure_same_shape(mask)?;
    let mut output = raster.nodata_like();
    let (rows, cols) = raster.shape();

    for row in 0..rows {
        for col in 0..cols {
            if mask.valid(row, col)?.is_none() {
                continue;
            }
            if let Some(v) = raster.valid(row, col)? {
                output.set(row, col, v)?;
            }
        }
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use horton_core::Region;

    const N: f64 = f64::NAN;

    fn grid(rows: usize, cols: usize, codes: &[f64]) -> Raster<f64> {
        Raster::from_vec(codes.to_vec(), rows, cols).unwrap()
    }

    /// Two catchments side by side:
    /// left column drains S into (3,0) which drains E to the outlet (3,1);
    /// right column drains S to its own outlet (3,2).
    fn two_catchments() -> Raster<f64> {
        grid(4, 3, &[
            3.0, 3.0, 3.0,
            3.0, 3.0, 3.0,
            3.0, 3.0, 3.0,
            1.0, 10.0, 10.0,
        ])
    }

    fn cells(mask: &Raster<f64>) -> Vec<(usize, usize)> {
        let (rows, cols) = mask.shape();
        let mut out = Vec::new();
        for r in 0..rows {
            for c in 0..cols {
                if !mask.get(r, c).unwrap().is_nan() {
                    out.push((r, c));
                }
            }
        }
        out
    }

    #[test]
    fn basin_of_shared_outlet() {
        let flow = two_catchments();
        let mask = basin_mask(&flow, (3, 1)).unwrap();
        assert_eq!(
            cells(&mask),
            vec![(0, 0), (0, 1), (1, 0), (1, 1), (2, 0), (2, 1), (3, 0), (3, 1)]
        );
        assert_eq!(mask.get(0, 0).unwrap(), 1.0);
    }

    #[test]
    fn basin_of_sub_outlet_is_subset() {
        let flow = two_catchments();
        let outer = basin_mask(&flow, (3, 1)).unwrap();
        let inner = basin_mask(&flow, (2, 0)).unwrap();
        assert_eq!(cells(&inner), vec![(0, 0), (1, 0), (2, 0)]);
        for (r, c) in cells(&inner) {
            assert_eq!(outer.get(r, c).unwrap(), 1.0);
        }
    }

    #[test]
    fn outlet_outside_grid_is_empty() {
        let flow = two_catchments();
        let mask = basin_mask(&flow, (4, 0)).unwrap();
        assert_eq!(mask.shape(), (4, 3));
        assert_eq!(mask.valid_count(), 0);
    }

    #[test]
    fn outlet_on_nodata_is_empty() {
        let flow = grid(2, 1, &[3.0, N]);
        assert_eq!(basin_mask(&flow, (1, 0)).unwrap().valid_count(), 0);
    }

    #[test]
    fn cycle_cells_never_join() {
        // (0,0)<->(0,1) cycle next to a clean path into the outlet (1,1)
        let flow = grid(2, 2, &[1.0, 5.0, 1.0, 10.0]);
        let mask = basin_mask(&flow, (1, 1)).unwrap();
        assert_eq!(cells(&mask), vec![(1, 0), (1, 1)]);
    }

    #[test]
    fn basin_from_map_coordinate() {
        let mut flow = two_catchments();
        flow.set_region(Region::square(100.0, 400.0, 10.0));
        // Center of cell (3, 2)
        let mask = basin_mask_at(&flow, 125.0, 365.0).unwrap();
        assert_eq!(cells(&mask), vec![(0, 2), (1, 2), (2, 2), (3, 2)]);

        let outside = basin_mask_at(&flow, 0.0, 0.0).unwrap();
        assert_eq!(outside.valid_count(), 0);
    }

    #[test]
    fn labels_for_several_outlets() {
        let flow = two_catchments();
        let labels = label_basins(&flow, &[(3, 2), (3, 1), (9, 9)]).unwrap();
        assert_eq!(labels.get(0, 2).unwrap(), 1.0);
        assert_eq!(labels.get(0, 0).unwrap(), 2.0);
        assert_eq!(labels.get(3, 1).unwrap(), 2.0);
        assert_eq!(labels.valid_count(), 12);
    }

    #[test]
    fn first_outlet_keeps_nested_cells() {
        let flow = two_catchments();
        let labels = label_basins(&flow, &[(1, 0), (3, 1)]).unwrap();
        assert_eq!(labels.get(0, 0).unwrap(), 1.0);
        assert_eq!(labels.get(1, 0).unwrap(), 1.0);
        assert_eq!(labels.get(2, 0).unwrap(), 2.0);
        assert_eq!(labels.get(0, 1).unwrap(), 2.0);
    }

    #[test]
    fn trim_to_basin() {
        let flow = two_catchments();
        let mask = basin_mask(&flow, (3, 2)).unwrap();
        let mut elevation = Raster::filled(4, 3, 5.0);
        elevation.set(1, 2, N).unwrap();
        let trimmed = mask_to_basin(&elevation, &mask).unwrap();
        assert_eq!(cells(&trimmed), vec![(0, 2), (2, 2), (3, 2)]);
        assert!(mask_to_basin(&elevation, &Raster::new(2, 2)).is_err());
    }

    #[test]
    fn algorithm_trait_without_outlet() {
        let flow = two_catchments();
        let mask = BasinDelineation.execute_default(flow.clone()).unwrap();
        assert_eq!(mask.valid_count(), 0);
        let mask = BasinDelineation
            .execute(flow, BasinParams { outlet: Some((3, 2)) })
            .unwrap();
        assert_eq!(mask.valid_count(), 4);
    }
}
