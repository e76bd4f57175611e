//! Grid geometry carried alongside every raster

use serde::{Deserialize, Serialize};

/// North-up grid geometry: origin of the north-west corner plus cell size.
///
/// ```text
/// east  = west  + (col + 0.5) * we_res
/// north = north - (row + 0.5) * ns_res
/// ```
///
/// Row 0 is the northern edge and col 0 the western edge. Both resolutions
/// are positive lengths in map units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Easting of the western edge
    pub west: f64,
    /// Northing of the northern edge
    pub north: f64,
    /// Cell width (west-east resolution)
    pub we_res: f64,
    /// Cell height (north-south resolution)
    pub ns_res: f64,
}

impl Region {
    pub fn new(west: f64, north: f64, we_res: f64, ns_res: f64) -> Self {
        Self {
            west,
            north,
            we_res,
            ns_res,
        }
    }

    /// Square cells of side `res`
    pub fn square(west: f64, north: f64, res: f64) -> Self {
        Self::new(west, north, res, res)
    }

    /// Map coordinates of the center of cell (row, col)
    pub fn cell_center(&self, row: usize, col: usize) -> (f64, f64) {
        let east = self.west + (col as f64 + 0.5) * self.we_res;
        let north = self.north - (row as f64 + 0.5) * self.ns_res;
        (east, north)
    }

    /// Translate a map coordinate into the (row, col) of the cell containing it.
    ///
    /// Returns `None` when the coordinate falls outside a grid of
    /// `rows x cols` cells, or when the resolution is degenerate.
    pub fn cell_of(&self, east: f64, north: f64, rows: usize, cols: usize) -> Option<(usize, usize)> {
        if !(self.we_res > 0.0 && self.ns_res > 0.0) {
            return None;
        }

        let col = ((east - self.west) / self.we_res).floor();
        let row = ((self.north - north) / self.ns_res).floor();

        if !col.is_finite() || !row.is_finite() || col < 0.0 || row < 0.0 {
            return None;
        }
        let (row, col) = (row as usize, col as usize);
        if row >= rows || col >= cols {
            return None;
        }
        Some((row, col))
    }

    /// Geographic bounds (west, south, east, north) of a `rows x cols` grid
    pub fn bounds(&self, rows: usize, cols: usize) -> (f64, f64, f64, f64) {
        (
            self.west,
            self.north - rows as f64 * self.ns_res,
            self.west + cols as f64 * self.we_res,
            self.north,
        )
    }

    /// Cell size when cells are square; the west-east resolution otherwise
    pub fn cell_size(&self) -> f64 {
        self.we_res
    }

    /// Area of one cell in squared map units
    pub fn cell_area(&self) -> f64 {
        self.we_res * self.ns_res
    }
}

impl Default for Region {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }
}
