//! Main Raster type

use crate::error::{Error, Result};
use crate::raster::{Direction, RasterElement, Region};
use ndarray::{Array2, ArrayView2};

/// A 2D raster grid with geometry and an optional NoData sentinel.
///
/// Values are stored row-major; cells are addressed `(row, col)` with row 0
/// at the northern edge.
///
/// # Example
///
/// ```
/// use horton_core::Raster;
///
/// let mut raster: Raster<f64> = Raster::new(10, 10);
/// raster.set(2, 3, 42.0).unwrap();
/// assert_eq!(raster.get(2, 3).unwrap(), 42.0);
/// ```
#[derive(Debug, Clone)]
pub struct Raster<T: RasterElement> {
    /// Raster data stored in row-major order (row, col)
    data: Array2<T>,
    region: Region,
    nodata: Option<T>,
}

impl<T: RasterElement> Raster<T> {
    /// Create a new raster filled with zeros
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::from_array(Array2::zeros((rows, cols)))
    }

    /// Create a new raster filled with a specific value
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self::from_array(Array2::from_elem((rows, cols), value))
    }

    /// Create a raster from row-major data
    pub fn from_vec(data: Vec<T>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }

        let array = Array2::from_shape_vec((rows, cols), data)
            .map_err(|e| Error::Other(e.to_string()))?;

        Ok(Self::from_array(array))
    }

    /// Create a raster from an ndarray
    pub fn from_array(data: Array2<T>) -> Self {
        Self {
            data,
            region: Region::default(),
            nodata: None,
        }
    }

    /// Same shape and region, every cell NoData (NaN).
    ///
    /// This is how algorithms allocate their outputs: cells never written
    /// stay NoData.
    pub fn nodata_like(&self) -> Raster<f64> {
        Raster {
            data: Array2::from_elem(self.data.dim(), f64::NAN),
            region: self.region,
            nodata: Some(f64::NAN),
        }
    }

    /// Replace the data of a raster, keeping its metadata
    pub fn with_data<U: RasterElement>(&self, data: Vec<U>, nodata: Option<U>) -> Result<Raster<U>> {
        let (rows, cols) = self.shape();
        let mut out = Raster::<U>::from_vec(data, rows, cols)?;
        out.region = self.region;
        out.nodata = nodata;
        Ok(out)
    }

    // Dimensions

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Fails with `SizeMismatch` unless `other` has the same shape
    pub fn ensure_same_shape<U: RasterElement>(&self, other: &Raster<U>) -> Result<()> {
        let (er, ec) = self.shape();
        let (ar, ac) = other.shape();
        if (er, ec) != (ar, ac) {
            return Err(Error::SizeMismatch { er, ec, ar, ac });
        }
        Ok(())
    }

    // Data access

    /// Get value at (row, col)
    pub fn get(&self, row: usize, col: usize) -> Result<T> {
        self.data
            .get((row, col))
            .copied()
            .ok_or(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            })
    }

    /// Set value at (row, col)
    pub fn set(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        match self.data.get_mut((row, col)) {
            Some(cell) => {
                *cell = value;
                Ok(())
            }
            None => Err(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            }),
        }
    }

    /// Value at (row, col) or `None` when the cell holds NoData
    pub fn valid(&self, row: usize, col: usize) -> Result<Option<T>> {
        let value = self.get(row, col)?;
        Ok((!self.is_nodata(value)).then_some(value))
    }

    /// Neighbor of (row, col) in direction `dir`.
    ///
    /// Off-grid neighbors are `None`; callers treat them as NoData.
    pub fn neighbor(&self, row: usize, col: usize, dir: Direction) -> Option<(usize, usize)> {
        let (dr, dc) = dir.offset();
        let nr = row.checked_add_signed(dr)?;
        let nc = col.checked_add_signed(dc)?;
        (nr < self.rows() && nc < self.cols()).then_some((nr, nc))
    }

    pub fn view(&self) -> ArrayView2<'_, T> {
        self.data.view()
    }

    pub fn data(&self) -> &Array2<T> {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Array2<T> {
        &mut self.data
    }

    pub fn into_array(self) -> Array2<T> {
        self.data
    }

    // Metadata

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn set_region(&mut self, region: Region) {
        self.region = region;
    }

    pub fn nodata(&self) -> Option<T> {
        self.nodata
    }

    pub fn set_nodata(&mut self, nodata: Option<T>) {
        self.nodata = nodata;
    }

    /// Cell size (west-east resolution)
    pub fn cell_size(&self) -> f64 {
        self.region.cell_size()
    }

    // Value checks

    pub fn is_nodata(&self, value: T) -> bool {
        value.is_nodata(self.nodata)
    }

    pub fn is_nodata_at(&self, row: usize, col: usize) -> Result<bool> {
        let value = self.get(row, col)?;
        Ok(self.is_nodata(value))
    }

    /// Number of cells not holding NoData
    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|&&v| !self.is_nodata(v)).count()
    }

    // Statistics

    /// Basic statistics over the valid cells
    pub fn statistics(&self) -> RasterStatistics<T> {
        let mut min: Option<T> = None;
        let mut max: Option<T> = None;
        let mut sum: f64 = 0.0;
        let mut count: usize = 0;

        for &value in self.data.iter() {
            if self.is_nodata(value) {
                continue;
            }

            if min.map_or(true, |m| value < m) {
                min = Some(value);
            }
            if max.map_or(true, |m| value > m) {
                max = Some(value);
            }

            if let Some(v) = value.to_f64() {
                sum += v;
                count += 1;
            }
        }

        RasterStatistics {
            min,
            max,
            mean: (count > 0).then(|| sum / count as f64),
            valid_count: count,
            nodata_count: self.len() - count,
        }
    }
}

/// Basic statistics for a raster
#[derive(Debug, Clone)]
pub struct RasterStatistics<T> {
    pub min: Option<T>,
    pub max: Option<T>,
    pub mean: Option<f64>,
    pub valid_count: usize,
    pub nodata_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raster_creation() {
        let raster: Raster<f64> = Raster::new(10, 20);
        assert_eq!(raster.rows(), 10);
        assert_eq!(raster.cols(), 20);
        assert_eq!(raster.shape(), (10, 20));
        assert_eq!(raster.len(), 200);
    }

    #[test]
    fn test_out_of_bounds_access_fails() {
        let mut raster: Raster<f64> = Raster::new(3, 4);
        assert!(matches!(
            raster.get(3, 0),
            Err(Error::IndexOutOfBounds { row: 3, col: 0, rows: 3, cols: 4 })
        ));
        assert!(raster.set(0, 4, 1.0).is_err());
        raster.set(2, 3, 7.0).unwrap();
        assert_eq!(raster.get(2, 3).unwrap(), 7.0);
    }

    #[test]
    fn test_from_vec_checks_length() {
        assert!(Raster::<f64>::from_vec(vec![1.0; 5], 2, 3).is_err());
        let r = Raster::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3).unwrap();
        assert_eq!(r.get(1, 0).unwrap(), 4.0);
    }

    #[test]
    fn test_neighbor_halo() {
        let raster: Raster<f64> = Raster::new(3, 3);
        assert_eq!(raster.neighbor(1, 1, Direction::NorthWest), Some((0, 0)));
        assert_eq!(raster.neighbor(1, 1, Direction::SouthEast), Some((2, 2)));
        assert_eq!(raster.neighbor(0, 0, Direction::North), None);
        assert_eq!(raster.neighbor(0, 0, Direction::West), None);
        assert_eq!(raster.neighbor(2, 2, Direction::East), None);
        assert_eq!(raster.neighbor(2, 1, Direction::South), None);
    }

    #[test]
    fn test_nodata_like_keeps_region() {
        let mut raster: Raster<f64> = Raster::new(2, 2);
        raster.set_region(Region::square(5.0, 10.0, 2.5));
        let out = raster.nodata_like();
        assert_eq!(out.shape(), (2, 2));
        assert_eq!(out.region(), raster.region());
        assert_eq!(out.valid_count(), 0);
    }

    #[test]
    fn test_shape_mismatch() {
        let a: Raster<f64> = Raster::new(2, 3);
        let b: Raster<u8> = Raster::new(3, 2);
        assert!(matches!(
            a.ensure_same_shape(&b),
            Err(Error::SizeMismatch { er: 2, ec: 3, ar: 3, ac: 2 })
        ));
        assert!(a.ensure_same_shape(&a).is_ok());
    }

    #[test]
    fn test_raster_statistics_skip_nodata() {
        let mut raster: Raster<f64> = Raster::new(10, 10);
        raster.set_nodata(Some(-9999.0));
        for i in 0..10 {
            for j in 0..10 {
                raster.set(i, j, (i * 10 + j) as f64).unwrap();
            }
        }
        raster.set(0, 0, -9999.0).unwrap();

        let stats = raster.statistics();
        assert_eq!(stats.min, Some(1.0));
        assert_eq!(stats.max, Some(99.0));
        assert_eq!(stats.valid_count, 99);
        assert_eq!(stats.nodata_count, 1);
        assert!(raster.is_nodata_at(0, 0).unwrap());
        assert_eq!(raster.valid(0, 0).unwrap(), None);
        assert_eq!(raster.valid(0, 1).unwrap(), Some(1.0));
    }
}
