//! Per-link differences along the channel network

use crate::hydrology::accumulation::AccumulationEngine;
use horton_core::raster::Raster;
use horton_core::Result;

/// Absolute difference of `values` between the first and last cell of every
/// channel link.
///
/// Links are maximal runs of cells sharing a segment id in `segments`,
/// followed downstream from a cell none of whose contributors carry the same
/// id. Every cell of a link gets the link's difference; cells outside any
/// link are NoData.
///
/// # Arguments
/// * `flow` - D8 flow-direction raster
/// * `segments` - segment (link) id per channel cell, NoData off the network
/// * `values` - value to difference, e.g. elevation for the link drop
pub fn net_difference(
    flow: &Raster<f64>,
    segments: &Raster<f64>,
    values: &Raster<f64>,
) -> Result<Raster<f64>> {
    AccumulationEngine::new(flow).segment_difference(segments, values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use horton_core::Error;

    const N: f64 = f64::NAN;

    #[test]
    fn elevation_drop_per_link() {
        // Two links (ids 1 and 2) meet at (1,1); link 3 runs from there to
        // the outlet (2,1)
        let flow = Raster::from_vec(vec![2.0, N, 4.0, N, 3.0, N, N, 10.0, N], 3, 3).unwrap();
        let segments = Raster::from_vec(vec![1.0, N, 2.0, N, 3.0, N, N, 3.0, N], 3, 3).unwrap();
        let elevation =
            Raster::from_vec(vec![9.0, N, 12.0, N, 4.0, N, N, 1.0, N], 3, 3).unwrap();

        let drop = net_difference(&flow, &segments, &elevation).unwrap();
        // Single-cell links have no drop
        assert_eq!(drop.get(0, 0).unwrap(), 0.0);
        assert_eq!(drop.get(0, 2).unwrap(), 0.0);
        assert_eq!(drop.get(1, 1).unwrap(), 3.0);
        assert_eq!(drop.get(2, 1).unwrap(), 3.0);
        assert!(drop.get(1, 0).unwrap().is_nan());
    }

    #[test]
    fn overlapping_links_keep_first_value() {
        // Both heads start a link with id 1 and share (1,1) and (2,1)
        let flow = Raster::from_vec(vec![2.0, N, 4.0, N, 3.0, N, N, 10.0, N], 3, 3).unwrap();
        let segments = Raster::filled(3, 3, 1.0);
        let values = Raster::from_vec(vec![9.0, 0.0, 5.0, 0.0, 4.0, 0.0, 0.0, 1.0, 0.0], 3, 3)
            .unwrap();

        let diff = net_difference(&flow, &segments, &values).unwrap();
        assert_eq!(diff.get(0, 0).unwrap(), 8.0);
        assert_eq!(diff.get(1, 1).unwrap(), 8.0);
        assert_eq!(diff.get(2, 1).unwrap(), 8.0);
        assert_eq!(diff.get(0, 2).unwrap(), 4.0);
    }

    #[test]
    fn shapes_must_match() {
        let flow = Raster::filled(2, 2, 10.0);
        let other = Raster::filled(2, 3, 1.0);
        assert!(matches!(
            net_difference(&flow, &other, &flow),
            Err(Error::SizeMismatch { .. })
        ));
    }
}
