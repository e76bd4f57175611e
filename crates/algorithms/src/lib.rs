//! # Horton Algorithms
//!
//! D8 watershed algorithms for Horton.
//!
//! ## Available Algorithm Categories
//!
//! - **hydrology**: downstream traversal, sources, basins, Strahler order,
//!   distance and length accumulations, network differences
//! - **geomorphology**: curvature and geomorphic classes

pub mod geomorphology;
pub mod hydrology;
mod maybe_rayon;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::geomorphology::{
        geomorphic_classes, topographic_classes, GeomorphicClasses, GeomorphicClassifier,
        GeomorphicParams, TopographicClasses, TopographicParams,
    };
    pub use crate::hydrology::{
        basin_mask, contributing_area, distance_to_outlet, extract_network, hack_length,
        hillslope_to_channel_distance, net_difference, rescaled_distance, source_cells,
        strahler_order, trace_to_outlet, upstream_length, AccumulationEngine, BasinDelineation,
        ContributingArea, DistanceMode, DistanceParams, FlowGrid, LengthMerge, MergeRule,
        NetworkParams, RescaledDistanceParams, StrahlerOrder, Target,
    };
    pub use horton_core::prelude::*;
}
