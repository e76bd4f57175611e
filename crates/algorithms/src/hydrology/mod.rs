//! Hydrological analysis over D8 flow-direction grids
//!
//! Everything here consumes a flow-direction raster (codes 1..=8 clockwise
//! from East, 9/10 terminal, NoData) and, where needed, companion elevation
//! and network grids:
//! - Traversal: one-step moves and lazy downstream paths
//! - Sources: channel heads
//! - Basin: delineation from outlet cells
//! - Strahler: stream order
//! - Accumulation: the shared engine behind distances and lengths
//! - Distance: distance to outlet, hillslope distance to channel, rescaled
//!   distance
//! - Length: Hack length, total and longest upstream length
//! - Net difference: per-link differences along the network
//! - Contributing area and network extraction

pub mod accumulation;
mod basin;
mod contributing_area;
mod distance;
mod length;
mod net_diff;
pub(crate) mod network;
mod sources;
mod strahler;
pub mod traversal;

pub use accumulation::{
    accumulate, AccumulationEngine, HillslopeScaled, MergeRule, Planimetric, Policy, StepIncrement,
    StepInfo, Surface, Target, Topological,
};
pub use basin::{basin_mask, basin_mask_at, label_basins, mask_to_basin, BasinDelineation, BasinParams};
pub use contributing_area::{contributing_area, ContributingArea};
pub use distance::{
    distance_to_outlet, hillslope_to_channel_distance, rescaled_distance, DistanceMode,
    DistanceParams, RescaledDistanceParams,
};
pub use length::{hack_length, upstream_length, LengthMerge};
pub use net_diff::net_difference;
pub use network::{extract_network, restrict_to_network, NetworkParams};
pub use sources::{is_source, source_cells, source_mask};
pub use strahler::{strahler_order, strahler_order_with_progress, StrahlerOrder};
pub use traversal::{step, trace_to_outlet, DownstreamPath, FlowGrid, PathEnd, Step};
