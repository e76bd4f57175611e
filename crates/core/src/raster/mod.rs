//! Raster data structures and the D8 flow encoding

mod element;
mod flow_code;
mod grid;
mod region;

pub use element::RasterElement;
pub use flow_code::{Direction, FlowCode, StepLengths, OUTLET, TERMINAL_CODES};
pub use grid::{Raster, RasterStatistics};
pub use region::Region;
