//! # Horton Core
//!
//! Core types for the Horton D8 watershed engine.
//!
//! This crate provides:
//! - `Raster<T>`: row-major grid with a NoData sentinel
//! - `Region`: north-up grid geometry and coordinate translation
//! - `FlowCode`, `Direction`, `StepLengths`: the D8 encoding
//! - `Error`/`Result` and the `Algorithm` trait shared by all algorithms
//! - `Progress`: optional progress sink

pub mod error;
pub mod progress;
pub mod raster;

pub use error::{Error, Result};
pub use progress::{NoProgress, Progress};
pub use raster::{Direction, FlowCode, Raster, RasterElement, Region, StepLengths};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::progress::{NoProgress, Progress};
    pub use crate::raster::{Direction, FlowCode, Raster, RasterElement, Region, StepLengths};
    pub use crate::Algorithm;
}

/// A named grid operation with typed inputs and parameters.
///
/// The hydrology and geomorphology operations are plain functions; the types
/// implementing this trait wrap them behind one generic interface.
pub trait Algorithm {
    /// Grids the operation reads
    type Input;
    /// What the operation produces
    type Output;
    /// Settings, with defaults that make sense for a typical DEM
    type Params: Default;
    /// Failure type, normally [`Error`]
    type Error: std::error::Error;

    /// Short identifier
    fn name(&self) -> &'static str;

    /// One-line summary of the output
    fn description(&self) -> &'static str;

    /// Run the operation on `input`
    fn execute(&self, input: Self::Input, params: Self::Params) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
