//! Flow distances measured downstream
//!
//! All three distances run the backward-correction policy of the
//! accumulation engine:
//! - distance to the outlet of each flow path
//! - hillslope distance to the first channel cell
//! - distance to the outlet with hillslope steps rescaled by a celerity ratio

use crate::hydrology::accumulation::{
    AccumulationEngine, HillslopeScaled, Planimetric, StepIncrement, StepInfo, Surface, Target,
    Topological,
};
use horton_core::raster::Raster;
use horton_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// How a single step is measured
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistanceMode {
    /// Horizontal length
    #[default]
    Planimetric,
    /// Number of steps
    Topological,
    /// 3D length over the elevation surface (needs elevation)
    Surface,
}

/// Step increment selected by a [`DistanceMode`]
#[derive(Debug, Clone, Copy)]
enum ModeIncrement<'a> {
    Planimetric,
    Topological,
    Surface(Surface<'a>),
}

impl StepIncrement for ModeIncrement<'_> {
    fn increment(&self, step: &StepInfo) -> Option<f64> {
        match self {
            Self::Planimetric => Planimetric.increment(step),
            Self::Topological => Topological.increment(step),
            Self::Surface(surface) => surface.increment(step),
        }
    }

    fn cell_valid(&self, cell: (usize, usize)) -> bool {
        match self {
            Self::Surface(surface) => surface.cell_valid(cell),
            _ => true,
        }
    }

    fn check(&self, flow: &Raster<f64>) -> Result<()> {
        match self {
            Self::Surface(surface) => surface.check(flow),
            _ => Ok(()),
        }
    }
}

impl DistanceMode {
    fn increment<'a>(
        self,
        flow: &Raster<f64>,
        elevation: Option<&'a Raster<f64>>,
    ) -> Result<ModeIncrement<'a>> {
        if let Some(elevation) = elevation {
            flow.ensure_same_shape(elevation)?;
        }
        Ok(match (self, elevation) {
            (Self::Planimetric, _) => ModeIncrement::Planimetric,
            (Self::Topological, _) => ModeIncrement::Topological,
            (Self::Surface, Some(elevation)) => ModeIncrement::Surface(Surface { elevation }),
            (Self::Surface, None) => {
                return Err(Error::InvalidParameter {
                    name: "elevation",
                    value: "none".into(),
                    reason: "surface distances need an elevation grid".into(),
                })
            }
        })
    }
}

/// Parameters for downstream distances
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DistanceParams {
    pub mode: DistanceMode,
}

/// Parameters for [`rescaled_distance`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescaledDistanceParams {
    pub mode: DistanceMode,
    /// Channel to hillslope celerity ratio; hillslope steps are multiplied
    /// by it. Must be positive.
    /// Default: 1.0
    pub ratio: f64,
}

impl Default for RescaledDistanceParams {
    fn default() -> Self {
        Self {
            mode: DistanceMode::default(),
            ratio: 1.0,
        }
    }
}

/// Distance from every cell to the end of its flow path.
///
/// # Arguments
/// * `flow` - D8 flow-direction raster
/// * `elevation` - elevation grid, required for [`DistanceMode::Surface`]
/// * `params` - how steps are measured
///
/// # Returns
/// Raster with 0 at outlets and the downstream distance elsewhere; NoData on
/// NoData flow cells and on paths cut by NoData elevation
pub fn distance_to_outlet(
    flow: &Raster<f64>,
    elevation: Option<&Raster<f64>>,
    params: DistanceParams,
) -> Result<Raster<f64>> {
    let increment = params.mode.increment(flow, elevation)?;
    AccumulationEngine::new(flow).downstream(Target::Outlet, &increment)
}

/// Hillslope distance from every cell to the first channel cell downstream.
///
/// Channel cells are 0, or NoData under NoData elevation. Cells whose path
/// never reaches the network are NoData.
pub fn hillslope_to_channel_distance(
    flow: &Raster<f64>,
    network: &Raster<f64>,
    elevation: Option<&Raster<f64>>,
    params: DistanceParams,
) -> Result<Raster<f64>> {
    let increment = params.mode.increment(flow, elevation)?;
    AccumulationEngine::new(flow).downstream(Target::Network(network), &increment)
}

/// Distance to the outlet with hillslope steps multiplied by `params.ratio`.
///
/// A step is a hillslope step when it starts off the network.
pub fn rescaled_distance(
    flow: &Raster<f64>,
    network: &Raster<f64>,
    elevation: Option<&Raster<f64>>,
    params: RescaledDistanceParams,
) -> Result<Raster<f64>> {
    if !(params.ratio > 0.0 && params.ratio.is_finite()) {
        return Err(Error::InvalidParameter {
            name: "ratio",
            value: params.ratio.to_string(),
            reason: "must be a positive number".into(),
        });
    }
    flow.ensure_same_shape(network)?;

    let increment = HillslopeScaled {
        inner: params.mode.increment(flow, elevation)?,
        network,
        ratio: params.ratio,
    };
    AccumulationEngine::new(flow).downstream(Target::Outlet, &increment)
}
