//! Strahler stream order
//!
//! - Heads (sources) are order 1.
//! - A cell with a single contributor inherits its order.
//! - At a confluence the order is the maximum contributor order, plus one
//!   when at least two contributors share that maximum.
//!
//! Each head is walked downstream. A confluence may be reached before all of
//! its branches are ordered, so its value is provisional: a later branch
//! recomputes it and keeps walking only while the new order is higher than
//! the stored one. A stored order is never lowered.

use crate::hydrology::network::restrict_to_network;
use crate::hydrology::traversal::FlowGrid;
use horton_core::raster::Raster;
use horton_core::{Algorithm, Error, NoProgress, Progress, Result};
use tracing::debug;

/// Strahler order algorithm.
///
/// Input is the flow-direction raster and an optional network mask.
#[derive(Debug, Clone, Default)]
pub struct StrahlerOrder;

impl Algorithm for StrahlerOrder {
    type Input = (Raster<f64>, Option<Raster<f64>>);
    type Output = Raster<f64>;
    type Params = ();
    type Error = Error;

    fn name(&self) -> &'static str {
        "Strahler Order"
    }

    fn description(&self) -> &'static str {
        "Strahler stream order over a D8 flow-direction raster"
    }

    fn execute(&self, input: Self::Input, _params: Self::Params) -> Result<Self::Output> {
        let (flow, network) = input;
        strahler_order(&flow, network.as_ref())
    }
}

/// Compute Strahler stream order.
///
/// # Arguments
/// * `flow` - D8 flow-direction raster
/// * `network` - optional channel mask; when given, only cells marked as
///   channel take part and heads are the channel heads
///
/// # Returns
/// Raster with orders >= 1 on ordered cells, NoData elsewhere
pub fn strahler_order(flow: &Raster<f64>, network: Option<&Raster<f64>>) -> Result<Raster<f64>> {
    strahler_order_with_progress(flow, network, &NoProgress)
}

/// [`strahler_order`] reporting one unit of progress per grid row
pub fn strahler_order_with_progress(
    flow: &Raster<f64>,
    network: Option<&Raster<f64>>,
    progress: &dyn Progress,
) -> Result<Raster<f64>> {
    let restricted;
    let flow = match network {
        Some(net) => {
            restricted = restrict_to_network(flow, net)?;
            &restricted
        }
        None => flow,
    };

    let fg = FlowGrid::new(flow);
    let (rows, cols) = fg.shape();
    let mut order = flow.nodata_like();
    let mut stamps = vec![0u32; rows * cols];
    let mut heads = 0u32;

    for row in 0..rows {
        for col in 0..cols {
            if !fg.is_source(row, col)? {
                continue;
            }
            heads += 1;
            order.set(row, col, 1.0)?;
            walk_downstream(&fg, &mut order, &mut stamps, heads, (row, col))?;
        }
        progress.report(row + 1, rows);
    }

    // Outlets get a last look at all of their contributors.
    for row in 0..rows {
        for col in 0..cols {
            if !fg.code(row, col)?.is_terminal() {
                continue;
            }
            let existing = order.get(row, col)?;
            let contributors = fg.contributors(row, col)?;
            let merged = match contributors.len() {
                0 => continue,
                1 => {
                    let (_, r, c) = contributors[0];
                    order.get(r, c)?
                }
                _ => confluence_order(&order, &contributors)?,
            };
            if !merged.is_nan() && (existing.is_nan() || merged > existing) {
                order.set(row, col, merged)?;
            }
        }
    }

    debug!(heads, ordered = order.valid_count(), "strahler order computed");
    Ok(order)
}

/// Walk from an ordered cell downstream, raising orders until a cell already
/// holds an order at least as high.
fn walk_downstream(
    fg: &FlowGrid<'_>,
    order: &mut Raster<f64>,
    stamps: &mut [u32],
    walk: u32,
    start: (usize, usize),
) -> Result<()> {
    let cols = fg.shape().1;
    let mut path = fg.trace_to_outlet(start.0, start.1);
    let Some(first) = path.next() else {
        return Ok(());
    };
    let mut current = first?;
    stamps[current.0 * cols + current.1] = walk;

    for cell in path {
        let (row, col) = cell?;
        let idx = row * cols + col;
        if stamps[idx] == walk {
            return Err(Error::DirectionCycle {
                row: start.0,
                col: start.1,
            });
        }
        stamps[idx] = walk;

        let contributors = fg.contributors(row, col)?;
        let new_order = if contributors.len() <= 1 {
            order.get(current.0, current.1)?
        } else {
            confluence_order(order, &contributors)?
        };

        let existing = order.get(row, col)?;
        if !existing.is_nan() && existing >= new_order {
            break;
        }
        order.set(row, col, new_order)?;
        current = (row, col);
    }

    Ok(())
}

/// Strahler merge over the contributors ordered so far
fn confluence_order(
    order: &Raster<f64>,
    contributors: &[(horton_core::Direction, usize, usize)],
) -> Result<f64> {
    let mut max = f64::NAN;
    let mut counter = 0;
    for &(_, r, c) in contributors {
        let o = order.get(r, c)?;
        if o.is_nan() {
            continue;
        }
        if max.is_nan() || o > max {
            max = o;
            counter = 1;
        } else if o == max {
            counter += 1;
        }
    }
    Ok(if counter > 1 { max + 1.0 } else { max })
}
