//! Downstream traversal over a D8 flow-direction grid
//!
//! [`FlowGrid`] is a read-only cursor over a flow raster that lives for one
//! algorithm call. It decodes codes, answers "does this neighbor drain into
//! me" and walks paths downstream. Every walk is bounded by `rows * cols`
//! steps: a longer path can only be a direction cycle, reported as
//! [`Error::DirectionCycle`].

use horton_core::raster::{Direction, FlowCode, Raster, StepLengths};
use horton_core::{Error, Result};

/// Outcome of one downstream step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The cell drains to this in-grid cell
    Next(usize, usize),
    /// The cell is an outlet
    Terminal,
    /// The cell is NoData or drains off the grid
    Invalid,
}

/// Read-only view of a flow-direction raster
#[derive(Debug, Clone, Copy)]
pub struct FlowGrid<'a> {
    raster: &'a Raster<f64>,
    steps: StepLengths,
}

impl<'a> FlowGrid<'a> {
    pub fn new(raster: &'a Raster<f64>) -> Self {
        Self {
            raster,
            steps: StepLengths::from_region(raster.region()),
        }
    }

    pub fn raster(&self) -> &'a Raster<f64> {
        self.raster
    }

    pub fn shape(&self) -> (usize, usize) {
        self.raster.shape()
    }

    /// Step length table derived from the raster's region
    pub fn step_lengths(&self) -> &StepLengths {
        &self.steps
    }

    /// Longest path a valid traversal can take
    pub fn max_steps(&self) -> usize {
        self.raster.len()
    }

    /// Decoded flow code at (row, col)
    pub fn code(&self, row: usize, col: usize) -> Result<FlowCode> {
        let value = self.raster.get(row, col)?;
        if self.raster.is_nodata(value) {
            return Ok(FlowCode::NoData);
        }
        FlowCode::decode(value, row, col)
    }

    /// Flow code of the neighbor in direction `dir`; NoData off the grid
    pub fn neighbor_code(&self, row: usize, col: usize, dir: Direction) -> Result<FlowCode> {
        match self.raster.neighbor(row, col, dir) {
            Some((nr, nc)) => self.code(nr, nc),
            None => Ok(FlowCode::NoData),
        }
    }

    /// Whether the neighbor lying in direction `dir` drains into (row, col)
    pub fn drains_into(&self, row: usize, col: usize, dir: Direction) -> Result<bool> {
        Ok(self.neighbor_code(row, col, dir)? == FlowCode::Flow(dir.opposite()))
    }

    /// Upstream neighbors draining into (row, col), in ascending direction order
    pub fn contributors(&self, row: usize, col: usize) -> Result<Vec<(Direction, usize, usize)>> {
        let mut found = Vec::with_capacity(8);
        for dir in Direction::ALL {
            if self.drains_into(row, col, dir)? {
                if let Some((nr, nc)) = self.raster.neighbor(row, col, dir) {
                    found.push((dir, nr, nc));
                }
            }
        }
        Ok(found)
    }

    /// Number of neighbors draining into (row, col)
    pub fn inflow_count(&self, row: usize, col: usize) -> Result<usize> {
        let mut count = 0;
        for dir in Direction::ALL {
            if self.drains_into(row, col, dir)? {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Follow the flow code at (row, col) one cell downstream
    pub fn step(&self, row: usize, col: usize) -> Result<Step> {
        Ok(match self.code(row, col)? {
            FlowCode::NoData => Step::Invalid,
            FlowCode::Terminal(_) => Step::Terminal,
            FlowCode::Flow(dir) => match self.raster.neighbor(row, col, dir) {
                Some((nr, nc)) => Step::Next(nr, nc),
                None => Step::Invalid,
            },
        })
    }

    /// Lazy downstream path from (row, col), start cell included
    pub fn trace_to_outlet(&self, row: usize, col: usize) -> DownstreamPath<'a> {
        DownstreamPath {
            flow: *self,
            start: (row, col),
            next: Some((row, col)),
            steps: 0,
            end: None,
            pending: None,
        }
    }
}

/// Follow the flow code at (row, col) one cell downstream
pub fn step(flow: &Raster<f64>, row: usize, col: usize) -> Result<Step> {
    FlowGrid::new(flow).step(row, col)
}

/// Downstream path from (row, col) to its outlet
pub fn trace_to_outlet(flow: &Raster<f64>, row: usize, col: usize) -> DownstreamPath<'_> {
    FlowGrid::new(flow).trace_to_outlet(row, col)
}

/// How a [`DownstreamPath`] ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathEnd {
    /// The last yielded cell is an outlet
    Terminal,
    /// The last yielded cell drains into NoData or off the grid, or the
    /// start cell itself is NoData (nothing yielded)
    Invalid,
    /// The step bound was exceeded
    Cycle,
    /// A flow code could not be decoded
    Error,
}

/// Iterator over the cells of a downstream path.
///
/// Yields `Ok((row, col))` for the start cell and each cell downstream of it.
/// A NoData start cell yields nothing. The iterator is `Clone`, so a path can
/// be replayed from any point.
#[derive(Debug, Clone)]
pub struct DownstreamPath<'a> {
    flow: FlowGrid<'a>,
    start: (usize, usize),
    next: Option<(usize, usize)>,
    steps: usize,
    end: Option<PathEnd>,
    pending: Option<(usize, usize, f64)>,
}

impl DownstreamPath<'_> {
    /// How the path ended, once the iterator is exhausted
    pub fn end(&self) -> Option<PathEnd> {
        self.end
    }

    fn finish(&mut self, end: PathEnd) {
        self.next = None;
        self.end = Some(end);
    }
}

impl Iterator for DownstreamPath<'_> {
    type Item = Result<(usize, usize)>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some((row, col, value)) = self.pending.take() {
            return Some(Err(Error::InvalidFlowCode { row, col, value }));
        }
        let (row, col) = self.next?;

        if self.steps >= self.flow.max_steps() {
            self.finish(PathEnd::Cycle);
            return Some(Err(Error::DirectionCycle {
                row: self.start.0,
                col: self.start.1,
            }));
        }

        let step = match self.flow.code(row, col) {
            // Only the start cell can be NoData; later cells are checked
            // before they are queued.
            Ok(FlowCode::NoData) => {
                self.finish(PathEnd::Invalid);
                return None;
            }
            Ok(_) => self.flow.step(row, col),
            Err(e) => Err(e),
        };

        match step {
            Ok(Step::Terminal) => self.finish(PathEnd::Terminal),
            Ok(Step::Invalid) => self.finish(PathEnd::Invalid),
            Ok(Step::Next(nr, nc)) => match self.flow.code(nr, nc) {
                Ok(FlowCode::NoData) => self.finish(PathEnd::Invalid),
                Ok(_) => {
                    self.next = Some((nr, nc));
                    self.steps += 1;
                }
                Err(Error::InvalidFlowCode { row: br, col: bc, value }) => {
                    // Yield the current cell now and the decoding error next.
                    self.finish(PathEnd::Error);
                    self.pending = Some((br, bc, value));
                }
                Err(e) => {
                    self.finish(PathEnd::Error);
                    return Some(Err(e));
                }
            },
            Err(e) => {
                self.finish(PathEnd::Error);
                return Some(Err(e));
            }
        }

        Some(Ok((row, col)))
    }
}
