//! Accumulation engine over a D8 flow-direction grid
//!
//! Every distance, length and difference algorithm in this crate is one of
//! three policies run by [`AccumulationEngine`]:
//!
//! - **Upstream** (forward-additive): values flow from the sources downstream
//!   in topological order. A cell is finalized once all of its contributors
//!   are, then merged with a [`MergeRule`].
//! - **Downstream** (backward-correction): each source path is walked to its
//!   [`Target`], summing step increments, then walked again writing the
//!   remaining distance to every cell.
//! - **Segment difference**: each channel link gets the absolute difference
//!   of a value between its first and last cell.
//!
//! Step increments are pluggable through [`StepIncrement`]; the same step
//! length table ([`StepLengths`](horton_core::StepLengths)) is shared by all
//! of them.

use crate::hydrology::network::is_channel;
use crate::hydrology::traversal::{FlowGrid, PathEnd, Step};
use crate::maybe_rayon::collect_rows;
use horton_core::raster::{Direction, FlowCode, Raster};
use horton_core::{Error, NoProgress, Progress, Result};
use ndarray::Array2;
use tracing::debug;

/// One downstream step handed to a [`StepIncrement`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepInfo {
    /// Upstream cell (row, col)
    pub from: (usize, usize),
    /// Downstream cell (row, col)
    pub to: (usize, usize),
    /// Flow direction of `from`
    pub direction: Direction,
    /// Planimetric length of the step in map units
    pub length: f64,
}

/// Value added when flow moves one step downstream.
///
/// `None` means the increment cannot be computed (e.g. NoData elevation).
pub trait StepIncrement {
    fn increment(&self, step: &StepInfo) -> Option<f64>;

    /// Whether a cell may hold a value at all. Path ends (sources, outlets,
    /// preset network cells) take no step, so this is their only NoData check.
    fn cell_valid(&self, _cell: (usize, usize)) -> bool {
        true
    }

    /// Structural check against the flow raster, run once before a pass
    fn check(&self, _flow: &Raster<f64>) -> Result<()> {
        Ok(())
    }
}

impl<F> StepIncrement for F
where
    F: Fn(&StepInfo) -> Option<f64>,
{
    fn increment(&self, step: &StepInfo) -> Option<f64> {
        self(step)
    }
}

/// Horizontal step length
#[derive(Debug, Clone, Copy, Default)]
pub struct Planimetric;

impl StepIncrement for Planimetric {
    fn increment(&self, step: &StepInfo) -> Option<f64> {
        Some(step.length)
    }
}

/// One per step
#[derive(Debug, Clone, Copy, Default)]
pub struct Topological;

impl StepIncrement for Topological {
    fn increment(&self, _step: &StepInfo) -> Option<f64> {
        Some(1.0)
    }
}

/// 3D step length over an elevation surface
#[derive(Debug, Clone, Copy)]
pub struct Surface<'a> {
    pub elevation: &'a Raster<f64>,
}

impl StepIncrement for Surface<'_> {
    fn increment(&self, step: &StepInfo) -> Option<f64> {
        let z_from = self.elevation.valid(step.from.0, step.from.1).ok()??;
        let z_to = self.elevation.valid(step.to.0, step.to.1).ok()??;
        Some(step.length.hypot(z_from - z_to))
    }

    fn cell_valid(&self, cell: (usize, usize)) -> bool {
        matches!(self.elevation.valid(cell.0, cell.1), Ok(Some(_)))
    }

    fn check(&self, flow: &Raster<f64>) -> Result<()> {
        flow.ensure_same_shape(self.elevation)
    }
}

/// Inner increment scaled by `ratio` on hillslope steps (steps starting off
/// the network); channel steps are left as they are
#[derive(Debug, Clone, Copy)]
pub struct HillslopeScaled<'a, I> {
    pub inner: I,
    pub network: &'a Raster<f64>,
    pub ratio: f64,
}

impl<I: StepIncrement> StepIncrement for HillslopeScaled<'_, I> {
    fn increment(&self, step: &StepInfo) -> Option<f64> {
        let inc = self.inner.increment(step)?;
        let on_channel = is_channel(self.network, step.from.0, step.from.1).ok()?;
        Some(if on_channel { inc } else { inc * self.ratio })
    }

    fn cell_valid(&self, cell: (usize, usize)) -> bool {
        self.inner.cell_valid(cell)
    }

    fn check(&self, flow: &Raster<f64>) -> Result<()> {
        flow.ensure_same_shape(self.network)?;
        self.inner.check(flow)
    }
}

/// How contributor values combine in the upstream policy
#[derive(Debug, Clone, Copy)]
pub enum MergeRule<'a> {
    /// Sum over contributors of (value + increment)
    Sum,
    /// Longest incoming branch
    Max,
    /// Follow the contributor with the largest value in this area raster;
    /// ties go to the lowest direction code
    MainStem(&'a Raster<f64>),
}

/// Where downstream paths end
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    /// The outlet (or the last valid cell of the path)
    Outlet,
    /// The first channel cell of the given network mask
    Network(&'a Raster<f64>),
}

/// Accumulation policy for [`accumulate`]
#[derive(Debug, Clone, Copy)]
pub enum Policy<'a> {
    Upstream(MergeRule<'a>),
    Downstream(Target<'a>),
}

/// Run one accumulation policy over `flow` with `increment`
pub fn accumulate<I>(flow: &Raster<f64>, policy: Policy<'_>, increment: &I) -> Result<Raster<f64>>
where
    I: StepIncrement + ?Sized,
{
    let engine = AccumulationEngine::new(flow);
    match policy {
        Policy::Upstream(merge) => engine.upstream(merge, increment),
        Policy::Downstream(target) => engine.downstream(target, increment),
    }
}

/// Runs accumulation policies over one flow-direction raster
pub struct AccumulationEngine<'a> {
    flow: FlowGrid<'a>,
    progress: &'a dyn Progress,
}

impl<'a> AccumulationEngine<'a> {
    pub fn new(flow: &'a Raster<f64>) -> Self {
        Self {
            flow: FlowGrid::new(flow),
            progress: &NoProgress,
        }
    }

    /// Report progress to `progress`, once per grid row
    pub fn with_progress(mut self, progress: &'a dyn Progress) -> Self {
        self.progress = progress;
        self
    }

    fn raster(&self) -> &'a Raster<f64> {
        self.flow.raster()
    }

    fn step_info(&self, from: (usize, usize), to: (usize, usize), direction: Direction) -> StepInfo {
        StepInfo {
            from,
            to,
            direction,
            length: self.flow.step_lengths().of_direction(direction),
        }
    }

    /// Forward-additive policy.
    ///
    /// Sources get 0. Every other cell gets its contributors merged with
    /// `merge`, each contributor carrying its value plus the increment of its
    /// step into the cell. A NoData increment, a NoData contributor or a cell
    /// rejected by [`StepIncrement::cell_valid`] makes the cell NoData, and so
    /// everything downstream of it.
    ///
    /// # Errors
    /// [`Error::DirectionCycle`] when valid cells can never be finalized; the
    /// reported cell is the first such cell in row-major order.
    /// `SizeMismatch` when a companion grid differs in shape.
    pub fn upstream<I>(&self, merge: MergeRule<'_>, increment: &I) -> Result<Raster<f64>>
    where
        I: StepIncrement + ?Sized,
    {
        let flow = self.raster();
        increment.check(flow)?;
        if let MergeRule::MainStem(area) = merge {
            flow.ensure_same_shape(area)?;
        }
        let (rows, cols) = flow.shape();
        let fg = self.flow;

        // In-degree per valid cell; None marks NoData flow cells
        let counts = collect_rows(rows, |row| {
            let mut row_counts = Vec::with_capacity(cols);
            for col in 0..cols {
                row_counts.push(match fg.code(row, col)? {
                    FlowCode::NoData => None,
                    _ => Some(fg.inflow_count(row, col)?),
                });
            }
            Ok(row_counts)
        })?;
        let mut in_degree = Array2::from_shape_vec((rows, cols), counts)
            .map_err(|e| Error::Other(e.to_string()))?;

        let valid = in_degree.iter().filter(|d| d.is_some()).count();
        let mut output = flow.nodata_like();
        let mut done = Array2::<bool>::from_elem((rows, cols), false);
        let mut processed = 0usize;

        let mut stack: Vec<(usize, usize)> = Vec::new();
        for row in 0..rows {
            for col in 0..cols {
                if in_degree[(row, col)] == Some(0) {
                    stack.push((row, col));
                }
            }
        }
        let sources = stack.len();

        while let Some((row, col)) = stack.pop() {
            let value = self.merge_contributors(row, col, merge, increment, &output)?;
            output.set(row, col, value)?;
            done[(row, col)] = true;
            processed += 1;
            if processed % cols.max(1) == 0 {
                self.progress.report(processed / cols.max(1), valid.div_ceil(cols.max(1)));
            }

            if let Step::Next(nr, nc) = fg.step(row, col)? {
                if let Some(d) = in_degree[(nr, nc)].as_mut() {
                    *d = d.saturating_sub(1);
                    if *d == 0 {
                        stack.push((nr, nc));
                    }
                }
            }
        }

        if processed < valid {
            for ((row, col), d) in in_degree.indexed_iter() {
                if d.is_some() && !done[(row, col)] {
                    return Err(Error::DirectionCycle { row, col });
                }
            }
        }

        debug!(sources, cells = processed, "upstream accumulation finished");
        Ok(output)
    }

    /// Merge the finalized contributors of (row, col)
    fn merge_contributors<I>(
        &self,
        row: usize,
        col: usize,
        merge: MergeRule<'_>,
        increment: &I,
        values: &Raster<f64>,
    ) -> Result<f64>
    where
        I: StepIncrement + ?Sized,
    {
        if !increment.cell_valid((row, col)) {
            return Ok(f64::NAN);
        }
        let contributors = self.flow.contributors(row, col)?;
        if contributors.is_empty() {
            return Ok(0.0);
        }

        let mut incoming = Vec::with_capacity(contributors.len());
        for &(dir, r, c) in &contributors {
            let upstream = values.get(r, c)?;
            let step = self.step_info((r, c), (row, col), dir.opposite());
            match increment.increment(&step) {
                Some(inc) if !upstream.is_nan() => incoming.push(upstream + inc),
                _ => return Ok(f64::NAN),
            }
        }

        Ok(match merge {
            MergeRule::Sum => incoming.iter().sum(),
            MergeRule::Max => incoming.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            MergeRule::MainStem(area) => {
                let mut best = 0;
                let mut best_area = f64::NEG_INFINITY;
                for (idx, &(_, r, c)) in contributors.iter().enumerate() {
                    let a = area.valid(r, c)?.unwrap_or(f64::NEG_INFINITY);
                    if a > best_area {
                        best = idx;
                        best_area = a;
                    }
                }
                incoming[best]
            }
        })
    }

    /// Backward-correction policy.
    ///
    /// Every source path is walked to its target, summing increments, then
    /// walked again writing the remaining distance to each cell. A walk also
    /// stops at a cell that already holds a value and adds that value in, so
    /// each cell is written once. With [`Target::Network`] the network cells
    /// are 0 and paths that never reach the network stay NoData.
    ///
    /// A NoData increment leaves the part of the path above it NoData; the
    /// walk restarts at the cell below it. Path ends rejected by
    /// [`StepIncrement::cell_valid`] are NoData, and so is every cell whose
    /// path stops at one.
    pub fn downstream<I>(&self, target: Target<'_>, increment: &I) -> Result<Raster<f64>>
    where
        I: StepIncrement + ?Sized,
    {
        let flow = self.raster();
        increment.check(flow)?;
        let (rows, cols) = flow.shape();
        let mut output = flow.nodata_like();

        if let Target::Network(network) = target {
            flow.ensure_same_shape(network)?;
            for row in 0..rows {
                for col in 0..cols {
                    if !self.flow.code(row, col)?.is_nodata()
                        && is_channel(network, row, col)?
                        && increment.cell_valid((row, col))
                    {
                        output.set(row, col, 0.0)?;
                    }
                }
            }
        }

        let mut seeded = Array2::<bool>::from_elem((rows, cols), false);
        let mut paths = 0usize;

        for row in 0..rows {
            for col in 0..cols {
                if !self.flow.is_source(row, col)? {
                    continue;
                }
                let mut seeds = vec![(row, col)];
                seeded[(row, col)] = true;
                while let Some(seed) = seeds.pop() {
                    paths += 1;
                    if let Some(next) = self.correct_path(seed, target, increment, &mut output)? {
                        if !seeded[next] {
                            seeded[next] = true;
                            seeds.push(next);
                        }
                    }
                }
            }
            self.progress.report(row + 1, rows);
        }

        debug!(paths, cells = output.valid_count(), "downstream accumulation finished");
        Ok(output)
    }

    /// Whether `cell` is a network cell of a [`Target::Network`]
    fn on_target(&self, cell: (usize, usize), target: Target<'_>) -> Result<bool> {
        match target {
            Target::Outlet => Ok(false),
            Target::Network(network) => is_channel(network, cell.0, cell.1),
        }
    }

    /// Walk one path from `seed`. Returns the cell to restart from when the
    /// walk was cut by a NoData increment.
    fn correct_path<I>(
        &self,
        seed: (usize, usize),
        target: Target<'_>,
        increment: &I,
        output: &mut Raster<f64>,
    ) -> Result<Option<(usize, usize)>>
    where
        I: StepIncrement + ?Sized,
    {
        if !output.get(seed.0, seed.1)?.is_nan() || self.on_target(seed, target)? {
            return Ok(None);
        }

        // Pass 1: unset cells of the path, the increments between them and
        // the value found where the walk stopped.
        let mut cells: Vec<(usize, usize)> = Vec::new();
        let mut increments: Vec<f64> = Vec::new();
        let mut total = 0.0;
        let mut tail: Option<f64> = None;

        let mut path = self.flow.trace_to_outlet(seed.0, seed.1);
        for cell in path.by_ref() {
            let (row, col) = cell?;
            if let Some(&prev) = cells.last() {
                let direction = match self.flow.code(prev.0, prev.1)? {
                    FlowCode::Flow(dir) => dir,
                    _ => break,
                };
                let Some(inc) = increment.increment(&self.step_info(prev, (row, col), direction))
                else {
                    let below = output.get(row, col)?;
                    return Ok(below.is_nan().then_some((row, col)));
                };
                increments.push(inc);
                total += inc;

                let existing = output.get(row, col)?;
                if !existing.is_nan() {
                    tail = Some(existing);
                    break;
                }
                // A rejected network cell ends the path without a value
                if self.on_target((row, col), target)? {
                    return Ok(None);
                }
            }
            cells.push((row, col));
        }

        let base = match (tail, target) {
            (Some(v), _) => v,
            (None, Target::Outlet) => match (path.end(), cells.last()) {
                (Some(PathEnd::Terminal | PathEnd::Invalid), Some(&last))
                    if increment.cell_valid(last) =>
                {
                    0.0
                }
                _ => return Ok(None),
            },
            // Never reached the network
            (None, Target::Network(_)) => return Ok(None),
        };

        // Pass 2: write the running total, subtracting each increment
        let mut remaining = total + base;
        for (idx, &(row, col)) in cells.iter().enumerate() {
            output.set(row, col, remaining)?;
            if let Some(inc) = increments.get(idx) {
                remaining = (remaining - inc).max(0.0);
            }
        }

        Ok(None)
    }

    /// Segment-difference policy.
    ///
    /// A link starts at a cell with a valid segment id that no contributor
    /// shares, and runs downstream while the id stays the same. Every cell of
    /// the link gets `|values(first) - values(last)|`, NoData when either end
    /// value is NoData. Where links overlap the link started first, in
    /// row-major order, keeps its value.
    pub fn segment_difference(
        &self,
        segments: &Raster<f64>,
        values: &Raster<f64>,
    ) -> Result<Raster<f64>> {
        let flow = self.raster();
        flow.ensure_same_shape(segments)?;
        flow.ensure_same_shape(values)?;

        let (rows, cols) = flow.shape();
        let mut output = flow.nodata_like();
        let mut written = Array2::<bool>::from_elem((rows, cols), false);
        let mut links = 0usize;

        for row in 0..rows {
            for col in 0..cols {
                let Some(id) = segments.valid(row, col)? else {
                    continue;
                };
                if self.flow.code(row, col)?.is_nodata() {
                    continue;
                }
                let mut starts_link = true;
                for (_, r, c) in self.flow.contributors(row, col)? {
                    if segments.valid(r, c)? == Some(id) {
                        starts_link = false;
                        break;
                    }
                }
                if !starts_link {
                    continue;
                }

                let mut link = vec![(row, col)];
                for cell in self.flow.trace_to_outlet(row, col).skip(1) {
                    let (r, c) = cell?;
                    if segments.valid(r, c)? != Some(id) {
                        break;
                    }
                    link.push((r, c));
                }

                let (lr, lc) = link[link.len() - 1];
                let diff = match (values.valid(row, col)?, values.valid(lr, lc)?) {
                    (Some(first), Some(last)) => (first - last).abs(),
                    _ => f64::NAN,
                };
                for &(r, c) in &link {
                    if !written[(r, c)] {
                        written[(r, c)] = true;
                        output.set(r, c, diff)?;
                    }
                }
                links += 1;
            }
            self.progress.report(row + 1, rows);
        }

        debug!(links, "segment differences measured");
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use horton_core::Region;

    const N: f64 = f64::NAN;

    fn grid(rows: usize, cols: usize, codes: &[f64]) -> Raster<f64> {
        Raster::from_vec(codes.to_vec(), rows, cols).unwrap()
    }

    /// Three branches meeting at (2,2), which drains S to the outlet (3,2):
    /// west (2,0)->(2,1)->M, north head (1,2)->M, diagonal (0,4)->(1,3)->M
    fn three_heads() -> Raster<f64> {
        grid(4, 5, &[
            N, N, N, N, 4.0,
            N, N, 3.0, 4.0, N,
            1.0, 1.0, 3.0, N, N,
            N, N, 10.0, N, N,
        ])
    }

    #[test]
    fn sum_merges_branch_values() {
        let flow = three_heads();
        let out = accumulate(&flow, Policy::Upstream(MergeRule::Sum), &Planimetric).unwrap();
        let s2 = 2f64.sqrt();

        assert_eq!(out.get(2, 0).unwrap(), 0.0);
        assert_eq!(out.get(0, 4).unwrap(), 0.0);
        assert_relative_eq!(out.get(2, 1).unwrap(), 1.0);
        assert_relative_eq!(out.get(1, 3).unwrap(), s2);
        // Incoming branches: 2 (west), 1 (north), 2*sqrt(2) (diagonal)
        assert_relative_eq!(out.get(2, 2).unwrap(), 3.0 + 2.0 * s2, epsilon = 1e-12);
        assert_relative_eq!(out.get(3, 2).unwrap(), 4.0 + 2.0 * s2, epsilon = 1e-12);
        assert!(out.get(0, 0).unwrap().is_nan());
    }

    #[test]
    fn max_keeps_longest_branch() {
        let flow = three_heads();
        let out = accumulate(&flow, Policy::Upstream(MergeRule::Max), &Planimetric).unwrap();
        assert_relative_eq!(out.get(2, 2).unwrap(), 2.0 * 2f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn main_stem_breaks_ties_by_direction_code() {
        let flow = three_heads();
        let mut area = Raster::filled(4, 5, 1.0);
        area.set(2, 1, 5.0).unwrap(); // west, code 5
        area.set(1, 2, 5.0).unwrap(); // north, code 7
        area.set(1, 3, 3.0).unwrap();
        let out = accumulate(&flow, Policy::Upstream(MergeRule::MainStem(&area)), &Planimetric)
            .unwrap();
        assert_relative_eq!(out.get(2, 2).unwrap(), 2.0);

        area.set(1, 3, 9.0).unwrap();
        let out = accumulate(&flow, Policy::Upstream(MergeRule::MainStem(&area)), &Planimetric)
            .unwrap();
        assert_relative_eq!(out.get(2, 2).unwrap(), 2.0 * 2f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn nodata_increment_poisons_downstream() {
        let flow = three_heads();
        let inc = |step: &StepInfo| (step.from != (2, 0)).then_some(step.length);
        let out = accumulate(&flow, Policy::Upstream(MergeRule::Sum), &inc).unwrap();
        assert!(out.get(2, 1).unwrap().is_nan());
        assert!(out.get(2, 2).unwrap().is_nan());
        assert!(out.get(3, 2).unwrap().is_nan());
        assert_relative_eq!(out.get(1, 3).unwrap(), 2f64.sqrt());
    }

    #[test]
    fn upstream_cycle_fails() {
        let flow = grid(1, 3, &[1.0, 1.0, 5.0]);
        assert!(matches!(
            accumulate(&flow, Policy::Upstream(MergeRule::Sum), &Topological),
            Err(Error::DirectionCycle { row: 0, col: 1 })
        ));
    }

    #[test]
    fn main_stem_area_must_match() {
        let flow = three_heads();
        let area = Raster::filled(2, 2, 1.0);
        assert!(matches!(
            accumulate(&flow, Policy::Upstream(MergeRule::MainStem(&area)), &Planimetric),
            Err(Error::SizeMismatch { .. })
        ));
    }

    fn east_row() -> Raster<f64> {
        let mut flow = grid(1, 4, &[1.0, 1.0, 1.0, 10.0]);
        flow.set_region(Region::square(0.0, 10.0, 10.0));
        flow
    }

    #[test]
    fn downstream_to_outlet() {
        let out = accumulate(&east_row(), Policy::Downstream(Target::Outlet), &Planimetric).unwrap();
        let got: Vec<f64> = out.data().iter().copied().collect();
        assert_eq!(got, vec![30.0, 20.0, 10.0, 0.0]);
    }

    #[test]
    fn downstream_joins_already_written_paths() {
        let flow = three_heads();
        let out = accumulate(&flow, Policy::Downstream(Target::Outlet), &Topological).unwrap();
        assert_eq!(out.get(3, 2).unwrap(), 0.0);
        assert_eq!(out.get(2, 2).unwrap(), 1.0);
        assert_eq!(out.get(1, 2).unwrap(), 2.0);
        assert_eq!(out.get(1, 3).unwrap(), 2.0);
        assert_eq!(out.get(0, 4).unwrap(), 3.0);
        assert_eq!(out.get(2, 0).unwrap(), 3.0);
    }

    #[test]
    fn downstream_to_network() {
        // Second row drains to an outlet that is not on the network
        let mut flow = grid(2, 4, &[1.0, 1.0, 1.0, 10.0, 1.0, 1.0, 1.0, 10.0]);
        flow.set_region(Region::square(0.0, 20.0, 10.0));
        let network = grid(2, 4, &[N, N, 1.0, 1.0, N, N, N, N]);

        let out = accumulate(&flow, Policy::Downstream(Target::Network(&network)), &Planimetric)
            .unwrap();
        let got: Vec<f64> = out.data().row(0).iter().copied().collect();
        assert_eq!(got, vec![20.0, 10.0, 0.0, 0.0]);
        assert_eq!(out.data().row(1).iter().filter(|v| !v.is_nan()).count(), 0);
    }

    #[test]
    fn nodata_increment_restarts_below() {
        let inc = |step: &StepInfo| (step.from != (0, 1)).then_some(step.length);
        let out = accumulate(&east_row(), Policy::Downstream(Target::Outlet), &inc).unwrap();
        assert!(out.get(0, 0).unwrap().is_nan());
        assert!(out.get(0, 1).unwrap().is_nan());
        assert_eq!(out.get(0, 2).unwrap(), 10.0);
        assert_eq!(out.get(0, 3).unwrap(), 0.0);
    }

    #[test]
    fn downstream_cycle_fails() {
        let flow = grid(1, 3, &[1.0, 1.0, 5.0]);
        assert!(matches!(
            accumulate(&flow, Policy::Downstream(Target::Outlet), &Topological),
            Err(Error::DirectionCycle { row: 0, col: 0 })
        ));
    }

    #[test]
    fn segment_difference_per_link() {
        let flow = east_row();
        let segments = grid(1, 4, &[1.0, 1.0, 2.0, 2.0]);
        let values = grid(1, 4, &[10.0, 7.0, 5.0, 1.0]);
        let out = AccumulationEngine::new(&flow)
            .segment_difference(&segments, &values)
            .unwrap();
        let got: Vec<f64> = out.data().iter().copied().collect();
        assert_eq!(got, vec![3.0, 3.0, 4.0, 4.0]);
    }

    #[test]
    fn segment_difference_nodata_end() {
        let flow = east_row();
        let segments = grid(1, 4, &[1.0, 1.0, 1.0, N]);
        let values = grid(1, 4, &[10.0, 7.0, N, 1.0]);
        let out = AccumulationEngine::new(&flow)
            .segment_difference(&segments, &values)
            .unwrap();
        assert!(out.get(0, 0).unwrap().is_nan());
        assert!(out.get(0, 2).unwrap().is_nan());
        assert!(out.get(0, 3).unwrap().is_nan());
    }

    #[test]
    fn surface_increment_uses_elevation_drop() {
        let elevation = grid(1, 2, &[4.0, 1.0]);
        let step = StepInfo {
            from: (0, 0),
            to: (0, 1),
            direction: Direction::East,
            length: 4.0,
        };
        assert_relative_eq!(Surface { elevation: &elevation }.increment(&step).unwrap(), 5.0);

        let holes = grid(1, 2, &[4.0, N]);
        assert!(Surface { elevation: &holes }.increment(&step).is_none());
    }

    #[test]
    fn hillslope_steps_are_scaled() {
        let network = grid(1, 2, &[N, 1.0]);
        let scaled = HillslopeScaled {
            inner: Planimetric,
            network: &network,
            ratio: 3.0,
        };
        let hillslope = StepInfo {
            from: (0, 0),
            to: (0, 1),
            direction: Direction::East,
            length: 2.0,
        };
        let channel = StepInfo { from: (0, 1), ..hillslope };
        assert_eq!(scaled.increment(&hillslope), Some(6.0));
        assert_eq!(scaled.increment(&channel), Some(2.0));
    }

    #[test]
    fn companion_grids_must_match_flow() {
        let flow = east_row();
        let elevation = Raster::filled(1, 2, 1.0);
        let surface = Surface { elevation: &elevation };
        for policy in [Policy::Downstream(Target::Outlet), Policy::Upstream(MergeRule::Sum)] {
            assert!(matches!(
                accumulate(&flow, policy, &surface),
                Err(Error::SizeMismatch { .. })
            ));
        }

        let network = Raster::filled(2, 4, 1.0);
        let scaled = HillslopeScaled {
            inner: Planimetric,
            network: &network,
            ratio: 2.0,
        };
        assert!(matches!(
            accumulate(&flow, Policy::Downstream(Target::Outlet), &scaled),
            Err(Error::SizeMismatch { .. })
        ));
    }

    #[test]
    fn rejected_path_ends_are_nodata() {
        let flow = east_row();
        let elevation = grid(1, 4, &[N, 2.0, 1.0, 0.0]);
        let surface = Surface { elevation: &elevation };
        let up = accumulate(&flow, Policy::Upstream(MergeRule::Max), &surface).unwrap();
        assert!(up.data().iter().all(|v| v.is_nan()));

        let elevation = grid(1, 4, &[3.0, 2.0, 1.0, N]);
        let surface = Surface { elevation: &elevation };
        let down = accumulate(&flow, Policy::Downstream(Target::Outlet), &surface).unwrap();
        assert!(down.data().iter().all(|v| v.is_nan()));

        let network = grid(1, 4, &[N, N, 1.0, 1.0]);
        let elevation = grid(1, 4, &[3.0, 2.0, 1.0, N]);
        let surface = Surface { elevation: &elevation };
        let out = accumulate(&flow, Policy::Downstream(Target::Network(&network)), &surface)
            .unwrap();
        assert!(out.get(0, 3).unwrap().is_nan());
        assert_eq!(out.get(0, 2).unwrap(), 0.0);
        assert_relative_eq!(out.get(0, 0).unwrap(), 2.0 * 101f64.sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn progress_is_reported_per_row() {
        let calls = std::sync::Mutex::new(Vec::new());
        let sink = |done: usize, total: usize| calls.lock().unwrap().push((done, total));
        let flow = three_heads();
        AccumulationEngine::new(&flow)
            .with_progress(&sink)
            .downstream(Target::Outlet, &Topological)
            .unwrap();
        assert_eq!(calls.lock().unwrap().len(), 4);
    }
}
