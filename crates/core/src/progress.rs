//! Progress reporting for long raster passes
//!
//! Algorithms report `(completed, total)` once per outer row loop. Reporting
//! is purely observational and never changes control flow.

/// Sink receiving progress updates
pub trait Progress: Sync {
    fn report(&self, completed: usize, total: usize);
}

/// Discards every update
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn report(&self, _completed: usize, _total: usize) {}
}

impl<F> Progress for F
where
    F: Fn(usize, usize) + Sync,
{
    fn report(&self, completed: usize, total: usize) {
        self(completed, total)
    }
}
