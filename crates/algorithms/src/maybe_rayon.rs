//! Row-parallel execution with a sequential fallback.
//!
//! With the `parallel` feature, cell-wise passes fan out over rows with
//! rayon. Without it (e.g. WASM builds) the same calls run sequentially.
//! Traversals never go through here: they write to shared cells and stay
//! sequential.

use horton_core::Result;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Build each row with `f` and concatenate the rows in order.
///
/// The first error (in row order when sequential, any row when parallel)
/// aborts the whole pass.
#[cfg(feature = "parallel")]
pub fn collect_rows<T, F>(rows: usize, f: F) -> Result<Vec<T>>
where
    T: Send,
    F: Fn(usize) -> Result<Vec<T>> + Sync + Send,
{
    let per_row: Vec<Vec<T>> = (0..rows).into_par_iter().map(f).collect::<Result<_>>()?;
    Ok(per_row.into_iter().flatten().collect())
}

#[cfg(not(feature = "parallel"))]
pub fn collect_rows<T, F>(rows: usize, f: F) -> Result<Vec<T>>
where
    T: Send,
    F: Fn(usize) -> Result<Vec<T>> + Sync + Send,
{
    let mut out = Vec::new();
    for row in 0..rows {
        out.extend(f(row)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use horton_core::Error;

    #[test]
    fn rows_are_concatenated_in_order() {
        let out = collect_rows(3, |row| Ok(vec![row * 10, row * 10 + 1])).unwrap();
        assert_eq!(out, vec![0, 1, 10, 11, 20, 21]);
    }

    #[test]
    fn row_error_aborts() {
        let out: Result<Vec<usize>> = collect_rows(4, |row| {
            if row == 2 {
                Err(Error::Other("bad row".into()))
            } else {
                Ok(vec![row])
            }
        });
        assert!(out.is_err());
    }
}
