//! Fact-data collaborator contract
//!
//! The evaluation core never talks to storage; it asks a [`CellReader`]
//! for the cell under the current dimensional assignment. A reader backed
//! by batched fetches may answer [`CellValue::NotYetAvailable`] for cells
//! it has not loaded yet; the request itself is the signal to load them,
//! and the axis driver re-evaluates once the reader has made progress.

use crate::context::Evaluator;
use hypercube_types::CellValue;

/// Read access to fact cells.
pub trait CellReader: Send + Sync {
    /// The cell value under the evaluator's full current context.
    ///
    /// Returns [`CellValue::Null`] for a genuinely empty cell and
    /// [`CellValue::NotYetAvailable`] for one that has not been fetched.
    /// There is no blocking here; the sentinel is synchronous.
    fn cell(&self, ev: &Evaluator) -> CellValue;
}

/// A reader over no data: every cell is empty. Useful as a default and in
/// pure metadata evaluations.
#[derive(Debug, Default)]
pub struct EmptyCellReader;

impl CellReader for EmptyCellReader {
    fn cell(&self, _ev: &Evaluator) -> CellValue {
        CellValue::Null
    }
}
