//! Miss-tolerant backward scan over a member list
//!
//! Supports "last member with data" style functions when the fact store
//! loads cells lazily. A naive implementation would either stop at the
//! first unfetched cell (one fetched cell per pass, O(k) passes for k
//! empty trailing cells) or fetch the whole list eagerly. The policy here
//! keeps scanning past unfetched cells while their number stays below
//! `2 * nulls_seen + 1`: each pass may speculate about twice as far as the
//! previous one confirmed, which bounds the number of passes by
//! O(log k) while never fetching more than a constant factor of the cells
//! a clairvoyant scan would.

use crate::calc::Calc;
use crate::context::Evaluator;
use crate::error::EvalResult;
use hypercube_model::Member;
use hypercube_types::CellValue;
use log::debug;
use std::sync::Arc;

/// Scan `members` from the end for the last member whose `value` is not
/// empty.
///
/// Returns `CellValue::Member` when a non-empty member was found with no
/// unfetched cell between it and the end of the list,
/// `CellValue::NotYetAvailable` when the pass had to stop on speculation
/// (the caller re-runs it after the reader has loaded the requested
/// cells), and `CellValue::Null` when the list was exhausted cleanly with
/// every cell empty.
pub fn last_non_empty(
    ev: &Evaluator,
    members: &[Arc<Member>],
    value: &dyn Calc,
) -> EvalResult<CellValue> {
    let mut nulls_seen: usize = 0;
    let mut misses: usize = 0;

    for member in members.iter().rev() {
        if misses > 2 * nulls_seen {
            debug!(
                "scan pass stopping after {} unfetched cells over {} confirmed empties",
                misses, nulls_seen
            );
            return Ok(CellValue::NotYetAvailable);
        }
        let cell = ev.with_member(member.clone(), |scoped| value.evaluate(scoped))?;
        match cell {
            CellValue::NotYetAvailable => misses += 1,
            CellValue::Null => nulls_seen += 1,
            _ => {
                if misses > 0 {
                    // An unfetched cell closer to the end could still be
                    // the answer.
                    return Ok(CellValue::NotYetAvailable);
                }
                return Ok(CellValue::Member(member.clone()));
            }
        }
    }

    if misses > 0 {
        return Ok(CellValue::NotYetAvailable);
    }
    Ok(CellValue::Null)
}
