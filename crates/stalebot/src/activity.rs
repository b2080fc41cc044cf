//! Subtask activity checks.
//!
//! A parent ticket is only considered stale when none of its subtasks moved
//! recently either. Date arithmetic is left to the tracker's query language.

use crate::pagination::fetch_all;
use crate::tracker::{Tracker, TrackerResult};

/// Query selecting subtasks of `parent` updated within the last `within_days`
/// days, counted from the start of the tracker's current day.
///
/// ```
/// use stalebot::activity::subtask_activity_query;
///
/// assert_eq!(
///     subtask_activity_query("FLINK-7", 30),
///     "parent = FLINK-7 AND updated > startOfDay(-30d)"
/// );
/// ```
pub fn subtask_activity_query(parent: &str, within_days: u32) -> String {
    format!(
        "parent = {} AND updated > startOfDay(-{}d)",
        parent, within_days
    )
}

/// Whether any subtask of `parent` was updated within `within_days` days.
pub fn has_recently_updated_subtask<T: Tracker + ?Sized>(
    tracker: &T,
    parent: &str,
    within_days: u32,
) -> TrackerResult<bool> {
    let subtasks = fetch_all(tracker, &subtask_activity_query(parent, within_days))?;
    Ok(!subtasks.is_empty())
}
