//! Paginated query retrieval.
//!
//! Large result sets time out when requested in one go, so queries are issued
//! page by page until everything the tracker reports has been collected.

use crate::domain::Ticket;
use crate::tracker::{Tracker, TrackerResult};
use tracing::{info, warn};

/// Number of tickets requested per page
pub const PAGE_SIZE: usize = 200;

/// Fetch every ticket matching `query`.
///
/// The offset of each request is the number of tickets collected so far, not
/// a multiple of [`PAGE_SIZE`], so a short page never causes double counting.
/// `total` is re-read from every page and assumed to stay stable for the
/// duration of the sweep. An empty page before `total` is reached ends the
/// sweep early with a warning instead of looping.
///
/// Tracker failures are returned unmodified.
///
/// # Examples
///
/// ```
/// use stalebot::domain::Ticket;
/// use stalebot::pagination::fetch_all;
/// use stalebot::tracker::InMemoryTracker;
///
/// let tracker = InMemoryTracker::new();
/// let keys: Vec<String> = (0..450).map(|i| format!("FLINK-{}", i)).collect();
/// tracker.register_query("project = FLINK", keys);
///
/// let tickets = fetch_all(&tracker, "project = FLINK").unwrap();
/// assert_eq!(tickets.len(), 450);
/// assert_eq!(tracker.search_offsets("project = FLINK"), vec![0, 200, 400]);
/// ```
pub fn fetch_all<T: Tracker + ?Sized>(tracker: &T, query: &str) -> TrackerResult<Vec<Ticket>> {
    let mut tickets: Vec<Ticket> = Vec::new();
    let mut total = 1;

    while tickets.len() < total {
        let page = tracker.search(query, PAGE_SIZE, tickets.len())?;
        total = page.total;

        if page.tickets.is_empty() && tickets.len() < total {
            warn!(
                "\"{}\" reported {} results but returned an empty page at offset {}",
                query,
                total,
                tickets.len()
            );
            break;
        }

        tickets.extend(page.tickets);
    }

    info!("\"{}\" returned {} issues", query, tickets.len());
    Ok(tickets)
}
