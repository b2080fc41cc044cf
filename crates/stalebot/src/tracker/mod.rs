//! Tracker abstraction layer.
//!
//! This module defines the `Tracker` trait that the stale-ticket workflow
//! consumes, allowing different backends (the Jira REST API, an in-memory
//! fake for tests) to be used interchangeably.

use crate::domain::{FieldMap, SearchPage, Ticket};
use crate::errors::TrackerError;

pub mod jira;
pub mod memory;

pub use jira::JiraClient;
pub use memory::InMemoryTracker;

/// Result alias for tracker operations
pub type TrackerResult<T> = Result<T, TrackerError>;

/// Operations the workflow needs from an issue tracker.
///
/// All calls are synchronous. Failures are returned unmodified; retrying is
/// up to the implementation.
///
/// # Examples
///
/// ```
/// use stalebot::domain::Ticket;
/// use stalebot::tracker::{InMemoryTracker, Tracker};
///
/// let tracker = InMemoryTracker::new();
/// tracker.insert(Ticket::new("FLINK-1"));
/// tracker.register_query("project = FLINK", ["FLINK-1"]);
///
/// let page = tracker.search("project = FLINK", 200, 0).unwrap();
/// assert_eq!(page.total, 1);
/// assert_eq!(page.tickets[0].key, "FLINK-1");
/// ```
pub trait Tracker {
    /// Run a search query and return one page of results.
    ///
    /// `total` on the returned page is the number of matches for the whole
    /// query, not just this page.
    fn search(&self, query: &str, limit: usize, offset: usize) -> TrackerResult<SearchPage>;

    /// Fetch the current state of a single ticket.
    fn get_ticket(&self, key: &str) -> TrackerResult<Ticket>;

    /// Overwrite the given fields of a ticket.
    fn update_fields(&self, key: &str, fields: &FieldMap) -> TrackerResult<()>;

    /// Post a comment on a ticket.
    fn add_comment(&self, key: &str, text: &str) -> TrackerResult<()>;

    /// Move a ticket to `status`, setting `extra_fields` as part of the transition.
    fn set_status(&self, key: &str, status: &str, extra_fields: &FieldMap) -> TrackerResult<()>;

    /// Assign a ticket, or unassign it with `None`.
    fn set_assignee(&self, key: &str, assignee: Option<&str>) -> TrackerResult<()>;
}
