//! The two-phase stale-ticket workflow.
//!
//! Phase 1 ([`StaleWorkflow::mark_stale_tickets_stale`]) warns candidates whose
//! subtasks have been quiet for `stale_days`. Phase 2
//! ([`StaleWorkflow::handle_tickets_marked_stale`]) finalizes tickets that still
//! carry the warning label: done comment, label swap, then the rule's own
//! final action.
//!
//! Neither phase is transactional. A failure aborts the phase and leaves
//! already processed tickets as they are.

use crate::activity;
use crate::config::RuleSettings;
use crate::domain::Ticket;
use crate::errors::RuleError;
use crate::gateway::{ExecutionMode, MutationGateway};
use crate::pagination;
use crate::rules::StaleRule;
use crate::tracker::{Tracker, TrackerResult};
use serde::Serialize;
use tracing::info;

/// What a phase did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PhaseReport {
    /// Tickets returned by the phase's query
    pub examined: usize,
    /// Tickets that were warned (phase 1) or finalized (phase 2)
    pub changed: usize,
    /// Tickets left alone because of recent subtask activity
    pub skipped: usize,
}

/// Shared machinery for one rule: query retrieval, the activity check and
/// the mutation gateway, bound to that rule's settings.
pub struct StaleWorkflow<'a> {
    tracker: &'a dyn Tracker,
    gateway: MutationGateway<'a>,
    settings: RuleSettings,
}

impl<'a> StaleWorkflow<'a> {
    pub fn new(tracker: &'a dyn Tracker, mode: ExecutionMode, settings: RuleSettings) -> Self {
        Self {
            tracker,
            gateway: MutationGateway::new(tracker, mode),
            settings,
        }
    }

    /// All tickets matching `query`, fetched page by page
    pub fn get_issues(&self, query: &str) -> TrackerResult<Vec<Ticket>> {
        pagination::fetch_all(self.tracker, query)
    }

    pub fn has_recently_updated_subtask(&self, parent: &str, within_days: u32) -> TrackerResult<bool> {
        activity::has_recently_updated_subtask(self.tracker, parent, within_days)
    }

    /// Phase 1: warn every candidate without recent subtask activity.
    ///
    /// The candidate query must exclude tickets that already carry the warning
    /// label; this method does not check for it.
    pub fn mark_stale_tickets_stale(&self, candidate_query: &str) -> Result<PhaseReport, RuleError> {
        info!("Looking for stale tickets.");
        let candidates = self.get_issues(candidate_query)?;
        let mut report = PhaseReport {
            examined: candidates.len(),
            ..PhaseReport::default()
        };

        for candidate in candidates {
            let key = candidate.key;
            // Fields may have changed since the candidate query ran
            let ticket = self.tracker.get_ticket(&key)?;
            let link = self.settings.ticket_link(&key);

            if self.has_recently_updated_subtask(&key, self.settings.stale_days)? {
                info!(
                    "Found {}, but it has recently updated subtasks. Ignoring for now.",
                    link
                );
                report.skipped += 1;
                continue;
            }

            info!("Found {}. It is marked stale now.", link);
            self.gateway
                .add_label(&ticket, &self.settings.warning_label)?;
            self.gateway
                .add_comment(&key, &self.settings.warning_text())?;
            report.changed += 1;
        }

        Ok(report)
    }

    /// Phase 2: finalize every ticket returned by `warned_query`.
    ///
    /// For each ticket the done comment is posted and the warning label is
    /// swapped for the done label before `rule`'s final action runs.
    pub fn handle_tickets_marked_stale(
        &self,
        warned_query: &str,
        rule: &dyn StaleRule,
    ) -> Result<PhaseReport, RuleError> {
        info!(
            "Looking for tickets previously marked as {}.",
            self.settings.warning_label
        );
        let warned = self.get_issues(warned_query)?;
        let mut report = PhaseReport {
            examined: warned.len(),
            ..PhaseReport::default()
        };

        for ticket in warned {
            info!(
                "Found {}. It is now processed as stale.",
                self.settings.ticket_link(&ticket.key)
            );

            self.gateway
                .add_comment(&ticket.key, &self.settings.done_text())?;
            self.gateway.replace_label(
                &ticket,
                &self.settings.warning_label,
                &self.settings.done_label,
            )?;
            rule.handle_stale_ticket(&self.gateway, &ticket.key)?;
            report.changed += 1;
        }

        Ok(report)
    }
}
