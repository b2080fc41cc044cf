//! Built-in rules: close, unassign and deprioritize stale tickets.

use super::queries::QueryScope;
use super::{RuleReport, StaleRule};
use crate::config::{RuleConfig, RuleSettings};
use crate::errors::RuleError;
use crate::gateway::MutationGateway;
use crate::workflow::StaleWorkflow;

/// The two queries a rule feeds into the workflow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleQueries {
    /// Tickets that may be warned (phase 1)
    pub candidate: String,
    /// Tickets already warned and due for finalization (phase 2)
    pub warned: String,
}

impl RuleQueries {
    /// Generated queries, unless the rule overrides them verbatim
    pub fn from_config(rule: &RuleConfig, project: &str) -> Self {
        let scope = QueryScope {
            project,
            priority: rule.priority.as_deref(),
            assigned: rule.assigned,
        };
        Self {
            candidate: rule
                .candidate_query
                .clone()
                .unwrap_or_else(|| {
                    scope.candidate_query(&rule.warning_label, &rule.done_label, rule.stale_days)
                }),
            warned: rule
                .warned_query
                .clone()
                .unwrap_or_else(|| scope.warned_query(&rule.warning_label, rule.warning_days)),
        }
    }
}

/// Finalize warned tickets first, then warn new candidates, so a ticket is
/// never warned and finalized in the same run.
fn run_phases(
    rule: &dyn StaleRule,
    queries: &RuleQueries,
    workflow: &StaleWorkflow<'_>,
) -> Result<RuleReport, RuleError> {
    let finalized = workflow.handle_tickets_marked_stale(&queries.warned, rule)?;
    let marked = workflow.mark_stale_tickets_stale(&queries.candidate)?;
    Ok(RuleReport {
        rule: rule.name().to_string(),
        finalized,
        marked,
    })
}

/// Closes stale tickets with the "Auto Closed" resolution
pub struct CloseStaleRule {
    name: String,
    queries: RuleQueries,
    settings: RuleSettings,
}

impl CloseStaleRule {
    pub fn new(name: &str, queries: RuleQueries, settings: RuleSettings) -> Self {
        Self {
            name: name.to_string(),
            queries,
            settings,
        }
    }
}

impl StaleRule for CloseStaleRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn settings(&self) -> &RuleSettings {
        &self.settings
    }

    fn run(&self, workflow: &StaleWorkflow<'_>) -> Result<RuleReport, RuleError> {
        run_phases(self, &self.queries, workflow)
    }

    fn handle_stale_ticket(&self, gateway: &MutationGateway<'_>, key: &str) -> Result<(), RuleError> {
        gateway.close_issue(key)
    }
}

/// Frees stale assigned tickets for other contributors
pub struct UnassignStaleRule {
    name: String,
    queries: RuleQueries,
    settings: RuleSettings,
}

impl UnassignStaleRule {
    pub fn new(name: &str, queries: RuleQueries, settings: RuleSettings) -> Self {
        Self {
            name: name.to_string(),
            queries,
            settings,
        }
    }
}

impl StaleRule for UnassignStaleRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn settings(&self) -> &RuleSettings {
        &self.settings
    }

    fn run(&self, workflow: &StaleWorkflow<'_>) -> Result<RuleReport, RuleError> {
        run_phases(self, &self.queries, workflow)
    }

    fn handle_stale_ticket(&self, gateway: &MutationGateway<'_>, key: &str) -> Result<(), RuleError> {
        gateway.unassign(key)
    }
}

/// Lowers the priority of stale tickets, e.g. Major to Minor
pub struct DeprioritizeStaleRule {
    name: String,
    queries: RuleQueries,
    settings: RuleSettings,
    to: String,
}

impl DeprioritizeStaleRule {
    pub fn new(name: &str, queries: RuleQueries, settings: RuleSettings, to: String) -> Self {
        Self {
            name: name.to_string(),
            queries,
            settings,
            to,
        }
    }

    /// Priority stale tickets are moved to
    pub fn target_priority(&self) -> &str {
        &self.to
    }
}

impl StaleRule for DeprioritizeStaleRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn settings(&self) -> &RuleSettings {
        &self.settings
    }

    fn run(&self, workflow: &StaleWorkflow<'_>) -> Result<RuleReport, RuleError> {
        run_phases(self, &self.queries, workflow)
    }

    fn handle_stale_ticket(&self, gateway: &MutationGateway<'_>, key: &str) -> Result<(), RuleError> {
        gateway.set_priority(key, &self.to)
    }
}
