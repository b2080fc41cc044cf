//! Stale-ticket rules.
//!
//! A rule decides which tickets are candidates, which ones are already warned,
//! and what happens to a ticket whose grace period ran out. Everything else
//! (paging, the subtask check, labels and comments) is shared through
//! [`StaleWorkflow`].

use crate::config::{BotConfig, RuleConfig, RuleKind, RuleSettings, TrackerConfig};
use crate::errors::{ConfigError, RuleError};
use crate::gateway::{ExecutionMode, MutationGateway};
use crate::tracker::Tracker;
use crate::workflow::{PhaseReport, StaleWorkflow};
use serde::Serialize;
use tracing::info;

pub mod builtin;
pub mod queries;

pub use builtin::{CloseStaleRule, DeprioritizeStaleRule, RuleQueries, UnassignStaleRule};

/// Contract every stale-ticket rule satisfies
pub trait StaleRule {
    /// Name used in logs and by `--rule`
    fn name(&self) -> &str;

    /// Labels, windows and comment templates of this rule
    fn settings(&self) -> &RuleSettings;

    /// Run both phases with this rule's queries
    fn run(&self, workflow: &StaleWorkflow<'_>) -> Result<RuleReport, RuleError>;

    /// Final action for a ticket whose grace period ran out.
    ///
    /// Called after the done comment was posted and the done label applied.
    fn handle_stale_ticket(&self, gateway: &MutationGateway<'_>, key: &str)
        -> Result<(), RuleError>;
}

/// Outcome of one rule run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleReport {
    pub rule: String,
    /// Phase 2: tickets finalized
    pub finalized: PhaseReport,
    /// Phase 1: tickets warned or skipped
    pub marked: PhaseReport,
}

/// Build the rule described by one `[[rules]]` table
pub fn build_rule(
    rule: &RuleConfig,
    tracker: &TrackerConfig,
) -> Result<Box<dyn StaleRule>, ConfigError> {
    let settings = rule.settings(Some(tracker.browse_url()))?;
    let queries = RuleQueries::from_config(rule, &tracker.project);

    Ok(match rule.kind {
        RuleKind::Close => Box::new(CloseStaleRule::new(&rule.name, queries, settings)),
        RuleKind::Unassign => Box::new(UnassignStaleRule::new(&rule.name, queries, settings)),
        RuleKind::Deprioritize => {
            let to = rule
                .to
                .clone()
                .ok_or_else(|| ConfigError::MissingTargetPriority {
                    rule: rule.name.clone(),
                })?;
            Box::new(DeprioritizeStaleRule::new(
                &rule.name, queries, settings, to,
            ))
        }
    })
}

/// What `list-rules` shows for one configured rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleSummary {
    pub name: String,
    pub kind: RuleKind,
    pub stale_days: u32,
    pub warning_days: u32,
    pub warning_label: String,
    pub done_label: String,
    pub candidate_query: String,
    pub warned_query: String,
}

impl RuleSummary {
    pub fn from_config(rule: &RuleConfig, tracker: &TrackerConfig) -> Self {
        let queries = RuleQueries::from_config(rule, &tracker.project);
        Self {
            name: rule.name.clone(),
            kind: rule.kind,
            stale_days: rule.stale_days,
            warning_days: rule.warning_days,
            warning_label: rule.warning_label.clone(),
            done_label: rule.done_label.clone(),
            candidate_query: queries.candidate,
            warned_query: queries.warned,
        }
    }
}

/// The rules selected for one invocation, run in configuration order
pub struct RuleSet {
    rules: Vec<Box<dyn StaleRule>>,
}

impl RuleSet {
    pub fn new(rules: Vec<Box<dyn StaleRule>>) -> Self {
        Self { rules }
    }

    /// Build the configured rules, or only those named in `selected`
    pub fn from_config(config: &BotConfig, selected: &[String]) -> Result<Self, ConfigError> {
        let rules = config
            .select_rules(selected)?
            .into_iter()
            .map(|rule| build_rule(rule, &config.tracker))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(rules))
    }

    pub fn names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Run every rule in order, stopping at the first failure.
    pub fn run_all(
        &self,
        tracker: &dyn Tracker,
        mode: ExecutionMode,
    ) -> Result<Vec<RuleReport>, RuleError> {
        let mut reports = Vec::with_capacity(self.rules.len());

        for rule in &self.rules {
            info!("Running rule {} ({})", rule.name(), mode);
            let workflow = StaleWorkflow::new(tracker, mode, rule.settings().clone());
            let report = rule.run(&workflow)?;
            info!(
                "Rule {} finished: {} finalized, {} marked stale, {} skipped",
                report.rule, report.finalized.changed, report.marked.changed, report.marked.skipped
            );
            reports.push(report);
        }

        Ok(reports)
    }
}
