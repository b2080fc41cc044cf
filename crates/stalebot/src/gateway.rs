//! Mutation gateway: the only path through which the bot changes tickets.
//!
//! Every operation honors the [`ExecutionMode`] chosen at construction. In
//! [`ExecutionMode::DryRun`] no tracker write happens; instead exactly one log
//! line describes the write that would have been made, so a dry run previews
//! a live run action for action.

use crate::domain::{with_label, with_label_replaced, FieldMap, Ticket};
use crate::errors::RuleError;
use crate::tracker::Tracker;
use serde_json::json;
use std::fmt;
use tracing::info;

/// Status a ticket is moved to by [`MutationGateway::close_issue`]
pub const CLOSED_STATUS: &str = "Closed";

/// Resolution recorded by [`MutationGateway::close_issue`]
pub const AUTO_CLOSED_RESOLUTION: &str = "Auto Closed";

/// Whether mutations reach the tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// Apply every mutation
    #[default]
    Live,
    /// Log mutations instead of applying them
    DryRun,
}

impl ExecutionMode {
    /// Map a `--dry-run` flag to a mode
    pub fn from_dry_run(dry_run: bool) -> Self {
        if dry_run {
            ExecutionMode::DryRun
        } else {
            ExecutionMode::Live
        }
    }

    pub fn is_dry_run(self) -> bool {
        self == ExecutionMode::DryRun
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Live => write!(f, "live"),
            ExecutionMode::DryRun => write!(f, "dry-run"),
        }
    }
}

/// Wraps a tracker and applies or previews ticket mutations
pub struct MutationGateway<'a> {
    tracker: &'a dyn Tracker,
    mode: ExecutionMode,
}

impl<'a> MutationGateway<'a> {
    pub fn new(tracker: &'a dyn Tracker, mode: ExecutionMode) -> Self {
        Self { tracker, mode }
    }

    /// Append `label` to the ticket's labels.
    pub fn add_label(&self, ticket: &Ticket, label: &str) -> Result<(), RuleError> {
        let labels = with_label(&ticket.labels, label);

        if self.mode.is_dry_run() {
            info!("DRY RUN ({}): Adding label \"{}\".", ticket.key, label);
            return Ok(());
        }
        self.tracker
            .update_fields(&ticket.key, &labels_field(labels))?;
        Ok(())
    }

    /// Swap `old_label` for `new_label`.
    ///
    /// Fails with [`RuleError::LabelNotPresent`] in both modes when the
    /// ticket does not carry `old_label`; nothing is written in that case.
    pub fn replace_label(
        &self,
        ticket: &Ticket,
        old_label: &str,
        new_label: &str,
    ) -> Result<(), RuleError> {
        let labels = with_label_replaced(&ticket.key, &ticket.labels, old_label, new_label)?;

        if self.mode.is_dry_run() {
            info!(
                "DRY RUN ({}): Replace label \"{}\" for \"{}\".",
                ticket.key, old_label, new_label
            );
            return Ok(());
        }
        self.tracker
            .update_fields(&ticket.key, &labels_field(labels))?;
        Ok(())
    }

    pub fn add_comment(&self, key: &str, text: &str) -> Result<(), RuleError> {
        if self.mode.is_dry_run() {
            info!("DRY RUN ({}): Adding comment \"{}\".", key, text);
            return Ok(());
        }
        self.tracker.add_comment(key, text)?;
        Ok(())
    }

    /// Close the ticket with the "Auto Closed" resolution.
    pub fn close_issue(&self, key: &str) -> Result<(), RuleError> {
        if self.mode.is_dry_run() {
            info!("DRY RUN ({}): Closing.", key);
            return Ok(());
        }
        let mut fields = FieldMap::new();
        fields.insert(
            "resolution".to_string(),
            json!({ "name": AUTO_CLOSED_RESOLUTION }),
        );
        self.tracker.set_status(key, CLOSED_STATUS, &fields)?;
        Ok(())
    }

    pub fn unassign(&self, key: &str) -> Result<(), RuleError> {
        if self.mode.is_dry_run() {
            info!("DRY RUN ({}): Unassigning.", key);
            return Ok(());
        }
        self.tracker.set_assignee(key, None)?;
        Ok(())
    }

    pub fn set_priority(&self, key: &str, priority: &str) -> Result<(), RuleError> {
        if self.mode.is_dry_run() {
            info!("DRY RUN ({}): Setting priority to {}.", key, priority);
            return Ok(());
        }
        let mut fields = FieldMap::new();
        fields.insert("priority".to_string(), json!({ "name": priority }));
        self.tracker.update_fields(key, &fields)?;
        Ok(())
    }
}

fn labels_field(labels: Vec<String>) -> FieldMap {
    let mut fields = FieldMap::new();
    fields.insert("labels".to_string(), json!(labels));
    fields
}
