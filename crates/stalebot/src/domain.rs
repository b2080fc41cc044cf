//! Core domain types shared by the tracker bindings and the stale-ticket workflow.
//!
//! The bot never creates or deletes tickets. It reads a handful of attributes
//! and patches them through the mutation gateway.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::errors::RuleError;

/// Field name to JSON value, as accepted by [`Tracker::update_fields`].
///
/// [`Tracker::update_fields`]: crate::tracker::Tracker::update_fields
pub type FieldMap = BTreeMap<String, Value>;

/// A ticket as seen by the bot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Unique tracker key (e.g. "FLINK-1234")
    pub key: String,
    /// Labels currently attached, in tracker order
    #[serde(default)]
    pub labels: Vec<String>,
    /// Workflow status name
    #[serde(default)]
    pub status: Option<String>,
    /// Assignee account name, `None` when unassigned
    #[serde(default)]
    pub assignee: Option<String>,
    /// Priority name
    #[serde(default)]
    pub priority: Option<String>,
}

impl Ticket {
    /// Create a bare ticket with only a key
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            labels: Vec::new(),
            status: None,
            assignee: None,
            priority: None,
        }
    }

    /// Builder-style helper to attach labels
    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Builder-style helper to set the assignee
    pub fn with_assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assignee = Some(assignee.into());
        self
    }

    /// Builder-style helper to set the priority
    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = Some(priority.into());
        self
    }

    /// Check whether the ticket carries a label
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }
}

/// One page of search results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPage {
    /// Number of matches the tracker reports for the whole query
    pub total: usize,
    /// Tickets on this page
    pub tickets: Vec<Ticket>,
}

/// Append a label to a label set.
///
/// Duplicates are not filtered; avoiding them is the caller's job.
pub fn with_label(labels: &[String], label: &str) -> Vec<String> {
    let mut updated = labels.to_vec();
    updated.push(label.to_string());
    updated
}

/// Append `new_label`, then remove exactly one occurrence of `old_label`.
///
/// # Errors
///
/// Returns [`RuleError::LabelNotPresent`] when `old_label` is not in `labels`.
///
/// # Examples
///
/// ```
/// use stalebot::domain::with_label_replaced;
///
/// let labels = vec!["stale-minor".to_string(), "starter".to_string()];
/// let updated = with_label_replaced("FLINK-1", &labels, "stale-minor", "auto-closed").unwrap();
/// assert_eq!(updated, vec!["starter", "auto-closed"]);
///
/// assert!(with_label_replaced("FLINK-1", &labels, "missing", "auto-closed").is_err());
/// ```
pub fn with_label_replaced(
    key: &str,
    labels: &[String],
    old_label: &str,
    new_label: &str,
) -> Result<Vec<String>, RuleError> {
    let mut updated = with_label(labels, new_label);
    let position = updated
        .iter()
        .position(|l| l == old_label)
        .ok_or_else(|| RuleError::LabelNotPresent {
            key: key.to_string(),
            label: old_label.to_string(),
        })?;
    updated.remove(position);
    Ok(updated)
}
