//! Error types for the tracker bindings, the workflow and configuration.
//!
//! Library code returns the typed errors below. The binary wraps them in
//! `anyhow` and renders configuration problems as [`ActionableError`]s so the
//! operator sees what went wrong and how to fix it.

use std::fmt;
use thiserror::Error;

/// Failure reported by a tracker collaborator.
///
/// Nothing in the bot retries these; they abort the running phase.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("{method} {url} returned HTTP {status}")]
    Http {
        method: String,
        url: String,
        status: u16,
    },

    #[error("transport failure talking to tracker: {0}")]
    Transport(String),

    #[error("unexpected tracker response: {0}")]
    Decode(String),

    #[error("ticket not found: {0}")]
    NotFound(String),

    #[error("ticket {key} has no transition to status '{status}'")]
    TransitionUnavailable { key: String, status: String },
}

/// Failure while running a stale-ticket rule
#[derive(Debug, Error)]
pub enum RuleError {
    /// `replace_label` was asked to remove a label the ticket does not carry
    #[error("label '{label}' is not present on {key}")]
    LabelNotPresent { key: String, label: String },

    #[error(transparent)]
    Tracker(#[from] TrackerError),
}

/// Problems found while parsing a comment template
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TemplateError {
    #[error("unknown placeholder '{{{0}}}'")]
    UnknownPlaceholder(String),

    #[error("placeholder '{{{name}}}' is not available in a {context} comment")]
    PlaceholderNotAllowed { name: String, context: String },

    #[error("unmatched '{brace}' at byte {offset}")]
    UnbalancedBrace { brace: char, offset: usize },

    #[error("empty placeholder '{{}}' at byte {0}")]
    EmptyPlaceholder(usize),

    #[error("format spec '{spec}' on placeholder '{{{name}}}' is not supported")]
    UnsupportedFormatSpec { name: String, spec: String },
}

/// Semantic problems in an otherwise well-formed configuration file
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("no rules configured")]
    NoRules,

    #[error("duplicate rule name '{0}'")]
    DuplicateRule(String),

    #[error("rule '{rule}': {field} must not be empty")]
    EmptyField { rule: String, field: &'static str },

    #[error("rule '{rule}': warning_label and done_label are both '{label}'")]
    LabelsNotDistinct { rule: String, label: String },

    #[error("rule '{rule}': deprioritize rules need a target priority ('to')")]
    MissingTargetPriority { rule: String },

    #[error("rule '{rule}': deprioritize rules need the priority they apply to ('priority')")]
    MissingSourcePriority { rule: String },

    #[error("rule '{rule}': priority and to are both '{priority}'")]
    PriorityUnchanged { rule: String, priority: String },

    #[error("rule '{rule}': unassign rules must only consider assigned tickets")]
    UnassignNotScoped { rule: String },

    #[error("rule '{rule}': {field}: {source}")]
    Template {
        rule: String,
        field: &'static str,
        #[source]
        source: TemplateError,
    },

    #[error("unknown rule '{0}'")]
    UnknownRule(String),

    #[error("environment variable {0} is not set")]
    MissingToken(String),
}

/// An error with diagnostic context and remediation steps.
///
/// # Example
///
/// ```
/// use stalebot::errors::ActionableError;
///
/// let error = ActionableError::new("Rule 'stale-minor' is invalid")
///     .with_cause("warning_comment uses {done_label}")
///     .with_remedy("Remove the placeholder or move it to done_comment");
///
/// eprintln!("{}", error);
/// ```
#[derive(Debug, Clone)]
pub struct ActionableError {
    error: String,
    causes: Vec<String>,
    remediation: Vec<String>,
}

impl ActionableError {
    /// Create a new actionable error with the given message.
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            causes: Vec::new(),
            remediation: Vec::new(),
        }
    }

    /// Add a possible cause (diagnostic hint).
    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.causes.push(cause.into());
        self
    }

    /// Add a remediation step (actionable fix).
    pub fn with_remedy(mut self, remedy: impl Into<String>) -> Self {
        self.remediation.push(remedy.into());
        self
    }

    /// Convert to a formatted error message suitable for display.
    pub fn to_error_message(&self) -> String {
        let mut msg = format!("Error: {}\n", self.error);

        if !self.causes.is_empty() {
            msg.push_str("\nPossible causes:\n");
            for cause in &self.causes {
                msg.push_str(&format!("  • {}\n", cause));
            }
        }

        if !self.remediation.is_empty() {
            msg.push_str("\nTo fix:\n");
            for remedy in &self.remediation {
                msg.push_str(&format!("  • {}\n", remedy));
            }
        }

        msg
    }
}

impl fmt::Display for ActionableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_error_message())
    }
}

impl std::error::Error for ActionableError {}

impl From<&ConfigError> for ActionableError {
    fn from(err: &ConfigError) -> Self {
        let base = ActionableError::new(err.to_string());
        match err {
            ConfigError::NoRules => base
                .with_cause("The [[rules]] table is missing or empty")
                .with_remedy("Add at least one [[rules]] entry to the configuration file"),
            ConfigError::DuplicateRule(name) => base
                .with_cause(format!("Two [[rules]] entries are named '{}'", name))
                .with_remedy("Give every rule a unique name"),
            ConfigError::EmptyField { field, .. } => {
                base.with_remedy(format!("Set a non-empty value for {}", field))
            }
            ConfigError::LabelsNotDistinct { .. } => base
                .with_cause("Finalized tickets would still match the warned-ticket query")
                .with_remedy("Use different warning_label and done_label values"),
            ConfigError::MissingTargetPriority { .. } => {
                base.with_remedy("Add e.g. to = \"Minor\" to the rule")
            }
            ConfigError::MissingSourcePriority { .. } => base
                .with_cause("Deprioritized tickets would still match the candidate query")
                .with_remedy("Add e.g. priority = \"Major\" to the rule"),
            ConfigError::PriorityUnchanged { .. } => base
                .with_cause("Finalized tickets would keep the priority the rule looks for")
                .with_remedy("Set to to a lower priority than priority"),
            ConfigError::UnassignNotScoped { .. } => base
                .with_cause("Unassigned tickets would still match the candidate query")
                .with_remedy("Add assigned = true to the rule"),
            ConfigError::Template { field, source, .. } => {
                let base = base.with_cause(format!("{} could not be parsed", field));
                match source {
                    TemplateError::PlaceholderNotAllowed { .. } => base.with_remedy(
                        "Warning comments may use {stale_days}, {warning_days}, {warning_label}; \
                         done comments may use {warning_days}, {warning_label}, {done_label}",
                    ),
                    TemplateError::UnsupportedFormatSpec { name, .. } => base
                        .with_remedy(format!("Write the placeholder as {{{}}} without a format spec", name)),
                    _ => base.with_remedy("Escape literal braces as '{{' and '}}'"),
                }
            }
            ConfigError::UnknownRule(_) => base
                .with_cause("The --rule argument does not match any configured rule")
                .with_remedy("List configured rules: stalebot list-rules"),
            ConfigError::MissingToken(var) => base
                .with_cause("The tracker access token is read from the environment")
                .with_remedy(format!("export {}=<personal access token>", var))
                .with_remedy("Or run with --dry-run against a tracker that allows anonymous reads"),
        }
    }
}
