//! Configuration file loading and validation.
//!
//! The bot is configured through a TOML file (`stalebot.toml` by default)
//! describing the tracker to talk to and one `[[rules]]` table per stale-ticket
//! rule. The access token never lives in the file; `token_env` names the
//! environment variable that holds it.

use crate::errors::ConfigError;
use crate::template::{
    CommentTemplate, Placeholder, TemplateParams, DONE_PLACEHOLDERS, WARNING_PLACEHOLDERS,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "stalebot.toml";

fn default_token_env() -> String {
    "JIRA_TOKEN".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// Tracker connection settings
    pub tracker: TrackerConfig,
    /// Stale-ticket rules, run in file order
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

/// Tracker connection settings
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrackerConfig {
    /// Base URL of the Jira instance, e.g. "https://issues.apache.org/jira"
    pub url: String,
    /// Project key every generated query is scoped to
    pub project: String,
    /// Environment variable holding the access token (default: JIRA_TOKEN)
    #[serde(default = "default_token_env")]
    pub token_env: String,
    /// Per-request timeout in seconds (default: 60)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl TrackerConfig {
    /// Read the access token from the environment, if set and non-empty
    pub fn token(&self) -> Option<String> {
        std::env::var(&self.token_env)
            .ok()
            .filter(|t| !t.trim().is_empty())
    }

    /// Like [`TrackerConfig::token`] but failing when the token is missing
    pub fn require_token(&self) -> Result<String, ConfigError> {
        self.token()
            .ok_or_else(|| ConfigError::MissingToken(self.token_env.clone()))
    }

    /// Link prefix for human-readable log lines
    pub fn browse_url(&self) -> String {
        format!("{}/browse", self.url.trim_end_matches('/'))
    }
}

/// What happens to a ticket once its grace period ran out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Close with the "Auto Closed" resolution
    Close,
    /// Remove the assignee
    Unassign,
    /// Lower the priority to `to`
    Deprioritize,
}

/// One `[[rules]]` table
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    /// Unique rule name, used by `--rule`
    pub name: String,
    pub kind: RuleKind,
    /// Only consider tickets with this priority (optional)
    pub priority: Option<String>,
    /// Target priority for `deprioritize` rules
    pub to: Option<String>,
    /// Only consider assigned tickets (default: false)
    #[serde(default)]
    pub assigned: bool,
    /// Days without activity (including subtasks) before a ticket is warned
    pub stale_days: u32,
    /// Grace period in days between warning and final action
    pub warning_days: u32,
    pub warning_label: String,
    pub done_label: String,
    pub warning_comment: String,
    pub done_comment: String,
    /// Replaces the generated candidate query verbatim (optional)
    pub candidate_query: Option<String>,
    /// Replaces the generated warned-ticket query verbatim (optional)
    pub warned_query: Option<String>,
}

/// Validated settings shared by every rule kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSettings {
    pub stale_days: u32,
    pub warning_days: u32,
    pub warning_label: String,
    pub done_label: String,
    pub warning_comment: CommentTemplate,
    pub done_comment: CommentTemplate,
    /// Prefix for ticket links in log lines, e.g. "https://issues.apache.org/jira/browse"
    pub browse_url: Option<String>,
}

impl RuleSettings {
    fn params(&self) -> TemplateParams<'_> {
        TemplateParams {
            stale_days: self.stale_days,
            warning_days: self.warning_days,
            warning_label: &self.warning_label,
            done_label: &self.done_label,
        }
    }

    /// Warning comment with all placeholders filled in
    pub fn warning_text(&self) -> String {
        self.warning_comment.render(&self.params())
    }

    /// Done comment with all placeholders filled in
    pub fn done_text(&self) -> String {
        self.done_comment.render(&self.params())
    }

    /// How a ticket is referred to in log lines
    pub fn ticket_link(&self, key: &str) -> String {
        match &self.browse_url {
            Some(base) => format!("{}/{}", base, key),
            None => key.to_string(),
        }
    }
}

impl RuleConfig {
    /// A finalized ticket must fall out of the rule's candidate query, or it
    /// is warned and finalized again on every later run.
    fn check_scope(&self) -> Result<(), ConfigError> {
        let rule = || self.name.clone();
        match self.kind {
            RuleKind::Close => Ok(()),
            RuleKind::Unassign if !self.assigned => {
                Err(ConfigError::UnassignNotScoped { rule: rule() })
            }
            RuleKind::Unassign => Ok(()),
            RuleKind::Deprioritize => {
                let to = self
                    .to
                    .as_deref()
                    .map(str::trim)
                    .filter(|to| !to.is_empty())
                    .ok_or_else(|| ConfigError::MissingTargetPriority { rule: rule() })?;
                let priority = self
                    .priority
                    .as_deref()
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .ok_or_else(|| ConfigError::MissingSourcePriority { rule: rule() })?;
                if priority.eq_ignore_ascii_case(to) {
                    return Err(ConfigError::PriorityUnchanged {
                        rule: rule(),
                        priority: priority.to_string(),
                    });
                }
                Ok(())
            }
        }
    }

    /// Validate this rule and build its settings
    pub fn settings(&self, browse_url: Option<String>) -> Result<RuleSettings, ConfigError> {
        let non_empty = |field: &'static str, value: &str| {
            if value.trim().is_empty() {
                Err(ConfigError::EmptyField {
                    rule: self.name.clone(),
                    field,
                })
            } else {
                Ok(())
            }
        };
        non_empty("name", &self.name)?;
        non_empty("warning_label", &self.warning_label)?;
        non_empty("done_label", &self.done_label)?;

        if self.warning_label == self.done_label {
            return Err(ConfigError::LabelsNotDistinct {
                rule: self.name.clone(),
                label: self.warning_label.clone(),
            });
        }

        self.check_scope()?;

        let template = |field: &'static str, source: &str, context: &str, allowed: &[Placeholder]| {
            CommentTemplate::parse(source, context, allowed).map_err(|source| {
                ConfigError::Template {
                    rule: self.name.clone(),
                    field,
                    source,
                }
            })
        };

        Ok(RuleSettings {
            stale_days: self.stale_days,
            warning_days: self.warning_days,
            warning_label: self.warning_label.clone(),
            done_label: self.done_label.clone(),
            warning_comment: template(
                "warning_comment",
                &self.warning_comment,
                "warning",
                WARNING_PLACEHOLDERS,
            )?,
            done_comment: template("done_comment", &self.done_comment, "done", DONE_PLACEHOLDERS)?,
            browse_url,
        })
    }
}

impl BotConfig {
    /// Load and validate configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;

        let config = Self::from_toml(&content)
            .with_context(|| format!("Invalid config in {:?}", path))?;

        Ok(config)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: BotConfig = toml::from_str(content).context("Failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    /// Check rule names and every rule's settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rules.is_empty() {
            return Err(ConfigError::NoRules);
        }

        let mut seen = HashSet::new();
        for rule in &self.rules {
            if !seen.insert(rule.name.as_str()) {
                return Err(ConfigError::DuplicateRule(rule.name.clone()));
            }
            rule.settings(None)?;
        }
        Ok(())
    }

    /// Rules to run: all of them, or only those named in `selected`
    /// (keeping file order).
    pub fn select_rules(&self, selected: &[String]) -> Result<Vec<&RuleConfig>, ConfigError> {
        if let Some(unknown) = selected
            .iter()
            .find(|name| !self.rules.iter().any(|r| &r.name == *name))
        {
            return Err(ConfigError::UnknownRule(unknown.clone()));
        }

        Ok(self
            .rules
            .iter()
            .filter(|r| selected.is_empty() || selected.contains(&r.name))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[tracker]
url = "https://issues.example.org/jira/"
project = "FLINK"

[[rules]]
name = "stale-minor"
kind = "close"
priority = "Minor"
stale_days = 180
warning_days = 7
warning_label = "stale-minor"
done_label = "auto-closed"
warning_comment = "Idle for {stale_days} days, labeled {warning_label}."
done_comment = "Closed after {warning_days} more days."
"#;

    fn parse_err(content: &str) -> ConfigError {
        BotConfig::from_toml(content)
            .unwrap_err()
            .downcast::<ConfigError>()
            .unwrap()
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = BotConfig::from_toml(MINIMAL).unwrap();
        assert_eq!(config.tracker.token_env, "JIRA_TOKEN");
        assert_eq!(config.tracker.timeout_secs, 60);
        assert_eq!(
            config.tracker.browse_url(),
            "https://issues.example.org/jira/browse"
        );

        let rule = &config.rules[0];
        assert_eq!(rule.kind, RuleKind::Close);
        assert!(!rule.assigned);
        assert!(rule.candidate_query.is_none());
    }

    #[test]
    fn test_settings_render_comments() {
        let config = BotConfig::from_toml(MINIMAL).unwrap();
        let settings = config.rules[0].settings(None).unwrap();
        assert_eq!(
            settings.warning_text(),
            "Idle for 180 days, labeled stale-minor."
        );
        assert_eq!(settings.done_text(), "Closed after 7 more days.");
        assert_eq!(settings.ticket_link("FLINK-1"), "FLINK-1");
    }

    #[test]
    fn test_ticket_link_with_browse_url() {
        let config = BotConfig::from_toml(MINIMAL).unwrap();
        let settings = config.rules[0]
            .settings(Some(config.tracker.browse_url()))
            .unwrap();
        assert_eq!(
            settings.ticket_link("FLINK-1"),
            "https://issues.example.org/jira/browse/FLINK-1"
        );
    }

    #[test]
    fn test_no_rules_is_rejected() {
        let content = "[tracker]\nurl = \"https://x\"\nproject = \"P\"\n";
        assert_eq!(parse_err(content), ConfigError::NoRules);
    }

    #[test]
    fn test_duplicate_rule_names_are_rejected() {
        let rule = MINIMAL.split("[[rules]]").nth(1).unwrap();
        let content = format!("{}[[rules]]{}", MINIMAL, rule);
        assert_eq!(
            parse_err(&content),
            ConfigError::DuplicateRule("stale-minor".to_string())
        );
    }

    #[test]
    fn test_identical_labels_are_rejected() {
        let content = MINIMAL.replace("\"auto-closed\"", "\"stale-minor\"");
        assert!(matches!(
            parse_err(&content),
            ConfigError::LabelsNotDistinct { .. }
        ));
    }

    #[test]
    fn test_deprioritize_needs_target() {
        let content = MINIMAL.replace("kind = \"close\"", "kind = \"deprioritize\"");
        assert_eq!(
            parse_err(&content),
            ConfigError::MissingTargetPriority {
                rule: "stale-minor".to_string()
            }
        );

        let with_target = MINIMAL.replace(
            "kind = \"close\"",
            "kind = \"deprioritize\"\nto = \"Trivial\"",
        );
        assert!(BotConfig::from_toml(&with_target).is_ok());
    }

    #[test]
    fn test_deprioritize_needs_distinct_source_priority() {
        let without_priority = MINIMAL
            .replace("priority = \"Minor\"\n", "")
            .replace("kind = \"close\"", "kind = \"deprioritize\"\nto = \"Trivial\"");
        assert_eq!(
            parse_err(&without_priority),
            ConfigError::MissingSourcePriority {
                rule: "stale-minor".to_string()
            }
        );

        let unchanged = MINIMAL.replace(
            "kind = \"close\"",
            "kind = \"deprioritize\"\nto = \"minor\"",
        );
        assert_eq!(
            parse_err(&unchanged),
            ConfigError::PriorityUnchanged {
                rule: "stale-minor".to_string(),
                priority: "Minor".to_string()
            }
        );
    }

    #[test]
    fn test_unassign_must_be_scoped_to_assigned_tickets() {
        let unscoped = MINIMAL.replace("kind = \"close\"", "kind = \"unassign\"");
        assert_eq!(
            parse_err(&unscoped),
            ConfigError::UnassignNotScoped {
                rule: "stale-minor".to_string()
            }
        );

        let scoped = MINIMAL.replace("kind = \"close\"", "kind = \"unassign\"\nassigned = true");
        assert!(BotConfig::from_toml(&scoped).is_ok());
    }

    #[test]
    fn test_done_comment_cannot_use_stale_days() {
        let content = MINIMAL.replace("{warning_days} more days", "{stale_days} days");
        match parse_err(&content) {
            ConfigError::Template { field, .. } => assert_eq!(field, "done_comment"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let content = MINIMAL.replace("stale_days = 180", "stale_days = 180\nstale_weeks = 2");
        assert!(BotConfig::from_toml(&content).is_err());
    }

    #[test]
    fn test_select_rules() {
        let config = BotConfig::from_toml(MINIMAL).unwrap();
        assert_eq!(config.select_rules(&[]).unwrap().len(), 1);
        assert_eq!(
            config
                .select_rules(&["stale-minor".to_string()])
                .unwrap()
                .len(),
            1
        );
        assert_eq!(
            config.select_rules(&["nope".to_string()]).unwrap_err(),
            ConfigError::UnknownRule("nope".to_string())
        );
    }

    #[test]
    fn test_missing_token_names_variable() {
        let config = BotConfig::from_toml(
            &MINIMAL.replace(
                "project = \"FLINK\"",
                "project = \"FLINK\"\ntoken_env = \"STALEBOT_TEST_TOKEN_THAT_IS_NEVER_SET\"",
            ),
        )
        .unwrap();
        assert_eq!(config.tracker.token(), None);
        assert_eq!(
            config.tracker.require_token().unwrap_err(),
            ConfigError::MissingToken("STALEBOT_TEST_TOKEN_THAT_IS_NEVER_SET".to_string())
        );
    }
}
