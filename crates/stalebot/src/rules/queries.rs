//! Query builders for the generated candidate and warned-ticket queries.

/// Scope shared by a rule's queries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryScope<'a> {
    pub project: &'a str,
    pub priority: Option<&'a str>,
    pub assigned: bool,
}

fn quoted(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

impl QueryScope<'_> {
    fn base(&self) -> String {
        format!("project = {} AND resolution = Unresolved", quoted(self.project))
    }

    /// Unresolved tickets in scope, neither warned nor already finalized,
    /// untouched for `stale_days`.
    ///
    /// ```
    /// use stalebot::rules::queries::QueryScope;
    ///
    /// let scope = QueryScope { project: "FLINK", priority: Some("Minor"), assigned: false };
    /// assert_eq!(
    ///     scope.candidate_query("stale-minor", "auto-closed", 180),
    ///     "project = \"FLINK\" AND resolution = Unresolved AND priority = \"Minor\" \
    ///      AND (labels is EMPTY OR labels not in (\"stale-minor\", \"auto-closed\")) \
    ///      AND updated < startOfDay(-180d)"
    /// );
    /// ```
    pub fn candidate_query(&self, warning_label: &str, done_label: &str, stale_days: u32) -> String {
        let mut query = self.base();
        if let Some(priority) = self.priority {
            query.push_str(&format!(" AND priority = {}", quoted(priority)));
        }
        if self.assigned {
            query.push_str(" AND assignee is not EMPTY");
        }
        query.push_str(&format!(
            " AND (labels is EMPTY OR labels not in ({}, {})) AND updated < startOfDay(-{}d)",
            quoted(warning_label),
            quoted(done_label),
            stale_days
        ));
        query
    }

    /// Unresolved tickets carrying the warning label with no update during
    /// the grace period.
    pub fn warned_query(&self, warning_label: &str, warning_days: u32) -> String {
        format!(
            "{} AND labels in ({}) AND updated < startOfDay(-{}d)",
            self.base(),
            quoted(warning_label),
            warning_days
        )
    }
}
