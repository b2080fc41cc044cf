//! Jira REST API (v2) binding for the [`Tracker`] trait.
//!
//! Blocking HTTP via `ureq`. Authentication is a personal access token sent
//! as a bearer token; without a token requests are anonymous, which is enough
//! for dry runs against public instances.

use crate::domain::{FieldMap, SearchPage, Ticket};
use crate::errors::TrackerError;
use crate::tracker::{Tracker, TrackerResult};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;
use ureq::http::Response;
use ureq::{Agent, Body, RequestBuilder};

/// Fields requested for every ticket; the bot needs nothing else
const TICKET_FIELDS: &str = "labels,status,assignee,priority";

/// Blocking Jira client
#[derive(Clone)]
pub struct JiraClient {
    agent: Agent,
    base_url: String,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    total: usize,
    #[serde(default)]
    issues: Vec<IssueResponse>,
}

#[derive(Debug, Deserialize)]
struct IssueResponse {
    key: String,
    #[serde(default)]
    fields: IssueFields,
}

#[derive(Debug, Default, Deserialize)]
struct IssueFields {
    #[serde(default)]
    labels: Vec<String>,
    status: Option<Named>,
    assignee: Option<Named>,
    priority: Option<Named>,
}

#[derive(Debug, Deserialize)]
struct Named {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TransitionsResponse {
    #[serde(default)]
    transitions: Vec<Transition>,
}

#[derive(Debug, Deserialize)]
struct Transition {
    id: String,
    name: String,
    to: Option<Named>,
}

impl From<IssueResponse> for Ticket {
    fn from(issue: IssueResponse) -> Self {
        let name = |n: Option<Named>| n.and_then(|n| n.name);
        Ticket {
            key: issue.key,
            labels: issue.fields.labels,
            status: name(issue.fields.status),
            assignee: name(issue.fields.assignee),
            priority: name(issue.fields.priority),
        }
    }
}

impl JiraClient {
    /// Create a client for the Jira instance at `base_url`
    /// (e.g. `https://issues.apache.org/jira`).
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Self {
        let config = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();

        Self {
            agent: Agent::new_with_config(config),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Base URL with any trailing slash removed
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn issue_url(&self, key: &str, suffix: &str) -> String {
        format!("{}/rest/api/2/issue/{}{}", self.base_url, key, suffix)
    }

    fn authorize<B>(&self, request: RequestBuilder<B>) -> RequestBuilder<B> {
        let request = request.header("Accept", "application/json");
        match &self.token {
            Some(token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }

    fn checked(
        method: &str,
        url: &str,
        result: Result<Response<Body>, ureq::Error>,
    ) -> TrackerResult<Response<Body>> {
        debug!("{} {}", method, url);
        match result {
            Ok(response) if response.status().is_success() => Ok(response),
            Ok(response) => Err(TrackerError::Http {
                method: method.to_string(),
                url: url.to_string(),
                status: response.status().as_u16(),
            }),
            Err(ureq::Error::StatusCode(status)) => Err(TrackerError::Http {
                method: method.to_string(),
                url: url.to_string(),
                status,
            }),
            Err(e) => Err(TrackerError::Transport(e.to_string())),
        }
    }

    fn read_json<T: DeserializeOwned>(mut response: Response<Body>) -> TrackerResult<T> {
        response
            .body_mut()
            .read_json::<T>()
            .map_err(|e| TrackerError::Decode(e.to_string()))
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> TrackerResult<T> {
        let mut request = self.authorize(self.agent.get(url));
        for (name, value) in query {
            request = request.query(*name, value);
        }
        let response = Self::checked("GET", url, request.call())?;
        Self::read_json(response)
    }

    fn put_json(&self, url: &str, body: &Value) -> TrackerResult<()> {
        let request = self.authorize(self.agent.put(url));
        Self::checked("PUT", url, request.send_json(body))?;
        Ok(())
    }

    fn post_json(&self, url: &str, body: &Value) -> TrackerResult<()> {
        let request = self.authorize(self.agent.post(url));
        Self::checked("POST", url, request.send_json(body))?;
        Ok(())
    }
}

/// Pick the transition that leads to `status`, matching the target status
/// name first and the transition's own name second.
fn find_transition<'a>(transitions: &'a [Transition], status: &str) -> Option<&'a Transition> {
    let target = |t: &&Transition| {
        t.to
            .as_ref()
            .and_then(|to| to.name.as_deref())
            .is_some_and(|name| name.eq_ignore_ascii_case(status))
    };
    transitions
        .iter()
        .find(target)
        .or_else(|| transitions.iter().find(|t| t.name.eq_ignore_ascii_case(status)))
}

impl Tracker for JiraClient {
    fn search(&self, query: &str, limit: usize, offset: usize) -> TrackerResult<SearchPage> {
        let url = format!("{}/rest/api/2/search", self.base_url);
        let response: SearchResponse = self.get_json(
            &url,
            &[
                ("jql", query.to_string()),
                ("startAt", offset.to_string()),
                ("maxResults", limit.to_string()),
                ("fields", TICKET_FIELDS.to_string()),
            ],
        )?;

        Ok(SearchPage {
            total: response.total,
            tickets: response.issues.into_iter().map(Ticket::from).collect(),
        })
    }

    fn get_ticket(&self, key: &str) -> TrackerResult<Ticket> {
        let url = self.issue_url(key, "");
        match self.get_json::<IssueResponse>(&url, &[("fields", TICKET_FIELDS.to_string())]) {
            Ok(issue) => Ok(issue.into()),
            Err(TrackerError::Http { status: 404, .. }) => {
                Err(TrackerError::NotFound(key.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    fn update_fields(&self, key: &str, fields: &FieldMap) -> TrackerResult<()> {
        self.put_json(&self.issue_url(key, ""), &json!({ "fields": fields }))
    }

    fn add_comment(&self, key: &str, text: &str) -> TrackerResult<()> {
        self.post_json(&self.issue_url(key, "/comment"), &json!({ "body": text }))
    }

    fn set_status(&self, key: &str, status: &str, extra_fields: &FieldMap) -> TrackerResult<()> {
        let url = self.issue_url(key, "/transitions");
        let available: TransitionsResponse = self.get_json(&url, &[])?;
        let transition = find_transition(&available.transitions, status).ok_or_else(|| {
            TrackerError::TransitionUnavailable {
                key: key.to_string(),
                status: status.to_string(),
            }
        })?;

        let mut body = json!({ "transition": { "id": transition.id } });
        if !extra_fields.is_empty() {
            body["fields"] = json!(extra_fields);
        }
        self.post_json(&url, &body)
    }

    fn set_assignee(&self, key: &str, assignee: Option<&str>) -> TrackerResult<()> {
        self.put_json(&self.issue_url(key, "/assignee"), &json!({ "name": assignee }))
    }
}
