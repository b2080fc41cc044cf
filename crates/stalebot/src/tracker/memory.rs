//! In-memory tracker implementation for testing.
//!
//! Queries are opaque text to the bot, so this backend does not evaluate them.
//! Tests register each query string up front, either with a fixed list of
//! ticket keys or with a predicate evaluated against the current ticket state.
//! Every request is recorded so tests can assert on exact call sequences.

use crate::domain::{FieldMap, SearchPage, Ticket};
use crate::errors::TrackerError;
use crate::tracker::{Tracker, TrackerResult};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::rc::Rc;

/// A request received by [`InMemoryTracker`]
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerCall {
    Search {
        query: String,
        limit: usize,
        offset: usize,
    },
    GetTicket {
        key: String,
    },
    UpdateFields {
        key: String,
        fields: FieldMap,
    },
    AddComment {
        key: String,
        text: String,
    },
    SetStatus {
        key: String,
        status: String,
        extra_fields: FieldMap,
    },
    SetAssignee {
        key: String,
        assignee: Option<String>,
    },
}

impl TrackerCall {
    /// True for calls that change tracker state
    pub fn is_mutation(&self) -> bool {
        !matches!(self, TrackerCall::Search { .. } | TrackerCall::GetTicket { .. })
    }

    fn operation(&self) -> Operation {
        match self {
            TrackerCall::Search { .. } => Operation::Search,
            TrackerCall::GetTicket { .. } => Operation::GetTicket,
            TrackerCall::UpdateFields { .. } => Operation::UpdateFields,
            TrackerCall::AddComment { .. } => Operation::AddComment,
            TrackerCall::SetStatus { .. } => Operation::SetStatus,
            TrackerCall::SetAssignee { .. } => Operation::SetAssignee,
        }
    }
}

/// Tracker operation kinds, used to inject failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Search,
    GetTicket,
    UpdateFields,
    AddComment,
    SetStatus,
    SetAssignee,
}

type TicketFilter = Rc<dyn Fn(&Ticket) -> bool>;

#[derive(Clone)]
enum QuerySource {
    Keys(Vec<String>),
    Filter(TicketFilter),
}

/// In-memory tracker backend.
///
/// Uses `Rc<RefCell<>>` for shared interior mutability - clones share the
/// same data, so a test can keep a handle while the workflow owns another.
#[derive(Clone, Default)]
pub struct InMemoryTracker {
    tickets: Rc<RefCell<BTreeMap<String, Ticket>>>,
    comments: Rc<RefCell<HashMap<String, Vec<String>>>>,
    queries: Rc<RefCell<HashMap<String, QuerySource>>>,
    reported_totals: Rc<RefCell<HashMap<String, usize>>>,
    failures: Rc<RefCell<HashSet<(Operation, String)>>>,
    calls: Rc<RefCell<Vec<TrackerCall>>>,
}

impl InMemoryTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a ticket
    pub fn insert(&self, ticket: Ticket) {
        self.tickets.borrow_mut().insert(ticket.key.clone(), ticket);
    }

    /// Current state of a stored ticket
    pub fn ticket(&self, key: &str) -> Option<Ticket> {
        self.tickets.borrow().get(key).cloned()
    }

    /// Comments posted on a ticket, oldest first
    pub fn comments(&self, key: &str) -> Vec<String> {
        self.comments.borrow().get(key).cloned().unwrap_or_default()
    }

    /// Make `query` return the given tickets, in order
    pub fn register_query<I, S>(&self, query: &str, keys: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys = keys.into_iter().map(Into::into).collect();
        self.queries
            .borrow_mut()
            .insert(query.to_string(), QuerySource::Keys(keys));
    }

    /// Make `query` return every stored ticket matching `filter` at search time
    pub fn register_filter<F>(&self, query: &str, filter: F)
    where
        F: Fn(&Ticket) -> bool + 'static,
    {
        self.queries
            .borrow_mut()
            .insert(query.to_string(), QuerySource::Filter(Rc::new(filter)));
    }

    /// Report `total` for `query` regardless of how many tickets match
    pub fn report_total(&self, query: &str, total: usize) {
        self.reported_totals
            .borrow_mut()
            .insert(query.to_string(), total);
    }

    /// Fail every `operation` on `key` with a transport error.
    ///
    /// For [`Operation::Search`] the key is the query text.
    pub fn fail_on(&self, operation: Operation, key: &str) {
        self.failures
            .borrow_mut()
            .insert((operation, key.to_string()));
    }

    /// Every request received so far, in order
    pub fn calls(&self) -> Vec<TrackerCall> {
        self.calls.borrow().clone()
    }

    /// Only the state-changing requests
    pub fn mutations(&self) -> Vec<TrackerCall> {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.is_mutation())
            .cloned()
            .collect()
    }

    /// Offsets requested for `query`, in order
    pub fn search_offsets(&self, query: &str) -> Vec<usize> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                TrackerCall::Search {
                    query: q, offset, ..
                } if q == query => Some(*offset),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: TrackerCall, key: &str) -> TrackerResult<()> {
        let operation = call.operation();
        self.calls.borrow_mut().push(call);
        if self
            .failures
            .borrow()
            .contains(&(operation, key.to_string()))
        {
            return Err(TrackerError::Transport(format!(
                "injected {:?} failure for {}",
                operation, key
            )));
        }
        Ok(())
    }

    fn matching_tickets(&self, query: &str) -> Vec<Ticket> {
        let source = self.queries.borrow().get(query).cloned();
        let tickets = self.tickets.borrow();
        match source {
            Some(QuerySource::Keys(keys)) => keys
                .iter()
                .map(|k| tickets.get(k).cloned().unwrap_or_else(|| Ticket::new(k.clone())))
                .collect(),
            Some(QuerySource::Filter(filter)) => {
                tickets.values().filter(|&t| filter(t)).cloned().collect()
            }
            None => Vec::new(),
        }
    }

    fn with_ticket<F>(&self, key: &str, update: F) -> TrackerResult<()>
    where
        F: FnOnce(&mut Ticket),
    {
        let mut tickets = self.tickets.borrow_mut();
        let ticket = tickets
            .get_mut(key)
            .ok_or_else(|| TrackerError::NotFound(key.to_string()))?;
        update(ticket);
        Ok(())
    }
}

fn named(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map.get("name").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

impl Tracker for InMemoryTracker {
    fn search(&self, query: &str, limit: usize, offset: usize) -> TrackerResult<SearchPage> {
        self.record(
            TrackerCall::Search {
                query: query.to_string(),
                limit,
                offset,
            },
            query,
        )?;

        let matches = self.matching_tickets(query);
        let total = self
            .reported_totals
            .borrow()
            .get(query)
            .copied()
            .unwrap_or(matches.len());
        let tickets = matches.into_iter().skip(offset).take(limit).collect();

        Ok(SearchPage { total, tickets })
    }

    fn get_ticket(&self, key: &str) -> TrackerResult<Ticket> {
        self.record(
            TrackerCall::GetTicket {
                key: key.to_string(),
            },
            key,
        )?;
        self.ticket(key)
            .ok_or_else(|| TrackerError::NotFound(key.to_string()))
    }

    fn update_fields(&self, key: &str, fields: &FieldMap) -> TrackerResult<()> {
        self.record(
            TrackerCall::UpdateFields {
                key: key.to_string(),
                fields: fields.clone(),
            },
            key,
        )?;

        self.with_ticket(key, |ticket| {
            for (name, value) in fields {
                match name.as_str() {
                    "labels" => {
                        ticket.labels = value
                            .as_array()
                            .map(|items| {
                                items
                                    .iter()
                                    .filter_map(Value::as_str)
                                    .map(str::to_string)
                                    .collect()
                            })
                            .unwrap_or_default();
                    }
                    "priority" => ticket.priority = named(value),
                    "assignee" => ticket.assignee = named(value),
                    _ => {}
                }
            }
        })
    }

    fn add_comment(&self, key: &str, text: &str) -> TrackerResult<()> {
        self.record(
            TrackerCall::AddComment {
                key: key.to_string(),
                text: text.to_string(),
            },
            key,
        )?;
        if !self.tickets.borrow().contains_key(key) {
            return Err(TrackerError::NotFound(key.to_string()));
        }
        self.comments
            .borrow_mut()
            .entry(key.to_string())
            .or_default()
            .push(text.to_string());
        Ok(())
    }

    fn set_status(&self, key: &str, status: &str, extra_fields: &FieldMap) -> TrackerResult<()> {
        self.record(
            TrackerCall::SetStatus {
                key: key.to_string(),
                status: status.to_string(),
                extra_fields: extra_fields.clone(),
            },
            key,
        )?;
        self.with_ticket(key, |ticket| ticket.status = Some(status.to_string()))
    }

    fn set_assignee(&self, key: &str, assignee: Option<&str>) -> TrackerResult<()> {
        self.record(
            TrackerCall::SetAssignee {
                key: key.to_string(),
                assignee: assignee.map(str::to_string),
            },
            key,
        )?;
        self.with_ticket(key, |ticket| ticket.assignee = assignee.map(str::to_string))
    }
}
