//! Stale Ticket Bot Library
//!
//! Finds issue-tracker tickets without recent activity, warns them with a
//! label and a comment, and finalizes them (close, unassign or deprioritize)
//! once the grace period has passed. The binary wires this library to a Jira
//! instance; tests drive it through [`tracker::InMemoryTracker`].

pub mod activity;
pub mod cli;
pub mod config;
pub mod domain;
pub mod errors;
pub mod gateway;
pub mod output;
pub mod pagination;
pub mod rules;
pub mod template;
pub mod tracker;
pub mod workflow;

#[cfg(test)]
mod test_utils;

// Re-export commonly used types
pub use config::{BotConfig, RuleSettings};
pub use domain::Ticket;
pub use gateway::{ExecutionMode, MutationGateway};
pub use rules::{RuleSet, StaleRule};
pub use tracker::{InMemoryTracker, JiraClient, Tracker};
pub use workflow::{PhaseReport, StaleWorkflow};
