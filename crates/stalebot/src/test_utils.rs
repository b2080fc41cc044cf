//! Shared test utilities
//!
//! Common helpers used across multiple test modules to reduce duplication.

#![cfg(test)]

use crate::config::RuleSettings;
use crate::template::{CommentTemplate, DONE_PLACEHOLDERS, WARNING_PLACEHOLDERS};
use std::io;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `f` with a thread-local subscriber and return everything it logged
/// at info level or above, one event per line, without timestamps or colors.
pub fn capture_logs<F, R>(f: F) -> (R, String)
where
    F: FnOnce() -> R,
{
    let buffer = SharedBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .without_time()
        .with_target(false)
        .with_max_level(tracing::Level::INFO)
        .finish();

    let result = tracing::subscriber::with_default(subscriber, f);
    let bytes = buffer.0.lock().unwrap().clone();
    (result, String::from_utf8_lossy(&bytes).into_owned())
}

/// Settings used by most workflow tests
pub fn sample_settings() -> RuleSettings {
    RuleSettings {
        stale_days: 180,
        warning_days: 7,
        warning_label: "stale-minor".to_string(),
        done_label: "auto-closed".to_string(),
        warning_comment: CommentTemplate::parse(
            "No activity for {stale_days} days. Labeled {warning_label}; closing in {warning_days} days.",
            "warning",
            WARNING_PLACEHOLDERS,
        )
        .unwrap(),
        done_comment: CommentTemplate::parse(
            "Labeled {warning_label} for {warning_days} days. Now {done_label}.",
            "done",
            DONE_PLACEHOLDERS,
        )
        .unwrap(),
        browse_url: None,
    }
}
