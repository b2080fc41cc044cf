//! Structured output and exit codes for the CLI.
//!
//! Progress is reported through `tracing` on stderr; stdout only carries the
//! final summary, either as text or as JSON for automation.

use serde::Serialize;
use std::fmt::Display;
use std::io::{self, Write};

use crate::errors::{ConfigError, RuleError, TrackerError};

/// Version of the JSON output format
const OUTPUT_VERSION: &str = "0.1.0";

/// Safe println that handles broken pipes gracefully
pub fn writeln_safe(msg: impl Display) -> io::Result<()> {
    match writeln!(io::stdout(), "{}", msg) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
            // Silently exit on broken pipe (expected when piping to head, etc.)
            std::process::exit(0);
        }
        Err(e) => Err(e),
    }
}

/// Wrapper for successful command output with metadata
#[derive(Debug, Serialize)]
pub struct JsonOutput<T: Serialize> {
    pub success: bool,
    pub data: T,
    pub metadata: Metadata,
}

/// Metadata attached to every JSON response
#[derive(Debug, Serialize)]
pub struct Metadata {
    pub version: String,
    pub command: String,
    pub dry_run: bool,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn success(data: T, command: &str, dry_run: bool) -> Self {
        Self {
            success: true,
            data,
            metadata: Metadata {
                version: OUTPUT_VERSION.to_string(),
                command: command.to_string(),
                dry_run,
            },
        }
    }

    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Standardized exit codes for the stalebot CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Command succeeded (0)
    Success = 0,

    /// Generic error (1)
    GenericError = 1,

    /// Invalid configuration or arguments (2)
    InvalidArgument = 2,

    /// A ticket violated a rule invariant, e.g. missing warning label (4)
    ValidationFailed = 4,

    /// Tracker request failed (10)
    ExternalError = 10,
}

impl ExitCode {
    /// Convert exit code to i32 for `std::process::exit`
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Pick the exit code for an error returned by a command
    pub fn from_error(error: &anyhow::Error) -> Self {
        for cause in error.chain() {
            if cause.downcast_ref::<ConfigError>().is_some() {
                return ExitCode::InvalidArgument;
            }
            if cause.downcast_ref::<TrackerError>().is_some() {
                return ExitCode::ExternalError;
            }
            match cause.downcast_ref::<RuleError>() {
                Some(RuleError::LabelNotPresent { .. }) => return ExitCode::ValidationFailed,
                Some(RuleError::Tracker(_)) => return ExitCode::ExternalError,
                None => {}
            }
            if cause.downcast_ref::<toml::de::Error>().is_some() {
                return ExitCode::InvalidArgument;
            }
        }
        ExitCode::GenericError
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Success.code(), 0);
        assert_eq!(ExitCode::InvalidArgument.code(), 2);
        assert_eq!(ExitCode::ValidationFailed.code(), 4);
        assert_eq!(ExitCode::ExternalError.code(), 10);
    }

    #[test]
    fn test_exit_code_sees_through_context() {
        let err: anyhow::Error = Err::<(), _>(ConfigError::NoRules)
            .context("Invalid config")
            .unwrap_err();
        assert_eq!(ExitCode::from_error(&err), ExitCode::InvalidArgument);
    }

    #[test]
    fn test_exit_code_for_rule_errors() {
        let missing = anyhow::Error::new(RuleError::LabelNotPresent {
            key: "K-1".to_string(),
            label: "l".to_string(),
        });
        assert_eq!(ExitCode::from_error(&missing), ExitCode::ValidationFailed);

        let transport = anyhow::Error::new(RuleError::Tracker(TrackerError::Transport(
            "connection refused".to_string(),
        )));
        assert_eq!(ExitCode::from_error(&transport), ExitCode::ExternalError);

        assert_eq!(
            ExitCode::from_error(&anyhow::anyhow!("something else")),
            ExitCode::GenericError
        );
    }

    #[test]
    fn test_json_output_shape() {
        let output = JsonOutput::success(vec!["stale-minor"], "list-rules", false);
        let value: serde_json::Value =
            serde_json::from_str(&output.to_json_string().unwrap()).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["data"][0], "stale-minor");
        assert_eq!(value["metadata"]["command"], "list-rules");
    }
}
