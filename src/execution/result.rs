//! Buffered execution result.

use std::time::Duration;

use crate::error::{BoxError, CommandResult};
use crate::exit::{resolve, Resolution};

/// Result of a buffered invocation.
#[derive(Debug)]
pub struct ExecutionResult {
    /// Everything the run wrote to its output stream.
    pub stdout: String,
    /// Everything the run wrote to its error stream.
    pub stderr: String,
    /// Terminal error of the run.
    pub outcome: CommandResult,
    /// Wall time of the run.
    pub duration: Duration,
}

impl ExecutionResult {
    /// Create a new execution result.
    pub fn new(stdout: String, stderr: String, outcome: CommandResult, duration: Duration) -> Self {
        Self {
            stdout,
            stderr,
            outcome,
            duration,
        }
    }

    /// Check if the run returned no error.
    pub fn success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Check if the run returned an error.
    pub fn failed(&self) -> bool {
        self.outcome.is_err()
    }

    /// The terminal error, if any.
    pub fn error(&self) -> Option<&BoxError> {
        self.outcome.as_ref().err()
    }

    /// How a root runner would treat this outcome.
    pub fn resolution(&self) -> Resolution {
        resolve(&self.outcome)
    }

    /// Exit code a real process would have reported.
    pub fn exit_code(&self) -> i32 {
        self.resolution().code()
    }

    /// Get stdout, trimmed.
    pub fn stdout_trimmed(&self) -> &str {
        self.stdout.trim()
    }

    /// Get stdout lines.
    pub fn stdout_lines(&self) -> impl Iterator<Item = &str> {
        self.stdout.lines()
    }

    /// Split into `(stdout, stderr, outcome)`.
    pub fn into_parts(self) -> (String, String, CommandResult) {
        (self.stdout, self.stderr, self.outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit::{mark_as_reported, with_exit_code};

    fn result(outcome: CommandResult) -> ExecutionResult {
        ExecutionResult::new("out\n".into(), "err".into(), outcome, Duration::ZERO)
    }

    #[test]
    fn test_success() {
        let r = result(Ok(()));
        assert!(r.success());
        assert!(!r.failed());
        assert!(r.error().is_none());
        assert_eq!(r.exit_code(), 0);
    }

    #[test]
    fn test_failed_with_carried_code() {
        let r = result(Err(with_exit_code(mark_as_reported(), 4)));
        assert!(r.failed());
        assert_eq!(r.exit_code(), 4);
        assert!(r.resolution().message.is_none());
    }

    #[test]
    fn test_stdout_helpers() {
        let r = ExecutionResult::new(
            "  line1\nline2  \n".into(),
            String::new(),
            Ok(()),
            Duration::ZERO,
        );
        assert_eq!(r.stdout_trimmed(), "line1\nline2");
        let lines: Vec<_> = r.stdout_lines().collect();
        assert_eq!(lines, vec!["  line1", "line2  "]);
    }

    #[test]
    fn test_into_parts() {
        let (out, err, outcome) = result(Err("nope".into())).into_parts();
        assert_eq!(out, "out\n");
        assert_eq!(err, "err");
        assert_eq!(outcome.unwrap_err().to_string(), "nope");
    }
}
