//! Error types for cli-harness.

use std::error::Error as StdError;

use thiserror::Error;

/// Boxed error returned by command runs.
///
/// Any error type can travel through a run, and wrappers such as
/// [`ExitCodeError`](crate::exit::ExitCodeError) keep the inner error
/// reachable through [`source`](StdError::source).
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Terminal state of a single invocation.
pub type CommandResult = std::result::Result<(), BoxError>;

/// Errors raised by the harness itself.
#[derive(Error, Debug)]
pub enum HarnessError {
    /// The invocation context was cancelled.
    #[error("context canceled")]
    Cancelled,

    /// The invocation context passed its deadline.
    #[error("context deadline exceeded")]
    DeadlineExceeded,

    /// A non-runnable command received an argument that names no subcommand.
    #[error("unknown command \"{name}\" for \"{path}\"")]
    UnknownCommand { name: String, path: String },

    /// Dispatch ended on a command without a run behavior.
    #[error("command \"{0}\" is not runnable")]
    NotRunnable(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A background run panicked or was aborted.
    #[error("background task failed: {0}")]
    TaskFailed(String),
}

impl HarnessError {
    /// Check whether this error stems from context cancellation.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, HarnessError::Cancelled | HarnessError::DeadlineExceeded)
    }
}

/// Convenience Result type for harness operations.
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Iterator over an error and its chain of sources, outermost first.
#[derive(Debug, Clone)]
pub struct Chain<'a> {
    next: Option<&'a (dyn StdError + 'static)>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a (dyn StdError + 'static);

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.source();
        Some(current)
    }
}

/// Walk `err` and every error it wraps.
pub fn chain<'a>(err: &'a (dyn StdError + 'static)) -> Chain<'a> {
    Chain { next: Some(err) }
}

/// Check whether any layer of `err` is a cancellation or deadline error.
pub fn is_cancellation(err: &(dyn StdError + 'static)) -> bool {
    chain(err).any(|layer| {
        layer
            .downcast_ref::<HarnessError>()
            .is_some_and(HarnessError::is_cancellation)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("outer")]
    struct Outer(#[source] BoxError);

    #[test]
    fn test_unknown_command_display() {
        let err = HarnessError::UnknownCommand {
            name: "stauts".into(),
            path: "keto".into(),
        };
        assert_eq!(err.to_string(), "unknown command \"stauts\" for \"keto\"");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err: HarnessError = io_err.into();
        assert!(matches!(err, HarnessError::Io(_)));
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_chain_walks_sources() {
        let err = Outer(Box::new(Outer(Box::new(HarnessError::Cancelled))));
        let messages: Vec<String> = chain(&err).map(|e| e.to_string()).collect();
        assert_eq!(messages, vec!["outer", "outer", "context canceled"]);
    }

    #[test]
    fn test_is_cancellation_nested() {
        let err = Outer(Box::new(HarnessError::DeadlineExceeded));
        assert!(is_cancellation(&err));

        let err = Outer(Box::new(HarnessError::NotRunnable("keto".into())));
        assert!(!is_cancellation(&err));
    }
}
