//! Exit code resolution.

use std::error::Error as StdError;

use super::carrier::{find_exit_code, is_reported};
use crate::error::CommandResult;

/// Default exit code for failures without a carrier.
pub const DEFAULT_FAILURE_CODE: i32 = 1;

/// Terminal state of a run as seen by the process boundary.
///
/// Resolution rules:
/// - no error: `Success`
/// - a carrier anywhere in the chain: `CarriedFailure(code)`, printed or not
/// - the silent marker without a carrier: `SilentFailure`
/// - anything else: `GenericFailure`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    /// The run returned no error.
    Success,
    /// The run reported its own failure and carries no code.
    SilentFailure,
    /// The error chain names the exit code.
    CarriedFailure(i32),
    /// Any other error.
    GenericFailure,
}

impl ExitOutcome {
    /// Exit code for this outcome.
    pub fn code(&self) -> i32 {
        match self {
            ExitOutcome::Success => 0,
            ExitOutcome::CarriedFailure(code) => *code,
            ExitOutcome::SilentFailure | ExitOutcome::GenericFailure => DEFAULT_FAILURE_CODE,
        }
    }
}

/// Exit code plus the diagnostic to print, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Resolved outcome.
    pub outcome: ExitOutcome,
    /// Message for the diagnostic stream; `None` when nothing is printed.
    pub message: Option<String>,
}

impl Resolution {
    /// A successful run.
    pub fn success() -> Self {
        Self {
            outcome: ExitOutcome::Success,
            message: None,
        }
    }

    /// Process exit code.
    pub fn code(&self) -> i32 {
        self.outcome.code()
    }

    /// Check whether a diagnostic should be printed.
    pub fn should_print(&self) -> bool {
        self.message.is_some()
    }
}

/// Resolve the terminal state of a run.
pub fn resolve(outcome: &CommandResult) -> Resolution {
    match outcome {
        Ok(()) => Resolution::success(),
        Err(err) => resolve_error(&**err),
    }
}

/// Resolve a terminal error.
///
/// A carried code of 0 still prints the error unless it is silenced.
pub fn resolve_error(err: &(dyn StdError + 'static)) -> Resolution {
    let silent = is_reported(err);
    let outcome = match find_exit_code(err) {
        Some(code) => ExitOutcome::CarriedFailure(code),
        None if silent => ExitOutcome::SilentFailure,
        None => ExitOutcome::GenericFailure,
    };
    let message = (!silent).then(|| err.to_string());

    Resolution { outcome, message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use crate::exit::{mark_as_reported, with_exit_code};

    fn resolved(err: BoxError) -> Resolution {
        resolve(&Err(err))
    }

    #[test]
    fn test_no_error() {
        let r = resolve(&Ok(()));
        assert_eq!(r.outcome, ExitOutcome::Success);
        assert_eq!(r.code(), 0);
        assert!(!r.should_print());
    }

    #[test]
    fn test_silent_marker() {
        let r = resolved(mark_as_reported());
        assert_eq!(r.outcome, ExitOutcome::SilentFailure);
        assert_eq!(r.code(), 1);
        assert!(r.message.is_none());
    }

    #[test]
    fn test_carried_code() {
        let r = resolved(with_exit_code("foo", 2));
        assert_eq!(r.outcome, ExitOutcome::CarriedFailure(2));
        assert_eq!(r.message.as_deref(), Some("foo"));
    }

    #[test]
    fn test_silent_with_carried_code() {
        let r = resolved(with_exit_code(mark_as_reported(), 3));
        assert_eq!(r.code(), 3);
        assert!(r.message.is_none());
    }

    #[test]
    fn test_carried_zero_still_prints() {
        let r = resolved(with_exit_code("foo", 0));
        assert_eq!(r.outcome, ExitOutcome::CarriedFailure(0));
        assert_eq!(r.code(), 0);
        assert_eq!(r.message.as_deref(), Some("foo"));
    }

    #[test]
    fn test_generic_error() {
        let r = resolved("some error".into());
        assert_eq!(r.outcome, ExitOutcome::GenericFailure);
        assert_eq!(r.code(), 1);
        assert_eq!(r.message.as_deref(), Some("some error"));
    }

    #[derive(Debug, thiserror::Error)]
    #[error("wrapped: {0}")]
    struct Wrapped(#[source] BoxError);

    #[test]
    fn test_any_code_any_depth() {
        for code in [0, 1, 2, 42, 255] {
            let mut err = with_exit_code("foo", code);
            for depth in 0..5 {
                assert_eq!(resolve_error(&*err).code(), code, "depth {depth}");
                err = Box::new(Wrapped(err));
            }
        }
    }
}
