//! Error-chain markers understood by the exit resolver.

use std::error::Error as StdError;

use thiserror::Error;

use crate::error::{chain, BoxError};

/// The run already told the user what went wrong; do not print it again.
///
/// The type itself is the identity of the marker, so it is recognised at any
/// depth of an error chain.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[error("this error should never be printed")]
pub struct AlreadyReported;

/// Return this from a run that has reported its own failure.
pub fn mark_as_reported() -> BoxError {
    Box::new(AlreadyReported)
}

/// Check whether `err` or anything it wraps is the [`AlreadyReported`] marker.
pub fn is_reported(err: &(dyn StdError + 'static)) -> bool {
    chain(err).any(|layer| layer.is::<AlreadyReported>())
}

mod sealed {
    pub trait Sealed {}

    impl Sealed for super::ExitCodeError {}
}

/// An error that decides the process exit code.
///
/// The trait is sealed: [`ExitCodeError`] is its only implementor, and the
/// resolver recognises exactly that type in a chain. Any other error gets an
/// exit code by being wrapped with [`with_exit_code`] or [`ExitCodeError::new`].
pub trait ExitCodeCarrier: StdError + sealed::Sealed {
    /// Exit code the process should terminate with.
    fn exit_code(&self) -> i32;
}

/// Wraps an error with an explicit exit code.
///
/// Displays as the wrapped error and exposes it as its source, so markers and
/// messages further down the chain stay visible.
#[derive(Error, Debug)]
#[error("{source}")]
pub struct ExitCodeError {
    source: BoxError,
    code: i32,
}

impl ExitCodeError {
    /// Wrap `err` with `code`.
    pub fn new(err: impl Into<BoxError>, code: i32) -> Self {
        Self {
            source: err.into(),
            code,
        }
    }

    /// The wrapped error.
    pub fn inner(&self) -> &BoxError {
        &self.source
    }

    /// Unwrap into the wrapped error.
    pub fn into_inner(self) -> BoxError {
        self.source
    }
}

impl ExitCodeCarrier for ExitCodeError {
    fn exit_code(&self) -> i32 {
        self.code
    }
}

/// Wrap any error with an explicit exit code.
pub fn with_exit_code(err: impl Into<BoxError>, code: i32) -> BoxError {
    Box::new(ExitCodeError::new(err, code))
}

/// Exit code of the nearest carrier in the chain of `err`.
pub fn find_exit_code(err: &(dyn StdError + 'static)) -> Option<i32> {
    chain(err).find_map(|layer| {
        layer
            .downcast_ref::<ExitCodeError>()
            .map(ExitCodeCarrier::exit_code)
    })
}
