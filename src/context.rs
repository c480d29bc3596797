//! Invocation context: cancellation and deadlines.
//!
//! A [`Context`] is the only cancellation channel of an invocation. It wraps a
//! [`CancellationToken`] and an optional deadline. Deriving a context creates a
//! child token, so cancelling a parent cancels everything derived from it while
//! cancelling a child leaves the parent untouched.
//!
//! # Example
//!
//! ```
//! use std::sync::{Arc, OnceLock};
//! ```

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::HarnessError;

/// Why a context finished. Recorded once; later events do not overwrite it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reason {
    Cancelled,
    DeadlineExceeded,
}

impl From<Reason> for HarnessError {
    fn from(reason: Reason) -> Self {
        match reason {
            Reason::Cancelled => HarnessError::Cancelled,
            Reason::DeadlineExceeded => HarnessError::DeadlineExceeded,
        }
    }
}

/// One level of the derivation tree.
#[derive(Debug, Default)]
struct Scope {
    reason: OnceLock<Reason>,
    parent: Option<Arc<Scope>>,
}

impl Scope {
    fn child(parent: &Arc<Scope>) -> Arc<Self> {
        Arc::new(Self {
            reason: OnceLock::new(),
            parent: Some(Arc::clone(parent)),
        })
    }

    fn record(&self, reason: Reason) -> Reason {
        *self.reason.get_or_init(|| reason)
    }

    /// Nearest reason recorded by this scope or one of its ancestors.
    fn recorded(&self) -> Option<Reason> {
        let mut scope = Some(self);
        while let Some(s) = scope {
            if let Some(reason) = s.reason.get() {
                return Some(*reason);
            }
            scope = s.parent.as_deref();
        }
        None
    }
}

/// Cancellation scope handed to every command run.
#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
    scope: Arc<Scope>,
}

impl Context {
    /// Create a root context that is never cancelled on its own.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a root context driven by an existing token.
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
            scope: Arc::default(),
        }
    }

    /// Derive a child context together with a handle that cancels it.
    pub fn with_cancel(&self) -> (Self, CancelHandle) {
        let token = self.token.child_token();
        let scope = Scope::child(&self.scope);
        let ctx = Self {
            token: token.clone(),
            deadline: self.deadline,
            scope: Arc::clone(&scope),
        };
        (ctx, CancelHandle { token, scope })
    }

    /// Derive a child context that expires at `deadline`.
    ///
    /// The child never outlives the parent's own deadline. Inside a tokio
    /// runtime a timer task cancels the child's token when the deadline
    /// passes, so waiting on [`token`](Self::token) observes expiry too.
    /// Outside a runtime expiry is noticed the next time the context is
    /// queried.
    pub fn with_deadline(&self, deadline: Instant) -> (Self, CancelHandle) {
        let (mut ctx, handle) = self.with_cancel();
        let deadline = match self.deadline {
            Some(parent) => parent.min(deadline),
            None => deadline,
        };
        ctx.deadline = Some(deadline);

        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            let token = ctx.token.clone();
            let scope = Arc::clone(&ctx.scope);
            runtime.spawn(async move {
                tokio::select! {
                    _ = token.cancelled() => {}
                    _ = tokio::time::sleep_until(deadline) => {
                        scope.record(Reason::DeadlineExceeded);
                        token.cancel();
                    }
                }
            });
        }
        (ctx, handle)
    }

    /// Derive a child context that expires after `timeout`.
    pub fn with_timeout(&self, timeout: Duration) -> (Self, CancelHandle) {
        self.with_deadline(Instant::now() + timeout)
    }

    /// The deadline of this context, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The underlying cancellation token.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Why this context is done, or `None` while it is still live.
    ///
    /// The first reason observed sticks: a context cancelled before its
    /// deadline keeps reporting [`HarnessError::Cancelled`] afterwards.
    pub fn err(&self) -> Option<HarnessError> {
        if self.token.is_cancelled() {
            let reason = match self.scope.recorded() {
                Some(reason) => reason,
                None if self.expired() => Reason::DeadlineExceeded,
                None => Reason::Cancelled,
            };
            return Some(self.scope.record(reason).into());
        }
        if self.expired() {
            let reason = self.scope.record(Reason::DeadlineExceeded);
            self.token.cancel();
            return Some(reason.into());
        }
        None
    }

    /// Check whether the context has been cancelled or has expired.
    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Wait until the context is cancelled or its deadline passes.
    pub async fn done(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.token.cancelled() => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.token.cancelled().await,
        }
    }

    /// Wait until the context is done and return the reason.
    pub async fn cancelled(&self) -> HarnessError {
        self.done().await;
        self.err().unwrap_or(HarnessError::Cancelled)
    }

    fn expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// Cancels a derived [`Context`].
///
/// Dropping the handle does not cancel; use [`CancelHandle::drop_guard`] for
/// scope-bound cancellation.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    token: CancellationToken,
    scope: Arc<Scope>,
}

impl CancelHandle {
    /// Cancel the context and every context derived from it.
    pub fn cancel(&self) {
        self.scope.record(Reason::Cancelled);
        self.token.cancel();
    }

    /// Check whether the context was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Cancel the context when the returned guard is dropped.
    pub fn drop_guard(self) -> CancelGuard {
        CancelGuard { handle: self }
    }
}

/// Cancels its context on drop. Created by [`CancelHandle::drop_guard`].
#[derive(Debug)]
#[must_use = "the context is cancelled as soon as the guard is dropped"]
pub struct CancelGuard {
    handle: CancelHandle,
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        self.handle.cancel();
    }
}
