//! Root runner: run once, report, terminate.

use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::resolve::resolve;
use crate::context::Context;
use crate::execution::{execute, BoxWriter, Command, Streams};

/// Capability to end the host process.
pub trait Terminate {
    /// Terminate with `code`.
    fn terminate(&mut self, code: i32);
}

/// Terminates the real process through [`std::process::exit`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExit;

impl Terminate for ProcessExit {
    fn terminate(&mut self, code: i32) {
        std::process::exit(code)
    }
}

impl<F: FnMut(i32)> Terminate for F {
    fn terminate(&mut self, code: i32) {
        self(code)
    }
}

/// Runs a command tree as the program's root and ends the process.
///
/// The error of the run is printed to the diagnostic stream unless it carries
/// the already-reported marker, and the exit code is taken from the nearest
/// carrier in the error chain (1 without one, 0 on success).
pub struct RootRunner<T = ProcessExit> {
    terminate: T,
    args: Option<Vec<String>>,
    streams: Option<Streams>,
    diagnostics: Option<BoxWriter>,
}

impl RootRunner<ProcessExit> {
    /// Runner bound to the real process.
    pub fn new() -> Self {
        Self {
            terminate: ProcessExit,
            args: None,
            streams: None,
            diagnostics: None,
        }
    }
}

impl Default for RootRunner<ProcessExit> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Terminate> RootRunner<T> {
    /// Replace the termination capability.
    pub fn with_terminate<U: Terminate>(self, terminate: U) -> RootRunner<U> {
        RootRunner {
            terminate,
            args: self.args,
            streams: self.streams,
            diagnostics: self.diagnostics,
        }
    }

    /// Use `args` instead of the process arguments.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = Some(args.into_iter().map(Into::into).collect());
        self
    }

    /// Bind the run to `streams` instead of the host's standard streams.
    pub fn with_streams(mut self, streams: Streams) -> Self {
        self.streams = Some(streams);
        self
    }

    /// Print the resolved error message to `diagnostics` instead of stderr.
    pub fn with_diagnostics(
        mut self,
        diagnostics: impl tokio::io::AsyncWrite + Send + Unpin + 'static,
    ) -> Self {
        self.diagnostics = Some(Box::new(diagnostics));
        self
    }

    /// Run `cmd` to completion, report its error and terminate.
    ///
    /// Everything the run holds, its context included, is released before
    /// the terminate capability is invoked.
    pub async fn run<C: Command + ?Sized>(mut self, cmd: &C, ctx: Context) {
        let code = {
            let (ctx, cancel) = ctx.with_cancel();
            let _guard = cancel.drop_guard();

            let args = self.args.take().unwrap_or_else(process_args);
            let streams = self.streams.take().unwrap_or_default();
            let result = execute(cmd, ctx, streams, args).await;

            let resolution = resolve(&result);
            if let Some(message) = &resolution.message {
                let mut diagnostics = self
                    .diagnostics
                    .take()
                    .unwrap_or_else(|| Box::new(tokio::io::stderr()));
                if let Err(e) = write_line(&mut diagnostics, message).await {
                    warn!(error = %e, "failed to print command error");
                }
            }
            resolution.code()
        };

        debug!(code, "terminating");
        self.terminate.terminate(code);
    }
}

impl<T> std::fmt::Debug for RootRunner<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RootRunner")
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}

/// Run `cmd` as the program root under a fresh context and exit the process.
pub async fn execute_root<C: Command>(cmd: C) {
    execute_root_context(cmd, Context::new()).await
}

/// Same as [`execute_root`] but under `ctx`.
pub async fn execute_root_context<C: Command>(cmd: C, ctx: Context) {
    RootRunner::new().run(&cmd, ctx).await
}

fn process_args() -> Vec<String> {
    std::env::args_os()
        .skip(1)
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect()
}

async fn write_line(out: &mut BoxWriter, message: &str) -> std::io::Result<()> {
    out.write_all(message.as_bytes()).await?;
    out.write_all(b"\n").await?;
    out.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use crate::execution::{CommandFn, SharedBuffer};
    use crate::exit::{mark_as_reported, with_exit_code};
    use std::sync::{Arc, Mutex};

    async fn run_returning(err: Option<fn() -> BoxError>) -> (Option<i32>, String) {
        let code = Arc::new(Mutex::new(None));
        let recorded = code.clone();
        let diagnostics = SharedBuffer::new();

        let cmd = CommandFn::new(move |_ctx, _args, _io| {
            Box::pin(async move {
                match err {
                    Some(make) => Err::<(), BoxError>(make()),
                    None => Ok(()),
                }
            })
        });

        RootRunner::new()
            .with_terminate(move |c: i32| *recorded.lock().unwrap() = Some(c))
            .with_args(Vec::<String>::new())
            .with_diagnostics(diagnostics.clone())
            .run(&cmd, Context::new())
            .await;

        let code = *code.lock().unwrap();
        (code, diagnostics.contents())
    }

    #[tokio::test]
    async fn test_success_exits_zero_silently() {
        let (code, printed) = run_returning(None).await;
        assert_eq!(code, Some(0));
        assert!(printed.is_empty());
    }

    #[tokio::test]
    async fn test_silent_marker_exits_one_silently() {
        let (code, printed) = run_returning(Some(mark_as_reported)).await;
        assert_eq!(code, Some(1));
        assert!(printed.is_empty());
    }

    #[tokio::test]
    async fn test_carried_code_printed() {
        let (code, printed) = run_returning(Some(|| with_exit_code("foo", 2))).await;
        assert_eq!(code, Some(2));
        assert_eq!(printed, "foo\n");
    }

    #[tokio::test]
    async fn test_generic_error_printed() {
        let (code, printed) = run_returning(Some(|| "some error".into())).await;
        assert_eq!(code, Some(1));
        assert_eq!(printed, "some error\n");
    }

    #[tokio::test]
    async fn test_context_released_before_terminate() {
        let slot = Arc::new(Mutex::new(None::<Context>));
        let stored = slot.clone();
        let observed = Arc::new(Mutex::new(None));
        let seen = observed.clone();

        let cmd = CommandFn::new(move |ctx, _args, _io| {
            let stored = stored.clone();
            Box::pin(async move {
                *stored.lock().unwrap() = Some(ctx);
                Ok::<(), BoxError>(())
            })
        });

        RootRunner::new()
            .with_terminate(move |_code: i32| {
                let ctx = slot.lock().unwrap().clone();
                *seen.lock().unwrap() = ctx.map(|c| c.is_done());
            })
            .with_args(["run"])
            .run(&cmd, Context::new())
            .await;

        assert_eq!(*observed.lock().unwrap(), Some(true));
    }
}
