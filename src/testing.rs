//! Assertion helpers for tests of command trees.
//!
//! The helpers panic with the captured streams in the message, so a failing
//! test shows what the program printed.

use std::sync::{Arc, Mutex};

use crate::context::Context;
use crate::execution::{execute_buffered, BoxReader, Command, ExecutionResult, Invoker};
use crate::exit::{is_reported, Terminate};

/// Run `cmd` and require success with nothing on stderr; returns stdout.
pub async fn exec_no_err<C, I, S>(cmd: &C, args: I) -> String
where
    C: Command + ?Sized,
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    exec_no_err_ctx(cmd, Context::new(), None, args).await
}

/// Same as [`exec_no_err`] but under `ctx` and with `stdin`.
pub async fn exec_no_err_ctx<C, I, S>(
    cmd: &C,
    ctx: Context,
    stdin: Option<BoxReader>,
    args: I,
) -> String
where
    C: Command + ?Sized,
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let args: Vec<String> = args.into_iter().map(Into::into).collect();
    let result = run_scoped(cmd, ctx, stdin, args.clone()).await;
    assert_no_err(result, &args)
}

/// Run `cmd` and require a silent failure with nothing on stdout; returns stderr.
pub async fn exec_expected_err<C, I, S>(cmd: &C, args: I) -> String
where
    C: Command + ?Sized,
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    exec_expected_err_ctx(cmd, Context::new(), None, args).await
}

/// Same as [`exec_expected_err`] but under `ctx` and with `stdin`.
pub async fn exec_expected_err_ctx<C, I, S>(
    cmd: &C,
    ctx: Context,
    stdin: Option<BoxReader>,
    args: I,
) -> String
where
    C: Command + ?Sized,
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let args: Vec<String> = args.into_iter().map(Into::into).collect();
    let result = run_scoped(cmd, ctx, stdin, args.clone()).await;
    assert_expected_err(result, &args)
}

impl Invoker {
    /// Run a fresh tree and require success with nothing on stderr; returns stdout.
    pub async fn exec_no_err<I, S>(&self, args: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args = self.args(args);
        let result = self.run_buffered(self.context().clone(), None, args.clone()).await;
        assert_no_err(result, &args)
    }

    /// Run a fresh tree and require a silent failure with nothing on stdout;
    /// returns stderr.
    pub async fn exec_expected_err<I, S>(&self, args: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args = self.args(args);
        let result = self.run_buffered(self.context().clone(), None, args.clone()).await;
        assert_expected_err(result, &args)
    }
}

/// A [`Terminate`] stub that records the exit code instead of exiting.
#[derive(Debug, Clone, Default)]
pub struct ExitRecorder {
    code: Arc<Mutex<Option<i32>>>,
}

impl ExitRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The code of the last termination, if any happened.
    pub fn last_code(&self) -> Option<i32> {
        *self.code.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Terminate for ExitRecorder {
    fn terminate(&mut self, code: i32) {
        *self.code.lock().unwrap_or_else(|e| e.into_inner()) = Some(code);
    }
}

async fn run_scoped<C>(cmd: &C, ctx: Context, stdin: Option<BoxReader>, args: Vec<String>) -> ExecutionResult
where
    C: Command + ?Sized,
{
    let (ctx, cancel) = ctx.with_cancel();
    let _guard = cancel.drop_guard();
    execute_buffered(cmd, ctx, stdin, args).await
}

fn assert_no_err(result: ExecutionResult, args: &[String]) -> String {
    if let Some(err) = result.error() {
        panic!(
            "command {args:?} failed: {err}\nstdout:\n{}\nstderr:\n{}",
            result.stdout, result.stderr
        );
    }
    assert!(
        result.stderr.is_empty(),
        "command {args:?} wrote to stderr:\n{}",
        result.stderr
    );
    result.stdout
}

fn assert_expected_err(result: ExecutionResult, args: &[String]) -> String {
    match result.error() {
        None => panic!(
            "command {args:?} succeeded, expected a failure\nstdout:\n{}",
            result.stdout
        ),
        Some(err) => assert!(
            is_reported(&**err),
            "command {args:?} failed with a printable error: {err}\nstderr:\n{}",
            result.stderr
        ),
    }
    assert!(
        result.stdout.is_empty(),
        "command {args:?} wrote to stdout:\n{}",
        result.stdout
    );
    result.stderr
}
