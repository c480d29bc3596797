//! Stream-capturing command executor.

use std::time::Instant;

use tracing::{debug, warn};

use super::background::BackgroundTask;
use super::command::{Command, CommandRef};
use super::result::ExecutionResult;
use super::streams::{BoxReader, SharedBuffer, Streams};
use crate::context::Context;
use crate::error::CommandResult;

/// Run `cmd` with the given streams and arguments until it completes.
///
/// Returns only after the whole dispatch, child commands included, has
/// finished or has unwound after `ctx` was cancelled. Both output streams are
/// flushed and the input stream is detached before returning.
pub async fn execute<C, I, S>(cmd: &C, ctx: Context, io: Streams, args: I) -> CommandResult
where
    C: Command + ?Sized,
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    run_collected(cmd, ctx, io, collect_args(args)).await
}

/// Run `cmd` with output and error captured in memory.
///
/// Pass `None` for `stdin` to read from the host's standard input.
pub async fn execute_buffered<C, I, S>(
    cmd: &C,
    ctx: Context,
    stdin: Option<BoxReader>,
    args: I,
) -> ExecutionResult
where
    C: Command + ?Sized,
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let stdout = SharedBuffer::new();
    let stderr = SharedBuffer::new();
    let io = Streams::new(stdin, None, None)
        .with_stdout(stdout.clone())
        .with_stderr(stderr.clone());

    let start = Instant::now();
    let outcome = run_collected(cmd, ctx, io, collect_args(args)).await;

    ExecutionResult::new(stdout.contents(), stderr.contents(), outcome, start.elapsed())
}

/// Buffered run under a fresh context that is cancelled once the run returns.
pub async fn exec<C, I, S>(cmd: &C, stdin: Option<BoxReader>, args: I) -> ExecutionResult
where
    C: Command + ?Sized,
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let (ctx, cancel) = Context::new().with_cancel();
    let _guard = cancel.drop_guard();
    execute_buffered(cmd, ctx, stdin, args).await
}

/// Start `cmd` on a separate task and return a handle to wait on.
///
/// Must be called from within a tokio runtime.
pub fn execute_background<I, S>(cmd: CommandRef, ctx: Context, io: Streams, args: I) -> BackgroundTask
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let args = collect_args(args);
    let handle = tokio::spawn(async move { run_collected(&*cmd, ctx, io, args).await });
    BackgroundTask::new(handle)
}

fn collect_args<I, S>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    args.into_iter().map(Into::into).collect()
}

async fn run_collected<C>(cmd: &C, ctx: Context, mut io: Streams, args: Vec<String>) -> CommandResult
where
    C: Command + ?Sized,
{
    let start = Instant::now();
    debug!(?args, "executing command");

    let mut result = cmd.run(ctx, args, &mut io).await;

    if let Err(e) = io.flush().await {
        warn!(error = %e, "failed to flush command output");
        if result.is_ok() {
            result = Err(e.into());
        }
    }
    io.detach_stdin();

    debug!(
        elapsed = ?start.elapsed(),
        ok = result.is_ok(),
        "command finished"
    );
    result
}
