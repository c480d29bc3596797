//! Command run contract.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::BoxFuture;

use super::streams::Streams;
use crate::context::Context;
use crate::error::CommandResult;

/// Shared handle to a command tree.
pub type CommandRef = Arc<dyn Command>;

/// Future returned by closure-backed commands.
pub type RunFuture<'a> = BoxFuture<'a, CommandResult>;

/// A runnable command tree.
///
/// The executor drives every command through this single entry point: it hands
/// over the invocation context, the argument vector and the bound streams, and
/// receives the terminal error back. Implementations should watch `ctx` and
/// unwind promptly once it is done.
#[async_trait]
pub trait Command: Send + Sync {
    /// Run the command to completion.
    async fn run(&self, ctx: Context, args: Vec<String>, io: &mut Streams) -> CommandResult;
}

#[async_trait]
impl<C: Command + ?Sized> Command for Arc<C> {
    async fn run(&self, ctx: Context, args: Vec<String>, io: &mut Streams) -> CommandResult {
        (**self).run(ctx, args, io).await
    }
}

/// Closure-backed command.
///
/// # Example
///
/// ```
/// use cli_harness::{CommandFn, BoxError};
///
/// let echo = CommandFn::new(|_ctx, args, io| {
///     Box::pin(async move {
///         io.print_out(&args.join(" ")).await?;
///         Ok::<(), BoxError>(())
///     })
/// });
/// # let _ = echo;
/// ```
pub struct CommandFn<F> {
    f: F,
}

impl<F> CommandFn<F> {
    /// Wrap a closure that builds the run future for each invocation.
    pub fn new(f: F) -> Self
    where
        F: for<'a> Fn(Context, Vec<String>, &'a mut Streams) -> RunFuture<'a> + Send + Sync,
    {
        Self { f }
    }
}

impl<F> std::fmt::Debug for CommandFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandFn").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F> Command for CommandFn<F>
where
    F: for<'a> Fn(Context, Vec<String>, &'a mut Streams) -> RunFuture<'a> + Send + Sync,
{
    async fn run(&self, ctx: Context, args: Vec<String>, io: &mut Streams) -> CommandResult {
        (self.f)(ctx, args, io).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use crate::execution::SharedBuffer;

    #[tokio::test]
    async fn test_command_fn_runs_closure() {
        let cmd = CommandFn::new(|_ctx, args, io| {
            Box::pin(async move {
                io.print_out(&args.join(",")).await?;
                Ok::<(), BoxError>(())
            })
        });

        let out = SharedBuffer::new();
        let mut io = Streams::inherit().with_stdout(out.clone());
        let result = cmd
            .run(Context::new(), vec!["a".into(), "b".into()], &mut io)
            .await;

        assert!(result.is_ok());
        assert_eq!(out.contents(), "a,b");
    }

    #[tokio::test]
    async fn test_arc_command_delegates() {
        let cmd: CommandRef = Arc::new(CommandFn::new(|_ctx, _args, _io| {
            Box::pin(async move { Err::<(), BoxError>("boom".into()) })
        }));

        let mut io = Streams::inherit();
        let err = cmd.run(Context::new(), Vec::new(), &mut io).await.unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }
}
