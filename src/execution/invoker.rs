//! Repeatable invocation of a command tree.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::background::BackgroundTask;
use super::command::{Command, CommandRef};
use super::executor::{execute_background, execute_buffered};
use super::result::ExecutionResult;
use super::streams::{BoxReader, Streams};
use crate::config::Config;
use crate::context::Context;

type Factory = Arc<dyn Fn() -> CommandRef + Send + Sync>;

/// Runs the same program many times without state leaking between runs.
///
/// Every call builds a brand-new command tree through the factory and prefixes
/// the persistent arguments to the call's own arguments. The factory must only
/// construct; it is called once per invocation.
///
/// # Example
///
/// ```no_run
/// use cli_harness::{CommandNode, Context, Invoker};
///
/// # async fn demo(new_keto: fn() -> CommandNode) {
/// let client = Invoker::new(new_keto)
///     .with_context(Context::new())
///     .with_persistent_args(["--read-remote=localhost:4466"]);
///
/// let result = client.exec(None, ["check", "article:1", "view", "user:1"]).await;
/// println!("{}", result.stdout);
/// # }
/// ```
#[derive(Clone)]
pub struct Invoker {
    factory: Factory,
    ctx: Context,
    persistent_args: Vec<String>,
    timeout: Option<Duration>,
}

impl Invoker {
    /// Create an invoker around a tree factory.
    pub fn new<F, C>(factory: F) -> Self
    where
        F: Fn() -> C + Send + Sync + 'static,
        C: Command + 'static,
    {
        Self {
            factory: Arc::new(move || Arc::new(factory()) as CommandRef),
            ctx: Context::new(),
            persistent_args: Vec::new(),
            timeout: None,
        }
    }

    /// Create an invoker whose persistent arguments and timeout come from `config`.
    pub fn from_config<F, C>(factory: F, ctx: Context, config: &Config) -> Self
    where
        F: Fn() -> C + Send + Sync + 'static,
        C: Command + 'static,
    {
        let mut invoker = Self::new(factory)
            .with_context(ctx)
            .with_persistent_args(config.invoker.persistent_args.clone());
        invoker.timeout = config.timeout();
        invoker
    }

    /// Set the persistent context used by calls without their own context.
    pub fn with_context(mut self, ctx: Context) -> Self {
        self.ctx = ctx;
        self
    }

    /// Set the arguments placed before every call's arguments.
    pub fn with_persistent_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.persistent_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Bound every call by a deadline derived from its context.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The persistent context.
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// The persistent argument prefix.
    pub fn persistent_args(&self) -> &[String] {
        &self.persistent_args
    }

    /// The per-call timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Run a fresh tree with output captured, under the persistent context.
    pub async fn exec<I, S>(&self, stdin: Option<BoxReader>, args: I) -> ExecutionResult
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exec_ctx(self.ctx.clone(), stdin, args).await
    }

    /// Same as [`exec`](Invoker::exec) but under `ctx`.
    pub async fn exec_ctx<I, S>(&self, ctx: Context, stdin: Option<BoxReader>, args: I) -> ExecutionResult
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.run_buffered(ctx, stdin, self.args(args)).await
    }

    /// Run a fresh tree on already prefixed `args`, bounded like every call.
    pub(crate) async fn run_buffered(
        &self,
        ctx: Context,
        stdin: Option<BoxReader>,
        args: Vec<String>,
    ) -> ExecutionResult {
        let (ctx, cancel) = self.derive(&ctx);
        let _guard = cancel.drop_guard();
        let cmd = self.build();
        execute_buffered(&*cmd, ctx, stdin, args).await
    }

    /// Start a fresh tree in the background, under the persistent context.
    pub fn exec_background<I, S>(&self, io: Streams, args: I) -> BackgroundTask
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exec_background_ctx(self.ctx.clone(), io, args)
    }

    /// Same as [`exec_background`](Invoker::exec_background) but under `ctx`.
    pub fn exec_background_ctx<I, S>(&self, ctx: Context, io: Streams, args: I) -> BackgroundTask
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (ctx, _) = self.derive(&ctx);
        execute_background(self.build(), ctx, io, self.args(args))
    }

    fn build(&self) -> CommandRef {
        (self.factory)()
    }

    pub(crate) fn args<I, S>(&self, args: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = self
            .persistent_args
            .iter()
            .cloned()
            .chain(args.into_iter().map(Into::into))
            .collect();
        debug!(?args, "invoking fresh command tree");
        args
    }

    fn derive(&self, ctx: &Context) -> (Context, crate::context::CancelHandle) {
        match self.timeout {
            Some(timeout) => ctx.with_timeout(timeout),
            None => ctx.with_cancel(),
        }
    }
}

impl std::fmt::Debug for Invoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Invoker")
            .field("persistent_args", &self.persistent_args)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
