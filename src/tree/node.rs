//! Named command node with subcommand routing.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::context::Context;
use crate::error::{CommandResult, HarnessError};
use crate::execution::{Command, CommandFn, CommandRef, RunFuture, Streams};

/// A node of a command tree.
///
/// Routing walks the argument vector from the root: leading tokens that name
/// a child descend into it, flag tokens are kept for the leaf, and the first
/// other token (or `--`) ends routing. The leaf receives the kept tokens in
/// their original order.
#[derive(Clone)]
pub struct CommandNode {
    name: String,
    about: String,
    handler: Option<CommandRef>,
    children: Vec<CommandNode>,
}

/// Where an argument vector lands in a tree.
#[derive(Debug)]
pub struct Route<'a> {
    /// The node that handles the invocation.
    pub node: &'a CommandNode,
    /// Space-separated names from the root to `node`.
    pub path: String,
    /// Arguments handed to the node.
    pub args: Vec<String>,
}

impl Route<'_> {
    /// First positional argument the node did not recognise as a subcommand.
    pub fn unmatched(&self) -> Option<&str> {
        self.args
            .iter()
            .take_while(|arg| arg.as_str() != "--")
            .find(|arg| !is_flag(arg))
            .map(String::as_str)
    }

    fn dispatch_error(&self) -> HarnessError {
        match self.unmatched() {
            Some(name) => HarnessError::UnknownCommand {
                name: name.to_string(),
                path: self.path.clone(),
            },
            None => HarnessError::NotRunnable(self.path.clone()),
        }
    }
}

impl CommandNode {
    /// Create a node without behavior or children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            about: String::new(),
            handler: None,
            children: Vec::new(),
        }
    }

    /// Set the one-line description.
    pub fn about(mut self, about: impl Into<String>) -> Self {
        self.about = about.into();
        self
    }

    /// Set the run behavior.
    pub fn handler(mut self, handler: impl Command + 'static) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Set the run behavior from a closure.
    pub fn run_fn<F>(self, f: F) -> Self
    where
        F: for<'a> Fn(Context, Vec<String>, &'a mut Streams) -> RunFuture<'a>
            + Send
            + Sync
            + 'static,
    {
        self.handler(CommandFn::new(f))
    }

    /// Attach a subcommand.
    pub fn subcommand(mut self, child: CommandNode) -> Self {
        self.children.push(child);
        self
    }

    /// The name this node is invoked by.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// One-line description shown in help.
    pub fn description(&self) -> &str {
        &self.about
    }

    /// Direct subcommands, in registration order.
    pub fn children(&self) -> &[CommandNode] {
        &self.children
    }

    /// Check whether the node has a run behavior.
    pub fn is_runnable(&self) -> bool {
        self.handler.is_some()
    }

    /// Direct child called `name`.
    pub fn child(&self, name: &str) -> Option<&CommandNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Resolve `args` to the node that should handle them.
    pub fn route(&self, args: Vec<String>) -> Route<'_> {
        let mut node = self;
        let mut path = self.name.clone();
        let mut kept = Vec::with_capacity(args.len());
        let mut rest = args.into_iter();

        while let Some(arg) = rest.next() {
            if arg == "--" {
                kept.push(arg);
                break;
            }
            if is_flag(&arg) {
                kept.push(arg);
                continue;
            }
            match node.child(&arg) {
                Some(child) => {
                    node = child;
                    path.push(' ');
                    path.push_str(&child.name);
                }
                None => {
                    kept.push(arg);
                    break;
                }
            }
        }
        kept.extend(rest);

        Route {
            node,
            path,
            args: kept,
        }
    }
}

impl std::fmt::Debug for CommandNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandNode")
            .field("name", &self.name)
            .field("runnable", &self.is_runnable())
            .field("children", &self.children)
            .finish()
    }
}

#[async_trait]
impl Command for CommandNode {
    async fn run(&self, ctx: Context, args: Vec<String>, io: &mut Streams) -> CommandResult {
        if let Some(err) = ctx.err() {
            return Err(err.into());
        }

        let route = self.route(args);
        debug!(command = %route.path, args = ?route.args, "dispatching");

        match &route.node.handler {
            Some(handler) => handler.run(ctx, route.args, io).await,
            None => Err(route.dispatch_error().into()),
        }
    }
}

fn is_flag(arg: &str) -> bool {
    arg.len() > 1 && arg.starts_with('-')
}
