//! # cli-harness
//!
//! In-process execution harness for command trees.
//!
//! This crate runs a command-line program inside the current process the way
//! a test or an embedding host would run a subprocess: with its own argument
//! vector, its own standard streams and a cancellation context.
//!
//! ## Features
//!
//! - **Buffered runs**: capture stdout and stderr of a run in memory
//! - **Background runs**: start a long-running command and join it later
//! - **Repeatable runs**: rebuild the tree for every call, with persistent arguments
//! - **Exit resolution**: silent failures and explicit exit codes in the error chain
//!
//! ## Quick Start
//!
//! ```no_run
//! use cli_harness::{execute_root, CommandNode, BoxError};
//!
//! #[tokio::main]
//! async fn main() {
//!     cli_harness::logging::try_init().ok();
//!
//!     let root = CommandNode::new("hello").run_fn(|_ctx, args, io| {
//!         Box::pin(async move {
//!             io.print_out(&format!("hello {}\n", args.join(" "))).await?;
//!             Ok::<(), BoxError>(())
//!         })
//!     });
//!
//!     execute_root(root).await;
//! }
//! ```

pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod execution;
pub mod exit;
pub mod logging;
pub mod testing;
pub mod tree;

// Re-export commonly used types
pub use config::Config;
pub use context::{CancelGuard, CancelHandle, Context};
pub use error::{BoxError, CommandResult, HarnessError, Result};
pub use execution::{
    exec, execute, execute_background, execute_buffered, input, BackgroundTask, BoxReader,
    BoxWriter, Command, CommandFn, CommandRef, ExecutionResult, Invoker, SharedBuffer, Streams,
};
pub use exit::{
    execute_root, execute_root_context, mark_as_reported, resolve, with_exit_code, ExitOutcome,
    Resolution, RootRunner,
};
pub use tree::CommandNode;
