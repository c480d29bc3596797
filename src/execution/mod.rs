//! In-process command execution.
//!
//! This module runs command trees the way a subprocess would be run:
//! - Foreground runs with bound or captured streams
//! - Background runs with a joinable handle
//! - Repeatable runs that rebuild the tree on every call
//!
//! # Example
//!
//! ```no_run
//! use cli_harness::execution::{exec, input, CommandFn};
//! use cli_harness::BoxError;
//!
//! # async fn demo() {
//! let greet = CommandFn::new(|_ctx, args, io| {
//!     Box::pin(async move {
//!         io.print_out(&format!("hello {}", args.join(" "))).await?;
//!         Ok::<(), BoxError>(())
//!     })
//! });
//!
//! let result = exec(&greet, Some(input("")), ["world"]).await;
//! assert_eq!(result.stdout, "hello world");
//! # }
//! ```

mod background;
mod command;
mod executor;
mod invoker;
mod result;
mod streams;

pub use background::BackgroundTask;
pub use command::{Command, CommandFn, CommandRef, RunFuture};
pub use executor::{exec, execute, execute_background, execute_buffered};
pub use invoker::Invoker;
pub use result::ExecutionResult;
pub use streams::{input, BoxReader, BoxWriter, SharedBuffer, Streams};
