//! Exit code resolution and the root runner.
//!
//! A run communicates its process-level outcome through its error chain:
//! - [`mark_as_reported`] silences printing of an error already shown to the user
//! - [`with_exit_code`] names the exit code explicitly
//!
//! Both compose: a silenced error can still carry a code, and a printed error
//! can carry code 0.
//!
//! # Example
//!
//! ```
//! use cli_harness::exit::{mark_as_reported, resolve, with_exit_code};
//!
//! let silent = resolve(&Err(with_exit_code(mark_as_reported(), 3)));
//! assert_eq!(silent.code(), 3);
//! assert!(silent.message.is_none());
//!
//! let loud = resolve(&Err(with_exit_code("foo", 0)));
//! assert_eq!(loud.code(), 0);
//! assert_eq!(loud.message.as_deref(), Some("foo"));
//! ```

mod carrier;
mod resolve;
mod root;

pub use carrier::{
    find_exit_code, is_reported, mark_as_reported, with_exit_code, AlreadyReported,
    ExitCodeCarrier, ExitCodeError,
};
pub use resolve::{resolve, resolve_error, ExitOutcome, Resolution, DEFAULT_FAILURE_CODE};
pub use root::{execute_root, execute_root_context, ProcessExit, RootRunner, Terminate};
