//! Command trees.
//!
//! Flag parsing is left to each node's handler; the tree only decides which
//! node receives the arguments.

mod node;

pub use node::{CommandNode, Route};
