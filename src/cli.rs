//! The `greetme` demo program.
//!
//! A small command tree that exercises the harness end to end: the root
//! command reads from stdin and reports its own errors, and `version` writes
//! to stdout.
//!
//! ```text
//! greetme [--exit-code <N>]
//! greetme version
//! greetme version deeply-nested
//! ```

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::context::Context;
use crate::error::{BoxError, CommandResult};
use crate::execution::{BoxReader, Streams};
use crate::exit::{mark_as_reported, with_exit_code};
use crate::tree::CommandNode;

/// Exit code used when reading the name fails and `--exit-code` is absent.
pub const DEFAULT_ERROR_EXIT_CODE: i32 = 1;

/// Parsed flags of the root command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GreetArgs {
    /// Exit code to return when the name cannot be read.
    pub exit_code: i32,
}

impl Default for GreetArgs {
    fn default() -> Self {
        Self {
            exit_code: DEFAULT_ERROR_EXIT_CODE,
        }
    }
}

/// Argument parsing errors.
#[derive(Error, Debug)]
pub enum ArgsError {
    /// Lexopt parsing error.
    #[error(transparent)]
    Lexopt(#[from] lexopt::Error),

    /// Invalid argument value.
    #[error("invalid value for --{0}: '{1}'")]
    InvalidValue(&'static str, String),

    /// Unexpected positional argument.
    #[error("unexpected argument: '{0}'")]
    UnexpectedArgument(String),
}

/// Parse the root command's flags.
pub fn parse_greet_args(args: Vec<String>) -> Result<GreetArgs, ArgsError> {
    use lexopt::prelude::*;

    let mut result = GreetArgs::default();
    let mut parser = lexopt::Parser::from_args(args);

    while let Some(arg) = parser.next()? {
        match arg {
            Long("exit-code") => {
                let value: String = parser.value()?.parse()?;
                result.exit_code = value
                    .parse()
                    .map_err(|_| ArgsError::InvalidValue("exit-code", value))?;
            }
            Value(val) => {
                return Err(ArgsError::UnexpectedArgument(
                    val.to_string_lossy().into(),
                ));
            }
            _ => return Err(arg.unexpected().into()),
        }
    }

    Ok(result)
}

/// Build the `greetme` command tree.
pub fn root_command() -> CommandNode {
    CommandNode::new("greetme")
        .about("This is a friendly program to greet you.")
        .run_fn(|ctx, args, io| Box::pin(greet(ctx, args, io)))
        .subcommand(version_command(""))
}

/// Build a `version` command printing `version`.
///
/// An empty `version` falls back to the version the crate was built with.
pub fn version_command(version: &str) -> CommandNode {
    version_node(version.to_string(), option_env!("CARGO_PKG_VERSION"))
}

fn version_node(version: String, build_version: Option<&'static str>) -> CommandNode {
    CommandNode::new("version")
        .about("Prints the version of this program.")
        .run_fn(move |_ctx, _args, io| {
            Box::pin(print_version(version.clone(), build_version, io))
        })
        .subcommand(
            CommandNode::new("deeply-nested")
                .about("An example of a deeply nested subcommand.")
                .run_fn(|_ctx, _args, _io| Box::pin(async { Ok::<(), BoxError>(()) })),
        )
}

async fn greet(ctx: Context, args: Vec<String>, io: &mut Streams) -> CommandResult {
    let args = parse_greet_args(args)?;

    io.print_err("Hello, what is your name?\n").await?;

    let name = tokio::select! {
        name = read_name(io.stdin()) => name,
        err = ctx.cancelled() => return Err(err.into()),
    };

    match name {
        Ok(name) => {
            io.print_err(&format!("Hello {name}\n")).await?;
            Ok(())
        }
        Err(e) => {
            io.print_err(&format!("Error reading name: {e}\n")).await?;
            Err(with_exit_code(mark_as_reported(), args.exit_code))
        }
    }
}

/// Read one newline-terminated line; input ending without a newline is an error.
async fn read_name(stdin: &mut BoxReader) -> std::io::Result<String> {
    let mut line = String::new();
    BufReader::new(stdin).read_line(&mut line).await?;

    match line.strip_suffix('\n') {
        Some(name) => Ok(name.trim_end_matches('\r').to_string()),
        None => Err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "unexpected end of input",
        )),
    }
}

async fn print_version(
    version: String,
    build_version: Option<&'static str>,
    io: &mut Streams,
) -> CommandResult {
    let version = match (version.is_empty(), build_version) {
        (false, _) => version,
        (true, Some(built)) if !built.is_empty() => built.to_string(),
        (true, _) => {
            io.print_err("No version information available.\n").await?;
            return Err(mark_as_reported());
        }
    };

    io.print_out(&format!("Version: {version}")).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::{exec, input};
    use crate::exit::{is_reported, ExitOutcome};

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_default_args() {
        let result = parse_greet_args(Vec::new()).unwrap();
        assert_eq!(result.exit_code, 1);
    }

    #[test]
    fn test_exit_code_forms() {
        let result = parse_greet_args(strings(&["--exit-code", "3"])).unwrap();
        assert_eq!(result.exit_code, 3);

        let result = parse_greet_args(strings(&["--exit-code=42"])).unwrap();
        assert_eq!(result.exit_code, 42);
    }

    #[test]
    fn test_invalid_exit_code() {
        let err = parse_greet_args(strings(&["--exit-code", "many"])).unwrap_err();
        assert_eq!(err.to_string(), "invalid value for --exit-code: 'many'");
    }

    #[test]
    fn test_unexpected_argument() {
        let err = parse_greet_args(strings(&["bob"])).unwrap_err();
        assert!(matches!(err, ArgsError::UnexpectedArgument(ref a) if a == "bob"));

        let err = parse_greet_args(strings(&["--loud"])).unwrap_err();
        assert!(matches!(err, ArgsError::Lexopt(_)));
    }

    #[tokio::test]
    async fn test_greets_by_name() {
        let result = exec(&root_command(), Some(input("Alice\n")), Vec::<String>::new()).await;
        assert!(result.success());
        assert!(result.stdout.is_empty());
        assert_eq!(result.stderr, "Hello, what is your name?\nHello Alice\n");
    }

    #[tokio::test]
    async fn test_read_error_uses_exit_code() {
        let mock = tokio_test::io::Builder::new()
            .read_error(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "stdin gone",
            ))
            .build();

        let result = exec(&root_command(), Some(Box::new(mock)), ["--exit-code", "5"]).await;
        let err = result.error().expect("expected error");
        assert!(is_reported(&**err));
        assert_eq!(result.resolution().outcome, ExitOutcome::CarriedFailure(5));
        assert!(result.stderr.ends_with("Error reading name: stdin gone\n"));
    }

    #[tokio::test]
    async fn test_missing_newline_fails_silently() {
        let result = exec(&root_command(), Some(input("Bob")), Vec::<String>::new()).await;
        assert_eq!(result.exit_code(), 1);
        assert!(result.resolution().message.is_none());
        assert!(result.stderr.contains("Error reading name:"));
    }

    #[tokio::test]
    async fn test_version_explicit() {
        let result = exec(&version_command("v1.2.3"), None, Vec::<String>::new()).await;
        assert!(result.success());
        assert_eq!(result.stdout, "Version: v1.2.3");
    }

    #[tokio::test]
    async fn test_version_falls_back_to_build() {
        let cmd = version_node(String::new(), Some("0.9.0"));
        let result = exec(&cmd, None, Vec::<String>::new()).await;
        assert_eq!(result.stdout, "Version: 0.9.0");
    }

    #[tokio::test]
    async fn test_version_unknown_fails_silently() {
        let result = exec(&version_node(String::new(), None), None, Vec::<String>::new()).await;
        assert_eq!(result.resolution().outcome, ExitOutcome::SilentFailure);
        assert!(result.stdout.is_empty());
        assert_eq!(result.stderr, "No version information available.\n");
    }

    #[tokio::test]
    async fn test_deeply_nested_runs() {
        let result = exec(&root_command(), None, ["version", "deeply-nested"]).await;
        assert!(result.success());
        assert!(result.stdout.is_empty());
    }
}
