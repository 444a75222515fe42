//! Workspace maintenance commands (`cargo xtask`).
//!
//! The crate is a small CLI layer over [`okite_docs`]. Command modules own argument handling and
//! output while [`runtime`] owns configuration loading, error reporting and the workspace context.

pub mod cli;
pub mod commands;
pub mod runtime;

use crate::cli::TopLevelCommand;
use crate::commands::docs::DocsCommand;
use crate::commands::rule_id::RuleIdCommand;
use crate::runtime::context::CommandContext;
use crate::runtime::error::XtaskResult;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Shared command contract for top-level xtask command families.
///
/// Implementations should treat [`XtaskCommand::parse`] as a pure translation step from raw CLI
/// arguments into a typed options value and keep side effects in [`XtaskCommand::run`].
pub trait XtaskCommand {
    /// Typed options produced by CLI parsing for the command family.
    type Options;

    /// Parse command-line arguments into typed options.
    ///
    /// Implementations should return
    /// [`XtaskError::validation`](crate::runtime::error::XtaskError::validation) for invalid
    /// argument shapes.
    fn parse(args: &[String]) -> XtaskResult<Self::Options>;

    /// Execute the command family using the shared runtime context.
    fn run(ctx: &CommandContext, options: Self::Options) -> XtaskResult<()>;
}

/// Executes the `xtask` binary using the current process arguments.
pub fn execute_from_env() -> XtaskResult<()> {
    let invocation = cli::parse(std::env::args().skip(1).collect())?;
    init_tracing(invocation.global.verbose);
    let ctx = CommandContext::new()?;

    match invocation.command {
        TopLevelCommand::Docs(args) => DocsCommand::run(&ctx, DocsCommand::parse(&args)?),
        TopLevelCommand::RuleId(args) => RuleIdCommand::run(&ctx, RuleIdCommand::parse(&args)?),
        TopLevelCommand::Help => {
            cli::print_usage();
            Ok(())
        }
    }
}

/// Converts an xtask result into a stable process exit code.
///
/// All command failures map to exit code `1` after printing the formatted
/// [`XtaskError`](crate::runtime::error::XtaskError) to stderr.
pub fn exit_code(result: XtaskResult<()>) -> std::process::ExitCode {
    match result {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::ExitCode::from(1)
        }
    }
}

/// Install the stderr log subscriber. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)))
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .try_init();
}
