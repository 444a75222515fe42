//! Top-level CLI parsing and help output.

use crate::runtime::error::{XtaskError, XtaskResult};

/// Top-level `xtask` command families.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TopLevelCommand {
    Docs(Vec<String>),
    RuleId(Vec<String>),
    Help,
}

/// Flags accepted anywhere on the command line.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct GlobalOptions {
    pub verbose: bool,
}

/// A parsed command line.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Invocation {
    pub global: GlobalOptions,
    pub command: TopLevelCommand,
}

/// Parse raw command-line arguments into a top-level command selection.
///
/// Global flags are taken out before the command family sees its arguments, so
/// `cargo xtask --verbose docs check` and `cargo xtask docs check --verbose` are equivalent.
pub fn parse(args: Vec<String>) -> XtaskResult<Invocation> {
    let mut global = GlobalOptions::default();
    let args: Vec<String> = args
        .into_iter()
        .filter(|arg| {
            let is_verbose = arg == "--verbose";
            global.verbose |= is_verbose;
            !is_verbose
        })
        .collect();

    let Some(cmd) = args.first() else {
        return Ok(Invocation {
            global,
            command: TopLevelCommand::Help,
        });
    };

    let rest = args[1..].to_vec();
    let command = match cmd.as_str() {
        "docs" => TopLevelCommand::Docs(rest),
        "rule-id" => TopLevelCommand::RuleId(rest),
        "help" | "--help" | "-h" => TopLevelCommand::Help,
        other => {
            return Err(XtaskError::validation(format!(
                "unknown xtask command: {other}"
            ))
            .with_hint("run `cargo xtask help` for the command list"))
        }
    };
    Ok(Invocation { global, command })
}

/// Print the canonical top-level usage text.
pub fn print_usage() {
    eprintln!(
        "Usage: cargo xtask <command> [args]\n\
         \n\
         Commands:\n\
           docs <subcommand>   Validate the okite document corpus (check/frontmatter/structure/links/file/audit-report)\n\
           rule-id <subcommand>\n\
                              Generate or check rule identifiers (generate/check)\n\
         \n\
         Global flags (any position):\n\
           --verbose           Log per-document progress to stderr (RUST_LOG overrides)\n"
    );
}
