//! Rule identifier commands.

use crate::runtime::context::CommandContext;
use crate::runtime::error::{XtaskError, XtaskResult};
use crate::XtaskCommand;
use chrono::SecondsFormat;
use okite_docs::{RuleId, RuleIdGenerator};

/// Requested rule-id action.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RuleIdAction {
    Generate { prefix: String, count: usize },
    Check { ids: Vec<String> },
    Help,
}

/// `cargo xtask rule-id ...`
pub struct RuleIdCommand;

impl XtaskCommand for RuleIdCommand {
    type Options = RuleIdAction;

    fn parse(args: &[String]) -> XtaskResult<Self::Options> {
        parse_rule_id_action(args)
    }

    fn run(_ctx: &CommandContext, action: Self::Options) -> XtaskResult<()> {
        match action {
            RuleIdAction::Help => {
                print_rule_id_usage();
                Ok(())
            }
            RuleIdAction::Generate { prefix, count } => {
                for id in generate_batch(&prefix, count)? {
                    println!("{id}");
                }
                Ok(())
            }
            RuleIdAction::Check { ids } => {
                let mut invalid = 0usize;
                for line in describe(&ids) {
                    if line.starts_with("invalid") {
                        invalid += 1;
                    }
                    println!("{line}");
                }
                if invalid > 0 {
                    return Err(XtaskError::validation(format!(
                        "{invalid} of {} rule identifier(s) are invalid",
                        ids.len()
                    )));
                }
                Ok(())
            }
        }
    }
}

fn parse_rule_id_action(args: &[String]) -> XtaskResult<RuleIdAction> {
    match args.first().map(String::as_str) {
        None | Some("help" | "--help" | "-h") => Ok(RuleIdAction::Help),
        Some("generate") => {
            let mut prefix: Option<String> = None;
            let mut count = 1usize;
            let mut i = 1usize;
            while i < args.len() {
                match args[i].as_str() {
                    "--count" => {
                        let Some(value) = args.get(i + 1) else {
                            return Err(XtaskError::validation("missing value for `--count`"));
                        };
                        count = value.parse::<usize>().ok().filter(|n| *n > 0).ok_or_else(|| {
                            XtaskError::validation(format!("invalid `--count` value `{value}`"))
                        })?;
                        i += 2;
                    }
                    other if prefix.is_none() && !other.starts_with("--") => {
                        prefix = Some(other.to_string());
                        i += 1;
                    }
                    other => {
                        return Err(XtaskError::validation(format!(
                            "unexpected rule-id argument: {other}"
                        )))
                    }
                }
            }
            let prefix = prefix.ok_or_else(|| {
                XtaskError::validation("missing `<prefix>`")
                    .with_hint("usage: cargo xtask rule-id generate <prefix> [--count N]")
            })?;
            Ok(RuleIdAction::Generate { prefix, count })
        }
        Some("check") => {
            let ids = args[1..].to_vec();
            if ids.is_empty() {
                return Err(XtaskError::validation("missing rule identifiers to check"));
            }
            Ok(RuleIdAction::Check { ids })
        }
        Some(other) => Err(XtaskError::validation(format!(
            "unsupported rule-id command: {other}"
        ))),
    }
}

fn generate_batch(prefix: &str, count: usize) -> XtaskResult<Vec<RuleId>> {
    let mut generator = RuleIdGenerator::monotonic();
    (0..count)
        .map(|_| generator.generate(prefix).map_err(XtaskError::from))
        .collect()
}

/// One status line per identifier: `ok`, `ok (non-canonical case)` or `invalid`.
fn describe(ids: &[String]) -> Vec<String> {
    ids.iter()
        .map(|text| match RuleId::parse(text) {
            Ok(id) => {
                let issued = id
                    .suffix()
                    .datetime()
                    .map(|at| at.to_rfc3339_opts(SecondsFormat::Millis, true))
                    .unwrap_or_else(|| "unknown time".into());
                let case = if id.has_canonical_case() {
                    ""
                } else {
                    " (non-canonical case)"
                };
                format!("ok{case} {text} -> {id} issued {issued}")
            }
            Err(err) => format!("invalid {text}: {err}"),
        })
        .collect()
}

fn print_rule_id_usage() {
    eprintln!(
        "Usage: cargo xtask rule-id <command>\n\
         \n\
         Commands:\n\
           generate <prefix> [--count N]     Print N new identifiers in sort order (default 1)\n\
           check <id>...                     Validate identifiers and show their timestamps\n"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_generate_with_count() {
        assert_eq!(
            parse_rule_id_action(&args(&["generate", "meta", "--count", "3"])).expect("parse"),
            RuleIdAction::Generate {
                prefix: "meta".into(),
                count: 3
            }
        );
        assert!(parse_rule_id_action(&args(&["generate"])).is_err());
        assert!(parse_rule_id_action(&args(&["generate", "meta", "--count", "0"])).is_err());
    }

    #[test]
    fn parse_check_requires_ids() {
        assert!(parse_rule_id_action(&args(&["check"])).is_err());
        assert_eq!(
            parse_rule_id_action(&args(&["check", "a", "b"])).expect("parse"),
            RuleIdAction::Check {
                ids: args(&["a", "b"])
            }
        );
    }

    #[test]
    fn generated_batch_is_sorted_and_valid() {
        let batch = generate_batch("meta", 5).expect("generate");
        let texts: Vec<String> = batch.iter().map(RuleId::to_string).collect();
        let mut sorted = texts.clone();
        sorted.sort();
        assert_eq!(texts, sorted);
        assert!(texts.iter().all(|t| RuleId::is_valid(t) && t.starts_with("meta-")));
        assert!(generate_batch("Bad Prefix", 1).is_err());
    }

    #[test]
    fn describe_flags_invalid_and_non_canonical_ids() {
        let lines = describe(&args(&[
            "meta-01jpbn8mms2gdbh8hbk78e6f24",
            "META-01jpbn8mms2gdbh8hbk78e6f24",
            "meta-01jpbn8mms2gdbh8hbk78e6fi4",
        ]));
        assert!(lines[0].starts_with("ok meta-"));
        assert!(lines[1].starts_with("ok (non-canonical case)"));
        assert!(lines[2].starts_with("invalid"));
    }
}
