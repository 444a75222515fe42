//! Workspace maintenance commands (`cargo xtask`).
//!
//! The binary is a thin wrapper; parsing and dispatch live in the library so they can be tested.

use std::process::ExitCode;

fn main() -> ExitCode {
    xtask::exit_code(xtask::execute_from_env())
}
