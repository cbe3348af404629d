//! Msh builtins.
//!
//! Builtins run in the interpreter's own process, intercepted by the
//! dispatcher before pipeline execution. Only their process-control effects
//! live here; a builtin failure is reported and the read loop continues.

use std::io::Write;

use self::cd::Cd;
use self::exit::Exit;
use self::jobs::{Fg, Jobs};
use self::umask::Umask;
use crate::errors::Result;
use crate::shell::Shell;

mod cd;
mod exit;
mod jobs;
mod umask;

const CD_NAME: &str = "cd";
const EXIT_NAME: &str = "exit";
const FG_NAME: &str = "fg";
const JOBS_NAME: &str = "jobs";
const UMASK_NAME: &str = "umask";

/// Represents an msh builtin command such as cd or fg.
pub trait BuiltinCommand {
    /// The NAME of the command.
    const NAME: &'static str;
    /// The usage string to display to the user.
    const USAGE: &'static str;
    /// Runs the command with the given arguments in the `shell` environment.
    fn run(shell: &mut Shell, args: &[String], stdout: &mut dyn Write) -> Result<()>;
}

pub fn is_builtin<T: AsRef<str>>(program: T) -> bool {
    [CD_NAME, EXIT_NAME, FG_NAME, JOBS_NAME, UMASK_NAME].contains(&program.as_ref())
}

/// precondition: `program` is a builtin.
pub fn run(
    shell: &mut Shell,
    program: &str,
    args: &[String],
    stdout: &mut dyn Write,
) -> Result<()> {
    debug_assert!(is_builtin(program));

    match program {
        CD_NAME => Cd::run(shell, args, stdout),
        EXIT_NAME => Exit::run(shell, args, stdout),
        FG_NAME => Fg::run(shell, args, stdout),
        JOBS_NAME => Jobs::run(shell, args, stdout),
        UMASK_NAME => Umask::run(shell, args, stdout),
        _ => unreachable!(),
    }
}
