use std::io::Write;

use failure::ResultExt;

use crate::errors::{Error, ErrorKind, Result};
use crate::shell::builtins::{self, BuiltinCommand};
use crate::shell::Shell;

pub struct Jobs;

impl BuiltinCommand for Jobs {
    const NAME: &'static str = builtins::JOBS_NAME;
    const USAGE: &'static str = "jobs";

    fn run(shell: &mut Shell, _args: &[String], stdout: &mut dyn Write) -> Result<()> {
        for job in shell.background_jobs() {
            writeln!(stdout, "{}", job).context(ErrorKind::Io)?;
        }
        Ok(())
    }
}

pub struct Fg;

impl BuiltinCommand for Fg {
    const NAME: &'static str = builtins::FG_NAME;
    const USAGE: &'static str = "fg [job]";

    fn run(shell: &mut Shell, args: &[String], _stdout: &mut dyn Write) -> Result<()> {
        let job_number = match args.len() {
            0 => None,
            1 => Some(args[0].parse::<u32>().map_err(|e| {
                Error::builtin_command(format!("fg: {}: {}", args[0], e), 1)
            })?),
            _ => return Err(Error::builtin_command(format!("usage: {}", Self::USAGE), 2)),
        };

        shell.put_job_in_foreground(job_number)
    }
}
