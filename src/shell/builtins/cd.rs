use std::env;
use std::io::Write;
use std::path::PathBuf;

use crate::errors::{Error, Result};
use crate::shell::builtins::{self, BuiltinCommand};
use crate::shell::Shell;

pub struct Cd;

impl BuiltinCommand for Cd {
    const NAME: &'static str = builtins::CD_NAME;
    const USAGE: &'static str = "cd [dir]";

    fn run(_shell: &mut Shell, args: &[String], _stdout: &mut dyn Write) -> Result<()> {
        let target = match args.len() {
            0 => dirs::home_dir()
                .ok_or_else(|| Error::builtin_command("cd: HOME not set", 1))?,
            1 => PathBuf::from(&args[0]),
            _ => return Err(Error::builtin_command(format!("usage: {}", Self::USAGE), 2)),
        };

        env::set_current_dir(&target).map_err(|e| {
            Error::builtin_command(format!("cd: {}: {}", target.display(), e), 1)
        })?;
        Ok(())
    }
}
