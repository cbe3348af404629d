use std::io::Write;

use failure::ResultExt;
use nix::libc;
use nix::sys::stat::{self, Mode};

use crate::errors::{Error, ErrorKind, Result};
use crate::shell::builtins::{self, BuiltinCommand};
use crate::shell::Shell;

pub struct Umask;

impl BuiltinCommand for Umask {
    const NAME: &'static str = builtins::UMASK_NAME;
    const USAGE: &'static str = "umask [mask]";

    fn run(_shell: &mut Shell, args: &[String], stdout: &mut dyn Write) -> Result<()> {
        match args.len() {
            0 => {
                // umask(2) can only be read by writing it
                let current = stat::umask(Mode::empty());
                stat::umask(current);
                writeln!(stdout, "{:04o}", current.bits()).context(ErrorKind::Io)?;
            }
            1 => {
                let bits = u32::from_str_radix(&args[0], 8).map_err(|_| {
                    Error::builtin_command(format!("umask: {}: invalid octal number", args[0]), 1)
                })?;
                stat::umask(Mode::from_bits_truncate(bits as libc::mode_t));
            }
            _ => return Err(Error::builtin_command(format!("usage: {}", Self::USAGE), 2)),
        }
        Ok(())
    }
}
