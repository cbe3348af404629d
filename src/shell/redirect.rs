//! Redirection applier.
//!
//! Rebinds the standard streams of the calling process, which is always a
//! forked pipeline child. Each operation opens the named file, duplicates
//! the descriptor onto the target standard stream and closes the original.
//! The three operations are independent and order-insensitive.

use std::path::Path;

use failure::ResultExt;
use nix::fcntl::{self, OFlag};
use nix::libc;
use nix::sys::stat::{self, Mode};
use nix::unistd;

use crate::errors::{ErrorKind, Result};

/// Binds stdin to `path`, opened read-only.
pub fn redirect_stdin(path: &Path) -> Result<()> {
    let fd = fcntl::open(path, OFlag::O_RDONLY, Mode::empty()).context(ErrorKind::Nix)?;
    rebind(fd, libc::STDIN_FILENO)
}

/// Binds stdout to `path`, created with owner read/write permission if
/// absent and truncated if present.
pub fn redirect_stdout(path: &Path) -> Result<()> {
    rebind(open_for_writing(path)?, libc::STDOUT_FILENO)
}

/// Binds stderr to `path`, created with owner read/write permission if
/// absent and truncated if present.
pub fn redirect_stderr(path: &Path) -> Result<()> {
    rebind(open_for_writing(path)?, libc::STDERR_FILENO)
}

fn open_for_writing(path: &Path) -> Result<i32> {
    let mode = Mode::S_IRUSR | Mode::S_IWUSR;
    let fd = fcntl::open(path, OFlag::O_CREAT | OFlag::O_WRONLY | OFlag::O_TRUNC, mode)
        .context(ErrorKind::Nix)?;
    // The create mode above is subject to the umask; force owner rw.
    stat::fchmod(fd, mode).context(ErrorKind::Nix)?;
    Ok(fd)
}

fn rebind(fd: i32, stream: i32) -> Result<()> {
    unistd::dup2(fd, stream).context(ErrorKind::Nix)?;
    unistd::close(fd).context(ErrorKind::Nix)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_input_file_fails_without_touching_stdin() {
        // open fails before any dup2 can happen
        assert!(redirect_stdin(Path::new("/nonexistent/dir/infile")).is_err());
    }
}
