//! The shell's execution core: REPL, pipeline executor, job table,
//! redirections, signal discipline and builtins.

pub use self::jobs::BackgroundJob;
pub use self::shell::{Shell, ShellConfig};

mod builtins;
mod execute;
mod jobs;
mod redirect;
#[allow(clippy::module_inception)]
mod shell;
mod signals;
