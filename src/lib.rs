//! Msh - a small interactive Unix command interpreter.
//!
//! The shell reads one line at a time, reaps finished background jobs,
//! dispatches builtins, and otherwise materializes a process pipeline with
//! fork/exec, wiring redirections and inter-process pipes itself.

#[macro_use]
mod macros;

mod editor;
pub mod errors;
pub mod parser;
pub mod shell;

pub use crate::shell::{Shell, ShellConfig};
