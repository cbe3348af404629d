//! Pipeline executor.
//!
//! Execution is split in two: a pure planning step that assigns every stage
//! its role and adjacent pipe endpoints, and a spawning step that creates
//! the pipes, forks one child per stage and performs the wiring the plan
//! describes. Descriptor hygiene is strict: each child duplicates only the
//! endpoints its plan names and then closes every pipe descriptor before
//! exec, and the parent closes both ends of every pipe once all stages are
//! forked, so EOF propagates down the chain and nothing leaks across fork
//! boundaries.

use std::ffi::CString;
use std::io::{self, Write};
use std::os::unix::ffi::OsStrExt;
use std::process;

use failure::ResultExt;
use log::debug;
use nix::errno::Errno;
use nix::libc;
use nix::sys::wait::{self, WaitStatus};
use nix::unistd::{self, ForkResult, Pid};

use crate::errors::{ErrorKind, Result};
use crate::parser::{Command, CommandLine};
use crate::shell::jobs::JobTable;
use crate::shell::{redirect, signals};

type PipeFds = (i32, i32);

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum StageRole {
    Only,
    First,
    Middle,
    Last,
}

/// Wiring for one pipeline stage, computed before any process exists.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct StagePlan {
    pub index: usize,
    pub role: StageRole,
    /// Pipe whose read end becomes this stage's stdin.
    pub stdin_pipe: Option<usize>,
    /// Pipe whose write end becomes this stage's stdout.
    pub stdout_pipe: Option<usize>,
}

impl StagePlan {
    /// The line's input redirection applies to this stage.
    fn reads_line_input(&self) -> bool {
        matches!(self.role, StageRole::Only | StageRole::First)
    }

    /// The line's output/error redirections apply to this stage.
    fn writes_line_output(&self) -> bool {
        matches!(self.role, StageRole::Only | StageRole::Last)
    }
}

/// Assigns roles and pipe endpoints for an `n`-stage pipeline.
///
/// Stage `i` reads from pipe `i - 1` and writes to pipe `i`; the endpoints
/// that would fall off either end are the terminal standard streams.
pub(crate) fn plan_stages(n: usize) -> Vec<StagePlan> {
    assert!(n >= 1);

    (0..n)
        .map(|index| {
            let role = match (index, n) {
                (0, 1) => StageRole::Only,
                (0, _) => StageRole::First,
                (i, n) if i == n - 1 => StageRole::Last,
                _ => StageRole::Middle,
            };
            StagePlan {
                index,
                role,
                stdin_pipe: if index > 0 { Some(index - 1) } else { None },
                stdout_pipe: if index < n - 1 { Some(index) } else { None },
            }
        })
        .collect()
}

/// Spawns and supervises the pipeline described by `line`.
///
/// Recoverable failures stay inside the children; an `Err` from this
/// function means fork or pipe allocation failed, which the caller treats
/// as fatal to the interpreter.
pub(crate) fn run_pipeline(
    jobs: &mut JobTable,
    line: &CommandLine,
    interactive: bool,
) -> Result<()> {
    let stages = plan_stages(line.commands.len());
    debug!("running pipeline of {} stage(s): {}", stages.len(), line.input);

    let mut pipes: Vec<PipeFds> = Vec::with_capacity(stages.len() - 1);
    for _ in 1..stages.len() {
        pipes.push(unistd::pipe().context(ErrorKind::Nix)?);
    }

    // The foreground children own the interrupt until the waits finish.
    let _guard = if interactive && !line.background {
        Some(signals::ForegroundGuard::new())
    } else {
        None
    };

    // Anything buffered would be replayed by every child on exec failure.
    let _ = io::stdout().flush();

    let mut pids: Vec<Pid> = Vec::with_capacity(stages.len());
    for stage in &stages {
        match unsafe { unistd::fork() }.context(ErrorKind::Nix)? {
            ForkResult::Child => exec_stage(stage, &line.commands[stage.index], line, &pipes),
            ForkResult::Parent { child } => pids.push(child),
        }
    }

    for &(read_end, write_end) in &pipes {
        let _ = unistd::close(read_end);
        let _ = unistd::close(write_end);
    }

    let (terminal_pid, upstream_pids) = pids.split_last().expect("pipeline has at least one stage");
    for pid in upstream_pids {
        wait_stage(*pid);
    }

    if line.background {
        match jobs.register(*terminal_pid, &line.input) {
            Ok(job_number) => println!("[{}] {}", job_number, terminal_pid),
            Err(e) => {
                log::error!("register background job: {}", e);
                eprintln!("msh: {}", e);
            }
        }
    } else {
        wait_stage(*terminal_pid);
    }

    Ok(())
}

/// Blocks until `pid` terminates, riding out EINTR and stop events.
pub(crate) fn wait_stage(pid: Pid) {
    loop {
        match wait::waitpid(pid, None) {
            Ok(WaitStatus::Exited(..)) | Ok(WaitStatus::Signaled(..)) => break,
            Ok(_) | Err(Errno::EINTR) => continue,
            Err(e) => {
                log::warn!("waitpid({}): {}", pid, e);
                break;
            }
        }
    }
}

/// Runs in the forked child: applies the stage's wiring, then execs.
fn exec_stage(stage: &StagePlan, command: &Command, line: &CommandLine, pipes: &[PipeFds]) -> ! {
    signals::reset_child_dispositions();

    if stage.reads_line_input() {
        if let Some(ref path) = line.redirect_input {
            if let Err(e) = redirect::redirect_stdin(path) {
                eprintln!("msh: failed to redirect stdin from {}: {}", path.display(), e);
                process::exit(1);
            }
        }
    }
    if stage.writes_line_output() {
        if let Some(ref path) = line.redirect_output {
            if let Err(e) = redirect::redirect_stdout(path) {
                eprintln!("msh: failed to redirect stdout to {}: {}", path.display(), e);
                process::exit(1);
            }
        }
        if let Some(ref path) = line.redirect_error {
            if let Err(e) = redirect::redirect_stderr(path) {
                eprintln!("msh: failed to redirect stderr to {}: {}", path.display(), e);
                process::exit(1);
            }
        }
    }

    if let Some(i) = stage.stdin_pipe {
        if unistd::dup2(pipes[i].0, libc::STDIN_FILENO).is_err() {
            eprintln!("msh: {}: failed to wire pipeline stdin", command.name());
            process::exit(1);
        }
    }
    if let Some(i) = stage.stdout_pipe {
        if unistd::dup2(pipes[i].1, libc::STDOUT_FILENO).is_err() {
            eprintln!("msh: {}: failed to wire pipeline stdout", command.name());
            process::exit(1);
        }
    }
    for &(read_end, write_end) in pipes {
        let _ = unistd::close(read_end);
        let _ = unistd::close(write_end);
    }

    let path = match command.path {
        Some(ref path) => path,
        // the dispatcher skips unresolved pipelines; this is a backstop
        None => {
            eprintln!("msh: {}: command not found", command.name());
            process::exit(127);
        }
    };
    let program = cstring(path.as_os_str().as_bytes());
    let argv: Vec<CString> = command.argv.iter().map(|arg| cstring(arg.as_bytes())).collect();

    let _ = unistd::execv(&program, &argv);
    eprintln!("msh: {}: failed to execute", command.name());
    process::exit(127);
}

fn cstring(bytes: &[u8]) -> CString {
    CString::new(bytes).unwrap_or_else(|_| {
        eprintln!("msh: argument contains an interior nul byte");
        process::exit(1);
    })
}
