//! Msh - Shell Module
//!
//! The Shell itself drives the read loop: reap finished background jobs,
//! dispatch builtins, and hand everything else to the pipeline executor.

use std::env;
use std::fmt;
use std::io;
use std::os::unix::io::AsRawFd;
use std::path::PathBuf;
use std::process;

use failure::ResultExt;
use log::{error, info};
use nix::unistd;

use crate::editor::Editor;
use crate::errors::{Error, ErrorKind, Result};
use crate::parser::CommandLine;
use crate::shell::execute;
use crate::shell::jobs::{BackgroundJob, JobTable};
use crate::shell::{builtins, signals};

const HISTORY_FILE_NAME: &str = ".msh_history";

/// Msh Shell
pub struct Shell {
    editor: Editor,
    history_file: Option<PathBuf>,
    jobs: JobTable,
    config: ShellConfig,
    /// Is `false` when running a `-c` command string or when initializing
    /// signal handling fails.
    is_interactive: bool,
}

impl Shell {
    /// Constructs a new Shell to manage running jobs and command history.
    pub fn new(config: ShellConfig) -> Result<Shell> {
        let mut shell = Shell {
            editor: Editor::with_capacity(config.command_history_capacity),
            history_file: None,
            jobs: JobTable::default(),
            config,
            is_interactive: isatty(),
        };

        if shell.is_interactive {
            if let Err(e) = signals::initialize() {
                error!("failed to initialize signal handling despite isatty: {}", e);
                shell.is_interactive = false;
            }
        }

        if config.enable_command_history {
            shell.load_history()?;
        }

        info!("msh started up");
        Ok(shell)
    }

    fn load_history(&mut self) -> Result<()> {
        self.history_file = dirs::home_dir().map(|p| p.join(HISTORY_FILE_NAME));
        match self.history_file {
            Some(ref history_file) => self.editor.load_history(history_file)?,
            None => log::warn!("unable to get home directory"),
        }

        Ok(())
    }

    /// Custom prompt to output to the user.
    /// Returns `None` when end of file is reached.
    pub fn prompt(&mut self) -> Result<Option<String>> {
        let cwd = env::current_dir().context(ErrorKind::Io)?;
        let prompt = format!(
            "\x1b[32mmsh:~\x1b[0m\x1b[34m{}\x1b[0m$ ",
            cwd.display()
        );
        self.editor.readline(&prompt)
    }

    /// Runs command lines from stdin until `exit` or end-of-input.
    pub fn execute_from_stdin(&mut self) {
        loop {
            // Reap finished background jobs before printing the next prompt.
            self.jobs.reap_finished();
            if signals::take_pending_interrupt() {
                println!();
            }

            let input = match self.prompt() {
                Ok(Some(line)) => line.trim().to_owned(),
                Ok(None) => break,
                e => {
                    log_if_err!(e, "prompt");
                    continue;
                }
            };

            if let Err(e) = self.execute_command_string(&input) {
                // only fork/pipe resource exhaustion escapes this far
                error!("fatal: {}", e);
                eprintln!("msh: {}", e);
                self.exit(1);
            }
        }
    }

    /// Runs one command line.
    ///
    /// Recoverable user errors are reported here and come back as `Ok`; an
    /// `Err` means the interpreter cannot continue.
    pub fn execute_command_string(&mut self, input: &str) -> Result<()> {
        if input.is_empty() {
            return Ok(());
        }

        if self.config.enable_command_history {
            self.editor.add_history_entry(input);
        }

        let line = match CommandLine::parse(input) {
            Ok(Some(line)) => line,
            Ok(None) => return Ok(()),
            Err(e) => {
                if let ErrorKind::Syntax(ref near) = *e.kind() {
                    eprintln!("msh: syntax error near: {}", near);
                    return Ok(());
                }

                return Err(e);
            }
        };

        self.run_command_line(&line)
    }

    fn run_command_line(&mut self, line: &CommandLine) -> Result<()> {
        let head = &line.commands[0];
        if builtins::is_builtin(head.name()) {
            if head.name() == "cd" && line.commands.len() > 1 {
                eprintln!("msh: cd: cannot be combined with other commands");
                return Ok(());
            }

            let args = head.argv[1..].to_vec();
            if let Err(e) = builtins::run(self, head.name(), &args, &mut io::stdout()) {
                eprintln!("msh: {}", e);
            }
            return Ok(());
        }

        let mut unresolved = false;
        for command in &line.commands {
            if command.path.is_none() {
                eprintln!("msh: {}", Error::command_not_found(command.name()));
                unresolved = true;
            }
        }
        if unresolved {
            return Ok(());
        }

        execute::run_pipeline(&mut self.jobs, line, self.is_interactive)
    }

    /// The shell's background jobs, in registration order.
    pub fn background_jobs(&self) -> &[BackgroundJob] {
        self.jobs.jobs()
    }

    /// Blocks until the given background job (or the earliest-registered
    /// one) completes, then removes it from the table.
    pub fn put_job_in_foreground(&mut self, job_number: Option<u32>) -> Result<()> {
        if !self.jobs.has_jobs() {
            return Err(Error::builtin_command("fg: no background jobs", 1));
        }

        let (pid, command) = match job_number {
            Some(n) => {
                let job = self
                    .jobs
                    .find_by_number(n)
                    .ok_or_else(|| Error::no_such_job(n.to_string()))?;
                (job.pid(), job.command().to_string())
            }
            None => {
                let job = self.jobs.first().expect("table is non-empty");
                (job.pid(), job.command().to_string())
            }
        };

        println!("{}", command);
        {
            let _guard = if self.is_interactive {
                Some(signals::ForegroundGuard::new())
            } else {
                None
            };
            execute::wait_stage(pid);
        }
        self.jobs.remove_by_pid(pid);
        Ok(())
    }

    /// Exit the shell with the given status.
    pub fn exit(&mut self, code: i32) -> ! {
        if self.config.display_messages {
            println!("exit");
        }

        if self.config.enable_command_history {
            if let Some(ref history_file) = self.history_file {
                if let Err(e) = self.editor.save_history(history_file) {
                    error!("failed to save history during shutdown: {}", e);
                }
            }
        }

        info!("msh has shut down");
        process::exit(code);
    }
}

impl fmt::Debug for Shell {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}\n{:?}", self.jobs, self.editor)
    }
}

/// Policy object to control a Shell's behavior
#[derive(Debug, Copy, Clone)]
pub struct ShellConfig {
    /// Determines if new command entries will be added to the shell's history.
    enable_command_history: bool,

    /// Number of entries to store in the shell's command history
    command_history_capacity: usize,

    /// Determines if some messages (e.g. "exit") should be displayed.
    display_messages: bool,
}

impl ShellConfig {
    /// Creates an interactive shell, e.g. command history, shutdown message
    pub fn interactive(command_history_capacity: usize) -> ShellConfig {
        ShellConfig {
            enable_command_history: true,
            command_history_capacity,
            display_messages: true,
        }
    }

    /// Creates a noninteractive shell, e.g. no command history, fewer
    /// messages
    pub fn noninteractive() -> ShellConfig {
        Default::default()
    }
}

impl Default for ShellConfig {
    fn default() -> ShellConfig {
        ShellConfig {
            enable_command_history: false,
            command_history_capacity: 0,
            display_messages: false,
        }
    }
}

fn isatty() -> bool {
    let temp_result = unistd::isatty(io::stdin().as_raw_fd());
    log_if_err!(temp_result, "unistd::isatty");
    temp_result.unwrap_or(false)
}
