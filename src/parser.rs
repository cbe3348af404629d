//! Msh line parser.
//!
//! Turns one raw input line into a [`CommandLine`]: a pipeline of commands
//! plus the redirections and background flag that apply to the whole line.
//! Command words are resolved against `PATH` here, so the rest of the shell
//! only ever sees either a concrete executable path or "not found".

use std::env;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use crate::errors::{Error, Result};

/// One stage of a pipeline: a resolved program and its argument vector.
#[derive(Clone, Debug, PartialEq)]
pub struct Command {
    /// Resolved executable path; `None` when the word is not on `PATH`.
    pub path: Option<PathBuf>,
    /// Argument vector, `argv[0]` included.
    pub argv: Vec<String>,
}

impl Command {
    fn new(word: &str) -> Command {
        Command {
            path: search_path(word),
            argv: vec![word.to_string()],
        }
    }

    /// The command word as the user typed it.
    pub fn name(&self) -> &str {
        &self.argv[0]
    }

    /// Number of entries in the argument vector, program included.
    pub fn argc(&self) -> usize {
        self.argv.len()
    }
}

/// The parsed representation of one input line.
///
/// Redirections, when present, apply only to the first command's stdin and
/// the last command's stdout/stderr, never to intermediate pipeline stages.
#[derive(Clone, Debug, PartialEq)]
pub struct CommandLine {
    /// The verbatim (trimmed) input line, used for job bookkeeping.
    pub input: String,
    /// The pipeline stages, in order. Never empty.
    pub commands: Vec<Command>,
    /// File to bind to the first command's stdin.
    pub redirect_input: Option<PathBuf>,
    /// File to bind to the last command's stdout.
    pub redirect_output: Option<PathBuf>,
    /// File to bind to the last command's stderr.
    pub redirect_error: Option<PathBuf>,
    /// Run the pipeline without waiting on its terminal stage.
    pub background: bool,
}

#[derive(Clone, Copy, PartialEq)]
enum Pending {
    None,
    Input,
    Output,
    Error,
}

impl CommandLine {
    /// Parses one raw line.
    ///
    /// Returns `Ok(None)` for a blank line and a syntax error for a dangling
    /// redirection or an empty pipeline stage.
    pub fn parse(input: &str) -> Result<Option<CommandLine>> {
        let input = input.trim();
        let words: Vec<&str> = input.split_whitespace().collect();
        if words.is_empty() {
            return Ok(None);
        }

        let mut commands: Vec<Command> = Vec::new();
        let mut current: Option<Command> = None;
        let mut redirect_input = None;
        let mut redirect_output = None;
        let mut redirect_error = None;
        let mut background = false;
        let mut pending = Pending::None;

        for word in words {
            if pending != Pending::None {
                let target = Some(PathBuf::from(word));
                match pending {
                    Pending::Input => redirect_input = target,
                    Pending::Output => redirect_output = target,
                    Pending::Error => redirect_error = target,
                    Pending::None => unreachable!(),
                }
                pending = Pending::None;
            } else if word == "|" {
                match current.take() {
                    Some(command) => commands.push(command),
                    None => return Err(Error::syntax(input)),
                }
            } else if let Some(filename) = strip_redirect(word, "2>") {
                match filename {
                    Some(filename) => redirect_error = Some(PathBuf::from(filename)),
                    None => pending = Pending::Error,
                }
            } else if let Some(filename) = strip_redirect(word, ">") {
                match filename {
                    Some(filename) => redirect_output = Some(PathBuf::from(filename)),
                    None => pending = Pending::Output,
                }
            } else if let Some(filename) = strip_redirect(word, "<") {
                match filename {
                    Some(filename) => redirect_input = Some(PathBuf::from(filename)),
                    None => pending = Pending::Input,
                }
            } else if word == "&" {
                background = true;
            } else {
                match current {
                    Some(ref mut command) => command.argv.push(word.to_string()),
                    None => current = Some(Command::new(word)),
                }
            }
        }

        if pending != Pending::None {
            return Err(Error::syntax(input));
        }
        match current {
            Some(command) => commands.push(command),
            // a line like "foo |" or "&" alone
            None => return Err(Error::syntax(input)),
        }

        Ok(Some(CommandLine {
            input: input.to_string(),
            commands,
            redirect_input,
            redirect_output,
            redirect_error,
            background,
        }))
    }
}

/// Splits `word` into redirection operator and attached filename, if any.
fn strip_redirect<'a>(word: &'a str, operator: &str) -> Option<Option<&'a str>> {
    if !word.starts_with(operator) {
        return None;
    }

    let rest = &word[operator.len()..];
    if rest.is_empty() {
        Some(None)
    } else {
        Some(Some(rest))
    }
}

/// Resolves a command word to an executable path.
///
/// Words containing a slash are taken as paths; anything else is searched
/// for in each directory of `PATH`.
pub fn search_path(word: &str) -> Option<PathBuf> {
    if word.contains('/') {
        let path = PathBuf::from(word);
        if is_executable(&path) {
            return Some(path);
        }
        return None;
    }

    let path_var = env::var_os("PATH")?;
    env::split_paths(&path_var)
        .map(|dir| dir.join(word))
        .find(|candidate| is_executable(candidate))
}

fn is_executable(path: &Path) -> bool {
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> CommandLine {
        CommandLine::parse(input).unwrap().unwrap()
    }

    #[test]
    fn empty() {
        assert!(CommandLine::parse("").unwrap().is_none());
        assert!(CommandLine::parse("   \t ").unwrap().is_none());
    }

    #[test]
    fn single_command_with_args() {
        let line = parse("cmd var1 var2 var3");
        assert_eq!(line.commands.len(), 1);
        assert_eq!(line.commands[0].argv, vec!["cmd", "var1", "var2", "var3"]);
        assert_eq!(line.commands[0].argc(), 4);
        assert!(!line.background);
    }

    #[test]
    fn infile_valid() {
        let expected = Some(PathBuf::from("infile"));
        assert_eq!(parse("cmd <infile").redirect_input, expected);
        assert_eq!(parse("cmd < infile").redirect_input, expected);
    }

    #[test]
    fn infile_invalid() {
        assert!(CommandLine::parse("cmd <").is_err());
    }

    #[test]
    fn outfile_valid() {
        let expected = Some(PathBuf::from("outfile"));
        assert_eq!(parse("cmd >outfile").redirect_output, expected);
        assert_eq!(parse("cmd > outfile").redirect_output, expected);
    }

    #[test]
    fn outfile_invalid() {
        assert!(CommandLine::parse("cmd >").is_err());
    }

    #[test]
    fn errfile_valid() {
        let expected = Some(PathBuf::from("errfile"));
        assert_eq!(parse("cmd 2>errfile").redirect_error, expected);
        assert_eq!(parse("cmd 2> errfile").redirect_error, expected);
    }

    #[test]
    fn errfile_does_not_shadow_outfile() {
        let line = parse("cmd > out 2> err");
        assert_eq!(line.redirect_output, Some(PathBuf::from("out")));
        assert_eq!(line.redirect_error, Some(PathBuf::from("err")));
    }

    #[test]
    fn pipeline() {
        let line = parse("cmd1 a | cmd2 | cmd3 b c");
        assert_eq!(line.commands.len(), 3);
        assert_eq!(line.commands[0].argv, vec!["cmd1", "a"]);
        assert_eq!(line.commands[1].argv, vec!["cmd2"]);
        assert_eq!(line.commands[2].argv, vec!["cmd3", "b", "c"]);
    }

    #[test]
    fn pipeline_with_empty_stage() {
        assert!(CommandLine::parse("cmd1 | | cmd2").is_err());
        assert!(CommandLine::parse("cmd1 |").is_err());
        assert!(CommandLine::parse("| cmd1").is_err());
    }

    #[test]
    fn background() {
        let line = parse("sleep 5 &");
        assert!(line.background);
        assert_eq!(line.commands[0].argv, vec!["sleep", "5"]);
        assert_eq!(line.input, "sleep 5 &");
    }

    #[test]
    fn redirections_with_pipeline() {
        let line = parse("cmd1 < in | cmd2 > out &");
        assert_eq!(line.commands.len(), 2);
        assert_eq!(line.redirect_input, Some(PathBuf::from("in")));
        assert_eq!(line.redirect_output, Some(PathBuf::from("out")));
        assert!(line.background);
    }

    #[test]
    fn search_path_resolves_sh() {
        // /bin/sh exists on any Unix this shell targets
        assert!(search_path("sh").is_some());
        assert_eq!(search_path("/bin/sh"), Some(PathBuf::from("/bin/sh")));
    }

    #[test]
    fn search_path_misses() {
        assert!(search_path("definitely-not-a-real-command-xyz").is_none());
        assert!(search_path("/nonexistent/dir/cmd").is_none());
        let line = parse("definitely-not-a-real-command-xyz");
        assert!(line.commands[0].path.is_none());
    }
}
