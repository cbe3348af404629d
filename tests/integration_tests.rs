//! Integration Tests
//!
//! Each test drives the msh binary with `-c`, the noninteractive
//! one-command mode.

use std::fs;

use assert_cli::Assert;
use tempdir::TempDir;

fn msh(command: &str) -> Assert {
    Assert::command(&[env!("CARGO_BIN_EXE_msh"), "-c", command])
}

#[test]
fn simple_echo() {
    msh("echo test")
        .succeeds()
        .and()
        .stdout()
        .is("test")
        .unwrap();
}

#[test]
fn two_stage_pipeline() {
    msh("echo hi | cat")
        .succeeds()
        .and()
        .stdout()
        .is("hi")
        .unwrap();
}

#[test]
fn three_stage_pipeline() {
    msh("echo needle | cat | cat")
        .succeeds()
        .and()
        .stdout()
        .is("needle")
        .unwrap();
}

#[test]
fn command_not_found_does_not_kill_the_shell() {
    msh("definitely-not-a-real-command-xyz")
        .succeeds()
        .and()
        .stderr()
        .contains("command not found")
        .unwrap();
}

#[test]
fn unresolved_pipeline_stage_skips_the_whole_pipeline() {
    let temp_dir = TempDir::new("msh-test").expect("unable to create temp dir");
    msh("echo spilled > out.txt | definitely-not-a-real-command-xyz")
        .current_dir(temp_dir.path())
        .succeeds()
        .and()
        .stderr()
        .contains("command not found")
        .unwrap();
    assert!(!temp_dir.path().join("out.txt").exists());
}

#[test]
fn cd_cannot_be_combined_with_other_commands() {
    msh("cd / | echo leaked")
        .succeeds()
        .and()
        .stderr()
        .contains("cd: cannot be combined with other commands")
        .unwrap();
}

#[test]
fn fg_without_jobs_reports_an_error() {
    msh("fg")
        .succeeds()
        .and()
        .stderr()
        .contains("no background jobs")
        .unwrap();
}

#[test]
fn syntax_error_is_reported() {
    msh("cat <")
        .succeeds()
        .and()
        .stderr()
        .contains("syntax error")
        .unwrap();
}

#[test]
fn output_redirection_creates_and_truncates() {
    let temp_dir = TempDir::new("msh-test").expect("unable to create temp dir");
    let out_path = temp_dir.path().join("out.txt");
    fs::write(&out_path, "stale contents that should disappear").unwrap();

    msh("echo fresh > out.txt")
        .current_dir(temp_dir.path())
        .succeeds()
        .unwrap();

    assert_eq!(fs::read_to_string(&out_path).unwrap(), "fresh\n");
}

#[test]
fn input_redirection_feeds_first_stage() {
    let temp_dir = TempDir::new("msh-test").expect("unable to create temp dir");
    fs::write(temp_dir.path().join("in.txt"), "from a file\n").unwrap();

    msh("cat < in.txt")
        .current_dir(temp_dir.path())
        .succeeds()
        .and()
        .stdout()
        .is("from a file")
        .unwrap();
}

#[test]
fn redirections_apply_to_terminal_stages_of_a_pipeline() {
    let temp_dir = TempDir::new("msh-test").expect("unable to create temp dir");
    fs::write(temp_dir.path().join("in.txt"), "through the pipe\n").unwrap();

    msh("cat < in.txt | cat > out.txt")
        .current_dir(temp_dir.path())
        .succeeds()
        .unwrap();

    assert_eq!(
        fs::read_to_string(temp_dir.path().join("out.txt")).unwrap(),
        "through the pipe\n"
    );
}

#[test]
fn stderr_redirection() {
    let temp_dir = TempDir::new("msh-test").expect("unable to create temp dir");

    msh("ls /nonexistent-dir-for-msh-tests 2> err.txt")
        .current_dir(temp_dir.path())
        .succeeds()
        .unwrap();

    let captured = fs::read_to_string(temp_dir.path().join("err.txt")).unwrap();
    assert!(!captured.is_empty());
}
