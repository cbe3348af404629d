//! Bounded registry of running background jobs.
//!
//! The table is owned by the shell's read loop and only ever touched from
//! it, so registration, removal and the reaping pass need no locking.

use std::fmt;

use log::debug;
use nix::errno::Errno;
use nix::sys::wait::{self, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;

use crate::errors::{Error, ErrorKind, Result};

/// Upper bound on simultaneously tracked background jobs.
pub const MAX_BACKGROUND_JOBS: usize = 10;

/// A pipeline's terminal process the shell did not wait on immediately.
#[derive(Clone, Debug, PartialEq)]
pub struct BackgroundJob {
    pid: Pid,
    command: String,
    job_number: u32,
}

impl BackgroundJob {
    /// Process id of the job's terminal process.
    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// The verbatim input line that launched the job.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// 1-based number assigned at registration.
    pub fn job_number(&self) -> u32 {
        self.job_number
    }
}

impl fmt::Display for BackgroundJob {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}]\tRunning\t{}", self.job_number, self.command)
    }
}

/// Background job table.
///
/// Job numbers come from a counter that increments for every registration
/// and resets only when the table drains empty, so numbers are never reused
/// while any job is alive. Entries are compacted on removal without being
/// renumbered.
#[derive(Debug, Default)]
pub struct JobTable {
    jobs: Vec<BackgroundJob>,
    job_count: u32,
}

impl JobTable {
    pub fn has_jobs(&self) -> bool {
        !self.jobs.is_empty()
    }

    pub fn jobs(&self) -> &[BackgroundJob] {
        &self.jobs
    }

    /// Registers a launched background process, returning its job number.
    ///
    /// Fails without registering when the table is at capacity.
    pub fn register(&mut self, pid: Pid, command: &str) -> Result<u32> {
        if self.jobs.len() >= MAX_BACKGROUND_JOBS {
            return Err(Error::from(ErrorKind::JobTableFull));
        }
        debug_assert!(self.jobs.iter().all(|job| job.pid != pid));

        self.job_count += 1;
        self.jobs.push(BackgroundJob {
            pid,
            command: command.to_string(),
            job_number: self.job_count,
        });
        debug!("registered background job [{}] {}", self.job_count, pid);
        Ok(self.job_count)
    }

    /// Removes the job for `pid`, compacting the remaining entries and
    /// preserving their relative order. No-op if `pid` is absent.
    pub fn remove_by_pid(&mut self, pid: Pid) -> Option<BackgroundJob> {
        let index = self.jobs.iter().position(|job| job.pid == pid)?;
        let job = self.jobs.remove(index);
        if self.jobs.is_empty() {
            self.job_count = 0;
        }
        Some(job)
    }

    pub fn find_by_number(&self, job_number: u32) -> Option<&BackgroundJob> {
        self.jobs.iter().find(|job| job.job_number == job_number)
    }

    /// The earliest-registered job still in the table.
    pub fn first(&self) -> Option<&BackgroundJob> {
        self.jobs.first()
    }

    /// Drains every currently-terminated child without blocking, printing a
    /// termination notice for each and dropping it from the table.
    ///
    /// Runs once per read-loop iteration; foreground children are waited on
    /// synchronously elsewhere, so only background jobs show up here.
    pub fn reap_finished(&mut self) {
        loop {
            match wait::waitpid(None, Some(WaitPidFlag::WNOHANG)) {
                Ok(WaitStatus::StillAlive) | Err(Errno::ECHILD) => break,
                Ok(WaitStatus::Exited(pid, code)) => {
                    self.remove_by_pid(pid);
                    println!("Process with pid: [{}] terminated (exit code: {})", pid, code);
                }
                Ok(WaitStatus::Signaled(pid, signal, _)) => {
                    self.remove_by_pid(pid);
                    println!(
                        "Process with pid: [{}] terminated by signal {}",
                        pid, signal as i32
                    );
                }
                Ok(_) => continue,
                Err(e) => {
                    log::warn!("reap: waitpid: {}", e);
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::process;
    use std::thread;
    use std::time::Duration;

    use super::*;

    fn register(table: &mut JobTable, raw_pid: i32, command: &str) -> u32 {
        table.register(Pid::from_raw(raw_pid), command).unwrap()
    }

    #[test]
    fn numbers_are_assigned_in_order() {
        let mut table = JobTable::default();
        assert_eq!(register(&mut table, 100, "sleep 5 &"), 1);
        assert_eq!(register(&mut table, 101, "sleep 6 &"), 2);
        assert_eq!(register(&mut table, 102, "sleep 7 &"), 3);
    }

    #[test]
    fn capacity_is_enforced() {
        let mut table = JobTable::default();
        for i in 0..MAX_BACKGROUND_JOBS {
            register(&mut table, 100 + i as i32, "sleep 5 &");
        }
        let result = table.register(Pid::from_raw(999), "one too many &");
        assert_eq!(*result.unwrap_err().kind(), ErrorKind::JobTableFull);
        assert_eq!(table.jobs().len(), MAX_BACKGROUND_JOBS);
    }

    #[test]
    fn removal_compacts_without_renumbering() {
        let mut table = JobTable::default();
        register(&mut table, 100, "a &");
        register(&mut table, 101, "b &");
        register(&mut table, 102, "c &");

        let removed = table.remove_by_pid(Pid::from_raw(101)).unwrap();
        assert_eq!(removed.job_number(), 2);

        let numbers: Vec<u32> = table.jobs().iter().map(|j| j.job_number()).collect();
        assert_eq!(numbers, vec![1, 3]);

        // the counter keeps going while jobs remain
        assert_eq!(register(&mut table, 103, "d &"), 4);
    }

    #[test]
    fn counter_resets_when_table_drains() {
        let mut table = JobTable::default();
        register(&mut table, 100, "a &");
        register(&mut table, 101, "b &");
        table.remove_by_pid(Pid::from_raw(100));
        table.remove_by_pid(Pid::from_raw(101));
        assert!(!table.has_jobs());
        assert_eq!(register(&mut table, 102, "c &"), 1);
    }

    #[test]
    fn remove_of_unknown_pid_is_noop() {
        let mut table = JobTable::default();
        register(&mut table, 100, "a &");
        assert!(table.remove_by_pid(Pid::from_raw(999)).is_none());
        assert_eq!(table.jobs().len(), 1);
    }

    #[test]
    fn find_by_number() {
        let mut table = JobTable::default();
        register(&mut table, 100, "a &");
        register(&mut table, 101, "b &");
        assert_eq!(table.find_by_number(2).unwrap().pid(), Pid::from_raw(101));
        assert!(table.find_by_number(7).is_none());
    }

    #[test]
    fn reap_drops_terminated_jobs_without_blocking() {
        let mut table = JobTable::default();
        let child = process::Command::new("true")
            .spawn()
            .expect("unable to spawn child");
        let pid = Pid::from_raw(child.id() as i32);
        table.register(pid, "true &").unwrap();
        assert!(table.has_jobs());

        // WNOHANG never blocks, so poll until the child has exited.
        for _ in 0..500 {
            table.reap_finished();
            if !table.has_jobs() {
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }

        assert!(!table.has_jobs());
        assert!(table.remove_by_pid(pid).is_none());
    }

    #[test]
    fn display_matches_jobs_listing() {
        let mut table = JobTable::default();
        register(&mut table, 100, "sleep 5 &");
        let listing = format!("{}", table.jobs()[0]);
        assert_eq!(listing, "[1]\tRunning\tsleep 5 &");
    }
}
