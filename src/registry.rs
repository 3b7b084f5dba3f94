//! Bookkeeping for the processes a session has started.
//!
//! Foreground children are counted when they are created and when they are waited
//! on. Background children are handed over to the registry and reclaimed later by
//! [`ProcessRegistry::sweep`], which never blocks.

use crate::command::ExitClass;
use crate::error::ShellError;
use std::process::{Child, ExitStatus};
use std::thread::JoinHandle;

/// A background job the registry is responsible for reclaiming.
pub enum BackgroundJob {
    /// A child nobody else is waiting on.
    Process { program: String, child: Child },
    /// A reverse-capture whose helper thread owns the child and writes the file.
    Capture {
        program: String,
        pid: u32,
        handle: JoinHandle<Result<ExitStatus, ShellError>>,
    },
}

impl BackgroundJob {
    pub fn pid(&self) -> u32 {
        match self {
            BackgroundJob::Process { child, .. } => child.id(),
            BackgroundJob::Capture { pid, .. } => *pid,
        }
    }
}

#[derive(Default)]
pub struct ProcessRegistry {
    spawned: usize,
    reaped: usize,
    failed: usize,
    jobs: Vec<BackgroundJob>,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one attempt to create a process.
    pub fn record_spawn(&mut self) {
        self.spawned += 1;
    }

    /// Counts one reclaimed child and classifies how it ended.
    ///
    /// Failed children are also counted in [`failed`](Self::failed), which is the
    /// error trail the report builtin can show.
    pub fn record_exit(&mut self, status: ExitStatus) -> ExitClass {
        self.reaped += 1;
        let class = ExitClass::from_status(status);
        if !class.is_success() {
            self.failed += 1;
        }
        class
    }

    /// Counts a child whose exit status could not be observed as reclaimed and failed.
    pub fn record_lost(&mut self) {
        self.reaped += 1;
        self.failed += 1;
    }

    /// Takes ownership of a background job until a sweep finds it finished.
    pub fn adopt(&mut self, job: BackgroundJob) {
        log::debug!("tracking background job {}", job.pid());
        self.jobs.push(job);
    }

    /// Reclaims every background job that has already finished, without blocking.
    ///
    /// Returns how many jobs were reclaimed.
    pub fn sweep(&mut self) -> usize {
        let mut reclaimed = 0;
        let mut pending = Vec::with_capacity(self.jobs.len());

        for job in std::mem::take(&mut self.jobs) {
            match job {
                BackgroundJob::Process { program, mut child } => match child.try_wait() {
                    Ok(Some(status)) => {
                        reclaimed += 1;
                        self.report_background(&program, child.id(), status);
                    }
                    Ok(None) => pending.push(BackgroundJob::Process { program, child }),
                    Err(e) => {
                        // The child is gone from our point of view; count it so the
                        // totals stay balanced.
                        reclaimed += 1;
                        self.record_lost();
                        log::error!("[{}] {}: can't wait: {}", child.id(), program, e);
                    }
                },
                BackgroundJob::Capture {
                    program,
                    pid,
                    handle,
                } => {
                    if !handle.is_finished() {
                        pending.push(BackgroundJob::Capture {
                            program,
                            pid,
                            handle,
                        });
                        continue;
                    }
                    reclaimed += 1;
                    match handle.join() {
                        Ok(Ok(status)) => self.report_background(&program, pid, status),
                        Ok(Err(e)) => {
                            self.record_lost();
                            log::error!("[{}] {}: {}", pid, program, e);
                        }
                        Err(_) => {
                            self.record_lost();
                            log::error!("[{}] {}: capture thread panicked", pid, program);
                        }
                    }
                }
            }
        }

        self.jobs = pending;
        reclaimed
    }

    fn report_background(&mut self, program: &str, pid: u32, status: ExitStatus) {
        match self.record_exit(status) {
            ExitClass::Success => log::debug!("[{}] {} done", pid, program),
            class => log::warn!("[{}] {} exited with status {}", pid, program, class.code()),
        }
    }

    pub fn spawned(&self) -> usize {
        self.spawned
    }

    pub fn reaped(&self) -> usize {
        self.reaped
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    /// Background jobs not reclaimed yet.
    pub fn pending(&self) -> usize {
        self.jobs.len()
    }

    /// Processes created but not yet reclaimed.
    pub fn active(&self) -> usize {
        self.spawned.saturating_sub(self.reaped)
    }
}
