//! Single-flight transcode jobs.
//!
//! Only one transcode may be outstanding. The blocking runner call is moved
//! onto the tokio blocking pool and its result is handed to the one caller
//! awaiting it.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::error::AppError;
use crate::ffmpeg::{ProcessOutput, ProcessRunner};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveJob {
    pub job_id: u64,
}

#[derive(Clone)]
pub struct JobSlot {
    active_job: Arc<Mutex<Option<ActiveJob>>>,
    next_job_id: Arc<AtomicU64>,
}

impl Default for JobSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl JobSlot {
    pub fn new() -> Self {
        Self {
            active_job: Arc::new(Mutex::new(None)),
            next_job_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Claim the slot. Fails with `AppError::Busy` while another job holds it.
    pub fn begin(&self) -> Result<JobGuard, AppError> {
        let mut guard = self.active_job.lock();
        if let Some(existing) = *guard {
            log::warn!(
                target: "ffcmd::job",
                "Rejecting job: jobId={} still running",
                existing.job_id
            );
            return Err(AppError::Busy);
        }
        let job = ActiveJob {
            job_id: self.next_job_id.fetch_add(1, Ordering::Relaxed),
        };
        *guard = Some(job);
        Ok(JobGuard {
            slot: self.clone(),
            job,
        })
    }

    fn finish(&self, job_id: u64) {
        let mut guard = self.active_job.lock();
        if let Some(active) = *guard
            && active.job_id == job_id
        {
            *guard = None;
        }
    }

    pub fn current(&self) -> Option<ActiveJob> {
        *self.active_job.lock()
    }
}

/// Releases the slot on drop.
pub struct JobGuard {
    slot: JobSlot,
    job: ActiveJob,
}

impl JobGuard {
    pub fn job(&self) -> ActiveJob {
        self.job
    }
}

impl Drop for JobGuard {
    fn drop(&mut self) {
        self.slot.finish(self.job.job_id);
    }
}

/// Run `program args` on the blocking pool while holding `guard`.
pub async fn run_transcode_async(
    runner: Arc<dyn ProcessRunner>,
    guard: JobGuard,
    program: PathBuf,
    args: Vec<String>,
) -> Result<ProcessOutput, AppError> {
    let job_id = guard.job().job_id;
    log::debug!(target: "ffcmd::job", "Starting jobId={}", job_id);
    let result = tokio::task::spawn_blocking(move || {
        let _guard = guard;
        runner.run(&program, &args)
    })
    .await
    .map_err(|e| AppError::from(format!("Job {} panicked: {}", job_id, e)))?;
    log::debug!(target: "ffcmd::job", "Finished jobId={}", job_id);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeRunner;

    #[test]
    fn second_begin_is_rejected_until_first_finishes() {
        let slot = JobSlot::new();
        let first = slot.begin().unwrap();
        assert!(matches!(slot.begin(), Err(AppError::Busy)));
        assert_eq!(slot.current(), Some(first.job()));
        drop(first);
        assert_eq!(slot.current(), None);
        let second = slot.begin().unwrap();
        assert_eq!(second.job().job_id, 2);
    }

    #[tokio::test]
    async fn async_run_releases_slot_after_completion() {
        let slot = JobSlot::new();
        let runner: Arc<dyn ProcessRunner> = Arc::new(FakeRunner::succeeding("done\n"));
        let guard = slot.begin().unwrap();
        let out = run_transcode_async(runner, guard, PathBuf::from("ffmpeg"), vec![])
            .await
            .unwrap();
        assert_eq!(out.output, "done\n");
        assert!(out.success());
        assert_eq!(slot.current(), None);
    }

    #[tokio::test]
    async fn async_run_propagates_launch_error() {
        let slot = JobSlot::new();
        let runner: Arc<dyn ProcessRunner> = Arc::new(FakeRunner::failing_to_launch());
        let guard = slot.begin().unwrap();
        let err = run_transcode_async(runner, guard, PathBuf::from("ffmpeg"), vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Launch { .. }));
        assert!(slot.begin().is_ok());
    }
}
