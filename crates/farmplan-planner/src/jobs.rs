//! Background job tracking with progress channels.
//!
//! The [`JobTracker`] manages async optimization jobs, providing progress
//! updates via tokio channels and cooperative cancellation via a
//! [`CancellationToken`]. One tracker backs the in-process job backend of
//! §4.6; the durable backend in [`crate::durable`] reuses [`JobStatus`] but
//! persists state externally instead of in a `DashMap`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Deserialize as _;
use tokio::sync::{broadcast, oneshot, watch};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::events::{JobEvent, JobStatus};
use crate::payload::OptimizationResult;

/// Unique identifier for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(Uuid);

impl JobId {
    /// Create a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Serializes as the plain UUID string, so the external job-info/row payloads
/// in [`crate::payload`] can round-trip a `JobId` through JSON without a
/// wrapper object.
impl serde::Serialize for JobId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for JobId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<Uuid>()
            .map(JobId::from_uuid)
            .map_err(serde::de::Error::custom)
    }
}

/// Progress information for a running job: a real number in `[0,1]` updated
/// at stage boundaries and a handful of named phases.
#[derive(Debug, Clone, Default)]
pub struct Progress {
    pub fraction: f32,
    pub message: Option<String>,
}

impl Progress {
    pub fn with_message(fraction: f32, message: impl Into<String>) -> Self {
        Self {
            fraction,
            message: Some(message.into()),
        }
    }

    pub fn at(fraction: f32) -> Self {
        Self {
            fraction,
            message: None,
        }
    }
}

/// Handle to a running job: progress monitoring, result awaiting, and the
/// cooperative-cancellation token the executing task observes at stage
/// boundaries.
pub struct JobHandle {
    pub id: JobId,
    pub progress: watch::Receiver<Progress>,
    pub result: oneshot::Receiver<JobResult>,
    pub cancel_token: CancellationToken,
}

/// Terminal outcome of a job.
#[derive(Debug, Clone)]
pub enum JobResult {
    Succeeded { result: OptimizationResult },
    Failed { error: String },
    TimedOut,
    Cancelled,
}

impl JobResult {
    pub fn status(&self) -> JobStatus {
        match self {
            JobResult::Succeeded { .. } => JobStatus::Succeeded,
            JobResult::Failed { .. } => JobStatus::Failed,
            JobResult::TimedOut => JobStatus::Timeout,
            JobResult::Cancelled => JobStatus::Canceled,
        }
    }
}

struct JobState {
    #[allow(dead_code)] // kept for future job duration reporting
    started_at: DateTime<Utc>,
    progress_tx: watch::Sender<Progress>,
    result_tx: Option<oneshot::Sender<JobResult>>,
    cancel: CancellationToken,
}

/// Manages background optimization jobs with progress tracking and
/// cooperative cancellation. Terminal states are sticky: [`JobTracker::complete`],
/// [`JobTracker::fail`], and [`JobTracker::cancel`] all remove the job from
/// `jobs` on first call, so a second call on the same id is a no-op.
pub struct JobTracker {
    jobs: DashMap<JobId, JobState>,
    events_tx: broadcast::Sender<JobEvent>,
}

impl JobTracker {
    pub fn new() -> Self {
        let (events_tx, _) = broadcast::channel(256);
        Self {
            jobs: DashMap::new(),
            events_tx,
        }
    }

    /// Create a new job and return its handle. The job starts in `queued`;
    /// callers transition it to `running` themselves once a worker slot
    /// picks it up.
    pub fn create(&self) -> JobHandle {
        let id = JobId::new();
        let (progress_tx, progress_rx) = watch::channel(Progress::default());
        let (result_tx, result_rx) = oneshot::channel();
        let cancel = CancellationToken::new();

        let state = JobState {
            started_at: Utc::now(),
            progress_tx,
            result_tx: Some(result_tx),
            cancel: cancel.clone(),
        };

        self.jobs.insert(id, state);
        let _ = self.events_tx.send(JobEvent::Started { id });

        JobHandle {
            id,
            progress: progress_rx,
            result: result_rx,
            cancel_token: cancel,
        }
    }

    pub fn update_progress(&self, id: JobId, progress: Progress) {
        if let Some(state) = self.jobs.get(&id) {
            let _ = state.progress_tx.send(progress.clone());
            let _ = self.events_tx.send(JobEvent::Progress {
                id,
                fraction: progress.fraction,
                message: progress.message,
            });
        }
    }

    /// Commit a job's terminal outcome. Cancellation races with completion:
    /// whichever call removes the entry from `jobs` first wins, matching
    /// "cancellation is idempotent" / "completed jobs ignore cancel".
    fn finish(&self, id: JobId, result: JobResult) {
        if let Some((_, mut state)) = self.jobs.remove(&id) {
            let _ = state.progress_tx.send(Progress::at(1.0));
            let event = match &result {
                JobResult::Cancelled => JobEvent::Cancelled { id },
                JobResult::Failed { error } => JobEvent::Failed {
                    id,
                    error: error.clone(),
                },
                _ => JobEvent::Completed {
                    id,
                    status: result.status(),
                },
            };
            if let Some(tx) = state.result_tx.take() {
                let _ = tx.send(result);
            }
            let _ = self.events_tx.send(event);
        }
    }

    pub fn complete(&self, id: JobId, result: OptimizationResult) {
        self.finish(id, JobResult::Succeeded { result });
    }

    pub fn fail(&self, id: JobId, error: impl Into<String>) {
        self.finish(
            id,
            JobResult::Failed {
                error: error.into(),
            },
        );
    }

    pub fn timeout(&self, id: JobId) {
        self.finish(id, JobResult::TimedOut);
    }

    /// Cancel a job. A queued job's cancellation is indistinguishable from a
    /// running one's from the tracker's point of view - both simply set the
    /// token and commit `canceled` - but a running task only observes the
    /// token at its own checkpoints, so the transition may lag slightly
    /// behind this call returning.
    pub fn cancel(&self, id: JobId) {
        if let Some(state) = self.jobs.get(&id) {
            state.cancel.cancel();
        }
        self.finish(id, JobResult::Cancelled);
    }

    pub fn active_count(&self) -> usize {
        self.jobs.len()
    }

    pub fn active_jobs(&self) -> Vec<JobId> {
        self.jobs.iter().map(|r| *r.key()).collect()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.events_tx.subscribe()
    }
}

impl Default for JobTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl JobTracker {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::OptimizationResult;

    fn sample_result() -> OptimizationResult {
        OptimizationResult {
            status: "ok".into(),
            objective_value: Some(1000.0),
            solution: None,
            stats: Default::default(),
            warnings: vec![],
            timeline: None,
        }
    }

    #[test]
    fn test_job_lifecycle() {
        let tracker = JobTracker::new();
        let handle = tracker.create();

        assert_eq!(tracker.active_count(), 1);

        tracker.update_progress(handle.id, Progress::at(0.5));
        tracker.complete(handle.id, sample_result());

        assert_eq!(tracker.active_count(), 0);
    }

    #[test]
    fn test_job_failure() {
        let tracker = JobTracker::new();
        let handle = tracker.create();

        tracker.fail(handle.id, "solver errored");

        assert_eq!(tracker.active_count(), 0);
    }

    #[test]
    fn test_job_cancel_sets_token() {
        let tracker = JobTracker::new();
        let handle = tracker.create();
        let token = handle.cancel_token.clone();

        tracker.cancel(handle.id);

        assert!(token.is_cancelled());
        assert_eq!(tracker.active_count(), 0);
    }

    #[test]
    fn test_cancel_after_complete_is_noop() {
        let tracker = JobTracker::new();
        let handle = tracker.create();

        tracker.complete(handle.id, sample_result());
        tracker.cancel(handle.id);

        assert_eq!(tracker.active_count(), 0);
    }
}
