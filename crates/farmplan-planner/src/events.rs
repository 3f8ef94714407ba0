//! Job lifecycle states and the events the tracker broadcasts on transition.

use crate::JobId;

/// A job's position in the `queued → running → {succeeded, failed, timeout,
/// canceled}` state machine. Terminal states are sticky: once reached, no
/// later transition is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
    Timeout,
    Canceled,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Succeeded | JobStatus::Failed | JobStatus::Timeout | JobStatus::Canceled
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Succeeded => "succeeded",
            JobStatus::Failed => "failed",
            JobStatus::Timeout => "timeout",
            JobStatus::Canceled => "canceled",
        };
        write!(f, "{s}")
    }
}

/// Events emitted by the job tracker on every state transition and at named
/// progress checkpoints (`post:timeline_build`, `done`, per §4.6).
#[derive(Debug, Clone)]
pub enum JobEvent {
    Started {
        id: JobId,
    },

    Progress {
        id: JobId,
        fraction: f32,
        message: Option<String>,
    },

    Completed {
        id: JobId,
        status: JobStatus,
    },

    Failed {
        id: JobId,
        error: String,
    },

    Cancelled {
        id: JobId,
    },
}
