//! Job lifecycle types.
//!
//! ```text
//!   submit() ──→ Queued ──→ Running ──→ Completed
//!                  │           │
//!                  │           ├──→ Failed(reason)
//!                  │           │
//!                  └───────────┴──→ Cancelled
//! ```
//!
//! Transitions are monotonic and terminal states are permanent. A result
//! may only be fetched once the job is `Completed`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

impl JobId {
    /// Create a new job ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Status of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    /// Job is waiting in queue.
    Queued,
    /// Job is currently running.
    Running,
    /// Job completed successfully.
    Completed,
    /// Job failed with an error message.
    Failed(String),
    /// Job was cancelled.
    Cancelled,
}

impl JobStatus {
    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed(_) | JobStatus::Cancelled
        )
    }

    /// Check if the job is still pending (queued or running).
    pub fn is_pending(&self) -> bool {
        matches!(self, JobStatus::Queued | JobStatus::Running)
    }

    /// Check if the job completed successfully.
    pub fn is_success(&self) -> bool {
        matches!(self, JobStatus::Completed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Queued => write!(f, "Queued"),
            JobStatus::Running => write!(f, "Running"),
            JobStatus::Completed => write!(f, "Completed"),
            JobStatus::Failed(msg) => write!(f, "Failed: {msg}"),
            JobStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// Bookkeeping for a submitted job, as kept by in-process targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    /// The job identifier.
    pub id: JobId,
    /// Current status.
    pub status: JobStatus,
    /// Number of shots requested.
    pub shots: u32,
    /// Target the job was submitted to.
    pub target: String,
    /// Time the job was created.
    pub created_at: DateTime<Utc>,
    /// Time the job reached a terminal state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    /// Create a queued job record.
    pub fn new(id: impl Into<JobId>, target: impl Into<String>, shots: u32) -> Self {
        Self {
            id: id.into(),
            status: JobStatus::Queued,
            shots,
            target: target.into(),
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Move the job to `status`.
    ///
    /// Terminal states are permanent: once the job has finished, further
    /// transitions are ignored and `false` is returned.
    pub fn transition(&mut self, status: JobStatus) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = status;
        if self.status.is_terminal() {
            self.finished_at = Some(Utc::now());
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_status_terminal() {
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed("error".into()).is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_job_status_display() {
        assert_eq!(JobStatus::Queued.to_string(), "Queued");
        assert_eq!(
            JobStatus::Failed("timeout".into()).to_string(),
            "Failed: timeout"
        );
    }

    #[test]
    fn test_job_id_from() {
        let id: JobId = "job-123".into();
        assert_eq!(id.0, "job-123");
        assert_eq!(id.to_string(), "job-123");
    }

    #[test]
    fn test_record_terminal_is_permanent() {
        let mut job = JobRecord::new("job-1", "qasm_simulator", 1024);
        assert_eq!(job.status, JobStatus::Queued);
        assert!(job.finished_at.is_none());

        assert!(job.transition(JobStatus::Running));
        assert!(job.transition(JobStatus::Completed));
        assert!(job.finished_at.is_some());

        assert!(!job.transition(JobStatus::Cancelled));
        assert_eq!(job.status, JobStatus::Completed);
    }
}
