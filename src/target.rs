//! Execution target trait and availability types.
//!
//! A [`Target`] is anything that can run a circuit: a remote device or a
//! local simulator. The lifecycle is:
//!
//! ```text
//!   capabilities() ──→ availability() ──→ validate() ──→ submit() ──→ status() ──→ result()
//!    (sync, &ref)         (async)          (async)       (async)      (async)      (async)
//! ```
//!
//! ## Method table
//!
//! | Method | Kind | Returns |
//! |--------|------|---------|
//! | `name()` | sync | `&str` |
//! | `capabilities()` | sync | `&Capabilities` |
//! | `availability()` | async | `ExecResult<TargetAvailability>` |
//! | `validate()` | async | `ExecResult<ValidationResult>` |
//! | `submit()` | async | `ExecResult<JobId>` |
//! | `status()` | async | `ExecResult<JobStatus>` |
//! | `result()` | async | `ExecResult<ExecutionResult>` |
//! | `cancel()` | async | `ExecResult<()>` |

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::capability::Capabilities;
use crate::error::ExecResult;
use crate::job::{JobId, JobStatus};
use crate::result::ExecutionResult;

/// An engine a circuit of type `C` can be submitted to.
///
/// # Contract
///
/// - `capabilities()` is synchronous and infallible; implementations cache
///   it at construction time.
/// - `availability()` is the per-selection probe. It is called fresh every
///   time a target is considered and may fail for a single target without
///   affecting the others.
/// - `submit()` returns a job that starts in `Queued`.
/// - `result()` is only called once `status()` reports `Completed`.
#[async_trait]
pub trait Target<C>: Send + Sync {
    /// Stable name of this target.
    fn name(&self) -> &str;

    /// Static capabilities of this target.
    fn capabilities(&self) -> &Capabilities;

    /// Probe whether the target is accepting jobs and how many are pending.
    async fn availability(&self) -> ExecResult<TargetAvailability>;

    /// Check a circuit against target constraints before submission.
    async fn validate(&self, circuit: &C) -> ExecResult<ValidationResult>;

    /// Submit a circuit for `shots` repetitions.
    async fn submit(&self, circuit: &C, shots: u32) -> ExecResult<JobId>;

    /// Current status of a job.
    async fn status(&self, job_id: &JobId) -> ExecResult<JobStatus>;

    /// Result of a completed job.
    async fn result(&self, job_id: &JobId) -> ExecResult<ExecutionResult>;

    /// Cancel a pending job.
    async fn cancel(&self, job_id: &JobId) -> ExecResult<()>;
}

/// Live availability of a target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetAvailability {
    /// Whether the target is currently accepting jobs.
    pub is_available: bool,
    /// Number of jobs pending ahead of a new submission (if known).
    pub queue_depth: Option<u32>,
    /// Human-readable status message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
}

impl TargetAvailability {
    /// Always available with an empty queue, typical for simulators.
    pub fn always_available() -> Self {
        Self::queued(0)
    }

    /// Available with `depth` jobs pending.
    pub fn queued(depth: u32) -> Self {
        Self {
            is_available: true,
            queue_depth: Some(depth),
            status_message: None,
        }
    }

    /// Offline, with the reason.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            is_available: false,
            queue_depth: None,
            status_message: Some(reason.into()),
        }
    }
}

/// Result of circuit validation against target constraints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    /// Circuit can be submitted as-is.
    Valid,
    /// Circuit cannot run on this target.
    Invalid {
        /// Reasons the circuit is invalid.
        reasons: Vec<String>,
    },
    /// Circuit is larger than the target.
    TooLarge {
        /// Qubits the circuit needs.
        required: u32,
        /// Qubits the target has.
        available: u32,
    },
}

impl ValidationResult {
    /// Check if the circuit can be submitted as-is.
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }
}
