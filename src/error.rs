//! Error types for target selection and execution.
//!
//! Errors are categorized by recoverability:
//!
//! | Category | Variants | Recovery |
//! |----------|----------|----------|
//! | **Transient** | `TargetUnavailable`, `Timeout` | Retry with backoff |
//! | **Permanent** | `InvalidRequest`, `InvalidCircuit`, `CircuitTooLarge`, `InvalidShots`, `Unsupported` | Fix input |
//! | **Job-level** | `SubmissionFailed`, `JobFailed`, `JobCancelled`, `JobNotFound`, `InconsistentCounts` | Resubmit or abort |
//! | **Lookup / config** | `TargetNotFound`, `Configuration`, `Backend` | Fix configuration |
//!
//! A target that cannot be probed during selection is *not* an error: the
//! selector records it as a [`ProbeFailure`](crate::selector::ProbeFailure)
//! and moves on. Finding no suitable device is not an error either; the
//! selector falls back to the simulator.

use thiserror::Error;

/// Errors that can occur while selecting a target or executing a circuit.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExecError {
    // ── Transient errors (retry with backoff) ────────────────────────
    /// Target is not reachable or not accepting jobs.
    #[error("Target not available: {0}")]
    TargetUnavailable(String),

    /// Waiting for a job exceeded the configured limit.
    #[error("Timeout waiting for job {0}")]
    Timeout(String),

    // ── Permanent errors (fix input) ─────────────────────────────────
    /// The request itself is malformed (e.g. zero required qubits).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The circuit is malformed for the chosen target.
    #[error("Invalid circuit: {0}")]
    InvalidCircuit(String),

    /// The circuit needs more qubits than the target provides.
    #[error("Circuit exceeds target capacity: {0}")]
    CircuitTooLarge(String),

    /// Shot count is zero or above the target limit.
    #[error("Invalid shots: {0}")]
    InvalidShots(String),

    /// Feature not supported by the target.
    #[error("Unsupported feature: {0}")]
    Unsupported(String),

    // ── Job-level errors ─────────────────────────────────────────────
    /// Job submission failed (network or service fault).
    #[error("Job submission failed: {0}")]
    SubmissionFailed(String),

    /// Job execution failed on the target.
    #[error("Job failed: {0}")]
    JobFailed(String),

    /// Job was cancelled before completion.
    #[error("Job cancelled")]
    JobCancelled,

    /// Target has no record of the job.
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// Target returned counts that do not add up to the requested shots.
    #[error("Counts total {actual} does not match requested shots {expected}")]
    InconsistentCounts {
        /// Shots requested.
        expected: u64,
        /// Sum of the returned counts.
        actual: u64,
    },

    // ── Lookup / config errors ───────────────────────────────────────
    /// No target with the given name is known to the provider.
    #[error("Target not found: {0}")]
    TargetNotFound(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generic target error.
    #[error("Backend error: {0}")]
    Backend(String),
}

impl ExecError {
    /// Returns `true` if this error is transient and the operation may succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TargetUnavailable(_) | Self::Timeout(_))
    }
}

/// Result type for selection and execution.
pub type ExecResult<T> = Result<T, ExecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors() {
        assert!(ExecError::TargetUnavailable("offline".into()).is_transient());
        assert!(ExecError::Timeout("job-123".into()).is_transient());
        assert!(!ExecError::InvalidCircuit("bad".into()).is_transient());
        assert!(!ExecError::SubmissionFailed("network".into()).is_transient());
    }

    #[test]
    fn test_error_display() {
        let err = ExecError::InvalidCircuit("3 measurements but 2 classical bits".into());
        assert_eq!(
            err.to_string(),
            "Invalid circuit: 3 measurements but 2 classical bits"
        );

        let err = ExecError::InconsistentCounts {
            expected: 1024,
            actual: 1000,
        };
        assert_eq!(
            err.to_string(),
            "Counts total 1000 does not match requested shots 1024"
        );
    }
}
