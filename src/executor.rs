//! Circuit execution against a selected target.
//!
//! [`Executor::execute`] submits one request and blocks the calling task
//! until the target reports a terminal status. [`Executor::run`] is the
//! whole workflow: select a target for the circuit, then execute on it.
//! Failures from validation, submission or the job itself are returned
//! whole; nothing is retried.

use std::sync::Arc;

use chrono::Utc;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::circuit::CircuitShape;
use crate::config::ExecutorConfig;
use crate::error::{ExecError, ExecResult};
use crate::job::{JobId, JobStatus};
use crate::provider::TargetProvider;
use crate::result::{ExecutionResult, ExecutionSummary, TopOutcome};
use crate::selector::{Selection, TargetSelector};
use crate::target::{Target, ValidationResult};

/// Selects targets and runs circuits on them.
pub struct Executor<C> {
    selector: TargetSelector<C>,
    config: ExecutorConfig,
}

impl<C: CircuitShape + Sync> Executor<C> {
    /// Create an executor over `provider` with default settings.
    pub fn new(provider: Arc<dyn TargetProvider<C>>) -> Self {
        Self {
            selector: TargetSelector::new(provider),
            config: ExecutorConfig::default(),
        }
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    pub fn selector(&self) -> &TargetSelector<C> {
        &self.selector
    }

    /// Select a target for `circuit` and execute it there.
    ///
    /// The summary's `degraded` flag is set when the simulator had to stand
    /// in for a device.
    pub async fn run(
        &self,
        circuit: &C,
        shots: u32,
        prefer_simulator: bool,
    ) -> ExecResult<ExecutionSummary> {
        let selection = self
            .selector
            .select(circuit.required_qubits(), prefer_simulator)
            .await?;
        self.execute_selection(circuit, &selection, shots).await
    }

    /// [`run`](Self::run) with the configured shot count and simulator preference.
    pub async fn run_default(&self, circuit: &C) -> ExecResult<ExecutionSummary> {
        self.run(circuit, self.config.shots, self.config.prefer_simulator)
            .await
    }

    /// Execute on an already-made selection, carrying its degraded flag.
    pub async fn execute_selection(
        &self,
        circuit: &C,
        selection: &Selection<C>,
        shots: u32,
    ) -> ExecResult<ExecutionSummary> {
        let mut summary = self
            .execute(circuit, selection.target().as_ref(), shots)
            .await?;
        summary.degraded = selection.is_degraded();
        Ok(summary)
    }

    /// Run `circuit` on `target` for `shots` repetitions.
    ///
    /// Validates first, then submits and polls until the job finishes.
    /// The returned counts always sum to `shots`.
    pub async fn execute(
        &self,
        circuit: &C,
        target: &dyn Target<C>,
        shots: u32,
    ) -> ExecResult<ExecutionSummary> {
        let max_shots = target.capabilities().max_shots;
        if shots == 0 || shots > max_shots {
            return Err(ExecError::InvalidShots(format!(
                "{shots} shots requested, {} accepts 1..={max_shots}",
                target.name()
            )));
        }

        match target.validate(circuit).await? {
            ValidationResult::Valid => {}
            ValidationResult::Invalid { reasons } => {
                return Err(ExecError::InvalidCircuit(reasons.join("; ")));
            }
            ValidationResult::TooLarge {
                required,
                available,
            } => {
                return Err(ExecError::CircuitTooLarge(format!(
                    "circuit needs {required} qubits, {} has {available}",
                    target.name()
                )));
            }
        }

        let start = Instant::now();
        let job_id = target.submit(circuit, shots).await?;
        info!("Submitted job {} to {} ({} shots)", job_id, target.name(), shots);

        let (status, result) = self.wait(target, &job_id, start).await?;
        let elapsed = start.elapsed();

        let expected = u64::from(shots);
        let actual = result.counts.total_shots();
        if actual != expected {
            return Err(ExecError::InconsistentCounts { expected, actual });
        }

        let top = TopOutcome::from_counts(&result.counts, shots);
        if let Some(top) = &top {
            info!(
                "Job {} done in {:?}: most frequent {} ({:.1}%)",
                job_id, elapsed, top.bitstring, top.percent
            );
        }

        Ok(ExecutionSummary {
            target: target.name().to_string(),
            job_id,
            shots,
            counts: result.counts,
            top,
            status,
            elapsed,
            execution_time_ms: result.execution_time_ms,
            completed_at: Utc::now(),
            degraded: false,
        })
    }

    /// Poll until the job reaches a terminal state.
    async fn wait(
        &self,
        target: &dyn Target<C>,
        job_id: &JobId,
        start: Instant,
    ) -> ExecResult<(JobStatus, ExecutionResult)> {
        let poll_interval = self.config.poll_interval();
        let max_wait = self.config.max_wait();

        loop {
            let status = target.status(job_id).await?;
            match &status {
                JobStatus::Completed => {
                    let result = target.result(job_id).await?;
                    return Ok((JobStatus::Completed, result));
                }
                JobStatus::Failed(msg) => return Err(ExecError::JobFailed(msg.clone())),
                JobStatus::Cancelled => return Err(ExecError::JobCancelled),
                JobStatus::Queued | JobStatus::Running => {
                    if max_wait.is_some_and(|limit| start.elapsed() >= limit) {
                        return Err(ExecError::Timeout(job_id.0.clone()));
                    }
                    debug!("Job {} is {}, polling again", job_id, status);
                    tokio::time::sleep(poll_interval).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::Circuit;
    use crate::provider::TargetCatalog;
    use crate::simulator::LocalSimulator;

    fn executor() -> Executor<Circuit> {
        let catalog = TargetCatalog::<Circuit>::new(Arc::new(LocalSimulator::new().with_seed(3)));
        Executor::new(Arc::new(catalog))
    }

    #[tokio::test]
    async fn test_execute_bell_on_simulator() {
        let executor = executor();
        let simulator = LocalSimulator::new().with_seed(11);
        let circuit = Circuit::bell().unwrap();

        let summary = executor.execute(&circuit, &simulator, 1024).await.unwrap();

        assert_eq!(summary.target, "qasm_simulator");
        assert_eq!(summary.status, JobStatus::Completed);
        assert_eq!(summary.counts.total_shots(), 1024);
        assert_eq!(summary.counts.get("01") + summary.counts.get("10"), 0);

        let top = summary.top.unwrap();
        assert!(top.bitstring == "00" || top.bitstring == "11");
        assert!(top.percent >= 50.0);
        assert!(!summary.degraded);
    }

    #[tokio::test]
    async fn test_run_falls_back_when_catalog_has_no_devices() {
        let executor = executor();
        let circuit = Circuit::ghz(3).unwrap();

        let summary = executor.run(&circuit, 200, false).await.unwrap();
        assert!(summary.degraded);
        assert_eq!(summary.counts.total_shots(), 200);
    }

    #[tokio::test]
    async fn test_run_forced_simulator_is_not_degraded() {
        let executor = executor();
        let circuit = Circuit::bell().unwrap();

        let summary = executor.run(&circuit, 10, true).await.unwrap();
        assert!(!summary.degraded);
    }

    #[tokio::test]
    async fn test_run_default_uses_config_shots() {
        let executor = executor().with_config(ExecutorConfig::default().with_shots(64));
        let circuit = Circuit::bell().unwrap();

        let summary = executor.run_default(&circuit).await.unwrap();
        assert_eq!(summary.shots, 64);
        assert_eq!(summary.counts.total_shots(), 64);
    }

    #[tokio::test]
    async fn test_zero_shots_rejected() {
        let executor = executor();
        let simulator = LocalSimulator::new();
        let circuit = Circuit::bell().unwrap();

        assert!(matches!(
            executor.execute(&circuit, &simulator, 0).await,
            Err(ExecError::InvalidShots(_))
        ));
    }

    #[tokio::test]
    async fn test_malformed_circuit_surfaces() {
        let executor = executor();
        let simulator = LocalSimulator::new();

        let mut circuit = Circuit::new(2, 1);
        circuit.h(0).unwrap().measure_all().unwrap();

        assert!(matches!(
            executor.execute(&circuit, &simulator, 100).await,
            Err(ExecError::InvalidCircuit(_))
        ));
    }

    #[tokio::test]
    async fn test_too_large_for_target() {
        let executor = executor();
        let simulator = LocalSimulator::new().with_max_qubits(2);
        let circuit = Circuit::ghz(4).unwrap();

        assert!(matches!(
            executor.execute(&circuit, &simulator, 100).await,
            Err(ExecError::CircuitTooLarge(_))
        ));
    }

    #[tokio::test]
    async fn test_oversized_register_reported_not_allocated() {
        let executor = executor();
        let simulator = LocalSimulator::new().with_max_qubits(64);
        let circuit = Circuit::ghz(64).unwrap();

        assert!(matches!(
            executor.execute(&circuit, &simulator, 10).await,
            Err(ExecError::CircuitTooLarge(_))
        ));
    }
}
