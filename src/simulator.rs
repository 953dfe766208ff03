//! Local simulator target.

use async_trait::async_trait;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rustc_hash::FxHashMap;
use std::sync::Mutex;
use std::time::Instant;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::capability::Capabilities;
use crate::circuit::{Circuit, CircuitShape, Operation};
use crate::error::{ExecError, ExecResult};
use crate::job::{JobId, JobRecord, JobStatus};
use crate::result::{Counts, ExecutionResult};
use crate::statevector::Statevector;
use crate::target::{Target, TargetAvailability, ValidationResult};

/// Default name, matching the simulator the SDK scripts ask for.
pub const DEFAULT_SIMULATOR_NAME: &str = "qasm_simulator";

/// Largest register the statevector engine will allocate (2^26 amplitudes, 1 GiB).
pub const MAX_SIMULATOR_QUBITS: u32 = 26;

/// Job data for the simulator.
struct SimJob {
    record: JobRecord,
    result: ExecutionResult,
}

/// Statevector simulator running in-process.
///
/// Jobs execute synchronously inside `submit()` and are `Completed` by the
/// time it returns. A job is dropped from the table once its result has been
/// fetched. Measurements must come after all gates on the measured qubit;
/// mid-circuit measurement is rejected.
pub struct LocalSimulator {
    capabilities: Capabilities,
    jobs: Mutex<FxHashMap<String, SimJob>>,
    rng: Mutex<StdRng>,
}

impl LocalSimulator {
    /// Create a simulator named `qasm_simulator` with 20 qubits.
    pub fn new() -> Self {
        Self::named(DEFAULT_SIMULATOR_NAME)
    }

    /// Create a 20-qubit simulator with a custom name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            capabilities: Capabilities::simulator(name, 20),
            jobs: Mutex::new(FxHashMap::default()),
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Set the qubit capacity, capped at [`MAX_SIMULATOR_QUBITS`].
    pub fn with_max_qubits(mut self, max_qubits: u32) -> Self {
        self.capabilities.num_qubits = max_qubits.min(MAX_SIMULATOR_QUBITS);
        self
    }

    /// Seed the sampler so repeated runs produce identical counts.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// Collect every reason `circuit` cannot run here.
    fn check(&self, circuit: &Circuit) -> ValidationResult {
        if circuit.num_qubits() > self.capabilities.num_qubits {
            return ValidationResult::TooLarge {
                required: circuit.num_qubits(),
                available: self.capabilities.num_qubits,
            };
        }

        let mut reasons = circuit.problems();
        if !reasons.is_empty() {
            return ValidationResult::Invalid { reasons };
        }
        for gate in circuit.gate_names() {
            if !self.capabilities.gate_set.contains(gate) {
                reasons.push(format!("Unsupported gate: {gate}"));
            }
        }

        let mut measured = vec![false; circuit.num_qubits() as usize];
        for op in circuit.operations() {
            match op {
                Operation::Measure { qubit, .. } => measured[*qubit as usize] = true,
                Operation::Gate { gate, qubits } => {
                    if let Some(q) = qubits.iter().find(|&&q| measured[q as usize]) {
                        reasons.push(format!(
                            "{} on qubit {q} after it was measured",
                            gate.name()
                        ));
                    }
                }
            }
        }

        if reasons.is_empty() {
            ValidationResult::Valid
        } else {
            ValidationResult::Invalid { reasons }
        }
    }

    /// Run simulation synchronously.
    #[instrument(skip(self, circuit), fields(backend = %self.capabilities.name))]
    fn run_simulation(&self, circuit: &Circuit, shots: u32) -> ExecutionResult {
        let start = Instant::now();
        let num_qubits = circuit.num_qubits() as usize;
        let num_clbits = circuit.num_clbits() as usize;
        debug!("Starting simulation: {} qubits, {} shots", num_qubits, shots);

        let mut sv = Statevector::new(num_qubits);
        let mut measurements = Vec::new();
        for op in circuit.operations() {
            match op {
                Operation::Gate { gate, qubits } => sv.apply(*gate, qubits),
                Operation::Measure { qubit, clbit } => measurements.push((*qubit, *clbit)),
            }
        }

        let cumulative = sv.cumulative();
        let mut outcomes: FxHashMap<usize, u64> = FxHashMap::default();
        {
            let mut rng = self
                .rng
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            for _ in 0..shots {
                let outcome = Statevector::sample(&cumulative, &mut *rng);
                *outcomes.entry(outcome).or_default() += 1;
            }
        }

        let counts: Counts = outcomes
            .into_iter()
            .map(|(outcome, n)| (clbit_string(outcome, &measurements, num_clbits), n))
            .collect();

        let elapsed = start.elapsed();
        debug!("Simulation completed in {:?}", elapsed);

        ExecutionResult::new(counts, shots).with_execution_time(elapsed.as_millis() as u64)
    }
}

impl Default for LocalSimulator {
    fn default() -> Self {
        Self::new()
    }
}

/// Render the classical register for a sampled basis state, bit 0 rightmost.
fn clbit_string(outcome: usize, measurements: &[(u32, u32)], num_clbits: usize) -> String {
    let mut bits = vec!['0'; num_clbits];
    for &(qubit, clbit) in measurements {
        bits[clbit as usize] = if (outcome >> qubit) & 1 == 1 { '1' } else { '0' };
    }
    bits.iter().rev().collect()
}

#[async_trait]
impl Target<Circuit> for LocalSimulator {
    fn name(&self) -> &str {
        &self.capabilities.name
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    async fn availability(&self) -> ExecResult<TargetAvailability> {
        Ok(TargetAvailability::always_available())
    }

    async fn validate(&self, circuit: &Circuit) -> ExecResult<ValidationResult> {
        Ok(self.check(circuit))
    }

    #[instrument(skip(self, circuit), fields(backend = %self.capabilities.name))]
    async fn submit(&self, circuit: &Circuit, shots: u32) -> ExecResult<JobId> {
        if shots == 0 || shots > self.capabilities.max_shots {
            return Err(ExecError::InvalidShots(format!(
                "shots must be 1..={}",
                self.capabilities.max_shots
            )));
        }
        match self.check(circuit) {
            ValidationResult::Valid => {}
            ValidationResult::Invalid { reasons } => {
                return Err(ExecError::InvalidCircuit(reasons.join("; ")));
            }
            ValidationResult::TooLarge {
                required,
                available,
            } => {
                return Err(ExecError::CircuitTooLarge(format!(
                    "Circuit has {required} qubits but {} only supports {available}",
                    self.capabilities.name
                )));
            }
        }

        let job_id = JobId::new(Uuid::new_v4().to_string());
        let mut record = JobRecord::new(job_id.clone(), self.capabilities.name.clone(), shots);
        debug!("Submitted job: {}", job_id);

        record.transition(JobStatus::Running);
        let result = self.run_simulation(circuit, shots);
        record.transition(JobStatus::Completed);

        self.jobs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(
                job_id.0.clone(),
                SimJob { record, result },
            );

        Ok(job_id)
    }

    async fn status(&self, job_id: &JobId) -> ExecResult<JobStatus> {
        let jobs = self
            .jobs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        jobs.get(&job_id.0)
            .map(|j| j.record.status.clone())
            .ok_or_else(|| ExecError::JobNotFound(job_id.0.clone()))
    }

    async fn result(&self, job_id: &JobId) -> ExecResult<ExecutionResult> {
        let mut jobs = self
            .jobs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        jobs.remove(&job_id.0)
            .map(|job| job.result)
            .ok_or_else(|| ExecError::JobNotFound(job_id.0.clone()))
    }

    async fn cancel(&self, job_id: &JobId) -> ExecResult<()> {
        let mut jobs = self
            .jobs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(sim_job) = jobs.get_mut(&job_id.0) {
            sim_job.record.transition(JobStatus::Cancelled);
            Ok(())
        } else {
            Err(ExecError::JobNotFound(job_id.0.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_simulator_capabilities() {
        let backend = LocalSimulator::new();
        let caps = backend.capabilities();

        assert!(caps.is_simulator);
        assert_eq!(caps.num_qubits, 20);
        assert_eq!(backend.name(), "qasm_simulator");
        assert_eq!(
            backend.availability().await.unwrap(),
            TargetAvailability::always_available()
        );
    }

    #[tokio::test]
    async fn test_simulator_bell_state() {
        let backend = LocalSimulator::new().with_seed(42);

        let circuit = Circuit::bell().unwrap();
        let job_id = backend.submit(&circuit, 1024).await.unwrap();

        let status = backend.status(&job_id).await.unwrap();
        assert!(status.is_success());

        let result = backend.result(&job_id).await.unwrap();
        assert_eq!(result.shots, 1024);

        let counts = &result.counts;
        assert_eq!(counts.get("00") + counts.get("11"), 1024);
        assert_eq!(counts.get("01") + counts.get("10"), 0);
    }

    #[tokio::test]
    async fn test_simulator_bit_order() {
        let backend = LocalSimulator::new();

        let mut circuit = Circuit::new(3, 3);
        circuit.x(0).unwrap().measure_all().unwrap();
        let job_id = backend.submit(&circuit, 10).await.unwrap();

        let result = backend.result(&job_id).await.unwrap();
        assert_eq!(result.counts.get("001"), 10);
    }

    #[tokio::test]
    async fn test_simulator_measurement_remap() {
        let backend = LocalSimulator::new();

        let mut circuit = Circuit::new(2, 1);
        circuit.x(1).unwrap().measure(1, 0).unwrap();
        let job_id = backend.submit(&circuit, 8).await.unwrap();

        let result = backend.result(&job_id).await.unwrap();
        assert_eq!(result.counts.get("1"), 8);
    }

    #[tokio::test]
    async fn test_seeded_runs_repeat() {
        let circuit = Circuit::ghz(3).unwrap();

        let a = LocalSimulator::new().with_seed(9);
        let b = LocalSimulator::new().with_seed(9);
        let ra = a.result(&a.submit(&circuit, 500).await.unwrap()).await.unwrap();
        let rb = b.result(&b.submit(&circuit, 500).await.unwrap()).await.unwrap();

        assert_eq!(ra.counts, rb.counts);
        assert_eq!(ra.counts.get("000") + ra.counts.get("111"), 500);
    }

    #[tokio::test]
    async fn test_simulator_too_many_qubits() {
        let backend = LocalSimulator::new().with_max_qubits(2);
        let circuit = Circuit::ghz(3).unwrap();

        assert_eq!(
            backend.validate(&circuit).await.unwrap(),
            ValidationResult::TooLarge {
                required: 3,
                available: 2
            }
        );
        let result = backend.submit(&circuit, 100).await;
        assert!(matches!(result, Err(ExecError::CircuitTooLarge(_))));
    }

    #[tokio::test]
    async fn test_simulator_capacity_is_capped() {
        let backend = LocalSimulator::new().with_max_qubits(64);
        assert_eq!(backend.capabilities().num_qubits, MAX_SIMULATOR_QUBITS);

        let circuit = Circuit::ghz(64).unwrap();
        assert_eq!(
            backend.validate(&circuit).await.unwrap(),
            ValidationResult::TooLarge {
                required: 64,
                available: MAX_SIMULATOR_QUBITS
            }
        );
        assert!(matches!(
            backend.submit(&circuit, 10).await,
            Err(ExecError::CircuitTooLarge(_))
        ));
    }

    #[tokio::test]
    async fn test_result_releases_job() {
        let backend = LocalSimulator::new().with_seed(1);
        let job_id = backend.submit(&Circuit::bell().unwrap(), 16).await.unwrap();

        assert_eq!(backend.result(&job_id).await.unwrap().counts.total_shots(), 16);
        assert!(matches!(
            backend.result(&job_id).await,
            Err(ExecError::JobNotFound(_))
        ));
        assert!(matches!(
            backend.status(&job_id).await,
            Err(ExecError::JobNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_simulator_rejects_malformed() {
        let backend = LocalSimulator::new();

        let mut circuit = Circuit::new(2, 1);
        circuit.measure_all().unwrap();
        assert!(!backend.validate(&circuit).await.unwrap().is_valid());
        assert!(matches!(
            backend.submit(&circuit, 10).await,
            Err(ExecError::InvalidCircuit(_))
        ));

        let mut circuit = Circuit::new(1, 1);
        circuit.measure(0, 0).unwrap().h(0).unwrap();
        assert!(!backend.validate(&circuit).await.unwrap().is_valid());
    }

    #[tokio::test]
    async fn test_simulator_invalid_shots() {
        let backend = LocalSimulator::new();
        let circuit = Circuit::bell().unwrap();
        assert!(matches!(
            backend.submit(&circuit, 0).await,
            Err(ExecError::InvalidShots(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_job() {
        let backend = LocalSimulator::new();
        let id = JobId::new("missing");
        assert!(matches!(
            backend.status(&id).await,
            Err(ExecError::JobNotFound(_))
        ));
        assert!(matches!(
            backend.cancel(&id).await,
            Err(ExecError::JobNotFound(_))
        ));
    }
}
