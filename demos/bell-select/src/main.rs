//! Select a device for a small entangling circuit and run it.
//!
//! The catalog here holds emulated devices: each reports a fixed queue depth
//! and runs submitted circuits on an in-process statevector simulator. With
//! no flags the least busy device large enough for the circuit is chosen;
//! `--simulator` skips the scan and `--device` asks for one by name.
//!
//! ```text
//! bell-select --circuit ghz --qubits 4 -v
//! QPU_SELECT_SHOTS=4096 bell-select --device ibmq_lima
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use clap::{Parser, ValueEnum};
use console::style;
use qpu_select::{
    Capabilities, Circuit, CircuitShape, ExecResult, ExecutionResult, ExecutionSummary, Executor,
    ExecutorConfig, JobId, JobStatus, LocalSimulator, Selection, Target, TargetAvailability,
    TargetCatalog, ValidationResult,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Run a Bell or GHZ circuit on the least busy emulated device
#[derive(Parser)]
#[command(name = "bell-select")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Circuit to run
    #[arg(short, long, value_enum, default_value = "bell")]
    circuit: CircuitKind,

    /// Qubit count for the GHZ circuit
    #[arg(short, long, default_value = "3")]
    qubits: u32,

    /// Number of shots (overrides QPU_SELECT_SHOTS)
    #[arg(short, long)]
    shots: Option<u32>,

    /// Run on the simulator without scanning devices
    #[arg(long, conflicts_with = "device")]
    simulator: bool,

    /// Run on the named device instead of selecting one
    #[arg(short, long)]
    device: Option<String>,

    /// Seed for the emulated devices' samplers
    #[arg(long)]
    seed: Option<u64>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
enum CircuitKind {
    Bell,
    Ghz,
}

/// A remote device stand-in with a fixed queue.
struct EmulatedDevice {
    capabilities: Capabilities,
    availability: TargetAvailability,
    engine: LocalSimulator,
}

impl EmulatedDevice {
    fn new(
        name: &str,
        num_qubits: u32,
        availability: TargetAvailability,
        seed: Option<u64>,
    ) -> Self {
        let mut engine = LocalSimulator::named(name).with_max_qubits(num_qubits);
        if let Some(seed) = seed {
            engine = engine.with_seed(seed);
        }
        Self {
            capabilities: Capabilities::device(name, num_qubits),
            availability,
            engine,
        }
    }
}

#[async_trait]
impl Target<Circuit> for EmulatedDevice {
    fn name(&self) -> &str {
        &self.capabilities.name
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    async fn availability(&self) -> ExecResult<TargetAvailability> {
        Ok(self.availability.clone())
    }

    async fn validate(&self, circuit: &Circuit) -> ExecResult<ValidationResult> {
        self.engine.validate(circuit).await
    }

    async fn submit(&self, circuit: &Circuit, shots: u32) -> ExecResult<JobId> {
        debug!("{} accepted {} shots", self.name(), shots);
        self.engine.submit(circuit, shots).await
    }

    async fn status(&self, job_id: &JobId) -> ExecResult<JobStatus> {
        self.engine.status(job_id).await
    }

    async fn result(&self, job_id: &JobId) -> ExecResult<ExecutionResult> {
        self.engine.result(job_id).await
    }

    async fn cancel(&self, job_id: &JobId) -> ExecResult<()> {
        self.engine.cancel(job_id).await
    }
}

fn catalog(seed: Option<u64>) -> TargetCatalog<Circuit> {
    let device = |name: &str, qubits: u32, availability: TargetAvailability| {
        Arc::new(EmulatedDevice::new(name, qubits, availability, seed))
    };

    let mut simulator = LocalSimulator::new();
    if let Some(seed) = seed {
        simulator = simulator.with_seed(seed);
    }

    TargetCatalog::<Circuit>::new(Arc::new(simulator))
        .with_target(device("ibmq_armonk", 1, TargetAvailability::queued(0)))
        .with_target(device("ibmq_lima", 5, TargetAvailability::queued(14)))
        .with_target(device("ibmq_belem", 5, TargetAvailability::queued(6)))
        .with_target(device("ibmq_quito", 5, TargetAvailability::queued(6)))
        .with_target(device(
            "ibmq_bogota",
            5,
            TargetAvailability::unavailable("scheduled maintenance"),
        ))
}

fn print_selection(selection: &Selection<Circuit>) {
    for failure in selection.skipped() {
        println!("  {} {}", style("skipped").yellow(), failure);
    }

    let queue = selection
        .queue_depth()
        .map_or_else(|| "-".to_string(), |q| q.to_string());
    println!(
        "{} Target: {} ({:?}, queue {})",
        style("→").cyan().bold(),
        style(selection.name()).yellow(),
        selection.mode(),
        queue
    );
    if selection.is_degraded() {
        println!(
            "  {}",
            style("no device qualified, running on the simulator").red()
        );
    }
}

fn print_summary(summary: &ExecutionSummary) {
    println!(
        "\n{} Results ({} shots, job {}):",
        style("✓").green().bold(),
        summary.shots,
        summary.job_id
    );

    let total = summary.counts.total_shots() as f64;
    for (bitstring, count) in summary.counts.sorted() {
        let prob = *count as f64 / total * 100.0;
        let bar = "█".repeat((prob / 2.0).round() as usize);
        println!(
            "  {}: {:>6} ({:>5.2}%) {}",
            style(bitstring).cyan(),
            count,
            prob,
            style(bar).green()
        );
    }

    if let Some(top) = &summary.top {
        println!(
            "\n  Most frequent: {} ({:.1}%)",
            style(&top.bitstring).cyan().bold(),
            top.percent
        );
    }
    println!("  Elapsed: {:?}", summary.elapsed);
    if let Some(time_ms) = summary.execution_time_ms {
        println!("  Execution time: {} ms", style(time_ms).yellow());
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let mut config = ExecutorConfig::from_env()?;
    if let Some(shots) = cli.shots {
        config = config.with_shots(shots);
    }
    if cli.simulator {
        config = config.with_prefer_simulator(true);
    }

    let circuit = match cli.circuit {
        CircuitKind::Bell => Circuit::bell()?,
        CircuitKind::Ghz => Circuit::ghz(cli.qubits)?,
    };
    println!(
        "{} Circuit: {} qubits, gates [{}]",
        style("→").cyan().bold(),
        circuit.required_qubits(),
        circuit.gate_names().collect::<Vec<_>>().join(", ")
    );

    let executor = Executor::new(Arc::new(catalog(cli.seed))).with_config(config);
    let selection = match &cli.device {
        Some(name) => executor.selector().select_by_name(name).await?,
        None => {
            executor
                .selector()
                .select(circuit.required_qubits(), executor.config().prefer_simulator)
                .await?
        }
    };
    print_selection(&selection);

    let summary = executor
        .execute_selection(&circuit, &selection, executor.config().shots)
        .await?;
    print_summary(&summary);

    Ok(())
}
