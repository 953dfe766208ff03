//! qpu-select: pick an execution target for a quantum circuit and run it.
//!
//! Given a circuit's qubit requirement, the [`TargetSelector`] scans the
//! devices a [`TargetProvider`] knows about and picks the one with the
//! fewest pending jobs among those large enough. If none qualifies, or if
//! the caller asks for it, the provider's simulator is used instead. The
//! [`Executor`] then submits the circuit, waits for the job and returns an
//! [`ExecutionSummary`] with the counts and the most frequent outcome.
//!
//! # Overview
//!
//! The crate defines:
//! - A [`Target`] trait for anything circuits can be submitted to
//! - [`TargetProvider`] / [`TargetCatalog`] for enumerating targets
//! - [`TargetSelector`] / [`Selection`] for least-queued selection with
//!   simulator fallback and typed [`ProbeFailure`]s
//! - [`Executor`] to validate, submit, poll and summarize
//! - [`Circuit`] and [`LocalSimulator`], a small circuit type and an
//!   in-process statevector simulator for it
//! - [`ExecError`] with categorized variants
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use qpu_select::{Circuit, Executor, LocalSimulator, TargetCatalog};
//!
//! let catalog = TargetCatalog::<Circuit>::new(Arc::new(LocalSimulator::new()))
//!     .with_target(my_device);
//! let executor = Executor::new(Arc::new(catalog));
//!
//! let summary = executor.run(&Circuit::bell()?, 1024, false).await?;
//! if let Some(top) = &summary.top {
//!     println!("{} ran {}: {} ({:.1}%)", summary.target, summary.job_id, top.bitstring, top.percent);
//! }
//! ```

pub mod capability;
pub mod circuit;
pub mod config;
pub mod error;
pub mod executor;
pub mod job;
pub mod provider;
pub mod result;
pub mod selector;
pub mod simulator;
mod statevector;
pub mod target;

pub use capability::{Capabilities, GateSet};
pub use circuit::{Circuit, CircuitShape, Gate, Operation};
pub use config::ExecutorConfig;
pub use error::{ExecError, ExecResult};
pub use executor::Executor;
pub use job::{JobId, JobRecord, JobStatus};
pub use provider::{SharedTarget, TargetCatalog, TargetProvider};
pub use result::{Counts, ExecutionResult, ExecutionSummary, TopOutcome};
pub use selector::{ProbeFailure, ProbeFault, Selection, SelectionMode, TargetSelector};
pub use simulator::{LocalSimulator, MAX_SIMULATOR_QUBITS};
pub use target::{Target, TargetAvailability, ValidationResult};
