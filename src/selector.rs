//! Target selection.
//!
//! [`TargetSelector::select`] scans the provider's devices in enumeration
//! order and picks the one with the fewest pending jobs among those large
//! enough for the circuit:
//!
//! ```text
//!   prefer_simulator? ──yes──→ simulator                       (Forced)
//!         │ no
//!         ▼
//!   for each non-simulator target:
//!       probe availability ──fails──→ ProbeFailure, skip
//!       capacity < required ────────→ skip
//!       queue < best queue ─────────→ new best (strict: first seen wins ties)
//!         │
//!         ▼
//!   best found? ──yes──→ device                                (Device)
//!         │ no
//!         └──────────→ simulator                               (Degraded)
//! ```
//!
//! Selection never fails because no device qualified; the simulator is
//! always there to fall back on.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ExecError, ExecResult};
use crate::provider::{SharedTarget, TargetProvider};
use crate::target::Target;

/// How a target came to be selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionMode {
    /// Simulator requested explicitly; no scan was done.
    Forced,
    /// Least-queued eligible device.
    Device,
    /// No device qualified; the simulator stands in.
    Degraded,
    /// Picked by name.
    Named,
}

/// Why a target was left out of a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProbeFault {
    /// The availability query returned an error.
    Error(String),
    /// The target reported it is not accepting jobs.
    Offline(Option<String>),
    /// The target did not report a queue depth.
    UnknownQueueDepth,
}

impl fmt::Display for ProbeFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeFault::Error(msg) => write!(f, "probe failed: {msg}"),
            ProbeFault::Offline(Some(msg)) => write!(f, "offline: {msg}"),
            ProbeFault::Offline(None) => write!(f, "offline"),
            ProbeFault::UnknownQueueDepth => write!(f, "queue depth not reported"),
        }
    }
}

/// A target whose status could not be read during a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeFailure {
    /// Name of the target.
    pub target: String,
    /// What went wrong.
    pub fault: ProbeFault,
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.target, self.fault)
    }
}

/// Outcome of a selection.
pub struct Selection<C> {
    target: SharedTarget<C>,
    mode: SelectionMode,
    queue_depth: Option<u32>,
    skipped: Vec<ProbeFailure>,
}

impl<C> Selection<C> {
    fn new(target: SharedTarget<C>, mode: SelectionMode) -> Self {
        Self {
            target,
            mode,
            queue_depth: None,
            skipped: Vec::new(),
        }
    }

    /// The chosen target.
    pub fn target(&self) -> &SharedTarget<C> {
        &self.target
    }

    /// Consume the selection, keeping only the target.
    pub fn into_target(self) -> SharedTarget<C> {
        self.target
    }

    pub fn name(&self) -> &str {
        self.target.name()
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    /// Whether the simulator was substituted because no device qualified.
    pub fn is_degraded(&self) -> bool {
        self.mode == SelectionMode::Degraded
    }

    /// Queue depth observed for the chosen device during the scan.
    pub fn queue_depth(&self) -> Option<u32> {
        self.queue_depth
    }

    /// Targets excluded because their probe failed.
    pub fn skipped(&self) -> &[ProbeFailure] {
        &self.skipped
    }
}

impl<C> fmt::Debug for Selection<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selection")
            .field("target", &self.target.name())
            .field("mode", &self.mode)
            .field("queue_depth", &self.queue_depth)
            .field("skipped", &self.skipped)
            .finish()
    }
}

/// Picks an execution target from a [`TargetProvider`].
pub struct TargetSelector<C> {
    provider: Arc<dyn TargetProvider<C>>,
}

impl<C> Clone for TargetSelector<C> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
        }
    }
}

impl<C> TargetSelector<C> {
    /// Create a selector over `provider`.
    pub fn new(provider: Arc<dyn TargetProvider<C>>) -> Self {
        Self { provider }
    }

    /// Choose a target for a circuit needing `required_qubits` qubits.
    ///
    /// With `prefer_simulator` the provider's simulator is returned without
    /// enumerating anything. Otherwise every non-simulator target is probed
    /// in turn, and the least-queued one with enough qubits wins; if none
    /// qualifies the simulator is returned in [`SelectionMode::Degraded`].
    ///
    /// Only a zero qubit requirement is an error.
    pub async fn select(
        &self,
        required_qubits: u32,
        prefer_simulator: bool,
    ) -> ExecResult<Selection<C>> {
        if required_qubits == 0 {
            return Err(ExecError::InvalidRequest(
                "required qubit count must be at least 1".into(),
            ));
        }

        if prefer_simulator {
            let simulator = self.provider.simulator();
            info!("Simulator requested, using {}", simulator.name());
            return Ok(Selection::new(simulator, SelectionMode::Forced));
        }

        let targets = match self.provider.targets().await {
            Ok(targets) => targets,
            Err(e) => {
                warn!("Target enumeration failed: {}", e);
                Vec::new()
            }
        };

        let mut best: Option<(SharedTarget<C>, u32)> = None;
        let mut skipped = Vec::new();

        for target in targets {
            let caps = target.capabilities();
            if caps.is_simulator {
                debug!("Skipping simulator {} during device scan", target.name());
                continue;
            }

            let queue = match probe(target.as_ref()).await {
                Ok(queue) => queue,
                Err(fault) => {
                    warn!("Skipping {}: {}", target.name(), fault);
                    skipped.push(ProbeFailure {
                        target: target.name().to_string(),
                        fault,
                    });
                    continue;
                }
            };

            info!(
                "{}: {} qubits, {} pending jobs",
                target.name(),
                caps.num_qubits,
                queue
            );

            if !caps.fits(required_qubits) {
                debug!(
                    "{} too small ({} < {})",
                    target.name(),
                    caps.num_qubits,
                    required_qubits
                );
                continue;
            }

            if best.as_ref().is_none_or(|(_, best_queue)| queue < *best_queue) {
                best = Some((target, queue));
            }
        }

        let mut selection = match best {
            Some((target, queue)) => {
                info!("Selected {} ({} pending jobs)", target.name(), queue);
                let mut selection = Selection::new(target, SelectionMode::Device);
                selection.queue_depth = Some(queue);
                selection
            }
            None => {
                let simulator = self.provider.simulator();
                warn!(
                    "No device with at least {} qubits available, falling back to {}",
                    required_qubits,
                    simulator.name()
                );
                Selection::new(simulator, SelectionMode::Degraded)
            }
        };
        selection.skipped = skipped;
        Ok(selection)
    }

    /// Choose a target by name; the simulator is found by its name too.
    pub async fn select_by_name(&self, name: &str) -> ExecResult<Selection<C>> {
        let simulator = self.provider.simulator();
        if simulator.name() == name {
            return Ok(Selection::new(simulator, SelectionMode::Named));
        }

        self.provider
            .targets()
            .await?
            .into_iter()
            .find(|t| t.name() == name)
            .map(|target| Selection::new(target, SelectionMode::Named))
            .ok_or_else(|| ExecError::TargetNotFound(name.to_string()))
    }
}

/// Read the queue depth of a target that is accepting jobs.
async fn probe<C>(target: &dyn Target<C>) -> Result<u32, ProbeFault> {
    let availability = target
        .availability()
        .await
        .map_err(|e| ProbeFault::Error(e.to_string()))?;
    if !availability.is_available {
        return Err(ProbeFault::Offline(availability.status_message));
    }
    availability.queue_depth.ok_or(ProbeFault::UnknownQueueDepth)
}
