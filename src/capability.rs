//! Target capability introspection.
//!
//! [`Capabilities`] is the static half of what a target reports about
//! itself: qubit capacity, whether it is a simulator, shot limits and the
//! gates it accepts. The dynamic half (queue depth) lives in
//! [`TargetAvailability`](crate::target::TargetAvailability) and is probed
//! fresh on every selection.

use serde::{Deserialize, Serialize};

/// Hardware capabilities of an execution target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capabilities {
    /// Name of the target.
    pub name: String,
    /// Number of qubits available.
    pub num_qubits: u32,
    /// Supported gate set (OpenQASM 3 naming convention).
    pub gate_set: GateSet,
    /// Maximum number of shots per job.
    pub max_shots: u32,
    /// Whether this is a simulator (not real hardware).
    pub is_simulator: bool,
    /// Additional features supported by this target.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
}

impl Capabilities {
    /// Create capabilities for a local simulator.
    pub fn simulator(name: impl Into<String>, num_qubits: u32) -> Self {
        Self {
            name: name.into(),
            num_qubits,
            gate_set: GateSet::universal(),
            max_shots: 100_000,
            is_simulator: true,
            features: vec!["statevector".into()],
        }
    }

    /// Create capabilities for a superconducting device with a
    /// `cx, id, rz, sx, x` native basis.
    ///
    /// All universal gates are accepted; the target is expected to
    /// transpile non-native ones.
    pub fn device(name: impl Into<String>, num_qubits: u32) -> Self {
        Self {
            name: name.into(),
            num_qubits,
            gate_set: GateSet::superconducting(),
            max_shots: 20_000,
            is_simulator: false,
            features: vec![],
        }
    }

    /// Override the shot limit.
    pub fn with_max_shots(mut self, max_shots: u32) -> Self {
        self.max_shots = max_shots;
        self
    }

    /// Override the gate set.
    pub fn with_gate_set(mut self, gate_set: GateSet) -> Self {
        self.gate_set = gate_set;
        self
    }

    /// Check whether the target can hold a circuit of `required` qubits.
    pub fn fits(&self, required: u32) -> bool {
        self.num_qubits >= required
    }
}

/// Gate set supported by a target.
///
/// Gate names follow the OpenQASM 3 naming convention (lowercase).
/// If `native` is empty, all supported gates are considered native
/// (typical for simulators).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateSet {
    /// Single-qubit gates supported.
    pub single_qubit: Vec<String>,
    /// Two-qubit gates supported.
    pub two_qubit: Vec<String>,
    /// Three-qubit gates supported.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub three_qubit: Vec<String>,
    /// Native gates (execute without decomposition on this target).
    pub native: Vec<String>,
}

impl GateSet {
    /// Every gate the bundled circuit type can emit.
    pub fn universal() -> Self {
        Self {
            single_qubit: ["id", "x", "y", "z", "h", "s", "t"]
                .into_iter()
                .map(String::from)
                .collect(),
            two_qubit: ["cx", "cz", "swap"].into_iter().map(String::from).collect(),
            three_qubit: vec!["ccx".into()],
            native: vec![],
        }
    }

    /// Universal gates accepted, `cx, id, rz, sx, x` native.
    pub fn superconducting() -> Self {
        Self {
            native: ["cx", "id", "rz", "sx", "x"]
                .into_iter()
                .map(String::from)
                .collect(),
            ..Self::universal()
        }
    }

    /// Check if a gate is supported (single-qubit, two-qubit, or three-qubit).
    pub fn contains(&self, gate: &str) -> bool {
        self.single_qubit.iter().any(|g| g == gate)
            || self.two_qubit.iter().any(|g| g == gate)
            || self.three_qubit.iter().any(|g| g == gate)
    }

    /// Check if a gate is native (executes without decomposition).
    pub fn is_native(&self, gate: &str) -> bool {
        if self.native.is_empty() {
            self.contains(gate)
        } else {
            self.native.iter().any(|g| g == gate)
        }
    }
}
