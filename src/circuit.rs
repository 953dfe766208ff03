//! A minimal measurement circuit.
//!
//! Just enough structure to express the small circuits this crate is
//! exercised with (Bell and GHZ states, oracle-style circuits built from
//! X/CX/CCX) and to let targets check them. Anything that can report its
//! qubit and classical-bit counts can be selected for via [`CircuitShape`].

use serde::{Deserialize, Serialize};

use crate::error::{ExecError, ExecResult};

/// Sizing information the selector and executor need from a circuit.
pub trait CircuitShape {
    /// Number of qubits the circuit acts on.
    fn num_qubits(&self) -> u32;

    /// Number of classical bits measurements can write to.
    fn num_clbits(&self) -> u32;

    /// Minimum qubit capacity a target needs to run the circuit.
    fn required_qubits(&self) -> u32 {
        self.num_qubits()
    }
}

/// Gates the bundled circuit type can express.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gate {
    X,
    Y,
    Z,
    H,
    S,
    T,
    CX,
    CZ,
    Swap,
    CCX,
}

impl Gate {
    /// OpenQASM 3 name of the gate.
    pub fn name(self) -> &'static str {
        match self {
            Gate::X => "x",
            Gate::Y => "y",
            Gate::Z => "z",
            Gate::H => "h",
            Gate::S => "s",
            Gate::T => "t",
            Gate::CX => "cx",
            Gate::CZ => "cz",
            Gate::Swap => "swap",
            Gate::CCX => "ccx",
        }
    }

    /// Number of qubit operands.
    pub fn arity(self) -> usize {
        match self {
            Gate::X | Gate::Y | Gate::Z | Gate::H | Gate::S | Gate::T => 1,
            Gate::CX | Gate::CZ | Gate::Swap => 2,
            Gate::CCX => 3,
        }
    }
}

/// One circuit instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Unitary gate on the listed qubits (controls first).
    Gate { gate: Gate, qubits: Vec<u32> },
    /// Measure `qubit` into classical bit `clbit`.
    Measure { qubit: u32, clbit: u32 },
}

/// Quantum circuit with a fixed quantum and classical register.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Circuit {
    num_qubits: u32,
    num_clbits: u32,
    operations: Vec<Operation>,
}

impl Circuit {
    /// Create an empty circuit.
    pub fn new(num_qubits: u32, num_clbits: u32) -> Self {
        Self {
            num_qubits,
            num_clbits,
            operations: Vec::new(),
        }
    }

    /// Two-qubit Bell state `(|00⟩ + |11⟩)/√2`, both qubits measured.
    pub fn bell() -> ExecResult<Self> {
        let mut circuit = Self::new(2, 2);
        circuit.h(0)?.cx(0, 1)?.measure_all()?;
        Ok(circuit)
    }

    /// `n`-qubit GHZ state, all qubits measured.
    pub fn ghz(n: u32) -> ExecResult<Self> {
        if n == 0 {
            return Err(ExecError::InvalidCircuit(
                "GHZ state needs at least one qubit".into(),
            ));
        }
        let mut circuit = Self::new(n, n);
        circuit.h(0)?;
        for q in 1..n {
            circuit.cx(q - 1, q)?;
        }
        circuit.measure_all()?;
        Ok(circuit)
    }

    /// Operations in program order.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Iterate over the names of the gates used.
    pub fn gate_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.operations.iter().filter_map(|op| match op {
            Operation::Gate { gate, .. } => Some(gate.name()),
            Operation::Measure { .. } => None,
        })
    }

    /// Number of measurement operations.
    pub fn num_measurements(&self) -> usize {
        self.operations
            .iter()
            .filter(|op| matches!(op, Operation::Measure { .. }))
            .count()
    }

    /// Append a gate.
    pub fn gate(&mut self, gate: Gate, qubits: &[u32]) -> ExecResult<&mut Self> {
        if qubits.len() != gate.arity() {
            return Err(ExecError::InvalidCircuit(format!(
                "{} takes {} qubits, got {}",
                gate.name(),
                gate.arity(),
                qubits.len()
            )));
        }
        for (i, &q) in qubits.iter().enumerate() {
            self.check_qubit(q)?;
            if qubits[..i].contains(&q) {
                return Err(ExecError::InvalidCircuit(format!(
                    "{} uses qubit {q} more than once",
                    gate.name()
                )));
            }
        }
        self.operations.push(Operation::Gate {
            gate,
            qubits: qubits.to_vec(),
        });
        Ok(self)
    }

    pub fn x(&mut self, q: u32) -> ExecResult<&mut Self> {
        self.gate(Gate::X, &[q])
    }

    pub fn y(&mut self, q: u32) -> ExecResult<&mut Self> {
        self.gate(Gate::Y, &[q])
    }

    pub fn z(&mut self, q: u32) -> ExecResult<&mut Self> {
        self.gate(Gate::Z, &[q])
    }

    pub fn h(&mut self, q: u32) -> ExecResult<&mut Self> {
        self.gate(Gate::H, &[q])
    }

    pub fn s(&mut self, q: u32) -> ExecResult<&mut Self> {
        self.gate(Gate::S, &[q])
    }

    pub fn t(&mut self, q: u32) -> ExecResult<&mut Self> {
        self.gate(Gate::T, &[q])
    }

    pub fn cx(&mut self, control: u32, target: u32) -> ExecResult<&mut Self> {
        self.gate(Gate::CX, &[control, target])
    }

    pub fn cz(&mut self, control: u32, target: u32) -> ExecResult<&mut Self> {
        self.gate(Gate::CZ, &[control, target])
    }

    pub fn swap(&mut self, a: u32, b: u32) -> ExecResult<&mut Self> {
        self.gate(Gate::Swap, &[a, b])
    }

    pub fn ccx(&mut self, c1: u32, c2: u32, target: u32) -> ExecResult<&mut Self> {
        self.gate(Gate::CCX, &[c1, c2, target])
    }

    /// Measure `qubit` into `clbit`.
    ///
    /// The classical bit is not range-checked here; an out-of-range bit
    /// makes the circuit fail [`validate`](Self::validate) on submission.
    pub fn measure(&mut self, qubit: u32, clbit: u32) -> ExecResult<&mut Self> {
        self.check_qubit(qubit)?;
        self.operations.push(Operation::Measure { qubit, clbit });
        Ok(self)
    }

    /// Measure qubit `i` into classical bit `i` for every qubit.
    pub fn measure_all(&mut self) -> ExecResult<&mut Self> {
        for q in 0..self.num_qubits {
            self.measure(q, q)?;
        }
        Ok(self)
    }

    /// Structural problems that make the circuit unrunnable.
    pub fn problems(&self) -> Vec<String> {
        let mut reasons = Vec::new();

        let measurements = self.num_measurements();
        if measurements > self.num_clbits as usize {
            reasons.push(format!(
                "{measurements} measurements but only {} classical bits",
                self.num_clbits
            ));
        }
        for op in &self.operations {
            match op {
                Operation::Gate { gate, qubits } => {
                    if qubits.len() != gate.arity() {
                        reasons.push(format!(
                            "{} takes {} qubits, got {}",
                            gate.name(),
                            gate.arity(),
                            qubits.len()
                        ));
                    }
                    if let Some(q) = qubits.iter().find(|&&q| q >= self.num_qubits) {
                        reasons.push(format!(
                            "{} on qubit {q}, circuit has {}",
                            gate.name(),
                            self.num_qubits
                        ));
                    }
                }
                Operation::Measure { qubit, clbit } => {
                    if *qubit >= self.num_qubits {
                        reasons.push(format!(
                            "measurement of qubit {qubit}, circuit has {}",
                            self.num_qubits
                        ));
                    }
                    if *clbit >= self.num_clbits {
                        reasons.push(format!(
                            "qubit {qubit} measured into classical bit {clbit}, register has {}",
                            self.num_clbits
                        ));
                    }
                }
            }
        }
        reasons
    }

    /// Check the circuit is well formed.
    pub fn validate(&self) -> ExecResult<()> {
        let reasons = self.problems();
        if reasons.is_empty() {
            Ok(())
        } else {
            Err(ExecError::InvalidCircuit(reasons.join("; ")))
        }
    }

    fn check_qubit(&self, q: u32) -> ExecResult<()> {
        if q >= self.num_qubits {
            return Err(ExecError::InvalidCircuit(format!(
                "qubit {q} out of range for {}-qubit circuit",
                self.num_qubits
            )));
        }
        Ok(())
    }
}

impl CircuitShape for Circuit {
    fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    fn num_clbits(&self) -> u32 {
        self.num_clbits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bell_circuit() {
        let circuit = Circuit::bell().unwrap();
        assert_eq!(circuit.num_qubits(), 2);
        assert_eq!(circuit.num_clbits(), 2);
        assert_eq!(circuit.required_qubits(), 2);
        assert_eq!(circuit.num_measurements(), 2);
        assert_eq!(circuit.gate_names().collect::<Vec<_>>(), vec!["h", "cx"]);
        assert!(circuit.validate().is_ok());
    }

    #[test]
    fn test_ghz_circuit() {
        let circuit = Circuit::ghz(4).unwrap();
        assert_eq!(circuit.num_qubits(), 4);
        assert_eq!(circuit.gate_names().filter(|g| *g == "cx").count(), 3);
        assert!(Circuit::ghz(0).is_err());
    }

    #[test]
    fn test_qubit_out_of_range() {
        let mut circuit = Circuit::new(2, 2);
        assert!(matches!(circuit.h(2), Err(ExecError::InvalidCircuit(_))));
        assert!(matches!(circuit.cx(0, 0), Err(ExecError::InvalidCircuit(_))));
        assert!(circuit.operations().is_empty());
    }

    #[test]
    fn test_gate_arity_checked() {
        let mut circuit = Circuit::new(3, 0);
        assert!(circuit.gate(Gate::CCX, &[0, 1]).is_err());
        assert!(circuit.gate(Gate::CCX, &[0, 1, 2]).is_ok());
    }

    #[test]
    fn test_more_measurements_than_clbits() {
        let mut circuit = Circuit::new(3, 2);
        circuit.h(0).unwrap();
        circuit.measure_all().unwrap();

        let reasons = circuit.problems();
        assert_eq!(reasons.len(), 2);
        assert!(reasons[0].contains("3 measurements"));
        assert!(matches!(
            circuit.validate(),
            Err(ExecError::InvalidCircuit(_))
        ));
    }

    #[test]
    fn test_deserialized_circuit_is_checked() {
        let json = r#"{
            "num_qubits": 2,
            "num_clbits": 2,
            "operations": [
                {"Gate": {"gate": "CX", "qubits": [0, 5]}},
                {"Gate": {"gate": "H", "qubits": [0, 1]}},
                {"Measure": {"qubit": 0, "clbit": 0}}
            ]
        }"#;
        let circuit: Circuit = serde_json::from_str(json).unwrap();

        let reasons = circuit.problems();
        assert_eq!(reasons.len(), 2);
        assert!(reasons[0].contains("qubit 5"));
        assert!(reasons[1].contains("h takes 1 qubits"));
    }
}
