//! Statevector simulation engine.

use num_complex::Complex64;
use rand::Rng;
use std::f64::consts::PI;

use crate::circuit::Gate;

/// Amplitudes of an `n`-qubit state; qubit `i` is bit `i` of the index.
pub(crate) struct Statevector {
    amplitudes: Vec<Complex64>,
    num_qubits: usize,
}

impl Statevector {
    /// Create a statevector initialized to |0...0⟩.
    pub(crate) fn new(num_qubits: usize) -> Self {
        let size = 1 << num_qubits;
        let mut amplitudes = vec![Complex64::new(0.0, 0.0); size];
        amplitudes[0] = Complex64::new(1.0, 0.0);
        Self {
            amplitudes,
            num_qubits,
        }
    }

    /// Apply a gate to the given qubits (controls first).
    pub(crate) fn apply(&mut self, gate: Gate, qubits: &[u32]) {
        let q: Vec<usize> = qubits.iter().map(|&q| q as usize).collect();
        match gate {
            Gate::X => self.apply_x(q[0]),
            Gate::Y => self.apply_y(q[0]),
            Gate::Z => self.apply_phase(q[0], PI),
            Gate::H => self.apply_h(q[0]),
            Gate::S => self.apply_phase(q[0], PI / 2.0),
            Gate::T => self.apply_phase(q[0], PI / 4.0),
            Gate::CX => self.apply_mcx(&[q[0]], q[1]),
            Gate::CZ => self.apply_cz(q[0], q[1]),
            Gate::Swap => self.apply_swap(q[0], q[1]),
            Gate::CCX => self.apply_mcx(&[q[0], q[1]], q[2]),
        }
    }

    fn dim(&self) -> usize {
        1 << self.num_qubits
    }

    fn apply_x(&mut self, qubit: usize) {
        self.apply_mcx(&[], qubit);
    }

    fn apply_y(&mut self, qubit: usize) {
        let mask = 1 << qubit;
        let i_val = Complex64::new(0.0, 1.0);
        for i in 0..self.dim() {
            if i & mask == 0 {
                let j = i | mask;
                let tmp = self.amplitudes[i];
                self.amplitudes[i] = -i_val * self.amplitudes[j];
                self.amplitudes[j] = i_val * tmp;
            }
        }
    }

    fn apply_h(&mut self, qubit: usize) {
        let mask = 1 << qubit;
        let sqrt2_inv = 1.0 / 2.0_f64.sqrt();
        for i in 0..self.dim() {
            if i & mask == 0 {
                let j = i | mask;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = sqrt2_inv * (a + b);
                self.amplitudes[j] = sqrt2_inv * (a - b);
            }
        }
    }

    fn apply_phase(&mut self, qubit: usize, theta: f64) {
        let mask = 1 << qubit;
        let phase = Complex64::from_polar(1.0, theta);
        for i in 0..self.dim() {
            if i & mask != 0 {
                self.amplitudes[i] *= phase;
            }
        }
    }

    /// Multi-controlled X: flips `target` where every control is set.
    fn apply_mcx(&mut self, controls: &[usize], target: usize) {
        let ctrl_mask: usize = controls.iter().map(|&c| 1usize << c).sum();
        let tgt_mask = 1 << target;
        for i in 0..self.dim() {
            if (i & ctrl_mask == ctrl_mask) && (i & tgt_mask == 0) {
                self.amplitudes.swap(i, i | tgt_mask);
            }
        }
    }

    fn apply_cz(&mut self, control: usize, target: usize) {
        let mask = (1 << control) | (1 << target);
        for i in 0..self.dim() {
            if i & mask == mask {
                self.amplitudes[i] = -self.amplitudes[i];
            }
        }
    }

    fn apply_swap(&mut self, q1: usize, q2: usize) {
        let mask1 = 1 << q1;
        let mask2 = 1 << q2;
        for i in 0..self.dim() {
            if (i & mask1 != 0) && (i & mask2 == 0) {
                let j = (i & !mask1) | mask2;
                self.amplitudes.swap(i, j);
            }
        }
    }

    /// Cumulative outcome distribution over basis states.
    pub(crate) fn cumulative(&self) -> Vec<f64> {
        self.amplitudes
            .iter()
            .scan(0.0, |acc, amp| {
                *acc += amp.norm_sqr();
                Some(*acc)
            })
            .collect()
    }

    /// Draw one basis-state index from a cumulative distribution.
    pub(crate) fn sample<R: Rng>(cumulative: &[f64], rng: &mut R) -> usize {
        let total = cumulative.last().copied().unwrap_or(0.0);
        let r: f64 = rng.r#gen::<f64>() * total;
        cumulative
            .partition_point(|&c| c <= r)
            .min(cumulative.len().saturating_sub(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn approx_eq(a: Complex64, b: Complex64) -> bool {
        (a - b).norm() < 1e-10
    }

    #[test]
    fn test_initial_state() {
        let sv = Statevector::new(2);
        assert!(approx_eq(sv.amplitudes[0], Complex64::new(1.0, 0.0)));
        for amp in &sv.amplitudes[1..] {
            assert!(approx_eq(*amp, Complex64::new(0.0, 0.0)));
        }
    }

    #[test]
    fn test_bell_state() {
        let mut sv = Statevector::new(2);
        sv.apply(Gate::H, &[0]);
        sv.apply(Gate::CX, &[0, 1]);

        let sqrt2_inv = 1.0 / 2.0_f64.sqrt();
        assert!(approx_eq(sv.amplitudes[0], Complex64::new(sqrt2_inv, 0.0)));
        assert!(approx_eq(sv.amplitudes[1], Complex64::new(0.0, 0.0)));
        assert!(approx_eq(sv.amplitudes[2], Complex64::new(0.0, 0.0)));
        assert!(approx_eq(sv.amplitudes[3], Complex64::new(sqrt2_inv, 0.0)));
    }

    #[test]
    fn test_toffoli_needs_both_controls() {
        let mut sv = Statevector::new(3);
        sv.apply(Gate::X, &[0]);
        sv.apply(Gate::CCX, &[0, 1, 2]);
        assert!(approx_eq(sv.amplitudes[0b001], Complex64::new(1.0, 0.0)));

        sv.apply(Gate::X, &[1]);
        sv.apply(Gate::CCX, &[0, 1, 2]);
        assert!(approx_eq(sv.amplitudes[0b111], Complex64::new(1.0, 0.0)));
    }

    #[test]
    fn test_hzh_is_x() {
        let mut sv = Statevector::new(1);
        sv.apply(Gate::H, &[0]);
        sv.apply(Gate::Z, &[0]);
        sv.apply(Gate::H, &[0]);
        assert!(approx_eq(sv.amplitudes[1], Complex64::new(1.0, 0.0)));
    }

    #[test]
    fn test_swap() {
        let mut sv = Statevector::new(2);
        sv.apply(Gate::X, &[0]);
        sv.apply(Gate::Swap, &[0, 1]);
        assert!(approx_eq(sv.amplitudes[0b10], Complex64::new(1.0, 0.0)));
    }

    #[test]
    fn test_sample_deterministic() {
        let mut sv = Statevector::new(2);
        sv.apply(Gate::X, &[1]);
        let cumulative = sv.cumulative();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..100 {
            assert_eq!(Statevector::sample(&cumulative, &mut rng), 0b10);
        }
    }
}
