//! Execution result types.
//!
//! Bitstring ordering: the rightmost character is classical bit 0. For a
//! circuit that measures qubit `i` into bit `i`, the string `"01"` means
//! qubit 0 measured `1` and qubit 1 measured `0`.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::job::{JobId, JobStatus};

/// Measurement counts from circuit execution.
///
/// Maps bitstrings to occurrence counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    counts: FxHashMap<String, u64>,
}

impl Counts {
    /// Create empty counts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create counts from an iterator of (bitstring, count) pairs.
    /// Duplicate bitstrings are accumulated, consistent with `insert()`.
    pub fn from_pairs(iter: impl IntoIterator<Item = (impl Into<String>, u64)>) -> Self {
        let mut counts = Self::new();
        for (k, v) in iter {
            counts.insert(k, v);
        }
        counts
    }

    /// Add `count` occurrences of a bitstring.
    pub fn insert(&mut self, bitstring: impl Into<String>, count: u64) {
        *self.counts.entry(bitstring.into()).or_default() += count;
    }

    /// Get the count for a bitstring.
    pub fn get(&self, bitstring: &str) -> u64 {
        self.counts.get(bitstring).copied().unwrap_or(0)
    }

    /// Iterate over (bitstring, count) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &u64)> {
        self.counts.iter()
    }

    /// Total number of shots recorded.
    pub fn total_shots(&self) -> u64 {
        self.counts.values().sum()
    }

    /// The most frequent bitstring.
    ///
    /// Ties go to the lexicographically smallest bitstring, so the answer
    /// does not depend on map iteration order.
    pub fn most_frequent(&self) -> Option<(&String, u64)> {
        self.counts
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(k, &v)| (k, v))
    }

    /// Probabilities for each bitstring.
    #[allow(clippy::cast_precision_loss)]
    pub fn probabilities(&self) -> FxHashMap<String, f64> {
        let total = self.total_shots() as f64;
        if total == 0.0 {
            return FxHashMap::default();
        }
        self.counts
            .iter()
            .map(|(k, &v)| (k.clone(), v as f64 / total))
            .collect()
    }

    /// Counts sorted by occurrences descending, then bitstring ascending.
    pub fn sorted(&self) -> Vec<(&String, &u64)> {
        let mut items: Vec<_> = self.counts.iter().collect();
        items.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        items
    }

    /// Number of distinct bitstrings.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Check if counts are empty.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl FromIterator<(String, u64)> for Counts {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        let mut counts = Self::new();
        for (key, value) in iter {
            counts.insert(key, value);
        }
        counts
    }
}

/// Raw result of a job, as returned by a target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Measurement counts.
    pub counts: Counts,
    /// Number of shots executed.
    pub shots: u32,
    /// Execution time reported by the target, in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<u64>,
    /// Additional metadata.
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl ExecutionResult {
    /// Create a new execution result.
    pub fn new(counts: Counts, shots: u32) -> Self {
        Self {
            counts,
            shots,
            execution_time_ms: None,
            metadata: serde_json::Value::Null,
        }
    }

    /// Set the execution time.
    pub fn with_execution_time(mut self, time_ms: u64) -> Self {
        self.execution_time_ms = Some(time_ms);
        self
    }

    /// Set metadata.
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// The most frequently observed outcome of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopOutcome {
    /// Measured bitstring.
    pub bitstring: String,
    /// Number of shots that produced it.
    pub occurrences: u64,
    /// `occurrences / shots * 100`.
    pub percent: f64,
}

impl TopOutcome {
    /// Derive the top outcome from `counts` over `shots` repetitions.
    ///
    /// Returns `None` for empty counts or zero shots.
    #[allow(clippy::cast_precision_loss)]
    pub fn from_counts(counts: &Counts, shots: u32) -> Option<Self> {
        if shots == 0 {
            return None;
        }
        counts.most_frequent().map(|(bitstring, occurrences)| Self {
            bitstring: bitstring.clone(),
            occurrences,
            percent: occurrences as f64 / f64::from(shots) * 100.0,
        })
    }
}

/// Summary of one executed request: what ran where, and what came out.
///
/// Created once per submitted request and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionSummary {
    /// Name of the target the circuit ran on.
    pub target: String,
    /// Job identifier assigned by the target.
    pub job_id: JobId,
    /// Shots requested (and executed).
    pub shots: u32,
    /// Measurement counts; the values sum to `shots`.
    pub counts: Counts,
    /// Most frequent outcome.
    pub top: Option<TopOutcome>,
    /// Final job status.
    pub status: JobStatus,
    /// Wall-clock time from submission to result.
    pub elapsed: Duration,
    /// Execution time reported by the target, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<u64>,
    /// When the result was collected.
    pub completed_at: DateTime<Utc>,
    /// Whether the simulator was substituted because no device qualified.
    #[serde(default)]
    pub degraded: bool,
}

impl ExecutionSummary {
    /// Probabilities for each bitstring.
    pub fn probabilities(&self) -> FxHashMap<String, f64> {
        self.counts.probabilities()
    }
}
