//! Executor configuration.
//!
//! Loaded from JSON or from `QPU_SELECT_*` environment variables; anything
//! not given keeps its default.
//!
//! | Variable | Field | Default |
//! |----------|-------|---------|
//! | `QPU_SELECT_SHOTS` | `shots` | `1024` |
//! | `QPU_SELECT_POLL_MS` | `poll_interval_ms` | `500` |
//! | `QPU_SELECT_MAX_WAIT_MS` | `max_wait_ms` | unbounded |
//! | `QPU_SELECT_PREFER_SIMULATOR` | `prefer_simulator` | `false` |

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ExecError, ExecResult};

pub const ENV_SHOTS: &str = "QPU_SELECT_SHOTS";
pub const ENV_POLL_MS: &str = "QPU_SELECT_POLL_MS";
pub const ENV_MAX_WAIT_MS: &str = "QPU_SELECT_MAX_WAIT_MS";
pub const ENV_PREFER_SIMULATOR: &str = "QPU_SELECT_PREFER_SIMULATOR";

/// Settings for [`Executor`](crate::executor::Executor).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Shots used by `run_default`.
    pub shots: u32,
    /// Delay between job status polls.
    pub poll_interval_ms: u64,
    /// Upper bound on waiting for a job; `None` waits until it finishes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_wait_ms: Option<u64>,
    /// Skip the device scan and always use the simulator.
    pub prefer_simulator: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            shots: 1024,
            poll_interval_ms: 500,
            max_wait_ms: None,
            prefer_simulator: false,
        }
    }
}

impl ExecutorConfig {
    /// Parse a JSON document; missing fields keep their defaults.
    pub fn from_json(json: &str) -> ExecResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ExecError::Configuration(format!("invalid config JSON: {e}")))?;
        config.validated()
    }

    /// Read overrides from the process environment.
    pub fn from_env() -> ExecResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read overrides through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ExecResult<Self> {
        let mut config = Self::default();
        if let Some(v) = lookup(ENV_SHOTS) {
            config.shots = parse_var(ENV_SHOTS, &v)?;
        }
        if let Some(v) = lookup(ENV_POLL_MS) {
            config.poll_interval_ms = parse_var(ENV_POLL_MS, &v)?;
        }
        if let Some(v) = lookup(ENV_MAX_WAIT_MS) {
            config.max_wait_ms = Some(parse_var(ENV_MAX_WAIT_MS, &v)?);
        }
        if let Some(v) = lookup(ENV_PREFER_SIMULATOR) {
            config.prefer_simulator = parse_flag(ENV_PREFER_SIMULATOR, &v)?;
        }
        config.validated()
    }

    /// Set the default shot count.
    pub fn with_shots(mut self, shots: u32) -> Self {
        self.shots = shots;
        self
    }

    /// Set the poll interval, at millisecond resolution and at least 1 ms.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = ceil_millis(interval);
        self
    }

    /// Bound the time spent waiting for a job.
    ///
    /// Sub-millisecond remainders round up, so a limit is never shorter
    /// than asked for.
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait_ms = Some(ceil_millis(max_wait));
        self
    }

    /// Always use the simulator.
    pub fn with_prefer_simulator(mut self, prefer: bool) -> Self {
        self.prefer_simulator = prefer;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn max_wait(&self) -> Option<Duration> {
        self.max_wait_ms.map(Duration::from_millis)
    }

    fn validated(self) -> ExecResult<Self> {
        if self.shots == 0 {
            return Err(ExecError::Configuration("shots must be at least 1".into()));
        }
        if self.poll_interval_ms == 0 {
            return Err(ExecError::Configuration(
                "poll interval must be at least 1 ms".into(),
            ));
        }
        if self.max_wait_ms == Some(0) {
            return Err(ExecError::Configuration(
                "wait limit must be at least 1 ms".into(),
            ));
        }
        Ok(self)
    }
}

fn ceil_millis(d: Duration) -> u64 {
    let millis = d.as_nanos().div_ceil(1_000_000).max(1);
    u64::try_from(millis).unwrap_or(u64::MAX)
}

fn parse_var<T: FromStr>(key: &str, value: &str) -> ExecResult<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| ExecError::Configuration(format!("{key}={value:?}: {e}")))
}

fn parse_flag(key: &str, value: &str) -> ExecResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ExecError::Configuration(format!(
            "{key}={value:?}: expected a boolean"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: FxHashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ExecutorConfig::default();
        assert_eq!(config.shots, 1024);
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.max_wait(), None);
        assert!(!config.prefer_simulator);
    }

    #[test]
    fn test_from_lookup() {
        let config = ExecutorConfig::from_lookup(lookup(&[
            (ENV_SHOTS, "2048"),
            (ENV_POLL_MS, "50"),
            (ENV_MAX_WAIT_MS, "600000"),
            (ENV_PREFER_SIMULATOR, "yes"),
        ]))
        .unwrap();

        assert_eq!(config.shots, 2048);
        assert_eq!(config.poll_interval(), Duration::from_millis(50));
        assert_eq!(config.max_wait(), Some(Duration::from_secs(600)));
        assert!(config.prefer_simulator);
    }

    #[test]
    fn test_from_lookup_rejects_garbage() {
        let err = ExecutorConfig::from_lookup(lookup(&[(ENV_SHOTS, "many")])).unwrap_err();
        assert!(matches!(err, ExecError::Configuration(_)));

        let err = ExecutorConfig::from_lookup(lookup(&[(ENV_SHOTS, "0")])).unwrap_err();
        assert!(matches!(err, ExecError::Configuration(_)));

        let err =
            ExecutorConfig::from_lookup(lookup(&[(ENV_PREFER_SIMULATOR, "maybe")])).unwrap_err();
        assert!(matches!(err, ExecError::Configuration(_)));
    }

    #[test]
    fn test_zero_intervals_rejected() {
        let err = ExecutorConfig::from_lookup(lookup(&[(ENV_POLL_MS, "0")])).unwrap_err();
        assert!(matches!(err, ExecError::Configuration(_)));

        let err = ExecutorConfig::from_json(r#"{"poll_interval_ms": 0}"#).unwrap_err();
        assert!(matches!(err, ExecError::Configuration(_)));

        let err = ExecutorConfig::from_lookup(lookup(&[(ENV_MAX_WAIT_MS, "0")])).unwrap_err();
        assert!(matches!(err, ExecError::Configuration(_)));
    }

    #[test]
    fn test_sub_second_limits_keep_precision() {
        let config = ExecutorConfig::default()
            .with_max_wait(Duration::from_millis(500))
            .with_poll_interval(Duration::from_micros(1500));
        assert_eq!(config.max_wait(), Some(Duration::from_millis(500)));
        assert_eq!(config.poll_interval(), Duration::from_millis(2));

        let config = ExecutorConfig::default()
            .with_max_wait(Duration::from_micros(10))
            .with_poll_interval(Duration::ZERO);
        assert_eq!(config.max_wait(), Some(Duration::from_millis(1)));
        assert_eq!(config.poll_interval(), Duration::from_millis(1));
    }

    #[test]
    fn test_from_json_partial() {
        let config = ExecutorConfig::from_json(r#"{"shots": 100}"#).unwrap();
        assert_eq!(config.shots, 100);
        assert_eq!(config.poll_interval_ms, 500);

        assert!(ExecutorConfig::from_json("{").is_err());
    }
}
