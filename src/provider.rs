//! Target enumeration.
//!
//! A [`TargetProvider`] answers two questions for the selector: which
//! targets exist right now, and which one is the simulator to fall back on.
//! [`TargetCatalog`] is the in-memory implementation: a fixed list of
//! targets registered up front.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{ExecError, ExecResult};
use crate::target::Target;

/// Shared handle to a target.
pub type SharedTarget<C> = Arc<dyn Target<C>>;

/// Source of execution targets.
#[async_trait]
pub trait TargetProvider<C>: Send + Sync {
    /// The simulator used when one is requested or no device qualifies.
    fn simulator(&self) -> SharedTarget<C>;

    /// Enumerate the known targets, in a stable order.
    ///
    /// The list may include the simulator; the selector filters simulators
    /// out of the device scan itself.
    async fn targets(&self) -> ExecResult<Vec<SharedTarget<C>>>;
}

/// Fixed, in-memory set of targets.
pub struct TargetCatalog<C> {
    simulator: SharedTarget<C>,
    targets: Vec<SharedTarget<C>>,
}

impl<C> TargetCatalog<C> {
    /// Create a catalog with only a simulator.
    pub fn new(simulator: SharedTarget<C>) -> Self {
        Self {
            simulator,
            targets: Vec::new(),
        }
    }

    /// Register a target (builder form).
    pub fn with_target(mut self, target: SharedTarget<C>) -> Self {
        self.add_target(target);
        self
    }

    /// Register a target. Enumeration order is registration order.
    pub fn add_target(&mut self, target: SharedTarget<C>) {
        debug!("Registering target: {}", target.name());
        self.targets.push(target);
    }

    /// Look up a target by name, including the simulator.
    pub fn get(&self, name: &str) -> ExecResult<SharedTarget<C>> {
        if self.simulator.name() == name {
            return Ok(Arc::clone(&self.simulator));
        }
        self.targets
            .iter()
            .find(|t| t.name() == name)
            .cloned()
            .ok_or_else(|| ExecError::TargetNotFound(name.to_string()))
    }

    /// Names of all registered targets, simulator first.
    pub fn names(&self) -> Vec<String> {
        std::iter::once(&self.simulator)
            .chain(&self.targets)
            .map(|t| t.name().to_string())
            .collect()
    }

    /// Number of registered targets, excluding the simulator.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Whether no targets besides the simulator are registered.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

#[async_trait]
impl<C> TargetProvider<C> for TargetCatalog<C> {
    fn simulator(&self) -> SharedTarget<C> {
        Arc::clone(&self.simulator)
    }

    async fn targets(&self) -> ExecResult<Vec<SharedTarget<C>>> {
        Ok(self.targets.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::Circuit;
    use crate::simulator::LocalSimulator;

    fn catalog() -> TargetCatalog<Circuit> {
        TargetCatalog::<Circuit>::new(Arc::new(LocalSimulator::new()))
            .with_target(Arc::new(LocalSimulator::named("aer_a")))
            .with_target(Arc::new(LocalSimulator::named("aer_b")))
    }

    #[test]
    fn test_catalog_lookup() {
        let catalog = catalog();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("aer_b").unwrap().name(), "aer_b");
        assert_eq!(catalog.get("qasm_simulator").unwrap().name(), "qasm_simulator");
        assert!(matches!(
            catalog.get("ibmq_lima"),
            Err(ExecError::TargetNotFound(_))
        ));
    }

    #[test]
    fn test_catalog_names() {
        assert_eq!(
            catalog().names(),
            vec!["qasm_simulator", "aer_a", "aer_b"]
        );
    }

    #[tokio::test]
    async fn test_enumeration_keeps_registration_order() {
        let catalog = catalog();
        let names: Vec<_> = catalog
            .targets()
            .await
            .unwrap()
            .iter()
            .map(|t| t.name().to_string())
            .collect();
        assert_eq!(names, vec!["aer_a", "aer_b"]);
        assert_eq!(catalog.simulator().name(), "qasm_simulator");
    }
}
