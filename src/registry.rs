//! Algorithm registry: explicit bootstrap registration by name.
//!
//! Grounded in `original_source/src/layering_detection/algorithms/registry.py`.
//! The Python registry is decorator-based, populated at import time; Rust
//! has no import-time side effects, so `bootstrap()` registers the built-in
//! algorithms explicitly at process startup instead. `get` hands back a
//! fresh instance per call, matching the source's "algorithms are
//! stateless" contract.

use std::collections::BTreeMap;

use crate::detectors::{DetectionAlgorithm, LayeringAlgorithm, WashTradingAlgorithm};
use crate::domain::SurveillanceError;

type Factory = Box<dyn Fn() -> Box<dyn DetectionAlgorithm> + Send + Sync>;

pub struct AlgorithmRegistry {
    factories: BTreeMap<&'static str, Factory>,
}

impl AlgorithmRegistry {
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Registers a factory under the name its produced instance reports.
    /// Rejects a name collision rather than overwriting the earlier entry.
    pub fn register<F>(&mut self, name: &'static str, factory: F) -> Result<(), SurveillanceError>
    where
        F: Fn() -> Box<dyn DetectionAlgorithm> + Send + Sync + 'static,
    {
        if name.is_empty() || self.factories.contains_key(name) {
            return Err(SurveillanceError::DuplicateAlgorithm { name: name.to_string() });
        }
        self.factories.insert(name, Box::new(factory));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Box<dyn DetectionAlgorithm>, SurveillanceError> {
        self.factories
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| SurveillanceError::UnknownAlgorithm { name: name.to_string() })
    }

    /// Registered names, sorted alphabetically.
    pub fn list(&self) -> Vec<String> {
        self.factories.keys().map(|k| k.to_string()).collect()
    }

    /// All registered algorithms, or only the ones named in `enabled`
    /// (sorted), if given. An unrecognized name in `enabled` is an error.
    pub fn get_all(
        &self,
        enabled: Option<&[String]>,
    ) -> Result<Vec<Box<dyn DetectionAlgorithm>>, SurveillanceError> {
        match enabled {
            None => self.list().iter().map(|name| self.get(name)).collect(),
            Some(names) => {
                let mut sorted: Vec<&String> = names.iter().collect();
                sorted.sort();
                sorted.into_iter().map(|name| self.get(name)).collect()
            }
        }
    }
}

impl Default for AlgorithmRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Registers the built-in algorithms. Called once at process startup by
/// each binary before any detection request is served.
pub fn bootstrap() -> AlgorithmRegistry {
    let mut registry = AlgorithmRegistry::new();
    registry
        .register("layering", || Box::new(LayeringAlgorithm::default()))
        .expect("built-in algorithm names are unique");
    registry
        .register("wash_trading", || Box::new(WashTradingAlgorithm::default()))
        .expect("built-in algorithm names are unique");
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_registers_both_built_ins_sorted() {
        let registry = bootstrap();
        assert_eq!(registry.list(), vec!["layering", "wash_trading"]);
    }

    #[test]
    fn duplicate_name_registration_is_rejected() {
        let mut registry = AlgorithmRegistry::new();
        registry
            .register("layering", || Box::new(LayeringAlgorithm::default()))
            .unwrap();
        let err = registry
            .register("layering", || Box::new(LayeringAlgorithm::default()))
            .unwrap_err();
        assert!(matches!(err, SurveillanceError::DuplicateAlgorithm { .. }));
    }

    #[test]
    fn unknown_name_lookup_is_rejected() {
        let registry = bootstrap();
        let err = registry.get("nonexistent").unwrap_err();
        match err {
            SurveillanceError::UnknownAlgorithm { name } => {
                assert_eq!(name, "nonexistent");
            }
            other => panic!("unexpected error variant: {other:?}"),
        }
    }

    #[test]
    fn get_all_with_enabled_filter_rejects_unknown_names() {
        let registry = bootstrap();
        let enabled = vec!["layering".to_string(), "bogus".to_string()];
        assert!(registry.get_all(Some(&enabled)).is_err());
    }

    #[test]
    fn get_all_none_returns_every_registered_name() {
        let registry = bootstrap();
        let all = registry.get_all(None).unwrap();
        let names: Vec<&'static str> = all.iter().map(|a| a.name()).collect();
        assert_eq!(names, vec!["layering", "wash_trading"]);
    }
}
