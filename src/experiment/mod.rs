//! Experiment registry and the counterbalancing engine
//!
//! An [`Experiment`] is a named, immutable group of interchangeable survey
//! variants. The deployment set is compiled-in configuration, loaded through
//! [`ExperimentRegistry::builtin`]; nothing here is runtime-configurable.
//!
//! ```text
//! ExperimentRegistry (1) ──< Experiment (N) ──< variant name (M, ordered)
//! ```
//!
//! The rotation state lives in [`VariantAssigner`], one cursor per
//! experiment; [`AssignmentSession`] layers cookie-backed stickiness and
//! impression logging on top.

mod assigner;
mod session;

pub use assigner::VariantAssigner;
pub use session::{AssignmentSession, Resolution, STICKY_TTL};

use crate::{Error, Result};
use serde::Serialize;
use std::collections::HashMap;

/// A named group of survey variants subject to round-robin assignment.
///
/// Immutable at runtime. The variant list is ordered and non-empty; the
/// deployment ships exactly two variants per experiment, but any N >= 1 is
/// honored.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Experiment {
    name: String,
    cookie_base: String,
    variants: Vec<String>,
}

impl Experiment {
    /// Create a new experiment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if `variants` is empty.
    pub fn new(
        name: impl Into<String>,
        cookie_base: impl Into<String>,
        variants: Vec<String>,
    ) -> Result<Self> {
        let name = name.into();
        if variants.is_empty() {
            return Err(Error::Configuration(format!(
                "experiment {name} has no variants"
            )));
        }
        Ok(Self {
            name,
            cookie_base: cookie_base.into(),
            variants,
        })
    }

    /// Get the experiment name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the ordered variant list.
    #[must_use]
    pub fn variants(&self) -> &[String] {
        &self.variants
    }

    /// Number of variants in the rotation.
    #[must_use]
    pub fn variant_count(&self) -> usize {
        self.variants.len()
    }

    /// Whether `candidate` names a variant of this experiment.
    ///
    /// Sticky tokens are untrusted client input; this is the validation gate
    /// they must pass before being honored.
    #[must_use]
    pub fn contains_variant(&self, candidate: &str) -> bool {
        self.variants.iter().any(|v| v == candidate)
    }

    /// Cookie name for a sticky assignment in `language`.
    #[must_use]
    pub fn cookie_name(&self, language: &str) -> String {
        format!("{}-{language}", self.cookie_base)
    }
}

/// Immutable lookup of the deployed experiments, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct ExperimentRegistry {
    experiments: HashMap<String, Experiment>,
}

impl ExperimentRegistry {
    /// Build a registry from an explicit experiment list.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] on duplicate experiment names.
    pub fn new(experiments: Vec<Experiment>) -> Result<Self> {
        let mut map = HashMap::with_capacity(experiments.len());
        for experiment in experiments {
            let name = experiment.name().to_string();
            if map.insert(name.clone(), experiment).is_some() {
                return Err(Error::Configuration(format!(
                    "duplicate experiment {name}"
                )));
            }
        }
        Ok(Self { experiments: map })
    }

    /// The compiled-in deployment set: three experiments, two variants each.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the built-in table is invalid;
    /// startup must treat this as fatal.
    pub fn builtin() -> Result<Self> {
        Self::new(vec![
            Experiment::new(
                "feedback",
                "feedbackAssignment",
                vec![
                    "customer-feedback-a".to_string(),
                    "customer-feedback-b".to_string(),
                ],
            )?,
            Experiment::new(
                "poll",
                "pollAssignment",
                vec![
                    "new-feature-poll-a".to_string(),
                    "new-feature-poll-b".to_string(),
                ],
            )?,
            Experiment::new(
                "employee",
                "employeeSurveyAssignment",
                vec![
                    "employee-satisfaction-a".to_string(),
                    "employee-satisfaction-b".to_string(),
                ],
            )?,
        ])
    }

    /// Look up an experiment by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Experiment> {
        self.experiments.get(name)
    }

    /// Iterate over the registered experiments (unordered).
    pub fn iter(&self) -> impl Iterator<Item = &Experiment> {
        self.experiments.values()
    }

    /// Number of registered experiments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.experiments.len()
    }

    /// Check if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.experiments.is_empty()
    }
}
