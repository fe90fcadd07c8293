//! Variant Assigner - round-robin counterbalancing cursors

use super::{Experiment, ExperimentRegistry};
use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::Mutex;

/// Round-robin variant picker, one cursor per experiment.
///
/// The cursor is the only mutable state in the system: an index into the
/// experiment's variant list, advanced modulo the variant count after every
/// pick. Each cursor is guarded by its own mutex so advancement is strictly
/// serialized per experiment while experiments never contend with each other.
///
/// [`pick_next`](Self::pick_next) is deliberately synchronous: there is no
/// suspension point between reading and advancing the cursor, so two
/// concurrent cold requests always receive distinct variants even when their
/// subsequent impression writes complete out of order.
#[derive(Debug)]
pub struct VariantAssigner {
    cursors: HashMap<String, Mutex<usize>>,
}

impl VariantAssigner {
    /// Create an assigner with a zeroed cursor for every registered
    /// experiment.
    #[must_use]
    pub fn new(registry: &ExperimentRegistry) -> Self {
        let cursors = registry
            .iter()
            .map(|experiment| (experiment.name().to_string(), Mutex::new(0)))
            .collect();
        Self { cursors }
    }

    /// Pick the next variant for `experiment` and advance its cursor.
    ///
    /// Deterministic round-robin: no randomness, no weighting. N consecutive
    /// picks cover all N variants exactly once before any repeat.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the experiment has no variants or
    /// no cursor was provisioned for it.
    pub fn pick_next(&self, experiment: &Experiment) -> Result<String> {
        let count = experiment.variant_count();
        if count == 0 {
            return Err(Error::Configuration(format!(
                "experiment {} has no variants",
                experiment.name()
            )));
        }
        let slot = self.cursors.get(experiment.name()).ok_or_else(|| {
            Error::Configuration(format!(
                "experiment {} is not registered with the assigner",
                experiment.name()
            ))
        })?;

        // A poisoned lock only means another pick panicked mid-advance; the
        // cursor value itself is always a valid index.
        let mut cursor = match slot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let variant = experiment.variants()[*cursor % count].clone();
        *cursor = (*cursor + 1) % count;
        Ok(variant)
    }

    /// Current cursor position for an experiment, if registered.
    ///
    /// Exposed so the rotation state can be asserted on in isolation.
    #[must_use]
    pub fn cursor(&self, experiment_name: &str) -> Option<usize> {
        self.cursors.get(experiment_name).map(|slot| {
            match slot.lock() {
                Ok(guard) => *guard,
                Err(poisoned) => *poisoned.into_inner(),
            }
        })
    }
}
