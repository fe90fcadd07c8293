//! Assignment Session - cookie-backed stickiness over the assigner

use super::{ExperimentRegistry, VariantAssigner};
use crate::store::{ImpressionRecord, SurveyStore};
use crate::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Lifetime of a sticky assignment cookie.
pub const STICKY_TTL: Duration = Duration::from_millis(900_000);

/// Outcome of resolving an incoming request against the sticky state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The incoming token named a known variant; replayed verbatim with no
    /// side effects.
    Sticky {
        /// The variant the visitor was previously assigned.
        variant: String,
    },
    /// A fresh pick: the caller must set a sticky cookie bound to this
    /// variant with [`STICKY_TTL`].
    Fresh {
        /// The newly assigned variant.
        variant: String,
    },
}

impl Resolution {
    /// The resolved variant, however it was obtained.
    #[must_use]
    pub fn variant(&self) -> &str {
        match self {
            Self::Sticky { variant } | Self::Fresh { variant } => variant,
        }
    }

    /// Whether this resolution came from a fresh pick (cold path).
    #[must_use]
    pub const fn is_fresh(&self) -> bool {
        matches!(self, Self::Fresh { .. })
    }

    /// Whether this resolution replayed a sticky token (warm path).
    #[must_use]
    pub const fn is_sticky(&self) -> bool {
        matches!(self, Self::Sticky { .. })
    }
}

/// Resolves requests to variants: sticky replay when possible, otherwise a
/// fresh round-robin pick plus one impression record.
///
/// The sticky token is client-held, untrusted input. It is honored only when
/// it names a variant of the requested experiment; anything else (absent,
/// malformed, unknown variant) takes the cold path.
///
/// The impression append is best-effort: the cursor has already advanced by
/// the time the write suspends, and a write failure is logged without
/// failing the resolution. The affected variant is under-counted for that
/// round; measurement completeness is traded for availability.
#[derive(Debug)]
pub struct AssignmentSession<S> {
    registry: Arc<ExperimentRegistry>,
    assigner: Arc<VariantAssigner>,
    store: Arc<S>,
}

impl<S> Clone for AssignmentSession<S> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            assigner: Arc::clone(&self.assigner),
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: SurveyStore> AssignmentSession<S> {
    /// Create a session over a registry, its assigner, and an impression
    /// sink.
    pub fn new(
        registry: impl Into<Arc<ExperimentRegistry>>,
        assigner: impl Into<Arc<VariantAssigner>>,
        store: impl Into<Arc<S>>,
    ) -> Self {
        Self {
            registry: registry.into(),
            assigner: assigner.into(),
            store: store.into(),
        }
    }

    /// The registry this session resolves against.
    #[must_use]
    pub fn registry(&self) -> &ExperimentRegistry {
        &self.registry
    }

    /// Resolve one incoming request.
    ///
    /// Warm path: a sticky token naming a known variant is returned
    /// unchanged; no cursor advance, no impression. Cold path: the assigner
    /// picks the next variant, one impression is appended (best-effort), and
    /// the caller is instructed to set a new sticky token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown experiment and
    /// [`Error::Configuration`] if the experiment cannot be served.
    pub async fn resolve(
        &self,
        experiment_name: &str,
        language: &str,
        sticky: Option<&str>,
    ) -> Result<Resolution> {
        let experiment = self
            .registry
            .get(experiment_name)
            .ok_or_else(|| Error::NotFound(format!("experiment {experiment_name}")))?;

        if let Some(token) = sticky {
            if experiment.contains_variant(token) {
                return Ok(Resolution::Sticky {
                    variant: token.to_string(),
                });
            }
        }

        // Synchronous pick: the cursor advances before anything awaits.
        let variant = self.assigner.pick_next(experiment)?;

        if let Err(err) = self
            .store
            .append_impression(ImpressionRecord::new(&variant, language))
            .await
        {
            warn!(
                experiment = experiment_name,
                variant = %variant,
                language,
                "impression write failed: {err}"
            );
        }

        Ok(Resolution::Fresh { variant })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::Experiment;
    use crate::store::{MemoryStore, RecordId, ResultRecord};

    fn session_with(store: MemoryStore) -> AssignmentSession<MemoryStore> {
        let registry = ExperimentRegistry::builtin().unwrap();
        let assigner = VariantAssigner::new(&registry);
        AssignmentSession::new(registry, assigner, store)
    }

    #[tokio::test]
    async fn test_cold_path_assigns_and_logs() {
        let session = session_with(MemoryStore::new());

        let first = session.resolve("feedback", "en", None).await.unwrap();
        assert!(first.is_fresh());
        assert_eq!(first.variant(), "customer-feedback-a");

        let second = session.resolve("feedback", "en", None).await.unwrap();
        assert_eq!(second.variant(), "customer-feedback-b");
    }

    #[tokio::test]
    async fn test_warm_path_replays_without_side_effects() {
        let store = Arc::new(MemoryStore::new());
        let registry = ExperimentRegistry::builtin().unwrap();
        let assigner = VariantAssigner::new(&registry);
        let session = AssignmentSession::<MemoryStore>::new(registry, assigner, Arc::clone(&store));

        let resolution = session
            .resolve("feedback", "en", Some("customer-feedback-b"))
            .await
            .unwrap();

        assert!(resolution.is_sticky());
        assert_eq!(resolution.variant(), "customer-feedback-b");
        assert_eq!(store.impression_count(), 0);
        // The cursor never moved: the next cold pick starts at the front.
        let cold = session.resolve("feedback", "en", None).await.unwrap();
        assert_eq!(cold.variant(), "customer-feedback-a");
    }

    #[tokio::test]
    async fn test_unknown_variant_token_takes_cold_path() {
        let store = Arc::new(MemoryStore::new());
        let registry = ExperimentRegistry::builtin().unwrap();
        let assigner = VariantAssigner::new(&registry);
        let session = AssignmentSession::<MemoryStore>::new(registry, assigner, Arc::clone(&store));

        let resolution = session
            .resolve("feedback", "en", Some("employee-satisfaction-a"))
            .await
            .unwrap();

        assert!(resolution.is_fresh());
        assert_eq!(resolution.variant(), "customer-feedback-a");
        assert_eq!(store.impression_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_experiment_is_not_found() {
        let session = session_with(MemoryStore::new());

        let result = session.resolve("pricing", "en", None).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_impression_counts_cold_vs_warm() {
        let store = Arc::new(MemoryStore::new());
        let registry = ExperimentRegistry::builtin().unwrap();
        let assigner = VariantAssigner::new(&registry);
        let session = AssignmentSession::<MemoryStore>::new(registry, assigner, Arc::clone(&store));

        // 4 cold requests, then 3 warm replays of the first assignment.
        for _ in 0..4 {
            session.resolve("poll", "en", None).await.unwrap();
        }
        for _ in 0..3 {
            session
                .resolve("poll", "en", Some("new-feature-poll-a"))
                .await
                .unwrap();
        }

        assert_eq!(store.impression_count(), 4);
        assert_eq!(store.impressions_for("new-feature-poll-a"), 2);
        assert_eq!(store.impressions_for("new-feature-poll-b"), 2);
    }

    /// Store whose impression sink always fails.
    #[derive(Debug, Default)]
    struct BrokenImpressionStore;

    impl SurveyStore for BrokenImpressionStore {
        async fn append_result(&self, _record: ResultRecord) -> Result<RecordId> {
            Ok(RecordId::new(1))
        }

        async fn append_impression(&self, _record: ImpressionRecord) -> Result<RecordId> {
            Err(Error::Storage("disk full".to_string()))
        }
    }

    #[tokio::test]
    async fn test_impression_failure_does_not_fail_resolution() {
        let registry = ExperimentRegistry::builtin().unwrap();
        let assigner = VariantAssigner::new(&registry);
        let session = AssignmentSession::new(registry, assigner, BrokenImpressionStore);

        // The visitor still gets a variant; only the measurement is lost.
        let first = session.resolve("feedback", "en", None).await.unwrap();
        assert_eq!(first.variant(), "customer-feedback-a");

        // And the cursor advanced despite the failed write.
        let second = session.resolve("feedback", "en", None).await.unwrap();
        assert_eq!(second.variant(), "customer-feedback-b");
    }

    #[tokio::test]
    async fn test_single_variant_experiment_always_resolves_to_it() {
        let experiment =
            Experiment::new("solo", "soloAssignment", vec!["only".to_string()]).unwrap();
        let registry = ExperimentRegistry::new(vec![experiment]).unwrap();
        let assigner = VariantAssigner::new(&registry);
        let session = AssignmentSession::new(registry, assigner, MemoryStore::new());

        let resolution = session.resolve("solo", "en", None).await.unwrap();
        assert_eq!(resolution.variant(), "only");
    }
}
