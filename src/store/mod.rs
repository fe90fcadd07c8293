//! Append-only persistence for survey submissions and impressions
//!
//! Two relations, two contracts, one trait: completed submissions
//! ([`ResultRecord`]) and exposure facts ([`ImpressionRecord`]) are only ever
//! appended. No update or delete operations exist, and failures are reported
//! to the caller rather than retried here.
//!
//! # Example
//!
//! ```rust
//! use survey_rotor::store::{ImpressionRecord, MemoryStore, SurveyStore};
//!
//! # async fn example() -> survey_rotor::Result<()> {
//! let store = MemoryStore::new();
//! let id = store
//!     .append_impression(ImpressionRecord::new("customer-feedback-a", "en"))
//!     .await?;
//! assert_eq!(id.value(), 1);
//! # Ok(())
//! # }
//! ```

mod memory;
mod record;
mod sqlite;

pub use memory::MemoryStore;
pub use record::{ImpressionRecord, ResultRecord};
pub use sqlite::SqliteStore;

use crate::Result;
use serde::Serialize;
use std::future::Future;

/// Identifier auto-assigned to an appended record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RecordId(u64);

impl RecordId {
    /// Wrap a backend-assigned identifier.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the numeric identifier.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Append-only store for survey results and impressions.
///
/// The two append operations carry different failure contracts at the call
/// site: a result append failure must propagate to the submitting client,
/// while an impression append is best-effort (see
/// [`AssignmentSession`](crate::experiment::AssignmentSession)). The store
/// itself treats both identically — append, assign an id, report errors.
pub trait SurveyStore: Send + Sync {
    /// Append one completed submission.
    ///
    /// The payload is stored as-is; it is never validated against the
    /// originating schema.
    fn append_result(&self, record: ResultRecord)
        -> impl Future<Output = Result<RecordId>> + Send;

    /// Append one exposure fact.
    fn append_impression(
        &self,
        record: ImpressionRecord,
    ) -> impl Future<Output = Result<RecordId>> + Send;
}
