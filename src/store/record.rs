//! Fact records for the two append-only relations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A completed survey submission.
///
/// `survey_data` is the answer payload exactly as the client produced it:
/// opaque, schemaless, stored and returned byte-for-byte equivalent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResultRecord {
    survey_name: String,
    survey_language: String,
    survey_data: serde_json::Value,
    submitted_at: DateTime<Utc>,
}

impl ResultRecord {
    /// Create a new result record stamped with the current time.
    #[must_use]
    pub fn new(
        survey_name: impl Into<String>,
        survey_language: impl Into<String>,
        survey_data: serde_json::Value,
    ) -> Self {
        Self {
            survey_name: survey_name.into(),
            survey_language: survey_language.into(),
            survey_data,
            submitted_at: Utc::now(),
        }
    }

    /// Get the survey name.
    #[must_use]
    pub fn survey_name(&self) -> &str {
        &self.survey_name
    }

    /// Get the survey language.
    #[must_use]
    pub fn survey_language(&self) -> &str {
        &self.survey_language
    }

    /// Get the opaque answer payload.
    #[must_use]
    pub const fn survey_data(&self) -> &serde_json::Value {
        &self.survey_data
    }

    /// Get the submission timestamp.
    #[must_use]
    pub const fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    /// Replace the submission timestamp (deserialization from storage).
    #[must_use]
    pub const fn with_submitted_at(mut self, submitted_at: DateTime<Utc>) -> Self {
        self.submitted_at = submitted_at;
        self
    }
}

/// An exposure fact: a variant was freshly shown to a visitor.
///
/// Created exactly once per cold assignment, never per sticky repeat visit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImpressionRecord {
    survey_name: String,
    survey_language: String,
    impression_time: DateTime<Utc>,
}

impl ImpressionRecord {
    /// Create a new impression record stamped with the current time.
    ///
    /// `survey_name` is the concrete variant shown, not the experiment name.
    #[must_use]
    pub fn new(survey_name: impl Into<String>, survey_language: impl Into<String>) -> Self {
        Self {
            survey_name: survey_name.into(),
            survey_language: survey_language.into(),
            impression_time: Utc::now(),
        }
    }

    /// Get the variant survey name.
    #[must_use]
    pub fn survey_name(&self) -> &str {
        &self.survey_name
    }

    /// Get the survey language.
    #[must_use]
    pub fn survey_language(&self) -> &str {
        &self.survey_language
    }

    /// Get the impression timestamp.
    #[must_use]
    pub const fn impression_time(&self) -> DateTime<Utc> {
        self.impression_time
    }

    /// Replace the impression timestamp (deserialization from storage).
    #[must_use]
    pub const fn with_impression_time(mut self, impression_time: DateTime<Utc>) -> Self {
        self.impression_time = impression_time;
        self
    }
}
