//! Schema Store - survey definition lookup by (survey, language)
//!
//! Survey schemas are declarative JSON documents authored and deployed out of
//! band, one file per (survey name, language) pair under a root directory:
//!
//! ```text
//! <root>/<survey_name>/<language>.json
//! ```
//!
//! The store only reads. Every call is a fresh lookup; there is no cache.

use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Directory-backed lookup of survey schema documents.
#[derive(Debug, Clone)]
pub struct SchemaStore {
    root: PathBuf,
}

impl SchemaStore {
    /// Create a store rooted at `root`.
    #[must_use]
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// Root directory the documents are read from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load the schema for `(survey_name, language)`.
    ///
    /// Both key segments are validated before the filesystem is touched, so
    /// a hostile key can never escape the root. The not-found signal names
    /// only the composite key, never an internal path.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] when the pair is unknown (or the key is not a
    /// well-formed identifier); [`Error::Storage`] when the document exists
    /// but is not valid JSON; [`Error::Io`] on other read failures.
    pub async fn load(&self, survey_name: &str, language: &str) -> Result<serde_json::Value> {
        if !is_valid_survey_name(survey_name) || !is_valid_language(language) {
            return Err(Error::survey_not_found(survey_name, language));
        }

        let path = self.root.join(survey_name).join(format!("{language}.json"));
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::survey_not_found(survey_name, language));
            }
            Err(err) => return Err(Error::Io(err)),
        };

        serde_json::from_slice(&bytes).map_err(|e| {
            Error::Storage(format!(
                "survey document {survey_name}/{language} is not valid JSON: {e}"
            ))
        })
    }
}

/// Survey names are lowercase alphanumeric segments joined by hyphens.
fn is_valid_survey_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('-')
        && !name.ends_with('-')
        && name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

/// Languages are exactly two lowercase ASCII letters.
pub(crate) fn is_valid_language(language: &str) -> bool {
    language.len() == 2 && language.bytes().all(|b| b.is_ascii_lowercase())
}
