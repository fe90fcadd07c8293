//! # Survey-Rotor: Counterbalanced Survey Assignment Server
//!
//! Survey-rotor assigns incoming visitors to one of the variants of a survey
//! experiment in strict round-robin order, keeps the assignment sticky via a
//! browser cookie, records one impression per fresh assignment, serves the
//! survey definition (a declarative JSON schema), and stores submitted
//! answers as opaque payloads.
//!
//! ## Design
//!
//! - **Fair rotation**: one mutex-guarded cursor per experiment; the pick is
//!   synchronous, so concurrent cold requests always receive distinct
//!   variants before any repeat.
//! - **Sticky sessions**: the cookie is client-held state, validated against
//!   the experiment's known variant set on every read.
//! - **Best-effort exposure logging**: an impression-write failure never
//!   blocks the visitor's redirect; a result-save failure always surfaces.
//!
//! ## Example
//!
//! ```rust
//! use survey_rotor::experiment::{AssignmentSession, ExperimentRegistry, VariantAssigner};
//! use survey_rotor::store::MemoryStore;
//!
//! # async fn example() -> survey_rotor::Result<()> {
//! let registry = ExperimentRegistry::builtin()?;
//! let assigner = VariantAssigner::new(&registry);
//! let store = MemoryStore::new();
//! let session = AssignmentSession::new(registry, assigner, store);
//!
//! // Cold path: no cookie yet, a fresh variant is picked and logged.
//! let resolution = session.resolve("feedback", "en", None).await?;
//! assert!(resolution.is_fresh());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod experiment;
pub mod http;
pub mod schema;
pub mod store;

pub use error::{Error, Result};
