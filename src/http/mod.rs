//! HTTP boundary: routes, shared state, handlers
//!
//! Thin layer over the core. Routing:
//!
//! ```text
//! GET  /health                          liveness probe
//! GET  /survey/:survey/:lang            generic survey page (external widget)
//! GET  /api/surveys/:survey/:lang       schema document, or 404
//! POST /api/save-survey                 persist a submission
//! GET  /:experiment[/:lang]             assign + redirect, sticky cookie
//! *                                     static assets under the public root
//! ```
//!
//! The two dynamic assignment routes shadow single-segment static paths;
//! unknown experiment names fall through to the static assets, so the
//! dynamic routes behave like the explicitly registered handlers they
//! replace.

pub mod handlers;

use crate::experiment::AssignmentSession;
use crate::schema::SchemaStore;
use crate::store::SurveyStore;
use axum::routing::{get, post};
use axum::Router;
use std::path::PathBuf;
use std::sync::Arc;

/// Shared state handed to every handler.
#[derive(Debug)]
pub struct AppState<S> {
    session: AssignmentSession<S>,
    store: Arc<S>,
    schemas: Arc<SchemaStore>,
    public_root: Arc<PathBuf>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            session: self.session.clone(),
            store: Arc::clone(&self.store),
            schemas: Arc::clone(&self.schemas),
            public_root: Arc::clone(&self.public_root),
        }
    }
}

impl<S: SurveyStore> AppState<S> {
    /// Assemble the state from the core components.
    ///
    /// `store` is the same store the session appends impressions to; the
    /// save-survey handler uses it for result appends.
    pub fn new(
        session: AssignmentSession<S>,
        store: Arc<S>,
        schemas: SchemaStore,
        public_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            session,
            store,
            schemas: Arc::new(schemas),
            public_root: Arc::new(public_root.into()),
        }
    }
}

/// Build the application router over `state`.
pub fn build_router<S: SurveyStore + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/survey/:survey/:lang", get(handlers::survey_page_handler::<S>))
        .route("/api/surveys/:survey/:lang", get(handlers::get_schema_handler::<S>))
        .route("/api/save-survey", post(handlers::save_survey_handler::<S>))
        .route("/:experiment", get(handlers::assign_default_language_handler::<S>))
        .route("/:experiment/:lang", get(handlers::assign_handler::<S>))
        .fallback(handlers::static_asset_handler::<S>)
        .with_state(state)
}
