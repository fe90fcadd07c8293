//! Route handlers

use super::AppState;
use crate::experiment::STICKY_TTL;
use crate::schema;
use crate::store::{ResultRecord, SurveyStore};
use crate::Error;
use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

fn message_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

/// Liveness probe.
pub(crate) async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "healthy", "service": "survey-rotor" }))
}

/// `GET /:experiment` — assignment with the default language.
pub(crate) async fn assign_default_language_handler<S: SurveyStore>(
    State(state): State<AppState<S>>,
    Path(experiment): Path<String>,
    jar: CookieJar,
) -> Response {
    assign(&state, &experiment, None, &jar).await
}

/// `GET /:experiment/:lang` — assignment with an explicit language.
pub(crate) async fn assign_handler<S: SurveyStore>(
    State(state): State<AppState<S>>,
    Path((experiment, language)): Path<(String, String)>,
    jar: CookieJar,
) -> Response {
    assign(&state, &experiment, Some(&language), &jar).await
}

async fn assign<S: SurveyStore>(
    state: &AppState<S>,
    experiment_name: &str,
    language: Option<&str>,
    jar: &CookieJar,
) -> Response {
    let Some(experiment) = state.session.registry().get(experiment_name) else {
        // The dynamic routes shadow the static tree; anything that is not a
        // registered experiment is an asset request.
        let rel = match language {
            Some(language) => format!("{experiment_name}/{language}"),
            None => experiment_name.to_string(),
        };
        return serve_static(state, &rel).await;
    };
    let language = language.unwrap_or("en");
    if !schema::is_valid_language(language) {
        return message_response(StatusCode::NOT_FOUND, "Not found");
    }

    let cookie_name = experiment.cookie_name(language);
    let sticky = jar.get(&cookie_name).map(|c| c.value().to_string());

    let resolution = match state
        .session
        .resolve(experiment_name, language, sticky.as_deref())
        .await
    {
        Ok(resolution) => resolution,
        Err(Error::NotFound(_)) => {
            return message_response(StatusCode::NOT_FOUND, "Not found");
        }
        Err(err) => {
            error!(experiment = experiment_name, "assignment failed: {err}");
            return message_response(StatusCode::INTERNAL_SERVER_ERROR, "Assignment failed");
        }
    };

    let target = format!("/survey/{}/{language}", resolution.variant());
    let mut response = StatusCode::FOUND.into_response();
    if let Ok(value) = HeaderValue::from_str(&target) {
        response.headers_mut().insert(header::LOCATION, value);
    }
    if resolution.is_fresh() {
        info!(
            experiment = experiment_name,
            variant = resolution.variant(),
            language,
            "assigned fresh variant"
        );
        let cookie = format!(
            "{cookie_name}={}; Max-Age={}; Path=/; HttpOnly",
            resolution.variant(),
            STICKY_TTL.as_secs()
        );
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    response
}

/// `GET /survey/:survey/:lang` — the generic survey page.
///
/// The page shell fetches the schema through the API and renders it with the
/// client-side widget; the path segments are consumed by the widget, not
/// here.
pub(crate) async fn survey_page_handler<S: SurveyStore>(
    State(state): State<AppState<S>>,
) -> Response {
    serve_static(&state, "index.html").await
}

/// `GET /api/surveys/:survey/:lang` — the schema document.
pub(crate) async fn get_schema_handler<S: SurveyStore>(
    State(state): State<AppState<S>>,
    Path((survey, language)): Path<(String, String)>,
) -> Response {
    match state.schemas.load(&survey, &language).await {
        Ok(document) => Json(document).into_response(),
        Err(Error::NotFound(_)) => message_response(StatusCode::NOT_FOUND, "Survey not found"),
        Err(err) => {
            error!(survey = %survey, language = %language, "schema load failed: {err}");
            message_response(StatusCode::INTERNAL_SERVER_ERROR, "Error loading survey")
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SaveSurveyRequest {
    survey_name: String,
    survey_language: String,
    survey_data: serde_json::Value,
}

/// `POST /api/save-survey` — persist one completed submission.
///
/// Unlike impression logging, a storage failure here always surfaces to the
/// client.
pub(crate) async fn save_survey_handler<S: SurveyStore>(
    State(state): State<AppState<S>>,
    Json(body): Json<SaveSurveyRequest>,
) -> Response {
    let record = ResultRecord::new(body.survey_name, body.survey_language, body.survey_data);
    match state.store.append_result(record).await {
        Ok(id) => {
            info!(%id, "survey result saved");
            message_response(StatusCode::CREATED, "Survey saved successfully!")
        }
        Err(err) => {
            error!("failed to save survey result: {err}");
            message_response(StatusCode::INTERNAL_SERVER_ERROR, "Error saving survey data.")
        }
    }
}

/// Fallback: static assets under the public root.
pub(crate) async fn static_asset_handler<S: SurveyStore>(
    State(state): State<AppState<S>>,
    uri: Uri,
) -> Response {
    let rel = uri.path().trim_start_matches('/');
    let rel = if rel.is_empty() { "index.html" } else { rel };
    serve_static(&state, rel).await
}

async fn serve_static<S>(state: &AppState<S>, rel: &str) -> Response {
    use std::path::Component;

    let relative = std::path::Path::new(rel);
    if !relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
    {
        return message_response(StatusCode::NOT_FOUND, "Not found");
    }

    let path = state.public_root.join(relative);
    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            let mut response = bytes.into_response();
            response.headers_mut().insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static(content_type_for(rel)),
            );
            response
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            message_response(StatusCode::NOT_FOUND, "Not found")
        }
        Err(err) => {
            error!(asset = rel, "static read failed: {err}");
            message_response(StatusCode::INTERNAL_SERVER_ERROR, "Asset unavailable")
        }
    }
}

fn content_type_for(rel: &str) -> &'static str {
    match std::path::Path::new(rel)
        .extension()
        .and_then(|ext| ext.to_str())
    {
        Some("html") => "text/html; charset=utf-8",
        Some("js") => "text/javascript",
        Some("css") => "text/css",
        Some("json") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("ico") => "image/x-icon",
        _ => "application/octet-stream",
    }
}
