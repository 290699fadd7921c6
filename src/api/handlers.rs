//! HTTP API handlers.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use serde_json::Value;

use crate::error::{ApiError, ErrorBody};
use crate::logging::{self, LogLevel};
use crate::metrics::CONTENT_TYPE_LATEST;
use crate::person::{Person, PersonRepository, UpsertOutcome};

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Person storage.
    pub repo: PersonRepository,
    /// Prometheus recorder handle used by `/metrics`.
    pub metrics: PrometheusHandle,
}

impl AppState {
    /// Create new app state.
    pub fn new(repo: PersonRepository, metrics: PrometheusHandle) -> Self {
        Self { repo, metrics }
    }

    /// Run a repository call on the blocking pool.
    async fn with_repo<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&PersonRepository) -> rusqlite::Result<T> + Send + 'static,
    {
        let repo = self.repo.clone();
        Ok(tokio::task::spawn_blocking(move || f(&repo)).await??)
    }
}

/// Success body: `{"success": "..."}`.
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    /// Human-readable outcome.
    pub success: &'static str,
}

/// Log server-side failures with the request path before they become responses.
fn log_failure(path: &str, err: ApiError) -> ApiError {
    if err.status().is_server_error() {
        logging::emit(LogLevel::Error, &format!("{path}: {err}"));
    }
    err
}

/// Root handler - static service description.
pub async fn home() -> &'static str {
    logging::emit(LogLevel::Info, "/");
    "API de pessoas"
}

/// Metrics handler - Prometheus text exposition.
pub async fn metrics_scrape(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, CONTENT_TYPE_LATEST)],
        state.metrics.render(),
    )
}

/// List handler - every stored person.
pub async fn list_people(State(state): State<AppState>) -> Result<Json<Vec<Person>>, ApiError> {
    let path = "/pessoas";
    logging::emit(LogLevel::Info, path);

    let people = state
        .with_repo(|repo| repo.list_all())
        .await
        .map_err(|e| log_failure(path, e))?;
    Ok(Json(people))
}

/// Get handler - rows matching the CPF, 404 when there are none.
pub async fn get_person(
    State(state): State<AppState>,
    Path(cpf): Path<String>,
) -> Result<Json<Vec<Person>>, ApiError> {
    let path = format!("/pessoa/{cpf}");
    logging::emit(LogLevel::Info, &path);

    let people = state
        .with_repo(move |repo| repo.find_by_national_id(&cpf))
        .await
        .map_err(|e| log_failure(&path, e))?;

    if people.is_empty() {
        return Err(ApiError::NotFound);
    }
    Ok(Json(people))
}

/// Delete handler - removes rows matching the CPF, 404 when there are none.
pub async fn delete_person(
    State(state): State<AppState>,
    Path(cpf): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let path = format!("/pessoa/{cpf}");
    logging::emit(LogLevel::Info, &path);

    let deleted = state
        .with_repo(move |repo| repo.delete_by_national_id(&cpf))
        .await
        .map_err(|e| log_failure(&path, e))?;

    if deleted == 0 {
        return Err(ApiError::NotFound);
    }
    Ok(Json(SuccessResponse {
        success: "Pessoa deletada com sucesso",
    }))
}

/// Fallback for paths no route matches.
pub async fn unmatched() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            error: "Not Found".to_string(),
        }),
    )
}

/// Decode an upsert body. Anything but a JSON object is malformed.
fn parse_person(body: &[u8]) -> Result<Person, ApiError> {
    match serde_json::from_slice::<Value>(body)? {
        Value::Object(fields) => {
            Person::from_json_object(&fields).map_err(ApiError::MalformedInput)
        }
        _ => Err(ApiError::MalformedInput(
            "request body must be a JSON object".to_string(),
        )),
    }
}

/// Upsert handler - 201 when a row is inserted, 200 when one is updated.
///
/// The body is parsed as JSON whatever its content type; absent fields are
/// stored as NULL and scalar values as text.
pub async fn upsert_person(State(state): State<AppState>, body: Bytes) -> Response {
    let path = "/pessoa POST";
    logging::emit(LogLevel::Info, path);

    let person = match parse_person(&body) {
        Ok(person) => person,
        Err(e) => return e.into_response(),
    };

    let outcome = match state.with_repo(move |repo| repo.upsert(&person)).await {
        Ok(outcome) => outcome,
        Err(e) => return log_failure(path, e).into_response(),
    };

    let (status, success) = match outcome {
        UpsertOutcome::Created => (StatusCode::CREATED, "Pessoa inserida com sucesso"),
        UpsertOutcome::Updated => (StatusCode::OK, "Pessoa atualizada com sucesso"),
    };
    (status, Json(SuccessResponse { success })).into_response()
}
