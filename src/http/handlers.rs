//! Request handlers for redirect, add-mapping and list-mappings.

use axum::{
    extract::{rejection::FormRejection, Form, Query, State},
    http::{header, HeaderValue, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use percent_encoding::percent_decode_str;

use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::observability::metrics;

/// Raw key/value pairs of a urlencoded form or query string.
///
/// Kept as pairs so repeated keys resolve to their first value.
pub type FormPairs = Vec<(String, String)>;

/// Catch-all: redirect known paths, 404 everything else.
///
/// The path is percent-decoded but otherwise matched as-is: no slash
/// collapsing or trailing-slash trimming.
pub async fn redirect(State(state): State<AppState>, uri: Uri) -> Result<Response, ApiError> {
    let Ok(decoded) = percent_decode_str(uri.path()).decode_utf8() else {
        metrics::record_lookup(false);
        tracing::debug!(path = %uri.path(), "Path is not valid UTF-8 once decoded");
        return Ok((StatusCode::NOT_FOUND, format!("Page not found. Path: {}", uri.path())).into_response());
    };
    let path: &str = &decoded;

    let Some(destination) = state.store.lookup(path) else {
        metrics::record_lookup(false);
        tracing::debug!(path = %path, "No mapping for path");
        return Ok((StatusCode::NOT_FOUND, format!("Page not found. Path: {}", path)).into_response());
    };

    let location = HeaderValue::from_str(&destination).map_err(|_| ApiError::InvalidDestination {
        path: path.to_string(),
    })?;
    metrics::record_lookup(true);
    tracing::debug!(path = %path, destination = %destination, "Redirecting");

    Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
}

/// `POST /add`: create or overwrite a mapping.
///
/// Fields are read from the form body first, then the query string.
/// A repeated key takes its first value.
pub async fn add_mapping(
    State(state): State<AppState>,
    Query(query): Query<FormPairs>,
    form: Result<Form<FormPairs>, FormRejection>,
) -> Result<(StatusCode, String), ApiError> {
    let body = match form {
        Ok(Form(body)) => body,
        // Not a form submission; the query string may still carry the fields.
        Err(FormRejection::InvalidFormContentType(_)) => FormPairs::new(),
        Err(rejection) => return Err(rejection.into()),
    };

    let path = first_non_empty(form_value(&body, "path"), form_value(&query, "path"));
    let url = first_non_empty(form_value(&body, "url"), form_value(&query, "url"));
    validate_mapping(&path, &url, state.strict_validation)?;

    state.store.add(path.clone(), url.clone());
    metrics::record_mappings_added("api", 1);
    metrics::record_store_size(state.store.len());
    tracing::info!(path = %path, destination = %url, "Mapping added");

    Ok((StatusCode::CREATED, format!("Successfully mapped {} to {}", path, url)))
}

/// `GET /mappings`: the full table as a JSON object.
pub async fn list_mappings(State(state): State<AppState>) -> Result<Response, ApiError> {
    let snapshot = state.store.snapshot();
    let body = serde_json::to_vec_pretty(&snapshot).map_err(ApiError::Serialization)?;

    Ok((
        [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
        body,
    )
        .into_response())
}

pub async fn healthz() -> &'static str {
    "ok"
}

/// Fallback for known routes hit with the wrong method.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// First value for `key`, or empty when absent.
fn form_value(pairs: &[(String, String)], key: &str) -> String {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.clone())
        .unwrap_or_default()
}

fn first_non_empty(primary: String, fallback: String) -> String {
    if primary.is_empty() {
        fallback
    } else {
        primary
    }
}

/// Reject mappings the router could never serve.
pub fn validate_mapping(path: &str, url: &str, strict: bool) -> Result<(), ApiError> {
    if path.is_empty() || url.is_empty() {
        return Err(ApiError::Validation("Path and URL are required".into()));
    }
    if HeaderValue::from_str(url).is_err() {
        return Err(ApiError::Validation("URL contains characters not allowed in a redirect".into()));
    }
    if strict {
        if !path.starts_with('/') {
            return Err(ApiError::Validation("Path must start with '/'".into()));
        }
        if url::Url::parse(url).is_err() {
            return Err(ApiError::Validation("URL must be absolute".into()));
        }
    }
    Ok(())
}
