//! Actor endpoints: catalog, detail, schema discovery, input templates, and
//! execution.
//!
//! Logical run failures are not transport failures: `execute` answers 200
//! with the failure in the payload's `status` field. Only auth, missing
//! actors, and submission errors map to error status codes.

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use shared_types::{ExecuteRequest, RunStatus};

use crate::api::ApiState;
use crate::catalog;
use crate::executor::Orchestrator;
use crate::platform::PlatformError;
use crate::schema;

/// Pull the caller's API key out of the `Authorization` header.
fn bearer_token(headers: &HeaderMap) -> Result<String, Response> {
    let header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let Some(token) = header.strip_prefix("Bearer ") else {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Missing or invalid authorization header" })),
        )
            .into_response());
    };
    let token = token.trim();
    if token.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "API key is required" })),
        )
            .into_response());
    }
    Ok(token.to_string())
}

fn platform_error_response(context: &str, err: &PlatformError) -> Response {
    let status = match err {
        PlatformError::Auth(_) => StatusCode::UNAUTHORIZED,
        PlatformError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(json!({ "error": format!("{context}: {err}") })),
    )
        .into_response()
}

/// GET /actors - Run the catalog cascade for the caller's account
pub async fn list_actors(State(state): State<ApiState>, headers: HeaderMap) -> Response {
    let token = match bearer_token(&headers) {
        Ok(token) => token,
        Err(response) => return response,
    };
    let platform = state.platform.for_token(&token);

    let user = match platform.verify_token().await {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(error = %e, "platform rejected API key");
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": format!("Authentication failed: {e}. Please check your API key.")
                })),
            )
                .into_response();
        }
    };

    let actors = catalog::build_catalog(&platform, &user, state.config.catalog_target).await;
    if actors.is_empty() {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "No actors found. Please check your API key and make sure you have access to actors."
            })),
        )
            .into_response();
    }

    (StatusCode::OK, Json(json!({ "items": actors }))).into_response()
}

/// GET /actors/:id - Actor detail
pub async fn get_actor(
    State(state): State<ApiState>,
    Path(actor_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let token = match bearer_token(&headers) {
        Ok(token) => token,
        Err(response) => return response,
    };
    let platform = state.platform.for_token(&token);

    match platform.get_actor(&actor_id).await {
        Ok(record) => {
            (StatusCode::OK, Json(catalog::detail_from_record(record))).into_response()
        }
        Err(e) => platform_error_response("Failed to fetch actor details", &e),
    }
}

/// GET /actors/:id/schema - Discovered input schema, 404 when none exists
pub async fn get_schema(
    State(state): State<ApiState>,
    Path(actor_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let token = match bearer_token(&headers) {
        Ok(token) => token,
        Err(response) => return response,
    };
    let platform = state.platform.for_token(&token);

    let record = match platform.get_actor(&actor_id).await {
        Ok(record) => record,
        Err(e) => return platform_error_response("Failed to fetch actor schema", &e),
    };

    match schema::discover_input_schema(&record) {
        Some(schema) => (StatusCode::OK, Json(json!({ "schema": schema }))).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Actor does not have an input schema" })),
        )
            .into_response(),
    }
}

/// GET /actors/:id/input-template - Resolved default input plus field list
pub async fn get_input_template(
    State(state): State<ApiState>,
    Path(actor_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let token = match bearer_token(&headers) {
        Ok(token) => token,
        Err(response) => return response,
    };
    let platform = state.platform.for_token(&token);

    let template = match platform.get_actor(&actor_id).await {
        Ok(record) => {
            let discovered = schema::discover_input_schema(&record);
            schema::resolve(&actor_id, discovered.as_ref(), Some(record.name.as_str()))
        }
        Err(e @ PlatformError::NotFound(_)) => {
            return platform_error_response("Failed to resolve input template", &e);
        }
        Err(e) => {
            // The record is unreadable but the caller still needs a usable
            // form; fall back to the id-based heuristics.
            tracing::warn!(actor_id, error = %e, "actor fetch failed; using heuristic input");
            schema::resolve(&actor_id, None, None)
        }
    };

    (StatusCode::OK, Json(template)).into_response()
}

/// POST /actors/:id/execute - Submit a run and drive it to a terminal outcome
pub async fn execute_actor(
    State(state): State<ApiState>,
    Path(actor_id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<ExecuteRequest>,
) -> Response {
    let token = match bearer_token(&headers) {
        Ok(token) => token,
        Err(response) => return response,
    };
    let platform = state.platform.for_token(&token);

    let Some(input) = request.input else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Input is required" })),
        )
            .into_response();
    };

    // Pre-submission check so an unknown actor is a 404, not a failed run.
    if let Err(e) = platform.get_actor(&actor_id).await {
        return match e {
            PlatformError::Auth(_) => platform_error_response("Failed to execute actor", &e),
            _ => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": format!("Actor not found or not accessible: {e}") })),
            )
                .into_response(),
        };
    }

    let orchestrator = Orchestrator::new(
        platform,
        state.config.poll_max_attempts,
        state.config.poll_interval,
    );
    let outcome = orchestrator.execute(&actor_id, &input).await;

    if outcome.status == RunStatus::SubmitError {
        let message = outcome
            .error_message
            .unwrap_or_else(|| "Failed to execute actor".to_string());
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": message })),
        )
            .into_response();
    }

    (StatusCode::OK, Json(outcome)).into_response()
}
