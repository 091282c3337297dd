use crate::router::ApiState;
use axum::Json;
use axum::extract::{FromRequest, Query, Request, State};
use axum::response::{IntoResponse, Response};
use formfill_core::{FormDescriptor, MappingEntry, StoredMapping, UserProfile};
use http::StatusCode;
use http::header::CONTENT_TYPE;
use http_body_util::{BodyExt, Limited};
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;

/// Profile used when a request names no user
pub const DEFAULT_USER_ID: &str = "default";

/// Largest request body accepted
const MAX_BODY_BYTES: usize = 1024 * 1024;

type AppState = State<Arc<ApiState>>;
type Params = Query<HashMap<String, String>>;

/// Request body as JSON, or `None` when it is missing, oversized, not JSON
/// or sent with a non-JSON content type
///
/// Never rejects, so each handler answers bad bodies with its own message.
pub struct JsonBody(pub Option<Value>);

impl<S: Send + Sync> FromRequest<S> for JsonBody {
    type Rejection = Infallible;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(JsonBody(read_json(req).await))
    }
}

async fn read_json(req: Request) -> Option<Value> {
    if !is_json_content(&req) {
        tracing::debug!("Rejecting body with non-JSON content type");
        return None;
    }

    let bytes = match Limited::new(req.into_body(), MAX_BODY_BYTES).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            tracing::debug!("Failed to read request body: {}", e);
            return None;
        }
    };
    if bytes.is_empty() {
        return None;
    }

    serde_json::from_slice(&bytes)
        .map_err(|e| tracing::debug!("Invalid JSON body: {}", e))
        .ok()
}

fn is_json_content(req: &Request) -> bool {
    let Some(content_type) = req.headers().get(CONTENT_TYPE) else {
        return true;
    };
    content_type
        .to_str()
        .ok()
        .and_then(|ct| ct.parse::<mime::Mime>().ok())
        .map(|m| m.subtype() == mime::JSON || m.suffix() == Some(mime::JSON))
        .unwrap_or(false)
}

fn json_response(status: StatusCode, value: Value) -> Response {
    (status, Json(value)).into_response()
}

pub fn error_response(status: StatusCode, message: &str) -> Response {
    json_response(status, json!({ "error": message }))
}

fn success() -> Response {
    json_response(StatusCode::OK, json!({"status": "success"}))
}

fn internal_error(context: &str, err: impl std::fmt::Display, message: &str) -> Response {
    tracing::error!("{}: {}", context, err);
    error_response(StatusCode::INTERNAL_SERVER_ERROR, message)
}

/// Non-empty query parameter
fn query_param<'a>(query: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    query.get(key).map(String::as_str).filter(|v| !v.is_empty())
}

/// Non-empty string member of a JSON object
fn string_member(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key)
        .and_then(Value::as_str)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

pub async fn method_not_allowed() -> Response {
    error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

pub async fn health() -> Response {
    json_response(StatusCode::OK, json!({"status": "ok"}))
}

pub async fn get_data(State(state): AppState, Query(query): Params) -> Response {
    let user_id = query_param(&query, "user_id").unwrap_or(DEFAULT_USER_ID);

    match state.store.get_profile(user_id).await {
        Ok(Some(profile)) => json_response(StatusCode::OK, Value::Object(profile.to_map())),
        Ok(None) => json_response(StatusCode::OK, json!({})),
        Err(e) => internal_error("Error getting user data", e, "Failed to retrieve user data"),
    }
}

pub async fn save_data(
    State(state): AppState,
    Query(query): Params,
    JsonBody(body): JsonBody,
) -> Response {
    let user_id = query_param(&query, "user_id").unwrap_or(DEFAULT_USER_ID);
    let Some(Value::Object(data)) = body else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid data format");
    };

    let profile = UserProfile::from_map(user_id, &data);
    match state.store.save_profile(&profile).await {
        Ok(()) => {
            tracing::info!("Saved profile for user '{}'", user_id);
            success()
        }
        Err(e) => internal_error("Error saving user data", e, "Failed to save user data"),
    }
}

pub async fn interpret(State(state): AppState, JsonBody(body): JsonBody) -> Response {
    let form: FormDescriptor = match body {
        Some(Value::Object(map)) if !map.is_empty() => {
            match serde_json::from_value(Value::Object(map)) {
                Ok(form) => form,
                Err(e) => {
                    tracing::debug!("Invalid form descriptor: {}", e);
                    return error_response(StatusCode::BAD_REQUEST, "Invalid form data");
                }
            }
        }
        _ => return error_response(StatusCode::BAD_REQUEST, "Invalid form data"),
    };

    let result = state.interpreter.interpret_form(&form).await;
    tracing::info!(
        "Interpreted form{}: {} mapping(s), confidence {:.2}",
        form.domain
            .as_deref()
            .map(|d| format!(" on {}", d))
            .unwrap_or_default(),
        result.mappings.len(),
        result.confidence
    );

    if let Some(domain) = form.domain.as_deref().filter(|d| !d.is_empty()) {
        let form_id = form.form_id.as_deref().filter(|f| !f.is_empty());
        if let Err(e) = state.store.save_interpretation(domain, form_id, &result).await {
            tracing::warn!("Failed to cache interpretation for {}: {}", domain, e);
        }
    }

    match serde_json::to_value(&result) {
        Ok(value) => json_response(StatusCode::OK, value),
        Err(e) => internal_error("Error interpreting form", e, "Failed to interpret form"),
    }
}

pub async fn get_interpretation(State(state): AppState, Query(query): Params) -> Response {
    let Some(domain) = query_param(&query, "domain") else {
        return error_response(StatusCode::BAD_REQUEST, "Domain parameter is required");
    };
    let form_id = query_param(&query, "form_id");

    let cached = match state.store.get_interpretation(domain, form_id).await {
        Ok(cached) => cached,
        Err(e) => {
            return internal_error(
                "Error getting interpretation",
                e,
                "Failed to retrieve interpretation",
            );
        }
    };

    match cached.map(|r| serde_json::to_value(&r)) {
        Some(Ok(value)) => json_response(StatusCode::OK, value),
        Some(Err(e)) => internal_error(
            "Error encoding interpretation",
            e,
            "Failed to retrieve interpretation",
        ),
        None => error_response(StatusCode::NOT_FOUND, "Interpretation not found"),
    }
}

pub async fn get_mappings(State(state): AppState, Query(query): Params) -> Response {
    let Some(domain) = query_param(&query, "domain") else {
        return error_response(StatusCode::BAD_REQUEST, "Domain parameter is required");
    };
    let form_id = query_param(&query, "form_id");

    let mappings = match state.store.get_mappings(domain, form_id).await {
        Ok(mappings) => mappings,
        Err(e) => {
            return internal_error(
                "Error getting form mappings",
                e,
                "Failed to retrieve form mappings",
            );
        }
    };

    match serde_json::to_value(&mappings) {
        Ok(list) => json_response(StatusCode::OK, json!({ "mappings": list })),
        Err(e) => internal_error(
            "Error encoding form mappings",
            e,
            "Failed to retrieve form mappings",
        ),
    }
}

pub async fn save_mapping(State(state): AppState, JsonBody(body): JsonBody) -> Response {
    let data = match body {
        Some(Value::Object(map)) if !map.is_empty() => map,
        _ => return error_response(StatusCode::BAD_REQUEST, "No mapping data provided"),
    };

    let (Some(domain), Some(field_name), Some(user_field)) = (
        string_member(&data, "domain"),
        string_member(&data, "field_name"),
        string_member(&data, "user_field"),
    ) else {
        return error_response(StatusCode::BAD_REQUEST, "Missing required fields");
    };

    // A missing or non-numeric confidence means the user set it by hand.
    let mapping = StoredMapping::new(domain, field_name, user_field)
        .with_form_id(string_member(&data, "form_id"))
        .with_field_type(string_member(&data, "field_type"))
        .with_confidence(data.get("confidence").and_then(Value::as_f64).unwrap_or(1.0));

    match state.store.save_mapping(&mapping).await {
        Ok(()) => {
            tracing::debug!(
                "Saved mapping {}:{} -> {}",
                mapping.domain,
                mapping.field_name,
                mapping.user_field
            );
            success()
        }
        Err(e) => internal_error("Error saving form mapping", e, "Failed to save form mapping"),
    }
}

pub async fn save_mappings(State(state): AppState, JsonBody(body): JsonBody) -> Response {
    let data = match body {
        Some(Value::Object(map)) if !map.is_empty() => map,
        _ => return error_response(StatusCode::BAD_REQUEST, "No data provided"),
    };

    let domain = string_member(&data, "domain");
    let items = data.get("mappings").and_then(Value::as_array).filter(|m| !m.is_empty());
    let (Some(domain), Some(items)) = (domain, items) else {
        return error_response(StatusCode::BAD_REQUEST, "Missing required fields");
    };
    let form_id = string_member(&data, "form_id");

    // Entries that are not objects are skipped like incomplete ones.
    let entries: Vec<MappingEntry> = items
        .iter()
        .filter_map(|item| serde_json::from_value(item.clone()).ok())
        .collect();

    match state
        .store
        .save_mappings(&domain, form_id.as_deref(), entries)
        .await
    {
        Ok(count) => {
            tracing::info!("Saved {} of {} mapping(s) for {}", count, items.len(), domain);
            success()
        }
        Err(e) => internal_error("Error saving bulk mappings", e, "Failed to save bulk mappings"),
    }
}
