//! Maps transport failures to `ClassifiedError`.
//!
//! # Design
//! `classify` is total and pure apart from emitting `tracing` events. The
//! decision is driven by three inputs only: the status code, the decoded body,
//! and the optional `OperationContext`.
//!
//! Order of evaluation:
//! 1. no status: `Connectivity` (a body without a status is ignored);
//! 2. body present but not JSON: `Unknown`;
//! 3. exhaustive match on `FailureStatus`.
//!
//! # Validation maps
//! A 400 body is treated as a per-field validation map when it is a non-empty
//! JSON object that contains neither of the envelope keys `error` and
//! `message`. A single-field map whose field is literally named `error` or
//! `message` is therefore reported as `BadRequest`.

use serde_json::{Map, Value};

use crate::context::OperationContext;
use crate::error::{ClassifiedError, ErrorKind, FieldErrors};
use crate::failure::{FailureStatus, RawFailure, ResponseBody};
use crate::wrappers;

pub const CONNECTION_LOST: &str = "Connection lost. Check your network and try again.";
pub const VALIDATION_FAILED: &str = "Some fields are invalid. Please review them and try again.";
pub const BAD_REQUEST: &str = "The request could not be processed.";
pub const INVALID_CREDENTIALS: &str = "Invalid credentials.";
pub const NOT_AUTHORIZED: &str = "You are not authorized to perform this action.";
pub const RESOURCE_NOT_FOUND: &str = "Resource not found.";
pub const ALREADY_EXISTS: &str = "This record already exists.";
pub const SERVER_ERROR: &str = "Something went wrong on our side. Please try again later.";
pub const UNKNOWN_ERROR: &str = "An unknown error occurred.";

/// Keys that mark a body as an error envelope rather than a field map.
const ENVELOPE_KEYS: [&str; 2] = ["error", "message"];

const INVALID_FIELD: &str = "is invalid";

/// Classify `raw`, using the built-in fallback table for server errors.
pub fn classify(raw: RawFailure, ctx: Option<OperationContext>) -> ClassifiedError {
    let server_fallback = ctx.and_then(wrappers::server_fallback);
    classify_with(raw, ctx, server_fallback)
}

/// Classification core shared by `classify` and `OperationClassifier`.
pub(crate) fn classify_with(
    raw: RawFailure,
    ctx: Option<OperationContext>,
    server_fallback: Option<&'static str>,
) -> ClassifiedError {
    tracing::debug!(
        status = ?raw.status,
        body = raw.body.as_ref().map(ResponseBody::shape).unwrap_or("none"),
        context = %ctx.map(|c| c.to_string()).unwrap_or_else(|| "none".to_string()),
        "classifying failed call"
    );

    let classified = decide(raw, ctx, server_fallback);

    match classified.kind() {
        ErrorKind::ServerError | ErrorKind::Unknown => tracing::warn!(
            kind = %classified.kind(),
            status = ?classified.raw().status,
            "backend failure"
        ),
        kind => tracing::info!(kind = %kind, status = ?classified.raw().status, "request rejected"),
    }

    classified
}

fn decide(
    raw: RawFailure,
    ctx: Option<OperationContext>,
    server_fallback: Option<&'static str>,
) -> ClassifiedError {
    let Some(code) = raw.status else {
        return ClassifiedError::new(ErrorKind::Connectivity, CONNECTION_LOST, raw);
    };

    if matches!(raw.body, Some(ResponseBody::Malformed(_))) {
        return ClassifiedError::new(ErrorKind::Unknown, UNKNOWN_ERROR, raw);
    }

    let body = raw.json_body();
    let error = envelope_text(body, "error");
    let message = envelope_text(body, "message");

    match FailureStatus::from_code(code) {
        FailureStatus::BadRequest => match body.and_then(field_map) {
            Some(fields) => ClassifiedError::validation(VALIDATION_FAILED, fields, raw),
            None => {
                let text = error.unwrap_or_else(|| BAD_REQUEST.to_string());
                ClassifiedError::new(ErrorKind::BadRequest, text, raw)
            }
        },
        FailureStatus::Unauthorized => {
            let text = error.unwrap_or_else(|| INVALID_CREDENTIALS.to_string());
            ClassifiedError::new(ErrorKind::Unauthorized, text, raw)
        }
        FailureStatus::Forbidden => {
            let text = error.unwrap_or_else(|| NOT_AUTHORIZED.to_string());
            ClassifiedError::new(ErrorKind::Forbidden, text, raw)
        }
        FailureStatus::NotFound => {
            let text = error.unwrap_or_else(|| match ctx {
                Some(ctx) => format!("{} not found.", ctx.subject.noun()),
                None => RESOURCE_NOT_FOUND.to_string(),
            });
            ClassifiedError::new(ErrorKind::NotFound, text, raw)
        }
        FailureStatus::Conflict => {
            let text = error.unwrap_or_else(|| ALREADY_EXISTS.to_string());
            ClassifiedError::new(ErrorKind::Conflict, text, raw)
        }
        FailureStatus::InternalServerError => {
            let text = error.or(message).unwrap_or_else(|| SERVER_ERROR.to_string());
            let err = ClassifiedError::new(ErrorKind::ServerError, text, raw);
            match server_fallback {
                Some(copy) => err.with_message(copy),
                None => err,
            }
        }
        FailureStatus::Other(_) => {
            let text = error.or(message).unwrap_or_else(|| UNKNOWN_ERROR.to_string());
            ClassifiedError::new(ErrorKind::Unknown, text, raw)
        }
    }
}

/// Non-blank string stored under `key` of a JSON object body.
fn envelope_text(body: Option<&Value>, key: &str) -> Option<String> {
    let text = body?.as_object()?.get(key)?.as_str()?.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Interpret a 400 body as a field-validation map, if it looks like one.
fn field_map(body: &Value) -> Option<FieldErrors> {
    let object = body.as_object()?;
    if object.is_empty() || ENVELOPE_KEYS.iter().any(|key| object.contains_key(*key)) {
        return None;
    }
    Some(normalize_fields(object))
}

fn normalize_fields(object: &Map<String, Value>) -> FieldErrors {
    object
        .iter()
        .map(|(field, value)| (field.clone(), field_message(value)))
        .collect()
}

fn field_message(value: &Value) -> String {
    match value {
        Value::String(text) if !text.trim().is_empty() => text.trim().to_string(),
        Value::Array(items) => {
            let parts: Vec<&str> = items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect();
            if parts.is_empty() {
                INVALID_FIELD.to_string()
            } else {
                parts.join(", ")
            }
        }
        _ => INVALID_FIELD.to_string(),
    }
}
