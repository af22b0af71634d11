//! Unprocessed failures as reported by the transport.
//!
//! # Design
//! A `RawFailure` is created exactly once per failed call. Its body is decoded
//! eagerly so the classifier never has to parse text: JSON becomes
//! `ResponseBody::Json`, anything else non-blank is kept as
//! `ResponseBody::Malformed` and later degrades to `ErrorKind::Unknown`.

use serde::Serialize;
use serde_json::Value;

use crate::http::HttpResponse;

/// Decoded body of a failed response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ResponseBody {
    Json(Value),
    /// Non-empty text that is not valid JSON (HTML error pages, proxies, ...).
    Malformed(String),
}

impl ResponseBody {
    /// Decode response text. Blank text yields `None`.
    pub fn parse(text: &str) -> Option<Self> {
        if text.trim().is_empty() {
            return None;
        }
        Some(match serde_json::from_str::<Value>(text) {
            Ok(value) => ResponseBody::Json(value),
            Err(_) => ResponseBody::Malformed(text.to_string()),
        })
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            ResponseBody::Malformed(_) => None,
        }
    }

    /// Short label used in diagnostics instead of logging the full body.
    pub(crate) fn shape(&self) -> &'static str {
        match self {
            ResponseBody::Json(Value::Object(_)) => "object",
            ResponseBody::Json(Value::Array(_)) => "array",
            ResponseBody::Json(Value::String(_)) => "string",
            ResponseBody::Json(Value::Null) => "null",
            ResponseBody::Json(_) => "scalar",
            ResponseBody::Malformed(_) => "malformed",
        }
    }
}

/// The unprocessed failure surfaced by the transport layer.
///
/// `status == None` means no response was received at all.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RawFailure {
    pub status: Option<u16>,
    pub body: Option<ResponseBody>,
}

impl RawFailure {
    pub fn new(status: Option<u16>, body: Option<ResponseBody>) -> Self {
        Self { status, body }
    }

    /// The host could not reach the server.
    pub fn unreachable() -> Self {
        Self::default()
    }

    /// A response that arrived with a status and a JSON body.
    pub fn with_json(status: u16, body: Value) -> Self {
        Self {
            status: Some(status),
            body: Some(ResponseBody::Json(body)),
        }
    }

    pub fn from_response(response: &HttpResponse) -> Self {
        Self {
            status: Some(response.status),
            body: ResponseBody::parse(&response.body),
        }
    }

    /// A success status whose body could not be decoded into the expected type.
    pub(crate) fn undecodable(response: &HttpResponse) -> Self {
        let text = if response.body.trim().is_empty() {
            "<empty>".to_string()
        } else {
            response.body.clone()
        };
        Self {
            status: Some(response.status),
            body: Some(ResponseBody::Malformed(text)),
        }
    }

    pub fn json_body(&self) -> Option<&Value> {
        self.body.as_ref().and_then(ResponseBody::as_json)
    }
}

/// Closed set of status codes the classifier distinguishes.
///
/// Anything else lands in `Other` and classifies as `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStatus {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    InternalServerError,
    Other(u16),
}

impl FailureStatus {
    pub fn from_code(code: u16) -> Self {
        match code {
            400 => Self::BadRequest,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            409 => Self::Conflict,
            500 => Self::InternalServerError,
            other => Self::Other(other),
        }
    }
}
