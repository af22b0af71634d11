//! Error types shared by the classifier, the client, and the adapter.
//!
//! # Design
//! `ClassifiedError` is the only error the UI ever sees. Its fields are private
//! and it is constructed only by the classifier, so `field_errors` is present
//! exactly when `kind` is `ValidationFailed` and `message` is never empty.
//!
//! `Failure` is the tagged union passed up the call chain. A wrapper that has
//! already classified a failure returns `Failure::Classified`; the adapter
//! matches on the tag and never classifies twice.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::failure::RawFailure;

/// Closed set of failure categories shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Connectivity,
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    ValidationFailed,
    ServerError,
    Unknown,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Connectivity => "connectivity",
            ErrorKind::BadRequest => "bad_request",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::ValidationFailed => "validation_failed",
            ErrorKind::ServerError => "server_error",
            ErrorKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field name to message, ordered so equal inputs render identically.
pub type FieldErrors = BTreeMap<String, String>;

/// Normalized, UI-safe description of a failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedError {
    kind: ErrorKind,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field_errors: Option<FieldErrors>,
    #[serde(skip)]
    raw: RawFailure,
}

impl ClassifiedError {
    /// Any kind except `ValidationFailed`.
    pub(crate) fn new(kind: ErrorKind, message: impl Into<String>, raw: RawFailure) -> Self {
        debug_assert_ne!(kind, ErrorKind::ValidationFailed);
        Self {
            kind,
            message: message.into(),
            field_errors: None,
            raw,
        }
    }

    pub(crate) fn validation(
        message: impl Into<String>,
        field_errors: FieldErrors,
        raw: RawFailure,
    ) -> Self {
        Self {
            kind: ErrorKind::ValidationFailed,
            message: message.into(),
            field_errors: Some(field_errors),
            raw,
        }
    }

    pub(crate) fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn field_errors(&self) -> Option<&FieldErrors> {
        self.field_errors.as_ref()
    }

    /// The transport failure this error was derived from. Never shown to users.
    pub fn raw(&self) -> &RawFailure {
        &self.raw
    }
}

impl fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ClassifiedError {}

/// A failed call, either still raw or already classified upstream.
#[derive(Debug, Clone, PartialEq)]
pub enum Failure {
    Raw(RawFailure),
    Classified(ClassifiedError),
}

impl Failure {
    pub fn classified(&self) -> Option<&ClassifiedError> {
        match self {
            Failure::Classified(err) => Some(err),
            Failure::Raw(_) => None,
        }
    }
}

impl From<RawFailure> for Failure {
    fn from(value: RawFailure) -> Self {
        Failure::Raw(value)
    }
}

impl From<ClassifiedError> for Failure {
    fn from(value: ClassifiedError) -> Self {
        Failure::Classified(value)
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Raw(raw) => match raw.status {
                Some(status) => write!(f, "unclassified failure (HTTP {status})"),
                None => write!(f, "unclassified failure (no response)"),
            },
            Failure::Classified(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Failure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Failure::Classified(err) => Some(err),
            Failure::Raw(_) => None,
        }
    }
}

/// Errors raised while building a request, before anything is sent.
#[derive(Debug)]
pub enum RequestError {
    /// The request payload could not be serialized to JSON.
    Serialization(String),
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::Serialization(msg) => write!(f, "serialization failed: {msg}"),
        }
    }
}

impl std::error::Error for RequestError {}
