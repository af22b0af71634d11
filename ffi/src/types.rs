//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Request types mirror the core ones with C strings and raw arrays. Parsed
//! payloads cross as JSON text (`data_json`) so mobile hosts decode them with
//! their own JSON tooling. Failures carry the classified kind, the UI message,
//! the field map as JSON, and an opaque handle to the `ClassifiedError` so an
//! adapter can show it without classifying again.
//!
//! Subjects and actions are accepted as `u32` codes and validated here; a
//! foreign caller passing an out-of-range value into a Rust enum would be UB.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use estate_core::{Action, ClassifiedError, ErrorKind, HttpMethod, OperationContext, Subject};

/// Opaque handle to a `MarketplaceClient`.
pub struct FfiClient {
    pub(crate) inner: estate_core::MarketplaceClient,
}

/// Opaque handle to a per-screen `ErrorAdapter`. Not thread-safe; use one
/// handle per screen from the UI thread.
pub struct FfiErrorAdapter {
    pub(crate) inner: estate_core::ErrorAdapter,
}

/// Opaque, already classified failure. Owned by the `FfiEstateResult` that
/// carries it.
pub struct FfiClassified {
    pub(crate) inner: ClassifiedError,
}

// ---------------------------------------------------------------------------
// Operation context codes
// ---------------------------------------------------------------------------

/// Subject codes accepted by classification entry points. `None` means no context.
#[repr(C)]
pub enum FfiSubject {
    None = 0,
    User = 1,
    Auth = 2,
    Property = 3,
    Transaction = 4,
    Verification = 5,
}

/// Action codes accepted by classification entry points. `None` means no context.
#[repr(C)]
pub enum FfiAction {
    None = 0,
    Fetch = 1,
    List = 2,
    Create = 3,
    Update = 4,
    Delete = 5,
    Login = 6,
    Register = 7,
}

/// Decode a `(subject, action)` code pair.
///
/// `Ok(None)` only when both codes are zero. A code out of range, or a pair
/// with exactly one zero, is `Err(())`.
pub(crate) fn context_from_codes(subject: u32, action: u32) -> Result<Option<OperationContext>, ()> {
    match (subject_from_code(subject)?, action_from_code(action)?) {
        (Some(subject), Some(action)) => Ok(Some(OperationContext::new(subject, action))),
        (None, None) => Ok(None),
        _ => Err(()),
    }
}

fn subject_from_code(code: u32) -> Result<Option<Subject>, ()> {
    Ok(Some(match code {
        0 => return Ok(None),
        1 => Subject::User,
        2 => Subject::Auth,
        3 => Subject::Property,
        4 => Subject::Transaction,
        5 => Subject::Verification,
        _ => return Err(()),
    }))
}

fn action_from_code(code: u32) -> Result<Option<Action>, ()> {
    Ok(Some(match code {
        0 => return Ok(None),
        1 => Action::Fetch,
        2 => Action::List,
        3 => Action::Create,
        4 => Action::Update,
        5 => Action::Delete,
        6 => Action::Login,
        7 => Action::Register,
        _ => return Err(()),
    }))
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[repr(C)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
    Put = 2,
    Delete = 3,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
            HttpMethod::Put => FfiHttpMethod::Put,
            HttpMethod::Delete => FfiHttpMethod::Delete,
        }
    }
}

#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request for the host to execute. Free with `estate_free_request`.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub path: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut c_char,
}

impl FfiHttpRequest {
    pub(crate) fn from_core(req: estate_core::HttpRequest) -> *mut Self {
        let body = match req.body {
            Some(b) => into_c_string(b),
            None => std::ptr::null_mut(),
        };

        let headers_len = req.headers.len() as u32;
        let headers = if req.headers.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_headers: Box<[FfiHeader]> = req
                .headers
                .into_iter()
                .map(|(k, v)| FfiHeader {
                    key: into_c_string(k),
                    value: into_c_string(v),
                })
                .collect();
            Box::into_raw(ffi_headers) as *mut FfiHeader
        };

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            path: into_c_string(req.path),
            headers,
            headers_len,
            body,
        }))
    }
}

/// A response the host received. Read, never freed, by this library.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

// ---------------------------------------------------------------------------
// Result envelope
// ---------------------------------------------------------------------------

/// `Ok`, one of the classified error kinds, or a problem with the call itself.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    Connectivity = 1,
    BadRequest = 2,
    Unauthorized = 3,
    Forbidden = 4,
    NotFound = 5,
    Conflict = 6,
    ValidationFailed = 7,
    ServerError = 8,
    Unknown = 9,
    NullArg = 10,
    InvalidArg = 11,
    Panic = 12,
}

impl From<ErrorKind> for FfiErrorCode {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Connectivity => FfiErrorCode::Connectivity,
            ErrorKind::BadRequest => FfiErrorCode::BadRequest,
            ErrorKind::Unauthorized => FfiErrorCode::Unauthorized,
            ErrorKind::Forbidden => FfiErrorCode::Forbidden,
            ErrorKind::NotFound => FfiErrorCode::NotFound,
            ErrorKind::Conflict => FfiErrorCode::Conflict,
            ErrorKind::ValidationFailed => FfiErrorCode::ValidationFailed,
            ErrorKind::ServerError => FfiErrorCode::ServerError,
            ErrorKind::Unknown => FfiErrorCode::Unknown,
        }
    }
}

/// Result envelope for parse, classify, and adapter-view calls.
///
/// On success `error_code` is `Ok` and `data_json` holds the payload (null for
/// operations without one). On a classified failure `message` is the UI copy,
/// `field_errors_json` is set only for `ValidationFailed`, `http_status` is
/// `-1` when no response was received, and `classified` can be handed to
/// `estate_adapter_handle_result`. Free with `estate_free_result`.
#[repr(C)]
pub struct FfiEstateResult {
    pub error_code: FfiErrorCode,
    pub message: *mut c_char,
    pub http_status: i32,
    pub field_errors_json: *mut c_char,
    pub data_json: *mut c_char,
    pub classified: *mut FfiClassified,
}

impl FfiEstateResult {
    fn empty(error_code: FfiErrorCode, message: *mut c_char) -> Self {
        FfiEstateResult {
            error_code,
            message,
            http_status: 0,
            field_errors_json: std::ptr::null_mut(),
            data_json: std::ptr::null_mut(),
            classified: std::ptr::null_mut(),
        }
    }

    pub(crate) fn ok(data_json: Option<String>) -> *mut Self {
        let mut result = Self::empty(FfiErrorCode::Ok, std::ptr::null_mut());
        if let Some(json) = data_json {
            result.data_json = into_c_string(json);
        }
        Box::into_raw(Box::new(result))
    }

    pub(crate) fn from_classified(err: ClassifiedError) -> *mut Self {
        let mut result = Self::empty(err.kind().into(), into_c_string(err.message().to_string()));
        result.http_status = err.raw().status.map(i32::from).unwrap_or(-1);
        if let Some(fields) = err.field_errors() {
            let json = serde_json::to_string(fields).unwrap_or_else(|_| "{}".to_string());
            result.field_errors_json = into_c_string(json);
        }
        result.classified = Box::into_raw(Box::new(FfiClassified { inner: err }));
        Box::into_raw(Box::new(result))
    }

    /// The call succeeded but its payload could not be encoded as JSON.
    pub(crate) fn encode_failed(detail: &str) -> *mut Self {
        let msg = into_c_string(format!("could not encode payload: {detail}"));
        Box::into_raw(Box::new(Self::empty(FfiErrorCode::Unknown, msg)))
    }

    pub(crate) fn null_arg(name: &str) -> *mut Self {
        let msg = into_c_string(format!("null argument: {name}"));
        Box::into_raw(Box::new(Self::empty(FfiErrorCode::NullArg, msg)))
    }

    pub(crate) fn invalid_arg(msg: &str) -> *mut Self {
        Box::into_raw(Box::new(Self::empty(FfiErrorCode::InvalidArg, into_c_string(msg.to_string()))))
    }

    pub(crate) fn panic(msg: &str) -> *mut Self {
        Box::into_raw(Box::new(Self::empty(FfiErrorCode::Panic, into_c_string(msg.to_string()))))
    }
}

// ---------------------------------------------------------------------------
// C string helpers
// ---------------------------------------------------------------------------

/// Hand a Rust string to C. Interior NULs are dropped rather than failing.
pub(crate) fn into_c_string(s: String) -> *mut c_char {
    let cleaned = if s.contains('\0') { s.replace('\0', "") } else { s };
    CString::new(cleaned).unwrap_or_default().into_raw()
}

/// Borrow a caller-owned C string. `None` for null or non-UTF-8 input.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string valid for `'a`.
pub(crate) unsafe fn from_c_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

/// Reclaim a string previously produced by `into_c_string`.
pub(crate) fn free_c_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(unsafe { CString::from_raw(ptr) });
    }
}
