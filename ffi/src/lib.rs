//! C-ABI wrapper around `estate-core` for native mobile hosts.
//!
//! # Overview
//! Exposes request building, response parsing, failure classification, and
//! the per-screen error adapter through `extern "C"` functions. The host
//! (Swift, Kotlin via JNI, ...) performs the HTTP round-trip itself.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Payloads go in and come out as JSON text; ids are UUID strings.
//! - Parse and classify calls return one `FfiEstateResult` envelope. A failed
//!   envelope carries the classified error as an opaque handle, which
//!   `estate_adapter_handle_result` shows without classifying again.
//! - The caller owns every returned pointer and releases it with the matching
//!   `estate_free_*` / `*_free` function.

pub mod types;

use std::os::raw::c_char;
use std::panic::catch_unwind;

use estate_core::types::{CreateProperty, CreateUser, LoginRequest, RegisterRequest, UpdateUser};
use estate_core::{
    classify, ErrorAdapter, Failure, HttpRequest, HttpResponse, MarketplaceClient, RawFailure,
    ResponseBody,
};

use types::*;

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a client bound to `base_url`. Returns null if `base_url` is null or
/// not UTF-8. Free with `estate_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn estate_client_new(base_url: *const c_char) -> *mut FfiClient {
    catch_unwind(|| match unsafe { from_c_str(base_url) } {
        Some(url) => Box::into_raw(Box::new(FfiClient {
            inner: MarketplaceClient::new(url),
        })),
        None => std::ptr::null_mut(),
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `estate_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn estate_client_free(client: *mut FfiClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

/// Shared null checks for builders. `build` returns `None` on invalid input.
fn build_with(
    client: *const FfiClient,
    build: impl FnOnce(&MarketplaceClient) -> Option<HttpRequest> + std::panic::UnwindSafe,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        match build(&client.inner) {
            Some(req) => FfiHttpRequest::from_core(req),
            None => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

fn parse_id(id: *const c_char) -> Option<uuid::Uuid> {
    let id = unsafe { from_c_str(id) }?;
    uuid::Uuid::parse_str(id).ok()
}

fn parse_payload<T: serde::de::DeserializeOwned>(payload: *const c_char) -> Option<T> {
    let json = unsafe { from_c_str(payload) }?;
    serde_json::from_str(json).ok()
}

/// `POST /auth/register`. `payload` is `{"name","email","password"}` JSON.
/// Returns null on a null client or an invalid payload.
#[unsafe(no_mangle)]
pub extern "C" fn estate_build_register(
    client: *const FfiClient,
    payload: *const c_char,
) -> *mut FfiHttpRequest {
    build_with(client, |c| {
        let input: RegisterRequest = parse_payload(payload)?;
        c.build_register(&input).ok()
    })
}

/// `POST /auth/login`. `payload` is `{"email","password"}` JSON.
#[unsafe(no_mangle)]
pub extern "C" fn estate_build_login(
    client: *const FfiClient,
    payload: *const c_char,
) -> *mut FfiHttpRequest {
    build_with(client, |c| {
        let input: LoginRequest = parse_payload(payload)?;
        c.build_login(&input).ok()
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn estate_build_list_users(client: *const FfiClient) -> *mut FfiHttpRequest {
    build_with(client, |c| Some(c.build_list_users()))
}

/// Returns null if `id` is null or not a UUID.
#[unsafe(no_mangle)]
pub extern "C" fn estate_build_get_user(
    client: *const FfiClient,
    id: *const c_char,
) -> *mut FfiHttpRequest {
    build_with(client, |c| Some(c.build_get_user(parse_id(id)?)))
}

/// `payload` is `{"name","email","phone"?}` JSON.
#[unsafe(no_mangle)]
pub extern "C" fn estate_build_create_user(
    client: *const FfiClient,
    payload: *const c_char,
) -> *mut FfiHttpRequest {
    build_with(client, |c| {
        let input: CreateUser = parse_payload(payload)?;
        c.build_create_user(&input).ok()
    })
}

/// `payload` holds any subset of `name`, `email`, `phone`.
#[unsafe(no_mangle)]
pub extern "C" fn estate_build_update_user(
    client: *const FfiClient,
    id: *const c_char,
    payload: *const c_char,
) -> *mut FfiHttpRequest {
    build_with(client, |c| {
        let id = parse_id(id)?;
        let input: UpdateUser = parse_payload(payload)?;
        c.build_update_user(id, &input).ok()
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn estate_build_delete_user(
    client: *const FfiClient,
    id: *const c_char,
) -> *mut FfiHttpRequest {
    build_with(client, |c| Some(c.build_delete_user(parse_id(id)?)))
}

#[unsafe(no_mangle)]
pub extern "C" fn estate_build_list_properties(client: *const FfiClient) -> *mut FfiHttpRequest {
    build_with(client, |c| Some(c.build_list_properties()))
}

#[unsafe(no_mangle)]
pub extern "C" fn estate_build_get_property(
    client: *const FfiClient,
    id: *const c_char,
) -> *mut FfiHttpRequest {
    build_with(client, |c| Some(c.build_get_property(parse_id(id)?)))
}

/// `payload` is `{"title","address","price","listing":"sale"|"rent"}` JSON.
#[unsafe(no_mangle)]
pub extern "C" fn estate_build_create_property(
    client: *const FfiClient,
    token: *const c_char,
    payload: *const c_char,
) -> *mut FfiHttpRequest {
    build_with(client, |c| {
        let token = unsafe { from_c_str(token) }?;
        let input: CreateProperty = parse_payload(payload)?;
        c.build_create_property(token, &input).ok()
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn estate_build_delete_property(
    client: *const FfiClient,
    token: *const c_char,
    id: *const c_char,
) -> *mut FfiHttpRequest {
    build_with(client, |c| {
        let token = unsafe { from_c_str(token) }?;
        Some(c.build_delete_property(token, parse_id(id)?))
    })
}

// ---------------------------------------------------------------------------
// Parse response functions
// ---------------------------------------------------------------------------

fn ffi_response_to_core(resp: &FfiHttpResponse) -> HttpResponse {
    let body = unsafe { from_c_str(resp.body) }.unwrap_or("");
    HttpResponse::new(resp.status, body)
}

fn failure_result(failure: Failure) -> *mut FfiEstateResult {
    match failure {
        Failure::Classified(err) => FfiEstateResult::from_classified(err),
        Failure::Raw(raw) => FfiEstateResult::from_classified(classify(raw, None)),
    }
}

/// Parse a response whose success payload is handed back as JSON.
fn parse_json<T: serde::Serialize>(
    client: *const FfiClient,
    response: *const FfiHttpResponse,
    name: &'static str,
    parse: fn(&MarketplaceClient, HttpResponse) -> Result<T, Failure>,
) -> *mut FfiEstateResult {
    catch_unwind(|| {
        if client.is_null() {
            return FfiEstateResult::null_arg("client");
        }
        if response.is_null() {
            return FfiEstateResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let resp = ffi_response_to_core(unsafe { &*response });
        match parse(&client.inner, resp) {
            Ok(value) => match serde_json::to_string(&value) {
                Ok(json) => FfiEstateResult::ok(Some(json)),
                Err(e) => FfiEstateResult::encode_failed(&e.to_string()),
            },
            Err(failure) => failure_result(failure),
        }
    })
    .unwrap_or_else(|_| FfiEstateResult::panic(name))
}

#[unsafe(no_mangle)]
pub extern "C" fn estate_parse_register(
    client: *const FfiClient,
    response: *const FfiHttpResponse,
) -> *mut FfiEstateResult {
    parse_json(client, response, "panic in estate_parse_register", MarketplaceClient::parse_register)
}

#[unsafe(no_mangle)]
pub extern "C" fn estate_parse_login(
    client: *const FfiClient,
    response: *const FfiHttpResponse,
) -> *mut FfiEstateResult {
    parse_json(client, response, "panic in estate_parse_login", MarketplaceClient::parse_login)
}

#[unsafe(no_mangle)]
pub extern "C" fn estate_parse_list_users(
    client: *const FfiClient,
    response: *const FfiHttpResponse,
) -> *mut FfiEstateResult {
    parse_json(client, response, "panic in estate_parse_list_users", MarketplaceClient::parse_list_users)
}

#[unsafe(no_mangle)]
pub extern "C" fn estate_parse_get_user(
    client: *const FfiClient,
    response: *const FfiHttpResponse,
) -> *mut FfiEstateResult {
    parse_json(client, response, "panic in estate_parse_get_user", MarketplaceClient::parse_get_user)
}

#[unsafe(no_mangle)]
pub extern "C" fn estate_parse_create_user(
    client: *const FfiClient,
    response: *const FfiHttpResponse,
) -> *mut FfiEstateResult {
    parse_json(client, response, "panic in estate_parse_create_user", MarketplaceClient::parse_create_user)
}

#[unsafe(no_mangle)]
pub extern "C" fn estate_parse_update_user(
    client: *const FfiClient,
    response: *const FfiHttpResponse,
) -> *mut FfiEstateResult {
    parse_json(client, response, "panic in estate_parse_update_user", MarketplaceClient::parse_update_user)
}

/// Success has no payload; `data_json` stays null.
#[unsafe(no_mangle)]
pub extern "C" fn estate_parse_delete_user(
    client: *const FfiClient,
    response: *const FfiHttpResponse,
) -> *mut FfiEstateResult {
    parse_empty(client, response, "panic in estate_parse_delete_user", MarketplaceClient::parse_delete_user)
}

#[unsafe(no_mangle)]
pub extern "C" fn estate_parse_list_properties(
    client: *const FfiClient,
    response: *const FfiHttpResponse,
) -> *mut FfiEstateResult {
    parse_json(
        client,
        response,
        "panic in estate_parse_list_properties",
        MarketplaceClient::parse_list_properties,
    )
}

#[unsafe(no_mangle)]
pub extern "C" fn estate_parse_get_property(
    client: *const FfiClient,
    response: *const FfiHttpResponse,
) -> *mut FfiEstateResult {
    parse_json(client, response, "panic in estate_parse_get_property", MarketplaceClient::parse_get_property)
}

#[unsafe(no_mangle)]
pub extern "C" fn estate_parse_create_property(
    client: *const FfiClient,
    response: *const FfiHttpResponse,
) -> *mut FfiEstateResult {
    parse_json(
        client,
        response,
        "panic in estate_parse_create_property",
        MarketplaceClient::parse_create_property,
    )
}

/// Success has no payload; `data_json` stays null.
#[unsafe(no_mangle)]
pub extern "C" fn estate_parse_delete_property(
    client: *const FfiClient,
    response: *const FfiHttpResponse,
) -> *mut FfiEstateResult {
    parse_empty(
        client,
        response,
        "panic in estate_parse_delete_property",
        MarketplaceClient::parse_delete_property,
    )
}

fn parse_empty(
    client: *const FfiClient,
    response: *const FfiHttpResponse,
    name: &'static str,
    parse: fn(&MarketplaceClient, HttpResponse) -> Result<(), Failure>,
) -> *mut FfiEstateResult {
    catch_unwind(|| {
        if client.is_null() {
            return FfiEstateResult::null_arg("client");
        }
        if response.is_null() {
            return FfiEstateResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let resp = ffi_response_to_core(unsafe { &*response });
        match parse(&client.inner, resp) {
            Ok(()) => FfiEstateResult::ok(None),
            Err(failure) => failure_result(failure),
        }
    })
    .unwrap_or_else(|_| FfiEstateResult::panic(name))
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Build a `RawFailure` from C inputs. A negative `status` means no response.
fn raw_from_parts(status: i32, body: *const c_char) -> Option<RawFailure> {
    let status = match status {
        s if s < 0 => None,
        s => Some(u16::try_from(s).ok()?),
    };
    let body = unsafe { from_c_str(body) }.and_then(ResponseBody::parse);
    Some(RawFailure::new(status, body))
}

/// Classify a failure the host observed outside `estate_parse_*`, e.g. a
/// network error (`status < 0`). `subject`/`action` are `FfiSubject` /
/// `FfiAction` codes; pass `0` for no context. `body` may be null.
#[unsafe(no_mangle)]
pub extern "C" fn estate_classify(
    status: i32,
    body: *const c_char,
    subject: u32,
    action: u32,
) -> *mut FfiEstateResult {
    catch_unwind(|| {
        let Ok(ctx) = context_from_codes(subject, action) else {
            return FfiEstateResult::invalid_arg("unknown subject or action code");
        };
        let Some(raw) = raw_from_parts(status, body) else {
            return FfiEstateResult::invalid_arg("status out of range");
        };
        FfiEstateResult::from_classified(classify(raw, ctx))
    })
    .unwrap_or_else(|_| FfiEstateResult::panic("panic in estate_classify"))
}

// ---------------------------------------------------------------------------
// Error adapter
// ---------------------------------------------------------------------------

/// Create an idle adapter for one screen. Free with `estate_adapter_free`.
#[unsafe(no_mangle)]
pub extern "C" fn estate_adapter_new() -> *mut FfiErrorAdapter {
    catch_unwind(|| {
        Box::into_raw(Box::new(FfiErrorAdapter {
            inner: ErrorAdapter::new(),
        }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn estate_adapter_free(adapter: *mut FfiErrorAdapter) {
    if !adapter.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(adapter) });
        });
    }
}

/// Classify a raw failure and show it, replacing any error on screen.
///
/// Returns false (and leaves the adapter untouched) on a null adapter or
/// invalid codes.
#[unsafe(no_mangle)]
pub extern "C" fn estate_adapter_handle_response(
    adapter: *mut FfiErrorAdapter,
    status: i32,
    body: *const c_char,
    subject: u32,
    action: u32,
) -> bool {
    catch_unwind(|| {
        if adapter.is_null() {
            return false;
        }
        let (Ok(ctx), Some(raw)) = (context_from_codes(subject, action), raw_from_parts(status, body)) else {
            return false;
        };
        let adapter = unsafe { &mut *adapter };
        adapter.inner.handle_error(raw, ctx);
        true
    })
    .unwrap_or(false)
}

/// Show the classified failure carried by `result` as-is.
///
/// Returns false if either pointer is null or `result` is not a classified
/// failure. `result` stays owned by the caller.
#[unsafe(no_mangle)]
pub extern "C" fn estate_adapter_handle_result(
    adapter: *mut FfiErrorAdapter,
    result: *const FfiEstateResult,
) -> bool {
    catch_unwind(|| {
        if adapter.is_null() || result.is_null() {
            return false;
        }
        let result = unsafe { &*result };
        if result.classified.is_null() {
            return false;
        }
        let classified = unsafe { &*result.classified }.inner.clone();
        let adapter = unsafe { &mut *adapter };
        adapter.inner.handle_error(classified, None);
        true
    })
    .unwrap_or(false)
}

/// Dismiss the error on screen. Idempotent; safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn estate_adapter_clear(adapter: *mut FfiErrorAdapter) {
    if !adapter.is_null() {
        let _ = catch_unwind(|| {
            unsafe { &mut *adapter }.inner.clear_error();
        });
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn estate_adapter_is_showing(adapter: *const FfiErrorAdapter) -> bool {
    if adapter.is_null() {
        return false;
    }
    catch_unwind(|| unsafe { &*adapter }.inner.is_showing()).unwrap_or(false)
}

/// Snapshot of the error on screen. Null when the adapter is idle or the
/// `adapter` pointer itself is null, so a null check is all the host needs.
/// Free a non-null snapshot with `estate_free_result`.
#[unsafe(no_mangle)]
pub extern "C" fn estate_adapter_view(adapter: *const FfiErrorAdapter) -> *mut FfiEstateResult {
    catch_unwind(|| {
        if adapter.is_null() {
            return std::ptr::null_mut();
        }
        match unsafe { &*adapter }.inner.classified_error() {
            Some(err) => FfiEstateResult::from_classified(err.clone()),
            None => std::ptr::null_mut(),
        }
    })
    .unwrap_or_else(|_| FfiEstateResult::panic("panic in estate_adapter_view"))
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free a request returned by any `estate_build_*` function. Safe with null.
#[unsafe(no_mangle)]
pub extern "C" fn estate_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let req = unsafe { Box::from_raw(req) };
        free_c_string(req.path);
        free_c_string(req.body);
        if !req.headers.is_null() && req.headers_len > 0 {
            let slice = std::ptr::slice_from_raw_parts_mut(req.headers, req.headers_len as usize);
            let headers = unsafe { Box::from_raw(slice) };
            for h in headers.iter() {
                free_c_string(h.key);
                free_c_string(h.value);
            }
        }
    });
}

/// Free a result from any parse, classify, or view call. Safe with null.
#[unsafe(no_mangle)]
pub extern "C" fn estate_free_result(result: *mut FfiEstateResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        free_c_string(result.message);
        free_c_string(result.field_errors_json);
        free_c_string(result.data_json);
        if !result.classified.is_null() {
            drop(unsafe { Box::from_raw(result.classified) });
        }
    });
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
