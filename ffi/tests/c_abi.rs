//! Drive the C ABI the way a mobile host would: build through `estate_build_*`,
//! execute over real HTTP against the mock server, and hand the response back
//! to `estate_parse_*`.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use estate_ffi::types::*;
use estate_ffi::*;

fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

fn c_str(ptr: *const c_char) -> String {
    unsafe { CStr::from_ptr(ptr) }.to_str().unwrap().to_string()
}

/// Execute an `FfiHttpRequest` and free it. Returns status and body text.
fn execute(req: *mut FfiHttpRequest) -> (u16, CString) {
    assert!(!req.is_null());
    let r = unsafe { &*req };
    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent();

    let path = c_str(r.path);
    let headers: Vec<(String, String)> = (0..r.headers_len as usize)
        .map(|i| {
            let h = unsafe { &*r.headers.add(i) };
            (c_str(h.key), c_str(h.value))
        })
        .collect();
    let body = (!r.body.is_null()).then(|| c_str(r.body));

    let result = match r.method {
        FfiHttpMethod::Get => with_headers(agent.get(&path), &headers).call(),
        FfiHttpMethod::Delete => with_headers(agent.delete(&path), &headers).call(),
        FfiHttpMethod::Post => with_headers(agent.post(&path), &headers).send(body.unwrap_or_default().as_bytes()),
        FfiHttpMethod::Put => with_headers(agent.put(&path), &headers).send(body.unwrap_or_default().as_bytes()),
    };
    estate_free_request(req);

    let mut response = result.unwrap();
    let status = response.status().as_u16();
    let text = response.body_mut().read_to_string().unwrap_or_default();
    (status, CString::new(text).unwrap())
}

fn with_headers<B>(mut builder: ureq::RequestBuilder<B>, headers: &[(String, String)]) -> ureq::RequestBuilder<B> {
    for (key, value) in headers {
        builder = builder.header(key.as_str(), value.as_str());
    }
    builder
}

fn data(result: *mut FfiEstateResult) -> serde_json::Value {
    let r = unsafe { &*result };
    assert_eq!(r.error_code, FfiErrorCode::Ok);
    let value = serde_json::from_str(&c_str(r.data_json)).unwrap();
    estate_free_result(result);
    value
}

#[test]
fn register_then_publish_and_remove_listing() {
    let base = CString::new(start_server()).unwrap();
    let client = estate_client_new(base.as_ptr());
    let adapter = estate_adapter_new();

    let payload = CString::new(r#"{"name":"Ana","email":"ana@example.com","password":"hunter2222"}"#).unwrap();
    let (status, body) = execute(estate_build_register(client, payload.as_ptr()));
    let resp = FfiHttpResponse { status, body: body.as_ptr() };
    let session = data(estate_parse_register(client, &resp));
    let token = CString::new(session["token"].as_str().unwrap()).unwrap();

    // Same email again is a conflict the adapter can show directly.
    let (status, body) = execute(estate_build_register(client, payload.as_ptr()));
    let resp = FfiHttpResponse { status, body: body.as_ptr() };
    let result = estate_parse_register(client, &resp);
    assert_eq!(unsafe { &*result }.error_code, FfiErrorCode::Conflict);
    assert_eq!(unsafe { &*result }.http_status, 409);
    assert!(estate_adapter_handle_result(adapter, result));
    estate_free_result(result);
    assert!(estate_adapter_is_showing(adapter));

    let listing = CString::new(r#"{"title":"Loft","address":"1 Main St","price":25000000,"listing":"rent"}"#).unwrap();
    let (status, body) = execute(estate_build_create_property(client, token.as_ptr(), listing.as_ptr()));
    let resp = FfiHttpResponse { status, body: body.as_ptr() };
    let property = data(estate_parse_create_property(client, &resp));
    assert_eq!(property["listing"], "rent");
    assert_eq!(property["owner_id"], session["user"]["id"]);

    let (status, body) = execute(estate_build_list_properties(client));
    let resp = FfiHttpResponse { status, body: body.as_ptr() };
    let listed = data(estate_parse_list_properties(client, &resp));
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let id = CString::new(property["id"].as_str().unwrap()).unwrap();
    let (status, body) = execute(estate_build_delete_property(client, token.as_ptr(), id.as_ptr()));
    let resp = FfiHttpResponse { status, body: body.as_ptr() };
    let result = estate_parse_delete_property(client, &resp);
    assert_eq!(unsafe { &*result }.error_code, FfiErrorCode::Ok);
    assert!(unsafe { &*result }.data_json.is_null());
    estate_free_result(result);

    let (status, body) = execute(estate_build_get_property(client, id.as_ptr()));
    let resp = FfiHttpResponse { status, body: body.as_ptr() };
    let result = estate_parse_get_property(client, &resp);
    let r = unsafe { &*result };
    assert_eq!(r.error_code, FfiErrorCode::NotFound);
    assert_eq!(c_str(r.message), format!("Property {} not found", c_str(id.as_ptr())));
    assert!(estate_adapter_handle_result(adapter, result));
    estate_free_result(result);

    let view = estate_adapter_view(adapter);
    assert_eq!(unsafe { &*view }.error_code, FfiErrorCode::NotFound);
    estate_free_result(view);

    estate_adapter_clear(adapter);
    assert!(estate_adapter_view(adapter).is_null());

    estate_adapter_free(adapter);
    estate_client_free(client);
}

#[test]
fn validation_failure_exposes_field_json() {
    let base = CString::new(start_server()).unwrap();
    let client = estate_client_new(base.as_ptr());

    let payload = CString::new(r#"{"name":"","email":"ana-at-example"}"#).unwrap();
    let (status, body) = execute(estate_build_create_user(client, payload.as_ptr()));
    let resp = FfiHttpResponse { status, body: body.as_ptr() };
    let result = estate_parse_create_user(client, &resp);
    let r = unsafe { &*result };

    assert_eq!(r.error_code, FfiErrorCode::ValidationFailed);
    let fields: serde_json::Value = serde_json::from_str(&c_str(r.field_errors_json)).unwrap();
    assert_eq!(fields["email"], "invalid format");
    assert_eq!(fields["name"], "is required");

    estate_free_result(result);
    estate_client_free(client);
}

#[test]
fn host_side_network_error_is_classified() {
    let adapter = estate_adapter_new();
    assert!(estate_adapter_handle_response(
        adapter,
        -1,
        std::ptr::null(),
        FfiSubject::Property as u32,
        FfiAction::List as u32,
    ));

    let view = estate_adapter_view(adapter);
    let v = unsafe { &*view };
    assert_eq!(v.error_code, FfiErrorCode::Connectivity);
    assert_eq!(v.http_status, -1);
    assert!(v.field_errors_json.is_null());
    estate_free_result(view);
    estate_adapter_free(adapter);
}
