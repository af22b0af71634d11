//! Verify classification against the JSON cases in `test-vectors/classify.json`.
//!
//! Each case gives the raw status and body text as the transport would hand
//! them over, an optional operation context, and the expected kind, message,
//! and field errors.

use estate_core::{
    classify, wrap_for, Action, ErrorAdapter, ErrorKind, HttpResponse, OperationContext, RawFailure,
    Subject,
};

fn parse_kind(s: &str) -> ErrorKind {
    match s {
        "connectivity" => ErrorKind::Connectivity,
        "bad_request" => ErrorKind::BadRequest,
        "unauthorized" => ErrorKind::Unauthorized,
        "forbidden" => ErrorKind::Forbidden,
        "not_found" => ErrorKind::NotFound,
        "conflict" => ErrorKind::Conflict,
        "validation_failed" => ErrorKind::ValidationFailed,
        "server_error" => ErrorKind::ServerError,
        "unknown" => ErrorKind::Unknown,
        other => panic!("unknown kind: {other}"),
    }
}

fn parse_subject(s: &str) -> Subject {
    match s {
        "user" => Subject::User,
        "auth" => Subject::Auth,
        "property" => Subject::Property,
        "transaction" => Subject::Transaction,
        "verification" => Subject::Verification,
        other => panic!("unknown subject: {other}"),
    }
}

fn parse_action(s: &str) -> Action {
    match s {
        "fetch" => Action::Fetch,
        "list" => Action::List,
        "create" => Action::Create,
        "update" => Action::Update,
        "delete" => Action::Delete,
        "login" => Action::Login,
        "register" => Action::Register,
        other => panic!("unknown action: {other}"),
    }
}

fn raw_failure(case: &serde_json::Value) -> RawFailure {
    let body = case["body"].as_str().unwrap();
    match case["status"].as_u64() {
        Some(status) => RawFailure::from_response(&HttpResponse::new(status as u16, body)),
        None => RawFailure::unreachable(),
    }
}

fn context(case: &serde_json::Value) -> Option<OperationContext> {
    let ctx = case.get("context").filter(|c| !c.is_null())?;
    Some(OperationContext::new(
        parse_subject(ctx["subject"].as_str().unwrap()),
        parse_action(ctx["action"].as_str().unwrap()),
    ))
}

fn cases() -> Vec<serde_json::Value> {
    let raw = include_str!("../../test-vectors/classify.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();
    vectors["cases"].as_array().unwrap().clone()
}

#[test]
fn classify_test_vectors() {
    for case in cases() {
        let name = case["name"].as_str().unwrap();
        let expected = &case["expected"];

        let err = classify(raw_failure(&case), context(&case));

        assert_eq!(err.kind(), parse_kind(expected["kind"].as_str().unwrap()), "{name}: kind");
        assert_eq!(err.message(), expected["message"].as_str().unwrap(), "{name}: message");

        match expected.get("field_errors") {
            Some(fields) => {
                let actual = serde_json::to_value(err.field_errors().unwrap()).unwrap();
                assert_eq!(&actual, fields, "{name}: field errors");
            }
            None => assert!(err.field_errors().is_none(), "{name}: unexpected field errors"),
        }
    }
}

#[test]
fn wrappers_agree_with_vectors() {
    for case in cases() {
        let Some(ctx) = context(&case) else { continue };
        let name = case["name"].as_str().unwrap();
        let via_wrapper = wrap_for(ctx.subject).classify(raw_failure(&case), ctx.action);
        assert_eq!(via_wrapper, classify(raw_failure(&case), Some(ctx)), "{name}");
    }
}

#[test]
fn adapter_shows_last_vector_only() {
    let mut adapter = ErrorAdapter::new();
    let all = cases();
    for case in &all {
        adapter.handle_error(raw_failure(case), context(case));
    }
    let last = all.last().unwrap();
    let expected = classify(raw_failure(last), context(last));
    assert_eq!(adapter.classified_error(), Some(&expected));
}
