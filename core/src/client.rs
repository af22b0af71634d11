//! Stateless HTTP request builder and response parser for the marketplace API.
//!
//! # Design
//! `MarketplaceClient` holds only a `base_url`. Each operation is split into a
//! `build_*` method that produces an `HttpRequest` and a `parse_*` method that
//! consumes the host's `HttpResponse`. Failed responses are classified right
//! here through the subject's wrapper, so every `Err` from a `parse_*` method
//! is a `Failure::Classified` that an `ErrorAdapter` shows as-is.

use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::context::{Action, Subject};
use crate::error::{Failure, RequestError};
use crate::failure::RawFailure;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{
    AuthSession, CreateProperty, CreateUser, LoginRequest, Property, RegisterRequest, UpdateUser,
    User,
};
use crate::wrappers::wrap_for;

/// Stateless client for the marketplace REST API.
///
/// `build_*` methods produce requests for the host to execute; `parse_*`
/// methods decode the matching response and hand back failures already
/// classified for their subject and action.
#[derive(Debug, Clone)]
pub struct MarketplaceClient {
    base_url: String,
}

impl MarketplaceClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    // -- auth --

    pub fn build_register(&self, input: &RegisterRequest) -> Result<HttpRequest, RequestError> {
        self.json_request(HttpMethod::Post, "/auth/register", None, input)
    }

    pub fn parse_register(&self, response: HttpResponse) -> Result<AuthSession, Failure> {
        decode(response, 201, Subject::Auth, Action::Register)
    }

    pub fn build_login(&self, input: &LoginRequest) -> Result<HttpRequest, RequestError> {
        self.json_request(HttpMethod::Post, "/auth/login", None, input)
    }

    pub fn parse_login(&self, response: HttpResponse) -> Result<AuthSession, Failure> {
        decode(response, 200, Subject::Auth, Action::Login)
    }

    // -- users --

    pub fn build_list_users(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/users".to_string(), None)
    }

    pub fn parse_list_users(&self, response: HttpResponse) -> Result<Vec<User>, Failure> {
        decode(response, 200, Subject::User, Action::List)
    }

    pub fn build_get_user(&self, id: Uuid) -> HttpRequest {
        self.request(HttpMethod::Get, format!("/users/{id}"), None)
    }

    pub fn parse_get_user(&self, response: HttpResponse) -> Result<User, Failure> {
        decode(response, 200, Subject::User, Action::Fetch)
    }

    pub fn build_create_user(&self, input: &CreateUser) -> Result<HttpRequest, RequestError> {
        self.json_request(HttpMethod::Post, "/users", None, input)
    }

    pub fn parse_create_user(&self, response: HttpResponse) -> Result<User, Failure> {
        decode(response, 201, Subject::User, Action::Create)
    }

    pub fn build_update_user(&self, id: Uuid, input: &UpdateUser) -> Result<HttpRequest, RequestError> {
        self.json_request(HttpMethod::Put, &format!("/users/{id}"), None, input)
    }

    pub fn parse_update_user(&self, response: HttpResponse) -> Result<User, Failure> {
        decode(response, 200, Subject::User, Action::Update)
    }

    pub fn build_delete_user(&self, id: Uuid) -> HttpRequest {
        self.request(HttpMethod::Delete, format!("/users/{id}"), None)
    }

    pub fn parse_delete_user(&self, response: HttpResponse) -> Result<(), Failure> {
        expect_status(&response, 204, Subject::User, Action::Delete)
    }

    // -- properties --

    pub fn build_list_properties(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/properties".to_string(), None)
    }

    pub fn parse_list_properties(&self, response: HttpResponse) -> Result<Vec<Property>, Failure> {
        decode(response, 200, Subject::Property, Action::List)
    }

    pub fn build_get_property(&self, id: Uuid) -> HttpRequest {
        self.request(HttpMethod::Get, format!("/properties/{id}"), None)
    }

    pub fn parse_get_property(&self, response: HttpResponse) -> Result<Property, Failure> {
        decode(response, 200, Subject::Property, Action::Fetch)
    }

    pub fn build_create_property(
        &self,
        token: &str,
        input: &CreateProperty,
    ) -> Result<HttpRequest, RequestError> {
        self.json_request(HttpMethod::Post, "/properties", Some(token), input)
    }

    pub fn parse_create_property(&self, response: HttpResponse) -> Result<Property, Failure> {
        decode(response, 201, Subject::Property, Action::Create)
    }

    pub fn build_delete_property(&self, token: &str, id: Uuid) -> HttpRequest {
        self.request(HttpMethod::Delete, format!("/properties/{id}"), Some(token))
    }

    pub fn parse_delete_property(&self, response: HttpResponse) -> Result<(), Failure> {
        expect_status(&response, 204, Subject::Property, Action::Delete)
    }

    fn request(&self, method: HttpMethod, path: String, token: Option<&str>) -> HttpRequest {
        let mut headers = Vec::new();
        if let Some(token) = token {
            headers.push(("authorization".to_string(), format!("Bearer {token}")));
        }
        HttpRequest {
            method,
            path: format!("{}{path}", self.base_url),
            headers,
            body: None,
        }
    }

    fn json_request<T: Serialize>(
        &self,
        method: HttpMethod,
        path: &str,
        token: Option<&str>,
        input: &T,
    ) -> Result<HttpRequest, RequestError> {
        let body = serde_json::to_string(input).map_err(|e| RequestError::Serialization(e.to_string()))?;
        let mut req = self.request(method, path.to_string(), token);
        req.headers
            .insert(0, ("content-type".to_string(), "application/json".to_string()));
        req.body = Some(body);
        Ok(req)
    }
}

/// Classify a non-`expected` response for `(subject, action)`.
fn expect_status(
    response: &HttpResponse,
    expected: u16,
    subject: Subject,
    action: Action,
) -> Result<(), Failure> {
    if response.status == expected {
        return Ok(());
    }
    let raw = RawFailure::from_response(response);
    Err(Failure::Classified(wrap_for(subject).classify(raw, action)))
}

/// Check the status, then decode the body. An undecodable success body is
/// classified like a malformed failure body.
fn decode<T: DeserializeOwned>(
    response: HttpResponse,
    expected: u16,
    subject: Subject,
    action: Action,
) -> Result<T, Failure> {
    expect_status(&response, expected, subject, action)?;
    serde_json::from_str(&response.body).map_err(|_| {
        let raw = RawFailure::undecodable(&response);
        Failure::Classified(wrap_for(subject).classify(raw, action))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::types::ListingKind;

    fn client() -> MarketplaceClient {
        MarketplaceClient::new("http://localhost:3000")
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse::new(status, body)
    }

    fn classified(failure: Failure) -> crate::error::ClassifiedError {
        match failure {
            Failure::Classified(err) => err,
            Failure::Raw(raw) => panic!("expected classified failure, got raw {raw:?}"),
        }
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let req = MarketplaceClient::new("http://localhost:3000/").build_list_users();
        assert_eq!(req.path, "http://localhost:3000/users");
    }

    #[test]
    fn build_get_user_produces_correct_request() {
        let req = client().build_get_user(Uuid::nil());
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.path, "http://localhost:3000/users/00000000-0000-0000-0000-000000000000");
        assert!(req.body.is_none());
        assert!(req.headers.is_empty());
    }

    #[test]
    fn build_login_posts_json() {
        let input = LoginRequest {
            email: "ana@example.com".to_string(),
            password: "hunter22".to_string(),
        };
        let req = client().build_login(&input).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "http://localhost:3000/auth/login");
        assert_eq!(
            req.headers,
            vec![("content-type".to_string(), "application/json".to_string())]
        );
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["email"], "ana@example.com");
    }

    #[test]
    fn build_update_user_omits_unset_fields() {
        let input = UpdateUser {
            phone: Some("+34 600 000 000".to_string()),
            ..UpdateUser::default()
        };
        let req = client().build_update_user(Uuid::nil(), &input).unwrap();
        assert_eq!(req.method, HttpMethod::Put);
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["phone"], "+34 600 000 000");
        assert!(body.get("name").is_none());
        assert!(body.get("email").is_none());
    }

    #[test]
    fn property_writes_carry_bearer_token() {
        let input = CreateProperty {
            title: "Loft".to_string(),
            address: "1 Main St".to_string(),
            price: 25_000_000,
            listing: ListingKind::Sale,
        };
        let req = client().build_create_property("tok", &input).unwrap();
        assert_eq!(req.headers.len(), 2);
        assert_eq!(req.header("Authorization"), Some("Bearer tok"));
        assert_eq!(req.header("content-type"), Some("application/json"));
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["listing"], "sale");

        let req = client().build_delete_property("tok", Uuid::nil());
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(req.headers, vec![("authorization".to_string(), "Bearer tok".to_string())]);
    }

    #[test]
    fn parse_get_user_success() {
        let user = client()
            .parse_get_user(response(
                200,
                r#"{"id":"00000000-0000-0000-0000-000000000001","name":"Ana","email":"ana@example.com"}"#,
            ))
            .unwrap();
        assert_eq!(user.name, "Ana");
        assert!(user.phone.is_none());
    }

    #[test]
    fn parse_get_property_not_found_keeps_server_text() {
        let err = client()
            .parse_get_property(response(404, r#"{"error":"Property 42 not found"}"#))
            .unwrap_err();
        let err = classified(err);
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.message(), "Property 42 not found");
    }

    #[test]
    fn parse_create_user_server_error_uses_fallback() {
        let err = classified(client().parse_create_user(response(500, "{}")).unwrap_err());
        assert_eq!(err.kind(), ErrorKind::ServerError);
        assert_eq!(err.message(), "Could not create user, try again.");
    }

    #[test]
    fn parse_register_validation_map() {
        let err = classified(
            client()
                .parse_register(response(400, r#"{"email":"invalid format","password":"too short"}"#))
                .unwrap_err(),
        );
        assert_eq!(err.kind(), ErrorKind::ValidationFailed);
        assert_eq!(err.field_errors().unwrap().len(), 2);
    }

    #[test]
    fn parse_list_users_bad_json_is_unknown() {
        let err = classified(client().parse_list_users(response(200, "not json")).unwrap_err());
        assert_eq!(err.kind(), ErrorKind::Unknown);
        assert_eq!(err.raw().status, Some(200));
    }

    #[test]
    fn parse_delete_user_success_and_wrong_status() {
        assert!(client().parse_delete_user(response(204, "")).is_ok());
        let err = classified(client().parse_delete_user(response(200, "")).unwrap_err());
        assert_eq!(err.kind(), ErrorKind::Unknown);
    }

    #[test]
    fn parse_delete_property_forbidden() {
        let err = classified(
            client()
                .parse_delete_property(response(403, r#"{"error":"Only the owner can remove this property"}"#))
                .unwrap_err(),
        );
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert_eq!(err.message(), "Only the owner can remove this property");
    }
}
