//! In-memory marketplace backend used by the client's integration tests.
//!
//! Besides the happy paths it reproduces every failure shape the client has to
//! classify: field-validation maps, `{"error": ...}` envelopes for 401/403/404/409,
//! and, through the `x-mock-fault` header, arbitrary status codes with an empty
//! JSON object body.

pub mod config;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::{
    extract::{Path, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const FAULT_HEADER: &str = "x-mock-fault";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Listing {
    Sale,
    Rent,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Property {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub address: String,
    pub price: u64,
    pub listing: Listing,
}

// Input fields default to empty so missing values surface as field errors
// instead of axum's plain-text rejection.

#[derive(Deserialize)]
pub struct CreateUser {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Deserialize)]
pub struct Register {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
pub struct Login {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
pub struct CreateProperty {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub price: u64,
    pub listing: Option<Listing>,
}

struct UserRecord {
    user: User,
    password: Option<String>,
}

#[derive(Default)]
pub struct Store {
    users: HashMap<Uuid, UserRecord>,
    sessions: HashMap<String, Uuid>,
    properties: HashMap<Uuid, Property>,
}

impl Store {
    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.users
            .values()
            .any(|r| r.user.email.eq_ignore_ascii_case(email) && Some(r.user.id) != except)
    }
}

pub type Db = Arc<RwLock<Store>>;

/// Failure responses in the shapes real backends send.
#[derive(Debug)]
pub enum ApiError {
    Validation(BTreeMap<&'static str, String>),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(fields) => (StatusCode::BAD_REQUEST, Json(json!(fields))).into_response(),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, Json(json!({ "error": msg }))).into_response(),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, Json(json!({ "error": msg }))).into_response(),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, Json(json!({ "error": msg }))).into_response(),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, Json(json!({ "error": msg }))).into_response(),
        }
    }
}

type ApiResult<T> = Result<T, ApiError>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/users", get(list_users).post(create_user))
        .route("/users/{id}", get(get_user).put(update_user).delete(delete_user))
        .route("/properties", get(list_properties).post(create_property))
        .route("/properties/{id}", get(get_property).delete(delete_property))
        .layer(middleware::from_fn(inject_fault))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Answer with the status named in `x-mock-fault` and an empty JSON object.
async fn inject_fault(req: Request, next: Next) -> Response {
    let fault = req
        .headers()
        .get(FAULT_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u16>().ok())
        .and_then(|code| StatusCode::from_u16(code).ok());
    match fault {
        Some(status) => {
            tracing::debug!(%status, path = %req.uri().path(), "injecting fault");
            (status, Json(json!({}))).into_response()
        }
        None => next.run(req).await,
    }
}

// --- validation ---

fn check_name(fields: &mut BTreeMap<&'static str, String>, name: &str) {
    if name.trim().is_empty() {
        fields.insert("name", "is required".to_string());
    }
}

fn check_email(fields: &mut BTreeMap<&'static str, String>, email: &str) {
    let email = email.trim();
    if email.is_empty() {
        fields.insert("email", "is required".to_string());
        return;
    }
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.ends_with('.'),
        None => false,
    };
    if !valid {
        fields.insert("email", "invalid format".to_string());
    }
}

fn finish(fields: BTreeMap<&'static str, String>) -> ApiResult<()> {
    if fields.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(fields))
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

fn authenticate(store: &Store, headers: &HeaderMap) -> ApiResult<Uuid> {
    let token = bearer_token(headers).ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;
    store
        .sessions
        .get(token)
        .copied()
        .ok_or_else(|| ApiError::Unauthorized("Session expired, please sign in again".to_string()))
}

fn user_not_found(id: Uuid) -> ApiError {
    ApiError::NotFound(format!("User {id} not found"))
}

fn property_not_found(id: Uuid) -> ApiError {
    ApiError::NotFound(format!("Property {id} not found"))
}

// --- auth ---

async fn register(State(db): State<Db>, Json(input): Json<Register>) -> ApiResult<(StatusCode, Json<Session>)> {
    let mut fields = BTreeMap::new();
    check_name(&mut fields, &input.name);
    check_email(&mut fields, &input.email);
    if input.password.chars().count() < 8 {
        fields.insert("password", "too short".to_string());
    }
    finish(fields)?;

    let mut store = db.write().await;
    if store.email_taken(&input.email, None) {
        return Err(ApiError::Conflict("Email already registered".to_string()));
    }
    let user = User {
        id: Uuid::new_v4(),
        name: input.name.trim().to_string(),
        email: input.email.trim().to_string(),
        phone: None,
    };
    let token = Uuid::new_v4().to_string();
    store.sessions.insert(token.clone(), user.id);
    store.users.insert(
        user.id,
        UserRecord {
            user: user.clone(),
            password: Some(input.password),
        },
    );
    tracing::info!(user_id = %user.id, "registered user");
    Ok((StatusCode::CREATED, Json(Session { token, user })))
}

async fn login(State(db): State<Db>, Json(input): Json<Login>) -> ApiResult<Json<Session>> {
    let mut fields = BTreeMap::new();
    if input.email.trim().is_empty() {
        fields.insert("email", "is required".to_string());
    }
    if input.password.is_empty() {
        fields.insert("password", "is required".to_string());
    }
    finish(fields)?;

    let mut store = db.write().await;
    let user = store
        .users
        .values()
        .find(|r| {
            r.user.email.eq_ignore_ascii_case(input.email.trim())
                && r.password.as_deref() == Some(input.password.as_str())
        })
        .map(|r| r.user.clone())
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;
    let token = Uuid::new_v4().to_string();
    store.sessions.insert(token.clone(), user.id);
    Ok(Json(Session { token, user }))
}

// --- users ---

async fn list_users(State(db): State<Db>) -> Json<Vec<User>> {
    let store = db.read().await;
    Json(store.users.values().map(|r| r.user.clone()).collect())
}

async fn create_user(State(db): State<Db>, Json(input): Json<CreateUser>) -> ApiResult<(StatusCode, Json<User>)> {
    let mut fields = BTreeMap::new();
    check_name(&mut fields, &input.name);
    check_email(&mut fields, &input.email);
    finish(fields)?;

    let mut store = db.write().await;
    if store.email_taken(&input.email, None) {
        return Err(ApiError::Conflict("Email already registered".to_string()));
    }
    let user = User {
        id: Uuid::new_v4(),
        name: input.name.trim().to_string(),
        email: input.email.trim().to_string(),
        phone: input.phone,
    };
    store.users.insert(
        user.id,
        UserRecord {
            user: user.clone(),
            password: None,
        },
    );
    Ok((StatusCode::CREATED, Json(user)))
}

async fn get_user(State(db): State<Db>, Path(id): Path<Uuid>) -> ApiResult<Json<User>> {
    let store = db.read().await;
    store
        .users
        .get(&id)
        .map(|r| Json(r.user.clone()))
        .ok_or_else(|| user_not_found(id))
}

async fn update_user(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateUser>,
) -> ApiResult<Json<User>> {
    let mut fields = BTreeMap::new();
    if let Some(name) = &input.name {
        check_name(&mut fields, name);
    }
    if let Some(email) = &input.email {
        check_email(&mut fields, email);
    }
    finish(fields)?;

    let mut store = db.write().await;
    if !store.users.contains_key(&id) {
        return Err(user_not_found(id));
    }
    if let Some(email) = &input.email {
        if store.email_taken(email, Some(id)) {
            return Err(ApiError::Conflict("Email already registered".to_string()));
        }
    }
    let record = store.users.get_mut(&id).ok_or_else(|| user_not_found(id))?;
    if let Some(name) = input.name {
        record.user.name = name.trim().to_string();
    }
    if let Some(email) = input.email {
        record.user.email = email.trim().to_string();
    }
    if let Some(phone) = input.phone {
        record.user.phone = Some(phone);
    }
    Ok(Json(record.user.clone()))
}

async fn delete_user(State(db): State<Db>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    let mut store = db.write().await;
    store.users.remove(&id).ok_or_else(|| user_not_found(id))?;
    store.sessions.retain(|_, user_id| *user_id != id);
    Ok(StatusCode::NO_CONTENT)
}

// --- properties ---

async fn list_properties(State(db): State<Db>) -> Json<Vec<Property>> {
    let store = db.read().await;
    Json(store.properties.values().cloned().collect())
}

async fn get_property(State(db): State<Db>, Path(id): Path<Uuid>) -> ApiResult<Json<Property>> {
    let store = db.read().await;
    store
        .properties
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| property_not_found(id))
}

async fn create_property(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<CreateProperty>,
) -> ApiResult<(StatusCode, Json<Property>)> {
    let mut store = db.write().await;
    let owner_id = authenticate(&store, &headers)?;

    let mut fields = BTreeMap::new();
    if input.title.trim().is_empty() {
        fields.insert("title", "is required".to_string());
    }
    if input.address.trim().is_empty() {
        fields.insert("address", "is required".to_string());
    }
    if input.price == 0 {
        fields.insert("price", "must be greater than zero".to_string());
    }
    if input.listing.is_none() {
        fields.insert("listing", "is required".to_string());
    }
    finish(fields)?;

    let property = Property {
        id: Uuid::new_v4(),
        owner_id,
        title: input.title.trim().to_string(),
        address: input.address.trim().to_string(),
        price: input.price,
        listing: input.listing.unwrap_or(Listing::Sale),
    };
    store.properties.insert(property.id, property.clone());
    tracing::info!(property_id = %property.id, %owner_id, "published property");
    Ok((StatusCode::CREATED, Json(property)))
}

async fn delete_property(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let mut store = db.write().await;
    let caller = authenticate(&store, &headers)?;
    let owner_id = store
        .properties
        .get(&id)
        .map(|p| p.owner_id)
        .ok_or_else(|| property_not_found(id))?;
    if owner_id != caller {
        return Err(ApiError::Forbidden("Only the owner can remove this property".to_string()));
    }
    store.properties.remove(&id);
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_serializes_listing_as_snake_case() {
        let property = Property {
            id: Uuid::nil(),
            owner_id: Uuid::nil(),
            title: "Loft".to_string(),
            address: "1 Main St".to_string(),
            price: 1,
            listing: Listing::Rent,
        };
        let json = serde_json::to_value(&property).unwrap();
        assert_eq!(json["listing"], "rent");
        assert_eq!(json["owner_id"], "00000000-0000-0000-0000-000000000000");
    }

    #[test]
    fn create_user_missing_fields_default_to_empty() {
        let input: CreateUser = serde_json::from_str("{}").unwrap();
        assert!(input.name.is_empty());
        assert!(input.email.is_empty());
        assert!(input.phone.is_none());
    }

    #[test]
    fn email_validation() {
        let mut fields = BTreeMap::new();
        check_email(&mut fields, "ana@example.com");
        assert!(fields.is_empty());

        check_email(&mut fields, "ana@example");
        assert_eq!(fields["email"], "invalid format");

        let mut fields = BTreeMap::new();
        check_email(&mut fields, "   ");
        assert_eq!(fields["email"], "is required");
    }

    #[test]
    fn bearer_token_is_extracted() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_none());
        headers.insert("authorization", "Bearer abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc"));
        headers.insert("authorization", "Basic abc".parse().unwrap());
        assert!(bearer_token(&headers).is_none());
    }

    #[test]
    fn validation_error_renders_field_map() {
        let mut fields = BTreeMap::new();
        fields.insert("name", "is required".to_string());
        let response = ApiError::Validation(fields).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
