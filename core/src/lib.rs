//! Client core for the real-estate marketplace app.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern), and turns every failed call
//! into a UI-safe `ClassifiedError`.
//!
//! # Design
//! - `classify` maps `(RawFailure, OperationContext)` to a closed `ErrorKind`,
//!   a non-empty message, and field errors for validation failures.
//! - `wrappers` bind the classifier to one subject with targeted copy for
//!   server errors.
//! - `ErrorAdapter` is the per-screen holder the presenter reads from; it shows
//!   one error at a time and never classifies a failure twice.
//! - `MarketplaceClient` is stateless and classifies failures as it parses.

pub mod adapter;
pub mod classify;
pub mod client;
pub mod context;
pub mod error;
pub mod failure;
pub mod http;
pub mod types;
pub mod wrappers;

pub use adapter::{AdapterState, ErrorAdapter};
pub use classify::classify;
pub use client::MarketplaceClient;
pub use context::{Action, OperationContext, Subject};
pub use error::{ClassifiedError, ErrorKind, Failure, FieldErrors, RequestError};
pub use failure::{FailureStatus, RawFailure, ResponseBody};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use types::{
    AuthSession, CreateProperty, CreateUser, ListingKind, LoginRequest, Property, RegisterRequest,
    UpdateUser, User,
};
pub use wrappers::{wrap_for, OperationClassifier};
