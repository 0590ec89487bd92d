//! Typed client for CRUD-style JSON REST APIs.
//!
//! # Overview
//! A `ResourceClient` wraps one resource collection (e.g. `/api/v1/users`)
//! and exposes list, get, create, patch, delete and named actions. Each call
//! is one request/response round trip through a single pipeline:
//! `Descriptor` → `HttpRequest` → `Transport` → `HttpResponse` → `Payload`
//! or `ApiError`.
//!
//! # Design
//! - Request building and outcome classification are pure functions over
//!   plain data (`http` module); only `ResourceClient::request` does I/O.
//! - The transport is a trait object, so tests and hosts can substitute
//!   their own HTTP stack. `ReqwestTransport` is the default.
//! - Query values are JSON-encoded per value before form encoding.
//! - 401 is the only status with its own error kind; all other failures
//!   share `ApiError::Http`. Nothing is retried.
//!
//! ```no_run
//! use crud_client::{GetManyRequest, ResourceClient};
//! use serde_json::Value;
//!
//! # async fn run() -> Result<(), crud_client::ApiError> {
//! let users: ResourceClient<Value> = ResourceClient::new("http://localhost:3000/api/v1/users")?;
//! let first_five = users.get_many(GetManyRequest::new().limit(5)).await?;
//! # let _ = first_five;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod contract;
pub mod descriptor;
pub mod error;
pub mod http;
pub mod target;
pub mod transport;

pub use client::{Payload, RawBody, ResourceClient};
pub use config::ClientConfig;
pub use contract::{
    ActionRequest, DeleteOneRequest, GetManyRequest, GetOneRequest, PatchOneRequest,
    PostOneRequest, RecordId,
};
pub use descriptor::{AccessToken, Descriptor, Query, RequestOptions};
pub use error::{ApiError, Failure};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::{ReqwestTransport, Transport, TransportError};
