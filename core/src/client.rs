//! The request pipeline and the CRUD verbs built on it.
//!
//! # Design
//! `ResourceClient` holds an endpoint, an optional stored bearer token and a
//! shared `Transport`. Every call goes through the same three steps:
//!
//! 1. `build_request` turns a `Descriptor` into an `HttpRequest` (URL,
//!    headers, payload). Missing stored tokens fail here, before any I/O.
//! 2. `request` hands it to the transport. Pre-response failures become
//!    `ApiError::Connection`.
//! 3. `classify` maps the `HttpResponse` to a `Payload` or a typed error.
//!
//! Steps 1 and 3 are pure, so they are tested directly against plain data.
//! The verb methods only construct descriptors and decode payloads. Nothing
//! here retries; callers own retry and timeout policy.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use reqwest::header::HeaderValue;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::ClientConfig;
use crate::contract::{
    ActionRequest, DeleteOneRequest, GetManyRequest, GetOneRequest, PatchOneRequest,
    PostOneRequest,
};
use crate::descriptor::{AccessToken, Descriptor};
use crate::error::{ApiError, Failure};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::target;
use crate::transport::{ReqwestTransport, Transport};

/// Unparsed response body, returned for deletions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawBody(pub Vec<u8>);

impl RawBody {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.0).into_owned()
    }
}

/// Successful outcome of a round trip.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Parsed JSON body. An empty body parses as `Value::Null`.
    Json(Value),
    /// Body of a DELETE, never parsed.
    Raw(RawBody),
}

impl Payload {
    /// Decode the payload into `R`.
    pub fn decode<R: DeserializeOwned>(self) -> Result<R, ApiError> {
        match self {
            Payload::Json(value) => {
                let body = value.to_string();
                serde_json::from_value(value)
                    .map_err(|source| ApiError::Deserialization { source, body })
            }
            Payload::Raw(raw) => serde_json::from_slice(raw.as_bytes()).map_err(|source| {
                ApiError::Deserialization {
                    source,
                    body: raw.text(),
                }
            }),
        }
    }

    pub fn into_raw(self) -> RawBody {
        match self {
            Payload::Raw(raw) => raw,
            Payload::Json(value) => RawBody(value.to_string().into_bytes()),
        }
    }
}

/// Typed client for one resource collection.
///
/// `T` is the record type returned by list/get/create/update. Clones share
/// the transport; each clone has its own copy of the stored token.
pub struct ResourceClient<T = Value> {
    endpoint: String,
    access_token: Option<String>,
    transport: Arc<dyn Transport>,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for ResourceClient<T> {
    fn clone(&self) -> Self {
        Self {
            endpoint: self.endpoint.clone(),
            access_token: self.access_token.clone(),
            transport: Arc::clone(&self.transport),
            _record: PhantomData,
        }
    }
}

impl<T> fmt::Debug for ResourceClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceClient")
            .field("endpoint", &self.endpoint)
            .field("has_access_token", &self.access_token.is_some())
            .finish()
    }
}

impl<T> ResourceClient<T> {
    /// Client for `endpoint` using a `reqwest` transport with the default
    /// timeout.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, ApiError> {
        let transport = ReqwestTransport::with_default_timeout()
            .map_err(|e| ApiError::configuration(format!("cannot build transport: {e}")))?;
        Ok(Self::with_transport(endpoint, transport))
    }

    pub fn with_transport(endpoint: impl Into<String>, transport: impl Transport + 'static) -> Self {
        Self::with_shared_transport(endpoint, Arc::new(transport))
    }

    pub fn with_shared_transport(endpoint: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            endpoint: endpoint.into(),
            access_token: None,
            transport,
            _record: PhantomData,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        let transport = ReqwestTransport::new(config.timeout)
            .map_err(|e| ApiError::configuration(format!("cannot build transport: {e}")))?;
        let mut client = Self::with_transport(config.endpoint.clone(), transport);
        client.access_token = config.access_token.clone();
        Ok(client)
    }

    /// Same transport and token, different record type or endpoint.
    pub fn for_resource<U>(&self, endpoint: impl Into<String>) -> ResourceClient<U> {
        ResourceClient {
            endpoint: endpoint.into(),
            access_token: self.access_token.clone(),
            transport: Arc::clone(&self.transport),
            _record: PhantomData,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn set_access_token(&mut self, token: impl Into<String>) {
        self.access_token = Some(token.into());
    }

    pub fn clear_access_token(&mut self) {
        self.access_token = None;
    }

    /// The bearer token a call with `requirement` sends, if any.
    fn bearer_token(&self, requirement: &AccessToken) -> Result<Option<String>, ApiError> {
        match requirement {
            AccessToken::None => Ok(None),
            AccessToken::Explicit(token) if token.is_empty() => Ok(None),
            AccessToken::Explicit(token) => Ok(Some(token.clone())),
            AccessToken::Stored => match self.access_token.as_deref() {
                Some(token) if !token.is_empty() => Ok(Some(token.to_string())),
                _ => Err(ApiError::configuration(
                    "request requires the stored access token, but none is set",
                )),
            },
        }
    }

    /// Resolve `descriptor` into the request the transport will send.
    pub fn build_request(&self, descriptor: &Descriptor) -> Result<HttpRequest, ApiError> {
        let url = target::resolve(&self.endpoint, descriptor);

        let mut headers = vec![
            ("Content-Type".to_string(), "application/json".to_string()),
            ("Accept".to_string(), "application/json".to_string()),
        ];
        if let Some(token) = self.bearer_token(&descriptor.access_token)? {
            let value = format!("Bearer {token}");
            if HeaderValue::from_str(&value).is_err() {
                return Err(ApiError::configuration(
                    "access token contains characters not allowed in an HTTP header",
                ));
            }
            headers.push(("Authorization".to_string(), value));
        }

        let body = descriptor
            .body
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(ApiError::Serialization)?;

        Ok(HttpRequest {
            method: descriptor.method,
            url,
            headers,
            body,
        })
    }

    /// Map a received response to a payload or a typed error.
    ///
    /// `request` should be the redacted request; it is stored in the error.
    pub fn classify(
        descriptor: &Descriptor,
        request: &HttpRequest,
        response: HttpResponse,
    ) -> Result<Payload, ApiError> {
        if !response.is_success() {
            let kind = if response.status == 401 {
                ApiError::Authentication
            } else {
                ApiError::Http
            };
            return Err(kind(Box::new(Failure {
                message: format!(
                    "{} {} returned {} {}",
                    request.method, request.url, response.status, response.status_text
                ),
                descriptor: descriptor.clone(),
                request: request.clone(),
                response: Some(response),
            })));
        }

        if descriptor.method == HttpMethod::Delete {
            return Ok(Payload::Raw(RawBody(response.body)));
        }

        if response.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Payload::Json(Value::Null));
        }

        serde_json::from_slice(&response.body)
            .map(Payload::Json)
            .map_err(|source| ApiError::Deserialization {
                source,
                body: response.text(),
            })
    }

    /// Run one round trip for `descriptor`.
    pub async fn request(&self, descriptor: Descriptor) -> Result<Payload, ApiError> {
        let request = self.build_request(&descriptor)?;
        let sent = request.redacted();

        debug!(method = %request.method, url = %request.url, "sending request");
        let response = match self.transport.send(&request).await {
            Ok(response) => response,
            Err(e) => {
                return Err(ApiError::Connection(Box::new(Failure {
                    message: format!("{} {} failed: {e}", request.method, request.url),
                    descriptor,
                    request: sent,
                    response: None,
                })));
            }
        };
        debug!(
            method = %request.method,
            url = %request.url,
            status = response.status,
            "response received"
        );

        Self::classify(&descriptor, &sent, response)
    }
}

impl<T: DeserializeOwned> ResourceClient<T> {
    /// GET the collection, with `query` as filter and pagination.
    pub async fn get_many(&self, request: GetManyRequest) -> Result<Vec<T>, ApiError> {
        let descriptor = Descriptor::get()
            .with_query(request.query)
            .apply(request.options);
        self.request(descriptor).await?.decode()
    }

    /// GET `<endpoint>/<id>`.
    pub async fn get_one(&self, request: GetOneRequest) -> Result<T, ApiError> {
        let descriptor = Descriptor::get()
            .with_path(request.id.to_string())
            .apply(request.options);
        self.request(descriptor).await?.decode()
    }

    /// POST a new record to the collection.
    pub async fn post_one<B: Serialize>(&self, request: PostOneRequest<B>) -> Result<T, ApiError> {
        let descriptor = Descriptor::post()
            .with_body(request.body)?
            .apply(request.options);
        self.request(descriptor).await?.decode()
    }

    /// PATCH `<endpoint>/<id>` with a partial record.
    pub async fn patch_one<P: Serialize>(&self, request: PatchOneRequest<P>) -> Result<T, ApiError> {
        let descriptor = Descriptor::patch()
            .with_path(request.id.to_string())
            .with_body(request.body)?
            .apply(request.options);
        self.request(descriptor).await?.decode()
    }

    /// DELETE `<endpoint>/<id>`. The body is returned unparsed.
    pub async fn delete_one(&self, request: DeleteOneRequest) -> Result<RawBody, ApiError> {
        let descriptor = Descriptor::delete()
            .with_path(request.id.to_string())
            .apply(request.options);
        Ok(self.request(descriptor).await?.into_raw())
    }

    /// POST `<endpoint>/<name>` for operations outside plain CRUD, such as
    /// `login`.
    pub async fn action<B, R>(&self, name: &str, request: ActionRequest<B>) -> Result<R, ApiError>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let mut descriptor = Descriptor::post()
            .with_path(name)
            .with_query(request.query);
        if let Some(body) = request.body {
            descriptor = descriptor.with_body(body)?;
        }
        self.request(descriptor.apply(request.options)).await?.decode()
    }
}
