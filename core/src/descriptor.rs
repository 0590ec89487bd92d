//! Structured description of one API call.
//!
//! # Design
//! A `Descriptor` names every input the pipeline understands as a typed
//! optional field. Verb wrappers fill in method and path suffix, then copy
//! the caller's `RequestOptions` on top, so precedence between the two is
//! decided field by field in one place (`Descriptor::apply`).

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::http::HttpMethod;

/// Query parameters keyed by name. Values are JSON-encoded one by one when
/// the URL is built. Keys serialize in sorted order.
pub type Query = BTreeMap<String, Value>;

/// Which bearer token, if any, a call sends. `Debug` never prints the
/// token itself.
#[derive(Clone, Default, PartialEq, Eq)]
pub enum AccessToken {
    /// No Authorization header.
    #[default]
    None,
    /// The token stored on the client. Fails with a configuration error when
    /// nothing is stored.
    Stored,
    /// This exact token, regardless of what the client stores.
    Explicit(String),
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessToken::None => f.write_str("None"),
            AccessToken::Stored => f.write_str("Stored"),
            AccessToken::Explicit(_) => f.write_str("Explicit(<redacted>)"),
        }
    }
}

impl From<bool> for AccessToken {
    fn from(required: bool) -> Self {
        if required {
            AccessToken::Stored
        } else {
            AccessToken::None
        }
    }
}

impl From<String> for AccessToken {
    fn from(token: String) -> Self {
        AccessToken::Explicit(token)
    }
}

impl From<&str> for AccessToken {
    fn from(token: &str) -> Self {
        AccessToken::Explicit(token.to_string())
    }
}

/// Per-call overrides accepted by every verb.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    /// Replaces the client's endpoint for this call.
    pub url: Option<String>,
    pub access_token: AccessToken,
}

impl RequestOptions {
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_access_token(mut self, token: impl Into<AccessToken>) -> Self {
        self.access_token = token.into();
        self
    }
}

/// A single API call before it is resolved into an `HttpRequest`.
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    pub method: HttpMethod,
    pub url: Option<String>,
    /// Record id or action name appended to the base URL.
    pub path: Option<String>,
    pub query: Option<Query>,
    pub body: Option<Value>,
    pub access_token: AccessToken,
}

impl Descriptor {
    pub fn new(method: HttpMethod) -> Self {
        Self {
            method,
            url: None,
            path: None,
            query: None,
            body: None,
            access_token: AccessToken::None,
        }
    }

    pub fn get() -> Self {
        Self::new(HttpMethod::Get)
    }

    pub fn post() -> Self {
        Self::new(HttpMethod::Post)
    }

    pub fn patch() -> Self {
        Self::new(HttpMethod::Patch)
    }

    pub fn delete() -> Self {
        Self::new(HttpMethod::Delete)
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_query(mut self, query: Query) -> Self {
        self.query = Some(query);
        self
    }

    /// Add one query parameter, encoding `value` to JSON now.
    pub fn with_query_param(
        mut self,
        name: impl Into<String>,
        value: impl Serialize,
    ) -> Result<Self, ApiError> {
        let value = serde_json::to_value(value).map_err(ApiError::Serialization)?;
        self.query.get_or_insert_with(Query::new).insert(name.into(), value);
        Ok(self)
    }

    pub fn with_body(mut self, body: impl Serialize) -> Result<Self, ApiError> {
        self.body = Some(serde_json::to_value(body).map_err(ApiError::Serialization)?);
        Ok(self)
    }

    pub fn with_json_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_access_token(mut self, token: impl Into<AccessToken>) -> Self {
        self.access_token = token.into();
        self
    }

    /// Copy caller options onto this descriptor. A caller URL replaces any
    /// URL already set; the token requirement is always the caller's.
    pub fn apply(mut self, options: RequestOptions) -> Self {
        if let Some(url) = options.url {
            self.url = Some(url);
        }
        self.access_token = options.access_token;
        self
    }
}
