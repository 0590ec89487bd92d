//! Request shapes shared with the server's contract.
//!
//! # Design
//! The pipeline treats these as opaque apart from the record id and the
//! per-call `RequestOptions`. Pagination and filter keys live in `query`
//! exactly as the server names them (`limit`, `offset`, `where`, ...), and
//! patch bodies are whatever partial shape the caller serializes.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::descriptor::{Query, RequestOptions};

/// Identifier of a record: numeric or string, rendered verbatim as a path
/// segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(n) => write!(f, "{n}"),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        RecordId::Number(id)
    }
}

impl From<i32> for RecordId {
    fn from(id: i32) -> Self {
        RecordId::Number(id.into())
    }
}

impl From<u32> for RecordId {
    fn from(id: u32) -> Self {
        RecordId::Number(id.into())
    }
}

/// Ids above `i64::MAX` keep their digits as text.
impl From<u64> for RecordId {
    fn from(id: u64) -> Self {
        i64::try_from(id)
            .map(RecordId::Number)
            .unwrap_or_else(|_| RecordId::Text(id.to_string()))
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        RecordId::Text(id)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        RecordId::Text(id.to_string())
    }
}

impl From<Uuid> for RecordId {
    fn from(id: Uuid) -> Self {
        RecordId::Text(id.to_string())
    }
}

/// List records, filtered and paginated by `query`.
#[derive(Debug, Clone, Default)]
pub struct GetManyRequest {
    pub query: Query,
    pub options: RequestOptions,
}

impl GetManyRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit(self, limit: u64) -> Self {
        self.param("limit", Value::from(limit))
    }

    pub fn offset(self, offset: u64) -> Self {
        self.param("offset", Value::from(offset))
    }

    /// Exact-match filter on record fields.
    pub fn filter(self, conditions: Value) -> Self {
        self.param("where", conditions)
    }

    pub fn param(mut self, name: impl Into<String>, value: Value) -> Self {
        self.query.insert(name.into(), value);
        self
    }

    pub fn options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }
}

/// Fetch one record by id.
#[derive(Debug, Clone)]
pub struct GetOneRequest {
    pub id: RecordId,
    pub options: RequestOptions,
}

impl GetOneRequest {
    pub fn new(id: impl Into<RecordId>) -> Self {
        Self {
            id: id.into(),
            options: RequestOptions::default(),
        }
    }

    pub fn options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }
}

/// Create a record from `body`.
#[derive(Debug, Clone)]
pub struct PostOneRequest<T> {
    pub body: T,
    pub options: RequestOptions,
}

impl<T> PostOneRequest<T> {
    pub fn new(body: T) -> Self {
        Self {
            body,
            options: RequestOptions::default(),
        }
    }

    pub fn options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }
}

/// Apply the partial record `body` to the record `id`.
#[derive(Debug, Clone)]
pub struct PatchOneRequest<P> {
    pub id: RecordId,
    pub body: P,
    pub options: RequestOptions,
}

impl<P> PatchOneRequest<P> {
    pub fn new(id: impl Into<RecordId>, body: P) -> Self {
        Self {
            id: id.into(),
            body,
            options: RequestOptions::default(),
        }
    }

    pub fn options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }
}

/// Delete the record `id`.
#[derive(Debug, Clone)]
pub struct DeleteOneRequest {
    pub id: RecordId,
    pub options: RequestOptions,
}

impl DeleteOneRequest {
    pub fn new(id: impl Into<RecordId>) -> Self {
        Self {
            id: id.into(),
            options: RequestOptions::default(),
        }
    }

    pub fn options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }
}

/// Payload of a named action. The body is sent as given, at the top level.
#[derive(Debug, Clone)]
pub struct ActionRequest<B> {
    pub body: Option<B>,
    pub query: Query,
    pub options: RequestOptions,
}

impl<B> Default for ActionRequest<B> {
    fn default() -> Self {
        Self {
            body: None,
            query: Query::new(),
            options: RequestOptions::default(),
        }
    }
}

impl<B> ActionRequest<B> {
    pub fn new(body: B) -> Self {
        Self {
            body: Some(body),
            ..Self::default()
        }
    }

    pub fn param(mut self, name: impl Into<String>, value: Value) -> Self {
        self.query.insert(name.into(), value);
        self
    }

    pub fn options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }
}

impl ActionRequest<()> {
    /// An action with no body at all.
    pub fn empty() -> Self {
        Self::default()
    }
}
