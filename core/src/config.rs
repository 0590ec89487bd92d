//! Client configuration.
//!
//! Read from the environment by `ClientConfig::from_env`, or deserialized
//! from any serde source (`timeout_secs` is whole seconds).

use std::env;
use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::error::ApiError;

pub const ENDPOINT_VAR: &str = "CRUD_CLIENT_ENDPOINT";
pub const ACCESS_TOKEN_VAR: &str = "CRUD_CLIENT_ACCESS_TOKEN";
pub const TIMEOUT_VAR: &str = "CRUD_CLIENT_TIMEOUT_SECS";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the resource collection, e.g. `http://host/api/v1/users`.
    pub endpoint: String,
    #[serde(default)]
    pub access_token: Option<String>,
    /// Transport-level timeout for a whole request.
    #[serde(
        rename = "timeout_secs",
        default = "default_timeout",
        deserialize_with = "duration_from_secs"
    )]
    pub timeout: Duration,
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

fn duration_from_secs<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    u64::deserialize(deserializer).map(Duration::from_secs)
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            access_token: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from any variable lookup; `from_env` passes the process
    /// environment. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ApiError> {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let endpoint = get(ENDPOINT_VAR)
            .ok_or_else(|| ApiError::configuration(format!("{ENDPOINT_VAR} is not set")))?;
        ::url::Url::parse(&endpoint).map_err(|e| {
            ApiError::configuration(format!("{ENDPOINT_VAR} is not a valid URL: {e}"))
        })?;

        let timeout = match get(TIMEOUT_VAR) {
            Some(raw) => raw.trim().parse::<u64>().map(Duration::from_secs).map_err(|e| {
                ApiError::configuration(format!("{TIMEOUT_VAR} must be whole seconds: {e}"))
            })?,
            None => DEFAULT_TIMEOUT,
        };

        Ok(Self {
            endpoint,
            access_token: get(ACCESS_TOKEN_VAR),
            timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn reads_all_variables() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ENDPOINT_VAR, "http://localhost:3000/api/v1/users"),
            (ACCESS_TOKEN_VAR, "abc"),
            (TIMEOUT_VAR, "5"),
        ]))
        .unwrap();
        assert_eq!(config.endpoint, "http://localhost:3000/api/v1/users");
        assert_eq!(config.access_token.as_deref(), Some("abc"));
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn defaults_apply_when_optional_vars_missing() {
        let config =
            ClientConfig::from_lookup(lookup(&[(ENDPOINT_VAR, "http://localhost:3000/users")]))
                .unwrap();
        assert!(config.access_token.is_none());
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn empty_token_counts_as_unset() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ENDPOINT_VAR, "http://localhost:3000/users"),
            (ACCESS_TOKEN_VAR, ""),
        ]))
        .unwrap();
        assert!(config.access_token.is_none());
    }

    #[test]
    fn missing_endpoint_is_configuration_error() {
        let err = ClientConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ApiError::Configuration { .. }));
    }

    #[test]
    fn invalid_endpoint_and_timeout_are_rejected() {
        assert!(ClientConfig::from_lookup(lookup(&[(ENDPOINT_VAR, "not a url")])).is_err());
        assert!(ClientConfig::from_lookup(lookup(&[
            (ENDPOINT_VAR, "http://localhost:3000/users"),
            (TIMEOUT_VAR, "soon"),
        ]))
        .is_err());
    }

    #[test]
    fn deserializes_from_json() {
        let config: ClientConfig = serde_json::from_str(
            r#"{"endpoint":"http://localhost:3000/users","timeout_secs":2}"#,
        )
        .unwrap();
        assert_eq!(config, ClientConfig::new("http://localhost:3000/users").with_timeout(Duration::from_secs(2)));
    }
}
