//! Client configuration.
//!
//! Credentials are always supplied by the caller, either directly or through
//! the `WEKAN_*` environment variables.

use std::fmt;

use crate::error::ApiError;

pub const ENV_URL: &str = "WEKAN_URL";
pub const ENV_USERNAME: &str = "WEKAN_USERNAME";
pub const ENV_PASSWORD: &str = "WEKAN_PASSWORD";
pub const ENV_PROXY: &str = "WEKAN_PROXY";

/// What a title lookup miss turns into inside composite operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissPolicy {
    /// Fail with `BoardNotFound` / `ListNotFound` before sending anything.
    #[default]
    Strict,
    /// Continue with an empty identifier, which ends up as an empty path
    /// segment in the next request.
    Permissive,
}

#[derive(Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
    /// HTTP proxy URI, e.g. `http://proxy.local:3128`.
    pub proxy: Option<String>,
    pub miss_policy: MissPolicy,
}

impl ClientConfig {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            username: username.into(),
            password: password.into(),
            proxy: None,
            miss_policy: MissPolicy::default(),
        }
    }

    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    pub fn with_miss_policy(mut self, policy: MissPolicy) -> Self {
        self.miss_policy = policy;
        self
    }

    /// Read `WEKAN_URL`, `WEKAN_USERNAME`, `WEKAN_PASSWORD` and the optional
    /// `WEKAN_PROXY`.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ApiError> {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| ApiError::Config(format!("{key} is not set")))
        };
        let mut config = Self::new(required(ENV_URL)?, required(ENV_USERNAME)?, required(ENV_PASSWORD)?);
        config.proxy = lookup(ENV_PROXY).filter(|value| !value.is_empty());
        Ok(config)
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("proxy", &self.proxy)
            .field("miss_policy", &self.miss_policy)
            .finish()
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
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn new_defaults_to_strict_without_proxy() {
        let config = ClientConfig::new("http://wekan", "alice", "pw");
        assert_eq!(config.miss_policy, MissPolicy::Strict);
        assert!(config.proxy.is_none());
    }

    #[test]
    fn builder_setters() {
        let config = ClientConfig::new("http://wekan", "alice", "pw")
            .with_proxy("http://proxy:3128")
            .with_miss_policy(MissPolicy::Permissive);
        assert_eq!(config.proxy.as_deref(), Some("http://proxy:3128"));
        assert_eq!(config.miss_policy, MissPolicy::Permissive);
    }

    #[test]
    fn debug_redacts_password() {
        let config = ClientConfig::new("http://wekan", "alice", "hunter2");
        let printed = format!("{config:?}");
        assert!(!printed.contains("hunter2"));
        assert!(printed.contains("alice"));
    }

    #[test]
    fn from_lookup_reads_all_variables() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ENV_URL, "http://wekan:80"),
            (ENV_USERNAME, "alice"),
            (ENV_PASSWORD, "pw"),
            (ENV_PROXY, "http://proxy:3128"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "http://wekan:80");
        assert_eq!(config.username, "alice");
        assert_eq!(config.password, "pw");
        assert_eq!(config.proxy.as_deref(), Some("http://proxy:3128"));
    }

    #[test]
    fn from_lookup_requires_password() {
        let err = ClientConfig::from_lookup(lookup(&[(ENV_URL, "http://wekan"), (ENV_USERNAME, "alice")]))
            .unwrap_err();
        match err {
            ApiError::Config(msg) => assert!(msg.contains(ENV_PASSWORD)),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn from_lookup_treats_empty_as_missing() {
        let err = ClientConfig::from_lookup(lookup(&[
            (ENV_URL, ""),
            (ENV_USERNAME, "alice"),
            (ENV_PASSWORD, "pw"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
    }
}
