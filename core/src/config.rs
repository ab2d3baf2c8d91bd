//! Client-wide defaults.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const TIMEOUT_ENV: &str = "AJX_TIMEOUT_MS";
pub const USER_AGENT_ENV: &str = "AJX_USER_AGENT";

/// Defaults applied to every request a [`Client`](crate::Client) sends.
///
/// Per-request options take precedence over these values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Default timeout in milliseconds.
    pub timeout_ms: Option<u64>,
    pub headers: BTreeMap<String, String>,
    pub user_agent: Option<String>,
}

impl ClientConfig {
    /// Read `AJX_TIMEOUT_MS` and `AJX_USER_AGENT`. Unset or unparsable
    /// variables leave the default in place.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let timeout_ms = lookup(TIMEOUT_ENV).and_then(|raw| match raw.trim().parse::<u64>() {
            Ok(ms) => Some(ms),
            Err(_) => {
                tracing::warn!(value = %raw, "ignoring unparsable timeout");
                None
            }
        });
        let user_agent = lookup(USER_AGENT_ENV).filter(|ua| !ua.is_empty());
        Self {
            timeout_ms,
            user_agent,
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_are_empty() {
        let config = ClientConfig::from_lookup(lookup(&[]));
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.timeout(), None);
    }

    #[test]
    fn reads_timeout_and_user_agent() {
        let config = ClientConfig::from_lookup(lookup(&[
            (TIMEOUT_ENV, "1500"),
            (USER_AGENT_ENV, "ajx-test/1.0"),
        ]));
        assert_eq!(config.timeout(), Some(Duration::from_millis(1500)));
        assert_eq!(config.user_agent.as_deref(), Some("ajx-test/1.0"));
    }

    #[test]
    fn unparsable_timeout_is_ignored() {
        let config = ClientConfig::from_lookup(lookup(&[(TIMEOUT_ENV, "soon")]));
        assert_eq!(config.timeout_ms, None);
    }

    #[test]
    fn deserializes_with_missing_fields() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"headers":{"x-client":"ajx"}}"#).unwrap();
        assert_eq!(config.timeout_ms, None);
        assert_eq!(config.headers["x-client"], "ajx");
    }
}
