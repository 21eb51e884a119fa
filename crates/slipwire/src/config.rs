//! Client-level configuration.

use std::time::Duration;

/// Settings a client applies to every request it sends.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Deadline for requests that do not set their own. When it
    /// expires the request is cancelled and the caller gets a timeout
    /// error.
    pub default_timeout: Duration,
    /// Sent as `User-Agent` on requests that do not set that header.
    pub user_agent: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            default_timeout: Duration::from_secs(10),
            user_agent: None,
        }
    }
}

impl ClientConfig {
    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self {
            default_timeout: timeout,
            ..self
        }
    }

    pub fn with_user_agent(self, agent: impl Into<String>) -> Self {
        Self {
            user_agent: Some(agent.into()),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = ClientConfig::default();
        assert_eq!(config.default_timeout, Duration::from_secs(10));
        assert!(config.user_agent.is_none());
    }

    #[test]
    fn builders_override_single_fields() {
        let config = ClientConfig::default()
            .with_timeout(Duration::from_secs(3))
            .with_user_agent("slipwire-tests");
        assert_eq!(config.default_timeout, Duration::from_secs(3));
        assert_eq!(config.user_agent.as_deref(), Some("slipwire-tests"));
    }
}
