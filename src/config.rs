//! Runtime configuration for the editor core.

use serde::{Deserialize, Serialize};

/// Whether position-only node moves count as unsaved changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DirtyPolicy {
    /// Config and topology changes dirty a tab; canvas moves do not.
    #[default]
    IgnorePositions,
    IncludePositions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GatewayConfig {
    pub base_url: String,
    pub request_timeout_ms: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig {
            base_url: "http://127.0.0.1:8600".into(),
            request_timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CoreConfig {
    pub gateway: GatewayConfig,
    pub poll_interval_ms: u64,
    pub dirty_policy: DirtyPolicy,
}

impl Default for CoreConfig {
    fn default() -> Self {
        CoreConfig {
            gateway: GatewayConfig::default(),
            poll_interval_ms: 1_000,
            dirty_policy: DirtyPolicy::default(),
        }
    }
}

impl CoreConfig {
    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let config: CoreConfig = serde_json::from_str(r#"{ "pollIntervalMs": 250 }"#).unwrap();
        assert_eq!(config.poll_interval(), std::time::Duration::from_millis(250));
        assert_eq!(config.dirty_policy, DirtyPolicy::IgnorePositions);
        assert_eq!(config.gateway.base_url, "http://127.0.0.1:8600");
    }

    #[test]
    fn dirty_policy_uses_camel_case_on_the_wire() {
        let policy: DirtyPolicy = serde_json::from_str(r#""includePositions""#).unwrap();
        assert_eq!(policy, DirtyPolicy::IncludePositions);
    }
}
