//! Session configuration.

use serde::{Deserialize, Serialize};
use surestep_dispatch::RetryPolicy;
use surestep_gate::GateTimeouts;

/// Tunable timing for one session: gate polling on the inside, bounded
/// retry on the outside. The defaults are the engine's contract (200ms
/// polls, 3s condition budget, four attempts one second apart) and most
/// suites never override them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub gate: GateTimeouts,
    pub retry: RetryPolicy,
}

impl SessionConfig {
    /// Parse a config from JSON, filling anything omitted with defaults.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_engine_contract() {
        let config = SessionConfig::default();
        assert_eq!(config.gate.poll_interval_ms, 200);
        assert_eq!(config.gate.condition_timeout_ms, 3000);
        assert_eq!(config.retry.max_attempts, 4);
        assert_eq!(config.retry.delay_ms, 1000);
    }

    #[test]
    fn partial_json_keeps_defaults_elsewhere() {
        let config = SessionConfig::from_json(r#"{"retry":{"max_attempts":2,"delay_ms":50}}"#)
            .expect("valid config");
        assert_eq!(config.retry.max_attempts, 2);
        assert_eq!(config.gate.poll_interval_ms, 200);
    }
}
