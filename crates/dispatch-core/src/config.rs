use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables for the dispatcher. Every field has a default, so partial
/// configuration documents deserialize cleanly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Budget for the thorough classification path before the fallback heuristic takes over.
    pub classify_timeout_ms: u64,
    /// Budget for one assistant reply. Expiry is handled like a backend error.
    pub inference_timeout_secs: u64,
    /// Shell decisions below this confidence produce an advisory log line.
    pub low_confidence_threshold: f32,
    /// Bound on `SessionContext::recent_commands`.
    pub max_recent_commands: usize,
    /// How many recent commands are included in the assistant context.
    pub context_commands: usize,
    pub line_terminator: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            classify_timeout_ms: 2_000,
            inference_timeout_secs: 30,
            low_confidence_threshold: intent_router::decision::HIGH_CONFIDENCE,
            max_recent_commands: 50,
            context_commands: 10,
            line_terminator: default_line_terminator().to_string(),
        }
    }
}

impl DispatchConfig {
    pub fn classify_timeout(&self) -> Duration {
        Duration::from_millis(self.classify_timeout_ms)
    }

    pub fn inference_timeout(&self) -> Duration {
        Duration::from_secs(self.inference_timeout_secs)
    }
}

pub fn default_line_terminator() -> &'static str {
    if cfg!(windows) {
        "\r\n"
    } else {
        "\n"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let cfg: DispatchConfig = serde_json::from_str(r#"{"inference_timeout_secs": 5}"#).unwrap();
        assert_eq!(cfg.inference_timeout(), Duration::from_secs(5));
        assert_eq!(cfg.classify_timeout(), Duration::from_secs(2));
        assert_eq!(cfg.max_recent_commands, 50);
        assert!((cfg.low_confidence_threshold - 0.8).abs() < 1e-6);
    }
}
