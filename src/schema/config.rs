//! Configuration types for the animation reader.

use serde::{Deserialize, Serialize};

/// Default number of absolute frames kept for delta replay.
fn default_cache_capacity() -> usize {
    16
}

/// Reader configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Maximum number of decoded frames kept in the LRU cache (0 disables caching).
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    /// Which frames of a delta-encoded animation are stored as absolute values.
    #[serde(default)]
    pub keyframes: KeyframePolicy,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            cache_capacity: default_cache_capacity(),
            keyframes: KeyframePolicy::default(),
        }
    }
}

impl ReaderConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let KeyframePolicy::Interval { interval: 0 } = self.keyframes {
            return Err(ConfigError::InvalidKeyframeInterval);
        }
        Ok(())
    }
}

/// Keyframe placement for delta-encoded animations.
///
/// Keyframes are stored as absolute values and start a new delta chain.
/// Without delta encoding every frame is absolute and the policy is unused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum KeyframePolicy {
    /// Frame 0 is the only keyframe; the chain spans the whole file.
    #[default]
    FirstFrameOnly,
    /// Every frame whose index is a multiple of `interval` is a keyframe.
    Interval { interval: u64 },
}

impl KeyframePolicy {
    /// Check whether `frame` is stored as absolute values.
    #[inline]
    pub fn is_keyframe(&self, frame: u64) -> bool {
        match *self {
            KeyframePolicy::FirstFrameOnly => frame == 0,
            KeyframePolicy::Interval { interval } => interval == 0 || frame % interval == 0,
        }
    }

    /// The keyframe that starts the chain containing `frame`.
    #[inline]
    pub fn chain_start(&self, frame: u64) -> u64 {
        match *self {
            KeyframePolicy::FirstFrameOnly => 0,
            KeyframePolicy::Interval { interval: 0 } => frame,
            KeyframePolicy::Interval { interval } => frame - frame % interval,
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Keyframe interval must be non-zero")]
    InvalidKeyframeInterval,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_single_chain() {
        let policy = KeyframePolicy::default();
        assert!(policy.is_keyframe(0));
        assert!(!policy.is_keyframe(1));
        assert_eq!(policy.chain_start(999), 0);
    }

    #[test]
    fn test_interval_policy() {
        let policy = KeyframePolicy::Interval { interval: 10 };
        assert!(policy.is_keyframe(0));
        assert!(policy.is_keyframe(20));
        assert!(!policy.is_keyframe(21));
        assert_eq!(policy.chain_start(27), 20);
        assert_eq!(policy.chain_start(30), 30);
    }

    #[test]
    fn test_validate() {
        assert!(ReaderConfig::default().validate().is_ok());
        let config = ReaderConfig {
            keyframes: KeyframePolicy::Interval { interval: 0 },
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidKeyframeInterval)
        ));
    }

    #[test]
    fn test_json_defaults() {
        let config: ReaderConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ReaderConfig::default());

        let json = r#"{"cache_capacity": 4, "keyframes": {"type": "Interval", "interval": 8}}"#;
        let config: ReaderConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.cache_capacity, 4);
        assert_eq!(config.keyframes, KeyframePolicy::Interval { interval: 8 });
    }
}
