//! Processor configuration.

use serde::{Deserialize, Serialize};

use crate::error::{PushResult, ValidationError};
use crate::provider::DEFAULT_NOTIFICATION_LEVEL;

/// Settings for [`crate::BatchProcessor`] and [`crate::BatchWorker`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Skip events sent by the local user before any rule is tried.
    ///
    /// Off by default: mention conditions already ignore the user's own
    /// messages, and catch-all rules must still see every event.
    pub skip_own_events: bool,
    /// Level required for notification keys a room does not configure.
    pub default_notification_level: i64,
    /// Max batches queued on a worker before `submit` blocks.
    pub worker_queue_capacity: usize,
    /// Buffer size of a channel sink's notification stream.
    pub stream_capacity: usize,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            skip_own_events: false,
            default_notification_level: DEFAULT_NOTIFICATION_LEVEL,
            worker_queue_capacity: 64,
            stream_capacity: 1024,
        }
    }
}

impl ProcessorConfig {
    /// Parses a JSON config; missing fields take their defaults.
    pub fn from_json_str(s: &str) -> PushResult<Self> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Rejects settings that cannot work.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.worker_queue_capacity == 0 {
            return Err(ValidationError::InvalidConfig {
                reason: "worker_queue_capacity must be at least 1".to_string(),
            });
        }
        if self.stream_capacity == 0 {
            return Err(ValidationError::InvalidConfig {
                reason: "stream_capacity must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PushError;

    #[test]
    fn defaults() {
        let cfg = ProcessorConfig::default();
        assert!(!cfg.skip_own_events);
        assert_eq!(cfg.default_notification_level, 50);
        assert_eq!(cfg.stream_capacity, 1024);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = ProcessorConfig::from_json_str(r#"{ "skip_own_events": true }"#).unwrap();
        assert!(cfg.skip_own_events);
        assert_eq!(cfg.stream_capacity, 1024);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = ProcessorConfig::from_json_str(r#"{ "stream_capacity": 0 }"#).unwrap_err();
        assert!(err.is_validation());

        let err = ProcessorConfig::from_json_str("not json").unwrap_err();
        assert!(matches!(err, PushError::Serialization(_)));
    }
}
