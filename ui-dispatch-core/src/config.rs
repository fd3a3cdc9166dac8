//! Dispatcher configuration
//!
//! Every field has a default, so a config file only needs the values it
//! changes:
//!
//! ```
//! use ui_dispatch_core::config::DispatchConfig;
//!
//! let config = DispatchConfig::from_json(r#"{ "trace_enabled": true }"#).unwrap();
//! assert!(config.trace_enabled);
//! assert_eq!(config.notice_cooldown_ms, 900);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::keys::ActivationKeys;
use crate::notice::{NoticeMessages, NoticeThrottle};
use crate::resolver::DEFAULT_MARKER_ATTRIBUTE;
use crate::tracer::DEFAULT_TRACE_CAPACITY;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Attribute holding the action name
    pub marker_attribute: String,
    pub notice_cooldown_ms: u64,
    pub toast_duration_ms: u64,
    pub trace_enabled: bool,
    pub trace_capacity: usize,
    pub activation_keys: ActivationKeys,
    pub frame_interval_ms: u64,
    pub messages: NoticeMessages,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            marker_attribute: DEFAULT_MARKER_ATTRIBUTE.to_string(),
            notice_cooldown_ms: 900,
            toast_duration_ms: 1200,
            trace_enabled: false,
            trace_capacity: DEFAULT_TRACE_CAPACITY,
            activation_keys: ActivationKeys::default(),
            frame_interval_ms: 16,
            messages: NoticeMessages::default(),
        }
    }
}

impl DispatchConfig {
    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.marker_attribute.trim().is_empty() {
            return Err(ConfigError::EmptyMarker);
        }
        Ok(())
    }

    pub fn notice_cooldown(&self) -> Duration {
        Duration::from_millis(self.notice_cooldown_ms)
    }

    pub fn toast_duration(&self) -> Duration {
        Duration::from_millis(self.toast_duration_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(1))
    }

    /// A throttle using this config's timings
    pub fn throttle(&self) -> NoticeThrottle {
        NoticeThrottle::new(self.notice_cooldown(), self.toast_duration())
    }
}
