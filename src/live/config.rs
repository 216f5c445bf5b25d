use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_VIEWER_TARGET: u32 = 10;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Viewer target must be at least 10, got {0}")]
    ViewerTargetTooLow(u32),

    #[error("Custom message mode requires a message style")]
    MissingCustomStyle,

    #[error("Stream purpose must not be blank")]
    BlankPurpose,

    #[error("Stream location must not be blank")]
    BlankLocation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageMode {
    Positive,
    Questions,
    Custom,
}

impl fmt::Display for MessageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MessageMode::Positive => "POSITIVE",
            MessageMode::Questions => "QUESTIONS",
            MessageMode::Custom => "CUSTOM",
        };
        f.write_str(name)
    }
}

impl FromStr for MessageMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "POSITIVE" => Ok(MessageMode::Positive),
            "QUESTIONS" | "QUESTION" => Ok(MessageMode::Questions),
            "CUSTOM" => Ok(MessageMode::Custom),
            other => Err(format!("Unknown message mode: {}", other)),
        }
    }
}

/// Description of one simulated stream. Built once, then shared read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConfig {
    pub viewer_target: u32,
    pub message_mode: MessageMode,
    #[serde(default)]
    pub custom_message_style: String,
    pub purpose: String,
    pub location: String,
    pub activity_description: String,
    pub host_name: String,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            viewer_target: 100,
            message_mode: MessageMode::Positive,
            custom_message_style: String::new(),
            purpose: "General livestream".to_string(),
            location: "Unknown location".to_string(),
            activity_description: "Casual streaming".to_string(),
            host_name: "host".to_string(),
        }
    }
}

impl StreamConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.viewer_target < MIN_VIEWER_TARGET {
            return Err(ConfigError::ViewerTargetTooLow(self.viewer_target));
        }
        if self.message_mode == MessageMode::Custom && self.custom_message_style.trim().is_empty() {
            return Err(ConfigError::MissingCustomStyle);
        }
        if self.purpose.trim().is_empty() {
            return Err(ConfigError::BlankPurpose);
        }
        if self.location.trim().is_empty() {
            return Err(ConfigError::BlankLocation);
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(StreamConfig::default().is_valid());
    }

    #[test]
    fn rejects_small_audience() {
        let config = StreamConfig { viewer_target: 9, ..StreamConfig::default() };
        assert_eq!(config.validate(), Err(ConfigError::ViewerTargetTooLow(9)));
        let config = StreamConfig { viewer_target: 10, ..StreamConfig::default() };
        assert!(config.is_valid());
    }

    #[test]
    fn custom_mode_needs_style() {
        let mut config = StreamConfig {
            message_mode: MessageMode::Custom,
            custom_message_style: "  ".to_string(),
            ..StreamConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::MissingCustomStyle));
        config.custom_message_style = "pirate speak".to_string();
        assert!(config.is_valid());
    }

    #[test]
    fn purpose_and_location_required() {
        let config = StreamConfig { purpose: String::new(), ..StreamConfig::default() };
        assert_eq!(config.validate(), Err(ConfigError::BlankPurpose));
        let config = StreamConfig { location: " ".to_string(), ..StreamConfig::default() };
        assert_eq!(config.validate(), Err(ConfigError::BlankLocation));
    }

    #[test]
    fn message_mode_round_trips_through_text() {
        for mode in [MessageMode::Positive, MessageMode::Questions, MessageMode::Custom] {
            assert_eq!(mode.to_string().parse::<MessageMode>(), Ok(mode));
        }
        assert_eq!("questions".parse::<MessageMode>(), Ok(MessageMode::Questions));
        assert!("angry".parse::<MessageMode>().is_err());
    }
}
