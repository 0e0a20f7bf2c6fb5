//! Real-time notification hub configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Sizing and liveness settings for the WebSocket notification hub.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct HubConfig {
    /// Per-connection outbound queue capacity; a connection whose queue is
    /// full when a new payload arrives is closed.
    #[serde(default = "default_outbound_queue_capacity")]
    pub outbound_queue_capacity: usize,

    /// Capacity of the hub's command intake channel
    #[serde(default = "default_intake_capacity")]
    pub intake_capacity: usize,

    /// Interval between server pings, in seconds
    #[serde(default = "default_ping_interval")]
    pub ping_interval_secs: u64,

    /// Time allowed between frames from the peer before the connection is
    /// considered dead, in seconds
    #[serde(default = "default_pong_timeout")]
    pub pong_timeout_secs: u64,

    /// Time allowed for a single frame write, in seconds
    #[serde(default = "default_write_timeout")]
    pub write_timeout_secs: u64,

    /// Largest inbound frame accepted from a client, in bytes
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
}

impl HubConfig {
    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs)
    }

    pub fn pong_timeout(&self) -> Duration {
        Duration::from_secs(self.pong_timeout_secs)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }

    /// Validate hub configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.outbound_queue_capacity == 0 {
            return Err(ValidationError::ZeroCapacity("outbound_queue_capacity"));
        }
        if self.intake_capacity == 0 {
            return Err(ValidationError::ZeroCapacity("intake_capacity"));
        }
        if self.max_message_size == 0 {
            return Err(ValidationError::ZeroCapacity("max_message_size"));
        }
        if self.write_timeout_secs == 0 {
            return Err(ValidationError::ZeroTimeout("write_timeout_secs"));
        }
        if self.ping_interval_secs == 0 {
            return Err(ValidationError::ZeroTimeout("ping_interval_secs"));
        }
        if self.ping_interval_secs >= self.pong_timeout_secs {
            return Err(ValidationError::PingNotBeforePongTimeout);
        }
        Ok(())
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            outbound_queue_capacity: default_outbound_queue_capacity(),
            intake_capacity: default_intake_capacity(),
            ping_interval_secs: default_ping_interval(),
            pong_timeout_secs: default_pong_timeout(),
            write_timeout_secs: default_write_timeout(),
            max_message_size: default_max_message_size(),
        }
    }
}

fn default_outbound_queue_capacity() -> usize {
    256
}

fn default_intake_capacity() -> usize {
    1024
}

fn default_ping_interval() -> u64 {
    54
}

fn default_pong_timeout() -> u64 {
    60
}

fn default_write_timeout() -> u64 {
    10
}

fn default_max_message_size() -> usize {
    512
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hub_config_defaults_are_valid() {
        let config = HubConfig::default();
        assert_eq!(config.outbound_queue_capacity, 256);
        assert_eq!(config.ping_interval(), Duration::from_secs(54));
        assert_eq!(config.pong_timeout(), Duration::from_secs(60));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_queue_capacity_rejected() {
        let config = HubConfig {
            outbound_queue_capacity: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::ZeroCapacity("outbound_queue_capacity"))
        );
    }

    #[test]
    fn test_ping_must_precede_pong_timeout() {
        let config = HubConfig {
            ping_interval_secs: 60,
            pong_timeout_secs: 60,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::PingNotBeforePongTimeout));
    }

    #[test]
    fn test_zero_write_timeout_rejected() {
        let config = HubConfig {
            write_timeout_secs: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::ZeroTimeout("write_timeout_secs"))
        );
    }
}
