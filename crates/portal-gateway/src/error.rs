use crate::config::ConfigError;
use portal_proto::MessageError;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PortalError {
    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),
    #[error("Message error: {0}")]
    Message(#[from] MessageError),
    #[error("No response for serial {serial_id} within {after:?}")]
    Timeout { serial_id: u16, after: Duration },
    #[error("Serial {0} already has a request in flight")]
    SerialInUse(u16),
    #[error("No free serial number after {0} attempts")]
    SerialExhausted(usize),
    #[error("Response channel for serial {0} closed")]
    ChannelClosed(u16),
    #[error("Challenge acknowledgement {serial_id} carries no challenge")]
    MissingChallenge { serial_id: u16 },
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Receive loop stopped: {0}")]
    ReceiveLoop(#[from] tokio::task::JoinError),
}

impl PortalError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, PortalError::Timeout { .. })
    }

    /// The response arrived but failed the authenticator check
    pub fn is_validation_failure(&self) -> bool {
        matches!(
            self,
            PortalError::Message(MessageError::ValidationFailure { .. })
        )
    }
}
