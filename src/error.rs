//! Error types for the hookpipe library

use std::time::Duration;
use thiserror::Error;

/// Result type alias for hookpipe operations
pub type Result<T> = std::result::Result<T, HookpipeError>;

/// Error types for hookpipe operations
#[derive(Error, Debug)]
pub enum HookpipeError {
    /// Agent endpoint is absent at connect time
    #[error("Agent unavailable at {address}: {source} (is the agent injected and running? start it first)")]
    AgentUnavailable {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// Endpoint refused a read-write open
    #[error("Access denied opening {address}: {source} (the agent's pipe is write-only; use --rendezvous or set \"sync_mode\": \"rendezvous\")")]
    AccessDenied {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// Operation attempted without a live connection
    #[error("Command channel is not connected")]
    NotConnected,

    /// Write or acknowledgement failure on an established connection
    #[error("Transport error: {0}")]
    TransportError(#[from] std::io::Error),

    /// Agent did not complete a write or acknowledge a sync in time
    #[error("Timed out after {0:?} waiting for the agent")]
    TimeoutError(Duration),

    /// Payload does not fit its fixed wire width
    #[error("Encoding error: {0}")]
    EncodingError(String),

    /// Window not found
    #[error("Window not found: {0}")]
    WindowNotFound(String),

    /// Input posting failed
    #[error("Input simulation failed: {0}")]
    InputError(String),

    /// Invalid or unreadable configuration
    #[error("Config error: {0}")]
    ConfigError(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Windows API error
    #[cfg(windows)]
    #[error("Windows API error: {0}")]
    WindowsError(#[from] windows::core::Error),
}

impl HookpipeError {
    /// True for errors that leave the channel needing a reconnect
    pub fn requires_reconnect(&self) -> bool {
        matches!(
            self,
            HookpipeError::TransportError(_) | HookpipeError::TimeoutError(_)
        )
    }
}
