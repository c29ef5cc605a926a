//! Controller configuration
//!
//! Loaded from a JSON file; every field has a default so a partial file (or
//! none at all) is valid.

use crate::error::{HookpipeError, Result};
use crate::protocol::DEFAULT_PIPE_NAME;
use crate::transport::SyncMode;
use crate::types::Point;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default title of the target window
pub const DEFAULT_WINDOW_TITLE: &str = "NGU Idle";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Agent endpoint (named pipe or socket path)
    pub pipe_name: String,
    pub sync_mode: SyncMode,
    /// Upper bound on each write and each sync wait
    pub sync_timeout_ms: u64,
    /// Exact title of the target window
    pub window_title: String,
    /// Offset added to window coordinates before faking the cursor
    pub offset: Point,
    /// Pause after posting input, before restoring faked state
    pub input_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pipe_name: DEFAULT_PIPE_NAME.to_string(),
            sync_mode: SyncMode::default(),
            sync_timeout_ms: 5000,
            window_title: DEFAULT_WINDOW_TITLE.to_string(),
            offset: Point::default(),
            input_delay_ms: 40,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            HookpipeError::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Config = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the channel cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.pipe_name.is_empty() {
            return Err(HookpipeError::ConfigError("pipe_name must not be empty".into()));
        }
        if self.sync_timeout_ms == 0 {
            return Err(HookpipeError::ConfigError(
                "sync_timeout_ms must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn sync_timeout(&self) -> Duration {
        Duration::from_millis(self.sync_timeout_ms)
    }

    pub fn input_delay(&self) -> Duration {
        Duration::from_millis(self.input_delay_ms)
    }
}
