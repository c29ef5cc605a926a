//! Hook session - enables and disables the hook bundle as a unit

use crate::channel::CommandChannel;
use crate::error::Result;
use crate::transport::{Connector, PipeConnector};
use log::{info, warn};

/// Which hooks the session believes are installed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No hooks installed
    Idle,
    /// All bundle hooks installed
    Active,
    /// A failed enable left an unknown prefix of the bundle installed;
    /// call [`HookSession::recover`] or [`HookSession::disable`]
    Partial,
}

/// Owns a command channel and tracks the bundle's install state
pub struct HookSession<C: Connector = PipeConnector> {
    channel: CommandChannel<C>,
    state: SessionState,
}

impl<C: Connector> HookSession<C> {
    /// Wrap a channel. The agent is assumed to have no hooks installed.
    pub fn new(channel: CommandChannel<C>) -> Self {
        Self {
            channel,
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn channel_mut(&mut self) -> &mut CommandChannel<C> {
        &mut self.channel
    }

    pub fn into_channel(self) -> CommandChannel<C> {
        self.channel
    }

    /// Install the bundle. Does nothing when already active.
    pub async fn enable(&mut self) -> Result<()> {
        if self.state == SessionState::Active {
            return Ok(());
        }

        match self.channel.hook().await {
            Ok(()) => {
                self.state = SessionState::Active;
                Ok(())
            }
            Err(e) => {
                warn!("Hook bundle failed part way: {}", e);
                self.state = SessionState::Partial;
                Err(e)
            }
        }
    }

    /// Remove every hook
    pub async fn disable(&mut self) -> Result<()> {
        self.channel.unhook_all().await?;
        self.state = SessionState::Idle;
        info!("Session hooks removed");
        Ok(())
    }

    /// Reconnect and remove every hook, leaving the agent clean after a
    /// failed enable or a dropped transport
    pub async fn recover(&mut self) -> Result<()> {
        self.channel.reconnect().await?;
        self.disable().await
    }

    /// Remove hooks if any may be installed, then eject the agent
    pub async fn shutdown(&mut self) -> Result<()> {
        if self.state != SessionState::Idle {
            self.disable().await?;
        }
        self.channel.eject().await
    }
}
