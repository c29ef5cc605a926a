//! Command channel - stateful client for the agent protocol
//!
//! Every state-mutating command is followed by a sync barrier, so when an
//! operation returns the agent has already applied it. Eject is the only
//! exception: the agent stops reading right after it, so the channel does
//! not wait and moves to [`ChannelState::Closed`].
//!
//! The channel does no internal locking. Operations take `&mut self`; share
//! one instance between tasks only behind an external lock.

use crate::config::Config;
use crate::error::{HookpipeError, Result};
use crate::protocol::{Command, SESSION_BUNDLE};
use crate::transport::{access_refused, endpoint_absent, Connector, PipeConnector, SyncMode};
use log::{debug, info, warn};
use std::io;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::timeout;

/// Default bound on each write and sync wait
pub const DEFAULT_SYNC_TIMEOUT: Duration = Duration::from_secs(5);

/// Observable connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Disconnected,
    Connected,
    /// Handle released after an eject or a transport failure; only a
    /// reconnect leaves this state
    Closed,
}

enum Link<S> {
    Disconnected,
    Connected(S),
    Closed(&'static str),
}

/// Client side of the agent command protocol
pub struct CommandChannel<C: Connector = PipeConnector> {
    connector: C,
    sync_mode: SyncMode,
    sync_timeout: Duration,
    link: Link<C::Stream>,
}

impl CommandChannel<PipeConnector> {
    /// Build a channel for the endpoint named in `config`. Does not connect.
    pub fn from_config(config: &Config) -> Self {
        let connector = PipeConnector::new(config.pipe_name.clone(), config.sync_mode);
        Self::new(connector, config.sync_mode).with_sync_timeout(config.sync_timeout())
    }
}

impl<C: Connector> CommandChannel<C> {
    /// Create a disconnected channel
    pub fn new(connector: C, sync_mode: SyncMode) -> Self {
        Self {
            connector,
            sync_mode,
            sync_timeout: DEFAULT_SYNC_TIMEOUT,
            link: Link::Disconnected,
        }
    }

    pub fn with_sync_timeout(mut self, sync_timeout: Duration) -> Self {
        self.sync_timeout = sync_timeout;
        self
    }

    pub fn state(&self) -> ChannelState {
        match self.link {
            Link::Disconnected => ChannelState::Disconnected,
            Link::Connected(_) => ChannelState::Connected,
            Link::Closed(_) => ChannelState::Closed,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ChannelState::Connected
    }

    pub fn sync_mode(&self) -> SyncMode {
        self.sync_mode
    }

    pub fn address(&self) -> &str {
        self.connector.address()
    }

    /// Open the transport. Same as [`reconnect`](Self::reconnect).
    pub async fn connect(&mut self) -> Result<()> {
        self.reconnect().await
    }

    /// Release any held handle, then open a new one
    pub async fn reconnect(&mut self) -> Result<()> {
        self.close();

        match self.connector.open().await {
            Ok(stream) => {
                info!("Connected to agent at {}", self.connector.address());
                self.link = Link::Connected(stream);
                Ok(())
            }
            Err(e) if endpoint_absent(&e) => {
                warn!("No agent listening at {}", self.connector.address());
                Err(HookpipeError::AgentUnavailable {
                    address: self.connector.address().to_string(),
                    source: e,
                })
            }
            Err(e) if access_refused(&e) && self.sync_mode.reads_ack() => {
                warn!(
                    "Read access to {} refused; the agent expects rendezvous mode",
                    self.connector.address()
                );
                Err(HookpipeError::AccessDenied {
                    address: self.connector.address().to_string(),
                    source: e,
                })
            }
            Err(e) => Err(HookpipeError::TransportError(e)),
        }
    }

    /// Release the transport handle if held. Idempotent.
    pub fn close(&mut self) {
        if let Link::Connected(_) = self.link {
            debug!("Closing agent channel {}", self.connector.address());
        }
        self.link = Link::Disconnected;
    }

    /// Encode and send one command, then wait on a sync barrier unless the
    /// command is Eject or Sync itself
    pub async fn execute(&mut self, command: Command) -> Result<()> {
        if command == Command::Sync {
            return self.sync().await;
        }

        self.ensure_connected()?;
        let record = command.encode()?;

        debug!("-> {:?} {:02x?}", command, record);
        self.transact(&record, false).await?;

        if command == Command::Eject {
            info!("Agent ejected; channel closed");
            self.link = Link::Closed("agent ejected");
        } else if command.needs_sync() {
            self.sync().await?;
        }

        Ok(())
    }

    /// Block until the agent has applied every previously sent command
    pub async fn sync(&mut self) -> Result<()> {
        self.ensure_connected()?;
        let record = Command::Sync.encode()?;

        match self.sync_mode {
            SyncMode::Acknowledge => self.transact(&record, true).await,
            SyncMode::Rendezvous => {
                // A pipe write returns once queued and only one write can be
                // queued, so the second Sync is accepted after the agent has
                // read the first
                self.transact(&record, false).await?;
                self.transact(&record, false).await
            }
        }
    }

    /// Fake the cursor position. Requires the cursor-position hook.
    pub async fn set_cursor_pos(&mut self, x: i32, y: i32) -> Result<()> {
        self.execute(Command::SetCursorPos { x, y }).await
    }

    pub async fn restore_cursor_pos(&mut self) -> Result<()> {
        self.execute(Command::RestoreCursorPos).await
    }

    /// Fake the pressed key. Requires the key-down hook.
    pub async fn set_key_down(&mut self, keycode: i32) -> Result<()> {
        self.execute(Command::SetKeyDown { keycode }).await
    }

    pub async fn restore_key_down(&mut self) -> Result<()> {
        self.execute(Command::RestoreKeyDown).await
    }

    /// Fake the held special key. Requires the key-string hook.
    pub async fn set_special_key(&mut self, keycode: u32) -> Result<()> {
        self.execute(Command::SetSpecialKey { keycode }).await
    }

    pub async fn restore_special_key(&mut self) -> Result<()> {
        self.execute(Command::RestoreSpecialKey).await
    }

    /// Disable every active hook
    pub async fn unhook_all(&mut self) -> Result<()> {
        self.execute(Command::UnhookAll).await
    }

    /// Stop the agent's server. Does not wait for acknowledgement.
    ///
    /// Call [`unhook_all`](Self::unhook_all) first (or never install hooks):
    /// hooks left installed when the agent stops are not cleaned up.
    pub async fn eject(&mut self) -> Result<()> {
        self.execute(Command::Eject).await
    }

    /// Install the focus-event hook. Takes effect once the window has been
    /// focused and unfocused.
    pub async fn hook_focus(&mut self) -> Result<()> {
        self.execute(Command::HookFocus).await
    }

    pub async fn hook_cursor_pos(&mut self) -> Result<()> {
        self.execute(Command::HookCursorPos).await
    }

    pub async fn hook_key_down(&mut self) -> Result<()> {
        self.execute(Command::HookKeyDown).await
    }

    pub async fn hook_key_string(&mut self) -> Result<()> {
        self.execute(Command::HookKeyString).await
    }

    /// Install the full session bundle in order, each hook synced.
    ///
    /// Stops at the first failure with no rollback: hooks before the failing
    /// one stay installed. Issue [`unhook_all`](Self::unhook_all) (after a
    /// reconnect if needed) to reset.
    pub async fn hook(&mut self) -> Result<()> {
        for hook in SESSION_BUNDLE {
            self.execute(hook.command()).await?;
        }
        info!("Session hooks installed");
        Ok(())
    }

    fn ensure_connected(&self) -> Result<()> {
        match self.link {
            Link::Connected(_) => Ok(()),
            Link::Disconnected => Err(HookpipeError::NotConnected),
            Link::Closed(reason) => Err(HookpipeError::TransportError(io::Error::new(
                io::ErrorKind::NotConnected,
                format!("channel closed ({}); reconnect first", reason),
            ))),
        }
    }

    /// Write one record and optionally read the acknowledgement byte, all
    /// under the sync timeout. Any failure releases the handle.
    async fn transact(&mut self, record: &[u8], read_ack: bool) -> Result<()> {
        let limit = self.sync_timeout;
        let Link::Connected(stream) = &mut self.link else {
            return Err(HookpipeError::NotConnected);
        };

        let outcome = timeout(limit, async {
            stream.write_all(record).await?;
            stream.flush().await?;
            if read_ack {
                let mut ack = [0u8; 1];
                stream.read_exact(&mut ack).await?;
                debug!("<- ack {:02x}", ack[0]);
            }
            Ok::<(), io::Error>(())
        })
        .await;

        match outcome {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                warn!("Agent transport failed: {}", e);
                self.link = Link::Closed("transport failed");
                Err(HookpipeError::TransportError(e))
            }
            Err(_) => {
                warn!("Agent did not respond within {:?}", limit);
                self.link = Link::Closed("agent timed out");
                Err(HookpipeError::TimeoutError(limit))
            }
        }
    }
}
