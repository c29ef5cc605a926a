//! hookpipe - controller for an in-process input agent
//!
//! The agent runs inside the target application and patches the queries the
//! application uses to read input (cursor position, pressed keys, focus). This
//! crate talks to it over a local pipe with a small fixed-record protocol,
//! and pairs that with window messages posted to the target, so the
//! application can be driven while it is in the background.
//!
//! # Example - Hooks and faked input
//!
//! ```rust,no_run
//! use hookpipe::{CommandChannel, Config, HookSession};
//!
//! #[tokio::main]
//! async fn main() -> hookpipe::Result<()> {
//!     let config = Config::default();
//!     let mut channel = CommandChannel::from_config(&config);
//!     channel.connect().await?;
//!
//!     let mut session = HookSession::new(channel);
//!     session.enable().await?;
//!
//!     let channel = session.channel_mut();
//!     channel.set_cursor_pos(100, 200).await?;
//!     channel.restore_cursor_pos().await?;
//!
//!     session.disable().await?;
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod config;
#[cfg(windows)]
pub mod controller;
pub mod device;
pub mod error;
pub mod input;
pub mod protocol;
pub mod session;
pub mod transport;
pub mod types;

// Re-export commonly used types
pub use channel::{ChannelState, CommandChannel};
pub use config::Config;
#[cfg(windows)]
pub use controller::WindowController;
pub use device::Device;
pub use error::{HookpipeError, Result};
#[cfg(windows)]
pub use input::WindowPoster;
pub use input::InputSink;
pub use protocol::{Command, Hook, Opcode, DEFAULT_PIPE_NAME, SESSION_BUNDLE};
pub use session::{HookSession, SessionState};
pub use transport::{Connector, PipeConnector, SyncMode};
pub use types::{ArrowKey, MouseButton, Point, Rect, SpecialKey, Target, WindowInfo};
