//! Device abstraction - bracketed input against one target window
//!
//! Each operation fakes state in the agent, posts the OS input, waits the
//! input delay, then restores the faked state. Requires the session hooks.

use crate::channel::CommandChannel;
use crate::error::Result;
use crate::input::InputSink;
use crate::transport::Connector;
use crate::types::{ArrowKey, MouseButton, SpecialKey, Target};
use log::{debug, warn};
use std::time::Duration;

/// Default pause between posting input and restoring faked state
pub const DEFAULT_INPUT_DELAY: Duration = Duration::from_millis(40);

/// Device represents the target window and how to reach it
#[derive(Debug, Clone)]
pub struct Device<S: InputSink> {
    sink: S,
    target: Target,
    delay: Duration,
}

impl<S: InputSink> Device<S> {
    pub fn new(sink: S, target: Target) -> Self {
        Self {
            sink,
            target,
            delay: DEFAULT_INPUT_DELAY,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Click at window coordinates
    pub async fn click<C: Connector>(
        &self,
        channel: &mut CommandChannel<C>,
        x: i32,
        y: i32,
        button: MouseButton,
    ) -> Result<()> {
        let pos = self.target.translate(x, y);
        debug!("click {:?} at {:?}", button, pos);

        channel.set_cursor_pos(pos.x, pos.y).await?;
        let posted = self
            .sink
            .button_down(button)
            .and_then(|_| self.sink.button_up(button));
        self.pause().await;
        channel.restore_cursor_pos().await?;
        posted
    }

    /// Press at (x, y), move to (x2, y2), release
    pub async fn drag<C: Connector>(
        &self,
        channel: &mut CommandChannel<C>,
        from: (i32, i32),
        to: (i32, i32),
        button: MouseButton,
    ) -> Result<()> {
        let start = self.target.translate(from.0, from.1);
        let end = self.target.translate(to.0, to.1);
        debug!("drag {:?} from {:?} to {:?}", button, start, end);

        channel.set_cursor_pos(start.x, start.y).await?;
        let posted = self.sink.button_down(button);
        self.pause().await;

        let posted = match posted {
            Ok(()) => match channel.set_cursor_pos(end.x, end.y).await {
                Ok(()) => self
                    .sink
                    .mouse_move()
                    .and_then(|_| self.sink.button_up(button)),
                Err(e) => {
                    // Release anyway so the window does not see a held button
                    if let Err(release) = self.sink.button_up(button) {
                        warn!("Could not release {:?} after failed drag: {}", button, release);
                    }
                    Err(e)
                }
            },
            Err(e) => Err(e),
        };
        self.pause().await;

        channel.restore_cursor_pos().await?;
        posted
    }

    /// Click while the agent reports `special` as held
    pub async fn special_click<C: Connector>(
        &self,
        channel: &mut CommandChannel<C>,
        x: i32,
        y: i32,
        button: MouseButton,
        special: SpecialKey,
    ) -> Result<()> {
        channel.set_special_key(u32::from(special.code())).await?;
        let clicked = self.click(channel, x, y, button).await;
        channel.restore_special_key().await?;
        clicked
    }

    pub async fn ctrl_click<C: Connector>(
        &self,
        channel: &mut CommandChannel<C>,
        x: i32,
        y: i32,
        button: MouseButton,
    ) -> Result<()> {
        self.special_click(channel, x, y, button, SpecialKey::LeftControl)
            .await
    }

    /// Type `text`: each character goes to text fields as a key-down message
    /// and to key-down queries through the agent
    pub async fn send_text<C: Connector>(
        &self,
        channel: &mut CommandChannel<C>,
        text: &str,
    ) -> Result<()> {
        let mut typed = Ok(());
        for ch in text.chars() {
            if let Err(e) = self.sink.key_down(ch) {
                typed = Err(e);
                break;
            }
            // Agent key codes match ASCII
            channel.set_key_down(ch as i32).await?;
            self.pause().await;
        }
        channel.restore_key_down().await?;
        typed
    }

    pub async fn press_arrow<C: Connector>(
        &self,
        channel: &mut CommandChannel<C>,
        arrow: ArrowKey,
    ) -> Result<()> {
        channel.set_key_down(arrow.key_code()).await?;
        self.pause().await;
        channel.restore_key_down().await
    }

    async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}
