//! In-memory agent and input sink shared by the integration tests

#![allow(dead_code)]

use hookpipe::protocol::{Opcode, ACK};
use hookpipe::{CommandChannel, Connector, HookpipeError, InputSink, MouseButton, SyncMode};
use std::future::Future;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};

/// Something the agent received or the window was sent, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Record(Vec<u8>),
    Input(String),
}

#[derive(Default)]
struct Shared {
    timeline: Mutex<Vec<Event>>,
    /// Opcodes in the order the agent finished applying them
    applied: Mutex<Vec<u8>>,
    live: AtomicUsize,
    opened: AtomicUsize,
}

/// Connector whose streams are served by a scripted in-process agent
#[derive(Clone, Default)]
pub struct FakeAgent {
    shared: Arc<Shared>,
    /// Drop the connection after reading this many records
    pub read_limit: Option<usize>,
    /// Never acknowledge a Sync
    pub silent: bool,
    /// Write-only pipe with room for one queued byte, no acknowledgements
    pub rendezvous: bool,
    /// Time spent applying each record after reading it
    pub apply_delay: Duration,
    /// Fail every open with this error
    pub open_error: Option<io::ErrorKind>,
}

impl FakeAgent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn closing_after(records: usize) -> Self {
        Self {
            read_limit: Some(records),
            ..Self::default()
        }
    }

    pub fn silent() -> Self {
        Self {
            silent: true,
            ..Self::default()
        }
    }

    /// Agent behind the inbound-only, zero-buffer pipe, taking `apply_delay`
    /// per record
    pub fn rendezvous(apply_delay: Duration) -> Self {
        Self {
            rendezvous: true,
            apply_delay,
            ..Self::default()
        }
    }

    pub fn refusing(kind: io::ErrorKind) -> Self {
        Self {
            open_error: Some(kind),
            ..Self::default()
        }
    }

    pub fn sync_mode(&self) -> SyncMode {
        if self.rendezvous {
            SyncMode::Rendezvous
        } else {
            SyncMode::Acknowledge
        }
    }

    pub fn timeline(&self) -> Vec<Event> {
        self.shared.timeline.lock().unwrap().clone()
    }

    pub fn records(&self) -> Vec<Vec<u8>> {
        self.timeline()
            .into_iter()
            .filter_map(|e| match e {
                Event::Record(r) => Some(r),
                Event::Input(_) => None,
            })
            .collect()
    }

    pub fn opcodes(&self) -> Vec<u8> {
        self.records().iter().map(|r| r[0]).collect()
    }

    pub fn applied(&self) -> Vec<u8> {
        self.shared.applied.lock().unwrap().clone()
    }

    /// Connections the agent is still serving
    pub fn live(&self) -> usize {
        self.shared.live.load(Ordering::SeqCst)
    }

    pub fn opened(&self) -> usize {
        self.shared.opened.load(Ordering::SeqCst)
    }

    pub fn sink(&self) -> RecordingSink {
        RecordingSink {
            shared: self.shared.clone(),
            fail_on: None,
        }
    }

    pub async fn channel(&self) -> CommandChannel<FakeAgent> {
        let mut channel = CommandChannel::new(self.clone(), self.sync_mode())
            .with_sync_timeout(Duration::from_secs(1));
        channel.connect().await.unwrap();
        channel
    }

    /// Wait until the agent serves exactly `n` connections
    pub async fn wait_live(&self, n: usize) {
        for _ in 0..100 {
            if self.live() == n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {} live connections, have {}", n, self.live());
    }

    async fn serve(self, mut stream: DuplexStream) {
        let mut count = 0;
        while self.read_limit != Some(count) {
            let mut op = [0u8; 1];
            if stream.read_exact(&mut op).await.is_err() {
                break;
            }
            let Some(opcode) = Opcode::from_byte(op[0]) else {
                break;
            };
            let mut record = vec![op[0]; opcode.record_len()];
            if stream.read_exact(&mut record[1..]).await.is_err() {
                break;
            }
            self.shared
                .timeline
                .lock()
                .unwrap()
                .push(Event::Record(record));
            count += 1;

            if !self.apply_delay.is_zero() {
                tokio::time::sleep(self.apply_delay).await;
            }
            self.shared.applied.lock().unwrap().push(op[0]);

            let acks = !self.silent && !self.rendezvous;
            if opcode == Opcode::Sync && acks && stream.write_all(&[ACK]).await.is_err() {
                break;
            }
            if opcode == Opcode::Eject {
                break;
            }
        }
        self.shared.live.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Connector for FakeAgent {
    type Stream = DuplexStream;

    fn address(&self) -> &str {
        "memory://agent"
    }

    fn open(&self) -> impl Future<Output = io::Result<DuplexStream>> + Send {
        let agent = self.clone();
        async move {
            if let Some(kind) = agent.open_error {
                return Err(io::Error::new(kind, "scripted open failure"));
            }
            // A one-byte buffer models the pipe's single queued write
            let capacity = if agent.rendezvous { 1 } else { 64 };
            let (client, server) = tokio::io::duplex(capacity);
            agent.shared.opened.fetch_add(1, Ordering::SeqCst);
            agent.shared.live.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(agent.serve(server));
            Ok(client)
        }
    }
}

/// Input sink writing into the agent's timeline
pub struct RecordingSink {
    shared: Arc<Shared>,
    /// Fail every call whose event name starts with this
    pub fail_on: Option<&'static str>,
}

impl RecordingSink {
    fn post(&self, event: String) -> hookpipe::Result<()> {
        if let Some(prefix) = self.fail_on {
            if event.starts_with(prefix) {
                return Err(HookpipeError::InputError(format!("refused {}", event)));
            }
        }
        self.shared.timeline.lock().unwrap().push(Event::Input(event));
        Ok(())
    }
}

impl InputSink for RecordingSink {
    fn button_down(&self, button: MouseButton) -> hookpipe::Result<()> {
        self.post(format!("down {:?}", button))
    }

    fn button_up(&self, button: MouseButton) -> hookpipe::Result<()> {
        self.post(format!("up {:?}", button))
    }

    fn mouse_move(&self) -> hookpipe::Result<()> {
        self.post("move".to_string())
    }

    fn key_down(&self, ch: char) -> hookpipe::Result<()> {
        self.post(format!("key {}", ch))
    }
}

pub fn record(bytes: &[u8]) -> Event {
    Event::Record(bytes.to_vec())
}

pub fn input(name: &str) -> Event {
    Event::Input(name.to_string())
}

pub const SYNC: u8 = 0x0C;
