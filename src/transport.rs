//! Local byte-stream transport to the agent
//!
//! On Windows the agent listens on a named pipe; elsewhere a Unix domain
//! socket stands in for it. Either way the channel only sees an
//! `AsyncRead + AsyncWrite` stream.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::io;
use tokio::io::{AsyncRead, AsyncWrite};

/// How the channel waits on a sync barrier
///
/// Defaults to `Rendezvous` on Windows, where the agent's pipe is
/// inbound-only, and to `Acknowledge` elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncMode {
    /// Write the Sync record, then read one acknowledgement byte
    Acknowledge,
    /// Write-only transport with a zero-capacity buffer that holds at most
    /// one queued write. The barrier is Sync followed by a second Sync: the
    /// second is accepted only once the agent has read the first, which it
    /// does after applying the previous command.
    Rendezvous,
}

impl Default for SyncMode {
    fn default() -> Self {
        if cfg!(windows) {
            SyncMode::Rendezvous
        } else {
            SyncMode::Acknowledge
        }
    }
}

impl SyncMode {
    /// Whether the transport must be opened with read access
    pub fn reads_ack(&self) -> bool {
        matches!(self, SyncMode::Acknowledge)
    }
}

/// Opens streams to the agent endpoint
pub trait Connector {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send;

    /// Address reported in errors and logs
    fn address(&self) -> &str;

    /// Open a fresh stream to the endpoint
    fn open(&self) -> impl Future<Output = io::Result<Self::Stream>> + Send;
}

/// Connector for the agent's well-known local endpoint
#[derive(Debug, Clone)]
pub struct PipeConnector {
    address: String,
    #[cfg_attr(not(windows), allow(dead_code))]
    readable: bool,
}

impl PipeConnector {
    pub fn new(address: impl Into<String>, sync_mode: SyncMode) -> Self {
        Self {
            address: address.into(),
            readable: sync_mode.reads_ack(),
        }
    }
}

impl Connector for PipeConnector {
    #[cfg(windows)]
    type Stream = tokio::net::windows::named_pipe::NamedPipeClient;
    #[cfg(unix)]
    type Stream = tokio::net::UnixStream;

    fn address(&self) -> &str {
        &self.address
    }

    #[cfg(windows)]
    fn open(&self) -> impl Future<Output = io::Result<Self::Stream>> + Send {
        use tokio::net::windows::named_pipe::ClientOptions;

        // An inbound-only pipe rejects clients that ask for read access
        let result = ClientOptions::new()
            .read(self.readable)
            .write(true)
            .open(&self.address);
        async move { result }
    }

    #[cfg(unix)]
    fn open(&self) -> impl Future<Output = io::Result<Self::Stream>> + Send {
        let path = self.address.clone();
        async move { tokio::net::UnixStream::connect(path).await }
    }
}

/// True when an open error means nothing is listening at the address
pub fn endpoint_absent(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::ConnectionRefused
    )
}

/// True when the endpoint exists but refused the requested access, as an
/// inbound-only pipe does for a client asking to read
pub fn access_refused(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::PermissionDenied
}
