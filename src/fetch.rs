//! Snapshot fetch from the remote registry endpoint.
//!
//! Plain blocking TCP: connect with a timeout, read the registry's state
//! dump to EOF with a read timeout, validate UTF-8 and non-emptiness.
//! Exactly one attempt per cycle — a failed fetch is terminal for the
//! cycle and retry policy belongs to the scheduler invoking the process.

use std::io::Read;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::error::FetchError;
use crate::snapshot::Snapshot;

/// Source of fresh registry snapshots.
pub trait SnapshotFetcher {
    fn fetch(&self) -> Result<Snapshot, FetchError>;
}

/// Blocking TCP fetcher against `host:port`.
#[derive(Debug, Clone)]
pub struct TcpSnapshotFetcher {
    addr: String,
    connect_timeout: Duration,
    read_timeout: Duration,
}

impl TcpSnapshotFetcher {
    pub fn new(host: &str, port: u16, connect_timeout_ms: u64, read_timeout_ms: u64) -> Self {
        Self {
            addr: format!("{host}:{port}"),
            connect_timeout: Duration::from_millis(connect_timeout_ms),
            read_timeout: Duration::from_millis(read_timeout_ms),
        }
    }

    /// "host:port" this fetcher polls, for message composition.
    pub fn address(&self) -> &str {
        &self.addr
    }

    fn connect(&self) -> Result<TcpStream, FetchError> {
        let connect_err = |source| FetchError::Connect {
            addr: self.addr.clone(),
            source,
        };

        let mut addrs = self.addr.to_socket_addrs().map_err(connect_err)?;
        let addr = addrs.next().ok_or_else(|| {
            connect_err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "host resolved to no addresses",
            ))
        })?;

        // Zero means "no timeout" for both tunables; connect_timeout itself
        // rejects a zero duration.
        let stream = if self.connect_timeout > Duration::ZERO {
            TcpStream::connect_timeout(&addr, self.connect_timeout)
        } else {
            TcpStream::connect(addr)
        }
        .map_err(connect_err)?;
        if self.read_timeout > Duration::ZERO {
            stream
                .set_read_timeout(Some(self.read_timeout))
                .map_err(connect_err)?;
        }
        Ok(stream)
    }
}

impl SnapshotFetcher for TcpSnapshotFetcher {
    fn fetch(&self) -> Result<Snapshot, FetchError> {
        let mut stream = self.connect()?;

        let mut raw = Vec::new();
        stream
            .read_to_end(&mut raw)
            .map_err(|source| FetchError::Read {
                addr: self.addr.clone(),
                source,
            })?;

        if raw.is_empty() {
            return Err(FetchError::EmptyPayload {
                addr: self.addr.clone(),
            });
        }
        let payload = String::from_utf8(raw).map_err(|_| FetchError::InvalidUtf8 {
            addr: self.addr.clone(),
        })?;

        Ok(Snapshot::new(payload))
    }
}
