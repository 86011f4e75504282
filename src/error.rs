//! Error taxonomy for the watcher pipeline.
//!
//! Each pipeline component fails with its own kind (fetch / storage / send),
//! and [`WatcherError`] is the single fatal signal surfaced to the caller.
//! Which kinds become fatal is decided at the call sites in `watcher.rs`,
//! not here: only a fetch failure and an attachment-spool failure abort a
//! cycle, everything else is logged and swallowed.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Registry snapshot could not be fetched.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("connect to registry {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("read snapshot from registry {addr}: {source}")]
    Read {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("registry {addr} returned an empty snapshot")]
    EmptyPayload { addr: String },
    #[error("registry {addr} returned non-UTF-8 snapshot data")]
    InvalidUtf8 { addr: String },
}

/// Snapshot storage (or attachment spool) failure.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("snapshot io at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("no snapshot stored for timestamp {0}")]
    MissingKey(i64),
    #[error("stored snapshot at {path} is not valid UTF-8")]
    BadPayload { path: PathBuf },
}

/// Notification could not be handed off to the mail transport.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("invalid mail address '{0}'")]
    Address(String),
    #[error("compose mail message: {0}")]
    Compose(String),
    #[error("mail transport: {0}")]
    Transport(String),
}

/// Fatal outcome of one watcher cycle.
///
/// Only two conditions abort a cycle: the registry could not be fetched, or
/// the diff attachment could not be spooled to disk.
#[derive(Debug, Error)]
pub enum WatcherError {
    #[error("failed to fetch registry snapshot")]
    Fetch(#[from] FetchError),
    #[error("failed to prepare diff attachment")]
    Attachment(#[from] StorageError),
}
