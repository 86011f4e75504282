//! Watcher — links all parts together for one fetch-compare-notify cycle.
//!
//! One `check()` runs: fetch the current registry snapshot, load the latest
//! stored one, persist the fresh one, and mail a diff report if the payload
//! changed. A fetch failure mails an alert instead and aborts the cycle.
//!
//! Fatal vs. non-fatal is the core contract here:
//! - fatal (returned as [`WatcherError`]): fetch failure, attachment-spool
//!   failure while composing the diff;
//! - non-fatal (logged, cycle proceeds): previous-snapshot lookup failure,
//!   persist failure, notification-send failure.

use std::io::Write;

use chrono::TimeZone;
use log::{error, info};
use tempfile::NamedTempFile;

use crate::config::WatcherConfig;
use crate::diff::SnapshotComparator;
use crate::error::{StorageError, WatcherError};
use crate::fetch::{SnapshotFetcher, TcpSnapshotFetcher};
use crate::notify::{Attachment, Notifier, SmtpNotifier};
use crate::snapshot::{now_millis, Snapshot};
use crate::store::{FsSnapshotStore, SnapshotStore};

/// Attachment name, without the style-dependent extension.
const ATTACHMENT_FILE_NAME: &str = "registry-changes";

/// Single-cycle orchestrator over the pipeline components.
pub struct Watcher<S, F, N> {
    store: S,
    fetcher: F,
    comparator: SnapshotComparator,
    notifier: N,
    registry_address: String,
}

impl Watcher<FsSnapshotStore, TcpSnapshotFetcher, SmtpNotifier> {
    /// Wire the production components from configuration.
    pub fn from_config(cfg: &WatcherConfig) -> Result<Self, StorageError> {
        let store = FsSnapshotStore::open(&cfg.local_path)?;
        let fetcher = TcpSnapshotFetcher::new(
            &cfg.registry_host,
            cfg.registry_port,
            cfg.connect_timeout_ms,
            cfg.read_timeout_ms,
        );
        Ok(Self::new(
            store,
            fetcher,
            SnapshotComparator::new(cfg.diff_style),
            SmtpNotifier::from_config(cfg),
            cfg.registry_address(),
        ))
    }
}

impl<S, F, N> Watcher<S, F, N>
where
    S: SnapshotStore,
    F: SnapshotFetcher,
    N: Notifier,
{
    pub fn new(
        store: S,
        fetcher: F,
        comparator: SnapshotComparator,
        notifier: N,
        registry_address: String,
    ) -> Self {
        Self {
            store,
            fetcher,
            comparator,
            notifier,
            registry_address,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run one cycle: fetch, persist, compare with the previous snapshot
    /// and notify on change.
    pub fn check(&self) -> Result<(), WatcherError> {
        let current = self.fetch_current()?;
        let previous = self.previous_snapshot();

        self.persist(&current);

        match previous {
            Some(previous) if previous != current => {
                info!(
                    "registry change detected at {} ({} -> {})",
                    self.registry_address,
                    previous.captured_at(),
                    current.captured_at()
                );
                let message = self.compose_change_message(current.captured_at());
                let attachment = self.spool_diff_attachment(&previous, &current)?;
                self.notify(&message, std::slice::from_ref(&attachment));
            }
            Some(_) => info!("no registry change at {}", self.registry_address),
            None => info!(
                "no previous snapshot for {}, treating as first run",
                self.registry_address
            ),
        }
        Ok(())
    }

    fn fetch_current(&self) -> Result<Snapshot, WatcherError> {
        match self.fetcher.fetch() {
            Ok(snapshot) => Ok(snapshot),
            Err(e) => {
                error!("failed to fetch registry snapshot: {e}");
                // Best-effort alert; the cycle is fatal either way.
                self.notify(&self.compose_fetch_failure_message(), &[]);
                Err(WatcherError::Fetch(e))
            }
        }
    }

    fn previous_snapshot(&self) -> Option<Snapshot> {
        match self.store.latest() {
            Ok(previous) => previous,
            Err(e) => {
                error!("failed to retrieve previous snapshot: {e}");
                None
            }
        }
    }

    fn persist(&self, snapshot: &Snapshot) {
        if let Err(e) = self.store.put(snapshot) {
            error!("failed to store snapshot: {e}");
        }
    }

    fn notify(&self, message: &str, attachments: &[Attachment]) {
        if let Err(e) = self.notifier.send(message, attachments) {
            error!("failed to send notification: {e}");
        }
    }

    /// Render the diff and spool it through a scoped temp file. The file is
    /// removed when the guard drops, whatever the send outcome.
    fn spool_diff_attachment(
        &self,
        previous: &Snapshot,
        current: &Snapshot,
    ) -> Result<Attachment, WatcherError> {
        let diff = self.comparator.diff(previous, current);
        let body = spool_through_temp_file(diff.as_bytes())?;
        Ok(Attachment {
            filename: format!("{ATTACHMENT_FILE_NAME}{}", self.comparator.file_type()),
            body,
        })
    }

    fn compose_change_message(&self, captured_at: i64) -> String {
        format!(
            "Registry at the {} update detected {}",
            self.registry_address,
            iso8601(captured_at)
        )
    }

    fn compose_fetch_failure_message(&self) -> String {
        format!(
            "Failed to fetch registry snapshot from the {} {}",
            self.registry_address,
            iso8601(now_millis())
        )
    }
}

/// Write `data` to a fresh temp file and read it back. The temp file lives
/// only for the duration of this call.
fn spool_through_temp_file(data: &[u8]) -> Result<Vec<u8>, StorageError> {
    let io_err = |path, source| StorageError::Io { path, source };

    let mut tmp = NamedTempFile::new().map_err(|e| io_err(std::env::temp_dir(), e))?;
    tmp.write_all(data)
        .and_then(|_| tmp.flush())
        .map_err(|e| io_err(tmp.path().to_path_buf(), e))?;
    let body = std::fs::read(tmp.path()).map_err(|e| io_err(tmp.path().to_path_buf(), e))?;
    Ok(body)
}

/// ISO-8601 second-precision rendering of a millisecond timestamp.
fn iso8601(millis: i64) -> String {
    match chrono::Utc.timestamp_millis_opt(millis) {
        chrono::LocalResult::Single(dt) => dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
        _ => millis.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iso8601_rendering() {
        // 2023-08-29T08:00:00 UTC
        assert_eq!(iso8601(1_693_296_000_000), "2023-08-29T08:00:00");
    }

    #[test]
    fn temp_spool_round() {
        let body = spool_through_temp_file(b"--- previous\n+++ current\n").unwrap();
        assert_eq!(body, b"--- previous\n+++ current\n");
    }
}
