// Core modules
pub mod config;
pub mod error;
pub mod snapshot;

// Pipeline components (fetch -> store -> diff -> notify)
pub mod diff;
pub mod fetch;
pub mod notify;
pub mod store;

// Orchestration + CLI
pub mod cli;
pub mod watcher;

// Convenience re-exports
pub use config::WatcherConfig;
pub use diff::{DiffStyle, SnapshotComparator};
pub use error::{FetchError, SendError, StorageError, WatcherError};
pub use fetch::{SnapshotFetcher, TcpSnapshotFetcher};
pub use notify::{Attachment, Notifier, SmtpNotifier};
pub use snapshot::Snapshot;
pub use store::{FsSnapshotStore, MemSnapshotStore, SnapshotStore};
pub use watcher::Watcher;
