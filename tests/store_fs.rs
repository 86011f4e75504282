use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;

use registry_watcher::error::StorageError;
use registry_watcher::snapshot::Snapshot;
use registry_watcher::store::{FsSnapshotStore, SnapshotStore};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn unique_root(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("rwtest-store-{prefix}-{pid}-{t}-{id}"))
}

#[test]
fn open_creates_directory_and_lists_empty() -> Result<()> {
    let root = unique_root("empty");
    let store = FsSnapshotStore::open(&root)?;
    assert!(root.is_dir());
    assert!(store.list_timestamps()?.is_empty());
    assert!(store.latest()?.is_none());
    Ok(())
}

#[test]
fn put_get_round_and_payload_verbatim() -> Result<()> {
    let root = unique_root("round");
    let store = FsSnapshotStore::open(&root)?;

    let s = Snapshot::with_timestamp("<registry>\n  <node id=\"a\"/>\n</registry>\n".into(), 42);
    store.put(&s)?;

    let got = store.get(42)?;
    assert_eq!(got.payload(), s.payload());
    assert_eq!(got.captured_at(), 42);

    // file content is the payload, byte for byte
    let raw = fs::read_to_string(root.join("42.snapshot"))?;
    assert_eq!(raw, s.payload());
    Ok(())
}

#[test]
fn timestamps_come_back_ascending() -> Result<()> {
    let root = unique_root("order");
    let store = FsSnapshotStore::open(&root)?;

    // out-of-order puts, including one that sorts differently as a string
    for ts in [300, 100, 1000, 200] {
        store.put(&Snapshot::with_timestamp(format!("payload-{ts}"), ts))?;
    }

    assert_eq!(store.list_timestamps()?, vec![100, 200, 300, 1000]);
    let latest = store.latest()?.expect("latest must exist");
    assert_eq!(latest.captured_at(), 1000);
    assert_eq!(latest.payload(), "payload-1000");
    Ok(())
}

#[test]
fn missing_key_is_a_distinct_error() -> Result<()> {
    let root = unique_root("missing");
    let store = FsSnapshotStore::open(&root)?;
    match store.get(777) {
        Err(StorageError::MissingKey(ts)) => assert_eq!(ts, 777),
        other => panic!("expected MissingKey, got {other:?}"),
    }
    Ok(())
}

#[test]
fn foreign_files_are_skipped() -> Result<()> {
    let root = unique_root("foreign");
    let store = FsSnapshotStore::open(&root)?;

    store.put(&Snapshot::with_timestamp("p".into(), 5))?;
    fs::write(root.join("README.txt"), "not a snapshot")?;
    fs::write(root.join("garbage.snapshot"), "non-numeric stem")?;

    assert_eq!(store.list_timestamps()?, vec![5]);
    Ok(())
}

#[test]
fn non_utf8_payload_is_rejected_on_read() -> Result<()> {
    let root = unique_root("utf8");
    let store = FsSnapshotStore::open(&root)?;

    fs::write(root.join("9.snapshot"), [0xff, 0xfe, 0x00, 0x01])?;
    match store.get(9) {
        Err(StorageError::BadPayload { .. }) => {}
        other => panic!("expected BadPayload, got {other:?}"),
    }
    Ok(())
}

#[test]
fn put_overwrites_nothing_across_distinct_keys() -> Result<()> {
    // every cycle writes under its own timestamp, older files stay intact
    let root = unique_root("retain");
    let store = FsSnapshotStore::open(&root)?;

    store.put(&Snapshot::with_timestamp("A".into(), 1))?;
    store.put(&Snapshot::with_timestamp("B".into(), 2))?;
    store.put(&Snapshot::with_timestamp("C".into(), 3))?;

    assert_eq!(store.get(1)?.payload(), "A");
    assert_eq!(store.get(2)?.payload(), "B");
    assert_eq!(store.get(3)?.payload(), "C");
    Ok(())
}
