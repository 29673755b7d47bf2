use sheetledger_core::db::open_db;
use sheetledger_core::{
    FileSequenceStore, SequenceAllocator, SequenceStore, SqliteSequenceStore,
};
use std::collections::BTreeSet;
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::thread;

const CHILD_SEQ_PATH: &str = "SHEETLEDGER_CHILD_SEQ_PATH";
const CHILD_ALLOCATIONS: usize = 15;

#[test]
fn fresh_key_allocates_1001_then_1002() {
    let dir = tempfile::tempdir().unwrap();
    let allocator =
        SequenceAllocator::new(FileSequenceStore::new(dir.path().join("seq.json")).unwrap());

    assert_eq!(allocator.peek_next_padded("X").unwrap(), "1001");
    assert_eq!(allocator.next("X").unwrap(), 1001);
    assert_eq!(allocator.next("X").unwrap(), 1002);
    assert_eq!(allocator.peek("X").unwrap(), 1002);
}

#[test]
fn stores_on_the_same_file_share_one_counter() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("seq.json");
    let first = FileSequenceStore::new(&path).unwrap();
    let second = FileSequenceStore::new(&path).unwrap();

    assert_eq!(first.increment("WORKORDER_SEQ").unwrap(), 1001);
    assert_eq!(second.increment("WORKORDER_SEQ").unwrap(), 1002);
}

#[test]
fn concurrent_file_allocations_never_repeat() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("seq.json");

    let handles = (0..8)
        .map(|_| {
            let path = path.clone();
            thread::spawn(move || {
                let store = FileSequenceStore::new(path).unwrap();
                (0..10)
                    .map(|_| store.increment("WORKORDER_SEQ").unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect::<Vec<_>>();

    let values = handles
        .into_iter()
        .flat_map(|handle| handle.join().unwrap())
        .collect::<BTreeSet<_>>();
    assert_eq!(values.len(), 80);
    assert_eq!(values.first(), Some(&1001));
    assert_eq!(values.last(), Some(&1080));
}

#[test]
fn shared_store_behind_arc_serializes_increments() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileSequenceStore::new(dir.path().join("seq.json")).unwrap());

    let handles = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let allocator = SequenceAllocator::new(store);
                (0..5).map(|_| allocator.next("K").unwrap()).collect::<Vec<_>>()
            })
        })
        .collect::<Vec<_>>();
    let values = handles
        .into_iter()
        .flat_map(|handle| handle.join().unwrap())
        .collect::<BTreeSet<_>>();

    assert_eq!(values.len(), 20);
    assert_eq!(store.peek("K").unwrap(), 1020);
}

#[test]
fn sqlite_counter_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.db");

    {
        let conn = open_db(&path).unwrap();
        let store = SqliteSequenceStore::new(&conn);
        assert_eq!(store.increment("X").unwrap(), 1001);
        assert_eq!(store.increment("X").unwrap(), 1002);
    }

    let conn = open_db(&path).unwrap();
    let store = SqliteSequenceStore::new(&conn);
    assert_eq!(store.peek("X").unwrap(), 1002);
    assert_eq!(store.peek("untouched").unwrap(), 1000);
}

/// Runs inside the child processes spawned below.
#[test]
#[ignore = "spawned by separate_processes_never_repeat_values"]
fn allocate_in_child_process() {
    let Ok(path) = std::env::var(CHILD_SEQ_PATH) else {
        return;
    };
    let store = FileSequenceStore::new(path).unwrap();
    for _ in 0..CHILD_ALLOCATIONS {
        println!("allocated={}", store.increment("WORKORDER_SEQ").unwrap());
    }
}

#[test]
fn separate_processes_never_repeat_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("seq.json");
    let exe = std::env::current_exe().unwrap();

    let children = (0..6)
        .map(|_| {
            Command::new(&exe)
                .args([
                    "allocate_in_child_process",
                    "--exact",
                    "--ignored",
                    "--nocapture",
                    "--test-threads=1",
                ])
                .env(CHILD_SEQ_PATH, &path)
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .spawn()
                .unwrap()
        })
        .collect::<Vec<_>>();

    let mut values = Vec::new();
    for child in children {
        let output = child.wait_with_output().unwrap();
        assert!(
            output.status.success(),
            "child failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        // libtest may print its own prefix on the first line
        let stdout = String::from_utf8_lossy(&output.stdout);
        values.extend(stdout.lines().filter_map(|line| {
            let at = line.find("allocated=")? + "allocated=".len();
            Some(line[at..].trim().parse::<i64>().unwrap())
        }));
    }

    let total = 6 * CHILD_ALLOCATIONS;
    assert_eq!(values.len(), total);
    let unique = values.into_iter().collect::<BTreeSet<_>>();
    assert_eq!(unique.len(), total);
    assert_eq!(unique.first(), Some(&1001));
    assert_eq!(unique.last(), Some(&(1000 + total as i64)));
}
