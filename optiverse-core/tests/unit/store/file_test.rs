use super::*;
use crate::helpers::models::*;
use crate::models::{Artifacts, CandidateOutcome, Metrics, PendingCandidate};
use std::io::Write;

#[test]
fn can_append_and_read_records() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path().join("run")).unwrap();

    store.append(&evaluated(1, 0, 100.)).unwrap();
    store.append_best(&evaluated(1, 0, 100.)).unwrap();
    store.append_generation(&Generation { index: 0, candidate_ids: vec![1], best_id: Some(1), iteration: 0 }).unwrap();

    let records = store.read_records().unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[1], Record::Best { candidate_id: 1 });
    assert!(store.journal().ends_with(FileStore::JOURNAL));
    assert!(store.directory().ends_with("run"));
}

#[test]
fn can_resume_from_reopened_store() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = FileStore::open(dir.path()).unwrap();
        store.append(&evaluated(1, 0, 100.)).unwrap();
        store.append_best(&evaluated(1, 0, 100.)).unwrap();
        store.append(&evaluated(2, 1, 80.)).unwrap();
        store.append_best(&evaluated(2, 1, 80.)).unwrap();
        store.append(&invalid(3, 1)).unwrap();
    }

    let store = FileStore::open(dir.path()).unwrap();
    let state = store.load_latest(Direction::Minimize).unwrap().unwrap();

    assert_eq!(state.next_id(), 4);
    assert_eq!(state.best().map(|best| best.id()), Some(2));
}

#[test]
fn can_skip_and_cut_torn_tail() {
    let dir = tempfile::tempdir().unwrap();
    let journal = {
        let store = FileStore::open(dir.path()).unwrap();
        store.append(&evaluated(1, 0, 100.)).unwrap();
        store.journal().to_path_buf()
    };

    let mut file = OpenOptions::new().append(true).open(&journal).unwrap();
    file.write_all(br#"{"type":"candidate","id":2,"gener"#).unwrap();
    drop(file);

    let store = FileStore::open(dir.path()).unwrap();
    assert_eq!(store.read_records().unwrap().len(), 1);

    store.append(&evaluated(2, 1, 90.)).unwrap();
    let state = store.load_latest(Direction::Minimize).unwrap().unwrap();
    assert_eq!(state.history().len(), 2);
    assert_eq!(state.best().map(|best| best.id()), Some(2));
}

#[test]
fn can_report_corrupted_line() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).unwrap();
    store.append(&evaluated(1, 0, 100.)).unwrap();

    fs::write(store.journal(), "not a json\n").unwrap();

    match store.read_records() {
        Err(StoreError::Corrupted(msg)) => assert!(msg.contains("line 1")),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn can_restore_candidate_artifacts_from_journal() {
    let dir = tempfile::tempdir().unwrap();
    let artifacts = Artifacts::from([
        ("run_1_stdout".to_string(), ">>> 42\n".to_string()),
        ("run_1_stderr".to_string(), "warning: slow\n".to_string()),
    ]);
    let candidate = PendingCandidate::new(0, "print(42)".to_string(), None).resolve(
        1,
        CandidateOutcome::Evaluated { score: 42., metrics: Metrics::default(), artifacts: artifacts.clone() },
    );
    {
        let store = FileStore::open(dir.path()).unwrap();
        store.append(&candidate).unwrap();
    }

    let state = FileStore::open(dir.path()).unwrap().load_latest(Direction::Minimize).unwrap().unwrap();

    assert_eq!(state.history()[0].artifacts(), &artifacts);
    assert_eq!(state.history()[0], candidate);
}
