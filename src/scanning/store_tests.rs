use anyhow::{bail, Result};
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use serde_json::json;

use super::record::{ScanCandidate, ScanRecord};
use super::storage::{FileStorage, MemoryStorage};
use super::store::{ScanStore, SCANS_KEY};
use super::*;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
}

fn memory_store() -> ScanStore {
    ScanStore::new(MemoryStorage::new())
}

#[test]
fn test_load_all_empty() -> Result<()> {
    let store = memory_store();
    assert!(store.load_all()?.is_empty());

    Ok(())
}

#[test]
fn test_save_same_key_same_day_increments() -> Result<()> {
    let mut store = memory_store();
    let candidate = ScanCandidate::new("A123XYZ", "150");

    let first = store.save_on(&candidate, day(9))?;
    assert_eq!(first.quantity(), 1);

    let second = store.save_on(&candidate, day(9))?;
    assert_eq!(second.quantity(), 2);

    assert_eq!(store.load_all()?, vec![ScanRecord::new("A123XYZ", "150", day(9), 2)]);

    Ok(())
}

#[test]
fn test_save_different_days_keeps_separate_records() -> Result<()> {
    let mut store = memory_store();
    let candidate = ScanCandidate::new("A123XYZ", "150");

    store.save_on(&candidate, day(9))?;
    store.save_on(&candidate, day(10))?;

    assert_eq!(
        store.load_all()?,
        vec![
            ScanRecord::new("A123XYZ", "150", day(9), 1),
            ScanRecord::new("A123XYZ", "150", day(10), 1),
        ]
    );

    Ok(())
}

#[test]
fn test_save_different_mrp_is_a_different_key() -> Result<()> {
    let mut store = memory_store();

    store.save_on(&ScanCandidate::new("A1", "150"), day(9))?;
    store.save_on(&ScanCandidate::new("A1", "150.00"), day(9))?;
    store.save_on(&ScanCandidate::new("A1", "150"), day(9))?;

    assert_eq!(
        store.load_all()?,
        vec![
            ScanRecord::new("A1", "150", day(9), 2),
            ScanRecord::new("A1", "150.00", day(9), 1),
        ]
    );

    Ok(())
}

#[test]
fn test_save_uses_today() -> Result<()> {
    let mut store = memory_store();
    let saved = store.save(&ScanCandidate::new("B2", "20"))?;

    assert_eq!(saved.date(), store::today());

    Ok(())
}

#[test]
fn test_delete_removes_only_exact_match() -> Result<()> {
    let mut store = memory_store();
    store.save_on(&ScanCandidate::new("A1", "10"), day(9))?;
    store.save_on(&ScanCandidate::new("A1", "10"), day(10))?;
    store.save_on(&ScanCandidate::new("A1", "11"), day(9))?;
    store.save_on(&ScanCandidate::new("A2", "10"), day(9))?;

    assert_eq!(store.delete(day(9), "A1", "10")?, 1);

    assert_eq!(
        store.load_all()?,
        vec![
            ScanRecord::new("A1", "10", day(10), 1),
            ScanRecord::new("A1", "11", day(9), 1),
            ScanRecord::new("A2", "10", day(9), 1),
        ]
    );

    assert_eq!(store.delete(day(9), "A1", "10")?, 0);

    Ok(())
}

#[test]
fn test_confirm_and_delete_declined() -> Result<()> {
    let mut store = memory_store();
    store.save_on(&ScanCandidate::new("A1", "10"), day(9))?;

    assert_eq!(store.confirm_and_delete(&mut AutoConfirm(false), day(9), "A1", "10")?, None);
    assert_eq!(store.load_all()?.len(), 1);

    assert_eq!(store.confirm_and_delete(&mut AutoConfirm(true), day(9), "A1", "10")?, Some(1));
    assert!(store.load_all()?.is_empty());

    Ok(())
}

#[test]
fn test_confirm_and_delete_question() -> Result<()> {
    struct Recorder(Vec<String>);

    impl Confirm for Recorder {
        fn confirm(&mut self, question: &str) -> bool {
            self.0.push(question.to_string());
            false
        }
    }

    let mut store = memory_store();
    let mut recorder = Recorder(vec![]);
    store.confirm_and_delete(&mut recorder, day(9), "A1", "10")?;

    assert_eq!(recorder.0, vec!["Delete A1 (₹10) from 09-03-2024?".to_string()]);

    Ok(())
}

#[test]
fn test_reads_existing_layout() -> Result<()> {
    let mut storage = MemoryStorage::new();
    storage.set(
        SCANS_KEY,
        json!([
            {"partNo": "A1", "mrp": "10", "date": "2024-03-09", "quantity": 3},
            {"partNo": "B2", "mrp": "5.5", "date": "2024-03-10", "quantity": 1},
        ]),
    )?;

    let mut store = ScanStore::new(storage);
    store.save_on(&ScanCandidate::new("A1", "10"), day(9))?;

    assert_eq!(
        store.load_all()?,
        vec![
            ScanRecord::new("A1", "10", day(9), 4),
            ScanRecord::new("B2", "5.5", day(10), 1),
        ]
    );

    Ok(())
}

#[test]
fn test_malformed_entry_is_not_overwritten() -> Result<()> {
    let mut storage = MemoryStorage::new();
    storage.set(SCANS_KEY, json!({"not": "a list"}))?;
    let mut store = ScanStore::new(storage);

    if let Err(err) = store.save_on(&ScanCandidate::new("A1", "10"), day(9)) {
        assert!(matches!(err, StoreError::MalformedEntry { .. }));
    } else {
        bail!("saving over a malformed entry should fail");
    }

    assert!(store.load_all().is_err());

    Ok(())
}

#[test]
fn test_file_store_persists_between_instances() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("scans.json");

    let mut store = ScanStore::new(FileStorage::new(&path));
    store.save_on(&ScanCandidate::new("A123XYZ", "150"), day(9))?;
    store.save_on(&ScanCandidate::new("A123XYZ", "150"), day(9))?;

    let reopened = ScanStore::new(FileStorage::new(&path));
    assert_eq!(reopened.load_all()?, vec![ScanRecord::new("A123XYZ", "150", day(9), 2)]);

    Ok(())
}
