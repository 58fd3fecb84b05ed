use chrono::{NaiveDate, Utc};
use log::{debug, info};
use serde_json::Value;

use super::record::{format_display_date, ScanCandidate, ScanRecord};
use super::{Confirm, KeyValueStorage, Storage, StoreError};

pub const SCANS_KEY: &str = "scans";

/// Scan records persisted as one list under [`SCANS_KEY`].
///
/// Every mutation loads the whole list, changes it and writes the whole list
/// back. There is no locking, the last writer wins.
pub struct ScanStore {
    storage: Storage,
}

impl ScanStore {
    pub fn new(storage: impl Into<Storage>) -> ScanStore {
        ScanStore {
            storage: storage.into(),
        }
    }

    pub fn load_all(&self) -> Result<Vec<ScanRecord>, StoreError> {
        match self.storage.get(SCANS_KEY)? {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(value) => serde_json::from_value(value).map_err(|source| StoreError::MalformedEntry {
                key: SCANS_KEY.to_string(),
                source,
            }),
        }
    }

    /// Store a scan under today's UTC date.
    pub fn save(&mut self, candidate: &ScanCandidate) -> Result<ScanRecord, StoreError> {
        self.save_on(candidate, today())
    }

    /// Increments the quantity of the `(part_no, mrp, date)` record, or appends
    /// it with a quantity of 1. Returns the stored record.
    pub fn save_on(&mut self, candidate: &ScanCandidate, date: NaiveDate) -> Result<ScanRecord, StoreError> {
        let mut records = self.load_all()?;

        let saved = match records
            .iter_mut()
            .find(|record| record.matches(&candidate.part_no, &candidate.mrp, date))
        {
            Some(existing) => {
                existing.increment();
                existing.clone()
            },
            None => {
                let record = ScanRecord::first_scan(candidate, date);
                records.push(record.clone());
                record
            },
        };

        self.write_all(&records)?;
        info!(
            "saved scan, part_no={}, mrp={}, date={}, quantity={}",
            saved.part_no(),
            saved.mrp(),
            saved.date(),
            saved.quantity()
        );

        Ok(saved)
    }

    /// Removes every record matching the tuple and returns how many went away.
    pub fn delete(&mut self, date: NaiveDate, part_no: &str, mrp: &str) -> Result<usize, StoreError> {
        let mut records = self.load_all()?;
        let before = records.len();
        records.retain(|record| !record.matches(part_no, mrp, date));
        let removed = before - records.len();

        self.write_all(&records)?;
        info!("deleted scans, part_no={}, mrp={}, date={}, removed={}", part_no, mrp, date, removed);

        Ok(removed)
    }

    /// Asks before deleting. `None` means the user declined and nothing changed.
    pub fn confirm_and_delete(
        &mut self,
        confirm: &mut dyn Confirm,
        date: NaiveDate,
        part_no: &str,
        mrp: &str,
    ) -> Result<Option<usize>, StoreError> {
        let question = format!("Delete {} (₹{}) from {}?", part_no, mrp, format_display_date(date));
        if !confirm.confirm(&question) {
            debug!("delete declined, part_no={}, mrp={}, date={}", part_no, mrp, date);
            return Ok(None);
        }

        self.delete(date, part_no, mrp).map(Some)
    }

    fn write_all(&mut self, records: &[ScanRecord]) -> Result<(), StoreError> {
        let value = serde_json::to_value(records)?;
        self.storage.set(SCANS_KEY, value)
    }
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}
