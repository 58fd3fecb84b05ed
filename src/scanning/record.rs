use chrono::NaiveDate;
use getset::{CopyGetters, Getters};
use serde::{Deserialize, Serialize};

const DISPLAY_DATE_FORMAT: &str = "%d-%m-%Y";

/// A decoded or manually entered product, not yet stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanCandidate {
    pub part_no: String,
    pub mrp: String,
}

impl ScanCandidate {
    pub fn new(part_no: impl Into<String>, mrp: impl Into<String>) -> ScanCandidate {
        ScanCandidate {
            part_no: part_no.into(),
            mrp: mrp.into(),
        }
    }
}

/// One aggregated `(part_no, mrp, date)` entry.
///
/// Field names are serialized in camel case so the persisted list keeps the
/// `partNo`/`mrp`/`date`/`quantity` layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, CopyGetters)]
#[serde(rename_all = "camelCase")]
pub struct ScanRecord {
    #[getset(get = "pub")]
    part_no: String,
    #[getset(get = "pub")]
    mrp: String,
    #[getset(get_copy = "pub")]
    date: NaiveDate,
    #[getset(get_copy = "pub")]
    quantity: u32,
}

impl ScanRecord {
    pub fn new(part_no: impl Into<String>, mrp: impl Into<String>, date: NaiveDate, quantity: u32) -> ScanRecord {
        ScanRecord {
            part_no: part_no.into(),
            mrp: mrp.into(),
            date,
            quantity,
        }
    }

    pub fn first_scan(candidate: &ScanCandidate, date: NaiveDate) -> ScanRecord {
        ScanRecord::new(candidate.part_no.clone(), candidate.mrp.clone(), date, 1)
    }

    pub fn matches(&self, part_no: &str, mrp: &str, date: NaiveDate) -> bool {
        self.date == date && self.part_no == part_no && self.mrp == mrp
    }

    pub fn increment(&mut self) {
        self.quantity = self.quantity.saturating_add(1);
    }

    pub fn display_date(&self) -> String {
        format_display_date(self.date)
    }
}

/// `DD-MM-YYYY`, used for section headers, export rows and file names.
pub fn format_display_date(date: NaiveDate) -> String {
    date.format(DISPLAY_DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_persisted_field_names() -> Result<()> {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let record = ScanRecord::new("A123XYZ", "150", date, 2);

        let json = serde_json::to_value(&record)?;
        assert_eq!(
            json,
            serde_json::json!({"partNo": "A123XYZ", "mrp": "150", "date": "2024-03-09", "quantity": 2})
        );

        let back: ScanRecord = serde_json::from_value(json)?;
        assert_eq!(back, record);

        Ok(())
    }

    #[test]
    fn test_display_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(format_display_date(date), "09-03-2024");
    }

    #[test]
    fn test_matches_whole_key() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let record = ScanRecord::new("A1", "10", date, 1);

        assert!(record.matches("A1", "10", date));
        assert!(!record.matches("A1", "10.0", date));
        assert!(!record.matches("A2", "10", date));
        assert!(!record.matches("A1", "10", date.succ_opt().unwrap()));
    }
}
