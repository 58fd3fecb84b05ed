use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::scanning::record::{format_display_date, ScanRecord};

const TOTAL_DECIMALS: u32 = 2;

/// Identifies the record a row's delete action removes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteKey {
    pub date: NaiveDate,
    pub part_no: String,
    pub mrp: String,
}

impl fmt::Display for DeleteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scanbook delete {} {} {}", self.date, quote(&self.part_no), quote(&self.mrp))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRow {
    pub part_no: String,
    pub mrp: String,
    pub quantity: u32,
    pub delete: DeleteKey,
}

/// A date's total value, following float arithmetic at the edges: an MRP
/// with no numeric prefix makes the total not-a-number, `Infinity` (or a value
/// past the decimal range) makes it infinite, and opposite infinities cancel
/// to not-a-number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionTotal {
    Value(Decimal),
    Infinite { negative: bool },
    NotANumber,
}

impl SectionTotal {
    fn overflowed(negative: bool) -> SectionTotal {
        SectionTotal::Infinite { negative }
    }

    fn times(self, quantity: u32) -> SectionTotal {
        match self {
            SectionTotal::Value(value) => value
                .checked_mul(Decimal::from(quantity))
                .map_or(SectionTotal::overflowed(value.is_sign_negative()), SectionTotal::Value),
            SectionTotal::Infinite { .. } if quantity == 0 => SectionTotal::NotANumber,
            other => other,
        }
    }

    fn plus(self, other: SectionTotal) -> SectionTotal {
        match (self, other) {
            (SectionTotal::NotANumber, _) | (_, SectionTotal::NotANumber) => SectionTotal::NotANumber,
            (SectionTotal::Infinite { negative: a }, SectionTotal::Infinite { negative: b }) if a != b => {
                SectionTotal::NotANumber
            },
            (infinite @ SectionTotal::Infinite { .. }, _) | (_, infinite @ SectionTotal::Infinite { .. }) => infinite,
            (SectionTotal::Value(a), SectionTotal::Value(b)) => a
                .checked_add(b)
                .map_or(SectionTotal::overflowed(a.is_sign_negative()), SectionTotal::Value),
        }
    }
}

impl fmt::Display for SectionTotal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionTotal::Value(value) => {
                let mut rounded = value.round_dp_with_strategy(TOTAL_DECIMALS, RoundingStrategy::MidpointAwayFromZero);
                rounded.rescale(TOTAL_DECIMALS);
                write!(f, "{}", rounded)
            },
            SectionTotal::Infinite { negative: false } => write!(f, "Infinity"),
            SectionTotal::Infinite { negative: true } => write!(f, "-Infinity"),
            SectionTotal::NotANumber => write!(f, "NaN"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateSection {
    pub date: NaiveDate,
    pub display_date: String,
    pub rows: Vec<HistoryRow>,
    pub total: SectionTotal,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HistoryView {
    pub sections: Vec<DateSection>,
}

impl HistoryView {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// Groups records by date, newest date first. Rows keep store order within a
/// date.
pub fn build_history(records: &[ScanRecord]) -> HistoryView {
    let mut grouped: BTreeMap<NaiveDate, Vec<&ScanRecord>> = BTreeMap::new();
    for record in records {
        grouped.entry(record.date()).or_default().push(record);
    }

    let sections = grouped
        .into_iter()
        .rev()
        .map(|(date, records)| DateSection {
            date,
            display_date: format_display_date(date),
            total: section_total(&records),
            rows: records.iter().map(|record| history_row(record)).collect(),
        })
        .collect();

    HistoryView { sections }
}

fn history_row(record: &ScanRecord) -> HistoryRow {
    HistoryRow {
        part_no: record.part_no().clone(),
        mrp: record.mrp().clone(),
        quantity: record.quantity(),
        delete: DeleteKey {
            date: record.date(),
            part_no: record.part_no().clone(),
            mrp: record.mrp().clone(),
        },
    }
}

fn section_total(records: &[&ScanRecord]) -> SectionTotal {
    records.iter().fold(SectionTotal::Value(Decimal::ZERO), |total, record| {
        total.plus(parse_price(record.mrp()).times(record.quantity()))
    })
}

/// Reads the longest numeric prefix of `text`, ignoring leading whitespace:
/// `"150abc"` is 150, `".5"` is 0.5, `"1e3"` is 1000, `"abc"` has no value.
/// Infinite or out-of-range prices have no decimal value either.
pub fn parse_leading_decimal(text: &str) -> Option<Decimal> {
    match parse_price(text) {
        SectionTotal::Value(value) => Some(value),
        _ => None,
    }
}

fn parse_price(text: &str) -> SectionTotal {
    let text = text.trim_start();
    let (negative, unsigned) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    if unsigned.starts_with("Infinity") {
        return SectionTotal::Infinite { negative };
    }

    let int_len = leading_digits(unsigned);
    let mut end = int_len;
    let mut frac = "";
    if unsigned[end..].starts_with('.') {
        let frac_len = leading_digits(&unsigned[end + 1..]);
        frac = &unsigned[end + 1..end + 1 + frac_len];
        end += 1 + frac_len;
    }

    let int = &unsigned[..int_len];
    if int.is_empty() && frac.is_empty() {
        return SectionTotal::NotANumber;
    }

    let mantissa = format!(
        "{}{}.{}",
        if negative { "-" } else { "" },
        if int.is_empty() { "0" } else { int },
        if frac.is_empty() { "0" } else { frac }
    );
    let Ok(mantissa) = Decimal::from_str(&mantissa) else {
        return SectionTotal::overflowed(negative);
    };

    match leading_exponent(&unsigned[end..]) {
        Some(exponent) => scale_by_power_of_ten(mantissa, exponent),
        None => SectionTotal::Value(mantissa),
    }
}

fn leading_digits(text: &str) -> usize {
    text.bytes().take_while(u8::is_ascii_digit).count()
}

/// `e`/`E`, an optional sign and at least one digit. Anything else is not an
/// exponent and the number ends before it.
fn leading_exponent(text: &str) -> Option<i64> {
    let rest = text.strip_prefix(['e', 'E'])?;
    let (negative, rest) = match rest.as_bytes().first() {
        Some(b'-') => (true, &rest[1..]),
        Some(b'+') => (false, &rest[1..]),
        _ => (false, rest),
    };

    let digits = &rest[..leading_digits(rest)];
    if digits.is_empty() {
        return None;
    }

    let magnitude = digits
        .bytes()
        .fold(0i64, |acc, digit| acc.saturating_mul(10).saturating_add(i64::from(digit - b'0')));

    Some(if negative { -magnitude } else { magnitude })
}

fn scale_by_power_of_ten(mut value: Decimal, exponent: i64) -> SectionTotal {
    let negative = value.is_sign_negative();
    for _ in 0..exponent.unsigned_abs() {
        if value.is_zero() {
            break;
        }

        value = if exponent > 0 {
            match value.checked_mul(Decimal::TEN) {
                Some(value) => value,
                None => return SectionTotal::overflowed(negative),
            }
        } else {
            value / Decimal::TEN
        };
    }

    SectionTotal::Value(value)
}

/// Plain-text rendering of the history, one block per date.
pub fn render_history(view: &HistoryView) -> String {
    if view.is_empty() {
        return "No scans recorded yet.\n".to_string();
    }

    let mut out = String::new();
    for (index, section) in view.sections.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        render_section(&mut out, section);
    }

    out
}

fn render_section(out: &mut String, section: &DateSection) {
    let headers = ["Part No", "MRP", "Qty", "Delete"];
    let cells: Vec<[String; 4]> = section
        .rows
        .iter()
        .map(|row| [row.part_no.clone(), row.mrp.clone(), row.quantity.to_string(), row.delete.to_string()])
        .collect();

    let mut widths = headers.map(|header| header.chars().count());
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    out.push_str(&section.display_date);
    out.push('\n');
    push_row(out, &headers.map(str::to_string), &widths);
    for row in &cells {
        push_row(out, row, &widths);
    }
    out.push_str(&format!("Total Value: ₹{}\n", section.total));
}

fn push_row(out: &mut String, cells: &[String; 4], widths: &[usize; 4]) {
    let line = cells
        .iter()
        .zip(widths.iter())
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str("  ");
    out.push_str(line.trim_end());
    out.push('\n');
}

fn quote(value: &str) -> String {
    if !value.is_empty() && value.chars().all(|c| c.is_ascii_alphanumeric() || "._-/".contains(c)) {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', "'\\''"))
    }
}
