use log::debug;

use super::record::ScanCandidate;
use super::DecodeError;

const SEGMENT_SEPARATOR: char = '-';
const MIN_SEGMENTS: usize = 3;

// Labels without any letter in the middle segment carry an 8 digit prefix
// before the part number. Fragile against other label layouts.
const NUMERIC_PREFIX_LEN: usize = 8;

/// Decode a `<ignored>-<middle>-<mrp>[-...]` payload.
///
/// The part number is the middle segment from its first ASCII letter on, or
/// the middle segment without its first 8 characters when it has no letter.
/// The MRP is the third segment, taken verbatim.
pub fn decode(payload: &str) -> Result<ScanCandidate, DecodeError> {
    let segments: Vec<&str> = payload.split(SEGMENT_SEPARATOR).map(str::trim).collect();
    if segments.len() < MIN_SEGMENTS {
        debug!("rejected payload, segments={}", segments.len());
        return Err(DecodeError::InvalidFormat(payload.to_string()));
    }

    let middle = segments[1];
    let part_no = match middle.find(|c: char| c.is_ascii_alphabetic()) {
        Some(index) => middle[index..].to_string(),
        None => middle.chars().skip(NUMERIC_PREFIX_LEN).collect(),
    };

    Ok(ScanCandidate::new(part_no, segments[2]))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_decode_alphabetic_part_number() {
        assert_eq!(decode("2024-A123XYZ-150"), Ok(ScanCandidate::new("A123XYZ", "150")));
        assert_eq!(decode("x-0042ABC123XYZ-99.50"), Ok(ScanCandidate::new("ABC123XYZ", "99.50")));
    }

    #[test]
    fn test_decode_numeric_part_number_drops_prefix() {
        assert_eq!(decode("LBL-202403091234567-450"), Ok(ScanCandidate::new("1234567", "450")));
        assert_eq!(decode("LBL-1234-450"), Ok(ScanCandidate::new("", "450")));
    }

    #[test]
    fn test_decode_trims_segments() {
        assert_eq!(decode(" 1 -  B77  - 12 "), Ok(ScanCandidate::new("B77", "12")));
    }

    #[test]
    fn test_decode_accepts_trailing_segments_and_garbage_mrp() {
        assert_eq!(decode("a-b-c-d-e"), Ok(ScanCandidate::new("b", "c")));
        assert_eq!(decode("1-Z9-not a price"), Ok(ScanCandidate::new("Z9", "not a price")));
        assert_eq!(decode("--"), Ok(ScanCandidate::new("", "")));
    }

    #[test]
    fn test_decode_too_few_segments() {
        assert_eq!(decode("A123XYZ"), Err(DecodeError::InvalidFormat("A123XYZ".to_string())));
        assert_eq!(decode("2024-A123XYZ"), Err(DecodeError::InvalidFormat("2024-A123XYZ".to_string())));
        assert_eq!(decode(""), Err(DecodeError::InvalidFormat(String::new())));
    }
}
