//! Helper functions for BSON value conversion
//!
//! This module provides common utility functions used by the encoder and decoder.

use chrono::{DateTime as ChronoDateTime, NaiveDate, SecondsFormat, Utc};
use mongodb::bson::{Binary, DateTime, spec::BinarySubtype};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Convert DateTime to ISO 8601 string with millisecond precision
///
/// # Arguments
/// * `dt` - BSON DateTime value
///
/// # Returns
/// `Some(iso)` for dates chrono can represent, `None` otherwise
pub fn datetime_to_iso_string(dt: &DateTime) -> Option<String> {
    ChronoDateTime::<Utc>::from_timestamp_millis(dt.timestamp_millis())
        .map(|d| d.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Parse a date string into a BSON DateTime
///
/// Accepts RFC 3339 timestamps and date-only `YYYY-MM-DD` strings, the latter
/// taken as midnight UTC.
pub fn parse_date_string(s: &str) -> Option<DateTime> {
    let s = s.trim();
    if let Ok(parsed) = ChronoDateTime::parse_from_rfc3339(s) {
        return Some(DateTime::from_millis(parsed.timestamp_millis()));
    }

    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
    let midnight = date.and_hms_opt(0, 0, 0)?;
    Some(DateTime::from_millis(midnight.and_utc().timestamp_millis()))
}

/// Convert Binary data to Base64 string
///
/// # Arguments
/// * `bin` - BSON Binary value
///
/// # Returns
/// Base64 encoded string
pub fn binary_to_base64(bin: &Binary) -> String {
    STANDARD.encode(&bin.bytes)
}

/// Build Binary data from a Base64 payload and a hex subtype
pub fn binary_from_base64(payload: &str, subtype_hex: &str) -> Option<Binary> {
    let bytes = STANDARD.decode(payload).ok()?;
    let subtype = u8::from_str_radix(subtype_hex, 16).ok()?;
    Some(Binary {
        subtype: BinarySubtype::from(subtype),
        bytes,
    })
}

/// Convert BinarySubtype to u8 number
///
/// # Arguments
/// * `subtype` - BSON Binary subtype
///
/// # Returns
/// Numeric representation of the subtype
pub fn binary_subtype_to_u8(subtype: BinarySubtype) -> u8 {
    match subtype {
        BinarySubtype::Generic => 0,
        BinarySubtype::Function => 1,
        BinarySubtype::BinaryOld => 2,
        BinarySubtype::UuidOld => 3,
        BinarySubtype::Uuid => 4,
        BinarySubtype::Md5 => 5,
        BinarySubtype::Encrypted => 6,
        BinarySubtype::Column => 7,
        BinarySubtype::Sensitive => 8,
        BinarySubtype::UserDefined(n) => n,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_datetime_to_iso_string() {
        let dt = DateTime::from_millis(1_705_314_600_000);
        assert_eq!(
            datetime_to_iso_string(&dt).as_deref(),
            Some("2024-01-15T10:30:00.000Z")
        );
    }

    #[test]
    fn test_parse_date_string() {
        let full = parse_date_string("2024-01-15T10:30:00Z").unwrap();
        assert_eq!(full.timestamp_millis(), 1_705_314_600_000);

        let offset = parse_date_string("2024-01-15T12:30:00+02:00").unwrap();
        assert_eq!(offset, full);

        let date_only = parse_date_string("2024-01-15").unwrap();
        assert_eq!(date_only.timestamp_millis(), 1_705_276_800_000);

        assert!(parse_date_string("yesterday").is_none());
    }

    #[test]
    fn test_binary_base64() {
        let bin = Binary {
            subtype: BinarySubtype::Generic,
            bytes: vec![0x01, 0x02, 0x03],
        };
        assert_eq!(binary_to_base64(&bin), "AQID");

        let back = binary_from_base64("AQID", "00").unwrap();
        assert_eq!(back, bin);
        assert!(binary_from_base64("!!", "00").is_none());
        assert!(binary_from_base64("AQID", "zz").is_none());
    }

    #[test]
    fn test_binary_subtype_to_u8() {
        assert_eq!(binary_subtype_to_u8(BinarySubtype::Generic), 0);
        assert_eq!(binary_subtype_to_u8(BinarySubtype::Function), 1);
        assert_eq!(binary_subtype_to_u8(BinarySubtype::Uuid), 4);
        assert_eq!(binary_subtype_to_u8(BinarySubtype::UserDefined(0x80)), 0x80);
    }
}
