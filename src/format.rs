//! Display formatting shared by the generator and the renderer.
//!
//! Pure functions, no I/O. The generator bakes these strings into the
//! manifest's display-only fields; the renderer uses the same functions for
//! list rows and stats so both halves agree on the output.

use chrono::{DateTime, FixedOffset, Offset, Utc};

const SIZE_UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

/// `dd/mm/yyyy, HH:MM:SS`, pt-BR order, 24-hour clock.
const DISPLAY_DATE_FORMAT: &str = "%d/%m/%Y, %H:%M:%S";

/// Label for records whose modification time is missing or unparseable.
pub const UNKNOWN_DATE_LABEL: &str = "Data desconhecida";

/// Label for records without a file type.
pub const UNKNOWN_TYPE_LABEL: &str = "desconhecido";

/// Human-readable size with base-1024 units and at most two decimals.
///
/// The unit index is `floor(log1024(bytes))`, capped at TB, computed with
/// integer division so exact powers of 1024 land on the larger unit.
///
/// ```
/// use file_index::format::format_file_size;
/// assert_eq!(format_file_size(0), "0 Bytes");
/// assert_eq!(format_file_size(1536), "1.5 KB");
/// assert_eq!(format_file_size(2548), "2.49 KB");
/// ```
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    let mut scaled = bytes;
    while scaled >= 1024 && unit < SIZE_UNITS.len() - 1 {
        scaled /= 1024;
        unit += 1;
    }

    let value = bytes as f64 / 1024f64.powi(unit as i32);
    format!("{} {}", two_decimals(value), SIZE_UNITS[unit])
}

/// Round to two decimals, then drop trailing zeros (`1.50` → `1.5`, `500.00` → `500`).
fn two_decimals(value: f64) -> String {
    let fixed = format!("{value:.2}");
    fixed
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

/// Fixed offset for display timestamps. Out-of-range values fall back to UTC;
/// config validation keeps them in range.
pub fn display_offset(utc_offset_hours: i32) -> FixedOffset {
    FixedOffset::east_opt(utc_offset_hours * 3600).unwrap_or(Utc.fix())
}

/// Localized display string for a timestamp in the given offset.
pub fn format_display_date(when: &DateTime<Utc>, offset: FixedOffset) -> String {
    when.with_timezone(&offset)
        .format(DISPLAY_DATE_FORMAT)
        .to_string()
}

/// Display string for an optional timestamp, with the unknown-date fallback.
pub fn format_optional_date(when: Option<&DateTime<Utc>>, offset: FixedOffset) -> String {
    match when {
        Some(dt) => format_display_date(dt, offset),
        None => UNKNOWN_DATE_LABEL.to_string(),
    }
}

/// Uppercased type badge, or the unknown-type label for an empty type.
pub fn format_file_type(file_type: &str) -> String {
    if file_type.is_empty() {
        UNKNOWN_TYPE_LABEL.to_string()
    } else {
        file_type.to_uppercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    // =========================================================================
    // Size formatting
    // =========================================================================

    #[test]
    fn zero_bytes() {
        assert_eq!(format_file_size(0), "0 Bytes");
    }

    #[test]
    fn small_sizes_stay_in_bytes() {
        assert_eq!(format_file_size(1), "1 Bytes");
        assert_eq!(format_file_size(500), "500 Bytes");
        assert_eq!(format_file_size(1023), "1023 Bytes");
    }

    #[test]
    fn kilobytes_trim_trailing_zeros() {
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(2548), "2.49 KB");
    }

    #[test]
    fn exact_powers_pick_larger_unit() {
        assert_eq!(format_file_size(1024 * 1024), "1 MB");
        assert_eq!(format_file_size(1024 * 1024 * 1024), "1 GB");
        assert_eq!(format_file_size(1024u64.pow(4)), "1 TB");
    }

    #[test]
    fn terabytes_are_the_ceiling() {
        assert_eq!(format_file_size(1024u64.pow(5)), "1024 TB");
    }

    #[test]
    fn megabytes_two_decimals() {
        // 1.75 MB
        assert_eq!(format_file_size(1_835_008), "1.75 MB");
    }

    #[test]
    fn size_is_monotonic_within_a_unit() {
        let parse = |s: String| -> f64 { s.split(' ').next().unwrap().parse().unwrap() };
        let mut last = 0.0;
        for bytes in (1024..1024 * 1024).step_by(4099) {
            let value = parse(format_file_size(bytes));
            assert!(value >= last, "{bytes} bytes went backwards");
            last = value;
        }
    }

    // =========================================================================
    // Date formatting
    // =========================================================================

    #[test]
    fn display_date_uses_offset_and_24h_clock() {
        let when = Utc.with_ymd_and_hms(2024, 6, 1, 15, 4, 5).unwrap();
        assert_eq!(
            format_display_date(&when, display_offset(-3)),
            "01/06/2024, 12:04:05"
        );
    }

    #[test]
    fn display_date_crosses_midnight() {
        let when = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            format_display_date(&when, display_offset(-3)),
            "31/12/2023, 21:00:00"
        );
    }

    #[test]
    fn missing_date_uses_label() {
        assert_eq!(format_optional_date(None, display_offset(0)), UNKNOWN_DATE_LABEL);
    }

    #[test]
    fn out_of_range_offset_falls_back_to_utc() {
        assert_eq!(display_offset(99), Utc.fix());
    }

    // =========================================================================
    // Type labels
    // =========================================================================

    #[test]
    fn file_type_label() {
        assert_eq!(format_file_type("m3u"), "M3U");
        assert_eq!(format_file_type(""), "desconhecido");
    }
}
