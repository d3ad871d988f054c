//! Excel serial date conversion
//!
//! Excel stores dates as day counts. The 1900 date system counts from an
//! epoch of 1899-12-31 (serial 1 = 1900-01-01) but also believes 1900 was a
//! leap year, so serial 60 is the nonexistent 1900-02-29 and every later
//! serial is off by one relative to the real calendar. The 1904 system
//! (classic Mac Excel) counts from 1904-01-01 with serial 0 and has no such
//! quirk. The `DATEMODE`/`date1904` workbook flag says which system applies.

use chrono::{Duration, NaiveDate, NaiveDateTime};

/// Convert an Excel serial number to a date/time.
///
/// `date_1904` selects the workbook's date system. Returns `None` for
/// negative serials and values outside chrono's representable range.
/// In the 1900 system the phantom serial 60 maps to 1900-02-28, matching
/// what most readers (including the original Lotus behavior) do.
pub fn from_excel_serial(serial: f64, date_1904: bool) -> Option<NaiveDateTime> {
    // 2958465 is 9999-12-31, the last day Excel can represent
    if !serial.is_finite() || serial < 0.0 || serial >= 2_958_466.0 {
        return None;
    }

    let days = serial.floor();
    let frac = serial - days;
    let secs = (frac * 86_400.0).round() as i64;

    let epoch = if date_1904 {
        NaiveDate::from_ymd_opt(1904, 1, 1)?
    } else if days < 60.0 {
        // Serials 1..=59 predate the phantom leap day
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    } else {
        // From serial 60 on, the off-by-one epoch absorbs the 1900 leap bug
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };

    let date = epoch.checked_add_signed(Duration::days(days as i64))?;
    date.and_hms_opt(0, 0, 0)?
        .checked_add_signed(Duration::seconds(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_1900_system_basics() {
        assert_eq!(from_excel_serial(1.0, false), Some(d(1900, 1, 1)));
        assert_eq!(from_excel_serial(59.0, false), Some(d(1900, 2, 28)));
        // Phantom leap day collapses onto Feb 28
        assert_eq!(from_excel_serial(60.0, false), Some(d(1900, 2, 28)));
        assert_eq!(from_excel_serial(61.0, false), Some(d(1900, 3, 1)));
    }

    #[test]
    fn test_1900_system_modern_date() {
        // 2024-01-15 is serial 45306 in the 1900 system
        assert_eq!(from_excel_serial(45306.0, false), Some(d(2024, 1, 15)));
    }

    #[test]
    fn test_1904_system() {
        assert_eq!(from_excel_serial(0.0, true), Some(d(1904, 1, 1)));
        // Same calendar day is 1462 serials apart between the two systems
        assert_eq!(
            from_excel_serial(45306.0 - 1462.0, true),
            Some(d(2024, 1, 15))
        );
    }

    #[test]
    fn test_time_fraction() {
        // 0.5 = noon
        let dt = from_excel_serial(45306.5, false).unwrap();
        assert_eq!(dt.date(), d(2024, 1, 15).date());
        assert_eq!(dt.time().to_string(), "12:00:00");
    }

    #[test]
    fn test_rejects_nonsense() {
        assert_eq!(from_excel_serial(-1.0, false), None);
        assert_eq!(from_excel_serial(f64::NAN, false), None);
        assert_eq!(from_excel_serial(f64::INFINITY, false), None);
        assert_eq!(from_excel_serial(3_000_000.0, false), None);
    }
}
