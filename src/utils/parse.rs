use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::model::table::Cell;

/// Date layouts tried in order. Day-first wins over month-first for
/// ambiguous slash dates.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%Y/%m/%d",
    "%d.%m.%Y",
    "%d-%b-%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%m/%d/%Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const TIME_FORMATS: &[&str] = &[
    "%H:%M",
    "%H:%M:%S",
    "%H:%M:%S%.f",
    "%I:%M %p",
    "%I:%M:%S %p",
    "%I:%M%p",
    "%I %p",
];

/// Largest serial a spreadsheet stores for a date (9999-12-31).
const MAX_SERIAL_DAY: f64 = 2_958_465.0;

/// Tolerant attendance-date parser. `None` means the row must be dropped.
pub fn parse_date(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::DateTime(dt) => Some(dt.date()),
        Cell::Number(n) => serial_to_date(*n),
        Cell::Text(s) => parse_date_str(s),
        Cell::Empty | Cell::Bool(_) => None,
    }
}

pub fn parse_date_str(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    // Serial numbers exported as text by CSV tools.
    s.parse::<f64>().ok().and_then(serial_to_date)
}

/// Spreadsheet serial day (1900 date system) to calendar date.
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 || serial > MAX_SERIAL_DAY {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.trunc() as i64))
}

/// Clock time of a text value such as `08:30`, `8:30:15` or `07:45 PM`.
pub fn parse_time_str(raw: &str) -> Option<NaiveTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in TIME_FORMATS {
        if let Ok(t) = NaiveTime::parse_from_str(s, fmt) {
            return Some(t);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.time());
        }
    }
    None
}

/// Hour bucket (0-23) of a time value, if it parses.
pub fn parse_hour(raw: &str) -> Option<u32> {
    parse_time_str(raw).map(|t| t.hour())
}

/// Time cell rendered as text; day fractions and date-time cells become
/// `HH:MM`, other text is kept verbatim for later parsing.
pub fn time_text(cell: &Cell) -> Option<String> {
    match cell {
        Cell::DateTime(dt) => Some(dt.format("%H:%M").to_string()),
        Cell::Number(n) if n.is_finite() && (0.0..1.0).contains(n) => {
            let secs = (n * 86_400.0).round() as u32;
            NaiveTime::from_num_seconds_from_midnight_opt(secs.min(86_399), 0)
                .map(|t| t.format("%H:%M").to_string())
        }
        other => plain_text(other),
    }
}

/// Numeric coercion; text may carry thousands separators.
pub fn parse_number(cell: &Cell) -> Option<f64> {
    let n = match cell {
        Cell::Number(n) => *n,
        Cell::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Cell::Text(s) => s.trim().replace(',', "").parse::<f64>().ok()?,
        Cell::Empty | Cell::DateTime(_) => return None,
    };
    n.is_finite().then_some(n)
}

/// Identifier coercion: numbers lose a zero fraction so `30001.0` and
/// `"30001"` compare equal.
pub fn identifier_text(cell: &Cell) -> Option<String> {
    match cell {
        Cell::Number(n) => Some(format_number(*n)),
        Cell::Text(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            match s.split_once('.') {
                Some((whole, frac))
                    if !whole.is_empty()
                        && whole.chars().all(|c| c.is_ascii_digit())
                        && frac.chars().all(|c| c == '0') =>
                {
                    Some(whole.to_string())
                }
                _ => Some(s.to_string()),
            }
        }
        other => plain_text(other),
    }
}

pub fn plain_text(cell: &Cell) -> Option<String> {
    match cell {
        Cell::Empty => None,
        Cell::Text(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Cell::Number(n) => n.is_finite().then(|| format_number(*n)),
        Cell::Bool(b) => Some(b.to_string()),
        Cell::DateTime(dt) => {
            if dt.time() == NaiveTime::MIN {
                Some(dt.format("%Y-%m-%d").to_string())
            } else {
                Some(dt.format("%Y-%m-%d %H:%M:%S").to_string())
            }
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_common_date_layouts() {
        assert_eq!(parse_date_str("2024-01-05"), Some(ymd(2024, 1, 5)));
        assert_eq!(parse_date_str("05/01/2024"), Some(ymd(2024, 1, 5)));
        assert_eq!(parse_date_str("06/30/2024"), Some(ymd(2024, 6, 30)));
        assert_eq!(parse_date_str("05-Jan-2024"), Some(ymd(2024, 1, 5)));
        assert_eq!(parse_date_str("Jan 05, 2024"), Some(ymd(2024, 1, 5)));
        assert_eq!(parse_date_str("2024-01-05 08:30:00"), Some(ymd(2024, 1, 5)));
        assert_eq!(parse_date_str("2024-01-05T08:30:00+05:00"), Some(ymd(2024, 1, 5)));
        assert_eq!(parse_date_str("45296"), Some(ymd(2024, 1, 5)));
    }

    #[test]
    fn rejects_garbage_dates() {
        assert_eq!(parse_date_str("not-a-date"), None);
        assert_eq!(parse_date_str(""), None);
        assert_eq!(parse_date(&Cell::Empty), None);
        assert_eq!(parse_date(&Cell::Number(-3.0)), None);
        assert_eq!(parse_date_str("31/02/2024"), None);
    }

    #[test]
    fn spreadsheet_serials_map_to_dates() {
        assert_eq!(serial_to_date(45296.0), Some(ymd(2024, 1, 5)));
        assert_eq!(serial_to_date(45296.75), Some(ymd(2024, 1, 5)));
        assert_eq!(serial_to_date(1.0e9), None);
    }

    #[test]
    fn parses_clock_times() {
        assert_eq!(parse_hour("08:30"), Some(8));
        assert_eq!(parse_hour("07:45 PM"), Some(19));
        assert_eq!(parse_hour("23:59:59"), Some(23));
        assert_eq!(parse_hour("2024-01-05 18:10:00"), Some(18));
        assert_eq!(parse_hour("late"), None);
        assert_eq!(time_text(&Cell::Number(0.5)), Some("12:00".to_string()));
    }

    #[test]
    fn identifiers_drop_zero_fractions() {
        assert_eq!(identifier_text(&Cell::Number(30001.0)), Some("30001".into()));
        assert_eq!(identifier_text(&Cell::Text(" 30001.0 ".into())), Some("30001".into()));
        assert_eq!(identifier_text(&Cell::Text("00123".into())), Some("00123".into()));
        assert_eq!(identifier_text(&Cell::Text("EMP1".into())), Some("EMP1".into()));
        assert_eq!(identifier_text(&Cell::Text("   ".into())), None);
    }

    #[test]
    fn numbers_accept_separators() {
        assert_eq!(parse_number(&Cell::Text("1,234.5".into())), Some(1234.5));
        assert_eq!(parse_number(&Cell::Text("n/a".into())), None);
        assert_eq!(parse_number(&Cell::Number(f64::NAN)), None);
    }
}
