use chrono::{NaiveDate, TimeDelta, NaiveDateTime, NaiveTime, Timelike};
use std::fmt::{self, Display};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/* ───────────────────── Spreadsheet date-serial utilities ─────────────
Spreadsheet serial date system (1900 flavour):
  Serial 1  = 1900-01-01
  Serial 59 = 1900-02-28
  Serial 60 = 1900-02-29  (phantom – doesn't exist, but Excel thinks it does)
  Serial 61 = 1900-03-01
Base date = 1899-12-31 so that serial 1 = base + 1 day = 1900-01-01.
The 1904 flavour has no phantom day: serial 0 = 1904-01-01.
Time is stored as fractional days (no timezone).
------------------------------------------------------------------- */

/// Base date for the 1900 date system. Serial 1 = base + 1 day = 1900-01-01.
const EPOCH_1900: NaiveDate = match NaiveDate::from_ymd_opt(1899, 12, 31) {
    Some(d) => d,
    None => panic!("invalid 1900 epoch"),
};

/// Base date for the 1904 date system. Serial 0 = 1904-01-01.
const EPOCH_1904: NaiveDate = match NaiveDate::from_ymd_opt(1904, 1, 1) {
    Some(d) => d,
    None => panic!("invalid 1904 epoch"),
};

const PHANTOM_CUTOFF: NaiveDate = match NaiveDate::from_ymd_opt(1900, 3, 1) {
    Some(d) => d,
    None => panic!("invalid phantom cutoff"),
};

pub fn datetime_to_serial(dt: &NaiveDateTime) -> f64 {
    let days = (dt.date() - EPOCH_1900).num_days();
    // Dates on or after 1900-03-01 get +1 to account for phantom Feb 29
    let serial_days = if dt.date() >= PHANTOM_CUTOFF {
        days + 1
    } else {
        days
    };

    let secs_in_day = dt.time().num_seconds_from_midnight() as f64;
    serial_days as f64 + secs_in_day / 86_400.0
}

/// Calendar date-time of a 1900-system serial, or `None` when the serial is
/// not finite or falls outside the representable date range.
pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    let days = whole_days(serial)?;

    // Serial 60 is phantom 1900-02-29; map to 1900-02-28
    let offset = match days {
        60 => 59,
        d if d < 60 => d,
        d => d - 1,
    };
    let date = EPOCH_1900.checked_add_signed(TimeDelta::try_days(offset)?)?;
    Some(date.and_time(fraction_to_time(serial)))
}

fn whole_days(serial: f64) -> Option<i64> {
    let days = serial.trunc();
    if !days.is_finite() || days.abs() >= i64::MAX as f64 {
        return None;
    }
    Some(days as i64)
}

fn fraction_to_time(serial: f64) -> NaiveTime {
    let frac_secs = (serial.fract() * 86_400.0).round() as i64;
    let secs = frac_secs.rem_euclid(86_400) as u32;
    NaiveTime::from_num_seconds_from_midnight_opt(secs, 0).unwrap_or(NaiveTime::MIN)
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DateSystem {
    #[default]
    Excel1900,
    Excel1904,
}

impl DateSystem {
    /// Convert a serial number in this date system into a calendar date-time.
    /// `None` when the serial is out of range.
    pub fn serial_to_datetime(self, serial: f64) -> Option<NaiveDateTime> {
        match self {
            DateSystem::Excel1900 => serial_to_datetime(serial),
            DateSystem::Excel1904 => {
                let offset = TimeDelta::try_days(whole_days(serial)?)?;
                let date = EPOCH_1904.checked_add_signed(offset)?;
                Some(date.and_time(fraction_to_time(serial)))
            }
        }
    }
}

impl Display for DateSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateSystem::Excel1900 => write!(f, "1900"),
            DateSystem::Excel1904 => write!(f, "1904"),
        }
    }
}

/// A raw, loosely-typed cell scalar as handed over by the sheet decoder.
///
/// Weaker than any schema type: the same cell may feed a
/// `string` field in one table and an `int` field in another.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", content = "value"))]
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    Int(i64),
    Number(f64),
    Text(String),
    Boolean(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
    #[default]
    Empty,
}

impl Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Int(i) => write!(f, "{i}"),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{n}")
                }
            }
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Boolean(b) => write!(f, "{b}"),
            CellValue::Date(d) => write!(f, "{d}"),
            CellValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            CellValue::Time(t) => write!(f, "{t}"),
            CellValue::Empty => Ok(()),
        }
    }
}

impl CellValue {
    /// True for empty cells and whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Text form of the cell, used wherever a value is consumed as a string.
    pub fn to_text(&self) -> String {
        self.to_string()
    }

    pub fn as_serial_number(&self) -> Option<f64> {
        match self {
            CellValue::Date(d) => Some(datetime_to_serial(&d.and_time(NaiveTime::MIN))),
            CellValue::DateTime(dt) => Some(datetime_to_serial(dt)),
            CellValue::Time(t) => Some(t.num_seconds_from_midnight() as f64 / 86_400.0),
            CellValue::Int(i) => Some(*i as f64),
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// A short name for the cell's runtime kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            CellValue::Int(_) => "int",
            CellValue::Number(_) => "number",
            CellValue::Text(_) => "text",
            CellValue::Boolean(_) => "boolean",
            CellValue::Date(_) => "date",
            CellValue::DateTime(_) => "datetime",
            CellValue::Time(_) => "time",
            CellValue::Empty => "empty",
        }
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        CellValue::Int(value as i64)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Boolean(value)
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        if value.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value)
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::from(value.to_string())
    }
}

impl From<NaiveDate> for CellValue {
    fn from(value: NaiveDate) -> Self {
        CellValue::Date(value)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(value: NaiveDateTime) -> Self {
        CellValue::DateTime(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_roundtrip_skips_phantom_day() {
        let d = NaiveDate::from_ymd_opt(1900, 3, 1).unwrap();
        let serial = datetime_to_serial(&d.and_time(NaiveTime::MIN));
        assert_eq!(serial, 61.0);
        assert_eq!(serial_to_datetime(61.0).unwrap().date(), d);
        assert_eq!(
            serial_to_datetime(60.0).unwrap().date(),
            NaiveDate::from_ymd_opt(1900, 2, 28).unwrap()
        );
    }

    #[test]
    fn serial_keeps_time_of_day() {
        let dt = serial_to_datetime(45_000.5).unwrap();
        assert_eq!(dt.time(), NaiveTime::from_hms_opt(12, 0, 0).unwrap());
    }

    #[test]
    fn date_system_1904_starts_at_zero() {
        let dt = DateSystem::Excel1904.serial_to_datetime(1.0).unwrap();
        assert_eq!(dt.date(), NaiveDate::from_ymd_opt(1904, 1, 2).unwrap());
    }

    #[test]
    fn out_of_range_serials_have_no_date() {
        assert_eq!(serial_to_datetime(999_999_999.0), None);
        assert_eq!(serial_to_datetime(1e300), None);
        assert_eq!(serial_to_datetime(f64::NAN), None);
        assert_eq!(DateSystem::Excel1904.serial_to_datetime(-1e300), None);
    }

    #[test]
    fn integral_numbers_render_without_fraction() {
        assert_eq!(CellValue::Number(3.0).to_string(), "3");
        assert_eq!(CellValue::Number(2.5).to_string(), "2.5");
        assert_eq!(CellValue::Empty.to_string(), "");
    }

    #[test]
    fn blank_detection() {
        assert!(CellValue::Empty.is_blank());
        assert!(CellValue::Text("  ".into()).is_blank());
        assert!(!CellValue::Int(0).is_blank());
        assert_eq!(CellValue::from(""), CellValue::Empty);
    }
}
