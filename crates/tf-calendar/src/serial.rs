use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Sub};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CalendarDate, CalendarError};

/// JDN of 1970-01-01, serial zero for host dates.
pub const HOST_EPOCH_JDN: i32 = 2_440_588;
pub const DAYS_TO_SECONDS: i32 = 86_400;

const EXCEL_1900_JDN: i32 = 2_415_019;
const EXCEL_1904_JDN: i32 = 2_416_481;
const ISDA_CDS_JDN: i32 = 2_305_814;

/// Serial numbering schemes, each a fixed offset from the Julian Day Number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SerialType {
    Host,
    Excel1900,
    Excel1904,
    QuantLib,
    IsdaCds,
    Julian,
}

impl SerialType {
    /// JDN whose serial number is zero.
    #[must_use]
    pub const fn offset(self) -> i32 {
        match self {
            Self::Host => HOST_EPOCH_JDN,
            Self::Excel1900 | Self::QuantLib => EXCEL_1900_JDN,
            Self::Excel1904 => EXCEL_1904_JDN,
            Self::IsdaCds => ISDA_CDS_JDN,
            Self::Julian => 0,
        }
    }

    const fn truncates_datetimes(self) -> bool {
        matches!(self, Self::QuantLib | Self::IsdaCds | Self::Julian)
    }
}

/// Fractional seconds since 1970-01-01 00:00:00 UTC.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Datetime {
    seconds: f64,
}

impl Datetime {
    #[must_use]
    pub const fn from_host_seconds(seconds: f64) -> Self {
        Self { seconds }
    }

    /// `day_fraction` is the elapsed share of the day, `0.25` for 06:00.
    pub fn from_ymd(
        month: i32,
        day: i32,
        year: i32,
        day_fraction: f64,
    ) -> Result<Self, CalendarError> {
        let date = CalendarDate::from_ymd(month, day, year)?;
        Ok(Self::from_date(date) + day_fraction * f64::from(DAYS_TO_SECONDS))
    }

    /// Midnight at the start of `date`.
    #[must_use]
    pub fn from_date(date: CalendarDate) -> Self {
        Self::from_host_seconds(f64::from(date.host_serial()) * f64::from(DAYS_TO_SECONDS))
    }

    #[must_use]
    pub const fn seconds(self) -> f64 {
        self.seconds
    }

    /// The calendar day containing this instant.
    pub fn date(self) -> Result<CalendarDate, CalendarError> {
        let days = (self.seconds / f64::from(DAYS_TO_SECONDS)).floor();
        if !days.is_finite() || days.abs() > f64::from(i32::MAX) {
            return Err(CalendarError::NonFiniteSerial(self.seconds));
        }
        CalendarDate::from_host_serial(days as i32)
    }

    #[must_use]
    pub fn serial_number(self, kind: SerialType) -> f64 {
        if kind == SerialType::Host {
            return self.seconds;
        }
        let value = self.seconds / f64::from(DAYS_TO_SECONDS) + f64::from(HOST_EPOCH_JDN)
            - f64::from(kind.offset());
        if kind.truncates_datetimes() {
            value.trunc()
        } else {
            value
        }
    }

    #[must_use]
    pub fn to_chrono(self) -> Option<DateTime<Utc>> {
        if !self.seconds.is_finite() {
            return None;
        }
        let whole = self.seconds.floor();
        let nanos = ((self.seconds - whole) * 1e9).round().min(999_999_999.0) as u32;
        DateTime::from_timestamp(whole as i64, nanos)
    }
}

impl From<DateTime<Utc>> for Datetime {
    fn from(value: DateTime<Utc>) -> Self {
        let seconds =
            value.timestamp() as f64 + f64::from(value.timestamp_subsec_nanos()) / 1e9;
        Self::from_host_seconds(seconds)
    }
}

impl PartialEq for Datetime {
    fn eq(&self, other: &Self) -> bool {
        self.seconds.total_cmp(&other.seconds) == Ordering::Equal
    }
}

impl Eq for Datetime {}

impl PartialOrd for Datetime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Datetime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.seconds.total_cmp(&other.seconds)
    }
}

impl Add<f64> for Datetime {
    type Output = Self;

    fn add(self, seconds: f64) -> Self {
        Self::from_host_seconds(self.seconds + seconds)
    }
}

impl Sub<f64> for Datetime {
    type Output = Self;

    fn sub(self, seconds: f64) -> Self {
        Self::from_host_seconds(self.seconds - seconds)
    }
}

impl Sub for Datetime {
    type Output = f64;

    fn sub(self, other: Self) -> f64 {
        self.seconds - other.seconds
    }
}

impl fmt::Display for Datetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_chrono() {
            Some(instant) => write!(f, "{}", instant.format("%Y-%m-%d %H:%M:%S%.f UTC")),
            None => write!(f, "{}", self.seconds),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Datetime, SerialType};
    use crate::CalendarDate;

    #[test]
    fn datetime_from_day_fraction() {
        let dt = Datetime::from_ymd(4, 15, 2010, 0.25).expect("valid date");
        assert_eq!(dt.seconds(), 14_714.0 * 86_400.0 + 21_600.0);
        assert_eq!(dt.to_string(), "2010-04-15 06:00:00 UTC");
        assert_eq!(
            dt.date().expect("in range"),
            CalendarDate::from_ymd(4, 15, 2010).expect("valid")
        );
    }

    #[test]
    fn pre_epoch_instants_floor_to_the_earlier_day() {
        let dt = Datetime::from_host_seconds(-1.0);
        assert_eq!(
            dt.date().expect("in range"),
            CalendarDate::from_ymd(12, 31, 1969).expect("valid")
        );
        assert_eq!(dt.to_string(), "1969-12-31 23:59:59 UTC");
    }

    #[test]
    fn datetime_serial_numbers() {
        let dt = Datetime::from_host_seconds(43_200.0);
        assert_eq!(dt.serial_number(SerialType::Host), 43_200.0);
        assert_eq!(dt.serial_number(SerialType::Excel1900), 25_569.5);
        assert_eq!(dt.serial_number(SerialType::QuantLib), 25_569.0);
        assert_eq!(dt.serial_number(SerialType::Julian), 2_440_588.0);
        assert_eq!(dt.serial_number(SerialType::IsdaCds), 134_774.0);
    }

    #[test]
    fn datetimes_order_totally() {
        let early = Datetime::from_host_seconds(10.0);
        let late = early + 5.0;
        assert!(early < late);
        assert_eq!(late - early, 5.0);
        assert_eq!(late - 5.0, early);
        let chrono = late.to_chrono().expect("representable");
        assert_eq!(Datetime::from(chrono), late);
    }
}
