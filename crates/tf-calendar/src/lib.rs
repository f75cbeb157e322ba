#![forbid(unsafe_code)]

mod daycount;
mod host;
mod serial;

use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tf_runtime::{BoundaryError, ErrorKind};
use tf_types::HostValueError;
use thiserror::Error;

pub use daycount::{
    DayCountConvention, FebruaryAdjustment, diff_days, diff_days_by, diff_days_with, year_frac,
    year_frac_with_extra,
};
pub use host::{
    DATE_CLASS, HostDates, HostDatetimes, decode_host_dates, decode_host_datetimes,
    encode_host_dates, encode_host_datetimes, has_date_class, has_datetime_class,
};
pub use serial::{DAYS_TO_SECONDS, Datetime, HOST_EPOCH_JDN, SerialType};

/// JDN of 0001-01-01 minus one; bridges to chrono's day-of-common-era count.
const CE_OFFSET: i32 = 1_721_425;

const DAYS_IN_MONTH: [[i32; 13]; 2] = [
    [0, 31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31],
    [0, 31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31],
];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalendarError {
    #[error("invalid date: month {month}, day {day}, year {year}")]
    InvalidDate { month: i32, day: i32, year: i32 },
    #[error("invalid month {0}: expected 1..=12")]
    InvalidMonth(i32),
    #[error("julian day number out of range")]
    JdnOutOfRange,
    #[error("host date serial {0} is not a finite number")]
    NonFiniteSerial(f64),
    #[error("invalid date range: {start} is not before {end}")]
    InvalidRange {
        start: CalendarDate,
        end: CalendarDate,
    },
    #[error("unknown day count convention `{0}`")]
    UnknownConvention(String),
    #[error("expected host class `{0}`")]
    MissingClass(&'static str),
    #[error(transparent)]
    Host(#[from] HostValueError),
}

impl BoundaryError for CalendarError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidDate { .. }
            | Self::InvalidMonth(_)
            | Self::JdnOutOfRange
            | Self::NonFiniteSerial(_) => ErrorKind::InvalidDate,
            Self::InvalidRange { .. } => ErrorKind::InvalidRange,
            Self::UnknownConvention(_) => ErrorKind::InvalidLabel,
            Self::MissingClass(_) | Self::Host(_) => ErrorKind::InvalidFormat,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weekday {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Weekday {
    const ALL: [Self; 7] = [
        Self::Sunday,
        Self::Monday,
        Self::Tuesday,
        Self::Wednesday,
        Self::Thursday,
        Self::Friday,
        Self::Saturday,
    ];

    /// Sunday-based index, `0..=6`.
    #[must_use]
    pub const fn index(self) -> i32 {
        self as i32
    }

    #[must_use]
    pub fn from_index(index: i32) -> Self {
        Self::ALL[index.rem_euclid(7) as usize]
    }

    #[must_use]
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::Sunday => "Sun",
            Self::Monday => "Mon",
            Self::Tuesday => "Tue",
            Self::Wednesday => "Wed",
            Self::Thursday => "Thu",
            Self::Friday => "Fri",
            Self::Saturday => "Sat",
        }
    }

    #[must_use]
    pub const fn is_weekend(self) -> bool {
        matches!(self, Self::Saturday | Self::Sunday)
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Month {
    January = 1,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl Month {
    const ALL: [Self; 12] = [
        Self::January,
        Self::February,
        Self::March,
        Self::April,
        Self::May,
        Self::June,
        Self::July,
        Self::August,
        Self::September,
        Self::October,
        Self::November,
        Self::December,
    ];

    pub fn from_number(month: i32) -> Result<Self, CalendarError> {
        if (1..=12).contains(&month) {
            Ok(Self::ALL[(month - 1) as usize])
        } else {
            Err(CalendarError::InvalidMonth(month))
        }
    }

    #[must_use]
    pub const fn number(self) -> i32 {
        self as i32
    }

    #[must_use]
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::January => "Jan",
            Self::February => "Feb",
            Self::March => "Mar",
            Self::April => "Apr",
            Self::May => "May",
            Self::June => "Jun",
            Self::July => "Jul",
            Self::August => "Aug",
            Self::September => "Sep",
            Self::October => "Oct",
            Self::November => "Nov",
            Self::December => "Dec",
        }
    }

    #[must_use]
    pub fn days(self, year: i32) -> i32 {
        DAYS_IN_MONTH[usize::from(is_leap_year(year))][self.number() as usize]
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Gregorian leap-year rule.
#[must_use]
pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub fn days_in_month(month: i32, year: i32) -> Result<i32, CalendarError> {
    Month::from_number(month).map(|m| m.days(year))
}

/// Proleptic Gregorian month/day/year to Julian Day Number.
///
/// No per-month day validation happens here: Feb 31 lands on the JDN of
/// March 2 or 3.
fn ymd_to_jdn(month: i32, day: i32, year: i32) -> Result<i32, CalendarError> {
    let (m, d, y) = (i64::from(month), i64::from(day), i64::from(year));
    let a = (14 - m) / 12;
    let y = y + 4800 - a;
    let m = m + 12 * a - 3;
    let jdn = d + (153 * m + 2) / 5 + 365 * y + y / 4 - y / 100 + y / 400 - 32045;
    i32::try_from(jdn).map_err(|_| CalendarError::JdnOutOfRange)
}

/// Inverse of [`ymd_to_jdn`], exact for years back to -4799.
#[must_use]
pub fn jdn_to_ymd(jdn: i32) -> (i32, i32, i32) {
    let jul = i64::from(jdn) + 32044;
    let g = jul / 146_097;
    let dg = jul % 146_097;
    let c = (dg / 36524 + 1) * 3 / 4;
    let dc = dg - c * 36524;
    let b = dc / 1461;
    let db = dc % 1461;
    let a = (db / 365 + 1) * 3 / 4;
    let da = db - a * 365;
    let y = g * 400 + c * 100 + b * 4 + a;
    let m = (da * 5 + 308) / 153 - 2;
    let d = da - (m + 4) * 153 / 5 + 122;
    let year = y - 4800 + (m + 2) / 12;
    let month = (m + 2) % 12 + 1;
    let day = d + 1;
    (month as i32, day as i32, year as i32)
}

/// A calendar day identified by its Julian Day Number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalendarDate {
    jdn: i32,
}

impl CalendarDate {
    /// Fails when `month` is outside `1..=12` or `day` outside `1..=31`.
    pub fn from_ymd(month: i32, day: i32, year: i32) -> Result<Self, CalendarError> {
        if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
            return Err(CalendarError::InvalidDate { month, day, year });
        }
        ymd_to_jdn(month, day, year).map(Self::from_jdn)
    }

    #[must_use]
    pub const fn from_jdn(jdn: i32) -> Self {
        Self { jdn }
    }

    /// Days since 1970-01-01, the host's native date serial.
    pub fn from_host_serial(days: i32) -> Result<Self, CalendarError> {
        Self::from_serial(days, SerialType::Host)
    }

    pub fn from_serial(serial: i32, kind: SerialType) -> Result<Self, CalendarError> {
        serial
            .checked_add(kind.offset())
            .map(Self::from_jdn)
            .ok_or(CalendarError::JdnOutOfRange)
    }

    #[must_use]
    pub const fn jdn(self) -> i32 {
        self.jdn
    }

    #[must_use]
    pub const fn host_serial(self) -> i32 {
        self.jdn - HOST_EPOCH_JDN
    }

    #[must_use]
    pub fn serial_number(self, kind: SerialType) -> f64 {
        f64::from(self.jdn) - f64::from(kind.offset())
    }

    #[must_use]
    pub fn ymd(self) -> (i32, i32, i32) {
        jdn_to_ymd(self.jdn)
    }

    #[must_use]
    pub fn month(self) -> i32 {
        self.ymd().0
    }

    #[must_use]
    pub fn day(self) -> i32 {
        self.ymd().1
    }

    #[must_use]
    pub fn year(self) -> i32 {
        self.ymd().2
    }

    #[must_use]
    pub fn month_of_year(self) -> Month {
        Month::ALL[(self.month() - 1).rem_euclid(12) as usize]
    }

    #[must_use]
    pub fn month_name(self) -> &'static str {
        self.month_of_year().short_name()
    }

    #[must_use]
    pub fn weekday(self) -> Weekday {
        Weekday::from_index((i64::from(self.jdn) + 1).rem_euclid(7) as i32)
    }

    #[must_use]
    pub fn weekday_name(self) -> &'static str {
        self.weekday().short_name()
    }

    #[must_use]
    pub fn is_leap_year(self) -> bool {
        is_leap_year(self.year())
    }

    #[must_use]
    pub fn days_in_month(self) -> i32 {
        self.month_of_year().days(self.year())
    }

    #[must_use]
    pub fn is_month_end(self) -> bool {
        self.day() == self.days_in_month()
    }

    /// Next `target` strictly after this date.
    #[must_use]
    pub fn next_weekday(self, target: Weekday) -> Self {
        let offset = (target.index() - self.weekday().index() + 7) % 7;
        self + if offset == 0 { 7 } else { offset }
    }

    /// The `n`-th `target` in this date's month, counting the 1st when it
    /// matches. `n == 0` is treated as `1`.
    #[must_use]
    pub fn nth_weekday(self, n: u32, target: Weekday) -> Self {
        let first = self.first_of_month();
        let first_match = if first.weekday() == target {
            first
        } else {
            first.next_weekday(target)
        };
        let weeks = i32::try_from(n.max(1) - 1).unwrap_or(i32::MAX / 7);
        first_match + weeks.saturating_mul(7)
    }

    pub fn nth_weekday_of_month(
        n: u32,
        target: Weekday,
        month: i32,
        year: i32,
    ) -> Result<Self, CalendarError> {
        Self::from_ymd(month, 1, year).map(|first| first.nth_weekday(n, target))
    }

    #[must_use]
    pub fn first_of_month(self) -> Self {
        self - (self.day() - 1)
    }

    #[must_use]
    pub fn is_bus_day(self) -> bool {
        !self.weekday().is_weekend()
    }

    #[must_use]
    pub fn next_bus_day(self) -> Self {
        let mut next = self + 1;
        while !next.is_bus_day() {
            next += 1;
        }
        next
    }

    #[must_use]
    pub fn prev_bus_day(self) -> Self {
        let mut prev = self - 1;
        while !prev.is_bus_day() {
            prev -= 1;
        }
        prev
    }

    /// Next business day, or the previous one when the next would leave the
    /// month.
    #[must_use]
    pub fn mod_next_bus_day(self) -> Self {
        let next = self.next_bus_day();
        if next.month() == self.month() {
            next
        } else {
            self.prev_bus_day()
        }
    }

    /// Shift by `n` months keeping the day number when the target month has
    /// it, clamping to the month end otherwise. With `adjust_eom`, a month-end
    /// start always lands on the target month end.
    pub fn add_months(self, n: i32, adjust_eom: bool) -> Result<Self, CalendarError> {
        if n == 0 {
            return Ok(self);
        }
        let (m1, d1, y1) = self.ymd();
        let force_eom = adjust_eom && self.is_month_end();

        let shifted = m1 - 1 + n;
        let (m2, y2) = if shifted >= 0 {
            (1 + shifted % 12, y1 + shifted / 12)
        } else {
            let back = 12 - m1 - n;
            (12 - back % 12, y1 - back / 12)
        };

        let month_len = days_in_month(m2, y2)?;
        let d2 = if force_eom { month_len } else { d1.min(month_len) };
        Self::from_ymd(m2, d2, y2)
    }

    /// Saturday following the third Friday of this date's month.
    #[must_use]
    pub fn spx_expiry(self) -> Self {
        self.nth_weekday(3, Weekday::Friday) + 1
    }

    /// Two business days before the third Wednesday of this date's month.
    #[must_use]
    pub fn imm_date(self) -> Self {
        self.nth_weekday(3, Weekday::Wednesday)
            .prev_bus_day()
            .prev_bus_day()
    }

    #[must_use]
    pub fn to_naive_date(self) -> Option<NaiveDate> {
        NaiveDate::from_num_days_from_ce_opt(self.jdn.checked_sub(CE_OFFSET)?)
    }
}

impl Default for CalendarDate {
    fn default() -> Self {
        Self::from_jdn(HOST_EPOCH_JDN)
    }
}

impl From<NaiveDate> for CalendarDate {
    fn from(date: NaiveDate) -> Self {
        Self::from_jdn(date.num_days_from_ce() + CE_OFFSET)
    }
}

impl Add<i32> for CalendarDate {
    type Output = Self;

    fn add(self, days: i32) -> Self {
        Self::from_jdn(self.jdn.saturating_add(days))
    }
}

impl Sub<i32> for CalendarDate {
    type Output = Self;

    fn sub(self, days: i32) -> Self {
        Self::from_jdn(self.jdn.saturating_sub(days))
    }
}

impl Sub for CalendarDate {
    type Output = i32;

    fn sub(self, other: Self) -> i32 {
        self.jdn.saturating_sub(other.jdn)
    }
}

impl AddAssign<i32> for CalendarDate {
    fn add_assign(&mut self, days: i32) {
        *self = *self + days;
    }
}

impl SubAssign<i32> for CalendarDate {
    fn sub_assign(&mut self, days: i32) {
        *self = *self - days;
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (month, day, year) = self.ymd();
        write!(f, "{} {month}/{day}/{year}", self.weekday_name())
    }
}
