use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{CalendarDate, CalendarError, is_leap_year};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayCountConvention {
    ActAct,
    Act360,
    Act365,
    Act252,
    Thirty360Isda,
    Thirty360Euro,
    Thirty360Psa1,
    Thirty360Psa2,
    Act360NoLeap,
    Act365NoLeap,
}

impl DayCountConvention {
    pub const ALL: [Self; 10] = [
        Self::ActAct,
        Self::Act360,
        Self::Act365,
        Self::Act252,
        Self::Thirty360Isda,
        Self::Thirty360Euro,
        Self::Thirty360Psa1,
        Self::Thirty360Psa2,
        Self::Act360NoLeap,
        Self::Act365NoLeap,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ActAct => "ACT/ACT",
            Self::Act360 => "ACT/360",
            Self::Act365 => "ACT/365",
            Self::Act252 => "ACT/252",
            Self::Thirty360Isda => "30/360 ISDA",
            Self::Thirty360Euro => "30/360 Euro",
            Self::Thirty360Psa1 => "30/360 PSA1",
            Self::Thirty360Psa2 => "30/360 PSA2",
            Self::Act360NoLeap => "ACT/360 No Leap",
            Self::Act365NoLeap => "ACT/365 No Leap",
        }
    }

    /// Year-fraction denominator; ACT/ACT splits by calendar year instead.
    #[must_use]
    pub const fn divisor(self) -> f64 {
        match self {
            Self::ActAct => 1.0,
            Self::Act365 | Self::Act365NoLeap => 365.0,
            Self::Act252 => 252.0,
            Self::Act360
            | Self::Thirty360Isda
            | Self::Thirty360Euro
            | Self::Thirty360Psa1
            | Self::Thirty360Psa2
            | Self::Act360NoLeap => 360.0,
        }
    }

    #[must_use]
    pub const fn counts_actual_days(self) -> bool {
        matches!(
            self,
            Self::ActAct | Self::Act360 | Self::Act365 | Self::Act252
        )
    }
}

impl fmt::Display for DayCountConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DayCountConvention {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|convention| convention.name() == s)
            .ok_or_else(|| CalendarError::UnknownConvention(s.to_owned()))
    }
}

/// Whether the PSA conventions treat the last day of February as day 30.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FebruaryAdjustment {
    #[default]
    Enabled,
    Disabled,
}

/// Actual days from `d1` to `d2`.
#[must_use]
pub fn diff_days(d1: CalendarDate, d2: CalendarDate) -> i32 {
    d2 - d1
}

#[must_use]
pub fn diff_days_by(d1: CalendarDate, d2: CalendarDate, convention: DayCountConvention) -> i32 {
    diff_days_with(d1, d2, convention, FebruaryAdjustment::default())
}

/// Day count from `d1` to `d2` under `convention`. The result carries the
/// sign of `d2 - d1`; 30/360 rules are applied to the chronologically
/// ordered pair.
#[must_use]
pub fn diff_days_with(
    d1: CalendarDate,
    d2: CalendarDate,
    convention: DayCountConvention,
    february: FebruaryAdjustment,
) -> i32 {
    let actual = d2 - d1;
    if actual == 0 || convention.counts_actual_days() {
        return actual;
    }

    let (early, late) = if actual > 0 { (d1, d2) } else { (d2, d1) };
    let (m1, mut day1, y1) = early.ymd();
    let (m2, mut day2, y2) = late.ymd();
    let adjust_february = february == FebruaryAdjustment::Enabled;

    match convention {
        DayCountConvention::Act360NoLeap | DayCountConvention::Act365NoLeap => {
            let leap_year = if is_leap_year(y1) {
                y1
            } else if is_leap_year(y2) {
                y2
            } else {
                return actual;
            };
            let Ok(leap_day) = CalendarDate::from_ymd(2, 29, leap_year) else {
                return actual;
            };
            if d1 <= leap_day && d2 >= leap_day {
                return actual - 1;
            }
            if d1 >= leap_day && d2 <= leap_day {
                return actual + 1;
            }
            return actual;
        }
        DayCountConvention::Thirty360Isda => {
            if day1 == 31 {
                day1 = 30;
            }
            if day1 == 30 && day2 == 31 {
                day2 = 30;
            }
        }
        DayCountConvention::Thirty360Euro => {
            if day1 == 31 {
                day1 = 30;
            }
            if day2 == 31 {
                day2 = 30;
            }
        }
        DayCountConvention::Thirty360Psa1 => {
            if m1 == 2 && adjust_february {
                if is_february_end(day1, y1) {
                    day1 = 30;
                }
            } else if day1 > 30 {
                day1 = 30;
            }
            if day1 == 30 && day2 == 31 {
                day2 = 30;
            }
        }
        DayCountConvention::Thirty360Psa2 => {
            if m1 == 2 {
                if is_february_end(day1, y1) {
                    day1 = 30;
                }
            } else if day1 == 31 {
                day1 = 30;
            }
            if m2 == 2 && adjust_february {
                if is_february_end(day2, y2) {
                    day2 = 30;
                }
            } else if day2 == 31 {
                day2 = 30;
            }
        }
        DayCountConvention::ActAct
        | DayCountConvention::Act360
        | DayCountConvention::Act365
        | DayCountConvention::Act252 => return actual,
    }

    let count = (y2 - y1) * 360 + (m2 - m1) * 30 + day2 - day1;
    if actual > 0 { count } else { -count }
}

// Day 28 counts as February's end even in leap years.
fn is_february_end(day: i32, year: i32) -> bool {
    (is_leap_year(year) && day == 29) || day == 28
}

pub fn year_frac(
    d1: CalendarDate,
    d2: CalendarDate,
    convention: DayCountConvention,
) -> Result<f64, CalendarError> {
    year_frac_with_extra(d1, d2, convention, 0)
}

/// Year fraction with `extra_days` added to the numerator, for accrual
/// periods that include both endpoints. Ignored under ACT/ACT.
pub fn year_frac_with_extra(
    d1: CalendarDate,
    d2: CalendarDate,
    convention: DayCountConvention,
    extra_days: i32,
) -> Result<f64, CalendarError> {
    if d1 >= d2 {
        return Err(CalendarError::InvalidRange { start: d1, end: d2 });
    }
    if convention != DayCountConvention::ActAct {
        let diff = diff_days_by(d1, d2, convention);
        return Ok(f64::from(diff.saturating_add(extra_days)) / convention.divisor());
    }

    if d1.year() == d2.year() {
        return Ok(f64::from(d2 - d1) / year_length(d1));
    }

    let mut eoy1 = CalendarDate::from_ymd(12, 31, d1.year())?;
    let mut eoy2 = CalendarDate::from_ymd(12, 31, d1.year() + 1)?;
    let mut frac = f64::from(eoy1 - d1) / year_length(d1);
    while d2 > eoy2 {
        frac += f64::from(eoy2 - eoy1) / year_length(eoy2);
        eoy1 = eoy2;
        eoy2 = CalendarDate::from_ymd(12, 31, eoy1.year() + 1)?;
    }
    frac += f64::from(d2 - eoy1) / year_length(d2);
    Ok(frac)
}

fn year_length(date: CalendarDate) -> f64 {
    if date.is_leap_year() { 366.0 } else { 365.0 }
}

#[cfg(test)]
mod tests {
    use super::{
        DayCountConvention, FebruaryAdjustment, diff_days, diff_days_by, diff_days_with,
        year_frac, year_frac_with_extra,
    };
    use crate::CalendarDate;
    use tf_runtime::{BoundaryError, ErrorKind};

    fn date(month: i32, day: i32, year: i32) -> CalendarDate {
        CalendarDate::from_ymd(month, day, year).expect("valid date")
    }

    #[test]
    fn thirty_360_isda() {
        let convention = DayCountConvention::Thirty360Isda;
        assert_eq!(diff_days_by(date(2, 1, 2021), date(3, 31, 2021), convention), 60);
        assert_eq!(diff_days_by(date(3, 31, 2021), date(2, 1, 2021), convention), -60);
        assert_eq!(diff_days_by(date(1, 31, 2021), date(3, 31, 2021), convention), 60);
        assert_eq!(diff_days_by(date(1, 29, 2021), date(3, 31, 2021), convention), 62);
    }

    #[test]
    fn thirty_360_euro_clamps_both_ends() {
        let convention = DayCountConvention::Thirty360Euro;
        assert_eq!(diff_days_by(date(1, 29, 2021), date(3, 31, 2021), convention), 61);
        assert_eq!(diff_days_by(date(1, 31, 2021), date(3, 31, 2021), convention), 60);
    }

    #[test]
    fn psa1_february_adjustment() {
        let convention = DayCountConvention::Thirty360Psa1;
        let (start, end) = (date(2, 28, 2021), date(3, 31, 2021));
        assert_eq!(diff_days_by(start, end, convention), 30);
        assert_eq!(
            diff_days_with(start, end, convention, FebruaryAdjustment::Disabled),
            33
        );
        // Day 28 is treated as the end of February in leap years too.
        assert_eq!(diff_days_by(date(2, 28, 2020), date(3, 31, 2020), convention), 30);
    }

    #[test]
    fn psa2_adjusts_end_of_february_only_when_enabled() {
        let convention = DayCountConvention::Thirty360Psa2;
        let (start, end) = (date(1, 31, 2021), date(2, 28, 2021));
        assert_eq!(diff_days_by(start, end, convention), 30);
        assert_eq!(
            diff_days_with(start, end, convention, FebruaryAdjustment::Disabled),
            28
        );
    }

    #[test]
    fn no_leap_conventions_skip_february_29() {
        let convention = DayCountConvention::Act365NoLeap;
        assert_eq!(diff_days(date(2, 1, 2020), date(3, 1, 2020)), 29);
        assert_eq!(diff_days_by(date(2, 1, 2020), date(3, 1, 2020), convention), 28);
        assert_eq!(diff_days_by(date(3, 1, 2020), date(2, 1, 2020), convention), -28);
        assert_eq!(
            diff_days_by(date(12, 1, 2019), date(3, 1, 2020), DayCountConvention::Act360NoLeap),
            90
        );
        assert_eq!(diff_days_by(date(1, 1, 2021), date(1, 1, 2022), convention), 365);
    }

    #[test]
    fn actual_conventions_ignore_february_rules() {
        for convention in [
            DayCountConvention::ActAct,
            DayCountConvention::Act360,
            DayCountConvention::Act365,
            DayCountConvention::Act252,
        ] {
            assert_eq!(diff_days_by(date(2, 1, 2020), date(3, 1, 2020), convention), 29);
        }
    }

    #[test]
    fn year_fractions() {
        let frac = year_frac(date(1, 1, 2021), date(7, 1, 2021), DayCountConvention::Act360)
            .expect("ordered");
        assert_eq!(frac, 181.0 / 360.0);

        let frac = year_frac(date(1, 1, 2020), date(7, 1, 2020), DayCountConvention::ActAct)
            .expect("ordered");
        assert_eq!(frac, 182.0 / 366.0);

        let frac = year_frac(date(7, 1, 2019), date(7, 1, 2021), DayCountConvention::ActAct)
            .expect("ordered");
        assert!((frac - 2.0).abs() < 1e-12);

        let frac = year_frac_with_extra(
            date(1, 1, 2021),
            date(1, 2, 2021),
            DayCountConvention::Act365,
            1,
        )
        .expect("ordered");
        assert_eq!(frac, 2.0 / 365.0);
    }

    #[test]
    fn year_frac_requires_ordered_dates() {
        let d = date(1, 1, 2021);
        let err = year_frac(d, d, DayCountConvention::Act365).expect_err("empty range");
        assert_eq!(err.kind(), ErrorKind::InvalidRange);
    }

    #[test]
    fn convention_names_round_trip() {
        for convention in DayCountConvention::ALL {
            let parsed: DayCountConvention =
                convention.to_string().parse().expect("known name");
            assert_eq!(parsed, convention);
        }
        assert_eq!(
            "ACT/360 No Leap".parse::<DayCountConvention>().expect("known"),
            DayCountConvention::Act360NoLeap
        );
        let err = "ACT/999"
            .parse::<DayCountConvention>()
            .expect_err("unknown name");
        assert_eq!(err.kind(), ErrorKind::InvalidLabel);
        assert_eq!(DayCountConvention::Act252.divisor(), 252.0);
    }
}
