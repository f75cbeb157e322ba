#![forbid(unsafe_code)]

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use tf_calendar::{
    CalendarDate, CalendarError, Datetime, decode_host_dates, decode_host_datetimes,
    encode_host_dates, encode_host_datetimes, has_date_class, has_datetime_class,
};
use tf_runtime::{BoundaryError, ConversionContext, ErrorKind, FromHost, ToHost};
use tf_types::{HostType, HostValue, HostValueError, HostVector};
use thiserror::Error;

/// Largest distance from an integer a scaled gap may have and still count
/// as a whole number of periods.
pub const REGULARITY_TOLERANCE: f64 = 1e-8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexType {
    Int,
    Double,
    Date,
    Datetime,
}

impl fmt::Display for IndexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Int => "int",
            Self::Double => "double",
            Self::Date => "date",
            Self::Datetime => "datetime",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SeriesIndexError {
    #[error("index type mismatch: requested {requested}, index holds {actual}")]
    TypeMismatch {
        requested: IndexType,
        actual: IndexType,
    },
    #[error("position {index} out of range for index of length {len}")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("host {0} vectors cannot index a series")]
    UnsupportedHostType(HostType),
    #[error(transparent)]
    Calendar(#[from] CalendarError),
    #[error(transparent)]
    Host(#[from] HostValueError),
}

impl BoundaryError for SeriesIndexError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Self::IndexOutOfRange { .. } => ErrorKind::IndexOutOfRange,
            Self::UnsupportedHostType(_) | Self::Host(_) => ErrorKind::InvalidFormat,
            Self::Calendar(err) => err.kind(),
        }
    }
}

/// Keys of an ordered series. Entries may be in any order until export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "values", rename_all = "snake_case")]
pub enum SeriesIndex {
    Int(Vec<i32>),
    Double(Vec<f64>),
    Date(Vec<CalendarDate>),
    Datetime(Vec<Datetime>),
}

fn slot<T>(values: &mut [T], index: usize) -> Result<&mut T, SeriesIndexError> {
    let len = values.len();
    values
        .get_mut(index)
        .ok_or(SeriesIndexError::IndexOutOfRange { index, len })
}

fn entry<T: Copy>(values: &[T], index: usize) -> Result<T, SeriesIndexError> {
    values
        .get(index)
        .copied()
        .ok_or(SeriesIndexError::IndexOutOfRange {
            index,
            len: values.len(),
        })
}

fn stable_permutation<T>(values: &[T], cmp: impl Fn(&T, &T) -> Ordering) -> Vec<usize> {
    let mut perm: Vec<usize> = (0..values.len()).collect();
    perm.sort_by(|&a, &b| cmp(&values[a], &values[b]));
    perm
}

fn gather<T: Clone>(values: &[T], perm: &[usize]) -> Vec<T> {
    perm.iter().map(|&i| values[i].clone()).collect()
}

impl SeriesIndex {
    #[must_use]
    pub fn index_type(&self) -> IndexType {
        match self {
            Self::Int(_) => IndexType::Int,
            Self::Double(_) => IndexType::Double,
            Self::Date(_) => IndexType::Date,
            Self::Datetime(_) => IndexType::Datetime,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Int(v) => v.len(),
            Self::Double(v) => v.len(),
            Self::Date(v) => v.len(),
            Self::Datetime(v) => v.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Numeric key used for gap arithmetic: days for dates, seconds for
    /// datetimes, the raw value otherwise.
    #[must_use]
    pub fn key(&self, index: usize) -> Option<f64> {
        match self {
            Self::Int(v) => v.get(index).map(|&x| f64::from(x)),
            Self::Double(v) => v.get(index).copied(),
            Self::Date(v) => v.get(index).map(|d| f64::from(d.jdn())),
            Self::Datetime(v) => v.get(index).map(|dt| dt.seconds()),
        }
    }

    /// Stable ascending order of positions; equal keys keep input order.
    #[must_use]
    pub fn sort_permutation(&self) -> Vec<usize> {
        match self {
            Self::Int(v) => stable_permutation(v, Ord::cmp),
            Self::Double(v) => stable_permutation(v, f64::total_cmp),
            Self::Date(v) => stable_permutation(v, Ord::cmp),
            Self::Datetime(v) => stable_permutation(v, Ord::cmp),
        }
    }

    /// Entries rearranged so that position `i` holds entry `perm[i]`.
    #[must_use]
    pub fn permuted(&self, perm: &[usize]) -> Self {
        match self {
            Self::Int(v) => Self::Int(gather(v, perm)),
            Self::Double(v) => Self::Double(gather(v, perm)),
            Self::Date(v) => Self::Date(gather(v, perm)),
            Self::Datetime(v) => Self::Datetime(gather(v, perm)),
        }
    }

    /// True when `frequency` is positive and every gap between
    /// chronologically adjacent keys is a whole number of periods.
    #[must_use]
    pub fn frequency_is_valid(&self, frequency: f64) -> bool {
        if !(frequency.is_finite() && frequency > 0.0) {
            return false;
        }
        let keys: Vec<f64> = self
            .sort_permutation()
            .into_iter()
            .filter_map(|i| self.key(i))
            .collect();
        keys.windows(2).all(|pair| {
            let periods = (pair[1] - pair[0]) * frequency;
            (periods - periods.round()).abs() <= REGULARITY_TOLERANCE
        })
    }

    pub fn get_int(&self, index: usize) -> Result<i32, SeriesIndexError> {
        match self {
            Self::Int(v) => entry(v, index),
            other => Err(other.mismatch(IndexType::Int)),
        }
    }

    pub fn get_double(&self, index: usize) -> Result<f64, SeriesIndexError> {
        match self {
            Self::Double(v) => entry(v, index),
            other => Err(other.mismatch(IndexType::Double)),
        }
    }

    pub fn get_date(&self, index: usize) -> Result<CalendarDate, SeriesIndexError> {
        match self {
            Self::Date(v) => entry(v, index),
            other => Err(other.mismatch(IndexType::Date)),
        }
    }

    pub fn get_datetime(&self, index: usize) -> Result<Datetime, SeriesIndexError> {
        match self {
            Self::Datetime(v) => entry(v, index),
            other => Err(other.mismatch(IndexType::Datetime)),
        }
    }

    pub fn int_mut(&mut self, index: usize) -> Result<&mut i32, SeriesIndexError> {
        match self {
            Self::Int(v) => slot(v, index),
            other => Err(other.mismatch(IndexType::Int)),
        }
    }

    pub fn double_mut(&mut self, index: usize) -> Result<&mut f64, SeriesIndexError> {
        match self {
            Self::Double(v) => slot(v, index),
            other => Err(other.mismatch(IndexType::Double)),
        }
    }

    pub fn date_mut(&mut self, index: usize) -> Result<&mut CalendarDate, SeriesIndexError> {
        match self {
            Self::Date(v) => slot(v, index),
            other => Err(other.mismatch(IndexType::Date)),
        }
    }

    pub fn datetime_mut(&mut self, index: usize) -> Result<&mut Datetime, SeriesIndexError> {
        match self {
            Self::Datetime(v) => slot(v, index),
            other => Err(other.mismatch(IndexType::Datetime)),
        }
    }

    /// Display text for one key.
    #[must_use]
    pub fn label(&self, index: usize) -> Option<String> {
        match self {
            Self::Int(v) => v.get(index).map(ToString::to_string),
            Self::Double(v) => v.get(index).map(ToString::to_string),
            Self::Date(v) => v.get(index).map(ToString::to_string),
            Self::Datetime(v) => v.get(index).map(ToString::to_string),
        }
    }

    fn mismatch(&self, requested: IndexType) -> SeriesIndexError {
        SeriesIndexError::TypeMismatch {
            requested,
            actual: self.index_type(),
        }
    }
}

impl From<Vec<i32>> for SeriesIndex {
    fn from(values: Vec<i32>) -> Self {
        Self::Int(values)
    }
}

impl From<Vec<f64>> for SeriesIndex {
    fn from(values: Vec<f64>) -> Self {
        Self::Double(values)
    }
}

impl From<Vec<CalendarDate>> for SeriesIndex {
    fn from(values: Vec<CalendarDate>) -> Self {
        Self::Date(values)
    }
}

impl From<Vec<Datetime>> for SeriesIndex {
    fn from(values: Vec<Datetime>) -> Self {
        Self::Datetime(values)
    }
}

impl FromHost for SeriesIndex {
    type Error = SeriesIndexError;

    fn from_host(value: &HostValue, ctx: &mut ConversionContext) -> Result<Self, Self::Error> {
        if has_date_class(value) {
            return Ok(Self::Date(decode_host_dates(value, ctx)?));
        }
        if has_datetime_class(value) {
            return Ok(Self::Datetime(decode_host_datetimes(value)?));
        }
        match value.payload() {
            HostVector::Integer(v) => Ok(Self::Int(v.clone())),
            HostVector::Real(v) => Ok(Self::Double(v.clone())),
            other => Err(SeriesIndexError::UnsupportedHostType(other.host_type())),
        }
    }
}

impl ToHost for SeriesIndex {
    type Error = SeriesIndexError;

    fn to_host(&self, ctx: &mut ConversionContext) -> Result<HostValue, Self::Error> {
        Ok(match self {
            Self::Int(v) => HostValue::integer(v.clone()),
            Self::Double(v) => HostValue::real(v.clone()),
            Self::Date(v) => encode_host_dates(v),
            Self::Datetime(v) => encode_host_datetimes(v, &ctx.options),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{IndexType, SeriesIndex, SeriesIndexError};
    use tf_calendar::{CalendarDate, Datetime};
    use tf_runtime::{BoundaryError, ErrorKind, from_host_value, to_host_value};
    use tf_types::HostValue;

    fn dates(serials: &[i32]) -> Vec<CalendarDate> {
        serials
            .iter()
            .map(|&s| CalendarDate::from_host_serial(s).expect("serial"))
            .collect()
    }

    #[test]
    fn sort_permutation_is_stable() {
        let index = SeriesIndex::from(vec![3, 1, 3, 2]);
        assert_eq!(index.sort_permutation(), vec![1, 3, 0, 2]);
        assert_eq!(index.permuted(&index.sort_permutation()), SeriesIndex::Int(vec![1, 2, 3, 3]));
    }

    #[test]
    fn double_keys_sort_totally() {
        let index = SeriesIndex::from(vec![2.5, -0.0, 0.0, -1.0]);
        assert_eq!(index.sort_permutation(), vec![3, 1, 2, 0]);
    }

    #[test]
    fn frequency_validation_uses_sorted_gaps() {
        assert!(SeriesIndex::from(vec![0, 2, 4, 6]).frequency_is_valid(0.5));
        assert!(!SeriesIndex::from(vec![0, 2, 4, 7]).frequency_is_valid(0.5));
        assert!(SeriesIndex::from(vec![6, 0, 4, 2]).frequency_is_valid(0.5));
        assert!(!SeriesIndex::from(vec![0, 2]).frequency_is_valid(0.0));
        assert!(!SeriesIndex::from(vec![0, 2]).frequency_is_valid(f64::NAN));
        assert!(SeriesIndex::from(vec![0.0, 0.1, 0.2, 0.3]).frequency_is_valid(10.0));
    }

    #[test]
    fn date_gaps_are_days_and_datetime_gaps_are_seconds() {
        let weekly = SeriesIndex::from(dates(&[0, 7, 14]));
        assert!(weekly.frequency_is_valid(1.0 / 7.0));
        assert!(!weekly.frequency_is_valid(1.0 / 5.0));

        let hourly = SeriesIndex::from(vec![
            Datetime::from_host_seconds(0.0),
            Datetime::from_host_seconds(3_600.0),
            Datetime::from_host_seconds(7_200.0),
        ]);
        assert!(hourly.frequency_is_valid(1.0 / 3_600.0));
    }

    #[test]
    fn typed_accessors_check_index_type() {
        let mut index = SeriesIndex::from(vec![1.0, 2.0]);
        *index.double_mut(0).expect("double") = 5.0;
        assert_eq!(index.get_double(0).expect("double"), 5.0);

        let err = index.int_mut(0).expect_err("double index");
        assert_eq!(
            err,
            SeriesIndexError::TypeMismatch {
                requested: IndexType::Int,
                actual: IndexType::Double,
            }
        );
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        assert_eq!(
            index.get_double(2).expect_err("past the end").kind(),
            ErrorKind::IndexOutOfRange
        );
    }

    #[test]
    fn serde_tags_index_kind() {
        let index = SeriesIndex::from(vec![1, 2]);
        let json = serde_json::to_string(&index).expect("serialize");
        assert_eq!(json, r#"{"kind":"int","values":[1,2]}"#);
        let back: SeriesIndex = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, index);
    }

    #[test]
    fn host_index_types_follow_class() {
        let date = HostValue::real(vec![0.0, 1.0]).with_class(["Date"]);
        let index: SeriesIndex = from_host_value(&date).expect("date index");
        assert_eq!(index.index_type(), IndexType::Date);
        assert_eq!(to_host_value(&index).expect("export"), date);

        let ints: SeriesIndex = from_host_value(&HostValue::integer(vec![1])).expect("int");
        assert_eq!(ints.index_type(), IndexType::Int);

        let err = from_host_value::<SeriesIndex>(&HostValue::character(["a"]))
            .expect_err("character index");
        assert_eq!(err.kind(), ErrorKind::InvalidFormat);
    }
}
