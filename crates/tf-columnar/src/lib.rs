#![forbid(unsafe_code)]

mod factor;

use std::fmt;

use serde::{Deserialize, Serialize};
use tf_calendar::{
    CalendarDate, CalendarError, Datetime, decode_host_dates, decode_host_datetimes,
    encode_host_dates, encode_host_datetimes, has_date_class, has_datetime_class,
};
use tf_runtime::{BoundaryError, ConversionContext, ErrorKind, FromHost, ToHost};
use tf_types::{HostType, HostValue, HostValueError, HostVector};
use thiserror::Error;

pub use factor::{Categorical, CategoricalError, FACTOR_CLASS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Int,
    Double,
    Str,
    Bool,
    Factor,
    Date,
    Datetime,
}

impl ColumnType {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Double => "double",
            Self::Str => "string",
            Self::Bool => "bool",
            Self::Factor => "factor",
            Self::Date => "date",
            Self::Datetime => "datetime",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ColumnError {
    #[error("column type mismatch: requested {requested}, column holds {actual}")]
    TypeMismatch {
        requested: ColumnType,
        actual: ColumnType,
    },
    #[error("row {index} out of range for column of length {len}")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("{0} columns cannot be pre-allocated")]
    UnsupportedAllocation(ColumnType),
    #[error("host {0} vectors cannot be stored in a column")]
    UnsupportedHostType(HostType),
    #[error(transparent)]
    Categorical(#[from] CategoricalError),
    #[error(transparent)]
    Calendar(#[from] CalendarError),
    #[error(transparent)]
    Host(#[from] HostValueError),
}

impl BoundaryError for ColumnError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Self::IndexOutOfRange { .. } => ErrorKind::IndexOutOfRange,
            Self::UnsupportedAllocation(_) | Self::UnsupportedHostType(_) => {
                ErrorKind::UnsupportedColumnType
            }
            Self::Categorical(err) => err.kind(),
            Self::Calendar(err) => err.kind(),
            Self::Host(err) => err.kind(),
        }
    }
}

fn cell<T>(values: &[T], index: usize) -> Result<&T, ColumnError> {
    let len = values.len();
    values
        .get(index)
        .ok_or(ColumnError::IndexOutOfRange { index, len })
}

fn cell_mut<T>(values: &mut [T], index: usize) -> Result<&mut T, ColumnError> {
    let len = values.len();
    values
        .get_mut(index)
        .ok_or(ColumnError::IndexOutOfRange { index, len })
}

fn mismatch(requested: ColumnType, actual: ColumnType) -> ColumnError {
    ColumnError::TypeMismatch { requested, actual }
}

fn factor_error(err: CategoricalError) -> ColumnError {
    match err {
        CategoricalError::ObservationOutOfRange { index, len } => {
            ColumnError::IndexOutOfRange { index, len }
        }
        other => ColumnError::Categorical(other),
    }
}

/// An owning tagged column. The tag is fixed at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "values", rename_all = "snake_case")]
pub enum Column {
    Int(Vec<i32>),
    Double(Vec<f64>),
    Str(Vec<String>),
    Bool(Vec<bool>),
    Factor(Categorical),
    Date(Vec<CalendarDate>),
    Datetime(Vec<Datetime>),
}

/// A column borrowing caller storage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnView<'a> {
    Int(&'a [i32]),
    Double(&'a [f64]),
    Str(&'a [String]),
    Bool(&'a [bool]),
    Factor(&'a Categorical),
    Date(&'a [CalendarDate]),
    Datetime(&'a [Datetime]),
}

/// A column writing through to caller storage. Factor levels stay read-only.
#[derive(Debug, PartialEq)]
pub enum ColumnViewMut<'a> {
    Int(&'a mut [i32]),
    Double(&'a mut [f64]),
    Str(&'a mut [String]),
    Bool(&'a mut [bool]),
    Factor(&'a Categorical),
    Date(&'a mut [CalendarDate]),
    Datetime(&'a mut [Datetime]),
}

impl<'a> ColumnView<'a> {
    #[must_use]
    pub fn column_type(&self) -> ColumnType {
        match self {
            Self::Int(_) => ColumnType::Int,
            Self::Double(_) => ColumnType::Double,
            Self::Str(_) => ColumnType::Str,
            Self::Bool(_) => ColumnType::Bool,
            Self::Factor(_) => ColumnType::Factor,
            Self::Date(_) => ColumnType::Date,
            Self::Datetime(_) => ColumnType::Datetime,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Int(v) => v.len(),
            Self::Double(v) => v.len(),
            Self::Str(v) => v.len(),
            Self::Bool(v) => v.len(),
            Self::Factor(f) => f.len(),
            Self::Date(v) => v.len(),
            Self::Datetime(v) => v.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get_int(&self, index: usize) -> Result<i32, ColumnError> {
        match self {
            Self::Int(v) => cell(v, index).copied(),
            other => Err(mismatch(ColumnType::Int, other.column_type())),
        }
    }

    pub fn get_double(&self, index: usize) -> Result<f64, ColumnError> {
        match self {
            Self::Double(v) => cell(v, index).copied(),
            other => Err(mismatch(ColumnType::Double, other.column_type())),
        }
    }

    pub fn get_string(&self, index: usize) -> Result<&'a str, ColumnError> {
        match *self {
            Self::Str(v) => cell(v, index).map(String::as_str),
            other => Err(mismatch(ColumnType::Str, other.column_type())),
        }
    }

    pub fn get_bool(&self, index: usize) -> Result<bool, ColumnError> {
        match self {
            Self::Bool(v) => cell(v, index).copied(),
            other => Err(mismatch(ColumnType::Bool, other.column_type())),
        }
    }

    pub fn get_date(&self, index: usize) -> Result<CalendarDate, ColumnError> {
        match self {
            Self::Date(v) => cell(v, index).copied(),
            other => Err(mismatch(ColumnType::Date, other.column_type())),
        }
    }

    pub fn get_datetime(&self, index: usize) -> Result<Datetime, ColumnError> {
        match self {
            Self::Datetime(v) => cell(v, index).copied(),
            other => Err(mismatch(ColumnType::Datetime, other.column_type())),
        }
    }

    pub fn get_factor_label(&self, index: usize) -> Result<&'a str, ColumnError> {
        match *self {
            Self::Factor(f) => f.observed_label(index).map_err(factor_error),
            other => Err(mismatch(ColumnType::Factor, other.column_type())),
        }
    }

    /// One-based level number of observation `index`.
    pub fn get_factor_level(&self, index: usize) -> Result<usize, ColumnError> {
        match self {
            Self::Factor(f) => f.observed_level_number(index).map_err(factor_error),
            other => Err(mismatch(ColumnType::Factor, other.column_type())),
        }
    }

    #[must_use]
    pub fn to_owned_column(&self) -> Column {
        match *self {
            Self::Int(v) => Column::Int(v.to_vec()),
            Self::Double(v) => Column::Double(v.to_vec()),
            Self::Str(v) => Column::Str(v.to_vec()),
            Self::Bool(v) => Column::Bool(v.to_vec()),
            Self::Factor(f) => Column::Factor(f.clone()),
            Self::Date(v) => Column::Date(v.to_vec()),
            Self::Datetime(v) => Column::Datetime(v.to_vec()),
        }
    }

    /// Display text for one cell.
    pub fn cell_text(&self, index: usize) -> Result<String, ColumnError> {
        Ok(match self {
            Self::Int(v) => cell(v, index)?.to_string(),
            Self::Double(v) => cell(v, index)?.to_string(),
            Self::Str(v) => cell(v, index)?.clone(),
            Self::Bool(v) => cell(v, index)?.to_string(),
            Self::Factor(_) => self.get_factor_label(index)?.to_owned(),
            Self::Date(v) => cell(v, index)?.to_string(),
            Self::Datetime(v) => cell(v, index)?.to_string(),
        })
    }
}

impl ColumnViewMut<'_> {
    #[must_use]
    pub fn as_view(&self) -> ColumnView<'_> {
        match self {
            Self::Int(v) => ColumnView::Int(v),
            Self::Double(v) => ColumnView::Double(v),
            Self::Str(v) => ColumnView::Str(v),
            Self::Bool(v) => ColumnView::Bool(v),
            Self::Factor(f) => ColumnView::Factor(f),
            Self::Date(v) => ColumnView::Date(v),
            Self::Datetime(v) => ColumnView::Datetime(v),
        }
    }

    #[must_use]
    pub fn column_type(&self) -> ColumnType {
        self.as_view().column_type()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.as_view().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn int_mut(&mut self, index: usize) -> Result<&mut i32, ColumnError> {
        match self {
            Self::Int(v) => cell_mut(v, index),
            other => Err(mismatch(ColumnType::Int, other.column_type())),
        }
    }

    pub fn double_mut(&mut self, index: usize) -> Result<&mut f64, ColumnError> {
        match self {
            Self::Double(v) => cell_mut(v, index),
            other => Err(mismatch(ColumnType::Double, other.column_type())),
        }
    }

    pub fn string_mut(&mut self, index: usize) -> Result<&mut String, ColumnError> {
        match self {
            Self::Str(v) => cell_mut(v, index),
            other => Err(mismatch(ColumnType::Str, other.column_type())),
        }
    }

    pub fn bool_mut(&mut self, index: usize) -> Result<&mut bool, ColumnError> {
        match self {
            Self::Bool(v) => cell_mut(v, index),
            other => Err(mismatch(ColumnType::Bool, other.column_type())),
        }
    }

    pub fn date_mut(&mut self, index: usize) -> Result<&mut CalendarDate, ColumnError> {
        match self {
            Self::Date(v) => cell_mut(v, index),
            other => Err(mismatch(ColumnType::Date, other.column_type())),
        }
    }

    pub fn datetime_mut(&mut self, index: usize) -> Result<&mut Datetime, ColumnError> {
        match self {
            Self::Datetime(v) => cell_mut(v, index),
            other => Err(mismatch(ColumnType::Datetime, other.column_type())),
        }
    }

    #[must_use]
    pub fn to_owned_column(&self) -> Column {
        self.as_view().to_owned_column()
    }
}

impl Column {
    /// Default-filled storage for `rows` rows. Bool and factor columns have
    /// no meaningful default and are rejected.
    pub fn allocate(column_type: ColumnType, rows: usize) -> Result<Self, ColumnError> {
        match column_type {
            ColumnType::Int => Ok(Self::Int(vec![0; rows])),
            ColumnType::Double => Ok(Self::Double(vec![0.0; rows])),
            ColumnType::Str => Ok(Self::Str(vec![String::new(); rows])),
            ColumnType::Date => Ok(Self::Date(vec![CalendarDate::default(); rows])),
            ColumnType::Datetime => Ok(Self::Datetime(vec![Datetime::default(); rows])),
            ColumnType::Bool | ColumnType::Factor => {
                Err(ColumnError::UnsupportedAllocation(column_type))
            }
        }
    }

    /// Deep copy of borrowed storage.
    #[must_use]
    pub fn owning(view: ColumnView<'_>) -> Self {
        view.to_owned_column()
    }

    #[must_use]
    pub fn view(&self) -> ColumnView<'_> {
        match self {
            Self::Int(v) => ColumnView::Int(v),
            Self::Double(v) => ColumnView::Double(v),
            Self::Str(v) => ColumnView::Str(v),
            Self::Bool(v) => ColumnView::Bool(v),
            Self::Factor(f) => ColumnView::Factor(f),
            Self::Date(v) => ColumnView::Date(v),
            Self::Datetime(v) => ColumnView::Datetime(v),
        }
    }

    #[must_use]
    pub fn view_mut(&mut self) -> ColumnViewMut<'_> {
        match self {
            Self::Int(v) => ColumnViewMut::Int(v),
            Self::Double(v) => ColumnViewMut::Double(v),
            Self::Str(v) => ColumnViewMut::Str(v),
            Self::Bool(v) => ColumnViewMut::Bool(v),
            Self::Factor(f) => ColumnViewMut::Factor(f),
            Self::Date(v) => ColumnViewMut::Date(v),
            Self::Datetime(v) => ColumnViewMut::Datetime(v),
        }
    }

    #[must_use]
    pub fn column_type(&self) -> ColumnType {
        self.view().column_type()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.view().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get_int(&self, index: usize) -> Result<i32, ColumnError> {
        self.view().get_int(index)
    }

    pub fn get_double(&self, index: usize) -> Result<f64, ColumnError> {
        self.view().get_double(index)
    }

    pub fn get_string(&self, index: usize) -> Result<&str, ColumnError> {
        self.view().get_string(index)
    }

    pub fn get_bool(&self, index: usize) -> Result<bool, ColumnError> {
        self.view().get_bool(index)
    }

    pub fn get_date(&self, index: usize) -> Result<CalendarDate, ColumnError> {
        self.view().get_date(index)
    }

    pub fn get_datetime(&self, index: usize) -> Result<Datetime, ColumnError> {
        self.view().get_datetime(index)
    }

    pub fn get_factor_label(&self, index: usize) -> Result<&str, ColumnError> {
        self.view().get_factor_label(index)
    }

    pub fn get_factor_level(&self, index: usize) -> Result<usize, ColumnError> {
        self.view().get_factor_level(index)
    }

    pub fn int_mut(&mut self, index: usize) -> Result<&mut i32, ColumnError> {
        match self {
            Self::Int(v) => cell_mut(v, index),
            other => Err(mismatch(ColumnType::Int, other.column_type())),
        }
    }

    pub fn double_mut(&mut self, index: usize) -> Result<&mut f64, ColumnError> {
        match self {
            Self::Double(v) => cell_mut(v, index),
            other => Err(mismatch(ColumnType::Double, other.column_type())),
        }
    }

    pub fn string_mut(&mut self, index: usize) -> Result<&mut String, ColumnError> {
        match self {
            Self::Str(v) => cell_mut(v, index),
            other => Err(mismatch(ColumnType::Str, other.column_type())),
        }
    }

    pub fn bool_mut(&mut self, index: usize) -> Result<&mut bool, ColumnError> {
        match self {
            Self::Bool(v) => cell_mut(v, index),
            other => Err(mismatch(ColumnType::Bool, other.column_type())),
        }
    }

    pub fn date_mut(&mut self, index: usize) -> Result<&mut CalendarDate, ColumnError> {
        match self {
            Self::Date(v) => cell_mut(v, index),
            other => Err(mismatch(ColumnType::Date, other.column_type())),
        }
    }

    pub fn datetime_mut(&mut self, index: usize) -> Result<&mut Datetime, ColumnError> {
        match self {
            Self::Datetime(v) => cell_mut(v, index),
            other => Err(mismatch(ColumnType::Datetime, other.column_type())),
        }
    }
}

impl From<Vec<i32>> for Column {
    fn from(values: Vec<i32>) -> Self {
        Self::Int(values)
    }
}

impl From<Vec<f64>> for Column {
    fn from(values: Vec<f64>) -> Self {
        Self::Double(values)
    }
}

impl From<Vec<String>> for Column {
    fn from(values: Vec<String>) -> Self {
        Self::Str(values)
    }
}

impl From<Vec<bool>> for Column {
    fn from(values: Vec<bool>) -> Self {
        Self::Bool(values)
    }
}

impl From<Categorical> for Column {
    fn from(values: Categorical) -> Self {
        Self::Factor(values)
    }
}

impl From<Vec<CalendarDate>> for Column {
    fn from(values: Vec<CalendarDate>) -> Self {
        Self::Date(values)
    }
}

impl From<Vec<Datetime>> for Column {
    fn from(values: Vec<Datetime>) -> Self {
        Self::Datetime(values)
    }
}

impl<'a> From<&'a Column> for ColumnView<'a> {
    fn from(column: &'a Column) -> Self {
        column.view()
    }
}

impl<'a> From<&'a [i32]> for ColumnView<'a> {
    fn from(values: &'a [i32]) -> Self {
        Self::Int(values)
    }
}

impl<'a> From<&'a [f64]> for ColumnView<'a> {
    fn from(values: &'a [f64]) -> Self {
        Self::Double(values)
    }
}

impl<'a> From<&'a [String]> for ColumnView<'a> {
    fn from(values: &'a [String]) -> Self {
        Self::Str(values)
    }
}

impl<'a> From<&'a [bool]> for ColumnView<'a> {
    fn from(values: &'a [bool]) -> Self {
        Self::Bool(values)
    }
}

impl<'a> From<&'a Categorical> for ColumnView<'a> {
    fn from(values: &'a Categorical) -> Self {
        Self::Factor(values)
    }
}

impl<'a> From<&'a [CalendarDate]> for ColumnView<'a> {
    fn from(values: &'a [CalendarDate]) -> Self {
        Self::Date(values)
    }
}

impl<'a> From<&'a [Datetime]> for ColumnView<'a> {
    fn from(values: &'a [Datetime]) -> Self {
        Self::Datetime(values)
    }
}

impl<'a> From<&'a mut [i32]> for ColumnViewMut<'a> {
    fn from(values: &'a mut [i32]) -> Self {
        Self::Int(values)
    }
}

impl<'a> From<&'a mut [f64]> for ColumnViewMut<'a> {
    fn from(values: &'a mut [f64]) -> Self {
        Self::Double(values)
    }
}

impl<'a> From<&'a mut [String]> for ColumnViewMut<'a> {
    fn from(values: &'a mut [String]) -> Self {
        Self::Str(values)
    }
}

impl<'a> From<&'a mut [bool]> for ColumnViewMut<'a> {
    fn from(values: &'a mut [bool]) -> Self {
        Self::Bool(values)
    }
}

impl<'a> From<&'a mut [CalendarDate]> for ColumnViewMut<'a> {
    fn from(values: &'a mut [CalendarDate]) -> Self {
        Self::Date(values)
    }
}

impl<'a> From<&'a mut [Datetime]> for ColumnViewMut<'a> {
    fn from(values: &'a mut [Datetime]) -> Self {
        Self::Datetime(values)
    }
}

impl FromHost for Column {
    type Error = ColumnError;

    /// Classification order: dated numerics, POSIX reals, plain reals,
    /// factors, plain integers, characters, logicals.
    fn from_host(value: &HostValue, ctx: &mut ConversionContext) -> Result<Self, Self::Error> {
        let column = match value.payload() {
            HostVector::Real(_) | HostVector::Integer(_) if has_date_class(value) => {
                Self::Date(decode_host_dates(value, ctx)?)
            }
            HostVector::Real(_) if has_datetime_class(value) => {
                Self::Datetime(decode_host_datetimes(value)?)
            }
            HostVector::Real(v) => Self::Double(v.clone()),
            HostVector::Integer(_) if value.inherits(FACTOR_CLASS) => {
                Self::Factor(Categorical::from_host(value, ctx)?)
            }
            HostVector::Integer(v) => Self::Int(v.clone()),
            HostVector::Character(v) => Self::Str(v.clone()),
            HostVector::Logical(v) => Self::Bool(v.clone()),
            other => return Err(ColumnError::UnsupportedHostType(other.host_type())),
        };
        Ok(column)
    }
}

impl ToHost for Column {
    type Error = ColumnError;

    fn to_host(&self, ctx: &mut ConversionContext) -> Result<HostValue, Self::Error> {
        Ok(match self {
            Self::Int(v) => HostValue::integer(v.clone()),
            Self::Double(v) => HostValue::real(v.clone()),
            Self::Str(v) => HostValue::character(v.iter().map(String::as_str)),
            Self::Bool(v) => HostValue::logical(v.clone()),
            Self::Factor(f) => f.to_host(ctx)?,
            Self::Date(v) => encode_host_dates(v),
            Self::Datetime(v) => encode_host_datetimes(v, &ctx.options),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{Categorical, Column, ColumnError, ColumnType, ColumnView, ColumnViewMut};
    use tf_calendar::{CalendarDate, Datetime};
    use tf_runtime::{BoundaryError, ConversionContext, ErrorKind, FromHost, ToHost};
    use tf_types::HostValue;

    #[test]
    fn accessors_dispatch_on_tag() {
        let column = Column::from(vec![1, 2, 3]);
        assert_eq!(column.column_type(), ColumnType::Int);
        assert_eq!(column.get_int(2).expect("in range"), 3);

        let err = column.get_double(0).expect_err("int column");
        assert_eq!(
            err,
            ColumnError::TypeMismatch {
                requested: ColumnType::Double,
                actual: ColumnType::Int,
            }
        );
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);

        let err = column.get_int(3).expect_err("past the end");
        assert_eq!(err.kind(), ErrorKind::IndexOutOfRange);
    }

    #[test]
    fn factor_accessors_report_labels_and_levels() {
        let column = Column::from(Categorical::from_labels(["b", "a"]).expect("factor"));
        assert_eq!(column.get_factor_label(0).expect("in range"), "b");
        assert_eq!(column.get_factor_level(1).expect("in range"), 1);
        let err = column.get_factor_label(2).expect_err("past the end");
        assert_eq!(err, ColumnError::IndexOutOfRange { index: 2, len: 2 });
    }

    #[test]
    fn allocate_rejects_bool_and_factor() {
        let column = Column::allocate(ColumnType::Str, 2).expect("strings allocate");
        assert_eq!(column.len(), 2);
        for column_type in [ColumnType::Bool, ColumnType::Factor] {
            let err = Column::allocate(column_type, 2).expect_err("no default");
            assert_eq!(err.kind(), ErrorKind::UnsupportedColumnType);
        }
    }

    #[test]
    fn borrowing_view_writes_through_and_owning_copy_does_not() {
        let mut storage = vec![1.0, 2.0];
        {
            let mut view = ColumnViewMut::from(storage.as_mut_slice());
            *view.double_mut(0).expect("double") = 10.0;
            assert_eq!(view.as_view().get_double(0).expect("double"), 10.0);
        }
        assert_eq!(storage, [10.0, 2.0]);

        let mut owned = Column::owning(ColumnView::from(storage.as_slice()));
        *owned.double_mut(1).expect("double") = 20.0;
        assert_eq!(storage, [10.0, 2.0]);
        assert_eq!(owned.get_double(1).expect("double"), 20.0);
    }

    #[test]
    fn views_share_accessors_with_owned_columns() {
        let names = vec!["x".to_owned(), "y".to_owned()];
        let view = ColumnView::from(names.as_slice());
        assert_eq!(view.get_string(1).expect("in range"), "y");
        assert_eq!(view.to_owned_column(), Column::from(names.clone()));
        assert!(view.get_bool(0).is_err());
    }

    #[test]
    fn host_classification_order() {
        let mut ctx = ConversionContext::default();
        let date = HostValue::integer(vec![0]).with_class(["Date"]);
        assert_eq!(
            Column::from_host(&date, &mut ctx).expect("date").column_type(),
            ColumnType::Date
        );
        let datetime = HostValue::real(vec![0.0]).with_class(["POSIXct", "POSIXt"]);
        assert_eq!(
            Column::from_host(&datetime, &mut ctx).expect("datetime").column_type(),
            ColumnType::Datetime
        );
        let factor = HostValue::integer(vec![1])
            .with_attr("levels", HostValue::character(["a"]))
            .with_class(["factor"]);
        assert_eq!(
            Column::from_host(&factor, &mut ctx).expect("factor").column_type(),
            ColumnType::Factor
        );
        assert_eq!(
            Column::from_host(&HostValue::logical(vec![true]), &mut ctx)
                .expect("bool")
                .column_type(),
            ColumnType::Bool
        );

        let err = Column::from_host(&HostValue::list(vec![]), &mut ctx).expect_err("list");
        assert_eq!(err.kind(), ErrorKind::UnsupportedColumnType);
    }

    #[test]
    fn date_and_datetime_columns_export_with_classes() {
        let mut ctx = ConversionContext::default();
        let dates = Column::from(vec![CalendarDate::from_host_serial(1).expect("serial")]);
        let host = dates.to_host(&mut ctx).expect("export");
        assert!(host.inherits("Date"));
        assert_eq!(host.as_real().expect("real"), &[1.0]);

        let times = Column::from(vec![Datetime::from_host_seconds(60.0)]);
        let host = times.to_host(&mut ctx).expect("export");
        assert_eq!(host.primary_class(), Some("POSIXt"));
    }

    #[test]
    fn cell_text_renders_each_type() {
        let column = Column::from(vec![CalendarDate::from_ymd(4, 15, 2010).expect("valid")]);
        assert_eq!(column.view().cell_text(0).expect("in range"), "Thu 4/15/2010");
        let column = Column::from(vec![true]);
        assert_eq!(column.view().cell_text(0).expect("in range"), "true");
    }
}
