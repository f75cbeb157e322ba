#![forbid(unsafe_code)]

//! Typed views of tagged host values.
//!
//! Import a host value with [`FromHost`], work on the native structure, and
//! hand it back with [`ToHost`]. Every conversion in one host call shares a
//! [`ConversionContext`]; wrap the entry point in [`guard_host_call`] so that
//! errors and panics reach the host as a [`HostError`].
//!
//! ```
//! use tagframe::{ConversionContext, FromHost, OrderedSeries, ToHost};
//!
//! let series = OrderedSeries::from_vector(vec![30.0, 10.0, 20.0], vec![3, 1, 2], 0.0)?;
//! let mut ctx = ConversionContext::default();
//! let host = series.to_host(&mut ctx)?;
//! assert_eq!(host.as_real()?, &[10.0, 20.0, 30.0]);
//!
//! let back = OrderedSeries::from_host(&host, &mut ctx)?;
//! assert_eq!(back.at(0)?, 10.0);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub use tf_calendar::{
    CalendarDate, CalendarError, Datetime, DayCountConvention, FebruaryAdjustment, HostDates,
    HostDatetimes, Month, SerialType, Weekday, diff_days, diff_days_by, is_leap_year, year_frac,
};
pub use tf_columnar::{
    Categorical, CategoricalError, Column, ColumnError, ColumnType, ColumnView, ColumnViewMut,
};
pub use tf_frame::{FrameError, OrderedSeries, SeriesData, SortState, Table};
pub use tf_index::{IndexType, SeriesIndex, SeriesIndexError};
pub use tf_runtime::{
    BoundaryError, ConversionContext, ConversionOptions, DateRounding, DatetimeClassOrder,
    Diagnostic, DiagnosticKind, DiagnosticLedger, ErrorKind, FromHost, HostError, ToHost,
    from_host_value, guard_host_call, numeric, to_host_value,
};
pub use tf_types::{HostType, HostValue, HostValueError, HostVector};
