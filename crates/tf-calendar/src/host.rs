//! Host encoding of dates (`"Date"` day serials) and datetimes (`POSIXct`
//! seconds).

use tf_runtime::{ConversionContext, ConversionOptions, DiagnosticKind, FromHost, ToHost};
use tf_types::{HostValue, HostValueError};

use crate::{CalendarDate, CalendarError, Datetime};

pub const DATE_CLASS: &str = "Date";
const DATETIME_CLASS_PREFIX: &str = "POSIX";

#[must_use]
pub fn has_date_class(value: &HostValue) -> bool {
    value.inherits(DATE_CLASS)
}

#[must_use]
pub fn has_datetime_class(value: &HostValue) -> bool {
    value
        .class()
        .is_some_and(|classes| classes.iter().any(|c| c.starts_with(DATETIME_CLASS_PREFIX)))
}

/// Decode a host date vector, rounding fractional serials per the context.
pub fn decode_host_dates(
    value: &HostValue,
    ctx: &mut ConversionContext,
) -> Result<Vec<CalendarDate>, CalendarError> {
    value
        .to_f64_vec()?
        .into_iter()
        .map(|serial| decode_serial(serial, ctx))
        .collect()
}

fn decode_serial(serial: f64, ctx: &mut ConversionContext) -> Result<CalendarDate, CalendarError> {
    if !serial.is_finite() {
        return Err(CalendarError::NonFiniteSerial(serial));
    }
    let rounded = ctx.options.date_rounding.apply(serial);
    if rounded != serial {
        ctx.ledger.info(
            DiagnosticKind::FractionalDateSerial,
            "date",
            format!("serial={serial} rounded={rounded}"),
        );
    }
    if rounded.abs() > f64::from(i32::MAX) {
        return Err(CalendarError::JdnOutOfRange);
    }
    CalendarDate::from_host_serial(rounded as i32)
}

#[must_use]
pub fn encode_host_dates(dates: &[CalendarDate]) -> HostValue {
    HostValue::real(
        dates
            .iter()
            .map(|d| f64::from(d.host_serial()))
            .collect(),
    )
    .with_class([DATE_CLASS])
}

pub fn decode_host_datetimes(value: &HostValue) -> Result<Vec<Datetime>, HostValueError> {
    Ok(value
        .to_f64_vec()?
        .into_iter()
        .map(Datetime::from_host_seconds)
        .collect())
}

#[must_use]
pub fn encode_host_datetimes(datetimes: &[Datetime], options: &ConversionOptions) -> HostValue {
    HostValue::real(datetimes.iter().map(|dt| dt.seconds()).collect())
        .with_class(options.datetime_class.classes())
}

/// Host `Date` vector; the owned form of a `"Date"`-classed numeric vector.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HostDates(pub Vec<CalendarDate>);

/// Host `POSIXct` vector.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HostDatetimes(pub Vec<Datetime>);

impl HostDates {
    #[must_use]
    pub fn into_inner(self) -> Vec<CalendarDate> {
        self.0
    }
}

impl HostDatetimes {
    #[must_use]
    pub fn into_inner(self) -> Vec<Datetime> {
        self.0
    }
}

impl From<Vec<CalendarDate>> for HostDates {
    fn from(dates: Vec<CalendarDate>) -> Self {
        Self(dates)
    }
}

impl From<Vec<Datetime>> for HostDatetimes {
    fn from(datetimes: Vec<Datetime>) -> Self {
        Self(datetimes)
    }
}

fn require_date_class(value: &HostValue) -> Result<(), CalendarError> {
    if has_date_class(value) {
        Ok(())
    } else {
        Err(CalendarError::MissingClass(DATE_CLASS))
    }
}

fn require_datetime_class(value: &HostValue) -> Result<(), CalendarError> {
    if has_datetime_class(value) {
        Ok(())
    } else {
        Err(CalendarError::MissingClass("POSIXct"))
    }
}

impl FromHost for CalendarDate {
    type Error = CalendarError;

    fn from_host(value: &HostValue, ctx: &mut ConversionContext) -> Result<Self, Self::Error> {
        require_date_class(value)?;
        let dates = decode_host_dates(value, ctx)?;
        match dates.as_slice() {
            [single] => Ok(*single),
            other => Err(HostValueError::NotScalar(other.len()).into()),
        }
    }
}

impl ToHost for CalendarDate {
    type Error = CalendarError;

    fn to_host(&self, _ctx: &mut ConversionContext) -> Result<HostValue, Self::Error> {
        Ok(encode_host_dates(std::slice::from_ref(self)))
    }
}

impl FromHost for HostDates {
    type Error = CalendarError;

    fn from_host(value: &HostValue, ctx: &mut ConversionContext) -> Result<Self, Self::Error> {
        require_date_class(value)?;
        decode_host_dates(value, ctx).map(Self)
    }
}

impl ToHost for HostDates {
    type Error = CalendarError;

    fn to_host(&self, _ctx: &mut ConversionContext) -> Result<HostValue, Self::Error> {
        Ok(encode_host_dates(&self.0))
    }
}

impl FromHost for Datetime {
    type Error = CalendarError;

    fn from_host(value: &HostValue, _ctx: &mut ConversionContext) -> Result<Self, Self::Error> {
        require_datetime_class(value)?;
        let datetimes = decode_host_datetimes(value)?;
        match datetimes.as_slice() {
            [single] => Ok(*single),
            other => Err(HostValueError::NotScalar(other.len()).into()),
        }
    }
}

impl ToHost for Datetime {
    type Error = CalendarError;

    fn to_host(&self, ctx: &mut ConversionContext) -> Result<HostValue, Self::Error> {
        Ok(encode_host_datetimes(
            std::slice::from_ref(self),
            &ctx.options,
        ))
    }
}

impl FromHost for HostDatetimes {
    type Error = CalendarError;

    fn from_host(value: &HostValue, _ctx: &mut ConversionContext) -> Result<Self, Self::Error> {
        require_datetime_class(value)?;
        Ok(Self(decode_host_datetimes(value)?))
    }
}

impl ToHost for HostDatetimes {
    type Error = CalendarError;

    fn to_host(&self, ctx: &mut ConversionContext) -> Result<HostValue, Self::Error> {
        Ok(encode_host_datetimes(&self.0, &ctx.options))
    }
}
