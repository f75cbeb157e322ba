#![forbid(unsafe_code)]

pub mod numeric;

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tf_types::{HostValue, HostValueError};
use thiserror::Error;

/// Prefix carried by every message handed back to the host.
pub const HOST_MESSAGE_PREFIX: &str = "tagframe: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidFormat,
    TypeMismatch,
    IndexOutOfRange,
    InconsistentDimensions,
    UnsupportedColumnType,
    InvalidDate,
    InvalidRange,
    UnknownColumn,
    WrongShape,
    InvalidLabel,
    NoConvergence,
    RootsNotBracketed,
    Unknown,
}

impl ErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidFormat => "invalid_format",
            Self::TypeMismatch => "type_mismatch",
            Self::IndexOutOfRange => "index_out_of_range",
            Self::InconsistentDimensions => "inconsistent_dimensions",
            Self::UnsupportedColumnType => "unsupported_column_type",
            Self::InvalidDate => "invalid_date",
            Self::InvalidRange => "invalid_range",
            Self::UnknownColumn => "unknown_column",
            Self::WrongShape => "wrong_shape",
            Self::InvalidLabel => "invalid_label",
            Self::NoConvergence => "no_convergence",
            Self::RootsNotBracketed => "roots_not_bracketed",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can cross the host boundary report a stable kind.
pub trait BoundaryError: std::error::Error {
    fn kind(&self) -> ErrorKind;
}

impl BoundaryError for HostValueError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidFormat
    }
}

/// The error value handed to the host once a call has been guarded.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct HostError {
    pub kind: ErrorKind,
    pub message: String,
}

impl HostError {
    #[must_use]
    pub fn from_boundary<E: BoundaryError + ?Sized>(err: &E) -> Self {
        Self {
            kind: err.kind(),
            message: format!("{HOST_MESSAGE_PREFIX}{err}"),
        }
    }

    #[must_use]
    pub fn unknown() -> Self {
        Self {
            kind: ErrorKind::Unknown,
            message: format!("{HOST_MESSAGE_PREFIX}unknown reason"),
        }
    }
}

/// Run a host-facing entry point so that neither an error nor a panic
/// escapes as anything other than a [`HostError`].
pub fn guard_host_call<T, E, F>(call: F) -> Result<T, HostError>
where
    F: FnOnce() -> Result<T, E>,
    E: BoundaryError,
{
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(HostError::from_boundary(&err)),
        Err(_) => Err(HostError::unknown()),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatetimeClassOrder {
    #[default]
    PosixtFirst,
    PosixctFirst,
}

impl DatetimeClassOrder {
    #[must_use]
    pub const fn classes(self) -> [&'static str; 2] {
        match self {
            Self::PosixtFirst => ["POSIXt", "POSIXct"],
            Self::PosixctFirst => ["POSIXct", "POSIXt"],
        }
    }
}

/// How a fractional host date serial is reduced to a whole day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateRounding {
    #[default]
    TowardZero,
    Floor,
}

impl DateRounding {
    #[must_use]
    pub fn apply(self, serial: f64) -> f64 {
        match self {
            Self::TowardZero => serial.trunc(),
            Self::Floor => serial.floor(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionOptions {
    pub datetime_class: DatetimeClassOrder,
    pub date_rounding: DateRounding,
}

impl ConversionOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_datetime_class(mut self, order: DatetimeClassOrder) -> Self {
        self.datetime_class = order;
        self
    }

    #[must_use]
    pub fn with_date_rounding(mut self, rounding: DateRounding) -> Self {
        self.date_rounding = rounding;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A declared frequency did not match the index at construction and was cleared.
    FrequencyDropped,
    /// A declared frequency no longer matched the index at export.
    IrregularAtExport,
    /// A fractional host date serial was rounded to a whole day.
    FractionalDateSerial,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub ts_unix_ms: u64,
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub subject: String,
    pub detail: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticLedger {
    records: Vec<Diagnostic>,
}

impl DiagnosticLedger {
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    pub fn push(&mut self, record: Diagnostic) {
        self.records.push(record);
    }

    pub fn warn(
        &mut self,
        kind: DiagnosticKind,
        subject: impl Into<String>,
        detail: impl Into<String>,
    ) {
        self.record(Severity::Warning, kind, subject.into(), detail.into());
    }

    pub fn info(
        &mut self,
        kind: DiagnosticKind,
        subject: impl Into<String>,
        detail: impl Into<String>,
    ) {
        self.record(Severity::Info, kind, subject.into(), detail.into());
    }

    #[must_use]
    pub fn records(&self) -> &[Diagnostic] {
        &self.records
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.records
            .iter()
            .filter(|record| record.severity == Severity::Warning)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn record(&mut self, severity: Severity, kind: DiagnosticKind, subject: String, detail: String) {
        #[cfg(feature = "tracing")]
        match severity {
            Severity::Warning => tracing::warn!(?kind, subject = %subject, detail = %detail),
            Severity::Info => tracing::debug!(?kind, subject = %subject, detail = %detail),
        }
        self.records.push(Diagnostic {
            ts_unix_ms: now_unix_ms().unwrap_or_default(),
            severity,
            kind,
            subject,
            detail,
        });
    }
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("system clock is before UNIX_EPOCH")]
    ClockSkew,
}

fn now_unix_ms() -> Result<u64, RuntimeError> {
    let ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|_| RuntimeError::ClockSkew)?
        .as_millis();
    Ok(ms as u64)
}

/// Options plus the ledger every conversion in one host call writes to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionContext {
    pub options: ConversionOptions,
    pub ledger: DiagnosticLedger,
}

impl ConversionContext {
    #[must_use]
    pub fn new(options: ConversionOptions) -> Self {
        Self {
            options,
            ledger: DiagnosticLedger::new(),
        }
    }

    #[must_use]
    pub fn into_ledger(self) -> DiagnosticLedger {
        self.ledger
    }
}

pub trait FromHost: Sized {
    type Error: BoundaryError;

    fn from_host(value: &HostValue, ctx: &mut ConversionContext) -> Result<Self, Self::Error>;
}

pub trait ToHost {
    type Error: BoundaryError;

    fn to_host(&self, ctx: &mut ConversionContext) -> Result<HostValue, Self::Error>;
}

/// Import with default options and a scratch ledger.
pub fn from_host_value<T: FromHost>(value: &HostValue) -> Result<T, T::Error> {
    T::from_host(value, &mut ConversionContext::default())
}

/// Export with default options and a scratch ledger.
pub fn to_host_value<T: ToHost + ?Sized>(value: &T) -> Result<HostValue, T::Error> {
    value.to_host(&mut ConversionContext::default())
}

impl FromHost for f64 {
    type Error = HostValueError;

    fn from_host(value: &HostValue, _ctx: &mut ConversionContext) -> Result<Self, Self::Error> {
        value.scalar_f64()
    }
}

impl ToHost for f64 {
    type Error = HostValueError;

    fn to_host(&self, _ctx: &mut ConversionContext) -> Result<HostValue, Self::Error> {
        Ok(HostValue::real(vec![*self]))
    }
}

impl FromHost for i32 {
    type Error = HostValueError;

    fn from_host(value: &HostValue, _ctx: &mut ConversionContext) -> Result<Self, Self::Error> {
        match value.as_integer() {
            Ok([single]) => Ok(*single),
            Ok(other) => Err(HostValueError::NotScalar(other.len())),
            Err(_) => {
                let real = value.scalar_f64()?;
                Ok(real as i32)
            }
        }
    }
}

impl ToHost for i32 {
    type Error = HostValueError;

    fn to_host(&self, _ctx: &mut ConversionContext) -> Result<HostValue, Self::Error> {
        Ok(HostValue::integer(vec![*self]))
    }
}

impl FromHost for bool {
    type Error = HostValueError;

    fn from_host(value: &HostValue, _ctx: &mut ConversionContext) -> Result<Self, Self::Error> {
        match value.as_logical()? {
            [single] => Ok(*single),
            other => Err(HostValueError::NotScalar(other.len())),
        }
    }
}

impl ToHost for bool {
    type Error = HostValueError;

    fn to_host(&self, _ctx: &mut ConversionContext) -> Result<HostValue, Self::Error> {
        Ok(HostValue::logical(vec![*self]))
    }
}

impl FromHost for String {
    type Error = HostValueError;

    fn from_host(value: &HostValue, _ctx: &mut ConversionContext) -> Result<Self, Self::Error> {
        match value.as_character()? {
            [single] => Ok(single.clone()),
            other => Err(HostValueError::NotScalar(other.len())),
        }
    }
}

impl ToHost for String {
    type Error = HostValueError;

    fn to_host(&self, _ctx: &mut ConversionContext) -> Result<HostValue, Self::Error> {
        Ok(HostValue::character([self.as_str()]))
    }
}

impl FromHost for Vec<f64> {
    type Error = HostValueError;

    fn from_host(value: &HostValue, _ctx: &mut ConversionContext) -> Result<Self, Self::Error> {
        value.to_f64_vec()
    }
}

impl ToHost for Vec<f64> {
    type Error = HostValueError;

    fn to_host(&self, _ctx: &mut ConversionContext) -> Result<HostValue, Self::Error> {
        Ok(HostValue::real(self.clone()))
    }
}

impl FromHost for Vec<i32> {
    type Error = HostValueError;

    fn from_host(value: &HostValue, _ctx: &mut ConversionContext) -> Result<Self, Self::Error> {
        value.as_integer().map(<[i32]>::to_vec)
    }
}

impl ToHost for Vec<i32> {
    type Error = HostValueError;

    fn to_host(&self, _ctx: &mut ConversionContext) -> Result<HostValue, Self::Error> {
        Ok(HostValue::integer(self.clone()))
    }
}

impl FromHost for Vec<String> {
    type Error = HostValueError;

    fn from_host(value: &HostValue, _ctx: &mut ConversionContext) -> Result<Self, Self::Error> {
        value.as_character().map(<[String]>::to_vec)
    }
}

impl ToHost for Vec<String> {
    type Error = HostValueError;

    fn to_host(&self, _ctx: &mut ConversionContext) -> Result<HostValue, Self::Error> {
        Ok(HostValue::character(self.iter().map(String::as_str)))
    }
}

#[cfg(test)]
mod tests {
    use super::{
        BoundaryError, ConversionContext, ConversionOptions, DateRounding, DatetimeClassOrder,
        DiagnosticKind, DiagnosticLedger, ErrorKind, FromHost, HostError, Severity, ToHost,
        from_host_value, guard_host_call, to_host_value,
    };
    use tf_types::{HostValue, HostValueError};

    #[derive(Debug, thiserror::Error)]
    #[error("column `{0}` not found")]
    struct MissingColumn(String);

    impl BoundaryError for MissingColumn {
        fn kind(&self) -> ErrorKind {
            ErrorKind::UnknownColumn
        }
    }

    #[test]
    fn guard_prefixes_boundary_errors() {
        let err = guard_host_call(|| -> Result<(), MissingColumn> {
            Err(MissingColumn("price".to_owned()))
        })
        .expect_err("error must surface");
        assert_eq!(err.kind, ErrorKind::UnknownColumn);
        assert_eq!(err.message, "tagframe: column `price` not found");
    }

    #[test]
    fn guard_converts_panics_to_unknown() {
        let err = guard_host_call(|| -> Result<u8, MissingColumn> { panic!("boom") })
            .expect_err("panic must not unwind");
        assert_eq!(err, HostError::unknown());
        assert_eq!(err.message, "tagframe: unknown reason");
    }

    #[test]
    fn guard_passes_success_through() {
        let value = guard_host_call(|| -> Result<i32, MissingColumn> { Ok(7) }).expect("ok");
        assert_eq!(value, 7);
    }

    #[test]
    fn options_default_to_posixt_first_and_truncation() {
        let options = ConversionOptions::default();
        assert_eq!(options.datetime_class.classes(), ["POSIXt", "POSIXct"]);
        assert_eq!(options.date_rounding.apply(-1.5), -1.0);

        let custom = ConversionOptions::new()
            .with_datetime_class(DatetimeClassOrder::PosixctFirst)
            .with_date_rounding(DateRounding::Floor);
        assert_eq!(custom.datetime_class.classes(), ["POSIXct", "POSIXt"]);
        assert_eq!(custom.date_rounding.apply(-1.5), -2.0);
    }

    #[test]
    fn ledger_separates_warnings_from_info() {
        let mut ledger = DiagnosticLedger::new();
        ledger.info(DiagnosticKind::FractionalDateSerial, "date", "serial=1.5");
        ledger.warn(DiagnosticKind::FrequencyDropped, "series", "frequency=0.5");

        assert_eq!(ledger.len(), 2);
        let warnings: Vec<_> = ledger.warnings().collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, DiagnosticKind::FrequencyDropped);
        assert_eq!(ledger.records()[0].severity, Severity::Info);
    }

    #[test]
    fn scalar_conversions_require_length_one() {
        let mut ctx = ConversionContext::default();
        let err = f64::from_host(&HostValue::real(vec![1.0, 2.0]), &mut ctx)
            .expect_err("length two is not a scalar");
        assert_eq!(err, HostValueError::NotScalar(2));
        assert_eq!(err.kind(), ErrorKind::InvalidFormat);

        let n: i32 = from_host_value(&HostValue::real(vec![4.0])).expect("real coerces to int");
        assert_eq!(n, 4);
        let s: String = from_host_value(&HostValue::character(["x"])).expect("string");
        assert_eq!(s, "x");
    }

    #[test]
    fn vector_conversions_round_trip() {
        let values = vec![1.5, 2.5];
        let host = to_host_value(&values).expect("export");
        assert_eq!(host, HostValue::real(vec![1.5, 2.5]));

        let mut ctx = ConversionContext::default();
        let labels = vec!["a".to_owned(), "b".to_owned()];
        let exported = labels.to_host(&mut ctx).expect("export");
        let back = Vec::<String>::from_host(&exported, &mut ctx).expect("import");
        assert_eq!(back, labels);
    }

    #[test]
    fn error_kinds_serialize_snake_case() {
        let json = serde_json::to_string(&ErrorKind::InconsistentDimensions).expect("serialize");
        assert_eq!(json, "\"inconsistent_dimensions\"");
        assert_eq!(ErrorKind::WrongShape.to_string(), "wrong_shape");
    }
}
