//! Ordered (zoo) series: one scalar or one fixed-width row per index key.
//!
//! Native-side construction and mutation leave the index in whatever order
//! the caller wrote it; the stable sort permutation is only applied when the
//! series is exported back to the host.

use std::fmt;

use serde::{Deserialize, Serialize};
use tf_calendar::{CalendarDate, Datetime};
use tf_index::SeriesIndex;
use tf_runtime::{ConversionContext, DiagnosticKind, DiagnosticLedger, FromHost, ToHost};
use tf_types::{FREQUENCY_ATTR, HostValue, HostVector, INDEX_ATTR};

use crate::FrameError;

pub const SERIES_CLASS: &str = "zoo";
pub const REGULAR_SERIES_CLASS: &str = "zooreg";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortState {
    Sorted,
    #[default]
    Unsorted,
}

/// Series values. Matrix rows are stored row-major, one row per index key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum SeriesData {
    Vector { values: Vec<f64> },
    Matrix { ncols: usize, values: Vec<f64> },
}

impl SeriesData {
    #[must_use]
    pub fn rows(&self) -> usize {
        match self {
            Self::Vector { values } => values.len(),
            Self::Matrix { ncols, values } => values.len() / (*ncols).max(1),
        }
    }

    #[must_use]
    pub fn width(&self) -> usize {
        match self {
            Self::Vector { .. } => 1,
            Self::Matrix { ncols, .. } => *ncols,
        }
    }

    const fn shape_name(&self) -> &'static str {
        match self {
            Self::Vector { .. } => "vector",
            Self::Matrix { .. } => "matrix",
        }
    }

    fn row(&self, row: usize) -> &[f64] {
        match self {
            Self::Vector { values } => std::slice::from_ref(&values[row]),
            Self::Matrix { ncols, values } => &values[row * ncols..(row + 1) * ncols],
        }
    }

    fn permuted(&self, perm: &[usize]) -> Self {
        match self {
            Self::Vector { values } => Self::Vector {
                values: perm.iter().map(|&i| values[i]).collect(),
            },
            Self::Matrix { ncols, .. } => Self::Matrix {
                ncols: *ncols,
                values: perm.iter().flat_map(|&i| self.row(i)).copied().collect(),
            },
        }
    }

    fn to_host(&self) -> HostValue {
        match self {
            Self::Vector { values } => HostValue::real(values.clone()),
            Self::Matrix { ncols, values } => {
                let nrow = self.rows();
                let column_major = (0..*ncols)
                    .flat_map(|j| (0..nrow).map(move |i| values[i * ncols + j]))
                    .collect();
                HostValue::real(column_major).with_dim(nrow, *ncols)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredSeries")]
pub struct OrderedSeries {
    data: SeriesData,
    index: SeriesIndex,
    frequency: f64,
    sort_state: SortState,
}

#[derive(Deserialize)]
struct StoredSeries {
    data: SeriesData,
    index: SeriesIndex,
    frequency: f64,
    sort_state: SortState,
}

impl TryFrom<StoredSeries> for OrderedSeries {
    type Error = FrameError;

    fn try_from(stored: StoredSeries) -> Result<Self, Self::Error> {
        let StoredSeries {
            data,
            index,
            frequency,
            sort_state,
        } = stored;
        if let SeriesData::Matrix { ncols, values } = &data {
            if *ncols == 0 {
                return Err(inconsistent("matrix rows have zero width"));
            }
            if values.len() % ncols != 0 {
                return Err(inconsistent(format!(
                    "{} matrix values do not fill rows of width {ncols}",
                    values.len()
                )));
            }
        }
        if data.rows() == 0 {
            return Err(inconsistent("series data is empty"));
        }
        if data.rows() != index.len() {
            return Err(inconsistent(format!(
                "{} rows for {} index keys",
                data.rows(),
                index.len()
            )));
        }
        let frequency = checked_frequency(&index, frequency, &mut DiagnosticLedger::new());
        Ok(Self {
            data,
            index,
            frequency,
            sort_state,
        })
    }
}

fn inconsistent(detail: impl Into<String>) -> FrameError {
    FrameError::InconsistentDimensions(detail.into())
}

fn invalid(detail: impl Into<String>) -> FrameError {
    FrameError::InvalidFormat(detail.into())
}

/// Keep `frequency` only when it is zero or validates against `index`.
fn checked_frequency(index: &SeriesIndex, frequency: f64, ledger: &mut DiagnosticLedger) -> f64 {
    if frequency == 0.0 || index.frequency_is_valid(frequency) {
        return frequency;
    }
    ledger.warn(
        DiagnosticKind::FrequencyDropped,
        SERIES_CLASS,
        format!("frequency {frequency} does not match index spacing; series treated as irregular"),
    );
    0.0
}

impl OrderedSeries {
    pub fn from_vector(
        data: Vec<f64>,
        index: impl Into<SeriesIndex>,
        frequency: f64,
    ) -> Result<Self, FrameError> {
        Self::from_vector_with_ledger(data, index, frequency, &mut DiagnosticLedger::new())
    }

    pub fn from_vector_with_ledger(
        data: Vec<f64>,
        index: impl Into<SeriesIndex>,
        frequency: f64,
        ledger: &mut DiagnosticLedger,
    ) -> Result<Self, FrameError> {
        let index = index.into();
        if data.is_empty() {
            return Err(inconsistent("series data is empty"));
        }
        if data.len() != index.len() {
            return Err(inconsistent(format!(
                "{} values for {} index keys",
                data.len(),
                index.len()
            )));
        }
        let frequency = checked_frequency(&index, frequency, ledger);
        Ok(Self {
            data: SeriesData::Vector { values: data },
            index,
            frequency,
            sort_state: SortState::Unsorted,
        })
    }

    pub fn from_matrix(
        rows: Vec<Vec<f64>>,
        index: impl Into<SeriesIndex>,
        frequency: f64,
    ) -> Result<Self, FrameError> {
        Self::from_matrix_with_ledger(rows, index, frequency, &mut DiagnosticLedger::new())
    }

    pub fn from_matrix_with_ledger(
        rows: Vec<Vec<f64>>,
        index: impl Into<SeriesIndex>,
        frequency: f64,
        ledger: &mut DiagnosticLedger,
    ) -> Result<Self, FrameError> {
        let index = index.into();
        let Some(first) = rows.first() else {
            return Err(inconsistent("series data is empty"));
        };
        let ncols = first.len();
        if ncols == 0 {
            return Err(inconsistent("matrix rows have zero width"));
        }
        if let Some(row) = rows.iter().position(|row| row.len() != ncols) {
            return Err(inconsistent(format!(
                "matrix row {row} has {} columns, expected {ncols}",
                rows[row].len()
            )));
        }
        if rows.len() != index.len() {
            return Err(inconsistent(format!(
                "{} rows for {} index keys",
                rows.len(),
                index.len()
            )));
        }
        let frequency = checked_frequency(&index, frequency, ledger);
        Ok(Self {
            data: SeriesData::Matrix {
                ncols,
                values: rows.into_iter().flatten().collect(),
            },
            index,
            frequency,
            sort_state: SortState::Unsorted,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    #[must_use]
    pub fn data(&self) -> &SeriesData {
        &self.data
    }

    #[must_use]
    pub fn data_width(&self) -> usize {
        self.data.width()
    }

    #[must_use]
    pub fn is_matrix(&self) -> bool {
        matches!(self.data, SeriesData::Matrix { .. })
    }

    /// True when a positive frequency is set and the index spacing, taken
    /// in chronological order, is a whole number of periods.
    #[must_use]
    pub fn is_regular(&self) -> bool {
        self.index.frequency_is_valid(self.frequency)
    }

    #[must_use]
    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    /// Not validated until export.
    pub fn set_frequency(&mut self, frequency: f64) {
        self.frequency = frequency;
    }

    #[must_use]
    pub fn sort_state(&self) -> SortState {
        self.sort_state
    }

    /// Output position `i` takes entry `perm[i]`.
    #[must_use]
    pub fn sort_permutation(&self) -> Vec<usize> {
        match self.sort_state {
            SortState::Sorted => (0..self.len()).collect(),
            SortState::Unsorted => self.index.sort_permutation(),
        }
    }

    #[must_use]
    pub fn index(&self) -> &SeriesIndex {
        &self.index
    }

    fn wrong_shape(&self, requested: &'static str) -> FrameError {
        FrameError::WrongShape {
            requested,
            actual: self.data.shape_name(),
        }
    }

    fn row_out_of_range(&self, index: usize) -> FrameError {
        FrameError::RowOutOfRange {
            index,
            len: self.len(),
        }
    }

    fn vector_slot(&self, row: usize) -> Result<usize, FrameError> {
        match &self.data {
            SeriesData::Vector { values } if row < values.len() => Ok(row),
            SeriesData::Vector { .. } => Err(self.row_out_of_range(row)),
            SeriesData::Matrix { .. } => Err(self.wrong_shape("vector")),
        }
    }

    fn matrix_slot(&self, row: usize, col: usize) -> Result<usize, FrameError> {
        match &self.data {
            SeriesData::Matrix { ncols, .. } if col >= *ncols => Err(FrameError::ColumnOutOfRange {
                index: col,
                len: *ncols,
            }),
            SeriesData::Matrix { ncols, .. } if row < self.data.rows() => Ok(row * ncols + col),
            SeriesData::Matrix { .. } => Err(self.row_out_of_range(row)),
            SeriesData::Vector { .. } => Err(self.wrong_shape("matrix")),
        }
    }

    fn values_mut(&mut self) -> &mut Vec<f64> {
        self.sort_state = SortState::Unsorted;
        match &mut self.data {
            SeriesData::Vector { values } | SeriesData::Matrix { values, .. } => values,
        }
    }

    fn values(&self) -> &[f64] {
        match &self.data {
            SeriesData::Vector { values } | SeriesData::Matrix { values, .. } => values,
        }
    }

    pub fn at(&self, row: usize) -> Result<f64, FrameError> {
        let slot = self.vector_slot(row)?;
        Ok(self.values()[slot])
    }

    pub fn at_matrix(&self, row: usize, col: usize) -> Result<f64, FrameError> {
        let slot = self.matrix_slot(row, col)?;
        Ok(self.values()[slot])
    }

    pub fn at_mut(&mut self, row: usize) -> Result<&mut f64, FrameError> {
        let slot = self.vector_slot(row)?;
        Ok(&mut self.values_mut()[slot])
    }

    pub fn at_matrix_mut(&mut self, row: usize, col: usize) -> Result<&mut f64, FrameError> {
        let slot = self.matrix_slot(row, col)?;
        Ok(&mut self.values_mut()[slot])
    }

    pub fn index_int_mut(&mut self, position: usize) -> Result<&mut i32, FrameError> {
        self.sort_state = SortState::Unsorted;
        Ok(self.index.int_mut(position)?)
    }

    pub fn index_double_mut(&mut self, position: usize) -> Result<&mut f64, FrameError> {
        self.sort_state = SortState::Unsorted;
        Ok(self.index.double_mut(position)?)
    }

    pub fn index_date_mut(&mut self, position: usize) -> Result<&mut CalendarDate, FrameError> {
        self.sort_state = SortState::Unsorted;
        Ok(self.index.date_mut(position)?)
    }

    pub fn index_datetime_mut(&mut self, position: usize) -> Result<&mut Datetime, FrameError> {
        self.sort_state = SortState::Unsorted;
        Ok(self.index.datetime_mut(position)?)
    }
}

fn decode_data(value: &HostValue) -> Result<SeriesData, FrameError> {
    if !matches!(value.payload(), HostVector::Real(_) | HostVector::Integer(_)) {
        return Err(invalid(format!(
            "series data must be numeric, found {}",
            value.host_type()
        )));
    }
    let values = value.to_f64_vec()?;
    match value.dim()? {
        None => Ok(SeriesData::Vector { values }),
        Some((_, 0)) => Err(invalid("matrix series has zero columns")),
        Some((nrow, ncol)) => {
            let row_major = (0..nrow)
                .flat_map(|i| (0..ncol).map(move |j| (i, j)))
                .map(|(i, j)| values[j * nrow + i])
                .collect();
            Ok(SeriesData::Matrix {
                ncols: ncol,
                values: row_major,
            })
        }
    }
}

impl FromHost for OrderedSeries {
    type Error = FrameError;

    /// Host series are taken to be sorted already.
    fn from_host(value: &HostValue, ctx: &mut ConversionContext) -> Result<Self, Self::Error> {
        let frequency = match value.primary_class() {
            Some(SERIES_CLASS) => 0.0,
            Some(REGULAR_SERIES_CLASS) => value
                .attr(FREQUENCY_ATTR)
                .ok_or_else(|| invalid("`zooreg` series without `frequency`"))?
                .scalar_f64()?,
            _ => return Err(invalid("class must start with `zoo` or `zooreg`")),
        };
        let data = decode_data(value)?;
        let index = SeriesIndex::from_host(
            value
                .attr(INDEX_ATTR)
                .ok_or_else(|| invalid("missing `index`"))?,
            ctx,
        )?;
        if data.rows() == 0 {
            return Err(invalid("series has no observations"));
        }
        if index.len() != data.rows() {
            return Err(invalid(format!(
                "{} index keys for {} rows",
                index.len(),
                data.rows()
            )));
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(rows = index.len(), width = data.width(), frequency, "imported zoo series");

        Ok(Self {
            data,
            index,
            frequency,
            sort_state: SortState::Sorted,
        })
    }
}

impl ToHost for OrderedSeries {
    type Error = FrameError;

    fn to_host(&self, ctx: &mut ConversionContext) -> Result<HostValue, Self::Error> {
        let perm = self.sort_permutation();
        let index = self.index.permuted(&perm);
        let regular = index.frequency_is_valid(self.frequency);
        if self.frequency != 0.0 && !regular {
            ctx.ledger.warn(
                DiagnosticKind::IrregularAtExport,
                SERIES_CLASS,
                format!(
                    "frequency {} does not match sorted index spacing; exported as plain zoo",
                    self.frequency
                ),
            );
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(rows = self.len(), width = self.data_width(), regular, "exporting zoo series");

        let host = self
            .data
            .permuted(&perm)
            .to_host()
            .with_attr(INDEX_ATTR, index.to_host(ctx)?);
        Ok(if regular {
            host.with_attr(FREQUENCY_ATTR, HostValue::real(vec![self.frequency]))
                .with_class([REGULAR_SERIES_CLASS, SERIES_CLASS])
        } else {
            host.with_class([SERIES_CLASS])
        })
    }
}

impl fmt::Display for OrderedSeries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.len() {
            let label = self.index.label(row).ok_or(fmt::Error)?;
            write!(f, "{label}")?;
            for value in self.data.row(row) {
                write!(f, " {value}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
