#![forbid(unsafe_code)]

mod series;
mod table;

use tf_columnar::ColumnError;
use tf_index::SeriesIndexError;
use tf_runtime::{BoundaryError, ErrorKind};
use tf_types::HostValueError;
use thiserror::Error;

pub use series::{OrderedSeries, REGULAR_SERIES_CLASS, SERIES_CLASS, SeriesData, SortState};
pub use table::{DATA_FRAME_CLASS, Table};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FrameError {
    #[error("invalid host value: {0}")]
    InvalidFormat(String),
    #[error("inconsistent dimensions: {0}")]
    InconsistentDimensions(String),
    #[error("no column named `{0}`")]
    UnknownColumn(String),
    #[error("column {index} out of range for {len} columns")]
    ColumnOutOfRange { index: usize, len: usize },
    #[error("position {index} out of range for series of length {len}")]
    RowOutOfRange { index: usize, len: usize },
    #[error("series data is a {actual}, not a {requested}")]
    WrongShape {
        requested: &'static str,
        actual: &'static str,
    },
    #[error(transparent)]
    Column(#[from] ColumnError),
    #[error(transparent)]
    Index(#[from] SeriesIndexError),
    #[error(transparent)]
    Host(#[from] HostValueError),
}

impl BoundaryError for FrameError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidFormat(_) | Self::Host(_) => ErrorKind::InvalidFormat,
            Self::InconsistentDimensions(_) => ErrorKind::InconsistentDimensions,
            Self::UnknownColumn(_) => ErrorKind::UnknownColumn,
            Self::ColumnOutOfRange { .. } | Self::RowOutOfRange { .. } => {
                ErrorKind::IndexOutOfRange
            }
            Self::WrongShape { .. } => ErrorKind::WrongShape,
            Self::Column(err) => err.kind(),
            Self::Index(err) => err.kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::FrameError;
    use tf_columnar::{ColumnError, ColumnType};
    use tf_runtime::{BoundaryError, ErrorKind, HostError};

    #[test]
    fn wrapped_errors_keep_their_kind() {
        let err = FrameError::from(ColumnError::UnsupportedAllocation(ColumnType::Bool));
        assert_eq!(err.kind(), ErrorKind::UnsupportedColumnType);

        let host = HostError::from_boundary(&FrameError::UnknownColumn("px".to_owned()));
        assert_eq!(host.kind, ErrorKind::UnknownColumn);
        assert_eq!(host.to_string(), "tagframe: no column named `px`");
    }
}
