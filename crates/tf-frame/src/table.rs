use std::fmt;

use serde::{Deserialize, Serialize};
use tf_columnar::{Column, ColumnType, ColumnView, ColumnViewMut};
use tf_runtime::{ConversionContext, FromHost, ToHost};
use tf_types::{HostValue, HostVector, NA_INTEGER, NAMES_ATTR, ROW_NAMES_ATTR};

use crate::FrameError;

pub const DATA_FRAME_CLASS: &str = "data.frame";

/// A host data frame: named, equal-length tagged columns plus row names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredTable")]
pub struct Table {
    row_names: Vec<String>,
    col_names: Vec<String>,
    columns: Vec<Column>,
}

#[derive(Deserialize)]
struct StoredTable {
    row_names: Vec<String>,
    col_names: Vec<String>,
    columns: Vec<Column>,
}

impl TryFrom<StoredTable> for Table {
    type Error = FrameError;

    fn try_from(stored: StoredTable) -> Result<Self, Self::Error> {
        Self::from_columns(stored.row_names, stored.col_names, stored.columns)
    }
}

fn inconsistent(detail: impl Into<String>) -> FrameError {
    FrameError::InconsistentDimensions(detail.into())
}

fn invalid(detail: impl Into<String>) -> FrameError {
    FrameError::InvalidFormat(detail.into())
}

impl Table {
    pub fn from_columns(
        row_names: Vec<String>,
        col_names: Vec<String>,
        columns: Vec<Column>,
    ) -> Result<Self, FrameError> {
        if columns.is_empty() {
            return Err(inconsistent("a table needs at least one column"));
        }
        if col_names.len() != columns.len() {
            return Err(inconsistent(format!(
                "{} column names for {} columns",
                col_names.len(),
                columns.len()
            )));
        }
        for (name, column) in col_names.iter().zip(&columns) {
            if column.is_empty() {
                return Err(inconsistent(format!("column `{name}` is empty")));
            }
            if column.len() != row_names.len() {
                return Err(inconsistent(format!(
                    "column `{name}` has {} rows, expected {}",
                    column.len(),
                    row_names.len()
                )));
            }
        }
        Ok(Self {
            row_names,
            col_names,
            columns,
        })
    }

    /// Deep-copies borrowed columns.
    pub fn from_views(
        row_names: Vec<String>,
        col_names: Vec<String>,
        views: &[ColumnView<'_>],
    ) -> Result<Self, FrameError> {
        let columns = views.iter().map(ColumnView::to_owned_column).collect();
        Self::from_columns(row_names, col_names, columns)
    }

    /// Pre-allocates default-filled columns to be written through
    /// [`Table::column_mut`].
    pub fn from_column_types(
        row_names: Vec<String>,
        col_names: Vec<String>,
        types: &[ColumnType],
    ) -> Result<Self, FrameError> {
        let rows = row_names.len();
        let columns = types
            .iter()
            .map(|&column_type| Column::allocate(column_type, rows))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_columns(row_names, col_names, columns)
    }

    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.row_names.len()
    }

    #[must_use]
    pub fn num_cols(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn row_names(&self) -> &[String] {
        &self.row_names
    }

    #[must_use]
    pub fn col_names(&self) -> &[String] {
        &self.col_names
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    fn position(&self, name: &str) -> Result<usize, FrameError> {
        self.col_names
            .iter()
            .position(|candidate| candidate == name)
            .ok_or_else(|| FrameError::UnknownColumn(name.to_owned()))
    }

    pub fn column(&self, name: &str) -> Result<&Column, FrameError> {
        let position = self.position(name)?;
        Ok(&self.columns[position])
    }

    /// Cell-level write access; the column keeps its length and tag.
    pub fn column_mut(&mut self, name: &str) -> Result<ColumnViewMut<'_>, FrameError> {
        let position = self.position(name)?;
        Ok(self.columns[position].view_mut())
    }

    pub fn column_at(&self, index: usize) -> Result<&Column, FrameError> {
        let len = self.columns.len();
        self.columns
            .get(index)
            .ok_or(FrameError::ColumnOutOfRange { index, len })
    }

    pub fn column_at_mut(&mut self, index: usize) -> Result<ColumnViewMut<'_>, FrameError> {
        let len = self.columns.len();
        self.columns
            .get_mut(index)
            .map(Column::view_mut)
            .ok_or(FrameError::ColumnOutOfRange { index, len })
    }
}

fn decode_row_names(value: &HostValue) -> Result<Vec<String>, FrameError> {
    match value.payload() {
        HostVector::Integer(v) => match v.as_slice() {
            [NA_INTEGER, n] => Ok((1..=n.unsigned_abs()).map(|i| i.to_string()).collect()),
            _ => Ok(v.iter().map(ToString::to_string).collect()),
        },
        HostVector::Real(v) => Ok(v.iter().map(ToString::to_string).collect()),
        HostVector::Character(v) => Ok(v.clone()),
        other => Err(invalid(format!(
            "row names must be integer, numeric or character, found {}",
            other.host_type()
        ))),
    }
}

impl FromHost for Table {
    type Error = FrameError;

    fn from_host(value: &HostValue, ctx: &mut ConversionContext) -> Result<Self, Self::Error> {
        if !value.inherits(DATA_FRAME_CLASS) {
            return Err(invalid("missing class `data.frame`"));
        }
        let HostVector::List(items) = value.payload() else {
            return Err(invalid(format!(
                "data.frame payload must be a list, found {}",
                value.host_type()
            )));
        };
        let Some(first) = items.first() else {
            return Err(invalid("data.frame has no columns"));
        };
        let rows = first.len();
        if rows == 0 {
            return Err(invalid("data.frame has no rows"));
        }

        let col_names = value
            .attr(NAMES_ATTR)
            .ok_or_else(|| invalid("missing `names`"))?
            .as_character()?
            .to_vec();
        if col_names.len() != items.len() {
            return Err(invalid(format!(
                "{} names for {} columns",
                col_names.len(),
                items.len()
            )));
        }

        let row_names = decode_row_names(
            value
                .attr(ROW_NAMES_ATTR)
                .ok_or_else(|| invalid("missing `row.names`"))?,
        )?;
        if row_names.len() != rows {
            return Err(invalid(format!(
                "{} row names for {rows} rows",
                row_names.len()
            )));
        }

        let mut columns = Vec::with_capacity(items.len());
        for (name, item) in col_names.iter().zip(items) {
            if item.len() != rows {
                return Err(invalid(format!(
                    "column `{name}` has {} rows, expected {rows}",
                    item.len()
                )));
            }
            columns.push(Column::from_host(item, ctx)?);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(rows, cols = columns.len(), "imported data.frame");

        Ok(Self {
            row_names,
            col_names,
            columns,
        })
    }
}

impl ToHost for Table {
    type Error = FrameError;

    fn to_host(&self, ctx: &mut ConversionContext) -> Result<HostValue, Self::Error> {
        let items = self
            .columns
            .iter()
            .map(|column| column.to_host(ctx))
            .collect::<Result<Vec<_>, _>>()?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            rows = self.num_rows(),
            cols = self.num_cols(),
            "exported data.frame"
        );

        Ok(HostValue::list(items)
            .with_attr(
                NAMES_ATTR,
                HostValue::character(self.col_names.iter().map(String::as_str)),
            )
            .with_attr(
                ROW_NAMES_ATTR,
                HostValue::character(self.row_names.iter().map(String::as_str)),
            )
            .with_class([DATA_FRAME_CLASS]))
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut grid = Vec::with_capacity(self.num_cols() + 1);

        let mut labels = Vec::with_capacity(self.num_rows() + 1);
        labels.push(String::new());
        labels.extend(self.row_names.iter().cloned());
        grid.push(labels);

        for (name, column) in self.col_names.iter().zip(&self.columns) {
            let view = column.view();
            let mut cells = Vec::with_capacity(self.num_rows() + 1);
            cells.push(name.clone());
            for row in 0..self.num_rows() {
                cells.push(view.cell_text(row).map_err(|_| fmt::Error)?);
            }
            grid.push(cells);
        }

        let widths: Vec<usize> = grid
            .iter()
            .map(|cells| cells.iter().map(|c| c.chars().count()).max().unwrap_or(0))
            .collect();

        for row in 0..=self.num_rows() {
            for (column, cells) in grid.iter().enumerate() {
                if column > 0 {
                    f.write_str("  ")?;
                }
                if column == 0 {
                    write!(f, "{:<width$}", cells[row], width = widths[column])?;
                } else {
                    write!(f, "{:>width$}", cells[row], width = widths[column])?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{DATA_FRAME_CLASS, Table};
    use crate::FrameError;
    use tf_calendar::CalendarDate;
    use tf_columnar::{Categorical, Column, ColumnType, ColumnView};
    use tf_runtime::{BoundaryError, ErrorKind, from_host_value, to_host_value};
    use tf_types::{HostValue, NA_INTEGER};

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|&v| v.to_owned()).collect()
    }

    fn int_factor_frame() -> HostValue {
        let factor = HostValue::integer(vec![2, 1, 2])
            .with_attr("levels", HostValue::character(["lo", "hi"]))
            .with_class(["factor"]);
        HostValue::list(vec![HostValue::integer(vec![7, 8, 9]), factor])
            .with_attr("names", HostValue::character(["qty", "grade"]))
            .with_attr("row.names", HostValue::character(["1", "2", "3"]))
            .with_class([DATA_FRAME_CLASS])
    }

    #[test]
    fn empty_or_mismatched_columns_are_rejected() {
        let err = Table::from_columns(vec![], vec![], vec![]).expect_err("no columns");
        assert_eq!(err.kind(), ErrorKind::InconsistentDimensions);

        let err = Table::from_columns(
            names(&["r1", "r2"]),
            names(&["a"]),
            vec![Column::from(vec![1.0])],
        )
        .expect_err("short column");
        assert_eq!(err.kind(), ErrorKind::InconsistentDimensions);

        let err = Table::from_columns(
            names(&["r1"]),
            names(&["a", "b"]),
            vec![Column::from(vec![1.0])],
        )
        .expect_err("extra name");
        assert_eq!(err.kind(), ErrorKind::InconsistentDimensions);

        let err = Table::from_columns(vec![], names(&["a"]), vec![Column::from(Vec::<f64>::new())])
            .expect_err("empty column");
        assert_eq!(err.kind(), ErrorKind::InconsistentDimensions);
    }

    #[test]
    fn lookup_by_name_and_position() {
        let mut table = Table::from_columns(
            names(&["r1", "r2"]),
            names(&["px", "sym"]),
            vec![
                Column::from(vec![1.5, 2.5]),
                Column::from(vec!["a".to_owned(), "b".to_owned()]),
            ],
        )
        .expect("table");
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.num_cols(), 2);
        assert_eq!(table.column("sym").expect("sym").get_string(1).expect("row"), "b");
        assert_eq!(table.column_at(0).expect("px").get_double(0).expect("row"), 1.5);

        *table
            .column_mut("px")
            .expect("px")
            .double_mut(1)
            .expect("row") = 9.0;
        assert_eq!(table.column_at(0).expect("px").get_double(1).expect("row"), 9.0);

        assert_eq!(
            table.column("missing").expect_err("unknown"),
            FrameError::UnknownColumn("missing".to_owned())
        );
        assert_eq!(
            table.column_at_mut(2).expect_err("two columns").kind(),
            ErrorKind::IndexOutOfRange
        );
    }

    #[test]
    fn preallocated_tables_fill_through_column_mut() {
        let mut table = Table::from_column_types(
            names(&["a", "b"]),
            names(&["n", "when"]),
            &[ColumnType::Int, ColumnType::Date],
        )
        .expect("allocated");
        *table.column_mut("n").expect("n").int_mut(0).expect("row") = 4;
        let date = CalendarDate::from_ymd(4, 15, 2010).expect("valid");
        *table.column_at_mut(1).expect("when").date_mut(1).expect("row") = date;
        assert_eq!(table.column("n").expect("n").get_int(0).expect("row"), 4);
        assert_eq!(table.column("when").expect("when").get_date(1).expect("row"), date);

        let err = Table::from_column_types(names(&["a"]), names(&["flag"]), &[ColumnType::Bool])
            .expect_err("bool has no default");
        assert_eq!(err.kind(), ErrorKind::UnsupportedColumnType);
    }

    #[test]
    fn from_views_copies_caller_storage() {
        let mut values = vec![1, 2];
        let table = Table::from_views(
            names(&["x", "y"]),
            names(&["v"]),
            &[ColumnView::from(values.as_slice())],
        )
        .expect("table");
        values[0] = 100;
        assert_eq!(table.column("v").expect("v").get_int(0).expect("row"), 1);
    }

    #[test]
    fn int_and_factor_frame_round_trips_exactly() {
        let host = int_factor_frame();
        let table: Table = from_host_value(&host).expect("import");
        assert_eq!(table.column("grade").expect("grade").get_factor_label(0).expect("row"), "hi");
        assert_eq!(to_host_value(&table).expect("export"), host);
    }

    #[test]
    fn written_cells_keep_column_shape() {
        let mut table =
            Table::from_column_types(names(&["a", "b"]), names(&["n"]), &[ColumnType::Int])
                .expect("allocated");
        let mut view = table.column_mut("n").expect("n");
        assert_eq!(view.len(), 2);
        assert_eq!(view.column_type(), ColumnType::Int);
        assert_eq!(
            view.bool_mut(0).expect_err("int column").kind(),
            ErrorKind::TypeMismatch
        );
        assert_eq!(
            view.int_mut(2).expect_err("two rows").kind(),
            ErrorKind::IndexOutOfRange
        );
        *view.int_mut(1).expect("row") = 5;

        let column = table.column("n").expect("n");
        assert_eq!(column.column_type(), ColumnType::Int);
        assert_eq!(column.len(), table.num_rows());
        assert_eq!(table.to_string(), "   n\na  0\nb  5\n");
    }

    #[test]
    fn compact_row_names_expand() {
        let host = HostValue::list(vec![HostValue::real(vec![0.5, 1.5])])
            .with_attr("names", HostValue::character(["x"]))
            .with_attr("row.names", HostValue::integer(vec![NA_INTEGER, -2]))
            .with_class([DATA_FRAME_CLASS]);
        let table: Table = from_host_value(&host).expect("import");
        assert_eq!(table.row_names(), &["1", "2"]);
    }

    #[test]
    fn integer_row_names_are_stringified() {
        let host = HostValue::list(vec![HostValue::real(vec![0.5, 1.5])])
            .with_attr("names", HostValue::character(["x"]))
            .with_attr("row.names", HostValue::integer(vec![10, 20]))
            .with_class([DATA_FRAME_CLASS]);
        let table: Table = from_host_value(&host).expect("import");
        assert_eq!(table.row_names(), &["10", "20"]);

        let exported = to_host_value(&table).expect("export");
        assert_eq!(
            exported.attr("row.names"),
            Some(&HostValue::character(["10", "20"]))
        );
    }

    #[test]
    fn real_row_names_are_stringified() {
        let host = HostValue::list(vec![HostValue::integer(vec![3, 4])])
            .with_attr("names", HostValue::character(["x"]))
            .with_attr("row.names", HostValue::real(vec![1.0, 2.0]))
            .with_class([DATA_FRAME_CLASS]);
        let table: Table = from_host_value(&host).expect("import");
        assert_eq!(table.row_names(), &["1", "2"]);
    }

    #[test]
    fn host_frames_are_validated() {
        let no_class = int_factor_frame().with_class(["list"]);
        assert_eq!(
            from_host_value::<Table>(&no_class).expect_err("no class").kind(),
            ErrorKind::InvalidFormat
        );

        let ragged = HostValue::list(vec![HostValue::real(vec![1.0]), HostValue::real(vec![])])
            .with_attr("names", HostValue::character(["a", "b"]))
            .with_attr("row.names", HostValue::character(["1"]))
            .with_class([DATA_FRAME_CLASS]);
        assert_eq!(
            from_host_value::<Table>(&ragged).expect_err("ragged").kind(),
            ErrorKind::InvalidFormat
        );

        let nested = HostValue::list(vec![HostValue::list(vec![HostValue::null()])])
            .with_attr("names", HostValue::character(["a"]))
            .with_attr("row.names", HostValue::character(["1"]))
            .with_class([DATA_FRAME_CLASS]);
        assert_eq!(
            from_host_value::<Table>(&nested).expect_err("list column").kind(),
            ErrorKind::UnsupportedColumnType
        );
    }

    #[test]
    fn display_renders_a_grid() {
        let table = Table::from_columns(
            names(&["a", "b"]),
            names(&["n", "grade"]),
            vec![
                Column::from(vec![1, 22]),
                Column::from(Categorical::from_labels(["x", "y"]).expect("factor")),
            ],
        )
        .expect("table");
        assert_eq!(table.to_string(), "    n  grade\na   1      x\nb  22      y\n");
    }

    #[test]
    fn serde_keeps_column_tags() {
        let table = Table::from_columns(names(&["r"]), names(&["b"]), vec![Column::from(vec![true])])
            .expect("table");
        let json = serde_json::to_string(&table).expect("serialize");
        assert!(json.contains(r#""kind":"bool""#));
        let back: Table = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, table);
    }

    #[test]
    fn deserialization_checks_table_shape() {
        let empty = r#"{"row_names":[],"col_names":[],"columns":[]}"#;
        assert!(serde_json::from_str::<Table>(empty).is_err());

        let short = r#"{"row_names":["a","b"],"col_names":["n"],"columns":[{"kind":"int","values":[1]}]}"#;
        let err = serde_json::from_str::<Table>(short).expect_err("one row for two names");
        assert!(err.to_string().contains("inconsistent dimensions"), "{err}");
    }
}
