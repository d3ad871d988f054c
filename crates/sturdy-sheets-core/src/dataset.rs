//! The tabular dataset produced by a successful read
//!
//! A [`Dataset`] is one sheet flattened to rows × named columns. Column
//! names come from the sheet's header row; everything below it is data,
//! returned exactly as the decoding engine produced it (no normalization,
//! no schema validation).

use std::fmt;

use crate::value::CellValue;

/// Rows × named columns read from a single sheet
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Dataset {
    sheet_name: String,
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

/// The inferred kind of a column, from scanning its values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ColumnKind {
    /// No non-empty values
    Empty,
    /// All numbers
    Number,
    /// All booleans
    Boolean,
    /// All strings (error values count as text)
    Text,
    /// All date/times
    DateTime,
    /// More than one kind present
    Mixed,
}

impl Dataset {
    /// Build a dataset from a raw cell grid.
    ///
    /// The first row with any non-empty cell becomes the header: its cells
    /// are rendered to column names, and a blank header cell gets the
    /// positional placeholder `column_N`. Rows above the header and fully
    /// empty trailing rows are dropped. Data rows are padded with
    /// [`CellValue::Empty`] to a uniform width.
    pub fn from_rows<S: Into<String>>(sheet_name: S, mut raw: Vec<Vec<CellValue>>) -> Self {
        // Drop fully empty trailing rows
        while raw.last().is_some_and(|r| r.iter().all(CellValue::is_empty)) {
            raw.pop();
        }

        // The header is the first row with content
        let header_idx = raw.iter().position(|r| !r.iter().all(CellValue::is_empty));
        let Some(header_idx) = header_idx else {
            return Dataset {
                sheet_name: sheet_name.into(),
                columns: Vec::new(),
                rows: Vec::new(),
            };
        };

        let width = raw[header_idx..].iter().map(Vec::len).max().unwrap_or(0);

        let mut columns = Vec::with_capacity(width);
        for i in 0..width {
            match raw[header_idx].get(i) {
                Some(cell) if !cell.is_empty() => columns.push(cell.to_string()),
                _ => columns.push(format!("column_{i}")),
            }
        }

        let rows = raw
            .drain(..)
            .skip(header_idx + 1)
            .map(|mut row| {
                row.resize(width, CellValue::Empty);
                row
            })
            .collect();

        Dataset {
            sheet_name: sheet_name.into(),
            columns,
            rows,
        }
    }

    /// Name of the sheet this dataset was read from
    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    /// Column names, in sheet order
    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    /// Number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Data rows (header excluded)
    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    /// Number of data rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Look up a value by zero-based data-row and column indices
    pub fn value(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Find a column's index by its exact name (first match wins)
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Infer the kind of the column at `col` by scanning its values
    pub fn column_kind(&self, col: usize) -> Option<ColumnKind> {
        if col >= self.columns.len() {
            return None;
        }

        let mut kind: Option<ColumnKind> = None;
        for row in &self.rows {
            let cell_kind = match row.get(col) {
                None | Some(CellValue::Empty) => continue,
                Some(CellValue::Number(_)) => ColumnKind::Number,
                Some(CellValue::Boolean(_)) => ColumnKind::Boolean,
                Some(CellValue::DateTime(_)) => ColumnKind::DateTime,
                Some(CellValue::String(_)) | Some(CellValue::Error(_)) => ColumnKind::Text,
            };
            match kind {
                None => kind = Some(cell_kind),
                Some(k) if k == cell_kind => {}
                Some(_) => return Some(ColumnKind::Mixed),
            }
        }

        Some(kind.unwrap_or(ColumnKind::Empty))
    }

    /// True when the dataset has no columns and no rows
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.rows.is_empty()
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}: {} rows x {} columns",
            self.sheet_name,
            self.rows.len(),
            self.columns.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn grid(cells: &[&[CellValue]]) -> Vec<Vec<CellValue>> {
        cells.iter().map(|r| r.to_vec()).collect()
    }

    #[test]
    fn test_header_promotion() {
        let ds = Dataset::from_rows(
            "Sheet1",
            grid(&[
                &["name".into(), "score".into()],
                &["alice".into(), 10.0.into()],
                &["bob".into(), 12.5.into()],
            ]),
        );

        assert_eq!(ds.column_names(), &["name", "score"]);
        assert_eq!(ds.row_count(), 2);
        assert_eq!(ds.value(1, 0), Some(&CellValue::string("bob")));
        assert_eq!(ds.value(1, 1), Some(&CellValue::Number(12.5)));
    }

    #[test]
    fn test_leading_blank_rows_skipped() {
        let ds = Dataset::from_rows(
            "S",
            grid(&[
                &[],
                &[CellValue::Empty, CellValue::Empty],
                &["a".into(), "b".into()],
                &[1.0.into(), 2.0.into()],
            ]),
        );
        assert_eq!(ds.column_names(), &["a", "b"]);
        assert_eq!(ds.row_count(), 1);
    }

    #[test]
    fn test_trailing_blank_rows_dropped() {
        let ds = Dataset::from_rows(
            "S",
            grid(&[
                &["a".into()],
                &[1.0.into()],
                &[CellValue::Empty],
                &[],
            ]),
        );
        assert_eq!(ds.row_count(), 1);
    }

    #[test]
    fn test_blank_header_cells_get_placeholders() {
        let ds = Dataset::from_rows(
            "S",
            grid(&[
                &["a".into(), CellValue::Empty],
                &[1.0.into(), 2.0.into(), 3.0.into()],
            ]),
        );
        assert_eq!(ds.column_names(), &["a", "column_1", "column_2"]);
        assert_eq!(ds.value(0, 2), Some(&CellValue::Number(3.0)));
    }

    #[test]
    fn test_ragged_rows_padded() {
        let ds = Dataset::from_rows(
            "S",
            grid(&[&["a".into(), "b".into()], &[1.0.into()]]),
        );
        assert_eq!(ds.value(0, 1), Some(&CellValue::Empty));
    }

    #[test]
    fn test_numeric_header_cells_rendered() {
        let ds = Dataset::from_rows(
            "S",
            grid(&[&[2024.0.into(), true.into()], &[1.0.into(), 2.0.into()]]),
        );
        assert_eq!(ds.column_names(), &["2024", "TRUE"]);
    }

    #[test]
    fn test_empty_sheet() {
        let ds = Dataset::from_rows("S", Vec::new());
        assert!(ds.is_empty());
        assert_eq!(ds.row_count(), 0);
        assert_eq!(ds.column_count(), 0);
    }

    #[test]
    fn test_column_index_first_match_wins() {
        let ds = Dataset::from_rows(
            "S",
            grid(&[
                &["x".into(), "x".into()],
                &[1.0.into(), 2.0.into()],
            ]),
        );
        // Duplicate names are kept as-is
        assert_eq!(ds.column_names(), &["x", "x"]);
        assert_eq!(ds.column_index("x"), Some(0));
    }

    #[test]
    fn test_column_kind_inference() {
        let ds = Dataset::from_rows(
            "S",
            grid(&[
                &["n".into(), "b".into(), "s".into(), "m".into(), "e".into()],
                &[1.0.into(), true.into(), "x".into(), 1.0.into(), CellValue::Empty],
                &[2.0.into(), false.into(), "y".into(), "z".into(), CellValue::Empty],
            ]),
        );
        assert_eq!(ds.column_kind(0), Some(ColumnKind::Number));
        assert_eq!(ds.column_kind(1), Some(ColumnKind::Boolean));
        assert_eq!(ds.column_kind(2), Some(ColumnKind::Text));
        assert_eq!(ds.column_kind(3), Some(ColumnKind::Mixed));
        assert_eq!(ds.column_kind(4), Some(ColumnKind::Empty));
        assert_eq!(ds.column_kind(5), None);
    }
}
