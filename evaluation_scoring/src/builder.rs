use crate::config::{Cell, DatasetError};

use std::collections::HashSet;
use std::ops::Range;

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Column {
    pub name: String,
    pub cells: Vec<Cell>,
}

/// A table of responses: named columns of equal length, one row per respondent.
///
/// Column names are unique. Use `DatasetBuilder` to create one.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Dataset {
    pub(crate) columns: Vec<Column>,
    pub(crate) num_rows: usize,
}

impl Dataset {
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_at(&self, idx: usize) -> Option<&Column> {
        self.columns.get(idx)
    }

    /// The columns of a positional range, clamped to the existing columns.
    pub fn columns_in(&self, range: &Range<usize>) -> &[Column] {
        let end = range.end.min(self.columns.len());
        let start = range.start.min(end);
        &self.columns[start..end]
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// The cells of one row, in column order.
    pub fn row(&self, idx: usize) -> Option<Vec<&Cell>> {
        if idx >= self.num_rows {
            return None;
        }
        Some(self.columns.iter().map(|c| &c.cells[idx]).collect())
    }
}

/// A builder for datasets, filled row by row.
///
/// ```
/// use evaluation_scoring::DatasetBuilder;
/// # use evaluation_scoring::DatasetError;
///
/// let mut builder = DatasetBuilder::new(&["Timestamp".to_string(), "Clarity".to_string()])?;
/// builder.add_row(&["2025-01-01".to_string(), "Clarity: Good".to_string()])?;
/// builder.add_row(&["2025-01-02".to_string()])?;
/// let dataset = builder.build();
/// assert_eq!(dataset.num_rows(), 2);
///
/// # Ok::<(), DatasetError>(())
/// ```
pub struct DatasetBuilder {
    _columns: Vec<Column>,
    _num_rows: usize,
}

impl DatasetBuilder {
    pub fn new(headers: &[String]) -> Result<DatasetBuilder, DatasetError> {
        if headers.is_empty() {
            return Err(DatasetError::EmptyHeader);
        }
        let mut seen: HashSet<&str> = HashSet::new();
        for h in headers.iter() {
            if !seen.insert(h.as_str()) {
                return Err(DatasetError::DuplicateColumn(h.clone()));
            }
        }
        Ok(DatasetBuilder {
            _columns: headers
                .iter()
                .map(|name| Column {
                    name: name.clone(),
                    cells: Vec::new(),
                })
                .collect(),
            _num_rows: 0,
        })
    }

    /// Adds a row of text cells. Empty strings are stored as missing cells,
    /// and short rows are padded with missing cells.
    pub fn add_row(&mut self, cells: &[String]) -> Result<(), DatasetError> {
        let row: Vec<Cell> = cells
            .iter()
            .map(|s| if s.is_empty() { None } else { Some(s.clone()) })
            .collect();
        self.add_row_cells(row)
    }

    pub fn add_row_cells(&mut self, cells: Vec<Cell>) -> Result<(), DatasetError> {
        if cells.len() > self._columns.len() {
            return Err(DatasetError::RowTooLong {
                row: self._num_rows + 1,
                len: cells.len(),
                expected: self._columns.len(),
            });
        }
        let mut it = cells.into_iter();
        for col in self._columns.iter_mut() {
            let cell = match it.next() {
                Some(Some(s)) if s.is_empty() => None,
                Some(c) => c,
                None => None,
            };
            col.cells.push(cell);
        }
        self._num_rows += 1;
        Ok(())
    }

    pub fn build(self) -> Dataset {
        Dataset {
            columns: self._columns,
            num_rows: self._num_rows,
        }
    }
}

/// Builds a dataset from columns given as lists of text values.
///
/// Handy for small, hand-written tables. Empty strings become missing cells.
pub fn dataset_from_columns(columns: &[(&str, Vec<&str>)]) -> Result<Dataset, DatasetError> {
    let headers: Vec<String> = columns.iter().map(|(n, _)| n.to_string()).collect();
    let num_rows = columns.iter().map(|(_, v)| v.len()).max().unwrap_or(0);
    let mut builder = DatasetBuilder::new(&headers)?;
    for idx in 0..num_rows {
        let row: Vec<Cell> = columns
            .iter()
            .map(|(_, v)| v.get(idx).map(|s| s.to_string()))
            .collect();
        builder.add_row_cells(row)?;
    }
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_headers_are_rejected() {
        let res = DatasetBuilder::new(&["a".to_string(), "a".to_string()]);
        assert_eq!(
            res.err(),
            Some(DatasetError::DuplicateColumn("a".to_string()))
        );
    }

    #[test]
    fn short_rows_are_padded_and_long_rows_rejected() {
        let mut b = DatasetBuilder::new(&["a".to_string(), "b".to_string()]).unwrap();
        b.add_row(&["x".to_string()]).unwrap();
        let err = b
            .add_row(&["x".to_string(), "y".to_string(), "z".to_string()])
            .unwrap_err();
        assert_eq!(
            err,
            DatasetError::RowTooLong {
                row: 2,
                len: 3,
                expected: 2
            }
        );
        let ds = b.build();
        assert_eq!(ds.num_rows(), 1);
        assert_eq!(ds.column("b").unwrap().cells, vec![None]);
    }

    #[test]
    fn columns_in_is_clamped() {
        let ds = dataset_from_columns(&[("a", vec!["1"]), ("b", vec!["2"]), ("c", vec!["3"])]).unwrap();
        let names: Vec<&str> = ds.columns_in(&(1..9)).iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["b", "c"]);
        assert!(ds.columns_in(&(5..9)).is_empty());
    }

    #[test]
    fn empty_strings_become_missing() {
        let ds = dataset_from_columns(&[("a", vec!["", "x"])]).unwrap();
        assert_eq!(ds.column_at(0).unwrap().cells, vec![None, Some("x".to_string())]);
        assert_eq!(ds.row(1).unwrap(), vec![&Some("x".to_string())]);
    }
}
