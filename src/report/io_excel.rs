// Reading Excel workbooks (.xlsx) with calamine.

use calamine::{open_workbook, DataType, Reader, Xlsx};

use crate::report::{io_common::dedup_headers, *};

/// Reads the first worksheet, or the worksheet with the given name.
///
/// The first row is the header. Every cell is converted to text: whole numbers
/// lose their decimal part so that a rating typed as `5` reads as `"5"`.
pub fn read_excel_dataset(path: &str, worksheet: Option<&str>) -> ReportResult<Dataset> {
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;
    let wrange = match worksheet {
        Some(name) => workbook
            .worksheet_range(name)
            .context(MissingWorksheetSnafu { path, name })?
            .context(OpeningExcelSnafu { path })?,
        None => workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu { path })?
            .context(OpeningExcelSnafu { path })?,
    };

    let mut rows = wrange.rows();
    let header = rows.next().context(EmptyExcelSnafu { path })?;
    let headers: Vec<String> = header
        .iter()
        .map(|c| cell_text(c).unwrap_or_default())
        .collect();
    debug!("read_excel: header: {:?}", headers);
    let mut builder = DatasetBuilder::new(&dedup_headers(headers)).context(InvalidDatasetSnafu)?;
    for row in rows {
        // The range is rectangular: rows are never longer than the header.
        let cells: Vec<Cell> = row.iter().map(cell_text).collect();
        builder.add_row_cells(cells).context(InvalidDatasetSnafu)?;
    }
    Ok(builder.build())
}

pub fn cell_text(cell: &DataType) -> Cell {
    match cell {
        DataType::Empty => None,
        DataType::String(s) => Some(s.clone()),
        DataType::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => Some(format!("{}", *f as i64)),
        DataType::Float(f) => Some(f.to_string()),
        DataType::Int(i) => Some(i.to_string()),
        DataType::Bool(b) => Some(b.to_string()),
        DataType::DateTime(d) => Some(d.to_string()),
        other => {
            warn!("read_excel: ignoring cell {:?}", other);
            None
        }
    }
}
