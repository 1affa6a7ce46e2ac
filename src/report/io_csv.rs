// Primitives for reading CSV files.

use std::io::Read;

use crate::report::{io_common::dedup_headers, *};

/// Reads a CSV file with a header row.
pub fn read_csv_dataset(path: &str) -> ReportResult<Dataset> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(OpeningCsvSnafu { path })?;
    read_records(rdr, &io_common::simplify_file_name(path))
}

/// Reads CSV data from any source. `origin` names the source in errors.
pub fn read_csv_from_reader<R: Read>(reader: R, origin: &str) -> ReportResult<Dataset> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    read_records(rdr, origin)
}

fn read_records<R: Read>(rdr: csv::Reader<R>, origin: &str) -> ReportResult<Dataset> {
    let mut records = rdr.into_records();
    let header = match records.next() {
        Some(h) => h.context(CsvLineParseSnafu { origin, lineno: 1u64 })?,
        None => {
            whatever!("{} is empty: a header row is required", origin)
        }
    };
    let headers: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(idx, s)| {
            if idx == 0 {
                s.trim_start_matches('\u{feff}').to_string()
            } else {
                s.to_string()
            }
        })
        .collect();
    debug!("read_csv: headers {:?}", headers);
    let mut builder = DatasetBuilder::new(&dedup_headers(headers)).context(InvalidDatasetSnafu)?;

    for (idx, line_r) in records.enumerate() {
        // Header is line 1.
        let fallback_lineno = idx as u64 + 2;
        let line = line_r.context(CsvLineParseSnafu {
            origin,
            lineno: fallback_lineno,
        })?;
        let lineno = line
            .position()
            .map(|p| p.line())
            .unwrap_or(fallback_lineno);
        let cells: Vec<String> = line.iter().map(|s| s.to_string()).collect();
        match builder.add_row(&cells) {
            Ok(()) => {}
            Err(DatasetError::RowTooLong { .. }) => {
                return CsvLineTooLongSnafu { origin, lineno }.fail();
            }
            Err(e) => return Err(e).context(InvalidDatasetSnafu),
        }
    }
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_header_and_rows() {
        let data = "\u{feff}Timestamp,Clarity,General comments\nt1,Excellent,Nice\nt2,,\n";
        let ds = read_csv_from_reader(data.as_bytes(), "inline").unwrap();
        assert_eq!(ds.column_names(), vec!["Timestamp", "Clarity", "General comments"]);
        assert_eq!(ds.num_rows(), 2);
        assert_eq!(ds.column("Clarity").unwrap().cells, vec![Some("Excellent".to_string()), None]);
    }

    #[test]
    fn quoted_compound_cells() {
        let data = "Timestamp,Pace\nt1,\"Pace, overall: Good\"\n";
        let ds = read_csv_from_reader(data.as_bytes(), "inline").unwrap();
        assert_eq!(
            ds.column_at(1).unwrap().cells,
            vec![Some("Pace, overall: Good".to_string())]
        );
    }

    #[test]
    fn repeated_headers_are_renamed() {
        let data = "Q,Q\na,b\n";
        let ds = read_csv_from_reader(data.as_bytes(), "inline").unwrap();
        assert_eq!(ds.column_names(), vec!["Q", "Q.1"]);
    }

    #[test]
    fn long_rows_are_rejected() {
        let data = "a,b\n1,2\n1,2,3\n";
        let err = read_csv_from_reader(data.as_bytes(), "inline").unwrap_err();
        assert!(matches!(err, ReportError::CsvLineTooLong { lineno: 3, .. }), "{:?}", err);
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(read_csv_from_reader("".as_bytes(), "inline").is_err());
    }
}
