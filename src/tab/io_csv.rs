// Primitives for reading and writing CSV files.

use crate::tab::io_common::{simplify_file_name, RawRow};
use crate::tab::*;

pub fn read_csv_rows(path: &str, cfs: &FileSource) -> TabResult<Vec<RawRow>> {
    let first_row = cfs.first_row_index()?;
    let file_name = simplify_file_name(path);
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;

    let mut res: Vec<RawRow> = Vec::new();
    // The index starts at 1 to respect most conventions in the excel world
    for (idx, line_r) in rdr.into_records().enumerate() {
        let lineno = idx + 1;
        if lineno < first_row {
            continue;
        }
        let line = line_r.context(CsvLineParseSnafu {
            file_name: file_name.clone(),
        })?;
        let cells: Vec<String> = line.iter().map(|s| s.to_string()).collect();
        debug!("read_csv_rows: {} {:?} {:?}", file_name, lineno, cells);
        res.push((lineno, cells));
    }
    info!("read_csv_rows: {} rows from {}", res.len(), file_name);
    Ok(res)
}

pub fn write_csv_rows(path: &str, rows: &[Row]) -> TabResult<()> {
    let mut wtr = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    for row in rows.iter() {
        let record: Vec<String> = row.iter().map(|c| c.to_string()).collect();
        wtr.write_record(&record).context(CsvWriteSnafu { path })?;
    }
    wtr.flush().context(WritingOutputSnafu { path })?;
    Ok(())
}
