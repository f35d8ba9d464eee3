use calamine::{open_workbook, DataType, Range, Reader, Xlsx};

use crate::tab::io_common::{simplify_file_name, RawRow};
use crate::tab::*;

pub fn read_xlsx_rows(path: &str, cfs: &FileSource) -> TabResult<Vec<RawRow>> {
    let first_row = cfs.first_row_index()?;
    let file_name = simplify_file_name(path);
    let wrange = get_range(path, cfs)?;

    let mut res: Vec<RawRow> = Vec::new();
    for (idx, row) in wrange.rows().enumerate() {
        let lineno = idx + 1;
        if lineno < first_row {
            continue;
        }
        let mut cells: Vec<String> = Vec::new();
        for cell in row.iter() {
            cells.push(read_cell(cell, &file_name, lineno)?);
        }
        debug!("read_xlsx_rows: {} {:?} {:?}", file_name, lineno, cells);
        res.push((lineno, cells));
    }
    info!("read_xlsx_rows: {} rows from {}", res.len(), file_name);
    Ok(res)
}

fn read_cell(cell: &DataType, file_name: &str, lineno: usize) -> TabResult<String> {
    match cell {
        DataType::String(s) => Ok(s.clone()),
        DataType::Empty => Ok("".to_string()),
        // Team numbers are often typed as numbers.
        DataType::Float(f) if f.fract() == 0.0 => Ok(format!("{}", *f as i64)),
        DataType::Float(f) => Ok(f.to_string()),
        DataType::Int(i) => Ok(i.to_string()),
        DataType::Bool(b) => Ok(b.to_string()),
        _ => ExcelWrongCellTypeSnafu {
            file_name,
            lineno,
            content: format!("{:?}", cell),
        }
        .fail(),
    }
}

fn get_range(path: &str, cfs: &FileSource) -> TabResult<Range<DataType>> {
    debug!(
        "read_xlsx_rows: path: {:?} worksheet: {:?}",
        path, &cfs.excel_worksheet_name
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    // A worksheet name was provided, use it.
    if let Some(worksheet_name) = cfs.excel_worksheet_name.clone() {
        let wrange = workbook
            .worksheet_range(&worksheet_name)
            .context(MissingWorksheetSnafu {
                path,
                name: worksheet_name.clone(),
            })?
            .context(OpeningExcelSnafu { path })?;
        Ok(wrange)
    } else {
        let wrange = workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu { path })?
            .context(OpeningExcelSnafu { path })?;
        Ok(wrange)
    }
}
