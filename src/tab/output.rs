use crate::tab::io_csv::write_csv_rows;
use crate::tab::*;

use serde_json::json;
use serde_json::Value as JSValue;

fn cell_to_json(cell: &Cell) -> JSValue {
    match cell {
        Cell::Empty => JSValue::Null,
        Cell::Text(s) => json!(s),
        Cell::Int(i) => json!(i),
        Cell::Number(x) => json!(x),
    }
}

pub fn rows_to_json(rows: &[Row]) -> Vec<JSValue> {
    rows.iter()
        .map(|row| JSValue::Array(row.iter().map(cell_to_json).collect()))
        .collect()
}

pub fn build_output_js(tournament_name: &str, command: &str, rows: &[Row]) -> JSValue {
    json!({
        "tournament": tournament_name,
        "command": command,
        "rows": rows_to_json(rows),
    })
}

/// The location of the output: the explicit path if any, else a file in the
/// configured output directory, else the standard output.
pub fn output_path(
    out: Option<String>,
    config: &TabConfig,
    root_path: &Path,
    command: &str,
) -> Option<String> {
    match out {
        Some(p) if p == "stdout" => None,
        Some(p) => Some(p),
        None => config.output_settings.output_directory.as_ref().map(|dir| {
            let p: PathBuf = [
                root_path.to_path_buf(),
                PathBuf::from(dir),
                PathBuf::from(format!(
                    "{}_{}.json",
                    config.output_settings.tournament_name, command
                )),
            ]
            .iter()
            .collect();
            p.as_path().display().to_string()
        }),
    }
}

pub fn write_output(path: Option<&str>, js: &JSValue, rows: &[Row]) -> TabResult<()> {
    match path {
        None | Some("stdout") => {
            let pretty = serde_json::to_string_pretty(js).context(ParsingJsonSnafu {})?;
            println!("{}", pretty);
        }
        Some(p) if p.ends_with(".csv") => {
            info!("write_output: writing {} rows to {}", rows.len(), p);
            write_csv_rows(p, rows)?;
        }
        Some(p) => {
            info!("write_output: writing {} rows to {}", rows.len(), p);
            let pretty = serde_json::to_string_pretty(js).context(ParsingJsonSnafu {})?;
            fs::write(p, pretty).context(WritingOutputSnafu { path: p })?;
        }
    }
    Ok(())
}

/// Compares the output with a reference JSON file.
pub fn check_reference(js: &JSValue, reference_path: String) -> TabResult<()> {
    let reference = read_summary(reference_path)?;
    let pretty_js = serde_json::to_string_pretty(js).context(ParsingJsonSnafu {})?;
    let pretty_js_ref = serde_json::to_string_pretty(&reference).context(ParsingJsonSnafu {})?;
    if pretty_js_ref != pretty_js {
        warn!("Found differences with the reference output");
        print_diff(pretty_js_ref.as_str(), pretty_js.as_ref(), "\n");
        whatever!("Difference detected between computed output and reference output")
    }
    Ok(())
}
