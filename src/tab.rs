use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};
use trial_tab::*;

use std::fs;
use std::path::{Path, PathBuf};

use text_diff::print_diff;

pub mod config_reader;
mod io_common;
mod io_csv;
mod io_xlsx;
mod output;

use crate::tab::config_reader::*;
use crate::tab::io_common::RawRow;
use crate::tab::output::*;

pub const DEFAULT_COMMAND: &str = "standings";

#[derive(Debug, Snafu)]
pub enum TabError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("No worksheet in {path}"))]
    EmptyExcel { path: String },
    #[snafu(display("No worksheet named {name} in {path}"))]
    MissingWorksheet { path: String, name: String },
    #[snafu(display("{file_name} line {lineno}: unexpected cell {content}"))]
    ExcelWrongCellType {
        file_name: String,
        lineno: usize,
        content: String,
    },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON: {source}"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Expected a positive integer in the configuration"))]
    ParsingJsonNumber {},
    #[snafu(display("Invalid date {date}, expected YYYY-MM-DD"))]
    ParsingDate {
        source: chrono::ParseError,
        date: String,
    },
    #[snafu(display("Error opening file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading {file_name}: {source}"))]
    CsvLineParse {
        source: csv::Error,
        file_name: String,
    },
    #[snafu(display("Error writing {path}: {source}"))]
    CsvWrite { source: csv::Error, path: String },
    #[snafu(display("{file_name} line {lineno}: missing columns"))]
    LineTooShort { file_name: String, lineno: usize },
    #[snafu(display("{file_name} line {lineno}: expected a number, got {content:?}"))]
    ParsingNumber {
        file_name: String,
        lineno: usize,
        content: String,
    },
    #[snafu(display("Error writing {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},

    #[snafu(display("{source}"))]
    Engine { source: TabErrors },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type TabResult<T> = Result<T, TabError>;

fn read_rows(root_path: &Path, cfs: &FileSource) -> TabResult<(Vec<RawRow>, String)> {
    let p: PathBuf = [root_path.to_path_buf(), PathBuf::from(&cfs.file_path)]
        .iter()
        .collect();
    let p2 = p.as_path().display().to_string();
    info!("Attempting to read file {:?}", p2);
    let rows = match cfs.provider.as_str() {
        "csv" => io_csv::read_csv_rows(&p2, cfs)?,
        "xlsx" | "excel" => io_xlsx::read_xlsx_rows(&p2, cfs)?,
        x => whatever!("Provider not implemented {:?}", x),
    };
    Ok((rows, io_common::simplify_file_name(&p2)))
}

fn load_tournament(config: &TabConfig, root_path: &Path) -> TabResult<Tournament> {
    let mut tournament = Tournament::new(
        &config.rules.first_party_name,
        &config.rules.second_party_name,
    );
    let (team_rows, teams_file) = read_rows(root_path, &config.sources.team_info)?;
    for team in io_common::parse_team_rows(&team_rows, &teams_file)? {
        if tournament.teams.contains_key(&team.team_number) {
            warn!(
                "load_tournament: team {} listed twice in {}, keeping the last entry",
                team.team_number, teams_file
            );
        }
        tournament.teams.insert(team.team_number.clone(), team);
    }
    let (ballot_rows, ballots_file) = read_rows(root_path, &config.sources.ballots)?;
    tournament.ballots = io_common::parse_ballot_rows(&ballot_rows, &ballots_file)?;
    if let Some(source) = &config.sources.individual_ballots {
        let (rows, file_name) = read_rows(root_path, source)?;
        tournament.individual_ballots =
            io_common::parse_individual_ballot_rows(&rows, &file_name)?;
    }
    tournament.courtrooms = config.courtrooms.clone().unwrap_or_default();
    info!(
        "load_tournament: {} teams, {} ballots, rounds {:?}",
        tournament.teams.len(),
        tournament.ballots.len(),
        tournament.round_names()
    );
    Ok(tournament)
}

fn read_elo_corpus(settings: &EloSettings, root_path: &Path) -> TabResult<Vec<TabSummary>> {
    let mut res: Vec<TabSummary> = Vec::new();
    for f in settings.summary_files.iter() {
        let p: PathBuf = [root_path.to_path_buf(), PathBuf::from(f)].iter().collect();
        res.push(read_tab_summary(p.as_path().display().to_string())?);
    }
    Ok(res)
}

fn run_elo(config: &TabConfig, root_path: &Path, command: &str) -> TabResult<Vec<Row>> {
    let settings = match &config.elo {
        Some(s) => s,
        None => whatever!("Command {} needs an elo section in the configuration", command),
    };
    let elo_config = validate_elo(settings)?;
    let corpus = read_elo_corpus(settings, root_path)?;
    let result = elo::calculate_elo(&corpus, &elo_config);
    let rows = match command {
        "elo" => elo::ranking_rows(&result),
        "elo-progression" => elo::progression_rows(&result),
        "elo-matrix" => elo::ranking_matrix(&result, &elo_config),
        x => whatever!("Unknown command {:?}", x),
    };
    Ok(rows)
}

/// Runs one command over the tournament. Engine failures are propagated.
fn run_command(
    config: &TabConfig,
    root_path: &Path,
    command: &str,
    rounds: Option<Vec<String>>,
) -> TabResult<Vec<Row>> {
    if command.starts_with("elo") {
        return run_elo(config, root_path, command);
    }
    let tournament = load_tournament(config, root_path)?;
    let rules = &config.rules;
    let bye_strategy = rules.bye_strategy()?;
    let rows = match command {
        "standings" => {
            let rounds = rounds.unwrap_or_else(|| rules.prelim_rounds.clone());
            let summaries =
                standings::tabulate(&tournament, &rounds, rules.ballots_per_match, bye_strategy)
                    .context(EngineSnafu {})?;
            standings::standings_rows(&summaries)
        }
        "individuals" => {
            ensure_whatever!(
                config.sources.individual_ballots.is_some(),
                "Command individuals needs an individualBallots source in the configuration"
            );
            let rounds = rounds.unwrap_or_else(|| rules.prelim_rounds.clone());
            individuals::individual_rows(&individuals::tabulate_individuals(&tournament, &rounds))
        }
        "swiss" => {
            let swiss_config = validate_swiss(config, rounds);
            swiss::pair_teams_with_courtrooms(&tournament, &swiss_config, bye_strategy)
                .context(EngineSnafu {})?
        }
        "swiss-metadata" => {
            let swiss_config = validate_swiss(config, rounds);
            swiss::pair_teams_with_metadata(&tournament, &swiss_config, bye_strategy)
                .context(EngineSnafu {})?
        }
        "round-robin" => {
            let rr_config = validate_round_robin(config, rounds);
            let schedule =
                round_robin::compute_schedule(&tournament, &rr_config).context(EngineSnafu {})?;
            round_robin::schedule_rows(&tournament, &schedule)
        }
        "round-robin-metadata" => {
            let rr_config = validate_round_robin(config, rounds);
            let schedule =
                round_robin::compute_schedule(&tournament, &rr_config).context(EngineSnafu {})?;
            round_robin::audit_rows(&schedule)
        }
        "results" => {
            let rounds = rounds.unwrap_or_else(|| tournament.round_names());
            results::match_result_lines(&tournament, &rounds).context(EngineSnafu {})?
        }
        "matchups" => {
            let matchups = results::matchup_summary(&tournament, rounds.as_deref())
                .context(EngineSnafu {})?;
            results::matchup_rows(&matchups)
        }
        "final-ranking" => results::final_ranking(
            &tournament,
            &rules.prelim_rounds,
            &rules.knockout_rounds,
            bye_strategy,
        )
        .context(EngineSnafu {})?,
        "anomalies" => anomalies::detect_anomalies(&tournament),
        x => whatever!("Unknown command {:?}", x),
    };
    Ok(rows)
}

pub fn run_tab(
    config_path: String,
    command: &str,
    rounds: Option<Vec<String>>,
    out: Option<String>,
    check_reference_path: Option<String>,
) -> TabResult<()> {
    let config_p = Path::new(config_path.as_str());
    let config = read_config(&config_path)?;
    info!("config: {:?}", config);
    let root_p = config_p.parent().context(MissingParentDirSnafu {})?;

    let rows = run_command(&config, root_p, command, rounds)?;
    debug!("run_tab: {} rows", rows.len());

    let result_js = build_output_js(&config.output_settings.tournament_name, command, &rows);
    let out_path = output_path(out, &config, root_p, command);
    write_output(out_path.as_deref(), &result_js, &rows)?;

    // The reference output, if provided for comparison
    if let Some(reference_p) = check_reference_path {
        check_reference(&result_js, reference_p)?;
    }
    Ok(())
}

/// Writes the error in place of the output: a single row with the message.
pub fn write_error(out: Option<&str>, err: &TabError) -> TabResult<()> {
    let rows: Vec<Row> = vec![vec![Cell::from(err.to_string())]];
    let js = serde_json::json!({ "error": err.to_string(), "rows": rows_to_json(&rows) });
    match out {
        // The message already went to stderr.
        None | Some("stdout") => Ok(()),
        Some(p) => write_output(Some(p), &js, &rows),
    }
}

#[cfg(test)]
fn run_tab_test(test_name: &str, command: &str) -> TabResult<()> {
    let test_dir = option_env!("TAB_TEST_DIR")
        .unwrap_or(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data"));
    info!("Running test {} {}", test_name, command);
    let res = run_tab(
        format!("{}/{}/{}_config.json", test_dir, test_name, test_name),
        command,
        None,
        Some("stdout".to_string()),
        Some(format!(
            "{}/{}/{}_expected_{}.json",
            test_dir, test_name, test_name, command
        )),
    );
    if let Err(e) = &res {
        warn!("Error occured {:?}", e);
        eprintln!("An error occured {}", e);
        if let Some(bt) = snafu::ErrorCompat::backtrace(e) {
            eprintln!("trace: {}", bt);
        }
    }
    res
}

#[cfg(test)]
pub fn test_wrapper(test_name: &str, command: &str) {
    let res = run_tab_test(test_name, command);
    assert!(res.is_ok(), "{} {}: {:?}", test_name, command, res);
}
