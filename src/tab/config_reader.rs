use crate::tab::*;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "tournamentName")]
    pub tournament_name: String,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "firstRowIndex")]
    _first_row_index: Option<JSValue>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
}

impl FileSource {
    /// The first row with data, starting at 1. Defaults to 2 (one header row).
    pub fn first_row_index(&self) -> TabResult<usize> {
        if self._first_row_index.is_none() {
            return Ok(2);
        }
        let x = read_js_int(&self._first_row_index)?;
        ensure_whatever!(x >= 1, "firstRowIndex starts at 1, got {}", x);
        Ok(x)
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Sources {
    #[serde(rename = "teamInfo")]
    pub team_info: FileSource,
    pub ballots: FileSource,
    /// Scores of the attorneys and witnesses, needed by the individual standings.
    #[serde(rename = "individualBallots")]
    pub individual_ballots: Option<FileSource>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct TabRules {
    #[serde(rename = "firstPartyName")]
    pub first_party_name: String,
    #[serde(rename = "secondPartyName")]
    pub second_party_name: String,
    #[serde(rename = "ballotsPerMatch")]
    pub ballots_per_match: Option<f64>,
    #[serde(rename = "byeStrategy")]
    pub _bye_strategy: Option<String>,
    #[serde(rename = "prelimRounds")]
    pub prelim_rounds: Vec<String>,
    #[serde(rename = "knockoutRounds", default)]
    pub knockout_rounds: Vec<String>,
}

impl TabRules {
    pub fn bye_strategy(&self) -> TabResult<Option<ByeStrategy>> {
        match self._bye_strategy.as_deref() {
            None | Some("") => Ok(None),
            Some(s) => s.parse::<ByeStrategy>().map(Some).context(EngineSnafu {}),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SwissSettings {
    #[serde(rename = "previousRounds")]
    pub previous_rounds: Option<Vec<String>>,
    #[serde(rename = "allowSameSchool")]
    pub allow_same_school: Option<bool>,
    #[serde(rename = "allowRepeatMatchup")]
    pub allow_repeat_matchup: Option<bool>,
    #[serde(rename = "randomizeCourtrooms")]
    pub randomize_courtrooms: Option<bool>,
    #[serde(rename = "randomSeed")]
    pub random_seed: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RoundRobinSettings {
    #[serde(rename = "allowSameSchool")]
    pub allow_same_school: Option<bool>,
    #[serde(rename = "randomSeed")]
    pub random_seed: Option<String>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct EloSettings {
    #[serde(rename = "startingElo")]
    pub starting_elo: Option<f64>,
    #[serde(rename = "kFactor")]
    pub k_factor: Option<f64>,
    #[serde(rename = "decayAfterDays")]
    pub decay_after_days: Option<i64>,
    #[serde(rename = "excludedPrograms")]
    pub excluded_programs: Option<Vec<String>>,
    #[serde(rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
    #[serde(rename = "summaryFiles")]
    pub summary_files: Vec<String>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct TabConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    pub sources: Sources,
    pub courtrooms: Option<Vec<String>>,
    pub rules: TabRules,
    pub swiss: Option<SwissSettings>,
    #[serde(rename = "roundRobin")]
    pub round_robin: Option<RoundRobinSettings>,
    pub elo: Option<EloSettings>,
}

// ******** Tournament summaries (school rating corpus) *********

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SummaryTeam {
    pub rank: Option<u32>,
    #[serde(rename = "teamNumber")]
    pub team_number: String,
    pub school: String,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SummaryMatchup {
    pub round: String,
    #[serde(rename = "pTeamNumber")]
    pub p_team_number: String,
    #[serde(rename = "dTeamNumber")]
    pub d_team_number: String,
    #[serde(rename = "pBallotsWon")]
    pub p_ballots_won: f64,
    #[serde(rename = "dBallotsWon")]
    pub d_ballots_won: f64,
    pub notes: Option<String>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SummaryFile {
    #[serde(rename = "tournamentName")]
    pub tournament_name: String,
    #[serde(rename = "tournamentType")]
    pub tournament_type: Option<String>,
    #[serde(rename = "startDate")]
    pub start_date: String,
    #[serde(rename = "orderedRoundList")]
    pub ordered_round_list: Vec<String>,
    pub teams: Vec<SummaryTeam>,
    #[serde(rename = "matchupResults")]
    pub matchup_results: Vec<SummaryMatchup>,
}

pub fn read_config(path: &str) -> TabResult<TabConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: TabConfig = serde_json::from_str(&contents).context(ParsingJsonSnafu {})?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

pub fn read_summary(path: String) -> TabResult<JSValue> {
    let contents = fs::read_to_string(path.clone()).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

pub fn parse_date(date: &str) -> TabResult<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d").context(ParsingDateSnafu { date })
}

pub fn read_tab_summary(path: String) -> TabResult<TabSummary> {
    let contents = fs::read_to_string(path.clone()).context(OpeningJsonSnafu { path })?;
    let sf: SummaryFile = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(TabSummary {
        tournament_name: sf.tournament_name,
        tournament_type: sf.tournament_type.unwrap_or_default(),
        start_date: parse_date(&sf.start_date)?,
        ordered_round_list: sf.ordered_round_list,
        teams: sf
            .teams
            .into_iter()
            .map(|t| TeamRank {
                rank: t.rank,
                team_number: t.team_number,
                school_name: t.school,
            })
            .collect(),
        matchup_results: sf
            .matchup_results
            .into_iter()
            .map(|m| MatchupResult {
                round: m.round,
                p_team_number: m.p_team_number,
                d_team_number: m.d_team_number,
                p_ballots_won: m.p_ballots_won,
                d_ballots_won: m.d_ballots_won,
                notes: m.notes.unwrap_or_default(),
            })
            .collect(),
    })
}

pub fn validate_swiss(
    config: &TabConfig,
    rounds_override: Option<Vec<String>>,
) -> SwissConfig {
    let settings = config.swiss.clone().unwrap_or(SwissSettings {
        previous_rounds: None,
        allow_same_school: None,
        allow_repeat_matchup: None,
        randomize_courtrooms: None,
        random_seed: None,
    });
    SwissConfig {
        previous_rounds: rounds_override
            .or(settings.previous_rounds)
            .unwrap_or_default(),
        allow_same_school: settings.allow_same_school.unwrap_or(false),
        allow_repeat_matchup: settings.allow_repeat_matchup.unwrap_or(false),
        randomize_courtrooms: settings.randomize_courtrooms.unwrap_or(false),
        random_seed: settings
            .random_seed
            .unwrap_or_else(|| config.output_settings.tournament_name.clone()),
    }
}

pub fn validate_round_robin(
    config: &TabConfig,
    rounds_override: Option<Vec<String>>,
) -> RoundRobinConfig {
    let settings = config.round_robin.clone();
    RoundRobinConfig {
        prelim_rounds: rounds_override.unwrap_or_else(|| config.rules.prelim_rounds.clone()),
        allow_same_school: settings
            .as_ref()
            .and_then(|s| s.allow_same_school)
            .unwrap_or(false),
        random_seed: settings
            .and_then(|s| s.random_seed)
            .unwrap_or_else(|| config.output_settings.tournament_name.clone()),
    }
}

pub fn validate_elo(settings: &EloSettings) -> TabResult<EloConfig> {
    let default = EloConfig::DEFAULT_CONFIG;
    let k_factor = settings.k_factor.unwrap_or(default.k_factor);
    ensure_whatever!(k_factor > 0.0, "kFactor must be positive, got {}", k_factor);
    Ok(EloConfig {
        starting_elo: settings.starting_elo.unwrap_or(default.starting_elo),
        k_factor,
        decay_after_days: settings
            .decay_after_days
            .unwrap_or(default.decay_after_days),
        excluded_programs: settings.excluded_programs.clone().unwrap_or_default(),
        start_date: settings.start_date.as_deref().map(parse_date).transpose()?,
        end_date: settings.end_date.as_deref().map(parse_date).transpose()?,
    })
}

fn read_js_int(x: &Option<JSValue>) -> TabResult<usize> {
    match x {
        Some(JSValue::Number(n)) => n
            .as_u64()
            .map(|x| x as usize)
            .context(ParsingJsonNumberSnafu {}),
        Some(JSValue::String(s)) => s.parse::<usize>().ok().context(ParsingJsonNumberSnafu {}),
        _ => None.context(ParsingJsonNumberSnafu {}),
    }
}
