// ********* Input data structures ***********

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::Display;
use std::str::FromStr;

use chrono::NaiveDate;

/// Team number of the synthetic team injected to absorb an odd team out.
pub const BYE_TEAM_NUMBER: &str = "BYE";

/// Placeholder school name marking a non-competing slot in the roster.
pub const BYE_BUST_SCHOOL_NAME: &str = "Bye Bust";

pub const PAST_OPPONENTS_SEPARATOR: &str = ", ";

/// A registered team.
///
/// Loaded once per tabulation run and never mutated afterwards.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TeamInfo {
    pub team_number: String,
    pub team_name: String,
    pub school_name: String,
    /// Placeholder slot, always ranked last in the displayed standings.
    pub bye_bust: bool,
    /// Ordered by frequency, then by first occurrence.
    pub competitor_names: Vec<String>,
    pub emails: String,
    pub ballot_folder_link: String,
}

impl TeamInfo {
    pub fn new(team_number: &str, team_name: &str, school_name: &str) -> TeamInfo {
        TeamInfo {
            team_number: team_number.to_string(),
            team_name: team_name.to_string(),
            school_name: school_name.to_string(),
            bye_bust: school_name == BYE_BUST_SCHOOL_NAME,
            competitor_names: Vec::new(),
            emails: String::new(),
            ballot_folder_link: String::new(),
        }
    }

    /// The synthetic team that pads an odd field.
    pub fn bye() -> TeamInfo {
        TeamInfo {
            team_number: BYE_TEAM_NUMBER.to_string(),
            team_name: BYE_BUST_SCHOOL_NAME.to_string(),
            school_name: BYE_TEAM_NUMBER.to_string(),
            bye_bust: true,
            competitor_names: Vec::new(),
            emails: String::new(),
            ballot_folder_link: String::new(),
        }
    }
}

/// The outcome of one judge's ballot, seen from one team.
///
/// Every ballot has a mirror: same round and judge, teams swapped, the point
/// differential negated and `won' = 1 - won`.
#[derive(PartialEq, Debug, Clone)]
pub struct BallotResult {
    pub round: String,
    pub judge_name: String,
    pub team_number: String,
    pub opponent_team_number: String,
    /// Either the first-party or the second-party label of the tournament.
    pub side: String,
    pub point_differential: f64,
    /// 0, 0.5 or 1.
    pub won: f64,
    pub courtroom: String,
}

impl BallotResult {
    /// The same ballot seen from the opponent.
    pub fn mirrored(&self, opponent_side: &str) -> BallotResult {
        BallotResult {
            round: self.round.clone(),
            judge_name: self.judge_name.clone(),
            team_number: self.opponent_team_number.clone(),
            opponent_team_number: self.team_number.clone(),
            side: opponent_side.to_string(),
            point_differential: -self.point_differential,
            won: 1.0 - self.won,
            courtroom: self.courtroom.clone(),
        }
    }

    pub fn is_mirror_of(&self, other: &BallotResult) -> bool {
        self.round == other.round
            && self.judge_name == other.judge_name
            && self.team_number == other.opponent_team_number
            && self.opponent_team_number == other.team_number
            && (self.point_differential + other.point_differential).abs() < 1e-9
            && (self.won + other.won - 1.0).abs() < 1e-9
    }
}

/// The score one judge gave to one competitor (attorney or witness).
#[derive(PartialEq, Debug, Clone)]
pub struct IndividualBallotResult {
    pub round: String,
    pub judge_name: String,
    pub team_number: String,
    pub competitor_name: String,
    pub side: String,
    pub score: f64,
    pub courtroom: String,
}

/// Everything loaded from the tournament's data store for one run.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct Tournament {
    pub teams: BTreeMap<String, TeamInfo>,
    pub ballots: Vec<BallotResult>,
    pub individual_ballots: Vec<IndividualBallotResult>,
    pub first_party_name: String,
    pub second_party_name: String,
    pub courtrooms: Vec<String>,
}

impl Tournament {
    pub fn new(first_party_name: &str, second_party_name: &str) -> Tournament {
        Tournament {
            first_party_name: first_party_name.to_string(),
            second_party_name: second_party_name.to_string(),
            ..Default::default()
        }
    }

    pub fn school_of(&self, team_number: &str) -> Option<&str> {
        self.teams
            .get(team_number)
            .map(|team| team.school_name.as_str())
    }

    /// The distinct rounds with at least one ballot, in order of appearance.
    pub fn round_names(&self) -> Vec<String> {
        let mut res: Vec<String> = Vec::new();
        for ballot in self.ballots.iter() {
            if !res.contains(&ballot.round) {
                res.push(ballot.round.clone());
            }
        }
        res
    }
}

/// A standing in one past tournament, as published in its tab summary.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TeamRank {
    pub rank: Option<u32>,
    pub team_number: String,
    pub school_name: String,
}

/// The combined result of one matchup (all ballots of that courtroom).
#[derive(PartialEq, Debug, Clone)]
pub struct MatchupResult {
    pub round: String,
    pub p_team_number: String,
    pub d_team_number: String,
    pub p_ballots_won: f64,
    pub d_ballots_won: f64,
    pub notes: String,
}

/// A completed tournament, as consumed by the school rating.
#[derive(PartialEq, Debug, Clone)]
pub struct TabSummary {
    pub tournament_name: String,
    pub tournament_type: String,
    pub start_date: NaiveDate,
    pub ordered_round_list: Vec<String>,
    pub teams: Vec<TeamRank>,
    pub matchup_results: Vec<MatchupResult>,
}

// ******** Output data structures *********

/// A single spreadsheet cell at the boundary of the engine.
#[derive(PartialEq, Debug, Clone)]
pub enum Cell {
    Empty,
    Text(String),
    Int(i64),
    Number(f64),
}

pub type Row = Vec<Cell>;

impl Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(s) => write!(f, "{}", s),
            Cell::Int(i) => write!(f, "{}", i),
            Cell::Number(x) => write!(f, "{}", x),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Cell {
        Cell::Text(s)
    }
}

impl From<f64> for Cell {
    fn from(x: f64) -> Cell {
        Cell::Number(x)
    }
}

impl From<u32> for Cell {
    fn from(i: u32) -> Cell {
        Cell::Int(i as i64)
    }
}

impl From<usize> for Cell {
    fn from(i: usize) -> Cell {
        Cell::Int(i as i64)
    }
}

/// Derived per-team statistics. Recomputed on every invocation.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct TeamSummary {
    pub team_number: String,
    pub team_name: String,
    pub bye_bust: bool,
    pub ballots_won: f64,
    pub point_differential: f64,
    /// Sum of the opponents' ballots won.
    pub combined_strength: f64,
    pub times_plaintiff: u32,
    pub times_defense: u32,
    /// Duplicates are kept: a team may face the same opponent twice.
    pub past_opponents: Vec<String>,
    pub rounds_competed: Vec<String>,
}

impl TeamSummary {
    /// A summary with no results, for a team that has not competed yet.
    pub fn empty(team: &TeamInfo) -> TeamSummary {
        TeamSummary {
            team_number: team.team_number.clone(),
            team_name: team.team_name.clone(),
            bye_bust: team.bye_bust,
            ..Default::default()
        }
    }
}

/// The average score of a competitor over the rounds it competed in.
#[derive(PartialEq, Debug, Clone)]
pub struct IndividualSummary {
    pub team_number: String,
    pub team_name: String,
    pub competitor_name: String,
    pub score: f64,
}

/// `[side 1, side 2]`. The first slot is the plaintiff (or petitioner).
pub type Pairing = [String; 2];

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum ConflictType {
    None,
    SameSchool,
    AlreadyFaced,
}

impl Display for ConflictType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConflictType::None => write!(f, "none"),
            ConflictType::SameSchool => write!(f, "same school"),
            ConflictType::AlreadyFaced => write!(f, "already faced"),
        }
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct SchoolElo {
    pub school_name: String,
    pub elo: f64,
}

/// Errors that prevent an algorithm from producing a valid result.
///
/// The messages are shown verbatim to the tournament operator.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum TabErrors {
    EmptyTournament,
    MissingBallotsPerMatch,
    UnknownByeStrategy(String),
    UnbalancedSides { plaintiff: usize, defense: usize },
    NotEnoughFlexibleTeams { gap: usize, flexible: usize },
    FlexibleParityMismatch { gap: usize, flexible: usize },
    UnresolvedConflicts { remaining: usize },
    RoundRobinExhausted { attempts: usize, cause: String },
}

impl Error for TabErrors {}

impl Display for TabErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TabErrors::EmptyTournament => write!(f, "There are no teams to pair."),
            TabErrors::MissingBallotsPerMatch => write!(
                f,
                "Cannot adjust for bye round without knowing the number of ballots per match."
            ),
            TabErrors::UnknownByeStrategy(s) => write!(
                f,
                "Unknown bye strategy {:?}: expected NO_ADJUSTMENT, PROPORTIONAL or AUTO_WIN.",
                s
            ),
            TabErrors::UnbalancedSides { plaintiff, defense } => write!(
                f,
                "Unequal number of plaintiff ({}) and defense ({}) teams found. The tab system can't balance sides for this round.",
                plaintiff, defense
            ),
            TabErrors::NotEnoughFlexibleTeams { gap, flexible } => write!(
                f,
                "Not enough flexible teams to pair {} more teams ({} flexible).",
                gap, flexible
            ),
            TabErrors::FlexibleParityMismatch { gap, flexible } => write!(
                f,
                "Gap is {} and flexible is {}, which are not both even or both odd.",
                gap, flexible
            ),
            TabErrors::UnresolvedConflicts { remaining } => write!(
                f,
                "Failed to iteratively resolve conflicts ({} impermissible matchups left). Either the system has a bug or the conflicts are irreconcilable.",
                remaining
            ),
            TabErrors::RoundRobinExhausted { attempts, cause } => write!(
                f,
                "Failed to pair teams after {} attempts. Last failure: {}",
                attempts, cause
            ),
        }
    }
}

// ********* Configuration **********

/// How the totals of a team with fewer matches than the field (a bye) are
/// scaled.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum ByeStrategy {
    NoAdjustment,
    /// Scale every total by `max opponents / own opponents`.
    Proportional,
    /// One full match worth of ballots, the other totals scaled.
    AutoWin,
}

impl FromStr for ByeStrategy {
    type Err = TabErrors;

    fn from_str(s: &str) -> Result<ByeStrategy, TabErrors> {
        match s.trim() {
            "NO_ADJUSTMENT" => Ok(ByeStrategy::NoAdjustment),
            "PROPORTIONAL" => Ok(ByeStrategy::Proportional),
            "AUTO_WIN" => Ok(ByeStrategy::AutoWin),
            x => Err(TabErrors::UnknownByeStrategy(x.to_string())),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct SwissConfig {
    /// The parity of its length selects the pairing strategy.
    pub previous_rounds: Vec<String>,
    pub allow_same_school: bool,
    pub allow_repeat_matchup: bool,
    pub randomize_courtrooms: bool,
    pub random_seed: String,
}

/// Round robin never allows repeat matchups.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct RoundRobinConfig {
    pub prelim_rounds: Vec<String>,
    pub allow_same_school: bool,
    pub random_seed: String,
}

#[derive(PartialEq, Debug, Clone)]
pub struct EloConfig {
    pub starting_elo: f64,
    pub k_factor: f64,
    /// Ratings regress halfway to `starting_elo` when two consecutive
    /// tournaments are further apart than this.
    pub decay_after_days: i64,
    /// Placeholder or hybrid programs: never rated, never cause a rating change.
    pub excluded_programs: Vec<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl EloConfig {
    pub const DEFAULT_CONFIG: EloConfig = EloConfig {
        starting_elo: 1200.0,
        k_factor: 32.0,
        decay_after_days: 180,
        excluded_programs: Vec::new(),
        start_date: None,
        end_date: None,
    };
}

impl Default for EloConfig {
    fn default() -> EloConfig {
        EloConfig::DEFAULT_CONFIG
    }
}
