/*!
School ratings across tournaments.

Every school starts at the configured baseline. Tournaments are processed in
order of start date, and rounds in the order each tournament declares. All the
matchups of a round are computed from the ratings before that round and
applied together, so the order of the matchups within a round does not matter.

The score of a matchup is continuous: a 2-0 sweep counts more than a 1.5-0.5
split.
*/

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use log::{debug, info, warn};

use crate::config::*;

/// One rated matchup, for audit and replay.
#[derive(PartialEq, Debug, Clone)]
pub struct EloProgression {
    pub date: NaiveDate,
    pub tournament: String,
    pub round: String,
    pub school1: String,
    pub school2: String,
    /// Ratings before the round.
    pub elo1: f64,
    pub elo2: f64,
    pub delta1: f64,
    pub delta2: f64,
}

/// The displayed ratings right after a tournament.
#[derive(PartialEq, Debug, Clone)]
pub struct RatingSnapshot {
    pub date: NaiveDate,
    pub tournament: String,
    pub ratings: Vec<SchoolElo>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct EloResult {
    /// Sorted by descending rating. Excluded programs are not shown.
    pub ranking: Vec<SchoolElo>,
    pub progression: Vec<EloProgression>,
    pub history: Vec<RatingSnapshot>,
}

/// The probability that a school rated `elo_self` beats one rated `elo_other`.
pub fn expected_outcome(elo_self: f64, elo_other: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf((elo_other - elo_self) / 400.0))
}

fn displayed_ranking(elos: &BTreeMap<String, f64>, config: &EloConfig) -> Vec<SchoolElo> {
    let mut res: Vec<SchoolElo> = elos
        .iter()
        .filter(|(school, _)| !config.excluded_programs.contains(school))
        .map(|(school, elo)| SchoolElo {
            school_name: school.clone(),
            elo: *elo,
        })
        .collect();
    // Stable: equal ratings stay in name order.
    res.sort_by(|a, b| b.elo.total_cmp(&a.elo));
    res
}

fn in_window(date: NaiveDate, config: &EloConfig) -> bool {
    config.start_date.map_or(true, |start| date >= start)
        && config.end_date.map_or(true, |end| date <= end)
}

// The matchups of a tournament grouped by round, in the declared round order.
// Undeclared rounds come last, in order of appearance.
fn rounds_in_order(summary: &TabSummary) -> Vec<(&str, Vec<&MatchupResult>)> {
    let mut rounds: Vec<(&str, Vec<&MatchupResult>)> = Vec::new();
    for m in summary.matchup_results.iter() {
        match rounds.iter_mut().find(|(r, _)| *r == m.round) {
            Some((_, ms)) => ms.push(m),
            None => rounds.push((m.round.as_str(), vec![m])),
        }
    }
    rounds.sort_by_key(|(r, _)| {
        summary
            .ordered_round_list
            .iter()
            .position(|x| x == r)
            .unwrap_or(usize::MAX)
    });
    rounds
}

/// Rates every school over the tournaments that fall in the configured window.
pub fn calculate_elo(summaries: &[TabSummary], config: &EloConfig) -> EloResult {
    let mut tournaments: Vec<&TabSummary> = summaries
        .iter()
        .filter(|t| in_window(t.start_date, config))
        .collect();
    tournaments.sort_by_key(|t| t.start_date);
    info!(
        "calculate_elo: {} tournaments out of {}",
        tournaments.len(),
        summaries.len()
    );

    let mut elos: BTreeMap<String, f64> = BTreeMap::new();
    for t in tournaments.iter() {
        for team in t.teams.iter() {
            elos.entry(team.school_name.clone())
                .or_insert(config.starting_elo);
        }
    }

    let mut progression: Vec<EloProgression> = Vec::new();
    let mut history: Vec<RatingSnapshot> = Vec::new();
    let mut previous_date: Option<NaiveDate> = None;
    for t in tournaments.iter() {
        if let Some(prev) = previous_date {
            let gap = (t.start_date - prev).num_days();
            if gap > config.decay_after_days {
                debug!(
                    "calculate_elo: {} days before {}, ratings regress to baseline",
                    gap, t.tournament_name
                );
                for elo in elos.values_mut() {
                    *elo += (config.starting_elo - *elo) / 2.0;
                }
            }
        }
        previous_date = Some(t.start_date);

        let schools: BTreeMap<&str, &str> = t
            .teams
            .iter()
            .map(|team| (team.team_number.as_str(), team.school_name.as_str()))
            .collect();

        for (round, matchups) in rounds_in_order(t) {
            let mut adjustments: BTreeMap<&str, f64> = BTreeMap::new();
            for m in matchups {
                let (school1, school2) = match (
                    schools.get(m.p_team_number.as_str()),
                    schools.get(m.d_team_number.as_str()),
                ) {
                    (Some(s1), Some(s2)) => (*s1, *s2),
                    _ => {
                        warn!(
                            "calculate_elo: {} round {}: unknown team in {} v. {}, skipped",
                            t.tournament_name, round, m.p_team_number, m.d_team_number
                        );
                        continue;
                    }
                };
                if school1 == school2
                    || config.excluded_programs.iter().any(|x| x == school1 || x == school2)
                {
                    continue;
                }
                let total = m.p_ballots_won + m.d_ballots_won;
                if total <= 0.0 {
                    warn!(
                        "calculate_elo: {} round {}: no ballots in {} v. {}, skipped",
                        t.tournament_name, round, m.p_team_number, m.d_team_number
                    );
                    continue;
                }
                let elo1 = elos.get(school1).copied().unwrap_or(config.starting_elo);
                let elo2 = elos.get(school2).copied().unwrap_or(config.starting_elo);
                let actual = m.p_ballots_won / total;
                let delta = config.k_factor * (actual - expected_outcome(elo1, elo2));
                *adjustments.entry(school1).or_insert(0.0) += delta;
                *adjustments.entry(school2).or_insert(0.0) -= delta;
                progression.push(EloProgression {
                    date: t.start_date,
                    tournament: t.tournament_name.clone(),
                    round: round.to_string(),
                    school1: school1.to_string(),
                    school2: school2.to_string(),
                    elo1,
                    elo2,
                    delta1: delta,
                    delta2: -delta,
                });
            }
            for (school, delta) in adjustments {
                if let Some(elo) = elos.get_mut(school) {
                    *elo += delta;
                }
            }
        }
        history.push(RatingSnapshot {
            date: t.start_date,
            tournament: t.tournament_name.clone(),
            ratings: displayed_ranking(&elos, config),
        });
    }

    EloResult {
        ranking: displayed_ranking(&elos, config),
        progression,
        history,
    }
}

/// Rows of `(school, rating)`.
pub fn ranking_rows(result: &EloResult) -> Vec<Row> {
    result
        .ranking
        .iter()
        .map(|s| vec![Cell::from(s.school_name.as_str()), Cell::from(s.elo)])
        .collect()
}

/// Rows of `(date, tournament, round, school 1, school 2, elo 1, elo 2,
/// delta 1, delta 2)`.
pub fn progression_rows(result: &EloResult) -> Vec<Row> {
    result
        .progression
        .iter()
        .map(|p| {
            vec![
                Cell::from(p.date.to_string()),
                Cell::from(p.tournament.as_str()),
                Cell::from(p.round.as_str()),
                Cell::from(p.school1.as_str()),
                Cell::from(p.school2.as_str()),
                Cell::from(p.elo1),
                Cell::from(p.elo2),
                Cell::from(p.delta1),
                Cell::from(p.delta2),
            ]
        })
        .collect()
}

/// The rating history as a matrix: one column per school in order of final
/// rating, one row per tournament date. A baseline row dated the day before
/// the first tournament comes first.
pub fn ranking_matrix(result: &EloResult, config: &EloConfig) -> Vec<Row> {
    let first = match result.history.first() {
        Some(first) => first,
        None => return Vec::new(),
    };
    let schools: Vec<&str> = result
        .ranking
        .iter()
        .map(|s| s.school_name.as_str())
        .collect();

    let mut header: Row = vec![Cell::from("Date")];
    header.extend(schools.iter().map(|s| Cell::from(*s)));
    let mut rows: Vec<Row> = vec![header];

    let mut baseline: Row = vec![Cell::from((first.date - Duration::days(1)).to_string())];
    baseline.extend(schools.iter().map(|_| Cell::from(config.starting_elo)));
    rows.push(baseline);

    for snapshot in result.history.iter() {
        let mut row: Row = vec![Cell::from(snapshot.date.to_string())];
        for school in schools.iter() {
            let cell = snapshot
                .ratings
                .iter()
                .find(|s| s.school_name == *school)
                .map(|s| Cell::from(s.elo))
                .unwrap_or(Cell::Empty);
            row.push(cell);
        }
        rows.push(row);
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn team(number: &str, school: &str) -> TeamRank {
        TeamRank {
            rank: None,
            team_number: number.to_string(),
            school_name: school.to_string(),
        }
    }

    fn matchup(round: &str, p: &str, d: &str, pbw: f64, dbw: f64) -> MatchupResult {
        MatchupResult {
            round: round.to_string(),
            p_team_number: p.to_string(),
            d_team_number: d.to_string(),
            p_ballots_won: pbw,
            d_ballots_won: dbw,
            notes: String::new(),
        }
    }

    fn tournament(name: &str, start: &str, matchups: Vec<MatchupResult>) -> TabSummary {
        TabSummary {
            tournament_name: name.to_string(),
            tournament_type: "Invitational".to_string(),
            start_date: date(start),
            ordered_round_list: vec!["1".to_string(), "2".to_string()],
            teams: vec![
                team("1001", "Alpha"),
                team("1002", "Beta"),
                team("1003", "Gamma"),
                team("1004", "Alpha"),
                team("1005", "Hybrid"),
            ],
            matchup_results: matchups,
        }
    }

    #[test]
    fn single_sweep() {
        let t = tournament("Fall", "2024-10-05", vec![matchup("1", "1001", "1002", 2.0, 0.0)]);
        let res = calculate_elo(&[t], &EloConfig::default());
        let elo = |s: &str| res.ranking.iter().find(|x| x.school_name == s).unwrap().elo;
        assert_eq!(elo("Alpha"), 1216.0);
        assert_eq!(elo("Beta"), 1184.0);
        assert_eq!(elo("Gamma"), 1200.0);
        assert_eq!(res.ranking[0].school_name, "Alpha");
        assert_eq!(res.progression.len(), 1);
        assert_eq!(res.progression[0].delta1, 16.0);
        assert_eq!(res.progression[0].delta2, -16.0);
        assert_eq!(res.progression[0].elo1, 1200.0);
    }

    #[test]
    fn simultaneous_round() {
        // Alpha plays twice in round 1: both matchups use the pre-round ratings.
        let t = tournament(
            "Fall",
            "2024-10-05",
            vec![
                matchup("1", "1001", "1002", 2.0, 0.0),
                matchup("1", "1003", "1004", 0.0, 2.0),
            ],
        );
        let res = calculate_elo(&[t], &EloConfig::default());
        assert_eq!(res.progression[1].elo2, 1200.0);
        let elo = |s: &str| res.ranking.iter().find(|x| x.school_name == s).unwrap().elo;
        assert_eq!(elo("Alpha"), 1232.0);
        let total: f64 = res.ranking.iter().map(|s| s.elo - 1200.0).sum();
        assert!(total.abs() < 1e-9);
    }

    #[test]
    fn rounds_in_declared_order() {
        let t = tournament(
            "Fall",
            "2024-10-05",
            vec![
                matchup("Final", "1001", "1003", 1.0, 1.0),
                matchup("2", "1001", "1002", 2.0, 0.0),
                matchup("1", "1002", "1001", 2.0, 0.0),
            ],
        );
        let res = calculate_elo(&[t], &EloConfig::default());
        let rounds: Vec<&str> = res.progression.iter().map(|p| p.round.as_str()).collect();
        assert_eq!(rounds, vec!["1", "2", "Final"]);
        // Zero-sum per round.
        for p in res.progression.iter() {
            assert_eq!(p.delta1 + p.delta2, 0.0);
        }
    }

    #[test]
    fn skipped_matchups() {
        let config = EloConfig {
            excluded_programs: vec!["Hybrid".to_string()],
            ..EloConfig::default()
        };
        let t = tournament(
            "Fall",
            "2024-10-05",
            vec![
                matchup("1", "1001", "1004", 2.0, 0.0),
                matchup("1", "1005", "1002", 2.0, 0.0),
                matchup("1", "1003", "9999", 2.0, 0.0),
                matchup("2", "1003", "1002", 0.0, 0.0),
            ],
        );
        let res = calculate_elo(&[t], &config);
        assert!(res.progression.is_empty());
        assert_eq!(res.ranking.len(), 3);
        assert!(res.ranking.iter().all(|s| s.elo == 1200.0));
        assert!(res.ranking.iter().all(|s| s.school_name != "Hybrid"));
    }

    #[test]
    fn decay_between_seasons() {
        let t1 = tournament("Fall", "2023-10-05", vec![matchup("1", "1001", "1002", 2.0, 0.0)]);
        let t2 = tournament("Spring", "2024-06-01", vec![]);
        let t3 = tournament("Winter", "2024-07-01", vec![]);
        // Unsorted on purpose.
        let res = calculate_elo(&[t3.clone(), t1.clone(), t2.clone()], &EloConfig::default());
        let elo = |s: &str| res.ranking.iter().find(|x| x.school_name == s).unwrap().elo;
        assert_eq!(elo("Alpha"), 1208.0);
        assert_eq!(elo("Beta"), 1192.0);
        assert_eq!(res.history.len(), 3);
        assert_eq!(res.history[0].tournament, "Fall");

        // Same corpus, same output.
        assert_eq!(
            res,
            calculate_elo(&[t3.clone(), t1.clone(), t2.clone()], &EloConfig::default())
        );

        let windowed = EloConfig {
            start_date: Some(date("2024-01-01")),
            ..EloConfig::default()
        };
        let res = calculate_elo(&[t3, t1, t2], &windowed);
        assert_eq!(res.history.len(), 2);
        assert!(res.progression.is_empty());
    }

    #[test]
    fn matrix() {
        let t1 = tournament("Fall", "2024-10-05", vec![matchup("1", "1001", "1002", 2.0, 0.0)]);
        let t2 = tournament("Winter", "2024-12-05", vec![matchup("1", "1003", "1001", 2.0, 0.0)]);
        let config = EloConfig {
            excluded_programs: vec!["Hybrid".to_string()],
            ..EloConfig::default()
        };
        let res = calculate_elo(&[t1, t2], &config);
        let rows = ranking_matrix(&res, &config);
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].len(), 4);
        assert_eq!(rows[0][0], Cell::from("Date"));
        assert_eq!(rows[0][1], Cell::from(res.ranking[0].school_name.as_str()));
        assert_eq!(rows[1][0], Cell::from("2024-10-04"));
        assert_eq!(rows[1][1], Cell::Number(1200.0));
        assert_eq!(rows[3][0], Cell::from("2024-12-05"));
        assert_eq!(rows[3][1], Cell::Number(res.ranking[0].elo));

        assert_eq!(ranking_rows(&res).len(), 3);
        let progression = progression_rows(&res);
        assert_eq!(progression.len(), 2);
        assert_eq!(progression[1][2], Cell::from("1"));
        assert_eq!(progression[1][3], Cell::from("Gamma"));
    }
}
