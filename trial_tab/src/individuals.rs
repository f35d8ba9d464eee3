use std::cmp::Ordering;
use std::collections::BTreeMap;

use log::{debug, info};

use crate::config::*;
use crate::standings::round2;

/// The individual standings over the given rounds.
///
/// A competitor is a name within a team. Its scores are averaged within each
/// round, whatever the number of judges, and the round averages are averaged
/// again. Ballots outside `rounds` or without a team or a name are ignored.
///
/// The result is sorted by decreasing score. Exact ties keep the team number
/// order, then the name order.
pub fn tabulate_individuals(tournament: &Tournament, rounds: &[String]) -> Vec<IndividualSummary> {
    // (team, competitor) -> round -> scores
    let mut grouped: BTreeMap<(&str, &str), BTreeMap<&str, Vec<f64>>> = BTreeMap::new();
    for b in tournament.individual_ballots.iter() {
        if !rounds.contains(&b.round) {
            continue;
        }
        if b.team_number.is_empty() || b.competitor_name.is_empty() {
            debug!("tabulate_individuals: skipping incomplete ballot {:?}", b);
            continue;
        }
        grouped
            .entry((b.team_number.as_str(), b.competitor_name.as_str()))
            .or_default()
            .entry(b.round.as_str())
            .or_default()
            .push(b.score);
    }

    let mut res: Vec<IndividualSummary> = grouped
        .iter()
        .map(|((team_number, competitor_name), by_round)| {
            let round_averages: Vec<f64> = by_round
                .values()
                .map(|scores| scores.iter().sum::<f64>() / scores.len() as f64)
                .collect();
            let score = round_averages.iter().sum::<f64>() / round_averages.len() as f64;
            IndividualSummary {
                team_number: team_number.to_string(),
                team_name: tournament
                    .teams
                    .get(*team_number)
                    .map(|t| t.team_name.clone())
                    .unwrap_or_else(|| "Unknown".to_string()),
                competitor_name: competitor_name.to_string(),
                score,
            }
        })
        .collect();
    res.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    info!(
        "tabulate_individuals: {} competitors over {} rounds",
        res.len(),
        rounds.len()
    );
    res
}

/// One row per competitor: rank, team number, team name, competitor, score.
///
/// Competitors with the exact same score share a rank. The score is rounded
/// to 2 decimals for display only.
pub fn individual_rows(sorted: &[IndividualSummary]) -> Vec<Row> {
    if sorted.is_empty() {
        return vec![vec![Cell::from("No results to display")]];
    }
    let mut rows: Vec<Row> = Vec::new();
    let mut rank: u32 = 0;
    for (idx, s) in sorted.iter().enumerate() {
        let tied = idx
            .checked_sub(1)
            .map(|prev| sorted[prev].score == s.score)
            .unwrap_or(false);
        if !tied {
            rank = idx as u32 + 1;
        }
        rows.push(vec![
            Cell::from(rank),
            Cell::from(s.team_number.as_str()),
            Cell::from(s.team_name.as_str()),
            Cell::from(s.competitor_name.as_str()),
            Cell::from(round2(s.score)),
        ]);
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Builder;

    fn score(round: &str, judge: &str, team: &str, name: &str, value: f64) -> IndividualBallotResult {
        IndividualBallotResult {
            round: round.to_string(),
            judge_name: judge.to_string(),
            team_number: team.to_string(),
            competitor_name: name.to_string(),
            side: "Plaintiff".to_string(),
            score: value,
            courtroom: "R1".to_string(),
        }
    }

    fn rounds(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    fn tournament(scores: Vec<IndividualBallotResult>) -> Tournament {
        let mut b = Builder::new("Plaintiff", "Defense")
            .team("1001", "Alpha A", "Alpha")
            .team("1002", "Beta A", "Beta")
            .team("1003", "Gamma A", "Gamma");
        for s in scores {
            b.add_individual_result(s);
        }
        b.build()
    }

    #[test]
    fn judges_then_rounds_averaging() {
        let t = tournament(vec![
            score("1", "Smith", "1001", "Ann", 8.0),
            score("1", "Jones", "1001", "Ann", 9.0),
            score("2", "Smith", "1001", "Ann", 10.0),
            score("1", "Smith", "1002", "Bo", 9.0),
            score("1", "Jones", "1002", "Bo", 9.0),
            score("1", "Smith", "1001", "Cy", 7.0),
            // Outside the rounds.
            score("3", "Smith", "1001", "Cy", 10.0),
            // No name.
            score("1", "Smith", "1003", "", 10.0),
        ]);
        let res = tabulate_individuals(&t, &rounds(&["1", "2"]));
        let scores: Vec<(&str, f64)> = res
            .iter()
            .map(|s| (s.competitor_name.as_str(), s.score))
            .collect();
        // Ann: (8.5 + 10) / 2, not (8 + 9 + 10) / 3.
        assert_eq!(scores, vec![("Ann", 9.25), ("Bo", 9.0), ("Cy", 7.0)]);
        assert_eq!(res[1].team_name, "Beta A");
    }

    #[test]
    fn tied_ranks_and_rounding() {
        let t = tournament(vec![
            score("1", "Smith", "1001", "Ann", 10.0),
            score("1", "Smith", "1002", "Bo", 9.0),
            score("1", "Smith", "1003", "Dee", 9.0),
            score("1", "Smith", "1003", "Eve", 8.0),
            score("1", "Jones", "1003", "Eve", 9.0),
            score("1", "Brown", "1003", "Eve", 9.0),
            score("1", "Smith", "4004", "Fay", 1.0),
        ]);
        let rows = individual_rows(&tabulate_individuals(&t, &rounds(&["1"])));
        let ranks: Vec<Cell> = rows.iter().map(|r| r[0].clone()).collect();
        assert_eq!(
            ranks,
            vec![Cell::Int(1), Cell::Int(2), Cell::Int(2), Cell::Int(4), Cell::Int(5)]
        );
        assert_eq!(rows[1][3], Cell::from("Bo"));
        assert_eq!(rows[2][3], Cell::from("Dee"));
        assert_eq!(rows[3][4], Cell::Number(8.67));
        assert_eq!(rows[4][2], Cell::from("Unknown"));
    }

    #[test]
    fn no_results() {
        let t = tournament(vec![score("1", "Smith", "1001", "Ann", 10.0)]);
        assert_eq!(
            individual_rows(&tabulate_individuals(&t, &rounds(&["2"]))),
            vec![vec![Cell::from("No results to display")]]
        );
    }
}
