use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use log::{debug, warn};

use crate::config::*;
use crate::standings::{compare_summaries, tabulate};

/// Ballots per match assumed by the published summaries.
pub const SUMMARY_BALLOTS_PER_MATCH: f64 = 2.0;

fn format_pd(pd: f64) -> String {
    if pd > 0.0 {
        format!("+{}", pd)
    } else {
        format!("{}", pd)
    }
}

// Each matchup of a round once, from the point of view of the team listed
// first.
fn round_matchups(summaries: &BTreeMap<String, TeamSummary>) -> Vec<(&TeamSummary, &TeamSummary)> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut res = Vec::new();
    for (team, summary) in summaries.iter() {
        if seen.contains(team.as_str()) {
            continue;
        }
        let opponent = match summary
            .past_opponents
            .first()
            .and_then(|o| summaries.get(o))
        {
            Some(opponent) => opponent,
            None => {
                warn!("round_matchups: no opponent result for team {}", team);
                continue;
            }
        };
        seen.insert(team.as_str());
        seen.insert(opponent.team_number.as_str());
        res.push((summary, opponent));
    }
    res
}

fn match_line(a: &TeamSummary, b: &TeamSummary) -> String {
    let (aw, bw) = (a.ballots_won, b.ballots_won);
    if aw > bw {
        format!(
            "Team {} ({}–{}) defeats Team {} ({}–{})",
            a.team_number, aw, bw, b.team_number, bw, aw
        )
    } else if aw < bw {
        match_line(b, a)
    } else if a.point_differential < 0.0 {
        // The team with the better margin is listed first.
        tie_line(b, a)
    } else {
        tie_line(a, b)
    }
}

fn tie_line(a: &TeamSummary, b: &TeamSummary) -> String {
    format!(
        "Team {} ({}–{}, PD {}) ties Team {} ({}–{}, PD {})",
        a.team_number,
        a.ballots_won,
        b.ballots_won,
        format_pd(a.point_differential),
        b.team_number,
        b.ballots_won,
        a.ballots_won,
        format_pd(b.point_differential)
    )
}

/// A human readable summary of every matchup, round by round.
///
/// Each round gets a `{round} Round Summary` header, one line per matchup and
/// a blank line.
pub fn match_result_lines(tournament: &Tournament, rounds: &[String]) -> Result<Vec<Row>, TabErrors> {
    let mut rows: Vec<Row> = Vec::new();
    for round in rounds.iter() {
        let summaries = tabulate(tournament, &[round.clone()], None, None)?;
        rows.push(vec![Cell::from(format!("{} Round Summary", round))]);
        for (a, b) in round_matchups(&summaries) {
            rows.push(vec![Cell::from(match_line(a, b))]);
        }
        rows.push(vec![Cell::from("")]);
    }
    Ok(rows)
}

/// The combined result of every matchup, normalized to two ballots.
///
/// Rounds default to every round with results, in order of appearance.
pub fn matchup_summary(
    tournament: &Tournament,
    rounds: Option<&[String]>,
) -> Result<Vec<MatchupResult>, TabErrors> {
    let rounds: Vec<String> = match rounds {
        Some(rounds) => rounds.to_vec(),
        None => tournament.round_names(),
    };
    let mut res: Vec<MatchupResult> = Vec::new();
    for round in rounds.iter() {
        let summaries = tabulate(
            tournament,
            &[round.clone()],
            Some(SUMMARY_BALLOTS_PER_MATCH),
            None,
        )?;
        for (a, b) in round_matchups(&summaries) {
            let (p, d) = if a.times_plaintiff > 0 { (a, b) } else { (b, a) };
            res.push(MatchupResult {
                round: round.clone(),
                p_team_number: p.team_number.clone(),
                d_team_number: d.team_number.clone(),
                p_ballots_won: p.ballots_won,
                d_ballots_won: d.ballots_won,
                notes: String::new(),
            });
        }
    }
    Ok(res)
}

/// Rows of `(round, plaintiff, defense, plaintiff ballots, defense ballots)`.
pub fn matchup_rows(matchups: &[MatchupResult]) -> Vec<Row> {
    if matchups.is_empty() {
        return vec![vec![Cell::from("No results found.")]];
    }
    matchups
        .iter()
        .map(|m| {
            vec![
                Cell::from(m.round.as_str()),
                Cell::from(m.p_team_number.as_str()),
                Cell::from(m.d_team_number.as_str()),
                Cell::from(m.p_ballots_won),
                Cell::from(m.d_ballots_won),
            ]
        })
        .collect()
}

/// The final ranking of the tournament.
///
/// Knockout participants come first, ordered by the latest round they reached.
/// Two teams that met in that round are ordered by their result there. Every
/// other tie falls back to the standings order. Combined strength only covers
/// the preliminary rounds.
pub fn final_ranking(
    tournament: &Tournament,
    prelim_rounds: &[String],
    knockout_rounds: &[String],
    bye_strategy: Option<ByeStrategy>,
) -> Result<Vec<Row>, TabErrors> {
    let all_rounds: Vec<String> = prelim_rounds
        .iter()
        .chain(knockout_rounds.iter())
        .cloned()
        .collect();
    let mut results = tabulate(
        tournament,
        prelim_rounds,
        Some(SUMMARY_BALLOTS_PER_MATCH),
        bye_strategy,
    )?;
    let knockout = tabulate(
        tournament,
        knockout_rounds,
        Some(SUMMARY_BALLOTS_PER_MATCH),
        Some(ByeStrategy::NoAdjustment),
    )?;

    // Latest round reached, as an index in all_rounds.
    let mut stage: BTreeMap<String, usize> = BTreeMap::new();
    for s in results.values_mut() {
        if let Some(k) = knockout.get(&s.team_number) {
            s.rounds_competed.extend(k.rounds_competed.iter().cloned());
            s.past_opponents.extend(k.past_opponents.iter().cloned());
            s.ballots_won += k.ballots_won;
            s.point_differential += k.point_differential;
            s.times_plaintiff += k.times_plaintiff;
            s.times_defense += k.times_defense;
            let latest = all_rounds
                .iter()
                .rposition(|r| s.rounds_competed.contains(r))
                .unwrap_or(0);
            stage.insert(s.team_number.clone(), latest);
        }
    }

    let mut order: Vec<&TeamSummary> = results.values().collect();
    order.sort_by(|a, b| match (stage.get(&a.team_number), stage.get(&b.team_number)) {
        (Some(x), Some(y)) if x != y => y.cmp(x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        _ => compare_summaries(a, b, false),
    });

    // Head to head in the latest round.
    for (round_idx, round) in all_rounds.iter().enumerate() {
        if !stage.values().any(|x| *x == round_idx) {
            continue;
        }
        let round_results = tabulate(
            tournament,
            &[round.clone()],
            Some(SUMMARY_BALLOTS_PER_MATCH),
            None,
        )?;
        for (a, b) in round_matchups(&round_results) {
            let pos = |team: &str| {
                order.iter().position(|s| {
                    s.team_number == team && stage.get(team) == Some(&round_idx)
                })
            };
            if let (Some(ia), Some(ib)) = (pos(&a.team_number), pos(&b.team_number)) {
                let a_wins = compare_summaries(a, b, false) == Ordering::Less;
                let b_wins = compare_summaries(b, a, false) == Ordering::Less;
                if (a_wins && ia > ib) || (b_wins && ib > ia) {
                    debug!(
                        "final_ranking: {} and {} ordered by their result in {}",
                        a.team_number, b.team_number, round
                    );
                    order.swap(ia, ib);
                }
            }
        }
    }

    let mut rows: Vec<Row> = Vec::new();
    for (idx, s) in order.iter().enumerate() {
        let team = tournament.teams.get(&s.team_number);
        let competitor = |i: usize| {
            team.filter(|t| t.competitor_names.len() >= 2)
                .map(|t| t.competitor_names[i].clone())
                .unwrap_or_default()
        };
        let stage_name = match stage.get(&s.team_number) {
            Some(i) => all_rounds[*i].clone(),
            None => "Prelim".to_string(),
        };
        rows.push(vec![
            Cell::from(idx + 1),
            Cell::from(s.team_number.as_str()),
            Cell::from(team.map(|t| t.school_name.clone()).unwrap_or_default()),
            Cell::from(competitor(0)),
            Cell::from(competitor(1)),
            Cell::from(team.map(|t| t.emails.clone()).unwrap_or_default()),
            Cell::from(stage_name),
            Cell::from(s.ballots_won),
            Cell::from(s.combined_strength),
        ]);
    }
    if rows.is_empty() {
        rows.push(vec![Cell::from("No results found.")]);
    }

    let mut included = all_rounds.clone();
    included.sort();
    let mut found = tournament.round_names();
    found.sort();
    if included != found {
        warn!(
            "final_ranking: rounds {:?} do not cover rounds with results {:?}",
            all_rounds, found
        );
        rows.push(vec![Cell::from(
            "WARNING: Not all rounds with results are being displayed.",
        )]);
        rows.push(vec![Cell::from(
            "Make sure all rounds are listed as either preliminary or knockout rounds.",
        )]);
        rows.push(vec![Cell::from(format!(
            "Included rounds: {}",
            all_rounds.join(", ")
        ))]);
        rows.push(vec![Cell::from(format!(
            "All rounds found: {}",
            tournament.round_names().join(", ")
        ))]);
    }
    Ok(rows)
}
