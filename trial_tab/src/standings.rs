use std::cmp::Ordering;
use std::collections::BTreeMap;

use log::{debug, info};

use crate::config::*;

// One team's normalized result in one round.
#[derive(PartialEq, Debug, Clone)]
struct RoundResult {
    ballots_won: f64,
    point_differential: f64,
    side: String,
    opponent_team_number: String,
}

fn round_result(ballots: &[&BallotResult], ballots_per_match: Option<f64>) -> RoundResult {
    // Without a ballot count, no normalization.
    let factor = match ballots_per_match {
        Some(bpm) => bpm / ballots.len() as f64,
        None => 1.0,
    };
    // All the ballots of a group share the side and the opponent.
    let (side, opponent_team_number) = ballots
        .first()
        .map(|b| (b.side.clone(), b.opponent_team_number.clone()))
        .unwrap_or_default();
    let mut res = RoundResult {
        ballots_won: 0.0,
        point_differential: 0.0,
        side,
        opponent_team_number,
    };
    for b in ballots.iter() {
        res.ballots_won += b.won * factor;
        res.point_differential += b.point_differential * factor;
    }
    res
}

/// Aggregates the ballots of the given rounds into one summary per team that
/// competed in them.
///
/// Arguments:
/// * `rounds` the rounds to consider. Teams visit their rounds in this order.
/// * `ballots_per_match` if provided, every team-round is scaled to this many
///   ballots, whatever the number of judges.
/// * `bye_strategy` if provided, teams with fewer rounds than the maximum are
///   adjusted. This requires `ballots_per_match`.
pub fn tabulate(
    tournament: &Tournament,
    rounds: &[String],
    ballots_per_match: Option<f64>,
    bye_strategy: Option<ByeStrategy>,
) -> Result<BTreeMap<String, TeamSummary>, TabErrors> {
    // team -> round -> ballots
    let mut grouped: BTreeMap<&str, BTreeMap<&str, Vec<&BallotResult>>> = BTreeMap::new();
    for b in tournament.ballots.iter() {
        if rounds.contains(&b.round) {
            grouped
                .entry(b.team_number.as_str())
                .or_default()
                .entry(b.round.as_str())
                .or_default()
                .push(b);
        }
    }
    debug!(
        "tabulate: {} teams with ballots in rounds {:?}",
        grouped.len(),
        rounds
    );

    let mut summaries: BTreeMap<String, TeamSummary> = BTreeMap::new();
    for (team_number, team_rounds) in grouped.iter() {
        let mut summary = match tournament.teams.get(*team_number) {
            Some(team) => TeamSummary::empty(team),
            None => TeamSummary {
                team_number: team_number.to_string(),
                team_name: "Unknown".to_string(),
                ..Default::default()
            },
        };
        for round in rounds.iter() {
            let ballots = match team_rounds.get(round.as_str()) {
                Some(ballots) => ballots,
                None => continue,
            };
            let rr = round_result(ballots, ballots_per_match);
            summary.ballots_won += rr.ballots_won;
            summary.point_differential += rr.point_differential;
            // A team may face the same opponent twice: keep the duplicates.
            summary.past_opponents.push(rr.opponent_team_number);
            summary.rounds_competed.push(round.clone());
            if rr.side == tournament.first_party_name {
                summary.times_plaintiff += 1;
            } else {
                summary.times_defense += 1;
            }
        }
        summaries.insert(team_number.to_string(), summary);
    }

    // Second pass, once every ballot count is final.
    let strengths: Vec<(String, f64)> = summaries
        .values()
        .map(|s| {
            let cs: f64 = s
                .past_opponents
                .iter()
                .map(|o| summaries.get(o).map(|os| os.ballots_won).unwrap_or(0.0))
                .sum();
            (s.team_number.clone(), cs)
        })
        .collect();
    for (team_number, cs) in strengths {
        if let Some(s) = summaries.get_mut(&team_number) {
            s.combined_strength = cs;
        }
    }

    if let Some(strategy) = bye_strategy {
        let bpm = ballots_per_match.ok_or(TabErrors::MissingBallotsPerMatch)?;
        adjust_for_bye(&mut summaries, strategy, bpm);
    }
    info!(
        "tabulate: {} summaries over {} rounds",
        summaries.len(),
        rounds.len()
    );
    Ok(summaries)
}

fn adjust_for_bye(
    summaries: &mut BTreeMap<String, TeamSummary>,
    strategy: ByeStrategy,
    ballots_per_match: f64,
) {
    let max_opponents = summaries
        .values()
        .map(|s| s.past_opponents.len())
        .max()
        .unwrap_or(0);
    for s in summaries.values_mut() {
        let num_opponents = s.past_opponents.len();
        if num_opponents == 0 || num_opponents >= max_opponents {
            continue;
        }
        let factor = max_opponents as f64 / num_opponents as f64;
        match strategy {
            ByeStrategy::NoAdjustment => continue,
            ByeStrategy::Proportional => {
                s.ballots_won *= factor;
            }
            ByeStrategy::AutoWin => {
                s.ballots_won += ballots_per_match;
            }
        }
        s.combined_strength *= factor;
        s.point_differential *= factor;
        s.past_opponents.push(BYE_TEAM_NUMBER.to_string());
        debug!(
            "adjust_for_bye: {} adjusted with {:?} (factor {})",
            s.team_number, strategy, factor
        );
    }
}

fn cmp_desc(a: f64, b: f64) -> Ordering {
    // -0.0 and 0.0 compare equal here.
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// The ranking order: `Less` means that `a` ranks ahead of `b`.
///
/// Descending ballots won, then combined strength, then point differential.
/// With `consider_bye_bust`, placeholder teams come last regardless of record.
pub fn compare_summaries(a: &TeamSummary, b: &TeamSummary, consider_bye_bust: bool) -> Ordering {
    if consider_bye_bust && a.bye_bust != b.bye_bust {
        return if a.bye_bust {
            Ordering::Greater
        } else {
            Ordering::Less
        };
    }
    cmp_desc(a.ballots_won, b.ballots_won)
        .then_with(|| cmp_desc(a.combined_strength, b.combined_strength))
        .then_with(|| cmp_desc(a.point_differential, b.point_differential))
}

/// The summaries in ranking order. Exact ties keep the team number order.
pub fn ranked(
    summaries: &BTreeMap<String, TeamSummary>,
    consider_bye_bust: bool,
) -> Vec<&TeamSummary> {
    let mut res: Vec<&TeamSummary> = summaries.values().collect();
    res.sort_by(|a, b| compare_summaries(a, b, consider_bye_bust));
    res
}

/// Standard tied ranks ("1, 1, 3") for summaries already in ranking order.
///
/// Neighbours are compared on the record only: a placeholder team listed last
/// shares the rank of a real team with the same record.
pub fn tied_ranks(sorted: &[&TeamSummary]) -> Vec<u32> {
    let mut res: Vec<u32> = Vec::new();
    for (idx, s) in sorted.iter().enumerate() {
        let rank = match (idx.checked_sub(1), res.last()) {
            (Some(prev), Some(prev_rank))
                if compare_summaries(s, sorted[prev], false) == Ordering::Equal =>
            {
                *prev_rank
            }
            _ => idx as u32 + 1,
        };
        res.push(rank);
    }
    res
}

pub(crate) fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// The standings table.
///
/// One row per team: rank, team number, team name, ballots won, combined
/// strength, point differential, times plaintiff, times defense, past opponents.
pub fn standings_rows(summaries: &BTreeMap<String, TeamSummary>) -> Vec<Row> {
    if summaries.is_empty() {
        return vec![vec![Cell::from("No results to display")]];
    }
    let sorted = ranked(summaries, true);
    let ranks = tied_ranks(&sorted);
    sorted
        .iter()
        .zip(ranks)
        .map(|(s, rank)| {
            vec![
                Cell::from(rank),
                Cell::from(s.team_number.as_str()),
                Cell::from(s.team_name.as_str()),
                Cell::from(s.ballots_won),
                Cell::from(s.combined_strength),
                Cell::from(round2(s.point_differential)),
                Cell::from(s.times_plaintiff),
                Cell::from(s.times_defense),
                Cell::from(s.past_opponents.join(PAST_OPPONENTS_SEPARATOR)),
            ]
        })
        .collect()
}
