use std::collections::BTreeMap;

use log::info;

use crate::config::*;

fn matchup_key(ballot: &BallotResult) -> String {
    let (a, b) = if ballot.team_number <= ballot.opponent_team_number {
        (&ballot.team_number, &ballot.opponent_team_number)
    } else {
        (&ballot.opponent_team_number, &ballot.team_number)
    };
    format!("{} vs. {}", a, b)
}

fn push_unique(messages: &mut Vec<String>, message: String) {
    if !messages.contains(&message) {
        messages.push(message);
    }
}

/// Two different matchups recorded for the same round and courtroom.
pub fn multiple_matchups_in_courtroom(ballots: &[BallotResult]) -> Vec<String> {
    let mut first_seen: BTreeMap<(&str, &str), &BallotResult> = BTreeMap::new();
    let mut res: Vec<String> = Vec::new();
    for b in ballots.iter() {
        let key = (b.round.as_str(), b.courtroom.as_str());
        match first_seen.get(&key) {
            None => {
                first_seen.insert(key, b);
            }
            Some(other) if matchup_key(other) != matchup_key(b) => push_unique(
                &mut res,
                format!(
                    "Found two different matchups for round {}, courtroom {}: {} (Judge {}) and {} (Judge {})",
                    b.round,
                    b.courtroom,
                    matchup_key(b),
                    b.judge_name,
                    matchup_key(other),
                    other.judge_name
                ),
            ),
            Some(_) => {}
        }
    }
    res
}

/// A team recorded against different opponents in the same round.
pub fn team_with_multiple_matchups(ballots: &[BallotResult]) -> Vec<String> {
    let mut first_seen: BTreeMap<(&str, &str), &BallotResult> = BTreeMap::new();
    let mut res: Vec<String> = Vec::new();
    for b in ballots.iter() {
        let key = (b.round.as_str(), b.team_number.as_str());
        match first_seen.get(&key) {
            None => {
                first_seen.insert(key, b);
            }
            Some(other) if other.opponent_team_number != b.opponent_team_number => push_unique(
                &mut res,
                format!(
                    "Team {} has multiple matchups in round {}: {} (Judge {}) and {} (Judge {})",
                    b.team_number,
                    b.round,
                    matchup_key(b),
                    b.judge_name,
                    matchup_key(other),
                    other.judge_name
                ),
            ),
            Some(_) => {}
        }
    }
    res
}

pub fn team_facing_itself(ballots: &[BallotResult]) -> Vec<String> {
    let mut res: Vec<String> = Vec::new();
    for b in ballots.iter().filter(|b| b.team_number == b.opponent_team_number) {
        push_unique(
            &mut res,
            format!(
                "Team {} is facing itself in round {}, courtroom {} (Judge {})",
                b.team_number, b.round, b.courtroom, b.judge_name
            ),
        );
    }
    res
}

/// Ballots whose counterpart for the opponent is missing or inconsistent.
pub fn missing_mirrors(ballots: &[BallotResult]) -> Vec<String> {
    let mut res: Vec<String> = Vec::new();
    for b in ballots.iter() {
        let mirrors = ballots.iter().filter(|other| b.is_mirror_of(other)).count();
        if mirrors != 1 {
            push_unique(
                &mut res,
                format!(
                    "Ballot of Judge {} for team {} in round {} has {} matching ballots for team {} (expected 1)",
                    b.judge_name, b.team_number, b.round, mirrors, b.opponent_team_number
                ),
            );
        }
    }
    res
}

/// Every check, as one-column rows: a header per check followed by its
/// messages, with blank rows in between.
pub fn detect_anomalies(tournament: &Tournament) -> Vec<Row> {
    let ballots = &tournament.ballots;
    let sections: [(&str, Vec<String>); 4] = [
        (
            "Multiple matchups in the same round/courtroom:",
            multiple_matchups_in_courtroom(ballots),
        ),
        (
            "Teams with multiple matchups in the same round:",
            team_with_multiple_matchups(ballots),
        ),
        ("Teams facing themselves:", team_facing_itself(ballots)),
        ("Ballots without a mirrored ballot:", missing_mirrors(ballots)),
    ];
    let mut rows: Vec<Row> = Vec::new();
    for (idx, (header, messages)) in sections.into_iter().enumerate() {
        info!("detect_anomalies: {} {}", messages.len(), header);
        if idx > 0 {
            rows.push(vec![Cell::from("")]);
        }
        rows.push(vec![Cell::from(header)]);
        rows.extend(messages.into_iter().map(|m| vec![Cell::from(m)]));
    }
    rows
}
