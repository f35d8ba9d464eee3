use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use log::{debug, info, warn};

use crate::config::*;
use crate::conflicts::{ConflictContext, ConflictRules};
use crate::random::SeededRandom;
use crate::standings;

/// One snapshot of the pairings during conflict resolution.
///
/// The first snapshot of a run holds the initial pairings and no swap.
#[derive(PartialEq, Debug, Clone)]
pub struct SwapRecord {
    pub pairings: Vec<Pairing>,
    /// (team moved out, team moved in), relative to the conflicting pairing.
    pub swap: Option<(String, String)>,
    pub conflict: Option<Pairing>,
    pub reason: ConflictType,
}

impl SwapRecord {
    fn initial(pairings: &[Pairing]) -> SwapRecord {
        SwapRecord {
            pairings: pairings.to_vec(),
            swap: None,
            conflict: None,
            reason: ConflictType::None,
        }
    }
}

// Both pairing strategies swap a team of a conflicting pairing with the team
// in the same slot of another pairing.
struct Resolver<'a> {
    summaries: &'a BTreeMap<String, TeamSummary>,
    conflicts: ConflictContext<'a>,
    swaps: HashSet<(String, String)>,
    history: Vec<SwapRecord>,
}

fn swap_key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

impl<'a> Resolver<'a> {
    fn has_conflicts(&self, pairings: &[Pairing]) -> bool {
        pairings.iter().any(|p| self.conflicts.is_conflict(p))
    }

    // How much the standings differ between the two teams of a swap.
    fn compare_swaps(&self, s1: &(String, String), s2: &(String, String)) -> Ordering {
        let keys: [fn(&TeamSummary) -> f64; 3] = [
            |s| s.ballots_won,
            |s| s.combined_strength,
            |s| s.point_differential,
        ];
        for key in keys.iter() {
            let value = |team: &String| self.summaries.get(team).map(key).unwrap_or(0.0);
            let delta = |(old, new): &(String, String)| (value(new) - value(old)).abs();
            let diff = delta(s1) - delta(s2);
            if diff != 0.0 {
                return diff.partial_cmp(&0.0).unwrap_or(Ordering::Equal);
            }
        }
        Ordering::Equal
    }

    /// Picks the least disruptive swap for the pairing at `idx` among the
    /// candidate `(pairing index, slot)` positions.
    fn pick(
        &self,
        pairings: &[Pairing],
        idx: usize,
        candidates: &[(usize, usize)],
    ) -> Option<(usize, usize)> {
        candidates
            .iter()
            .filter(|(x, _)| *x < pairings.len() && *x != idx)
            .filter(|(x, y)| !self.swaps.contains(&swap_key(&pairings[idx][*y], &pairings[*x][*y])))
            .filter(|(x, y)| {
                let mut post = pairings[idx].clone();
                post[*y] = pairings[*x][*y].clone();
                !self.conflicts.is_conflict(&post)
            })
            .min_by(|(x1, y1), (x2, y2)| {
                let s1 = (pairings[idx][*y1].clone(), pairings[*x1][*y1].clone());
                let s2 = (pairings[idx][*y2].clone(), pairings[*x2][*y2].clone());
                self.compare_swaps(&s1, &s2)
            })
            .copied()
    }

    fn apply(
        &mut self,
        pairings: &mut [Pairing],
        idx: usize,
        (x, y): (usize, usize),
        resolved: Pairing,
        reason: ConflictType,
    ) {
        let out_team = pairings[idx][y].clone();
        let in_team = pairings[x][y].clone();
        debug!(
            "swiss: swapping {} and {} to resolve {} v. {} ({})",
            out_team, in_team, resolved[0], resolved[1], reason
        );
        pairings[idx][y] = in_team.clone();
        pairings[x][y] = out_team.clone();
        self.swaps.insert(swap_key(&out_team, &in_team));
        self.history.push(SwapRecord {
            pairings: pairings.to_vec(),
            swap: Some((out_team, in_team)),
            conflict: Some(resolved),
            reason,
        });
    }

    // Neighbours in the snake: the closest ranked team sits above or below
    // depending on the parity of the pairing.
    fn resolve_snake(&mut self, pairings: &mut [Pairing]) {
        let n = pairings.len();
        let mut iterations = 0;
        while self.has_conflicts(pairings) && iterations < n {
            for i in 0..n {
                let reason = self.conflicts.check(&pairings[i]);
                if reason == ConflictType::None {
                    continue;
                }
                let resolved = pairings[i].clone();
                let mut candidates: Vec<(usize, usize)> = Vec::new();
                if i % 2 == 0 {
                    if let Some(above) = i.checked_sub(1) {
                        candidates.push((above, 0));
                    }
                    candidates.push((i + 1, 1));
                } else {
                    candidates.push((i + 1, 0));
                    if let Some(above) = i.checked_sub(1) {
                        candidates.push((above, 1));
                    }
                }
                if let Some(pos) = self.pick(pairings, i, &candidates) {
                    self.apply(pairings, i, pos, resolved, reason);
                }
            }
            iterations += 1;
        }
    }

    // Always swaps the first slot, looking further out until a swap works.
    fn resolve_side_balanced(&mut self, pairings: &mut [Pairing]) {
        let n = pairings.len();
        let mut iterations = 0;
        while self.has_conflicts(pairings) && iterations < n {
            for i in 0..n {
                let reason = self.conflicts.check(&pairings[i]);
                if reason == ConflictType::None {
                    continue;
                }
                let resolved = pairings[i].clone();
                let mut distance = 1;
                while self.conflicts.is_conflict(&pairings[i]) && distance < n {
                    let mut candidates: Vec<(usize, usize)> = Vec::new();
                    if let Some(above) = i.checked_sub(distance) {
                        candidates.push((above, 0));
                    }
                    candidates.push((i + distance, 0));
                    match self.pick(pairings, i, &candidates) {
                        Some(pos) => self.apply(pairings, i, pos, resolved.clone(), reason),
                        None => distance += 1,
                    }
                }
            }
            iterations += 1;
        }
    }
}

/// The summaries the pairing is computed from, including the synthetic bye
/// team for an odd field.
fn pairing_summaries(
    tournament: &Tournament,
    config: &SwissConfig,
    bye_strategy: Option<ByeStrategy>,
) -> Result<BTreeMap<String, TeamSummary>, TabErrors> {
    let mut summaries =
        standings::tabulate(tournament, &config.previous_rounds, Some(1.0), bye_strategy)?;
    // Registered teams without results (first round, or sat out on a bye)
    // still get paired.
    for team in tournament.teams.values() {
        if !summaries.contains_key(&team.team_number) {
            debug!("swiss: {} has no results yet", team.team_number);
            summaries.insert(team.team_number.clone(), TeamSummary::empty(team));
        }
    }
    if summaries.is_empty() {
        return Err(TabErrors::EmptyTournament);
    }
    if summaries.len() % 2 == 1 {
        let mut bye = TeamSummary::empty(&TeamInfo::bye());
        bye.past_opponents = summaries
            .values()
            .filter(|s| s.past_opponents.iter().any(|o| o == BYE_TEAM_NUMBER))
            .map(|s| s.team_number.clone())
            .collect();
        debug!("swiss: adding a bye team, past opponents {:?}", bye.past_opponents);
        summaries.insert(BYE_TEAM_NUMBER.to_string(), bye);
    }
    Ok(summaries)
}

fn snake_pairings(order: &[String]) -> Vec<Pairing> {
    let side1 = order
        .iter()
        .enumerate()
        .filter(|(i, _)| i % 4 == 0 || i % 4 == 3)
        .map(|(_, t)| t);
    let side2 = order
        .iter()
        .enumerate()
        .filter(|(i, _)| i % 4 == 1 || i % 4 == 2)
        .map(|(_, t)| t);
    side1.zip(side2).map(|(a, b)| [a.clone(), b.clone()]).collect()
}

/// Teams that played defense more often play plaintiff, and conversely.
/// Teams with as many rounds on each side only fill the gap between the two
/// groups, in rank order.
fn side_balanced_pairings(
    order: &[String],
    summaries: &BTreeMap<String, TeamSummary>,
) -> Result<Vec<Pairing>, TabErrors> {
    // Rank positions of the teams that play each side next.
    let mut plaintiff: Vec<usize> = Vec::new();
    let mut defense: Vec<usize> = Vec::new();
    let mut flexible: Vec<usize> = Vec::new();
    for (idx, team) in order.iter().enumerate() {
        let (tp, td) = summaries
            .get(team)
            .map(|s| (s.times_plaintiff, s.times_defense))
            .unwrap_or((0, 0));
        match td.cmp(&tp) {
            Ordering::Greater => plaintiff.push(idx),
            Ordering::Less => defense.push(idx),
            Ordering::Equal => flexible.push(idx),
        }
    }
    for idx in flexible {
        if plaintiff.len() <= defense.len() {
            plaintiff.push(idx);
        } else {
            defense.push(idx);
        }
    }
    if plaintiff.len() != defense.len() {
        return Err(TabErrors::UnbalancedSides {
            plaintiff: plaintiff.len(),
            defense: defense.len(),
        });
    }
    plaintiff.sort_unstable();
    defense.sort_unstable();
    Ok(plaintiff
        .iter()
        .zip(defense.iter())
        .map(|(p, d)| [order[*p].clone(), order[*d].clone()])
        .collect())
}

/// Pairs the next round, returning the final pairings and every intermediate
/// snapshot of the conflict resolution.
///
/// An even number of previous rounds (including none) gives a snake pairing
/// by rank. An odd number gives a side-balanced pairing where the teams that
/// played defense more often now play plaintiff.
pub fn pair_round_with_history(
    tournament: &Tournament,
    config: &SwissConfig,
    bye_strategy: Option<ByeStrategy>,
) -> Result<(Vec<Pairing>, Vec<SwapRecord>), TabErrors> {
    let summaries = pairing_summaries(tournament, config, bye_strategy)?;
    let order: Vec<String> = standings::ranked(&summaries, false)
        .iter()
        .map(|s| s.team_number.clone())
        .collect();
    let side_balanced = config.previous_rounds.len() % 2 == 1;
    info!(
        "swiss: pairing {} teams after {} rounds ({})",
        order.len(),
        config.previous_rounds.len(),
        if side_balanced { "side balanced" } else { "snake" }
    );

    let mut pairings = if side_balanced {
        side_balanced_pairings(&order, &summaries)?
    } else {
        snake_pairings(&order)
    };

    let mut schools: BTreeMap<String, String> = tournament
        .teams
        .values()
        .map(|t| (t.team_number.clone(), t.school_name.clone()))
        .collect();
    schools.insert(BYE_TEAM_NUMBER.to_string(), BYE_TEAM_NUMBER.to_string());
    let past_opponents: BTreeMap<String, Vec<String>> = summaries
        .iter()
        .map(|(t, s)| (t.clone(), s.past_opponents.clone()))
        .collect();

    let mut resolver = Resolver {
        summaries: &summaries,
        conflicts: ConflictContext {
            schools: &schools,
            past_opponents: &past_opponents,
            rules: ConflictRules {
                allow_same_school: config.allow_same_school,
                allow_repeat_matchup: config.allow_repeat_matchup,
            },
        },
        swaps: HashSet::new(),
        history: vec![SwapRecord::initial(&pairings)],
    };
    if side_balanced {
        resolver.resolve_side_balanced(&mut pairings);
    } else {
        resolver.resolve_snake(&mut pairings);
    }

    let remaining = pairings
        .iter()
        .filter(|p| resolver.conflicts.is_conflict(p))
        .count();
    if remaining > 0 {
        warn!("swiss: {} conflicts left after resolution", remaining);
        return Err(TabErrors::UnresolvedConflicts { remaining });
    }
    info!(
        "swiss: {} pairings after {} swaps",
        pairings.len(),
        resolver.history.len() - 1
    );
    Ok((pairings, resolver.history))
}

pub fn pair_round(
    tournament: &Tournament,
    config: &SwissConfig,
    bye_strategy: Option<ByeStrategy>,
) -> Result<Vec<Pairing>, TabErrors> {
    pair_round_with_history(tournament, config, bye_strategy).map(|(p, _)| p)
}

/// Assigns courtrooms to pairings: rows of `(courtroom, side 1, side 2)`.
///
/// Missing courtrooms are named `Courtroom N`. With `randomize_courtrooms`, the
/// pairings are shuffled and, when sides are not constrained by the previous
/// rounds, a coin flip may swap the sides of every pairing.
pub fn assign_courtrooms(
    pairings: &[Pairing],
    tournament: &Tournament,
    config: &SwissConfig,
) -> Vec<Row> {
    let mut pairings = pairings.to_vec();
    if config.randomize_courtrooms {
        let mut rng = SeededRandom::new(&format!("{}-courtrooms", config.random_seed));
        rng.shuffle(&mut pairings);
        if config.previous_rounds.len() % 2 == 0 && rng.next_bool() {
            debug!("assign_courtrooms: flipping sides");
            for p in pairings.iter_mut() {
                p.swap(0, 1);
            }
        }
    }
    let mut courtrooms = tournament.courtrooms.clone();
    while courtrooms.len() < pairings.len() {
        courtrooms.push(format!("Courtroom {}", courtrooms.len() + 1));
    }
    pairings
        .iter()
        .zip(courtrooms.iter())
        .map(|([p, d], room)| {
            vec![
                Cell::from(room.as_str()),
                Cell::from(p.as_str()),
                Cell::from(d.as_str()),
            ]
        })
        .collect()
}

pub fn pair_teams_with_courtrooms(
    tournament: &Tournament,
    config: &SwissConfig,
    bye_strategy: Option<ByeStrategy>,
) -> Result<Vec<Row>, TabErrors> {
    let pairings = pair_round(tournament, config, bye_strategy)?;
    Ok(assign_courtrooms(&pairings, tournament, config))
}

/// A header row, one row per pairing with the highlighted teams prefixed by
/// `>> `, and a blank separator row.
pub(crate) fn snapshot_rows(header: String, pairings: &[Pairing], highlighted: &[&str]) -> Vec<Row> {
    let mut rows: Vec<Row> = vec![vec![Cell::from(header), Cell::from("")]];
    for pairing in pairings.iter() {
        let row: Row = pairing
            .iter()
            .map(|team| {
                if highlighted.contains(&team.as_str()) {
                    Cell::from(format!(">> {}", team))
                } else {
                    Cell::from(team.as_str())
                }
            })
            .collect();
        rows.push(row);
    }
    rows.push(vec![Cell::from(""), Cell::from("")]);
    rows
}

pub(crate) fn final_audit_row() -> Row {
    vec![
        Cell::from("All conflicts resolved, above pairings are final."),
        Cell::from(""),
    ]
}

/// The audit log of a conflict resolution, as two-column rows.
pub fn audit_rows(history: &[SwapRecord]) -> Vec<Row> {
    let mut rows: Vec<Row> = Vec::new();
    for record in history.iter() {
        match (&record.swap, &record.conflict) {
            (Some((out_team, in_team)), Some(conflict)) => {
                let header = format!(
                    "Swapping teams {} and {} to resolve impermissible matchup {} v. {} ({}):",
                    out_team, in_team, conflict[0], conflict[1], record.reason
                );
                rows.extend(snapshot_rows(
                    header,
                    &record.pairings,
                    &[out_team.as_str(), in_team.as_str()],
                ));
            }
            _ => rows.extend(snapshot_rows(
                "Initial pairings, before conflict resolution:".to_string(),
                &record.pairings,
                &[],
            )),
        }
    }
    rows.push(final_audit_row());
    rows
}

pub fn pair_teams_with_metadata(
    tournament: &Tournament,
    config: &SwissConfig,
    bye_strategy: Option<ByeStrategy>,
) -> Result<Vec<Row>, TabErrors> {
    let (_, history) = pair_round_with_history(tournament, config, bye_strategy)?;
    Ok(audit_rows(&history))
}
