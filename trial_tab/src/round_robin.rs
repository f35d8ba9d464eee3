use std::collections::BTreeMap;

use log::{debug, info, warn};

use crate::config::*;
use crate::conflicts::{ConflictContext, ConflictRules};
use crate::random::SeededRandom;
use crate::swiss::{final_audit_row, snapshot_rows};

/// A full schedule is attempted this many times before giving up.
pub const MAX_ATTEMPTS: usize = 25;

/// The history of one team while the schedule is being built.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct TeamRoundState {
    pub times_plaintiff: u32,
    pub times_defense: u32,
    pub past_opponents: Vec<String>,
}

pub type RoundState = BTreeMap<String, TeamRoundState>;

/// The pairings of one scheduled round.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ScheduledRound {
    pub round: String,
    /// Before conflict resolution.
    pub initial: Vec<Pairing>,
    pub pairings: Vec<Pairing>,
}

#[derive(Debug, Default)]
struct TeamGrouping {
    needs_plaintiff: Vec<String>,
    needs_defense: Vec<String>,
    flexible: Vec<String>,
}

fn team_groupings(state: &RoundState) -> TeamGrouping {
    let mut res = TeamGrouping::default();
    for (team, s) in state.iter() {
        if s.times_plaintiff == s.times_defense {
            res.flexible.push(team.clone());
        } else if s.times_plaintiff > s.times_defense {
            res.needs_defense.push(team.clone());
        } else {
            res.needs_plaintiff.push(team.clone());
        }
    }
    res
}

pub fn initial_round_state(team_numbers: &[String]) -> RoundState {
    team_numbers
        .iter()
        .map(|t| (t.clone(), TeamRoundState::default()))
        .collect()
}

/// Records the pairings of a round: both teams have faced each other and the
/// first team played plaintiff.
pub fn update_round_state(state: &mut RoundState, pairings: &[Pairing]) {
    for [p, d] in pairings.iter() {
        if let Some(s) = state.get_mut(p) {
            s.times_plaintiff += 1;
            s.past_opponents.push(d.clone());
        }
        if let Some(s) = state.get_mut(d) {
            s.times_defense += 1;
            s.past_opponents.push(p.clone());
        }
    }
}

fn initial_pairings(
    grouping: &TeamGrouping,
    rng: &mut SeededRandom,
) -> Result<Vec<Pairing>, TabErrors> {
    let mut plaintiffs = grouping.needs_plaintiff.clone();
    let mut defenses = grouping.needs_defense.clone();
    let mut flexible = grouping.flexible.clone();

    let gap = plaintiffs.len().abs_diff(defenses.len());
    if gap > flexible.len() {
        return Err(TabErrors::NotEnoughFlexibleTeams {
            gap,
            flexible: flexible.len(),
        });
    }
    if gap % 2 != flexible.len() % 2 {
        return Err(TabErrors::FlexibleParityMismatch {
            gap,
            flexible: flexible.len(),
        });
    }

    rng.shuffle(&mut flexible);
    while let Some(team) = flexible.pop() {
        if plaintiffs.len() > defenses.len() {
            defenses.push(team);
        } else {
            plaintiffs.push(team);
        }
    }
    rng.shuffle(&mut plaintiffs);
    rng.shuffle(&mut defenses);
    Ok(plaintiffs
        .into_iter()
        .zip(defenses)
        .map(|(p, d)| [p, d])
        .collect())
}

// Recombinations of two pairings [t1, t2] and [t3, t4].
fn swapped_pairings(
    p1: &Pairing,
    p2: &Pairing,
    grouping: &TeamGrouping,
    conflicts: &ConflictContext,
) -> Option<(Pairing, Pairing)> {
    let [t1, t2] = p1.clone();
    let [t3, t4] = p2.clone();
    let is_flexible = |t: &String| grouping.flexible.contains(t);
    let ok = |a: &Pairing, b: &Pairing| !conflicts.is_conflict(a) && !conflicts.is_conflict(b);

    // Exchange the defense teams, sides unchanged.
    let (a, b) = ([t1.clone(), t4.clone()], [t3.clone(), t2.clone()]);
    if ok(&a, &b) {
        return Some((a, b));
    }
    if is_flexible(&t1) && is_flexible(&t4) {
        let (a, b) = ([t4.clone(), t2.clone()], [t3.clone(), t1.clone()]);
        if ok(&a, &b) {
            return Some((a, b));
        }
    }
    if is_flexible(&t2) && is_flexible(&t3) {
        let (a, b) = ([t1, t3], [t2, t4]);
        if ok(&a, &b) {
            return Some((a, b));
        }
    }
    None
}

// Cyclic rotations of the defense teams of three pairings.
fn rotated_pairings(
    pairings: [&Pairing; 3],
    conflicts: &ConflictContext,
) -> Option<[Pairing; 3]> {
    let [[a1, b1], [a2, b2], [a3, b3]] = pairings.map(|p| p.clone());
    let candidates = [
        [
            [a1.clone(), b2.clone()],
            [a2.clone(), b3.clone()],
            [a3.clone(), b1.clone()],
        ],
        [[a1, b3], [a2, b1], [a3, b2]],
    ];
    candidates
        .into_iter()
        .find(|c| c.iter().all(|p| !conflicts.is_conflict(p)))
}

fn resolve_pairwise(pairings: &mut [Pairing], grouping: &TeamGrouping, conflicts: &ConflictContext) {
    let n = pairings.len();
    for i in 0..n {
        if !conflicts.is_conflict(&pairings[i]) {
            continue;
        }
        for j in (0..n).filter(|j| *j != i) {
            if let Some((a, b)) = swapped_pairings(&pairings[i], &pairings[j], grouping, conflicts) {
                debug!(
                    "round robin: {:?} and {:?} become {:?} and {:?}",
                    pairings[i], pairings[j], a, b
                );
                pairings[i] = a;
                pairings[j] = b;
                break;
            }
        }
    }
}

fn resolve_three_way(pairings: &mut [Pairing], conflicts: &ConflictContext) {
    let n = pairings.len();
    for i in 0..n {
        if !conflicts.is_conflict(&pairings[i]) {
            continue;
        }
        'search: for j in (0..n).filter(|j| *j != i) {
            for k in (0..n).filter(|k| *k != i && *k != j) {
                let triple = [&pairings[i], &pairings[j], &pairings[k]];
                if let Some([a, b, c]) = rotated_pairings(triple, conflicts) {
                    debug!("round robin: three way rotation of pairings {}, {}, {}", i, j, k);
                    pairings[i] = a;
                    pairings[j] = b;
                    pairings[k] = c;
                    break 'search;
                }
            }
        }
    }
}

/// Pairs one round from the current state.
///
/// Returns the pairings before and after conflict resolution. Repeat matchups
/// are never allowed.
pub fn pair_single_round(
    state: &RoundState,
    schools: &BTreeMap<String, String>,
    allow_same_school: bool,
    rng: &mut SeededRandom,
) -> Result<(Vec<Pairing>, Vec<Pairing>), TabErrors> {
    let grouping = team_groupings(state);
    debug!("pair_single_round: grouping {:?}", grouping);
    let initial = initial_pairings(&grouping, rng)?;

    let past_opponents: BTreeMap<String, Vec<String>> = state
        .iter()
        .map(|(t, s)| (t.clone(), s.past_opponents.clone()))
        .collect();
    let conflicts = ConflictContext {
        schools,
        past_opponents: &past_opponents,
        rules: ConflictRules {
            allow_same_school,
            allow_repeat_matchup: false,
        },
    };

    let mut pairings = initial.clone();
    resolve_pairwise(&mut pairings, &grouping, &conflicts);
    resolve_three_way(&mut pairings, &conflicts);

    let remaining = pairings.iter().filter(|p| conflicts.is_conflict(p)).count();
    if remaining > 0 {
        return Err(TabErrors::UnresolvedConflicts { remaining });
    }
    Ok((initial, pairings))
}

fn attempt_schedule(
    team_numbers: &[String],
    schools: &BTreeMap<String, String>,
    config: &RoundRobinConfig,
    rng: &mut SeededRandom,
) -> Result<Vec<ScheduledRound>, TabErrors> {
    let mut state = initial_round_state(team_numbers);
    let mut res: Vec<ScheduledRound> = Vec::new();
    for round in config.prelim_rounds.iter() {
        let (initial, pairings) =
            pair_single_round(&state, schools, config.allow_same_school, rng)?;
        update_round_state(&mut state, &pairings);
        res.push(ScheduledRound {
            round: round.clone(),
            initial,
            pairings,
        });
    }
    Ok(res)
}

/// Schedules every preliminary round of the tournament.
///
/// The whole schedule is retried up to [`MAX_ATTEMPTS`] times, continuing the
/// same random stream, since an early round may leave a later round with no
/// valid pairing.
pub fn compute_schedule(
    tournament: &Tournament,
    config: &RoundRobinConfig,
) -> Result<Vec<ScheduledRound>, TabErrors> {
    let mut team_numbers: Vec<String> = tournament.teams.keys().cloned().collect();
    if team_numbers.is_empty() {
        return Err(TabErrors::EmptyTournament);
    }
    let mut schools: BTreeMap<String, String> = tournament
        .teams
        .values()
        .map(|t| (t.team_number.clone(), t.school_name.clone()))
        .collect();
    if team_numbers.len() % 2 == 1 {
        team_numbers.push(BYE_TEAM_NUMBER.to_string());
        schools.insert(BYE_TEAM_NUMBER.to_string(), BYE_TEAM_NUMBER.to_string());
    }
    info!(
        "compute_schedule: {} teams, {} rounds",
        team_numbers.len(),
        config.prelim_rounds.len()
    );

    let mut rng = SeededRandom::new(&format!("{}-pairings", config.random_seed));
    let mut last_error: Option<TabErrors> = None;
    for attempt in 1..=MAX_ATTEMPTS {
        match attempt_schedule(&team_numbers, &schools, config, &mut rng) {
            Ok(schedule) => {
                info!("compute_schedule: schedule found at attempt {}", attempt);
                return Ok(schedule);
            }
            Err(e) => {
                debug!("compute_schedule: attempt {} failed: {}", attempt, e);
                last_error = Some(e);
            }
        }
    }
    let cause = last_error.map(|e| e.to_string()).unwrap_or_default();
    warn!("compute_schedule: giving up after {} attempts", MAX_ATTEMPTS);
    Err(TabErrors::RoundRobinExhausted {
        attempts: MAX_ATTEMPTS,
        cause,
    })
}

/// Per round: a `{round}:` header, the side names, the pairings, a blank row.
pub fn schedule_rows(tournament: &Tournament, schedule: &[ScheduledRound]) -> Vec<Row> {
    let mut rows: Vec<Row> = Vec::new();
    for r in schedule.iter() {
        rows.push(vec![Cell::from(format!("{}:", r.round)), Cell::from("")]);
        rows.push(vec![
            Cell::from(tournament.first_party_name.as_str()),
            Cell::from(tournament.second_party_name.as_str()),
        ]);
        for [p, d] in r.pairings.iter() {
            rows.push(vec![Cell::from(p.as_str()), Cell::from(d.as_str())]);
        }
        rows.push(vec![Cell::from(""), Cell::from("")]);
    }
    rows
}

/// The initial and final pairings of every round. Teams whose pairing changed
/// during conflict resolution are highlighted.
pub fn audit_rows(schedule: &[ScheduledRound]) -> Vec<Row> {
    let mut rows: Vec<Row> = Vec::new();
    for r in schedule.iter() {
        rows.extend(snapshot_rows(
            format!("{}: initial pairings, before conflict resolution:", r.round),
            &r.initial,
            &[],
        ));
        let moved: Vec<&str> = r
            .pairings
            .iter()
            .filter(|p| !r.initial.contains(p))
            .flat_map(|p| p.iter().map(|t| t.as_str()))
            .collect();
        rows.extend(snapshot_rows(
            format!("{}: pairings after conflict resolution:", r.round),
            &r.pairings,
            &moved,
        ));
    }
    rows.push(final_audit_row());
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Builder;
    use std::collections::HashSet;

    fn teams(n_schools: usize, per_school: usize) -> Tournament {
        let mut b = Builder::new("Petitioner", "Respondent");
        for s in 0..n_schools {
            let school = ["A", "B", "C", "D"][s];
            for i in 0..per_school {
                let number = format!("{}{}", school, s * per_school + i + 1);
                b = b.team(&number, &format!("Team {}", number), &format!("School {}", school));
            }
        }
        b.build()
    }

    fn config(num_rounds: usize) -> RoundRobinConfig {
        RoundRobinConfig {
            prelim_rounds: (1..=num_rounds).map(|r| format!("Round {}", r)).collect(),
            allow_same_school: false,
            random_seed: "test-seed".to_string(),
        }
    }

    fn check_schedule(t: &Tournament, schedule: &[ScheduledRound], same_school: bool) {
        let mut seen: HashSet<(String, String)> = HashSet::new();
        let mut sides: BTreeMap<String, (u32, u32)> = BTreeMap::new();
        for r in schedule.iter() {
            let mut in_round: HashSet<String> = HashSet::new();
            for [p, d] in r.pairings.iter() {
                assert!(in_round.insert(p.clone()));
                assert!(in_round.insert(d.clone()));
                let key = if p < d {
                    (p.clone(), d.clone())
                } else {
                    (d.clone(), p.clone())
                };
                assert!(seen.insert(key), "repeat matchup {} v. {}", p, d);
                if !same_school {
                    assert_ne!(t.school_of(p), t.school_of(d));
                }
                sides.entry(p.clone()).or_default().0 += 1;
                sides.entry(d.clone()).or_default().1 += 1;
            }
            assert_eq!(in_round.len(), t.teams.len());
        }
        for (p, d) in sides.values() {
            assert!(p.abs_diff(*d) <= 1);
        }
    }

    #[test]
    fn three_schools_three_rounds() {
        let t = teams(3, 2);
        let schedule = compute_schedule(&t, &config(3)).unwrap();
        assert_eq!(schedule.len(), 3);
        check_schedule(&t, &schedule, false);

        // Same seed, same schedule.
        let again = compute_schedule(&t, &config(3)).unwrap();
        assert_eq!(schedule, again);

        let rows = schedule_rows(&t, &schedule);
        assert_eq!(rows.len(), 3 * (2 + 3 + 1));
        assert_eq!(rows[0][0], Cell::from("Round 1:"));
        assert_eq!(rows[1][0], Cell::from("Petitioner"));
        assert_eq!(rows[1][1], Cell::from("Respondent"));
    }

    #[test]
    fn same_school_allowed() {
        let t = teams(3, 2);
        let cfg = RoundRobinConfig {
            allow_same_school: true,
            ..config(3)
        };
        let schedule = compute_schedule(&t, &cfg).unwrap();
        check_schedule(&t, &schedule, true);
    }

    #[test]
    fn too_many_rounds() {
        let t = teams(2, 2);
        let res = compute_schedule(&t, &config(3));
        match res {
            Err(e @ TabErrors::RoundRobinExhausted { .. }) => {
                assert!(e.to_string().starts_with("Failed to pair teams"));
            }
            x => panic!("unexpected result {:?}", x),
        }

        let t = teams(3, 2);
        let res = compute_schedule(&t, &config(5));
        assert!(matches!(
            res,
            Err(TabErrors::RoundRobinExhausted { attempts: 25, .. })
        ));
    }

    #[test]
    fn odd_field() {
        let mut t = teams(2, 2);
        t.teams.insert("C5".to_string(), TeamInfo::new("C5", "Team C5", "School C"));
        let schedule = compute_schedule(&t, &config(1)).unwrap();
        let teams_in_round: usize = schedule[0].pairings.len() * 2;
        assert_eq!(teams_in_round, 6);
        assert!(schedule[0]
            .pairings
            .iter()
            .any(|[p, d]| p == BYE_TEAM_NUMBER || d == BYE_TEAM_NUMBER));
    }

    fn schools_of(t: &Tournament) -> BTreeMap<String, String> {
        t.teams
            .values()
            .map(|x| (x.team_number.clone(), x.school_name.clone()))
            .collect()
    }

    #[test]
    fn side_needs_are_honored() {
        let t = teams(2, 2);
        let schools = schools_of(&t);
        let numbers: Vec<String> = t.teams.keys().cloned().collect();
        let mut state = initial_round_state(&numbers);
        state.get_mut("A1").unwrap().times_plaintiff = 1;
        state.get_mut("A2").unwrap().times_defense = 1;
        let mut rng = SeededRandom::new("test-seed-pairings");
        for _ in 0..10 {
            let (_, pairings) = pair_single_round(&state, &schools, false, &mut rng).unwrap();
            assert!(pairings.iter().any(|[_, d]| d == "A1"));
            assert!(pairings.iter().any(|[p, _]| p == "A2"));
            for p in pairings.iter() {
                assert_ne!(t.school_of(&p[0]), t.school_of(&p[1]));
            }
        }
    }

    #[test]
    fn flexible_errors() {
        let schools: BTreeMap<String, String> = BTreeMap::new();
        let numbers: Vec<String> = ["A1", "B3", "B4"].iter().map(|s| s.to_string()).collect();
        let mut state = initial_round_state(&numbers);
        state.get_mut("A1").unwrap().times_plaintiff = 1;
        let mut rng = SeededRandom::new("x");
        assert_eq!(
            pair_single_round(&state, &schools, false, &mut rng),
            Err(TabErrors::FlexibleParityMismatch {
                gap: 1,
                flexible: 2
            })
        );

        let numbers: Vec<String> = ["A1", "A2", "B3"].iter().map(|s| s.to_string()).collect();
        let mut state = initial_round_state(&numbers);
        state.get_mut("A1").unwrap().times_plaintiff = 1;
        state.get_mut("A2").unwrap().times_plaintiff = 1;
        assert_eq!(
            pair_single_round(&state, &schools, false, &mut rng),
            Err(TabErrors::NotEnoughFlexibleTeams {
                gap: 2,
                flexible: 1
            })
        );
    }

    #[test]
    fn third_round_after_history() {
        let t = teams(3, 2);
        let schools = schools_of(&t);
        let numbers: Vec<String> = t.teams.keys().cloned().collect();
        let mut state = initial_round_state(&numbers);
        let p = |a: &str, b: &str| [a.to_string(), b.to_string()];
        update_round_state(&mut state, &[p("A1", "B3"), p("A2", "C5"), p("B4", "C6")]);
        update_round_state(&mut state, &[p("B3", "A2"), p("C5", "B4"), p("C6", "A1")]);
        assert_eq!(state["A1"].past_opponents, vec!["B3", "C6"]);
        assert_eq!(state["A1"].times_plaintiff, 1);
        assert_eq!(state["A1"].times_defense, 1);

        // The matchups left form a single cycle over the six teams.
        let mut rng = SeededRandom::new("test-seed-pairings");
        let mut found = false;
        for _ in 0..MAX_ATTEMPTS {
            if let Ok((_, pairings)) = pair_single_round(&state, &schools, false, &mut rng) {
                for [a, b] in pairings.iter() {
                    assert!(!state[a].past_opponents.contains(b));
                    assert_ne!(schools[a], schools[b]);
                }
                found = true;
                break;
            }
        }
        assert!(found);
    }

    #[test]
    fn audit() {
        let t = teams(3, 2);
        let schedule = compute_schedule(&t, &config(2)).unwrap();
        let rows = audit_rows(&schedule);
        assert_eq!(rows.len(), 2 * 2 * (1 + 3 + 1) + 1);
        assert_eq!(
            rows[0][0],
            Cell::from("Round 1: initial pairings, before conflict resolution:")
        );
        assert_eq!(
            rows[5][0],
            Cell::from("Round 1: pairings after conflict resolution:")
        );
    }
}
