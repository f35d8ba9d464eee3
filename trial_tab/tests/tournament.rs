use std::collections::BTreeSet;

use chrono::NaiveDate;
use trial_tab::builder::Builder;
use trial_tab::*;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn rounds(xs: &[&str]) -> Vec<String> {
    xs.iter().map(|s| s.to_string()).collect()
}

// Four schools with two teams each, one round played.
fn regional() -> Tournament {
    let mut b = Builder::new("Plaintiff", "Defense")
        .team("101", "Adams A", "Adams")
        .team("102", "Adams B", "Adams")
        .team("201", "Burke A", "Burke")
        .team("202", "Burke B", "Burke")
        .team("301", "Clay A", "Clay")
        .team("302", "Clay B", "Clay")
        .team("401", "Drew A", "Drew")
        .team("402", "Drew B", "Drew")
        .courtrooms(&["Room 101", "Room 102", "Room 103", "Room 104"]);
    b.add_match("1", "Room 101", "101", "201", &[(100.0, 90.0), (100.0, 92.0)]);
    b.add_match("1", "Room 102", "301", "102", &[(95.0, 90.0), (90.0, 95.0)]);
    b.add_match("1", "Room 103", "202", "401", &[(80.0, 90.0), (85.0, 86.0)]);
    b.add_match("1", "Room 104", "402", "302", &[(90.0, 89.0), (88.0, 90.0)]);
    b.build()
}

fn pair(p: &str, d: &str) -> Pairing {
    [p.to_string(), d.to_string()]
}

#[test]
fn ballots_are_conserved() {
    init();
    let t = regional();
    let summaries = standings::tabulate(&t, &rounds(&["1"]), Some(2.0), None).unwrap();
    let total: f64 = summaries.values().map(|s| s.ballots_won).sum();
    assert!((total - 8.0).abs() < 1e-9);
    let pd: f64 = summaries.values().map(|s| s.point_differential).sum();
    assert!(pd.abs() < 1e-9);
    for s in summaries.values() {
        assert_eq!(
            (s.times_plaintiff + s.times_defense) as usize,
            s.past_opponents.len()
        );
    }
}

#[test]
fn clean_data_has_no_anomaly() {
    init();
    let t = regional();
    assert!(anomalies::missing_mirrors(&t.ballots).is_empty());
    assert!(anomalies::multiple_matchups_in_courtroom(&t.ballots).is_empty());
    assert!(anomalies::team_with_multiple_matchups(&t.ballots).is_empty());
}

#[test]
fn swiss_second_round() {
    init();
    let t = regional();
    let config = SwissConfig {
        previous_rounds: rounds(&["1"]),
        random_seed: "regional".to_string(),
        ..SwissConfig::default()
    };
    let (pairings, history) = swiss::pair_round_with_history(&t, &config, None).unwrap();
    // Rank order: 101 401 302 102 301 402 202 201. Last round's defense
    // teams now play plaintiff. Both schoolmate pairings are swapped away.
    assert_eq!(
        pairings,
        vec![
            pair("302", "101"),
            pair("401", "301"),
            pair("201", "402"),
            pair("102", "202"),
        ]
    );
    assert_eq!(history.len(), 3);
    assert_eq!(history[1].conflict, Some(pair("302", "301")));
    assert_eq!(history[1].reason, ConflictType::SameSchool);
    assert_eq!(history[2].swap, Some(("201".to_string(), "102".to_string())));

    let audit = swiss::audit_rows(&history);
    assert_eq!(
        audit[6],
        vec![
            Cell::from("Swapping teams 302 and 401 to resolve impermissible matchup 302 v. 301 (same school):"),
            Cell::from(""),
        ]
    );
    assert_eq!(
        audit.last(),
        Some(&vec![
            Cell::from("All conflicts resolved, above pairings are final."),
            Cell::from(""),
        ])
    );

    let rows = swiss::assign_courtrooms(&pairings, &t, &config);
    assert_eq!(
        rows[0],
        vec![Cell::from("Room 101"), Cell::from("302"), Cell::from("101")]
    );
}

#[test]
fn round_robin_schedule() {
    init();
    let t = regional();
    let config = RoundRobinConfig {
        prelim_rounds: rounds(&["1", "2"]),
        allow_same_school: false,
        random_seed: "regional".to_string(),
    };
    let schedule = round_robin::compute_schedule(&t, &config).unwrap();
    assert_eq!(schedule, round_robin::compute_schedule(&t, &config).unwrap());
    assert_eq!(schedule.len(), 2);

    let mut met: BTreeSet<(String, String)> = BTreeSet::new();
    for r in schedule.iter() {
        assert_eq!(r.pairings.len(), 4);
        let teams: BTreeSet<&String> = r.pairings.iter().flatten().collect();
        assert_eq!(teams.len(), 8);
        for [p, d] in r.pairings.iter() {
            assert_ne!(t.school_of(p), t.school_of(d));
            let key = if p < d {
                (p.clone(), d.clone())
            } else {
                (d.clone(), p.clone())
            };
            assert!(met.insert(key), "{} and {} meet twice", p, d);
        }
    }
    // Sides alternate over two rounds.
    for team in t.teams.keys() {
        let plaintiff = schedule
            .iter()
            .filter(|r| r.pairings.iter().any(|[p, _]| p == team))
            .count();
        assert_eq!(plaintiff, 1);
    }
}

#[test]
fn school_ratings_from_results() {
    init();
    let t = regional();
    let matchups = results::matchup_summary(&t, None).unwrap();
    assert_eq!(matchups.len(), 4);
    let summary = TabSummary {
        tournament_name: "Regional".to_string(),
        tournament_type: "AMTA".to_string(),
        start_date: NaiveDate::from_ymd_opt(2024, 1, 20).unwrap(),
        ordered_round_list: rounds(&["1"]),
        teams: t
            .teams
            .values()
            .map(|team| TeamRank {
                rank: None,
                team_number: team.team_number.clone(),
                school_name: team.school_name.clone(),
            })
            .collect(),
        matchup_results: matchups,
    };
    let mut later = summary.clone();
    later.tournament_name = "Invitational".to_string();
    later.start_date = NaiveDate::from_ymd_opt(2024, 11, 2).unwrap();

    let first = elo::calculate_elo(&[summary.clone()], &EloConfig::default());
    let names: Vec<&str> = first.ranking.iter().map(|s| s.school_name.as_str()).collect();
    assert_eq!(names, vec!["Adams", "Drew", "Clay", "Burke"]);
    assert_eq!(first.ranking[0].elo, 1216.0);
    assert_eq!(first.ranking[3].elo, 1168.0);

    // The decay between the two tournaments keeps the mean rating.
    let both = elo::calculate_elo(&[later, summary], &EloConfig::default());
    assert_eq!(both.history[0].tournament, "Regional");
    let total: f64 = both.ranking.iter().map(|s| s.elo).sum();
    assert!((total - 4800.0).abs() < 1e-9);
    for p in both.progression.iter() {
        assert_eq!(p.delta1, -p.delta2);
    }
}
