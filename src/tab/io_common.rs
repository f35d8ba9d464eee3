use std::path::Path;

use crate::tab::*;

/// A raw row of a data source, with its line number (starting at 1).
pub type RawRow = (usize, Vec<String>);

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Competitor names ordered by frequency, then by first occurrence.
pub fn competitor_names(raw: &str) -> Vec<String> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for name in raw.split(',').map(|s| s.trim()).filter(|s| !s.is_empty()) {
        match counts.iter_mut().find(|(n, _)| n == name) {
            Some((_, c)) => *c += 1,
            None => counts.push((name.to_string(), 1)),
        }
    }
    // Stable: equal counts keep the order of first occurrence.
    counts.sort_by(|(_, c1), (_, c2)| c2.cmp(c1));
    counts.into_iter().map(|(n, _)| n).collect()
}

fn field<'a>(row: &'a RawRow, idx: usize, file_name: &str) -> TabResult<&'a str> {
    let (lineno, cells) = row;
    cells
        .get(idx)
        .map(|s| s.trim())
        .context(LineTooShortSnafu {
            file_name,
            lineno: *lineno,
        })
}

fn number_field(row: &RawRow, idx: usize, file_name: &str) -> TabResult<f64> {
    let s = field(row, idx, file_name)?;
    s.parse::<f64>().ok().context(ParsingNumberSnafu {
        file_name,
        lineno: row.0,
        content: s,
    })
}

fn optional_field(row: &RawRow, idx: usize) -> String {
    row.1
        .get(idx)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

fn is_blank(row: &RawRow) -> bool {
    row.1.iter().all(|s| s.trim().is_empty())
}

/// Team rows: team number, team name, school, competitors, emails, ballot folder.
pub fn parse_team_rows(rows: &[RawRow], file_name: &str) -> TabResult<Vec<TeamInfo>> {
    let mut res: Vec<TeamInfo> = Vec::new();
    for row in rows.iter().filter(|r| !is_blank(r)) {
        let mut team = TeamInfo::new(
            field(row, 0, file_name)?,
            field(row, 1, file_name)?,
            field(row, 2, file_name)?,
        );
        team.competitor_names = competitor_names(&optional_field(row, 3));
        team.emails = optional_field(row, 4);
        team.ballot_folder_link = optional_field(row, 5);
        debug!("parse_team_rows: {:?}", team);
        res.push(team);
    }
    Ok(res)
}

/// Ballot rows: round, judge, team, opponent, side, point differential, won,
/// courtroom.
pub fn parse_ballot_rows(rows: &[RawRow], file_name: &str) -> TabResult<Vec<BallotResult>> {
    let mut res: Vec<BallotResult> = Vec::new();
    for row in rows.iter().filter(|r| !is_blank(r)) {
        let won = number_field(row, 6, file_name)?;
        if won != 0.0 && won != 0.5 && won != 1.0 {
            whatever!(
                "{} line {}: a ballot is won (1), tied (0.5) or lost (0), got {}",
                file_name,
                row.0,
                won
            );
        }
        res.push(BallotResult {
            round: field(row, 0, file_name)?.to_string(),
            judge_name: field(row, 1, file_name)?.to_string(),
            team_number: field(row, 2, file_name)?.to_string(),
            opponent_team_number: field(row, 3, file_name)?.to_string(),
            side: field(row, 4, file_name)?.to_string(),
            point_differential: number_field(row, 5, file_name)?,
            won,
            courtroom: optional_field(row, 7),
        });
    }
    Ok(res)
}

/// Individual ballot rows: round, judge, team, competitor, side, role, score,
/// courtroom. The role column is not used.
pub fn parse_individual_ballot_rows(
    rows: &[RawRow],
    file_name: &str,
) -> TabResult<Vec<IndividualBallotResult>> {
    let mut res: Vec<IndividualBallotResult> = Vec::new();
    for row in rows.iter().filter(|r| !is_blank(r)) {
        res.push(IndividualBallotResult {
            round: field(row, 0, file_name)?.to_string(),
            judge_name: field(row, 1, file_name)?.to_string(),
            team_number: field(row, 2, file_name)?.to_string(),
            competitor_name: field(row, 3, file_name)?.to_string(),
            side: field(row, 4, file_name)?.to_string(),
            score: number_field(row, 6, file_name)?,
            courtroom: optional_field(row, 7),
        });
    }
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(lineno: usize, cells: &[&str]) -> RawRow {
        (lineno, cells.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn competitors_by_frequency() {
        assert_eq!(
            competitor_names("Ann, Bo, Cy, Bo, , Cy, Bo"),
            vec!["Bo".to_string(), "Cy".to_string(), "Ann".to_string()]
        );
        assert!(competitor_names("").is_empty());
    }

    #[test]
    fn ballots() {
        let rows = vec![
            row(2, &["1", "Smith", "1001", "1002", "Plaintiff", "4", "1", "Room 1"]),
            row(3, &["", "", "", "", "", "", "", ""]),
            row(4, &["1", "Smith", "1002", "1001", "Defense", "-4", "0"]),
        ];
        let ballots = parse_ballot_rows(&rows, "ballots.csv").unwrap();
        assert_eq!(ballots.len(), 2);
        assert_eq!(ballots[1].point_differential, -4.0);
        assert_eq!(ballots[1].courtroom, "");

        let rows = vec![row(7, &["1", "Smith", "1001", "1002", "Plaintiff", "four", "1"])];
        match parse_ballot_rows(&rows, "ballots.csv") {
            Err(TabError::ParsingNumber { lineno, content, .. }) => {
                assert_eq!(lineno, 7);
                assert_eq!(content, "four");
            }
            x => panic!("unexpected {:?}", x),
        }
        let rows = vec![row(8, &["1", "Smith", "1001"])];
        assert!(matches!(
            parse_ballot_rows(&rows, "ballots.csv"),
            Err(TabError::LineTooShort { lineno: 8, .. })
        ));
    }

    #[test]
    fn individual_ballots() {
        let rows = vec![
            row(2, &["1", "Smith", "1001", " Ann Lee ", "Plaintiff", "Attorney", "9", "Room 1"]),
            row(3, &["1", "Smith", "1002", "Bo", "Defense", "Witness", "8.5"]),
        ];
        let ballots = parse_individual_ballot_rows(&rows, "individual.csv").unwrap();
        assert_eq!(ballots[0].competitor_name, "Ann Lee");
        assert_eq!(ballots[0].score, 9.0);
        assert_eq!(ballots[1].score, 8.5);
        assert_eq!(ballots[1].courtroom, "");

        let rows = vec![row(4, &["1", "Smith", "1002", "Bo", "Defense", "Witness", "ten"])];
        assert!(matches!(
            parse_individual_ballot_rows(&rows, "individual.csv"),
            Err(TabError::ParsingNumber { lineno: 4, .. })
        ));
    }

    #[test]
    fn teams() {
        let rows = vec![
            row(2, &["1001", "Alpha A", "Alpha", "Ann, Bo", "coach@alpha.edu"]),
            row(3, &["9999", "Placeholder", "Bye Bust"]),
        ];
        let teams = parse_team_rows(&rows, "teams.csv").unwrap();
        assert_eq!(teams[0].competitor_names, vec!["Ann".to_string(), "Bo".to_string()]);
        assert_eq!(teams[0].emails, "coach@alpha.edu");
        assert!(teams[1].bye_bust);
    }
}
