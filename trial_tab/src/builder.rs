pub use crate::config::*;

/// A builder for assembling a tournament from scores.
///
/// Each judge's ballot is entered once, from the plaintiff's point of view,
/// and the builder records both mirrored ballot results.
///
/// ```
/// use trial_tab::builder::TournamentBuilder;
///
/// let mut builder = TournamentBuilder::new("Plaintiff", "Defense")
///     .team("1001", "Alpha A", "Alpha")
///     .team("1002", "Beta A", "Beta");
///
/// builder.add_match("1", "Courtroom 1", "1001", "1002", &[(101.0, 95.0), (90.0, 92.0)]);
///
/// let tournament = builder.build();
/// assert_eq!(tournament.ballots.len(), 4);
/// ```
pub struct Builder {
    pub(crate) _tournament: Tournament,
}

pub type TournamentBuilder = Builder;

impl Builder {
    pub fn new(first_party_name: &str, second_party_name: &str) -> Builder {
        Builder {
            _tournament: Tournament::new(first_party_name, second_party_name),
        }
    }

    /// Registers a team. A team registered twice keeps the latest entry.
    pub fn team(mut self, team_number: &str, team_name: &str, school_name: &str) -> Builder {
        self.add_team(TeamInfo::new(team_number, team_name, school_name));
        self
    }

    pub fn courtrooms(mut self, names: &[&str]) -> Builder {
        self._tournament.courtrooms = names.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn add_team(&mut self, team: TeamInfo) {
        self._tournament
            .teams
            .insert(team.team_number.clone(), team);
    }

    /// Adds one matchup.
    ///
    /// scores: one `(plaintiff score, defense score)` pair per judge. Judges are
    /// named `Judge 1`, `Judge 2`, ... in order.
    pub fn add_match(
        &mut self,
        round: &str,
        courtroom: &str,
        plaintiff: &str,
        defense: &str,
        scores: &[(f64, f64)],
    ) {
        for (idx, (p_score, d_score)) in scores.iter().enumerate() {
            let pd = p_score - d_score;
            let won = if pd > 0.0 {
                1.0
            } else if pd < 0.0 {
                0.0
            } else {
                0.5
            };
            let ballot = BallotResult {
                round: round.to_string(),
                judge_name: format!("Judge {}", idx + 1),
                team_number: plaintiff.to_string(),
                opponent_team_number: defense.to_string(),
                side: self._tournament.first_party_name.clone(),
                point_differential: pd,
                won,
                courtroom: courtroom.to_string(),
            };
            let mirror = ballot.mirrored(&self._tournament.second_party_name);
            self.add_ballot_result(ballot);
            self.add_ballot_result(mirror);
        }
    }

    /// Adds a single ballot result as is. The caller is in charge of the mirror.
    pub fn add_ballot_result(&mut self, ballot: BallotResult) {
        self._tournament.ballots.push(ballot);
    }

    pub fn add_individual_result(&mut self, ballot: IndividualBallotResult) {
        self._tournament.individual_ballots.push(ballot);
    }

    pub fn build(self) -> Tournament {
        self._tournament
    }
}
