/*!
Tabulation engine for mock trial tournaments.

Given the teams of a tournament and the ballots of the judges, this crate
computes the team and individual standings, pairs the next round with a Swiss
system, schedules the preliminary rounds of a round robin, audits the ballots
for data entry mistakes, and rates schools across tournaments with an Elo
system.

Every pairing decision that involves chance goes through [`random::SeededRandom`],
so the same seed always produces the same pairings.

```
use trial_tab::builder::Builder;
use trial_tab::swiss::pair_round;
use trial_tab::SwissConfig;
# use trial_tab::TabErrors;

let mut builder = Builder::new("Plaintiff", "Defense")
    .team("1001", "Alpha A", "Alpha")
    .team("1002", "Beta A", "Beta")
    .team("1003", "Gamma A", "Gamma")
    .team("1004", "Delta A", "Delta");
builder.add_match("1", "Room 1", "1001", "1002", &[(100.0, 90.0), (95.0, 97.0)]);
builder.add_match("1", "Room 2", "1003", "1004", &[(80.0, 90.0), (85.0, 91.0)]);
let tournament = builder.build();

let config = SwissConfig {
    previous_rounds: vec!["1".to_string()],
    ..SwissConfig::default()
};
let pairings = pair_round(&tournament, &config, None)?;
assert_eq!(pairings.len(), 2);
# Ok::<(), TabErrors>(())
```

See the [`manual`] for the rules behind each computation.
*/

mod config;

pub mod anomalies;
pub mod builder;
pub mod conflicts;
pub mod elo;
pub mod individuals;
pub mod manual;
pub mod random;
pub mod results;
pub mod round_robin;
pub mod standings;
pub mod swiss;

pub use crate::config::*;
