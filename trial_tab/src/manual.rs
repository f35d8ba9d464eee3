/*!

This is the long-form manual for `trial_tab` and `mocktab`.

## Input data

A tournament is made of two tables.

### Team info

One row per team:

| team number | team name | school | competitors | emails | ballot folder |
|-------------|-----------|--------|-------------|--------|---------------|
| 1001        | Alpha A   | Alpha  | Ann, Bo     | a@x.org|               |

A team whose school is `Bye Bust` is a placeholder slot. It is paired like any
other team but always ranked last in the final standings.

### Ballots

One row per judge ballot and per team. Every ballot is expected to have a
mirror: the same round and judge, the teams swapped, the point differential
negated and the win flipped (`1` against `0`, `0.5` against `0.5`).

| round | judge | team | opponent | side      | pd  | won | courtroom |
|-------|-------|------|----------|-----------|-----|-----|-----------|
| 1     | Smith | 1001 | 1002     | Plaintiff | 5   | 1   | Room 1    |
| 1     | Smith | 1002 | 1001     | Defense   | -5  | 0   | Room 1    |

The side of a team is compared with the first party name of the tournament
(usually `Plaintiff` or `Petitioner`). Any other value counts as the second
party.

### Individual ballots

Optional. One row per judge and per attorney or witness:

| round | judge | team | competitor | side      | role     | score | courtroom |
|-------|-------|------|------------|-----------|----------|-------|-----------|
| 1     | Smith | 1001 | Ann        | Plaintiff | Attorney | 9     | Room 1    |

## Standings

For each team, the results of each round are summed after normalizing to a
fixed number of ballots per match: a round with 3 ballots in a tournament with
2 ballots per match counts each ballot for 2/3.

Teams are ranked by:
1. ballots won
2. combined strength: the sum of the ballots won by every past opponent
3. point differential

Tied teams share the same rank and the next rank is skipped (`1, 1, 3`).

### Byes

A team that played fewer rounds than the others had a bye. The bye strategy
controls how its record is adjusted:
- `NO_ADJUSTMENT` keeps the raw totals
- `PROPORTIONAL` scales every total by `max rounds / rounds played`
- `AUTO_WIN` credits a full match of ballots and scales the combined strength
  and the point differential

Both adjustments record `BYE` as a past opponent. They require the number of
ballots per match.

A `Bye Bust` team is listed last, but it shares the rank of the team above it
when both have the same record.

### Individual standings

A competitor's scores are first averaged over the judges of each round, then
over the rounds. Competitors with the same score share a rank. Scores are
displayed with 2 decimals.

## Swiss pairing

After an even number of rounds (including the first round), teams are paired
in snake order: the ranks 1 and 2 meet, then 4 and 3, then 5 and 6 and so on,
the first and fourth team of every block of four taking the plaintiff side.

After an odd number of rounds, sides are balanced: the teams that played
defense more often now play plaintiff and the other way around. Teams with
balanced sides fill the smaller group. The two groups are ranked and paired
rank against rank.

Pairings between teams of the same school, or between teams that already met,
are then resolved by swapping a team with a neighbouring pairing. Among the
swaps that make the pairing valid, the one between the two closest teams in
the standings is chosen. A swap is never done twice. When no swap helps, the
pairing fails with an error and the operator must pair by hand or relax the
rules.

Every registered team is paired, including a team without results (it sat
out the previous round on a bye). An odd field gets an extra `BYE` team.

## Round robin pairing

The preliminary rounds of a round robin are computed all at once from a seed.
Each round keeps the sides balanced: teams that played more defense play
plaintiff, and the other way around. Teams with balanced sides are split at
random. Conflicts are resolved by exchanging the defense teams of two
pairings, flipping the sides of balanced teams, or rotating the defense teams
of three pairings. Teams never meet twice.

When a round cannot be paired, the whole schedule is computed again with the
next numbers of the same random stream, up to 25 times.

## Elo ratings

Schools are rated across tournaments. Each school starts at 1200. For every
matchup between two different schools:

```text
expected = 1 / (1 + 10 ^ ((other - self) / 400))
actual   = ballots won / total ballots
delta    = 32 * (actual - expected)
```

All the deltas of a round are computed from the ratings at the start of the
round and applied together. When more than 180 days separate two tournaments,
every rating moves halfway back to 1200.

## Randomness

All random choices (round robin pairings, courtroom assignment) come from a
stream seeded by a string. The seed is hashed with SHA-256 and fed to a
ChaCha20 generator, so a seed produces the same pairings on every machine.

## Command line

```bash
mocktab --config tournament.json --command standings --out standings.csv
```

Commands: `standings`, `individuals`, `swiss`, `swiss-metadata`, `round-robin`,
`round-robin-metadata`, `results`, `matchups`, `final-ranking`, `anomalies`,
`elo`, `elo-progression`, `elo-matrix`.

The output is written as CSV when the file name ends with `.csv`, and as JSON
otherwise (`stdout` prints JSON). With `--reference`, the JSON output is
compared with a reference file and the differences are printed.

*/
