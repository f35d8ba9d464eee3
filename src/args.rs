use clap::Parser;

/// This is a tabulation program for mock trial tournaments.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The JSON file describing the tournament: data sources, rules and pairing settings.
    /// For more information about the file format, read the documentation of the trial_tab crate.
    #[clap(short, long, value_parser)]
    pub config: String,

    /// (default standings) The computation to run. One of standings, individuals, swiss, swiss-metadata,
    /// round-robin, round-robin-metadata, results, matchups, final-ranking, anomalies, elo, elo-progression,
    /// elo-matrix.
    #[clap(long, value_parser)]
    pub command: Option<String>,

    /// (list of rounds or not specified) If specified, overrides the rounds taken from the configuration:
    /// the rounds of the team and individual standings, the previous rounds of a Swiss pairing, the rounds
    /// of a round robin.
    /// Rounds are comma-separated.
    #[clap(long, value_parser, use_value_delimiter = true)]
    pub rounds: Option<Vec<String>>,

    /// (file path, 'stdout' or empty) If specified, the output will be written to the given location, in CSV
    /// format if the name ends with .csv and in JSON format otherwise. Setting this option overrides the
    /// output directory that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference file containing the expected output in JSON format. If provided, mocktab will
    /// check that the computed output matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
