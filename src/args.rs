use clap::Parser;

/// This program runs a chart voting session: players veto and favor charts, then charts are drawn at random.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The JSON file describing the session: the charts, the players and the draw settings.
    /// For more information about the file format, read the documentation of chart_picker::manual.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path, optional) The catalog of charts. Setting this option overrides the chart sources of the configuration.
    #[clap(long, value_parser)]
    pub charts: Option<String>,

    /// (default text) The type of the catalog: 'text' or 'xlsx'.
    #[clap(long, value_parser)]
    pub charts_type: Option<String>,

    /// (first worksheet if not specified) When using an Excel catalog, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (file path, optional) The players, one name per line, in turn order. Setting this option overrides the
    /// player sources of the configuration.
    #[clap(long, value_parser)]
    pub players: Option<String>,

    /// (default 6) The number of charts in the pool that the players vote on.
    #[clap(long, value_parser)]
    pub vote_from: Option<usize>,

    /// (default 4) The number of charts drawn at the end of the vote.
    #[clap(long, value_parser)]
    pub randomize: Option<usize>,

    /// (list of comma-separated difficulties or not specified) One chart of each of these difficulties is put in the pool.
    #[clap(long, value_parser, value_delimiter = ',')]
    pub required: Option<Vec<u32>>,

    /// (default exponential) The rule that turns votes into tickets: 'exponential' or 'linear'.
    #[clap(long, value_parser)]
    pub weight_rule: Option<String>,

    /// (file path or empty) A JSON array of actions to replay. If not specified, the actions are read from
    /// the standard input, one JSON object per line.
    #[clap(short, long, value_parser)]
    pub script: Option<String>,

    /// (number, optional) The seed of the random number generator. Setting this option overrides the seed
    /// of the configuration.
    #[clap(long, value_parser)]
    pub seed: Option<u64>,

    /// (file path, 'stdout' or empty) If specified, the final state of the session will be written in JSON format
    /// to the given location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference file containing the final state of a session in JSON format. If provided, chartpick will
    /// check that the final state matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// If passed as an argument, the odds of the draw are logged after each vote.
    #[clap(long, takes_value = false)]
    pub odds: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
