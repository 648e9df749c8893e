use log::{debug, info, warn};

use chart_picker::builder::Builder;
use chart_picker::cell::SessionCell;
use chart_picker::*;
use snafu::prelude::*;

use std::fs;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::session::config_reader::*;

pub mod config_reader;
mod io_common;
mod io_text;
mod io_xlsx;

// Defaults of the start form.
const DEFAULT_VOTE_FROM: usize = 6;
const DEFAULT_RANDOMIZE: usize = 4;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SessionError {
    #[snafu(display("Error opening file {path}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error opening Excel file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("Excel file {path} has no worksheet named {sheet}"))]
    MissingWorksheet { path: String, sheet: String },
    #[snafu(display("Excel file has no content"))]
    EmptyExcel {},
    #[snafu(display("Unexpected cell at row {lineno}: {content}"))]
    ExcelWrongCellType { lineno: u64, content: String },
    #[snafu(display("Cannot read line {lineno} of {path}: {line:?}"))]
    TextLineParse {
        path: String,
        lineno: usize,
        line: String,
    },
    #[snafu(display("Error parsing JSON: {source}"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error reading the actions"))]
    ReadingActions { source: std::io::Error },
    #[snafu(display("Missing parent directory"))]
    MissingParentDir {},
    #[snafu(display("{source}"))]
    Engine { source: PickerError },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type SessionResult<T> = Result<T, SessionError>;

/// What happened during a run.
#[derive(PartialEq, Debug, Clone)]
pub struct SessionOutcome {
    pub snapshot: Snapshot,
    pub accepted: usize,
    pub rejected: usize,
}

fn relative_path(root: &Path, file_path: &str) -> String {
    let p: PathBuf = [root, Path::new(file_path)].iter().collect();
    p.as_path().display().to_string()
}

fn read_chart_source(root: &Path, source: &ChartSource) -> SessionResult<Vec<Chart>> {
    let p = relative_path(root, &source.file_path);
    info!("Attempting to read chart file {:?}", p);
    match source.provider.as_str() {
        "text" => io_text::read_text_charts(&p),
        "xlsx" => io_xlsx::read_xlsx_charts(&p, source.excel_worksheet_name.as_deref()),
        x => whatever!("Provider not implemented {:?}", x),
    }
}

/// Assembles the settings of the session from the configuration and the
/// command line. The command line wins.
fn build_settings(config: &SessionConfig, root: &Path, args: &Args) -> SessionResult<Settings> {
    let charts: Vec<Chart> = if let Some(charts_path) = &args.charts {
        let source = ChartSource {
            provider: args.charts_type.clone().unwrap_or_else(|| "text".to_string()),
            file_path: charts_path.clone(),
            excel_worksheet_name: args.excel_worksheet_name.clone(),
        };
        read_chart_source(Path::new("."), &source)?
    } else {
        let mut charts = config.charts.clone().unwrap_or_default();
        for source in config.chart_sources.iter().flatten() {
            charts.extend(read_chart_source(root, source)?);
        }
        charts
    };

    let players: Vec<Player> = if let Some(players_path) = &args.players {
        io_text::read_text_players(players_path)?
    } else {
        let mut players = config.players.clone().unwrap_or_default();
        for source in config.player_sources.iter().flatten() {
            let p = relative_path(root, &source.file_path);
            info!("Attempting to read player file {:?}", p);
            players.extend(io_text::read_text_players(&p)?);
        }
        players
    };

    let weight_rule = match &args.weight_rule {
        Some(s) => parse_weight_rule(s)?,
        None => config.weight_rule()?.unwrap_or_default(),
    };
    let required_difficulties = args
        .required
        .clone()
        .or_else(|| config.required_difficulties.clone())
        .unwrap_or_default();

    let mut builder = Builder::new(
        args.vote_from
            .or(config.how_many_charts_to_vote_from)
            .unwrap_or(DEFAULT_VOTE_FROM),
        args.randomize
            .or(config.how_many_charts_to_randomize)
            .unwrap_or(DEFAULT_RANDOMIZE),
    )
    .charts(&charts)
    .required_difficulties(&required_difficulties)
    .weight_rule(weight_rule);
    for p in players.iter() {
        builder.add_player(p);
    }
    let settings = builder.build().context(EngineSnafu {})?;
    info!(
        "settings: {} charts, {} players, voting from {}, drawing {}, rule {:?}",
        settings.charts.len(),
        settings.players.len(),
        settings.how_many_charts_to_vote_from,
        settings.how_many_charts_to_randomize,
        settings.weight_rule
    );
    Ok(settings)
}

/// The settings of a bare `start` action, if a configuration or a catalog was
/// given.
fn default_settings(
    config: &SessionConfig,
    root: &Path,
    args: &Args,
) -> SessionResult<Option<Settings>> {
    if args.config.is_some() || args.charts.is_some() {
        Ok(Some(build_settings(config, root, args)?))
    } else {
        Ok(None)
    }
}

/// A `start` action may come without payload, it then uses the settings of the
/// configuration.
fn parse_action(js: JSValue, default_settings: Option<&Settings>) -> SessionResult<Action> {
    let is_bare_start = js.get("type").and_then(|t| t.as_str()) == Some("start")
        && js.get("payload").map_or(true, |p| p.is_null());
    if is_bare_start {
        return match default_settings {
            Some(s) => Ok(Action::Start(s.clone())),
            None => whatever!("start action without payload needs a configuration or a chart file"),
        };
    }
    serde_json::from_value(js).context(ParsingJsonSnafu {})
}

fn read_script(path: &str) -> SessionResult<Vec<JSValue>> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})
}

/// One JSON action per line, blank lines are skipped.
fn read_action_lines<B: BufRead>(input: B) -> impl Iterator<Item = SessionResult<JSValue>> {
    input.lines().filter_map(|line_r| match line_r {
        Ok(line) if line.trim().is_empty() => None,
        Ok(line) => Some(serde_json::from_str(line.as_str()).context(ParsingJsonSnafu {})),
        Err(e) => Some(Err(e).context(ReadingActionsSnafu {})),
    })
}

fn broadcast(snapshot: &Snapshot) -> SessionResult<()> {
    let js = serde_json::to_string(snapshot).context(ParsingJsonSnafu {})?;
    println!("{}", js);
    Ok(())
}

/// Applies the actions in order. Rejected actions are reported and skipped.
pub fn run_actions<I>(
    cell: &SessionCell<StdRng>,
    actions: I,
    default_settings: Option<&Settings>,
    show_odds: bool,
) -> SessionResult<SessionOutcome>
where
    I: IntoIterator<Item = SessionResult<JSValue>>,
{
    let mut accepted = 0;
    let mut rejected = 0;
    for (idx, js_r) in actions.into_iter().enumerate() {
        let action = parse_action(js_r?, default_settings)?;
        debug!("run_actions: action {}: {:?}", idx, action);
        match cell.apply(&action) {
            Ok(snapshot) => {
                accepted += 1;
                broadcast(&snapshot)?;
                if show_odds {
                    for o in cell.odds().unwrap_or_default() {
                        info!(
                            "odds: {:>6.1}% {} ({} tickets, +{} -{})",
                            o.probability, o.chart_id, o.tickets, o.upvotes, o.downvotes
                        );
                    }
                }
            }
            Err(e) => {
                rejected += 1;
                warn!("Rejected action {} ({}): {}", idx, action.name(), e);
            }
        }
    }
    Ok(SessionOutcome {
        snapshot: cell.snapshot(),
        accepted,
        rejected,
    })
}

fn write_snapshot(snapshot: &Snapshot, out: &str) -> SessionResult<()> {
    let pretty = serde_json::to_string_pretty(snapshot).context(ParsingJsonSnafu {})?;
    if out == "stdout" {
        println!("{}", pretty);
    } else {
        info!("Writing final state to {:?}", out);
        fs::write(out, pretty).context(OpeningFileSnafu { path: out })?;
    }
    Ok(())
}

/// Fails if the final state differs from the reference.
pub fn check_reference(snapshot: &Snapshot, reference_path: &str) -> SessionResult<()> {
    let contents =
        fs::read_to_string(reference_path).context(OpeningFileSnafu { path: reference_path })?;
    let reference: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    let computed: JSValue = serde_json::to_value(snapshot).context(ParsingJsonSnafu {})?;
    let pretty_reference = serde_json::to_string_pretty(&reference).context(ParsingJsonSnafu {})?;
    let pretty_computed = serde_json::to_string_pretty(&computed).context(ParsingJsonSnafu {})?;
    if pretty_reference != pretty_computed {
        warn!("Found differences with the reference state");
        print_diff(pretty_reference.as_str(), pretty_computed.as_str(), "\n");
        whatever!("Difference detected between the final state and the reference state")
    }
    Ok(())
}

pub fn run_session(args: &Args) -> SessionResult<SessionOutcome> {
    let stdin = std::io::stdin();
    let input = stdin.lock();
    run_session_with_input(args, input)
}

/// Without a script, the actions are read from `input`.
pub fn run_session_with_input<B: BufRead>(args: &Args, input: B) -> SessionResult<SessionOutcome> {
    let (config, root): (SessionConfig, PathBuf) = match &args.config {
        Some(config_path) => {
            let config = read_session_config(config_path)?;
            let root = Path::new(config_path.as_str())
                .parent()
                .context(MissingParentDirSnafu {})?
                .to_path_buf();
            (config, root)
        }
        None => (SessionConfig::default(), PathBuf::from(".")),
    };

    let default_settings = default_settings(&config, &root, args)?;

    let rng = match args.seed.or(config.random_seed()?) {
        Some(seed) => {
            info!("Using random seed {}", seed);
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_entropy(),
    };
    let cell = SessionCell::new(rng);
    broadcast(&cell.snapshot())?;

    let outcome = match &args.script {
        Some(script_path) => {
            let actions = read_script(script_path)?;
            info!("Replaying {} actions from {:?}", actions.len(), script_path);
            run_actions(
                &cell,
                actions.into_iter().map(Ok),
                default_settings.as_ref(),
                args.odds,
            )?
        }
        None => {
            info!("Reading actions from the input");
            run_actions(
                &cell,
                read_action_lines(input),
                default_settings.as_ref(),
                args.odds,
            )?
        }
    };
    info!(
        "Done: {} actions accepted, {} rejected, final phase {}",
        outcome.accepted,
        outcome.rejected,
        outcome.snapshot.state.phase()
    );

    if let Some(out) = &args.out {
        write_snapshot(&outcome.snapshot, out)?;
    }
    if let Some(reference_path) = &args.reference {
        check_reference(&outcome.snapshot, reference_path)?;
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_dir(name: &str) -> String {
        format!("{}/tests/data/{}", env!("CARGO_MANIFEST_DIR"), name)
    }

    fn session_args(name: &str) -> Args {
        let dir = test_dir(name);
        Args {
            config: Some(format!("{}/session.json", dir)),
            script: Some(format!("{}/actions.json", dir)),
            ..Args::default()
        }
    }

    fn votes(snapshot: &Snapshot) -> Vec<CastVote> {
        match &snapshot.state {
            SessionState::Voting(v) => v.votes.clone(),
            SessionState::Resolved(r) => r.votes.clone(),
            SessionState::Idle => vec![],
        }
    }

    #[test]
    fn linear_autopick_matches_reference() {
        let dir = test_dir("linear_autopick");
        let args = Args {
            reference: Some(format!("{}/expected_state.json", dir)),
            ..session_args("linear_autopick")
        };
        let outcome = run_session(&args).unwrap();
        // One vote out of turn, one early draw.
        assert_eq!(outcome.rejected, 2);
        assert_eq!(outcome.accepted, 8);
        assert_eq!(outcome.snapshot.next_vote, None);
    }

    #[test]
    fn reference_mismatch_is_an_error() {
        let dir = test_dir("linear_autopick");
        let args = Args {
            reference: Some(format!("{}/session.json", dir)),
            ..session_args("linear_autopick")
        };
        assert!(matches!(
            run_session(&args),
            Err(SessionError::Whatever { .. })
        ));
    }

    #[test]
    fn text_sources() {
        let args = Args {
            seed: Some(3),
            ..session_args("text_sources")
        };
        let outcome = run_session(&args).unwrap();
        assert_eq!(outcome.rejected, 0);
        let r = match &outcome.snapshot.state {
            SessionState::Resolved(r) => r,
            x => panic!("not resolved: {:?}", x),
        };
        assert_eq!(r.settings.players.len(), 2);
        assert_eq!(r.settings.players[0].player_id, "players.txt-00000001");
        assert_eq!(r.settings.charts.len(), 4);
        assert_eq!(r.settings.weight_rule, WeightRule::Exponential);
        assert_eq!(r.selected_charts.len(), 2);
        assert_ne!(r.selected_charts[0], r.selected_charts[1]);
        assert_eq!(votes(&outcome.snapshot).len(), 4);
    }

    #[test]
    fn command_line_overrides_config() {
        let dir = test_dir("text_sources");
        let args = Args {
            config: Some(format!("{}/session.json", dir)),
            vote_from: Some(2),
            randomize: Some(1),
            weight_rule: Some("linear".to_string()),
            required: Some(vec![14]),
            ..Args::default()
        };
        let config = read_session_config(args.config.as_deref().unwrap()).unwrap();
        let settings = build_settings(&config, Path::new(&dir), &args).unwrap();
        assert_eq!(settings.how_many_charts_to_vote_from, 2);
        assert_eq!(settings.how_many_charts_to_randomize, 1);
        assert_eq!(settings.weight_rule, WeightRule::Linear);
        assert_eq!(settings.required_difficulties, vec![14]);
    }

    #[test]
    fn missing_difficulty_in_config() {
        let dir = test_dir("text_sources");
        let args = Args {
            config: Some(format!("{}/session.json", dir)),
            required: Some(vec![99]),
            ..Args::default()
        };
        let config = read_session_config(args.config.as_deref().unwrap()).unwrap();
        assert!(matches!(
            build_settings(&config, Path::new(&dir), &args),
            Err(SessionError::Engine {
                source: PickerError::Configuration { .. }
            })
        ));
    }

    #[test]
    fn catalog_and_players_from_the_command_line() {
        let dir = test_dir("text_sources");
        let args = Args {
            charts: Some(format!("{}/charts.txt", dir)),
            players: Some(format!("{}/players.txt", dir)),
            vote_from: Some(4),
            randomize: Some(1),
            ..Args::default()
        };
        let settings = default_settings(&SessionConfig::default(), Path::new("."), &args)
            .unwrap()
            .unwrap();
        assert_eq!(settings.charts.len(), 4);
        assert_eq!(settings.charts[3].chart_id, "charts.txt-00000004");
        assert_eq!(settings.charts[3].subtitle.as_deref(), Some("Remix"));
        let names: Vec<&str> = settings.players.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Anna", "Bob"]);
        assert_eq!(settings.required_difficulties, Vec::<u32>::new());

        let no_sources = Args::default();
        assert_eq!(
            default_settings(&SessionConfig::default(), Path::new("."), &no_sources).unwrap(),
            None
        );
    }

    #[test]
    fn excel_catalog_from_the_command_line() {
        let args = Args {
            charts: Some("/does/not/exist.xlsx".to_string()),
            charts_type: Some("xlsx".to_string()),
            ..Args::default()
        };
        assert!(matches!(
            default_settings(&SessionConfig::default(), Path::new("."), &args),
            Err(SessionError::OpeningExcel { .. })
        ));
        let args = Args {
            charts_type: Some("csv".to_string()),
            ..args
        };
        assert!(matches!(
            default_settings(&SessionConfig::default(), Path::new("."), &args),
            Err(SessionError::Whatever { .. })
        ));
    }

    #[test]
    fn actions_from_the_input() {
        let dir = test_dir("text_sources");
        let args = Args {
            charts: Some(format!("{}/charts.txt", dir)),
            players: Some(format!("{}/players.txt", dir)),
            vote_from: Some(2),
            randomize: Some(1),
            required: Some(vec![11, 12]),
            seed: Some(5),
            ..Args::default()
        };
        let input = r#"{"type": "start"}

{"type": "newVote", "payload": {"type": "downvote", "playerId": "players.txt-00000001", "chartId": "charts.txt-00000001"}}
{"type": "newVote", "payload": {"type": "downvote", "playerId": "players.txt-00000001", "chartId": "charts.txt-00000002"}}
{"type": "newVote", "payload": {"type": "downvote", "playerId": "players.txt-00000002", "chartId": "charts.txt-00000001"}}
"#;
        let outcome = run_session_with_input(&args, input.as_bytes()).unwrap();
        assert_eq!(outcome.accepted, 3);
        assert_eq!(outcome.rejected, 1);
        let v = match &outcome.snapshot.state {
            SessionState::Voting(v) => v,
            x => panic!("not voting: {:?}", x),
        };
        let pool: Vec<&str> = v.chart_pool.iter().map(|c| c.chart_id.as_str()).collect();
        assert_eq!(pool, vec!["charts.txt-00000001", "charts.txt-00000002"]);
        assert_eq!(
            outcome.snapshot.next_vote,
            Some(Vote {
                vote_type: VoteType::Upvote,
                player_id: "players.txt-00000002".to_string(),
            })
        );
    }

    #[test]
    fn action_lines() {
        let input = "{\"type\": \"start\"}\n\n{\"type\": \"undoVote\"}\n{\"type\": \"reset\"}\n";
        let lines: Vec<JSValue> = read_action_lines(input.as_bytes())
            .collect::<SessionResult<Vec<JSValue>>>()
            .unwrap();
        assert_eq!(lines.len(), 3);
        let settings = Builder::new(0, 0).build().unwrap();
        let cell = SessionCell::new(StdRng::seed_from_u64(0));
        let outcome = run_actions(&cell, lines.into_iter().map(Ok), Some(&settings), true).unwrap();
        assert_eq!(outcome.accepted, 3);
        assert_eq!(outcome.snapshot.state, SessionState::Idle);
    }

    #[test]
    fn bare_start_without_settings() {
        let cell = SessionCell::new(StdRng::seed_from_u64(0));
        let actions = vec![Ok(serde_json::json!({"type": "start"}))];
        assert!(run_actions(&cell, actions, None, false).is_err());
    }

    #[test]
    fn malformed_action() {
        let cell = SessionCell::new(StdRng::seed_from_u64(0));
        let actions = vec![Ok(serde_json::json!({"type": "castLots"}))];
        assert!(matches!(
            run_actions(&cell, actions, None, false),
            Err(SessionError::ParsingJson { .. })
        ));
    }
}
