// ********* Input data structures ***********

use serde::{Deserialize, Serialize};
use snafu::Snafu;
use std::fmt::Display;

/// A chart that can be voted on and drawn.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Serialize, Deserialize)]
pub struct Chart {
    #[serde(rename = "chartId")]
    pub chart_id: String,
    #[serde(rename = "difficultyRating")]
    pub difficulty_rating: u32,
    pub title: String,
    pub subtitle: Option<String>,
}

/// A participant. The position in the player list is the turn order.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Serialize, Deserialize)]
pub struct Player {
    #[serde(rename = "playerId")]
    pub player_id: String,
    pub name: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteType {
    Upvote,
    Downvote,
}

impl Display for VoteType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VoteType::Upvote => write!(f, "upvote"),
            VoteType::Downvote => write!(f, "downvote"),
        }
    }
}

/// Whose turn it is, and in which direction.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Serialize, Deserialize)]
pub struct Vote {
    #[serde(rename = "type")]
    pub vote_type: VoteType,
    #[serde(rename = "playerId")]
    pub player_id: String,
}

impl Display for Vote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} by {}", self.vote_type, self.player_id)
    }
}

/// A vote that has been cast on a chart of the pool.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Serialize, Deserialize)]
pub struct CastVote {
    #[serde(rename = "type")]
    pub vote_type: VoteType,
    #[serde(rename = "playerId")]
    pub player_id: String,
    #[serde(rename = "chartId")]
    pub chart_id: String,
}

impl CastVote {
    pub fn new(vote_type: VoteType, player_id: &str, chart_id: &str) -> CastVote {
        CastVote {
            vote_type,
            player_id: player_id.to_string(),
            chart_id: chart_id.to_string(),
        }
    }

    /// The turn this vote claims.
    pub fn turn(&self) -> Vote {
        Vote {
            vote_type: self.vote_type,
            player_id: self.player_id.clone(),
        }
    }

    pub(crate) fn matches(&self, vote: &Vote) -> bool {
        self.vote_type == vote.vote_type && self.player_id == vote.player_id
    }
}

// ********* Configuration **********

/// How the tickets of a chart are computed from its votes for the final draw.
///
/// - Exponential: every chart starts at 100 tickets, each net upvote doubles
/// them and each net downvote halves them (rounded up). No chart is ever
/// fully excluded.
///
/// - Linear: every chart starts with one ticket per player, plus one per
/// upvote, minus one per downvote. A chart reaching twice the player count is
/// picked outright, a chart at zero is only picked when nothing else is left.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightRule {
    Exponential,
    Linear,
}

impl Default for WeightRule {
    fn default() -> Self {
        WeightRule::Exponential
    }
}

/// Everything needed to start a session.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub charts: Vec<Chart>,
    /// Order matters: the first player downvotes first and upvotes last.
    pub players: Vec<Player>,
    #[serde(rename = "howManyChartsToVoteFrom")]
    pub how_many_charts_to_vote_from: usize,
    #[serde(rename = "howManyChartsToRandomize")]
    pub how_many_charts_to_randomize: usize,
    #[serde(rename = "requiredDifficulties", default)]
    pub required_difficulties: Vec<u32>,
    #[serde(rename = "weightRule", default)]
    pub weight_rule: WeightRule,
}

// ******** Session state *********

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Voting,
    Resolved,
}

impl Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Idle => write!(f, "idle"),
            Phase::Voting => write!(f, "voting"),
            Phase::Resolved => write!(f, "resolved"),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Voting {
    pub settings: Settings,
    #[serde(rename = "chartPool")]
    pub chart_pool: Vec<Chart>,
    pub votes: Vec<CastVote>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Resolved {
    pub settings: Settings,
    pub votes: Vec<CastVote>,
    #[serde(rename = "selectedCharts")]
    pub selected_charts: Vec<Chart>,
}

/// The state of the single session.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Voting(Voting),
    Resolved(Resolved),
}

impl SessionState {
    pub fn phase(&self) -> Phase {
        match self {
            SessionState::Idle => Phase::Idle,
            SessionState::Voting(_) => Phase::Voting,
            SessionState::Resolved(_) => Phase::Resolved,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        SessionState::Idle
    }
}

/// The state as it is sent to subscribers, with whose turn it is.
/// The next vote is derived, it is never stored in the session.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(flatten)]
    pub state: SessionState,
    #[serde(rename = "nextVote")]
    pub next_vote: Option<Vote>,
}

/// The inputs accepted by the session.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Action {
    Start(Settings),
    NewVote(CastVote),
    MakePicks,
    UndoVote,
    Reset,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Start(_) => "start",
            Action::NewVote(_) => "newVote",
            Action::MakePicks => "makePicks",
            Action::UndoVote => "undoVote",
            Action::Reset => "reset",
        }
    }
}

// ******** Output data structures *********

/// The chances of a pool chart on the next draw.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ChartOdds {
    #[serde(rename = "chartId")]
    pub chart_id: String,
    pub upvotes: u32,
    pub downvotes: u32,
    pub tickets: u64,
    pub guaranteed: bool,
    /// In percent.
    pub probability: f64,
}

// ******** Errors *********

/// A session that cannot be started with the given settings.
#[derive(Eq, PartialEq, Debug, Clone, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ConfigError {
    #[snafu(display("No charts exist for difficulty {difficulty}"))]
    MissingDifficulty { difficulty: u32 },
    #[snafu(display("The chart pool needs {pool_size} charts but the catalog is empty"))]
    EmptyCatalog { pool_size: usize },
    #[snafu(display("Chart id {chart_id} is used more than once"))]
    DuplicateChart { chart_id: String },
    #[snafu(display("Player id {player_id} is used more than once"))]
    DuplicatePlayer { player_id: String },
}

/// Errors that prevent an operation on the session from completing.
/// The session is left as it was.
#[derive(Eq, PartialEq, Debug, Clone, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum PickerError {
    #[snafu(display("Invalid settings: {source}"))]
    Configuration { source: ConfigError },
    #[snafu(display("Illegal phase: cannot {operation} while {phase}"))]
    IllegalPhase {
        operation: &'static str,
        phase: Phase,
    },
    #[snafu(display("No votes left to make"))]
    NoVotesLeft {},
    #[snafu(display("This vote cannot be made right now: expected {expected}, got {got}"))]
    OutOfTurn { expected: Vote, got: Vote },
    #[snafu(display("Chart {chart_id} does not exist in pool"))]
    UnknownChart { chart_id: String },
    #[snafu(display("There are votes left to make, next is {next}"))]
    VotesRemaining { next: Vote },
}

pub type PickerResult<T> = Result<T, PickerError>;
