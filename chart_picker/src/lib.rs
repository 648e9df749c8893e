mod config;
mod draw;

pub mod builder;
pub mod cell;
pub mod manual;

use log::{debug, info};
use rand::seq::SliceRandom;
use rand::Rng;
use snafu::prelude::*;

use std::collections::HashSet;

pub use crate::config::*;
pub use crate::draw::{draw_odds, tickets};

/// The state before any session has been started.
pub const INITIAL_STATE: SessionState = SessionState::Idle;

// **** Validation ****

pub(crate) fn validate_settings(settings: &Settings) -> Result<(), ConfigError> {
    let mut chart_ids: HashSet<&str> = HashSet::new();
    for c in settings.charts.iter() {
        ensure!(
            chart_ids.insert(c.chart_id.as_str()),
            DuplicateChartSnafu {
                chart_id: c.chart_id.clone()
            }
        );
    }
    let mut player_ids: HashSet<&str> = HashSet::new();
    for p in settings.players.iter() {
        ensure!(
            player_ids.insert(p.player_id.as_str()),
            DuplicatePlayerSnafu {
                player_id: p.player_id.clone()
            }
        );
    }
    let pool_size = settings.how_many_charts_to_vote_from;
    ensure!(
        pool_size == 0 || !settings.charts.is_empty(),
        EmptyCatalogSnafu { pool_size }
    );
    for &difficulty in settings.required_difficulties.iter() {
        ensure!(
            settings
                .charts
                .iter()
                .any(|c| c.difficulty_rating == difficulty),
            MissingDifficultySnafu { difficulty }
        );
    }
    Ok(())
}

/// Selects the charts that will be voted on.
///
/// One chart of each required difficulty comes first, in the order of the
/// required difficulties. The rest of the pool is sampled uniformly among the
/// charts not picked yet.
fn build_chart_pool<R: Rng + ?Sized>(
    settings: &Settings,
    rng: &mut R,
) -> Result<Vec<Chart>, ConfigError> {
    validate_settings(settings)?;

    let mut required_charts: Vec<Chart> = Vec::new();
    for &difficulty in settings.required_difficulties.iter() {
        let of_difficulty: Vec<&Chart> = settings
            .charts
            .iter()
            .filter(|c| c.difficulty_rating == difficulty)
            .collect();
        // Never empty, validate_settings checked every required difficulty.
        if let Some(picked) = of_difficulty.choose(rng) {
            debug!(
                "build_chart_pool: required difficulty {}: picked {:?}",
                difficulty, picked.chart_id
            );
            required_charts.push((*picked).clone());
        }
    }

    // A repeated difficulty may pick the same chart several times, each pick
    // still takes one slot of the pool.
    let remaining = settings
        .how_many_charts_to_vote_from
        .saturating_sub(required_charts.len());
    let others: Vec<&Chart> = settings
        .charts
        .iter()
        .filter(|c| !required_charts.iter().any(|r| r.chart_id == c.chart_id))
        .collect();
    debug!(
        "build_chart_pool: sampling {} charts among {} others",
        remaining,
        others.len()
    );

    let mut pool = required_charts;
    pool.extend(others.choose_multiple(rng, remaining).map(|c| (*c).clone()));
    Ok(pool)
}

// **** Operations ****

/// Starts a session. The chart pool is decided here and never changes
/// afterwards.
pub fn start<R: Rng + ?Sized>(
    state: &SessionState,
    settings: &Settings,
    rng: &mut R,
) -> PickerResult<SessionState> {
    ensure!(
        *state == SessionState::Idle,
        IllegalPhaseSnafu {
            operation: "start",
            phase: state.phase()
        }
    );
    let chart_pool = build_chart_pool(settings, rng).context(ConfigurationSnafu)?;
    info!(
        "start: {} players voting on {} charts: {:?}",
        settings.players.len(),
        chart_pool.len(),
        chart_pool.iter().map(|c| &c.chart_id).collect::<Vec<_>>()
    );
    Ok(SessionState::Voting(Voting {
        settings: settings.clone(),
        chart_pool,
        votes: Vec::new(),
    }))
}

fn next_vote_voting(voting: &Voting) -> Option<Vote> {
    let has_voted = |player_id: &str, vote_type: VoteType| {
        voting
            .votes
            .iter()
            .any(|v| v.vote_type == vote_type && v.player_id == player_id)
    };
    let players = &voting.settings.players;

    // Downvotes go in player order, then upvotes in reverse order: the last
    // one to downvote is the first one to upvote.
    if let Some(p) = players
        .iter()
        .find(|p| !has_voted(&p.player_id, VoteType::Downvote))
    {
        return Some(Vote {
            vote_type: VoteType::Downvote,
            player_id: p.player_id.clone(),
        });
    }
    players
        .iter()
        .rev()
        .find(|p| !has_voted(&p.player_id, VoteType::Upvote))
        .map(|p| Vote {
            vote_type: VoteType::Upvote,
            player_id: p.player_id.clone(),
        })
}

/// Whose turn it is. None outside of the voting phase, or when every player
/// has cast both votes.
pub fn next_vote(state: &SessionState) -> Option<Vote> {
    match state {
        SessionState::Voting(voting) => next_vote_voting(voting),
        _ => None,
    }
}

/// Records a vote, if it is the turn of this player for this kind of vote and
/// the chart is in the pool.
pub fn cast_vote(state: &SessionState, vote: &CastVote) -> PickerResult<SessionState> {
    let voting = match state {
        SessionState::Voting(voting) => voting,
        _ => {
            return IllegalPhaseSnafu {
                operation: "vote",
                phase: state.phase(),
            }
            .fail()
        }
    };
    let expected = next_vote_voting(voting).context(NoVotesLeftSnafu)?;
    ensure!(
        vote.matches(&expected),
        OutOfTurnSnafu {
            expected,
            got: vote.turn()
        }
    );
    ensure!(
        voting.chart_pool.iter().any(|c| c.chart_id == vote.chart_id),
        UnknownChartSnafu {
            chart_id: vote.chart_id.clone()
        }
    );
    debug!("cast_vote: {} on {}", vote.turn(), vote.chart_id);

    let mut votes = voting.votes.clone();
    votes.push(vote.clone());
    Ok(SessionState::Voting(Voting {
        votes,
        ..voting.clone()
    }))
}

/// Removes the last vote. Nothing happens if no vote was cast yet.
pub fn undo_vote(state: &SessionState) -> PickerResult<SessionState> {
    match state {
        SessionState::Voting(voting) => {
            let mut voting = voting.clone();
            if let Some(v) = voting.votes.pop() {
                debug!("undo_vote: removed {} on {}", v.turn(), v.chart_id);
            }
            Ok(SessionState::Voting(voting))
        }
        _ => IllegalPhaseSnafu {
            operation: "undo a vote",
            phase: state.phase(),
        }
        .fail(),
    }
}

/// Draws the final charts once all the votes are in.
pub fn resolve<R: Rng + ?Sized>(state: &SessionState, rng: &mut R) -> PickerResult<SessionState> {
    let voting = match state {
        SessionState::Voting(voting) => voting,
        _ => {
            return IllegalPhaseSnafu {
                operation: "make picks",
                phase: state.phase(),
            }
            .fail()
        }
    };
    if let Some(next) = next_vote_voting(voting) {
        return VotesRemainingSnafu { next }.fail();
    }
    let selected_charts = draw::draw_charts(voting, rng);
    info!(
        "resolve: selected {:?}",
        selected_charts.iter().map(|c| &c.chart_id).collect::<Vec<_>>()
    );
    Ok(SessionState::Resolved(Resolved {
        settings: voting.settings.clone(),
        votes: voting.votes.clone(),
        selected_charts,
    }))
}

/// Discards the session, whatever its phase.
pub fn reset() -> SessionState {
    INITIAL_STATE
}

/// Runs one action against the state.
pub fn apply<R: Rng + ?Sized>(
    state: &SessionState,
    action: &Action,
    rng: &mut R,
) -> PickerResult<SessionState> {
    match action {
        Action::Start(settings) => start(state, settings, rng),
        Action::NewVote(vote) => cast_vote(state, vote),
        Action::MakePicks => resolve(state, rng),
        Action::UndoVote => undo_vote(state),
        Action::Reset => Ok(reset()),
    }
}

impl Snapshot {
    /// The view of the state that is sent to the subscribers.
    pub fn of(state: &SessionState) -> Snapshot {
        Snapshot {
            state: state.clone(),
            next_vote: next_vote(state),
        }
    }
}
