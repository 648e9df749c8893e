use log::debug;
use rand::Rng;

use crate::config::*;

const INITIAL_TICKETS: u64 = 100;

#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub(crate) struct Tally {
    pub(crate) upvotes: u32,
    pub(crate) downvotes: u32,
}

impl Tally {
    pub(crate) fn of(votes: &[CastVote], chart_id: &str) -> Tally {
        let mut tally = Tally::default();
        for v in votes.iter().filter(|v| v.chart_id == chart_id) {
            match v.vote_type {
                VoteType::Upvote => tally.upvotes += 1,
                VoteType::Downvote => tally.downvotes += 1,
            }
        }
        tally
    }

    fn net(&self) -> i64 {
        self.upvotes as i64 - self.downvotes as i64
    }
}

/// The number of tickets a chart holds in the draw bag.
///
/// For the exponential rule this is `ceil(100 * 2^(up - down))`, floored at 1
/// and saturated at `u64::MAX`. It strictly increases with the net votes from
/// -7 to 58: below that range every chart holds 1 ticket, above it every chart
/// holds `u64::MAX`. For the linear rule it is `players + up - down`, floored
/// at zero.
pub fn tickets(rule: WeightRule, num_players: usize, upvotes: u32, downvotes: u32) -> u64 {
    let tally = Tally { upvotes, downvotes };
    match rule {
        WeightRule::Exponential => exponential_tickets(tally.net()),
        WeightRule::Linear => {
            let w = num_players as i64 + tally.net();
            w.max(0) as u64
        }
    }
}

fn exponential_tickets(net: i64) -> u64 {
    if net >= 0 {
        // 100 * 2^net, exact in integers.
        u32::try_from(net)
            .ok()
            .and_then(|shift| 1u64.checked_shl(shift))
            .and_then(|factor| INITIAL_TICKETS.checked_mul(factor))
            .unwrap_or(u64::MAX)
    } else {
        // ceil(100 / 2^|net|)
        match u32::try_from(-net) {
            Ok(shift) if shift < 64 => {
                let divisor = 1u64 << shift;
                (INITIAL_TICKETS + divisor - 1) / divisor
            }
            _ => 1,
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
struct Entry<'a> {
    chart: &'a Chart,
    tally: Tally,
    tickets: u64,
}

/// What the next draw is going to do with the remaining entries.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
enum DrawKind {
    /// The entry at this index is drawn no matter what.
    Forced(usize),
    /// Sample within the bag of all the tickets, this is the total.
    Bag(u128),
}

fn prepare_entries<'a>(rule: WeightRule, num_players: usize, voting: &'a Voting) -> Vec<Entry<'a>> {
    let mut entries: Vec<Entry<'a>> = Vec::new();
    for chart in voting.chart_pool.iter() {
        // The same chart may appear twice when a difficulty is required twice.
        if entries.iter().any(|e| e.chart.chart_id == chart.chart_id) {
            continue;
        }
        let tally = Tally::of(&voting.votes, &chart.chart_id);
        entries.push(Entry {
            chart,
            tally,
            tickets: tickets(rule, num_players, tally.upvotes, tally.downvotes),
        });
    }
    entries
}

fn draw_kind(rule: WeightRule, num_players: usize, entries: &[Entry]) -> DrawKind {
    if rule == WeightRule::Linear {
        let auto_pick = 2 * num_players as u64;
        if num_players > 0 {
            if let Some(idx) = entries.iter().position(|e| e.tickets >= auto_pick) {
                return DrawKind::Forced(idx);
            }
        }
    }
    let total: u128 = entries.iter().map(|e| e.tickets as u128).sum();
    if total == 0 {
        // Only excluded charts left: take the first one.
        if let Some(idx) = entries.iter().position(|e| e.tickets == 0) {
            return DrawKind::Forced(idx);
        }
    }
    DrawKind::Bag(total)
}

fn pick_from_bag<R: Rng + ?Sized>(entries: &[Entry], total: u128, rng: &mut R) -> usize {
    let mut ticket = rng.gen_range(0..total);
    for (idx, e) in entries.iter().enumerate() {
        let t = e.tickets as u128;
        if ticket < t {
            return idx;
        }
        ticket -= t;
    }
    // The ticket is always below the total.
    entries.len() - 1
}

/// Draws up to `how_many_charts_to_randomize` charts from the pool without
/// replacement, in the order of the draws.
pub(crate) fn draw_charts<R: Rng + ?Sized>(voting: &Voting, rng: &mut R) -> Vec<Chart> {
    let settings = &voting.settings;
    let rule = settings.weight_rule;
    let num_players = settings.players.len();
    let mut remaining = prepare_entries(rule, num_players, voting);
    let num_draws = settings.how_many_charts_to_randomize.min(remaining.len());
    debug!(
        "draw_charts: {} draws among {} charts, rule {:?}",
        num_draws,
        remaining.len(),
        rule
    );

    let mut selected: Vec<Chart> = Vec::new();
    for round in 0..num_draws {
        let idx = match draw_kind(rule, num_players, &remaining) {
            DrawKind::Forced(idx) => {
                debug!(
                    "draw_charts: draw {}: forced pick {:?}",
                    round, remaining[idx].chart.chart_id
                );
                idx
            }
            DrawKind::Bag(total) => {
                let idx = pick_from_bag(&remaining, total, rng);
                debug!(
                    "draw_charts: draw {}: {:?} with {} of {} tickets",
                    round, remaining[idx].chart.chart_id, remaining[idx].tickets, total
                );
                idx
            }
        };
        let entry = remaining.remove(idx);
        selected.push(entry.chart.clone());
    }
    selected
}

/// The odds of every chart of the pool to come out first in the draw,
/// given the votes so far.
pub fn draw_odds(voting: &Voting) -> Vec<ChartOdds> {
    let rule = voting.settings.weight_rule;
    let num_players = voting.settings.players.len();
    let entries = prepare_entries(rule, num_players, voting);
    let kind = draw_kind(rule, num_players, &entries);
    entries
        .iter()
        .enumerate()
        .map(|(idx, e)| {
            let (guaranteed, probability) = match kind {
                DrawKind::Forced(forced) => (forced == idx, if forced == idx { 100.0 } else { 0.0 }),
                DrawKind::Bag(total) => (false, (e.tickets as f64 / total as f64) * 100.0),
            };
            ChartOdds {
                chart_id: e.chart.chart_id.clone(),
                upvotes: e.tally.upvotes,
                downvotes: e.tally.downvotes,
                tickets: e.tickets,
                guaranteed,
                probability,
            }
        })
        .collect()
}
