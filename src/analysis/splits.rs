use tracing::debug;

use crate::analysis::matchup::is_home_game;
use crate::analysis::{column, mean, min_max, most_recent, round1};
use crate::config::OLDEST_GAME_REST_DAYS;
use crate::error::Result;
use crate::types::{
    GameRecord, HomeAwaySplits, RestGroupSummary, RestImpact, SplitStats, SplitSummary,
    StatColumn, StatRange,
};

/// Per-venue averages and extremes over the most recent `last_n_games` (all games when `None`).
pub fn home_away_splits(
    records: &[GameRecord],
    last_n_games: Option<usize>,
) -> Result<HomeAwaySplits> {
    let window = most_recent(records, last_n_games)?;
    let (home, away): (Vec<&GameRecord>, Vec<&GameRecord>) =
        window.into_iter().partition(|g| is_home_game(&g.matchup));
    debug!(home = home.len(), away = away.len(), "home/away partitions");

    Ok(HomeAwaySplits {
        home: split_summary(&home)?,
        away: split_summary(&away)?,
    })
}

fn split_summary(games: &[&GameRecord]) -> Result<SplitSummary> {
    if games.is_empty() {
        return Ok(SplitSummary {
            games_played: 0,
            stats: None,
        });
    }
    let range = |stat| -> Result<StatRange> {
        let values = column(games, stat)?;
        let (lo, hi) = min_max(&values);
        Ok(StatRange {
            avg: round1(mean(&values)),
            min: round1(lo).trunc() as i64,
            max: round1(hi).trunc() as i64,
        })
    };
    Ok(SplitSummary {
        games_played: games.len(),
        stats: Some(SplitStats {
            points: range(StatColumn::Points)?,
            assists: range(StatColumn::Assists)?,
            rebounds: range(StatColumn::Rebounds)?,
            threes: range(StatColumn::Threes)?,
            steals: range(StatColumn::Steals)?,
            blocks: range(StatColumn::Blocks)?,
        }),
    })
}

/// Days off before each game in a most-recent-first window: the gap to the next
/// older game minus one. The oldest game has nothing to measure against and gets
/// `OLDEST_GAME_REST_DAYS`.
pub fn days_of_rest(window: &[&GameRecord]) -> Vec<i64> {
    window
        .iter()
        .enumerate()
        .map(|(i, game)| match window.get(i + 1) {
            Some(older) => (game.game_date - older.game_date).num_days() - 1,
            None => OLDEST_GAME_REST_DAYS,
        })
        .collect()
}

/// Averages grouped by rest before the game. Games with a negative rest value
/// (same-day duplicates, bad dates) land in no bucket; empty buckets are omitted.
pub fn rest_day_impact(records: &[GameRecord], last_n_games: Option<usize>) -> Result<RestImpact> {
    let window = most_recent(records, last_n_games)?;
    let rest = days_of_rest(&window);

    let mut back_to_back = Vec::new();
    let mut one_day = Vec::new();
    let mut two_plus = Vec::new();
    for (game, days) in window.iter().zip(rest) {
        match days {
            0 => back_to_back.push(*game),
            1 => one_day.push(*game),
            d if d >= 2 => two_plus.push(*game),
            _ => {}
        }
    }
    debug!(
        back_to_back = back_to_back.len(),
        one_day = one_day.len(),
        two_plus = two_plus.len(),
        "rest buckets"
    );

    Ok(RestImpact {
        back_to_back: rest_group(&back_to_back)?,
        one_day_rest: rest_group(&one_day)?,
        two_plus_days_rest: rest_group(&two_plus)?,
    })
}

fn rest_group(games: &[&GameRecord]) -> Result<Option<RestGroupSummary>> {
    if games.is_empty() {
        return Ok(None);
    }
    Ok(Some(RestGroupSummary {
        games_played: games.len(),
        avg_points: round1(mean(&column(games, StatColumn::Points)?)),
        avg_assists: round1(mean(&column(games, StatColumn::Assists)?)),
        avg_rebounds: round1(mean(&column(games, StatColumn::Rebounds)?)),
        avg_minutes: round1(mean(&column(games, StatColumn::Minutes)?)),
    }))
}
