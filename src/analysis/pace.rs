use tracing::debug;

use crate::analysis::{column, mean, most_recent, round1};
use crate::error::Result;
use crate::types::{GameRecord, PaceGroupSummary, PaceImpact, StatColumn};

/// Lightweight possession estimate: `FGA - OREB + TOV`. Not clamped at zero.
pub fn possessions(game: &GameRecord) -> Result<f64> {
    Ok(game.stat(StatColumn::FieldGoalAttempts)? - game.stat(StatColumn::OffensiveRebounds)?
        + game.stat(StatColumn::Turnovers)?)
}

/// Quantile `q` of ascending `sorted` by linear interpolation between closest ranks
/// (`h = (n - 1) * q`). `None` for an empty slice.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let h = (sorted.len() - 1) as f64 * q;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    Some(sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo]))
}

/// Averages by pace tertile over the `last_n_games` most recent games.
///
/// `high_pace` is `POSS >= p67`, `low_pace` is `POSS <= p33` and `medium_pace` the
/// open interval between. When p33 and p67 coincide a game can land in both
/// outer groups. Empty groups are omitted.
pub fn pace_impact(records: &[GameRecord], last_n_games: usize) -> Result<PaceImpact> {
    let window = most_recent(records, Some(last_n_games))
        .map_err(|e| e.context(format!("last_n_games={last_n_games}")))?;
    let poss = window
        .iter()
        .map(|g| possessions(g))
        .collect::<Result<Vec<f64>>>()?;

    let mut sorted = poss.clone();
    sorted.sort_by(f64::total_cmp);
    let (Some(p33), Some(p67)) = (quantile(&sorted, 0.33), quantile(&sorted, 0.67)) else {
        return Ok(PaceImpact::default());
    };
    debug!(games = window.len(), p33, p67, "pace thresholds");

    Ok(PaceImpact {
        high_pace: pace_group(&select(&window, &poss, |p| p >= p67))?,
        medium_pace: pace_group(&select(&window, &poss, |p| p < p67 && p > p33))?,
        low_pace: pace_group(&select(&window, &poss, |p| p <= p33))?,
    })
}

fn select<'a>(
    window: &[&'a GameRecord],
    poss: &[f64],
    keep: impl Fn(f64) -> bool,
) -> Vec<(&'a GameRecord, f64)> {
    window
        .iter()
        .zip(poss)
        .filter(|(_, p)| keep(**p))
        .map(|(g, p)| (*g, *p))
        .collect()
}

fn pace_group(games: &[(&GameRecord, f64)]) -> Result<Option<PaceGroupSummary>> {
    if games.is_empty() {
        return Ok(None);
    }
    let records: Vec<&GameRecord> = games.iter().map(|(g, _)| *g).collect();
    let poss: Vec<f64> = games.iter().map(|(_, p)| *p).collect();
    Ok(Some(PaceGroupSummary {
        games_played: records.len(),
        avg_points: round1(mean(&column(&records, StatColumn::Points)?)),
        avg_assists: round1(mean(&column(&records, StatColumn::Assists)?)),
        avg_rebounds: round1(mean(&column(&records, StatColumn::Rebounds)?)),
        avg_minutes: round1(mean(&column(&records, StatColumn::Minutes)?)),
        avg_possessions: round1(mean(&poss)),
    }))
}
