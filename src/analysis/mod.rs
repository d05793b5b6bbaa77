//! Pure analytics over a player's game records.
//!
//! Every analysis borrows the caller's records, orders references to them
//! most-recent-first and never reorders or mutates the slice itself, so the
//! same records can be analysed concurrently from several handlers.

pub mod consistency;
pub mod hit_rate;
pub mod matchup;
pub mod pace;
pub mod splits;

pub use consistency::consistency_score;
pub use hit_rate::{HitRateEngine, ThresholdLadder};
pub use matchup::matchup_history;
pub use pace::pace_impact;
pub use splits::{home_away_splits, rest_day_impact};

use crate::error::{AppError, Result};
use crate::types::{GameRecord, StatColumn};

/// Records sorted by `game_date` descending, truncated to `window` when given.
/// Games sharing a date keep their input order.
pub fn most_recent(records: &[GameRecord], window: Option<usize>) -> Result<Vec<&GameRecord>> {
    if window == Some(0) {
        return Err(AppError::InvalidArgument(
            "window size must be at least 1 game".to_string(),
        ));
    }
    let mut sorted: Vec<&GameRecord> = records.iter().collect();
    sorted.sort_by(|a, b| b.game_date.cmp(&a.game_date));
    if let Some(n) = window {
        sorted.truncate(n);
    }
    Ok(sorted)
}

/// One column across a set of games; fails on the first game missing it.
pub(crate) fn column(games: &[&GameRecord], column: StatColumn) -> Result<Vec<f64>> {
    games.iter().map(|g| g.stat(column)).collect()
}

/// Arithmetic mean. `values` must be non-empty.
pub(crate) fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation. `values` must be non-empty.
pub(crate) fn population_std_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

pub(crate) fn min_max(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)))
}

/// `"{min}-{max}"` with both ends truncated to integers. `values` must be non-empty.
pub(crate) fn range_label(values: &[f64]) -> String {
    let (lo, hi) = min_max(values);
    format!("{}-{}", lo.trunc() as i64, hi.trunc() as i64)
}

/// Round half to even at `places` decimals.
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round_ties_even() / factor
}

pub(crate) fn round1(value: f64) -> f64 {
    round_to(value, 1)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::NaiveDate;

    use crate::types::{GameRecord, StatColumn};

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// A game on 2024-01-`day` with every column populated from `stats`
    /// in `StatColumn::ALL` order; unspecified trailing columns default to 0.
    pub fn game(day: u32, matchup: &str, stats: &[f64]) -> GameRecord {
        let mut record = GameRecord::new(date(2024, 1, day), matchup);
        for (i, column) in StatColumn::ALL.into_iter().enumerate() {
            record.set_stat(column, Some(stats.get(i).copied().unwrap_or(0.0)));
        }
        record
    }

    /// A game carrying only a points value.
    pub fn points_game(day: u32, points: f64) -> GameRecord {
        game(day, "LAL vs. BOS", &[points])
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn most_recent_sorts_without_touching_input() {
        let records = vec![points_game(3, 10.0), points_game(9, 20.0), points_game(5, 30.0)];
        let window = most_recent(&records, Some(2)).unwrap();
        let days: Vec<u32> = window.iter().map(|g| chrono::Datelike::day(&g.game_date)).collect();
        assert_eq!(days, vec![9, 5]);
        assert_eq!(records[0].stat(StatColumn::Points).unwrap(), 10.0);
    }

    #[test]
    fn most_recent_tolerates_short_input() {
        let records = vec![points_game(1, 10.0)];
        assert_eq!(most_recent(&records, Some(50)).unwrap().len(), 1);
        assert_eq!(most_recent(&records, None).unwrap().len(), 1);
    }

    #[test]
    fn zero_window_is_rejected() {
        let err = most_recent(&[], Some(0)).unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
    }

    #[test]
    fn rounding_is_half_even() {
        assert_eq!(round_to(0.25, 1), 0.2);
        assert_eq!(round_to(0.75, 1), 0.8);
        assert_eq!(round_to(1.25, 1), 1.2);
        assert_eq!(round_to(66.666_666, 2), 66.67);
    }

    #[test]
    fn moments() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&values), 5.0);
        assert_eq!(population_std_dev(&values), 2.0);
        assert_eq!(range_label(&values), "2-9");
    }
}
