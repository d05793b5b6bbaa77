use tracing::debug;

use crate::analysis::{column, mean, most_recent, population_std_dev, range_label, round1};
use crate::error::{AppError, Result};
use crate::types::{ConsistencyReport, GameRecord, StatColumn};

/// 0–100 steadiness score for one tracked stat over the `last_n_games` most recent games.
///
/// The score is `100 * (1 - cv)` clamped to `[0, 100]`, where `cv` is the population
/// coefficient of variation. A window averaging zero has an infinite `cv` and scores 0.
pub fn consistency_score(
    records: &[GameRecord],
    stat_type: &str,
    last_n_games: usize,
) -> Result<ConsistencyReport> {
    let stat = StatColumn::from_tracked_code(stat_type)?;
    let window = most_recent(records, Some(last_n_games))
        .map_err(|e| e.context(format!("last_n_games={last_n_games}")))?;
    if window.is_empty() {
        return Err(AppError::InvalidInput(format!(
            "no games to score {stat} consistency over"
        )));
    }

    let values = column(&window, stat)?;
    let avg = mean(&values);
    let std_dev = population_std_dev(&values);
    let cv = if avg > 0.0 { std_dev / avg } else { f64::INFINITY };
    let score = (100.0 * (1.0 - cv)).clamp(0.0, 100.0);
    debug!(%stat, games = values.len(), cv, "consistency computed");

    Ok(ConsistencyReport {
        consistency_score: round1(score),
        average: round1(avg),
        std_dev: round1(std_dev),
        median: round1(median(&values)),
        range: range_label(&values),
        games_analyzed: values.len(),
    })
}

/// Middle value, or the mean of the two middle values. `values` must be non-empty.
fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fixtures::*;

    fn points_series(points: &[f64]) -> Vec<GameRecord> {
        points
            .iter()
            .enumerate()
            .map(|(i, p)| points_game(i as u32 + 1, *p))
            .collect()
    }

    #[test]
    fn steady_stat_scores_100() {
        let report =
            consistency_score(&points_series(&[10.0, 10.0, 10.0, 10.0]), "PTS", 20).unwrap();
        assert_eq!(report.consistency_score, 100.0);
        assert_eq!(report.std_dev, 0.0);
        assert_eq!(report.range, "10-10");
        assert_eq!(report.games_analyzed, 4);
    }

    #[test]
    fn all_zero_window_scores_0() {
        let report =
            consistency_score(&points_series(&[0.0, 0.0, 0.0, 0.0]), "PTS", 20).unwrap();
        assert_eq!(report.consistency_score, 0.0);
        assert_eq!(report.average, 0.0);
    }

    #[test]
    fn score_tracks_relative_dispersion() {
        // mean 20, population std dev 10 => cv 0.5 => 50.
        let report =
            consistency_score(&points_series(&[10.0, 30.0, 10.0, 30.0]), "PTS", 20).unwrap();
        assert_eq!(report.consistency_score, 50.0);
        assert_eq!(report.average, 20.0);
        assert_eq!(report.std_dev, 10.0);
        assert_eq!(report.median, 20.0);
        assert_eq!(report.range, "10-30");

        // Same spread around a higher mean is steadier.
        let shifted =
            consistency_score(&points_series(&[30.0, 50.0, 30.0, 50.0]), "PTS", 20).unwrap();
        assert!(shifted.consistency_score > report.consistency_score);
    }

    #[test]
    fn huge_dispersion_clamps_to_zero() {
        let report =
            consistency_score(&points_series(&[0.0, 0.0, 0.0, 40.0]), "PTS", 20).unwrap();
        assert_eq!(report.consistency_score, 0.0);
    }

    #[test]
    fn only_recent_games_count() {
        // Oldest game (day 1) is the outlier and falls outside a 3-game window.
        let report =
            consistency_score(&points_series(&[99.0, 20.0, 20.0, 20.0]), "PTS", 3).unwrap();
        assert_eq!(report.games_analyzed, 3);
        assert_eq!(report.consistency_score, 100.0);
    }

    #[test]
    fn odd_median() {
        let report =
            consistency_score(&points_series(&[3.0, 9.0, 4.0]), "PTS", 20).unwrap();
        assert_eq!(report.median, 4.0);
    }

    #[test]
    fn reads_requested_column() {
        let records = vec![
            game(1, "LAL @ BOS", &[30.0, 0.0, 0.0, 4.0]),
            game(2, "LAL @ BOS", &[10.0, 0.0, 0.0, 4.0]),
        ];
        let report = consistency_score(&records, "FG3M", 20).unwrap();
        assert_eq!(report.average, 4.0);
        assert_eq!(report.consistency_score, 100.0);
    }

    #[test]
    fn unsupported_stat_type_is_invalid_argument() {
        let err = consistency_score(&points_series(&[10.0]), "MIN", 20).unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(ref m) if m.contains("MIN")));
    }

    #[test]
    fn empty_window_is_invalid_input() {
        let err = consistency_score(&[], "PTS", 20).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
