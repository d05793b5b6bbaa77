use tracing::debug;

use crate::analysis::{column, mean, most_recent, range_label, round1};
use crate::error::{AppError, Result};
use crate::types::{GameRecord, MatchupAverages, MatchupHistory, MatchupRanges, StatColumn};

/// Home games carry `vs.` in the matchup (`"LAL vs. BOS"`); road games use `@`.
/// Plain substring match, so any matchup containing "vs" counts as home.
pub fn is_home_game(matchup: &str) -> bool {
    matchup.contains("vs")
}

/// Whether `matchup` mentions `opponent`. Plain substring match: `"BOS"` also
/// matches `"LAL vs. BOSTON"`.
pub fn involves_opponent(matchup: &str, opponent: &str) -> bool {
    matchup.contains(opponent)
}

/// Averages and ranges over the `last_n_matchups` most recent games against `opponent`.
pub fn matchup_history(
    records: &[GameRecord],
    opponent: &str,
    last_n_matchups: usize,
) -> Result<MatchupHistory> {
    let opponent = opponent.trim();
    if opponent.is_empty() {
        return Err(AppError::InvalidArgument(
            "opponent code must not be empty".to_string(),
        ));
    }
    if last_n_matchups == 0 {
        return Err(AppError::InvalidArgument(
            "last_n_matchups must be at least 1".to_string(),
        ));
    }

    let against = most_recent(records, None)?
        .into_iter()
        .filter(|g| involves_opponent(&g.matchup, opponent))
        .take(last_n_matchups)
        .collect::<Vec<_>>();
    debug!(opponent, games = against.len(), "matchup games selected");

    if against.is_empty() {
        return Err(AppError::InvalidInput(format!(
            "no matchup history against {opponent}"
        )));
    }

    let points = column(&against, StatColumn::Points)?;
    let assists = column(&against, StatColumn::Assists)?;
    let rebounds = column(&against, StatColumn::Rebounds)?;
    let minutes = column(&against, StatColumn::Minutes)?;
    let threes = column(&against, StatColumn::Threes)?;

    Ok(MatchupHistory {
        games_analyzed: against.len(),
        averages: MatchupAverages {
            points: round1(mean(&points)),
            assists: round1(mean(&assists)),
            rebounds: round1(mean(&rebounds)),
            minutes: round1(mean(&minutes)),
            threes: round1(mean(&threes)),
        },
        ranges: MatchupRanges {
            points: range_label(&points),
            assists: range_label(&assists),
            rebounds: range_label(&rebounds),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fixtures::*;

    #[test]
    fn home_marker() {
        assert!(is_home_game("LAL vs. BOS"));
        assert!(!is_home_game("LAL @ BOS"));
    }

    #[test]
    fn opponent_substring_quirk_is_preserved() {
        assert!(involves_opponent("LAL @ BOS", "BOS"));
        assert!(involves_opponent("LAL vs. BOS", "BOS"));
        assert!(involves_opponent("LAL vs. BOSTON", "BOS"));
        assert!(!involves_opponent("LAL vs. MIA", "BOS"));
    }

    #[test]
    fn takes_most_recent_matchups_against_opponent() {
        // pts, ast, reb, fg3m, stl, blk, min
        let records = vec![
            game(1, "LAL @ BOS", &[10.0, 1.0, 2.0, 0.0, 0.0, 0.0, 20.0]),
            game(20, "LAL vs. BOS", &[30.0, 8.0, 10.0, 4.0, 0.0, 0.0, 36.0]),
            game(15, "LAL vs. MIA", &[50.0, 9.0, 9.0, 9.0, 0.0, 0.0, 40.0]),
            game(10, "LAL @ BOS", &[21.0, 5.0, 7.0, 1.0, 0.0, 0.0, 33.0]),
        ];
        let history = matchup_history(&records, "BOS", 2).unwrap();
        assert_eq!(history.games_analyzed, 2);
        assert_eq!(history.averages.points, 25.5);
        assert_eq!(history.averages.assists, 6.5);
        assert_eq!(history.averages.rebounds, 8.5);
        assert_eq!(history.averages.minutes, 34.5);
        assert_eq!(history.averages.threes, 2.5);
        assert_eq!(history.ranges.points, "21-30");
        assert_eq!(history.ranges.assists, "5-8");
        assert_eq!(history.ranges.rebounds, "7-10");
    }

    #[test]
    fn window_counts_matchups_not_games() {
        let mut records: Vec<GameRecord> = (1..=20)
            .map(|d| game(d, "LAL vs. MIA", &[5.0]))
            .collect();
        records.push(game(2, "LAL @ BOS", &[40.0]));
        let history = matchup_history(&records, "BOS", 5).unwrap();
        assert_eq!(history.games_analyzed, 1);
        assert_eq!(history.ranges.points, "40-40");
    }

    #[test]
    fn no_history_is_invalid_input() {
        let records = vec![game(1, "LAL vs. MIA", &[5.0])];
        let err = matchup_history(&records, "BOS", 5).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(ref m) if m.contains("BOS")));
    }

    #[test]
    fn bad_arguments() {
        let records = vec![game(1, "LAL vs. BOS", &[5.0])];
        assert!(matches!(
            matchup_history(&records, "  ", 5),
            Err(AppError::InvalidArgument(_))
        ));
        assert!(matches!(
            matchup_history(&records, "BOS", 0),
            Err(AppError::InvalidArgument(_))
        ));
    }
}
