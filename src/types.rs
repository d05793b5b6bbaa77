use chrono::{Datelike, NaiveDate};
use serde::ser::Serializer;
use serde::Serialize;

use crate::error::{AppError, Result};

// ---------------------------------------------------------------------------
// Season
// ---------------------------------------------------------------------------

/// An NBA season in the provider's `"YYYY-YY"` form, e.g. `2023-24`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Season(String);

impl Season {
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = || {
            AppError::InvalidArgument(format!(
                "season '{s}' must look like 2023-24 (start year, dash, two-digit end year)"
            ))
        };
        let (start, end) = s.split_once('-').ok_or_else(invalid)?;
        if start.len() != 4 || end.len() != 2 {
            return Err(invalid());
        }
        let start: u32 = start.parse().map_err(|_| invalid())?;
        let end: u32 = end.parse().map_err(|_| invalid())?;
        if (start + 1) % 100 != end {
            return Err(invalid());
        }
        Ok(Self(s.to_string()))
    }

    /// The season in progress on `date`. Seasons tip off in October.
    pub fn containing(date: NaiveDate) -> Self {
        let start = if date.month() >= 10 { date.year() } else { date.year() - 1 };
        Self(format!("{start}-{:02}", (start + 1).rem_euclid(100)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Season {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Stat columns
// ---------------------------------------------------------------------------

/// Per-game box score columns the analyses read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatColumn {
    Points,
    Assists,
    Rebounds,
    Threes,
    Steals,
    Blocks,
    Minutes,
    FieldGoalAttempts,
    OffensiveRebounds,
    Turnovers,
}

impl StatColumn {
    pub const COUNT: usize = 10;

    pub const ALL: [StatColumn; Self::COUNT] = [
        StatColumn::Points,
        StatColumn::Assists,
        StatColumn::Rebounds,
        StatColumn::Threes,
        StatColumn::Steals,
        StatColumn::Blocks,
        StatColumn::Minutes,
        StatColumn::FieldGoalAttempts,
        StatColumn::OffensiveRebounds,
        StatColumn::Turnovers,
    ];

    /// Categories with threshold ladders, splits and consistency scores.
    pub const TRACKED: [StatColumn; 6] = [
        StatColumn::Points,
        StatColumn::Assists,
        StatColumn::Rebounds,
        StatColumn::Threes,
        StatColumn::Steals,
        StatColumn::Blocks,
    ];

    /// Column header used by stats.nba.com.
    pub fn code(self) -> &'static str {
        match self {
            StatColumn::Points => "PTS",
            StatColumn::Assists => "AST",
            StatColumn::Rebounds => "REB",
            StatColumn::Threes => "FG3M",
            StatColumn::Steals => "STL",
            StatColumn::Blocks => "BLK",
            StatColumn::Minutes => "MIN",
            StatColumn::FieldGoalAttempts => "FGA",
            StatColumn::OffensiveRebounds => "OREB",
            StatColumn::Turnovers => "TOV",
        }
    }

    /// Key used in JSON responses.
    pub fn label(self) -> &'static str {
        match self {
            StatColumn::Points => "points",
            StatColumn::Assists => "assists",
            StatColumn::Rebounds => "rebounds",
            StatColumn::Threes => "threes",
            StatColumn::Steals => "steals",
            StatColumn::Blocks => "blocks",
            StatColumn::Minutes => "minutes",
            StatColumn::FieldGoalAttempts => "field_goal_attempts",
            StatColumn::OffensiveRebounds => "offensive_rebounds",
            StatColumn::Turnovers => "turnovers",
        }
    }

    /// Parse a tracked category code (`PTS`, `AST`, `REB`, `FG3M`, `STL`, `BLK`).
    pub fn from_tracked_code(code: &str) -> Result<Self> {
        Self::TRACKED
            .into_iter()
            .find(|c| c.code() == code)
            .ok_or_else(|| {
                AppError::InvalidArgument(format!(
                    "stat_type '{code}' is not supported; expected one of PTS, AST, REB, FG3M, STL, BLK"
                ))
            })
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for StatColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ---------------------------------------------------------------------------
// Game record
// ---------------------------------------------------------------------------

/// One provider stat cell as it arrived.
#[derive(Debug, Clone, PartialEq)]
pub enum StatCell {
    /// Column absent or sent as null.
    Missing,
    /// Present but not a finite number; keeps the raw text for the error message.
    Invalid(String),
    Value(f64),
}

/// One game played by one player.
///
/// Stat cells are kept as they arrived: a missing or non-numeric cell only fails
/// an analysis that actually reads it for a game inside its window.
#[derive(Debug, Clone, PartialEq)]
pub struct GameRecord {
    pub game_date: NaiveDate,
    /// Venue and opponent, e.g. `"LAL vs. BOS"` (home) or `"LAL @ BOS"` (away).
    pub matchup: String,
    stats: [StatCell; StatColumn::COUNT],
}

impl GameRecord {
    pub fn new(game_date: NaiveDate, matchup: impl Into<String>) -> Self {
        Self {
            game_date,
            matchup: matchup.into(),
            stats: std::array::from_fn(|_| StatCell::Missing),
        }
    }

    #[cfg(test)]
    pub fn with_stat(mut self, column: StatColumn, value: f64) -> Self {
        self.set_stat(column, Some(value));
        self
    }

    #[cfg(test)]
    pub fn set_stat(&mut self, column: StatColumn, value: Option<f64>) {
        self.set_cell(column, value.map_or(StatCell::Missing, StatCell::Value));
    }

    pub fn set_cell(&mut self, column: StatColumn, cell: StatCell) {
        self.stats[column.index()] = cell;
    }

    pub fn stat(&self, column: StatColumn) -> Result<f64> {
        match &self.stats[column.index()] {
            StatCell::Value(v) => Ok(*v),
            StatCell::Missing => Err(AppError::InvalidInput(format!(
                "{} missing for game on {} ({})",
                column.code(),
                self.game_date,
                self.matchup
            ))),
            StatCell::Invalid(raw) => Err(AppError::InvalidInput(format!(
                "{} value {raw} for game on {} ({}) is not numeric",
                column.code(),
                self.game_date,
                self.matchup
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Hit rates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HitRateResult {
    /// `"hits/total"`
    pub fraction: String,
    /// 0–100, two decimals.
    pub percentage: f64,
}

/// Hit rates for one category, serialized as `{"10+": {...}, "15+": {...}}` in ladder order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ThresholdHitRates(pub Vec<(u32, HitRateResult)>);

impl ThresholdHitRates {
    #[cfg(test)]
    pub fn get(&self, threshold: u32) -> Option<&HitRateResult> {
        self.0.iter().find(|(t, _)| *t == threshold).map(|(_, r)| r)
    }
}

impl Serialize for ThresholdHitRates {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(t, r)| (format!("{t}+"), r)))
    }
}

/// Hit rates for every laddered category, serialized as `{"points": {...}, ...}`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HitRateReport(pub Vec<(StatColumn, ThresholdHitRates)>);

impl HitRateReport {
    #[cfg(test)]
    pub fn get(&self, column: StatColumn, threshold: u32) -> Option<&HitRateResult> {
        self.0
            .iter()
            .find(|(c, _)| *c == column)
            .and_then(|(_, rates)| rates.get(threshold))
    }
}

impl Serialize for HitRateReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(c, rates)| (c.label(), rates)))
    }
}

// ---------------------------------------------------------------------------
// Home/away splits
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatRange {
    pub avg: f64,
    pub min: i64,
    pub max: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitStats {
    pub points: StatRange,
    pub assists: StatRange,
    pub rebounds: StatRange,
    pub threes: StatRange,
    pub steals: StatRange,
    pub blocks: StatRange,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitSummary {
    pub games_played: usize,
    /// Absent when the partition has no games.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<SplitStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HomeAwaySplits {
    pub home: SplitSummary,
    pub away: SplitSummary,
}

// ---------------------------------------------------------------------------
// Rest days
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestGroupSummary {
    pub games_played: usize,
    pub avg_points: f64,
    pub avg_assists: f64,
    pub avg_rebounds: f64,
    pub avg_minutes: f64,
}

/// Empty buckets are omitted from the response entirely.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RestImpact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub back_to_back: Option<RestGroupSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub one_day_rest: Option<RestGroupSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub two_plus_days_rest: Option<RestGroupSummary>,
}

// ---------------------------------------------------------------------------
// Matchup history
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchupAverages {
    pub points: f64,
    pub assists: f64,
    pub rebounds: f64,
    pub minutes: f64,
    pub threes: f64,
}

/// Inclusive `"min-max"` strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchupRanges {
    pub points: String,
    pub assists: String,
    pub rebounds: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchupHistory {
    pub games_analyzed: usize,
    pub averages: MatchupAverages,
    pub ranges: MatchupRanges,
}

// ---------------------------------------------------------------------------
// Consistency
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsistencyReport {
    /// 0–100; higher is steadier.
    pub consistency_score: f64,
    pub average: f64,
    pub std_dev: f64,
    pub median: f64,
    pub range: String,
    pub games_analyzed: usize,
}

// ---------------------------------------------------------------------------
// Pace
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaceGroupSummary {
    pub games_played: usize,
    pub avg_points: f64,
    pub avg_assists: f64,
    pub avg_rebounds: f64,
    pub avg_minutes: f64,
    pub avg_possessions: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PaceImpact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high_pace: Option<PaceGroupSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medium_pace: Option<PaceGroupSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_pace: Option<PaceGroupSummary>,
}
