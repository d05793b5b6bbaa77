use tracing::debug;

use crate::analysis::{column, most_recent, round_to};
use crate::config::ladders;
use crate::error::{AppError, Result};
use crate::types::{GameRecord, HitRateReport, HitRateResult, StatColumn, ThresholdHitRates};

/// Ascending integer thresholds per category. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdLadder {
    rungs: Vec<(StatColumn, Vec<u32>)>,
}

impl ThresholdLadder {
    /// Build a ladder; each category's thresholds must be non-empty and strictly ascending.
    pub fn new(rungs: Vec<(StatColumn, Vec<u32>)>) -> Result<Self> {
        for (column, thresholds) in &rungs {
            if thresholds.is_empty() {
                return Err(AppError::Config(format!("{column} ladder has no thresholds")));
            }
            if thresholds.windows(2).any(|w| w[0] >= w[1]) {
                return Err(AppError::Config(format!(
                    "{column} ladder must be strictly ascending, got {thresholds:?}"
                )));
            }
        }
        Ok(Self { rungs })
    }

    pub fn categories(&self) -> impl Iterator<Item = (StatColumn, &[u32])> {
        self.rungs.iter().map(|(c, t)| (*c, t.as_slice()))
    }
}

impl ThresholdLadder {
    /// The configured ladders from `config::ladders`, validated.
    pub fn standard() -> Result<Self> {
        Self::new(configured_rungs())
    }
}

impl Default for ThresholdLadder {
    fn default() -> Self {
        Self {
            rungs: configured_rungs(),
        }
    }
}

fn configured_rungs() -> Vec<(StatColumn, Vec<u32>)> {
    vec![
        (StatColumn::Points, ladders::POINTS.to_vec()),
        (StatColumn::Assists, ladders::ASSISTS.to_vec()),
        (StatColumn::Rebounds, ladders::REBOUNDS.to_vec()),
        (StatColumn::Threes, ladders::THREES.to_vec()),
        (StatColumn::Steals, ladders::STEALS.to_vec()),
        (StatColumn::Blocks, ladders::BLOCKS.to_vec()),
    ]
}

/// Share of recent games at or above each ladder threshold.
#[derive(Debug, Clone, Default)]
pub struct HitRateEngine {
    ladder: ThresholdLadder,
}

impl HitRateEngine {
    pub fn new(ladder: ThresholdLadder) -> Self {
        Self { ladder }
    }

    pub fn ladder(&self) -> &ThresholdLadder {
        &self.ladder
    }

    /// Hit rates over the `window_size` most recent games (all games when fewer exist).
    pub fn compute(&self, records: &[GameRecord], window_size: usize) -> Result<HitRateReport> {
        let window = most_recent(records, Some(window_size))
            .map_err(|e| e.context(format!("num_games={window_size}")))?;
        debug!(games = window.len(), window_size, "computing hit rates");

        let mut report = Vec::new();
        for (stat, thresholds) in self.ladder.categories() {
            let values = column(&window, stat)?;
            let rates = thresholds
                .iter()
                .map(|t| (*t, hit_rate(&values, f64::from(*t))))
                .collect();
            report.push((stat, ThresholdHitRates(rates)));
        }
        Ok(HitRateReport(report))
    }
}

/// `hits/total` for values `>= threshold`; 0% when there are no values.
pub fn hit_rate(values: &[f64], threshold: f64) -> HitRateResult {
    let hits = values.iter().filter(|v| **v >= threshold).count();
    let total = values.len();
    let percentage = if total > 0 {
        hits as f64 / total as f64 * 100.0
    } else {
        0.0
    };
    HitRateResult {
        fraction: format!("{hits}/{total}"),
        percentage: round_to(percentage, 2),
    }
}
