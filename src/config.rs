use crate::error::{AppError, Result};

pub const NBA_STATS_URL: &str = "https://stats.nba.com/stats";

/// Per-request timeout for stats.nba.com (seconds). The provider is slow under load.
pub const NBA_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Total attempts for a timed-out upstream request, including the first.
pub const NBA_MAX_RETRIES: u32 = 3;

/// Fixed delay between timed-out attempts (seconds).
pub const NBA_RETRY_DELAY_SECS: u64 = 2;

/// Default window for `/player/hit-rates`.
pub const DEFAULT_HIT_RATE_GAMES: usize = 10;

/// Default window for `/player/consistency` and `/player/pace-impact`.
pub const DEFAULT_TREND_GAMES: usize = 20;

/// Default number of head-to-head games for `/player/matchup-history`.
pub const DEFAULT_MATCHUP_GAMES: usize = 5;

/// Rest assigned to the oldest game in a window, which has no prior game to measure against.
pub const OLDEST_GAME_REST_DAYS: i64 = 3;

/// Threshold ladders, one ascending list per tracked category.
pub mod ladders {
    pub const POINTS: &[u32] = &[10, 15, 20, 25, 30, 35];
    pub const ASSISTS: &[u32] = &[2, 4, 6, 8, 10];
    pub const REBOUNDS: &[u32] = &[4, 6, 8, 10, 12, 14, 16];
    pub const THREES: &[u32] = &[1, 2, 3, 4, 5, 6, 7, 8];
    pub const STEALS: &[u32] = &[1, 2, 3, 4];
    pub const BLOCKS: &[u32] = &[1, 2, 3, 4];
}

#[derive(Debug, Clone)]
pub struct Config {
    pub nba_stats_url: String,
    pub log_level: String,
    pub api_port: u16,
    /// Upstream request timeout (NBA_REQUEST_TIMEOUT_SECS)
    pub request_timeout_secs: u64,
    /// Attempts per timed-out upstream call (NBA_MAX_RETRIES)
    pub max_retries: u32,
    /// Sleep between timed-out attempts (NBA_RETRY_DELAY_SECS)
    pub retry_delay_secs: u64,
    /// Season used when a request omits one (CURRENT_SEASON, e.g. "2024-25").
    /// Unset means derive it from today's date.
    pub current_season: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let max_retries = std::env::var("NBA_MAX_RETRIES")
            .unwrap_or_else(|_| NBA_MAX_RETRIES.to_string())
            .parse::<u32>()
            .map_err(|_| {
                AppError::Config("NBA_MAX_RETRIES must be a positive integer".to_string())
            })?;
        if max_retries == 0 {
            return Err(AppError::Config("NBA_MAX_RETRIES must be at least 1".to_string()));
        }

        Ok(Self {
            nba_stats_url: std::env::var("NBA_STATS_URL")
                .unwrap_or_else(|_| NBA_STATS_URL.to_string()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "8002".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            request_timeout_secs: std::env::var("NBA_REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| NBA_REQUEST_TIMEOUT_SECS.to_string())
                .parse::<u64>()
                .unwrap_or(NBA_REQUEST_TIMEOUT_SECS),
            max_retries,
            retry_delay_secs: std::env::var("NBA_RETRY_DELAY_SECS")
                .unwrap_or_else(|_| NBA_RETRY_DELAY_SECS.to_string())
                .parse::<u64>()
                .unwrap_or(NBA_RETRY_DELAY_SECS),
            current_season: std::env::var("CURRENT_SEASON")
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        })
    }
}
