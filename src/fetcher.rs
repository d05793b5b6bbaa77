use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, ORIGIN, REFERER, USER_AGENT,
};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::api::health::HealthState;
use crate::api::latency::LatencyStats;
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::source::{Dataset, DatasetSource, GameLogSource};
use crate::types::{GameRecord, Season, StatCell, StatColumn};

/// Client for the stats.nba.com JSON endpoints.
///
/// Timed-out requests are retried a fixed number of times with a fixed delay;
/// any other transport failure is returned immediately.
pub struct NbaStatsClient {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
    retry_delay: Duration,
    default_season: Season,
    health: Arc<HealthState>,
    latency: Arc<LatencyStats>,
}

impl NbaStatsClient {
    pub fn new(cfg: &Config, health: Arc<HealthState>, latency: Arc<LatencyStats>) -> Result<Self> {
        let default_season = match &cfg.current_season {
            Some(s) => Season::parse(s)
                .map_err(|e| AppError::Config(format!("CURRENT_SEASON: {e}")))?,
            None => Season::containing(chrono::Local::now().date_naive()),
        };
        Self::with_timeouts(
            cfg.nba_stats_url.clone(),
            Duration::from_secs(cfg.request_timeout_secs),
            cfg.max_retries,
            Duration::from_secs(cfg.retry_delay_secs),
            default_season,
            health,
            latency,
        )
    }

    pub fn with_timeouts(
        base_url: String,
        request_timeout: Duration,
        max_retries: u32,
        retry_delay: Duration,
        default_season: Season,
        health: Arc<HealthState>,
        latency: Arc<LatencyStats>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .default_headers(nba_headers())
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries: max_retries.max(1),
            retry_delay,
            default_season,
            health,
            latency,
        })
    }

    pub fn default_season(&self) -> &Season {
        &self.default_season
    }

    /// GET `{base_url}/{endpoint}` with the retry policy applied to timeouts.
    async fn get_json(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Value> {
        let url = format!("{}/{}", self.base_url, endpoint);

        for attempt in 1..=self.max_retries {
            self.health.inc_upstream_requests();
            let started = Instant::now();
            let outcome = self.send(&url, params).await;
            self.latency.record(started.elapsed());

            match outcome {
                Ok(body) => {
                    let doc = serde_json::from_str(&body).map_err(|e| {
                        self.health.inc_upstream_failures();
                        error!(endpoint, "stats.nba.com sent a malformed body: {e}");
                        AppError::from(e)
                    })?;
                    self.health.set_last_success_at_ns(now_ns());
                    debug!(
                        endpoint,
                        attempt,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "stats.nba.com ok"
                    );
                    return Ok(doc);
                }
                Err(e) if e.is_timeout() => {
                    warn!(
                        endpoint,
                        attempt,
                        max_retries = self.max_retries,
                        "stats.nba.com request timed out (attempt {attempt}/{})",
                        self.max_retries
                    );
                    if attempt < self.max_retries {
                        self.health.inc_upstream_retries();
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
                Err(e) => {
                    self.health.inc_upstream_failures();
                    error!(endpoint, "stats.nba.com request failed: {e}");
                    return Err(e.into());
                }
            }
        }

        self.health.inc_upstream_failures();
        Err(AppError::UpstreamUnavailable(format!(
            "{endpoint} timed out after {} attempts, try again later",
            self.max_retries
        )))
    }

    async fn send(&self, url: &str, params: &[(&str, &str)]) -> reqwest::Result<String> {
        self.client
            .get(url)
            .query(params)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }

    /// Fetch an endpoint and require rows in its first result set.
    async fn get_result_set(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
        what: &(dyn std::fmt::Display + Sync),
    ) -> Result<Value> {
        let doc = self.get_json(endpoint, params).await?;
        let (_, rows) = first_result_set(&doc)?;
        if rows.is_empty() {
            return Err(AppError::NotFound(format!("no {what} found")));
        }
        Ok(doc)
    }

    /// Confirm the player exists before asking for their stats. Any failure other
    /// than an exhausted retry budget reads as an unknown player.
    pub async fn validate_player(&self, player_id: &str) -> Result<()> {
        check_id("player", player_id)?;
        let what = format!("player info for player {player_id}");
        match self
            .get_result_set("commonplayerinfo", &[("PlayerID", player_id)], &what)
            .await
        {
            Ok(_) => Ok(()),
            Err(e @ AppError::UpstreamUnavailable(_)) => Err(e),
            Err(e) => {
                debug!(player_id, "player validation failed: {e}");
                Err(AppError::NotFound(format!("invalid player ID: {player_id}")))
            }
        }
    }
}

#[async_trait]
impl GameLogSource for NbaStatsClient {
    async fn fetch_game_logs(
        &self,
        player_id: &str,
        season: Option<&Season>,
    ) -> Result<Vec<GameRecord>> {
        let season = season.unwrap_or(&self.default_season);
        info!(player_id, %season, "fetching game logs");
        self.validate_player(player_id).await?;

        let doc = self
            .get_json(
                "playergamelog",
                &[("PlayerID", player_id), ("Season", season.as_str()), REGULAR_SEASON],
            )
            .await?;
        let records = parse_game_log(&doc)
            .map_err(|e| e.context(format!("player {player_id} season {season}")))?;
        if records.is_empty() {
            return Err(AppError::NotFound(format!(
                "no game logs found for player {player_id} for season {season}"
            )));
        }
        info!(player_id, %season, games = records.len(), "game logs retrieved");
        Ok(records)
    }
}

#[async_trait]
impl DatasetSource for NbaStatsClient {
    async fn fetch_dataset(&self, dataset: &Dataset) -> Result<Value> {
        info!(%dataset, "fetching dataset");
        for player_id in dataset.players() {
            self.validate_player(player_id).await?;
        }
        let season = dataset.season().unwrap_or(&self.default_season);
        let (endpoint, params) = dataset_request(dataset, season.as_str())?;
        let mut doc = self.get_result_set(endpoint, &params, dataset).await?;

        if let Dataset::PlayerLeagueGames { player_id, .. } = dataset {
            if retain_player_rows(&mut doc, player_id)? == 0 {
                return Err(AppError::NotFound(format!("no {dataset} found")));
            }
        }
        info!(%dataset, "dataset retrieved");
        Ok(doc)
    }
}

const REGULAR_SEASON: (&str, &str) = ("SeasonType", "Regular Season");
const NBA_LEAGUE: (&str, &str) = ("LeagueID", "00");

/// Unfiltered values for the dashboard endpoints' required filter parameters.
const DASH_FILTERS: [(&str, &str); 8] = [
    ("LastNGames", "0"),
    ("MeasureType", "Base"),
    ("Month", "0"),
    ("OpponentTeamID", "0"),
    ("PaceAdjust", "N"),
    ("Period", "0"),
    ("PlusMinus", "N"),
    ("Rank", "N"),
];

/// Endpoint and query parameters for a passthrough dataset.
fn dataset_request<'a>(
    dataset: &'a Dataset,
    season: &'a str,
) -> Result<(&'static str, Vec<(&'static str, &'a str)>)> {
    let request = match dataset {
        Dataset::PlayerGameLog { player_id, .. } => (
            "playergamelog",
            vec![("PlayerID", player_id.as_str()), ("Season", season), REGULAR_SEASON],
        ),
        Dataset::PlayerCareer { player_id } => (
            "playercareerstats",
            vec![("PlayerID", player_id.as_str()), ("PerMode", "Totals"), NBA_LEAGUE],
        ),
        Dataset::PlayerInfo { player_id } => {
            check_id("player", player_id)?;
            ("commonplayerinfo", vec![("PlayerID", player_id.as_str())])
        }
        Dataset::PlayerProfile { player_id } => (
            "playerprofilev2",
            vec![("PlayerID", player_id.as_str()), ("PerMode", "PerGame"), NBA_LEAGUE],
        ),
        Dataset::PlayerLeagueGames { .. } => (
            "leaguegamelog",
            vec![
                ("Season", season),
                REGULAR_SEASON,
                ("PlayerOrTeam", "P"),
                ("Direction", "DESC"),
                ("Sorter", "DATE"),
                ("Counter", "0"),
                NBA_LEAGUE,
            ],
        ),
        Dataset::PlayerShots { player_id, .. } => (
            "playerdashptshots",
            vec![
                ("PlayerID", player_id.as_str()),
                ("TeamID", "0"),
                ("Season", season),
                REGULAR_SEASON,
                ("PerMode", "PerGame"),
                ("LastNGames", "0"),
                ("Month", "0"),
                ("OpponentTeamID", "0"),
                ("Period", "0"),
                NBA_LEAGUE,
            ],
        ),
        Dataset::PlayerVsPlayer {
            player_id,
            vs_player_id,
        } => {
            let mut params = vec![
                ("PlayerID", player_id.as_str()),
                ("VsPlayerID", vs_player_id.as_str()),
                ("Season", season),
                REGULAR_SEASON,
                ("PerMode", "Totals"),
                NBA_LEAGUE,
            ];
            params.extend(DASH_FILTERS);
            ("playervsplayer", params)
        }
        Dataset::TeamGameLog { team_id, .. } => {
            check_id("team", team_id)?;
            (
                "teamgamelog",
                vec![("TeamID", team_id.as_str()), ("Season", season), REGULAR_SEASON],
            )
        }
        Dataset::TeamStats { .. } | Dataset::LeaguePlayerStats { .. } => {
            let mut params = vec![
                ("Season", season),
                REGULAR_SEASON,
                ("PerMode", "Totals"),
                NBA_LEAGUE,
            ];
            params.extend(DASH_FILTERS);
            let endpoint = match dataset {
                Dataset::TeamStats { .. } => "leaguedashteamstats",
                _ => "leaguedashplayerstats",
            };
            (endpoint, params)
        }
        Dataset::LeagueHustle { .. } => (
            "leaguehustlestatsplayer",
            vec![("Season", season), REGULAR_SEASON, ("PerMode", "Totals"), NBA_LEAGUE],
        ),
        Dataset::GameHustle { game_id } => {
            check_id("game", game_id)?;
            ("hustlestatsboxscore", vec![("GameID", game_id.as_str())])
        }
        Dataset::GameTracking { game_id } => {
            check_id("game", game_id)?;
            ("boxscoreplayertrackv2", vec![("GameID", game_id.as_str())])
        }
        Dataset::GameAdvanced { game_id } => {
            check_id("game", game_id)?;
            (
                "boxscoreadvancedv2",
                vec![
                    ("GameID", game_id.as_str()),
                    ("StartPeriod", "0"),
                    ("EndPeriod", "0"),
                    ("StartRange", "0"),
                    ("EndRange", "0"),
                    ("RangeType", "0"),
                ],
            )
        }
    };
    Ok(request)
}

/// Drop every row of the first result set not belonging to `player_id`.
/// Returns the number of rows kept.
fn retain_player_rows(doc: &mut Value, player_id: &str) -> Result<usize> {
    let column = {
        let (headers, _) = first_result_set(doc)?;
        headers
            .iter()
            .position(|h| *h == "PLAYER_ID")
            .ok_or_else(|| {
                AppError::InvalidInput("result set has no PLAYER_ID column".to_string())
            })?
    };
    let rows = doc
        .pointer_mut("/resultSets/0/rowSet")
        .and_then(Value::as_array_mut)
        .ok_or_else(|| AppError::InvalidInput("result set has no rowSet".to_string()))?;
    rows.retain(|row| match row.get(column) {
        Some(Value::Number(n)) => n.to_string() == player_id,
        Some(Value::String(s)) => s == player_id,
        _ => false,
    });
    Ok(rows.len())
}

/// Browser-like headers; stats.nba.com stalls requests without them.
fn nba_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(
            concat!(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 ",
                "(KHTML, like Gecko) Chrome/120.0 Safari/537.36"
            ),
        ),
    );
    headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(ORIGIN, HeaderValue::from_static("https://www.nba.com"));
    headers.insert(REFERER, HeaderValue::from_static("https://www.nba.com/"));
    headers.insert(
        HeaderName::from_static("x-nba-stats-origin"),
        HeaderValue::from_static("stats"),
    );
    headers.insert(
        HeaderName::from_static("x-nba-stats-token"),
        HeaderValue::from_static("true"),
    );
    headers
}

fn check_id(kind: &str, id: &str) -> Result<()> {
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::InvalidArgument(format!(
            "{kind} ID '{id}' must be numeric"
        )));
    }
    Ok(())
}

/// `(headers, rows)` of the first entry in `resultSets`.
pub fn first_result_set(doc: &Value) -> Result<(Vec<&str>, &Vec<Value>)> {
    let set = doc
        .get("resultSets")
        .and_then(|s| s.as_array())
        .and_then(|a| a.first())
        .ok_or_else(|| AppError::InvalidInput("response has no resultSets".to_string()))?;
    let headers = set
        .get("headers")
        .and_then(|h| h.as_array())
        .ok_or_else(|| AppError::InvalidInput("result set has no headers".to_string()))?
        .iter()
        .map(|h| h.as_str().unwrap_or(""))
        .collect();
    let rows = set
        .get("rowSet")
        .and_then(|r| r.as_array())
        .ok_or_else(|| AppError::InvalidInput("result set has no rowSet".to_string()))?;
    Ok((headers, rows))
}

/// Coerce a `playergamelog` document into typed records. Fails closed on a row
/// without a usable date or matchup. Stat cells are kept as they arrived, so a
/// non-numeric value only fails an analysis that reads it.
pub fn parse_game_log(doc: &Value) -> Result<Vec<GameRecord>> {
    let (headers, rows) = first_result_set(doc)?;
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let cells = row
                .as_array()
                .ok_or_else(|| AppError::InvalidInput(format!("row {i} is not an array")))?;
            game_record_from_row(&headers, cells).map_err(|e| e.context(format!("row {i}")))
        })
        .collect()
}

fn game_record_from_row(headers: &[&str], cells: &[Value]) -> Result<GameRecord> {
    let cell = |name: &str| {
        headers
            .iter()
            .position(|h| *h == name)
            .and_then(|i| cells.get(i))
            .filter(|v| !v.is_null())
    };

    let raw_date = cell("GAME_DATE")
        .and_then(|v| v.as_str())
        .ok_or_else(|| AppError::InvalidInput("GAME_DATE missing".to_string()))?;
    let game_date = parse_game_date(raw_date)
        .ok_or_else(|| AppError::InvalidInput(format!("GAME_DATE '{raw_date}' is not a date")))?;
    let matchup = cell("MATCHUP").and_then(|v| v.as_str()).ok_or_else(|| {
        AppError::InvalidInput(format!("MATCHUP missing for game on {game_date}"))
    })?;

    let mut record = GameRecord::new(game_date, matchup);
    for column in StatColumn::ALL {
        let stat = match cell(column.code()) {
            None => StatCell::Missing,
            Some(v) => coerce_number(v)
                .map_or_else(|| StatCell::Invalid(v.to_string()), StatCell::Value),
        };
        record.set_cell(column, stat);
    }
    Ok(record)
}

fn coerce_number(v: &Value) -> Option<f64> {
    let n = v
        .as_f64()
        .or_else(|| v.as_str().and_then(|s| s.trim().parse::<f64>().ok()))?;
    n.is_finite().then_some(n)
}

/// Accepts the provider's `"APR 14, 2024"` and ISO dates (with or without a time part).
pub fn parse_game_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%b %d, %Y")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").map(|dt| dt.date()))
        .ok()
}

fn now_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}
