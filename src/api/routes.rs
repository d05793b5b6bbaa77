use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::analysis::{
    consistency_score, home_away_splits, matchup_history, pace_impact, rest_day_impact,
    HitRateEngine,
};
use crate::api::health::{HealthSnapshot, HealthState};
use crate::api::latency::{LatencyStats, LatencySummary};
use crate::config::{DEFAULT_HIT_RATE_GAMES, DEFAULT_MATCHUP_GAMES, DEFAULT_TREND_GAMES};
use crate::error::Result;
use crate::source::{Dataset, DatasetSource, GameLogSource};
use crate::types::{
    ConsistencyReport, GameRecord, HitRateReport, HomeAwaySplits, MatchupHistory, PaceImpact,
    RestImpact, Season,
};

#[derive(Clone)]
pub struct ApiState {
    pub games: Arc<dyn GameLogSource>,
    pub datasets: Arc<dyn DatasetSource>,
    pub hit_rates: Arc<HitRateEngine>,
    pub health: Arc<HealthState>,
    pub latency: Arc<LatencyStats>,
}

pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(get_health))
        .route("/stats/latency", get(get_stats_latency))
        .route("/player/hit-rates/:player_id", get(get_hit_rates))
        .route("/player/home-away/:player_id", get(get_home_away))
        .route("/player/rest-impact/:player_id", get(get_rest_impact))
        .route(
            "/player/matchup-history/:player_id/:opponent",
            get(get_matchup_history),
        )
        .route(
            "/player/consistency/:player_id/:stat_type",
            get(get_consistency),
        )
        .route("/player/pace-impact/:player_id", get(get_pace_impact))
        .route("/player/games/:player_id", get(get_player_games))
        .route("/player/career/:player_id", get(get_player_career))
        .route("/player/info/:player_id", get(get_player_info))
        .route("/player/advanced/:player_id", get(get_player_advanced))
        .route("/player/find-games/:player_id", get(get_player_league_games))
        .route("/player/shots/:player_id", get(get_player_shots))
        .route("/player/vs/:player_id/:vs_player_id", get(get_player_vs_player))
        .route("/player/hustle/:game_id", get(get_game_hustle))
        .route("/game/tracking/:game_id", get(get_game_tracking))
        .route("/game/advanced/:game_id", get(get_game_advanced))
        .route("/team/games/:team_id", get(get_team_games))
        .route("/team/stats", get(get_team_stats))
        .route("/league/players", get(get_league_players))
        .route("/league/hustle", get(get_league_hustle))
        .layer(cors)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Query param structs
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct HitRatesQuery {
    pub num_games: Option<usize>,
    pub season: Option<String>,
}

#[derive(Deserialize)]
pub struct SplitQuery {
    pub season: Option<String>,
    pub last_n_games: Option<usize>,
}

#[derive(Deserialize)]
pub struct MatchupQuery {
    pub season: Option<String>,
    pub last_n_matchups: Option<usize>,
}

#[derive(Deserialize)]
pub struct SeasonQuery {
    pub season: Option<String>,
}

/// Empty `season=` means "use the default season".
fn parse_season(season: Option<&str>) -> Result<Option<Season>> {
    match season.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => Season::parse(s).map(Some),
    }
}

/// Fetch the player's games and run one analysis over them. Errors carry the
/// analysis and player so a 4xx/5xx body says what failed.
async fn analyze<T>(
    state: &ApiState,
    analysis: &str,
    player_id: &str,
    season: Option<&str>,
    run: impl FnOnce(&[GameRecord]) -> Result<T>,
) -> Result<Json<T>> {
    let outcome = async {
        let season = parse_season(season)?;
        let records = state.games.fetch_game_logs(player_id, season.as_ref()).await?;
        run(&records)
    }
    .await;

    match outcome {
        Ok(value) => {
            info!(analysis, player_id, "analysis served");
            Ok(Json(value))
        }
        Err(e) => {
            let e = e.context(format!("{analysis} for player {player_id}"));
            warn!(analysis, player_id, status = e.status().as_u16(), "{e}");
            Err(e)
        }
    }
}

async fn passthrough(state: &ApiState, dataset: Dataset) -> Result<Json<Value>> {
    match state.datasets.fetch_dataset(&dataset).await {
        Ok(doc) => Ok(Json(doc)),
        Err(e) => {
            let e = e.context(&dataset);
            warn!(%dataset, status = e.status().as_u16(), "{e}");
            Err(e)
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn root() -> Json<Value> {
    Json(serde_json::json!({ "message": "Welcome to the NBA Props API" }))
}

async fn get_health(State(state): State<ApiState>) -> Json<HealthSnapshot> {
    Json(state.health.snapshot())
}

async fn get_stats_latency(State(state): State<ApiState>) -> Json<LatencySummary> {
    Json(state.latency.summary())
}

async fn get_hit_rates(
    State(state): State<ApiState>,
    Path(player_id): Path<String>,
    Query(params): Query<HitRatesQuery>,
) -> Result<Json<HitRateReport>> {
    let num_games = params.num_games.unwrap_or(DEFAULT_HIT_RATE_GAMES);
    let engine = Arc::clone(&state.hit_rates);
    analyze(&state, "hit rates", &player_id, params.season.as_deref(), |records| {
        engine.compute(records, num_games)
    })
    .await
}

async fn get_home_away(
    State(state): State<ApiState>,
    Path(player_id): Path<String>,
    Query(params): Query<SplitQuery>,
) -> Result<Json<HomeAwaySplits>> {
    analyze(&state, "home/away splits", &player_id, params.season.as_deref(), |records| {
        home_away_splits(records, params.last_n_games)
    })
    .await
}

async fn get_rest_impact(
    State(state): State<ApiState>,
    Path(player_id): Path<String>,
    Query(params): Query<SplitQuery>,
) -> Result<Json<RestImpact>> {
    analyze(&state, "rest impact", &player_id, params.season.as_deref(), |records| {
        rest_day_impact(records, params.last_n_games)
    })
    .await
}

async fn get_matchup_history(
    State(state): State<ApiState>,
    Path((player_id, opponent)): Path<(String, String)>,
    Query(params): Query<MatchupQuery>,
) -> Result<Json<MatchupHistory>> {
    let last_n = params.last_n_matchups.unwrap_or(DEFAULT_MATCHUP_GAMES);
    analyze(&state, "matchup history", &player_id, params.season.as_deref(), |records| {
        matchup_history(records, &opponent, last_n)
    })
    .await
}

async fn get_consistency(
    State(state): State<ApiState>,
    Path((player_id, stat_type)): Path<(String, String)>,
    Query(params): Query<SplitQuery>,
) -> Result<Json<ConsistencyReport>> {
    let last_n = params.last_n_games.unwrap_or(DEFAULT_TREND_GAMES);
    analyze(&state, "consistency", &player_id, params.season.as_deref(), |records| {
        consistency_score(records, &stat_type, last_n)
    })
    .await
}

async fn get_pace_impact(
    State(state): State<ApiState>,
    Path(player_id): Path<String>,
    Query(params): Query<SplitQuery>,
) -> Result<Json<PaceImpact>> {
    let last_n = params.last_n_games.unwrap_or(DEFAULT_TREND_GAMES);
    analyze(&state, "pace impact", &player_id, params.season.as_deref(), |records| {
        pace_impact(records, last_n)
    })
    .await
}

async fn get_player_games(
    State(state): State<ApiState>,
    Path(player_id): Path<String>,
    Query(params): Query<SeasonQuery>,
) -> Result<Json<Value>> {
    let season = parse_season(params.season.as_deref())?;
    passthrough(&state, Dataset::PlayerGameLog { player_id, season }).await
}

async fn get_player_career(
    State(state): State<ApiState>,
    Path(player_id): Path<String>,
) -> Result<Json<Value>> {
    passthrough(&state, Dataset::PlayerCareer { player_id }).await
}

async fn get_player_info(
    State(state): State<ApiState>,
    Path(player_id): Path<String>,
) -> Result<Json<Value>> {
    passthrough(&state, Dataset::PlayerInfo { player_id }).await
}

async fn get_team_games(
    State(state): State<ApiState>,
    Path(team_id): Path<String>,
    Query(params): Query<SeasonQuery>,
) -> Result<Json<Value>> {
    let season = parse_season(params.season.as_deref())?;
    passthrough(&state, Dataset::TeamGameLog { team_id, season }).await
}

async fn get_player_advanced(
    State(state): State<ApiState>,
    Path(player_id): Path<String>,
) -> Result<Json<Value>> {
    passthrough(&state, Dataset::PlayerProfile { player_id }).await
}

async fn get_player_league_games(
    State(state): State<ApiState>,
    Path(player_id): Path<String>,
    Query(params): Query<SeasonQuery>,
) -> Result<Json<Value>> {
    let season = parse_season(params.season.as_deref())?;
    passthrough(&state, Dataset::PlayerLeagueGames { player_id, season }).await
}

async fn get_player_shots(
    State(state): State<ApiState>,
    Path(player_id): Path<String>,
    Query(params): Query<SeasonQuery>,
) -> Result<Json<Value>> {
    let season = parse_season(params.season.as_deref())?;
    passthrough(&state, Dataset::PlayerShots { player_id, season }).await
}

async fn get_player_vs_player(
    State(state): State<ApiState>,
    Path((player_id, vs_player_id)): Path<(String, String)>,
) -> Result<Json<Value>> {
    let dataset = Dataset::PlayerVsPlayer {
        player_id,
        vs_player_id,
    };
    passthrough(&state, dataset).await
}

async fn get_game_hustle(
    State(state): State<ApiState>,
    Path(game_id): Path<String>,
) -> Result<Json<Value>> {
    passthrough(&state, Dataset::GameHustle { game_id }).await
}

async fn get_game_tracking(
    State(state): State<ApiState>,
    Path(game_id): Path<String>,
) -> Result<Json<Value>> {
    passthrough(&state, Dataset::GameTracking { game_id }).await
}

async fn get_game_advanced(
    State(state): State<ApiState>,
    Path(game_id): Path<String>,
) -> Result<Json<Value>> {
    passthrough(&state, Dataset::GameAdvanced { game_id }).await
}

async fn get_team_stats(
    State(state): State<ApiState>,
    Query(params): Query<SeasonQuery>,
) -> Result<Json<Value>> {
    let season = parse_season(params.season.as_deref())?;
    passthrough(&state, Dataset::TeamStats { season }).await
}

async fn get_league_players(
    State(state): State<ApiState>,
    Query(params): Query<SeasonQuery>,
) -> Result<Json<Value>> {
    let season = parse_season(params.season.as_deref())?;
    passthrough(&state, Dataset::LeaguePlayerStats { season }).await
}

async fn get_league_hustle(
    State(state): State<ApiState>,
    Query(params): Query<SeasonQuery>,
) -> Result<Json<Value>> {
    let season = parse_season(params.season.as_deref())?;
    passthrough(&state, Dataset::LeagueHustle { season }).await
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use chrono::NaiveDate;
    use serde_json::json;
    use tower::ServiceExt;

    use super::*;
    use crate::error::AppError;
    use crate::types::StatColumn;

    /// Serves twelve games for player "2544"; anything else is unknown.
    struct StubSource;

    fn stub_games() -> Vec<GameRecord> {
        (1..=12u32)
            .map(|d| {
                let matchup = if d % 2 == 0 { "LAL vs. BOS" } else { "LAL @ DEN" };
                let mut g = GameRecord::new(NaiveDate::from_ymd_opt(2024, 1, d).unwrap(), matchup);
                for column in StatColumn::ALL {
                    g.set_stat(column, Some(f64::from(d)));
                }
                g.with_stat(StatColumn::Points, f64::from(d) * 3.0)
            })
            .collect()
    }

    #[async_trait]
    impl GameLogSource for StubSource {
        async fn fetch_game_logs(
            &self,
            player_id: &str,
            _season: Option<&Season>,
        ) -> Result<Vec<GameRecord>> {
            match player_id {
                "2544" => Ok(stub_games()),
                _ => Err(AppError::NotFound(format!("invalid player ID: {player_id}"))),
            }
        }
    }

    #[async_trait]
    impl DatasetSource for StubSource {
        async fn fetch_dataset(&self, dataset: &Dataset) -> Result<Value> {
            match dataset {
                Dataset::PlayerInfo { player_id } if player_id == "2544" => {
                    Ok(json!({"resultSets": [{"headers": ["PERSON_ID"], "rowSet": [[2544]]}]}))
                }
                Dataset::GameAdvanced { game_id } if game_id == "0022300001" => Ok(json!({
                    "resultSets": [{"headers": ["GAME_ID", "PLAYER_ID"],
                                    "rowSet": [["0022300001", 2544]]}]
                })),
                Dataset::GameTracking { game_id } => {
                    Err(AppError::NotFound(format!("no tracking stats for game {game_id} found")))
                }
                Dataset::TeamStats { season: Some(season) } => {
                    Ok(json!({"season": season.as_str()}))
                }
                _ => Err(AppError::UpstreamUnavailable("timed out".to_string())),
            }
        }
    }

    fn app() -> Router {
        let stub = Arc::new(StubSource);
        router(ApiState {
            games: stub.clone(),
            datasets: stub,
            hit_rates: Arc::new(HitRateEngine::default()),
            health: Arc::new(HealthState::new()),
            latency: Arc::new(LatencyStats::new()),
        })
    }

    async fn get_json(uri: &str) -> (StatusCode, Value) {
        let resp = app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn root_welcomes() {
        let (status, body) = get_json("/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["message"].as_str().unwrap().contains("NBA Props"));
    }

    #[tokio::test]
    async fn hit_rates_use_most_recent_window() {
        // Last 10 games are days 3..=12, points 9..=36.
        let (status, body) = get_json("/player/hit-rates/2544").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["points"]["10+"]["fraction"], "9/10");
        assert_eq!(body["points"]["35+"]["fraction"], "1/10");
        assert_eq!(body["assists"]["2+"]["percentage"], 100.0);

        let (_, body) = get_json("/player/hit-rates/2544?num_games=4").await;
        assert_eq!(body["points"]["30+"]["fraction"], "3/4");
    }

    #[tokio::test]
    async fn zero_window_is_bad_request() {
        let (status, body) = get_json("/player/hit-rates/2544?num_games=0").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().unwrap().contains("hit rates for player 2544"));
    }

    #[tokio::test]
    async fn unknown_player_is_not_found() {
        let (status, body) = get_json("/player/home-away/1").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["detail"].as_str().unwrap().contains("invalid player ID: 1"));
    }

    #[tokio::test]
    async fn home_away_partitions() {
        let (status, body) = get_json("/player/home-away/2544").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["home"]["games_played"], 6);
        assert_eq!(body["away"]["games_played"], 6);
    }

    #[tokio::test]
    async fn bad_stat_type_is_bad_request() {
        let (status, body) = get_json("/player/consistency/2544/MIN").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let detail = body["detail"].as_str().unwrap();
        assert!(detail.contains("consistency for player 2544"), "{detail}");
    }

    #[tokio::test]
    async fn consistency_scores_points() {
        let (status, body) = get_json("/player/consistency/2544/PTS?last_n_games=1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["consistency_score"], 100.0);
        assert_eq!(body["games_analyzed"], 1);
    }

    #[tokio::test]
    async fn missing_matchup_is_unprocessable() {
        let (status, body) = get_json("/player/matchup-history/2544/GSW").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["detail"].as_str().unwrap().contains("GSW"));

        let (status, body) = get_json("/player/matchup-history/2544/BOS").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["games_analyzed"], 5);
    }

    #[tokio::test]
    async fn malformed_season_is_bad_request() {
        let (status, _) = get_json("/player/rest-impact/2544?season=2024").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = get_json("/player/rest-impact/2544?season=").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn passthrough_serves_provider_document() {
        let (status, body) = get_json("/player/info/2544").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["resultSets"][0]["rowSet"][0][0], 2544);

        let (status, body) = get_json("/team/games/1610612747").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["detail"].as_str().unwrap().contains("team 1610612747"));
    }

    #[tokio::test]
    async fn cors_allows_any_origin() {
        let resp = app()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("origin", "http://localhost:3000")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn game_routes_take_a_game_id() {
        let (status, body) = get_json("/game/advanced/0022300001").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["resultSets"][0]["rowSet"][0][0], "0022300001");

        let (status, body) = get_json("/game/tracking/0022300002").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let detail = body["detail"].as_str().unwrap();
        assert!(detail.contains("tracking stats for game 0022300002"), "{detail}");
    }

    #[tokio::test]
    async fn league_routes_pass_the_season_through() {
        let (status, body) = get_json("/team/stats?season=2022-23").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["season"], "2022-23");

        let (status, _) = get_json("/league/hustle?season=22-23").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
