use async_trait::async_trait;

use crate::error::Result;
use crate::types::{GameRecord, Season};

/// Supplies a player's per-game records.
///
/// Implementations return `NotFound` for an unknown player or a season with no
/// games and `UpstreamUnavailable` once their own retry budget is spent. Records
/// come back in no particular order.
#[async_trait]
pub trait GameLogSource: Send + Sync {
    async fn fetch_game_logs(&self, player_id: &str, season: Option<&Season>)
        -> Result<Vec<GameRecord>>;
}

/// Raw provider documents served as-is by the passthrough routes.
#[derive(Debug, Clone, PartialEq)]
pub enum Dataset {
    PlayerGameLog {
        player_id: String,
        season: Option<Season>,
    },
    PlayerCareer {
        player_id: String,
    },
    PlayerInfo {
        player_id: String,
    },
    /// Per-game profile with season highs and career averages.
    PlayerProfile {
        player_id: String,
    },
    /// The player's rows from the league-wide game log.
    PlayerLeagueGames {
        player_id: String,
        season: Option<Season>,
    },
    PlayerShots {
        player_id: String,
        season: Option<Season>,
    },
    PlayerVsPlayer {
        player_id: String,
        vs_player_id: String,
    },
    TeamGameLog {
        team_id: String,
        season: Option<Season>,
    },
    TeamStats {
        season: Option<Season>,
    },
    LeaguePlayerStats {
        season: Option<Season>,
    },
    LeagueHustle {
        season: Option<Season>,
    },
    GameHustle {
        game_id: String,
    },
    GameTracking {
        game_id: String,
    },
    GameAdvanced {
        game_id: String,
    },
}

impl Dataset {
    /// Players whose identity is checked before the dataset is requested.
    pub fn players(&self) -> Vec<&str> {
        match self {
            Dataset::PlayerGameLog { player_id, .. }
            | Dataset::PlayerCareer { player_id }
            | Dataset::PlayerProfile { player_id }
            | Dataset::PlayerLeagueGames { player_id, .. }
            | Dataset::PlayerShots { player_id, .. } => vec![player_id.as_str()],
            Dataset::PlayerVsPlayer {
                player_id,
                vs_player_id,
            } => vec![player_id.as_str(), vs_player_id.as_str()],
            _ => Vec::new(),
        }
    }

    pub fn season(&self) -> Option<&Season> {
        match self {
            Dataset::PlayerGameLog { season, .. }
            | Dataset::PlayerLeagueGames { season, .. }
            | Dataset::PlayerShots { season, .. }
            | Dataset::TeamGameLog { season, .. }
            | Dataset::TeamStats { season }
            | Dataset::LeaguePlayerStats { season }
            | Dataset::LeagueHustle { season } => season.as_ref(),
            _ => None,
        }
    }
}

impl std::fmt::Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dataset::PlayerGameLog { player_id, .. } => {
                write!(f, "game logs for player {player_id}")
            }
            Dataset::PlayerCareer { player_id } => write!(f, "career stats for player {player_id}"),
            Dataset::PlayerInfo { player_id } => write!(f, "player info for player {player_id}"),
            Dataset::PlayerProfile { player_id } => {
                write!(f, "advanced stats for player {player_id}")
            }
            Dataset::PlayerLeagueGames { player_id, .. } => {
                write!(f, "league games for player {player_id}")
            }
            Dataset::PlayerShots { player_id, .. } => {
                write!(f, "shot dashboard for player {player_id}")
            }
            Dataset::PlayerVsPlayer {
                player_id,
                vs_player_id,
            } => write!(f, "player {player_id} vs player {vs_player_id} stats"),
            Dataset::TeamGameLog { team_id, .. } => write!(f, "game logs for team {team_id}"),
            Dataset::TeamStats { .. } => write!(f, "team stats"),
            Dataset::LeaguePlayerStats { .. } => write!(f, "league player stats"),
            Dataset::LeagueHustle { .. } => write!(f, "league hustle stats"),
            Dataset::GameHustle { game_id } => write!(f, "hustle stats for game {game_id}"),
            Dataset::GameTracking { game_id } => write!(f, "tracking stats for game {game_id}"),
            Dataset::GameAdvanced { game_id } => {
                write!(f, "advanced box score for game {game_id}")
            }
        }?;
        match self.season() {
            Some(season) => write!(f, " for season {season}"),
            None => Ok(()),
        }
    }
}

#[async_trait]
pub trait DatasetSource: Send + Sync {
    async fn fetch_dataset(&self, dataset: &Dataset) -> Result<serde_json::Value>;
}
