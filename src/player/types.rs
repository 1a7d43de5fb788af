use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::models::{Gender, PlayerModel};

/// Request for registering a new player. Creates the backing account and
/// the player profile in one call.
#[derive(Debug, Deserialize)]
pub struct PlayerRegisterRequest {
    pub username: String,
    pub password: String,
    pub display_name: String,
    pub email: String,
    pub phone: String,
    pub gender: Gender,
    pub birthdate: Option<NaiveDate>,
}

/// Partial profile update; absent fields keep their current value
#[derive(Debug, Deserialize)]
pub struct PlayerUpdateRequest {
    pub birthdate: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub phone: Option<String>,
    pub password: Option<String>,
}

/// Full read view of a player profile including the raw counters
#[derive(Debug, Serialize, Deserialize)]
pub struct PlayerResponse {
    pub id: String,
    pub user_id: String,
    pub display_name: String,
    pub email: String,
    pub phone: String,
    pub birthdate: Option<NaiveDate>,
    pub gender: Gender,
    pub total_score: i64,
    pub high_score: i64,
    pub games_played: u32,
    pub games_won: u32,
    pub average_score: f64,
    pub last_game_score: Option<i64>,
    pub last_game_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PlayerResponse {
    pub fn from_model(player: &PlayerModel) -> Self {
        Self {
            id: player.id.clone(),
            user_id: player.user_id.clone(),
            display_name: player.display_name.clone(),
            email: player.email.clone(),
            phone: player.phone.clone(),
            birthdate: player.birthdate,
            gender: player.gender,
            total_score: player.total_score,
            high_score: player.high_score,
            games_played: player.games_played,
            games_won: player.games_won,
            average_score: player.average_score,
            last_game_score: player.last_game_score,
            last_game_date: player.last_game_date,
            created_at: player.created_at,
            updated_at: player.updated_at,
        }
    }
}
