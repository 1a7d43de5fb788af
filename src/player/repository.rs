use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::models::{Gender, PlayerModel};
use crate::shared::AppError;

/// Result of recording a game score against a player
#[derive(Debug, Clone)]
pub enum GameRecordResult {
    /// Counters updated, returns the new record state
    Success(PlayerModel),
    /// Player does not exist
    PlayerNotFound,
}

/// Result of recording a win against a player
#[derive(Debug, Clone)]
pub enum WinRecordResult {
    /// Win counter incremented, returns the new record state
    Success(PlayerModel),
    /// Incrementing would make wins exceed games played
    WinWithoutGame,
    /// Player does not exist
    PlayerNotFound,
}

/// Trait for player repository operations
#[async_trait]
pub trait PlayerRepository {
    async fn create_player(&self, player: &PlayerModel) -> Result<(), AppError>;
    async fn get_player(&self, player_id: &str) -> Result<Option<PlayerModel>, AppError>;
    async fn get_player_by_user(&self, user_id: &str) -> Result<Option<PlayerModel>, AppError>;
    async fn list_players(&self) -> Result<Vec<PlayerModel>, AppError>;
    async fn update_player(&self, player: &PlayerModel) -> Result<(), AppError>;

    /// Atomically folds one game score into a single player's counters.
    /// Concurrent calls for the same player must not lose updates.
    async fn record_game_result(
        &self,
        player_id: &str,
        score: i64,
        played_at: DateTime<Utc>,
    ) -> Result<GameRecordResult, AppError>;

    /// Atomically increments the win counter, refusing an increment that
    /// would make `games_won` exceed `games_played`.
    async fn record_win(&self, player_id: &str) -> Result<WinRecordResult, AppError>;
}

/// In-memory implementation of PlayerRepository for development and testing
pub struct InMemoryPlayerRepository {
    players: Mutex<HashMap<String, PlayerModel>>,
}

impl Default for InMemoryPlayerRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryPlayerRepository {
    /// Creates a new empty in-memory repository
    pub fn new() -> Self {
        Self {
            players: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl PlayerRepository for InMemoryPlayerRepository {
    #[instrument(skip(self, player))]
    async fn create_player(&self, player: &PlayerModel) -> Result<(), AppError> {
        debug!(player_id = %player.id, display_name = %player.display_name, "Creating player in memory");

        let mut players = self.players.lock().unwrap();
        if players.contains_key(&player.id) {
            warn!(player_id = %player.id, "Player already exists in memory");
            return Err(AppError::DatabaseError("Player already exists".to_string()));
        }
        if players.values().any(|p| p.user_id == player.user_id) {
            warn!(user_id = %player.user_id, "Account already has a player");
            return Err(AppError::Conflict(
                "Account already has a player".to_string(),
            ));
        }
        if players.values().any(|p| p.email == player.email) {
            warn!(email = %player.email, "Email already registered");
            return Err(AppError::Conflict("Email already registered".to_string()));
        }
        if players.values().any(|p| p.phone == player.phone) {
            warn!(phone = %player.phone, "Phone already registered");
            return Err(AppError::Conflict("Phone already registered".to_string()));
        }
        players.insert(player.id.clone(), player.clone());

        debug!(player_id = %player.id, "Player created successfully in memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_player(&self, player_id: &str) -> Result<Option<PlayerModel>, AppError> {
        let players = self.players.lock().unwrap();
        Ok(players.get(player_id).cloned())
    }

    #[instrument(skip(self))]
    async fn get_player_by_user(&self, user_id: &str) -> Result<Option<PlayerModel>, AppError> {
        let players = self.players.lock().unwrap();
        Ok(players.values().find(|p| p.user_id == user_id).cloned())
    }

    #[instrument(skip(self))]
    async fn list_players(&self) -> Result<Vec<PlayerModel>, AppError> {
        let players = self.players.lock().unwrap();
        Ok(players.values().cloned().collect())
    }

    #[instrument(skip(self, player))]
    async fn update_player(&self, player: &PlayerModel) -> Result<(), AppError> {
        let mut players = self.players.lock().unwrap();
        if !players.contains_key(&player.id) {
            warn!(player_id = %player.id, "Player not found for update in memory");
            return Err(AppError::NotFound("Player not found".to_string()));
        }
        players.insert(player.id.clone(), player.clone());
        Ok(())
    }

    #[instrument(skip(self))]
    async fn record_game_result(
        &self,
        player_id: &str,
        score: i64,
        played_at: DateTime<Utc>,
    ) -> Result<GameRecordResult, AppError> {
        debug!(player_id = %player_id, score, "Recording game result atomically");

        let mut players = self.players.lock().unwrap();

        let player = match players.get_mut(player_id) {
            Some(player) => player,
            None => {
                debug!(player_id = %player_id, "Player not found");
                return Ok(GameRecordResult::PlayerNotFound);
            }
        };

        player.apply_game_result(score, played_at);
        let updated = player.clone();

        info!(
            player_id = %player_id,
            score,
            total_score = updated.total_score,
            games_played = updated.games_played,
            "Game result recorded (atomic)"
        );

        Ok(GameRecordResult::Success(updated))
    }

    #[instrument(skip(self))]
    async fn record_win(&self, player_id: &str) -> Result<WinRecordResult, AppError> {
        debug!(player_id = %player_id, "Recording win atomically");

        let mut players = self.players.lock().unwrap();

        let player = match players.get_mut(player_id) {
            Some(player) => player,
            None => {
                debug!(player_id = %player_id, "Player not found");
                return Ok(WinRecordResult::PlayerNotFound);
            }
        };

        if !player.apply_win() {
            debug!(
                player_id = %player_id,
                games_won = player.games_won,
                games_played = player.games_played,
                "Win refused, would exceed games played"
            );
            return Ok(WinRecordResult::WinWithoutGame);
        }

        let updated = player.clone();

        info!(
            player_id = %player_id,
            games_won = updated.games_won,
            "Win recorded (atomic)"
        );

        Ok(WinRecordResult::Success(updated))
    }
}

/// PostgreSQL implementation of the player repository.
///
/// The two counter mutations are single UPDATE statements so the database
/// serializes concurrent writers per row; column references on the right
/// hand side of SET read the pre-update values.
pub struct PostgresPlayerRepository {
    pool: PgPool,
}

impl PostgresPlayerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_player(row: &sqlx::postgres::PgRow) -> Result<PlayerModel, AppError> {
        let gender: String = row.get("gender");
        let gender = Gender::try_from(gender.as_str())
            .map_err(|g| AppError::DatabaseError(format!("Unknown gender value: {}", g)))?;

        Ok(PlayerModel {
            id: row.get("id"),
            user_id: row.get("user_id"),
            display_name: row.get("display_name"),
            email: row.get("email"),
            phone: row.get("phone"),
            birthdate: row.get("birthdate"),
            gender,
            total_score: row.get("total_score"),
            high_score: row.get("high_score"),
            games_played: row.get::<i32, _>("games_played") as u32,
            games_won: row.get::<i32, _>("games_won") as u32,
            average_score: row.get("average_score"),
            last_game_score: row.get("last_game_score"),
            last_game_date: row.get("last_game_date"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

const PLAYER_COLUMNS: &str = "id, user_id, display_name, email, phone, birthdate, gender, \
     total_score, high_score, games_played, games_won, average_score, \
     last_game_score, last_game_date, created_at, updated_at";

#[async_trait]
impl PlayerRepository for PostgresPlayerRepository {
    #[instrument(skip(self, player))]
    async fn create_player(&self, player: &PlayerModel) -> Result<(), AppError> {
        debug!(player_id = %player.id, "Creating player in database");

        sqlx::query(
            "INSERT INTO players (id, user_id, display_name, email, phone, birthdate, gender, \
             total_score, high_score, games_played, games_won, average_score, \
             last_game_score, last_game_date, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)",
        )
        .bind(&player.id)
        .bind(&player.user_id)
        .bind(&player.display_name)
        .bind(&player.email)
        .bind(&player.phone)
        .bind(player.birthdate)
        .bind(player.gender.to_string())
        .bind(player.total_score)
        .bind(player.high_score)
        .bind(player.games_played as i32)
        .bind(player.games_won as i32)
        .bind(player.average_score)
        .bind(player.last_game_score)
        .bind(player.last_game_date)
        .bind(player.created_at)
        .bind(player.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to create player in database");
            AppError::DatabaseError(e.to_string())
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_player(&self, player_id: &str) -> Result<Option<PlayerModel>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM players WHERE id = $1",
            PLAYER_COLUMNS
        ))
        .bind(player_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, player_id = %player_id, "Failed to fetch player from database");
            AppError::DatabaseError(e.to_string())
        })?;

        row.as_ref().map(Self::row_to_player).transpose()
    }

    #[instrument(skip(self))]
    async fn get_player_by_user(&self, user_id: &str) -> Result<Option<PlayerModel>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM players WHERE user_id = $1",
            PLAYER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, user_id = %user_id, "Failed to fetch player by user from database");
            AppError::DatabaseError(e.to_string())
        })?;

        row.as_ref().map(Self::row_to_player).transpose()
    }

    #[instrument(skip(self))]
    async fn list_players(&self) -> Result<Vec<PlayerModel>, AppError> {
        let rows = sqlx::query(&format!("SELECT {} FROM players", PLAYER_COLUMNS))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to list players from database");
                AppError::DatabaseError(e.to_string())
            })?;

        rows.iter().map(Self::row_to_player).collect()
    }

    #[instrument(skip(self, player))]
    async fn update_player(&self, player: &PlayerModel) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE players SET display_name = $2, email = $3, phone = $4, birthdate = $5, \
             gender = $6, updated_at = $7 WHERE id = $1",
        )
        .bind(&player.id)
        .bind(&player.display_name)
        .bind(&player.email)
        .bind(&player.phone)
        .bind(player.birthdate)
        .bind(player.gender.to_string())
        .bind(player.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, player_id = %player.id, "Failed to update player in database");
            AppError::DatabaseError(e.to_string())
        })?;

        if result.rows_affected() == 0 {
            warn!(player_id = %player.id, "Player not found for update");
            return Err(AppError::NotFound("Player not found".to_string()));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn record_game_result(
        &self,
        player_id: &str,
        score: i64,
        played_at: DateTime<Utc>,
    ) -> Result<GameRecordResult, AppError> {
        debug!(player_id = %player_id, score, "Recording game result in database");

        let row = sqlx::query(&format!(
            "UPDATE players SET \
                 last_game_score = $2, \
                 last_game_date = $3, \
                 total_score = total_score + $2, \
                 games_played = games_played + 1, \
                 high_score = GREATEST(high_score, $2), \
                 average_score = (total_score + $2)::float8 / (games_played + 1), \
                 updated_at = $3 \
             WHERE id = $1 RETURNING {}",
            PLAYER_COLUMNS
        ))
        .bind(player_id)
        .bind(score)
        .bind(played_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, player_id = %player_id, "Failed to record game result in database");
            AppError::DatabaseError(e.to_string())
        })?;

        match row {
            Some(row) => Ok(GameRecordResult::Success(Self::row_to_player(&row)?)),
            None => Ok(GameRecordResult::PlayerNotFound),
        }
    }

    #[instrument(skip(self))]
    async fn record_win(&self, player_id: &str) -> Result<WinRecordResult, AppError> {
        debug!(player_id = %player_id, "Recording win in database");

        // The guard lives in the WHERE clause so the check and the increment
        // are one statement
        let row = sqlx::query(&format!(
            "UPDATE players SET games_won = games_won + 1 \
             WHERE id = $1 AND games_won < games_played RETURNING {}",
            PLAYER_COLUMNS
        ))
        .bind(player_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, player_id = %player_id, "Failed to record win in database");
            AppError::DatabaseError(e.to_string())
        })?;

        if let Some(row) = row {
            return Ok(WinRecordResult::Success(Self::row_to_player(&row)?));
        }

        // Distinguish a missing player from a refused increment
        match self.get_player(player_id).await? {
            Some(_) => Ok(WinRecordResult::WinWithoutGame),
            None => Ok(WinRecordResult::PlayerNotFound),
        }
    }
}
