use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::{
    models::PlayerModel,
    repository::PlayerRepository,
    types::{PlayerRegisterRequest, PlayerResponse, PlayerUpdateRequest},
};
use crate::auth::AuthClaims;
use crate::clock::Clock;
use crate::shared::AppError;
use crate::user::{repository::UserRepository, UserModel};

/// Service for player profile business logic
pub struct PlayerService {
    players: Arc<dyn PlayerRepository + Send + Sync>,
    users: Arc<dyn UserRepository + Send + Sync>,
    clock: Arc<dyn Clock>,
}

impl PlayerService {
    pub fn new(
        players: Arc<dyn PlayerRepository + Send + Sync>,
        users: Arc<dyn UserRepository + Send + Sync>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            players,
            users,
            clock,
        }
    }

    /// Registers a new player: creates the account with a hashed password,
    /// then the player profile with zeroed counters
    #[instrument(skip(self, request))]
    pub async fn register(
        &self,
        request: PlayerRegisterRequest,
    ) -> Result<PlayerResponse, AppError> {
        if request.username.is_empty() || request.password.is_empty() {
            return Err(AppError::Validation(
                "Username and password are required".to_string(),
            ));
        }
        if request.email.is_empty() || request.phone.is_empty() {
            return Err(AppError::Validation(
                "Email and phone are required".to_string(),
            ));
        }

        let now = self.clock.now();
        let user = UserModel::new(
            request.username,
            request.display_name.clone(),
            &request.password,
            now,
        )?;
        self.users.create_user(&user).await?;

        let player = PlayerModel::new(
            user.id.clone(),
            request.display_name,
            request.email,
            request.phone,
            request.gender,
            request.birthdate,
            now,
        );

        // TODO: roll back the created account when player creation fails
        // (needs a transaction spanning both repositories)
        self.players.create_player(&player).await?;

        info!(
            player_id = %player.id,
            username = %user.username,
            "Player registered successfully"
        );

        Ok(PlayerResponse::from_model(&player))
    }

    #[instrument(skip(self))]
    pub async fn get_player(&self, player_id: &str) -> Result<PlayerResponse, AppError> {
        let player = self
            .players
            .get_player(player_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Player not found".to_string()))?;

        Ok(PlayerResponse::from_model(&player))
    }

    /// The authenticated caller's own profile
    #[instrument(skip(self))]
    pub async fn get_player_for_user(&self, user_id: &str) -> Result<PlayerResponse, AppError> {
        let player = self
            .players
            .get_player_by_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("No player for this account".to_string()))?;

        Ok(PlayerResponse::from_model(&player))
    }

    #[instrument(skip(self))]
    pub async fn list_players(&self) -> Result<Vec<PlayerResponse>, AppError> {
        let players = self.players.list_players().await?;

        debug!(player_count = players.len(), "Players listed");

        Ok(players.iter().map(PlayerResponse::from_model).collect())
    }

    /// Applies a partial profile update. Callers may update their own
    /// profile; staff may update anyone's.
    #[instrument(skip(self, request, claims))]
    pub async fn update_profile(
        &self,
        player_id: &str,
        request: PlayerUpdateRequest,
        claims: &AuthClaims,
    ) -> Result<PlayerResponse, AppError> {
        if !claims.is_staff && claims.player_id.as_deref() != Some(player_id) {
            return Err(AppError::Forbidden(
                "You may only update your own profile".to_string(),
            ));
        }

        let mut player = self
            .players
            .get_player(player_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Player not found".to_string()))?;

        if let Some(birthdate) = request.birthdate {
            player.birthdate = Some(birthdate);
        }
        if let Some(gender) = request.gender {
            player.gender = gender;
        }
        if let Some(phone) = request.phone {
            player.phone = phone;
        }
        player.updated_at = self.clock.now();

        self.players.update_player(&player).await?;

        // Update the account password if provided
        if let Some(password) = request.password.filter(|p| !p.is_empty()) {
            let mut user = self
                .users
                .get_user(&player.user_id)
                .await?
                .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
            user.set_password(&password)?;
            self.users.update_user(&user).await?;
            info!(player_id = %player_id, "Password updated");
        }

        info!(player_id = %player_id, "Profile updated successfully");

        Ok(PlayerResponse::from_model(&player))
    }
}
