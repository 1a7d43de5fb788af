use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::{
    repository::TokenBlacklist,
    token::TokenConfig,
    types::{AuthClaims, AuthenticatedUserResponse, LoginResponse, TokenKind, TokenPairResponse},
};
use crate::clock::Clock;
use crate::player::repository::PlayerRepository;
use crate::shared::AppError;
use crate::user::{repository::UserRepository, UserModel};

/// Service for handling authentication business logic.
///
/// Access tokens are short-lived and never revoked. Refresh tokens rotate:
/// every successful refresh blacklists the presented token and issues a new
/// pair, so a leaked refresh token stops working after its first reuse.
pub struct AuthService {
    users: Arc<dyn UserRepository + Send + Sync>,
    players: Arc<dyn PlayerRepository + Send + Sync>,
    blacklist: Arc<dyn TokenBlacklist + Send + Sync>,
    token_config: TokenConfig,
    clock: Arc<dyn Clock>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository + Send + Sync>,
        players: Arc<dyn PlayerRepository + Send + Sync>,
        blacklist: Arc<dyn TokenBlacklist + Send + Sync>,
        token_config: TokenConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            players,
            blacklist,
            token_config,
            clock,
        }
    }

    /// Verifies credentials and issues a fresh access/refresh pair
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, AppError> {
        if username.is_empty() || password.is_empty() {
            return Err(AppError::Validation(
                "Username and password are required".to_string(),
            ));
        }

        let user = self
            .users
            .get_user_by_username(username)
            .await?
            .ok_or_else(|| {
                warn!(username = %username, "Login attempt for unknown username");
                AppError::Unauthorized("Invalid username or password".to_string())
            })?;

        if !user.verify_password(password) {
            warn!(username = %username, "Login attempt with wrong password");
            return Err(AppError::Unauthorized(
                "Invalid username or password".to_string(),
            ));
        }

        let player_id = self
            .players
            .get_player_by_user(&user.id)
            .await?
            .map(|p| p.id);

        let now = self.clock.now();
        let (access, refresh) = self.issue_pair(&user, player_id.clone(), now)?;

        info!(username = %user.username, "Login successful");

        Ok(LoginResponse {
            access,
            refresh,
            player_id,
            username: user.username,
        })
    }

    /// Rotates a refresh token: revokes the presented one, issues a new pair
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPairResponse, AppError> {
        let claims = self.validate_refresh(refresh_token).await?;

        let user = self.users.get_user(&claims.sub).await?.ok_or_else(|| {
            warn!(user_id = %claims.sub, "Refresh token for missing user");
            AppError::Unauthorized("Invalid or expired refresh token".to_string())
        })?;

        // Blacklist the presented token before issuing the replacement
        self.blacklist
            .revoke(&claims.jti, expiry_instant(claims.exp))
            .await?;

        let player_id = self
            .players
            .get_player_by_user(&user.id)
            .await?
            .map(|p| p.id);

        let now = self.clock.now();
        let (access, refresh) = self.issue_pair(&user, player_id, now)?;

        info!(username = %user.username, "Refresh token rotated");

        Ok(TokenPairResponse { access, refresh })
    }

    /// Checks that a token is valid (signature, expiry, not blacklisted)
    #[instrument(skip(self, token))]
    pub async fn verify(&self, token: &str) -> Result<(), AppError> {
        let claims = self
            .token_config
            .validate_token(token)
            .map_err(|_| AppError::Unauthorized("Token is invalid or expired".to_string()))?;

        if claims.kind == TokenKind::Refresh && self.blacklist.is_revoked(&claims.jti).await? {
            return Err(AppError::Unauthorized(
                "Token is invalid or expired".to_string(),
            ));
        }

        Ok(())
    }

    /// Blacklists the presented refresh token
    #[instrument(skip(self, refresh_token))]
    pub async fn logout(&self, refresh_token: &str) -> Result<(), AppError> {
        let claims = self.validate_refresh(refresh_token).await?;

        self.blacklist
            .revoke(&claims.jti, expiry_instant(claims.exp))
            .await?;

        info!(username = %claims.username, "Refresh token revoked on logout");
        Ok(())
    }

    /// Resolves the authenticated caller's account and player identity
    #[instrument(skip(self))]
    pub async fn authenticated_user(
        &self,
        user_id: &str,
    ) -> Result<AuthenticatedUserResponse, AppError> {
        let user = self
            .users
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let player_id = self
            .players
            .get_player_by_user(&user.id)
            .await?
            .map(|p| p.id);

        Ok(AuthenticatedUserResponse {
            id: user.id,
            username: user.username,
            display_name: user.display_name,
            is_staff: user.is_staff,
            player_id,
        })
    }

    async fn validate_refresh(&self, refresh_token: &str) -> Result<AuthClaims, AppError> {
        let claims = self
            .token_config
            .validate_token(refresh_token)
            .map_err(|_| AppError::Unauthorized("Invalid or expired refresh token".to_string()))?;

        if claims.kind != TokenKind::Refresh {
            warn!(kind = ?claims.kind, "Non-refresh token presented to a refresh-only operation");
            return Err(AppError::Unauthorized(
                "Invalid or expired refresh token".to_string(),
            ));
        }

        if self.blacklist.is_revoked(&claims.jti).await? {
            warn!(jti = %claims.jti, "Blacklisted refresh token presented");
            return Err(AppError::Unauthorized(
                "Invalid or expired refresh token".to_string(),
            ));
        }

        Ok(claims)
    }

    fn issue_pair(
        &self,
        user: &UserModel,
        player_id: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(String, String), AppError> {
        let access =
            self.token_config
                .create_token(user, player_id.clone(), TokenKind::Access, now)?;
        let refresh = self
            .token_config
            .create_token(user, player_id, TokenKind::Refresh, now)?;
        Ok((access, refresh))
    }
}

fn expiry_instant(exp: usize) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(exp as i64, 0).unwrap_or_else(Utc::now)
}
