use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::types::{AuthClaims, TokenKind};
use crate::shared::AppError;
use crate::user::UserModel;

/// Configuration for JWT token operations
#[derive(Clone)]
pub struct TokenConfig {
    secret: String,
    pub access_minutes: i64,
    pub refresh_days: i64,
}

impl TokenConfig {
    pub fn new() -> Self {
        // Allow configuring lifetimes via env vars; defaults match a
        // 30-minute access / 180-day refresh split
        let access_minutes = std::env::var("ACCESS_TOKEN_MINUTES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);
        let refresh_days = std::env::var("REFRESH_TOKEN_DAYS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(180);

        Self {
            secret: std::env::var("JWT_SECRET")
                .unwrap_or_else(|_| "your-secret-key-change-in-production".to_string()),
            access_minutes,
            refresh_days,
        }
    }

    /// Creates a new JWT token of the given kind for the given account
    #[instrument(skip(self, user, player_id))]
    pub fn create_token(
        &self,
        user: &UserModel,
        player_id: Option<String>,
        kind: TokenKind,
        now: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let lifetime = match kind {
            TokenKind::Access => Duration::minutes(self.access_minutes),
            TokenKind::Refresh => Duration::days(self.refresh_days),
        };
        let exp = (now + lifetime).timestamp() as usize;

        debug!(?kind, exp_timestamp = exp, "Creating JWT token");

        let claims = AuthClaims {
            sub: user.id.clone(),
            username: user.username.clone(),
            player_id,
            is_staff: user.is_staff,
            kind,
            jti: Uuid::new_v4().to_string(),
            exp,
            iat: now.timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )
        .map_err(|e| {
            debug!(error = %e, "Failed to encode JWT token");
            AppError::JwtError(e.to_string())
        })
    }

    /// Validates a JWT token and returns the claims if valid
    #[instrument(skip(self, token))]
    pub fn validate_token(&self, token: &str) -> Result<AuthClaims, AppError> {
        decode::<AuthClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &Validation::default(),
        )
        .map(|data| {
            debug!(
                username = %data.claims.username,
                kind = ?data.claims.kind,
                "JWT token decoded successfully"
            );
            data.claims
        })
        .map_err(|e| {
            debug!(error = %e, "Failed to decode JWT token");
            AppError::JwtError(e.to_string())
        })
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user() -> UserModel {
        UserModel::new(
            "test-user".to_string(),
            "Test User".to_string(),
            "password",
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_create_and_validate_access_token() {
        let config = TokenConfig::new();
        let user = test_user();

        let token = config
            .create_token(
                &user,
                Some("player-1".to_string()),
                TokenKind::Access,
                Utc::now(),
            )
            .unwrap();
        assert!(!token.is_empty());

        let claims = config.validate_token(&token).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.username, user.username);
        assert_eq!(claims.player_id, Some("player-1".to_string()));
        assert_eq!(claims.kind, TokenKind::Access);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_refresh_token_outlives_access_token() {
        let config = TokenConfig::new();
        let user = test_user();
        let now = Utc::now();

        let access = config
            .create_token(&user, None, TokenKind::Access, now)
            .unwrap();
        let refresh = config
            .create_token(&user, None, TokenKind::Refresh, now)
            .unwrap();

        let access_claims = config.validate_token(&access).unwrap();
        let refresh_claims = config.validate_token(&refresh).unwrap();
        assert!(refresh_claims.exp > access_claims.exp);
    }

    #[test]
    fn test_tokens_get_unique_ids() {
        let config = TokenConfig::new();
        let user = test_user();
        let now = Utc::now();

        let first = config
            .create_token(&user, None, TokenKind::Refresh, now)
            .unwrap();
        let second = config
            .create_token(&user, None, TokenKind::Refresh, now)
            .unwrap();

        let first_claims = config.validate_token(&first).unwrap();
        let second_claims = config.validate_token(&second).unwrap();
        assert_ne!(first_claims.jti, second_claims.jti);
    }

    #[test]
    fn test_invalid_token() {
        let config = TokenConfig::new();
        let result = config.validate_token("invalid.token.here");
        assert!(matches!(result, Err(AppError::JwtError(_))));
    }

    #[test]
    fn test_expired_token_rejected() {
        let config = TokenConfig::new();
        let user = test_user();

        // Issued far enough in the past that even the refresh lifetime is over
        let long_ago = Utc::now() - Duration::days(4000);
        let token = config
            .create_token(&user, None, TokenKind::Access, long_ago)
            .unwrap();

        let result = config.validate_token(&token);
        assert!(matches!(result, Err(AppError::JwtError(_))));
    }
}
