use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use crate::shared::AppError;

/// Trait for the refresh-token blacklist.
///
/// Refresh tokens are revoked on logout and on every rotation; an entry is
/// only needed until the token itself expires, so implementations keep the
/// expiry alongside the token id for cleanup.
#[async_trait]
pub trait TokenBlacklist {
    async fn revoke(&self, jti: &str, expires_at: DateTime<Utc>) -> Result<(), AppError>;
    async fn is_revoked(&self, jti: &str) -> Result<bool, AppError>;
    async fn cleanup_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError>;
}

/// In-memory implementation of TokenBlacklist for development and testing
pub struct InMemoryTokenBlacklist {
    revoked: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl Default for InMemoryTokenBlacklist {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTokenBlacklist {
    pub fn new() -> Self {
        Self {
            revoked: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl TokenBlacklist for InMemoryTokenBlacklist {
    #[instrument(skip(self))]
    async fn revoke(&self, jti: &str, expires_at: DateTime<Utc>) -> Result<(), AppError> {
        debug!(jti = %jti, "Revoking token in memory");

        let mut revoked = self.revoked.lock().unwrap();
        revoked.insert(jti.to_string(), expires_at);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn is_revoked(&self, jti: &str) -> Result<bool, AppError> {
        let revoked = self.revoked.lock().unwrap();
        Ok(revoked.contains_key(jti))
    }

    #[instrument(skip(self))]
    async fn cleanup_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let mut revoked = self.revoked.lock().unwrap();
        let initial_count = revoked.len();

        revoked.retain(|_, expires_at| *expires_at > now);

        let removed_count = initial_count - revoked.len();
        debug!(
            expired_entries_removed = removed_count,
            "Expired blacklist entries cleaned up from memory"
        );
        Ok(removed_count as u64)
    }
}

/// PostgreSQL implementation of the refresh-token blacklist
pub struct PostgresTokenBlacklist {
    pool: PgPool,
}

impl PostgresTokenBlacklist {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenBlacklist for PostgresTokenBlacklist {
    #[instrument(skip(self))]
    async fn revoke(&self, jti: &str, expires_at: DateTime<Utc>) -> Result<(), AppError> {
        debug!(jti = %jti, "Revoking token in database");

        sqlx::query(
            "INSERT INTO revoked_tokens (jti, expires_at) VALUES ($1, $2) ON CONFLICT (jti) DO NOTHING"
        )
        .bind(jti)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, jti = %jti, "Failed to revoke token in database");
            AppError::DatabaseError(e.to_string())
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn is_revoked(&self, jti: &str) -> Result<bool, AppError> {
        let row = sqlx::query("SELECT jti FROM revoked_tokens WHERE jti = $1")
            .bind(jti)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, jti = %jti, "Failed to check token blacklist");
                AppError::DatabaseError(e.to_string())
            })?;

        Ok(row.is_some())
    }

    #[instrument(skip(self))]
    async fn cleanup_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at < $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to cleanup expired blacklist entries");
                AppError::DatabaseError(e.to_string())
            })?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_revoke_and_check() {
        let blacklist = InMemoryTokenBlacklist::new();
        let expires = Utc::now() + Duration::days(1);

        assert!(!blacklist.is_revoked("token-1").await.unwrap());

        blacklist.revoke("token-1", expires).await.unwrap();
        assert!(blacklist.is_revoked("token-1").await.unwrap());
        assert!(!blacklist.is_revoked("token-2").await.unwrap());
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let blacklist = InMemoryTokenBlacklist::new();
        let expires = Utc::now() + Duration::days(1);

        blacklist.revoke("token-1", expires).await.unwrap();
        blacklist.revoke("token-1", expires).await.unwrap();
        assert!(blacklist.is_revoked("token-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_cleanup_removes_only_expired_entries() {
        let blacklist = InMemoryTokenBlacklist::new();
        let now = Utc::now();

        blacklist
            .revoke("expired", now - Duration::hours(1))
            .await
            .unwrap();
        blacklist
            .revoke("valid", now + Duration::hours(1))
            .await
            .unwrap();

        let removed = blacklist.cleanup_expired(now).await.unwrap();
        assert_eq!(removed, 1);

        assert!(!blacklist.is_revoked("expired").await.unwrap());
        assert!(blacklist.is_revoked("valid").await.unwrap());
    }
}
