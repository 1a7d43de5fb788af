use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::models::UserModel;
use crate::shared::AppError;

/// Trait for account repository operations
#[async_trait]
pub trait UserRepository {
    async fn create_user(&self, user: &UserModel) -> Result<(), AppError>;
    async fn get_user(&self, user_id: &str) -> Result<Option<UserModel>, AppError>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<UserModel>, AppError>;
    async fn update_user(&self, user: &UserModel) -> Result<(), AppError>;
}

/// In-memory implementation of UserRepository for development and testing
pub struct InMemoryUserRepository {
    users: Mutex<HashMap<String, UserModel>>,
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryUserRepository {
    /// Creates a new empty in-memory repository
    pub fn new() -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    #[instrument(skip(self, user))]
    async fn create_user(&self, user: &UserModel) -> Result<(), AppError> {
        debug!(user_id = %user.id, username = %user.username, "Creating user in memory");

        let mut users = self.users.lock().unwrap();
        if users.contains_key(&user.id) {
            warn!(user_id = %user.id, "User already exists in memory");
            return Err(AppError::DatabaseError("User already exists".to_string()));
        }
        if users.values().any(|u| u.username == user.username) {
            warn!(username = %user.username, "Username already taken");
            return Err(AppError::Conflict("Username already taken".to_string()));
        }
        users.insert(user.id.clone(), user.clone());

        debug!(user_id = %user.id, "User created successfully in memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_user(&self, user_id: &str) -> Result<Option<UserModel>, AppError> {
        let users = self.users.lock().unwrap();
        Ok(users.get(user_id).cloned())
    }

    #[instrument(skip(self))]
    async fn get_user_by_username(&self, username: &str) -> Result<Option<UserModel>, AppError> {
        debug!(username = %username, "Fetching user by username from memory");

        let users = self.users.lock().unwrap();
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    #[instrument(skip(self, user))]
    async fn update_user(&self, user: &UserModel) -> Result<(), AppError> {
        let mut users = self.users.lock().unwrap();
        if !users.contains_key(&user.id) {
            warn!(user_id = %user.id, "User not found for update in memory");
            return Err(AppError::NotFound("User not found".to_string()));
        }
        users.insert(user.id.clone(), user.clone());
        Ok(())
    }
}

/// PostgreSQL implementation of the account repository
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_user(row: &sqlx::postgres::PgRow) -> UserModel {
        UserModel {
            id: row.get("id"),
            username: row.get("username"),
            display_name: row.get("display_name"),
            password_hash: row.get("password_hash"),
            is_staff: row.get("is_staff"),
            created_at: row.get("created_at"),
        }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    #[instrument(skip(self, user))]
    async fn create_user(&self, user: &UserModel) -> Result<(), AppError> {
        debug!(user_id = %user.id, username = %user.username, "Creating user in database");

        sqlx::query(
            "INSERT INTO users (id, username, display_name, password_hash, is_staff, created_at) VALUES ($1, $2, $3, $4, $5, $6)"
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.display_name)
        .bind(&user.password_hash)
        .bind(user.is_staff)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to create user in database");
            AppError::DatabaseError(e.to_string())
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_user(&self, user_id: &str) -> Result<Option<UserModel>, AppError> {
        let row = sqlx::query(
            "SELECT id, username, display_name, password_hash, is_staff, created_at FROM users WHERE id = $1"
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, user_id = %user_id, "Failed to fetch user from database");
            AppError::DatabaseError(e.to_string())
        })?;

        Ok(row.as_ref().map(Self::row_to_user))
    }

    #[instrument(skip(self))]
    async fn get_user_by_username(&self, username: &str) -> Result<Option<UserModel>, AppError> {
        let row = sqlx::query(
            "SELECT id, username, display_name, password_hash, is_staff, created_at FROM users WHERE username = $1"
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, username = %username, "Failed to fetch user by username");
            AppError::DatabaseError(e.to_string())
        })?;

        Ok(row.as_ref().map(Self::row_to_user))
    }

    #[instrument(skip(self, user))]
    async fn update_user(&self, user: &UserModel) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE users SET display_name = $2, password_hash = $3, is_staff = $4 WHERE id = $1",
        )
        .bind(&user.id)
        .bind(&user.display_name)
        .bind(&user.password_hash)
        .bind(user.is_staff)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, user_id = %user.id, "Failed to update user in database");
            AppError::DatabaseError(e.to_string())
        })?;

        if result.rows_affected() == 0 {
            warn!(user_id = %user.id, "User not found for update");
            return Err(AppError::NotFound("User not found".to_string()));
        }

        Ok(())
    }
}
