use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::shared::AppError;

/// Database model for the accounts table
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserModel {
    pub id: String, // UUID v4 as string
    pub username: String,
    pub display_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_staff: bool,
    pub created_at: DateTime<Utc>,
}

impl UserModel {
    /// Creates a new account with a freshly hashed password
    pub fn new(
        username: String,
        display_name: String,
        password: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Self, AppError> {
        let password_hash = hash(password, DEFAULT_COST)
            .map_err(|e| AppError::DatabaseError(format!("Password hashing failed: {}", e)))?;

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            username,
            display_name,
            password_hash,
            is_staff: false,
            created_at,
        })
    }

    /// Checks a raw password against the stored hash
    pub fn verify_password(&self, password: &str) -> bool {
        verify(password, &self.password_hash).unwrap_or(false)
    }

    /// Replaces the stored hash with a hash of the given password
    pub fn set_password(&mut self, password: &str) -> Result<(), AppError> {
        self.password_hash = hash(password, DEFAULT_COST)
            .map_err(|e| AppError::DatabaseError(format!("Password hashing failed: {}", e)))?;
        Ok(())
    }
}
