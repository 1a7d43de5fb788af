use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::auth::repository::TokenBlacklist;
use crate::auth::token::TokenConfig;
use crate::clock::Clock;
use crate::offers::repository::OfferRepository;
use crate::player::repository::PlayerRepository;
use crate::user::repository::UserRepository;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub user_repository: Arc<dyn UserRepository + Send + Sync>,
    pub player_repository: Arc<dyn PlayerRepository + Send + Sync>,
    pub offer_repository: Arc<dyn OfferRepository + Send + Sync>,
    pub token_blacklist: Arc<dyn TokenBlacklist + Send + Sync>,
    pub token_config: TokenConfig,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(
        user_repository: Arc<dyn UserRepository + Send + Sync>,
        player_repository: Arc<dyn PlayerRepository + Send + Sync>,
        offer_repository: Arc<dyn OfferRepository + Send + Sync>,
        token_blacklist: Arc<dyn TokenBlacklist + Send + Sync>,
        token_config: TokenConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            user_repository,
            player_repository,
            offer_repository,
            token_blacklist,
            token_config,
            clock,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("JWT error: {0}")]
    JwtError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::JwtError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::DatabaseError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", msg),
            ),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}
