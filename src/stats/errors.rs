use thiserror::Error;

use crate::shared::AppError;

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("Score must be a non-negative integer")]
    InvalidScore,

    #[error("Cannot record a win without a recorded game")]
    InvalidWin,

    #[error("Player not found: {0}")]
    PlayerNotFound(String),

    #[error(transparent)]
    Repository(#[from] AppError),
}

impl From<StatsError> for AppError {
    fn from(err: StatsError) -> Self {
        match err {
            StatsError::InvalidScore => {
                AppError::Validation("Score must be a non-negative integer".to_string())
            }
            StatsError::InvalidWin => {
                AppError::Validation("Cannot record a win without a recorded game".to_string())
            }
            StatsError::PlayerNotFound(id) => {
                AppError::NotFound(format!("Player not found: {}", id))
            }
            StatsError::Repository(inner) => inner,
        }
    }
}
