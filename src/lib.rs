// Library crate for the Playzo platform API
// This file exposes the public API for integration tests

pub mod auth;
pub mod clock;
pub mod offers;
pub mod player;
pub mod routes;
pub mod shared;
pub mod stats;
pub mod user;

// Re-export commonly used types for easier access in tests
pub use clock::{Clock, FixedClock, SystemClock};
pub use routes::api_router;
pub use shared::{AppError, AppState};
pub use stats::{RankTier, RankedEntry, SortCriterion, StatsService, StatsView};
