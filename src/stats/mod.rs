pub mod handlers;
pub mod service;

mod errors;
pub mod models;

pub use errors::StatsError;
pub use handlers::{leaderboard, my_stats, rankings, record_game, record_win};
pub use models::*;
pub use service::StatsService;
