// Public API - what other modules can use
pub use handlers::{
    get_player, list_players, me, register_player, update_player,
};
pub use models::{Gender, PlayerModel};

// Internal modules
pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;
pub mod types;
