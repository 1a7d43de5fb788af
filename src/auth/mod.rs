// Public API - what other modules can use
pub use handlers::{authenticated_user, login, logout, refresh, verify};
pub use middleware::{jwt_auth, optional_jwt_auth, require_staff};
pub use types::{AuthClaims, TokenKind};

// Internal modules
mod handlers;
mod middleware;
pub mod repository;
pub mod service;
pub mod token;
pub mod types;
