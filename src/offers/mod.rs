// Public API - what other modules can use
pub use handlers::{
    activate_offer, active_offers, create_offer, deactivate_offer, delete_offer, expired_offers,
    featured_offers, get_offer, home_offers, list_offers, toggle_exclusive, toggle_featured,
    update_offer, upcoming_offers,
};
pub use models::{OfferModel, OfferStatus, OfferType};

// Internal modules
pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;
pub mod types;
