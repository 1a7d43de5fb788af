use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::models::{OfferModel, OfferStatus, OfferType};

#[derive(Debug, Deserialize)]
pub struct OfferCreateRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub color: Option<String>,
    pub image_url: Option<String>,
    pub offer_type: Option<OfferType>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: Option<OfferStatus>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub is_exclusive: bool,
}

/// Partial offer update; absent fields keep their current value
#[derive(Debug, Deserialize)]
pub struct OfferUpdateRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub image_url: Option<String>,
    pub offer_type: Option<OfferType>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: Option<OfferStatus>,
    pub is_featured: Option<bool>,
    pub is_exclusive: Option<bool>,
}

/// Query parameters accepted by the offer listing endpoints
#[derive(Debug, Default, Deserialize)]
pub struct OfferQuery {
    pub status: Option<OfferStatus>,
    #[serde(rename = "type")]
    pub offer_type: Option<OfferType>,
    pub is_featured: Option<bool>,
    pub is_exclusive: Option<bool>,
    pub is_active: Option<bool>,
}

/// Read view of an offer with the computed date-window fields
#[derive(Debug, Serialize, Deserialize)]
pub struct OfferResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub color: String,
    pub image_url: Option<String>,
    pub offer_type: OfferType,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: OfferStatus,
    pub is_featured: bool,
    pub is_exclusive: bool,
    pub is_active: bool,
    pub days_remaining: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OfferResponse {
    pub fn from_model(offer: &OfferModel, now: DateTime<Utc>) -> Self {
        Self {
            id: offer.id.clone(),
            title: offer.title.clone(),
            description: offer.description.clone(),
            color: offer.color.clone(),
            image_url: offer.image_url.clone(),
            offer_type: offer.offer_type,
            start_date: offer.start_date,
            end_date: offer.end_date,
            status: offer.status,
            is_featured: offer.is_featured,
            is_exclusive: offer.is_exclusive,
            is_active: offer.is_active(now),
            days_remaining: offer.days_remaining(now),
            created_at: offer.created_at,
            updated_at: offer.updated_at,
        }
    }
}

/// Grouped offers for the home screen, featured first
#[derive(Debug, Serialize, Deserialize)]
pub struct HomeOffersResponse {
    pub featured: Vec<OfferResponse>,
    pub active: Vec<OfferResponse>,
    pub upcoming: Vec<OfferResponse>,
    pub count: HomeOffersCount,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HomeOffersCount {
    pub featured: usize,
    pub active: usize,
    pub upcoming: usize,
}
