use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::EnumIter;

/// Default accent color for offers without an explicit one
pub const DEFAULT_OFFER_COLOR: &str = "#1565C0";

/// Lifecycle state of an offer. DRAFT offers are invisible to players;
/// the ACTIVE/UPCOMING/EXPIRED split is refined further by the date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OfferStatus {
    Active,
    Upcoming,
    Expired,
    Draft,
}

impl fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                OfferStatus::Active => "ACTIVE",
                OfferStatus::Upcoming => "UPCOMING",
                OfferStatus::Expired => "EXPIRED",
                OfferStatus::Draft => "DRAFT",
            }
        )
    }
}

impl TryFrom<&str> for OfferStatus {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "ACTIVE" => Ok(OfferStatus::Active),
            "UPCOMING" => Ok(OfferStatus::Upcoming),
            "EXPIRED" => Ok(OfferStatus::Expired),
            "DRAFT" => Ok(OfferStatus::Draft),
            _ => Err(s.to_string()),
        }
    }
}

/// Category of a promotional offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OfferType {
    Discount,
    Event,
    Training,
    Membership,
    Other,
}

impl fmt::Display for OfferType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                OfferType::Discount => "DISCOUNT",
                OfferType::Event => "EVENT",
                OfferType::Training => "TRAINING",
                OfferType::Membership => "MEMBERSHIP",
                OfferType::Other => "OTHER",
            }
        )
    }
}

impl TryFrom<&str> for OfferType {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "DISCOUNT" => Ok(OfferType::Discount),
            "EVENT" => Ok(OfferType::Event),
            "TRAINING" => Ok(OfferType::Training),
            "MEMBERSHIP" => Ok(OfferType::Membership),
            "OTHER" => Ok(OfferType::Other),
            _ => Err(s.to_string()),
        }
    }
}

/// Database model for the offers table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferModel {
    pub id: String, // UUID v4 as string
    pub title: String,
    pub description: String,
    pub color: String, // hex color code, e.g. #1565C0
    pub image_url: Option<String>,
    pub offer_type: OfferType,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: OfferStatus,
    pub is_featured: bool,
    pub is_exclusive: bool,
    pub created_by: Option<String>, // account id of the creating staff user
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OfferModel {
    /// An offer is active when its status says so and the given instant
    /// falls inside the validity window (inclusive on both ends)
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.status == OfferStatus::Active && self.start_date <= now && now <= self.end_date
    }

    /// Whole days until the offer ends, never negative
    pub fn days_remaining(&self, now: DateTime<Utc>) -> i64 {
        (self.end_date - now).num_days().max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use strum::IntoEnumIterator;
    use uuid::Uuid;

    fn offer_with_window(
        status: OfferStatus,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> OfferModel {
        OfferModel {
            id: Uuid::new_v4().to_string(),
            title: "Summer deal".to_string(),
            description: String::new(),
            color: DEFAULT_OFFER_COLOR.to_string(),
            image_url: None,
            offer_type: OfferType::Discount,
            start_date: start,
            end_date: end,
            status,
            is_featured: false,
            is_exclusive: false,
            created_by: None,
            created_at: start,
            updated_at: start,
        }
    }

    #[test]
    fn test_is_active_requires_status_and_window() {
        let now = Utc::now();
        let offer = offer_with_window(
            OfferStatus::Active,
            now - Duration::days(1),
            now + Duration::days(1),
        );
        assert!(offer.is_active(now));

        // Same window but wrong status
        let draft = offer_with_window(
            OfferStatus::Draft,
            now - Duration::days(1),
            now + Duration::days(1),
        );
        assert!(!draft.is_active(now));

        // Right status but window not started
        let early = offer_with_window(
            OfferStatus::Active,
            now + Duration::hours(1),
            now + Duration::days(1),
        );
        assert!(!early.is_active(now));

        // Right status but window over
        let late = offer_with_window(
            OfferStatus::Active,
            now - Duration::days(2),
            now - Duration::hours(1),
        );
        assert!(!late.is_active(now));
    }

    #[test]
    fn test_is_active_window_bounds_inclusive() {
        let now = Utc::now();
        let offer = offer_with_window(OfferStatus::Active, now, now + Duration::days(1));
        assert!(offer.is_active(now));

        let ending = offer_with_window(OfferStatus::Active, now - Duration::days(1), now);
        assert!(ending.is_active(now));
    }

    #[test]
    fn test_days_remaining_never_negative() {
        let now = Utc::now();
        let offer = offer_with_window(
            OfferStatus::Active,
            now - Duration::days(10),
            now - Duration::days(3),
        );
        assert_eq!(offer.days_remaining(now), 0);

        let open = offer_with_window(OfferStatus::Active, now, now + Duration::days(5));
        assert_eq!(open.days_remaining(now), 5);
    }

    #[test]
    fn test_status_string_roundtrip() {
        for status in OfferStatus::iter() {
            let raw = status.to_string();
            assert_eq!(OfferStatus::try_from(raw.as_str()).unwrap(), status);
        }
        assert!(OfferStatus::try_from("BOGUS").is_err());
    }

    #[test]
    fn test_offer_type_string_roundtrip() {
        for offer_type in OfferType::iter() {
            let raw = offer_type.to_string();
            assert_eq!(OfferType::try_from(raw.as_str()).unwrap(), offer_type);
        }
    }
}
