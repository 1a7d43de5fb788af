use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Player gender, stored as a single character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Gender::Male => "M",
                Gender::Female => "F",
            }
        )
    }
}

impl TryFrom<&str> for Gender {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "M" => Ok(Gender::Male),
            "F" => Ok(Gender::Female),
            _ => Err(s.to_string()),
        }
    }
}

/// Database model for the players table.
///
/// Carries the profile fields plus the cumulative performance counters.
/// `average_score` is derived from `total_score` and `games_played` and is
/// recomputed on every mutation, never written independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerModel {
    pub id: String,      // UUID v4 as string
    pub user_id: String, // owning account (1:1)
    pub display_name: String,
    pub email: String,
    pub phone: String,
    pub birthdate: Option<NaiveDate>,
    pub gender: Gender,
    pub total_score: i64,
    pub high_score: i64,
    pub games_played: u32,
    pub games_won: u32,
    pub average_score: f64,
    pub last_game_score: Option<i64>,
    pub last_game_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PlayerModel {
    /// Creates a new player with zeroed counters
    pub fn new(
        user_id: String,
        display_name: String,
        email: String,
        phone: String,
        gender: Gender,
        birthdate: Option<NaiveDate>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            display_name,
            email,
            phone,
            birthdate,
            gender,
            total_score: 0,
            high_score: 0,
            games_played: 0,
            games_won: 0,
            average_score: 0.0,
            last_game_score: None,
            last_game_date: None,
            created_at,
            updated_at: created_at,
        }
    }

    /// Folds one non-negative game score into the counters.
    ///
    /// Callers validate the score; this assumes `score >= 0` and keeps
    /// `average_score` consistent with the updated totals.
    pub fn apply_game_result(&mut self, score: i64, played_at: DateTime<Utc>) {
        self.last_game_score = Some(score);
        self.last_game_date = Some(played_at);
        self.total_score += score;
        self.games_played += 1;
        self.high_score = self.high_score.max(score);
        self.average_score = self.total_score as f64 / self.games_played as f64;
        self.updated_at = played_at;
    }

    /// Increments the win counter unless it would exceed games played.
    /// Returns false when the increment was refused.
    pub fn apply_win(&mut self) -> bool {
        if self.games_won >= self.games_played {
            return false;
        }
        self.games_won += 1;
        true
    }
}
