use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::EnumIter;

use crate::player::PlayerModel;

/// Total-score thresholds for the rank tiers. Exclusive lower bounds:
/// a player at exactly the threshold stays in the tier below.
pub mod rank_thresholds {
    pub const EXPERT: i64 = 1000;
    pub const ADVANCED: i64 = 500;
    pub const INTERMEDIATE: i64 = 100;
}

/// Hard cap on leaderboard page size
pub const MAX_LEADERBOARD_LIMIT: usize = 100;
/// Page size used when the caller does not ask for one
pub const DEFAULT_LEADERBOARD_LIMIT: usize = 10;

/// Coarse classification of a player by cumulative total score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RankTier {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl RankTier {
    /// Classifies a total score, evaluated top-down, first match wins
    pub fn for_total_score(total_score: i64) -> Self {
        if total_score > rank_thresholds::EXPERT {
            RankTier::Expert
        } else if total_score > rank_thresholds::ADVANCED {
            RankTier::Advanced
        } else if total_score > rank_thresholds::INTERMEDIATE {
            RankTier::Intermediate
        } else {
            RankTier::Beginner
        }
    }
}

impl fmt::Display for RankTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                RankTier::Beginner => "BEGINNER",
                RankTier::Intermediate => "INTERMEDIATE",
                RankTier::Advanced => "ADVANCED",
                RankTier::Expert => "EXPERT",
            }
        )
    }
}

/// Sort criterion for leaderboard and rankings reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter)]
#[serde(rename_all = "snake_case")]
pub enum SortCriterion {
    TotalScore,
    HighScore,
    AverageScore,
    GamesWon,
}

impl SortCriterion {
    pub const DEFAULT: SortCriterion = SortCriterion::TotalScore;

    /// Resolves a raw query parameter, normalizing anything unrecognized to
    /// the default criterion instead of rejecting it
    pub fn from_param(raw: Option<&str>) -> Self {
        match raw {
            Some(value) => Self::try_from(value).unwrap_or(Self::DEFAULT),
            None => Self::DEFAULT,
        }
    }
}

impl fmt::Display for SortCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                SortCriterion::TotalScore => "total_score",
                SortCriterion::HighScore => "high_score",
                SortCriterion::AverageScore => "average_score",
                SortCriterion::GamesWon => "games_won",
            }
        )
    }
}

impl TryFrom<&str> for SortCriterion {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "total_score" => Ok(SortCriterion::TotalScore),
            "high_score" => Ok(SortCriterion::HighScore),
            "average_score" => Ok(SortCriterion::AverageScore),
            "games_won" => Ok(SortCriterion::GamesWon),
            _ => Err(s.to_string()),
        }
    }
}

/// Read-only computed projection of a player record.
///
/// `win_rate` and `score_per_game` are recomputed on every read so they
/// always reflect the latest persisted counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsView {
    pub player_id: String,
    pub display_name: String,
    pub total_score: i64,
    pub high_score: i64,
    pub games_played: u32,
    pub games_won: u32,
    pub games_lost: u32,
    pub average_score: f64,
    pub win_rate: f64,
    pub score_per_game: f64,
    pub last_game_score: Option<i64>,
    pub last_game_date: Option<DateTime<Utc>>,
    pub rank: RankTier,
}

impl StatsView {
    pub fn from_player(player: &PlayerModel) -> Self {
        let win_rate = if player.games_played == 0 {
            0.0
        } else {
            round2(player.games_won as f64 / player.games_played as f64 * 100.0)
        };
        let score_per_game = if player.games_played == 0 {
            0.0
        } else {
            player.total_score as f64 / player.games_played as f64
        };

        Self {
            player_id: player.id.clone(),
            display_name: player.display_name.clone(),
            total_score: player.total_score,
            high_score: player.high_score,
            games_played: player.games_played,
            games_won: player.games_won,
            games_lost: player.games_played.saturating_sub(player.games_won),
            average_score: player.average_score,
            win_rate,
            score_per_game,
            last_game_score: player.last_game_score,
            last_game_date: player.last_game_date,
            rank: RankTier::for_total_score(player.total_score),
        }
    }
}

/// One row of the full rankings enumeration: a 1-based position (a row
/// number, not a shared competition rank) plus the player's stats view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedEntry {
    pub position: u32,
    pub player: StatsView,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
