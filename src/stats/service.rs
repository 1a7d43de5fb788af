use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::{
    models::{RankedEntry, SortCriterion, StatsView, DEFAULT_LEADERBOARD_LIMIT, MAX_LEADERBOARD_LIMIT},
    StatsError,
};
use crate::clock::Clock;
use crate::player::{
    repository::{GameRecordResult, PlayerRepository, WinRecordResult},
    PlayerModel,
};

/// Statistics and ranking engine.
///
/// Each mutation touches exactly one player record through the repository's
/// atomic read-modify-write operations; the bulk reads scan all records and
/// order them in memory. The engine holds no state of its own.
pub struct StatsService {
    repository: Arc<dyn PlayerRepository + Send + Sync>,
    clock: Arc<dyn Clock>,
}

impl StatsService {
    pub fn new(repository: Arc<dyn PlayerRepository + Send + Sync>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Folds one game score into a player's counters and returns the fresh view
    #[instrument(skip(self))]
    pub async fn record_game_result(
        &self,
        player_id: &str,
        score: i64,
    ) -> Result<StatsView, StatsError> {
        if score < 0 {
            debug!(player_id = %player_id, score, "Rejecting negative score");
            return Err(StatsError::InvalidScore);
        }

        let played_at = self.clock.now();
        let result = self
            .repository
            .record_game_result(player_id, score, played_at)
            .await?;

        match result {
            GameRecordResult::Success(player) => {
                info!(
                    player_id = %player_id,
                    score,
                    total_score = player.total_score,
                    games_played = player.games_played,
                    "Game result recorded"
                );
                Ok(StatsView::from_player(&player))
            }
            GameRecordResult::PlayerNotFound => {
                Err(StatsError::PlayerNotFound(player_id.to_string()))
            }
        }
    }

    /// Increments a player's win counter and returns the fresh view
    #[instrument(skip(self))]
    pub async fn record_win(&self, player_id: &str) -> Result<StatsView, StatsError> {
        let result = self.repository.record_win(player_id).await?;

        match result {
            WinRecordResult::Success(player) => {
                info!(
                    player_id = %player_id,
                    games_won = player.games_won,
                    "Win recorded"
                );
                Ok(StatsView::from_player(&player))
            }
            WinRecordResult::WinWithoutGame => Err(StatsError::InvalidWin),
            WinRecordResult::PlayerNotFound => {
                Err(StatsError::PlayerNotFound(player_id.to_string()))
            }
        }
    }

    /// Pure read: derived stats for one player
    #[instrument(skip(self))]
    pub async fn player_stats(&self, player_id: &str) -> Result<StatsView, StatsError> {
        let player = self
            .repository
            .get_player(player_id)
            .await?
            .ok_or_else(|| StatsError::PlayerNotFound(player_id.to_string()))?;

        Ok(StatsView::from_player(&player))
    }

    /// Top players by the given criterion, descending. The limit is clamped
    /// to a sane page size; ties keep whatever order the scan produced.
    #[instrument(skip(self))]
    pub async fn leaderboard(
        &self,
        criterion: SortCriterion,
        limit: Option<usize>,
    ) -> Result<Vec<StatsView>, StatsError> {
        let limit = limit
            .unwrap_or(DEFAULT_LEADERBOARD_LIMIT)
            .clamp(1, MAX_LEADERBOARD_LIMIT);

        let mut players = self.repository.list_players().await?;
        players.sort_by(|a, b| compare_by(criterion, a, b));
        players.truncate(limit);

        debug!(%criterion, limit, count = players.len(), "Leaderboard computed");

        Ok(players.iter().map(StatsView::from_player).collect())
    }

    /// Full ordered enumeration with 1-based positions. Ties on the primary
    /// criterion are broken by display name ascending, so the order (and
    /// therefore every position) is deterministic.
    #[instrument(skip(self))]
    pub async fn rankings(&self, criterion: SortCriterion) -> Result<Vec<RankedEntry>, StatsError> {
        let mut players = self.repository.list_players().await?;
        players.sort_by(|a, b| {
            compare_by(criterion, a, b).then_with(|| a.display_name.cmp(&b.display_name))
        });

        debug!(%criterion, count = players.len(), "Rankings computed");

        Ok(players
            .iter()
            .enumerate()
            .map(|(index, player)| RankedEntry {
                position: index as u32 + 1,
                player: StatsView::from_player(player),
            })
            .collect())
    }
}

/// Descending comparison on the criterion value
fn compare_by(criterion: SortCriterion, a: &PlayerModel, b: &PlayerModel) -> Ordering {
    match criterion {
        SortCriterion::TotalScore => b.total_score.cmp(&a.total_score),
        SortCriterion::HighScore => b.high_score.cmp(&a.high_score),
        SortCriterion::AverageScore => b.average_score.total_cmp(&a.average_score),
        SortCriterion::GamesWon => b.games_won.cmp(&a.games_won),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{FixedClock, SystemClock};
    use crate::player::{repository::InMemoryPlayerRepository, Gender};
    use crate::stats::models::RankTier;
    use chrono::{TimeZone, Utc};

    fn service_with_repo() -> (StatsService, Arc<InMemoryPlayerRepository>) {
        let repo = Arc::new(InMemoryPlayerRepository::new());
        let service = StatsService::new(repo.clone(), Arc::new(SystemClock));
        (service, repo)
    }

    async fn seed_player(repo: &InMemoryPlayerRepository, name: &str) -> PlayerModel {
        let player = PlayerModel::new(
            format!("user-{}", name),
            name.to_string(),
            format!("{}@example.com", name),
            format!("+20100{}", name),
            Gender::Male,
            None,
            Utc::now(),
        );
        repo.create_player(&player).await.unwrap();
        player
    }

    async fn seed_with_scores(
        repo: &InMemoryPlayerRepository,
        service: &StatsService,
        name: &str,
        scores: &[i64],
    ) -> PlayerModel {
        let player = seed_player(repo, name).await;
        for &score in scores {
            service.record_game_result(&player.id, score).await.unwrap();
        }
        player
    }

    #[tokio::test]
    async fn test_first_game_sets_all_counters() {
        let (service, repo) = service_with_repo();
        let player = seed_player(&repo, "alice").await;

        let view = service.record_game_result(&player.id, 50).await.unwrap();

        assert_eq!(view.total_score, 50);
        assert_eq!(view.games_played, 1);
        assert_eq!(view.high_score, 50);
        assert_eq!(view.average_score, 50.0);
        assert_eq!(view.last_game_score, Some(50));
        assert!(view.last_game_date.is_some());
    }

    #[tokio::test]
    async fn test_negative_score_rejected_without_mutation() {
        let (service, repo) = service_with_repo();
        let player = seed_with_scores(&repo, &service, "alice", &[60, 40]).await;

        let result = service.record_game_result(&player.id, -5).await;
        assert!(matches!(result, Err(StatsError::InvalidScore)));

        // No field changed
        let stored = repo.get_player(&player.id).await.unwrap().unwrap();
        assert_eq!(stored.total_score, 100);
        assert_eq!(stored.games_played, 2);
        assert_eq!(stored.high_score, 60);
    }

    #[tokio::test]
    async fn test_record_game_for_unknown_player() {
        let (service, _repo) = service_with_repo();

        let result = service.record_game_result("missing", 10).await;
        assert!(matches!(result, Err(StatsError::PlayerNotFound(_))));
    }

    #[tokio::test]
    async fn test_high_score_and_total_track_history() {
        let (service, repo) = service_with_repo();
        let player = seed_player(&repo, "alice").await;

        let scores = [12, 90, 3, 45, 90, 7];
        let mut max_seen = 0;
        let mut sum = 0;
        for score in scores {
            let view = service.record_game_result(&player.id, score).await.unwrap();
            max_seen = max_seen.max(score);
            sum += score;
            assert_eq!(view.high_score, max_seen);
            assert_eq!(view.total_score, sum);
            let expected_avg = view.total_score as f64 / view.games_played as f64;
            assert!((view.average_score - expected_avg).abs() < 1e-9);
        }
    }

    #[tokio::test]
    async fn test_win_rate_and_losses() {
        let (service, repo) = service_with_repo();
        let player = seed_with_scores(&repo, &service, "alice", &[10, 20, 30, 40]).await;

        service.record_win(&player.id).await.unwrap();

        let view = service.player_stats(&player.id).await.unwrap();
        assert_eq!(view.games_played, 4);
        assert_eq!(view.games_won, 1);
        assert_eq!(view.win_rate, 25.0);
        assert_eq!(view.games_lost, 3);
    }

    #[tokio::test]
    async fn test_win_without_game_rejected() {
        let (service, repo) = service_with_repo();
        let player = seed_player(&repo, "alice").await;

        let result = service.record_win(&player.id).await;
        assert!(matches!(result, Err(StatsError::InvalidWin)));

        let stored = repo.get_player(&player.id).await.unwrap().unwrap();
        assert_eq!(stored.games_won, 0);
    }

    #[tokio::test]
    async fn test_player_stats_not_found() {
        let (service, _repo) = service_with_repo();

        let result = service.player_stats("missing").await;
        assert!(matches!(result, Err(StatsError::PlayerNotFound(_))));
    }

    #[tokio::test]
    async fn test_rank_reflects_total_score() {
        let (service, repo) = service_with_repo();
        let player = seed_with_scores(&repo, &service, "alice", &[600, 600]).await;

        let view = service.player_stats(&player.id).await.unwrap();
        assert_eq!(view.total_score, 1200);
        assert_eq!(view.rank, RankTier::Expert);
    }

    #[tokio::test]
    async fn test_leaderboard_orders_descending_and_limits() {
        let (service, repo) = service_with_repo();
        seed_with_scores(&repo, &service, "low", &[100]).await;
        seed_with_scores(&repo, &service, "high", &[900]).await;
        seed_with_scores(&repo, &service, "mid", &[400]).await;

        let board = service
            .leaderboard(SortCriterion::TotalScore, Some(2))
            .await
            .unwrap();

        assert_eq!(board.len(), 2);
        assert_eq!(board[0].display_name, "high");
        assert_eq!(board[1].display_name, "mid");
    }

    #[tokio::test]
    async fn test_leaderboard_criteria_differ() {
        let (service, repo) = service_with_repo();
        // steady: many small scores, big total; spiky: one huge score
        seed_with_scores(&repo, &service, "steady", &[50, 50, 50, 50]).await;
        seed_with_scores(&repo, &service, "spiky", &[150]).await;

        let by_total = service
            .leaderboard(SortCriterion::TotalScore, Some(10))
            .await
            .unwrap();
        assert_eq!(by_total[0].display_name, "steady");

        let by_high = service
            .leaderboard(SortCriterion::HighScore, Some(10))
            .await
            .unwrap();
        assert_eq!(by_high[0].display_name, "spiky");

        let by_avg = service
            .leaderboard(SortCriterion::AverageScore, Some(10))
            .await
            .unwrap();
        assert_eq!(by_avg[0].display_name, "spiky");
    }

    #[tokio::test]
    async fn test_leaderboard_limit_clamped() {
        let (service, repo) = service_with_repo();
        for i in 0..5 {
            seed_with_scores(&repo, &service, &format!("p{}", i), &[i]).await;
        }

        // Absurd limit is clamped, zero becomes one
        let board = service
            .leaderboard(SortCriterion::TotalScore, Some(1_000_000))
            .await
            .unwrap();
        assert_eq!(board.len(), 5);

        let board = service
            .leaderboard(SortCriterion::TotalScore, Some(0))
            .await
            .unwrap();
        assert_eq!(board.len(), 1);
    }

    #[tokio::test]
    async fn test_rankings_tiebreak_and_positions() {
        let (service, repo) = service_with_repo();
        seed_with_scores(&repo, &service, "zoe", &[1200]).await;
        seed_with_scores(&repo, &service, "adam", &[1200]).await;
        seed_with_scores(&repo, &service, "mallory", &[300]).await;

        let rankings = service.rankings(SortCriterion::TotalScore).await.unwrap();

        assert_eq!(rankings.len(), 3);
        // Tied players ordered by name ascending, consecutive positions
        assert_eq!(rankings[0].position, 1);
        assert_eq!(rankings[0].player.display_name, "adam");
        assert_eq!(rankings[1].position, 2);
        assert_eq!(rankings[1].player.display_name, "zoe");
        assert_eq!(rankings[2].position, 3);
        assert_eq!(rankings[2].player.display_name, "mallory");
    }

    #[tokio::test]
    async fn test_clock_is_injected_for_game_dates() {
        let repo = Arc::new(InMemoryPlayerRepository::new());
        let pinned = Utc.with_ymd_and_hms(2024, 3, 15, 9, 30, 0).unwrap();
        let service = StatsService::new(repo.clone(), Arc::new(FixedClock(pinned)));

        let player = seed_player(&repo, "alice").await;
        let view = service.record_game_result(&player.id, 10).await.unwrap();

        assert_eq!(view.last_game_date, Some(pinned));
    }
}
