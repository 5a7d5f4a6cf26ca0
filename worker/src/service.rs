use std::future::Future;

use chrono::{DateTime, Utc};
use solitaire_core::{GameResult, LeaderboardEntry, PlayerProfile, merge_entry};
use solitaire_protocol::{
    LeaderboardResponse, SubmitScoreRequest, SubmitScoreResponse, SubmitStatus,
    decode_leaderboard, encode_leaderboard,
};

use crate::*;

/// Score-submission handler: runs the leaderboard merge inside the store's
/// read-modify-write, bounded by the configured timeout.
#[derive(Debug)]
pub struct ScoreService<S> {
    store: S,
    config: WorkerConfig,
}

impl<S: AtomicStore> ScoreService<S> {
    pub fn new(store: S, config: WorkerConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub async fn leaderboard(&self) -> Result<LeaderboardResponse, StoreError> {
        let leaderboard = self
            .bounded(
                self.store
                    .read_modify_write(&self.config.leaderboard_key, |raw| {
                        Ok(Update::Keep(load_entries(raw)?))
                    }),
            )
            .await?;
        Ok(LeaderboardResponse { leaderboard })
    }

    /// Submits a verified player's time. A time that does not beat the
    /// player's own best is answered with [`SubmitStatus::NotBetter`], not an
    /// error.
    pub async fn submit(
        &self,
        profile: &PlayerProfile,
        request: &SubmitScoreRequest,
        now: DateTime<Utc>,
    ) -> Result<SubmitScoreResponse, StoreError> {
        let candidate =
            LeaderboardEntry::new(profile, request.time_seconds, request.pegs_remaining, now);

        let outcome = self
            .bounded(
                self.store
                    .read_modify_write(&self.config.leaderboard_key, |raw| {
                        let current = load_entries(raw)?;
                        let outcome = merge_entry(&current, candidate.clone());
                        if outcome.accepted {
                            let encoded = encode_leaderboard(&outcome.leaderboard)
                                .map_err(StoreError::Encode)?;
                            Ok(Update::Write(encoded, outcome))
                        } else {
                            Ok(Update::Keep(outcome))
                        }
                    }),
            )
            .await?;

        let message = if outcome.accepted {
            log::info!(
                "Saved {}s for player {} at rank {:?}",
                request.time_seconds,
                profile.player_id,
                outcome.rank
            );
            SubmitStatus::Saved
        } else {
            log::debug!(
                "Kept previous best of player {} over {}s",
                profile.player_id,
                request.time_seconds
            );
            SubmitStatus::NotBetter
        };

        Ok(SubmitScoreResponse {
            leaderboard: outcome.leaderboard,
            message,
            rank: outcome.rank.and_then(|rank| rank.try_into().ok()),
        })
    }

    /// Submits the result handed out by a finished session.
    pub async fn submit_result(
        &self,
        profile: &PlayerProfile,
        result: &GameResult,
        now: DateTime<Utc>,
    ) -> Result<SubmitScoreResponse, StoreError> {
        let request = SubmitScoreRequest {
            time_seconds: result.elapsed_secs,
            pegs_remaining: result.pegs_remaining,
        };
        self.submit(profile, &request, now).await
    }

    async fn bounded<T>(
        &self,
        operation: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        match tokio::time::timeout(self.config.store_timeout(), operation).await {
            Ok(result) => result,
            Err(_) => {
                log::warn!(
                    "Store did not answer within {}ms",
                    self.config.store_timeout_ms
                );
                Err(StoreError::Timeout)
            }
        }
    }
}

fn load_entries(raw: Option<&str>) -> Result<Vec<LeaderboardEntry>, StoreError> {
    match raw {
        Some(raw) => decode_leaderboard(raw).map_err(StoreError::Corrupt),
        None => Ok(Vec::new()),
    }
}
