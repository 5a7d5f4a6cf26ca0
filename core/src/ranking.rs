use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::*;

/// Maximum number of entries kept on the leaderboard.
pub const LEADERBOARD_CAPACITY: usize = 10;

/// Stable player identifier handed out by the identity provider, the
/// leaderboard's dedup key.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Verified identity of the player submitting a score.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerProfile {
    pub player_id: PlayerId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub display_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    #[serde(alias = "fid")]
    pub player_id: PlayerId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub display_name: String,
    #[serde(alias = "time")]
    pub time_seconds: u32,
    #[serde(default)]
    pub pegs_remaining: PegCount,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl LeaderboardEntry {
    pub fn new(
        profile: &PlayerProfile,
        time_seconds: u32,
        pegs_remaining: PegCount,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            player_id: profile.player_id,
            username: profile.username.clone(),
            display_name: profile.display_name.clone(),
            time_seconds,
            pegs_remaining,
            timestamp,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Ranking after the merge, always deduplicated, sorted and bounded.
    pub leaderboard: Vec<LeaderboardEntry>,
    /// Whether the candidate replaced the player's previous result.
    pub accepted: bool,
    /// Position of the candidate in `leaderboard`, `None` if it was rejected
    /// or did not make the cut.
    pub rank: Option<usize>,
}

/// Merges `candidate` into the ranking.
///
/// A candidate that is not strictly faster than the player's existing entry
/// is rejected, so equal times keep the first-achieved entry. Otherwise the
/// player's old entry is dropped, the candidate appended, and the list
/// stable-sorted by time and truncated. Among equal times earlier entries stay
/// ahead of later ones.
///
/// `current` is deduplicated and sorted first, and the player's existing
/// entry is looked up before anything is cut, so a list holding duplicates,
/// more than [`LEADERBOARD_CAPACITY`] entries, or out-of-order times comes back
/// conforming either way.
pub fn merge_entry(current: &[LeaderboardEntry], candidate: LeaderboardEntry) -> MergeOutcome {
    let mut leaderboard = fastest_per_player(current);

    let best = rank_of(&leaderboard, candidate.player_id)
        .map(|index| leaderboard[index].time_seconds);
    if let Some(best) = best.filter(|&best| best <= candidate.time_seconds) {
        log::debug!(
            "Rejected {}s from player {}, best is {}s",
            candidate.time_seconds,
            candidate.player_id,
            best
        );
        leaderboard.truncate(LEADERBOARD_CAPACITY);
        return MergeOutcome {
            leaderboard,
            accepted: false,
            rank: None,
        };
    }

    let player_id = candidate.player_id;
    leaderboard.retain(|entry| entry.player_id != player_id);
    leaderboard.push(candidate);
    leaderboard.sort_by_key(|entry| entry.time_seconds);
    leaderboard.truncate(LEADERBOARD_CAPACITY);

    let rank = rank_of(&leaderboard, player_id);
    MergeOutcome {
        leaderboard,
        accepted: true,
        rank,
    }
}

/// Position of `player_id` in a ranking.
pub fn rank_of(leaderboard: &[LeaderboardEntry], player_id: PlayerId) -> Option<usize> {
    leaderboard
        .iter()
        .position(|entry| entry.player_id == player_id)
}

/// Keeps each player's fastest entry (the earliest on ties), then sorts and
/// truncates. Leaves a conforming list as is.
pub fn normalize(entries: &[LeaderboardEntry]) -> Vec<LeaderboardEntry> {
    let mut kept = fastest_per_player(entries);
    kept.truncate(LEADERBOARD_CAPACITY);
    kept
}

/// Deduplicated and stable-sorted, but not truncated.
fn fastest_per_player(entries: &[LeaderboardEntry]) -> Vec<LeaderboardEntry> {
    let mut kept: Vec<LeaderboardEntry> = Vec::with_capacity(entries.len());
    for entry in entries {
        match rank_of(&kept, entry.player_id) {
            Some(index) if entry.time_seconds < kept[index].time_seconds => {
                kept[index] = entry.clone();
            }
            Some(_) => {}
            None => kept.push(entry.clone()),
        }
    }

    if kept.len() != entries.len() {
        log::warn!(
            "Dropped {} duplicate leaderboard entries",
            entries.len() - kept.len()
        );
    }

    kept.sort_by_key(|entry| entry.time_seconds);
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;
    use alloc::vec;

    fn entry(player: u64, time_seconds: u32) -> LeaderboardEntry {
        LeaderboardEntry {
            player_id: PlayerId(player),
            username: None,
            display_name: format!("player {player}"),
            time_seconds,
            pegs_remaining: 1,
            timestamp: DateTime::from_timestamp_millis(1_700_000_000_000 + player as i64).unwrap(),
        }
    }

    fn players(list: &[LeaderboardEntry]) -> Vec<(u64, u32)> {
        list.iter()
            .map(|entry| (entry.player_id.0, entry.time_seconds))
            .collect()
    }

    #[test]
    fn first_submission_is_accepted() {
        let outcome = merge_entry(&[], entry(1, 120));

        assert!(outcome.accepted);
        assert_eq!(outcome.rank, Some(0));
        assert_eq!(players(&outcome.leaderboard), vec![(1, 120)]);
    }

    #[test]
    fn slower_personal_time_is_rejected() {
        let current = vec![entry(1, 120)];
        let outcome = merge_entry(&current, entry(1, 150));

        assert!(!outcome.accepted);
        assert_eq!(outcome.rank, None);
        assert_eq!(outcome.leaderboard, current);
    }

    #[test]
    fn equal_personal_time_keeps_first_entry() {
        let current = vec![entry(1, 120)];
        let mut later = entry(1, 120);
        later.timestamp = DateTime::from_timestamp_millis(1_800_000_000_000).unwrap();

        let outcome = merge_entry(&current, later);

        assert!(!outcome.accepted);
        assert_eq!(outcome.leaderboard, current);
    }

    #[test]
    fn faster_personal_time_replaces_entry() {
        let current = vec![entry(2, 60), entry(1, 120)];
        let outcome = merge_entry(&current, entry(1, 90));

        assert!(outcome.accepted);
        assert_eq!(outcome.rank, Some(1));
        assert_eq!(players(&outcome.leaderboard), vec![(2, 60), (1, 90)]);
    }

    #[test]
    fn full_board_truncates_slow_candidate() {
        let current: Vec<_> = (1..=10).map(|player| entry(player, player as u32 * 10)).collect();
        let outcome = merge_entry(&current, entry(99, 500));

        assert!(outcome.accepted);
        assert_eq!(outcome.rank, None);
        assert_eq!(outcome.leaderboard.len(), LEADERBOARD_CAPACITY);
        assert_eq!(outcome.leaderboard, current);
    }

    #[test]
    fn fast_candidate_pushes_out_the_slowest() {
        let current: Vec<_> = (1..=10).map(|player| entry(player, player as u32 * 10)).collect();
        let outcome = merge_entry(&current, entry(99, 5));

        assert_eq!(outcome.rank, Some(0));
        assert_eq!(outcome.leaderboard.len(), LEADERBOARD_CAPACITY);
        assert_eq!(outcome.leaderboard[0].player_id, PlayerId(99));
        assert!(rank_of(&outcome.leaderboard, PlayerId(10)).is_none());
    }

    #[test]
    fn equal_times_keep_submission_order() {
        let first = merge_entry(&[], entry(1, 100));
        let second = merge_entry(&first.leaderboard, entry(2, 100));
        let third = merge_entry(&second.leaderboard, entry(3, 90));

        assert!(second.accepted);
        assert_eq!(second.rank, Some(1));
        assert_eq!(players(&third.leaderboard), vec![(3, 90), (1, 100), (2, 100)]);
    }

    #[test]
    fn malformed_list_is_repaired() {
        let mut current: Vec<_> = (1..=12).rev().map(|player| entry(player, player as u32 * 10)).collect();
        current.push(entry(3, 5));
        current.push(entry(4, 200));

        let outcome = merge_entry(&current, entry(50, 1000));

        let expected: Vec<(u64, u32)> = vec![
            (3, 5),
            (1, 10),
            (2, 20),
            (4, 40),
            (5, 50),
            (6, 60),
            (7, 70),
            (8, 80),
            (9, 90),
            (10, 100),
        ];
        assert!(outcome.accepted);
        assert_eq!(outcome.rank, None);
        assert_eq!(players(&outcome.leaderboard), expected);
    }

    #[test]
    fn rejection_still_returns_repaired_list() {
        let current = vec![entry(1, 50), entry(1, 40), entry(2, 30)];
        let outcome = merge_entry(&current, entry(1, 45));

        assert!(!outcome.accepted);
        assert_eq!(players(&outcome.leaderboard), vec![(2, 30), (1, 40)]);
    }

    #[test]
    fn slower_time_is_rejected_even_past_the_cut() {
        let mut current: Vec<_> = (1..=10).map(|player| entry(player, player as u32)).collect();
        current.push(entry(11, 200));

        let outcome = merge_entry(&current, entry(11, 300));

        assert!(!outcome.accepted);
        assert_eq!(outcome.rank, None);
        assert_eq!(outcome.leaderboard.len(), LEADERBOARD_CAPACITY);
        assert!(rank_of(&outcome.leaderboard, PlayerId(11)).is_none());
    }

    #[test]
    fn faster_time_past_the_cut_can_climb_back() {
        let mut current: Vec<_> = (1..=10).map(|player| entry(player, player as u32 * 10)).collect();
        current.push(entry(11, 200));

        let outcome = merge_entry(&current, entry(11, 15));

        assert!(outcome.accepted);
        assert_eq!(outcome.rank, Some(1));
        assert_eq!(outcome.leaderboard.len(), LEADERBOARD_CAPACITY);
        assert_eq!(
            outcome
                .leaderboard
                .iter()
                .filter(|entry| entry.player_id == PlayerId(11))
                .count(),
            1
        );
    }

    #[test]
    fn normalize_is_identity_on_conforming_list() {
        let current = vec![entry(4, 10), entry(2, 20), entry(3, 20)];
        assert_eq!(normalize(&current), current);
    }

    #[test]
    fn entry_wire_format() {
        let json = serde_json::to_value(entry(7, 42)).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "playerId": 7,
                "displayName": "player 7",
                "timeSeconds": 42,
                "pegsRemaining": 1,
                "timestamp": 1_700_000_000_007i64,
            })
        );
    }

    #[test]
    fn legacy_field_names_are_accepted() {
        let json = r#"{"fid":3,"username":"p3","displayName":"P3","time":77,"timestamp":1700000000000}"#;
        let entry: LeaderboardEntry = serde_json::from_str(json).unwrap();

        assert_eq!(entry.player_id, PlayerId(3));
        assert_eq!(entry.username.as_deref(), Some("p3"));
        assert_eq!(entry.time_seconds, 77);
        assert_eq!(entry.pegs_remaining, 0);
    }
}
