use serde::{Deserialize, Serialize};
use solitaire_core::{LeaderboardEntry, PegCount};

/// Storage key the whole leaderboard lives under.
pub const LEADERBOARD_KEY: &str = "peg-solitaire-leaderboard";

/// Body of a score submission. The player comes from the verified session,
/// never from the body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitScoreRequest {
    #[serde(alias = "time")]
    pub time_seconds: u32,
    pub pegs_remaining: PegCount,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmitStatus {
    #[serde(rename = "Score saved")]
    Saved,
    #[serde(rename = "Score not better")]
    NotBetter,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitScoreResponse {
    pub leaderboard: Vec<LeaderboardEntry>,
    pub message: SubmitStatus,
    /// 0-based position of the submitted score, absent when it is not listed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardResponse {
    pub leaderboard: Vec<LeaderboardEntry>,
}

/// Failure body; `retryable` tells the client whether trying again may help.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub retryable: bool,
}

/// Persisted form of the leaderboard, a JSON array of entries.
pub fn encode_leaderboard(entries: &[LeaderboardEntry]) -> serde_json::Result<String> {
    serde_json::to_string(entries)
}

pub fn decode_leaderboard(raw: &str) -> serde_json::Result<Vec<LeaderboardEntry>> {
    serde_json::from_str(raw)
}
