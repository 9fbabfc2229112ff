// src/models/leaderboard.rs

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};

/// Per-category point subtotals for one user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakdown {
    pub quizzes: i64,
    pub assignments: i64,
    pub projects: i64,
    pub challenges: i64,
}

impl Breakdown {
    pub fn total(&self) -> i64 {
        self.quizzes + self.assignments + self.projects + self.challenges
    }
}

/// Represents a row of the 'leaderboard' table joined with the username.
/// Derived data: only the recompute path writes it.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct LeaderboardEntry {
    pub user_id: i64,
    pub username: String,
    pub total_points: i64,
    pub breakdown: Json<Breakdown>,
    pub rank: i64,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Query parameters for the ranked list.
#[derive(Debug, Deserialize)]
pub struct LeaderboardParams {
    pub limit: Option<i64>,
}
