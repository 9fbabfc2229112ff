// src/leaderboard/mod.rs

//! Points and ranking.
//!
//! Handlers that write a quiz attempt, an assignment or a project report a
//! [`SourceChange`] inside the same transaction. [`handle_source_change`]
//! recomputes the owner's entry and re-ranks the board before the
//! transaction commits, so a failed recompute rolls the write back.

pub mod ranking;
pub mod repository;
pub mod scoring;

use sqlx::{Postgres, Transaction};

use crate::{
    error::AppError,
    models::leaderboard::LeaderboardEntry,
};
use repository::{LeaderboardRepository, PgLeaderboardRepository};
use scoring::compute_breakdown;

/// Which kind of record changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    QuizAttempt,
    Assignment,
    Project,
    /// Admin-triggered repair.
    Manual,
}

/// "A source record of this user changed."
#[derive(Debug, Clone, Copy)]
pub struct SourceChange {
    pub user_id: i64,
    pub source: SourceKind,
}

impl SourceChange {
    pub fn new(user_id: i64, source: SourceKind) -> Self {
        Self { user_id, source }
    }
}

/// Recomputes one user's entry from the current source records, upserts it
/// and re-ranks every entry.
pub async fn recompute<R: LeaderboardRepository + ?Sized>(
    repo: &mut R,
    user_id: i64,
) -> Result<LeaderboardEntry, AppError> {
    let sources = repo.load_sources(user_id).await?;
    let breakdown = compute_breakdown(&sources);

    repo.upsert_entry(user_id, &breakdown).await?;
    repo.rerank().await?;

    let entry = repo.entry(user_id).await?;
    tracing::debug!(
        user_id,
        total = entry.total_points,
        rank = entry.rank,
        "Leaderboard entry recomputed"
    );
    Ok(entry)
}

/// Consumes a [`SourceChange`] within the transaction of the triggering write.
pub async fn handle_source_change(
    tx: &mut Transaction<'_, Postgres>,
    change: SourceChange,
) -> Result<LeaderboardEntry, AppError> {
    tracing::info!(
        user_id = change.user_id,
        source = ?change.source,
        "Recomputing leaderboard entry"
    );
    let mut repo = PgLeaderboardRepository::lock(&mut **tx).await?;
    recompute(&mut repo, change.user_id).await.map_err(|e| {
        tracing::error!(user_id = change.user_id, "Leaderboard recompute failed: {:?}", e);
        e
    })
}
