// src/leaderboard/repository.rs

use async_trait::async_trait;
use sqlx::{FromRow, PgConnection, PgPool, types::Json};

use super::{
    ranking::RANK_ORDER_SQL,
    scoring::{AssignmentRecord, AttemptRecord, ProjectRecord, SourceRecords},
};
use crate::{
    error::AppError,
    models::{
        leaderboard::{Breakdown, LeaderboardEntry},
        quiz::QuizQuestion,
    },
};

/// Key of the transaction-scoped advisory lock serializing recomputations.
const LEADERBOARD_LOCK_KEY: i64 = 0x4c45_4144_4552;

/// Storage seam for the recompute routine.
#[async_trait]
pub trait LeaderboardRepository: Send {
    /// Loads every record the user's score depends on.
    async fn load_sources(&mut self, user_id: i64) -> Result<SourceRecords, AppError>;

    /// Creates or updates the user's entry. Leaves the row untouched when
    /// nothing changed.
    async fn upsert_entry(&mut self, user_id: i64, breakdown: &Breakdown) -> Result<(), AppError>;

    /// Recomputes the rank of every entry.
    async fn rerank(&mut self) -> Result<(), AppError>;

    async fn entry(&mut self, user_id: i64) -> Result<LeaderboardEntry, AppError>;
}

/// Postgres implementation, bound to the connection of the transaction that
/// performed the triggering write.
pub struct PgLeaderboardRepository<'c> {
    conn: &'c mut PgConnection,
}

#[derive(FromRow)]
struct AttemptRow {
    answers: Json<Vec<usize>>,
    questions: Json<Vec<QuizQuestion>>,
    completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(FromRow)]
struct AssignmentRow {
    submission_ref: Option<String>,
}

#[derive(FromRow)]
struct ProjectRow {
    verified: bool,
    tags: Vec<String>,
}

impl<'c> PgLeaderboardRepository<'c> {
    /// Takes the leaderboard advisory lock and marks the transaction as the
    /// recompute writer. Both are released at commit or rollback.
    pub async fn lock(conn: &'c mut PgConnection) -> Result<Self, AppError> {
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(LEADERBOARD_LOCK_KEY)
            .execute(&mut *conn)
            .await?;

        sqlx::query("SELECT set_config('app.leaderboard_writer', 'recompute', true)")
            .execute(&mut *conn)
            .await?;

        Ok(Self { conn })
    }

    /// Deletes a user under the leaderboard lock. The entry goes with the
    /// user through `ON DELETE CASCADE`; the caller re-ranks afterwards.
    /// Returns the number of deleted users.
    pub async fn remove_user(&mut self, user_id: i64) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&mut *self.conn)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl LeaderboardRepository for PgLeaderboardRepository<'_> {
    async fn load_sources(&mut self, user_id: i64) -> Result<SourceRecords, AppError> {
        let attempts: Vec<AttemptRow> = sqlx::query_as(
            r#"
            SELECT a.answers, q.questions, a.completed_at
            FROM quiz_attempts a
            JOIN quizzes q ON q.id = a.quiz_id
            WHERE a.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *self.conn)
        .await?;

        let assignments: Vec<AssignmentRow> =
            sqlx::query_as("SELECT submission_ref FROM assignments WHERE user_id = $1")
                .bind(user_id)
                .fetch_all(&mut *self.conn)
                .await?;

        let projects: Vec<ProjectRow> =
            sqlx::query_as("SELECT verified, tags FROM projects WHERE user_id = $1")
                .bind(user_id)
                .fetch_all(&mut *self.conn)
                .await?;

        Ok(SourceRecords {
            attempts: attempts
                .into_iter()
                .map(|row| AttemptRecord {
                    answers: row.answers.0,
                    questions: row.questions.0,
                    completed: row.completed_at.is_some(),
                })
                .collect(),
            assignments: assignments
                .into_iter()
                .map(|row| AssignmentRecord {
                    submission_ref: row.submission_ref,
                })
                .collect(),
            projects: projects
                .into_iter()
                .map(|row| ProjectRecord {
                    verified: row.verified,
                    tags: row.tags,
                })
                .collect(),
        })
    }

    async fn upsert_entry(&mut self, user_id: i64, breakdown: &Breakdown) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO leaderboard (user_id, total_points, breakdown, updated_at)
            VALUES ($1, $2, $3, CURRENT_TIMESTAMP)
            ON CONFLICT (user_id) DO UPDATE SET
                total_points = EXCLUDED.total_points,
                breakdown = EXCLUDED.breakdown,
                updated_at = EXCLUDED.updated_at
            WHERE leaderboard.total_points IS DISTINCT FROM EXCLUDED.total_points
               OR leaderboard.breakdown IS DISTINCT FROM EXCLUDED.breakdown
            "#,
        )
        .bind(user_id)
        .bind(breakdown.total())
        .bind(Json(*breakdown))
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }

    async fn rerank(&mut self) -> Result<(), AppError> {
        let sql = format!(
            r#"
            UPDATE leaderboard l SET rank = r.rn
            FROM (
                SELECT user_id, ROW_NUMBER() OVER (ORDER BY {}) AS rn
                FROM leaderboard
            ) r
            WHERE l.user_id = r.user_id AND l.rank IS DISTINCT FROM r.rn
            "#,
            RANK_ORDER_SQL
        );

        sqlx::query(&sql).execute(&mut *self.conn).await?;
        Ok(())
    }

    async fn entry(&mut self, user_id: i64) -> Result<LeaderboardEntry, AppError> {
        sqlx::query_as(
            r#"
            SELECT l.user_id, u.username, l.total_points, l.breakdown, l.rank, l.updated_at
            FROM leaderboard l
            JOIN users u ON u.id = l.user_id
            WHERE l.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&mut *self.conn)
        .await?
        .ok_or(AppError::NotFound("Leaderboard entry not found".to_string()))
    }
}

/// Ranked list for the read path.
pub async fn list_ranked(pool: &PgPool, limit: i64) -> Result<Vec<LeaderboardEntry>, AppError> {
    let entries = sqlx::query_as(
        r#"
        SELECT l.user_id, u.username, l.total_points, l.breakdown, l.rank, l.updated_at
        FROM leaderboard l
        JOIN users u ON u.id = l.user_id
        ORDER BY l.rank ASC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch leaderboard: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(entries)
}

/// A single user's entry, if one has been computed yet.
pub async fn find_entry(pool: &PgPool, user_id: i64) -> Result<Option<LeaderboardEntry>, AppError> {
    let entry = sqlx::query_as(
        r#"
        SELECT l.user_id, u.username, l.total_points, l.breakdown, l.rank, l.updated_at
        FROM leaderboard l
        JOIN users u ON u.id = l.user_id
        WHERE l.user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(entry)
}
