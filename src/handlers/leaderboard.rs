// src/handlers/leaderboard.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde_json::json;
use sqlx::PgPool;

use crate::{
    error::AppError,
    leaderboard::{SourceChange, SourceKind, handle_source_change, repository},
    models::leaderboard::{Breakdown, LeaderboardParams},
    utils::jwt::Claims,
};

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 200;

/// Ranked list, best first. Read-only: the board has no client write path.
pub async fn get_leaderboard(
    State(pool): State<PgPool>,
    Query(params): Query<LeaderboardParams>,
) -> Result<impl IntoResponse, AppError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let entries = repository::list_ranked(&pool, limit).await?;
    Ok(Json(entries))
}

/// The caller's own entry. Users who have never triggered a recompute get
/// the same fields with zero points and a null `rank` and `updated_at`.
pub async fn get_my_entry(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    if let Some(entry) = repository::find_entry(&pool, user_id).await? {
        return Ok(Json(json!(entry)));
    }

    let username: String = sqlx::query_scalar("SELECT username FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(json!({
        "user_id": user_id,
        "username": username,
        "total_points": 0,
        "breakdown": Breakdown::default(),
        "rank": null,
        "updated_at": null,
    })))
}

/// Recomputes one user's entry through the normal recompute path.
/// Admin only; used to repair entries after manual data fixes.
pub async fn recompute_user(
    State(pool): State<PgPool>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&pool)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    let mut tx = pool.begin().await?;
    let entry = handle_source_change(&mut tx, SourceChange::new(user_id, SourceKind::Manual)).await?;
    tx.commit().await?;

    Ok(Json(entry))
}
