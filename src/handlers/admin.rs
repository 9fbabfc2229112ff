// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::AppError,
    leaderboard::repository::{LeaderboardRepository, PgLeaderboardRepository},
    models::user::{Role, User},
    utils::{jwt::Claims, password::hash_password},
};

/// Lists all users in the system.
/// Admin only.
pub async fn list_users(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let users: Vec<User> = sqlx::query_as(
        r#"
        SELECT id, username, password, role, created_at
        FROM users
        ORDER BY id DESC
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list users: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(users))
}

/// DTO for updating a user. Fields are optional.
#[derive(Debug, Deserialize, Validate)]
pub struct AdminUpdateUserRequest {
    #[validate(length(min = 3, max = 50))]
    pub username: Option<String>,
    pub role: Option<Role>,
    #[validate(length(min = 4, max = 128))]
    pub password: Option<String>,
}

/// Updates user information, including role changes such as banning.
/// Admin only. Admins cannot change their own role.
pub async fn update_user(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<AdminUpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }
    if payload.role.is_some() && id == claims.user_id()? {
        return Err(AppError::BadRequest("Cannot change your own role".to_string()));
    }

    let mut tx = pool.begin().await?;

    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    if let Some(new_username) = &payload.username {
        sqlx::query("UPDATE users SET username = $1 WHERE id = $2")
            .bind(new_username)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if e.to_string().contains("23505") || e.to_string().contains("unique constraint") {
                    AppError::Conflict(format!("Username '{}' already exists", new_username))
                } else {
                    AppError::from(e)
                }
            })?;
    }

    if let Some(new_role) = payload.role {
        sqlx::query("UPDATE users SET role = $1 WHERE id = $2")
            .bind(new_role.as_str())
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tracing::info!(user_id = id, role = %new_role, "User role changed");
    }

    if let Some(new_password) = &payload.password {
        let hashed = hash_password(new_password)?;
        sqlx::query("UPDATE users SET password = $1 WHERE id = $2")
            .bind(hashed)
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(StatusCode::OK)
}

/// Deletes a user by ID. Their records and leaderboard entry go with them.
/// Admin only. Prevents deleting self.
pub async fn delete_user(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if id == claims.user_id()? {
        return Err(AppError::BadRequest("Cannot delete yourself".to_string()));
    }

    let mut tx = pool.begin().await?;

    // The cascade locks the user's leaderboard row, so the advisory lock
    // must be held first, as on every recompute path.
    let mut repo = PgLeaderboardRepository::lock(&mut *tx).await?;
    let removed = repo.remove_user(id).await.map_err(|e| {
        tracing::error!("Failed to delete user: {:?}", e);
        e
    })?;

    if removed == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    // Close the gap the deleted entry left in the ranking.
    repo.rerank().await?;
    tx.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}
