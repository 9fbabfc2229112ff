// src/handlers/assignment.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::AppError,
    leaderboard::{SourceChange, SourceKind, handle_source_change},
    models::assignment::{Assignment, CreateAssignmentRequest, SubmitAssignmentRequest},
    utils::{html::clean_optional, jwt::Claims},
};

const ASSIGNMENT_COLUMNS: &str =
    "id, user_id, title, description, submission_ref, submitted_at, created_at";

/// Creates an assignment record for the caller. Not yet submitted.
pub async fn create_assignment(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateAssignmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }
    let user_id = claims.user_id()?;

    let mut tx = pool.begin().await?;
    let sql = format!(
        "INSERT INTO assignments (user_id, title, description) VALUES ($1, $2, $3) RETURNING {}",
        ASSIGNMENT_COLUMNS
    );
    let assignment: Assignment = sqlx::query_as(&sql)
        .bind(user_id)
        .bind(&payload.title)
        .bind(clean_optional(payload.description.as_deref()))
        .fetch_one(&mut *tx)
        .await?;

    handle_source_change(&mut tx, SourceChange::new(user_id, SourceKind::Assignment)).await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(assignment)))
}

/// Lists the caller's assignments.
pub async fn list_my_assignments(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let sql = format!(
        "SELECT {} FROM assignments WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
        ASSIGNMENT_COLUMNS
    );
    let assignments: Vec<Assignment> = sqlx::query_as(&sql)
        .bind(claims.user_id()?)
        .fetch_all(&pool)
        .await?;

    Ok(Json(assignments))
}

/// Records the submission reference of one of the caller's assignments.
///
/// Resubmitting replaces the reference but keeps the first `submitted_at`;
/// the assignment's points are counted once either way.
pub async fn submit_assignment(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<SubmitAssignmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }
    let user_id = claims.user_id()?;

    let mut tx = pool.begin().await?;
    let sql = format!(
        r#"
        UPDATE assignments
        SET submission_ref = $1,
            submitted_at = COALESCE(submitted_at, CURRENT_TIMESTAMP)
        WHERE id = $2 AND user_id = $3
        RETURNING {}
        "#,
        ASSIGNMENT_COLUMNS
    );
    let assignment: Assignment = sqlx::query_as(&sql)
        .bind(&payload.submission_ref)
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound("Assignment not found".to_string()))?;

    let entry =
        handle_source_change(&mut tx, SourceChange::new(user_id, SourceKind::Assignment)).await?;
    tx.commit().await?;

    Ok(Json(serde_json::json!({
        "assignment": assignment,
        "leaderboard": entry,
    })))
}
