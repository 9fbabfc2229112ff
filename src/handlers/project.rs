// src/handlers/project.rs

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
    models::project::{CreateProjectRequest, Project},
    utils::{html::clean_optional, jwt::Claims},
};

const PROJECT_COLUMNS: &str =
    "id, user_id, title, description, repo_url, tags, verified, verified_by, verified_at, created_at";

/// Creates a portfolio project for the caller. Always starts unverified.
pub async fn create_project(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateProjectRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }
    let user_id = claims.user_id()?;
    let tags: Vec<String> = payload
        .tags
        .iter()
        .map(|t| t.trim().to_lowercase())
        .collect();

    let mut tx = pool.begin().await?;
    let sql = format!(
        r#"
        INSERT INTO projects (user_id, title, description, repo_url, tags)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {}
        "#,
        PROJECT_COLUMNS
    );
    let project: Project = sqlx::query_as(&sql)
        .bind(user_id)
        .bind(&payload.title)
        .bind(clean_optional(payload.description.as_deref()))
        .bind(&payload.repo_url)
        .bind(&tags)
        .fetch_one(&mut *tx)
        .await?;

    handle_source_change(&mut tx, SourceChange::new(user_id, SourceKind::Project)).await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(project)))
}

/// Lists the caller's projects.
pub async fn list_my_projects(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let sql = format!(
        "SELECT {} FROM projects WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
        PROJECT_COLUMNS
    );
    let projects: Vec<Project> = sqlx::query_as(&sql)
        .bind(claims.user_id()?)
        .fetch_all(&pool)
        .await?;

    Ok(Json(projects))
}

/// Lists unverified projects awaiting review.
/// Mentor or admin only.
pub async fn list_pending_projects(
    State(pool): State<PgPool>,
) -> Result<impl IntoResponse, AppError> {
    let sql = format!(
        "SELECT {} FROM projects WHERE verified = FALSE ORDER BY created_at ASC, id ASC LIMIT 200",
        PROJECT_COLUMNS
    );
    let projects: Vec<Project> = sqlx::query_as(&sql).fetch_all(&pool).await?;

    Ok(Json(projects))
}

async fn set_verified(
    pool: &PgPool,
    claims: &Claims,
    id: i64,
    verified: bool,
) -> Result<Json<serde_json::Value>, AppError> {
    if !claims.role()?.can_review() {
        return Err(AppError::Forbidden(
            "Only mentors and admins can verify projects".to_string(),
        ));
    }
    let reviewer_id = claims.user_id()?;

    let mut tx = pool.begin().await?;
    let sql = format!(
        r#"
        UPDATE projects
        SET verified = $1,
            verified_by = CASE WHEN $1 THEN $2 ELSE NULL END,
            verified_at = CASE WHEN $1 THEN CURRENT_TIMESTAMP ELSE NULL END
        WHERE id = $3
        RETURNING {}
        "#,
        PROJECT_COLUMNS
    );
    let project: Project = sqlx::query_as(&sql)
        .bind(verified)
        .bind(reviewer_id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound("Project not found".to_string()))?;

    let entry = handle_source_change(
        &mut tx,
        SourceChange::new(project.user_id, SourceKind::Project),
    )
    .await?;
    tx.commit().await?;

    tracing::info!(
        project_id = id,
        reviewer_id,
        verified,
        owner_total = entry.total_points,
        "Project verification changed"
    );

    Ok(Json(serde_json::json!({
        "project": project,
        "leaderboard": entry,
    })))
}

/// Marks a project verified.
/// Mentor or admin only.
pub async fn verify_project(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    set_verified(&pool, &claims, id, true).await
}

/// Revokes a project's verification; its points disappear on recompute.
/// Mentor or admin only.
pub async fn revoke_project(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    set_verified(&pool, &claims, id, false).await
}
