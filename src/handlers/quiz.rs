// src/handlers/quiz.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;
use sqlx::{FromRow, PgPool, types::Json as SqlJson};
use validator::Validate;

use crate::{
    ai::{AiClient, grading, quiz_gen},
    error::AppError,
    leaderboard::{SourceChange, SourceKind, handle_source_change},
    models::quiz::{
        CreateQuizRequest, GenerateQuizRequest, PublicQuiz, Quiz, QuizAttempt, QuizQuestion,
        SubmitAttemptRequest,
    },
    utils::jwt::Claims,
};

const QUIZ_COLUMNS: &str =
    "id, title, topic, difficulty, is_ai_generated, questions, created_by, created_at";
const ATTEMPT_COLUMNS: &str =
    "id, quiz_id, user_id, answers, started_at, completed_at, ai_grading";

/// Quiz listing row, without questions.
#[derive(Debug, Serialize, FromRow)]
pub struct QuizSummary {
    pub id: i64,
    pub title: String,
    pub topic: String,
    pub difficulty: String,
    pub is_ai_generated: bool,
    pub question_count: i32,
}

async fn insert_quiz(
    pool: &PgPool,
    title: &str,
    topic: &str,
    difficulty: &str,
    is_ai_generated: bool,
    questions: Vec<QuizQuestion>,
    created_by: i64,
) -> Result<Quiz, AppError> {
    let sql = format!(
        r#"
        INSERT INTO quizzes (title, topic, difficulty, is_ai_generated, questions, created_by)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {}
        "#,
        QUIZ_COLUMNS
    );

    sqlx::query_as(&sql)
        .bind(title)
        .bind(topic)
        .bind(difficulty)
        .bind(is_ai_generated)
        .bind(SqlJson(questions))
        .bind(created_by)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create quiz: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })
}

/// Creates a hand-authored quiz.
/// Mentor or admin only.
pub async fn create_quiz(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let quiz = insert_quiz(
        &pool,
        &payload.title,
        &payload.topic,
        payload.difficulty.as_str(),
        false,
        payload.questions,
        claims.user_id()?,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(quiz)))
}

/// Asks the AI provider for a five-question quiz and stores it.
///
/// Nothing is stored when the provider cannot produce a valid quiz; the
/// caller gets 503 and can retry later or pick an authored quiz.
pub async fn generate_quiz(
    State(pool): State<PgPool>,
    State(ai): State<Arc<AiClient>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<GenerateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let generated = quiz_gen::generate_quiz(&ai, &payload.topic, payload.difficulty).await?;
    tracing::info!(
        topic = %payload.topic,
        attempts = generated.attempts,
        "AI quiz generated"
    );

    let title = format!("{} quiz", payload.topic);
    let quiz = insert_quiz(
        &pool,
        &title,
        &payload.topic,
        payload.difficulty.as_str(),
        true,
        generated.value,
        claims.user_id()?,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(PublicQuiz::from(quiz))))
}

/// Lists quizzes, newest first.
pub async fn list_quizzes(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let quizzes: Vec<QuizSummary> = sqlx::query_as(
        r#"
        SELECT id, title, topic, difficulty, is_ai_generated,
               jsonb_array_length(questions) AS question_count
        FROM quizzes
        ORDER BY created_at DESC, id DESC
        LIMIT 100
        "#,
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(quizzes))
}

async fn fetch_quiz(pool: &PgPool, id: i64) -> Result<Quiz, AppError> {
    let sql = format!("SELECT {} FROM quizzes WHERE id = $1", QUIZ_COLUMNS);
    sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))
}

/// Returns a quiz without correct answers.
pub async fn get_quiz(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = fetch_quiz(&pool, id).await?;
    Ok(Json(PublicQuiz::from(quiz)))
}

/// Starts an in-progress attempt for the caller.
pub async fn start_attempt(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    fetch_quiz(&pool, quiz_id).await?;

    let mut tx = pool.begin().await?;

    let sql = format!(
        "INSERT INTO quiz_attempts (quiz_id, user_id) VALUES ($1, $2) RETURNING {}",
        ATTEMPT_COLUMNS
    );
    let attempt: QuizAttempt = sqlx::query_as(&sql)
        .bind(quiz_id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

    handle_source_change(&mut tx, SourceChange::new(user_id, SourceKind::QuizAttempt)).await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(attempt)))
}

/// Checks that every submitted index points at an option of its question.
fn validate_answers(answers: &[usize], questions: &[QuizQuestion]) -> Result<(), AppError> {
    if answers.len() > questions.len() {
        return Err(AppError::BadRequest(format!(
            "Quiz has {} questions but {} answers were submitted",
            questions.len(),
            answers.len()
        )));
    }
    for (i, (answer, question)) in answers.iter().zip(questions).enumerate() {
        if *answer >= question.options.len() {
            return Err(AppError::BadRequest(format!(
                "Answer {} is not a valid option for question {}",
                answer, i
            )));
        }
    }
    Ok(())
}

/// Submits an attempt's answers and scores it.
///
/// * Marks the attempt completed and recomputes the leaderboard in the same
///   transaction.
/// * After commit, grades with the AI grader; if that fails the basic score
///   is returned on its own.
pub async fn submit_attempt(
    State(pool): State<PgPool>,
    State(ai): State<Arc<AiClient>>,
    Extension(claims): Extension<Claims>,
    Path(attempt_id): Path<i64>,
    Json(req): Json<SubmitAttemptRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let mut tx = pool.begin().await?;

    let sql = format!(
        "SELECT {} FROM quiz_attempts WHERE id = $1 AND user_id = $2 FOR UPDATE",
        ATTEMPT_COLUMNS
    );
    let attempt: QuizAttempt = sqlx::query_as(&sql)
        .bind(attempt_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound("Attempt not found".to_string()))?;

    if attempt.completed_at.is_some() {
        return Err(AppError::Conflict("Attempt already submitted".to_string()));
    }

    let questions: SqlJson<Vec<QuizQuestion>> =
        sqlx::query_scalar("SELECT questions FROM quizzes WHERE id = $1")
            .bind(attempt.quiz_id)
            .fetch_one(&mut *tx)
            .await?;
    let questions = questions.0;

    validate_answers(&req.answers, &questions)?;

    let sql = format!(
        r#"
        UPDATE quiz_attempts
        SET answers = $1, completed_at = CURRENT_TIMESTAMP
        WHERE id = $2
        RETURNING {}
        "#,
        ATTEMPT_COLUMNS
    );
    let mut attempt: QuizAttempt = sqlx::query_as(&sql)
        .bind(SqlJson(&req.answers))
        .bind(attempt_id)
        .fetch_one(&mut *tx)
        .await?;

    handle_source_change(&mut tx, SourceChange::new(user_id, SourceKind::QuizAttempt)).await?;
    tx.commit().await?;

    let grade = grading::grade_attempt(&ai, &req.answers, &questions).await;

    if let Some(ai_grading) = &grade.ai_grading {
        let value = serde_json::to_value(ai_grading)?;
        match store_ai_grading(&pool, attempt_id, user_id, &value).await {
            Ok(()) => attempt.ai_grading = Some(SqlJson(value)),
            Err(e) => tracing::warn!(attempt_id, "Failed to store AI grading: {:?}", e),
        }
    }

    Ok(Json(grading::GradingResult { attempt, grade }))
}

/// Attaches AI grading metadata to a completed attempt.
async fn store_ai_grading(
    pool: &PgPool,
    attempt_id: i64,
    user_id: i64,
    value: &serde_json::Value,
) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;
    sqlx::query("UPDATE quiz_attempts SET ai_grading = $1 WHERE id = $2")
        .bind(SqlJson(value))
        .bind(attempt_id)
        .execute(&mut *tx)
        .await?;
    handle_source_change(&mut tx, SourceChange::new(user_id, SourceKind::QuizAttempt)).await?;
    tx.commit().await?;
    Ok(())
}

/// Lists the caller's attempts, newest first.
pub async fn list_my_attempts(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let sql = format!(
        "SELECT {} FROM quiz_attempts WHERE user_id = $1 ORDER BY started_at DESC",
        ATTEMPT_COLUMNS
    );
    let attempts: Vec<QuizAttempt> = sqlx::query_as(&sql)
        .bind(claims.user_id()?)
        .fetch_all(&pool)
        .await?;

    Ok(Json(attempts))
}
