// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

/// Represents the 'quizzes' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,
    pub title: String,
    pub topic: String,

    /// 'beginner', 'intermediate' or 'advanced'.
    pub difficulty: String,

    /// True when the questions came from the AI provider.
    pub is_ai_generated: bool,

    /// Ordered questions, stored as a JSON array.
    pub questions: Json<Vec<QuizQuestion>>,

    pub created_by: Option<i64>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// A single multiple-choice question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    #[serde(default)]
    pub explanation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }
}

/// DTO for sending a quiz to a student (no answers, no explanations).
#[derive(Debug, Serialize)]
pub struct PublicQuiz {
    pub id: i64,
    pub title: String,
    pub topic: String,
    pub difficulty: String,
    pub is_ai_generated: bool,
    pub questions: Vec<PublicQuestion>,
}

#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub question: String,
    pub options: Vec<String>,
}

impl From<Quiz> for PublicQuiz {
    fn from(quiz: Quiz) -> Self {
        Self {
            id: quiz.id,
            title: quiz.title,
            topic: quiz.topic,
            difficulty: quiz.difficulty,
            is_ai_generated: quiz.is_ai_generated,
            questions: quiz
                .questions
                .0
                .into_iter()
                .map(|q| PublicQuestion {
                    question: q.question,
                    options: q.options,
                })
                .collect(),
        }
    }
}

/// DTO for authoring a quiz by hand.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 100))]
    pub topic: String,
    pub difficulty: Difficulty,
    #[validate(custom(function = validate_questions))]
    pub questions: Vec<QuizQuestion>,
}

/// DTO for asking the AI provider to write a quiz.
#[derive(Debug, Deserialize, Validate)]
pub struct GenerateQuizRequest {
    #[validate(length(min = 1, max = 100))]
    pub topic: String,
    pub difficulty: Difficulty,
}

/// Checks that every question is answerable: text present, at least two
/// options, and a correct index pointing at one of them.
pub fn validate_questions(questions: &[QuizQuestion]) -> Result<(), validator::ValidationError> {
    if questions.is_empty() {
        return Err(validator::ValidationError::new("questions_cannot_be_empty"));
    }
    for q in questions {
        if q.question.trim().is_empty() || q.question.len() > 1000 {
            return Err(validator::ValidationError::new("invalid_question_text"));
        }
        if q.options.len() < 2 || q.options.iter().any(|o| o.trim().is_empty() || o.len() > 500) {
            return Err(validator::ValidationError::new("invalid_options"));
        }
        if q.correct_index >= q.options.len() {
            return Err(validator::ValidationError::new("correct_index_out_of_range"));
        }
    }
    Ok(())
}

/// Represents the 'quiz_attempts' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct QuizAttempt {
    pub id: i64,
    pub quiz_id: i64,
    pub user_id: i64,

    /// Submitted option index per question position.
    pub answers: Json<Vec<usize>>,

    pub started_at: chrono::DateTime<chrono::Utc>,

    /// NULL while the attempt is in progress.
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,

    pub ai_grading: Option<Json<serde_json::Value>>,
}

/// DTO for submitting a quiz attempt.
#[derive(Debug, Deserialize)]
pub struct SubmitAttemptRequest {
    /// Option index chosen for each question, in question order.
    pub answers: Vec<usize>,
}
