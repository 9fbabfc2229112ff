// src/ai/grading.rs

use serde::{Deserialize, Serialize};

use super::{AiClient, GenerationOptions, quiz_gen::strip_code_fence};
use crate::{
    leaderboard::scoring::count_correct,
    models::quiz::{QuizAttempt, QuizQuestion},
};

/// Feedback produced by the AI grader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiGrading {
    /// 0 to 100.
    pub score: u32,
    pub feedback: String,
    #[serde(default)]
    pub per_question: Vec<QuestionFeedback>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionFeedback {
    pub index: usize,
    pub correct: bool,
    #[serde(default)]
    pub comment: String,
}

/// Score of one attempt. `basic_score` is always computed locally;
/// `ai_grading` is present only when the AI path succeeded.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Grade {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_grading: Option<AiGrading>,
    pub basic_score: usize,
    pub correct_answers: usize,
    pub total_questions: usize,
}

/// What the submit endpoint returns.
#[derive(Debug, Serialize)]
pub struct GradingResult {
    pub attempt: QuizAttempt,
    #[serde(flatten)]
    pub grade: Grade,
}

/// Deterministic scoring: one point per positional match.
pub fn basic_grade(answers: &[usize], questions: &[QuizQuestion]) -> Grade {
    let correct = count_correct(answers, questions);
    Grade {
        ai_grading: None,
        basic_score: correct,
        correct_answers: correct,
        total_questions: questions.len(),
    }
}

pub fn grading_prompt(answers: &[usize], questions: &[QuizQuestion]) -> String {
    let mut prompt = String::from(
        "You are grading a student's multiple-choice quiz. For each question you get the \
         options, the correct option index and the student's chosen index. Respond with JSON \
         only: {\"score\": 0-100, \"feedback\": string, \"perQuestion\": [{\"index\": number, \
         \"correct\": bool, \"comment\": string}]}.\n\n",
    );
    for (i, q) in questions.iter().enumerate() {
        let chosen = answers
            .get(i)
            .map(|a| a.to_string())
            .unwrap_or_else(|| "none".to_string());
        prompt.push_str(&format!(
            "{}. {}\nOptions: {}\nCorrect: {}\nStudent: {}\n\n",
            i,
            q.question,
            q.options.join(" | "),
            q.correct_index,
            chosen
        ));
    }
    prompt
}

pub fn parse_ai_grading(text: &str) -> Result<AiGrading, String> {
    let grading: AiGrading = serde_json::from_str(strip_code_fence(text))
        .map_err(|e| format!("grading is not valid JSON: {}", e))?;
    if grading.score > 100 {
        return Err(format!("score {} out of range", grading.score));
    }
    Ok(grading)
}

/// Grades an attempt, trying the AI grader first and keeping the
/// deterministic score either way. AI failures are logged, never returned.
pub async fn grade_attempt(ai: &AiClient, answers: &[usize], questions: &[QuizQuestion]) -> Grade {
    let mut grade = basic_grade(answers, questions);

    let prompt = grading_prompt(answers, questions);
    match ai
        .call_validated(&prompt, &GenerationOptions::grading(), parse_ai_grading)
        .await
    {
        Ok(response) => grade.ai_grading = Some(response.value),
        Err(e) => {
            tracing::warn!("AI grading unavailable, using basic score: {}", e);
        }
    }

    grade
}
