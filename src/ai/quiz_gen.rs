// src/ai/quiz_gen.rs

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::{AiClient, AiError, AiResponse, GenerationOptions};
use crate::{
    config::GENERATED_QUIZ_SIZE,
    models::quiz::{Difficulty, QuizQuestion, validate_questions},
};

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*```[a-zA-Z]*\s*(.*?)\s*```\s*$").expect("valid code fence regex")
});

pub fn quiz_prompt(topic: &str, difficulty: Difficulty) -> String {
    format!(
        "Create a {difficulty} level multiple-choice quiz about \"{topic}\" with exactly \
         {count} questions. Respond with JSON only: an array of {count} objects, each with \
         \"question\" (string), \"options\" (array of 4 strings), \"correctIndex\" (0-based \
         index into options) and \"explanation\" (string). No text outside the JSON.",
        difficulty = difficulty.as_str(),
        topic = topic,
        count = GENERATED_QUIZ_SIZE,
    )
}

/// Removes a surrounding Markdown code fence, if any.
pub fn strip_code_fence(text: &str) -> &str {
    match CODE_FENCE.captures(text).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str(),
        None => text.trim(),
    }
}

/// Accepts a JSON array of exactly five well-formed questions, bare or under
/// a `questions` key.
pub fn parse_generated_quiz(text: &str) -> Result<Vec<QuizQuestion>, String> {
    let value: Value = serde_json::from_str(strip_code_fence(text))
        .map_err(|e| format!("quiz is not valid JSON: {}", e))?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("questions") {
            Some(Value::Array(items)) => items,
            _ => return Err("quiz object has no questions array".to_string()),
        },
        _ => return Err("quiz is neither an array nor an object".to_string()),
    };

    if items.len() != GENERATED_QUIZ_SIZE {
        return Err(format!(
            "expected {} questions, got {}",
            GENERATED_QUIZ_SIZE,
            items.len()
        ));
    }

    let questions = items
        .into_iter()
        .map(serde_json::from_value::<QuizQuestion>)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("question has the wrong shape: {}", e))?;

    validate_questions(&questions).map_err(|e| format!("question failed validation: {}", e))?;

    Ok(questions)
}

pub async fn generate_quiz(
    ai: &AiClient,
    topic: &str,
    difficulty: Difficulty,
) -> Result<AiResponse<Vec<QuizQuestion>>, AiError> {
    let prompt = quiz_prompt(topic, difficulty);
    ai.call_validated(&prompt, &GenerationOptions::structured(), parse_generated_quiz)
        .await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::ai::{
        AttemptFailure, RetryPolicy, client::tests::ScriptedProvider, clock::tests::ManualClock,
    };

    fn quiz_json(count: usize) -> String {
        let items: Vec<Value> = (0..count)
            .map(|i| {
                serde_json::json!({
                    "question": format!("Q{}", i),
                    "options": ["a", "b", "c", "d"],
                    "correctIndex": i % 4,
                    "explanation": "because"
                })
            })
            .collect();
        serde_json::to_string(&items).unwrap()
    }

    #[test]
    fn test_accepts_five_questions() {
        let questions = parse_generated_quiz(&quiz_json(5)).unwrap();
        assert_eq!(questions.len(), 5);
        assert_eq!(questions[3].correct_index, 3);
    }

    #[test]
    fn test_accepts_fenced_and_wrapped_output() {
        let fenced = format!("```json\n{}\n```", quiz_json(5));
        assert!(parse_generated_quiz(&fenced).is_ok());

        let wrapped = format!("{{\"questions\": {}}}", quiz_json(5));
        assert!(parse_generated_quiz(&wrapped).is_ok());
    }

    #[test]
    fn test_rejects_wrong_count() {
        assert!(parse_generated_quiz(&quiz_json(4)).is_err());
        assert!(parse_generated_quiz(&quiz_json(6)).is_err());
    }

    #[test]
    fn test_rejects_bad_shapes() {
        let missing_index = r#"[{"question": "Q", "options": ["a", "b"]}]"#;
        assert!(parse_generated_quiz(missing_index).is_err());

        let mut items: Vec<Value> = serde_json::from_str(&quiz_json(5)).unwrap();
        items[2]["correctIndex"] = serde_json::json!(9);
        let out_of_range = serde_json::to_string(&items).unwrap();
        assert!(parse_generated_quiz(&out_of_range).is_err());

        assert!(parse_generated_quiz("Sure! Here is your quiz.").is_err());
    }

    #[tokio::test]
    async fn test_shape_mismatch_counts_against_retry_budget() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(quiz_json(3)),
            Ok(quiz_json(5)),
        ]));
        let client = AiClient::new(
            provider,
            RetryPolicy::default(),
            Duration::from_secs(1),
            Arc::new(ManualClock::new()),
        );

        let response = generate_quiz(&client, "ownership", Difficulty::Beginner)
            .await
            .unwrap();
        assert_eq!(response.attempts, 2);
        assert_eq!(response.value.len(), 5);
    }

    #[tokio::test]
    async fn test_persistent_shape_mismatch_exhausts() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(quiz_json(2))]));
        let client = AiClient::new(
            provider,
            RetryPolicy::default(),
            Duration::from_secs(1),
            Arc::new(ManualClock::new()),
        );

        let err = generate_quiz(&client, "lifetimes", Difficulty::Advanced)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AiError::Exhausted {
                attempts: 3,
                last: AttemptFailure::Malformed(_)
            }
        ));
    }
}
