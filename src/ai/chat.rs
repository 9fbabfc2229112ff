// src/ai/chat.rs

use super::{AiClient, AiError, AiResponse, GenerationOptions};
use crate::models::chat::ChatMessage;

/// Messages of history included in each prompt.
pub const CHAT_CONTEXT_MESSAGES: usize = 10;

pub fn chat_prompt(history: &[ChatMessage]) -> String {
    let mut prompt = String::from(
        "You are a friendly programming mentor on a learning platform. Answer the student's \
         last message concisely. Conversation so far:\n\n",
    );
    let start = history.len().saturating_sub(CHAT_CONTEXT_MESSAGES);
    for message in &history[start..] {
        let speaker = if message.sender == "assistant" {
            "Mentor"
        } else {
            "Student"
        };
        prompt.push_str(&format!("{}: {}\n", speaker, message.content));
    }
    prompt.push_str("Mentor:");
    prompt
}

/// Asks for a reply to the last message of `history`. Empty replies are
/// retried like any other malformed response.
pub async fn reply(ai: &AiClient, history: &[ChatMessage]) -> Result<AiResponse<String>, AiError> {
    ai.call_validated(
        &chat_prompt(history),
        &GenerationOptions::conversational(),
        |text| {
            let text = text.trim();
            if text.is_empty() {
                Err("empty reply".to_string())
            } else {
                Ok(text.to_string())
            }
        },
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(id: i64, sender: &str, content: &str) -> ChatMessage {
        ChatMessage {
            id,
            user_id: 1,
            sender: sender.to_string(),
            content: content.to_string(),
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_prompt_keeps_recent_context_only() {
        let history: Vec<ChatMessage> = (0..15)
            .map(|i| message(i, if i % 2 == 0 { "user" } else { "assistant" }, &format!("m{}", i)))
            .collect();
        let prompt = chat_prompt(&history);
        assert!(!prompt.contains("m4\n"));
        assert!(prompt.contains("Student: m5\n") || prompt.contains("Mentor: m5\n"));
        assert!(prompt.contains("m14\n"));
        assert!(prompt.ends_with("Mentor:"));
    }
}
