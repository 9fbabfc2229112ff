// src/ai/gemini.rs

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::provider::{AttemptFailure, GenerationOptions, GenerativeProvider};

/// Longest error body kept in an [`AttemptFailure::Status`].
const MAX_ERROR_BODY: usize = 300;

/// Content-category threshold forwarded to the provider as-is.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SafetySetting {
    pub category: String,
    pub threshold: String,
}

impl SafetySetting {
    pub fn new(category: &str, threshold: &str) -> Self {
        Self {
            category: category.to_string(),
            threshold: threshold.to_string(),
        }
    }

    /// Harassment, hate speech, sexual and dangerous content blocked from
    /// medium probability upwards.
    pub fn defaults() -> Vec<Self> {
        [
            "HARM_CATEGORY_HARASSMENT",
            "HARM_CATEGORY_HATE_SPEECH",
            "HARM_CATEGORY_SEXUALLY_EXPLICIT",
            "HARM_CATEGORY_DANGEROUS_CONTENT",
        ]
        .into_iter()
        .map(|category| Self::new(category, "BLOCK_MEDIUM_AND_ABOVE"))
        .collect()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: &'a GenerationOptions,
    safety_settings: &'a [SafetySetting],
}

#[derive(Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: u16,
    #[serde(default)]
    message: String,
}

/// Client for the `generateContent` REST operation.
pub struct GeminiProvider {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
    safety_settings: Vec<SafetySetting>,
}

impl GeminiProvider {
    pub fn new(http: reqwest::Client, base_url: &str, model: &str, api_key: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
            safety_settings: SafetySetting::defaults(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl GenerativeProvider for GeminiProvider {
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, AttemptFailure> {
        let body = GenerateRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: options,
            safety_settings: &self.safety_settings,
        };

        let response = self
            .http
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AttemptFailure::Timeout
                } else {
                    AttemptFailure::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AttemptFailure::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(AttemptFailure::Status {
                status: status.as_u16(),
                body: truncate(&text, MAX_ERROR_BODY),
            });
        }

        extract_text(&text)
    }
}

/// Pulls the generated text out of a `generateContent` response body.
fn extract_text(body: &str) -> Result<String, AttemptFailure> {
    let parsed: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| AttemptFailure::Malformed(format!("invalid provider payload: {}", e)))?;

    if let Some(error) = parsed.error {
        return Err(AttemptFailure::Status {
            status: error.code,
            body: truncate(&error.message, MAX_ERROR_BODY),
        });
    }

    let Some(candidate) = parsed.candidates.into_iter().next() else {
        let reason = parsed
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .unwrap_or_else(|| "no candidates returned".to_string());
        return Err(AttemptFailure::Blocked(reason));
    };

    if candidate.finish_reason.as_deref() == Some("SAFETY") {
        return Err(AttemptFailure::Blocked("SAFETY".to_string()));
    }

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(AttemptFailure::Malformed("empty response".to_string()));
    }

    Ok(text)
}

fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_candidate_text() {
        let body = r#"{
            "candidates": [{
                "content": {"parts": [{"text": "Hello "}, {"text": "world"}], "role": "model"},
                "finishReason": "STOP"
            }]
        }"#;
        assert_eq!(extract_text(body).unwrap(), "Hello world");
    }

    #[test]
    fn test_prompt_block_is_reported() {
        let body = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        assert_eq!(
            extract_text(body),
            Err(AttemptFailure::Blocked("SAFETY".into()))
        );
    }

    #[test]
    fn test_safety_finish_reason_is_blocked() {
        let body = r#"{"candidates": [{"finishReason": "SAFETY"}]}"#;
        assert!(matches!(extract_text(body), Err(AttemptFailure::Blocked(_))));
    }

    #[test]
    fn test_error_structure_maps_to_status() {
        let body = r#"{"error": {"code": 429, "message": "quota", "status": "RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(
            extract_text(body),
            Err(AttemptFailure::Status {
                status: 429,
                body: "quota".into()
            })
        );
    }

    #[test]
    fn test_garbage_is_malformed() {
        assert!(matches!(extract_text("<html>"), Err(AttemptFailure::Malformed(_))));
        assert!(matches!(
            extract_text(r#"{"candidates": [{"content": {"parts": []}}]}"#),
            Err(AttemptFailure::Malformed(_))
        ));
    }

    #[test]
    fn test_request_body_shape() {
        let options = GenerationOptions::structured();
        let safety = SafetySetting::defaults();
        let body = GenerateRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: "hi" }],
            }],
            generation_config: &options,
            safety_settings: &safety,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(json["generationConfig"]["topK"], 40);
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 2048);
        assert_eq!(json["safetySettings"].as_array().unwrap().len(), 4);
        assert_eq!(json["safetySettings"][1]["category"], "HARM_CATEGORY_HATE_SPEECH");
    }
}
