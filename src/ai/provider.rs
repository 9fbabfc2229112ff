// src/ai/provider.rs

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;

/// Sampling parameters passed through to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOptions {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

impl GenerationOptions {
    /// For JSON output that must match a shape (quiz generation).
    pub fn structured() -> Self {
        Self {
            temperature: 0.7,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 2048,
        }
    }

    /// For grading: low temperature, short output.
    pub fn grading() -> Self {
        Self {
            temperature: 0.2,
            top_k: 20,
            top_p: 0.8,
            max_output_tokens: 1024,
        }
    }

    /// For free-form chat replies.
    pub fn conversational() -> Self {
        Self {
            temperature: 0.9,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 1024,
        }
    }
}

/// Why a single attempt failed.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptFailure {
    /// The attempt exceeded the per-attempt timeout.
    Timeout,
    /// The request never produced a response (DNS, TLS, connection reset).
    Transport(String),
    /// The provider answered with a non-2xx status.
    Status { status: u16, body: String },
    /// The provider refused to generate (safety block, no candidates).
    Blocked(String),
    /// The response could not be parsed or did not match the expected shape.
    Malformed(String),
    /// No API key is configured. Never retried.
    NotConfigured,
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptFailure::Timeout => write!(f, "timed out"),
            AttemptFailure::Transport(msg) => write!(f, "transport error: {}", msg),
            AttemptFailure::Status { status, body } => write!(f, "status {}: {}", status, body),
            AttemptFailure::Blocked(reason) => write!(f, "blocked: {}", reason),
            AttemptFailure::Malformed(msg) => write!(f, "malformed response: {}", msg),
            AttemptFailure::NotConfigured => write!(f, "AI provider not configured"),
        }
    }
}

/// A single generation-completion operation.
#[async_trait]
pub trait GenerativeProvider: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, AttemptFailure>;
}

/// Provider used when no API key is configured.
#[derive(Debug, Default)]
pub struct DisabledProvider;

#[async_trait]
impl GenerativeProvider for DisabledProvider {
    async fn generate(
        &self,
        _prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<String, AttemptFailure> {
        Err(AttemptFailure::NotConfigured)
    }
}
