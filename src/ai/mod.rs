// src/ai/mod.rs

//! Access to the external generative-AI provider.
//!
//! [`AiClient`] wraps every call with a process-wide rate limiter, a
//! per-attempt timeout, bounded retries with exponential backoff and optional
//! payload validation. Callers only ever see [`AiError`], never a transport
//! error.

pub mod chat;
pub mod client;
pub mod clock;
pub mod gemini;
pub mod grading;
pub mod provider;
pub mod quiz_gen;
pub mod rate_limit;

use std::fmt;

pub use client::{AiClient, AiResponse, RetryPolicy};
pub use provider::{AttemptFailure, GenerationOptions, GenerativeProvider};

/// Failure of a whole `call`, after retries.
#[derive(Debug, Clone, PartialEq)]
pub enum AiError {
    /// No API key configured.
    NotConfigured,
    /// Every attempt failed; `last` is the failure of the final one.
    Exhausted { attempts: u32, last: AttemptFailure },
}

impl fmt::Display for AiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AiError::NotConfigured => write!(f, "AI assistant is not configured"),
            AiError::Exhausted { attempts, last } => {
                write!(f, "AI assistant unavailable after {} attempts ({})", attempts, last)
            }
        }
    }
}

impl std::error::Error for AiError {}
