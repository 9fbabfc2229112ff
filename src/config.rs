// src/config.rs

use std::env;
use std::str::FromStr;
use std::time::Duration;

use dotenvy::dotenv;

/// Points awarded per correctly answered question of a completed attempt.
pub const QUIZ_POINTS_PER_CORRECT: i64 = 1;
/// Points awarded per submitted assignment.
pub const ASSIGNMENT_POINTS: i64 = 20;
/// Points awarded per verified project without the challenge tag.
pub const PROJECT_POINTS: i64 = 100;
/// Points awarded per verified project carrying the challenge tag.
pub const CHALLENGE_POINTS: i64 = 80;
/// Tag that turns a project into a challenge.
pub const CHALLENGE_TAG: &str = "challenge";

/// Number of questions an AI-generated quiz must contain.
pub const GENERATED_QUIZ_SIZE: usize = 5;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub port: u16,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    pub ai: AiConfig,
}

/// Settings for the generative-AI provider and the wrapper around it.
#[derive(Debug, Clone)]
pub struct AiConfig {
    /// `None` disables every AI feature; callers use their fallbacks.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub min_interval: Duration,
    pub timeout: Duration,
    pub max_attempts: u32,
    pub backoff_base: Duration,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-1.5-flash".to_string(),
            min_interval: Duration::from_millis(1000),
            timeout: Duration::from_secs(30),
            max_attempts: 3,
            backoff_base: Duration::from_millis(1000),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET")
            .expect("JWT_SECRET must be set");

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let defaults = AiConfig::default();
        let ai = AiConfig {
            api_key: env::var("AI_API_KEY").ok().filter(|k| !k.trim().is_empty()),
            base_url: env::var("AI_BASE_URL").unwrap_or(defaults.base_url),
            model: env::var("AI_MODEL").unwrap_or(defaults.model),
            min_interval: Duration::from_millis(parse_or("AI_MIN_INTERVAL_MS", 1000)),
            timeout: Duration::from_secs(parse_or("AI_TIMEOUT_SECS", 30)),
            max_attempts: parse_or("AI_MAX_ATTEMPTS", 3u32).max(1),
            backoff_base: Duration::from_millis(parse_or("AI_BACKOFF_BASE_MS", 1000)),
        };

        Self {
            database_url,
            jwt_secret,
            jwt_expiration: parse_or("JWT_EXPIRATION", 86_400),
            rust_log,
            port: parse_or("PORT", 3000),
            admin_username: env::var("ADMIN_USERNAME").ok(),
            admin_password: env::var("ADMIN_PASSWORD").ok(),
            ai,
        }
    }
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
