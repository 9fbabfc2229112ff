// src/models/project.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use url::Url;
use validator::Validate;

use crate::config::CHALLENGE_TAG;

/// Represents the 'projects' table in the database.
/// `verified` is only ever set by a mentor or admin.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub repo_url: Option<String>,
    pub tags: Vec<String>,
    pub verified: bool,
    pub verified_by: Option<i64>,
    pub verified_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// A project is a challenge when one of its tags is the challenge tag.
pub fn is_challenge(tags: &[String]) -> bool {
    tags.iter().any(|t| t.eq_ignore_ascii_case(CHALLENGE_TAG))
}

/// DTO for a student creating a portfolio entry.
/// There is deliberately no `verified` field here.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(custom(function = validate_repo_url))]
    pub repo_url: Option<String>,
    #[serde(default)]
    #[validate(custom(function = validate_tags))]
    pub tags: Vec<String>,
}

fn validate_repo_url(url: &str) -> Result<(), validator::ValidationError> {
    if url.len() > 2048 {
        return Err(validator::ValidationError::new("url_too_long"));
    }
    if Url::parse(url).is_err() {
        return Err(validator::ValidationError::new("invalid_url"));
    }
    Ok(())
}

fn validate_tags(tags: &[String]) -> Result<(), validator::ValidationError> {
    if tags.len() > 10 {
        return Err(validator::ValidationError::new("too_many_tags"));
    }
    for tag in tags {
        if tag.trim().is_empty() || tag.len() > 30 {
            return Err(validator::ValidationError::new("invalid_tag"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_challenge_tag_is_case_insensitive() {
        assert!(is_challenge(&["rust".into(), "Challenge".into()]));
        assert!(!is_challenge(&["rust".into(), "challenges".into()]));
        assert!(!is_challenge(&[]));
    }

    #[test]
    fn test_create_project_validation() {
        let req = CreateProjectRequest {
            title: "Chat server".into(),
            description: None,
            repo_url: Some("not a url".into()),
            tags: vec![],
        };
        assert!(req.validate().is_err());

        let req = CreateProjectRequest {
            title: "Chat server".into(),
            description: None,
            repo_url: Some("https://github.com/someone/chat".into()),
            tags: vec!["challenge".into()],
        };
        assert!(req.validate().is_ok());
    }
}
