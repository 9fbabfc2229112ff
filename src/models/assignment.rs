// src/models/assignment.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use url::Url;
use validator::Validate;

/// Represents the 'assignments' table in the database.
/// An assignment counts as submitted once `submission_ref` is non-null.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Assignment {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub submission_ref: Option<String>,
    pub submitted_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAssignmentRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitAssignmentRequest {
    /// Link to the uploaded work (storage object URL or repository).
    #[validate(length(min = 1, max = 2048), custom(function = validate_submission_ref))]
    pub submission_ref: String,
}

fn validate_submission_ref(reference: &str) -> Result<(), validator::ValidationError> {
    match Url::parse(reference) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        _ => Err(validator::ValidationError::new("invalid_submission_ref")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_ref_must_be_http_url() {
        let ok = SubmitAssignmentRequest {
            submission_ref: "https://storage.example.com/hw1.zip".into(),
        };
        assert!(ok.validate().is_ok());

        let bad = SubmitAssignmentRequest {
            submission_ref: "file:///etc/passwd".into(),
        };
        assert!(bad.validate().is_err());

        let empty = SubmitAssignmentRequest {
            submission_ref: String::new(),
        };
        assert!(empty.validate().is_err());
    }
}
