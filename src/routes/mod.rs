/**
 * Routes Module
 * API route handlers
 */
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

pub mod auth;
pub mod blog;
pub mod comments;
pub mod contact;
pub mod health;
pub mod preferences;
pub mod reactions;
pub mod testimonials;

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Success response (for delete)
#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Response for public submissions
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmissionResponse {
    pub success: bool,
    pub id: Uuid,
}

// ============================================================================
// Validation
// ============================================================================

/// Trimmed value of a required text field.
pub(crate) fn required(value: &str, field: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn required_email(value: &str, field: &str) -> Result<String, AppError> {
    let email = required(value, field)?;
    if !email.contains('@') {
        return Err(AppError::validation("Invalid email format"));
    }
    Ok(email)
}

/// Blank optional fields are stored as absent.
pub(crate) fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_trims_and_rejects_blank() {
        assert_eq!(required("  Jane  ", "Full name").unwrap(), "Jane");
        let err = required("   ", "Full name").unwrap_err();
        assert_eq!(err.to_string(), "Full name is required");
    }

    #[test]
    fn test_required_email() {
        assert!(required_email("jane@example.com", "Email").is_ok());
        assert!(required_email("jane.example.com", "Email").is_err());
        assert!(required_email("", "Email").is_err());
    }

    #[test]
    fn test_optional_blank_is_none() {
        assert_eq!(optional(Some("  ".into())), None);
        assert_eq!(optional(Some(" Lusaka ".into())), Some("Lusaka".into()));
        assert_eq!(optional(None), None);
    }
}
