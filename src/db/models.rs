//! Database Models - structs representing database tables (used by sqlx/serde).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Service a contact submission is about. Stored as its kebab-case name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoanType {
    PersonalLoan,
    BusinessLoan,
    CorporateLoan,
    Consultancy,
    DebtManagement,
    Other,
}

impl LoanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanType::PersonalLoan => "personal-loan",
            LoanType::BusinessLoan => "business-loan",
            LoanType::CorporateLoan => "corporate-loan",
            LoanType::Consultancy => "consultancy",
            LoanType::DebtManagement => "debt-management",
            LoanType::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LoanType::PersonalLoan => "Personal Loan",
            LoanType::BusinessLoan => "Business Loan",
            LoanType::CorporateLoan => "High Corporate Loan",
            LoanType::Consultancy => "Financial Consultancy",
            LoanType::DebtManagement => "Debt Management",
            LoanType::Other => "Other / General Inquiry",
        }
    }
}

impl std::str::FromStr for LoanType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "personal-loan" => Ok(LoanType::PersonalLoan),
            "business-loan" => Ok(LoanType::BusinessLoan),
            "corporate-loan" => Ok(LoanType::CorporateLoan),
            "consultancy" => Ok(LoanType::Consultancy),
            "debt-management" => Ok(LoanType::DebtManagement),
            "other" => Ok(LoanType::Other),
            other => Err(format!("unknown loan type: {}", other)),
        }
    }
}

/// Display label for a stored loan type; unknown values are shown verbatim.
pub fn service_label(loan_type: Option<&str>) -> String {
    match loan_type {
        None => "General Inquiry".to_string(),
        Some(raw) => raw
            .parse::<LoanType>()
            .map(|t| t.label().to_string())
            .unwrap_or_else(|_| raw.to_string()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionType {
    Like,
    Love,
    Helpful,
    Insightful,
}

impl ReactionType {
    pub const ALL: [ReactionType; 4] = [
        ReactionType::Like,
        ReactionType::Love,
        ReactionType::Helpful,
        ReactionType::Insightful,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionType::Like => "like",
            ReactionType::Love => "love",
            ReactionType::Helpful => "helpful",
            ReactionType::Insightful => "insightful",
        }
    }
}

impl TryFrom<String> for ReactionType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "like" => Ok(ReactionType::Like),
            "love" => Ok(ReactionType::Love),
            "helpful" => Ok(ReactionType::Helpful),
            "insightful" => Ok(ReactionType::Insightful),
            _ => Err(format!("unknown reaction type: {}", value)),
        }
    }
}

/// Contact form submission
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSubmission {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub loan_type: Option<String>,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewContactSubmission {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub loan_type: Option<LoanType>,
    pub message: String,
}

/// Customer testimonial
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Testimonial {
    pub id: Uuid,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_location: Option<String>,
    pub testimonial_content: String,
    pub rating: Option<i32>,
    pub is_approved: bool,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTestimonial {
    pub customer_name: String,
    pub customer_email: String,
    pub customer_location: Option<String>,
    pub testimonial_content: String,
    pub rating: Option<i32>,
}

/// Blog post model
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub extract: String,
    pub content: String,
    pub image_url: Option<String>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Full set of editable blog post fields, written on create and on edit.
#[derive(Debug, Clone)]
pub struct BlogPostDraft {
    pub title: String,
    pub slug: String,
    pub extract: String,
    pub content: String,
    pub image_url: Option<String>,
    pub is_published: bool,
}

/// Comment on a blog post
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogComment {
    pub id: Uuid,
    pub blog_post_id: Uuid,
    pub author_name: String,
    pub author_email: String,
    pub content: String,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewBlogComment {
    pub blog_post_id: Uuid,
    pub author_name: String,
    pub author_email: String,
    pub content: String,
    pub is_approved: bool,
}

/// Moderation filter for the admin comment list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentStatus {
    #[default]
    Pending,
    Approved,
    All,
}

/// Reaction left by a visitor
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogReaction {
    pub id: Uuid,
    pub blog_post_id: Uuid,
    #[sqlx(try_from = "String")]
    pub reaction_type: ReactionType,
    pub visitor_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loan_type_round_trips_through_name() {
        for raw in ["personal-loan", "corporate-loan", "debt-management"] {
            let parsed: LoanType = raw.parse().unwrap();
            assert_eq!(parsed.as_str(), raw);
        }
        assert!("mortgage".parse::<LoanType>().is_err());
    }

    #[test]
    fn test_service_label() {
        assert_eq!(service_label(None), "General Inquiry");
        assert_eq!(service_label(Some("corporate-loan")), "High Corporate Loan");
        assert_eq!(service_label(Some("legacy-value")), "legacy-value");
    }

    #[test]
    fn test_reaction_type_serialization() {
        let s = serde_json::to_string(&ReactionType::Insightful).unwrap();
        assert_eq!(s, "\"insightful\"");
        let parsed: ReactionType = serde_json::from_str("\"love\"").unwrap();
        assert_eq!(parsed, ReactionType::Love);
        assert!(ReactionType::try_from("wow".to_string()).is_err());
    }
}
