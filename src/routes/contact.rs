/**
 * Contact Routes
 * Public contact form intake and admin review of submissions
 */
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::models::{service_label, ContactSubmission, LoanType, NewContactSubmission};
use crate::error::AppError;
use crate::routes::{optional, required, required_email, SubmissionResponse, SuccessResponse};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for POST /api/contact
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactRequest {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub loan_type: Option<String>,
    pub message: String,
}

/// Submission as shown in the admin panel
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactView {
    #[serde(flatten)]
    pub submission: ContactSubmission,
    pub service_label: String,
}

impl From<ContactSubmission> for ContactView {
    fn from(submission: ContactSubmission) -> Self {
        let service_label = service_label(submission.loan_type.as_deref());
        Self {
            submission,
            service_label,
        }
    }
}

/// Response for GET /api/admin/contacts
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactListResponse {
    pub items: Vec<ContactView>,
    pub total: usize,
    pub unread: usize,
}

impl ContactRequest {
    fn validate(self) -> Result<NewContactSubmission, AppError> {
        let loan_type = match optional(self.loan_type) {
            Some(raw) => Some(
                raw.parse::<LoanType>()
                    .map_err(|_| AppError::validation("Unknown loan type"))?,
            ),
            None => None,
        };

        Ok(NewContactSubmission {
            full_name: required(&self.full_name, "Full name")?,
            email: required_email(&self.email, "Email")?,
            phone: optional(self.phone),
            loan_type,
            message: required(&self.message, "Message")?,
        })
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/contact - Submit the contact form
pub async fn submit_contact(
    State(state): State<AppState>,
    Json(payload): Json<ContactRequest>,
) -> Result<impl IntoResponse, AppError> {
    let new = payload.validate()?;
    let submission = state.store.insert_contact(new).await?;

    tracing::info!(id = %submission.id, loan_type = ?submission.loan_type, "contact submission received");

    Ok((
        StatusCode::CREATED,
        Json(SubmissionResponse {
            success: true,
            id: submission.id,
        }),
    ))
}

/// GET /api/admin/contacts - All submissions, newest first
pub async fn list_contacts(
    State(state): State<AppState>,
) -> Result<Json<ContactListResponse>, AppError> {
    let submissions = state.store.list_contacts().await?;
    let unread = submissions.iter().filter(|s| !s.is_read).count();
    let items: Vec<ContactView> = submissions.into_iter().map(ContactView::from).collect();

    Ok(Json(ContactListResponse {
        total: items.len(),
        unread,
        items,
    }))
}

/// GET /api/admin/contacts/:id - Open a submission, marking it read
pub async fn open_contact(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ContactView>, AppError> {
    let submission = state.store.get_contact(id).await?.ok_or(AppError::NotFound)?;
    if submission.is_read {
        return Ok(Json(submission.into()));
    }

    let submission = state
        .store
        .mark_contact_read(id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(submission.into()))
}

/// POST /api/admin/contacts/:id/read
pub async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ContactView>, AppError> {
    let submission = state
        .store
        .mark_contact_read(id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(submission.into()))
}

/// DELETE /api/admin/contacts/:id
pub async fn delete_contact(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SuccessResponse>, AppError> {
    if !state.store.delete_contact(id).await? {
        return Err(AppError::NotFound);
    }
    tracing::info!(id = %id, "contact submission deleted");
    Ok(Json(SuccessResponse { success: true }))
}
