/**
 * Comment Routes
 * Reader comments on published posts and their moderation
 */
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::models::{BlogComment, CommentStatus, NewBlogComment};
use crate::error::AppError;
use crate::routes::blog::find_published;
use crate::routes::{required, required_email, SuccessResponse};
use crate::state::AppState;

/// Request body for POST /api/blog/:slug/comments
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommentRequest {
    pub author_name: String,
    pub author_email: String,
    pub content: String,
}

/// Query parameters for GET /api/admin/comments
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CommentListQuery {
    pub status: CommentStatus,
}

/// Comment as shown under a post
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicComment {
    pub id: Uuid,
    pub author_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<BlogComment> for PublicComment {
    fn from(c: BlogComment) -> Self {
        Self {
            id: c.id,
            author_name: c.author_name,
            content: c.content,
            created_at: c.created_at,
        }
    }
}

/// Response for POST /api/blog/:slug/comments
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentSubmitted {
    pub success: bool,
    pub id: Uuid,
    /// False while the comment waits for moderation.
    pub visible: bool,
}

/// GET /api/blog/:slug/comments - Approved comments, newest first
pub async fn list_comments(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Vec<PublicComment>>, AppError> {
    let post = find_published(&state, &slug).await?;
    let comments = state
        .store
        .list_comments(Some(post.id), CommentStatus::Approved)
        .await?;
    Ok(Json(comments.into_iter().map(PublicComment::from).collect()))
}

/// POST /api/blog/:slug/comments
pub async fn submit_comment(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(payload): Json<CommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let post = find_published(&state, &slug).await?;

    let new = NewBlogComment {
        blog_post_id: post.id,
        author_name: required(&payload.author_name, "Name")?,
        author_email: required_email(&payload.author_email, "Email")?,
        content: required(&payload.content, "Comment")?,
        is_approved: !state.config.comments_require_approval,
    };
    let comment = state.store.insert_comment(new).await?;

    tracing::info!(id = %comment.id, post = %post.slug, approved = comment.is_approved, "comment received");

    Ok((
        StatusCode::CREATED,
        Json(CommentSubmitted {
            success: true,
            id: comment.id,
            visible: comment.is_approved,
        }),
    ))
}

/// GET /api/admin/comments?status=pending|approved|all
pub async fn admin_list_comments(
    State(state): State<AppState>,
    Query(query): Query<CommentListQuery>,
) -> Result<Json<Vec<BlogComment>>, AppError> {
    Ok(Json(state.store.list_comments(None, query.status).await?))
}

/// POST /api/admin/comments/:id/approve
pub async fn approve_comment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BlogComment>, AppError> {
    let comment = state
        .store
        .approve_comment(id)
        .await?
        .ok_or(AppError::NotFound)?;
    tracing::info!(id = %id, "comment approved");
    Ok(Json(comment))
}

/// DELETE /api/admin/comments/:id
pub async fn delete_comment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SuccessResponse>, AppError> {
    if !state.store.delete_comment(id).await? {
        return Err(AppError::NotFound);
    }
    tracing::info!(id = %id, "comment deleted");
    Ok(Json(SuccessResponse { success: true }))
}
