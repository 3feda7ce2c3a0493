/**
 * Blog Routes
 * Public reading endpoints and the admin blog editor
 */
use axum::{
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::models::{BlogPost, BlogPostDraft};
use crate::error::AppError;
use crate::routes::{optional, required, SuccessResponse};
use crate::slug::{generate_slug, is_valid_slug};
use crate::state::AppState;
use crate::storage::{detect_image_mime, image_extension};
use crate::store::Page;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for GET /api/blog (list)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    10
}

/// Response for GET /api/blog (list)
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogListResponse {
    pub items: Vec<BlogPostSummary>,
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
}

/// Blog post summary (for list view)
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPostSummary {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub extract: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<BlogPost> for BlogPostSummary {
    fn from(p: BlogPost) -> Self {
        Self {
            id: p.id,
            title: p.title,
            slug: p.slug,
            extract: p.extract,
            image_url: p.image_url,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveAction {
    Draft,
    Publish,
}

/// An image file picked in the editor
#[derive(Debug)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Fields of the editor form, as submitted
#[derive(Debug, Default)]
pub struct PostForm {
    pub title: String,
    pub slug: Option<String>,
    pub extract: String,
    pub content: String,
    /// `Some("")` clears the current image.
    pub image_url: Option<String>,
    pub action: Option<SaveAction>,
    pub image: Option<ImageUpload>,
}

// ============================================================================
// Editor form handling
// ============================================================================

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::PayloadTooLarge;
    }
    tracing::warn!("Multipart error: {}", e);
    AppError::validation("Invalid multipart data")
}

async fn read_post_form(mut multipart: Multipart) -> Result<PostForm, AppError> {
    let mut form = PostForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();

        if name == "image" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await.map_err(multipart_error)?;
            // Browsers send an empty part when no file was picked.
            if !(file_name.is_empty() && bytes.is_empty()) {
                form.image = Some(ImageUpload {
                    file_name,
                    bytes: bytes.to_vec(),
                });
            }
            continue;
        }

        let value = field.text().await.map_err(multipart_error)?;
        match name.as_str() {
            "title" => form.title = value,
            "slug" => form.slug = Some(value),
            "extract" => form.extract = value,
            "content" => form.content = value,
            "imageUrl" => form.image_url = Some(value.trim().to_string()),
            "action" => {
                form.action = Some(match value.trim() {
                    "draft" => SaveAction::Draft,
                    "publish" => SaveAction::Publish,
                    _ => return Err(AppError::validation("Action must be draft or publish")),
                })
            }
            _ => {}
        }
    }

    if form.action.is_none() {
        return Err(AppError::validation("Action must be draft or publish"));
    }
    Ok(form)
}

/// Validate an image and write it to the file store, returning its public URL.
async fn store_image(state: &AppState, image: ImageUpload) -> Result<String, AppError> {
    let ext = image_extension(&image.file_name).ok_or_else(|| {
        AppError::validation("Unsupported file type. Allowed: JPEG, PNG, WebP, GIF.")
    })?;

    if image.bytes.is_empty() {
        return Err(AppError::validation("Empty file"));
    }
    if image.bytes.len() > state.config.max_upload_bytes {
        return Err(AppError::PayloadTooLarge);
    }
    if detect_image_mime(&image.bytes).is_none() {
        return Err(AppError::validation(
            "File content does not match an allowed image type.",
        ));
    }

    let simple = Uuid::new_v4().simple().to_string();
    let path = format!("{}-{}.{}", Utc::now().timestamp_millis(), &simple[..8], ext);
    state.files.upload(&path, &image.bytes).await?;

    tracing::info!("Image uploaded: {} ({} bytes)", path, image.bytes.len());
    Ok(state.files.public_url(&path))
}

/// Turn a submitted form into the full set of post fields. Uploads the image
/// first, so a failed upload never leaves a post pointing at nothing.
async fn build_draft(
    state: &AppState,
    form: PostForm,
    existing: Option<&BlogPost>,
) -> Result<BlogPostDraft, AppError> {
    let title = required(&form.title, "Title")?;
    let extract = required(&form.extract, "Extract")?;
    let content = required(&form.content, "Content")?;

    let slug = match optional(form.slug) {
        Some(slug) => {
            if !is_valid_slug(&slug) {
                return Err(AppError::validation(
                    "Slug must contain only lowercase letters, numbers, and hyphens",
                ));
            }
            slug
        }
        None => {
            let slug = generate_slug(&title);
            if slug.is_empty() {
                return Err(AppError::validation(
                    "Title must contain letters or numbers to derive a slug",
                ));
            }
            slug
        }
    };

    let image_url = match (form.image, form.image_url) {
        (Some(image), _) => Some(store_image(state, image).await?),
        (None, Some(url)) => optional(Some(url)),
        (None, None) => existing.and_then(|p| p.image_url.clone()),
    };

    Ok(BlogPostDraft {
        title,
        slug,
        extract,
        content: ammonia::clean(&content),
        image_url,
        is_published: form.action == Some(SaveAction::Publish),
    })
}

// ============================================================================
// Public handlers
// ============================================================================

/// GET /api/blog - Published posts with pagination
pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<BlogListQuery>,
) -> Result<Json<BlogListResponse>, AppError> {
    let page = Page::new(query.page, query.page_size);
    let posts = state.store.list_posts(true, Some(page)).await?;
    let total = state.store.count_posts(true).await?;

    Ok(Json(BlogListResponse {
        items: posts.into_iter().map(BlogPostSummary::from).collect(),
        page: query.page.max(1),
        page_size: page.limit,
        total,
    }))
}

/// Look up a post that the public is allowed to see.
pub(crate) async fn find_published(state: &AppState, slug: &str) -> Result<BlogPost, AppError> {
    if !is_valid_slug(slug) {
        return Err(AppError::NotFound);
    }
    match state.store.get_post_by_slug(slug).await? {
        Some(post) if post.is_published => Ok(post),
        _ => Err(AppError::NotFound),
    }
}

/// GET /api/blog/:slug - Single published post
pub async fn get_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<BlogPost>, AppError> {
    Ok(Json(find_published(&state, &slug).await?))
}

// ============================================================================
// Admin handlers
// ============================================================================

/// GET /api/admin/blog - Every post, drafts included
pub async fn admin_list_posts(
    State(state): State<AppState>,
) -> Result<Json<Vec<BlogPost>>, AppError> {
    Ok(Json(state.store.list_posts(false, None).await?))
}

/// GET /api/admin/blog/:id
pub async fn admin_get_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BlogPost>, AppError> {
    let post = state.store.get_post(id).await?.ok_or(AppError::NotFound)?;
    Ok(Json(post))
}

/// POST /api/admin/blog - Create a post from the editor form
pub async fn create_post(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = read_post_form(multipart).await?;
    let draft = build_draft(&state, form, None).await?;
    let post = state.store.insert_post(draft).await?;

    tracing::info!(id = %post.id, slug = %post.slug, published = post.is_published, "blog post created");
    Ok((StatusCode::CREATED, Json(post)))
}

/// PUT /api/admin/blog/:id - Save the editor form over an existing post
pub async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<BlogPost>, AppError> {
    let form = read_post_form(multipart).await?;
    let existing = state.store.get_post(id).await?.ok_or(AppError::NotFound)?;
    let draft = build_draft(&state, form, Some(&existing)).await?;
    let post = state
        .store
        .update_post(id, draft)
        .await?
        .ok_or(AppError::NotFound)?;

    tracing::info!(id = %post.id, slug = %post.slug, published = post.is_published, "blog post updated");
    Ok(Json(post))
}

/// POST /api/admin/blog/:id/publish
pub async fn publish_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BlogPost>, AppError> {
    set_published(&state, id, true).await
}

/// POST /api/admin/blog/:id/unpublish
pub async fn unpublish_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BlogPost>, AppError> {
    set_published(&state, id, false).await
}

async fn set_published(
    state: &AppState,
    id: Uuid,
    published: bool,
) -> Result<Json<BlogPost>, AppError> {
    let post = state
        .store
        .set_post_published(id, published)
        .await?
        .ok_or(AppError::NotFound)?;
    tracing::info!(id = %id, published, "blog post publish state set");
    Ok(Json(post))
}

/// POST /api/admin/blog/:id/toggle-publish
pub async fn toggle_publish(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BlogPost>, AppError> {
    let post = state
        .store
        .toggle_post_published(id)
        .await?
        .ok_or(AppError::NotFound)?;
    tracing::info!(id = %id, published = post.is_published, "blog post publish state toggled");
    Ok(Json(post))
}

/// DELETE /api/admin/blog/:id
pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SuccessResponse>, AppError> {
    if !state.store.delete_post(id).await? {
        return Err(AppError::NotFound);
    }
    tracing::info!(id = %id, "blog post deleted");
    Ok(Json(SuccessResponse { success: true }))
}
