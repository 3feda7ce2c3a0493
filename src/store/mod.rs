//! Data access layer.
//!
//! `ContentStore` is the seam between the HTTP handlers and the data store.
//! `PgStore` talks to Postgres; `MemoryStore` keeps everything in process and
//! backs the server when no database is configured.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::db::models::{
    BlogComment, BlogPost, BlogPostDraft, BlogReaction, CommentStatus, ContactSubmission,
    NewBlogComment, NewContactSubmission, NewTestimonial, ReactionType, Testimonial,
};

#[derive(Error, Debug)]
pub enum StoreError {
    /// A uniqueness rule was violated; the message is safe to show to clients.
    #[error("{0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    /// Page numbers start at 1; size is clamped to 1..=100.
    pub fn new(page: i64, page_size: i64) -> Self {
        let page_size = page_size.clamp(1, 100);
        let page = page.max(1);
        Self {
            limit: page_size,
            offset: (page - 1).saturating_mul(page_size),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TestimonialFilter {
    pub approved_only: bool,
    pub featured_only: bool,
}

impl TestimonialFilter {
    pub fn public() -> Self {
        Self {
            approved_only: true,
            featured_only: false,
        }
    }
}

/// Every list method returns rows newest first.
#[async_trait]
pub trait ContentStore: Send + Sync {
    fn backend(&self) -> &'static str;

    async fn ping(&self) -> StoreResult<Duration>;

    async fn insert_contact(&self, new: NewContactSubmission) -> StoreResult<ContactSubmission>;
    async fn list_contacts(&self) -> StoreResult<Vec<ContactSubmission>>;
    async fn get_contact(&self, id: Uuid) -> StoreResult<Option<ContactSubmission>>;
    async fn mark_contact_read(&self, id: Uuid) -> StoreResult<Option<ContactSubmission>>;
    async fn delete_contact(&self, id: Uuid) -> StoreResult<bool>;

    async fn insert_testimonial(&self, new: NewTestimonial) -> StoreResult<Testimonial>;
    async fn list_testimonials(&self, filter: TestimonialFilter) -> StoreResult<Vec<Testimonial>>;
    async fn approve_testimonial(&self, id: Uuid) -> StoreResult<Option<Testimonial>>;
    async fn toggle_testimonial_featured(&self, id: Uuid) -> StoreResult<Option<Testimonial>>;
    async fn delete_testimonial(&self, id: Uuid) -> StoreResult<bool>;

    /// Fails with `StoreError::Conflict` when the slug is taken.
    async fn insert_post(&self, draft: BlogPostDraft) -> StoreResult<BlogPost>;
    /// Overwrites every editable field and bumps `updated_at`.
    async fn update_post(&self, id: Uuid, draft: BlogPostDraft) -> StoreResult<Option<BlogPost>>;
    async fn set_post_published(&self, id: Uuid, published: bool)
        -> StoreResult<Option<BlogPost>>;
    async fn toggle_post_published(&self, id: Uuid) -> StoreResult<Option<BlogPost>>;
    async fn delete_post(&self, id: Uuid) -> StoreResult<bool>;
    async fn get_post(&self, id: Uuid) -> StoreResult<Option<BlogPost>>;
    async fn get_post_by_slug(&self, slug: &str) -> StoreResult<Option<BlogPost>>;
    async fn list_posts(&self, published_only: bool, page: Option<Page>)
        -> StoreResult<Vec<BlogPost>>;
    async fn count_posts(&self, published_only: bool) -> StoreResult<i64>;

    async fn insert_comment(&self, new: NewBlogComment) -> StoreResult<BlogComment>;
    async fn list_comments(
        &self,
        post_id: Option<Uuid>,
        status: CommentStatus,
    ) -> StoreResult<Vec<BlogComment>>;
    async fn approve_comment(&self, id: Uuid) -> StoreResult<Option<BlogComment>>;
    async fn delete_comment(&self, id: Uuid) -> StoreResult<bool>;

    async fn list_reactions(&self, post_id: Uuid) -> StoreResult<Vec<BlogReaction>>;
    /// Fails with `StoreError::Conflict` when the visitor already reacted.
    async fn insert_reaction(
        &self,
        post_id: Uuid,
        visitor_id: Uuid,
        reaction_type: ReactionType,
    ) -> StoreResult<BlogReaction>;
    async fn delete_reaction(
        &self,
        post_id: Uuid,
        visitor_id: Uuid,
        reaction_type: ReactionType,
    ) -> StoreResult<bool>;

    async fn get_preference(&self, visitor_id: Uuid, key: &str) -> StoreResult<Option<bool>>;
    async fn set_preference(&self, visitor_id: Uuid, key: &str, value: bool) -> StoreResult<()>;
}
