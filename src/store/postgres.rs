use async_trait::async_trait;
use sqlx::PgPool;
use std::time::{Duration, Instant};
use uuid::Uuid;

use super::{ContentStore, Page, StoreError, StoreResult, TestimonialFilter};
use crate::db::models::{
    BlogComment, BlogPost, BlogPostDraft, BlogReaction, CommentStatus, ContactSubmission,
    NewBlogComment, NewContactSubmission, NewTestimonial, ReactionType, Testimonial,
};

const CONTACT_COLUMNS: &str =
    "id, full_name, email, phone, loan_type, message, is_read, created_at";
const TESTIMONIAL_COLUMNS: &str = "id, customer_name, customer_email, customer_location, \
     testimonial_content, rating, is_approved, is_featured, created_at";
const POST_COLUMNS: &str =
    "id, title, slug, extract, content, image_url, is_published, created_at, updated_at";
const COMMENT_COLUMNS: &str =
    "id, blog_post_id, author_name, author_email, content, is_approved, created_at";
const REACTION_COLUMNS: &str = "id, blog_post_id, reaction_type, visitor_id, created_at";

/// Postgres-backed store.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

fn slug_conflict(e: sqlx::Error) -> StoreError {
    if is_unique_violation(&e) {
        StoreError::Conflict("Slug already exists".to_string())
    } else {
        StoreError::Database(e)
    }
}

#[async_trait]
impl ContentStore for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> StoreResult<Duration> {
        let start = Instant::now();
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(start.elapsed())
    }

    async fn insert_contact(&self, new: NewContactSubmission) -> StoreResult<ContactSubmission> {
        let row = sqlx::query_as::<_, ContactSubmission>(&format!(
            "INSERT INTO contact_submissions (full_name, email, phone, loan_type, message) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            CONTACT_COLUMNS
        ))
        .bind(&new.full_name)
        .bind(&new.email)
        .bind(&new.phone)
        .bind(new.loan_type.map(|t| t.as_str()))
        .bind(&new.message)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_contacts(&self) -> StoreResult<Vec<ContactSubmission>> {
        let rows = sqlx::query_as::<_, ContactSubmission>(&format!(
            "SELECT {} FROM contact_submissions ORDER BY created_at DESC",
            CONTACT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_contact(&self, id: Uuid) -> StoreResult<Option<ContactSubmission>> {
        let row = sqlx::query_as::<_, ContactSubmission>(&format!(
            "SELECT {} FROM contact_submissions WHERE id = $1",
            CONTACT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn mark_contact_read(&self, id: Uuid) -> StoreResult<Option<ContactSubmission>> {
        let row = sqlx::query_as::<_, ContactSubmission>(&format!(
            "UPDATE contact_submissions SET is_read = true WHERE id = $1 RETURNING {}",
            CONTACT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_contact(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM contact_submissions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_testimonial(&self, new: NewTestimonial) -> StoreResult<Testimonial> {
        let row = sqlx::query_as::<_, Testimonial>(&format!(
            "INSERT INTO testimonials \
             (customer_name, customer_email, customer_location, testimonial_content, rating) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            TESTIMONIAL_COLUMNS
        ))
        .bind(&new.customer_name)
        .bind(&new.customer_email)
        .bind(&new.customer_location)
        .bind(&new.testimonial_content)
        .bind(new.rating)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_testimonials(&self, filter: TestimonialFilter) -> StoreResult<Vec<Testimonial>> {
        let rows = sqlx::query_as::<_, Testimonial>(&format!(
            "SELECT {} FROM testimonials \
             WHERE ($1 = false OR is_approved = true) AND ($2 = false OR is_featured = true) \
             ORDER BY created_at DESC",
            TESTIMONIAL_COLUMNS
        ))
        .bind(filter.approved_only)
        .bind(filter.featured_only)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn approve_testimonial(&self, id: Uuid) -> StoreResult<Option<Testimonial>> {
        let row = sqlx::query_as::<_, Testimonial>(&format!(
            "UPDATE testimonials SET is_approved = true WHERE id = $1 RETURNING {}",
            TESTIMONIAL_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn toggle_testimonial_featured(&self, id: Uuid) -> StoreResult<Option<Testimonial>> {
        let row = sqlx::query_as::<_, Testimonial>(&format!(
            "UPDATE testimonials SET is_featured = NOT is_featured WHERE id = $1 RETURNING {}",
            TESTIMONIAL_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_testimonial(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM testimonials WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_post(&self, draft: BlogPostDraft) -> StoreResult<BlogPost> {
        sqlx::query_as::<_, BlogPost>(&format!(
            "INSERT INTO blog_posts \
             (title, slug, extract, content, image_url, is_published, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, now(), now()) RETURNING {}",
            POST_COLUMNS
        ))
        .bind(&draft.title)
        .bind(&draft.slug)
        .bind(&draft.extract)
        .bind(&draft.content)
        .bind(&draft.image_url)
        .bind(draft.is_published)
        .fetch_one(&self.pool)
        .await
        .map_err(slug_conflict)
    }

    async fn update_post(&self, id: Uuid, draft: BlogPostDraft) -> StoreResult<Option<BlogPost>> {
        sqlx::query_as::<_, BlogPost>(&format!(
            "UPDATE blog_posts \
             SET title = $1, slug = $2, extract = $3, content = $4, image_url = $5, \
                 is_published = $6, updated_at = now() \
             WHERE id = $7 RETURNING {}",
            POST_COLUMNS
        ))
        .bind(&draft.title)
        .bind(&draft.slug)
        .bind(&draft.extract)
        .bind(&draft.content)
        .bind(&draft.image_url)
        .bind(draft.is_published)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(slug_conflict)
    }

    async fn set_post_published(
        &self,
        id: Uuid,
        published: bool,
    ) -> StoreResult<Option<BlogPost>> {
        let row = sqlx::query_as::<_, BlogPost>(&format!(
            "UPDATE blog_posts SET is_published = $1, updated_at = now() \
             WHERE id = $2 RETURNING {}",
            POST_COLUMNS
        ))
        .bind(published)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn toggle_post_published(&self, id: Uuid) -> StoreResult<Option<BlogPost>> {
        let row = sqlx::query_as::<_, BlogPost>(&format!(
            "UPDATE blog_posts SET is_published = NOT is_published, updated_at = now() \
             WHERE id = $1 RETURNING {}",
            POST_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_post(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM blog_posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_post(&self, id: Uuid) -> StoreResult<Option<BlogPost>> {
        let row = sqlx::query_as::<_, BlogPost>(&format!(
            "SELECT {} FROM blog_posts WHERE id = $1",
            POST_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn get_post_by_slug(&self, slug: &str) -> StoreResult<Option<BlogPost>> {
        let row = sqlx::query_as::<_, BlogPost>(&format!(
            "SELECT {} FROM blog_posts WHERE slug = $1",
            POST_COLUMNS
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_posts(
        &self,
        published_only: bool,
        page: Option<Page>,
    ) -> StoreResult<Vec<BlogPost>> {
        // NULL limit means "no limit" in Postgres.
        let (limit, offset) = match page {
            Some(p) => (Some(p.limit), p.offset),
            None => (None, 0),
        };
        let rows = sqlx::query_as::<_, BlogPost>(&format!(
            "SELECT {} FROM blog_posts \
             WHERE ($1 = false OR is_published = true) \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3",
            POST_COLUMNS
        ))
        .bind(published_only)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn count_posts(&self, published_only: bool) -> StoreResult<i64> {
        let total: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM blog_posts WHERE ($1 = false OR is_published = true)",
        )
        .bind(published_only)
        .fetch_one(&self.pool)
        .await?;
        Ok(total.0)
    }

    async fn insert_comment(&self, new: NewBlogComment) -> StoreResult<BlogComment> {
        let row = sqlx::query_as::<_, BlogComment>(&format!(
            "INSERT INTO blog_comments \
             (blog_post_id, author_name, author_email, content, is_approved) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            COMMENT_COLUMNS
        ))
        .bind(new.blog_post_id)
        .bind(&new.author_name)
        .bind(&new.author_email)
        .bind(&new.content)
        .bind(new.is_approved)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_comments(
        &self,
        post_id: Option<Uuid>,
        status: CommentStatus,
    ) -> StoreResult<Vec<BlogComment>> {
        let approved: Option<bool> = match status {
            CommentStatus::Pending => Some(false),
            CommentStatus::Approved => Some(true),
            CommentStatus::All => None,
        };
        let rows = sqlx::query_as::<_, BlogComment>(&format!(
            "SELECT {} FROM blog_comments \
             WHERE ($1::uuid IS NULL OR blog_post_id = $1) \
               AND ($2::boolean IS NULL OR is_approved = $2) \
             ORDER BY created_at DESC",
            COMMENT_COLUMNS
        ))
        .bind(post_id)
        .bind(approved)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn approve_comment(&self, id: Uuid) -> StoreResult<Option<BlogComment>> {
        let row = sqlx::query_as::<_, BlogComment>(&format!(
            "UPDATE blog_comments SET is_approved = true WHERE id = $1 RETURNING {}",
            COMMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_comment(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM blog_comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_reactions(&self, post_id: Uuid) -> StoreResult<Vec<BlogReaction>> {
        let rows = sqlx::query_as::<_, BlogReaction>(&format!(
            "SELECT {} FROM blog_reactions WHERE blog_post_id = $1 ORDER BY created_at DESC",
            REACTION_COLUMNS
        ))
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn insert_reaction(
        &self,
        post_id: Uuid,
        visitor_id: Uuid,
        reaction_type: ReactionType,
    ) -> StoreResult<BlogReaction> {
        sqlx::query_as::<_, BlogReaction>(&format!(
            "INSERT INTO blog_reactions (blog_post_id, visitor_id, reaction_type) \
             VALUES ($1, $2, $3) RETURNING {}",
            REACTION_COLUMNS
        ))
        .bind(post_id)
        .bind(visitor_id)
        .bind(reaction_type.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Conflict("Reaction already recorded".to_string())
            } else {
                StoreError::Database(e)
            }
        })
    }

    async fn delete_reaction(
        &self,
        post_id: Uuid,
        visitor_id: Uuid,
        reaction_type: ReactionType,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            "DELETE FROM blog_reactions \
             WHERE blog_post_id = $1 AND visitor_id = $2 AND reaction_type = $3",
        )
        .bind(post_id)
        .bind(visitor_id)
        .bind(reaction_type.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_preference(&self, visitor_id: Uuid, key: &str) -> StoreResult<Option<bool>> {
        let row: Option<(bool,)> = sqlx::query_as(
            "SELECT value FROM visitor_preferences WHERE visitor_id = $1 AND key = $2",
        )
        .bind(visitor_id)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(value,)| value))
    }

    async fn set_preference(&self, visitor_id: Uuid, key: &str, value: bool) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO visitor_preferences (visitor_id, key, value, updated_at) \
             VALUES ($1, $2, $3, now()) \
             ON CONFLICT (visitor_id, key) \
             DO UPDATE SET value = EXCLUDED.value, updated_at = now()",
        )
        .bind(visitor_id)
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
