use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ContentStore, Page, StoreError, StoreResult, TestimonialFilter};
use crate::db::models::{
    BlogComment, BlogPost, BlogPostDraft, BlogReaction, CommentStatus, ContactSubmission,
    NewBlogComment, NewContactSubmission, NewTestimonial, ReactionType, Testimonial,
};

/// Collections are kept in insertion order, so iterating in reverse yields
/// newest first.
#[derive(Default)]
struct Collections {
    contacts: Vec<ContactSubmission>,
    testimonials: Vec<Testimonial>,
    posts: Vec<BlogPost>,
    comments: Vec<BlogComment>,
    reactions: Vec<BlogReaction>,
    preferences: HashMap<(Uuid, String), bool>,
}

/// In-process store. Data lives as long as the process does.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
    offline: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose health check always fails.
    #[cfg(test)]
    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }
}

fn newest_first<T: Clone>(items: &[T], keep: impl Fn(&T) -> bool) -> Vec<T> {
    items.iter().rev().filter(|item| keep(item)).cloned().collect()
}

#[async_trait]
impl ContentStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> StoreResult<Duration> {
        if self.offline {
            return Err(StoreError::Unavailable("memory store offline".to_string()));
        }
        Ok(Duration::ZERO)
    }

    async fn insert_contact(&self, new: NewContactSubmission) -> StoreResult<ContactSubmission> {
        let row = ContactSubmission {
            id: Uuid::new_v4(),
            full_name: new.full_name,
            email: new.email,
            phone: new.phone,
            loan_type: new.loan_type.map(|t| t.as_str().to_string()),
            message: new.message,
            is_read: false,
            created_at: Utc::now(),
        };
        self.inner.write().await.contacts.push(row.clone());
        Ok(row)
    }

    async fn list_contacts(&self) -> StoreResult<Vec<ContactSubmission>> {
        Ok(newest_first(&self.inner.read().await.contacts, |_| true))
    }

    async fn get_contact(&self, id: Uuid) -> StoreResult<Option<ContactSubmission>> {
        let inner = self.inner.read().await;
        Ok(inner.contacts.iter().find(|c| c.id == id).cloned())
    }

    async fn mark_contact_read(&self, id: Uuid) -> StoreResult<Option<ContactSubmission>> {
        let mut inner = self.inner.write().await;
        Ok(inner.contacts.iter_mut().find(|c| c.id == id).map(|c| {
            c.is_read = true;
            c.clone()
        }))
    }

    async fn delete_contact(&self, id: Uuid) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        let before = inner.contacts.len();
        inner.contacts.retain(|c| c.id != id);
        Ok(inner.contacts.len() < before)
    }

    async fn insert_testimonial(&self, new: NewTestimonial) -> StoreResult<Testimonial> {
        let row = Testimonial {
            id: Uuid::new_v4(),
            customer_name: new.customer_name,
            customer_email: new.customer_email,
            customer_location: new.customer_location,
            testimonial_content: new.testimonial_content,
            rating: new.rating,
            is_approved: false,
            is_featured: false,
            created_at: Utc::now(),
        };
        self.inner.write().await.testimonials.push(row.clone());
        Ok(row)
    }

    async fn list_testimonials(&self, filter: TestimonialFilter) -> StoreResult<Vec<Testimonial>> {
        Ok(newest_first(&self.inner.read().await.testimonials, |t| {
            (!filter.approved_only || t.is_approved) && (!filter.featured_only || t.is_featured)
        }))
    }

    async fn approve_testimonial(&self, id: Uuid) -> StoreResult<Option<Testimonial>> {
        let mut inner = self.inner.write().await;
        Ok(inner.testimonials.iter_mut().find(|t| t.id == id).map(|t| {
            t.is_approved = true;
            t.clone()
        }))
    }

    async fn toggle_testimonial_featured(&self, id: Uuid) -> StoreResult<Option<Testimonial>> {
        let mut inner = self.inner.write().await;
        Ok(inner.testimonials.iter_mut().find(|t| t.id == id).map(|t| {
            t.is_featured = !t.is_featured;
            t.clone()
        }))
    }

    async fn delete_testimonial(&self, id: Uuid) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        let before = inner.testimonials.len();
        inner.testimonials.retain(|t| t.id != id);
        Ok(inner.testimonials.len() < before)
    }

    async fn insert_post(&self, draft: BlogPostDraft) -> StoreResult<BlogPost> {
        let mut inner = self.inner.write().await;
        if inner.posts.iter().any(|p| p.slug == draft.slug) {
            return Err(StoreError::Conflict("Slug already exists".to_string()));
        }
        let now = Utc::now();
        let row = BlogPost {
            id: Uuid::new_v4(),
            title: draft.title,
            slug: draft.slug,
            extract: draft.extract,
            content: draft.content,
            image_url: draft.image_url,
            is_published: draft.is_published,
            created_at: now,
            updated_at: now,
        };
        inner.posts.push(row.clone());
        Ok(row)
    }

    async fn update_post(&self, id: Uuid, draft: BlogPostDraft) -> StoreResult<Option<BlogPost>> {
        let mut inner = self.inner.write().await;
        if inner
            .posts
            .iter()
            .any(|p| p.id != id && p.slug == draft.slug)
        {
            return Err(StoreError::Conflict("Slug already exists".to_string()));
        }
        Ok(inner.posts.iter_mut().find(|p| p.id == id).map(|p| {
            p.title = draft.title;
            p.slug = draft.slug;
            p.extract = draft.extract;
            p.content = draft.content;
            p.image_url = draft.image_url;
            p.is_published = draft.is_published;
            p.updated_at = Utc::now();
            p.clone()
        }))
    }

    async fn set_post_published(
        &self,
        id: Uuid,
        published: bool,
    ) -> StoreResult<Option<BlogPost>> {
        let mut inner = self.inner.write().await;
        Ok(inner.posts.iter_mut().find(|p| p.id == id).map(|p| {
            p.is_published = published;
            p.updated_at = Utc::now();
            p.clone()
        }))
    }

    async fn toggle_post_published(&self, id: Uuid) -> StoreResult<Option<BlogPost>> {
        let mut inner = self.inner.write().await;
        Ok(inner.posts.iter_mut().find(|p| p.id == id).map(|p| {
            p.is_published = !p.is_published;
            p.updated_at = Utc::now();
            p.clone()
        }))
    }

    async fn delete_post(&self, id: Uuid) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        let before = inner.posts.len();
        inner.posts.retain(|p| p.id != id);
        let removed = inner.posts.len() < before;
        if removed {
            // Mirrors ON DELETE CASCADE.
            inner.comments.retain(|c| c.blog_post_id != id);
            inner.reactions.retain(|r| r.blog_post_id != id);
        }
        Ok(removed)
    }

    async fn get_post(&self, id: Uuid) -> StoreResult<Option<BlogPost>> {
        let inner = self.inner.read().await;
        Ok(inner.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn get_post_by_slug(&self, slug: &str) -> StoreResult<Option<BlogPost>> {
        let inner = self.inner.read().await;
        Ok(inner.posts.iter().find(|p| p.slug == slug).cloned())
    }

    async fn list_posts(
        &self,
        published_only: bool,
        page: Option<Page>,
    ) -> StoreResult<Vec<BlogPost>> {
        let rows = newest_first(&self.inner.read().await.posts, |p| {
            !published_only || p.is_published
        });
        Ok(match page {
            Some(page) => rows
                .into_iter()
                .skip(page.offset as usize)
                .take(page.limit as usize)
                .collect(),
            None => rows,
        })
    }

    async fn count_posts(&self, published_only: bool) -> StoreResult<i64> {
        let inner = self.inner.read().await;
        Ok(inner
            .posts
            .iter()
            .filter(|p| !published_only || p.is_published)
            .count() as i64)
    }

    async fn insert_comment(&self, new: NewBlogComment) -> StoreResult<BlogComment> {
        let row = BlogComment {
            id: Uuid::new_v4(),
            blog_post_id: new.blog_post_id,
            author_name: new.author_name,
            author_email: new.author_email,
            content: new.content,
            is_approved: new.is_approved,
            created_at: Utc::now(),
        };
        self.inner.write().await.comments.push(row.clone());
        Ok(row)
    }

    async fn list_comments(
        &self,
        post_id: Option<Uuid>,
        status: CommentStatus,
    ) -> StoreResult<Vec<BlogComment>> {
        Ok(newest_first(&self.inner.read().await.comments, |c| {
            let post_matches = post_id.map_or(true, |id| c.blog_post_id == id);
            let status_matches = match status {
                CommentStatus::Pending => !c.is_approved,
                CommentStatus::Approved => c.is_approved,
                CommentStatus::All => true,
            };
            post_matches && status_matches
        }))
    }

    async fn approve_comment(&self, id: Uuid) -> StoreResult<Option<BlogComment>> {
        let mut inner = self.inner.write().await;
        Ok(inner.comments.iter_mut().find(|c| c.id == id).map(|c| {
            c.is_approved = true;
            c.clone()
        }))
    }

    async fn delete_comment(&self, id: Uuid) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        let before = inner.comments.len();
        inner.comments.retain(|c| c.id != id);
        Ok(inner.comments.len() < before)
    }

    async fn list_reactions(&self, post_id: Uuid) -> StoreResult<Vec<BlogReaction>> {
        Ok(newest_first(&self.inner.read().await.reactions, |r| {
            r.blog_post_id == post_id
        }))
    }

    async fn insert_reaction(
        &self,
        post_id: Uuid,
        visitor_id: Uuid,
        reaction_type: ReactionType,
    ) -> StoreResult<BlogReaction> {
        let mut inner = self.inner.write().await;
        let exists = inner.reactions.iter().any(|r| {
            r.blog_post_id == post_id
                && r.visitor_id == visitor_id
                && r.reaction_type == reaction_type
        });
        if exists {
            return Err(StoreError::Conflict("Reaction already recorded".to_string()));
        }
        let row = BlogReaction {
            id: Uuid::new_v4(),
            blog_post_id: post_id,
            reaction_type,
            visitor_id,
            created_at: Utc::now(),
        };
        inner.reactions.push(row.clone());
        Ok(row)
    }

    async fn delete_reaction(
        &self,
        post_id: Uuid,
        visitor_id: Uuid,
        reaction_type: ReactionType,
    ) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        let before = inner.reactions.len();
        inner.reactions.retain(|r| {
            !(r.blog_post_id == post_id
                && r.visitor_id == visitor_id
                && r.reaction_type == reaction_type)
        });
        Ok(inner.reactions.len() < before)
    }

    async fn get_preference(&self, visitor_id: Uuid, key: &str) -> StoreResult<Option<bool>> {
        let inner = self.inner.read().await;
        Ok(inner.preferences.get(&(visitor_id, key.to_string())).copied())
    }

    async fn set_preference(&self, visitor_id: Uuid, key: &str, value: bool) -> StoreResult<()> {
        self.inner
            .write()
            .await
            .preferences
            .insert((visitor_id, key.to_string()), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(slug: &str, published: bool) -> BlogPostDraft {
        BlogPostDraft {
            title: format!("Title {}", slug),
            slug: slug.to_string(),
            extract: "Extract".to_string(),
            content: "<p>Body</p>".to_string(),
            image_url: None,
            is_published: published,
        }
    }

    #[tokio::test]
    async fn test_lists_are_newest_first() {
        let store = MemoryStore::new();
        store.insert_post(draft("first", true)).await.unwrap();
        store.insert_post(draft("second", true)).await.unwrap();

        let posts = store.list_posts(true, None).await.unwrap();
        let slugs: Vec<_> = posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["second", "first"]);
    }

    #[tokio::test]
    async fn test_duplicate_slug_is_conflict() {
        let store = MemoryStore::new();
        store.insert_post(draft("same", false)).await.unwrap();
        let err = store.insert_post(draft("same", false)).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_update_post_may_keep_its_own_slug() {
        let store = MemoryStore::new();
        let post = store.insert_post(draft("keep", false)).await.unwrap();
        let updated = store
            .update_post(post.id, draft("keep", true))
            .await
            .unwrap()
            .unwrap();
        assert!(updated.is_published);
        assert_eq!(updated.created_at, post.created_at);
    }

    #[tokio::test]
    async fn test_pagination_and_count() {
        let store = MemoryStore::new();
        for i in 0..5 {
            store.insert_post(draft(&format!("p{}", i), i % 2 == 0)).await.unwrap();
        }
        assert_eq!(store.count_posts(true).await.unwrap(), 3);
        assert_eq!(store.count_posts(false).await.unwrap(), 5);

        let page = store.list_posts(false, Some(Page::new(2, 2))).await.unwrap();
        let slugs: Vec<_> = page.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["p2", "p1"]);
    }

    #[tokio::test]
    async fn test_reaction_uniqueness() {
        let store = MemoryStore::new();
        let post = Uuid::new_v4();
        let visitor = Uuid::new_v4();
        store
            .insert_reaction(post, visitor, ReactionType::Like)
            .await
            .unwrap();
        assert!(matches!(
            store.insert_reaction(post, visitor, ReactionType::Like).await,
            Err(StoreError::Conflict(_))
        ));
        store
            .insert_reaction(post, visitor, ReactionType::Love)
            .await
            .unwrap();
        assert_eq!(store.list_reactions(post).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_post_cascades() {
        let store = MemoryStore::new();
        let post = store.insert_post(draft("gone", true)).await.unwrap();
        store
            .insert_comment(NewBlogComment {
                blog_post_id: post.id,
                author_name: "A".into(),
                author_email: "a@example.com".into(),
                content: "Hi".into(),
                is_approved: true,
            })
            .await
            .unwrap();
        store
            .insert_reaction(post.id, Uuid::new_v4(), ReactionType::Helpful)
            .await
            .unwrap();

        assert!(store.delete_post(post.id).await.unwrap());
        assert!(store
            .list_comments(Some(post.id), CommentStatus::All)
            .await
            .unwrap()
            .is_empty());
        assert!(store.list_reactions(post.id).await.unwrap().is_empty());
        assert!(!store.delete_post(post.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_preferences_default_to_absent() {
        use crate::routes::preferences::WELCOME_POPUP_KEY;

        let store = MemoryStore::new();
        let visitor = Uuid::new_v4();
        assert_eq!(store.get_preference(visitor, WELCOME_POPUP_KEY).await.unwrap(), None);
        store
            .set_preference(visitor, WELCOME_POPUP_KEY, true)
            .await
            .unwrap();
        assert_eq!(
            store.get_preference(visitor, WELCOME_POPUP_KEY).await.unwrap(),
            Some(true)
        );
    }
}
