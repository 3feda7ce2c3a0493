/**
 * Testimonial Routes
 * Public submission and listing, admin moderation
 */
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::models::{NewTestimonial, Testimonial};
use crate::error::AppError;
use crate::routes::{optional, required, required_email, SubmissionResponse, SuccessResponse};
use crate::state::AppState;
use crate::store::TestimonialFilter;

/// Request body for POST /api/testimonials
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TestimonialRequest {
    pub customer_name: String,
    pub customer_email: String,
    pub customer_location: Option<String>,
    pub testimonial_content: String,
    pub rating: Option<i32>,
}

/// Query parameters for GET /api/testimonials
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PublicTestimonialQuery {
    pub featured: bool,
}

/// Testimonial as shown publicly; contact details stay private.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicTestimonial {
    pub id: Uuid,
    pub customer_name: String,
    pub customer_location: Option<String>,
    pub testimonial_content: String,
    pub rating: Option<i32>,
    pub is_featured: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<Testimonial> for PublicTestimonial {
    fn from(t: Testimonial) -> Self {
        Self {
            id: t.id,
            customer_name: t.customer_name,
            customer_location: t.customer_location,
            testimonial_content: t.testimonial_content,
            rating: t.rating,
            is_featured: t.is_featured,
            created_at: t.created_at,
        }
    }
}

impl TestimonialRequest {
    fn validate(self) -> Result<NewTestimonial, AppError> {
        if let Some(rating) = self.rating {
            if !(1..=5).contains(&rating) {
                return Err(AppError::validation("Rating must be between 1 and 5"));
            }
        }

        Ok(NewTestimonial {
            customer_name: required(&self.customer_name, "Name")?,
            customer_email: required_email(&self.customer_email, "Email")?,
            customer_location: optional(self.customer_location),
            testimonial_content: required(&self.testimonial_content, "Testimonial")?,
            rating: self.rating,
        })
    }
}

/// POST /api/testimonials - Submit a testimonial for review
pub async fn submit_testimonial(
    State(state): State<AppState>,
    Json(payload): Json<TestimonialRequest>,
) -> Result<impl IntoResponse, AppError> {
    let new = payload.validate()?;
    let testimonial = state.store.insert_testimonial(new).await?;

    tracing::info!(id = %testimonial.id, "testimonial submitted for review");

    Ok((
        StatusCode::CREATED,
        Json(SubmissionResponse {
            success: true,
            id: testimonial.id,
        }),
    ))
}

/// GET /api/testimonials - Approved testimonials, newest first
pub async fn list_public(
    State(state): State<AppState>,
    Query(query): Query<PublicTestimonialQuery>,
) -> Result<Json<Vec<PublicTestimonial>>, AppError> {
    let filter = TestimonialFilter {
        featured_only: query.featured,
        ..TestimonialFilter::public()
    };
    let rows = state.store.list_testimonials(filter).await?;
    Ok(Json(rows.into_iter().map(PublicTestimonial::from).collect()))
}

/// GET /api/admin/testimonials - Every testimonial, newest first
pub async fn list_all(State(state): State<AppState>) -> Result<Json<Vec<Testimonial>>, AppError> {
    let rows = state
        .store
        .list_testimonials(TestimonialFilter::default())
        .await?;
    Ok(Json(rows))
}

/// POST /api/admin/testimonials/:id/approve
pub async fn approve(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Testimonial>, AppError> {
    let testimonial = state
        .store
        .approve_testimonial(id)
        .await?
        .ok_or(AppError::NotFound)?;
    tracing::info!(id = %id, "testimonial approved");
    Ok(Json(testimonial))
}

/// POST /api/admin/testimonials/:id/toggle-featured
pub async fn toggle_featured(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Testimonial>, AppError> {
    let testimonial = state
        .store
        .toggle_testimonial_featured(id)
        .await?
        .ok_or(AppError::NotFound)?;
    tracing::info!(id = %id, featured = testimonial.is_featured, "testimonial featured flag toggled");
    Ok(Json(testimonial))
}

/// DELETE /api/admin/testimonials/:id
pub async fn delete_testimonial(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SuccessResponse>, AppError> {
    if !state.store.delete_testimonial(id).await? {
        return Err(AppError::NotFound);
    }
    tracing::info!(id = %id, "testimonial deleted");
    Ok(Json(SuccessResponse { success: true }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{admin, get, post};
    use axum::http::Method;
    use serde_json::json;

    async fn submit(state: &AppState, name: &str) -> Uuid {
        let (status, body) = post(
            state,
            "/api/testimonials",
            json!({
                "customerName": name,
                "customerEmail": format!("{}@example.com", name.to_lowercase()),
                "customerLocation": "Lusaka",
                "testimonialContent": "Fast and fair.",
                "rating": 5,
                "isApproved": true
            }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().parse().unwrap()
    }

    #[tokio::test]
    async fn test_submission_ignores_moderation_flags() {
        let state = AppState::in_memory();
        submit(&state, "Chanda").await;

        let rows = state
            .store
            .list_testimonials(TestimonialFilter::default())
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].is_approved);
        assert!(!rows[0].is_featured);

        let (_, public) = get(&state, "/api/testimonials").await;
        assert_eq!(public, json!([]));
    }

    #[tokio::test]
    async fn test_rating_out_of_range_rejected() {
        let state = AppState::in_memory();
        let (status, _) = post(
            &state,
            "/api/testimonials",
            json!({
                "customerName": "A",
                "customerEmail": "a@example.com",
                "testimonialContent": "Ok",
                "rating": 6
            }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_approve_changes_only_the_flag_and_publishes() {
        let state = AppState::in_memory();
        let first = submit(&state, "Chanda").await;
        let second = submit(&state, "Bwalya").await;
        let before = state
            .store
            .list_testimonials(TestimonialFilter::default())
            .await
            .unwrap();

        for id in [first, second] {
            let (status, _) = admin(
                &state,
                Method::POST,
                &format!("/api/admin/testimonials/{}/approve", id),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }

        let after = state
            .store
            .list_testimonials(TestimonialFilter::default())
            .await
            .unwrap();
        for (old, new) in before.iter().zip(after.iter()) {
            assert!(new.is_approved);
            assert_eq!(
                Testimonial {
                    is_approved: old.is_approved,
                    ..new.clone()
                },
                *old
            );
        }

        let (_, public) = get(&state, "/api/testimonials").await;
        let names: Vec<_> = public
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["customerName"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Bwalya", "Chanda"]);
        assert!(public[0].get("customerEmail").is_none());
    }

    #[tokio::test]
    async fn test_toggle_featured_twice_restores_value() {
        let state = AppState::in_memory();
        let id = submit(&state, "Chanda").await;
        let uri = format!("/api/admin/testimonials/{}/toggle-featured", id);

        let (_, once) = admin(&state, Method::POST, &uri).await;
        assert_eq!(once["isFeatured"], true);
        let (_, twice) = admin(&state, Method::POST, &uri).await;
        assert_eq!(twice["isFeatured"], false);
    }

    #[tokio::test]
    async fn test_featured_filter_on_public_list() {
        let state = AppState::in_memory();
        let featured = submit(&state, "Chanda").await;
        let plain = submit(&state, "Bwalya").await;
        for id in [featured, plain] {
            admin(&state, Method::POST, &format!("/api/admin/testimonials/{}/approve", id)).await;
        }
        admin(
            &state,
            Method::POST,
            &format!("/api/admin/testimonials/{}/toggle-featured", featured),
        )
        .await;

        let (_, list) = get(&state, "/api/testimonials?featured=true").await;
        assert_eq!(list.as_array().unwrap().len(), 1);
        assert_eq!(list[0]["id"], featured.to_string());
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let state = AppState::in_memory();
        let uri = format!("/api/admin/testimonials/{}/approve", Uuid::new_v4());
        let (status, _) = admin(&state, Method::POST, &uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
